pub mod catalog;
pub mod config;
pub mod directive;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod registry;
pub mod run;
pub mod skill;
pub mod summary;
pub mod types;

pub use error::{Result, SkillrunError};
