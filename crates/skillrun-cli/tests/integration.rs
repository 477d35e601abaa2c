#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn skillrun(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("skillrun").unwrap();
    cmd.current_dir(dir.path())
        .env("SKILLRUN_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    skillrun(dir).arg("init").assert().success();
}

fn json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let out = skillrun(dir).arg("--json").args(args).output().unwrap();
    assert!(
        out.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).unwrap()
}

fn start_run(dir: &TempDir, args: &[&str]) -> String {
    let mut full = vec!["run", "start"];
    full.extend_from_slice(args);
    json(dir, &full)["id"].as_str().unwrap().to_string()
}

fn write_skill(dir: &TempDir, name: &str, content: &str) {
    let skill_dir = dir.path().join(".skillrun/skills").join(name);
    std::fs::create_dir_all(&skill_dir).unwrap();
    std::fs::write(skill_dir.join("SKILL.md"), content).unwrap();
}

// ---------------------------------------------------------------------------
// skillrun init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    skillrun(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .skillrun/config.yaml"));

    assert!(dir.path().join(".skillrun/skills").is_dir());
    assert!(dir.path().join(".skillrun/runs").is_dir());
    assert!(dir.path().join(".skillrun/config.yaml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .skillrun/config.yaml"));
}

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    skillrun(&dir)
        .args(["skill", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

// ---------------------------------------------------------------------------
// skillrun skill
// ---------------------------------------------------------------------------

#[test]
fn skill_list_includes_builtin_catalog() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .args(["skill", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nextjs-security"))
        .stdout(predicate::str::contains("stripe-integration"));

    let orchestrators = json(&dir, &["skill", "list", "--orchestrators"]);
    let names: Vec<&str> = orchestrators
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["fullstack-dev", "nextjs-security", "saas-setup", "security-audit"]
    );
}

#[test]
fn skill_deps_in_document_order() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let deps = json(&dir, &["skill", "deps", "security-audit"]);
    assert_eq!(
        deps,
        serde_json::json!([
            "security-static-analysis",
            "security-dependency",
            "security-secrets-scan",
            "security-code-review",
            "security-report"
        ])
    );
}

#[test]
fn skill_show_unknown_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .args(["skill", "show", "quantum-audit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skill not found: quantum-audit"));
}

#[test]
fn project_skill_overrides_builtin() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_skill(
        &dir,
        "security-report",
        "---\nname: security-report\ndescription: House-style findings report\n---\nUse the team template.\n",
    );

    let skill = json(&dir, &["skill", "show", "security-report"]);
    assert_eq!(skill["purpose"], "House-style findings report");
    assert_eq!(skill["source"]["type"], "file");
    assert_eq!(skill["guidance"], "Use the team template.");
}

#[test]
fn skill_check_reports_dangling_dependency() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir).args(["skill", "check"]).assert().success();

    write_skill(
        &dir,
        "release-train",
        "---\nname: release-train\ndescription: Ship a release\nrequires: [changelog-writer]\n---\n",
    );
    skillrun(&dir)
        .args(["skill", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'release-train' requires unknown skill 'changelog-writer'",
        ));
}

#[test]
fn rust_log_enables_debug_output() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .env("RUST_LOG", "debug")
        .args(["skill", "check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("skill registry loaded"));
    skillrun(&dir)
        .args(["skill", "check"])
        .assert()
        .success()
        .stderr(predicate::str::contains("skill registry loaded").not());
}

// ---------------------------------------------------------------------------
// skillrun run
// ---------------------------------------------------------------------------

#[test]
fn run_start_full_sequence() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let run = json(&dir, &["run", "start", "nextjs-security"]);
    assert_eq!(run["mode"], "full");
    assert_eq!(run["status"], "ready");
    let steps = run["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 10);
    assert_eq!(steps[0]["skill"], "security-overview");
    assert_eq!(steps[9]["skill"], "security-testing");
}

#[test]
fn run_start_targeted_completes_in_one_step() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let run = json(&dir, &["run", "start", "security-audit", "Run", "static", "analysis"]);
    assert_eq!(run["mode"], "targeted");
    assert_eq!(run["steps"].as_array().unwrap().len(), 1);
    let id = run["id"].as_str().unwrap();

    let next = json(&dir, &["run", "next", id]);
    assert_eq!(next["status"], "completed");
    assert_eq!(next["steps"][0]["skill"], "security-static-analysis");
    assert!(dir
        .path()
        .join(format!(".skillrun/runs/{id}/01-security-static-analysis.md"))
        .exists());
}

#[test]
fn run_start_unknown_target_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .args(["run", "start", "quantum-audit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skill not found"));
    assert!(json(&dir, &["run", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn run_pauses_at_checkpoint() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_run(&dir, &["saas-setup"]);

    skillrun(&dir)
        .args(["run", "next", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1 (auth-setup) done"))
        .stdout(predicate::str::contains("Checkpoint: next up is step 2 (database-schema)"));

    let request = std::fs::read_to_string(
        dir.path()
            .join(format!(".skillrun/runs/{id}/01-auth-setup.md")),
    )
    .unwrap();
    assert!(request.starts_with("# Skill: auth-setup"));
    assert!(request.contains("**Step:** 1 of 5 in `saas-setup`"));

    skillrun(&dir)
        .args(["run", "next", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("waiting at a checkpoint"));
}

#[test]
fn run_confirm_then_adjust_then_auto_accept() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_run(&dir, &["nextjs-security"]);

    json(&dir, &["run", "next", id.as_str()]);
    json(&dir, &["run", "confirm", id.as_str()]);
    json(&dir, &["run", "next", id.as_str()]);

    let adjusted = json(
        &dir,
        &["run", "adjust", id.as_str(), "security-headers", "security-testing"],
    );
    assert_eq!(
        adjusted["pending"],
        serde_json::json!(["security-headers", "security-testing"])
    );

    json(&dir, &["run", "next", id.as_str()]);
    let accepted = json(&dir, &["run", "say", id.as_str(), "just", "go"]);
    assert_eq!(accepted["auto_accept"], true);

    let finished = json(&dir, &["run", "next", id.as_str(), "--all"]);
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["steps"][0]["skill"], "security-testing");

    let summary = json(&dir, &["run", "summary", id.as_str()]);
    assert_eq!(
        summary["completed"],
        serde_json::json!([
            "security-overview",
            "security-auth",
            "security-headers",
            "security-testing"
        ])
    );
    assert_eq!(summary["skipped"].as_array().unwrap().len(), 6);
    assert_eq!(summary["checkpoints"], 3);
    assert_eq!(summary["report_fields"][0], "security_score");
}

#[test]
fn run_adjust_with_unknown_skill_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_run(&dir, &["fullstack-dev"]);
    json(&dir, &["run", "next", id.as_str()]);

    skillrun(&dir)
        .args(["run", "adjust", id.as_str(), "backend-api", "made-up-skill"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown skill(s): made-up-skill"));

    let run = json(&dir, &["run", "show", id.as_str()]);
    assert_eq!(run["status"], "awaiting_checkpoint");
    assert!(run["checkpoints"].as_array().unwrap().is_empty());
}

#[test]
fn run_say_rejects_unrecognized_text() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_run(&dir, &["fullstack-dev"]);
    json(&dir, &["run", "next", id.as_str()]);
    skillrun(&dir)
        .args(["run", "say", id.as_str(), "maybe", "later"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized directive 'maybe later'"));
}

#[test]
fn run_confirm_without_checkpoint_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_run(&dir, &["fullstack-dev"]);
    skillrun(&dir)
        .args(["run", "confirm", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no pending checkpoint"));
}

#[test]
fn run_abort_closes_run() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let id = start_run(&dir, &["fullstack-dev"]);
    json(&dir, &["run", "next", id.as_str()]);

    skillrun(&dir)
        .args(["run", "abort", id.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("aborted"));
    skillrun(&dir)
        .args(["run", "next", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already aborted"));

    let summary = json(&dir, &["run", "summary", id.as_str()]);
    assert_eq!(summary["completed"], serde_json::json!(["project-scaffold"]));
    assert_eq!(summary["pending"].as_array().unwrap().len(), 5);
}

#[test]
fn missing_tool_halts_run_when_required() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let config_path = dir.path().join(".skillrun/config.yaml");
    let config = std::fs::read_to_string(&config_path).unwrap();
    let config = config.replace("require_tools: false", "require_tools: true");
    std::fs::write(&config_path, config).unwrap();

    write_skill(
        &dir,
        "lint-pass",
        "---\nname: lint-pass\ndescription: Run the project linter\ntool: skillrun-test-missing-linter\n---\n",
    );
    write_skill(
        &dir,
        "quality-gate",
        "---\nname: quality-gate\ndescription: Quality checks\nrequires: [lint-pass]\n---\n",
    );

    let id = start_run(&dir, &["quality-gate"]);
    skillrun(&dir)
        .args(["run", "next", id.as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 1 (lint-pass) failed"))
        .stderr(predicate::str::contains("skill unavailable"));

    let run = json(&dir, &["run", "show", id.as_str()]);
    assert_eq!(run["status"], "halted");
    assert_eq!(run["steps"][0]["status"], "pending");

    let summary = json(&dir, &["run", "summary", id.as_str()]);
    assert_eq!(summary["failed"]["skill"], "lint-pass");
}

#[test]
fn next_all_json_keeps_completed_steps_when_a_later_step_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let config_path = dir.path().join(".skillrun/config.yaml");
    let config = std::fs::read_to_string(&config_path).unwrap();
    let config = config
        .replace("require_tools: false", "require_tools: true")
        .replace("auto_accept: false", "auto_accept: true");
    std::fs::write(&config_path, config).unwrap();

    write_skill(
        &dir,
        "format-pass",
        "---\nname: format-pass\ndescription: Format the sources\n---\n",
    );
    write_skill(
        &dir,
        "lint-pass",
        "---\nname: lint-pass\ndescription: Run the project linter\ntool: skillrun-test-missing-linter\n---\n",
    );
    write_skill(
        &dir,
        "quality-gate",
        "---\nname: quality-gate\ndescription: Quality checks\nrequires: [format-pass, lint-pass]\n---\n",
    );

    let id = start_run(&dir, &["quality-gate"]);
    let out = skillrun(&dir)
        .args(["--json", "run", "next", id.as_str(), "--all"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("step 2 (lint-pass) failed"));

    let partial: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(partial["status"], "halted");
    let steps = partial["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["skill"], "format-pass");
}

#[test]
fn run_list_filters_by_status() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let kept = start_run(&dir, &["saas-setup"]);
    let aborted = start_run(&dir, &["fullstack-dev"]);
    skillrun(&dir)
        .args(["run", "abort", aborted.as_str()])
        .assert()
        .success();

    let rows = json(&dir, &["run", "list", "--status", "aborted"]);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], aborted.as_str());

    let rows = json(&dir, &["run", "list", "--status", "ready"]);
    assert_eq!(rows[0]["id"], kept.as_str());
    assert_eq!(rows.as_array().unwrap().len(), 1);

    skillrun(&dir)
        .args(["run", "list", "--status", "paused"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown run status 'paused'"));
}

#[test]
fn run_list_shows_runs() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .args(["run", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs yet."));

    let id = start_run(&dir, &["saas-setup"]);
    skillrun(&dir)
        .args(["run", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("0/5"));
}

// ---------------------------------------------------------------------------
// skillrun config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_default_is_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_errors_when_no_skill_source() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".skillrun/config.yaml"),
        "version: 1\nproject:\n  name: demo\nskills:\n  dirs: []\n  builtin: false\n",
    )
    .unwrap();
    skillrun(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn config_show_prints_yaml() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    skillrun(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("targeted_mode: true"));
}
