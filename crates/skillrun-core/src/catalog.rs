//! Built-in skill catalog.
//!
//! The four orchestrator families and the sub-skills they sequence. Project
//! skill documents under `.skillrun/skills/` override entries by name.

use crate::error::Result;
use crate::skill::{Skill, SkillHeader, SkillSource};

const CATALOG: &str = r#"
# --- nextjs-security ---------------------------------------------------------
- name: nextjs-security
  description: Harden a Next.js application phase by phase, from threat overview to security tests
  requires:
    - security-overview
    - security-auth
    - security-input-validation
    - security-csrf
    - security-headers
    - security-rate-limiting
    - security-payment
    - security-dependency
    - security-operations
    - security-testing
  summary: [security_score, findings_by_severity, remediation_plan]
- name: security-overview
  description: Map the attack surface, trust boundaries and sensitive data flows
- name: security-auth
  description: Review authentication, session handling and authorization checks
  triggers: [authentication, authorization, sessions]
- name: security-input-validation
  description: Validate and sanitize every untrusted input with schema validation
  triggers: [validation, sanitization, xss, injection]
- name: security-csrf
  description: Protect state-changing requests against cross-site request forgery
- name: security-headers
  description: Configure CSP, HSTS and the other security response headers
  triggers: [csp, hsts]
- name: security-rate-limiting
  description: Throttle abusive clients on authentication and API routes
  triggers: [throttling, brute force]
- name: security-payment
  description: Secure payment flows, webhooks and price integrity
  recommends: [stripe-integration]
  triggers: [payments, webhooks]
- name: security-dependency
  description: Audit third-party packages for known vulnerabilities
  tool: npm
  triggers: [npm audit, dependencies, vulnerable packages]
- name: security-operations
  description: Secrets management, logging hygiene and incident readiness
  triggers: [ops, logging, incident response]
- name: security-testing
  description: Add automated security regression tests to the suite
  recommends: [webapp-testing]
  triggers: [security tests]

# --- security-audit ----------------------------------------------------------
- name: security-audit
  description: Run a full security audit and produce a scored findings report
  requires:
    - security-static-analysis
    - security-dependency
    - security-secrets-scan
    - security-code-review
    - security-report
  summary: [security_score, findings_by_severity, remediation_plan]
- name: security-static-analysis
  description: Run static analysis rules over the codebase and triage results
  tool: semgrep
  triggers: [sast, semgrep]
- name: security-secrets-scan
  description: Scan the repository and its history for committed credentials
  tool: gitleaks
  triggers: [leaked secrets, credentials, gitleaks]
- name: security-code-review
  description: Manual review of security-critical code paths
- name: security-report
  description: Consolidate findings by severity with a remediation plan
  triggers: [findings report]

# --- fullstack-dev -----------------------------------------------------------
- name: fullstack-dev
  description: Build a full-stack feature from scaffold to deployment
  requires:
    - project-scaffold
    - database-schema
    - backend-api
    - frontend-design
    - webapp-testing
    - deployment
  recommends: [systematic-debugging]
  summary: [components_built, test_results, deployment_url]
- name: project-scaffold
  description: Scaffold the repository layout, tooling and CI skeleton
  triggers: [scaffold, bootstrap]
- name: database-schema
  description: Design tables, relations, indexes and migrations
  triggers: [schema, migrations]
- name: backend-api
  description: Implement typed API routes with validation and error handling
  triggers: [api, endpoints]
- name: frontend-design
  description: Build accessible, responsive UI components
  triggers: [ui, components, accessibility]
- name: webapp-testing
  description: Exercise the application end to end in a real browser
  tool: playwright
  triggers: [e2e, end to end, playwright]
- name: deployment
  description: Ship to production with environment configuration and rollback
  triggers: [deploy, release]

# --- saas-setup --------------------------------------------------------------
- name: saas-setup
  description: Stand up the SaaS foundation - auth, data, billing, email, deploy
  requires:
    - auth-setup
    - database-schema
    - stripe-integration
    - email-setup
    - deployment
  summary: [configured_services, environment_variables, next_steps]
- name: auth-setup
  description: Configure user sign-up, sign-in and session management
  triggers: [login, signup]
- name: stripe-integration
  description: Wire subscriptions, checkout and billing webhooks through Stripe
  tool: stripe
  triggers: [stripe, billing, subscriptions]
- name: email-setup
  description: Transactional email delivery with templates and domain auth
  triggers: [email, transactional email]

# --- leaf guidance -----------------------------------------------------------
- name: terraform-guidance
  description: Terraform module layout, state management and plan review conventions
  tool: terraform
- name: systematic-debugging
  description: Reproduce, isolate, hypothesize and verify before fixing
"#;

/// Parse the built-in catalog into skills. Built-in guidance is the skill's
/// purpose under a heading; project documents carry full guidance.
pub fn builtin_skills() -> Result<Vec<Skill>> {
    let headers: Vec<SkillHeader> = serde_yaml::from_str(CATALOG)?;
    Ok(headers
        .into_iter()
        .map(|h| {
            let guidance = format!("# {}\n\n{}", h.name, h.description);
            Skill::from_header(h, guidance, SkillSource::Builtin)
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_parses() {
        let skills = builtin_skills().unwrap();
        assert_eq!(skills.len(), 29);
        assert!(skills.iter().all(|s| s.source == SkillSource::Builtin));
    }

    #[test]
    fn catalog_names_are_unique_and_valid() {
        let skills = builtin_skills().unwrap();
        let mut seen = HashSet::new();
        for skill in &skills {
            crate::paths::validate_slug(&skill.name).unwrap();
            assert!(seen.insert(skill.name.clone()), "duplicate: {}", skill.name);
        }
    }

    #[test]
    fn orchestrators_present() {
        let skills = builtin_skills().unwrap();
        let orchestrators: Vec<&str> = skills
            .iter()
            .filter(|s| s.is_orchestrator())
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(
            orchestrators,
            vec!["nextjs-security", "security-audit", "fullstack-dev", "saas-setup"]
        );
    }
}
