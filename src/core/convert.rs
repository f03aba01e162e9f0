//! Clash rule-provider payload to sing-box source rule-set conversion.
//!
//! Payloads are handled line by line rather than parsed as YAML: upstream
//! lists come both as `payload:` YAML documents and as plain text, and the
//! same loop covers both.

use crate::domain::model::{Behavior, HeadlessRule, SingBoxRuleSet};

const PROCESS_NAME_PREFIX: &str = "PROCESS-NAME,";

/// Yields the bare rule strings of a payload.
pub fn payload_rules(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line == "payload:" {
            return None;
        }

        match line.strip_prefix("- ") {
            Some(item) => Some(item.trim_matches(|c: char| c == '\'' || c == '"')),
            None => Some(line),
        }
    })
}

pub fn convert_payload(content: &str, behavior: Behavior) -> SingBoxRuleSet {
    let mut rule = HeadlessRule::default();

    for entry in payload_rules(content) {
        match behavior {
            Behavior::Domain => push_domain(&mut rule, entry),
            Behavior::Ipcidr => rule.ip_cidr.push(entry.to_string()),
            Behavior::Classical => {
                if let Some(name) = entry.strip_prefix(PROCESS_NAME_PREFIX) {
                    rule.process_name.push(name.to_string());
                }
            }
        }
    }

    SingBoxRuleSet::new(rule)
}

// `+.example.com` matches the apex and all subdomains; a bare TLD like `+.cn` only the suffix.
fn push_domain(rule: &mut HeadlessRule, entry: &str) {
    match entry.strip_prefix('+') {
        Some(suffix) if suffix.starts_with('.') => {
            rule.domain_suffix.push(suffix.to_string());
            if entry.split('.').count() > 2 {
                rule.domain.push(suffix[1..].to_string());
            }
        }
        _ => rule.domain.push(entry.to_string()),
    }
}

/// Pretty JSON with two-space indentation, as written to the staging directory.
pub fn render(rule_set: &SingBoxRuleSet) -> serde_json::Result<String> {
    serde_json::to_string_pretty(rule_set)
}
