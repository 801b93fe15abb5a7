use serde_json::{json, Value};

/// Create a mock rule body.
///
/// The body is opaque to storage; this one resembles a single-query threshold rule.
///
/// # Arguments
/// - `title` - Used for the summary annotation so bodies differ between rules
///
/// # Returns
/// - `Value` - JSON rule body
pub fn mock_rule_body(title: &str) -> Value {
    json!({
        "condition": "A",
        "data": [{
            "refId": "A",
            "datasourceUid": "prometheus",
            "model": { "expr": "up == 0" }
        }],
        "labels": { "severity": "critical" },
        "annotations": { "summary": title }
    })
}

/// Title given to fixture rules.
pub fn mock_rule_title(uid: &str) -> String {
    format!("Rule {}", uid)
}
