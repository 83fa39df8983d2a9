// Logging utilities
// Structured logging with JSON and human-readable formats

use log::Level;
use serde_json::json;
use std::collections::BTreeMap;

/// Mask sensitive data in logs
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let visible = 4;
    let start: String = chars[..visible].iter().collect();
    let end: String = chars[chars.len() - visible..].iter().collect();

    format!("{}...{}", start, end)
}

fn is_secret_key(key: &str) -> bool {
    let k = key.to_ascii_lowercase();
    k == "password" || k == "pwd" || k == "credentials" || k.contains("secret") || k.contains("token")
}

fn is_account_key(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "user" | "username" | "userid" | "uid"
    )
}

/// Copy of a descriptor metadata bag that is safe to log: secrets are replaced
/// with `***`, account names are partially masked.
pub fn mask_metadata(metadata: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    metadata
        .iter()
        .map(|(k, v)| {
            let shown = if is_secret_key(k) {
                "***".to_string()
            } else if is_account_key(k) {
                mask_sensitive(v)
            } else {
                v.clone()
            };
            (k.clone(), shown)
        })
        .collect()
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let mut phase = None;
    let mut step = None;
    let mut cleaned_message = message.to_string();

    if let Some(start) = message.find("[PHASE:") {
        if let Some(end) = message[start..].find(']') {
            let phase_str = message[start + 7..start + end].trim();
            phase = Some(phase_str.to_string());
            cleaned_message = format!("{} {}", &message[..start], &message[start + end + 1..])
                .trim()
                .to_string();
        }
    }

    if let Some(start) = cleaned_message.find("[STEP:") {
        if let Some(end) = cleaned_message[start..].find(']') {
            let step_str = cleaned_message[start + 6..start + end].trim();
            step = Some(step_str.to_string());
            cleaned_message = format!(
                "{} {}",
                &cleaned_message[..start],
                &cleaned_message[start + end + 1..]
            )
            .trim()
            .to_string();
        }
    }

    (phase, step, cleaned_message)
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
    session: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    if let Some(session) = session {
        log_entry["session"] = json!(session);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn mask_metadata_hides_passwords_and_tokens() {
        let masked = mask_metadata(&bag(&[
            ("password", "PASSWORD_SHOULD_BE_REDACTED"),
            ("clientSecret", "abc"),
            ("authToken", "xyz"),
            ("host", "dc01.corp.local"),
        ]));

        assert_eq!(masked["password"], "***");
        assert_eq!(masked["clientSecret"], "***");
        assert_eq!(masked["authToken"], "***");
        assert_eq!(masked["host"], "dc01.corp.local");
    }

    #[test]
    fn mask_metadata_partially_masks_accounts() {
        let masked = mask_metadata(&bag(&[("user", "CN=svc-idm,OU=Service,DC=corp")]));
        assert!(masked["user"].starts_with("CN=s"));
        assert!(masked["user"].contains("..."));
        assert!(!masked["user"].contains("svc-idm"));
    }

    #[test]
    fn mask_sensitive_short_values_fully_masked() {
        assert_eq!(mask_sensitive("abc"), "***");
        assert_eq!(mask_sensitive("12345678"), "***");
    }

    #[test]
    fn mask_sensitive_long_values_partially_masked() {
        let masked = mask_sensitive("abcdefghijklmnop");
        assert!(masked.starts_with("abcd"), "Start should be visible: {}", masked);
        assert!(masked.ends_with("mnop"), "End should be visible: {}", masked);
        // multi-byte input must not split a character
        assert_eq!(mask_sensitive("ééééééééé"), "éééé...éééé");
    }

    #[test]
    fn parse_log_metadata_extracts_phase_and_step() {
        let (phase, step, msg) =
            parse_log_metadata("[PHASE: wizard] [STEP: systemNew] committed");
        assert_eq!(phase.as_deref(), Some("wizard"));
        assert_eq!(step.as_deref(), Some("systemNew"));
        assert_eq!(msg, "committed");

        let (phase, step, msg) = parse_log_metadata("plain message");
        assert!(phase.is_none() && step.is_none());
        assert_eq!(msg, "plain message");
    }

    #[test]
    fn json_and_text_formats_carry_phase_and_step() {
        let json_line = format_json_log(
            "2026-01-01T00:00:00Z",
            Level::Info,
            "console_wizard",
            "committed",
            Some("wizard"),
            Some("mapping"),
            None,
        );
        let v: serde_json::Value = serde_json::from_str(&json_line).unwrap();
        assert_eq!(v["phase"], "wizard");
        assert_eq!(v["step"], "mapping");
        assert!(v.get("session").is_none());

        let txt = format_human_readable_log(
            "2026-01-01 00:00:00.000",
            Level::Warn,
            "console_wizard",
            "blocked",
            Some("wizard"),
            None,
        );
        assert_eq!(
            txt,
            "[2026-01-01 00:00:00.000] [WARN] [PHASE: wizard] [console_wizard] blocked"
        );
    }
}
