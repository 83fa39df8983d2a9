// Field validation utilities
//
// Validators return `anyhow::Result<()>`; the error text is what the console shows next to the
// failing field.

use anyhow::Result;
use regex::Regex;

/// Signature every form field validator follows.
pub type FieldValidator = fn(&str) -> Result<()>;

/// Validate a system / object-class code: letters, digits, `_`, `-` and `.`.
pub fn validate_code(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Code is required"));
    }
    if s.len() > 255 {
        return Err(anyhow::anyhow!("Code cannot exceed 255 characters"));
    }

    let code_re = Regex::new(r"^[A-Za-z0-9_.\-]+$")
        .map_err(|e| anyhow::anyhow!("Internal error: failed to compile code regex: {}", e))?;
    if !code_re.is_match(s) {
        return Err(anyhow::anyhow!(
            "Code may only contain letters, digits, '_', '-' and '.'"
        ));
    }
    Ok(())
}

/// Validate a TCP port number.
pub fn validate_port(value: &str) -> Result<()> {
    let s = value.trim();
    match s.parse::<u32>() {
        Ok(p) if (1..=65535).contains(&p) => Ok(()),
        Ok(_) => Err(anyhow::anyhow!("Port must be between 1 and 65535")),
        Err(_) => Err(anyhow::anyhow!("Port must be a number")),
    }
}

/// Validate a host name or IP literal (no scheme, no path).
pub fn validate_host(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Host is required"));
    }
    if s.contains("://") || s.contains('/') {
        return Err(anyhow::anyhow!(
            "Host must not contain a scheme or path (e.g. ldap.example.com)"
        ));
    }

    let host_re = Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9\-.:\[\]]*[A-Za-z0-9\]])?$")
        .map_err(|e| anyhow::anyhow!("Internal error: failed to compile host regex: {}", e))?;
    if !host_re.is_match(s) {
        return Err(anyhow::anyhow!("Host contains invalid characters: '{}'", s));
    }
    Ok(())
}

/// Validate an LDAP distinguished name (basic shape: comma-separated `attr=value` parts).
pub fn validate_dn(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Distinguished name is required"));
    }

    let rdn_re = Regex::new(r"^[A-Za-z][A-Za-z0-9\-]*=.+$")
        .map_err(|e| anyhow::anyhow!("Internal error: failed to compile DN regex: {}", e))?;
    for part in s.split(',') {
        if !rdn_re.is_match(part.trim()) {
            return Err(anyhow::anyhow!(
                "Distinguished name part '{}' is not of the form attr=value",
                part.trim()
            ));
        }
    }
    Ok(())
}

/// Validate an SQL identifier (table / column), optionally schema-qualified.
pub fn validate_sql_identifier(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("Identifier is required"));
    }

    let lowered = s.to_ascii_lowercase();
    if lowered.contains(';') || lowered.contains("--") || lowered.contains("/*") {
        return Err(anyhow::anyhow!("Identifier contains invalid characters"));
    }

    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() > 2 {
        return Err(anyhow::anyhow!(
            "Identifier must be one- or two-part name (e.g. public.users)"
        ));
    }

    let ident_re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| {
        anyhow::anyhow!("Internal error: failed to compile identifier regex: {}", e)
    })?;
    for p in parts {
        if !ident_re.is_match(p.trim()) {
            return Err(anyhow::anyhow!("Invalid identifier: '{}'", p));
        }
    }
    Ok(())
}

/// Validate a CSV source path (absolute, `.csv` extension).
pub fn validate_csv_path(value: &str) -> Result<()> {
    let s = value.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("File path is required"));
    }
    let absolute = s.starts_with('/') || s.get(1..3) == Some(":\\");
    if !absolute {
        return Err(anyhow::anyhow!("File path must be absolute"));
    }
    if !s.to_ascii_lowercase().ends_with(".csv") {
        return Err(anyhow::anyhow!("File must have a .csv extension"));
    }
    Ok(())
}

/// Validate a single-character CSV separator.
pub fn validate_separator(value: &str) -> Result<()> {
    if value.chars().count() != 1 {
        return Err(anyhow::anyhow!("Separator must be exactly one character"));
    }
    Ok(())
}

/// Validate a "true"/"false" toggle value.
pub fn validate_toggle(value: &str) -> Result<()> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "false" => Ok(()),
        _ => Err(anyhow::anyhow!("Value must be true or false")),
    }
}

/// Validate a record identifier (UUID).
pub fn validate_uuid(value: &str) -> Result<()> {
    uuid::Uuid::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| anyhow::anyhow!("Value must be a record identifier (UUID)"))
}

/// Validate a mapping operation type.
pub fn validate_operation_type(value: &str) -> Result<()> {
    crate::models::descriptor::OperationType::parse(value)
        .map(|_| ())
        .ok_or_else(|| anyhow::anyhow!("Operation type must be PROVISIONING or SYNCHRONIZATION"))
}
