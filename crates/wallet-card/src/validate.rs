//! Configuration validation.
//!
//! [`validate_config`] inspects a raw configuration tree and returns every
//! problem it finds as a human-readable message. An empty list means the tree
//! can be turned into a [`PassConfig`] and built.

use crate::config::PassConfig;
use crate::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::path::Path;

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

    static ref PHONE: Regex = Regex::new(
        r"^[\+]?[(]?[0-9]{1,4}[)]?[-\s\.]?[(]?[0-9]{1,4}[)]?[-\s\.]?[0-9]{1,9}$"
    )
    .unwrap();

    static ref PHONE_FORMATTING: Regex = Regex::new(r"[\s\-\(\)\.]").unwrap();

    static ref URL: Regex = Regex::new(
        r"^https?://(?:[-\w.])+(?:[:\d]+)?(?:/(?:[\w/_.])*(?:\?(?:[\w&=%.])*)?(?:#(?:[\w.])*)?)?$"
    )
    .unwrap();

    static ref COLOR: Regex = Regex::new(r"^rgb\((\d{1,3}),(\d{1,3}),(\d{1,3})\)$").unwrap();
}

/// Identity fields that must be present for a pass to be buildable.
pub const REQUIRED_PASS_FIELDS: [&str; 3] = ["description", "organizationName", "passTypeIdentifier"];

/// Color keys checked for the `rgb(r,g,b)` form.
pub const COLOR_FIELDS: [&str; 3] = ["backgroundColor", "foregroundColor", "labelColor"];

/// Field groups of a generic pass.
pub const FIELD_GROUPS: [&str; 4] = ["primaryFields", "secondaryFields", "auxiliaryFields", "backFields"];

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Phone numbers need a plausible shape and at least ten characters once
/// spacing and punctuation are removed.
pub fn validate_phone(phone: &str) -> bool {
    let cleaned = PHONE_FORMATTING.replace_all(phone, "");
    PHONE.is_match(phone) && cleaned.len() >= 10
}

pub fn validate_url(url: &str) -> bool {
    URL.is_match(url)
}

/// `rgb(r,g,b)` with no spaces and every channel in 0-255.
pub fn validate_color(color: &str) -> bool {
    let Some(caps) = COLOR.captures(color) else {
        return false;
    };
    (1..=3).all(|i| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u16>().ok())
            .map(|v| v <= 255)
            .unwrap_or(false)
    })
}

/// An empty path is acceptable unless `required`; otherwise the file must exist.
pub fn validate_file_exists(path: &str, required: bool) -> bool {
    if path.is_empty() {
        return !required;
    }
    Path::new(path).exists()
}

/// Validate a raw configuration tree.
///
/// Returns all messages in a stable order: missing section, required fields,
/// colors, field entries, assets, signing, QR payload.
pub fn validate_config(config: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(pass) = config.get("pass").filter(|p| !p.is_null()) else {
        errors.push("Missing 'pass' section in configuration".to_string());
        return errors;
    };
    let Some(pass) = pass.as_object() else {
        errors.push("The 'pass' section must be a mapping".to_string());
        return errors;
    };

    for field in REQUIRED_PASS_FIELDS {
        if pass.get(field).map_or(true, Value::is_null) {
            errors.push(format!("Missing required field: pass.{field}"));
        }
    }

    for field in COLOR_FIELDS {
        if let Some(value) = pass.get(field) {
            let valid = value.as_str().map(validate_color).unwrap_or(false);
            if !valid {
                errors.push(format!("Invalid {field} format (use rgb(r,g,b))"));
            }
        }
    }

    if let Some(fields) = pass.get("fields").filter(|f| !f.is_null()) {
        match fields.as_object() {
            Some(_) => validate_fields(fields, &mut errors),
            None => errors.push("pass.fields must be a mapping".to_string()),
        }
    }

    if let Some(assets) = config.get("assets").and_then(Value::as_object) {
        for kind in ["icon", "logo", "photo"] {
            if let Some(path) = assets.get(kind).and_then(Value::as_str) {
                if !path.is_empty() && !validate_file_exists(path, false) {
                    errors.push(format!("Asset file not found: {path}"));
                }
            }
        }
    }

    if let Some(signing) = config.get("signing").and_then(Value::as_object) {
        let enabled = signing.get("enabled").map(crate::config::is_truthy).unwrap_or(false);
        if enabled {
            let cert = signing.get("cert_file").and_then(Value::as_str);
            let key = signing.get("key_file").and_then(Value::as_str);
            match (cert, key) {
                (Some(cert), Some(key)) => {
                    if !validate_file_exists(cert, true) {
                        errors.push(format!("Certificate file not found: {cert}"));
                    }
                    if !validate_file_exists(key, true) {
                        errors.push(format!("Key file not found: {key}"));
                    }
                }
                _ => {
                    let has_p12 = signing
                        .get("p12_file")
                        .and_then(Value::as_str)
                        .filter(|p| !p.is_empty());
                    match has_p12 {
                        Some(p12) if !validate_file_exists(p12, true) => {
                            errors.push(format!("PKCS#12 file not found: {p12}"));
                        }
                        Some(_) => {}
                        None => errors
                            .push("Signing enabled but cert_file or key_file missing".to_string()),
                    }
                }
            }
        }
    }

    if let Some(qr) = config.get("qr_data") {
        if !qr.is_null() && !qr.is_string() {
            errors.push("qr_data must be a string".to_string());
        }
    }

    errors
}

fn validate_fields(fields: &Value, errors: &mut Vec<String>) {
    for group in FIELD_GROUPS {
        let Some(entries) = fields.get(group) else {
            continue;
        };
        let Some(entries) = entries.as_array() else {
            errors.push(format!("{group} must be a list"));
            continue;
        };

        for (i, entry) in entries.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                errors.push(format!("{group}[{i}] must be a dictionary"));
                continue;
            };

            for required in ["key", "label", "value"] {
                if !entry.contains_key(required) {
                    errors.push(format!("{group}[{i}] missing '{required}'"));
                }
            }

            let Some(value) = entry.get("value") else {
                continue;
            };
            let value = crate::config::scalar_to_string(value);
            if value.is_empty() {
                continue;
            }
            let key = entry
                .get("key")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();

            if key.contains("email") {
                if !validate_email(&value) {
                    errors.push(format!("{group}[{i}]: Invalid email format"));
                }
            } else if key.contains("phone") {
                if !validate_phone(&value) {
                    errors.push(format!("{group}[{i}]: Invalid phone format"));
                }
            } else if key.contains("linkedin") || key.contains("github") {
                // Social handles are display text.
            } else if (key.contains("url") || key.contains("website"))
                && value.starts_with("http")
                && !validate_url(&value)
            {
                errors.push(format!("{group}[{i}]: Invalid URL format"));
            }
        }
    }
}

/// Validate and convert in one step.
pub fn validate_and_build(config: &Value) -> std::result::Result<PassConfig, Vec<String>> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(PassConfig::from_validated(config))
    } else {
        Err(errors)
    }
}

/// Fail with [`Error::Validation`] when the tree has any problem.
pub fn ensure_valid(config: &Value) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn minimal() -> Value {
        json!({
            "pass": {
                "description": "Test",
                "organizationName": "Test Org",
                "passTypeIdentifier": "pass.test",
            }
        })
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com"));
        assert!(validate_email("user.name@domain.co.uk"));
        assert!(!validate_email("invalid"));
        assert!(!validate_email("invalid@"));
        assert!(!validate_email("@domain.com"));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("555-123-4567"));
        assert!(validate_phone("1234567890"));
        assert!(!validate_phone("123"));
        assert!(!validate_phone(""));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com"));
        assert!(validate_url("http://example.com/path"));
        assert!(!validate_url("not-a-url"));
        assert!(!validate_url("ftp://example.com"));
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("rgb(255,255,255)"));
        assert!(validate_color("rgb(0,77,153)"));
        assert!(!validate_color("rgb(256,0,0)"));
        assert!(!validate_color("rgb(255,255)"));
        assert!(!validate_color("#ffffff"));
        assert!(!validate_color("rgb(1, 2, 3)"));
    }

    #[test]
    fn test_validate_file_exists() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("test.txt");
        fs::write(&file, "test").unwrap();

        assert!(validate_file_exists(file.to_str().unwrap(), false));
        assert!(!validate_file_exists(dir.path().join("nonexistent.txt").to_str().unwrap(), false));
        assert!(validate_file_exists("", false));
        assert!(!validate_file_exists("", true));
    }

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(validate_config(&minimal()).is_empty());
    }

    #[test]
    fn test_missing_pass_section() {
        let errors = validate_config(&json!({}));
        assert_eq!(errors, vec!["Missing 'pass' section in configuration".to_string()]);
    }

    #[test]
    fn test_empty_pass_names_every_required_field() {
        let errors = validate_config(&json!({"pass": {}}));
        for field in REQUIRED_PASS_FIELDS {
            assert!(errors.iter().any(|e| e.contains(field)), "{field} not reported: {errors:?}");
        }
    }

    #[test]
    fn test_invalid_background_color() {
        let mut config = minimal();
        config["pass"]["backgroundColor"] = json!("invalid");
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.contains("backgroundColor")));
    }

    #[test]
    fn test_one_color_error_per_offending_field() {
        let mut config = minimal();
        config["pass"]["backgroundColor"] = json!("rgb(300,0,0)");
        config["pass"]["foregroundColor"] = json!("rgb(0,0,0)");
        config["pass"]["labelColor"] = json!("rgb(0,999,0)");
        let errors = validate_config(&config);
        let color_errors: Vec<_> = errors.iter().filter(|e| e.contains("Color format")).collect();
        assert_eq!(color_errors.len(), 2);
        assert_eq!(errors.iter().filter(|e| e.contains("backgroundColor")).count(), 1);
        assert_eq!(errors.iter().filter(|e| e.contains("labelColor")).count(), 1);
        assert!(!errors.iter().any(|e| e.contains("foregroundColor")));
    }

    #[test]
    fn test_invalid_email_field() {
        let mut config = minimal();
        config["pass"]["fields"] = json!({
            "secondaryFields": [{"key": "email", "label": "Email", "value": "invalid-email"}]
        });
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.to_lowercase().contains("email")));
    }

    #[test]
    fn test_field_entry_shape() {
        let mut config = minimal();
        config["pass"]["fields"] = json!({
            "primaryFields": [{"key": "name"}, "oops"],
            "backFields": "not a list"
        });
        let errors = validate_config(&config);
        assert!(errors.contains(&"primaryFields[0] missing 'label'".to_string()));
        assert!(errors.contains(&"primaryFields[0] missing 'value'".to_string()));
        assert!(errors.contains(&"primaryFields[1] must be a dictionary".to_string()));
        assert!(errors.contains(&"backFields must be a list".to_string()));
    }

    #[test]
    fn test_social_fields_are_free_text() {
        let mut config = minimal();
        config["pass"]["fields"] = json!({
            "backFields": [
                {"key": "linkedin", "label": "LinkedIn", "value": "linkedin.com/in/someone"},
                {"key": "github", "label": "GitHub", "value": "http://not a url"},
                {"key": "website", "label": "Website", "value": "example.com"}
            ]
        });
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_bad_website_url() {
        let mut config = minimal();
        config["pass"]["fields"] = json!({
            "backFields": [{"key": "website", "label": "Website", "value": "http://bad url"}]
        });
        let errors = validate_config(&config);
        assert_eq!(errors, vec!["backFields[0]: Invalid URL format".to_string()]);
    }

    #[test]
    fn test_missing_asset_file() {
        let mut config = minimal();
        config["assets"] = json!({"icon": "/definitely/not/here.png", "logo": ""});
        let errors = validate_config(&config);
        assert_eq!(errors, vec!["Asset file not found: /definitely/not/here.png".to_string()]);
    }

    #[test]
    fn test_signing_enabled_without_files() {
        let mut config = minimal();
        config["signing"] = json!({"enabled": true});
        let errors = validate_config(&config);
        assert!(errors.contains(&"Signing enabled but cert_file or key_file missing".to_string()));
    }

    #[test]
    fn test_signing_enabled_with_missing_files() {
        let mut config = minimal();
        config["signing"] = json!({"enabled": true, "cert_file": "/no/cert.pem", "key_file": "/no/key.pem"});
        let errors = validate_config(&config);
        assert!(errors.contains(&"Certificate file not found: /no/cert.pem".to_string()));
        assert!(errors.contains(&"Key file not found: /no/key.pem".to_string()));
    }

    #[test]
    fn test_validate_and_build() {
        let built = validate_and_build(&minimal()).unwrap();
        assert_eq!(built.identity.description, "Test");

        let errors = validate_and_build(&json!({"pass": {}})).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_ensure_valid_surfaces_messages_verbatim() {
        let err = ensure_valid(&json!({"pass": {}})).unwrap_err();
        let messages = err.validation_messages().unwrap();
        assert!(messages.contains(&"Missing required field: pass.description".to_string()));
    }
}
