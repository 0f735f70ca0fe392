//! Pass configuration.
//!
//! Configuration arrives as a loosely typed tree ([`serde_json::Value`]) so that
//! defaults, template presets, config files and environment overrides can be
//! merged generically (see [`loader`]). Once a tree passes
//! [`crate::validate::validate_config`] it is converted into the typed
//! [`PassConfig`] that the rest of the pipeline consumes.
//!
//! # Raw layout
//!
//! | Section | Contents |
//! |---------|----------|
//! | `pass` | identity strings, the three colors, `fields`, optional `relevantDate`/`locations`/`beacons` |
//! | `assets` | optional `icon`, `logo`, `photo` source paths |
//! | `qr_data` | optional barcode payload |
//! | `signing` | `enabled`, `cert_file`, `key_file`, optional `p12_file`/`password` |

pub mod loader;
pub mod templates;

pub use loader::{apply_overrides, default_config, load_config, load_config_over, merge, save_config, ConfigFormat};
pub use templates::Template;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Placeholder team identifier used when none is configured.
///
/// Some Wallet versions refuse passes without a 10-character team identifier,
/// even unsigned ones.
pub const DUMMY_TEAM_IDENTIFIER: &str = "TEAMID1234";

/// An RGB color, rendered in pass.json as `rgb(r,g,b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    /// Default pass background, a dark blue.
    pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0, 77, 153);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses the strict `rgb(r,g,b)` form: no spaces, 1-3 digits per channel, each 0-255.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let inner = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| format!("not an rgb(r,g,b) color: {s}"))?;

        let channels: Vec<&str> = inner.split(',').collect();
        if channels.len() != 3 {
            return Err(format!("expected three channels: {s}"));
        }

        let mut parsed = [0u8; 3];
        for (slot, channel) in parsed.iter_mut().zip(&channels) {
            if channel.is_empty() || channel.len() > 3 || !channel.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("invalid channel '{channel}' in {s}"));
            }
            let value: u16 = channel
                .parse()
                .map_err(|_| format!("invalid channel '{channel}' in {s}"))?;
            *slot = u8::try_from(value).map_err(|_| format!("channel {value} out of range in {s}"))?;
        }

        Ok(Rgb::new(parsed[0], parsed[1], parsed[2]))
    }
}

/// One entry of a pass field group.
///
/// `value` keeps its JSON type, and any other Wallet field key
/// (`textAlignment`, `numberStyle`, `changeMessage`, ...) rides along in
/// `extra` so the entry reaches pass.json unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }
}

/// Identifiers and naming of the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub pass_type_identifier: String,
    pub serial_number: String,
    /// May be blank; the pass builder substitutes a team id in that case.
    pub team_identifier: String,
    pub organization_name: String,
    pub description: String,
    pub logo_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appearance {
    pub foreground: Rgb,
    pub background: Rgb,
    pub label: Rgb,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            foreground: Rgb::WHITE,
            background: Rgb::DEFAULT_BACKGROUND,
            label: Rgb::WHITE,
        }
    }
}

/// The four generic-pass field groups, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub primary: Vec<Field>,
    pub secondary: Vec<Field>,
    pub auxiliary: Vec<Field>,
    pub back: Vec<Field>,
}

/// Optional source images supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPaths {
    pub icon: Option<PathBuf>,
    pub logo: Option<PathBuf>,
    pub photo: Option<PathBuf>,
}

/// Signing material named by the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningConfig {
    pub enabled: bool,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub p12_file: Option<PathBuf>,
    pub password: Option<String>,
}

/// A validated pass configuration.
///
/// Build one with [`PassConfig::from_value`], which runs the validator first and
/// refuses trees that produce any validation message.
#[derive(Debug, Clone, PartialEq)]
pub struct PassConfig {
    pub identity: Identity,
    pub appearance: Appearance,
    pub fields: Fields,
    pub assets: AssetPaths,
    pub qr_data: Option<String>,
    pub signing: SigningConfig,
    pub relevant_date: Option<Value>,
    pub locations: Option<Value>,
    pub beacons: Option<Value>,
}

impl PassConfig {
    /// Validate a raw configuration tree and convert it.
    ///
    /// Returns every validation message when the tree is not buildable.
    pub fn from_value(raw: &Value) -> std::result::Result<Self, Vec<String>> {
        crate::validate::validate_and_build(raw)
    }

    /// Convert a tree that has already passed validation.
    ///
    /// Values the validator does not require fall back to the built-in defaults.
    pub(crate) fn from_validated(raw: &Value) -> Self {
        let pass = raw.get("pass").cloned().unwrap_or(Value::Null);
        let text = |key: &str, default: &str| -> String {
            pass.get(key).map(scalar_to_string).unwrap_or_else(|| default.to_string())
        };
        let color = |key: &str, default: Rgb| -> Rgb {
            pass.get(key)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        let identity = Identity {
            pass_type_identifier: text("passTypeIdentifier", "pass.com.example.generic"),
            serial_number: text("serialNumber", "123456789"),
            team_identifier: text("teamIdentifier", ""),
            organization_name: text("organizationName", "My Organization"),
            description: text("description", "Digital Business Card"),
            logo_text: text("logoText", ""),
        };

        let defaults = Appearance::default();
        let appearance = Appearance {
            foreground: color("foregroundColor", defaults.foreground),
            background: color("backgroundColor", defaults.background),
            label: color("labelColor", defaults.label),
        };

        let groups = pass.get("fields");
        let group = |name: &str| -> Vec<Field> {
            groups
                .and_then(|g| g.get(name))
                .and_then(Value::as_array)
                .map(|entries| entries.iter().filter_map(field_from_value).collect())
                .unwrap_or_default()
        };
        let fields = Fields {
            primary: group("primaryFields"),
            secondary: group("secondaryFields"),
            auxiliary: group("auxiliaryFields"),
            back: group("backFields"),
        };

        let assets_section = raw.get("assets");
        let asset = |name: &str| -> Option<PathBuf> {
            assets_section
                .and_then(|a| a.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        };
        let assets = AssetPaths {
            icon: asset("icon"),
            logo: asset("logo"),
            photo: asset("photo"),
        };

        let signing_section = raw.get("signing");
        let signing_path = |name: &str| -> Option<PathBuf> {
            signing_section
                .and_then(|s| s.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
        };
        let signing = SigningConfig {
            enabled: signing_section
                .and_then(|s| s.get("enabled"))
                .map(is_truthy)
                .unwrap_or(false),
            cert_file: signing_path("cert_file"),
            key_file: signing_path("key_file"),
            p12_file: signing_path("p12_file"),
            password: signing_section
                .and_then(|s| s.get("password"))
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        Self {
            identity,
            appearance,
            fields,
            assets,
            qr_data: raw.get("qr_data").and_then(Value::as_str).map(str::to_string),
            signing,
            relevant_date: pass.get("relevantDate").cloned(),
            locations: pass.get("locations").cloned(),
            beacons: pass.get("beacons").cloned(),
        }
    }
}

/// Render a scalar config value as text; strings are taken verbatim.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Environment overrides arrive as strings, so `"true"`/`"1"` count as enabled.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        Value::Number(n) => n.as_i64().map(|n| n != 0).unwrap_or(false),
        _ => false,
    }
}

fn field_from_value(value: &Value) -> Option<Field> {
    let mut extra = value.as_object()?.clone();
    let mut text = |name: &str| extra.remove(name).as_ref().map(scalar_to_string).unwrap_or_default();
    let key = text("key");
    let label = text("label");
    let value = extra.remove("value").unwrap_or(Value::Null);
    Some(Field { key, label, value, extra })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rgb_parse_and_display() {
        let c: Rgb = "rgb(0,77,153)".parse().unwrap();
        assert_eq!(c, Rgb::new(0, 77, 153));
        assert_eq!(c.to_string(), "rgb(0,77,153)");
    }

    #[test]
    fn test_rgb_rejects_malformed() {
        assert!("rgb(256,0,0)".parse::<Rgb>().is_err());
        assert!("rgb(255,255)".parse::<Rgb>().is_err());
        assert!("rgb(1, 2, 3)".parse::<Rgb>().is_err());
        assert!("#ffffff".parse::<Rgb>().is_err());
        assert!("rgb(0001,0,0)".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_from_validated_applies_defaults() {
        let raw = json!({
            "pass": {
                "description": "Test Card",
                "organizationName": "Test Org",
                "passTypeIdentifier": "pass.test.card",
            }
        });
        let config = PassConfig::from_validated(&raw);
        assert_eq!(config.identity.serial_number, "123456789");
        assert_eq!(config.identity.team_identifier, "");
        assert_eq!(config.appearance, Appearance::default());
        assert!(config.fields.primary.is_empty());
        assert_eq!(config.qr_data, None);
        assert!(!config.signing.enabled);
        assert!(config.relevant_date.is_none());
    }

    #[test]
    fn test_from_validated_reads_every_section() {
        let raw = json!({
            "pass": {
                "description": "Card",
                "organizationName": "Org",
                "passTypeIdentifier": "pass.x",
                "serialNumber": 42,
                "backgroundColor": "rgb(30,30,30)",
                "fields": {
                    "primaryFields": [{"key": "name", "label": "Name", "value": "Ada"}],
                    "backFields": [{"key": "n", "label": "N", "value": 7}]
                },
                "relevantDate": "2026-01-01T10:00:00Z",
                "locations": [{"latitude": 1.0, "longitude": 2.0}]
            },
            "assets": {"icon": "icon-src.png", "logo": ""},
            "qr_data": "https://example.com",
            "signing": {"enabled": "true", "cert_file": "c.pem", "key_file": "k.pem"}
        });
        let config = PassConfig::from_validated(&raw);
        assert_eq!(config.identity.serial_number, "42");
        assert_eq!(config.appearance.background, Rgb::new(30, 30, 30));
        assert_eq!(config.fields.primary[0], Field::new("name", "Name", "Ada"));
        assert_eq!(config.fields.back[0].value, json!(7));
        assert_eq!(config.assets.icon, Some(PathBuf::from("icon-src.png")));
        assert_eq!(config.assets.logo, None);
        assert_eq!(config.qr_data.as_deref(), Some("https://example.com"));
        assert!(config.signing.enabled);
        assert_eq!(config.signing.cert_file, Some(PathBuf::from("c.pem")));
        assert!(config.relevant_date.is_some());
        assert!(config.locations.is_some());
        assert!(config.beacons.is_none());
    }

    #[test]
    fn test_field_entries_keep_types_and_extra_keys() {
        let entry = json!({
            "key": "balance",
            "label": "Balance",
            "value": 42,
            "numberStyle": "PKNumberStyleDecimal",
            "textAlignment": "PKTextAlignmentRight"
        });
        let raw = json!({
            "pass": {
                "description": "Card",
                "organizationName": "Org",
                "passTypeIdentifier": "pass.x",
                "fields": {"auxiliaryFields": [entry.clone()]}
            }
        });
        let config = PassConfig::from_validated(&raw);
        let field = &config.fields.auxiliary[0];
        assert_eq!(field.value, json!(42));
        assert_eq!(field.extra["numberStyle"], "PKNumberStyleDecimal");
        assert_eq!(serde_json::to_value(field).unwrap(), entry);
    }
}
