//! Configuration tree loading, merging and environment overrides.
//!
//! Every function here is a pure transformation over [`serde_json::Value`]
//! trees, apart from [`load_config`] and [`save_config`] which touch the
//! filesystem. The process environment is never read implicitly: callers pass
//! it in, typically as `std::env::vars()`.

use crate::{Error, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Prefix marking an environment variable as a configuration override.
pub const ENV_PREFIX: &str = "WALLET_CARD_";

/// Serialization format for [`save_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl std::str::FromStr for ConfigFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(Error::Config(format!("Unsupported format: {other}"))),
        }
    }
}

/// The built-in default configuration tree.
pub fn default_config() -> Value {
    json!({
        "pass": {
            "passTypeIdentifier": "pass.com.example.generic",
            "serialNumber": "123456789",
            "teamIdentifier": "",
            "organizationName": "My Organization",
            "description": "Digital Business Card",
            "logoText": "",
            "foregroundColor": "rgb(255,255,255)",
            "backgroundColor": "rgb(0,77,153)",
            "labelColor": "rgb(255,255,255)",
            "fields": {
                "primaryFields": [],
                "secondaryFields": [],
                "auxiliaryFields": [],
                "backFields": [],
            },
        },
        "assets": {},
        "signing": {
            "enabled": false,
        },
    })
}

/// Recursively merge `overlay` onto `base`.
///
/// Objects merge key by key; any other overlay value (arrays included)
/// replaces the base value outright.
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut out = base_map.clone();
            for (key, value) in overlay_map {
                let merged = match out.get(key) {
                    Some(existing) => merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (_, other) => other.clone(),
    }
}

/// Apply `WALLET_CARD_*` overrides from an explicit environment map.
///
/// The name after the prefix is lower-cased and split on `_` into a key path.
/// At each level, runs of segments are matched against existing keys
/// ignoring case and separators, so `WALLET_CARD_PASS_ORGANIZATION_NAME`
/// lands on `pass.organizationName` and `WALLET_CARD_QR_DATA` on `qr_data`.
/// Unmatched segments create new keys. Leaf values are stored as strings.
pub fn apply_overrides<I, K, V>(config: Value, env: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut config = match config {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    for (key, value) in env {
        let key = key.as_ref();
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = rest
            .to_lowercase()
            .split('_')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            continue;
        }
        debug!(variable = key, "applying config override");
        set_path(&mut config, &segments, Value::String(value.into()));
    }

    config
}

fn set_path(node: &mut Value, segments: &[String], leaf: Value) {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let (key, consumed) = resolve_key(map, segments);
    let remaining = &segments[consumed..];

    if remaining.is_empty() {
        map.insert(key, leaf);
    } else {
        let child = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
        set_path(child, remaining, leaf);
    }
}

/// Snake-case keys of the schema that may be absent from the tree being overridden.
const KNOWN_COMPOUND_KEYS: &[&str] = &["qr_data", "cert_file", "key_file", "p12_file"];

/// Pick the key matched by the longest run of leading segments, preferring
/// keys already present in `map`.
fn resolve_key(map: &Map<String, Value>, segments: &[String]) -> (String, usize) {
    for take in (1..=segments.len()).rev() {
        let joined: String = segments[..take].concat();
        let found = map
            .keys()
            .find(|existing| normalize_key(existing) == joined);
        if let Some(existing) = found {
            return (existing.clone(), take);
        }
    }
    for take in (2..=segments.len()).rev() {
        let snake = segments[..take].join("_");
        if KNOWN_COMPOUND_KEYS.contains(&snake.as_str()) {
            return (snake, take);
        }
    }
    (segments[0].clone(), 1)
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Load a configuration with the built-in defaults as base.
///
/// See [`load_config_over`].
pub fn load_config<I, K, V>(path: Option<&Path>, env: I) -> Result<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    load_config_over(default_config(), path, env)
}

/// Load a configuration on top of `base`.
///
/// The file at `path` (YAML for `.yaml`/`.yml`, JSON for `.json`) is merged over
/// `base`, then environment overrides are applied. A `path` that does not exist
/// is skipped with a warning and the base is used as-is.
///
/// # Errors
///
/// Returns [`Error::Config`] for unsupported extensions or a top level that is
/// not a mapping, and [`Error::Yaml`]/[`Error::Json`] for parse failures.
pub fn load_config_over<I, K, V>(base: Value, path: Option<&Path>, env: I) -> Result<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let config = match path {
        Some(path) if path.exists() => {
            let file_config = load_file(path)?;
            merge(&base, &file_config)
        }
        Some(path) => {
            warn!(path = %path.display(), "config file not found, using defaults");
            base
        }
        None => base,
    };

    Ok(apply_overrides(config, env))
}

fn load_file(path: &Path) -> Result<Value> {
    let suffix = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let text = fs::read_to_string(path)?;

    let value: Value = match suffix.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&text)?,
        "json" => serde_json::from_str(&text)?,
        other => {
            return Err(Error::Config(format!(
                "Unsupported config file format: .{other}"
            )))
        }
    };

    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        _ => Err(Error::Config(format!(
            "Config file must contain a mapping: {}",
            path.display()
        ))),
    }
}

/// Write a configuration tree to `path`, creating parent directories.
pub fn save_config(config: &Value, path: impl AsRef<Path>, format: ConfigFormat) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let text = match format {
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
    };
    fs::write(path, text)?;

    Ok(())
}
