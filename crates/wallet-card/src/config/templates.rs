//! Style presets.
//!
//! A template is plain data: a name, a human title and a set of defaults that
//! sit between the built-in defaults and the user's own configuration.

use super::loader::{default_config, merge};
use crate::{Error, Result};
use serde_json::{json, Value};

/// A named style preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    /// Name used on the command line, e.g. `classic-blue`.
    pub name: &'static str,
    /// One-line human description.
    pub title: &'static str,
    /// Pass description written into pass.json.
    pub description: &'static str,
    pub foreground_color: &'static str,
    pub background_color: &'static str,
    pub label_color: &'static str,
}

/// Every available preset, in listing order.
pub const TEMPLATES: &[Template] = &[
    Template {
        name: "classic-blue",
        title: "Classic Blue - Professional & Trustworthy",
        description: "Classic Blue Business Card",
        foreground_color: "rgb(255,255,255)",
        background_color: "rgb(0,77,153)",
        label_color: "rgb(255,255,255)",
    },
    Template {
        name: "modern-dark",
        title: "Modern Dark - Sleek & Contemporary",
        description: "Modern Dark Business Card",
        foreground_color: "rgb(255,255,255)",
        background_color: "rgb(30,30,30)",
        label_color: "rgb(200,200,200)",
    },
    Template {
        name: "professional-green",
        title: "Professional Green - Fresh & Growth-Oriented",
        description: "Professional Green Business Card",
        foreground_color: "rgb(255,255,255)",
        background_color: "rgb(34,139,34)",
        label_color: "rgb(255,255,255)",
    },
    Template {
        name: "elegant-purple",
        title: "Elegant Purple - Creative & Sophisticated",
        description: "Elegant Purple Business Card",
        foreground_color: "rgb(255,255,255)",
        background_color: "rgb(138,43,226)",
        label_color: "rgb(255,255,255)",
    },
    Template {
        name: "bold-red",
        title: "Bold Red - Energetic & Attention-Grabbing",
        description: "Bold Red Business Card",
        foreground_color: "rgb(255,255,255)",
        background_color: "rgb(178,34,34)",
        label_color: "rgb(255,255,255)",
    },
    Template {
        name: "minimalist-light",
        title: "Minimalist Light - Clean & Simple",
        description: "Minimalist Light Business Card",
        foreground_color: "rgb(0,0,0)",
        background_color: "rgb(255,255,255)",
        label_color: "rgb(100,100,100)",
    },
    Template {
        name: "business-card",
        title: "Business Card - Legacy template",
        description: "Digital Business Card",
        foreground_color: "rgb(255,255,255)",
        background_color: "rgb(0,77,153)",
        label_color: "rgb(255,255,255)",
    },
];

/// Name of the preset used when none is requested.
pub const DEFAULT_TEMPLATE: &str = "classic-blue";

impl Template {
    /// Look a preset up by name (case-insensitive).
    pub fn find(name: &str) -> Option<&'static Template> {
        TEMPLATES.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Look a preset up by name, failing with [`Error::Config`] when unknown.
    pub fn get(name: &str) -> Result<&'static Template> {
        Self::find(name).ok_or_else(|| Error::Config(format!("Unknown template: {name}")))
    }

    /// The preset as a partial configuration tree.
    ///
    /// Field groups carry the business-card skeleton (name, title, email,
    /// phone, social links) with empty values.
    pub fn config(&self) -> Value {
        json!({
            "pass": {
                "passTypeIdentifier": "pass.com.example.businesscard",
                "organizationName": "Business Card",
                "description": self.description,
                "foregroundColor": self.foreground_color,
                "backgroundColor": self.background_color,
                "labelColor": self.label_color,
                "fields": {
                    "primaryFields": [
                        {"key": "name", "label": "Name", "value": ""}
                    ],
                    "secondaryFields": [
                        {"key": "title", "label": "Title", "value": ""},
                        {"key": "email", "label": "Email", "value": ""}
                    ],
                    "auxiliaryFields": [
                        {"key": "phone", "label": "Phone", "value": ""}
                    ],
                    "backFields": [
                        {"key": "linkedin", "label": "LinkedIn", "value": ""},
                        {"key": "github", "label": "GitHub", "value": ""},
                        {"key": "website", "label": "Website", "value": ""}
                    ],
                },
            },
            "assets": {},
            "qr_data": "",
            "signing": {
                "enabled": false,
            },
        })
    }

    /// Built-in defaults with this preset layered on top.
    ///
    /// Use this as the base for [`super::load_config_over`] so the user's file
    /// and environment still take precedence over the preset.
    pub fn base_config(&self) -> Value {
        merge(&default_config(), &self.config())
    }

    /// Merge a user configuration over this preset.
    pub fn apply(&self, user: &Value) -> Value {
        merge(&self.config(), user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_is_findable_and_valid() {
        for template in TEMPLATES {
            assert_eq!(Template::find(template.name), Some(template));
            let errors = crate::validate::validate_config(&template.base_config());
            assert!(errors.is_empty(), "{}: {:?}", template.name, errors);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(Template::find("MODERN-DARK").map(|t| t.name), Some("modern-dark"));
        assert!(Template::find("neon-pink").is_none());
        assert!(Template::get("neon-pink").is_err());
    }

    #[test]
    fn test_default_template_exists() {
        assert!(Template::find(DEFAULT_TEMPLATE).is_some());
    }

    #[test]
    fn test_user_values_override_preset() {
        let template = Template::get("modern-dark").unwrap();
        let merged = template.apply(&json!({
            "pass": {"description": "Mine", "fields": {"primaryFields": []}}
        }));
        assert_eq!(merged["pass"]["description"], "Mine");
        assert_eq!(merged["pass"]["backgroundColor"], "rgb(30,30,30)");
        assert_eq!(merged["pass"]["fields"]["primaryFields"], json!([]));
        assert_eq!(merged["pass"]["fields"]["backFields"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_base_config_keeps_default_identity() {
        let base = Template::get("bold-red").unwrap().base_config();
        assert_eq!(base["pass"]["serialNumber"], "123456789");
        assert_eq!(base["pass"]["backgroundColor"], "rgb(178,34,34)");
    }
}
