//! pass.json payload.
//!
//! [`build_pass_document`] turns a validated [`PassConfig`] and the prepared
//! assets into the JSON document Wallet reads. It is pure: nothing is written
//! to disk here.

use crate::assets::ResolvedAssets;
use crate::config::{Field, PassConfig, DUMMY_TEAM_IDENTIFIER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Barcode format written for every QR barcode.
pub const BARCODE_FORMAT_QR: &str = "PKBarcodeFormatQR";

/// Barcode message encoding.
pub const BARCODE_ENCODING: &str = "iso-8859-1";

/// Key of the header field that marks the photo.
pub const PHOTO_FIELD_KEY: &str = "photo";

/// Top-level pass.json document for a generic pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassDocument {
    pub format_version: u32,
    pub pass_type_identifier: String,
    pub serial_number: String,
    pub team_identifier: String,
    pub organization_name: String,
    pub description: String,
    pub logo_text: String,
    pub foreground_color: String,
    pub background_color: String,
    pub label_color: String,
    pub generic: GenericFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcodes: Option<Vec<Barcode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_date: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacons: Option<Value>,
}

/// Field groups of the `generic` pass style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericFields {
    pub primary_fields: Vec<Field>,
    pub secondary_fields: Vec<Field>,
    pub auxiliary_fields: Vec<Field>,
    pub back_fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_fields: Option<Vec<Field>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub message: String,
    pub format: String,
    pub message_encoding: String,
}

impl Barcode {
    /// A QR barcode carrying `message`.
    pub fn qr(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            format: BARCODE_FORMAT_QR.to_string(),
            message_encoding: BARCODE_ENCODING.to_string(),
        }
    }
}

/// Build the pass document.
///
/// A blank team identifier is replaced with a well-formed dummy so unsigned
/// passes still carry the field. The photo is referenced from a `photo`
/// header field by path; archive staging blanks that path and copies the
/// photo into the strip image. A barcode is added only when `qr_data` is
/// non-empty and a QR raster was produced.
pub fn build_pass_document(config: &PassConfig, assets: &ResolvedAssets) -> PassDocument {
    let identity = &config.identity;
    let team_identifier = if identity.team_identifier.trim().is_empty() {
        DUMMY_TEAM_IDENTIFIER.to_string()
    } else {
        identity.team_identifier.clone()
    };

    let header_fields = assets
        .photo
        .as_ref()
        .filter(|p| p.exists())
        .map(|p| vec![Field::new(PHOTO_FIELD_KEY, "", p.display().to_string())]);

    let barcodes = match (config.qr_data.as_deref(), assets.qr.as_ref()) {
        (Some(data), Some(qr)) if !data.is_empty() && qr.exists() => Some(vec![Barcode::qr(data)]),
        _ => None,
    };

    PassDocument {
        format_version: 1,
        pass_type_identifier: identity.pass_type_identifier.clone(),
        serial_number: identity.serial_number.clone(),
        team_identifier,
        organization_name: identity.organization_name.clone(),
        description: identity.description.clone(),
        logo_text: identity.logo_text.clone(),
        foreground_color: config.appearance.foreground.to_string(),
        background_color: config.appearance.background.to_string(),
        label_color: config.appearance.label.to_string(),
        generic: GenericFields {
            primary_fields: config.fields.primary.clone(),
            secondary_fields: config.fields.secondary.clone(),
            auxiliary_fields: config.fields.auxiliary.clone(),
            back_fields: config.fields.back.clone(),
            header_fields,
        },
        barcodes,
        relevant_date: config.relevant_date.clone(),
        locations: config.locations.clone(),
        beacons: config.beacons.clone(),
    }
}
