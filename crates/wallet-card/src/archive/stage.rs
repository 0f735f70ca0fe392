//! Staging directory layout.

use crate::assets::ResolvedAssets;
use crate::pass::{PassDocument, PHOTO_FIELD_KEY};
use crate::Result;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the pass JSON payload.
pub const PASS_JSON_NAME: &str = "pass.json";

/// Generic passes surface the photo through the strip image slot.
pub const STRIP_NAME: &str = "strip.png";

/// Populate `staging_dir` with pass.json and the image members.
///
/// The photo header field, and any header value that looks like a filesystem
/// path, is blanked before pass.json is written. The photo is copied to
/// `strip.png`; icon and logo are copied under their canonical names. The QR raster is not staged;
/// the pass carries its payload as a barcode instead.
pub fn stage_pass(staging_dir: &Path, document: &PassDocument, assets: &ResolvedAssets) -> Result<()> {
    fs::create_dir_all(staging_dir)?;

    let mut clean = document.clone();
    if let Some(header) = clean.generic.header_fields.as_mut() {
        for field in header.iter_mut() {
            let path_like = field
                .value
                .as_str()
                .is_some_and(|v| v.contains('/') || v.contains('\\'));
            if field.key == PHOTO_FIELD_KEY || path_like {
                field.value = Value::String(String::new());
            }
        }
    }

    let json = serde_json::to_vec_pretty(&clean)?;
    fs::write(staging_dir.join(PASS_JSON_NAME), json)?;

    copy_member(&assets.icon, staging_dir, "icon.png")?;
    copy_member(&assets.logo, staging_dir, "logo.png")?;
    if let Some(photo) = assets.photo.as_deref().filter(|p| p.exists()) {
        copy_member(photo, staging_dir, STRIP_NAME)?;
    }

    Ok(())
}

fn copy_member(source: &Path, staging_dir: &Path, name: &str) -> Result<()> {
    fs::copy(source, staging_dir.join(name))?;
    debug!(member = name, source = %source.display(), "Staged");
    Ok(())
}
