//! QR code rasterisation and vCard payloads.

use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::fmt;
use std::path::Path;

/// Pixels per QR module before the final resize.
pub const BOX_SIZE: u32 = 10;

/// Default side length of a generated QR image.
pub const DEFAULT_QR_SIZE: u32 = 200;

/// Default file name of a generated QR image.
pub const DEFAULT_QR_NAME: &str = "qr.png";

/// Error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrLevel {
    /// Used for the pass's own QR.
    #[default]
    L,
    /// Used for the contact-card QR, which is scanned from print more often.
    M,
}

impl From<QrLevel> for EcLevel {
    fn from(level: QrLevel) -> Self {
        match level {
            QrLevel::L => EcLevel::L,
            QrLevel::M => EcLevel::M,
        }
    }
}

/// Encode `data` and render it as a `size`x`size` black-on-white raster.
pub fn render_qr(data: &str, size: u32, level: QrLevel) -> Result<GrayImage> {
    if size == 0 {
        return Err(Error::Qr("QR size must be greater than zero".into()));
    }

    let code = QrCode::with_error_correction_level(data.as_bytes(), level.into())
        .map_err(|e| Error::Qr(e.to_string()))?;

    // The renderer adds the standard four-module quiet zone.
    let img = code
        .render::<Luma<u8>>()
        .module_dimensions(BOX_SIZE, BOX_SIZE)
        .quiet_zone(true)
        .build();

    Ok(imageops::resize(&img, size, size, FilterType::Lanczos3))
}

/// Render a QR code and save it as PNG at `output`.
pub fn write_qr(data: &str, output: &Path, size: u32, level: QrLevel) -> Result<()> {
    let img = render_qr(data, size, level)?;
    img.save_with_format(output, ImageFormat::Png)?;
    Ok(())
}

/// Contact details encoded into a vCard 3.0 payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCard {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
}

impl fmt::Display for VCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BEGIN:VCARD")?;
        writeln!(f, "VERSION:3.0")?;
        writeln!(f, "FN:{}", self.name)?;
        writeln!(f, "ORG:{}", self.title)?;
        writeln!(f, "EMAIL;TYPE=WORK:{}", self.email)?;
        writeln!(f, "TEL;TYPE=CELL:{}", self.phone)?;
        for url in [&self.website, &self.linkedin, &self.github] {
            if !url.is_empty() {
                writeln!(f, "URL:{url}")?;
            }
        }
        write!(f, "END:VCARD")
    }
}

/// vCard 3.0 text for `card`.
pub fn vcard(card: &VCard) -> String {
    card.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_qr_exact_size() {
        let img = render_qr("https://example.com", DEFAULT_QR_SIZE, QrLevel::L).unwrap();
        assert_eq!(img.dimensions(), (200, 200));

        let img = render_qr("https://example.com", 57, QrLevel::M).unwrap();
        assert_eq!(img.dimensions(), (57, 57));
    }

    #[test]
    fn test_render_qr_has_quiet_zone_and_dark_modules() {
        let img = render_qr("hello", 400, QrLevel::L).unwrap();
        assert!(img.get_pixel(0, 0)[0] > 200);
        assert!(img.pixels().any(|p| p[0] < 50));
    }

    #[test]
    fn test_render_qr_quiet_zone_is_four_modules() {
        // "hello" at level L is a version 1 code: 21 modules plus 4 on each side.
        let side = (21 + 8) * BOX_SIZE;
        let img = render_qr("hello", side, QrLevel::L).unwrap();
        let edge = 4 * BOX_SIZE;
        assert_eq!(img.get_pixel(edge - 1, edge - 1)[0], 255);
        assert_eq!(img.get_pixel(edge, edge)[0], 0);
    }

    #[test]
    fn test_render_qr_rejects_oversized_payload() {
        let data = "x".repeat(5000);
        let err = render_qr(&data, 200, QrLevel::L).unwrap_err();
        assert!(matches!(err, Error::Qr(_)));
    }

    #[test]
    fn test_write_qr_png() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("code.png");
        write_qr("https://example.com", &out, 120, QrLevel::L).unwrap();

        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (120, 120));
    }

    #[test]
    fn test_vcard_format() {
        let card = VCard {
            name: "Test User".into(),
            title: "Engineer".into(),
            email: "test@example.com".into(),
            phone: "555-123-4567".into(),
            website: "https://example.com".into(),
            ..VCard::default()
        };
        let text = vcard(&card);
        assert!(text.starts_with("BEGIN:VCARD\nVERSION:3.0\nFN:Test User\n"));
        assert!(text.contains("EMAIL;TYPE=WORK:test@example.com\n"));
        assert!(text.contains("URL:https://example.com\n"));
        assert_eq!(text.matches("URL:").count(), 1);
        assert!(text.ends_with("END:VCARD"));
    }
}
