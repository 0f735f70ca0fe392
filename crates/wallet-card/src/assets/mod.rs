//! Asset preparation.
//!
//! Produces the fixed-size rasters a pass needs (icon, logo, photo) in an
//! assets directory, either by fitting a user-supplied image or by drawing a
//! labelled placeholder, and renders the optional QR image.
//!
//! Outputs are written under canonical names (`icon.png`, `logo.png`,
//! `photo.png`, `qr.png`). Builds that share an assets directory must not run
//! concurrently.

pub mod glyphs;
pub mod qr;

pub use qr::{render_qr, vcard, write_qr, QrLevel, VCard, DEFAULT_QR_NAME, DEFAULT_QR_SIZE};

use crate::config::AssetPaths;
use crate::Result;
use glyphs::{glyph, text_width, GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};
use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Placeholder background, a mid blue.
pub const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([0x4A, 0x90, 0xE2]);

const PLACEHOLDER_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const CANVAS_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// The image slots of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Icon,
    Logo,
    Photo,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Icon, AssetKind::Logo, AssetKind::Photo];

    /// Target `(width, height)` in pixels.
    pub fn size(self) -> (u32, u32) {
        match self {
            AssetKind::Icon => (180, 180),
            AssetKind::Logo => (320, 100),
            AssetKind::Photo => (320, 320),
        }
    }

    /// Canonical output file name.
    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::Icon => "icon.png",
            AssetKind::Logo => "logo.png",
            AssetKind::Photo => "photo.png",
        }
    }

    fn stem(self) -> &'static str {
        match self {
            AssetKind::Icon => "icon",
            AssetKind::Logo => "logo",
            AssetKind::Photo => "photo",
        }
    }
}

/// Prepared rasters for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssets {
    pub icon: PathBuf,
    pub logo: PathBuf,
    pub photo: Option<PathBuf>,
    pub qr: Option<PathBuf>,
}

/// Prepares pass images inside an assets directory.
#[derive(Debug, Clone)]
pub struct AssetPreparer {
    assets_dir: PathBuf,
}

impl AssetPreparer {
    /// Create a preparer, creating `assets_dir` if needed.
    pub fn new(assets_dir: impl Into<PathBuf>) -> Result<Self> {
        let assets_dir = assets_dir.into();
        fs::create_dir_all(&assets_dir)?;
        Ok(Self { assets_dir })
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Produce the raster for `kind`.
    ///
    /// A source that exists is decoded, shrunk to fit if larger than the
    /// target box, and centred on a white canvas of exactly the target size.
    /// Without a usable source, an existing canonical file is reused, or a
    /// placeholder is drawn. A source that exists but cannot be decoded is an
    /// [`crate::Error::Image`].
    pub fn prepare(&self, kind: AssetKind, source: Option<&Path>) -> Result<PathBuf> {
        match source {
            Some(src) if src.exists() => self.fit_image(src, kind),
            Some(src) => {
                warn!(kind = kind.stem(), source = %src.display(), "Asset source not found, using placeholder");
                self.ensure_image_exists(kind)
            }
            None => self.ensure_image_exists(kind),
        }
    }

    pub fn prepare_icon(&self, source: Option<&Path>) -> Result<PathBuf> {
        self.prepare(AssetKind::Icon, source)
    }

    pub fn prepare_logo(&self, source: Option<&Path>) -> Result<PathBuf> {
        self.prepare(AssetKind::Logo, source)
    }

    pub fn prepare_photo(&self, source: Option<&Path>) -> Result<PathBuf> {
        self.prepare(AssetKind::Photo, source)
    }

    /// Prepare every image slot, plus a QR raster when `qr_data` is non-empty.
    pub fn prepare_all(&self, paths: &AssetPaths, qr_data: Option<&str>) -> Result<ResolvedAssets> {
        let icon = self.prepare_icon(paths.icon.as_deref())?;
        let logo = self.prepare_logo(paths.logo.as_deref())?;
        let photo = self.prepare_photo(paths.photo.as_deref())?;
        let qr = match qr_data {
            Some(data) if !data.is_empty() => Some(self.generate_qr(data)?),
            _ => None,
        };
        Ok(ResolvedAssets {
            icon,
            logo,
            photo: Some(photo),
            qr,
        })
    }

    /// Return the canonical file for `kind`, drawing a placeholder if absent.
    pub fn ensure_image_exists(&self, kind: AssetKind) -> Result<PathBuf> {
        let path = self.assets_dir.join(kind.file_name());
        if !path.exists() {
            let (width, height) = kind.size();
            let img = placeholder(width, height, &kind.stem().to_uppercase());
            img.save_with_format(&path, ImageFormat::Png)?;
            warn!(kind = kind.stem(), path = %path.display(), "Generated placeholder image");
        }
        Ok(path)
    }

    /// Render the pass QR at the default size and name.
    pub fn generate_qr(&self, data: &str) -> Result<PathBuf> {
        self.generate_qr_with(data, DEFAULT_QR_NAME, DEFAULT_QR_SIZE, QrLevel::L)
    }

    /// Render a QR image into the assets directory under `output_name`.
    pub fn generate_qr_with(&self, data: &str, output_name: &str, size: u32, level: QrLevel) -> Result<PathBuf> {
        let path = self.assets_dir.join(output_name);
        write_qr(data, &path, size, level)?;
        debug!(path = %path.display(), size, "Generated QR image");
        Ok(path)
    }

    fn fit_image(&self, source: &Path, kind: AssetKind) -> Result<PathBuf> {
        let (width, height) = kind.size();
        let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;

        let img = if img.width() > width || img.height() > height {
            img.resize(width, height, FilterType::Lanczos3)
        } else {
            img
        };
        let img = img.to_rgb8();

        let mut canvas = RgbImage::from_pixel(width, height, CANVAS_BACKGROUND);
        let x = (width - img.width().min(width)) / 2;
        let y = (height - img.height().min(height)) / 2;
        imageops::overlay(&mut canvas, &img, x as i64, y as i64);

        let path = self.assets_dir.join(kind.file_name());
        canvas.save_with_format(&path, ImageFormat::Png)?;
        debug!(kind = kind.stem(), source = %source.display(), "Prepared image");
        Ok(path)
    }
}

/// Draw a solid placeholder with `label` centred in white block letters.
pub fn placeholder(width: u32, height: u32, label: &str) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, PLACEHOLDER_COLOR);

    let label_width = text_width(label);
    if label_width == 0 {
        return img;
    }

    let mut scale = (width.min(height) / 4 / GLYPH_HEIGHT).max(1);
    let max_width = width * 9 / 10;
    if label_width * scale > max_width {
        scale = (max_width / label_width).max(1);
    }

    let x0 = width.saturating_sub(label_width * scale) / 2;
    let y0 = height.saturating_sub(GLYPH_HEIGHT * scale) / 2;

    let mut cursor = x0;
    for rows in label.chars().filter_map(glyph) {
        for (row, &bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                let px = cursor + col * scale;
                let py = y0 + row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        if px + dx < width && py + dy < height {
                            img.put_pixel(px + dx, py + dy, PLACEHOLDER_TEXT);
                        }
                    }
                }
            }
        }
        cursor += (GLYPH_WIDTH + GLYPH_SPACING) * scale;
    }

    img
}
