//! Pass archive creation.
//!
//! Zips a staging directory into a `.pkpass` file. Members are written flat
//! under archive-relative, forward-slash names with no leading slash, in
//! sorted traversal order, so the same staging directory always yields the
//! same member order.
//!
//! # Examples
//!
//! ```no_run
//! use wallet_card::archive::{create_pkpass, CompressionLevel};
//!
//! create_pkpass("staging", "out/Card.pkpass", CompressionLevel::DEFAULT)?;
//! # Ok::<(), wallet_card::Error>(())
//! ```

use super::is_os_metadata;
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// ZIP compression level for pass creation.
///
/// # Examples
///
/// ```
/// use wallet_card::archive::CompressionLevel;
///
/// let fast = CompressionLevel::NONE;
/// let balanced = CompressionLevel::DEFAULT;
/// let custom = CompressionLevel::new(12);
/// assert_eq!(custom.level(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    /// No compression (level 0). Members are stored.
    pub const NONE: CompressionLevel = CompressionLevel(0);

    /// Default deflate level (6).
    pub const DEFAULT: CompressionLevel = CompressionLevel(6);

    /// Maximum deflate level (9).
    pub const MAX: CompressionLevel = CompressionLevel(9);

    /// Creates a compression level from 0-9. Larger values are clamped to 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        CompressionLevel(level.min(9))
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.0
    }

    fn options(self) -> SimpleFileOptions {
        if self.0 == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.0 as i64))
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u32> for CompressionLevel {
    fn from(level: u32) -> Self {
        CompressionLevel::new(level)
    }
}

/// Creates a `.pkpass` archive from a populated staging directory.
///
/// The archive is written to a temporary file next to `output_path` and moved
/// into place only once complete, so a failed pack never leaves a truncated
/// pass behind. An existing file at `output_path` is replaced.
///
/// # Errors
///
/// Returns [`Error::Io`] if the staging directory is missing, a member cannot
/// be read, or the output cannot be written. Returns [`Error::Zip`] if the ZIP
/// archive cannot be written.
pub fn create_pkpass(
    staging_dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    compression_level: CompressionLevel,
) -> Result<()> {
    let staging_dir = staging_dir.as_ref();
    let output_path = output_path.as_ref();

    if !staging_dir.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Staging directory not found: {}", staging_dir.display()),
        )));
    }

    let parent = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(parent)?;
    let mut zip = ZipWriter::new(temp.reopen()?);
    let options = compression_level.options();

    for entry in WalkDir::new(staging_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(io::Error::other(format!("Failed to walk directory: {e}"))))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative_path = entry.path().strip_prefix(staging_dir).map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Failed to compute relative path",
            ))
        })?;
        let archive_path = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if is_os_metadata(&archive_path) {
            continue;
        }

        zip.start_file(archive_path.as_str(), options).map_err(Error::Zip)?;

        let mut file = File::open(entry.path())?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        zip.write_all(&buffer)?;
    }

    zip.finish().map_err(Error::Zip)?;
    temp.persist(output_path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn create_staging(dir: &Path) -> std::path::PathBuf {
        let staging = dir.join("staging");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("pass.json"), b"{\"formatVersion\":1}").unwrap();
        fs::write(staging.join("manifest.json"), b"{}").unwrap();
        fs::write(staging.join("signature"), b"UNSIGNED").unwrap();
        fs::write(staging.join("icon.png"), b"PNG_DATA").unwrap();
        fs::write(staging.join(".DS_Store"), b"junk").unwrap();
        fs::create_dir_all(staging.join("__MACOSX")).unwrap();
        fs::write(staging.join("__MACOSX").join("._icon.png"), b"junk").unwrap();
        staging
    }

    fn member_names(path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_create_pkpass() {
        let temp_dir = TempDir::new().unwrap();
        let staging = create_staging(temp_dir.path());
        let output = temp_dir.path().join("Card.pkpass");

        create_pkpass(&staging, &output, CompressionLevel::DEFAULT).unwrap();

        assert_eq!(
            member_names(&output),
            vec!["icon.png", "manifest.json", "pass.json", "signature"]
        );
    }

    #[test]
    fn test_member_bytes_survive() {
        let temp_dir = TempDir::new().unwrap();
        let staging = create_staging(temp_dir.path());
        let output = temp_dir.path().join("Card.pkpass");

        create_pkpass(&staging, &output, CompressionLevel::MAX).unwrap();

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let mut member = archive.by_name("icon.png").unwrap();
        assert_eq!(member.compression(), CompressionMethod::Deflated);
        let mut data = Vec::new();
        member.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"PNG_DATA");
    }

    #[test]
    fn test_create_pkpass_no_compression() {
        let temp_dir = TempDir::new().unwrap();
        let staging = create_staging(temp_dir.path());
        let output = temp_dir.path().join("stored.pkpass");

        create_pkpass(&staging, &output, CompressionLevel::NONE).unwrap();

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        assert_eq!(archive.by_name("pass.json").unwrap().compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_create_pkpass_creates_parent_and_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let staging = create_staging(temp_dir.path());
        let output = temp_dir.path().join("out").join("nested").join("Card.pkpass");

        create_pkpass(&staging, &output, CompressionLevel::DEFAULT).unwrap();
        fs::write(staging.join("logo.png"), b"LOGO").unwrap();
        create_pkpass(&staging, &output, CompressionLevel::DEFAULT).unwrap();

        assert!(member_names(&output).contains(&"logo.png".to_string()));
    }

    #[test]
    fn test_create_pkpass_missing_staging() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("Card.pkpass");

        let result = create_pkpass("/nonexistent/staging", &output, CompressionLevel::DEFAULT);
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_compression_level() {
        assert_eq!(CompressionLevel::NONE.level(), 0);
        assert_eq!(CompressionLevel::DEFAULT.level(), 6);
        assert_eq!(CompressionLevel::MAX.level(), 9);
        assert_eq!(CompressionLevel::new(15).level(), 9);
        assert_eq!(CompressionLevel::from(5).level(), 5);
        assert_eq!(CompressionLevel::default(), CompressionLevel::DEFAULT);
    }
}
