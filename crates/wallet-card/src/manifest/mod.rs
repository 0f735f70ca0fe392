//! manifest.json generation and verification
//!
//! The manifest maps every member of the pass archive to the lowercase hex
//! SHA-1 digest of its bytes. The manifest itself, the signature and
//! OS-metadata entries are never listed.

use crate::archive::is_os_metadata;
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name of the manifest inside a pass.
pub const MANIFEST_NAME: &str = "manifest.json";

/// File name of the detached signature inside a pass.
pub const SIGNATURE_NAME: &str = "signature";

/// Lowercase hex SHA-1 of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Member name to digest, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

/// A difference between a manifest and the directory it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestMismatch {
    /// Listed file whose bytes no longer match the recorded digest.
    Changed(String),
    /// Listed file absent from the directory.
    Missing(String),
    /// File present in the directory but not listed.
    Unlisted(String),
}

impl Manifest {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pretty JSON bytes. These exact bytes are what gets signed.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Write manifest.json into `dir` and return the bytes written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<u8>> {
        let bytes = self.to_json_bytes()?;
        fs::write(dir.join(MANIFEST_NAME), &bytes)?;
        Ok(bytes)
    }

    /// Re-hash `dir` and report every difference from this manifest.
    ///
    /// An empty result means the directory still matches.
    pub fn verify(&self, dir: &Path) -> Result<Vec<ManifestMismatch>> {
        let mut current = ManifestBuilder::new(dir);
        current.scan()?;
        let current = current.build();

        let mut mismatches = Vec::new();
        for (name, digest) in &self.entries {
            match current.entries.get(name) {
                None => mismatches.push(ManifestMismatch::Missing(name.clone())),
                Some(actual) if actual != digest => {
                    mismatches.push(ManifestMismatch::Changed(name.clone()))
                }
                Some(_) => {}
            }
        }
        for name in current.entries.keys() {
            if !self.entries.contains_key(name) {
                mismatches.push(ManifestMismatch::Unlisted(name.clone()));
            }
        }
        Ok(mismatches)
    }
}

/// Builder for a pass manifest.
pub struct ManifestBuilder {
    /// Staging directory holding the pass members
    root: PathBuf,
    files: BTreeMap<String, String>,
}

impl ManifestBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            files: BTreeMap::new(),
        }
    }

    /// True for names that never appear in a manifest.
    fn should_exclude(relative_path: &str) -> bool {
        relative_path == MANIFEST_NAME || relative_path == SIGNATURE_NAME || is_os_metadata(relative_path)
    }

    /// Walk the root and hash every regular file.
    pub fn scan(&mut self) -> Result<&mut Self> {
        let root = self.root.clone();

        let mut entries = Vec::new();
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = entry.map_err(|e| Error::Io(io::Error::other(format!("Failed to walk directory: {e}"))))?;
            if entry.file_type().is_file() {
                entries.push(entry);
            }
        }

        let results: Vec<(String, String)> = entries
            .par_iter()
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&root).ok()?;
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if Self::should_exclude(&name) {
                    return None;
                }
                Some((name, entry.path().to_path_buf()))
            })
            .map(|(name, path)| fs::read(&path).map(|data| (name, sha1_hex(&data))))
            .collect::<io::Result<Vec<_>>>()
            .map_err(Error::Io)?;

        for (name, digest) in results {
            self.files.insert(name, digest);
        }

        Ok(self)
    }

    /// Digest raw bytes the same way [`scan`](Self::scan) does.
    pub fn hash_data(data: &[u8]) -> String {
        sha1_hex(data)
    }

    /// Add an entry by hand, replacing any existing digest for that name.
    pub fn add_file(&mut self, relative_path: impl Into<String>, digest: impl Into<String>) {
        self.files.insert(relative_path.into(), digest.into());
    }

    pub fn build(&self) -> Manifest {
        Manifest {
            entries: self.files.clone(),
        }
    }
}

/// Hash every member of `dir` into a manifest.
pub fn build_manifest(dir: &Path) -> Result<Manifest> {
    let mut builder = ManifestBuilder::new(dir);
    builder.scan()?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staged() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pass.json"), b"{}").unwrap();
        fs::write(dir.path().join("icon.png"), b"icon").unwrap();
        fs::write(dir.path().join("logo.png"), b"logo").unwrap();
        dir
    }

    #[test]
    fn test_sha1_hex_known_vector() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn test_scan_reports_walk_errors() {
        let dir = TempDir::new().unwrap();
        let err = build_manifest(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "{err:?}");
    }

    #[test]
    fn test_manifest_lists_every_member() {
        let dir = staged();
        let manifest = build_manifest(dir.path()).unwrap();

        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.get("pass.json"), Some(sha1_hex(b"{}").as_str()));
        assert_eq!(manifest.get("icon.png"), Some(sha1_hex(b"icon").as_str()));
    }

    #[test]
    fn test_manifest_excludes_itself_signature_and_metadata() {
        let dir = staged();
        fs::write(dir.path().join(MANIFEST_NAME), b"{}").unwrap();
        fs::write(dir.path().join(SIGNATURE_NAME), b"sig").unwrap();
        fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();
        fs::create_dir(dir.path().join("__MACOSX")).unwrap();
        fs::write(dir.path().join("__MACOSX").join("._icon.png"), b"junk").unwrap();

        let manifest = build_manifest(dir.path()).unwrap();
        let names: Vec<_> = manifest.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["icon.png", "logo.png", "pass.json"]);
    }

    #[test]
    fn test_nested_members_use_forward_slashes() {
        let dir = staged();
        fs::create_dir(dir.path().join("en.lproj")).unwrap();
        fs::write(dir.path().join("en.lproj").join("pass.strings"), b"x").unwrap();

        let manifest = build_manifest(dir.path()).unwrap();
        assert!(manifest.get("en.lproj/pass.strings").is_some());
    }

    #[test]
    fn test_json_bytes_round_trip() {
        let dir = staged();
        let manifest = build_manifest(dir.path()).unwrap();
        let bytes = manifest.to_json_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"icon.png\""));
        assert_eq!(Manifest::from_json_bytes(&bytes).unwrap(), manifest);
    }

    #[test]
    fn test_verify_detects_changes() {
        let dir = staged();
        let manifest = build_manifest(dir.path()).unwrap();
        assert!(manifest.verify(dir.path()).unwrap().is_empty());

        fs::write(dir.path().join("icon.png"), b"tampered").unwrap();
        fs::remove_file(dir.path().join("logo.png")).unwrap();
        fs::write(dir.path().join("strip.png"), b"extra").unwrap();

        let mismatches = manifest.verify(dir.path()).unwrap();
        assert!(mismatches.contains(&ManifestMismatch::Changed("icon.png".into())));
        assert!(mismatches.contains(&ManifestMismatch::Missing("logo.png".into())));
        assert!(mismatches.contains(&ManifestMismatch::Unlisted("strip.png".into())));
        assert_eq!(mismatches.len(), 3);
    }

    #[test]
    fn test_add_file_overrides_scan() {
        let dir = staged();
        let mut builder = ManifestBuilder::new(dir.path());
        builder.scan().unwrap();
        builder.add_file("pass.json", ManifestBuilder::hash_data(b"other"));
        assert_eq!(builder.build().get("pass.json"), Some(sha1_hex(b"other").as_str()));
    }
}
