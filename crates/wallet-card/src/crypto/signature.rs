//! Manifest signature.
//!
//! Passes carry a raw RSA PKCS#1 v1.5 signature with SHA-1 over the exact
//! bytes of manifest.json. Unsigned passes carry a short placeholder instead;
//! some Wallet versions reject an archive whose signature member is empty.

use super::SigningCredentials;
use crate::manifest::SIGNATURE_NAME;
use crate::{Error, Result};
use openssl::hash::MessageDigest;
use openssl::rsa::Padding;
use openssl::sign::Signer;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Signature member contents for unsigned passes.
pub const UNSIGNED_PLACEHOLDER: &[u8] = b"UNSIGNED";

/// How the signature member is produced.
#[derive(Debug)]
pub enum SignatureMode<'a> {
    Signed(&'a SigningCredentials),
    Unsigned,
}

impl SignatureMode<'_> {
    pub fn is_signed(&self) -> bool {
        matches!(self, SignatureMode::Signed(_))
    }
}

/// Sign `manifest_bytes` with the credentials' private key.
pub fn sign_manifest(manifest_bytes: &[u8], credentials: &SigningCredentials) -> Result<Vec<u8>> {
    let mut signer = Signer::new(MessageDigest::sha1(), &credentials.private_key)
        .map_err(|e| Error::Signing(format!("Failed to create signer: {}", e)))?;
    signer
        .set_rsa_padding(Padding::PKCS1)
        .map_err(|e| Error::Signing(format!("Failed to set padding: {}", e)))?;
    signer
        .update(manifest_bytes)
        .map_err(|e| Error::Signing(format!("Failed to hash manifest: {}", e)))?;
    signer
        .sign_to_vec()
        .map_err(|e| Error::Signing(format!("Failed to sign manifest: {}", e)))
}

/// Write the signature member into `dir` for the given manifest bytes.
///
/// Must run after manifest.json is final.
pub fn write_signature(dir: &Path, manifest_bytes: &[u8], mode: &SignatureMode<'_>) -> Result<()> {
    let bytes = match mode {
        SignatureMode::Signed(credentials) => sign_manifest(manifest_bytes, credentials)?,
        SignatureMode::Unsigned => UNSIGNED_PLACEHOLDER.to_vec(),
    };
    fs::write(dir.join(SIGNATURE_NAME), &bytes)?;
    debug!(signed = mode.is_signed(), len = bytes.len(), "Wrote signature");
    Ok(())
}
