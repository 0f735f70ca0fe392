//! PassBuilder API
//!
//! Runs the whole pipeline for one pass: validate, load credentials, prepare
//! assets, build pass.json, stage, hash, sign, pack.

use crate::archive::{create_pkpass, output_filename_for, stage_pass, CompressionLevel};
use crate::assets::AssetPreparer;
use crate::config::{PassConfig, SigningConfig};
use crate::crypto::{write_signature, SignatureMode, SigningCredentials};
use crate::manifest::build_manifest;
use crate::pass::build_pass_document;
use crate::{Error, Result};
use secrecy::SecretString;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Default directory for prepared images.
pub const DEFAULT_ASSETS_DIR: &str = "assets/user";

/// Default directory for generated passes.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Location of the `.pkpass` archive.
    pub path: PathBuf,
    /// Whether the archive carries a real signature.
    pub signed: bool,
}

/// Wallet pass builder with builder pattern API.
///
/// Credentials set here take precedence over the configuration's `signing`
/// section. Without any credentials the pass is produced unsigned, unless
/// [`allow_unsigned(false)`](Self::allow_unsigned) was requested.
///
/// # Example
///
/// ```no_run
/// use wallet_card::PassBuilder;
///
/// let config = serde_json::json!({
///     "pass": {
///         "description": "Test Card",
///         "organizationName": "Test Org",
///         "passTypeIdentifier": "pass.test.card",
///     },
///     "qr_data": "https://example.com",
/// });
///
/// let outcome = PassBuilder::new()
///     .certificate("certs/pass.pem")
///     .private_key("certs/pass.key")
///     .output_dir("dist")
///     .generate(&config, None)?;
/// println!("{}", outcome.path.display());
/// # Ok::<(), wallet_card::Error>(())
/// ```
#[derive(Clone)]
pub struct PassBuilder {
    certificate: Option<PathBuf>,
    private_key: Option<PathBuf>,
    pkcs12: Option<PathBuf>,
    password: Option<SecretString>,
    assets_dir: PathBuf,
    output_dir: PathBuf,
    compression_level: CompressionLevel,
    allow_unsigned: bool,
}

impl Default for PassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PassBuilder {
    /// Create a new PassBuilder.
    pub fn new() -> Self {
        Self {
            certificate: None,
            private_key: None,
            pkcs12: None,
            password: None,
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            compression_level: CompressionLevel::DEFAULT,
            allow_unsigned: true,
        }
    }

    /// Set certificate file path (PEM or DER format).
    ///
    /// Use together with `private_key()`, or use `pkcs12()` instead.
    pub fn certificate(mut self, path: impl AsRef<Path>) -> Self {
        self.certificate = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set private key file path (PEM or DER format).
    pub fn private_key(mut self, path: impl AsRef<Path>) -> Self {
        self.private_key = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set PKCS#12 file path (.p12 format).
    pub fn pkcs12(mut self, path: impl AsRef<Path>) -> Self {
        self.pkcs12 = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set password for the private key or PKCS#12 file.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Directory for prepared images. Created if missing.
    pub fn assets_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.assets_dir = path.as_ref().to_path_buf();
        self
    }

    /// Directory for generated passes. Created if missing.
    pub fn output_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set ZIP compression level (0-9). Default is 6.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = CompressionLevel::new(level);
        self
    }

    /// Whether a pass may be produced without credentials. Default is true.
    pub fn allow_unsigned(mut self, allow: bool) -> Self {
        self.allow_unsigned = allow;
        self
    }

    fn has_explicit_credentials(&self) -> bool {
        self.pkcs12.is_some() || self.certificate.is_some() || self.private_key.is_some()
    }

    /// Validate the explicitly configured credentials.
    ///
    /// Returns an error if:
    /// - Both PKCS#12 and PEM credentials are specified
    /// - Only one of certificate/private_key is specified
    pub fn validate(&self) -> Result<()> {
        let has_p12 = self.pkcs12.is_some();
        let has_pem = self.certificate.is_some() || self.private_key.is_some();

        if has_p12 && has_pem {
            return Err(Error::Config(
                "Cannot specify both PKCS#12 and PEM certificate/key".into(),
            ));
        }

        if has_pem && (self.certificate.is_none() || self.private_key.is_none()) {
            return Err(Error::MissingCredentials(
                "Both certificate and private key must be specified".into(),
            ));
        }

        Ok(())
    }

    /// Resolve credentials from the builder, then from the config's signing section.
    ///
    /// Returns `Ok(None)` only when no credentials are configured anywhere.
    fn load_credentials(&self, signing: &SigningConfig) -> Result<Option<SigningCredentials>> {
        if self.has_explicit_credentials() {
            self.validate()?;
            let credentials = match (&self.pkcs12, &self.certificate, &self.private_key) {
                (Some(p12), _, _) => SigningCredentials::from_p12(p12, self.password.as_ref())?,
                (None, Some(cert), Some(key)) => {
                    SigningCredentials::from_pem(cert, key, self.password.as_ref())?
                }
                _ => {
                    return Err(Error::MissingCredentials(
                        "Both certificate and private key must be specified".into(),
                    ))
                }
            };
            return Ok(Some(credentials));
        }

        if !signing.enabled {
            return Ok(None);
        }

        let password = signing
            .password
            .as_ref()
            .map(|p| SecretString::new(p.clone()));
        let credentials = match (&signing.cert_file, &signing.key_file, &signing.p12_file) {
            (Some(cert), Some(key), _) => SigningCredentials::from_pem(cert, key, password.as_ref())?,
            (_, _, Some(p12)) => SigningCredentials::from_p12(p12, password.as_ref())?,
            _ => {
                return Err(Error::MissingCredentials(
                    "Signing enabled but cert_file or key_file missing".into(),
                ))
            }
        };
        Ok(Some(credentials))
    }

    /// Validate a raw configuration tree and build a pass from it.
    ///
    /// With no `output_filename`, the name is derived from the pass
    /// description. The archive is written into the output directory.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] with every message if the tree is invalid
    /// - [`Error::Certificate`] / [`Error::MissingCredentials`] / [`Error::Signing`]
    ///   for credential problems
    /// - [`Error::Image`] / [`Error::Qr`] for asset problems
    /// - [`Error::Build`] wrapping any IO failure while staging or packing
    pub fn generate(&self, config: &Value, output_filename: Option<&str>) -> Result<BuildOutcome> {
        let config = PassConfig::from_value(config).map_err(Error::Validation)?;
        self.build(&config, output_filename)
    }

    /// Build a pass from an already validated configuration.
    pub fn build(&self, config: &PassConfig, output_filename: Option<&str>) -> Result<BuildOutcome> {
        let credentials = self.load_credentials(&config.signing)?;
        if credentials.is_none() && !self.allow_unsigned {
            return Err(Error::MissingCredentials(
                "Signing is required but no certificate/key or PKCS#12 is configured".into(),
            ));
        }

        let file_name = output_filename
            .map(str::to_string)
            .unwrap_or_else(|| output_filename_for(&config.identity.description));

        self.assemble(config, credentials.as_ref(), &file_name)
            .map_err(Error::into_build_failure)
    }

    fn assemble(
        &self,
        config: &PassConfig,
        credentials: Option<&SigningCredentials>,
        file_name: &str,
    ) -> Result<BuildOutcome> {
        let preparer = AssetPreparer::new(&self.assets_dir)?;
        let assets = preparer.prepare_all(&config.assets, config.qr_data.as_deref())?;

        let mut document = build_pass_document(config, &assets);
        if config.identity.team_identifier.trim().is_empty() {
            if let Some(team_id) = credentials.and_then(|c| c.team_id.as_ref()) {
                document.team_identifier = team_id.clone();
            }
        }

        // Dropped on every exit path, taking the staged members with it.
        let staging = TempDir::new()?;
        stage_pass(staging.path(), &document, &assets)?;

        let manifest = build_manifest(staging.path())?;
        let manifest_bytes = manifest.write_to(staging.path())?;
        debug!(entries = manifest.len(), "Wrote manifest");

        let mode = match credentials {
            Some(credentials) => SignatureMode::Signed(credentials),
            None => SignatureMode::Unsigned,
        };
        write_signature(staging.path(), &manifest_bytes, &mode)?;

        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        create_pkpass(staging.path(), &path, self.compression_level)?;

        let signed = mode.is_signed();
        if signed {
            info!(path = %path.display(), "Pass created");
        } else {
            warn!(path = %path.display(), "Pass created without a signature; Wallet will not install it");
        }

        Ok(BuildOutcome { path, signed })
    }
}
