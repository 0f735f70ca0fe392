//! Error types for wallet-card operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure class of a
//! pass build: configuration validation, asset decoding, staging and packing
//! IO, and certificate/signing problems.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for wallet-card operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// Match on variants to handle specific failure cases.
///
/// # Examples
///
/// ```no_run
/// use wallet_card::{Error, PassBuilder};
///
/// let config = serde_json::json!({ "pass": {} });
/// match PassBuilder::new().generate(&config, None) {
///     Ok(outcome) => println!("Pass created: {}", outcome.path.display()),
///     Err(Error::Validation(errors)) => {
///         for e in errors {
///             eprintln!("  - {e}");
///         }
///     }
///     Err(Error::Certificate(msg)) => eprintln!("Bad signing material: {msg}"),
///     Err(e) => eprintln!("Error: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Occurs when reading configuration or asset files, writing staged
    /// members, or creating the output archive.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration could not be parsed or written.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// ZIP archive operation failed.
    ///
    /// Occurs while packing the staging directory. See [`crate::archive`].
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A source image exists but could not be decoded, or a raster could not be encoded.
    ///
    /// Distinct from a missing asset, which is recovered by placeholder synthesis.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// QR payload could not be encoded (for example, it exceeds QR capacity).
    #[error("QR code error: {0}")]
    Qr(String),

    /// Configuration failed validation.
    ///
    /// Carries every message produced by [`crate::validate::validate_config`], verbatim.
    #[error("Configuration validation failed:\n{}", format_messages(.0))]
    Validation(Vec<String>),

    /// Invalid configuration outside the validator's scope (unknown template,
    /// unsupported config file format, malformed override).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid or malformed certificate or private key, or a key/certificate mismatch.
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// Signing was required but credentials are absent or incomplete.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The signature over the manifest could not be produced.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Staging or packing failed; the inner error is the underlying cause.
    #[error("Failed to generate pass: {0}")]
    Build(Box<Error>),
}

impl Error {
    /// Wraps staging and packing failures into [`Error::Build`].
    ///
    /// Validation, asset decoding, credential and signing errors are returned
    /// unchanged so callers can still tell a configuration or input problem
    /// from an IO problem.
    pub fn into_build_failure(self) -> Self {
        match self {
            Error::Io(_) | Error::Json(_) | Error::Zip(_) => Error::Build(Box::new(self)),
            other => other,
        }
    }

    /// Validation messages, if this is a validation failure.
    pub fn validation_messages(&self) -> Option<&[String]> {
        match self {
            Error::Validation(messages) => Some(messages),
            _ => None,
        }
    }
}

fn format_messages(messages: &[String]) -> String {
    messages
        .iter()
        .map(|m| format!("  - {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}
