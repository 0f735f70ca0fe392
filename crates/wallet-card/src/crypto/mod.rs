//! Signing credentials and the manifest signature.

pub mod credentials;
pub mod signature;

pub use credentials::SigningCredentials;
pub use signature::{sign_manifest, write_signature, SignatureMode, UNSIGNED_PLACEHOLDER};
