pub mod archive;
pub mod assets;
pub mod builder;
pub mod config;
pub mod crypto;
pub mod error;
pub mod manifest;
pub mod pass;
pub mod validate;

pub use archive::{create_pkpass, output_filename_for, CompressionLevel};
pub use assets::{AssetKind, AssetPreparer, QrLevel, ResolvedAssets};
pub use builder::{BuildOutcome, PassBuilder};
pub use config::{load_config, PassConfig, Template};
pub use crypto::SigningCredentials;
pub use error::Error;
pub use manifest::{build_manifest, Manifest, ManifestBuilder};
pub use pass::{build_pass_document, PassDocument};
pub use validate::{validate_and_build, validate_config};

pub type Result<T> = std::result::Result<T, Error>;
