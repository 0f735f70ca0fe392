//! Pass archive assembly.
//!
//! Lays the pass members out in a staging directory and packs that directory
//! into a `.pkpass` zip.
//!
//! - [`stage`] - Writes pass.json and copies the prepared images
//! - [`pack`] - Zips a staging directory with deterministic ordering

pub mod pack;
pub mod stage;

pub use pack::{create_pkpass, CompressionLevel};
pub use stage::{stage_pass, STRIP_NAME};

/// Extension given to generated pass archives.
pub const PKPASS_EXTENSION: &str = "pkpass";

/// True for OS-metadata entries that must never reach an archive or manifest.
///
/// Matches any path component that starts with `.` (which covers `.DS_Store`
/// and AppleDouble `._*` files) or equals `__MACOSX`.
pub fn is_os_metadata(relative_path: &str) -> bool {
    relative_path
        .split(['/', '\\'])
        .any(|part| part.starts_with('.') || part == "__MACOSX")
}

/// Derive the archive file name from a pass description.
///
/// Every character other than a letter, digit, `-` or `_` becomes `_`.
pub fn output_filename_for(description: &str) -> String {
    let safe: String = description
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{safe}.{PKPASS_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_os_metadata() {
        assert!(is_os_metadata(".DS_Store"));
        assert!(is_os_metadata("__MACOSX/icon.png"));
        assert!(is_os_metadata("en.lproj/._pass.strings"));
        assert!(!is_os_metadata("icon.png"));
        assert!(!is_os_metadata("en.lproj/pass.strings"));
    }

    #[test]
    fn test_output_filename_for() {
        assert_eq!(output_filename_for("Test Card"), "Test_Card.pkpass");
        assert_eq!(output_filename_for("a/b:c-d_e"), "a_b_c-d_e.pkpass");
        assert_eq!(output_filename_for(""), ".pkpass");
    }
}
