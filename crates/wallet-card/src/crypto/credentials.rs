//! Certificate and private key loading

use crate::{Error, Result};
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{Id, PKey, Private};
use openssl::x509::X509;
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::path::Path;

/// Signing credentials: certificate and matching RSA private key
pub struct SigningCredentials {
    /// X.509 pass type certificate
    pub certificate: X509,
    /// Private key
    pub private_key: PKey<Private>,
    /// Team ID extracted from certificate
    pub team_id: Option<String>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("team_id", &self.team_id)
            .finish_non_exhaustive()
    }
}

impl SigningCredentials {
    /// Load from separate certificate and private key files
    ///
    /// Certificates may be PEM or DER. Keys may be PKCS#8 or PKCS#1 PEM, or DER.
    /// The password, if provided, decrypts an encrypted PEM key.
    pub fn from_pem(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        key_password: Option<&SecretString>,
    ) -> Result<Self> {
        let cert_path = cert_path.as_ref();
        let key_path = key_path.as_ref();
        let cert_data = fs::read(cert_path).map_err(|e| {
            Error::Certificate(format!("Failed to read certificate {}: {}", cert_path.display(), e))
        })?;
        let key_data = fs::read(key_path).map_err(|e| {
            Error::Certificate(format!("Failed to read private key {}: {}", key_path.display(), e))
        })?;

        Self::from_pem_bytes(&cert_data, &key_data, key_password)
    }

    /// Load from in-memory certificate and private key bytes
    pub fn from_pem_bytes(
        cert_data: &[u8],
        key_data: &[u8],
        key_password: Option<&SecretString>,
    ) -> Result<Self> {
        let certificate = X509::from_pem(cert_data)
            .or_else(|_| X509::from_der(cert_data))
            .map_err(|e| Error::Certificate(format!("Failed to load certificate: {}", e)))?;

        let private_key = if let Some(pass) = key_password {
            PKey::private_key_from_pem_passphrase(key_data, pass.expose_secret().as_bytes())
        } else {
            PKey::private_key_from_pem(key_data)
                .or_else(|_| PKey::private_key_from_der(key_data))
        }
        .map_err(|e| Error::Certificate(format!("Failed to load private key: {}", e)))?;

        Self::assemble(certificate, private_key)
    }

    /// Load from a PKCS#12 (.p12) file
    ///
    /// A missing password is treated as the empty string.
    pub fn from_p12(
        p12_path: impl AsRef<Path>,
        password: Option<&SecretString>,
    ) -> Result<Self> {
        let p12_path = p12_path.as_ref();
        let p12_data = fs::read(p12_path).map_err(|e| {
            Error::Certificate(format!("Failed to read PKCS#12 {}: {}", p12_path.display(), e))
        })?;
        Self::from_p12_bytes(&p12_data, password)
    }

    pub fn from_p12_bytes(p12_data: &[u8], password: Option<&SecretString>) -> Result<Self> {
        let pkcs12 = Pkcs12::from_der(p12_data)
            .map_err(|e| Error::Certificate(format!("Invalid PKCS#12: {}", e)))?;

        let pass = password
            .map(|s| s.expose_secret().as_str())
            .unwrap_or("");
        let parsed = pkcs12.parse2(pass)
            .map_err(|e| Error::Certificate(format!("Failed to parse PKCS#12: {}", e)))?;

        let certificate = parsed.cert
            .ok_or_else(|| Error::Certificate("No certificate in PKCS#12".into()))?;

        let private_key = parsed.pkey
            .ok_or_else(|| Error::Certificate("No private key in PKCS#12".into()))?;

        Self::assemble(certificate, private_key)
    }

    fn assemble(certificate: X509, private_key: PKey<Private>) -> Result<Self> {
        // Pass signatures are RSA PKCS#1 v1.5 only
        if private_key.id() != Id::RSA {
            return Err(Error::Certificate(format!(
                "Unsupported private key type {:?}; an RSA key is required",
                private_key.id()
            )));
        }

        Self::validate_key_pair(&certificate, &private_key)?;
        let team_id = Self::extract_team_id(&certificate);

        Ok(Self {
            certificate,
            private_key,
            team_id,
        })
    }

    /// Extract team ID from the certificate subject's OU
    fn extract_team_id(cert: &X509) -> Option<String> {
        cert.subject_name()
            .entries_by_nid(openssl::nid::Nid::ORGANIZATIONALUNITNAME)
            .find_map(|entry| entry.data().as_utf8().ok().map(|s| s.to_string()))
    }

    /// Validate that the private key matches the certificate's public key
    fn validate_key_pair(cert: &X509, private_key: &PKey<Private>) -> Result<()> {
        let cert_public_key = cert.public_key()
            .map_err(|e| Error::Certificate(format!(
                "Failed to extract public key from certificate: {}", e
            )))?;

        if !private_key.public_eq(&cert_public_key) {
            return Err(Error::Certificate(
                "Private key does not match certificate public key".into()
            ));
        }

        Ok(())
    }
}
