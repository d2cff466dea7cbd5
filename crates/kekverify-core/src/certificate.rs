//! X.509 certificate loading.

use std::path::Path;

use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::objects::{oid_registry, oid2sn};
use x509_parser::oid_registry::Oid;
use x509_parser::pem::parse_x509_pem;
use x509_parser::time::ASN1Time;

use crate::error::{Error, Result, read_file};

/// OID of `rsaEncryption` in a SubjectPublicKeyInfo.
pub const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";

/// A parsed certificate with the fields an operator inspects.
///
/// Owns everything it exposes, so it outlives the PEM buffer it was read from.
#[derive(Debug, Clone, Serialize)]
pub struct Certificate {
    /// X.509 version, 1-based (a v3 certificate reports 3).
    pub version: u32,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// Serial number in decimal.
    pub serial: String,
    /// Serial number as colon-separated hex bytes.
    pub serial_hex: String,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    /// Lowercase hex SHA-256 over the DER encoding.
    pub fingerprint_sha256: String,
    #[serde(skip)]
    public_key: CertificatePublicKey,
}

/// The certificate's SubjectPublicKeyInfo, kept opaque until verification.
#[derive(Debug, Clone)]
pub struct CertificatePublicKey {
    algorithm_oid: String,
    spki_der: Vec<u8>,
}

impl CertificatePublicKey {
    /// Dotted OID of the key algorithm.
    pub fn algorithm_oid(&self) -> &str {
        &self.algorithm_oid
    }

    /// Decode the key as an RSA public key.
    pub fn to_rsa(&self) -> Result<RsaPublicKey> {
        if self.algorithm_oid != RSA_ENCRYPTION_OID {
            return Err(Error::UnsupportedKey(format!(
                "expected an RSA key ({}), certificate carries {}",
                RSA_ENCRYPTION_OID, self.algorithm_oid
            )));
        }
        RsaPublicKey::from_public_key_der(&self.spki_der)
            .map_err(|e| Error::UnsupportedKey(format!("malformed RSA public key: {}", e)))
    }

    /// Modulus size in bits, or `None` for non-RSA keys.
    pub fn rsa_bits(&self) -> Option<usize> {
        self.to_rsa().ok().map(|key| key.size() * 8)
    }
}

impl Certificate {
    /// Parse a PEM-encoded certificate.
    pub fn from_pem(data: &[u8]) -> Result<Self> {
        let (_, pem) =
            parse_x509_pem(data).map_err(|e| Error::Parse(format!("invalid PEM: {}", e)))?;
        if pem.label != "CERTIFICATE" {
            return Err(Error::Parse(format!(
                "expected a CERTIFICATE PEM block, found {}",
                pem.label
            )));
        }
        let cert = pem
            .parse_x509()
            .map_err(|e| Error::Parse(format!("invalid X.509 structure: {}", e)))?;
        Self::from_parsed(&cert, &pem.contents)
    }

    fn from_parsed(cert: &X509Certificate<'_>, der: &[u8]) -> Result<Self> {
        let validity = cert.validity();
        let spki = cert.public_key();

        Ok(Self {
            version: cert.version().0 + 1,
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before: to_utc(&validity.not_before)?,
            not_after: to_utc(&validity.not_after)?,
            serial: cert.tbs_certificate.serial.to_string(),
            serial_hex: cert.raw_serial_as_string(),
            signature_algorithm: oid_name(&cert.signature_algorithm.algorithm),
            public_key_algorithm: oid_name(&spki.algorithm.algorithm),
            fingerprint_sha256: hex::encode(Sha256::digest(der)),
            public_key: CertificatePublicKey {
                algorithm_oid: spki.algorithm.algorithm.to_id_string(),
                spki_der: spki.raw.to_vec(),
            },
        })
    }

    pub fn public_key(&self) -> &CertificatePublicKey {
        &self.public_key
    }
}

/// Read and parse the PEM certificate at `path`.
pub fn load_certificate(path: &Path) -> Result<Certificate> {
    debug!(path = %path.display(), "loading certificate");
    let data = read_file(path)?;
    let cert = Certificate::from_pem(&data)?;
    debug!(subject = %cert.subject, serial = %cert.serial, "certificate loaded");
    Ok(cert)
}

/// Short registry name for an OID, falling back to dotted form.
fn oid_name(oid: &Oid<'_>) -> String {
    oid2sn(oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| oid.to_id_string())
}

fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| Error::Parse(format!("validity time out of range: {}", time)))
}
