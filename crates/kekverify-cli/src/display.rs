use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use kekverify_core::{Certificate, SignaturePayload, VerificationOutcome};

/// Display row for the certificate table.
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "FIELD")]
    pub field: &'static str,
    #[tabled(rename = "VALUE")]
    pub value: String,
}

/// Certificate metadata as emitted by `--output json`.
#[derive(Debug, Serialize)]
pub struct CertificateReport<'a> {
    #[serde(flatten)]
    pub certificate: &'a Certificate,
    pub public_key_bits: Option<usize>,
}

impl<'a> CertificateReport<'a> {
    pub fn new(certificate: &'a Certificate) -> Self {
        Self {
            certificate,
            public_key_bits: certificate.public_key().rsa_bits(),
        }
    }
}

/// Signed bytes and signature size for `signed-data --output json`.
#[derive(Debug, Serialize)]
pub struct SignedDataReport {
    pub canonical_object: String,
    pub text: String,
    pub signed_data: String,
    pub signature_bytes: usize,
}

impl From<&SignaturePayload> for SignedDataReport {
    fn from(payload: &SignaturePayload) -> Self {
        Self {
            canonical_object: payload.canonical_object().to_string(),
            text: payload.text().to_string(),
            signed_data: payload.signed_data(),
            signature_bytes: payload.signature().len(),
        }
    }
}

/// Full result of `verify --output json`.
#[derive(Debug, Serialize)]
pub struct VerifyReport<'a> {
    pub certificate: CertificateReport<'a>,
    pub signed_data: String,
    pub outcome: VerificationOutcome,
    pub message: &'static str,
}

/// One row per inspected certificate field, in display order.
pub fn certificate_rows(cert: &Certificate) -> Vec<FieldRow> {
    let key_algorithm = match cert.public_key().rsa_bits() {
        Some(bits) => format!("{} ({} bit)", cert.public_key_algorithm, bits),
        None => cert.public_key_algorithm.clone(),
    };
    vec![
        FieldRow {
            field: "Public key algorithm",
            value: key_algorithm,
        },
        FieldRow {
            field: "Subject",
            value: cert.subject.clone(),
        },
        FieldRow {
            field: "Issuer",
            value: cert.issuer.clone(),
        },
        FieldRow {
            field: "Not valid before",
            value: cert.not_before.to_rfc3339(),
        },
        FieldRow {
            field: "Not valid after",
            value: cert.not_after.to_rfc3339(),
        },
        FieldRow {
            field: "Serial number",
            value: format!("{} ({})", cert.serial, cert.serial_hex),
        },
        FieldRow {
            field: "Version",
            value: format!("v{}", cert.version),
        },
        FieldRow {
            field: "Signature algorithm",
            value: cert.signature_algorithm.clone(),
        },
        FieldRow {
            field: "SHA-256 fingerprint",
            value: cert.fingerprint_sha256.clone(),
        },
    ]
}

/// Render the certificate table.
pub fn certificate_table(cert: &Certificate) -> String {
    Table::new(certificate_rows(cert))
        .with(Style::sharp())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGNER_PEM: &str = include_str!("../../../tests/fixtures/signer.pem");

    fn signer() -> Certificate {
        Certificate::from_pem(SIGNER_PEM.as_bytes()).unwrap()
    }

    #[test]
    fn test_certificate_rows_order_and_values() {
        let cert = signer();
        let rows = certificate_rows(&cert);
        let fields: Vec<&str> = rows.iter().map(|r| r.field).collect();
        assert_eq!(fields[0], "Public key algorithm");
        assert_eq!(fields[1], "Subject");
        assert_eq!(rows[0].value, "rsaEncryption (2048 bit)");
        assert_eq!(rows[5].value, "6493082350130163725 (5a:1c:0f:fe:e0:dd:f0:0d)");
    }

    #[test]
    fn test_certificate_table_renders_headers() {
        let table = certificate_table(&signer());
        assert!(table.contains("FIELD"));
        assert!(table.contains("VALUE"));
        assert!(table.contains("Customer HSM"));
        assert!(table.contains("2036-10-13T07:40:28+00:00"));
    }

    #[test]
    fn test_certificate_report_json_shape() {
        let cert = signer();
        let json = serde_json::to_value(CertificateReport::new(&cert)).unwrap();
        assert_eq!(json["serial"], "6493082350130163725");
        assert_eq!(json["public_key_algorithm"], "rsaEncryption");
        assert_eq!(json["public_key_bits"], 2048);
        assert_eq!(json["not_before"], "2026-10-16T07:40:28Z");
    }
}
