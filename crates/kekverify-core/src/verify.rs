//! RSA PKCS#1 v1.5 / SHA-256 signature verification.

use std::fmt;

use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, warn};

use crate::certificate::Certificate;
use crate::error::Result;

/// Terminal state of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOutcome {
    Valid,
    Invalid,
}

impl VerificationOutcome {
    pub fn is_valid(self) -> bool {
        self == VerificationOutcome::Valid
    }

    /// Operator-facing sentence for the outcome.
    pub fn message(self) -> &'static str {
        match self {
            VerificationOutcome::Valid => "The signature is valid.",
            VerificationOutcome::Invalid => "The signature is invalid.",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationOutcome::Valid => write!(f, "VALID"),
            VerificationOutcome::Invalid => write!(f, "INVALID"),
        }
    }
}

/// Check `signature` over `message` with the certificate's RSA key.
///
/// A mismatch, including a signature of the wrong length, is
/// [`VerificationOutcome::Invalid`]. An error means the check could not be
/// performed at all, e.g. the certificate does not carry an RSA key.
pub fn verify(cert: &Certificate, message: &[u8], signature: &[u8]) -> Result<VerificationOutcome> {
    let public_key = cert.public_key().to_rsa()?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);

    let outcome = match Signature::try_from(signature) {
        Ok(sig) => match verifying_key.verify(message, &sig) {
            Ok(()) => VerificationOutcome::Valid,
            Err(_) => VerificationOutcome::Invalid,
        },
        Err(_) => VerificationOutcome::Invalid,
    };

    match outcome {
        VerificationOutcome::Valid => info!(subject = %cert.subject, "signature verified"),
        VerificationOutcome::Invalid => warn!(
            subject = %cert.subject,
            signature_len = signature.len(),
            "signature does not match"
        ),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::payload::{FieldNames, SignaturePayload};

    const SIGNER_PEM: &str = include_str!("../../../tests/fixtures/signer.pem");
    const OTHER_PEM: &str = include_str!("../../../tests/fixtures/other.pem");
    const EC_PEM: &str = include_str!("../../../tests/fixtures/ec.pem");
    const RESPONSE: &str = include_str!("../../../tests/fixtures/response.json");
    const MINIMAL: &str = include_str!("../../../tests/fixtures/response-minimal.json");

    fn signer() -> Certificate {
        Certificate::from_pem(SIGNER_PEM.as_bytes()).unwrap()
    }

    fn payload(json: &str) -> SignaturePayload {
        SignaturePayload::from_json_str(json, &FieldNames::default()).unwrap()
    }

    #[test]
    fn test_fixture_signature_is_valid() {
        let p = payload(RESPONSE);
        let outcome = verify(&signer(), &p.message(), p.signature()).unwrap();
        assert_eq!(outcome, VerificationOutcome::Valid);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_minimal_signature_is_valid() {
        let p = payload(MINIMAL);
        assert_eq!(
            verify(&signer(), &p.message(), p.signature()).unwrap(),
            VerificationOutcome::Valid
        );
    }

    #[test]
    fn test_any_signature_bit_flip_is_invalid() {
        let p = payload(MINIMAL);
        let cert = signer();
        let message = p.message();
        for (byte, bit) in [(0usize, 0u8), (17, 3), (128, 7), (255, 1)] {
            let mut sig = p.signature().to_vec();
            sig[byte] ^= 1 << bit;
            assert_eq!(
                verify(&cert, &message, &sig).unwrap(),
                VerificationOutcome::Invalid,
                "flip of byte {byte} bit {bit}"
            );
        }
    }

    #[test]
    fn test_message_bit_flip_is_invalid() {
        let p = payload(MINIMAL);
        let cert = signer();
        let mut message = p.message();
        message[3] ^= 0x01;
        assert_eq!(
            verify(&cert, &message, p.signature()).unwrap(),
            VerificationOutcome::Invalid
        );
    }

    #[test]
    fn test_text_field_bit_flip_is_invalid() {
        let p = payload(MINIMAL);
        let cert = signer();
        let start = p.canonical_object().len();
        for offset in [start, start + 10, p.message().len() - 1] {
            let mut message = p.message();
            message[offset] ^= 0x02;
            assert_eq!(
                verify(&cert, &message, p.signature()).unwrap(),
                VerificationOutcome::Invalid,
                "flip at offset {offset}"
            );
        }
    }

    #[test]
    fn test_truncated_and_empty_signatures_are_invalid() {
        let p = payload(MINIMAL);
        let cert = signer();
        let message = p.message();
        assert_eq!(
            verify(&cert, &message, &p.signature()[..128]).unwrap(),
            VerificationOutcome::Invalid
        );
        assert_eq!(verify(&cert, &message, &[]).unwrap(), VerificationOutcome::Invalid);
    }

    #[test]
    fn test_wrong_certificate_is_invalid() {
        let p = payload(RESPONSE);
        let other = Certificate::from_pem(OTHER_PEM.as_bytes()).unwrap();
        assert_eq!(
            verify(&other, &p.message(), p.signature()).unwrap(),
            VerificationOutcome::Invalid
        );
    }

    #[test]
    fn test_non_rsa_certificate_is_an_error() {
        let p = payload(MINIMAL);
        let ec = Certificate::from_pem(EC_PEM.as_bytes()).unwrap();
        let err = verify(&ec, &p.message(), p.signature()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKey(_)));
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(VerificationOutcome::Valid.message(), "The signature is valid.");
        assert_eq!(VerificationOutcome::Invalid.message(), "The signature is invalid.");
        assert_eq!(VerificationOutcome::Invalid.to_string(), "INVALID");
        assert_eq!(
            serde_json::to_string(&VerificationOutcome::Valid).unwrap(),
            "\"valid\""
        );
    }
}
