//! Building the signed byte sequence from a response document.
//!
//! The signer covered `canonical(object) || text` as UTF-8 with no
//! delimiter. The signature travels next to them, base64-encoded.

use std::path::Path;

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::canonical;
use crate::error::{Error, Result, read_file};

/// Standard alphabet with canonical padding. Non-zero bits in the final
/// symbol are discarded.
const SIGNATURE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Names of the three response fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    /// Structured value that is canonicalized before signing.
    pub object: String,
    /// Plain string appended after the canonical object.
    pub text: String,
    /// Base64 detached signature.
    pub signature: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            object: "kek".to_string(),
            text: "pemString".to_string(),
            signature: "base64EncodedSignature".to_string(),
        }
    }
}

/// The message and signature extracted from one response document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePayload {
    canonical_object: String,
    text: String,
    signature: Vec<u8>,
}

impl SignaturePayload {
    pub fn new(canonical_object: String, text: String, signature: Vec<u8>) -> Self {
        Self {
            canonical_object,
            text,
            signature,
        }
    }

    /// Extract the payload from a parsed response document.
    pub fn from_value(doc: &Value, fields: &FieldNames) -> Result<Self> {
        let map = doc
            .as_object()
            .ok_or_else(|| Error::Format("response must be a JSON object".to_string()))?;

        let object = map
            .get(&fields.object)
            .ok_or_else(|| missing(&fields.object))?;
        let text = map
            .get(&fields.text)
            .ok_or_else(|| missing(&fields.text))?
            .as_str()
            .ok_or_else(|| not_a_string(&fields.text))?;
        let encoded = map
            .get(&fields.signature)
            .ok_or_else(|| missing(&fields.signature))?
            .as_str()
            .ok_or_else(|| not_a_string(&fields.signature))?;

        let signature = decode_signature(encoded)?;
        let canonical_object = canonical::canonicalize(object)?;

        Ok(Self::new(canonical_object, text.to_string(), signature))
    }

    /// Parse a response document from JSON text.
    pub fn from_json_str(json: &str, fields: &FieldNames) -> Result<Self> {
        let doc: Value = serde_json::from_str(json)
            .map_err(|e| Error::Format(format!("response is not valid JSON: {}", e)))?;
        Self::from_value(&doc, fields)
    }

    pub fn canonical_object(&self) -> &str {
        &self.canonical_object
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The signed data as text, for echoing to the operator.
    pub fn signed_data(&self) -> String {
        format!("{}{}", self.canonical_object, self.text)
    }

    /// The exact bytes the signature covers.
    pub fn message(&self) -> Vec<u8> {
        self.signed_data().into_bytes()
    }
}

/// Read the response document at `path` and build its payload.
pub fn build_signed_message(path: &Path, fields: &FieldNames) -> Result<SignaturePayload> {
    debug!(path = %path.display(), "loading signed response");
    let data = read_file(path)?;
    let json = std::str::from_utf8(&data)
        .map_err(|e| Error::Format(format!("response is not UTF-8: {}", e)))?;
    let payload = SignaturePayload::from_json_str(json, fields)?;
    debug!(
        message_len = payload.message().len(),
        signature_len = payload.signature().len(),
        "signed message built"
    );
    Ok(payload)
}

/// Decode a standard base64 signature. ASCII whitespace (line wrapping) is
/// ignored; any other character outside the alphabet is rejected.
pub fn decode_signature(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    SIGNATURE_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| Error::Format(format!("signature is not valid base64: {}", e)))
}

fn missing(field: &str) -> Error {
    Error::Format(format!("missing required field '{}'", field))
}

fn not_a_string(field: &str) -> Error {
    Error::Format(format!("field '{}' must be a string", field))
}
