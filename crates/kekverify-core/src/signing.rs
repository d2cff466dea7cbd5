//! The signer's side of the contract: produce a response document whose
//! signature covers `canonical(object) || text`.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::debug;

use crate::canonical;
use crate::error::{Error, Result, read_file};
use crate::payload::{FieldNames, SignaturePayload};

/// Parse an RSA private key from PEM, accepting PKCS#8 and PKCS#1 encodings.
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    match RsaPrivateKey::from_pkcs8_pem(pem) {
        Ok(key) => Ok(key),
        Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
            Error::PrivateKey(format!(
                "not a PKCS#8 ({}) or PKCS#1 ({}) RSA key",
                pkcs8_err, pkcs1_err
            ))
        }),
    }
}

/// Read an RSA private key from a PEM file.
pub fn load_private_key(path: &Path) -> Result<RsaPrivateKey> {
    debug!(path = %path.display(), "loading signing key");
    let data = read_file(path)?;
    let pem = std::str::from_utf8(&data)
        .map_err(|e| Error::PrivateKey(format!("key file is not UTF-8: {}", e)))?;
    parse_private_key(pem)
}

/// PKCS#1 v1.5 / SHA-256 signature over `message`.
pub fn sign_message(key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>> {
    let signing_key = SigningKey::<Sha256>::new(key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| Error::Signing(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Sign `object` and `text` and return the payload that a verifier rebuilds.
pub fn sign_payload(key: &RsaPrivateKey, object: &Value, text: &str) -> Result<SignaturePayload> {
    let canonical_object = canonical::canonicalize(object)?;
    let message = format!("{}{}", canonical_object, text);
    let signature = sign_message(key, message.as_bytes())?;
    Ok(SignaturePayload::new(canonical_object, text.to_string(), signature))
}

/// Build a response document carrying `object`, `text`, and their signature.
///
/// The object is embedded as given; verifiers canonicalize it again, so
/// its key order must survive serialization.
pub fn build_response(
    key: &RsaPrivateKey,
    object: Value,
    text: &str,
    fields: &FieldNames,
) -> Result<Value> {
    let payload = sign_payload(key, &object, text)?;
    let mut doc = Map::new();
    doc.insert(fields.object.clone(), object);
    doc.insert(fields.text.clone(), Value::String(text.to_string()));
    doc.insert(
        fields.signature.clone(),
        Value::String(STANDARD.encode(payload.signature())),
    );
    Ok(Value::Object(doc))
}
