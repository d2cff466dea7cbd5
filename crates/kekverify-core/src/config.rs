use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::payload::FieldNames;

/// Default certificate path, relative to the working directory.
pub const DEFAULT_CERTIFICATE: &str = "cert";
/// Default response document path, relative to the working directory.
pub const DEFAULT_RESPONSE: &str = "response-from-M.json";

/// Verifier configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    #[serde(default)]
    pub inputs: Inputs,
    #[serde(default)]
    pub fields: FieldNames,
}

/// Where the certificate and the signed response live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inputs {
    /// PEM certificate holding the verification key.
    #[serde(default = "default_certificate")]
    pub certificate: PathBuf,
    /// JSON document with the object, text, and signature fields.
    #[serde(default = "default_response")]
    pub response: PathBuf,
}

fn default_certificate() -> PathBuf {
    PathBuf::from(DEFAULT_CERTIFICATE)
}
fn default_response() -> PathBuf {
    PathBuf::from(DEFAULT_RESPONSE)
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            certificate: default_certificate(),
            response: default_response(),
        }
    }
}

impl VerifierConfig {
    /// Load verifier config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read verifier config: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse verifier config from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).with_context(|| "Failed to parse verifier config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.inputs.certificate.as_os_str().is_empty() {
            anyhow::bail!("inputs.certificate must not be empty");
        }
        if self.inputs.response.as_os_str().is_empty() {
            anyhow::bail!("inputs.response must not be empty");
        }

        let f = &self.fields;
        for (key, name) in [
            ("object", &f.object),
            ("text", &f.text),
            ("signature", &f.signature),
        ] {
            if name.is_empty() {
                anyhow::bail!("fields.{} must not be empty", key);
            }
        }
        if f.object == f.text || f.object == f.signature || f.text == f.signature {
            anyhow::bail!(
                "fields must name three distinct keys (got '{}', '{}', '{}')",
                f.object,
                f.text,
                f.signature
            );
        }
        Ok(())
    }
}
