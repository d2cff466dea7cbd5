// kekverify-core: certificate loading, canonical JSON, payload building, verification
// No internal kekverify dependencies. Foundation crate.

pub mod canonical;
pub mod certificate;
pub mod config;
pub mod error;
pub mod observability;
pub mod payload;
pub mod signing;
pub mod verify;

pub use certificate::{Certificate, load_certificate};
pub use error::{Error, Result};
pub use payload::{SignaturePayload, build_signed_message};
pub use verify::{VerificationOutcome, verify};
