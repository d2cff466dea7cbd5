//! # kekverify: detached signature checks for KEK responses
//!
//! Facade crate that re-exports the kekverify workspace crates so consumers
//! can depend on a single `kekverify` library.
//!
//! ## Crate breakdown
//!
//! | Module | Crate | Purpose |
//! |--------|-------|---------|
//! | [`core`] | kekverify-core | Certificate loading, canonical JSON, payload, verify, sign |
//! | [`cli`] | kekverify-cli | Clap commands, UI, report rendering |

pub use kekverify_cli as cli;
pub use kekverify_core as core;
