// kekverify-cli: Clap commands, UI, report rendering
// Depends on kekverify-core

pub mod commands;
pub mod display;
pub mod output;
pub mod ui;

pub use commands::{command, run};
