use colored::Colorize;

use kekverify_core::VerificationOutcome;

// ---------------------------------------------------------------------------
// Colored message helpers
// ---------------------------------------------------------------------------

fn prefix() -> String {
    "[kekverify]".bold().cyan().to_string()
}

/// Print an informational message: [kekverify] message
pub fn info(msg: &str) {
    println!("{} {}", prefix(), msg);
}

/// Print a success message: [kekverify] message (in green)
pub fn success(msg: &str) {
    println!("{} {}", prefix(), msg.green());
}

/// Print a section heading preceded by a blank line.
pub fn section(title: &str) {
    println!("\n{} {}", prefix(), title.bold());
}

/// Print the final verdict line.
pub fn outcome(outcome: VerificationOutcome) {
    match outcome {
        VerificationOutcome::Valid => success(outcome.message()),
        VerificationOutcome::Invalid => failure(outcome.message()),
    }
}

/// Print a failed check: [kekverify] message (in red). Goes to stdout
/// because an invalid signature is a result, not an error.
pub fn failure(msg: &str) {
    println!("{} {}", prefix(), msg.red().bold());
}
