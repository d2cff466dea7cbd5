use anyhow::Result;
use serde::Serialize;

/// How command results are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Labelled sections and tables for a terminal.
    Human,
    /// A single pretty-printed JSON document.
    Json,
}

impl OutputFormat {
    pub fn from_str_arg(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Human,
        }
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_arg() {
        assert_eq!(OutputFormat::from_str_arg("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_arg("Json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_arg("human"), OutputFormat::Human);
        assert_eq!(OutputFormat::from_str_arg("table"), OutputFormat::Human);
    }
}
