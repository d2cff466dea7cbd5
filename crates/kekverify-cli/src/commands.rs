use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::debug;

use crate::display::{self, CertificateReport, SignedDataReport, VerifyReport};
use crate::output::{self, OutputFormat};
use crate::ui;

use kekverify_core::config::VerifierConfig;
use kekverify_core::observability::logging::{self, LogFormat};
use kekverify_core::{build_signed_message, load_certificate, signing, verify};

#[derive(Parser)]
#[command(
    name = "kekverify",
    version,
    about = "Verify detached RSA signatures over KEK responses against an X.509 certificate"
)]
struct Cli {
    /// Output format: human, json
    #[arg(long, short = 'o', global = true, default_value = "human")]
    output: String,

    /// Log format on stderr: human, json
    #[arg(long, global = true, default_value = "human")]
    log_format: String,

    /// Defaults to `verify` with the default input paths
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print certificate metadata and check the response signature (PKCS#1 v1.5, SHA-256)
    Verify {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Print certificate metadata without checking a signature
    Inspect {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Print the exact bytes the response signature covers
    SignedData {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Sign a KEK object and PEM string into a response document
    Sign {
        /// RSA private key (PKCS#8 or PKCS#1 PEM)
        #[arg(long)]
        key: PathBuf,
        /// JSON file holding the KEK object
        #[arg(long)]
        kek: PathBuf,
        /// Text file holding the PEM string, used verbatim
        #[arg(long)]
        pem: PathBuf,
        /// Write the response here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Verifier config file (TOML) supplying the response field names
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Input locations shared by the read-side commands.
#[derive(Args, Debug, Clone, Default)]
struct InputArgs {
    /// PEM certificate [default: ./cert]
    #[arg(long)]
    cert: Option<PathBuf>,
    /// Signed response document [default: ./response-from-M.json]
    #[arg(long)]
    response: Option<PathBuf>,
    /// Verifier config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl InputArgs {
    /// Built-in defaults, overridden by the config file, overridden by flags.
    fn resolve(&self) -> Result<VerifierConfig> {
        let mut config = VerifierConfig::load(self.config.as_deref())?;
        if let Some(ref cert) = self.cert {
            config.inputs.certificate = cert.clone();
        }
        if let Some(ref response) = self.response {
            config.inputs.response = response.clone();
        }
        debug!(
            certificate = %config.inputs.certificate.display(),
            response = %config.inputs.response.display(),
            "resolved inputs"
        );
        Ok(config)
    }
}

/// The clap command tree, for man pages and completions.
pub fn command() -> clap::Command {
    Cli::command()
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(LogFormat::from_str_arg(&cli.log_format));

    let out_fmt = OutputFormat::from_str_arg(&cli.output);

    let command = cli.command.unwrap_or(Commands::Verify {
        inputs: InputArgs::default(),
    });
    match command {
        Commands::Verify { inputs } => cmd_verify(&inputs, out_fmt),
        Commands::Inspect { inputs } => cmd_inspect(&inputs, out_fmt),
        Commands::SignedData { inputs } => cmd_signed_data(&inputs, out_fmt),
        Commands::Sign {
            key,
            kek,
            pem,
            out,
            config,
        } => cmd_sign(&key, &kek, &pem, out.as_deref(), config.as_deref()),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

fn cmd_verify(inputs: &InputArgs, out_fmt: OutputFormat) -> Result<()> {
    let config = inputs.resolve()?;
    if out_fmt == OutputFormat::Human {
        if let Some(ref path) = inputs.config {
            ui::info(&format!("Using config {}", path.display()));
        }
    }

    let cert = load_certificate(&config.inputs.certificate).with_context(|| {
        format!(
            "Failed to load certificate {}",
            config.inputs.certificate.display()
        )
    })?;
    if out_fmt == OutputFormat::Human {
        ui::section("Certificate information");
        println!("{}", display::certificate_table(&cert));
    }

    let payload = build_signed_message(&config.inputs.response, &config.fields)
        .with_context(|| {
            format!(
                "Failed to build signed message from {}",
                config.inputs.response.display()
            )
        })?;
    if out_fmt == OutputFormat::Human {
        ui::section("Signed data");
        println!("{}", payload.signed_data());
    }

    let outcome = verify(&cert, &payload.message(), payload.signature())
        .with_context(|| "Signature check could not be performed")?;

    match out_fmt {
        OutputFormat::Human => {
            println!();
            ui::outcome(outcome);
        }
        OutputFormat::Json => output::print_json(&VerifyReport {
            certificate: CertificateReport::new(&cert),
            signed_data: payload.signed_data(),
            outcome,
            message: outcome.message(),
        })?,
    }
    Ok(())
}

fn cmd_inspect(inputs: &InputArgs, out_fmt: OutputFormat) -> Result<()> {
    let config = inputs.resolve()?;
    let cert = load_certificate(&config.inputs.certificate).with_context(|| {
        format!(
            "Failed to load certificate {}",
            config.inputs.certificate.display()
        )
    })?;

    match out_fmt {
        OutputFormat::Human => {
            ui::section("Certificate information");
            println!("{}", display::certificate_table(&cert));
        }
        OutputFormat::Json => output::print_json(&CertificateReport::new(&cert))?,
    }
    Ok(())
}

fn cmd_signed_data(inputs: &InputArgs, out_fmt: OutputFormat) -> Result<()> {
    let config = inputs.resolve()?;
    let payload = build_signed_message(&config.inputs.response, &config.fields)
        .with_context(|| {
            format!(
                "Failed to build signed message from {}",
                config.inputs.response.display()
            )
        })?;

    match out_fmt {
        // Raw bytes, no decoration, so the output can be diffed or piped
        // into another signature tool.
        OutputFormat::Human => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&payload.message())?;
            stdout.flush()?;
        }
        OutputFormat::Json => output::print_json(&SignedDataReport::from(&payload))?,
    }
    Ok(())
}

fn cmd_sign(
    key_path: &Path,
    kek_path: &Path,
    pem_path: &Path,
    out: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let config = VerifierConfig::load(config)?;

    let key = signing::load_private_key(key_path)
        .with_context(|| format!("Failed to load signing key {}", key_path.display()))?;

    let kek_text = std::fs::read_to_string(kek_path)
        .with_context(|| format!("Failed to read KEK object {}", kek_path.display()))?;
    let kek: serde_json::Value = serde_json::from_str(&kek_text)
        .with_context(|| format!("KEK object {} is not valid JSON", kek_path.display()))?;

    let pem = std::fs::read_to_string(pem_path)
        .with_context(|| format!("Failed to read PEM string {}", pem_path.display()))?;

    let doc = signing::build_response(&key, kek, &pem, &config.fields)?;
    let rendered = serde_json::to_string_pretty(&doc)?;

    match out {
        Some(path) => {
            std::fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write response {}", path.display()))?;
            ui::success(&format!("Wrote signed response to {}", path.display()));
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn cmd_completions(shell: clap_complete::Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "kekverify", &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verify_flags_parse() {
        let cli = Cli::try_parse_from([
            "kekverify",
            "verify",
            "--cert",
            "hsm.pem",
            "--response",
            "resp.json",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output, "json");
        match cli.command {
            Some(Commands::Verify { inputs }) => {
                assert_eq!(inputs.cert, Some(PathBuf::from("hsm.pem")));
                assert_eq!(inputs.response, Some(PathBuf::from("resp.json")));
                assert!(inputs.config.is_none());
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn test_bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["kekverify"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output, "human");

        let cli = Cli::try_parse_from(["kekverify", "-o", "json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output, "json");
    }

    #[test]
    fn test_resolve_defaults() {
        let config = InputArgs::default().resolve().unwrap();
        assert_eq!(config.inputs.certificate, PathBuf::from("cert"));
        assert_eq!(config.inputs.response, PathBuf::from("response-from-M.json"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("kekverify.toml");
        std::fs::write(
            &config_path,
            "[inputs]\ncertificate = \"from-config.pem\"\nresponse = \"from-config.json\"\n",
        )
        .unwrap();

        let args = InputArgs {
            cert: Some(PathBuf::from("flag.pem")),
            response: None,
            config: Some(config_path),
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.inputs.certificate, PathBuf::from("flag.pem"));
        assert_eq!(config.inputs.response, PathBuf::from("from-config.json"));
    }

    #[test]
    fn test_sign_requires_key() {
        assert!(Cli::try_parse_from(["kekverify", "sign", "--kek", "k.json", "--pem", "p"]).is_err());
    }
}
