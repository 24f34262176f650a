use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use smack_verification::{dispatch, GatewayConfig, Missive, MissiveVerifier};

#[derive(Parser)]
#[command(name = "smack-verify")]
#[command(about = "SMACK verification gateway - offline checks", long_about = None)]
struct Cli {
    /// Gateway configuration file (JSON)
    #[arg(short, long, env = "SMACK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one verification action, print its JSON value
    Check {
        /// verify_receiver, verify_sender, verify_date_correct, verify_date_passed, verify_priority
        action: String,
        /// Parameters as key=value (receiverBIC=..., date=...)
        params: Vec<String>,
    },

    /// Verify a nominal missive (JSON) and print its acknowledgement
    Missive {
        /// Missive file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::load(cli.config.as_deref())?;
    let engine = config.build_engine();

    match cli.command {
        Commands::Check { action, params } => {
            let mut request = parse_params(&params)?;
            request.insert("action".to_string(), action);

            let response = dispatch(&engine, &request);
            println!("{}", response.to_json());

            if response.is_error() {
                std::process::exit(1);
            }
        }
        Commands::Missive { file } => {
            let missive = Missive::from_file(&file)?;

            if !missive.is_nominal() {
                tracing::warn!(file = ?file, kind = %missive.missive_type, "Missive is not of type nominal");
                bail!("missive {:?} is not of type Nominal", file);
            }

            let ack = MissiveVerifier::new(&engine)
                .verify(&missive)
                .with_context(|| format!("Failed to verify missive {}", missive.id))?;

            println!("{}", serde_json::to_string_pretty(&ack)?);
        }
    }

    Ok(())
}

fn parse_params(params: &[String]) -> Result<HashMap<String, String>> {
    params
        .iter()
        .map(|param| match param.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => bail!("parameter '{}' is not key=value", param),
        })
        .collect()
}
