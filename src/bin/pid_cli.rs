//! PID Command Line Interface
//!
//! Parse identifiers, mint identifiers for research objects described in
//! JSON, and render their registration metadata.
//!
//! # Usage
//!
//! ```bash
//! # Split an identifier into its parts
//! pid_cli parse doi:10.5072/FK2/ABC123
//!
//! # Mint an identifier (in-memory store, no registry lookup)
//! pid_cli mint --file dataset.json
//!
//! # Render DataCite XML or the flat field map
//! pid_cli render --file dataset.json --format xml
//! pid_cli --config pid.yaml render --file file.json --format fields
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use pid_mint::metadata::{metadata_for_create, metadata_for_destroyed};
use pid_mint::{
    GlobalId, IdentifierGenerator, MemoryStore, MetadataDocument, NoRemoteRegistry, PidSettings,
    ResearchObject, UniquenessOracle,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pid_cli")]
#[command(version = "0.1.0")]
#[command(about = "Persistent identifier minting and registration metadata")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML settings file (defaults to PID_* environment variables)
    #[arg(long, short, global = true, env = "PID_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RenderFormat {
    Xml,
    Fields,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a PID into protocol, authority and identifier
    Parse {
        /// The identifier, e.g. doi:10.5072/FK2/ABC123
        pid: String,
    },

    /// Mint an identifier for the object described in a JSON file
    Mint {
        #[arg(short, long)]
        file: PathBuf,

        /// First value handed out by the in-memory counter
        #[arg(long, default_value_t = 1)]
        counter_start: u64,
    },

    /// Render registration metadata for the object described in a JSON file
    Render {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, default_value = "xml", value_enum)]
        format: RenderFormat,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pid_mint=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => PidSettings::from_yaml_file(path)?,
        None => PidSettings::from_env()?,
    };

    match cli.command {
        Commands::Parse { pid } => {
            let parsed = GlobalId::parse(&pid)
                .ok_or_else(|| anyhow::anyhow!("'{}' is not a valid persistent identifier", pid))?;
            let out = serde_json::json!({
                "protocol": parsed.protocol().as_str(),
                "authority": parsed.authority(),
                "identifier": parsed.identifier(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Mint {
            file,
            counter_start,
        } => {
            let mut object = load_object(&file)?;
            let oracle = UniquenessOracle::new(
                Arc::new(MemoryStore::with_counter(counter_start)),
                Arc::new(NoRemoteRegistry),
                settings.registry_timeout(),
            );
            let pid = IdentifierGenerator::new(oracle)
                .generate_identifier(&mut object, &settings)
                .await?;
            eprintln!("Assigned {}", pid);
            println!("{}", serde_json::to_string_pretty(&object)?);
        }
        Commands::Render { file, format } => {
            let object = load_object(&file)?;
            match format {
                RenderFormat::Xml => {
                    let doc = MetadataDocument::from_object(&object, &settings)?;
                    println!("{}", doc.to_xml()?);
                }
                RenderFormat::Fields => {
                    let fields = if object.is_destroyed() {
                        metadata_for_destroyed()
                    } else {
                        metadata_for_create(&object, &settings)?
                    };
                    println!("{}", serde_json::to_string_pretty(&fields)?);
                }
            }
        }
    }

    Ok(())
}

fn load_object(path: &Path) -> anyhow::Result<ResearchObject> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    Ok(serde_json::from_str(&content)?)
}
