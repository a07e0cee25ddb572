use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pdb_pfam_export::{CategoryMapping, Config, Result, export, remap_csv};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "pdb-pfam-export",
    version,
    about = "Export the InterPro PDB-to-Pfam mapping as CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through the upstream API and write pfam_acc,structure rows
    Export {
        /// Endpoint of the first page (default: the InterPro PDB/Pfam listing)
        #[arg(long)]
        base_url: Option<String>,
        /// JSON config file; missing keys take their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rewrite the rna_type column of a family CSV through the category table
    Remap {
        /// Family CSV to read
        input: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Export {
            base_url,
            config,
            output,
        } => {
            let mut config = match config {
                Some(path) => Config::from_json_file(&path)?,
                None => Config::default(),
            };
            if let Some(base_url) = base_url {
                config.fetch.base_url = base_url;
            }

            match output {
                Some(path) => export(&config, File::create(&path)?).await?,
                None => export(&config, std::io::stdout().lock()).await?,
            };
            Ok(())
        }
        Commands::Remap { input } => {
            let file = File::open(&input)?;
            let mapping = CategoryMapping::rfam_default();
            let rows = remap_csv(&mapping, BufReader::new(file), std::io::stdout().lock())?;
            info!(rows, input = %input.display(), "Remap complete");
            Ok(())
        }
    }
}
