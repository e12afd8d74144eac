use crate::contract::RemoteStore;
use crate::convert::Rmc;
use crate::load_config::{load_config, CliOverrides};
use crate::merge::LopdfMerger;
use crate::remote::Rmapi;
use crate::synchronise::{retrieve_listing, synchronise};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI for rmcloud2pdf: mirror reMarkable cloud notebooks as PDFs.
#[derive(Parser)]
#[clap(
    name = "rmcloud2pdf",
    version,
    about = "Import documents from the reMarkable cloud and convert them to PDF (rmapi must be logged in)"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror the cloud tree into OUTPUT and convert every notebook to PDF
    Sync {
        /// Defines the output path
        #[clap(short, long)]
        output: PathBuf,
        #[clap(flatten)]
        common: CommonArgs,
    },
    /// Print the remote entries that a sync would process
    List {
        #[clap(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// Directory names to ignore
    #[clap(short, long = "ignore-dirs", num_args = 1..)]
    pub ignore_dirs: Vec<String>,
    /// Directory names to sync files in (everything when omitted)
    #[clap(short, long = "sync-dirs", num_args = 1..)]
    pub sync_dirs: Vec<String>,
    /// Optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { output, common } => {
            let loaded = load_config(
                common.config.as_deref(),
                CliOverrides {
                    output_dir: Some(output),
                    ignore_dirs: common.ignore_dirs,
                    sync_dirs: common.sync_dirs,
                },
            )?;
            loaded.sync.trace_loaded();
            loaded.tools.trace_loaded();

            let remote = Rmapi::new(loaded.tools.clone());
            let converter = Rmc::new(loaded.tools.clone());
            println!("Synchronise starting...");
            match synchronise(&loaded.sync, &remote, &converter, &LopdfMerger).await {
                Ok(report) => {
                    println!("Synchronise complete.\nReport:");
                    print!("{report}");
                    Ok(())
                }
                Err(e) => {
                    eprintln!("[ERROR] Synchronisation failed: {}", e);
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::List { common } => {
            let loaded = load_config(
                common.config.as_deref(),
                CliOverrides {
                    output_dir: None,
                    ignore_dirs: common.ignore_dirs,
                    sync_dirs: common.sync_dirs,
                },
            )?;
            let remote = Rmapi::new(loaded.tools.clone());
            list(&remote, &loaded.sync).await
        }
    }
}

async fn list<R: RemoteStore>(remote: &R, config: &crate::config::SyncConfig) -> Result<()> {
    let (listing, excluded) = retrieve_listing(remote, config).await?;
    print!("{listing}");
    if !excluded.is_empty() {
        eprintln!("({} entries excluded by filters)", excluded.len());
    }
    Ok(())
}
