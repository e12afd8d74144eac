use anyhow::Result;
use clap::Parser;
use rmcloud2pdf::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // RMAPI_BIN / RMC_BIN may come from a .env file.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::debug!("Environment loaded, tracing initialised");

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "rmcloud2pdf exited with error");
    }
    result
}
