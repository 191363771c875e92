use clap::Parser;
use rolekeeper_cli::error::CliError;
use rolekeeper_cli::{run, Cli};
use rolekeeper_reconcile::ReconcilerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so command output stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,rolekeeper_reconcile=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match ReconcilerConfig::from_env() {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(CliError::from(e)),
    };

    if let Err(e) = result {
        e.print();
        std::process::exit(e.exit_code());
    }
}
