use gpg_subkey_exporter::{Config, Scanner, SubkeyMetrics};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(filter)
        .init();
}

async fn run() -> gpg_subkey_exporter::Result<()> {
    let config = Config::from_env()?;
    let metrics = SubkeyMetrics::new()?;

    let scanner = Scanner::new(config.keys_dir, metrics.clone());
    tokio::spawn(async move { scanner.run(config.interval).await });

    gpg_subkey_exporter::serve(config.listen_addr, metrics).await
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(err) = run().await {
        error!(error = %err, "exporter stopped");
        std::process::exit(1);
    }
}
