use std::error::Error;
use std::sync::Arc;

use clap::{ArgEnum, Parser};
use env_logger::{Env, Target};
use log::{error, info};

use tx_loadgen::client::{ClientConfig, HttpTransport, Transport, DEFAULT_BASE_URL};
use tx_loadgen::dispatch::{Strategy, DEFAULT_BATCH_SIZE, DEFAULT_WORKERS};
use tx_loadgen::stats::RULE;

#[derive(ArgEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Sequential,
    Parallel,
    Batch,
}

/// Financial transaction load generator
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// How transactions are submitted
    #[clap(long, arg_enum, default_value = "sequential")]
    pub(crate) mode: Mode,
    /// Number of transactions to generate
    #[clap(long, default_value_t = 1000)]
    pub(crate) count: usize,
    /// Number of parallel workers (parallel mode only)
    #[clap(long, default_value_t = DEFAULT_WORKERS)]
    pub(crate) workers: usize,
    /// Transactions per request (batch mode only)
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub(crate) batch_size: usize,
    /// Base URL of the ingestion service
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    pub(crate) base_url: String,
    /// Abort before sending anything unless the service reports healthy
    #[clap(long)]
    pub(crate) health_check: bool,
    /// Print the service's ingestion statistics after the run
    #[clap(long)]
    pub(crate) server_stats: bool,
    /// Ignore HTTP_PROXY and friends
    #[clap(long)]
    pub(crate) no_proxy: bool,
}

impl Cli {
    fn strategy(&self) -> Result<Strategy, tx_loadgen::error::LoadError> {
        match self.mode {
            Mode::Sequential => Ok(Strategy::sequential(self.count)),
            Mode::Parallel => Strategy::concurrent(self.count, self.workers),
            Mode::Batch => Strategy::batched(self.count, self.batch_size),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();
    let cli = Cli::parse();

    let strategy = cli.strategy()?;
    let config = ClientConfig::default()
        .with_base_url(cli.base_url.as_str())
        .with_system_proxy(!cli.no_proxy);
    let http = HttpTransport::new(config)?;

    println!("\n{RULE}");
    println!("FINANCIAL TRANSACTION LOAD GENERATOR");
    println!("{RULE}");
    println!("Target API: {}", http.endpoint());
    println!("Mode: {}", strategy.name().to_uppercase());
    println!("Total Transactions: {}", strategy.requested());

    if cli.health_check {
        let health = http
            .health()
            .map_err(|e| format!("Health check failed: {e}"))?;
        info!("Ingestion service is healthy: {health}");
    }

    let http = Arc::new(http);
    let transport: Arc<dyn Transport> = http.clone();
    let summary = strategy.run(&transport, &mut |progress| println!("{progress}"))?;
    println!("\n{summary}");

    if cli.server_stats {
        match http.server_stats() {
            Ok(stats) => println!("Server statistics:\n{}", serde_json::to_string_pretty(&stats)?),
            Err(e) => error!("Could not fetch server statistics: {e}"),
        }
    }

    Ok(())
}
