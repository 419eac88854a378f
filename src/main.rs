use anyhow::Context;
use clap::Parser;
use lanecheck::config::Overrides;
use lanecheck::metrics::serve_metrics;
use lanecheck::mode::TestMode;
use lanecheck::{Harness, HarnessConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Traffic distribution harness.
#[derive(Parser, Debug)]
#[command(name = "lanecheck", about = "Verify how a classifier distributes traffic across two lanes")]
struct Cli {
    /// TOML config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// 0/separate, 1/split or 2/partition.
    #[arg(long)]
    test_type: Option<TestMode>,

    /// Generator speed in packets per second (0 = unlimited).
    #[arg(long)]
    speed: Option<u64>,

    /// Packets to receive before judging.
    #[arg(long)]
    number: Option<u64>,

    /// Warm-up delay in milliseconds; traffic before it is not measured.
    #[arg(long)]
    timeout: Option<u64>,

    /// Minimum received/sent percentage to pass.
    #[arg(long)]
    passed_limit: Option<u64>,

    /// Tolerance around the expected lane share, in percent.
    #[arg(long)]
    epsilon: Option<u32>,

    #[arg(long)]
    outport1: Option<u16>,

    #[arg(long)]
    outport2: Option<u16>,

    #[arg(long)]
    inport1: Option<u16>,

    #[arg(long)]
    inport2: Option<u16>,

    /// Rule file in ACL format.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            mode: self.test_type,
            speed: self.speed,
            number: self.number,
            warmup_ms: self.timeout,
            passed_limit: self.passed_limit,
            epsilon: self.epsilon,
            outport1: self.outport1,
            outport2: self.outport2,
            inport1: self.inport1,
            inport2: self.inport2,
            rules: self.rules.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = match &cli.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    let config = config.apply(cli.overrides())?;

    if let Some(addr) = config.metrics_addr {
        match serve_metrics(addr) {
            Ok(_) => tracing::info!(%addr, "Metrics exporter listening"),
            Err(e) => tracing::warn!("Metrics exporter disabled: {}", e),
        }
    }

    let harness = Harness::new(config);
    tracing::info!(
        run_id = %harness.run_id(),
        mode = %harness.config().mode,
        budget = harness.config().number,
        "Starting run"
    );
    let report = harness.run().await?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{report}");
    }

    Ok(report.passed())
}
