use akuru::{
    analysis::Analyzer,
    config::{Config, ConfigStore, DelayRange, FileConfigStore},
    estimator::EstimatorKind,
    server::{router, AppState},
};
use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

/// handwriting practice backend for sinhala letters
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Serves a drawing canvas and scores each attempt at a Sinhala letter with a simulated recogniser, returning confidence, alternatives and coaching feedback."
)]
pub struct Cli {
    /// address to bind
    #[clap(long)]
    host: Option<String>,

    /// port to listen on
    #[clap(short = 'p', long, env = "PORT")]
    port: Option<u16>,

    /// scoring strategy
    #[clap(short = 'e', long, value_enum)]
    estimator: Option<EstimatorKind>,

    /// seed for reproducible predictions
    #[clap(long)]
    seed: Option<u64>,

    /// config file to read (defaults to the platform config dir)
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// do not keep usage statistics
    #[clap(long)]
    no_stats: bool,

    /// decoded drawings smaller than this are treated as empty
    #[clap(long)]
    min_drawing_bytes: Option<usize>,

    /// simulated processing delay in milliseconds, either MS or MIN-MAX
    #[clap(long, value_parser = parse_delay)]
    delay_ms: Option<DelayRange>,

    /// save the effective configuration and exit
    #[clap(long)]
    write_config: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of a loaded config.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(estimator) = self.estimator {
            config.estimator = estimator;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_stats {
            config.track_stats = false;
        }
        if let Some(min) = self.min_drawing_bytes {
            config.min_drawing_bytes = min;
        }
        if self.delay_ms.is_some() {
            config.processing_delay_ms = self.delay_ms;
        }
        config
    }

    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn parse_delay(s: &str) -> Result<DelayRange, String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| format!("invalid delay '{v}': {e}"))
    };
    match s.split_once('-') {
        Some((min, max)) => {
            let (min_ms, max_ms) = (parse(min)?, parse(max)?);
            if min_ms > max_ms {
                return Err(format!("delay range {min_ms}-{max_ms} is reversed"));
            }
            Ok(DelayRange { min_ms, max_ms })
        }
        None => parse(s).map(DelayRange::fixed),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "unable to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = cli.store();
    let config = cli.apply(store.load());

    if cli.write_config {
        store
            .save(&config)
            .with_context(|| format!("writing {}", store.path().display()))?;
        tracing::info!(path = %store.path().display(), "configuration saved");
        return Ok(());
    }

    let analyzer = Analyzer::from_config(&config).context("loading letter data")?;
    let app = router(AppState::new(Arc::new(analyzer)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        estimator = %config.estimator,
        track_stats = config.track_stats,
        min_drawing_bytes = config.min_drawing_bytes,
        "akuru listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
