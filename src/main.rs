/// Sign replay binary
///
/// Replays a recorded JSON-lines frame log through a sign session, then
/// prints the committed characters in order and the final sentence.

use anyhow::{Context, Result};
use clap::Parser;
use sign_aggregator::{init_logging, AggregatorConfig, JsonLinesSource, SignSession};
use std::path::PathBuf;
use tokio::io::{stdin, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sign-replay")]
#[command(about = "Replay classifier frames through the sign aggregator", long_about = None)]
struct Cli {
    /// Frame log (one JSON record per line); reads stdin when omitted
    frames: Option<PathBuf>,

    /// JSON aggregator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let session = SignSession::new(config).context("Failed to create sign session")?;

    let stats = match &cli.frames {
        Some(path) => {
            info!("Replaying frames from {}", path.display());
            let mut source = JsonLinesSource::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            session.process_source(&mut source).await?
        }
        None => {
            info!("Replaying frames from stdin");
            let mut source = JsonLinesSource::new(BufReader::new(stdin()));
            session.process_source(&mut source).await?
        }
    };

    while let Some(event) = session.try_recv_event().await {
        println!(
            "commit {:?} ({}) confidence={:.2} stability={:.2}",
            event.character, event.label, event.confidence, event.stability
        );
    }

    if stats.frames_rejected > 0 {
        warn!("{} frames were rejected", stats.frames_rejected);
    }

    let snapshot = session.snapshot().await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("sentence: {:?}", snapshot.sentence);
        println!(
            "frames: {} observed, {} absent, {} rejected, {} letters",
            stats.frames_observed, stats.frames_absent, stats.frames_rejected, stats.letters_committed
        );
    }

    Ok(())
}

/// Load configuration from a file (if given) and environment overrides
fn load_config(path: Option<&std::path::Path>) -> Result<AggregatorConfig> {
    let config = match path {
        Some(p) => AggregatorConfig::from_json_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display()))?,
        None => AggregatorConfig::default(),
    };

    config
        .apply_env_overrides(|name| std::env::var(name).ok())
        .context("Invalid aggregator configuration")
}
