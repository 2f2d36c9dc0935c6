/// Sign aggregator library
///
/// Turns per-frame hand-sign classifier output into a debounced stream of
/// committed characters: windowed voting, confidence/stability/margin gates,
/// and an edge-triggered lock that commits once per gesture.

pub mod aggregator;
pub mod frame;
pub mod history;
pub mod labels;
pub mod session;
pub mod source;

// Re-export main types
pub use aggregator::{AggregatorConfig, AggregatorError, Observation, SignAggregator};
pub use frame::{FrameError, FrameObservation, FrameRecord};
pub use history::{HistoryWindow, Ranking, DEFAULT_WINDOW_LENGTH};
pub use labels::{ClassLabel, LabelError, LabelSet, DEFAULT_LABELS, UNKNOWN_LETTER};
pub use session::{CommitEvent, SentenceSnapshot, SessionStats, SignSession};
pub use source::{FrameSource, JsonLinesSource, SourceError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sign_aggregator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
