/// Shared sign session
///
/// Wraps one `SignAggregator` behind a single lock so a capture task and a
/// UI task can share it. Gesture commits and manual sentence edits all take
/// the same write lock and are therefore serialized.

use crate::aggregator::{display_letter, AggregatorConfig, AggregatorError, Observation, SignAggregator};
use crate::frame::FrameObservation;
use crate::labels::ClassLabel;
use crate::source::{FrameSource, SourceError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info};

/// A character committed by a gesture
#[derive(Debug, Clone, PartialEq)]
pub struct CommitEvent {
    /// Character appended to the sentence
    pub character: char,

    /// Label that produced it
    pub label: ClassLabel,

    /// Diagnostics at the moment of commit
    pub confidence: f32,
    pub stability: f32,

    /// Microseconds since the Unix epoch
    pub timestamp: i64,
}

/// Read model polled by the display layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceSnapshot {
    pub sentence: String,
    pub letter: String,
    pub confidence: f32,
    pub stability: f32,
}

/// Session statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_observed: u64,
    pub frames_absent: u64,
    pub frames_rejected: u64,
    pub letters_committed: u64,
    pub window_len: usize,
    pub locked: bool,
}

struct SessionState {
    aggregator: SignAggregator,
    frames_observed: u64,
    frames_absent: u64,
    frames_rejected: u64,
    letters_committed: u64,
}

/// Serialized, cloneable handle to one hand-tracking session
#[derive(Clone)]
pub struct SignSession {
    state: Arc<RwLock<SessionState>>,
    event_tx: mpsc::UnboundedSender<CommitEvent>,
    event_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<CommitEvent>>>>,
}

impl SignSession {
    /// Create a session with the given aggregator configuration
    pub fn new(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        let aggregator = SignAggregator::with_config(config)?;
        info!("Sign session created");
        Ok(Self::from_aggregator(aggregator))
    }

    /// Wrap an existing aggregator
    pub fn from_aggregator(aggregator: SignAggregator) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let state = SessionState {
            aggregator,
            frames_observed: 0,
            frames_absent: 0,
            frames_rejected: 0,
            letters_committed: 0,
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            event_tx,
            event_rx: Arc::new(Mutex::new(Some(event_rx))),
        }
    }

    /// Feed one frame through the aggregator
    ///
    /// A commit is published on the event channel before the lock is
    /// released, so events arrive in commit order.
    pub async fn observe(&self, frame: &FrameObservation) -> Result<Observation, AggregatorError> {
        let mut state = self.state.write().await;

        let observation = match state.aggregator.observe(frame) {
            Ok(o) => o,
            Err(e) => {
                state.frames_rejected += 1;
                return Err(e);
            }
        };

        state.frames_observed += 1;
        if !frame.is_present() {
            state.frames_absent += 1;
        }

        if let (Some(character), Some(label)) = (observation.committed, observation.letter) {
            state.letters_committed += 1;

            let event = CommitEvent {
                character,
                label,
                confidence: observation.confidence,
                stability: observation.stability,
                timestamp: Self::current_timestamp_micros(),
            };

            if let Err(e) = self.event_tx.send(event) {
                error!("Failed to send commit event: {}", e);
            }
        }

        if state.frames_observed % 1000 == 0 {
            debug!(
                "Observed {} frames, committed {} letters",
                state.frames_observed, state.letters_committed
            );
        }

        Ok(observation)
    }

    /// Drain a frame source until it ends
    ///
    /// Rejected frames are counted and skipped; only source failures stop
    /// the loop.
    pub async fn process_source<S>(&self, source: &mut S) -> Result<SessionStats, SourceError>
    where
        S: FrameSource + ?Sized,
    {
        while let Some(frame) = source.next_frame().await? {
            // Already logged and counted by observe
            let _ = self.observe(&frame).await;
        }

        let stats = self.stats().await;
        info!(
            "Frame source exhausted: {} frames, {} rejected, {} letters committed",
            stats.frames_observed, stats.frames_rejected, stats.letters_committed
        );
        Ok(stats)
    }

    pub async fn clear_sentence(&self) {
        self.state.write().await.aggregator.clear_sentence();
    }

    pub async fn backspace(&self) {
        self.state.write().await.aggregator.backspace();
    }

    pub async fn commit_space(&self) {
        self.state.write().await.aggregator.commit_space();
    }

    /// Current sentence, letter and diagnostics
    pub async fn snapshot(&self) -> SentenceSnapshot {
        let state = self.state.read().await;
        let aggregator = &state.aggregator;

        SentenceSnapshot {
            sentence: aggregator.sentence().to_string(),
            letter: display_letter(aggregator.stable_letter()),
            confidence: aggregator.latest_confidence(),
            stability: aggregator.latest_stability(),
        }
    }

    pub async fn sentence(&self) -> String {
        self.state.read().await.aggregator.sentence().to_string()
    }

    /// Get current statistics
    pub async fn stats(&self) -> SessionStats {
        let state = self.state.read().await;

        SessionStats {
            frames_observed: state.frames_observed,
            frames_absent: state.frames_absent,
            frames_rejected: state.frames_rejected,
            letters_committed: state.letters_committed,
            window_len: state.aggregator.window_len(),
            locked: state.aggregator.is_locked(),
        }
    }

    /// Reset gesture state and counters; the sentence is kept
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.aggregator.reset();
        state.frames_observed = 0;
        state.frames_absent = 0;
        state.frames_rejected = 0;
        state.letters_committed = 0;
        info!("Session reset");
    }

    /// Get the next commit event (non-blocking)
    ///
    /// Always `None` once the receiver has been taken.
    pub async fn try_recv_event(&self) -> Option<CommitEvent> {
        let mut rx = self.event_rx.lock().await;
        rx.as_mut()?.try_recv().ok()
    }

    /// Take sole ownership of the commit event stream
    ///
    /// Only the first call gets the receiver. The lock is released before
    /// the caller waits on it, so polling and editing are never blocked.
    pub async fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<CommitEvent>> {
        let receiver = self.event_rx.lock().await.take();
        if receiver.is_some() {
            debug!("Commit event receiver taken");
        }
        receiver
    }

    fn current_timestamp_micros() -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0)
    }
}
