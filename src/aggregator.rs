/// Debounced classifier aggregator
///
/// Turns a noisy per-frame stream of classifier outputs into a stable display
/// letter and commits at most one character per continuous hand-presence
/// interval. Windowed voting decides what is stable; an edge-triggered lock
/// keeps a held gesture from firing repeatedly.

use crate::frame::{argmax, FrameError, FrameObservation};
use crate::history::{HistoryWindow, Ranking, DEFAULT_WINDOW_LENGTH};
use crate::labels::{ClassLabel, LabelSet, UNKNOWN_LETTER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rejected frame: {0}")]
    InvalidFrame(#[from] FrameError),

    #[error("Failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidOverride { name: String, value: String },
}

/// Environment variables that override file configuration
pub const ENV_WINDOW_LENGTH: &str = "SIGN_WINDOW_LENGTH";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "SIGN_CONFIDENCE_THRESHOLD";
pub const ENV_STABILITY_RATIO: &str = "SIGN_STABILITY_RATIO";
pub const ENV_MARGIN_THRESHOLD: &str = "SIGN_MARGIN_THRESHOLD";
pub const ENV_CLEAR_WINDOW_ON_ABSENT: &str = "SIGN_CLEAR_WINDOW_ON_ABSENT";

/// Aggregator tuning parameters
///
/// All gate comparisons are strict: a value exactly equal to its threshold
/// does not pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Number of recent predictions voted over (H)
    pub window_length: usize,

    /// Minimum current-frame confidence for the windowed winner
    pub confidence_threshold: f32,

    /// Minimum share of the window held by the winner
    pub stability_ratio: f32,

    /// Minimum lead of the winner over the runner-up, as a share of the window
    pub margin_threshold: f32,

    /// Drop stale predictions when the hand leaves the frame
    pub clear_window_on_absent: bool,

    /// Class alphabet, aligned with the classifier output
    pub labels: LabelSet,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_WINDOW_LENGTH,
            confidence_threshold: 0.9,
            stability_ratio: 0.75,
            margin_threshold: 0.2,
            clear_window_on_absent: false,
            labels: LabelSet::default(),
        }
    }
}

impl AggregatorConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.window_length == 0 {
            return Err(AggregatorError::InvalidConfig(
                "window_length must be greater than 0".to_string()
            ));
        }

        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("stability_ratio", self.stability_ratio),
            ("margin_threshold", self.margin_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AggregatorError::InvalidConfig(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AggregatorError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: AggregatorConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer `SIGN_*` overrides from `lookup` on top of this config, then validate
    ///
    /// `lookup` maps a variable name to its value; pass
    /// `|name| std::env::var(name).ok()` for the process environment.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Result<Self, AggregatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, ENV_WINDOW_LENGTH)? {
            self.window_length = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_CONFIDENCE_THRESHOLD)? {
            self.confidence_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_STABILITY_RATIO)? {
            self.stability_ratio = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_MARGIN_THRESHOLD)? {
            self.margin_threshold = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_CLEAR_WINDOW_ON_ABSENT)? {
            self.clear_window_on_absent = v;
        }

        self.validate()?;
        Ok(self)
    }
}

fn parse_override<F, T>(lookup: &F, name: &str) -> Result<Option<T>, AggregatorError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => {
            let value = raw.trim().parse().map_err(|_| AggregatorError::InvalidOverride {
                name: name.to_string(),
                value: raw.clone(),
            })?;
            debug!("Config override {}={}", name, raw.trim());
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Diagnostics produced by a single `observe` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Stable letter after this frame, `None` for unknown
    pub letter: Option<ClassLabel>,

    /// Current-frame confidence of the windowed winner
    pub confidence: f32,

    /// Winner's share of the window
    pub stability: f32,

    /// Winner's lead over the runner-up
    pub margin: f32,

    /// Character appended to the sentence by this frame, if any
    pub committed: Option<char>,
}

impl Observation {
    /// Display form of the letter; `"??"` when unknown
    pub fn display_letter(&self) -> String {
        display_letter(self.letter)
    }
}

pub(crate) fn display_letter(letter: Option<ClassLabel>) -> String {
    letter
        .map(|l| l.to_string())
        .unwrap_or_else(|| UNKNOWN_LETTER.to_string())
}

/// Debounced classifier aggregator for one hand-tracking session
pub struct SignAggregator {
    config: AggregatorConfig,
    window: HistoryWindow,
    letter_locked: bool,
    stable_letter: Option<ClassLabel>,
    latest_confidence: f32,
    latest_stability: f32,
    latest_margin: f32,
    sentence: String,
}

impl SignAggregator {
    /// Create an aggregator with default configuration
    pub fn new() -> Self {
        Self::from_parts(AggregatorConfig::default())
    }

    /// Create an aggregator with custom configuration
    pub fn with_config(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        config.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: AggregatorConfig) -> Self {
        info!(
            "Initializing sign aggregator: window={}, confidence>{}, stability>{}, margin>{}, labels={}",
            config.window_length,
            config.confidence_threshold,
            config.stability_ratio,
            config.margin_threshold,
            config.labels.len()
        );

        Self {
            window: HistoryWindow::with_capacity(config.window_length),
            config,
            letter_locked: false,
            stable_letter: None,
            latest_confidence: 0.0,
            latest_stability: 0.0,
            latest_margin: 0.0,
            sentence: String::new(),
        }
    }

    /// Process one frame
    ///
    /// A malformed present frame is rejected before any state changes.
    pub fn observe(&mut self, frame: &FrameObservation) -> Result<Observation, AggregatorError> {
        if let Err(e) = frame.validate(self.config.labels.len()) {
            warn!("Rejecting frame: {}", e);
            return Err(e.into());
        }

        let committed = match frame {
            FrameObservation::Absent => {
                self.on_absent();
                None
            }
            FrameObservation::Present(confidences) => self.on_present(confidences)?,
        };

        Ok(Observation {
            letter: self.stable_letter,
            confidence: self.latest_confidence,
            stability: self.latest_stability,
            margin: self.latest_margin,
            committed,
        })
    }

    fn on_absent(&mut self) {
        if self.letter_locked {
            debug!("Hand absent, releasing letter lock");
        }
        self.letter_locked = false;
        self.stable_letter = None;

        if self.config.clear_window_on_absent && !self.window.is_empty() {
            self.window.clear();
            debug!("Hand absent, cleared history window");
        }
    }

    fn on_present(&mut self, confidences: &[f32]) -> Result<Option<char>, AggregatorError> {
        // Validated frames are non-empty, so both lookups always succeed
        let Some(predicted) = argmax(confidences) else {
            return Ok(None);
        };
        self.window.push(predicted);

        let Some(ranking) = self.window.rank() else {
            return Ok(None);
        };

        self.latest_confidence = confidences.get(ranking.top_index).copied().unwrap_or(0.0);
        self.latest_stability = ranking.stability();
        self.latest_margin = ranking.margin();

        trace!(
            "Frame: predicted={}, top={} ({}/{}), second={}, confidence={:.3}, stability={:.3}, margin={:.3}",
            predicted,
            ranking.top_index,
            ranking.top_count,
            ranking.window_len,
            ranking.second_count,
            self.latest_confidence,
            self.latest_stability,
            self.latest_margin
        );

        let label = match self.settled_label(&ranking) {
            Some(label) => label,
            None => {
                self.stable_letter = None;
                return Ok(None);
            }
        };

        self.stable_letter = Some(label);

        if self.letter_locked {
            return Ok(None);
        }

        let c = label.to_char();
        self.sentence.push(c);
        self.letter_locked = true;
        info!("Committed {:?} (confidence={:.3}, stability={:.3})", c, self.latest_confidence, self.latest_stability);
        debug!("Letter locked until hand leaves");

        Ok(Some(c))
    }

    /// Winner's label if all three gates pass
    fn settled_label(&self, ranking: &Ranking) -> Option<ClassLabel> {
        let settled = self.latest_confidence > self.config.confidence_threshold
            && self.latest_stability > self.config.stability_ratio
            && self.latest_margin > self.config.margin_threshold;

        if settled {
            self.config.labels.get(ranking.top_index)
        } else {
            None
        }
    }

    /// Empty the sentence
    pub fn clear_sentence(&mut self) {
        self.sentence.clear();
        debug!("Sentence cleared");
    }

    /// Remove the last character; no-op on an empty sentence
    pub fn backspace(&mut self) {
        if let Some(c) = self.sentence.pop() {
            debug!("Backspace removed {:?}", c);
        }
    }

    /// Append a space regardless of gesture state or lock
    pub fn commit_space(&mut self) {
        self.sentence.push(' ');
        debug!("Manual space committed");
    }

    /// Forget gesture state (window, lock, letter, diagnostics); keeps the sentence
    pub fn reset(&mut self) {
        self.window.clear();
        self.letter_locked = false;
        self.stable_letter = None;
        self.latest_confidence = 0.0;
        self.latest_stability = 0.0;
        self.latest_margin = 0.0;
        debug!("Aggregator reset");
    }

    pub fn stable_letter(&self) -> Option<ClassLabel> {
        self.stable_letter
    }

    /// Display form of the stable letter; `"??"` when unknown
    pub fn display_letter(&self) -> String {
        display_letter(self.stable_letter)
    }

    pub fn latest_confidence(&self) -> f32 {
        self.latest_confidence
    }

    pub fn latest_stability(&self) -> f32 {
        self.latest_stability
    }

    pub fn latest_margin(&self) -> f32 {
        self.latest_margin
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn is_locked(&self) -> bool {
        self.letter_locked
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }
}

impl Default for SignAggregator {
    fn default() -> Self {
        Self::new()
    }
}
