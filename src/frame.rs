/// Frame observation module
///
/// One observation per video frame, as handed over by the hand-tracking and
/// classification stage: either no hand, or a confidence vector aligned with
/// the label set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Confidence vector has wrong length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Confidence at index {index} is not a finite number")]
    NonFinite { index: usize },

    #[error("Confidence at index {index} is out of range [0, 1]: {value}")]
    OutOfRange { index: usize, value: f32 },
}

/// Per-frame classifier output
#[derive(Debug, Clone, PartialEq)]
pub enum FrameObservation {
    /// No hand detected in this frame
    Absent,

    /// Hand detected; one confidence per label, in label order
    Present(Vec<f32>),
}

impl FrameObservation {
    pub fn is_present(&self) -> bool {
        matches!(self, FrameObservation::Present(_))
    }

    /// Check a present frame against the expected label count
    ///
    /// Absent frames are always valid.
    pub fn validate(&self, expected_len: usize) -> Result<(), FrameError> {
        let confidences = match self {
            FrameObservation::Absent => return Ok(()),
            FrameObservation::Present(c) => c,
        };

        if confidences.len() != expected_len {
            return Err(FrameError::WrongLength {
                expected: expected_len,
                actual: confidences.len(),
            });
        }

        for (index, &value) in confidences.iter().enumerate() {
            if !value.is_finite() {
                return Err(FrameError::NonFinite { index });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(FrameError::OutOfRange { index, value });
            }
        }

        Ok(())
    }
}

/// Index of the highest confidence; ties go to the lowest index
///
/// Returns `None` for an empty slice.
pub fn argmax(confidences: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, &value) in confidences.iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((index, value)),
        }
    }

    best.map(|(index, _)| index)
}

/// JSON-lines wire form of a frame
///
/// `{"confidences": [..]}` is a present hand; `{}` or `{"confidences": null}`
/// is an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub confidences: Option<Vec<f32>>,
}

impl From<FrameRecord> for FrameObservation {
    fn from(record: FrameRecord) -> Self {
        match record.confidences {
            Some(c) => FrameObservation::Present(c),
            None => FrameObservation::Absent,
        }
    }
}

impl From<FrameObservation> for FrameRecord {
    fn from(frame: FrameObservation) -> Self {
        match frame {
            FrameObservation::Present(c) => FrameRecord { confidences: Some(c) },
            FrameObservation::Absent => FrameRecord { confidences: None },
        }
    }
}
