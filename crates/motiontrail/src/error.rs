use crate::types::{Resolution, FRAME_DELAY_LIMIT, SECTION_CAPACITY};

/// Setup problems. These stop the effect from starting (or reject a live
/// edit) and are never raised from a tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("resolution {0} must have non-zero width and height")]
    InvalidResolution(Resolution),
    #[error("delay count {0} exceeds the shader frame limit ({})", FRAME_DELAY_LIMIT)]
    DelayOutOfRange(usize),
    #[error("ring capacity {0} must be between 1 and {}", FRAME_DELAY_LIMIT)]
    InvalidCapacity(usize),
    #[error("section {index} threshold {threshold} must be a non-negative number")]
    NegativeThreshold { index: usize, threshold: f32 },
    #[error("{0} sections exceed the shader gradient capacity ({})", SECTION_CAPACITY)]
    TooManySections(usize),
    #[error("resolution cannot change from {current} to {requested} while the effect is running")]
    ResolutionChanged {
        current: Resolution,
        requested: Resolution,
    },
}

/// Per-tick capture failures. The controller logs these, skips the tick's
/// upload and keeps running.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("source frame is {actual} but the frame history expects {expected}")]
    ResolutionMismatch {
        expected: Resolution,
        actual: Resolution,
    },
    #[error("slot {index} is outside the ring capacity ({capacity})")]
    SlotOutOfRange { index: usize, capacity: usize },
    #[error("failed to read back source frame: {0}")]
    Readback(String),
}
