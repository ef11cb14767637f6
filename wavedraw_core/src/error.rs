use thiserror::Error;

/// Precondition violations surfaced at construction and configuration time.
///
/// Sample indices are deliberately *not* covered here: the input boundary
/// clamps them before they reach the core, so an out-of-range index is a
/// caller bug and panics via slice indexing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WavedrawError {
    #[error("wavetable length must be at least 2, got {0}")]
    TableTooShort(usize),

    #[error("sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("frequency must be positive, got {0}")]
    InvalidFrequency(f32),
}
