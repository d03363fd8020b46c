//! Error types for the soundstage rendering crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or rendering a soundstage.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// A track was constructed with a zero sample rate.
    #[error("invalid sample rate {0}: must be greater than zero")]
    InvalidSampleRate(u32),

    /// The two channels of a stereo signal differ in length.
    #[error("channel length mismatch: left has {left} samples, right has {right}")]
    ChannelLengthMismatch {
        /// Samples in the left channel.
        left: usize,
        /// Samples in the right channel.
        right: usize,
    },

    /// Only mono and stereo sources are supported.
    #[error("unsupported channel count {0}: only mono and stereo are supported")]
    UnsupportedChannelCount(u16),

    /// A speaker position contains NaN or infinity.
    #[error("speaker position ({x}, {y}) is not finite")]
    NonFinitePoint {
        /// Horizontal coordinate.
        x: f64,
        /// Depth coordinate.
        y: f64,
    },

    /// A speaker is so far away that its delayed render cannot be allocated.
    #[error("speaker at ({x}, {y}) is too distant to render: delay exceeds the addressable buffer size")]
    DelayOutOfRange {
        /// Horizontal coordinate.
        x: f64,
        /// Depth coordinate.
        y: f64,
    },

    /// A rendering parameter is out of range.
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    /// No impulse-response file exists for the requested direction.
    #[error("HRIR not found: {}", path.display())]
    HrirNotFound {
        /// The dataset file that was looked up.
        path: PathBuf,
    },

    /// An impulse response is empty or has a zero peak and cannot be normalized.
    #[error("impulse response {0} is silent and cannot be normalized")]
    SilentImpulse(String),

    /// `mix` was called on a soundstage without speakers.
    #[error("cannot mix an empty soundstage")]
    EmptyStage,

    /// Two speakers being mixed render at different sample rates.
    #[error("sample rate mismatch: expected {expected} Hz, got {got} Hz")]
    SampleRateMismatch {
        /// Sample rate of the first speaker.
        expected: u32,
        /// Sample rate of the offending speaker.
        got: u32,
    },

    /// A scene file refers to a track name it never declared.
    #[error("scene refers to unknown track '{0}'")]
    UnknownTrack(String),

    /// WAV decode/encode failure.
    #[error(transparent)]
    Wav(#[from] hound::Error),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

/// Convenience Result type for soundstage operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
