//! Immutable decoded source signals.
//!
//! A [`Track`] is cheap to clone: every clone shares the same sample buffer,
//! so any number of speakers can read one decoded recording.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, SpatialError};
use crate::wav;

/// Channel layout of a decoded signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Channels {
    /// A single channel.
    Mono(Vec<f32>),
    /// Left and right channels of equal length.
    Stereo(Vec<f32>, Vec<f32>),
}

#[derive(Debug)]
struct TrackData {
    sample_rate: u32,
    channels: Channels,
}

/// A shared, read-only handle to a decoded signal and its sample rate.
#[derive(Debug, Clone)]
pub struct Track {
    inner: Arc<TrackData>,
}

impl Track {
    /// Creates a track from a channel layout.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidSampleRate`] for a zero sample rate and
    /// [`SpatialError::ChannelLengthMismatch`] if stereo channels differ in length.
    pub fn new(sample_rate: u32, channels: Channels) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SpatialError::InvalidSampleRate(sample_rate));
        }
        if let Channels::Stereo(left, right) = &channels {
            if left.len() != right.len() {
                return Err(SpatialError::ChannelLengthMismatch {
                    left: left.len(),
                    right: right.len(),
                });
            }
        }
        Ok(Self {
            inner: Arc::new(TrackData {
                sample_rate,
                channels,
            }),
        })
    }

    /// Creates a mono track.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, Channels::Mono(samples))
    }

    /// Creates a stereo track.
    pub fn stereo(sample_rate: u32, left: Vec<f32>, right: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, Channels::Stereo(left, right))
    }

    /// Creates a track from interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedChannelCount`] for anything other
    /// than one or two channels, and [`SpatialError::ChannelLengthMismatch`]
    /// if a stereo buffer holds an odd number of samples.
    pub fn from_interleaved(sample_rate: u32, channel_count: u16, samples: &[f32]) -> Result<Self> {
        match channel_count {
            1 => Self::mono(sample_rate, samples.to_vec()),
            2 => {
                if samples.len() % 2 != 0 {
                    return Err(SpatialError::ChannelLengthMismatch {
                        left: samples.len() / 2 + 1,
                        right: samples.len() / 2,
                    });
                }
                let (left, right): (Vec<f32>, Vec<f32>) =
                    samples.chunks_exact(2).map(|f| (f[0], f[1])).unzip();
                Self::stereo(sample_rate, left, right)
            }
            n => Err(SpatialError::UnsupportedChannelCount(n)),
        }
    }

    /// Decodes a mono or stereo WAV file.
    pub fn from_wav(path: impl AsRef<Path>) -> Result<Self> {
        let decoded = wav::read_wav(path.as_ref())?;
        Self::from_interleaved(decoded.sample_rate, decoded.channels, &decoded.samples)
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn len(&self) -> usize {
        match &self.inner.channels {
            Channels::Mono(s) => s.len(),
            Channels::Stereo(l, _) => l.len(),
        }
    }

    /// Returns `true` if the track holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for a two-channel track.
    pub fn is_stereo(&self) -> bool {
        matches!(self.inner.channels, Channels::Stereo(..))
    }

    /// The underlying channel layout.
    pub fn channels(&self) -> &Channels {
        &self.inner.channels
    }

    /// Channel 0.
    pub fn left(&self) -> &[f32] {
        match &self.inner.channels {
            Channels::Mono(s) => s,
            Channels::Stereo(l, _) => l,
        }
    }

    /// Channel 1, or channel 0 for a mono track.
    pub fn right(&self) -> &[f32] {
        match &self.inner.channels {
            Channels::Mono(s) => s,
            Channels::Stereo(_, r) => r,
        }
    }

    /// The channel average for stereo tracks, or the samples themselves for mono.
    pub fn downmix(&self) -> Cow<'_, [f32]> {
        match &self.inner.channels {
            Channels::Mono(s) => Cow::Borrowed(s),
            Channels::Stereo(l, r) => {
                Cow::Owned(l.iter().zip(r).map(|(a, b)| (a + b) * 0.5).collect())
            }
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate() as f64
    }

    /// Returns `true` if both handles share the same buffer.
    pub fn ptr_eq(&self, other: &Track) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
