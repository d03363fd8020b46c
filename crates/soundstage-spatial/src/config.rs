//! Rendering configuration shared by every speaker on a stage.
//!
//! The defaults reproduce the stylized reference model: a speed of sound of
//! 340 units/s, ears 10 units either side of the head centre (far wider than
//! a real head, so that direction is obvious at demo scale), and delays
//! expressed in a fixed 1 kHz timebase.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};

/// Default speed of sound in distance units per second.
pub const DEFAULT_SPEED_OF_SOUND: f64 = 340.0;

/// Default distance from the head centre to each ear.
pub const DEFAULT_EAR_SEPARATION: f64 = 10.0;

/// Default location of the HRIR measurement set.
pub const DEFAULT_DATASET_ROOT: &str = "hrtf";

/// How a propagation delay in seconds becomes a count of leading silent samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayTimebase {
    /// Seconds × 1000, independent of the track's sample rate.
    ///
    /// At 44.1 kHz this makes every delay roughly 44× shorter than physical
    /// propagation would be. It is the reference behaviour and the default;
    /// anyone tuning for true-to-physics delays should switch to
    /// [`DelayTimebase::SampleRate`].
    #[default]
    Stylized,
    /// Seconds × the track's sample rate.
    SampleRate,
}

impl DelayTimebase {
    /// Samples per second used to convert a delay for a track at `sample_rate`.
    pub fn samples_per_second(&self, sample_rate: u32) -> f64 {
        match self {
            Self::Stylized => 1000.0,
            Self::SampleRate => sample_rate as f64,
        }
    }
}

/// Global constants threaded through every speaker at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Propagation speed in distance units per second.
    pub speed_of_sound: f64,
    /// Distance from the head centre to each ear along the x axis.
    pub ear_separation: f64,
    /// Root directory of the `elev{E}/H0e{DDD}a.wav` HRIR dataset.
    pub dataset_root: PathBuf,
    /// Delay-to-samples conversion.
    pub delay_timebase: DelayTimebase,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            speed_of_sound: DEFAULT_SPEED_OF_SOUND,
            ear_separation: DEFAULT_EAR_SEPARATION,
            dataset_root: PathBuf::from(DEFAULT_DATASET_ROOT),
            delay_timebase: DelayTimebase::default(),
        }
    }
}

impl RenderConfig {
    /// Sets the HRIR dataset root.
    pub fn with_dataset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dataset_root = root.into();
        self
    }

    /// Sets the ear separation.
    pub fn with_ear_separation(mut self, ear_separation: f64) -> Self {
        self.ear_separation = ear_separation;
        self
    }

    /// Sets the delay timebase.
    pub fn with_delay_timebase(mut self, timebase: DelayTimebase) -> Self {
        self.delay_timebase = timebase;
        self
    }

    /// Validates the numeric parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidConfig`] if the speed of sound is not a
    /// positive finite number or the ear separation is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.speed_of_sound.is_finite() || self.speed_of_sound <= 0.0 {
            return Err(SpatialError::InvalidConfig(format!(
                "speed_of_sound must be positive, got {}",
                self.speed_of_sound
            )));
        }
        if !self.ear_separation.is_finite() || self.ear_separation < 0.0 {
            return Err(SpatialError::InvalidConfig(format!(
                "ear_separation must be non-negative, got {}",
                self.ear_separation
            )));
        }
        Ok(())
    }
}
