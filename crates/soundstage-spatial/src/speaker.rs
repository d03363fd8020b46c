//! The speaker capability shared by every localization model.

use serde::{Deserialize, Serialize};

use crate::ambisonics::AmbisonicSpeaker;
use crate::binaural::BasicSpeaker;
use crate::error::Result;
use crate::hrtf::HrtfSpeaker;
use crate::point::Point2D;
use crate::signal::StereoBuffer;

/// Which localization model a speaker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerKind {
    /// Interaural delay.
    Basic,
    /// HRIR convolution.
    Hrtf,
    /// First-order ambisonics over a virtual quad array.
    Ambisonic,
}

impl SpeakerKind {
    /// Lowercase name used in scene files and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Hrtf => "hrtf",
            Self::Ambisonic => "ambisonic",
        }
    }
}

impl std::fmt::Display for SpeakerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A rendered source on the stage.
#[derive(Debug, Clone)]
pub enum Speaker {
    /// Interaural-delay point source.
    Basic(BasicSpeaker),
    /// HRIR-convolved point source.
    Hrtf(HrtfSpeaker),
    /// Ambisonic source spread over four virtual speakers.
    Ambisonic(AmbisonicSpeaker),
}

impl Speaker {
    /// The localization model.
    pub fn kind(&self) -> SpeakerKind {
        match self {
            Self::Basic(_) => SpeakerKind::Basic,
            Self::Hrtf(_) => SpeakerKind::Hrtf,
            Self::Ambisonic(_) => SpeakerKind::Ambisonic,
        }
    }

    /// The cached stereo render for the current position.
    pub fn render(&self) -> &StereoBuffer {
        match self {
            Self::Basic(s) => s.render(),
            Self::Hrtf(s) => s.render(),
            Self::Ambisonic(s) => s.render(),
        }
    }

    /// Sample rate of the render.
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Basic(s) => s.sample_rate(),
            Self::Hrtf(s) => s.sample_rate(),
            Self::Ambisonic(s) => s.sample_rate(),
        }
    }

    /// Rotates counter-clockwise about the listener and re-renders.
    pub fn rotate(&mut self, theta_degrees: f64) -> Result<()> {
        match self {
            Self::Basic(s) => s.rotate(theta_degrees),
            Self::Hrtf(s) => s.rotate(theta_degrees),
            Self::Ambisonic(s) => s.rotate(theta_degrees),
        }
    }

    /// Positions the speaker occupies: one for point sources, four for ambisonics.
    pub fn points(&self) -> Vec<Point2D> {
        match self {
            Self::Basic(s) => vec![s.point()],
            Self::Hrtf(s) => vec![s.point()],
            Self::Ambisonic(s) => s.points(),
        }
    }
}

impl From<BasicSpeaker> for Speaker {
    fn from(speaker: BasicSpeaker) -> Self {
        Self::Basic(speaker)
    }
}

impl From<HrtfSpeaker> for Speaker {
    fn from(speaker: HrtfSpeaker) -> Self {
        Self::Hrtf(speaker)
    }
}

impl From<AmbisonicSpeaker> for Speaker {
    fn from(speaker: AmbisonicSpeaker) -> Self {
        Self::Ambisonic(speaker)
    }
}
