//! Scene composition: a room full of speakers mixed to one stereo signal.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binaural::ear_positions;
use crate::config::RenderConfig;
use crate::error::{Result, SpatialError};
use crate::point::Point2D;
use crate::signal::StereoBuffer;
use crate::speaker::{Speaker, SpeakerKind};

/// How speaker renders are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixMode {
    /// Sum all renders sample-aligned from time zero; they play together.
    #[default]
    Overlay,
    /// Concatenate renders in stage order; they play one after another.
    Append,
}

impl FromStr for MixMode {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overlay" => Ok(Self::Overlay),
            "append" => Ok(Self::Append),
            other => Err(SpatialError::InvalidConfig(format!(
                "unknown mix mode '{}': expected overlay or append",
                other
            ))),
        }
    }
}

/// The mixed output of a stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Mixdown {
    /// Sample rate shared by every mixed speaker.
    pub sample_rate: u32,
    /// The stereo mix.
    pub signal: StereoBuffer,
}

impl Mixdown {
    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.signal.len() as f64 / self.sample_rate as f64
    }
}

/// One plotted position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMarker {
    /// Index of the owning speaker on the stage.
    pub speaker: usize,
    /// Marker style selector.
    pub kind: SpeakerKind,
    /// Position relative to the listener.
    pub point: Point2D,
}

/// Everything a plotting front end needs to draw the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageLayout {
    /// Room width.
    pub width: f64,
    /// Room height.
    pub height: f64,
    /// Left and right ear positions.
    pub ears: [Point2D; 2],
    /// Speaker positions; ambisonic speakers contribute one marker per virtual speaker.
    pub markers: Vec<LayoutMarker>,
}

/// A listener-centred room holding an ordered list of speakers.
///
/// Order matters only for [`MixMode::Append`].
#[derive(Debug, Clone)]
pub struct Soundstage {
    size: (f64, f64),
    speakers: Vec<Speaker>,
}

impl Soundstage {
    /// Creates an empty stage of `size = (width, height)`.
    pub fn new(size: (f64, f64)) -> Self {
        Self {
            size,
            speakers: Vec::new(),
        }
    }

    /// Creates a stage with an initial speaker list.
    pub fn with_speakers(size: (f64, f64), speakers: Vec<Speaker>) -> Self {
        Self { size, speakers }
    }

    /// Room size used for display and ambisonic layout.
    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    /// Speakers in stage order.
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// Number of speakers.
    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    /// Returns `true` if the stage has no speakers.
    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Appends a speaker.
    pub fn add(&mut self, speaker: impl Into<Speaker>) {
        self.speakers.push(speaker.into());
    }

    /// Appends several speakers in order.
    pub fn add_all(&mut self, speakers: impl IntoIterator<Item = Speaker>) {
        self.speakers.extend(speakers);
    }

    /// Rotates every speaker, ambisonic arrays included, about the listener.
    ///
    /// Either every speaker moves or none does.
    pub fn rotate(&mut self, theta_degrees: f64) -> Result<()> {
        let mut rotated = self.speakers.clone();
        for speaker in &mut rotated {
            speaker.rotate(theta_degrees)?;
        }
        self.speakers = rotated;
        tracing::debug!(theta = theta_degrees, speakers = self.len(), "Rotated stage");
        Ok(())
    }

    /// Mixes every speaker's render.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyStage`] if there is nothing to mix and
    /// [`SpatialError::SampleRateMismatch`] if speakers disagree on sample rate.
    pub fn mix(&self, mode: MixMode) -> Result<Mixdown> {
        let first = self.speakers.first().ok_or(SpatialError::EmptyStage)?;
        let sample_rate = first.sample_rate();

        let mut signal = first.render().clone();
        for speaker in &self.speakers[1..] {
            if speaker.sample_rate() != sample_rate {
                return Err(SpatialError::SampleRateMismatch {
                    expected: sample_rate,
                    got: speaker.sample_rate(),
                });
            }
            match mode {
                MixMode::Overlay => signal.overlay(speaker.render()),
                MixMode::Append => signal.append(speaker.render()),
            }
        }

        tracing::info!(
            mode = ?mode,
            speakers = self.len(),
            frames = signal.len(),
            sample_rate,
            "Mixed soundstage"
        );
        Ok(Mixdown {
            sample_rate,
            signal,
        })
    }

    /// Positions of the room, ears and speakers for plotting.
    pub fn layout(&self, config: &RenderConfig) -> StageLayout {
        let (left, right) = ear_positions(config);
        let markers = self
            .speakers
            .iter()
            .enumerate()
            .flat_map(|(index, speaker)| {
                let kind = speaker.kind();
                speaker.points().into_iter().map(move |point| LayoutMarker {
                    speaker: index,
                    kind,
                    point,
                })
            })
            .collect();
        StageLayout {
            width: self.size.0,
            height: self.size.1,
            ears: [left, right],
            markers,
        }
    }
}
