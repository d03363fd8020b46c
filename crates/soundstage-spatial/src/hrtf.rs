//! HRTF localization by convolution with measured impulse responses.
//!
//! Directions are looked up in a symmetric measurement set laid out as
//! `elev{E}/H0e{DDD}a.wav`: `E` is the elevation rounded to a multiple of
//! 10, `DDD` the azimuth magnitude rounded to a multiple of 5 and zero
//! padded to three digits. Each file is a stereo recording holding the
//! left-ear and right-ear responses. Sources left of centre reuse the
//! right-hand measurement with its channels swapped.
//!
//! Rounding matches the tie-to-even behaviour the dataset keys were
//! generated with, so `2.5°` resolves to `0°` and `7.5°` to `10°`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RenderConfig;
use crate::convolve::convolve;
use crate::error::{Result, SpatialError};
use crate::point::Point2D;
use crate::signal::StereoBuffer;
use crate::track::Track;
use crate::wav;

/// Azimuth resolution of the dataset in degrees.
pub const AZIMUTH_STEP: f64 = 5.0;

/// Elevation resolution of the dataset in degrees.
pub const ELEVATION_STEP: f64 = 10.0;

/// Impulse responses are divided by `peak × HEADROOM_FACTOR` before convolution.
pub const HEADROOM_FACTOR: f32 = 5.0;

/// Rounds `value` to the nearest multiple of `step`, ties to even.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    step * (value / step).round_ties_even()
}

/// Dataset coordinates for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HrirKey {
    /// Azimuth magnitude, a multiple of [`AZIMUTH_STEP`].
    pub degree: u32,
    /// Elevation, a multiple of [`ELEVATION_STEP`].
    pub elevation: i32,
    /// Swap left/right channels (source left of centre).
    pub flip: bool,
}

impl HrirKey {
    /// Resolves the key for an azimuth and elevation in degrees.
    ///
    /// Azimuth follows [`Point2D::azimuth_degrees`]: negative is left.
    pub fn for_direction(azimuth: f64, elevation: f64) -> Self {
        let rounded = round_to_step(azimuth, AZIMUTH_STEP);
        Self {
            degree: rounded.abs() as u32,
            elevation: round_to_step(elevation, ELEVATION_STEP) as i32,
            flip: rounded < 0.0,
        }
    }

    /// Resolves the key for a speaker position.
    pub fn for_point(point: &Point2D, elevation: f64) -> Self {
        Self::for_direction(point.azimuth_degrees(), elevation)
    }

    /// Path of the measurement relative to the dataset root.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("elev{}", self.elevation))
            .join(format!("H0e{:03}a.wav", self.degree))
    }
}

/// A left/right impulse-response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulsePair {
    /// Sample rate of the measurement.
    pub sample_rate: u32,
    /// Left-ear response.
    pub left: Vec<f32>,
    /// Right-ear response.
    pub right: Vec<f32>,
}

impl ImpulsePair {
    /// Largest absolute value across both ears.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Scales both ears by `1 / (peak × HEADROOM_FACTOR)`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::SilentImpulse`] if the pair is empty or all zero.
    pub fn normalized(mut self, label: &str) -> Result<Self> {
        let peak = self.peak();
        if self.left.is_empty() || peak == 0.0 || !peak.is_finite() {
            return Err(SpatialError::SilentImpulse(label.to_string()));
        }
        let scale = 1.0 / (peak * HEADROOM_FACTOR);
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= scale;
        }
        Ok(self)
    }

    /// Exchanges the left and right responses.
    pub fn swapped(self) -> Self {
        Self {
            sample_rate: self.sample_rate,
            left: self.right,
            right: self.left,
        }
    }
}

/// Supplies raw (unnormalized, unswapped) impulse responses by key.
pub trait HrirSource: std::fmt::Debug + Send + Sync {
    /// Fetches the measurement for `key`.
    fn impulse(&self, key: &HrirKey) -> Result<ImpulsePair>;

    /// Human-readable location of `key`, used in logs and errors.
    fn describe(&self, key: &HrirKey) -> String {
        key.relative_path().display().to_string()
    }
}

/// An HRIR dataset stored on disk.
#[derive(Debug, Clone)]
pub struct HrirDataset {
    root: PathBuf,
}

impl HrirDataset {
    /// Opens a dataset rooted at `root`. Files are read lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Dataset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of the measurement for `key`.
    pub fn path_for(&self, key: &HrirKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

impl HrirSource for HrirDataset {
    fn impulse(&self, key: &HrirKey) -> Result<ImpulsePair> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(SpatialError::HrirNotFound { path });
        }
        let decoded = wav::read_wav(&path)?;
        if decoded.channels != 2 {
            return Err(SpatialError::UnsupportedChannelCount(decoded.channels));
        }
        let (left, right): (Vec<f32>, Vec<f32>) = decoded
            .samples
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        Ok(ImpulsePair {
            sample_rate: decoded.sample_rate,
            left,
            right,
        })
    }

    fn describe(&self, key: &HrirKey) -> String {
        self.path_for(key).display().to_string()
    }
}

/// Loads, normalizes and orients the impulse pair for a direction.
pub fn resolve_impulse(source: &dyn HrirSource, key: &HrirKey) -> Result<ImpulsePair> {
    let label = source.describe(key);
    let pair = source.impulse(key)?.normalized(&label)?;
    tracing::debug!(
        hrir = %label,
        degree = key.degree,
        elevation = key.elevation,
        flip = key.flip,
        taps = pair.left.len(),
        "Resolved HRIR"
    );
    Ok(if key.flip { pair.swapped() } else { pair })
}

/// Renders `track` heard from `point` by convolving its mono downmix with the
/// impulse pair for that direction.
///
/// Each output channel has `track.len() + impulse_len - 1` frames.
pub fn localize_hrtf(
    track: &Track,
    point: &Point2D,
    elevation: f64,
    source: &dyn HrirSource,
) -> Result<StereoBuffer> {
    let key = HrirKey::for_point(point, elevation);
    let impulse = resolve_impulse(source, &key)?;
    if impulse.sample_rate != track.sample_rate() {
        tracing::warn!(
            hrir_rate = impulse.sample_rate,
            track_rate = track.sample_rate(),
            "HRIR sample rate differs from track; convolving without resampling"
        );
    }

    let mono = track.downmix();
    let left = convolve(&mono, &impulse.left);
    let right = convolve(&mono, &impulse.right);
    StereoBuffer::new(left, right)
}

/// A point source rendered by HRIR convolution.
///
/// Shares the position/rotation contract of
/// [`BasicSpeaker`](crate::binaural::BasicSpeaker) but replaces the delay
/// model with a measured filter pair selected by direction.
#[derive(Debug, Clone)]
pub struct HrtfSpeaker {
    point: Point2D,
    track: Track,
    elevation: f64,
    source: Arc<dyn HrirSource>,
    rendered: StereoBuffer,
}

impl HrtfSpeaker {
    /// Creates a speaker reading impulse responses from `config.dataset_root`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidConfig`] for an invalid configuration
    /// and [`SpatialError::HrirNotFound`] if the dataset has no file for the
    /// speaker's direction.
    pub fn new(point: Point2D, track: Track, config: &RenderConfig) -> Result<Self> {
        config.validate()?;
        let source: Arc<dyn HrirSource> = Arc::new(HrirDataset::new(&config.dataset_root));
        Self::with_source(point, track, source)
    }

    /// Creates a speaker at elevation 0 with an explicit impulse-response source.
    pub fn with_source(point: Point2D, track: Track, source: Arc<dyn HrirSource>) -> Result<Self> {
        Self::with_source_at(point, track, 0.0, source)
    }

    /// Creates a speaker rendered at `elevation` degrees.
    ///
    /// Only the measurement for `elevation` is looked up.
    pub fn with_source_at(
        point: Point2D,
        track: Track,
        elevation: f64,
        source: Arc<dyn HrirSource>,
    ) -> Result<Self> {
        point.validate()?;
        let rendered = localize_hrtf(&track, &point, elevation, source.as_ref())?;
        Ok(Self {
            point,
            track,
            elevation,
            source,
            rendered,
        })
    }

    /// Current position.
    pub fn point(&self) -> Point2D {
        self.point
    }

    /// The source track.
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Elevation used for dataset lookup, in degrees.
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Sample rate of the rendered signal.
    pub fn sample_rate(&self) -> u32 {
        self.track.sample_rate()
    }

    /// Dataset key for the current position and elevation.
    pub fn key(&self) -> HrirKey {
        HrirKey::for_point(&self.point, self.elevation)
    }

    /// Renders the current position at `elevation` without touching the cache.
    pub fn localize(&self, elevation: f64) -> Result<(u32, StereoBuffer)> {
        let rendered = localize_hrtf(&self.track, &self.point, elevation, self.source.as_ref())?;
        Ok((self.sample_rate(), rendered))
    }

    /// The normalized, oriented impulse pair currently applied.
    ///
    /// Intended for diagnostics such as plotting the response.
    pub fn impulse_response(&self) -> Result<ImpulsePair> {
        resolve_impulse(self.source.as_ref(), &self.key())
    }

    /// The cached render for the current position.
    pub fn render(&self) -> &StereoBuffer {
        &self.rendered
    }

    /// Changes the lookup elevation and re-renders.
    pub fn set_elevation(&mut self, elevation: f64) -> Result<()> {
        self.rendered = localize_hrtf(&self.track, &self.point, elevation, self.source.as_ref())?;
        self.elevation = elevation;
        Ok(())
    }

    /// Rotates the speaker counter-clockwise about the listener and re-renders.
    ///
    /// On error the speaker keeps its previous position and render.
    pub fn rotate(&mut self, theta_degrees: f64) -> Result<()> {
        let point = self.point.rotated(theta_degrees);
        point.validate()?;
        self.rendered = localize_hrtf(&self.track, &point, self.elevation, self.source.as_ref())?;
        self.point = point;
        Ok(())
    }
}
