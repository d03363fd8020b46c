//! Interaural-delay localization for the basic point speaker.
//!
//! Two ears sit at `(-d, 0)` and `(+d, 0)`. Each ear hears the source after
//! a propagation delay proportional to its distance from the speaker; that
//! delay becomes leading silence on the ear's channel. The earlier ear is
//! then padded at the tail so both channels end together.
//!
//! ## Delay timebase
//!
//! With the default [`DelayTimebase::Stylized`](crate::config::DelayTimebase)
//! the delay in seconds is multiplied by 1000, not by the sample rate, which
//! exaggerates panning at demo scale. Switch the timebase to `SampleRate`
//! for delays consistent with the recording.

use std::sync::Arc;

use crate::config::RenderConfig;
use crate::error::{Result, SpatialError};
use crate::point::Point2D;
use crate::signal::StereoBuffer;
use crate::track::Track;

/// Largest frame count a rendered channel may hold.
pub const MAX_RENDER_FRAMES: usize = isize::MAX as usize / std::mem::size_of::<f32>();

/// Leading silence, in samples, applied to each ear's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterauralDelays {
    /// Lead-in for the left channel.
    pub left: usize,
    /// Lead-in for the right channel.
    pub right: usize,
}

impl InterauralDelays {
    /// Computes the per-ear delays for a source at `point`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::DelayOutOfRange`] if either delay would exceed
    /// [`MAX_RENDER_FRAMES`].
    pub fn for_point(point: &Point2D, config: &RenderConfig, sample_rate: u32) -> Result<Self> {
        let (left_ear, right_ear) = ear_positions(config);
        let rate = config.delay_timebase.samples_per_second(sample_rate);
        let to_samples = |distance: f64| -> Result<usize> {
            let samples = (distance / config.speed_of_sound) * rate;
            if !samples.is_finite() || samples >= MAX_RENDER_FRAMES as f64 {
                return Err(SpatialError::DelayOutOfRange {
                    x: point.x,
                    y: point.y,
                });
            }
            Ok(samples as usize)
        };
        Ok(Self {
            left: to_samples(point.distance_to(&left_ear))?,
            right: to_samples(point.distance_to(&right_ear))?,
        })
    }

    /// The longer of the two delays; every rendered channel ends this many
    /// samples after the source does.
    pub fn max(&self) -> usize {
        self.left.max(self.right)
    }
}

/// Positions of the left and right ears.
pub fn ear_positions(config: &RenderConfig) -> (Point2D, Point2D) {
    let d = config.ear_separation;
    (Point2D { x: -d, y: 0.0 }, Point2D { x: d, y: 0.0 })
}

/// Renders `track` as heard from `point` using interaural delays only.
///
/// # Errors
///
/// Returns [`SpatialError::DelayOutOfRange`] if the padded render would
/// exceed [`MAX_RENDER_FRAMES`].
pub fn localize_delay(
    track: &Track,
    point: &Point2D,
    config: &RenderConfig,
) -> Result<StereoBuffer> {
    let delays = InterauralDelays::for_point(point, config, track.sample_rate())?;
    let total = track
        .len()
        .checked_add(delays.max())
        .filter(|&total| total <= MAX_RENDER_FRAMES)
        .ok_or(SpatialError::DelayOutOfRange {
            x: point.x,
            y: point.y,
        })?;

    let left = delayed_channel(track.left(), delays.left, total);
    let right = delayed_channel(track.right(), delays.right, total);

    tracing::debug!(
        x = point.x,
        y = point.y,
        left_delay = delays.left,
        right_delay = delays.right,
        frames = total,
        "Localized by interaural delay"
    );

    Ok(StereoBuffer::from_equal_channels(left, right))
}

/// Prepends `delay` zeros, then zero-fills the tail up to `total` samples.
fn delayed_channel(samples: &[f32], delay: usize, total: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(total);
    out.resize(delay, 0.0);
    out.extend_from_slice(samples);
    out.resize(total, 0.0);
    out
}

/// A point source rendered with interaural time delay.
///
/// The position and the render it produced live in one record: rotating the
/// speaker recomputes the render before the new position is committed.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use soundstage_spatial::{BasicSpeaker, Point2D, RenderConfig, Track};
///
/// let track = Track::mono(44100, vec![0.5f32; 1000]).unwrap();
/// let config = Arc::new(RenderConfig::default());
/// let speaker = BasicSpeaker::new(Point2D::new(300.0, 0.0).unwrap(), track, config).unwrap();
///
/// let rendered = speaker.render();
/// assert_eq!(rendered.left().len(), rendered.right().len());
/// ```
#[derive(Debug, Clone)]
pub struct BasicSpeaker {
    point: Point2D,
    track: Track,
    config: Arc<RenderConfig>,
    rendered: StereoBuffer,
}

impl BasicSpeaker {
    /// Creates a speaker at `point` playing `track` and renders it.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is not finite or the configuration is invalid.
    pub fn new(point: Point2D, track: Track, config: Arc<RenderConfig>) -> Result<Self> {
        point.validate()?;
        config.validate()?;
        let rendered = localize_delay(&track, &point, &config)?;
        Ok(Self {
            point,
            track,
            config,
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

    /// Sample rate of the rendered signal.
    pub fn sample_rate(&self) -> u32 {
        self.track.sample_rate()
    }

    /// Recomputes the render from the current position without touching the cache.
    pub fn localize(&self) -> Result<(u32, StereoBuffer)> {
        let rendered = localize_delay(&self.track, &self.point, &self.config)?;
        Ok((self.sample_rate(), rendered))
    }

    /// The cached render for the current position.
    pub fn render(&self) -> &StereoBuffer {
        &self.rendered
    }

    /// Rotates the speaker counter-clockwise about the listener and re-renders.
    pub fn rotate(&mut self, theta_degrees: f64) -> Result<()> {
        let point = self.point.rotated(theta_degrees);
        point.validate()?;
        self.rendered = localize_delay(&self.track, &point, &self.config)?;
        self.point = point;
        Ok(())
    }
}
