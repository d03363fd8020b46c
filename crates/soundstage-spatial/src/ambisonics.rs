//! First-order ambisonic encoding and quad decoding.
//!
//! A source is encoded into B-format at a target direction:
//! - W = S / √2 (omnidirectional)
//! - X = S · cos(θ) · cos(φ) (front-back)
//! - Y = S · sin(θ) · cos(φ) (left-right)
//! - Z = S · sin(φ) (up-down, unused by the planar decode)
//!
//! The field is then decoded into four virtual feeds at the corners of the
//! room, each rendered by its own point speaker:
//! - LF = (2W + X + Y) · √8 / k
//! - LB = (2W − X + Y) · √8 / k
//! - RF = (2W + X − Y) · √8 / k
//! - RB = (2W − X − Y) · √8 / k
//!
//! with `k = DECODE_NORMALIZATION`, an empirical constant that keeps the
//! summed virtual renders from clipping.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::binaural::BasicSpeaker;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::hrtf::{HrirDataset, HrirSource, HrtfSpeaker};
use crate::point::Point2D;
use crate::signal::StereoBuffer;
use crate::speaker::Speaker;
use crate::track::{Channels, Track};

/// Divisor applied to every decoded feed.
pub const DECODE_NORMALIZATION: f64 = 10.0;

/// Default encode azimuth in degrees.
pub const DEFAULT_THETA: f64 = 60.0;

/// Default encode elevation in degrees.
pub const DEFAULT_PHI: f64 = 30.0;

/// First-order B-format channels for one input channel.
#[derive(Debug, Clone, PartialEq)]
pub struct BFormat {
    /// Omnidirectional component.
    pub w: Vec<f32>,
    /// Front-back component.
    pub x: Vec<f32>,
    /// Left-right component.
    pub y: Vec<f32>,
    /// Up-down component.
    pub z: Vec<f32>,
}

/// Encodes `samples` at azimuth `theta` and elevation `phi` (degrees).
pub fn encode_first_order(samples: &[f32], theta: f64, phi: f64) -> BFormat {
    let theta = theta.to_radians();
    let phi = phi.to_radians();
    let gains = [
        std::f64::consts::FRAC_1_SQRT_2,
        theta.cos() * phi.cos(),
        theta.sin() * phi.cos(),
        phi.sin(),
    ];
    let scaled = |g: f64| -> Vec<f32> {
        samples.iter().map(|&s| (s as f64 * g) as f32).collect()
    };
    BFormat {
        w: scaled(gains[0]),
        x: scaled(gains[1]),
        y: scaled(gains[2]),
        z: scaled(gains[3]),
    }
}

/// The four virtual speaker positions of the planar decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    /// Left front.
    LeftFront,
    /// Left back.
    LeftBack,
    /// Right front.
    RightFront,
    /// Right back.
    RightBack,
}

impl Corner {
    /// Decode order: LF, LB, RF, RB.
    pub const ALL: [Corner; 4] = [
        Corner::LeftFront,
        Corner::LeftBack,
        Corner::RightFront,
        Corner::RightBack,
    ];

    /// Signs applied to X and Y in this corner's decode.
    fn signs(&self) -> (f64, f64) {
        match self {
            Self::LeftFront => (1.0, 1.0),
            Self::LeftBack => (-1.0, 1.0),
            Self::RightFront => (1.0, -1.0),
            Self::RightBack => (-1.0, -1.0),
        }
    }

    /// Corner position for a room of `size = (width, height)` centred on the listener.
    pub fn position(&self, size: (f64, f64)) -> Point2D {
        let (hw, hh) = (size.0 / 2.0, size.1 / 2.0);
        match self {
            Self::LeftFront => Point2D { x: -hw, y: hh },
            Self::LeftBack => Point2D { x: -hw, y: -hh },
            Self::RightFront => Point2D { x: hw, y: hh },
            Self::RightBack => Point2D { x: hw, y: -hh },
        }
    }

    /// Decodes this corner's feed from a B-format field.
    pub fn decode(&self, field: &BFormat) -> Vec<f32> {
        let (sx, sy) = self.signs();
        let norm = 8f64.sqrt() / DECODE_NORMALIZATION;
        field
            .w
            .iter()
            .zip(&field.x)
            .zip(&field.y)
            .map(|((&w, &x), &y)| {
                ((2.0 * w as f64 + sx * x as f64 + sy * y as f64) * norm) as f32
            })
            .collect()
    }
}

/// How each virtual feed is rendered.
#[derive(Debug, Clone, Default)]
pub enum VirtualRenderer {
    /// Interaural delay ([`BasicSpeaker`]).
    #[default]
    Delay,
    /// HRIR convolution ([`HrtfSpeaker`]) with the given source.
    Hrtf(Arc<dyn HrirSource>),
}

impl VirtualRenderer {
    /// HRIR convolution against the dataset named in `config`.
    pub fn hrtf_from(config: &RenderConfig) -> Self {
        Self::Hrtf(Arc::new(HrirDataset::new(&config.dataset_root)))
    }
}

/// Encodes `track` at (`theta`, `phi`) and decodes it into four speakers
/// placed at the corners of a `size` room, in [`Corner::ALL`] order.
///
/// Stereo tracks are encoded channel by channel, so the virtual feeds keep
/// the source's channel layout.
pub fn render_virtual_array(
    track: &Track,
    theta: f64,
    phi: f64,
    size: (f64, f64),
    renderer: &VirtualRenderer,
    config: &Arc<RenderConfig>,
) -> Result<Vec<Speaker>> {
    let fields: Vec<BFormat> = match track.channels() {
        Channels::Mono(s) => vec![encode_first_order(s, theta, phi)],
        Channels::Stereo(l, r) => vec![
            encode_first_order(l, theta, phi),
            encode_first_order(r, theta, phi),
        ],
    };

    Corner::ALL
        .iter()
        .map(|corner| -> Result<Speaker> {
            let channels = match fields.as_slice() {
                [mono] => Channels::Mono(corner.decode(mono)),
                [left, right, ..] => Channels::Stereo(corner.decode(left), corner.decode(right)),
                [] => Channels::Mono(Vec::new()),
            };
            let feed = Track::new(track.sample_rate(), channels)?;
            let point = corner.position(size);
            let speaker = match renderer {
                VirtualRenderer::Delay => {
                    Speaker::Basic(BasicSpeaker::new(point, feed, Arc::clone(config))?)
                }
                VirtualRenderer::Hrtf(source) => {
                    Speaker::Hrtf(HrtfSpeaker::with_source(point, feed, Arc::clone(source))?)
                }
            };
            Ok(speaker)
        })
        .collect()
}

/// Overlays the renders of `speakers`, sample-aligned from frame zero.
fn overlay_all(speakers: &[Speaker]) -> StereoBuffer {
    let mut mixed = StereoBuffer::default();
    for speaker in speakers {
        mixed.overlay(speaker.render());
    }
    mixed
}

/// A source spread over a virtual quad array through first-order ambisonics.
#[derive(Debug, Clone)]
pub struct AmbisonicSpeaker {
    theta: f64,
    phi: f64,
    size: (f64, f64),
    sample_rate: u32,
    speakers: Vec<Speaker>,
    mixed: StereoBuffer,
}

impl AmbisonicSpeaker {
    /// Encodes `track` at (`theta`, `phi`) and renders the four virtual speakers.
    pub fn new(
        track: &Track,
        size: (f64, f64),
        theta: f64,
        phi: f64,
        renderer: VirtualRenderer,
        config: Arc<RenderConfig>,
    ) -> Result<Self> {
        config.validate()?;
        let speakers = render_virtual_array(track, theta, phi, size, &renderer, &config)?;
        let mixed = overlay_all(&speakers);
        tracing::debug!(theta, phi, frames = mixed.len(), "Rendered ambisonic array");
        Ok(Self {
            theta,
            phi,
            size,
            sample_rate: track.sample_rate(),
            speakers,
            mixed,
        })
    }

    /// Encode azimuth in degrees.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Encode elevation in degrees.
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Room size the virtual array was laid out in.
    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    /// Sample rate of the rendered signal.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The four virtual speakers, in [`Corner::ALL`] order.
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// Current positions of the virtual speakers.
    pub fn points(&self) -> Vec<Point2D> {
        self.speakers.iter().flat_map(|s| s.points()).collect()
    }

    /// Re-mixes the four virtual renders without touching the cache.
    pub fn get_audio(&self) -> StereoBuffer {
        overlay_all(&self.speakers)
    }

    /// The cached mix of the four virtual renders.
    pub fn render(&self) -> &StereoBuffer {
        &self.mixed
    }

    /// Rotates every virtual speaker about the listener.
    ///
    /// The array turns rigidly; the field is not re-encoded. If any speaker
    /// fails to re-render, none of them move.
    pub fn rotate(&mut self, theta_degrees: f64) -> Result<()> {
        let mut rotated = self.speakers.clone();
        for speaker in &mut rotated {
            speaker.rotate(theta_degrees)?;
        }
        self.mixed = overlay_all(&rotated);
        self.speakers = rotated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hrtf::tests::SyntheticHrir;
    use crate::speaker::SpeakerKind;

    const ROOM: (f64, f64) = (1000.0, 1000.0);

    fn sine(len: usize) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.05).sin() * 0.5).collect()
    }

    #[test]
    fn test_encode_front_source() {
        let field = encode_first_order(&[1.0; 4], 0.0, 0.0);
        assert!((field.w[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((field.x[0] - 1.0).abs() < 1e-6);
        assert!(field.y[0].abs() < 1e-6);
        assert!(field.z[0].abs() < 1e-6);
    }

    #[test]
    fn test_encode_elevated_source() {
        let field = encode_first_order(&[1.0], 0.0, 90.0);
        assert!((field.z[0] - 1.0).abs() < 1e-6);
        assert!(field.x[0].abs() < 1e-6);
    }

    #[test]
    fn test_decode_sum_reconstructs_omni() {
        // ΣLF..RB = 8W·√8/k, and with W = S/√2 that is 16·S/k.
        let samples = sine(64);
        let field = encode_first_order(&samples, 60.0, 30.0);
        let feeds: Vec<Vec<f32>> = Corner::ALL.iter().map(|c| c.decode(&field)).collect();
        for (i, &s) in samples.iter().enumerate() {
            let sum: f32 = feeds.iter().map(|f| f[i]).sum();
            let expected = 16.0 * s / DECODE_NORMALIZATION as f32;
            assert!((sum - expected).abs() < 1e-5, "frame {}: {} vs {}", i, sum, expected);
        }
    }

    #[test]
    fn test_decode_differences_recover_directional_terms() {
        let samples = sine(32);
        let field = encode_first_order(&samples, 60.0, 30.0);
        let [lf, lb, rf, rb]: [Vec<f32>; 4] = Corner::ALL.map(|c| c.decode(&field));
        let norm = (8f64.sqrt() / DECODE_NORMALIZATION) as f32;
        for i in 0..samples.len() {
            let front_back = (lf[i] + rf[i]) - (lb[i] + rb[i]);
            let left_right = (lf[i] + lb[i]) - (rf[i] + rb[i]);
            assert!((front_back - 4.0 * field.x[i] * norm).abs() < 1e-5);
            assert!((left_right - 4.0 * field.y[i] * norm).abs() < 1e-5);
        }
    }

    #[test]
    fn test_corner_positions() {
        assert_eq!(
            Corner::LeftFront.position((800.0, 600.0)),
            Point2D { x: -400.0, y: 300.0 }
        );
        assert_eq!(
            Corner::RightBack.position((800.0, 600.0)),
            Point2D { x: 400.0, y: -300.0 }
        );
    }

    #[test]
    fn test_virtual_array_layout() {
        let track = Track::mono(44100, sine(200)).unwrap();
        let config = Arc::new(RenderConfig::default());
        let speakers =
            render_virtual_array(&track, 60.0, 30.0, ROOM, &VirtualRenderer::Delay, &config)
                .unwrap();
        assert_eq!(speakers.len(), 4);
        for (speaker, corner) in speakers.iter().zip(Corner::ALL) {
            assert_eq!(speaker.kind(), SpeakerKind::Basic);
            assert_eq!(speaker.points(), vec![corner.position(ROOM)]);
        }
    }

    #[test]
    fn test_stereo_source_keeps_layout() {
        let track = Track::stereo(44100, sine(50), vec![0.0; 50]).unwrap();
        let config = Arc::new(RenderConfig::default());
        let speakers =
            render_virtual_array(&track, 0.0, 0.0, ROOM, &VirtualRenderer::Delay, &config)
                .unwrap();
        match &speakers[0] {
            Speaker::Basic(b) => assert!(b.track().is_stereo()),
            other => panic!("expected basic speaker, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_mix_is_overlay_of_virtual_speakers() {
        let track = Track::mono(44100, sine(300)).unwrap();
        let ambi = AmbisonicSpeaker::new(
            &track,
            ROOM,
            DEFAULT_THETA,
            DEFAULT_PHI,
            VirtualRenderer::Delay,
            Arc::new(RenderConfig::default()),
        )
        .unwrap();
        let longest = ambi.speakers().iter().map(|s| s.render().len()).max().unwrap();
        assert_eq!(ambi.render().len(), longest);
        assert_eq!(ambi.render(), &ambi.get_audio());
    }

    #[test]
    fn test_rotate_moves_array_rigidly() {
        let track = Track::mono(44100, sine(100)).unwrap();
        let mut ambi = AmbisonicSpeaker::new(
            &track,
            ROOM,
            45.0,
            0.0,
            VirtualRenderer::Delay,
            Arc::new(RenderConfig::default()),
        )
        .unwrap();
        let before = ambi.points();
        ambi.rotate(90.0).unwrap();
        let after = ambi.points();
        for (b, a) in before.iter().zip(&after) {
            let expected = b.rotated(90.0);
            assert!((a.x - expected.x).abs() < 1e-9 && (a.y - expected.y).abs() < 1e-9);
        }
        // Re-encoding is not part of rotation.
        assert_eq!(ambi.theta(), 45.0);
        assert_eq!(ambi.render(), &ambi.get_audio());
    }

    #[test]
    fn test_hrtf_virtual_speakers() {
        let track = Track::mono(44100, sine(40)).unwrap();
        let ambi = AmbisonicSpeaker::new(
            &track,
            ROOM,
            60.0,
            30.0,
            VirtualRenderer::Hrtf(Arc::new(SyntheticHrir::default())),
            Arc::new(RenderConfig::default()),
        )
        .unwrap();
        assert!(ambi
            .speakers()
            .iter()
            .all(|s| s.kind() == SpeakerKind::Hrtf));
        assert_eq!(ambi.render().len(), 40 + 4 - 1);
    }
}
