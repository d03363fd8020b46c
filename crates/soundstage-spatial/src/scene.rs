//! JSON scene files.
//!
//! A scene names its tracks once and places any number of speakers that
//! play them:
//!
//! ```json
//! {
//!   "size": [1000.0, 1000.0],
//!   "rotate": 15.0,
//!   "config": { "dataset_root": "hrtf" },
//!   "tracks": { "drums": "audio/drums.wav", "voice": "audio/voice.wav" },
//!   "speakers": [
//!     { "kind": "basic", "track": "drums", "point": { "x": 300.0, "y": 0.0 } },
//!     { "kind": "hrtf", "track": "voice", "point": { "x": -100.0, "y": 200.0 } },
//!     { "kind": "ambisonic", "track": "drums", "theta": 60.0, "phi": 30.0 }
//!   ]
//! }
//! ```
//!
//! Relative track paths and a relative `dataset_root` resolve against the
//! directory containing the scene file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ambisonics::{AmbisonicSpeaker, VirtualRenderer, DEFAULT_PHI, DEFAULT_THETA};
use crate::binaural::BasicSpeaker;
use crate::config::RenderConfig;
use crate::error::{Result, SpatialError};
use crate::hrtf::{HrirDataset, HrirSource, HrtfSpeaker};
use crate::point::Point2D;
use crate::speaker::Speaker;
use crate::stage::Soundstage;
use crate::track::Track;

fn default_theta() -> f64 {
    DEFAULT_THETA
}

fn default_phi() -> f64 {
    DEFAULT_PHI
}

/// How the virtual speakers of an ambisonic source are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualSpeakerKind {
    /// Interaural-delay virtual speakers.
    #[default]
    Basic,
    /// HRIR-convolved virtual speakers using the scene's dataset.
    Hrtf,
}

/// One speaker entry in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeakerDescription {
    /// An interaural-delay point source.
    Basic {
        /// Name of a declared track.
        track: String,
        /// Position relative to the listener.
        point: Point2D,
    },
    /// An HRIR-convolved point source.
    Hrtf {
        /// Name of a declared track.
        track: String,
        /// Position relative to the listener.
        point: Point2D,
        /// Dataset elevation in degrees.
        #[serde(default)]
        elevation: f64,
    },
    /// A first-order ambisonic source over a virtual quad array.
    Ambisonic {
        /// Name of a declared track.
        track: String,
        /// Encode azimuth in degrees.
        #[serde(default = "default_theta")]
        theta: f64,
        /// Encode elevation in degrees.
        #[serde(default = "default_phi")]
        phi: f64,
        /// Model used for the four virtual speakers.
        #[serde(default)]
        virtual_speakers: VirtualSpeakerKind,
        /// Room the virtual array spans; defaults to the stage size.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<(f64, f64)>,
    },
}

impl SpeakerDescription {
    /// Name of the track this speaker plays.
    pub fn track(&self) -> &str {
        match self {
            Self::Basic { track, .. } | Self::Hrtf { track, .. } | Self::Ambisonic { track, .. } => {
                track
            }
        }
    }
}

/// A complete scene as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Room `(width, height)`.
    pub size: (f64, f64),
    /// Render configuration; defaults apply to omitted fields.
    #[serde(default)]
    pub config: RenderConfig,
    /// Track name to WAV path.
    pub tracks: BTreeMap<String, PathBuf>,
    /// Speakers in stage order.
    pub speakers: Vec<SpeakerDescription>,
    /// Degrees to rotate the whole stage after building.
    #[serde(default)]
    pub rotate: f64,
}

impl SceneDescription {
    /// Parses a scene from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a scene file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// The render configuration with `dataset_root` resolved against `base_dir`.
    pub fn resolved_config(&self, base_dir: &Path) -> RenderConfig {
        let mut config = self.config.clone();
        config.dataset_root = resolve(base_dir, &config.dataset_root);
        config
    }

    /// Loads every referenced track and renders all speakers into a stage.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownTrack`] if a speaker names a track that
    /// is not declared, and any error from decoding or rendering.
    pub fn build(&self, base_dir: &Path) -> Result<Soundstage> {
        let config = Arc::new(self.resolved_config(base_dir));
        config.validate()?;

        let mut tracks: BTreeMap<&str, Track> = BTreeMap::new();
        for description in &self.speakers {
            let name = description.track();
            if tracks.contains_key(name) {
                continue;
            }
            let path = self
                .tracks
                .get(name)
                .ok_or_else(|| SpatialError::UnknownTrack(name.to_string()))?;
            tracks.insert(name, Track::from_wav(resolve(base_dir, path))?);
        }

        let dataset: Arc<dyn HrirSource> = Arc::new(HrirDataset::new(&config.dataset_root));
        let mut stage = Soundstage::new(self.size);
        for description in &self.speakers {
            let track = tracks
                .get(description.track())
                .cloned()
                .ok_or_else(|| SpatialError::UnknownTrack(description.track().to_string()))?;
            stage.add(self.build_speaker(description, track, &config, &dataset)?);
        }

        if self.rotate != 0.0 {
            stage.rotate(self.rotate)?;
        }

        tracing::info!(
            speakers = stage.len(),
            tracks = tracks.len(),
            rotate = self.rotate,
            "Built soundstage"
        );
        Ok(stage)
    }

    fn build_speaker(
        &self,
        description: &SpeakerDescription,
        track: Track,
        config: &Arc<RenderConfig>,
        dataset: &Arc<dyn HrirSource>,
    ) -> Result<Speaker> {
        let speaker = match description {
            SpeakerDescription::Basic { point, .. } => {
                BasicSpeaker::new(*point, track, Arc::clone(config))?.into()
            }
            SpeakerDescription::Hrtf {
                point, elevation, ..
            } => {
                HrtfSpeaker::with_source_at(*point, track, *elevation, Arc::clone(dataset))?.into()
            }
            SpeakerDescription::Ambisonic {
                theta,
                phi,
                virtual_speakers,
                size,
                ..
            } => {
                let renderer = match virtual_speakers {
                    VirtualSpeakerKind::Basic => VirtualRenderer::Delay,
                    VirtualSpeakerKind::Hrtf => VirtualRenderer::Hrtf(Arc::clone(dataset)),
                };
                AmbisonicSpeaker::new(
                    &track,
                    size.unwrap_or(self.size),
                    *theta,
                    *phi,
                    renderer,
                    Arc::clone(config),
                )?
                .into()
            }
        };
        Ok(speaker)
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Reads a scene file and builds its stage, resolving paths next to the file.
pub fn load(path: impl AsRef<Path>) -> Result<(SceneDescription, Soundstage)> {
    let path = path.as_ref();
    let scene = SceneDescription::from_file(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stage = scene.build(base_dir)?;
    Ok((scene, stage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speaker::SpeakerKind;
    use crate::stage::MixMode;

    fn write_mono_wav(path: &Path, samples: &[f32], sample_rate: u32) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for s in samples {
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn write_hrir(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for (l, r) in [(1.0f32, 0.5f32), (0.0, 0.25)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_parse_defaults() {
        let scene = SceneDescription::from_json(
            r#"{
                "size": [800, 600],
                "tracks": { "a": "a.wav" },
                "speakers": [
                    { "kind": "ambisonic", "track": "a" },
                    { "kind": "hrtf", "track": "a", "point": { "x": 1.0, "y": 2.0 } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scene.size, (800.0, 600.0));
        assert_eq!(scene.rotate, 0.0);
        assert_eq!(scene.config, RenderConfig::default());
        assert_eq!(
            scene.speakers[0],
            SpeakerDescription::Ambisonic {
                track: "a".into(),
                theta: 60.0,
                phi: 30.0,
                virtual_speakers: VirtualSpeakerKind::Basic,
                size: None,
            }
        );
        assert!(matches!(
            scene.speakers[1],
            SpeakerDescription::Hrtf { elevation, .. } if elevation == 0.0
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let result = SceneDescription::from_json(
            r#"{ "size": [1, 1], "tracks": {}, "speakers": [ { "kind": "laser", "track": "a" } ] }"#,
        );
        assert!(matches!(result, Err(SpatialError::SerdeJson(_))));
    }

    #[test]
    fn test_config_block_overrides() {
        let scene = SceneDescription::from_json(
            r#"{
                "size": [10, 10],
                "config": { "ear_separation": 5.0, "delay_timebase": "sample_rate" },
                "tracks": {},
                "speakers": []
            }"#,
        )
        .unwrap();
        assert_eq!(scene.config.ear_separation, 5.0);
        assert_eq!(scene.config.speed_of_sound, 340.0);
        assert_eq!(
            scene.config.delay_timebase,
            crate::config::DelayTimebase::SampleRate
        );
    }

    #[test]
    fn test_build_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(&dir.path().join("audio/tone.wav"), &[0.5; 200], 44100);
        write_hrir(&dir.path().join("sets"), "elev0/H0e000a.wav");

        let scene = SceneDescription::from_json(
            r#"{
                "size": [1000, 1000],
                "config": { "dataset_root": "sets" },
                "tracks": { "tone": "audio/tone.wav" },
                "speakers": [
                    { "kind": "basic", "track": "tone", "point": { "x": 300, "y": 0 } },
                    { "kind": "hrtf", "track": "tone", "point": { "x": 0, "y": 100 } },
                    { "kind": "ambisonic", "track": "tone" }
                ]
            }"#,
        )
        .unwrap();

        let stage = scene.build(dir.path()).unwrap();
        let kinds: Vec<SpeakerKind> = stage.speakers().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![SpeakerKind::Basic, SpeakerKind::Hrtf, SpeakerKind::Ambisonic]
        );
        assert_eq!(stage.speakers()[1].render().len(), 200 + 2 - 1);

        let mix = stage.mix(MixMode::Overlay).unwrap();
        assert_eq!(mix.sample_rate, 44100);
    }

    #[test]
    fn test_build_hrtf_at_elevation_without_elev0_file() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(&dir.path().join("tone.wav"), &[0.5; 100], 44100);
        write_hrir(&dir.path().join("hrtf"), "elev20/H0e000a.wav");

        let scene = SceneDescription::from_json(
            r#"{
                "size": [100, 100],
                "tracks": { "tone": "tone.wav" },
                "speakers": [
                    { "kind": "hrtf", "track": "tone", "point": { "x": 0, "y": 100 }, "elevation": 20 }
                ]
            }"#,
        )
        .unwrap();

        let stage = scene.build(dir.path()).unwrap();
        match &stage.speakers()[0] {
            Speaker::Hrtf(speaker) => {
                assert_eq!(speaker.elevation(), 20.0);
                assert_eq!(speaker.render().len(), 100 + 2 - 1);
            }
            other => panic!("expected hrtf speaker, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_build_unknown_track() {
        let dir = tempfile::tempdir().unwrap();
        let scene = SceneDescription::from_json(
            r#"{
                "size": [10, 10],
                "tracks": {},
                "speakers": [ { "kind": "basic", "track": "ghost", "point": { "x": 0, "y": 0 } } ]
            }"#,
        )
        .unwrap();
        match scene.build(dir.path()) {
            Err(SpatialError::UnknownTrack(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected UnknownTrack, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_build_applies_rotation() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(&dir.path().join("tone.wav"), &[0.5; 50], 8000);
        let scene = SceneDescription::from_json(
            r#"{
                "size": [10, 10],
                "rotate": 90,
                "tracks": { "tone": "tone.wav" },
                "speakers": [ { "kind": "basic", "track": "tone", "point": { "x": 100, "y": 0 } } ]
            }"#,
        )
        .unwrap();
        let stage = scene.build(dir.path()).unwrap();
        let point = stage.speakers()[0].points()[0];
        assert!(point.x.abs() < 1e-9);
        assert!((point.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        write_mono_wav(&dir.path().join("tone.wav"), &[0.25; 30], 22050);
        let scene_path = dir.path().join("scene.json");
        std::fs::write(
            &scene_path,
            r#"{
                "size": [10, 10],
                "tracks": { "tone": "tone.wav" },
                "speakers": [ { "kind": "basic", "track": "tone", "point": { "x": 0, "y": 0 } } ]
            }"#,
        )
        .unwrap();

        let (scene, stage) = load(&scene_path).unwrap();
        assert_eq!(scene.tracks.len(), 1);
        assert_eq!(stage.len(), 1);
        assert_eq!(stage.speakers()[0].sample_rate(), 22050);
    }
}
