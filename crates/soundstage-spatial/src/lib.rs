//! # soundstage-spatial: binaural rendering of 2D speaker scenes
//!
//! Places mono or stereo recordings around a listener and renders what the
//! listener hears as a stereo mix that conveys direction and distance.
//!
//! ## Architecture
//!
//! - **[`binaural`]**: Interaural-delay localization ([`BasicSpeaker`]).
//! - **[`hrtf`]**: Head-related impulse response lookup and convolution
//!   ([`HrtfSpeaker`]).
//! - **[`ambisonics`]**: First-order B-format encoding decoded onto a virtual
//!   quad array at the room corners ([`AmbisonicSpeaker`]).
//! - **[`speaker`]**: The [`Speaker`] variant every stage holds.
//! - **[`stage`]**: [`Soundstage`] composition, rotation, mixing and layout.
//! - **[`scene`]**: JSON scene files that build a stage from WAV tracks.
//! - **[`track`]**, **[`signal`]**, **[`wav`]**, **[`convolve`]**: sample
//!   buffers and the DSP they pass through.
//! - **[`config`]**: [`RenderConfig`] shared by every speaker.
//! - **[`error`]**: Error types for all rendering operations.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use soundstage_spatial::{BasicSpeaker, MixMode, Point2D, RenderConfig, Soundstage, Track};
//!
//! let config = Arc::new(RenderConfig::default());
//! let track = Track::mono(44100, vec![0.25f32; 4410]).unwrap();
//!
//! let mut stage = Soundstage::new((1000.0, 1000.0));
//! stage.add(BasicSpeaker::new(Point2D::new(300.0, 0.0).unwrap(), track.clone(), config.clone()).unwrap());
//! stage.add(BasicSpeaker::new(Point2D::new(-300.0, 0.0).unwrap(), track, config).unwrap());
//!
//! stage.rotate(90.0).unwrap();
//! let mix = stage.mix(MixMode::Overlay).unwrap();
//! assert_eq!(mix.sample_rate, 44100);
//! ```

pub mod ambisonics;
pub mod binaural;
pub mod config;
pub mod convolve;
pub mod error;
pub mod hrtf;
pub mod point;
pub mod scene;
pub mod signal;
pub mod speaker;
pub mod stage;
pub mod track;
pub mod wav;

pub use ambisonics::{AmbisonicSpeaker, BFormat, Corner, VirtualRenderer};
pub use binaural::{BasicSpeaker, InterauralDelays};
pub use config::{DelayTimebase, RenderConfig};
pub use error::{Result, SpatialError};
pub use hrtf::{HrirDataset, HrirKey, HrirSource, HrtfSpeaker, ImpulsePair};
pub use point::Point2D;
pub use scene::{SceneDescription, SpeakerDescription, VirtualSpeakerKind};
pub use signal::StereoBuffer;
pub use speaker::{Speaker, SpeakerKind};
pub use stage::{LayoutMarker, MixMode, Mixdown, Soundstage, StageLayout};
pub use track::{Channels, Track};
pub use wav::BitDepth;
