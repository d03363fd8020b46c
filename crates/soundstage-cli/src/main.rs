//! Soundstage CLI: render binaural mixes from JSON scene files.
//!
//! # Usage
//!
//! ```bash
//! soundstage render scene.json -o mix.wav
//! soundstage render scene.json -o mix.wav --mode append --rotate 90 --bit-depth 24
//! soundstage layout scene.json --json
//! soundstage hrir --x -120 --y 300 --elevation 10 --dataset hrtf/
//! soundstage play scene.json            # requires the `playback` feature
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use soundstage_spatial::hrtf::resolve_impulse;
use soundstage_spatial::scene::{self, SceneDescription};
use soundstage_spatial::{
    wav, BitDepth, HrirDataset, HrirKey, MixMode, Mixdown, Point2D, Soundstage, SpeakerKind,
};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `soundstage` binary.
#[derive(Parser)]
#[command(
    name = "soundstage",
    about = "Binaural renderer for 2D speaker scenes",
    version,
    long_about = "Places recordings around a listener and renders the stereo mix the listener\n\
                  hears, using interaural delay, HRTF convolution or first-order ambisonics."
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Render a scene file to a stereo WAV file.
    Render {
        /// Input scene JSON path.
        scene: PathBuf,

        /// Output WAV path.
        #[arg(short, long)]
        output: PathBuf,

        /// How speakers are combined (overlay, append).
        #[arg(short, long, default_value = "overlay")]
        mode: MixMode,

        /// Extra rotation in degrees, applied after the scene's own.
        #[arg(long, allow_hyphen_values = true)]
        rotate: Option<f64>,

        /// Output bit depth (16, 24, 32).
        #[arg(short, long, default_value_t = 16)]
        bit_depth: u16,
    },

    /// Show where every speaker sits relative to the listener.
    Layout {
        /// Input scene JSON path.
        scene: PathBuf,

        /// Output the layout as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show which HRIR measurement a position resolves to.
    Hrir {
        /// Horizontal position (positive is right).
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Depth position (positive is ahead).
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Elevation in degrees.
        #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
        elevation: f64,

        /// HRIR dataset root.
        #[arg(short, long, default_value = soundstage_spatial::config::DEFAULT_DATASET_ROOT)]
        dataset: PathBuf,
    },

    /// Render a scene and play it through the default audio output.
    #[cfg(feature = "playback")]
    Play {
        /// Input scene JSON path.
        scene: PathBuf,

        /// How speakers are combined (overlay, append).
        #[arg(short, long, default_value = "overlay")]
        mode: MixMode,
    },
}

// ────────────────────────────── main ──────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            scene,
            output,
            mode,
            rotate,
            bit_depth,
        } => cmd_render(&scene, &output, mode, rotate, bit_depth),

        Commands::Layout { scene, json } => cmd_layout(&scene, json),

        Commands::Hrir {
            x,
            y,
            elevation,
            dataset,
        } => cmd_hrir(x, y, elevation, &dataset),

        #[cfg(feature = "playback")]
        Commands::Play { scene, mode } => cmd_play(&scene, mode),
    }
}

// ──────────────────────────── render ──────────────────────────────

/// Build the stage from `scene_path`, mix it and write the result as WAV.
fn cmd_render(
    scene_path: &Path,
    output: &Path,
    mode: MixMode,
    rotate: Option<f64>,
    bit_depth: u16,
) -> Result<()> {
    let bit_depth = BitDepth::from_bits(bit_depth)
        .with_context(|| format!("Unsupported bit depth {}", bit_depth))?;

    let (_, stage) = load_stage(scene_path, rotate)?;
    let mix = stage
        .mix(mode)
        .with_context(|| format!("Failed to mix scene: {}", scene_path.display()))?;

    wav::write_wav(output, &mix.signal, mix.sample_rate, bit_depth)
        .with_context(|| format!("Failed to write WAV: {}", output.display()))?;

    print_mix_summary(scene_path, &stage, mode, &mix);
    println!("  Output: {}", output.display());
    println!();
    Ok(())
}

fn print_mix_summary(scene_path: &Path, stage: &Soundstage, mode: MixMode, mix: &Mixdown) {
    println!();
    println!("  Soundstage");
    println!("  ============================================");
    println!("  Scene: {}", scene_path.display());
    println!("  Speakers: {}", stage.len());
    for (index, speaker) in stage.speakers().iter().enumerate() {
        println!(
            "    [{}] {:<10} {} frames",
            index,
            speaker.kind(),
            speaker.render().len()
        );
    }
    println!("  Mode: {:?}", mode);
    println!("  Sample rate: {} Hz", mix.sample_rate);
    println!(
        "  Duration: {:.2}s ({} frames)",
        mix.duration_secs(),
        mix.signal.len()
    );
    println!("  Peak: {:.3}", mix.signal.peak());
}

// ──────────────────────────── layout ──────────────────────────────

fn cmd_layout(scene_path: &Path, json: bool) -> Result<()> {
    let (scene, stage) = load_stage(scene_path, None)?;
    let layout = stage.layout(&scene.config);

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    println!();
    println!("  Layout: {}", scene_path.display());
    println!("  ============================================");
    println!("  Room: {} x {}", layout.width, layout.height);
    println!(
        "  Ears: ({:.1}, {:.1}) / ({:.1}, {:.1})",
        layout.ears[0].x, layout.ears[0].y, layout.ears[1].x, layout.ears[1].y
    );
    println!("  Markers: {}", layout.markers.len());
    for marker in &layout.markers {
        let tag = match marker.kind {
            SpeakerKind::Basic => "o",
            SpeakerKind::Hrtf => "*",
            SpeakerKind::Ambisonic => "x",
        };
        println!(
            "    {} [{}] {:<10} ({:>8.1}, {:>8.1})  azimuth {:>6.1}°",
            tag,
            marker.speaker,
            marker.kind,
            marker.point.x,
            marker.point.y,
            marker.point.azimuth_degrees()
        );
    }
    println!();
    Ok(())
}

// ───────────────────────────── hrir ───────────────────────────────

fn cmd_hrir(x: f64, y: f64, elevation: f64, dataset_root: &Path) -> Result<()> {
    let point = Point2D::new(x, y).context("Invalid position")?;
    let key = HrirKey::for_point(&point, elevation);
    let dataset = HrirDataset::new(dataset_root);
    let path = dataset.path_for(&key);

    println!();
    println!("  HRIR lookup");
    println!("  ============================================");
    println!("  Position: ({}, {})", x, y);
    println!("  Azimuth: {:.2}°", point.azimuth_degrees());
    println!("  Degree: {}", key.degree);
    println!("  Elevation: {}", key.elevation);
    println!("  Flip: {}", if key.flip { "yes" } else { "no" });
    println!("  File: {}", path.display());

    if !path.is_file() {
        bail!("HRIR file not found: {}", path.display());
    }

    let impulse = resolve_impulse(&dataset, &key)
        .with_context(|| format!("Failed to load HRIR: {}", path.display()))?;
    println!("  Sample rate: {} Hz", impulse.sample_rate);
    println!("  Taps: {}", impulse.left.len());
    println!("  Normalized peak: {:.3}", impulse.peak());
    println!();
    Ok(())
}

// ──────────────────────────── play ───────────────────────────────

/// Render a scene and stream the mix to the default output device.
#[cfg(feature = "playback")]
fn cmd_play(scene_path: &Path, mode: MixMode) -> Result<()> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };

    let (_, stage) = load_stage(scene_path, None)?;
    let mix = stage
        .mix(mode)
        .with_context(|| format!("Failed to mix scene: {}", scene_path.display()))?;
    print_mix_summary(scene_path, &stage, mode, &mix);
    println!();

    let samples: Vec<f32> = mix
        .signal
        .interleaved()
        .into_iter()
        .map(|s| s.clamp(-1.0, 1.0))
        .collect();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;

    let stream_config = cpal::StreamConfig {
        channels: 2,
        sample_rate: cpal::SampleRate(mix.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let samples = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let samples_clone = Arc::clone(&samples);
    let position_clone = Arc::clone(&position);
    let finished_clone = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let pos = position_clone.load(Ordering::Relaxed);
                let remaining = samples_clone.len().saturating_sub(pos);
                let to_copy = data.len().min(remaining);

                if to_copy > 0 {
                    data[..to_copy].copy_from_slice(&samples_clone[pos..pos + to_copy]);
                }
                for sample in &mut data[to_copy..] {
                    *sample = 0.0;
                }

                position_clone.store(pos + to_copy, Ordering::Relaxed);
                if to_copy == 0 || pos + to_copy >= samples_clone.len() {
                    finished_clone.store(true, Ordering::Relaxed);
                }
            },
            move |err| {
                eprintln!("  Audio stream error: {}", err);
            },
            None,
        )
        .context("Failed to build audio output stream")?;

    stream.play().context("Failed to start audio playback")?;
    println!("  ▶ Playing... (Ctrl+C to stop)");

    while !finished.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    // Let the device drain its last buffer.
    std::thread::sleep(std::time::Duration::from_millis(200));

    println!("  ■ Playback complete.");
    println!();
    Ok(())
}

// ──────────────────────── helper functions ─────────────────────────

/// Load a scene file, build its stage and apply an optional extra rotation.
fn load_stage(scene_path: &Path, rotate: Option<f64>) -> Result<(SceneDescription, Soundstage)> {
    let (scene, mut stage) = scene::load(scene_path)
        .with_context(|| format!("Failed to load scene: {}", scene_path.display()))?;

    if let Some(theta) = rotate {
        stage
            .rotate(theta)
            .with_context(|| format!("Failed to rotate stage by {}°", theta))?;
    }
    if stage.is_empty() {
        bail!("Scene has no speakers: {}", scene_path.display());
    }
    tracing::debug!(
        scene = %scene_path.display(),
        speakers = stage.len(),
        "Loaded scene"
    );
    Ok((scene, stage))
}
