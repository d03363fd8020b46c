//! WAV decode/encode at the edges of the engine.
//!
//! Source recordings, HRIR measurements and the final mix all pass through
//! here. Integer PCM is normalized to `[-1.0, 1.0)` on read and clamped on
//! write.

use std::path::Path;

use crate::error::{Result, SpatialError};
use crate::signal::StereoBuffer;

/// Interleaved samples read from a WAV file.
#[derive(Debug, Clone)]
pub struct DecodedWav {
    /// Interleaved f32 samples.
    pub samples: Vec<f32>,
    /// Number of channels in the file.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl DecodedWav {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Output sample format for [`write_wav`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BitDepth {
    /// 16-bit signed integer.
    #[default]
    Int16,
    /// 24-bit signed integer.
    Int24,
    /// 32-bit IEEE float.
    Float32,
}

impl BitDepth {
    /// Maps a bit count to a supported output format.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidConfig`] for anything other than 16, 24 or 32.
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            16 => Ok(Self::Int16),
            24 => Ok(Self::Int24),
            32 => Ok(Self::Float32),
            other => Err(SpatialError::InvalidConfig(format!(
                "unsupported output bit depth {}: use 16, 24 or 32",
                other
            ))),
        }
    }

    fn bits(&self) -> u16 {
        match self {
            Self::Int16 => 16,
            Self::Int24 => 24,
            Self::Float32 => 32,
        }
    }
}

/// Reads a WAV file into interleaved f32 samples.
///
/// # Errors
///
/// Returns [`SpatialError::Io`] with [`std::io::ErrorKind::NotFound`] when the
/// file does not exist, and [`SpatialError::Wav`] for malformed data.
pub fn read_wav(path: &Path) -> Result<DecodedWav> {
    let reader = hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(io) => SpatialError::Io(io),
        other => SpatialError::Wav(other),
    })?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| -> Result<f32> { Ok(s? as f32 / max_val) })
                .collect::<Result<Vec<f32>>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(SpatialError::from))
            .collect::<Result<Vec<f32>>>()?,
    };

    tracing::debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        samples = samples.len(),
        "Decoded WAV"
    );

    Ok(DecodedWav {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Writes a stereo buffer to a WAV file.
pub fn write_wav(
    path: &Path,
    signal: &StereoBuffer,
    sample_rate: u32,
    bit_depth: BitDepth,
) -> Result<()> {
    let sample_format = match bit_depth {
        BitDepth::Float32 => hound::SampleFormat::Float,
        BitDepth::Int16 | BitDepth::Int24 => hound::SampleFormat::Int,
    };
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: bit_depth.bits(),
        sample_format,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    match bit_depth {
        BitDepth::Float32 => {
            for sample in signal.interleaved() {
                writer.write_sample(sample)?;
            }
        }
        BitDepth::Int16 | BitDepth::Int24 => {
            let max_val = (1u32 << (bit_depth.bits() - 1)) as f32;
            let max_int = max_val as i32 - 1;
            for sample in signal.interleaved() {
                let scaled = (sample.clamp(-1.0, 1.0) * max_val) as i32;
                writer.write_sample(scaled.min(max_int))?;
            }
        }
    }
    writer.finalize()?;

    tracing::info!(
        path = %path.display(),
        frames = signal.len(),
        sample_rate,
        bits = bit_depth.bits(),
        "Wrote mix"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.wav");
        let signal = StereoBuffer::new(vec![0.25, -0.5, 0.75], vec![0.0, 0.5, -1.0]).unwrap();

        write_wav(&path, &signal, 22050, BitDepth::Float32).unwrap();
        let decoded = read_wav(&path).unwrap();

        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.frames(), 3);
        assert_eq!(decoded.samples, signal.interleaved());
    }

    #[test]
    fn test_int16_clamps_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loud.wav");
        let signal = StereoBuffer::new(vec![2.0, 0.5], vec![-2.0, -0.5]).unwrap();

        write_wav(&path, &signal, 8000, BitDepth::Int16).unwrap();
        let decoded = read_wav(&path).unwrap();

        assert!(decoded.samples.iter().all(|s| (-1.0..1.0).contains(s)));
        assert!((decoded.samples[2] - 0.5).abs() < 1e-4);
        assert!((decoded.samples[3] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_missing_file_is_io_not_found() {
        let err = read_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        match err {
            SpatialError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_bit_depth_from_bits() {
        assert_eq!(BitDepth::from_bits(24).unwrap(), BitDepth::Int24);
        assert!(BitDepth::from_bits(8).is_err());
    }
}
