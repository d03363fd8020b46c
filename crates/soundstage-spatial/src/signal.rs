//! Rendered two-channel signals and the overlay/append primitives used to mix them.

use crate::error::{Result, SpatialError};

/// A rendered stereo signal whose channels always have equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoBuffer {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl StereoBuffer {
    /// Creates a buffer from two channels.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ChannelLengthMismatch`] if the channels differ in length.
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Result<Self> {
        if left.len() != right.len() {
            return Err(SpatialError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        Ok(Self { left, right })
    }

    /// Builds a buffer from channels the caller already sized identically.
    pub(crate) fn from_equal_channels(left: Vec<f32>, right: Vec<f32>) -> Self {
        debug_assert_eq!(left.len(), right.len());
        Self { left, right }
    }

    /// A buffer of `len` silent frames.
    pub fn silent(len: usize) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Returns `true` if the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Left channel.
    pub fn left(&self) -> &[f32] {
        &self.left
    }

    /// Right channel.
    pub fn right(&self) -> &[f32] {
        &self.right
    }

    /// Consumes the buffer, returning `(left, right)`.
    pub fn into_channels(self) -> (Vec<f32>, Vec<f32>) {
        (self.left, self.right)
    }

    /// Adds `other` sample-aligned from frame zero, growing `self` if `other` is longer.
    pub fn overlay(&mut self, other: &StereoBuffer) {
        if other.len() > self.len() {
            self.left.resize(other.len(), 0.0);
            self.right.resize(other.len(), 0.0);
        }
        for (dst, src) in self.left.iter_mut().zip(&other.left) {
            *dst += *src;
        }
        for (dst, src) in self.right.iter_mut().zip(&other.right) {
            *dst += *src;
        }
    }

    /// Concatenates `other` after the last frame of `self`.
    pub fn append(&mut self, other: &StereoBuffer) {
        self.left.extend_from_slice(&other.left);
        self.right.extend_from_slice(&other.right);
    }

    /// Frames interleaved as `L R L R ...`.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len() * 2);
        for (l, r) in self.left.iter().zip(&self.right) {
            out.push(*l);
            out.push(*r);
        }
        out
    }

    /// Largest absolute sample value across both channels.
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}
