//! Full linear convolution.
//!
//! Short kernels are convolved directly; once the multiply count grows past
//! [`DIRECT_CONVOLUTION_LIMIT`] the product is computed in the frequency
//! domain with `rustfft`. Both paths return `signal.len() + kernel.len() - 1`
//! samples.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Largest `signal.len() * kernel.len()` computed with the direct method.
pub const DIRECT_CONVOLUTION_LIMIT: usize = 1 << 16;

/// Convolves `signal` with `kernel`.
///
/// Returns an empty vector if either input is empty.
pub fn convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    if signal.len().saturating_mul(kernel.len()) <= DIRECT_CONVOLUTION_LIMIT {
        convolve_direct(signal, kernel)
    } else {
        convolve_fft(signal, kernel)
    }
}

/// Time-domain convolution.
pub fn convolve_direct(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0f32; signal.len() + kernel.len() - 1];
    for (i, &s) in signal.iter().enumerate() {
        if s == 0.0 {
            continue;
        }
        for (j, &k) in kernel.iter().enumerate() {
            out[i + j] += s * k;
        }
    }
    out
}

/// Frequency-domain convolution (zero-padded to the next power of two).
pub fn convolve_fft(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut a = to_complex(signal, fft_len);
    let mut b = to_complex(kernel, fft_len);
    forward.process(&mut a);
    forward.process(&mut b);

    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    inverse.process(&mut a);

    // rustfft does not normalize the inverse transform.
    let scale = 1.0 / fft_len as f64;
    a.iter()
        .take(out_len)
        .map(|c| (c.re * scale) as f32)
        .collect()
}

fn to_complex(samples: &[f32], len: usize) -> Vec<Complex<f64>> {
    let mut buf = vec![Complex::new(0.0, 0.0); len];
    for (dst, &s) in buf.iter_mut().zip(samples) {
        dst.re = s as f64;
    }
    buf
}
