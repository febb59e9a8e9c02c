//! FFT utilities for frequency-domain processing of real records.
//!
//! Records are zero-padded to a power of two before transforming. Whether
//! the zeros go in front of or behind the data depends on the caller:
//! resampling pads in front so the record sits at the tail of the buffer.

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Where zero padding is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadSide {
    /// Zeros before the data
    Start,
    /// Zeros after the data
    End,
}

/// Smallest power of two ≥ `len` (and ≥ 2).
pub fn padded_length(len: usize) -> usize {
    len.max(2).next_power_of_two()
}

/// Zero-pad `data` to [`padded_length`] on the given side.
pub fn pad_to_power_of_two(data: &[f64], side: PadSide) -> Vec<f64> {
    let size = padded_length(data.len());
    let zeros = size - data.len();
    let mut out = Vec::with_capacity(size);
    match side {
        PadSide::Start => {
            out.resize(zeros, 0.0);
            out.extend_from_slice(data);
        }
        PadSide::End => {
            out.extend_from_slice(data);
            out.resize(size, 0.0);
        }
    }
    out
}

/// Planned forward and inverse transforms of one size.
pub struct FftProcessor {
    /// FFT size
    size: usize,
    /// Forward FFT instance
    fft_forward: Arc<dyn Fft<f64>>,
    /// Inverse FFT instance
    fft_inverse: Arc<dyn Fft<f64>>,
    /// Scratch buffer for FFT operations
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let fft_inverse = planner.plan_fft_inverse(size);
        let scratch_len = fft_forward
            .get_inplace_scratch_len()
            .max(fft_inverse.get_inplace_scratch_len());
        let scratch = vec![Complex64::new(0.0, 0.0); scratch_len];

        Self {
            size,
            fft_forward,
            fft_inverse,
            scratch,
        }
    }

    /// Get the FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward FFT in-place
    pub fn fft_inplace(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.fft_forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Forward FFT of a real record, truncated or zero-extended to the size.
    pub fn fft_real(&mut self, input: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = input
            .iter()
            .take(self.size)
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        buffer.resize(self.size, Complex64::new(0.0, 0.0));
        self.fft_inplace(&mut buffer);
        buffer
    }

    /// Compute the inverse FFT in-place, normalised by 1/N
    pub fn ifft_inplace(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.size);
        self.fft_inverse.process_with_scratch(buffer, &mut self.scratch);

        let scale = 1.0 / self.size as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
    }
}
