use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Wraps a planned `rustfft` transform of a fixed length for reuse.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::zero(); fft.get_inplace_scratch_len()];
        let buffer = vec![Complex64::zero(); size];
        Self {
            fft,
            buffer,
            scratch,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of non-negative frequency bins of a real transform.
    pub fn onesided_len(&self) -> usize {
        self.len() / 2 + 1
    }

    /// Real-input transform returning only the non-negative frequency bins.
    ///
    /// Input shorter than the transform length is zero padded; longer input
    /// is truncated.
    pub fn forward_real(&mut self, input: &[f64]) -> &[Complex64] {
        let size = self.buffer.len();
        for (index, slot) in self.buffer.iter_mut().enumerate() {
            *slot = input
                .get(index)
                .map_or(Complex64::zero(), |&value| Complex64::new(value, 0.0));
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);
        let bins = self.onesided_len().min(size);
        &self.buffer[..bins]
    }
}
