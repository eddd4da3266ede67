// Spectral module - Band scans over magnitude spectra
//
// This module maps bins to frequencies and computes the per-band quantities
// the feature extractor needs: the strongest bin in a band and the energy
// (sum of squared magnitudes) over a frequency range.

use std::ops::RangeBounds;

/// Frequency-aware view over a magnitude spectrum layout
pub struct SpectralBands {
    /// Width of one bin in Hz
    bin_width: f32,
}

impl SpectralBands {
    /// Create a band helper for a spectrum of `bin_count` bins
    ///
    /// The bins are assumed to span 0 Hz to Nyquist, so the width of one bin
    /// is `(sample_rate / 2) / bin_count`.
    ///
    /// # Returns
    /// `None` when the layout is degenerate (no bins or zero sample rate)
    pub fn new(sample_rate: u32, bin_count: usize) -> Option<Self> {
        if sample_rate == 0 || bin_count == 0 {
            return None;
        }
        let nyquist = sample_rate as f32 / 2.0;
        Some(Self {
            bin_width: nyquist / bin_count as f32,
        })
    }

    /// Width of one bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.bin_width
    }

    /// Centre frequency of bin `index` in Hz
    pub fn bin_frequency(&self, index: usize) -> f32 {
        index as f32 * self.bin_width
    }

    /// Find the strongest bin whose frequency lies in `band`
    ///
    /// Ties keep the lowest-frequency bin. Bins with zero magnitude never
    /// win, so an all-silent band yields `None`.
    ///
    /// # Returns
    /// `(bin_index, magnitude)` of the strongest bin
    pub fn strongest_bin<R: RangeBounds<f32>>(
        &self,
        spectrum: &[f32],
        band: R,
    ) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &mag) in spectrum.iter().enumerate() {
            if !band.contains(&self.bin_frequency(i)) {
                continue;
            }
            let current = best.map(|(_, m)| m).unwrap_or(0.0);
            if mag > current {
                best = Some((i, mag));
            }
        }
        best
    }

    /// Sum of squared magnitudes over bins whose frequency lies in `band`
    pub fn band_energy<R: RangeBounds<f32>>(&self, spectrum: &[f32], band: R) -> f32 {
        spectrum
            .iter()
            .enumerate()
            .filter(|(i, _)| band.contains(&self.bin_frequency(*i)))
            .map(|(_, &mag)| mag * mag)
            .sum()
    }
}

/// Sum of squared magnitudes over the whole spectrum
pub fn total_energy(spectrum: &[f32]) -> f32 {
    spectrum.iter().map(|&mag| mag * mag).sum()
}
