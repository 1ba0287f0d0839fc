//! SmoothData: moving-average smoothing of every spectrum.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tofbin_core::{MatrixWorkspace, Workspace2D};

use crate::error::{Error, Result};
use crate::parallel::for_each_spectrum;
use crate::progress::Progress;

/// Replaces each Y value by the mean of the `npts` values centred on it.
///
/// The window is truncated at both ends of a spectrum, so the first value
/// averages `npts / 2 + 1` points. Errors combine in quadrature:
/// `sqrt(sum e^2) / n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothData {
    /// Window width; even values are bumped to the next odd one.
    pub npts: usize,
    /// Run the per-spectrum loop on the rayon pool.
    #[serde(default = "crate::default_true")]
    pub parallel: bool,
}

impl Default for SmoothData {
    fn default() -> Self {
        Self {
            npts: 3,
            parallel: true,
        }
    }
}

impl SmoothData {
    pub fn new(npts: usize) -> Self {
        Self {
            npts,
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Effective (odd) window for spectra of `blocksize` values.
    pub fn window(&self, blocksize: usize) -> Result<usize> {
        if self.npts < 3 {
            return Err(Error::InvalidArgument(format!(
                "NPoints must be at least 3, got {}",
                self.npts
            )));
        }
        let npts = if self.npts % 2 == 0 {
            warn!(
                "SmoothData needs an odd number of points, using {} instead of {}",
                self.npts + 1,
                self.npts
            );
            self.npts + 1
        } else {
            self.npts
        };
        if npts > blocksize {
            return Err(Error::InvalidArgument(format!(
                "NPoints ({npts}) must not exceed the number of bins ({blocksize})"
            )));
        }
        Ok(npts)
    }

    /// Smooths `input` into a new histogram workspace. Event workspaces are
    /// read through their histograms.
    pub fn exec(&self, input: &dyn MatrixWorkspace, progress: &dyn Progress) -> Result<Workspace2D> {
        let npts = self.window(input.blocksize())?;
        let n_spectra = input.num_histograms();
        let x_len = input.x(0).map_or(0, |x| x.len());
        let mut output = Workspace2D::like(input, n_spectra, x_len, input.blocksize())?;
        debug!("SmoothData over {npts} points on {n_spectra} spectra");

        let results = for_each_spectrum(output.spectra_mut(), self.parallel, progress, |i, spectrum| {
            let source = input.histogram(i)?;
            let (y, e) = moving_average(source.y(), source.e(), npts);
            spectrum.set_data(source.x().clone(), y, e)?;
            Ok(())
        })?;
        results.finish()?;

        for i in 0..n_spectra {
            if let Some(masks) = input.masked_bins(i).filter(|m| !m.is_empty()) {
                output.set_masked_bins(i, masks.clone())?;
            }
        }
        Ok(output)
    }
}

/// Truncated-window moving average of `y` with quadrature errors.
pub fn moving_average(y: &[f64], e: &[f64], npts: usize) -> (Vec<f64>, Vec<f64>) {
    let half = npts.saturating_sub(1) / 2;
    let mut sum_y = Vec::with_capacity(y.len() + 1);
    let mut sum_e2 = Vec::with_capacity(e.len() + 1);
    sum_y.push(0.0);
    sum_e2.push(0.0);
    for (value, error) in y.iter().zip(e) {
        sum_y.push(sum_y[sum_y.len() - 1] + value);
        sum_e2.push(sum_e2[sum_e2.len() - 1] + error * error);
    }

    let mut smoothed = Vec::with_capacity(y.len());
    let mut errors = Vec::with_capacity(y.len());
    for i in 0..y.len() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(y.len());
        #[allow(clippy::cast_precision_loss)]
        let count = (hi - lo) as f64;
        smoothed.push((sum_y[hi] - sum_y[lo]) / count);
        errors.push((sum_e2[hi] - sum_e2[lo]).max(0.0).sqrt() / count);
    }
    (smoothed, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use approx::assert_relative_eq;
    use tofbin_core::{BinEdges, Histogram1D};

    #[test]
    fn test_moving_average_truncates_at_ends() {
        let (y, e) = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0; 5], 3);
        let expected = [1.5, 2.0, 3.0, 4.0, 4.5];
        for (got, want) in y.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert_relative_eq!(e[0], 2.0_f64.sqrt() / 2.0, epsilon = 1e-12);
        assert_relative_eq!(e[2], 3.0_f64.sqrt() / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_even_window_is_bumped() {
        assert_eq!(SmoothData::new(4).window(10).unwrap(), 5);
        assert!(SmoothData::new(2).window(10).is_err());
        assert!(SmoothData::new(11).window(10).is_err());
    }

    #[test]
    fn test_smooths_into_new_workspace() {
        let x = BinEdges::linear(0.0, 1.0, 5);
        let spectrum = Histogram1D::new(x, vec![0.0, 0.0, 9.0, 0.0, 0.0], vec![3.0; 5]).unwrap();
        let input = Workspace2D::from_spectra(vec![spectrum]);
        let output = SmoothData::new(3).exec(&input, &NullProgress).unwrap();
        let y = output.read_y(0).unwrap();
        assert_relative_eq!(y[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(y[2], 3.0, epsilon = 1e-12);
        assert_relative_eq!(y[0], 0.0, epsilon = 1e-12);
        assert!(output.spectra()[0].x().same_as(input.spectra()[0].x()));
        assert_eq!(input.read_y(0).unwrap()[2], 9.0);
    }
}
