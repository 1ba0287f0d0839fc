//! FlatBackground: subtracts a constant or linear background estimated from
//! a signal-free X region.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tofbin_core::{Histogram1D, MatrixWorkspace, Workspace2D};

use crate::error::{Error, Result};
use crate::parallel::{for_each_spectrum, spectrum_selection};
use crate::progress::Progress;

/// How the background is modelled over the region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Mean of the region.
    #[default]
    Mean,
    /// Least-squares line through the region's bin centres.
    LinearFit,
}

/// Background subtraction over `[start_x, end_x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatBackground {
    pub start_x: f64,
    pub end_x: f64,
    #[serde(default)]
    pub spectra: Option<Vec<usize>>,
    #[serde(default)]
    pub mode: BackgroundMode,
    /// Clamp negative results to zero.
    #[serde(default = "crate::default_true")]
    pub reset_negatives: bool,
    #[serde(default = "crate::default_true")]
    pub parallel: bool,
}

/// Outcome of one FlatBackground run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackgroundSummary {
    /// Spectra that had a background subtracted.
    pub corrected: usize,
    /// Spectra whose X range does not contain the background region.
    pub out_of_range: usize,
}

/// Background of one bin: value and variance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Background {
    intercept: f64,
    slope: f64,
    centre: f64,
    /// Variance of the level at `centre`.
    variance: f64,
    /// Variance of the slope.
    slope_variance: f64,
}

impl Background {
    fn at(&self, x: f64) -> (f64, f64) {
        let dx = x - self.centre;
        (
            self.intercept + self.slope * x,
            self.variance + dx * dx * self.slope_variance,
        )
    }
}

enum SpectrumOutcome {
    Skipped,
    Corrected,
    OutOfRange,
}

impl FlatBackground {
    pub fn new(start_x: f64, end_x: f64) -> Self {
        Self {
            start_x,
            end_x,
            spectra: None,
            mode: BackgroundMode::Mean,
            reset_negatives: true,
            parallel: true,
        }
    }

    pub fn with_mode(mut self, mode: BackgroundMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_spectra(mut self, spectra: Vec<usize>) -> Self {
        self.spectra = Some(spectra);
        self
    }

    pub fn with_reset_negatives(mut self, reset_negatives: bool) -> Self {
        self.reset_negatives = reset_negatives;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Subtracts the background in place.
    ///
    /// Spectra whose X range does not contain the region are left untouched
    /// and reported once as a warning.
    pub fn exec(&self, ws: &mut Workspace2D, progress: &dyn Progress) -> Result<BackgroundSummary> {
        if !(self.start_x.is_finite() && self.end_x.is_finite()) || self.end_x <= self.start_x {
            return Err(Error::InvalidArgument(
                "EndX must be greater than StartX".to_string(),
            ));
        }
        let selected = spectrum_selection(self.spectra.as_deref(), ws.num_histograms())?;
        debug!(
            "FlatBackground ({:?}) over [{}, {})",
            self.mode, self.start_x, self.end_x
        );

        let results = for_each_spectrum(ws.spectra_mut(), self.parallel, progress, |i, spectrum| {
            if !selected[i] {
                return Ok(SpectrumOutcome::Skipped);
            }
            Ok(self.correct(spectrum))
        })?;
        results.cancellation()?;

        let mut summary = BackgroundSummary::default();
        for (_, outcome) in results.into_processed() {
            match outcome {
                SpectrumOutcome::Corrected => summary.corrected += 1,
                SpectrumOutcome::OutOfRange => summary.out_of_range += 1,
                SpectrumOutcome::Skipped => {}
            }
        }
        if summary.out_of_range > 0 {
            warn!(
                "FlatBackground: region [{}, {}) outside the X range of {} spectra, left unchanged",
                self.start_x, self.end_x, summary.out_of_range
            );
        }
        Ok(summary)
    }

    fn correct(&self, spectrum: &mut Histogram1D) -> SpectrumOutcome {
        let Some((first, last)) = self.region(spectrum.x()) else {
            return SpectrumOutcome::OutOfRange;
        };
        let centres = bin_centres(spectrum);
        let region = first..=last;
        let background = match self.mode {
            BackgroundMode::Mean => None,
            BackgroundMode::LinearFit => linear_fit(
                &centres[region.clone()],
                &spectrum.y()[region.clone()],
                &spectrum.e()[region.clone()],
            ),
        }
        .unwrap_or_else(|| mean(&spectrum.y()[region.clone()], &spectrum.e()[region]));

        let reset = self.reset_negatives;
        let (y, e) = spectrum.data_mut();
        for ((value, error), &x) in y.iter_mut().zip(e.iter_mut()).zip(&centres) {
            let (level, variance) = background.at(x);
            *value -= level;
            *error = (*error * *error + variance).sqrt();
            if reset && *value < 0.0 {
                *value = 0.0;
            }
        }
        SpectrumOutcome::Corrected
    }

    /// Bin range `[start, end]` covering `[start_x, end_x)`, if contained in `x`.
    fn region(&self, x: &[f64]) -> Option<(usize, usize)> {
        let (&low, &high) = (x.first()?, x.last()?);
        if x.len() < 2 || self.start_x < low || self.end_x > high {
            return None;
        }
        let start = x.partition_point(|&edge| edge <= self.start_x).checked_sub(1)?;
        let end = x.partition_point(|&edge| edge < self.end_x).checked_sub(1)?;
        let last_bin = x.len() - 2;
        Some((start.min(last_bin), end.min(last_bin)))
    }
}

fn bin_centres(spectrum: &Histogram1D) -> Vec<f64> {
    if spectrum.is_histogram_data() {
        spectrum.x().centres()
    } else {
        spectrum.x().to_vec()
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(y: &[f64], e: &[f64]) -> Background {
    let n = y.len() as f64;
    let level = y.iter().sum::<f64>() / n;
    let variance = e.iter().map(|err| err * err).sum::<f64>() / (n * n);
    Background {
        intercept: level,
        slope: 0.0,
        centre: 0.0,
        variance,
        slope_variance: 0.0,
    }
}

/// Ordinary least squares `y = a + b x`. `None` when the fit is degenerate.
#[allow(clippy::cast_precision_loss)]
fn linear_fit(x: &[f64], y: &[f64], e: &[f64]) -> Option<Background> {
    if x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - x_mean) * (yi - y_mean)).sum();
    let slope = sxy / sxx;
    // Mean input variance stands in for the per-point variance of the fit.
    let point_variance = e.iter().map(|err| err * err).sum::<f64>() / n;
    Some(Background {
        intercept: y_mean - slope * x_mean,
        slope,
        centre: x_mean,
        variance: point_variance / n,
        slope_variance: point_variance / sxx,
    })
}
