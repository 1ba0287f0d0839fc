//! MaskBins: masks an X range in every (or selected) spectra.

use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};
use tofbin_core::{MatrixWorkspace, Workspace, Workspace2D};

use crate::error::{Error, Result};
use crate::parallel::{for_each_spectrum, spectrum_selection};
use crate::progress::Progress;

/// Masks the bins overlapping `[x_min, x_max)`.
///
/// Histogram spectra get their Y and E zeroed and the bins flagged with
/// weight 1; event lists lose (or zero) the events in the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskBins {
    /// Lower end of the masked range.
    pub x_min: f64,
    /// Upper end of the masked range.
    pub x_max: f64,
    /// Workspace indices to mask; every spectrum when absent.
    #[serde(default)]
    pub spectra: Option<Vec<usize>>,
    /// Run the per-spectrum loop on the rayon pool.
    #[serde(default = "crate::default_true")]
    pub parallel: bool,
}

impl MaskBins {
    /// Masks `[x_min, x_max)` in every spectrum.
    pub fn new(x_min: f64, x_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            spectra: None,
            parallel: true,
        }
    }

    /// Restricts masking to the given workspace indices.
    pub fn with_spectra(mut self, spectra: Vec<usize>) -> Self {
        self.spectra = Some(spectra);
        self
    }

    /// Enables or disables the parallel loop.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks the properties against a workspace with `num_histograms`
    /// spectra.
    pub fn validate(&self, num_histograms: usize) -> Result<Vec<bool>> {
        if !self.x_min.is_finite() || !self.x_max.is_finite() {
            return Err(Error::InvalidArgument(
                "XMin and XMax must be finite".to_string(),
            ));
        }
        if self.x_max <= self.x_min {
            return Err(Error::InvalidArgument(
                "XMax must be greater than XMin".to_string(),
            ));
        }
        spectrum_selection(self.spectra.as_deref(), num_histograms)
    }

    /// Masks `workspace` in place.
    pub fn exec(&self, workspace: &mut Workspace, progress: &dyn Progress) -> Result<()> {
        let selected = self.validate(workspace.as_matrix().num_histograms())?;
        debug!(
            "MaskBins [{}, {}) on {} ({} spectra selected)",
            self.x_min,
            self.x_max,
            workspace.kind(),
            selected.iter().filter(|&&s| s).count()
        );
        match workspace {
            Workspace::Histogram(ws) => self.mask_histograms(ws, &selected, progress),
            Workspace::Event(ws) => {
                let (x_min, x_max) = (self.x_min, self.x_max);
                let results =
                    for_each_spectrum(ws.event_lists_mut(), self.parallel, progress, |i, list| {
                        if selected[i] {
                            Ok(list.mask_tof(x_min, x_max)?)
                        } else {
                            Ok(0)
                        }
                    })?;
                let status = results.cancellation();
                let masked: usize = results.into_processed().map(|(_, n)| n).sum();
                debug!("MaskBins masked {masked} events");
                status
            }
        }
    }

    /// Masks a copy of `workspace`.
    pub fn run(&self, workspace: &Workspace, progress: &dyn Progress) -> Result<Workspace> {
        let mut output = workspace.clone();
        self.exec(&mut output, progress)?;
        Ok(output)
    }

    fn mask_histograms(
        &self,
        ws: &mut Workspace2D,
        selected: &[bool],
        progress: &dyn Progress,
    ) -> Result<()> {
        let common = if ws.common_bins() && ws.num_histograms() > 0 {
            Some(find_indices(ws.read_x(0)?, self.x_min, self.x_max))
        } else {
            None
        };

        let (x_min, x_max) = (self.x_min, self.x_max);
        let results = for_each_spectrum(ws.spectra_mut(), self.parallel, progress, |i, spectrum| {
            if !selected[i] {
                return Ok(None);
            }
            let bins = common
                .clone()
                .unwrap_or_else(|| find_indices(spectrum.x(), x_min, x_max));
            let (y, e) = spectrum.data_mut();
            y[bins.clone()].fill(0.0);
            e[bins.clone()].fill(0.0);
            Ok(Some(bins))
        })?;

        let status = results.cancellation();
        for (index, bins) in results.into_processed() {
            for bin in bins.into_iter().flatten() {
                ws.flag_masked(index, bin, 1.0)?;
            }
        }
        status
    }
}

/// Bins of `x` overlapping `[x_min, x_max)`.
///
/// The start is the bin containing `x_min` (clamped to the first bin); the
/// end is the first edge not below `x_max`, clamped to the last edge.
pub fn find_indices(x: &[f64], x_min: f64, x_max: f64) -> Range<usize> {
    if x.is_empty() {
        return 0..0;
    }
    let start = x.partition_point(|&edge| edge <= x_min).saturating_sub(1);
    let end = x.partition_point(|&edge| edge < x_max).min(x.len() - 1);
    start..end.max(start)
}
