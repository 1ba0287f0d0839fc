//! Rebin: puts every spectrum on a new X axis built from rebin parameters.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tofbin_core::{
    propagate_masks, rebin_to_vec, BinEdges, EventWorkspace, MatrixWorkspace, RebinParams,
    Workspace, Workspace2D,
};

use crate::error::{Error, Result};
use crate::parallel::for_each_spectrum;
use crate::progress::Progress;

/// Rebins histogram or event workspaces onto a common X axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rebin {
    /// `x0, dx1, x1, ...` boundaries and steps.
    pub params: RebinParams,
    /// Keep event workspaces as events (only the binning changes).
    #[serde(default = "crate::default_true")]
    pub preserve_events: bool,
    /// Run the per-spectrum loop on the rayon pool.
    #[serde(default = "crate::default_true")]
    pub parallel: bool,
}

impl Rebin {
    pub fn new(params: RebinParams) -> Self {
        Self {
            params,
            preserve_events: true,
            parallel: true,
        }
    }

    pub fn with_preserve_events(mut self, preserve_events: bool) -> Self {
        self.preserve_events = preserve_events;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Rebins `workspace` in place.
    ///
    /// An event workspace is replaced by a histogram workspace when
    /// `preserve_events` is off. On cancellation the spectra already visited
    /// keep their new binning.
    pub fn exec(&self, workspace: &mut Workspace, progress: &dyn Progress) -> Result<()> {
        let x_new = self.params.create_bin_edges()?;
        debug!(
            "Rebin {} onto {} bins ({})",
            workspace.kind(),
            x_new.len() - 1,
            self.params
        );

        match workspace {
            Workspace::Histogram(ws) => self.rebin_histograms(ws, &x_new, progress),
            Workspace::Event(ws) if self.preserve_events => {
                if progress.is_cancelled() {
                    return Err(Error::Cancelled {
                        processed: 0,
                        total: ws.num_histograms(),
                    });
                }
                ws.sort_all();
                ws.set_all_x(&x_new)?;
                Ok(())
            }
            Workspace::Event(ws) => {
                let histograms = self.histogram_events(ws, &x_new, progress)?;
                info!(
                    "Rebin converted {} event lists to histograms",
                    histograms.num_histograms()
                );
                *workspace = Workspace::Histogram(histograms);
                Ok(())
            }
        }
    }

    /// Rebins a copy of `workspace`.
    pub fn run(&self, workspace: &Workspace, progress: &dyn Progress) -> Result<Workspace> {
        let mut output = workspace.clone();
        self.exec(&mut output, progress)?;
        Ok(output)
    }

    fn rebin_histograms(
        &self,
        ws: &mut Workspace2D,
        x_new: &BinEdges,
        progress: &dyn Progress,
    ) -> Result<()> {
        if !ws.is_histogram_data() {
            return Err(Error::Unsupported(
                "Rebin needs histogram data, not point data".to_string(),
            ));
        }
        let distribution = ws.is_distribution();

        let (spectra, masks) = ws.spectra_and_masks_mut();
        let results = for_each_spectrum(spectra, self.parallel, progress, |i, spectrum| {
            let (y, e) = rebin_to_vec(spectrum.x(), spectrum.y(), spectrum.e(), x_new, distribution)?;
            let new_masks = if masks[i].is_empty() {
                None
            } else {
                Some(propagate_masks(spectrum.x(), &masks[i], x_new)?)
            };
            spectrum.set_data(x_new.clone(), y, e)?;
            Ok(new_masks)
        })?;

        // Mask lists are only written here, after the numeric phase.
        let status = results.cancellation();
        for (index, new_masks) in results.into_processed() {
            if let Some(new_masks) = new_masks {
                ws.set_masked_bins(index, new_masks)?;
            }
        }
        status
    }

    fn histogram_events(
        &self,
        ws: &mut EventWorkspace,
        x_new: &BinEdges,
        progress: &dyn Progress,
    ) -> Result<Workspace2D> {
        ws.sort_all();
        let ws: &EventWorkspace = ws;
        let mut output = Workspace2D::like(ws, ws.num_histograms(), x_new.len(), x_new.len() - 1)?;
        output.set_all_x(x_new)?;

        let results =
            for_each_spectrum(output.spectra_mut(), self.parallel, progress, |i, spectrum| {
                let (y, e) = ws.event_list(i)?.generate_histogram(x_new);
                spectrum.set_data(x_new.clone(), y, e)?;
                Ok(())
            })?;
        results.finish()?;
        Ok(output)
    }
}
