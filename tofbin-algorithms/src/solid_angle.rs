//! SolidAngle: solid angle of each spectrum's detector seen from the sample.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tofbin_core::{BinEdges, MatrixWorkspace, Workspace2D};

use crate::error::Result;
use crate::instrument::Instrument;
use crate::parallel::for_each_spectrum;
use crate::progress::Progress;

/// Produces a one-bin workspace holding the solid angle of every spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidAngle {
    #[serde(default = "crate::default_true")]
    pub parallel: bool,
}

impl Default for SolidAngle {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Detector lookups of one SolidAngle run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolidAngleSummary {
    /// Spectra whose detector is masked.
    pub masked: usize,
    /// Spectra without a detector.
    pub missing: usize,
}

enum Lookup {
    Found,
    Masked,
    Missing,
}

impl SolidAngle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Computes solid angles for `input`'s spectra. Masked detectors get 0;
    /// spectra without a detector also get 0 and are reported once.
    pub fn exec(
        &self,
        input: &dyn MatrixWorkspace,
        instrument: &dyn Instrument,
        progress: &dyn Progress,
    ) -> Result<(Workspace2D, SolidAngleSummary)> {
        let n_spectra = input.num_histograms();
        let mut output = Workspace2D::like(input, n_spectra, 2, 1)?;
        output.set_y_unit("Steradian");
        output.set_distribution(false);

        let shared = if input.common_bins() && n_spectra > 0 {
            Some(range_of(&input.x(0)?))
        } else {
            None
        };
        if let Some(x) = &shared {
            output.set_all_x(x)?;
        }

        let sample = instrument.sample_position();
        debug!("SolidAngle for {n_spectra} spectra");
        let results = for_each_spectrum(output.spectra_mut(), self.parallel, progress, |i, spectrum| {
            let x = match &shared {
                Some(x) => x.clone(),
                None => range_of(&input.x(i)?),
            };
            let (omega, lookup) = match instrument.detector(i) {
                Some(detector) if detector.masked => (0.0, Lookup::Masked),
                Some(detector) => (detector.solid_angle(sample), Lookup::Found),
                None => (0.0, Lookup::Missing),
            };
            spectrum.set_data(x, vec![omega], vec![0.0])?;
            Ok(lookup)
        })?;

        let summary = results
            .finish()?
            .into_iter()
            .fold(SolidAngleSummary::default(), |mut summary, lookup| {
                match lookup {
                    Lookup::Found => {}
                    Lookup::Masked => summary.masked += 1,
                    Lookup::Missing => summary.missing += 1,
                }
                summary
            });
        if summary.missing > 0 {
            warn!(
                "SolidAngle: {} spectra have no detector, solid angle set to 0",
                summary.missing
            );
        }
        Ok((output, summary))
    }
}

/// First and last X value as a one-bin axis.
fn range_of(x: &[f64]) -> BinEdges {
    match (x.first(), x.last()) {
        (Some(&first), Some(&last)) => BinEdges::new(vec![first, last]),
        _ => BinEdges::zeros(2),
    }
}
