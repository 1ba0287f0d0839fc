//! CorrectKiKf: multiplies energy-transfer spectra by ki/kf.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tofbin_core::{MatrixWorkspace, Workspace};

use crate::error::{Error, Result};
use crate::parallel::for_each_spectrum;
use crate::progress::Progress;

/// Spectrometer geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyMode {
    /// Fixed incident energy.
    Direct,
    /// Fixed final energy.
    Indirect,
}

/// ki/kf correction for workspaces in energy transfer (meV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectKiKf {
    pub emode: EnergyMode,
    /// Fixed energy in meV.
    pub efixed: f64,
    #[serde(default = "crate::default_true")]
    pub parallel: bool,
}

impl CorrectKiKf {
    pub fn new(emode: EnergyMode, efixed: f64) -> Self {
        Self {
            emode,
            efixed,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// `sqrt(Ei / Ef)` at energy transfer `delta_e`, or 0 when either
    /// energy is not positive.
    pub fn factor(&self, delta_e: f64) -> f64 {
        let (ei, ef) = match self.emode {
            EnergyMode::Direct => (self.efixed, self.efixed - delta_e),
            EnergyMode::Indirect => (self.efixed + delta_e, self.efixed),
        };
        if ei <= 0.0 || ef <= 0.0 {
            0.0
        } else {
            (ei / ef).sqrt()
        }
    }

    /// Applies the correction in place. Event workspaces are rejected
    /// before anything is touched.
    pub fn exec(&self, workspace: &mut Workspace, progress: &dyn Progress) -> Result<()> {
        if !(self.efixed.is_finite() && self.efixed > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "EFixed must be positive, got {}",
                self.efixed
            )));
        }
        let ws = match workspace {
            Workspace::Histogram(ws) => ws,
            Workspace::Event(_) => {
                return Err(Error::Unsupported(
                    "CorrectKiKf does not support event workspaces".to_string(),
                ))
            }
        };
        debug!(
            "CorrectKiKf ({:?}, EFixed = {} meV) on {} spectra",
            self.emode,
            self.efixed,
            ws.num_histograms()
        );

        let results = for_each_spectrum(ws.spectra_mut(), self.parallel, progress, |_, spectrum| {
            let energies = if spectrum.is_histogram_data() {
                spectrum.x().centres()
            } else {
                spectrum.x().to_vec()
            };
            let mut negative = false;
            let (y, e) = spectrum.data_mut();
            for ((value, error), delta_e) in y.iter_mut().zip(e.iter_mut()).zip(energies) {
                let factor = self.factor(delta_e);
                negative |= factor <= 0.0;
                *value *= factor;
                *error *= factor;
            }
            Ok(negative)
        })?;
        let status = results.cancellation();
        let negative = results.into_processed().any(|(_, flag)| flag);
        if negative {
            warn!("CorrectKiKf: ki/kf set to 0 where Ei or Ef is not positive");
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use approx::assert_relative_eq;
    use tofbin_core::{BinEdges, EventWorkspace, Histogram1D, Workspace2D};

    #[test]
    fn test_factor() {
        let direct = CorrectKiKf::new(EnergyMode::Direct, 10.0);
        assert_relative_eq!(direct.factor(0.0), 1.0);
        assert_relative_eq!(direct.factor(5.0), 2.0_f64.sqrt());
        assert_eq!(direct.factor(10.0), 0.0);

        let indirect = CorrectKiKf::new(EnergyMode::Indirect, 4.0);
        assert_relative_eq!(indirect.factor(12.0), 2.0);
        assert_eq!(indirect.factor(-5.0), 0.0);
    }

    #[test]
    fn test_uses_bin_centres() {
        let x = BinEdges::new(vec![4.0, 6.0, 8.0]);
        let spectrum = Histogram1D::new(x, vec![1.0, 1.0], vec![1.0, 1.0]).unwrap();
        let mut ws = Workspace::from(Workspace2D::from_spectra(vec![spectrum]));
        CorrectKiKf::new(EnergyMode::Direct, 10.0)
            .exec(&mut ws, &NullProgress)
            .unwrap();
        let Workspace::Histogram(ws) = ws else {
            panic!("expected a histogram workspace");
        };
        assert_relative_eq!(ws.read_y(0).unwrap()[0], 2.0_f64.sqrt());
        assert_relative_eq!(ws.read_y(0).unwrap()[1], (10.0_f64 / 3.0).sqrt());
    }

    #[test]
    fn test_zeroes_bins_without_positive_final_energy() {
        // Centres 5, 7, 10, 13: Ef = 5, 3, 0, -3 at EFixed = 10.
        let x = BinEdges::new(vec![4.0, 6.0, 8.0, 12.0, 14.0]);
        let spectra = (0..2)
            .map(|_| Histogram1D::new(x.clone(), vec![1.0, 3.0, 2.0, 4.0], vec![1.0; 4]).unwrap())
            .collect();
        let mut ws = Workspace::from(Workspace2D::from_spectra(spectra));
        CorrectKiKf::new(EnergyMode::Direct, 10.0)
            .exec(&mut ws, &NullProgress)
            .unwrap();
        let Workspace::Histogram(ws) = ws else {
            panic!("expected a histogram workspace");
        };
        for i in 0..2 {
            let y = ws.read_y(i).unwrap();
            let e = ws.read_e(i).unwrap();
            assert_relative_eq!(y[0], 2.0_f64.sqrt());
            assert_relative_eq!(y[1], 3.0 * (10.0_f64 / 3.0).sqrt());
            assert_eq!(&y[2..], &[0.0, 0.0]);
            assert_relative_eq!(e[0], 2.0_f64.sqrt());
            assert_eq!(&e[2..], &[0.0, 0.0]);
        }
    }

    #[test]
    fn test_event_workspace_is_unsupported() {
        let events = EventWorkspace::new(1, BinEdges::linear(0.0, 1.0, 2)).unwrap();
        let mut ws = Workspace::from(events);
        let result = CorrectKiKf::new(EnergyMode::Direct, 10.0).exec(&mut ws, &NullProgress);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_rejects_non_positive_efixed() {
        let mut ws = Workspace::from(Workspace2D::new(1, 3, 2).unwrap());
        let result = CorrectKiKf::new(EnergyMode::Indirect, 0.0).exec(&mut ws, &NullProgress);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}
