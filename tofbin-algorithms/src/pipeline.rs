//! Reduction pipelines: a JSON list of algorithm steps applied in order.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use tofbin_core::{MatrixWorkspace, Workspace, Workspace2D};

use crate::correct_ki_kf::CorrectKiKf;
use crate::error::{Error, Result};
use crate::flat_background::FlatBackground;
use crate::instrument::Instrument;
use crate::mask_bins::MaskBins;
use crate::progress::Progress;
use crate::rebin::Rebin;
use crate::smooth_data::SmoothData;
use crate::solid_angle::SolidAngle;

/// One pipeline step, tagged by `"algorithm"` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Step {
    Rebin(Rebin),
    MaskBins(MaskBins),
    SmoothData(SmoothData),
    FlatBackground(FlatBackground),
    CorrectKiKf(CorrectKiKf),
    SolidAngle(SolidAngle),
}

impl Step {
    /// Algorithm name as used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rebin(_) => "Rebin",
            Self::MaskBins(_) => "MaskBins",
            Self::SmoothData(_) => "SmoothData",
            Self::FlatBackground(_) => "FlatBackground",
            Self::CorrectKiKf(_) => "CorrectKiKf",
            Self::SolidAngle(_) => "SolidAngle",
        }
    }
}

/// A reduction recipe.
///
/// ```json
/// {
///   "name": "demo",
///   "steps": [
///     { "algorithm": "rebin", "params": [0, 100, 20000] },
///     { "algorithm": "mask_bins", "x_min": 0, "x_max": 500 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReductionConfig {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}

impl ReductionConfig {
    /// Loads a pipeline from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses a pipeline from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks what can be checked without a workspace.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::Config("pipeline has no steps".to_string()));
        }
        Ok(())
    }

    /// Returns true if a step needs instrument geometry.
    pub fn needs_instrument(&self) -> bool {
        self.steps.iter().any(|step| matches!(step, Step::SolidAngle(_)))
    }
}

/// What one step produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: &'static str,
    pub workspace: &'static str,
    pub num_histograms: usize,
    pub blocksize: usize,
}

/// Final workspace and per-step reports.
#[derive(Debug)]
pub struct PipelineOutput {
    pub workspace: Workspace,
    pub reports: Vec<StepReport>,
}

/// Runs every step of `config` on `workspace`.
///
/// `flat_background` and `correct_ki_kf` convert an event workspace to
/// histograms before running; the other steps accept either kind.
pub fn run_pipeline(
    mut workspace: Workspace,
    config: &ReductionConfig,
    instrument: Option<&dyn Instrument>,
    progress: &dyn Progress,
) -> Result<PipelineOutput> {
    config.validate()?;
    if config.needs_instrument() && instrument.is_none() {
        return Err(Error::Config(
            "solid_angle step requires an instrument".to_string(),
        ));
    }

    let mut reports = Vec::with_capacity(config.steps.len());
    for step in &config.steps {
        info!("running {}", step.name());
        match step {
            Step::Rebin(rebin) => rebin.exec(&mut workspace, progress)?,
            Step::MaskBins(mask) => mask.exec(&mut workspace, progress)?,
            Step::CorrectKiKf(correct) => {
                let mut histograms = Workspace::from(into_histograms(workspace)?);
                correct.exec(&mut histograms, progress)?;
                workspace = histograms;
            }
            Step::SmoothData(smooth) => {
                workspace = smooth.exec(workspace.as_matrix(), progress)?.into();
            }
            Step::FlatBackground(background) => {
                let mut histograms = into_histograms(workspace)?;
                let summary = background.exec(&mut histograms, progress)?;
                info!(
                    "FlatBackground corrected {} spectra ({} out of range)",
                    summary.corrected, summary.out_of_range
                );
                workspace = histograms.into();
            }
            Step::SolidAngle(solid_angle) => {
                if let Some(instrument) = instrument {
                    let (output, summary) =
                        solid_angle.exec(workspace.as_matrix(), instrument, progress)?;
                    info!(
                        "SolidAngle: {} masked and {} missing detectors",
                        summary.masked, summary.missing
                    );
                    workspace = output.into();
                }
            }
        }
        let matrix = workspace.as_matrix();
        reports.push(StepReport {
            step: step.name(),
            workspace: workspace.kind(),
            num_histograms: matrix.num_histograms(),
            blocksize: matrix.blocksize(),
        });
    }
    Ok(PipelineOutput { workspace, reports })
}

fn into_histograms(workspace: Workspace) -> Result<Workspace2D> {
    match workspace {
        Workspace::Histogram(ws) => Ok(ws),
        Workspace::Event(ws) => {
            info!("converting {} event lists to histograms", ws.num_histograms());
            Ok(ws.to_workspace2d()?)
        }
    }
}
