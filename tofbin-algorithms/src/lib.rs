//! tofbin-algorithms: workspace algorithms for time-of-flight data.
//!
//! - **Rebin** - conservative rebinning of histograms and event workspaces
//! - **MaskBins** - masking of an X range
//! - **SmoothData** - moving-average smoothing
//! - **FlatBackground** - constant or linear background subtraction
//! - **CorrectKiKf** - ki/kf correction of energy-transfer spectra
//! - **SolidAngle** - detector solid angles
//!
//! Every algorithm is a plain config struct with an `exec` method; the
//! [`pipeline`] module chains them from a JSON recipe.

mod correct_ki_kf;
mod error;
mod flat_background;
pub mod instrument;
mod mask_bins;
pub mod parallel;
pub mod pipeline;
pub mod progress;
mod rebin;
mod smooth_data;
mod solid_angle;

pub use correct_ki_kf::{CorrectKiKf, EnergyMode};
pub use error::{Error, Result};
pub use flat_background::{BackgroundMode, BackgroundSummary, FlatBackground};
pub use instrument::{Detector, Instrument, SimpleInstrument};
pub use mask_bins::{find_indices, MaskBins};
pub use pipeline::{run_pipeline, PipelineOutput, ReductionConfig, Step, StepReport};
pub use progress::{CancellationToken, NullProgress, Progress};
pub use rebin::Rebin;
pub use smooth_data::{moving_average, SmoothData};
pub use solid_angle::{SolidAngle, SolidAngleSummary};

// Re-export the data model
pub use tofbin_core::{EventWorkspace, MatrixWorkspace, RebinParams, Workspace, Workspace2D};

pub(crate) fn default_true() -> bool {
    true
}
