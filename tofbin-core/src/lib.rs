//! tofbin-core: event lists, histograms and workspaces for time-of-flight
//! neutron data.
//!
//! This crate provides the data model (events, event lists, bin edges,
//! histograms, masks, matrix workspaces) and the numeric kernels shared by
//! every algorithm: histogramming of events and conservative rebinning.
//!

pub mod bin_params;
pub mod error;
pub mod event;
pub mod event_list;
pub mod event_workspace;
pub mod histogram;
pub mod mask;
pub mod mru;
pub mod rebin;
pub mod workspace;

pub use bin_params::RebinParams;
pub use error::{Error, Result};
pub use event::{Event, EventType, PulseTime, TofEvent, WeightedEvent, WeightedEventNoTime};
pub use event_list::{EventList, EventStorage, SortOrder};
pub use event_workspace::EventWorkspace;
pub use histogram::{BinEdges, BinEdgesId, Histogram1D};
pub use mask::{propagate_masks, MaskList};
pub use mru::MruList;
pub use rebin::{finalize_addition, rebin, rebin_to_vec};
pub use workspace::{HistogramRef, MatrixWorkspace, Workspace, Workspace2D};
