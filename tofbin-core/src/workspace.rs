//! Matrix workspaces: a set of spectra sharing (or not) an X axis.
//!
//! [`MatrixWorkspace`] is the read-only view every algorithm consumes.
//! [`Workspace2D`] stores materialized histograms; the event-based
//! counterpart lives in [`crate::event_workspace`]. [`Workspace`] is the
//! owned sum of both, used to pick the processing path once at entry.

use std::ops::Deref;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event_workspace::EventWorkspace;
use crate::histogram::{BinEdges, Histogram1D};
use crate::mask::{check_weight, MaskList};

/// A spectrum borrowed from a workspace or materialized on demand.
#[derive(Debug, Clone)]
pub enum HistogramRef<'a> {
    /// Stored directly in the workspace.
    Borrowed(&'a Histogram1D),
    /// Generated (and possibly cached) from events.
    Shared(Arc<Histogram1D>),
}

impl Deref for HistogramRef<'_> {
    type Target = Histogram1D;

    fn deref(&self) -> &Histogram1D {
        match self {
            Self::Borrowed(histogram) => histogram,
            Self::Shared(histogram) => histogram,
        }
    }
}

/// Read access shared by histogram and event workspaces.
pub trait MatrixWorkspace: Send + Sync {
    /// Number of spectra.
    fn num_histograms(&self) -> usize;

    /// Number of Y values per spectrum.
    fn blocksize(&self) -> usize;

    /// Returns true if X holds bin edges rather than points.
    fn is_histogram_data(&self) -> bool;

    /// Returns true if Y is per unit X.
    fn is_distribution(&self) -> bool;

    /// X handle of spectrum `index`.
    fn x(&self, index: usize) -> Result<BinEdges>;

    /// Spectrum `index` as X/Y/E.
    fn histogram(&self, index: usize) -> Result<HistogramRef<'_>>;

    /// Masked bins of spectrum `index`, if the workspace tracks any.
    fn masked_bins(&self, index: usize) -> Option<&MaskList>;

    /// Unit label of the X axis.
    fn x_unit(&self) -> &str;

    /// Unit label of the Y values.
    fn y_unit(&self) -> &str;

    /// Returns true if spectrum `index` has masked bins.
    fn has_masked_bins(&self, index: usize) -> bool {
        self.masked_bins(index).is_some_and(|masks| !masks.is_empty())
    }

    /// Returns true if every spectrum has the same X values.
    fn common_bins(&self) -> bool {
        let Ok(first) = self.x(0) else {
            return true;
        };
        (1..self.num_histograms()).all(|i| self.x(i).is_ok_and(|x| x == first))
    }
}

pub(crate) fn check_index(what: &'static str, index: usize, size: usize) -> Result<()> {
    if index < size {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { what, index, size })
    }
}

/// A workspace of materialized histograms.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace2D {
    spectra: Vec<Histogram1D>,
    masks: Vec<MaskList>,
    distribution: bool,
    x_unit: String,
    y_unit: String,
}

impl Workspace2D {
    /// Creates `n_spectra` zeroed spectra sharing one zeroed X vector.
    pub fn new(n_spectra: usize, x_len: usize, y_len: usize) -> Result<Self> {
        let x = BinEdges::zeros(x_len);
        let spectra = (0..n_spectra)
            .map(|_| Histogram1D::zeroed(x.clone(), y_len))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_spectra(spectra))
    }

    /// Wraps existing spectra.
    #[must_use]
    pub fn from_spectra(spectra: Vec<Histogram1D>) -> Self {
        let masks = vec![MaskList::new(); spectra.len()];
        Self {
            spectra,
            masks,
            distribution: false,
            x_unit: "TOF".to_string(),
            y_unit: "Counts".to_string(),
        }
    }

    /// Creates a zeroed workspace carrying the metadata of `parent`.
    ///
    /// Units and the distribution flag are copied; data and masks are not.
    pub fn like(
        parent: &dyn MatrixWorkspace,
        n_spectra: usize,
        x_len: usize,
        y_len: usize,
    ) -> Result<Self> {
        let mut workspace = Self::new(n_spectra, x_len, y_len)?;
        workspace.distribution = parent.is_distribution();
        workspace.x_unit = parent.x_unit().to_string();
        workspace.y_unit = parent.y_unit().to_string();
        Ok(workspace)
    }

    /// All spectra.
    #[must_use]
    pub fn spectra(&self) -> &[Histogram1D] {
        &self.spectra
    }

    /// All spectra, mutably.
    pub fn spectra_mut(&mut self) -> &mut [Histogram1D] {
        &mut self.spectra
    }

    /// Spectra (mutable) alongside their mask lists (read-only).
    ///
    /// Lets a parallel loop rewrite every spectrum while still reading the
    /// masks; masks are only written afterwards through `&mut self`.
    pub fn spectra_and_masks_mut(&mut self) -> (&mut [Histogram1D], &[MaskList]) {
        (&mut self.spectra, &self.masks)
    }

    /// Spectrum `index`.
    pub fn spectrum(&self, index: usize) -> Result<&Histogram1D> {
        check_index("spectrum", index, self.spectra.len())?;
        Ok(&self.spectra[index])
    }

    /// Spectrum `index`, mutably.
    pub fn spectrum_mut(&mut self, index: usize) -> Result<&mut Histogram1D> {
        check_index("spectrum", index, self.spectra.len())?;
        Ok(&mut self.spectra[index])
    }

    /// X values of spectrum `index`.
    pub fn read_x(&self, index: usize) -> Result<&[f64]> {
        Ok(self.spectrum(index)?.x().values())
    }

    /// Y values of spectrum `index`.
    pub fn read_y(&self, index: usize) -> Result<&[f64]> {
        Ok(self.spectrum(index)?.y())
    }

    /// E values of spectrum `index`.
    pub fn read_e(&self, index: usize) -> Result<&[f64]> {
        Ok(self.spectrum(index)?.e())
    }

    /// Replaces the X handle of one spectrum.
    pub fn set_x(&mut self, index: usize, x: BinEdges) -> Result<()> {
        self.spectrum_mut(index)?.set_x(x)
    }

    /// Points every spectrum at the same X handle.
    pub fn set_all_x(&mut self, x: &BinEdges) -> Result<()> {
        for spectrum in &mut self.spectra {
            spectrum.set_x(x.clone())?;
        }
        Ok(())
    }

    /// Sets the distribution flag.
    pub fn set_distribution(&mut self, distribution: bool) {
        self.distribution = distribution;
    }

    /// Sets the X unit label.
    pub fn set_x_unit(&mut self, unit: impl Into<String>) {
        self.x_unit = unit.into();
    }

    /// Sets the Y unit label.
    pub fn set_y_unit(&mut self, unit: impl Into<String>) {
        self.y_unit = unit.into();
    }

    /// Masks a bin: Y and E are scaled by `1 - weight` and the weight is
    /// recorded.
    ///
    /// Takes `&mut self`, so mask metadata is never written from a parallel
    /// loop.
    pub fn mask_bin(&mut self, index: usize, bin: usize, weight: f64) -> Result<()> {
        check_index("spectrum", index, self.spectra.len())?;
        check_index("bin", bin, self.spectra[index].len())?;
        check_weight(weight)?;
        self.masks[index].flag(bin, weight)?;
        let (y, e) = self.spectra[index].data_mut();
        y[bin] *= 1.0 - weight;
        e[bin] *= 1.0 - weight;
        Ok(())
    }

    /// Records a mask weight without touching the data.
    pub fn flag_masked(&mut self, index: usize, bin: usize, weight: f64) -> Result<()> {
        check_index("spectrum", index, self.spectra.len())?;
        check_index("bin", bin, self.spectra[index].len())?;
        self.masks[index].flag(bin, weight)
    }

    /// Replaces the mask list of one spectrum.
    pub fn set_masked_bins(&mut self, index: usize, masks: MaskList) -> Result<()> {
        check_index("spectrum", index, self.masks.len())?;
        self.masks[index] = masks;
        Ok(())
    }

    /// Removes every mask.
    pub fn clear_masks(&mut self) {
        for masks in &mut self.masks {
            masks.clear();
        }
    }

    /// Sum of all Y values.
    #[must_use]
    pub fn total_signal(&self) -> f64 {
        self.spectra.iter().flat_map(|s| s.y().iter()).sum()
    }
}

impl MatrixWorkspace for Workspace2D {
    fn num_histograms(&self) -> usize {
        self.spectra.len()
    }

    fn blocksize(&self) -> usize {
        self.spectra.first().map_or(0, Histogram1D::len)
    }

    fn is_histogram_data(&self) -> bool {
        self.spectra
            .first()
            .map_or(true, Histogram1D::is_histogram_data)
    }

    fn is_distribution(&self) -> bool {
        self.distribution
    }

    fn x(&self, index: usize) -> Result<BinEdges> {
        Ok(self.spectrum(index)?.x().clone())
    }

    fn histogram(&self, index: usize) -> Result<HistogramRef<'_>> {
        Ok(HistogramRef::Borrowed(self.spectrum(index)?))
    }

    fn masked_bins(&self, index: usize) -> Option<&MaskList> {
        self.masks.get(index)
    }

    fn x_unit(&self) -> &str {
        &self.x_unit
    }

    fn y_unit(&self) -> &str {
        &self.y_unit
    }

    fn common_bins(&self) -> bool {
        let Some(first) = self.spectra.first() else {
            return true;
        };
        self.spectra.iter().all(|s| s.x() == first.x())
    }
}

/// An owned workspace of either kind.
#[derive(Debug, Clone)]
pub enum Workspace {
    /// Materialized histograms.
    Histogram(Workspace2D),
    /// Per-pixel event lists.
    Event(EventWorkspace),
}

impl Workspace {
    /// Returns true for event workspaces.
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// Read-only matrix view.
    #[must_use]
    pub fn as_matrix(&self) -> &dyn MatrixWorkspace {
        match self {
            Self::Histogram(ws) => ws,
            Self::Event(ws) => ws,
        }
    }

    /// Short name of the workspace kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Histogram(_) => "Workspace2D",
            Self::Event(_) => "EventWorkspace",
        }
    }
}

impl From<Workspace2D> for Workspace {
    fn from(ws: Workspace2D) -> Self {
        Self::Histogram(ws)
    }
}

impl From<EventWorkspace> for Workspace {
    fn from(ws: EventWorkspace) -> Self {
        Self::Event(ws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Workspace2D {
        let x = BinEdges::linear(0.0, 1.0, 5);
        let spectra = (0..2)
            .map(|_| {
                Histogram1D::new(x.clone(), vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![1.0; 5]).unwrap()
            })
            .collect();
        Workspace2D::from_spectra(spectra)
    }

    #[test]
    fn test_new_shares_x() {
        let ws = Workspace2D::new(3, 11, 10).unwrap();
        assert_eq!(ws.num_histograms(), 3);
        assert_eq!(ws.blocksize(), 10);
        assert!(ws.is_histogram_data());
        assert!(ws.spectra()[0].x().same_as(ws.spectra()[2].x()));
        assert!(ws.common_bins());
    }

    #[test]
    fn test_mask_bin_scales_and_records() {
        let mut ws = sample();
        ws.mask_bin(1, 2, 1.0).unwrap();
        ws.mask_bin(1, 3, 0.25).unwrap();
        assert_eq!(ws.read_y(1).unwrap(), &[1.0, 2.0, 0.0, 3.0, 5.0]);
        assert_relative_eq!(ws.read_e(1).unwrap()[3], 0.75);
        assert!(ws.has_masked_bins(1));
        assert!(!ws.has_masked_bins(0));
        assert_relative_eq!(ws.masked_bins(1).unwrap().weight(3).unwrap(), 0.25);
    }

    #[test]
    fn test_mask_bin_rejects_bad_input() {
        let mut ws = sample();
        assert!(ws.mask_bin(2, 0, 1.0).is_err());
        assert!(ws.mask_bin(0, 5, 1.0).is_err());
        assert!(ws.mask_bin(0, 0, 0.0).is_err());
        assert!(!ws.has_masked_bins(0));
    }

    #[test]
    fn test_like_copies_metadata_only() {
        let mut parent = sample();
        parent.set_distribution(true);
        parent.set_x_unit("DeltaE");
        parent.mask_bin(0, 0, 1.0).unwrap();
        let child = Workspace2D::like(&parent, 4, 3, 2).unwrap();
        assert!(child.is_distribution());
        assert_eq!(child.x_unit(), "DeltaE");
        assert_eq!(child.num_histograms(), 4);
        assert!(!child.has_masked_bins(0));
    }

    #[test]
    fn test_common_bins_detects_different_x() {
        let mut ws = sample();
        assert!(ws.common_bins());
        ws.set_x(1, BinEdges::linear(0.0, 2.0, 5)).unwrap();
        assert!(!ws.common_bins());
        assert!(ws.set_x(1, BinEdges::linear(0.0, 2.0, 6)).is_err());
    }
}
