//! Event workspaces: one [`EventList`] per spectrum, histogrammed on demand.
//!
//! Histograms generated for a spectrum are cached in a most-recently-used
//! list keyed by `(spectrum index, bin edges identity)`. Any operation that
//! changes the events or the binning through `&mut self` invalidates the
//! affected entries.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::event::TofEvent;
use crate::event_list::EventList;
use crate::histogram::{BinEdges, BinEdgesId, Histogram1D};
use crate::mask::MaskList;
use crate::mru::{MruList, DEFAULT_MRU_CAPACITY};
use crate::workspace::{check_index, HistogramRef, MatrixWorkspace, Workspace2D};

type HistogramCache = MruList<(usize, BinEdgesId), Arc<Histogram1D>>;

/// A workspace of per-pixel event lists.
pub struct EventWorkspace {
    lists: Vec<EventList>,
    x: Vec<BinEdges>,
    mru: Mutex<HistogramCache>,
    x_unit: String,
}

impl EventWorkspace {
    /// Creates `n_spectra` empty lists sharing the bin edges `x`.
    pub fn new(n_spectra: usize, x: BinEdges) -> Result<Self> {
        Self::from_event_lists(vec![EventList::new(); n_spectra], x)
    }

    /// Wraps existing lists, all binned on `x`.
    pub fn from_event_lists(lists: Vec<EventList>, x: BinEdges) -> Result<Self> {
        check_edges(&x)?;
        let n = lists.len();
        Ok(Self {
            lists,
            x: vec![x; n],
            mru: Mutex::new(MruList::new(DEFAULT_MRU_CAPACITY)),
            x_unit: "TOF".to_string(),
        })
    }

    /// Sets the maximum number of cached histograms (clears the cache).
    pub fn set_mru_capacity(&mut self, capacity: usize) {
        *self.cache_mut() = MruList::new(capacity);
    }

    /// Number of cached histograms.
    #[must_use]
    pub fn mru_len(&self) -> usize {
        self.cache().len()
    }

    /// Drops every cached histogram.
    pub fn clear_mru(&self) {
        self.cache().clear();
        debug!("cleared event workspace histogram cache");
    }

    /// Event list of spectrum `index`.
    pub fn event_list(&self, index: usize) -> Result<&EventList> {
        check_index("spectrum", index, self.lists.len())?;
        Ok(&self.lists[index])
    }

    /// Event list of spectrum `index`, mutably.
    ///
    /// Cached histograms of that spectrum are dropped.
    pub fn event_list_mut(&mut self, index: usize) -> Result<&mut EventList> {
        check_index("spectrum", index, self.lists.len())?;
        self.cache_mut().remove_if(|&(i, _)| i == index);
        Ok(&mut self.lists[index])
    }

    /// All event lists.
    #[must_use]
    pub fn event_lists(&self) -> &[EventList] {
        &self.lists
    }

    /// All event lists, mutably. The whole cache is dropped.
    pub fn event_lists_mut(&mut self) -> &mut [EventList] {
        self.cache_mut().clear();
        &mut self.lists
    }

    /// Appends an event to spectrum `index` without keeping it sorted.
    pub fn add_event_quickly(&mut self, index: usize, event: TofEvent) -> Result<()> {
        self.event_list_mut(index)?.add_event_quickly(event);
        Ok(())
    }

    /// Sorts every list by time-of-flight, in parallel.
    pub fn sort_all(&mut self) {
        self.lists.par_iter_mut().for_each(EventList::sort_tof);
    }

    /// Total number of events.
    #[must_use]
    pub fn number_events(&self) -> usize {
        self.lists.iter().map(EventList::number_events).sum()
    }

    /// Bin edges of spectrum `index`.
    pub fn read_x(&self, index: usize) -> Result<&BinEdges> {
        check_index("spectrum", index, self.x.len())?;
        Ok(&self.x[index])
    }

    /// Rebins one spectrum onto new edges.
    pub fn set_x(&mut self, index: usize, x: BinEdges) -> Result<()> {
        check_index("spectrum", index, self.x.len())?;
        check_edges(&x)?;
        self.cache_mut().remove_if(|&(i, _)| i == index);
        self.x[index] = x;
        Ok(())
    }

    /// Rebins every spectrum onto the same new edges.
    pub fn set_all_x(&mut self, x: &BinEdges) -> Result<()> {
        check_edges(x)?;
        for edges in &mut self.x {
            *edges = x.clone();
        }
        self.cache_mut().clear();
        Ok(())
    }

    /// Sets the X unit label.
    pub fn set_x_unit(&mut self, unit: impl Into<String>) {
        self.x_unit = unit.into();
    }

    /// Histogram of spectrum `index` on its current edges.
    ///
    /// Served from the cache when possible; otherwise generated from the
    /// events (without mutating them) and cached.
    pub fn cached_histogram(&self, index: usize) -> Result<Arc<Histogram1D>> {
        check_index("spectrum", index, self.lists.len())?;
        let x = &self.x[index];
        let key = (index, x.id());
        if let Some(hit) = self.cache().get(&key) {
            return Ok(hit);
        }

        let (y, e) = self.lists[index].generate_histogram(x);
        let histogram = Arc::new(Histogram1D::new(x.clone(), y, e)?);
        self.cache().insert(key, Arc::clone(&histogram));
        Ok(histogram)
    }

    /// Histogram of spectrum `index` on arbitrary edges (not cached).
    pub fn histogram_on(&self, index: usize, edges: &BinEdges) -> Result<Histogram1D> {
        check_edges(edges)?;
        let (y, e) = self.event_list(index)?.generate_histogram(edges);
        Histogram1D::new(edges.clone(), y, e)
    }

    /// Materializes every spectrum into a histogram workspace, in parallel.
    pub fn to_workspace2d(&self) -> Result<Workspace2D> {
        let spectra = (0..self.lists.len())
            .into_par_iter()
            .map(|i| {
                let (y, e) = self.lists[i].generate_histogram(&self.x[i]);
                Histogram1D::new(self.x[i].clone(), y, e)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut workspace = Workspace2D::from_spectra(spectra);
        workspace.set_x_unit(self.x_unit.clone());
        Ok(workspace)
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, HistogramCache> {
        self.mru.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_mut(&mut self) -> &mut HistogramCache {
        self.mru.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

fn check_edges(x: &BinEdges) -> Result<()> {
    if x.len() < 2 {
        return Err(Error::InvalidArgument(format!(
            "event workspaces need at least two bin edges, got {}",
            x.len()
        )));
    }
    if !x.is_strictly_increasing() {
        return Err(Error::InvalidArgument(
            "bin edges must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

impl Clone for EventWorkspace {
    /// Clones the events and binning; the copy starts with an empty cache.
    fn clone(&self) -> Self {
        Self {
            lists: self.lists.clone(),
            x: self.x.clone(),
            mru: Mutex::new(MruList::new(self.cache().capacity())),
            x_unit: self.x_unit.clone(),
        }
    }
}

impl fmt::Debug for EventWorkspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWorkspace")
            .field("spectra", &self.lists.len())
            .field("events", &self.number_events())
            .field("cached", &self.mru_len())
            .field("x_unit", &self.x_unit)
            .finish()
    }
}

impl MatrixWorkspace for EventWorkspace {
    fn num_histograms(&self) -> usize {
        self.lists.len()
    }

    fn blocksize(&self) -> usize {
        self.x.first().map_or(0, |x| x.len() - 1)
    }

    fn is_histogram_data(&self) -> bool {
        true
    }

    fn is_distribution(&self) -> bool {
        false
    }

    fn x(&self, index: usize) -> Result<BinEdges> {
        self.read_x(index).cloned()
    }

    fn histogram(&self, index: usize) -> Result<HistogramRef<'_>> {
        self.cached_histogram(index).map(HistogramRef::Shared)
    }

    fn masked_bins(&self, _index: usize) -> Option<&MaskList> {
        None
    }

    fn x_unit(&self) -> &str {
        &self.x_unit
    }

    fn y_unit(&self) -> &str {
        "Counts"
    }

    fn common_bins(&self) -> bool {
        let Some(first) = self.x.first() else {
            return true;
        };
        self.x.iter().all(|x| x == first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PulseTime;

    fn workspace() -> EventWorkspace {
        let x = BinEdges::linear(0.0, 1.0, 4);
        let mut ws = EventWorkspace::new(2, x).unwrap();
        for (i, tof) in [0.5, 1.5, 1.5, 2.5, 3.5].into_iter().enumerate() {
            ws.add_event_quickly(i % 2, TofEvent::new(tof, PulseTime::new(0)))
                .unwrap();
        }
        ws
    }

    #[test]
    fn test_histograms_are_cached_per_binning() {
        let ws = workspace();
        let first = ws.cached_histogram(0).unwrap();
        let again = ws.cached_histogram(0).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.y(), &[1.0, 1.0, 0.0, 1.0]);
        assert_eq!(ws.mru_len(), 1);
    }

    #[test]
    fn test_set_all_x_invalidates_cache() {
        let mut ws = workspace();
        let before = ws.cached_histogram(1).unwrap();
        assert_eq!(before.y(), &[0.0, 1.0, 1.0, 0.0]);
        ws.set_all_x(&BinEdges::new(vec![0.0, 2.0, 4.0])).unwrap();
        assert_eq!(ws.mru_len(), 0);
        let after = ws.cached_histogram(1).unwrap();
        assert_eq!(after.y(), &[1.0, 1.0]);
        assert_eq!(ws.blocksize(), 2);
    }

    #[test]
    fn test_event_list_mut_drops_only_that_spectrum() {
        let mut ws = workspace();
        ws.cached_histogram(0).unwrap();
        ws.cached_histogram(1).unwrap();
        ws.event_list_mut(0).unwrap().clear();
        assert_eq!(ws.mru_len(), 1);
        assert_eq!(ws.cached_histogram(0).unwrap().y(), &[0.0; 4]);
    }

    #[test]
    fn test_to_workspace2d_matches_cached_histograms() {
        let mut ws = workspace();
        ws.sort_all();
        let materialized = ws.to_workspace2d().unwrap();
        for i in 0..2 {
            assert_eq!(
                materialized.read_y(i).unwrap(),
                ws.cached_histogram(i).unwrap().y()
            );
        }
        assert_eq!(ws.number_events(), 5);
    }

    #[test]
    fn test_rejects_non_increasing_edges() {
        assert!(EventWorkspace::new(1, BinEdges::new(vec![0.0, 0.0])).is_err());
        assert!(EventWorkspace::new(1, BinEdges::new(vec![1.0])).is_err());
    }

    #[test]
    fn test_clone_starts_with_empty_cache() {
        let ws = workspace();
        ws.cached_histogram(0).unwrap();
        let copy = ws.clone();
        assert_eq!(copy.mru_len(), 0);
        assert_eq!(copy.number_events(), 5);
    }
}
