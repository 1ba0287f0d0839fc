//! Per-pixel event lists and on-demand histogramming.
//!
//! An [`EventList`] owns the events of one detector pixel in exactly one of
//! three storage representations. Lists start as plain TOF and are promoted
//! the first time an operation needs weights.
//!
//! Histogramming places each event in the bin `[edge_i, edge_{i+1})` that
//! contains it. When the list is known to be sorted by TOF a single forward
//! sweep is used; otherwise each event is located with a binary search over
//! the edges. Code that appends events out of order must call
//! [`EventList::sort_tof`] to get the sweep back.
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use crate::error::{Error, Result};
use crate::event::{Event, EventType, PulseTime, TofEvent, WeightedEvent, WeightedEventNoTime};

/// Known ordering of the events in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// No ordering guaranteed.
    #[default]
    Unsorted,
    /// Ascending time-of-flight.
    TofSort,
    /// Ascending pulse time.
    PulseTimeSort,
}

/// Owned event storage, exactly one representation at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum EventStorage {
    /// Plain time-of-flight events.
    Tof(Vec<TofEvent>),
    /// Weighted events with pulse time.
    Weighted(Vec<WeightedEvent>),
    /// Weighted events without pulse time.
    WeightedNoTime(Vec<WeightedEventNoTime>),
}

impl EventStorage {
    /// The representation currently held.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Tof(_) => EventType::Tof,
            Self::Weighted(_) => EventType::Weighted,
            Self::WeightedNoTime(_) => EventType::WeightedNoTime,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Tof(events) => events.len(),
            Self::Weighted(events) => events.len(),
            Self::WeightedNoTime(events) => events.len(),
        }
    }
}

impl Default for EventStorage {
    fn default() -> Self {
        Self::Tof(Vec::new())
    }
}

/// Events detected by a single pixel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventList {
    storage: EventStorage,
    order: SortOrder,
}

impl EventList {
    /// Creates an empty TOF event list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a TOF list from existing events (order unknown).
    #[must_use]
    pub fn from_tof_events(events: Vec<TofEvent>) -> Self {
        Self {
            storage: EventStorage::Tof(events),
            order: SortOrder::Unsorted,
        }
    }

    /// Creates a weighted list from existing events (order unknown).
    #[must_use]
    pub fn from_weighted_events(events: Vec<WeightedEvent>) -> Self {
        Self {
            storage: EventStorage::Weighted(events),
            order: SortOrder::Unsorted,
        }
    }

    /// Creates a weighted, no-time list from existing events (order unknown).
    #[must_use]
    pub fn from_weighted_no_time_events(events: Vec<WeightedEventNoTime>) -> Self {
        Self {
            storage: EventStorage::WeightedNoTime(events),
            order: SortOrder::Unsorted,
        }
    }

    /// The storage representation currently held.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.storage.event_type()
    }

    /// Read access to the raw storage.
    #[must_use]
    pub fn storage(&self) -> &EventStorage {
        &self.storage
    }

    /// Number of events in the list.
    #[must_use]
    pub fn number_events(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if the list holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.number_events() == 0
    }

    /// The known ordering of the events.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    /// Returns true if the list is known to be sorted by TOF.
    #[must_use]
    pub fn is_sorted_by_tof(&self) -> bool {
        self.order == SortOrder::TofSort
    }

    /// Plain TOF events, if that is the current representation.
    #[must_use]
    pub fn tof_events(&self) -> Option<&[TofEvent]> {
        match &self.storage {
            EventStorage::Tof(events) => Some(events),
            _ => None,
        }
    }

    /// Weighted events, if that is the current representation.
    #[must_use]
    pub fn weighted_events(&self) -> Option<&[WeightedEvent]> {
        match &self.storage {
            EventStorage::Weighted(events) => Some(events),
            _ => None,
        }
    }

    /// Weighted no-time events, if that is the current representation.
    #[must_use]
    pub fn weighted_no_time_events(&self) -> Option<&[WeightedEventNoTime]> {
        match &self.storage {
            EventStorage::WeightedNoTime(events) => Some(events),
            _ => None,
        }
    }

    /// All time-of-flight values in storage order.
    #[must_use]
    pub fn tofs(&self) -> Vec<f64> {
        match &self.storage {
            EventStorage::Tof(events) => events.iter().map(Event::tof).collect(),
            EventStorage::Weighted(events) => events.iter().map(Event::tof).collect(),
            EventStorage::WeightedNoTime(events) => events.iter().map(Event::tof).collect(),
        }
    }

    /// Removes all events, keeping the representation.
    pub fn clear(&mut self) {
        match &mut self.storage {
            EventStorage::Tof(events) => events.clear(),
            EventStorage::Weighted(events) => events.clear(),
            EventStorage::WeightedNoTime(events) => events.clear(),
        }
        self.order = SortOrder::Unsorted;
    }

    /// Appends an event without maintaining any ordering.
    ///
    /// The event is converted to the current representation.
    pub fn add_event_quickly(&mut self, event: TofEvent) {
        match &mut self.storage {
            EventStorage::Tof(events) => events.push(event),
            EventStorage::Weighted(events) => events.push(event.into()),
            EventStorage::WeightedNoTime(events) => events.push(event.into()),
        }
        self.order = SortOrder::Unsorted;
    }

    /// Appends a weighted event, promoting a TOF list to weighted storage.
    pub fn add_weighted_event_quickly(&mut self, event: WeightedEvent) {
        if let EventStorage::Tof(events) = &mut self.storage {
            let promoted = events.drain(..).map(WeightedEvent::from).collect();
            self.storage = EventStorage::Weighted(promoted);
        }
        match &mut self.storage {
            EventStorage::Weighted(events) => events.push(event),
            EventStorage::WeightedNoTime(events) => events.push(event.into()),
            EventStorage::Tof(_) => {}
        }
        self.order = SortOrder::Unsorted;
    }

    /// Promotes the storage representation.
    ///
    /// TOF and pulse time are preserved; TOF events become unit-weight
    /// events. Switching to a poorer representation is an error.
    pub fn switch_to(&mut self, target: EventType) -> Result<()> {
        let current = self.event_type();
        if current == target {
            return Ok(());
        }
        if target.rank() < current.rank() {
            return Err(Error::InvalidEventSwitch {
                from: current,
                to: target,
            });
        }

        let storage = std::mem::take(&mut self.storage);
        self.storage = match (storage, target) {
            (EventStorage::Tof(events), EventType::Weighted) => {
                EventStorage::Weighted(events.into_iter().map(WeightedEvent::from).collect())
            }
            (EventStorage::Tof(events), EventType::WeightedNoTime) => EventStorage::WeightedNoTime(
                events.into_iter().map(WeightedEventNoTime::from).collect(),
            ),
            (EventStorage::Weighted(events), EventType::WeightedNoTime) => {
                EventStorage::WeightedNoTime(
                    events
                        .into_iter()
                        .map(WeightedEventNoTime::from)
                        .collect(),
                )
            }
            (storage, _) => storage,
        };
        Ok(())
    }

    /// Appends all events of `other`, promoting to the richer representation.
    pub fn add_events(&mut self, other: &EventList) -> Result<()> {
        let target = if other.event_type().rank() > self.event_type().rank() {
            other.event_type()
        } else {
            self.event_type()
        };
        self.switch_to(target)?;

        match (&mut self.storage, &other.storage) {
            (EventStorage::Tof(dst), EventStorage::Tof(src)) => dst.extend_from_slice(src),
            (EventStorage::Weighted(dst), EventStorage::Tof(src)) => {
                dst.extend(src.iter().copied().map(WeightedEvent::from));
            }
            (EventStorage::Weighted(dst), EventStorage::Weighted(src)) => {
                dst.extend_from_slice(src);
            }
            (EventStorage::WeightedNoTime(dst), EventStorage::Tof(src)) => {
                dst.extend(src.iter().copied().map(WeightedEventNoTime::from));
            }
            (EventStorage::WeightedNoTime(dst), EventStorage::Weighted(src)) => {
                dst.extend(src.iter().copied().map(WeightedEventNoTime::from));
            }
            (EventStorage::WeightedNoTime(dst), EventStorage::WeightedNoTime(src)) => {
                dst.extend_from_slice(src);
            }
            (dst, src) => {
                return Err(Error::InvalidEventSwitch {
                    from: src.event_type(),
                    to: dst.event_type(),
                })
            }
        }
        self.order = SortOrder::Unsorted;
        Ok(())
    }

    /// Sorts events by ascending time-of-flight (stable).
    pub fn sort_tof(&mut self) {
        if self.order == SortOrder::TofSort {
            return;
        }
        match &mut self.storage {
            EventStorage::Tof(events) => events.sort_by(|a, b| a.tof.total_cmp(&b.tof)),
            EventStorage::Weighted(events) => events.sort_by(|a, b| a.tof.total_cmp(&b.tof)),
            EventStorage::WeightedNoTime(events) => {
                events.sort_by(|a, b| a.tof.total_cmp(&b.tof));
            }
        }
        self.order = SortOrder::TofSort;
    }

    /// Sorts events by ascending pulse time (stable).
    ///
    /// Fails for no-time storage, which has no pulse times.
    pub fn sort_pulse_time(&mut self) -> Result<()> {
        match &mut self.storage {
            EventStorage::Tof(events) => events.sort_by_key(|e| e.pulse_time),
            EventStorage::Weighted(events) => events.sort_by_key(|e| e.pulse_time),
            EventStorage::WeightedNoTime(_) => {
                return Err(Error::InvalidArgument(
                    "cannot sort WEIGHTED_NOTIME events by pulse time".to_string(),
                ))
            }
        }
        self.order = SortOrder::PulseTimeSort;
        Ok(())
    }

    /// Pulse times in storage order (`None` for no-time storage).
    #[must_use]
    pub fn pulse_times(&self) -> Option<Vec<PulseTime>> {
        match &self.storage {
            EventStorage::Tof(events) => Some(events.iter().map(|e| e.pulse_time).collect()),
            EventStorage::Weighted(events) => Some(events.iter().map(|e| e.pulse_time).collect()),
            EventStorage::WeightedNoTime(_) => None,
        }
    }

    /// Smallest time-of-flight in the list.
    #[must_use]
    pub fn tof_min(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let tofs = self.tofs();
        if self.is_sorted_by_tof() {
            return tofs.first().copied();
        }
        tofs.into_iter().reduce(f64::min)
    }

    /// Largest time-of-flight in the list.
    #[must_use]
    pub fn tof_max(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let tofs = self.tofs();
        if self.is_sorted_by_tof() {
            return tofs.last().copied();
        }
        tofs.into_iter().reduce(f64::max)
    }

    /// Applies `tof' = tof * factor + offset` to every event.
    ///
    /// A negative factor reverses the order, so the list becomes unsorted.
    pub fn convert_tof(&mut self, factor: f64, offset: f64) {
        match &mut self.storage {
            EventStorage::Tof(events) => {
                for event in events.iter_mut() {
                    event.tof = event.tof * factor + offset;
                }
            }
            EventStorage::Weighted(events) => {
                for event in events.iter_mut() {
                    event.tof = event.tof * factor + offset;
                }
            }
            EventStorage::WeightedNoTime(events) => {
                for event in events.iter_mut() {
                    event.tof = event.tof * factor + offset;
                }
            }
        }
        if factor < 0.0 {
            self.order = SortOrder::Unsorted;
        }
    }

    /// Scales every event weight by `value` with uncertainty `error`.
    ///
    /// Promotes TOF storage to weighted. Errors propagate as
    /// `err2' = err2 * value^2 + weight^2 * error^2`.
    pub fn multiply(&mut self, value: f64, error: f64) -> Result<()> {
        if (value - 1.0).abs() < f64::EPSILON && error == 0.0 {
            return Ok(());
        }
        if self.event_type() == EventType::Tof {
            self.switch_to(EventType::Weighted)?;
        }
        let value_squared = value * value;
        let error_squared = error * error;
        let scale = |weight: &mut f32, err2: &mut f32| {
            let w = f64::from(*weight);
            *err2 = (f64::from(*err2) * value_squared + error_squared * w * w) as f32;
            *weight = (w * value) as f32;
        };
        match &mut self.storage {
            EventStorage::Weighted(events) => {
                for event in events.iter_mut() {
                    scale(&mut event.weight, &mut event.error_squared);
                }
            }
            EventStorage::WeightedNoTime(events) => {
                for event in events.iter_mut() {
                    scale(&mut event.weight, &mut event.error_squared);
                }
            }
            EventStorage::Tof(_) => {}
        }
        Ok(())
    }

    /// Masks the time-of-flight region `[tof_min, tof_max)`.
    ///
    /// TOF events in the region are removed. Weighted events are kept with
    /// zero weight and zero error so the event count is preserved.
    /// Returns the number of events affected.
    pub fn mask_tof(&mut self, tof_min: f64, tof_max: f64) -> Result<usize> {
        if tof_max <= tof_min {
            return Err(Error::InvalidArgument(format!(
                "tof_max ({tof_max}) must be greater than tof_min ({tof_min})"
            )));
        }
        let inside = |tof: f64| tof >= tof_min && tof < tof_max;
        let affected = match &mut self.storage {
            EventStorage::Tof(events) => {
                let before = events.len();
                events.retain(|e| !inside(e.tof));
                before - events.len()
            }
            EventStorage::Weighted(events) => {
                let mut count = 0;
                for event in events.iter_mut().filter(|e| inside(e.tof)) {
                    event.weight = 0.0;
                    event.error_squared = 0.0;
                    count += 1;
                }
                count
            }
            EventStorage::WeightedNoTime(events) => {
                let mut count = 0;
                for event in events.iter_mut().filter(|e| inside(e.tof)) {
                    event.weight = 0.0;
                    event.error_squared = 0.0;
                    count += 1;
                }
                count
            }
        };
        Ok(affected)
    }

    /// Sum of weights and its error over `[min, max)`.
    #[must_use]
    pub fn integrate(&self, min: f64, max: f64) -> (f64, f64) {
        fn sum<E: Event>(events: &[E], min: f64, max: f64) -> (f64, f64) {
            events
                .iter()
                .filter(|e| e.tof() >= min && e.tof() < max)
                .fold((0.0, 0.0), |(w, e2), e| {
                    (w + e.weight(), e2 + e.error_squared())
                })
        }
        let (total, error_squared) = match &self.storage {
            EventStorage::Tof(events) => sum(events, min, max),
            EventStorage::Weighted(events) => sum(events, min, max),
            EventStorage::WeightedNoTime(events) => sum(events, min, max),
        };
        (total, error_squared.sqrt())
    }

    /// Total weight of all events.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.integrate(f64::NEG_INFINITY, f64::INFINITY).0
    }

    /// Counts (or summed weights) per bin for the given edges.
    #[must_use]
    pub fn generate_counts_histogram(&self, edges: &[f64]) -> Vec<f64> {
        self.generate_histogram(edges).0
    }

    /// Errors per bin matching a counts histogram `y` over `edges`.
    ///
    /// Unweighted lists use Poisson errors `sqrt(y)`; weighted lists sum the
    /// squared errors of the events in each bin.
    #[must_use]
    pub fn generate_errors_histogram(&self, edges: &[f64], y: &[f64]) -> Vec<f64> {
        match self.event_type() {
            EventType::Tof => y.iter().map(|v| v.sqrt()).collect(),
            EventType::Weighted | EventType::WeightedNoTime => self.generate_histogram(edges).1,
        }
    }

    /// Counts and errors per bin in one pass.
    ///
    /// Events outside `[edges[0], edges[last])` are ignored; fewer than two
    /// edges yields empty vectors.
    #[must_use]
    pub fn generate_histogram(&self, edges: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n_bins = edges.len().saturating_sub(1);
        let mut y = vec![0.0; n_bins];
        let mut e2 = vec![0.0; n_bins];
        if n_bins == 0 {
            return (y, e2);
        }
        let sorted = self.is_sorted_by_tof();
        match &self.storage {
            EventStorage::Tof(events) => accumulate(events, edges, sorted, &mut y, &mut e2),
            EventStorage::Weighted(events) => accumulate(events, edges, sorted, &mut y, &mut e2),
            EventStorage::WeightedNoTime(events) => {
                accumulate(events, edges, sorted, &mut y, &mut e2);
            }
        }
        for value in &mut e2 {
            *value = value.sqrt();
        }
        (y, e2)
    }
}

/// Index of the bin `[edges[i], edges[i+1])` containing `tof`.
#[inline]
#[must_use]
pub fn find_bin(edges: &[f64], tof: f64) -> Option<usize> {
    let n = edges.len();
    if n < 2 || tof.is_nan() || tof < edges[0] || tof >= edges[n - 1] {
        return None;
    }
    Some(edges.partition_point(|&x| x <= tof) - 1)
}

fn accumulate<E: Event>(events: &[E], edges: &[f64], sorted: bool, y: &mut [f64], e2: &mut [f64]) {
    if sorted {
        let first = edges[0];
        let last = edges[edges.len() - 1];
        let start = events.partition_point(|e| e.tof() < first);
        let mut bin = 0;
        for event in &events[start..] {
            let tof = event.tof();
            if tof.is_nan() || tof >= last {
                break;
            }
            while tof >= edges[bin + 1] {
                bin += 1;
            }
            y[bin] += event.weight();
            e2[bin] += event.error_squared();
        }
    } else {
        for event in events {
            if let Some(bin) = find_bin(edges, event.tof()) {
                y[bin] += event.weight();
                e2[bin] += event.error_squared();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn list_from_tofs(tofs: &[f64]) -> EventList {
        let mut list = EventList::new();
        for (i, &tof) in tofs.iter().enumerate() {
            list.add_event_quickly(TofEvent::new(tof, PulseTime::new(i as i64)));
        }
        list
    }

    #[test]
    fn test_counts_histogram_half_open_bins() {
        let list = list_from_tofs(&[0.5, 1.5, 1.5, 2.5]);
        let y = list.generate_counts_histogram(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(y, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_edge_values_belong_to_upper_bin() {
        let list = list_from_tofs(&[1.0, 2.0, 3.0, -0.1, 0.0]);
        let y = list.generate_counts_histogram(&[0.0, 1.0, 2.0, 3.0]);
        // 3.0 equals the last edge and is dropped, -0.1 is below range.
        assert_eq!(y, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sorted_and_unsorted_paths_agree() {
        let tofs = [7.2, 0.1, 3.3, 9.99, 5.0, 5.0, 12.0, 2.5, -1.0];
        let edges = [0.0, 2.5, 5.0, 7.5, 10.0];
        let unsorted = list_from_tofs(&tofs);
        let mut sorted = unsorted.clone();
        sorted.sort_tof();
        assert!(sorted.is_sorted_by_tof());
        assert_eq!(
            unsorted.generate_counts_histogram(&edges),
            sorted.generate_counts_histogram(&edges)
        );
        assert_eq!(sorted.generate_counts_histogram(&edges), vec![1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn test_empty_list_gives_zero_histogram() {
        let list = EventList::new();
        let (y, e) = list.generate_histogram(&[0.0, 1.0, 2.0]);
        assert_eq!(y, vec![0.0, 0.0]);
        assert_eq!(e, vec![0.0, 0.0]);
        assert!(list.generate_counts_histogram(&[1.0]).is_empty());
    }

    #[test]
    fn test_poisson_errors_for_tof_events() {
        let list = list_from_tofs(&[0.5, 0.6, 0.7, 0.8, 1.5]);
        let edges = [0.0, 1.0, 2.0];
        let y = list.generate_counts_histogram(&edges);
        let e = list.generate_errors_histogram(&edges, &y);
        assert_relative_eq!(e[0], 2.0);
        assert_relative_eq!(e[1], 1.0);
    }

    #[test]
    fn test_weighted_errors_accumulate_squared() {
        let list = EventList::from_weighted_events(vec![
            WeightedEvent::new(0.5, PulseTime::new(0), 2.0, 4.0),
            WeightedEvent::new(0.7, PulseTime::new(0), 1.0, 5.0),
        ]);
        let edges = [0.0, 1.0];
        let y = list.generate_counts_histogram(&edges);
        let e = list.generate_errors_histogram(&edges, &y);
        assert_relative_eq!(y[0], 3.0);
        assert_relative_eq!(e[0], 3.0);
    }

    #[test]
    fn test_switch_to_weighted_preserves_tof_and_pulse() {
        let mut list = list_from_tofs(&[1.0, 2.0]);
        list.switch_to(EventType::Weighted).unwrap();
        let events = list.weighted_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_relative_eq!(events[1].tof, 2.0);
        assert_eq!(events[1].pulse_time, PulseTime::new(1));
        assert_relative_eq!(events[1].weight, 1.0);
        assert_relative_eq!(events[1].error_squared, 1.0);
    }

    #[test]
    fn test_switch_back_is_rejected() {
        let mut list = list_from_tofs(&[1.0]);
        list.switch_to(EventType::WeightedNoTime).unwrap();
        let err = list.switch_to(EventType::Tof).unwrap_err();
        assert!(matches!(err, Error::InvalidEventSwitch { .. }));
        assert_eq!(list.event_type(), EventType::WeightedNoTime);
    }

    #[test]
    fn test_mask_tof_removes_unweighted_events() {
        let mut list = list_from_tofs(&[1.0, 2.0, 3.0, 4.0]);
        let removed = list.mask_tof(2.0, 4.0).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(list.tofs(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_mask_tof_zeroes_weighted_events() {
        let mut list = list_from_tofs(&[1.0, 2.0, 3.0, 4.0]);
        list.switch_to(EventType::Weighted).unwrap();
        let masked = list.mask_tof(2.0, 4.0).unwrap();
        assert_eq!(masked, 2);
        assert_eq!(list.number_events(), 4);
        assert_relative_eq!(list.total_weight(), 2.0);
    }

    #[test]
    fn test_mask_tof_rejects_empty_range() {
        let mut list = list_from_tofs(&[1.0]);
        assert!(list.mask_tof(2.0, 2.0).is_err());
    }

    #[test]
    fn test_multiply_promotes_and_propagates_errors() {
        let mut list = list_from_tofs(&[1.0]);
        list.multiply(2.0, 0.5).unwrap();
        assert_eq!(list.event_type(), EventType::Weighted);
        let event = list.weighted_events().unwrap()[0];
        assert_relative_eq!(event.weight, 2.0);
        // 1 * 4 + 1 * 0.25
        assert_relative_eq!(event.error_squared, 4.25);
    }

    #[test]
    fn test_add_events_promotes_to_richer_storage() {
        let mut tof = list_from_tofs(&[1.0, 2.0]);
        let weighted = EventList::from_weighted_no_time_events(vec![WeightedEventNoTime::new(
            3.0, 0.5, 0.25,
        )]);
        tof.add_events(&weighted).unwrap();
        assert_eq!(tof.event_type(), EventType::WeightedNoTime);
        assert_eq!(tof.number_events(), 3);
        assert_relative_eq!(tof.total_weight(), 2.5);
        assert!(!tof.is_sorted_by_tof());
    }

    #[test]
    fn test_convert_tof_and_range() {
        let mut list = list_from_tofs(&[1.0, 5.0, 3.0]);
        list.sort_tof();
        list.convert_tof(2.0, 1.0);
        assert!(list.is_sorted_by_tof());
        assert_eq!(list.tof_min(), Some(3.0));
        assert_eq!(list.tof_max(), Some(11.0));
        list.convert_tof(-1.0, 0.0);
        assert!(!list.is_sorted_by_tof());
        assert_eq!(list.tof_min(), Some(-11.0));
    }

    #[test]
    fn test_integrate_half_open() {
        let list = list_from_tofs(&[1.0, 2.0, 3.0, 4.0]);
        let (sum, err) = list.integrate(2.0, 4.0);
        assert_relative_eq!(sum, 2.0);
        assert_relative_eq!(err, 2.0_f64.sqrt());
    }

    #[test]
    fn test_sort_pulse_time() {
        let mut list = EventList::from_tof_events(vec![
            TofEvent::new(1.0, PulseTime::new(30)),
            TofEvent::new(2.0, PulseTime::new(10)),
        ]);
        list.sort_pulse_time().unwrap();
        assert_eq!(list.sort_order(), SortOrder::PulseTimeSort);
        assert_eq!(
            list.pulse_times().unwrap(),
            vec![PulseTime::new(10), PulseTime::new(30)]
        );
    }
}
