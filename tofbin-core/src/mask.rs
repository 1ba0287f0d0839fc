//! Per-spectrum bin masks and their redistribution onto new binning.

use std::collections::btree_map::{self, BTreeMap};

use crate::error::{Error, Result};
use crate::rebin::rebin_to_vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered mapping from bin index to mask weight in (0, 1].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaskList {
    bins: BTreeMap<usize, f64>,
}

impl MaskList {
    /// Creates an empty mask list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `bin` with `weight`.
    ///
    /// Masking an already masked bin composes the weights the same way the
    /// signal is scaled: `1 - (1 - old) * (1 - new)`.
    pub fn flag(&mut self, bin: usize, weight: f64) -> Result<()> {
        check_weight(weight)?;
        self.bins
            .entry(bin)
            .and_modify(|old| *old = 1.0 - (1.0 - *old) * (1.0 - weight))
            .or_insert(weight);
        Ok(())
    }

    /// Weight of `bin`, if masked.
    #[must_use]
    pub fn weight(&self, bin: usize) -> Option<f64> {
        self.bins.get(&bin).copied()
    }

    /// Returns true if `bin` is masked.
    #[must_use]
    pub fn contains(&self, bin: usize) -> bool {
        self.bins.contains_key(&bin)
    }

    /// Number of masked bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Returns true if no bin is masked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Iterates `(bin, weight)` in ascending bin order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.bins.iter().map(|(&bin, &weight)| (bin, weight))
    }

    /// Removes all masks.
    pub fn clear(&mut self) {
        self.bins.clear();
    }

    /// Masked area `sum(weight * width)` over the bins of `x`.
    #[must_use]
    pub fn masked_area(&self, x: &[f64]) -> f64 {
        self.iter()
            .filter(|&(bin, _)| bin + 1 < x.len())
            .map(|(bin, weight)| weight * (x[bin + 1] - x[bin]))
            .sum()
    }
}

impl<'a> IntoIterator for &'a MaskList {
    type Item = (&'a usize, &'a f64);
    type IntoIter = btree_map::Iter<'a, usize, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

pub(crate) fn check_weight(weight: f64) -> Result<()> {
    if weight > 0.0 && weight <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidMaskWeight(weight))
    }
}

/// Projects the masks of a spectrum binned on `old_x` onto `new_x`.
///
/// The masked intervals are turned into a distribution of weights (with
/// explicit zero-weight gaps between non-adjacent masked bins) and rebinned
/// like any other distribution, so the masked area is conserved wherever
/// `new_x` covers the masked region. Every new bin that receives a positive
/// weight is returned as masked.
pub fn propagate_masks(old_x: &[f64], masks: &MaskList, new_x: &[f64]) -> Result<MaskList> {
    let mut propagated = MaskList::new();
    if masks.is_empty() || new_x.len() < 2 {
        return Ok(propagated);
    }

    let mut edges: Vec<f64> = Vec::with_capacity(2 * masks.len() + 1);
    let mut weights: Vec<f64> = Vec::with_capacity(2 * masks.len());
    for (bin, weight) in masks.iter() {
        if bin + 1 >= old_x.len() {
            return Err(Error::IndexOutOfRange {
                what: "masked bin",
                index: bin,
                size: old_x.len().saturating_sub(1),
            });
        }
        let (low, high) = (old_x[bin], old_x[bin + 1]);
        match edges.last() {
            None => edges.push(low),
            Some(&last) if last != low => {
                weights.push(0.0);
                edges.push(low);
            }
            Some(_) => {}
        }
        weights.push(weight);
        edges.push(high);
    }

    let zeroes = vec![0.0; weights.len()];
    let (new_weights, _) = rebin_to_vec(&edges, &weights, &zeroes, new_x, true)?;
    for (bin, weight) in new_weights.into_iter().enumerate() {
        if weight > 0.0 {
            propagated.flag(bin, weight.min(1.0))?;
        }
    }
    Ok(propagated)
}
