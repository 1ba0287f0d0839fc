//! Materialized histogram data: shared bin edges and X/Y/E spectra.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

static NEXT_EDGES_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a bin-edge vector.
///
/// Clones of a [`BinEdges`] handle share the identity; every newly built
/// vector gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinEdgesId(u64);

/// Shared, immutable X vector.
///
/// Spectra with identical binning hold clones of the same handle, which
/// costs one reference count instead of a copy of the data.
#[derive(Debug, Clone)]
pub struct BinEdges {
    id: BinEdgesId,
    values: Arc<[f64]>,
}

impl BinEdges {
    /// Wraps a vector of edges (or points) in a new shared handle.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            id: BinEdgesId(NEXT_EDGES_ID.fetch_add(1, Ordering::Relaxed)),
            values: values.into(),
        }
    }

    /// `len` zeroed values.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    /// Evenly spaced edges from `start` with `n_bins` bins of `width`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn linear(start: f64, width: f64, n_bins: usize) -> Self {
        Self::new((0..=n_bins).map(|i| start + width * i as f64).collect())
    }

    /// Identity of the underlying vector.
    #[inline]
    #[must_use]
    pub fn id(&self) -> BinEdgesId {
        self.id
    }

    /// Returns true if both handles refer to the same vector.
    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// The edge values.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Bin widths (`len - 1` values).
    #[must_use]
    pub fn widths(&self) -> Vec<f64> {
        self.values.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Bin centres (`len - 1` values).
    #[must_use]
    pub fn centres(&self) -> Vec<f64> {
        self.values.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Returns true if the values are strictly increasing.
    #[must_use]
    pub fn is_strictly_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[0] < w[1])
    }
}

impl Deref for BinEdges {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

impl PartialEq for BinEdges {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || self.values == other.values
    }
}

impl From<Vec<f64>> for BinEdges {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// One spectrum: X (edges or points), Y (signal) and E (errors).
///
/// Invariants: `y.len() == e.len()`, and `x.len()` is either
/// `y.len() + 1` (histogram data) or `y.len()` (point data).
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    x: BinEdges,
    y: Vec<f64>,
    e: Vec<f64>,
}

impl Histogram1D {
    /// Creates a spectrum, checking the size invariants.
    pub fn new(x: BinEdges, y: Vec<f64>, e: Vec<f64>) -> Result<Self> {
        check_sizes(x.len(), y.len(), e.len())?;
        Ok(Self { x, y, e })
    }

    /// A zeroed spectrum over `x` with `y_len` values.
    pub fn zeroed(x: BinEdges, y_len: usize) -> Result<Self> {
        Self::new(x, vec![0.0; y_len], vec![0.0; y_len])
    }

    /// Returns true for histogram (bin edge) data.
    #[must_use]
    pub fn is_histogram_data(&self) -> bool {
        self.x.len() == self.y.len() + 1
    }

    /// Number of Y values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// Returns true if the spectrum has no Y values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Shared X handle.
    #[must_use]
    pub fn x(&self) -> &BinEdges {
        &self.x
    }

    /// Signal values.
    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Error values.
    #[must_use]
    pub fn e(&self) -> &[f64] {
        &self.e
    }

    /// Mutable signal values (length is fixed).
    pub fn y_mut(&mut self) -> &mut [f64] {
        &mut self.y
    }

    /// Mutable error values (length is fixed).
    pub fn e_mut(&mut self) -> &mut [f64] {
        &mut self.e
    }

    /// Mutable signal and error values together.
    pub fn data_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.y, &mut self.e)
    }

    /// Replaces X, keeping Y/E; the lengths must still match.
    pub fn set_x(&mut self, x: BinEdges) -> Result<()> {
        check_sizes(x.len(), self.y.len(), self.e.len())?;
        self.x = x;
        Ok(())
    }

    /// Replaces all three arrays at once.
    pub fn set_data(&mut self, x: BinEdges, y: Vec<f64>, e: Vec<f64>) -> Result<()> {
        check_sizes(x.len(), y.len(), e.len())?;
        self.x = x;
        self.y = y;
        self.e = e;
        Ok(())
    }

    /// Consumes the spectrum, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> (BinEdges, Vec<f64>, Vec<f64>) {
        (self.x, self.y, self.e)
    }
}

fn check_sizes(x_len: usize, y_len: usize, e_len: usize) -> Result<()> {
    if e_len != y_len {
        return Err(Error::SizeMismatch {
            what: "E",
            expected: y_len,
            actual: e_len,
        });
    }
    if x_len != y_len && x_len != y_len + 1 {
        return Err(Error::SizeMismatch {
            what: "X",
            expected: y_len + 1,
            actual: x_len,
        });
    }
    Ok(())
}
