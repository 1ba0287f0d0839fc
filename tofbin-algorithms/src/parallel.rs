//! Per-spectrum loop shared by the algorithms.
//!
//! Each iteration exclusively owns one spectrum and returns its own
//! result; flags and counters are reduced by the caller afterwards.
//! Cancellation is polled before every spectrum, so a cancelled loop leaves
//! the spectra it reached rewritten and the others untouched.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::progress::Progress;

/// Per-spectrum results of one loop; `None` marks a spectrum skipped after
/// cancellation.
#[derive(Debug)]
pub struct SpectrumResults<R> {
    slots: Vec<Option<R>>,
}

impl<R> SpectrumResults<R> {
    /// Number of spectra the loop was asked to process.
    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Number of spectra actually processed.
    pub fn processed(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// `Err(Cancelled)` if any spectrum was skipped.
    pub fn cancellation(&self) -> Result<()> {
        let processed = self.processed();
        if processed == self.total() {
            Ok(())
        } else {
            Err(Error::Cancelled {
                processed,
                total: self.total(),
            })
        }
    }

    /// Results of the processed spectra, by index.
    pub fn into_processed(self) -> impl Iterator<Item = (usize, R)> {
        self.slots
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|result| (index, result)))
    }

    /// All results, or `Err(Cancelled)` if the loop did not finish.
    pub fn finish(self) -> Result<Vec<R>> {
        self.cancellation()?;
        Ok(self.slots.into_iter().flatten().collect())
    }
}

/// Runs `op` on every item, in parallel unless `parallel` is false.
///
/// Errors returned by `op` abort the loop and are propagated as is.
pub fn for_each_spectrum<T, R, F>(
    items: &mut [T],
    parallel: bool,
    progress: &dyn Progress,
    op: F,
) -> Result<SpectrumResults<R>>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut T) -> Result<R> + Sync,
{
    let slots = if parallel {
        items
            .par_iter_mut()
            .enumerate()
            .map(|(index, item)| step(index, item, progress, &op))
            .collect::<Result<Vec<_>>>()?
    } else {
        let mut slots = Vec::with_capacity(items.len());
        for (index, item) in items.iter_mut().enumerate() {
            slots.push(step(index, item, progress, &op)?);
        }
        slots
    };
    Ok(SpectrumResults { slots })
}

/// Expands an optional list of workspace indices into a per-spectrum
/// selection mask. `None` selects everything.
pub fn spectrum_selection(spectra: Option<&[usize]>, num_histograms: usize) -> Result<Vec<bool>> {
    let Some(spectra) = spectra else {
        return Ok(vec![true; num_histograms]);
    };
    let mut selected = vec![false; num_histograms];
    for &index in spectra {
        if index >= num_histograms {
            return Err(Error::InvalidArgument(format!(
                "workspace index {index} out of range (workspace has {num_histograms} spectra)"
            )));
        }
        selected[index] = true;
    }
    Ok(selected)
}

fn step<T, R, F>(index: usize, item: &mut T, progress: &dyn Progress, op: &F) -> Result<Option<R>>
where
    F: Fn(usize, &mut T) -> Result<R>,
{
    if progress.is_cancelled() {
        return Ok(None);
    }
    let result = op(index, item)?;
    progress.report();
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CancellationToken, NullProgress};

    #[test]
    fn test_sequential_cancellation_is_deterministic() {
        let mut items = vec![0_u32; 5];
        let token = CancellationToken::cancel_after(3);
        let results = for_each_spectrum(&mut items, false, &token, |index, item| {
            *item = 1;
            Ok(index)
        })
        .unwrap();
        assert_eq!(results.processed(), 3);
        assert!(matches!(
            results.cancellation(),
            Err(Error::Cancelled {
                processed: 3,
                total: 5
            })
        ));
        assert_eq!(items, vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_parallel_loop_collects_in_order() {
        let mut items: Vec<usize> = (0..100).collect();
        let results = for_each_spectrum(&mut items, true, &NullProgress, |index, item| {
            *item *= 2;
            Ok(index)
        })
        .unwrap();
        assert_eq!(results.finish().unwrap(), (0..100).collect::<Vec<_>>());
        assert_eq!(items[99], 198);
    }

    #[test]
    fn test_spectrum_selection() {
        assert_eq!(spectrum_selection(None, 2).unwrap(), vec![true, true]);
        assert_eq!(
            spectrum_selection(Some(&[2, 0]), 3).unwrap(),
            vec![true, false, true]
        );
        assert!(spectrum_selection(Some(&[3]), 3).is_err());
    }

    #[test]
    fn test_errors_propagate() {
        let mut items = vec![0_u8; 3];
        let outcome = for_each_spectrum(&mut items, false, &NullProgress, |index, _| {
            if index == 1 {
                Err(Error::InvalidArgument("bad spectrum".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(outcome, Err(Error::InvalidArgument(_))));
    }
}
