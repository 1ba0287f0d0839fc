//! Redistribution of histogram signal onto new bin edges.
//!
//! Both axes are swept once with two cursors. For every overlap between an
//! old bin and a new bin the corresponding fraction of the old signal is
//! added to the new bin:
//!
//! - counts data: `y_new += y_old * overlap / w_old`,
//!   `var_new += e_old^2 * overlap / w_old`, then `e_new = sqrt(var_new)`;
//! - distribution data: `y_new += y_old * overlap`,
//!   `var_new += e_old^2 * overlap * w_old`, then both are divided by the new
//!   bin width (`e_new = sqrt(var_new) / w_new`).
//!
//! Bins outside the old range stay zero. The edges must be ascending; that
//! is validated by the caller, not here.

use crate::error::{Error, Result};

/// Rebins `(x_old, y_old, e_old)` onto `x_new`, writing `y_new` and `e_new`.
///
/// With `addition` set the outputs are accumulated into rather than
/// overwritten, and the final normalisation is skipped: `y_new` holds
/// width-weighted sums for distributions and `e_new` holds variances. Call
/// [`finalize_addition`] once all contributions are in.
#[allow(clippy::too_many_arguments)]
pub fn rebin(
    x_old: &[f64],
    y_old: &[f64],
    e_old: &[f64],
    x_new: &[f64],
    y_new: &mut [f64],
    e_new: &mut [f64],
    distribution: bool,
    addition: bool,
) -> Result<()> {
    check_lengths(x_old, y_old, e_old, Axis::Old)?;
    check_lengths(x_new, y_new, e_new, Axis::New)?;

    if !addition {
        y_new.fill(0.0);
        e_new.fill(0.0);
    }

    let n_old = y_old.len();
    let n_new = y_new.len();
    let mut i_old = 0;
    let mut i_new = 0;

    while i_old < n_old && i_new < n_new {
        let (xo_low, xo_high) = (x_old[i_old], x_old[i_old + 1]);
        let (xn_low, xn_high) = (x_new[i_new], x_new[i_new + 1]);

        if xn_high <= xo_low {
            i_new += 1;
            continue;
        }
        if xo_high <= xn_low {
            i_old += 1;
            continue;
        }

        let overlap = xo_high.min(xn_high) - xo_low.max(xn_low);
        let width = xo_high - xo_low;
        if overlap > 0.0 && width > 0.0 {
            let e2 = e_old[i_old] * e_old[i_old];
            if distribution {
                y_new[i_new] += y_old[i_old] * overlap;
                e_new[i_new] += e2 * overlap * width;
            } else {
                let fraction = overlap / width;
                y_new[i_new] += y_old[i_old] * fraction;
                e_new[i_new] += e2 * fraction;
            }
        }

        if xn_high > xo_high {
            i_old += 1;
        } else {
            i_new += 1;
        }
    }

    if !addition {
        finalize_addition(x_new, y_new, e_new, distribution)?;
    }
    Ok(())
}

/// Applies the final normalisation skipped by an `addition` rebin.
///
/// Zero-width output bins in distribution mode are left at zero.
pub fn finalize_addition(
    x_new: &[f64],
    y_new: &mut [f64],
    e_new: &mut [f64],
    distribution: bool,
) -> Result<()> {
    check_lengths(x_new, y_new, e_new, Axis::New)?;
    if distribution {
        for (i, (y, e)) in y_new.iter_mut().zip(e_new.iter_mut()).enumerate() {
            let width = x_new[i + 1] - x_new[i];
            if width > 0.0 {
                *y /= width;
                *e = e.sqrt() / width;
            } else {
                *y = 0.0;
                *e = 0.0;
            }
        }
    } else {
        for e in e_new.iter_mut() {
            *e = e.sqrt();
        }
    }
    Ok(())
}

/// Convenience wrapper allocating the outputs.
pub fn rebin_to_vec(
    x_old: &[f64],
    y_old: &[f64],
    e_old: &[f64],
    x_new: &[f64],
    distribution: bool,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let n_new = x_new.len().saturating_sub(1);
    let mut y_new = vec![0.0; n_new];
    let mut e_new = vec![0.0; n_new];
    rebin(
        x_old,
        y_old,
        e_old,
        x_new,
        &mut y_new,
        &mut e_new,
        distribution,
        false,
    )?;
    Ok((y_new, e_new))
}

#[derive(Clone, Copy)]
enum Axis {
    Old,
    New,
}

fn check_lengths(x: &[f64], y: &[f64], e: &[f64], which: Axis) -> Result<()> {
    if x.len() != y.len() + 1 {
        return Err(Error::SizeMismatch {
            what: match which {
                Axis::Old => "old bin edges",
                Axis::New => "new bin edges",
            },
            expected: y.len() + 1,
            actual: x.len(),
        });
    }
    if e.len() != y.len() {
        return Err(Error::SizeMismatch {
            what: match which {
                Axis::Old => "old errors",
                Axis::New => "new errors",
            },
            expected: y.len(),
            actual: e.len(),
        });
    }
    Ok(())
}
