//! Rebin parameters: `x0, dx1, x1, dx2, x2, ..., xn`.
//!
//! Each `(boundary, step, boundary)` triple describes a piecewise-uniform
//! region. A positive step is linear; a negative step `-r` is logarithmic,
//! each bin being `r` times the current X wide.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::histogram::BinEdges;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The last bin of a region is never narrower than this fraction of a step.
const LAST_BIN_FRACTION: f64 = 0.25;

/// Upper limit on the number of bins one set of parameters may describe.
pub const MAX_BINS: usize = 10_000_000;

/// Validated rebin parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct RebinParams {
    values: Vec<f64>,
}

impl RebinParams {
    /// Validates a flat parameter vector.
    ///
    /// The vector must have odd length of at least three, finite values,
    /// strictly increasing boundaries and non-zero steps. Logarithmic steps
    /// need a positive region start. Steps too small to advance X in `f64`,
    /// or describing more than [`MAX_BINS`] bins, are rejected.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() < 3 || values.len() % 2 == 0 {
            return Err(Error::InvalidBinParams(format!(
                "expected an odd number (>= 3) of values as x0, dx, x1, ..., got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidBinParams(format!(
                "values must be finite, got {bad}"
            )));
        }
        let mut bins = 0.0;
        for region in values.windows(3).step_by(2) {
            let (start, step, end) = (region[0], region[1], region[2]);
            if end <= start {
                return Err(Error::InvalidBinParams(format!(
                    "boundaries must be strictly increasing, got {start} then {end}"
                )));
            }
            if step == 0.0 {
                return Err(Error::InvalidBinParams(format!(
                    "step between {start} and {end} must not be zero"
                )));
            }
            if step < 0.0 && start <= 0.0 {
                return Err(Error::InvalidBinParams(format!(
                    "logarithmic step {step} needs a positive start, got {start}"
                )));
            }
            let furthest = start.abs().max(end.abs());
            let advances = if step > 0.0 {
                furthest + step > furthest
            } else {
                1.0 + step.abs() > 1.0
            };
            if !advances {
                return Err(Error::InvalidBinParams(format!(
                    "step {step} is too small to advance X between {start} and {end}"
                )));
            }
            #[allow(clippy::cast_precision_loss)]
            let max_bins = MAX_BINS as f64;
            let estimate = if step > 0.0 {
                (end - start) / step
            } else {
                (end / start).ln() / step.abs().ln_1p()
            };
            bins += estimate.ceil();
            if bins > max_bins {
                return Err(Error::InvalidBinParams(format!(
                    "parameters describe more than {MAX_BINS} bins"
                )));
            }
        }
        Ok(Self { values })
    }

    /// The raw parameter values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First boundary.
    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.values[0]
    }

    /// Last boundary.
    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Generates the bin edges described by the parameters.
    ///
    /// Fails if a step stops advancing X or the axis grows past
    /// [`MAX_BINS`] bins.
    pub fn create_axis(&self) -> Result<Vec<f64>> {
        let params = &self.values;
        let mut x = params[0];
        let mut axis = vec![x];
        let mut i_bound = 2;

        while i_bound < params.len() {
            let step = params[i_bound - 1];
            let boundary = params[i_bound];
            let width = if step >= 0.0 { step } else { x * step.abs() };

            if x + width * (1.0 + LAST_BIN_FRACTION) <= boundary {
                let next = x + width;
                if next <= x {
                    return Err(Error::InvalidBinParams(format!(
                        "step {step} does not advance X at {x}"
                    )));
                }
                x = next;
            } else {
                x = boundary;
                i_bound += 2;
            }
            axis.push(x);
            if axis.len() > MAX_BINS + 1 {
                return Err(Error::InvalidBinParams(format!(
                    "axis exceeds {MAX_BINS} bins"
                )));
            }
        }
        Ok(axis)
    }

    /// Generates the bin edges as a new shared handle.
    pub fn create_bin_edges(&self) -> Result<BinEdges> {
        Ok(BinEdges::new(self.create_axis()?))
    }
}

impl TryFrom<Vec<f64>> for RebinParams {
    type Error = Error;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<RebinParams> for Vec<f64> {
    fn from(params: RebinParams) -> Self {
        params.values
    }
}

impl FromStr for RebinParams {
    type Err = Error;

    /// Parses a comma (or whitespace) separated list, e.g. `"0, 10, 100"`.
    fn from_str(s: &str) -> Result<Self> {
        let values = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token.parse::<f64>().map_err(|_| {
                    Error::InvalidBinParams(format!("cannot parse '{token}' as a number"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::new(values)
    }
}

impl fmt::Display for RebinParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.values.iter().map(ToString::to_string).collect();
        f.write_str(&joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_axis() {
        let params: RebinParams = "0, 10, 50".parse().unwrap();
        assert_eq!(params.create_axis().unwrap(), vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_short_last_bin_is_merged() {
        // 0..10 in steps of 4: 4, 8 would leave a 2-wide bin, which is
        // >= 25% of a step, so it is kept.
        let params = RebinParams::new(vec![0.0, 4.0, 10.0]).unwrap();
        assert_eq!(params.create_axis().unwrap(), vec![0.0, 4.0, 8.0, 10.0]);
        // 0..10.5 in steps of 5: 5 + 5 * 1.25 > 10.5, so 10.5 is the edge.
        let params = RebinParams::new(vec![0.0, 5.0, 10.5]).unwrap();
        assert_eq!(params.create_axis().unwrap(), vec![0.0, 5.0, 10.5]);
    }

    #[test]
    fn test_logarithmic_axis() {
        let params = RebinParams::new(vec![1.0, -1.0, 10.0]).unwrap();
        let axis = params.create_axis().unwrap();
        assert_eq!(axis, vec![1.0, 2.0, 4.0, 8.0, 10.0]);
    }

    #[test]
    fn test_multiple_regions() {
        let params: RebinParams = "0,1,2,5,12".parse().unwrap();
        let axis = params.create_axis().unwrap();
        assert_eq!(axis, vec![0.0, 1.0, 2.0, 7.0, 12.0]);
        assert_relative_eq!(params.x_min(), 0.0);
        assert_relative_eq!(params.x_max(), 12.0);
    }

    #[test]
    fn test_rejects_malformed_params() {
        assert!(RebinParams::new(vec![0.0, 1.0]).is_err());
        assert!(RebinParams::new(vec![0.0, 1.0, 5.0, 1.0]).is_err());
        assert!(RebinParams::new(vec![5.0, 1.0, 0.0]).is_err());
        assert!(RebinParams::new(vec![0.0, 0.0, 5.0]).is_err());
        assert!(RebinParams::new(vec![0.0, -0.1, 5.0]).is_err());
        assert!(RebinParams::new(vec![0.0, f64::NAN, 5.0]).is_err());
        assert!("0, ten, 5".parse::<RebinParams>().is_err());
    }

    #[test]
    fn test_rejects_steps_below_f64_resolution() {
        // At 1e17 adjacent f64 values are 16 apart, so a step of 1 never moves X.
        let result = RebinParams::new(vec![1e17, 1.0, 1e17 + 1000.0]);
        assert!(matches!(result, Err(Error::InvalidBinParams(_))));
        assert!(RebinParams::new(vec![1.0, -1e-17, 2.0]).is_err());
        // A coarse enough step at the same magnitude is fine.
        let params = RebinParams::new(vec![1e17, 256.0, 1e17 + 1024.0]).unwrap();
        assert_eq!(params.create_axis().unwrap().len(), 5);
    }

    #[test]
    fn test_rejects_too_many_bins() {
        let result = "0, 1e-12, 1".parse::<RebinParams>();
        assert!(matches!(result, Err(Error::InvalidBinParams(_))));
        assert!(RebinParams::new(vec![1.0, -1e-9, 1e6]).is_err());
        let params = RebinParams::new(vec![0.0, 1.0, 1000.0]).unwrap();
        assert_eq!(params.create_bin_edges().unwrap().len(), 1001);
    }

    #[test]
    fn test_create_axis_stops_when_x_stalls() {
        // Bypasses validation to exercise the guard in the axis loop.
        let params = RebinParams {
            values: vec![1e17, 1.0, 1e17 + 1000.0],
        };
        assert!(matches!(
            params.create_axis(),
            Err(Error::InvalidBinParams(_))
        ));
    }

    #[test]
    fn test_display_round_trip() {
        let params: RebinParams = "0, 2.5, 10".parse().unwrap();
        assert_eq!(params.to_string(), "0,2.5,10");
    }
}
