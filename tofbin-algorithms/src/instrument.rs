//! Instrument geometry needed by geometry-aware algorithms.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A detector pixel modelled as a sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    pub id: i64,
    /// Centre position in metres.
    pub position: [f64; 3],
    /// Radius in metres.
    pub radius: f64,
    #[serde(default)]
    pub masked: bool,
}

impl Detector {
    /// Solid angle (steradians) subtended at `observer`.
    ///
    /// The cap formula `2 pi (1 - sqrt(1 - (R / r)^2))`; an observer inside
    /// the sphere sees the full `4 pi`.
    pub fn solid_angle(&self, observer: [f64; 3]) -> f64 {
        let r = distance(self.position, observer);
        if r <= self.radius {
            return 4.0 * PI;
        }
        let ratio = self.radius / r;
        2.0 * PI * (1.0 - (1.0 - ratio * ratio).sqrt())
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(p, q)| (p - q) * (p - q))
        .sum::<f64>()
        .sqrt()
}

/// Maps workspace indices to detectors.
pub trait Instrument: Send + Sync {
    /// Detector behind workspace index `index`, if any.
    fn detector(&self, index: usize) -> Option<Detector>;

    /// Sample position in metres.
    fn sample_position(&self) -> [f64; 3];
}

/// An instrument given as a plain list of detectors, one per workspace
/// index (`null` for spectra without a detector).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleInstrument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sample_position: [f64; 3],
    pub detectors: Vec<Option<Detector>>,
}

impl SimpleInstrument {
    /// Loads an instrument from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses an instrument from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let instrument: Self = serde_json::from_str(json)?;
        for detector in instrument.detectors.iter().flatten() {
            if !(detector.radius.is_finite() && detector.radius > 0.0) {
                return Err(Error::Config(format!(
                    "detector {} has invalid radius {}",
                    detector.id, detector.radius
                )));
            }
        }
        Ok(instrument)
    }
}

impl Instrument for SimpleInstrument {
    fn detector(&self, index: usize) -> Option<Detector> {
        self.detectors.get(index).copied().flatten()
    }

    fn sample_position(&self) -> [f64; 3] {
        self.sample_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solid_angle() {
        let detector = Detector {
            id: 1,
            position: [0.0, 0.0, 2.0],
            radius: 0.01,
            masked: false,
        };
        let omega = detector.solid_angle([0.0; 3]);
        // Far away the cap tends to pi R^2 / r^2.
        assert_relative_eq!(omega, PI * 0.01 * 0.01 / 4.0, max_relative = 1e-4);
        assert_relative_eq!(detector.solid_angle([0.0, 0.0, 2.005]), 4.0 * PI);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "test",
            "detectors": [
                {"id": 1, "position": [0.0, 0.0, 1.0], "radius": 0.1},
                null
            ]
        }"#;
        let instrument = SimpleInstrument::from_json(json).unwrap();
        assert_eq!(instrument.detector(0).map(|d| d.id), Some(1));
        assert!(instrument.detector(1).is_none());
        assert!(instrument.detector(2).is_none());
        assert_eq!(instrument.sample_position(), [0.0; 3]);
    }

    #[test]
    fn test_rejects_bad_radius() {
        let json = r#"{"detectors": [{"id": 7, "position": [0, 0, 1], "radius": -1}]}"#;
        assert!(matches!(
            SimpleInstrument::from_json(json),
            Err(Error::Config(_))
        ));
    }
}
