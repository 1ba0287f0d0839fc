//! Neutron event types.
//!
//! Three event representations exist, from cheapest to richest:
//! - [`TofEvent`]: time-of-flight and pulse time, implicit unit weight.
//! - [`WeightedEvent`]: adds a weight and squared error.
//! - [`WeightedEventNoTime`]: weighted, with the pulse time dropped.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Absolute pulse time in nanoseconds since the facility epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulseTime(pub i64);

impl PulseTime {
    /// Creates a new pulse time.
    #[inline]
    #[must_use]
    pub fn new(nanoseconds: i64) -> Self {
        Self(nanoseconds)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Storage representation of an event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventType {
    /// Plain time-of-flight events.
    Tof,
    /// Weighted events with pulse time.
    Weighted,
    /// Weighted events without pulse time.
    WeightedNoTime,
}

impl EventType {
    /// Rank used to decide whether a switch is a promotion.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Tof => 0,
            Self::Weighted => 1,
            Self::WeightedNoTime => 2,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tof => "TOF",
            Self::Weighted => "WEIGHTED",
            Self::WeightedNoTime => "WEIGHTED_NOTIME",
        };
        f.write_str(name)
    }
}

/// Common read access to any event representation.
pub trait Event: Copy + Send + Sync {
    /// Time-of-flight in microseconds.
    fn tof(&self) -> f64;

    /// Event weight (1 for unweighted events).
    fn weight(&self) -> f64;

    /// Squared error of the weight (1 for unweighted events).
    fn error_squared(&self) -> f64;

    /// Error of the weight.
    #[inline]
    fn error(&self) -> f64 {
        self.error_squared().sqrt()
    }
}

/// A single detected neutron.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TofEvent {
    /// Time-of-flight in microseconds.
    pub tof: f64,
    /// Pulse the neutron belongs to.
    pub pulse_time: PulseTime,
}

impl TofEvent {
    /// Creates a new event.
    #[inline]
    #[must_use]
    pub fn new(tof: f64, pulse_time: PulseTime) -> Self {
        Self { tof, pulse_time }
    }
}

impl Event for TofEvent {
    #[inline]
    fn tof(&self) -> f64 {
        self.tof
    }

    #[inline]
    fn weight(&self) -> f64 {
        1.0
    }

    #[inline]
    fn error_squared(&self) -> f64 {
        1.0
    }
}

/// A neutron event carrying a weight and its squared error.
///
/// The error is stored squared so that accumulation into a histogram is a
/// plain sum.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedEvent {
    /// Time-of-flight in microseconds.
    pub tof: f64,
    /// Pulse the neutron belongs to.
    pub pulse_time: PulseTime,
    /// Weight of the event.
    pub weight: f32,
    /// Squared error of the weight.
    pub error_squared: f32,
}

impl WeightedEvent {
    /// Creates a weighted event.
    #[inline]
    #[must_use]
    pub fn new(tof: f64, pulse_time: PulseTime, weight: f32, error_squared: f32) -> Self {
        Self {
            tof,
            pulse_time,
            weight,
            error_squared,
        }
    }
}

impl Default for WeightedEvent {
    fn default() -> Self {
        Self::from(TofEvent::default())
    }
}

impl From<TofEvent> for WeightedEvent {
    #[inline]
    fn from(event: TofEvent) -> Self {
        Self {
            tof: event.tof,
            pulse_time: event.pulse_time,
            weight: 1.0,
            error_squared: 1.0,
        }
    }
}

impl Event for WeightedEvent {
    #[inline]
    fn tof(&self) -> f64 {
        self.tof
    }

    #[inline]
    fn weight(&self) -> f64 {
        f64::from(self.weight)
    }

    #[inline]
    fn error_squared(&self) -> f64 {
        f64::from(self.error_squared)
    }
}

/// A weighted event without pulse time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedEventNoTime {
    /// Time-of-flight in microseconds.
    pub tof: f64,
    /// Weight of the event.
    pub weight: f32,
    /// Squared error of the weight.
    pub error_squared: f32,
}

impl WeightedEventNoTime {
    /// Creates a weighted event without pulse time.
    #[inline]
    #[must_use]
    pub fn new(tof: f64, weight: f32, error_squared: f32) -> Self {
        Self {
            tof,
            weight,
            error_squared,
        }
    }
}

impl From<TofEvent> for WeightedEventNoTime {
    #[inline]
    fn from(event: TofEvent) -> Self {
        Self::new(event.tof, 1.0, 1.0)
    }
}

impl From<WeightedEvent> for WeightedEventNoTime {
    #[inline]
    fn from(event: WeightedEvent) -> Self {
        Self::new(event.tof, event.weight, event.error_squared)
    }
}

impl Event for WeightedEventNoTime {
    #[inline]
    fn tof(&self) -> f64 {
        self.tof
    }

    #[inline]
    fn weight(&self) -> f64 {
        f64::from(self.weight)
    }

    #[inline]
    fn error_squared(&self) -> f64 {
        f64::from(self.error_squared)
    }
}
