//! Time-series point types shared by the decoder and the drift model

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A decoded point as it travels on the wire: epoch milliseconds and an
/// `f32` reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeriesPoint {
    /// Epoch milliseconds
    pub timestamp_ms: f64,
    /// Sensor reading
    pub value: f32,
}

impl SeriesPoint {
    /// Create a point
    pub fn new(timestamp_ms: f64, value: f32) -> Self {
        Self { timestamp_ms, value }
    }
}

/// A timestamped reading at full precision, as consumed by the drift model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// Epoch milliseconds
    pub timestamp_ms: f64,
    /// Reading
    pub value: f64,
}

impl Sample {
    /// Create a sample
    pub fn new(timestamp_ms: f64, value: f64) -> Self {
        Self { timestamp_ms, value }
    }

    /// Both timestamp and value are finite
    pub fn is_finite(&self) -> bool {
        self.timestamp_ms.is_finite() && self.value.is_finite()
    }
}

impl From<SeriesPoint> for Sample {
    fn from(point: SeriesPoint) -> Self {
        Self {
            timestamp_ms: point.timestamp_ms,
            value: f64::from(point.value),
        }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((timestamp_ms, value): (f64, f64)) -> Self {
        Self { timestamp_ms, value }
    }
}
