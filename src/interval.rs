// Half-open date ranges used for availability windows, bookings and queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::error::CarServiceError;

/// A half-open range `[from, to)`. Construction guarantees `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl Interval {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, CarServiceError> {
        if from > to {
            return Err(CarServiceError::InvalidInterval(format!(
                "start {} is after end {}",
                from.to_rfc3339(),
                to.to_rfc3339()
            )));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    // Zero-duration range
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Half-open overlap; an empty range overlaps nothing.
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.from < other.to && other.from < self.to
    }

    pub fn contains(&self, inner: &Interval) -> bool {
        self.from <= inner.from && inner.to <= self.to
    }

    /// Rejects empty ranges; used wherever a booking or window is about to be created.
    pub fn ensure_non_empty(&self) -> Result<(), CarServiceError> {
        if self.is_empty() {
            return Err(CarServiceError::InvalidInterval(format!(
                "zero-duration range at {}",
                self.from.to_rfc3339()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}

pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.overlaps(b)
}

pub fn contains(outer: &Interval, inner: &Interval) -> bool {
    outer.contains(inner)
}
