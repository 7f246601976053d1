// Availability ledger: decides whether a car can be booked for a requested range

use crate::car::{Availability, Booking, Car};
use crate::error::CarServiceError;
use crate::interval::Interval;

/// Read-only view over one car's declared windows and confirmed bookings.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityLedger<'a> {
    availability: &'a [Availability],
    bookings: &'a [Booking],
}

impl<'a> AvailabilityLedger<'a> {
    pub fn new(availability: &'a [Availability], bookings: &'a [Booking]) -> Self {
        Self {
            availability,
            bookings,
        }
    }

    pub fn for_car(car: &'a Car) -> Self {
        Self::new(&car.availability, &car.bookings)
    }

    /// True iff a single declared window contains the whole request.
    /// Adjacent windows are not merged.
    pub fn is_open(&self, requested: &Interval) -> bool {
        self.availability
            .iter()
            .any(|window| window.interval.contains(requested))
    }

    pub fn is_free(&self, requested: &Interval) -> bool {
        self.conflicting_booking(requested).is_none()
    }

    pub fn is_bookable(&self, requested: &Interval) -> bool {
        self.is_open(requested) && self.is_free(requested)
    }

    pub fn conflicting_booking(&self, requested: &Interval) -> Option<&'a Booking> {
        self.bookings
            .iter()
            .find(|booking| booking.interval.overlaps(requested))
    }

    /// Same decision as [`is_bookable`](Self::is_bookable), with the reason on failure.
    pub fn ensure_bookable(&self, requested: &Interval) -> Result<(), CarServiceError> {
        if !self.is_open(requested) {
            return Err(CarServiceError::Conflict(format!(
                "{} is outside every availability window",
                requested
            )));
        }
        if let Some(booking) = self.conflicting_booking(requested) {
            return Err(CarServiceError::Conflict(format!(
                "{} overlaps booking {} {}",
                requested, booking.id, booking.interval
            )));
        }
        Ok(())
    }

    /// Net free sub-ranges of every declared window once bookings are subtracted,
    /// in window order then chronological order.
    pub fn free_windows(&self) -> Vec<Interval> {
        let mut free = Vec::new();

        for window in self.availability {
            let window = window.interval;
            let mut busy: Vec<Interval> = self
                .bookings
                .iter()
                .map(|booking| booking.interval)
                .filter(|booking| booking.overlaps(&window))
                .collect();
            busy.sort_by_key(|booking| booking.from());

            let mut cursor = window.from();
            for booking in busy {
                if booking.from() > cursor {
                    if let Ok(gap) = Interval::new(cursor, booking.from()) {
                        free.push(gap);
                    }
                }
                cursor = cursor.max(booking.to());
                if cursor >= window.to() {
                    break;
                }
            }
            if cursor < window.to() {
                if let Ok(tail) = Interval::new(cursor, window.to()) {
                    free.push(tail);
                }
            }
        }

        free
    }
}

pub fn is_open(car: &Car, requested: &Interval) -> bool {
    AvailabilityLedger::for_car(car).is_open(requested)
}

pub fn is_free(car: &Car, requested: &Interval) -> bool {
    AvailabilityLedger::for_car(car).is_free(requested)
}

pub fn is_bookable(car: &Car, requested: &Interval) -> bool {
    AvailabilityLedger::for_car(car).is_bookable(requested)
}
