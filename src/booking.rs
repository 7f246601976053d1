// Booking request state machine: local re-validation, remote submission, cancellation

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{debug, info, warn};

use crate::car::Car;
use crate::error::{CarServiceError, ErrorKind};
use crate::interval::Interval;
use crate::ledger::AvailabilityLedger;
use crate::service::CarService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingState {
    Draft,
    Validating,
    Confirmed,
    Rejected(ErrorKind),
    Active,
    Cancelled,
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingState::Draft => write!(f, "draft"),
            BookingState::Validating => write!(f, "validating"),
            BookingState::Confirmed => write!(f, "confirmed"),
            BookingState::Rejected(kind) => write!(f, "rejected ({:?})", kind),
            BookingState::Active => write!(f, "active"),
            BookingState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of a cancellation. Both outcomes are successes for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    // The booking was already gone
    NotFound,
}

/// One renter's request for a car over an interval.
///
/// `car` is the snapshot the renter picked the car from; it is what the local
/// check runs against, so it may be stale by the time the request is submitted.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    car: Car,
    interval: Interval,
    state: BookingState,
    booking_id: Option<String>,
}

impl BookingRequest {
    pub fn car(&self) -> &Car {
        &self.car
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn state(&self) -> BookingState {
        self.state
    }

    /// Id assigned by the service, known once the confirmed booking was found
    /// in the renter's booking list.
    pub fn booking_id(&self) -> Option<&str> {
        self.booking_id.as_deref()
    }

    fn expect_state(&self, allowed: &[BookingState], action: &str) -> Result<(), CarServiceError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(CarServiceError::InvalidState(format!(
            "cannot {} a {} booking",
            action, self.state
        )))
    }
}

pub struct BookingLifecycle<S: CarService> {
    service: S,
}

impl<S: CarService> BookingLifecycle<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn draft(&self, car: Car, interval: Interval) -> BookingRequest {
        BookingRequest {
            car,
            interval,
            state: BookingState::Draft,
            booking_id: None,
        }
    }

    /// Validates the request locally and, if that passes, submits it.
    ///
    /// A zero-duration interval or a conflict with the car snapshot rejects the
    /// request without calling the service. Errors from the service reject the
    /// request with the same kind and are returned unchanged.
    pub async fn submit(&self, request: &mut BookingRequest) -> Result<(), CarServiceError> {
        request.expect_state(&[BookingState::Draft], "submit")?;
        request.state = BookingState::Validating;

        let local = request.interval.ensure_non_empty().and_then(|_| {
            AvailabilityLedger::for_car(&request.car).ensure_bookable(&request.interval)
        });
        if let Err(e) = local {
            debug!("Booking of car {} rejected locally: {}", request.car.id, e);
            request.state = BookingState::Rejected(e.kind());
            return Err(e);
        }

        if let Err(e) = self.service.add_booking(&request.car.id, request.interval).await {
            if e.kind() == ErrorKind::Conflict {
                warn!(
                    "Car {} was taken for {} after local validation passed",
                    request.car.id, request.interval
                );
            }
            request.state = BookingState::Rejected(e.kind());
            return Err(e);
        }

        request.state = BookingState::Confirmed;
        let resolved = self
            .resolve_booking_id(&request.car.id, &request.interval)
            .await;
        request.booking_id = match resolved {
            Ok(id) => id,
            Err(e) => {
                // The booking exists either way; cancel retries the lookup
                warn!("Could not list bookings to resolve car {} booking: {}", request.car.id, e);
                None
            }
        };
        info!(
            "Booking of car {} for {} confirmed",
            request.car.id, request.interval
        );
        Ok(())
    }

    /// Moves a confirmed booking to `Active` once its start has been reached.
    /// Returns whether the state changed.
    pub fn activate(
        &self,
        request: &mut BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<bool, CarServiceError> {
        match request.state {
            BookingState::Active => Ok(false),
            BookingState::Confirmed if now >= request.interval.from() => {
                request.state = BookingState::Active;
                Ok(true)
            }
            BookingState::Confirmed => Ok(false),
            _ => {
                request.expect_state(&[BookingState::Confirmed], "activate")?;
                Ok(false)
            }
        }
    }

    /// Cancels a confirmed or active booking. Cancelling twice, or cancelling a
    /// booking the service no longer knows, reports `CancelOutcome::NotFound`.
    /// Any other service error is returned and the request keeps its state.
    pub async fn cancel(
        &self,
        request: &mut BookingRequest,
    ) -> Result<CancelOutcome, CarServiceError> {
        if request.state == BookingState::Cancelled {
            return Ok(CancelOutcome::NotFound);
        }
        request.expect_state(&[BookingState::Confirmed, BookingState::Active], "cancel")?;

        if request.booking_id.is_none() {
            request.booking_id = self
                .resolve_booking_id(&request.car.id, &request.interval)
                .await?;
        }

        let outcome = match request.booking_id.as_deref() {
            Some(id) => self.cancel_by_id(id).await?,
            None => CancelOutcome::NotFound,
        };
        request.state = BookingState::Cancelled;
        Ok(outcome)
    }

    /// Cancels a booking picked from the renter's booking list.
    pub async fn cancel_by_id(&self, booking_id: &str) -> Result<CancelOutcome, CarServiceError> {
        match self.service.remove_booking(booking_id).await {
            Ok(()) => {
                info!("Booking {} cancelled", booking_id);
                Ok(CancelOutcome::Cancelled)
            }
            Err(CarServiceError::NotFound(_)) => {
                debug!("Booking {} was already gone", booking_id);
                Ok(CancelOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    // Ok(None) only when the booking list was read and the booking is not in it
    async fn resolve_booking_id(
        &self,
        car_id: &str,
        interval: &Interval,
    ) -> Result<Option<String>, CarServiceError> {
        let found = self
            .service
            .list_my_bookings()
            .await?
            .into_iter()
            .find(|b| b.car_id.as_deref() == Some(car_id) && b.interval == *interval)
            .map(|b| b.id);
        if found.is_none() {
            warn!("Confirmed booking of car {} for {} not in booking list", car_id, interval);
        }
        Ok(found)
    }
}
