use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::car::{Booking, Car, NewCarBody};
use crate::error::CarServiceError;
use crate::filter::CarFilter;
use crate::interval::Interval;
use crate::sort::CarSort;

/// Star value (1..=5) to number of reviews with that value.
pub type ReviewDistribution = BTreeMap<u8, u32>;

/// Zero-filled distribution with every star value present.
pub fn empty_distribution() -> ReviewDistribution {
    (1..=5).map(|stars| (stars, 0)).collect()
}

// The only boundary between the engine and a data source. Both the in-memory
// catalog and the HTTP client implement it with the same observable behavior.
#[async_trait]
pub trait CarService: Send + Sync + 'static {
    // Search the catalog; cars that are not bookable for the filter's range are excluded
    async fn list_cars(
        &self,
        filter: &CarFilter,
        sort: Option<CarSort>,
    ) -> Result<Vec<Car>, CarServiceError>;

    async fn get_car(&self, id: &str) -> Result<Car, CarServiceError>;

    async fn get_my_cars(&self, owner_id: u64) -> Result<Vec<Car>, CarServiceError>;

    async fn add_car(&self, body: &NewCarBody) -> Result<Car, CarServiceError>;

    async fn update_car(&self, id: &str, body: &NewCarBody) -> Result<Car, CarServiceError>;

    async fn remove_car(&self, id: &str) -> Result<(), CarServiceError>;

    async fn add_availability(
        &self,
        car_id: &str,
        interval: Interval,
    ) -> Result<(), CarServiceError>;

    async fn remove_availability(&self, id: &str) -> Result<(), CarServiceError>;

    // Fails with Conflict when the range is not bookable at the time of the call
    async fn add_booking(&self, car_id: &str, interval: Interval) -> Result<(), CarServiceError>;

    async fn remove_booking(&self, id: &str) -> Result<(), CarServiceError>;

    async fn list_my_bookings(&self) -> Result<Vec<Booking>, CarServiceError>;

    async fn get_review_distribution(
        &self,
        owner_id: u64,
    ) -> Result<ReviewDistribution, CarServiceError>;
}

#[async_trait]
impl<S: CarService + ?Sized> CarService for Arc<S> {
    async fn list_cars(
        &self,
        filter: &CarFilter,
        sort: Option<CarSort>,
    ) -> Result<Vec<Car>, CarServiceError> {
        (**self).list_cars(filter, sort).await
    }

    async fn get_car(&self, id: &str) -> Result<Car, CarServiceError> {
        (**self).get_car(id).await
    }

    async fn get_my_cars(&self, owner_id: u64) -> Result<Vec<Car>, CarServiceError> {
        (**self).get_my_cars(owner_id).await
    }

    async fn add_car(&self, body: &NewCarBody) -> Result<Car, CarServiceError> {
        (**self).add_car(body).await
    }

    async fn update_car(&self, id: &str, body: &NewCarBody) -> Result<Car, CarServiceError> {
        (**self).update_car(id, body).await
    }

    async fn remove_car(&self, id: &str) -> Result<(), CarServiceError> {
        (**self).remove_car(id).await
    }

    async fn add_availability(
        &self,
        car_id: &str,
        interval: Interval,
    ) -> Result<(), CarServiceError> {
        (**self).add_availability(car_id, interval).await
    }

    async fn remove_availability(&self, id: &str) -> Result<(), CarServiceError> {
        (**self).remove_availability(id).await
    }

    async fn add_booking(&self, car_id: &str, interval: Interval) -> Result<(), CarServiceError> {
        (**self).add_booking(car_id, interval).await
    }

    async fn remove_booking(&self, id: &str) -> Result<(), CarServiceError> {
        (**self).remove_booking(id).await
    }

    async fn list_my_bookings(&self) -> Result<Vec<Booking>, CarServiceError> {
        (**self).list_my_bookings().await
    }

    async fn get_review_distribution(
        &self,
        owner_id: u64,
    ) -> Result<ReviewDistribution, CarServiceError> {
        (**self).get_review_distribution(owner_id).await
    }
}
