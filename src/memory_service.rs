// Deterministic in-memory car service over a fixed dataset

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::car::{Availability, Booking, Car, CarOwner, NewCarBody};
use crate::dataset::{CatalogDataset, Review};
use crate::error::CarServiceError;
use crate::filter::{filter_cars, CarFilter, DEFAULT_SEARCH_RADIUS_KM};
use crate::interval::Interval;
use crate::ledger::AvailabilityLedger;
use crate::service::{empty_distribution, CarService, ReviewDistribution};
use crate::sort::{sort_cars, CarSort};

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub page_size: usize,
    pub default_search_radius_km: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
        }
    }
}

struct CatalogState {
    cars: Vec<Car>,
    reviews: Vec<Review>,
    // booking id -> renter id, for bookings made through this service
    renters: HashMap<String, u64>,
    next_id: u64,
}

impl CatalogState {
    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn car(&self, id: &str) -> Result<&Car, CarServiceError> {
        self.cars
            .iter()
            .find(|car| car.id == id)
            .ok_or_else(|| CarServiceError::NotFound(format!("car {} not found", id)))
    }

    fn car_mut(&mut self, id: &str) -> Result<&mut Car, CarServiceError> {
        self.cars
            .iter_mut()
            .find(|car| car.id == id)
            .ok_or_else(|| CarServiceError::NotFound(format!("car {} not found", id)))
    }
}

// Next free numeric id across every record in the dataset
fn first_free_id(cars: &[Car]) -> u64 {
    cars.iter()
        .flat_map(|car| {
            std::iter::once(car.id.as_str())
                .chain(car.availability.iter().map(|a| a.id.as_str()))
                .chain(car.bookings.iter().map(|b| b.id.as_str()))
        })
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1)
}

/// Serves a fixed catalog acting as one signed-in user. Every call returns
/// fresh copies; mutations are applied atomically under a single lock.
pub struct InMemoryCarService {
    state: Mutex<CatalogState>,
    acting_user: CarOwner,
    config: CatalogConfig,
}

impl InMemoryCarService {
    pub fn new(dataset: CatalogDataset, acting_user: CarOwner) -> Self {
        Self::with_config(dataset, acting_user, CatalogConfig::default())
    }

    pub fn with_config(
        dataset: CatalogDataset,
        acting_user: CarOwner,
        config: CatalogConfig,
    ) -> Self {
        let next_id = first_free_id(&dataset.cars);
        Self {
            state: Mutex::new(CatalogState {
                cars: dataset.cars,
                reviews: dataset.reviews,
                renters: HashMap::new(),
                next_id,
            }),
            acting_user,
            config,
        }
    }

    pub fn acting_user(&self) -> &CarOwner {
        &self.acting_user
    }

    fn ensure_owner(&self, car: &Car, action: &str) -> Result<(), CarServiceError> {
        if car.owner.id != self.acting_user.id {
            return Err(CarServiceError::Forbidden(format!(
                "only the owner of car {} may {}",
                car.id, action
            )));
        }
        Ok(())
    }

    fn paginate(&self, cars: Vec<Car>, page: Option<u32>) -> Vec<Car> {
        match page {
            Some(page) if self.config.page_size > 0 => cars
                .into_iter()
                .skip(page as usize * self.config.page_size)
                .take(self.config.page_size)
                .collect(),
            _ => cars,
        }
    }

    fn car_from_body(&self, id: String, body: &NewCarBody) -> Car {
        Car {
            id,
            make: body.make.trim().to_string(),
            model: body.model.trim().to_string(),
            year: body.year,
            car_type: body.car_type,
            fuel_type: body.fuel_type,
            transmission: body.transmission,
            seats: body.seats,
            price_per_km: body.price,
            location: body.location.trim().to_string(),
            lat: Some(body.lat),
            lon: Some(body.lon),
            image_url: body.image.clone(),
            owner: self.acting_user.clone(),
            availability: Vec::new(),
            bookings: Vec::new(),
        }
    }
}

#[async_trait]
impl CarService for InMemoryCarService {
    async fn list_cars(
        &self,
        filter: &CarFilter,
        sort: Option<CarSort>,
    ) -> Result<Vec<Car>, CarServiceError> {
        let mut filter = filter.clone();
        if filter.distance.is_none() {
            filter.distance = Some(self.config.default_search_radius_km);
        }

        let mut cars = {
            let state = self.state.lock();
            filter_cars(&state.cars, &filter)?
        };
        if let Some(sort) = sort {
            sort_cars(&mut cars, sort, filter.origin());
        }

        debug!("In-memory search returned {} cars", cars.len());
        Ok(self.paginate(cars, filter.page))
    }

    async fn get_car(&self, id: &str) -> Result<Car, CarServiceError> {
        self.state.lock().car(id).cloned()
    }

    async fn get_my_cars(&self, owner_id: u64) -> Result<Vec<Car>, CarServiceError> {
        let state = self.state.lock();
        Ok(state
            .cars
            .iter()
            .filter(|car| car.owner.id == owner_id)
            .cloned()
            .collect())
    }

    async fn add_car(&self, body: &NewCarBody) -> Result<Car, CarServiceError> {
        body.validate()?;

        let mut state = self.state.lock();
        let id = state.allocate_id();
        let car = self.car_from_body(id, body);
        state.cars.push(car.clone());

        info!("Listed car {} ({} {})", car.id, car.make, car.model);
        Ok(car)
    }

    async fn update_car(&self, id: &str, body: &NewCarBody) -> Result<Car, CarServiceError> {
        body.validate()?;

        let mut state = self.state.lock();
        let existing = state.car(id)?;
        self.ensure_owner(existing, "update it")?;

        let mut updated = self.car_from_body(id.to_string(), body);
        let car = state.car_mut(id)?;
        updated.owner = car.owner.clone();
        updated.availability = std::mem::take(&mut car.availability);
        updated.bookings = std::mem::take(&mut car.bookings);
        *car = updated.clone();

        info!("Updated car {}", id);
        Ok(updated)
    }

    async fn remove_car(&self, id: &str) -> Result<(), CarServiceError> {
        let mut state = self.state.lock();
        self.ensure_owner(state.car(id)?, "remove it")?;

        let index = state
            .cars
            .iter()
            .position(|car| car.id == id)
            .ok_or_else(|| CarServiceError::NotFound(format!("car {} not found", id)))?;
        let removed = state.cars.remove(index);
        for booking in &removed.bookings {
            state.renters.remove(&booking.id);
        }

        info!("Removed car {}", id);
        Ok(())
    }

    async fn add_availability(
        &self,
        car_id: &str,
        interval: Interval,
    ) -> Result<(), CarServiceError> {
        interval.ensure_non_empty()?;

        let mut state = self.state.lock();
        self.ensure_owner(state.car(car_id)?, "change its availability")?;

        let id = state.allocate_id();
        state
            .car_mut(car_id)?
            .availability
            .push(Availability::new(id.clone(), interval));

        info!("Car {} open {} (availability {})", car_id, interval, id);
        Ok(())
    }

    async fn remove_availability(&self, id: &str) -> Result<(), CarServiceError> {
        let mut state = self.state.lock();
        let car = state
            .cars
            .iter()
            .find(|car| car.availability.iter().any(|a| a.id == id))
            .ok_or_else(|| CarServiceError::NotFound(format!("availability {} not found", id)))?;
        self.ensure_owner(car, "change its availability")?;

        let car_id = car.id.clone();
        state
            .car_mut(&car_id)?
            .availability
            .retain(|a| a.id != id);

        info!("Removed availability {} from car {}", id, car_id);
        Ok(())
    }

    async fn add_booking(&self, car_id: &str, interval: Interval) -> Result<(), CarServiceError> {
        interval.ensure_non_empty()?;

        let mut state = self.state.lock();
        AvailabilityLedger::for_car(state.car(car_id)?).ensure_bookable(&interval)?;

        let id = state.allocate_id();
        state
            .car_mut(car_id)?
            .bookings
            .push(Booking::new(id.clone(), interval).for_car(car_id));
        state.renters.insert(id.clone(), self.acting_user.id);

        info!("Booked car {} for {} (booking {})", car_id, interval, id);
        Ok(())
    }

    async fn remove_booking(&self, id: &str) -> Result<(), CarServiceError> {
        let mut state = self.state.lock();
        let car = state
            .cars
            .iter()
            .find(|car| car.bookings.iter().any(|b| b.id == id))
            .ok_or_else(|| CarServiceError::NotFound(format!("booking {} not found", id)))?;

        let is_renter = state.renters.get(id) == Some(&self.acting_user.id);
        if !is_renter && car.owner.id != self.acting_user.id {
            return Err(CarServiceError::Forbidden(format!(
                "booking {} belongs to another renter",
                id
            )));
        }

        let car_id = car.id.clone();
        state.car_mut(&car_id)?.bookings.retain(|b| b.id != id);
        state.renters.remove(id);

        info!("Cancelled booking {} on car {}", id, car_id);
        Ok(())
    }

    async fn list_my_bookings(&self) -> Result<Vec<Booking>, CarServiceError> {
        let state = self.state.lock();
        let mut bookings: Vec<Booking> = state
            .cars
            .iter()
            .flat_map(|car| car.bookings.iter())
            .filter(|booking| state.renters.get(&booking.id) == Some(&self.acting_user.id))
            .cloned()
            .collect();
        bookings.sort_by_key(|booking| booking.interval.from());
        Ok(bookings)
    }

    async fn get_review_distribution(
        &self,
        owner_id: u64,
    ) -> Result<ReviewDistribution, CarServiceError> {
        let state = self.state.lock();
        let mut distribution = empty_distribution();
        for review in state.reviews.iter().filter(|r| r.owner_id == owner_id) {
            // Only the 1..=5 buckets exist
            if let Some(count) = distribution.get_mut(&review.stars) {
                *count += 1;
            }
        }
        Ok(distribution)
    }
}
