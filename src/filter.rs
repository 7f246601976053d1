// Catalog filter engine: narrows a car collection by date range and facets

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::car::{Car, CarType, FuelType, Transmission};
use crate::error::CarServiceError;
use crate::geo::GeoPoint;
use crate::interval::Interval;
use crate::ledger::AvailabilityLedger;

pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;

/// A catalog query. Every `None` facet is unconstrained; an empty list is
/// treated the same as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CarFilter {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub car_type: Option<Vec<CarType>>,
    pub fuel_type: Option<Vec<FuelType>>,
    pub transmission: Option<Transmission>,
    pub brand: Option<Vec<String>>,
    pub more_than_5_seats: bool,
    pub min_rating: Option<f64>,
    pub distance: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub page: Option<u32>,
}

impl CarFilter {
    /// A query with only the mandatory date range set.
    pub fn between(from_date: DateTime<Utc>, to_date: DateTime<Utc>) -> Self {
        Self {
            from_date,
            to_date,
            price_min: None,
            price_max: None,
            car_type: None,
            fuel_type: None,
            transmission: None,
            brand: None,
            more_than_5_seats: false,
            min_rating: None,
            distance: None,
            lat: None,
            lon: None,
            page: None,
        }
    }

    pub fn interval(&self) -> Result<Interval, CarServiceError> {
        Interval::new(self.from_date, self.to_date)
    }

    pub fn origin(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    /// Collapses empty facet lists into `None`.
    pub fn normalized(&self) -> CarFilter {
        fn collapse<T: Clone>(values: &Option<Vec<T>>) -> Option<Vec<T>> {
            values.as_ref().filter(|values| !values.is_empty()).cloned()
        }

        CarFilter {
            car_type: collapse(&self.car_type),
            fuel_type: collapse(&self.fuel_type),
            brand: collapse(&self.brand),
            ..self.clone()
        }
    }
}

// Normalized query with the date range already validated
struct PreparedFilter {
    requested: Interval,
    origin: Option<GeoPoint>,
    radius_km: f64,
    filter: CarFilter,
}

impl PreparedFilter {
    fn new(filter: &CarFilter) -> Result<Self, CarServiceError> {
        Ok(Self {
            requested: filter.interval()?,
            origin: filter.origin(),
            radius_km: filter.distance.unwrap_or(DEFAULT_SEARCH_RADIUS_KM),
            filter: filter.normalized(),
        })
    }

    fn matches(&self, car: &Car) -> bool {
        let criteria = &self.filter;

        if !AvailabilityLedger::for_car(car).is_bookable(&self.requested) {
            return false;
        }

        if !criteria.price_min.map_or(true, |min| car.price_per_km >= min) {
            return false;
        }

        if !criteria.price_max.map_or(true, |max| car.price_per_km <= max) {
            return false;
        }

        if !criteria
            .car_type
            .as_ref()
            .map_or(true, |types| types.contains(&car.car_type))
        {
            return false;
        }

        if !criteria
            .fuel_type
            .as_ref()
            .map_or(true, |types| types.contains(&car.fuel_type))
        {
            return false;
        }

        if !criteria
            .transmission
            .map_or(true, |transmission| car.transmission == transmission)
        {
            return false;
        }

        if !criteria
            .brand
            .as_ref()
            .map_or(true, |brands| brands.contains(&car.make))
        {
            return false;
        }

        if criteria.more_than_5_seats && car.seats <= 5 {
            return false;
        }

        if !criteria
            .min_rating
            .map_or(true, |min| car.owner.rating >= min)
        {
            return false;
        }

        if let Some(origin) = self.origin {
            // A car without coordinates cannot be shown to be within the radius
            let within = car
                .coordinates()
                .map_or(false, |position| origin.distance_km(&position) <= self.radius_km);
            if !within {
                return false;
            }
        }

        true
    }
}

/// Returns the cars that pass every facet of `filter`, in source order.
/// Fails only when the query's date range is inverted.
pub fn filter_cars(cars: &[Car], filter: &CarFilter) -> Result<Vec<Car>, CarServiceError> {
    let prepared = PreparedFilter::new(filter)?;
    let filtered: Vec<Car> = cars
        .iter()
        .filter(|car| prepared.matches(car))
        .cloned()
        .collect();

    debug!(
        "Filtered {} cars down to {} for {}",
        cars.len(),
        filtered.len(),
        prepared.requested
    );

    Ok(filtered)
}
