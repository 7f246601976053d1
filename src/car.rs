// Canonical catalog records: cars, their owners, availability windows and bookings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CarServiceError;
use crate::geo::GeoPoint;
use crate::interval::Interval;

pub const DEFAULT_AVATAR_URL: &str = "https://cdn-icons-png.flaticon.com/512/8847/8847419.png";

// Earliest year accepted for a listed car
pub const MIN_CAR_YEAR: i32 = 1886;

macro_rules! facet_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CarServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(CarServiceError::ValidationFailure(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

facet_enum!(CarType {
    MicroCar => "Micro Car",
    Medium => "Medium",
    Suv => "SUV",
    MiniBus => "Mini Bus",
    Truck => "Truck",
    Van => "Van",
});

facet_enum!(FuelType {
    Electric => "Electric",
    Petrol => "Petrol",
    Diesel => "Diesel",
    Hybrid => "Hybrid",
});

facet_enum!(Transmission {
    Automatic => "Automatic",
    Manual => "Manual",
});

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarOwner {
    pub id: u64,
    pub name: String,
    pub avatar_url: String,
    pub rating: f64,
    pub number_of_reviews: u32,
}

/// An owner-declared window during which the car may be rented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub id: String,
    #[serde(flatten)]
    pub interval: Interval,
}

impl Availability {
    pub fn new(id: impl Into<String>, interval: Interval) -> Self {
        Self {
            id: id.into(),
            interval,
        }
    }
}

/// A confirmed reservation. `car_id` is filled in list contexts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(flatten)]
    pub interval: Interval,
    pub car_id: Option<String>,
}

impl Booking {
    pub fn new(id: impl Into<String>, interval: Interval) -> Self {
        Self {
            id: id.into(),
            interval,
            car_id: None,
        }
    }

    pub fn for_car(mut self, car_id: impl Into<String>) -> Self {
        self.car_id = Some(car_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub car_type: CarType,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub seats: u32,
    pub price_per_km: f64,
    pub location: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub image_url: String,
    pub owner: CarOwner,
    pub availability: Vec<Availability>,
    pub bookings: Vec<Booking>,
}

impl Car {
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

/// Body for creating or replacing a car listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCarBody {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub location: String,
    pub car_type: CarType,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub seats: u32,
    pub price: f64,
    pub image: String,
    pub lat: f64,
    pub lon: f64,
}

impl NewCarBody {
    pub fn validate(&self) -> Result<(), CarServiceError> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("make", &self.make),
            ("model", &self.model),
            ("location", &self.location),
            ("image", &self.image),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(CarServiceError::ValidationFailure(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        if self.year < MIN_CAR_YEAR {
            return Err(CarServiceError::ValidationFailure(format!(
                "year {} is not a plausible model year",
                self.year
            )));
        }
        if self.seats == 0 {
            return Err(CarServiceError::ValidationFailure(
                "a car needs at least one seat".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CarServiceError::ValidationFailure(format!(
                "price {} must be a non-negative number",
                self.price
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(CarServiceError::ValidationFailure(format!(
                "coordinates ({}, {}) are out of range",
                self.lat, self.lon
            )));
        }

        Ok(())
    }
}
