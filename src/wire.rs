// Backend JSON shapes and their mapping into the canonical catalog records

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::car::{
    Availability, Booking, Car, CarOwner, CarType, FuelType, NewCarBody, Transmission,
    DEFAULT_AVATAR_URL,
};
use crate::error::CarServiceError;
use crate::filter::CarFilter;
use crate::interval::Interval;
use crate::sort::CarSort;

// Backends send ids as numbers or strings; the canonical id is always a string
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireId::Number(n) => write!(f, "{}", n),
            WireId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for WireId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) if n.to_string() == id => WireId::Number(n),
            _ => WireId::Text(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireOwner {
    pub id: Option<u64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[serde(alias = "name")]
    pub display_name: Option<String>,
    #[serde(alias = "avatarUrl")]
    pub avatar_base64: Option<String>,
    pub rating: Option<f64>,
    pub number_of_reviews: Option<u32>,
}

impl From<WireOwner> for CarOwner {
    fn from(owner: WireOwner) -> Self {
        let name = match (&owner.first_name, &owner.last_name) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{} {}", first, last)
            }
            _ => owner
                .display_name
                .clone()
                .or_else(|| owner.username.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
        };

        CarOwner {
            id: owner.id.unwrap_or(0),
            name,
            avatar_url: owner
                .avatar_base64
                .filter(|avatar| !avatar.is_empty())
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
            rating: owner.rating.unwrap_or(0.0).clamp(0.0, 5.0),
            number_of_reviews: owner.number_of_reviews.unwrap_or(0),
        }
    }
}

impl From<&CarOwner> for WireOwner {
    fn from(owner: &CarOwner) -> Self {
        WireOwner {
            id: Some(owner.id),
            display_name: Some(owner.name.clone()),
            avatar_base64: Some(owner.avatar_url.clone()),
            rating: Some(owner.rating),
            number_of_reviews: Some(owner.number_of_reviews),
            ..Default::default()
        }
    }
}

/// A booking or availability record; `car`/`carId` appear in booking lists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePeriod {
    pub id: WireId,
    #[serde(alias = "from")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "to")]
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_id: Option<WireId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car: Option<Box<WireCar>>,
}

impl WirePeriod {
    fn interval(&self) -> Result<Interval, CarServiceError> {
        Interval::new(self.start_date, self.end_date).map_err(|e| {
            CarServiceError::MalformedResponse(format!("record {}: {}", self.id, e.message()))
        })
    }
}

impl TryFrom<WirePeriod> for Availability {
    type Error = CarServiceError;

    fn try_from(period: WirePeriod) -> Result<Self, Self::Error> {
        Ok(Availability::new(period.id.to_string(), period.interval()?))
    }
}

impl TryFrom<WirePeriod> for Booking {
    type Error = CarServiceError;

    fn try_from(period: WirePeriod) -> Result<Self, Self::Error> {
        let car_id = period
            .car_id
            .as_ref()
            .map(|id| id.to_string())
            .or_else(|| period.car.as_ref().map(|car| car.id.to_string()));
        Ok(Booking {
            id: period.id.to_string(),
            interval: period.interval()?,
            car_id,
        })
    }
}

impl From<&Availability> for WirePeriod {
    fn from(availability: &Availability) -> Self {
        WirePeriod {
            id: WireId::from(availability.id.as_str()),
            start_date: availability.interval.from(),
            end_date: availability.interval.to(),
            car_id: None,
            car: None,
        }
    }
}

impl From<&Booking> for WirePeriod {
    fn from(booking: &Booking) -> Self {
        WirePeriod {
            id: WireId::from(booking.id.as_str()),
            start_date: booking.interval.from(),
            end_date: booking.interval.to(),
            car_id: booking.car_id.as_deref().map(WireId::from),
            car: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCar {
    pub id: WireId,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_km: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "imageUrl")]
    pub image_base64: Option<String>,
    pub car_type: CarType,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub seats: u32,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "long")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub owner: Option<WireOwner>,
    #[serde(default)]
    pub bookings: Vec<WirePeriod>,
    #[serde(default, alias = "availability")]
    pub availabilities: Vec<WirePeriod>,
}

impl TryFrom<WireCar> for Car {
    type Error = CarServiceError;

    fn try_from(car: WireCar) -> Result<Self, Self::Error> {
        let id = car.id.to_string();
        let availability = car
            .availabilities
            .into_iter()
            .map(Availability::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let bookings = car
            .bookings
            .into_iter()
            .map(|period| Booking::try_from(period).map(|booking| booking.for_car(id.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Car {
            id,
            make: car.make,
            model: car.model,
            year: car.year,
            car_type: car.car_type,
            fuel_type: car.fuel_type,
            transmission: car.transmission,
            seats: car.seats,
            price_per_km: car.price_per_km,
            location: car.location,
            lat: car.latitude,
            lon: car.longitude,
            image_url: car.image_base64.unwrap_or_default(),
            owner: car.owner.unwrap_or_default().into(),
            availability,
            bookings,
        })
    }
}

impl From<&Car> for WireCar {
    fn from(car: &Car) -> Self {
        WireCar {
            id: WireId::from(car.id.as_str()),
            make: car.make.clone(),
            model: car.model.clone(),
            year: car.year,
            price_per_km: car.price_per_km,
            location: car.location.clone(),
            image_base64: Some(car.image_url.clone()),
            car_type: car.car_type,
            fuel_type: car.fuel_type,
            transmission: car.transmission,
            seats: car.seats,
            latitude: car.lat,
            longitude: car.lon,
            owner: Some(WireOwner::from(&car.owner)),
            bookings: car.bookings.iter().map(WirePeriod::from).collect(),
            availabilities: car.availability.iter().map(WirePeriod::from).collect(),
        }
    }
}

// Body of POST /cars and PUT /cars/{id}
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_per_km: f64,
    pub location: String,
    pub image_base64: String,
    pub car_type: CarType,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub seats: u32,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&NewCarBody> for WireNewCar {
    fn from(body: &NewCarBody) -> Self {
        WireNewCar {
            make: body.make.clone(),
            model: body.model.clone(),
            year: body.year,
            price_per_km: body.price,
            location: body.location.clone(),
            image_base64: body.image.clone(),
            car_type: body.car_type,
            fuel_type: body.fuel_type,
            transmission: body.transmission,
            seats: body.seats,
            latitude: body.lat,
            longitude: body.lon,
        }
    }
}

impl From<WireNewCar> for NewCarBody {
    fn from(body: WireNewCar) -> Self {
        NewCarBody {
            make: body.make,
            model: body.model,
            year: body.year,
            location: body.location,
            car_type: body.car_type,
            transmission: body.transmission,
            fuel_type: body.fuel_type,
            seats: body.seats,
            price: body.price_per_km,
            image: body.image_base64,
            lat: body.latitude,
            lon: body.longitude,
        }
    }
}

// Body of POST /car-availability and POST /cars/{id}/bookings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIntervalBody {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_id: Option<String>,
}

impl WireIntervalBody {
    pub fn new(interval: &Interval, car_id: Option<&str>) -> Self {
        Self {
            start_date: interval.from(),
            end_date: interval.to(),
            car_id: car_id.map(str::to_string),
        }
    }

    pub fn interval(&self) -> Result<Interval, CarServiceError> {
        Interval::new(self.start_date, self.end_date)
    }
}

/// Query string of `GET /cars`. List facets are comma-joined.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCarQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub more_than5_seats: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

fn join_labels<T: ToString>(values: &Option<Vec<T>>) -> Option<String> {
    values.as_ref().map(|values| {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    })
}

fn split_labels<T: std::str::FromStr<Err = CarServiceError>>(
    joined: &Option<String>,
) -> Result<Option<Vec<T>>, CarServiceError> {
    joined
        .as_ref()
        .map(|joined| {
            joined
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::parse)
                .collect::<Result<Vec<T>, _>>()
        })
        .transpose()
}

impl WireCarQuery {
    /// `distance` is only sent together with a location, defaulting to `default_radius_km`.
    pub fn new(filter: &CarFilter, sort: Option<CarSort>, default_radius_km: f64) -> Self {
        let filter = filter.normalized();
        let has_origin = filter.origin().is_some();

        WireCarQuery {
            from_date: Some(filter.from_date),
            to_date: Some(filter.to_date),
            price_min: filter.price_min,
            price_max: filter.price_max,
            car_type: join_labels(&filter.car_type),
            fuel_type: join_labels(&filter.fuel_type),
            transmission: filter.transmission.map(|t| t.to_string()),
            brand: join_labels(&filter.brand),
            more_than5_seats: filter.more_than_5_seats.then_some(true),
            min_rating: filter.min_rating,
            distance: has_origin.then(|| filter.distance.unwrap_or(default_radius_km)),
            lat: if has_origin { filter.lat } else { None },
            long: if has_origin { filter.lon } else { None },
            page: filter.page,
            sort: sort.map(|s| s.to_string()),
        }
    }

    /// Server side of [`WireCarQuery::new`].
    pub fn into_filter(self) -> Result<(CarFilter, Option<CarSort>), CarServiceError> {
        let (Some(from_date), Some(to_date)) = (self.from_date, self.to_date) else {
            return Err(CarServiceError::ValidationFailure(
                "fromDate and toDate are required".to_string(),
            ));
        };

        let filter = CarFilter {
            price_min: self.price_min,
            price_max: self.price_max,
            car_type: split_labels(&self.car_type)?,
            fuel_type: split_labels(&self.fuel_type)?,
            transmission: self
                .transmission
                .as_deref()
                .map(str::parse)
                .transpose()?,
            brand: self.brand.as_ref().map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|brand| !brand.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            more_than_5_seats: self.more_than5_seats.unwrap_or(false),
            min_rating: self.min_rating,
            distance: self.distance,
            lat: self.lat,
            lon: self.long,
            page: self.page,
            ..CarFilter::between(from_date, to_date)
        };
        let sort = self.sort.as_deref().map(str::parse).transpose()?;

        Ok((filter, sort))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WireErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Maps a non-2xx, non-401 answer to an error, using the body's `message` when present.
pub fn error_from_status(status: u16, body: &Bytes) -> CarServiceError {
    let message = serde_json::from_slice::<WireErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| format!("HTTP error! status: {}", status));

    match status {
        400 | 422 => CarServiceError::ValidationFailure(message),
        401 => CarServiceError::AuthenticationFailed(message),
        403 => CarServiceError::Forbidden(message),
        404 => CarServiceError::NotFound(message),
        409 => CarServiceError::Conflict(message),
        _ => CarServiceError::Service { status, message },
    }
}

/// Decodes a JSON body; an empty body or `null` on a list endpoint is an empty list.
pub fn decode_list<T: serde::de::DeserializeOwned>(
    body: &Bytes,
) -> Result<Vec<T>, CarServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let decoded: Option<Vec<T>> = serde_json::from_slice(body)
        .map_err(|e| CarServiceError::MalformedResponse(e.to_string()))?;
    Ok(decoded.unwrap_or_default())
}

pub fn decode<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, CarServiceError> {
    serde_json::from_slice(body).map_err(|e| CarServiceError::MalformedResponse(e.to_string()))
}

pub fn cars_from_wire(cars: Vec<WireCar>) -> Result<Vec<Car>, CarServiceError> {
    cars.into_iter().map(Car::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::test_support::{car, day, range};

    const BACKEND_CAR: &str = r#"{
        "id": 42,
        "make": "Volvo",
        "model": "V60",
        "year": 2019,
        "pricePerKm": 3.5,
        "location": "Aarhus",
        "imageBase64": "data:image/jpeg;base64,AAA",
        "carType": "Medium",
        "fuelType": "Hybrid",
        "transmission": "Automatic",
        "seats": 5,
        "latitude": 56.16,
        "longitude": 10.2,
        "owner": {"id": 7, "firstName": "Lars", "lastName": "Holm", "rating": 4.4, "numberOfReviews": 12},
        "bookings": [{"id": 3, "startDate": "2025-06-03T00:00:00Z", "endDate": "2025-06-05T00:00:00Z"}],
        "availabilities": [{"id": "w1", "startDate": "2025-06-01T00:00:00Z", "endDate": "2025-06-10T00:00:00Z"}]
    }"#;

    #[test]
    fn test_backend_car_maps_to_canonical_shape() {
        let wire: WireCar = serde_json::from_str(BACKEND_CAR).unwrap();
        let car = Car::try_from(wire).unwrap();

        assert_eq!(car.id, "42");
        assert_eq!(car.owner.name, "Lars Holm");
        assert_eq!(car.owner.id, 7);
        assert_eq!(car.owner.avatar_url, DEFAULT_AVATAR_URL);
        assert_eq!(car.lat, Some(56.16));
        assert_eq!(car.availability, vec![Availability::new("w1", range(1, 10))]);
        assert_eq!(car.bookings.len(), 1);
        assert_eq!(car.bookings[0].id, "3");
        assert_eq!(car.bookings[0].interval, range(3, 5));
        assert_eq!(car.bookings[0].car_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_legacy_field_names_are_accepted() {
        let json = r#"{
            "id": "abc", "make": "Fiat", "model": "500", "year": 2015, "pricePerKm": 1.0,
            "carType": "Micro Car", "fuelType": "Petrol", "transmission": "Manual", "seats": 4,
            "owner": {"username": "fiatfan", "rating": 9.0},
            "availability": [{"id": 1, "from": "2025-06-01T00:00:00Z", "to": "2025-06-02T00:00:00Z"}]
        }"#;
        let car = Car::try_from(serde_json::from_str::<WireCar>(json).unwrap()).unwrap();

        assert_eq!(car.id, "abc");
        assert_eq!(car.owner.name, "fiatfan");
        assert_eq!(car.owner.rating, 5.0);
        assert_eq!(car.owner.number_of_reviews, 0);
        assert_eq!(car.availability[0].id, "1");
        assert!(car.bookings.is_empty());
        assert_eq!(car.lat, None);
    }

    #[test]
    fn test_missing_owner_is_unknown() {
        let owner: CarOwner = WireOwner::default().into();
        assert_eq!(owner.name, "Unknown");
        assert_eq!(owner.rating, 0.0);
    }

    #[test]
    fn test_inverted_period_is_malformed() {
        let json = r#"{"id": 1, "startDate": "2025-06-05T00:00:00Z", "endDate": "2025-06-01T00:00:00Z"}"#;
        let period: WirePeriod = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Booking::try_from(period),
            Err(CarServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_booking_list_entry_takes_car_reference() {
        let json = r#"{"id": 9, "startDate": "2025-06-01T00:00:00Z", "endDate": "2025-06-02T00:00:00Z", "carId": 42}"#;
        let booking = Booking::try_from(serde_json::from_str::<WirePeriod>(json).unwrap()).unwrap();
        assert_eq!(booking.car_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_canonical_car_survives_wire_round_trip() {
        let listed = crate::filter::test_support::with_booking(
            car("17", CarType::Suv, 4.0),
            3,
            5,
        );
        let json = serde_json::to_string(&WireCar::from(&listed)).unwrap();
        let back = Car::try_from(serde_json::from_str::<WireCar>(&json).unwrap()).unwrap();

        assert_eq!(back.id, listed.id);
        assert_eq!(back.availability, listed.availability);
        assert_eq!(back.bookings, listed.bookings);
        assert_eq!(back.owner.name, listed.owner.name);
    }

    #[test]
    fn test_query_translation() {
        let filter = CarFilter {
            car_type: Some(vec![CarType::Suv, CarType::MiniBus]),
            brand: Some(vec![]),
            more_than_5_seats: true,
            lat: Some(55.0),
            lon: Some(12.0),
            ..CarFilter::between(day(1), day(5))
        };
        let query = WireCarQuery::new(&filter, Some(CarSort::Rating), 10.0);

        assert_eq!(query.car_type.as_deref(), Some("SUV,Mini Bus"));
        assert_eq!(query.brand, None);
        assert_eq!(query.more_than5_seats, Some(true));
        assert_eq!(query.distance, Some(10.0));
        assert_eq!(query.sort.as_deref(), Some("Rating"));

        let (parsed, sort) = query.into_filter().unwrap();
        assert_eq!(parsed.car_type, filter.car_type);
        assert_eq!(parsed.brand, None);
        assert_eq!(parsed.distance, Some(10.0));
        assert_eq!(parsed.from_date, day(1));
        assert_eq!(sort, Some(CarSort::Rating));
    }

    #[test]
    fn test_distance_not_sent_without_location() {
        let filter = CarFilter {
            distance: Some(25.0),
            ..CarFilter::between(day(1), day(5))
        };
        let query = WireCarQuery::new(&filter, None, 10.0);
        assert_eq!(query.distance, None);
        assert_eq!(query.lat, None);
    }

    #[test]
    fn test_error_from_status_uses_message() {
        let body = Bytes::from_static(br#"{"message": "Car is already booked"}"#);
        assert_eq!(
            error_from_status(409, &body),
            CarServiceError::Conflict("Car is already booked".to_string())
        );
        assert_eq!(
            error_from_status(404, &Bytes::new()),
            CarServiceError::NotFound("HTTP error! status: 404".to_string())
        );
        assert_eq!(
            error_from_status(500, &Bytes::from_static(b"upstream down")),
            CarServiceError::Service {
                status: 500,
                message: "upstream down".to_string()
            }
        );
    }

    #[test]
    fn test_decode_list_accepts_empty_body() {
        let cars: Vec<WireCar> = decode_list(&Bytes::new()).unwrap();
        assert!(cars.is_empty());
        let cars: Vec<WireCar> = decode_list(&Bytes::from_static(b"null")).unwrap();
        assert!(cars.is_empty());
        assert!(decode_list::<WireCar>(&Bytes::from_static(b"{")).is_err());
    }
}
