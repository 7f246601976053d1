// HTTP implementation of the car service against the marketplace backend

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::car::{Booking, Car, NewCarBody};
use crate::credentials::CredentialProvider;
use crate::error::CarServiceError;
use crate::filter::{CarFilter, DEFAULT_SEARCH_RADIUS_KM};
use crate::interval::Interval;
use crate::service::{empty_distribution, CarService, ReviewDistribution};
use crate::sort::CarSort;
use crate::wire::{
    cars_from_wire, decode, decode_list, error_from_status, WireCar, WireCarQuery,
    WireIntervalBody, WireNewCar, WirePeriod,
};

pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Authentication failed. Please login again.";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub default_search_radius_km: f64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30_000,
            default_search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            user_agent: format!("carshare-engine/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Delegates filtering and sorting to the backend and maps its records into
/// the canonical shapes. Local validation happens before any request is sent.
pub struct RemoteCarService {
    client: Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl RemoteCarService {
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, CarServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                CarServiceError::NetworkFailure(format!("cannot build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let token = self.credentials.current_token();
        debug!("{} {} (token: {})", method, url, if token.is_some() { "yes" } else { "no" });

        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // Sends the request and returns the body of a 2xx answer
    async fn send(&self, builder: RequestBuilder) -> Result<Bytes, CarServiceError> {
        let response = builder
            .send()
            .await
            .map_err(|e| CarServiceError::NetworkFailure(e.to_string()))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session token");
            self.credentials.expire();
            return Err(CarServiceError::AuthenticationFailed(
                AUTHENTICATION_FAILED_MESSAGE.to_string(),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CarServiceError::NetworkFailure(e.to_string()))?;

        if !status.is_success() {
            let error = error_from_status(status.as_u16(), &body);
            debug!("Request failed with {}: {}", status, error);
            return Err(error);
        }

        Ok(body)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Bytes, CarServiceError> {
        self.send(self.request(method, path).json(body)).await
    }

    async fn fetch_cars(&self, builder: RequestBuilder) -> Result<Vec<Car>, CarServiceError> {
        let body = self.send(builder).await?;
        cars_from_wire(decode_list::<WireCar>(&body)?)
    }
}

#[async_trait]
impl CarService for RemoteCarService {
    async fn list_cars(
        &self,
        filter: &CarFilter,
        sort: Option<CarSort>,
    ) -> Result<Vec<Car>, CarServiceError> {
        filter.interval()?;
        let query = WireCarQuery::new(filter, sort, self.config.default_search_radius_km);

        let cars = self
            .fetch_cars(self.request(Method::GET, "/cars").query(&query))
            .await?;
        debug!("Backend search returned {} cars", cars.len());
        Ok(cars)
    }

    async fn get_car(&self, id: &str) -> Result<Car, CarServiceError> {
        let body = self
            .send(self.request(Method::GET, &format!("/cars/{}", id)))
            .await?;
        Car::try_from(decode::<WireCar>(&body)?)
    }

    async fn get_my_cars(&self, owner_id: u64) -> Result<Vec<Car>, CarServiceError> {
        self.fetch_cars(self.request(Method::GET, &format!("/cars/owner/{}", owner_id)))
            .await
    }

    async fn add_car(&self, body: &NewCarBody) -> Result<Car, CarServiceError> {
        body.validate()?;
        let response = self
            .send_json(Method::POST, "/cars", &WireNewCar::from(body))
            .await?;
        let car = Car::try_from(decode::<WireCar>(&response)?)?;
        info!("Listed car {} ({} {})", car.id, car.make, car.model);
        Ok(car)
    }

    async fn update_car(&self, id: &str, body: &NewCarBody) -> Result<Car, CarServiceError> {
        body.validate()?;
        let response = self
            .send_json(Method::PUT, &format!("/cars/{}", id), &WireNewCar::from(body))
            .await?;
        let car = Car::try_from(decode::<WireCar>(&response)?)?;
        info!("Updated car {}", car.id);
        Ok(car)
    }

    async fn remove_car(&self, id: &str) -> Result<(), CarServiceError> {
        self.send(self.request(Method::DELETE, &format!("/cars/{}", id)))
            .await?;
        info!("Removed car {}", id);
        Ok(())
    }

    async fn add_availability(
        &self,
        car_id: &str,
        interval: Interval,
    ) -> Result<(), CarServiceError> {
        interval.ensure_non_empty()?;
        self.send_json(
            Method::POST,
            "/car-availability",
            &WireIntervalBody::new(&interval, Some(car_id)),
        )
        .await?;
        info!("Car {} open {}", car_id, interval);
        Ok(())
    }

    async fn remove_availability(&self, id: &str) -> Result<(), CarServiceError> {
        self.send(self.request(Method::DELETE, &format!("/cars/availability/{}", id)))
            .await?;
        info!("Removed availability {}", id);
        Ok(())
    }

    async fn add_booking(&self, car_id: &str, interval: Interval) -> Result<(), CarServiceError> {
        interval.ensure_non_empty()?;
        self.send_json(
            Method::POST,
            &format!("/cars/{}/bookings", car_id),
            &WireIntervalBody::new(&interval, None),
        )
        .await?;
        info!("Booked car {} for {}", car_id, interval);
        Ok(())
    }

    async fn remove_booking(&self, id: &str) -> Result<(), CarServiceError> {
        self.send(self.request(Method::DELETE, &format!("/cars/bookings/{}", id)))
            .await?;
        info!("Cancelled booking {}", id);
        Ok(())
    }

    async fn list_my_bookings(&self) -> Result<Vec<Booking>, CarServiceError> {
        let body = self.send(self.request(Method::GET, "/bookings/me")).await?;
        let mut bookings = decode_list::<WirePeriod>(&body)?
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        bookings.sort_by_key(|booking| booking.interval.from());
        Ok(bookings)
    }

    async fn get_review_distribution(
        &self,
        owner_id: u64,
    ) -> Result<ReviewDistribution, CarServiceError> {
        let body = self
            .send(self.request(
                Method::GET,
                &format!("/users/{}/reviews/distribution", owner_id),
            ))
            .await?;
        let reported: ReviewDistribution = decode(&body)?;

        let mut distribution = empty_distribution();
        for (stars, count) in reported {
            if !(1..=5).contains(&stars) {
                return Err(CarServiceError::MalformedResponse(format!(
                    "review bucket {} is outside 1..=5",
                    stars
                )));
            }
            distribution.insert(stars, count);
        }
        Ok(distribution)
    }
}
