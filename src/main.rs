use anyhow::Context;
use carshare_engine::{
    BookingLifecycle, CarFilter, CarOwner, CarService, CarSort, CatalogDataset, ClientConfig,
    CredentialProvider, InMemoryCarService, RemoteCarService, SessionCredentials,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Copenhagen city centre
const DEMO_LAT: f64 = 55.6761;
const DEMO_LON: f64 = 12.5683;

fn demo_renter() -> CarOwner {
    CarOwner {
        id: 100,
        name: "Demo Renter".to_string(),
        avatar_url: carshare_engine::car::DEFAULT_AVATAR_URL.to_string(),
        rating: 0.0,
        number_of_reviews: 0,
    }
}

// Default search window falls inside the sample catalog's June 2025 availability
fn demo_date(day: u32) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0)
        .single()
        .context("invalid demo date")
}

fn parse_date(arg: Option<String>, default: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    match arg {
        Some(value) => Ok(DateTime::parse_from_rfc3339(&value)
            .with_context(|| format!("invalid date {}", value))?
            .with_timezone(&Utc)),
        None => Ok(default),
    }
}

fn build_service() -> anyhow::Result<Arc<dyn CarService>> {
    match std::env::var("CARSHARE_API_URL") {
        Ok(base_url) => {
            let credentials = Arc::new(SessionCredentials::new());
            if let Ok(token) = std::env::var("CARSHARE_API_TOKEN") {
                credentials.set_token(token);
            }
            credentials.on_token_expired(Box::new(|| warn!("Session expired, log in again")));

            info!("Using backend at {}", base_url);
            let config = ClientConfig::with_base_url(base_url);
            let service = RemoteCarService::new(config, credentials)?;
            Ok(Arc::new(service))
        }
        Err(_) => {
            info!("CARSHARE_API_URL not set, using the sample catalog");
            let dataset = CatalogDataset::load_sample()?;
            Ok(Arc::new(InMemoryCarService::new(dataset, demo_renter())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Usage: carshare_engine [cheapest|closest|rating] [from] [to]
    let mut args = std::env::args().skip(1);
    let sort = args
        .next()
        .map(|value| value.parse::<CarSort>())
        .transpose()?
        .unwrap_or(CarSort::Cheapest);
    let from = parse_date(args.next(), demo_date(3)?)?;
    let to = parse_date(args.next(), demo_date(4)?)?;

    let service = build_service()?;
    let filter = CarFilter {
        lat: Some(DEMO_LAT),
        lon: Some(DEMO_LON),
        ..CarFilter::between(from, to)
    };

    let (cars, bookings) = futures::try_join!(
        service.list_cars(&filter, Some(sort)),
        service.list_my_bookings()
    )?;

    info!("{} cars bookable from {} to {} ({})", cars.len(), from, to, sort);
    for (i, car) in cars.iter().enumerate() {
        println!(
            "{}. {} {} ({}, {}) {:.2}/km",
            i + 1,
            car.make,
            car.model,
            car.year,
            car.car_type,
            car.price_per_km
        );
        println!(
            "   {} | {} seats | {} | {}",
            car.location, car.seats, car.fuel_type, car.transmission
        );
        println!(
            "   Owner: {} ({:.1}, {} reviews)",
            car.owner.name, car.owner.rating, car.owner.number_of_reviews
        );
    }

    if let Some(first) = cars.first() {
        let distribution = service.get_review_distribution(first.owner.id).await?;
        let summary: Vec<String> = distribution
            .iter()
            .map(|(stars, count)| format!("{}*: {}", stars, count))
            .collect();
        println!("\nReviews for {}: {}", first.owner.name, summary.join(", "));

        let lifecycle = BookingLifecycle::new(Arc::clone(&service));
        let mut request = lifecycle.draft(first.clone(), filter.interval()?);
        match lifecycle.submit(&mut request).await {
            Ok(()) => println!(
                "Booked {} {} ({})",
                first.make,
                first.model,
                request.booking_id().unwrap_or("id pending")
            ),
            Err(e) => println!("Booking failed: {}", e),
        }
    }

    println!("\nYou had {} bookings before this run", bookings.len());
    for booking in &bookings {
        println!(
            "  {} car {} {}",
            booking.id,
            booking.car_id.as_deref().unwrap_or("?"),
            booking.interval
        );
    }

    Ok(())
}
