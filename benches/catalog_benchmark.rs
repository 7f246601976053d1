use carshare_engine::{
    filter_cars, sort_cars, Availability, Booking, Car, CarFilter, CarOwner, CarSort, CarType,
    FuelType, Interval, Transmission,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{seq::SliceRandom, thread_rng, Rng};

const MAKES: [&str; 6] = ["Toyota", "Volvo", "Tesla", "Ford", "Fiat", "Volkswagen"];

// Cars scattered around Copenhagen, open for June 2025 with a few random bookings
fn random_catalog(size: usize) -> Vec<Car> {
    let mut rng = thread_rng();
    let june = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let window = Interval::new(june, june + Duration::days(30)).unwrap();

    (0..size)
        .map(|i| {
            let bookings = (0..rng.gen_range(0..4))
                .map(|b| {
                    let start = june + Duration::hours(rng.gen_range(0..700));
                    let end = start + Duration::hours(rng.gen_range(1..72));
                    Booking::new(format!("{}-{}", i, b), Interval::new(start, end).unwrap())
                })
                .collect();

            Car {
                id: i.to_string(),
                make: MAKES.choose(&mut rng).unwrap().to_string(),
                model: "Model".to_string(),
                year: rng.gen_range(2005..2025),
                car_type: *CarType::ALL.choose(&mut rng).unwrap(),
                fuel_type: *FuelType::ALL.choose(&mut rng).unwrap(),
                transmission: *Transmission::ALL.choose(&mut rng).unwrap(),
                seats: rng.gen_range(2..10),
                price_per_km: rng.gen_range(1.0..15.0),
                location: "Copenhagen".to_string(),
                lat: Some(55.6761 + rng.gen_range(-0.2..0.2)),
                lon: Some(12.5683 + rng.gen_range(-0.3..0.3)),
                image_url: String::new(),
                owner: CarOwner {
                    id: rng.gen_range(1..500),
                    name: "Owner".to_string(),
                    avatar_url: String::new(),
                    rating: rng.gen_range(0.0..5.0),
                    number_of_reviews: rng.gen_range(0..200),
                },
                availability: vec![Availability::new(format!("w{}", i), window)],
                bookings,
            }
        })
        .collect()
}

pub fn catalog_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_search");
    let from = Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap();
    let filter = CarFilter {
        car_type: Some(vec![CarType::Suv, CarType::Medium, CarType::Van]),
        price_max: Some(10.0),
        lat: Some(55.6761),
        lon: Some(12.5683),
        distance: Some(15.0),
        ..CarFilter::between(from, from + Duration::days(2))
    };

    for size in [100, 1_000, 10_000].iter() {
        let cars = random_catalog(*size);

        group.bench_with_input(BenchmarkId::new("filter", size), &cars, |b, cars| {
            b.iter(|| black_box(filter_cars(cars, &filter).unwrap()))
        });

        for sort in [CarSort::Cheapest, CarSort::Closest, CarSort::Rating] {
            group.bench_with_input(
                BenchmarkId::new(format!("filter_sort_{}", sort.as_str().to_lowercase()), size),
                &cars,
                |b, cars| {
                    b.iter(|| {
                        let mut result = filter_cars(cars, &filter).unwrap();
                        sort_cars(&mut result, sort, filter.origin());
                        black_box(result)
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, catalog_benchmark);
criterion_main!(benches);
