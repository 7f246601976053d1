// Ordering strategies for catalog search results

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::car::Car;
use crate::error::CarServiceError;
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarSort {
    Cheapest,
    Closest,
    Rating,
}

impl CarSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarSort::Cheapest => "Cheapest",
            CarSort::Closest => "Closest",
            CarSort::Rating => "Rating",
        }
    }
}

impl fmt::Display for CarSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarSort {
    type Err = CarServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cheapest" => Ok(CarSort::Cheapest),
            "closest" => Ok(CarSort::Closest),
            "rating" => Ok(CarSort::Rating),
            other => Err(CarServiceError::ValidationFailure(format!(
                "unknown sort '{}'",
                other
            ))),
        }
    }
}

/// Orders `cars` in place. All orderings are stable, so ties keep input order.
/// `Closest` without an origin leaves the order untouched; cars without
/// coordinates sort after every located car.
pub fn sort_cars(cars: &mut [Car], sort: CarSort, origin: Option<GeoPoint>) {
    match sort {
        CarSort::Cheapest => {
            cars.sort_by(|a, b| a.price_per_km.total_cmp(&b.price_per_km));
        }
        CarSort::Closest => {
            let Some(origin) = origin else {
                return;
            };
            cars.sort_by(|a, b| {
                let da = a.coordinates().map(|p| origin.distance_km(&p));
                let db = b.coordinates().map(|p| origin.distance_km(&p));
                match (da, db) {
                    (Some(da), Some(db)) => da.total_cmp(&db),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            });
        }
        CarSort::Rating => {
            cars.sort_by(|a, b| {
                b.owner
                    .rating
                    .total_cmp(&a.owner.rating)
                    .then_with(|| b.owner.number_of_reviews.cmp(&a.owner.number_of_reviews))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarType;
    use crate::filter::test_support::car;

    fn ids(cars: &[Car]) -> Vec<&str> {
        cars.iter().map(|c| c.id.as_str()).collect()
    }

    fn rated(id: &str, rating: f64, reviews: u32) -> Car {
        let mut c = car(id, CarType::Medium, 5.0);
        c.owner.rating = rating;
        c.owner.number_of_reviews = reviews;
        c
    }

    fn located(id: &str, lat: f64, lon: f64) -> Car {
        let mut c = car(id, CarType::Medium, 5.0);
        c.lat = Some(lat);
        c.lon = Some(lon);
        c
    }

    #[test]
    fn test_cheapest_is_stable_and_non_decreasing() {
        let mut cars = vec![
            car("a", CarType::Van, 7.0),
            car("b", CarType::Van, 3.0),
            car("c", CarType::Van, 7.0),
            car("d", CarType::Van, 1.5),
        ];
        sort_cars(&mut cars, CarSort::Cheapest, None);
        assert_eq!(ids(&cars), vec!["d", "b", "a", "c"]);
        assert!(cars
            .windows(2)
            .all(|pair| pair[0].price_per_km <= pair[1].price_per_km));
    }

    #[test]
    fn test_rating_breaks_ties_by_review_count() {
        let mut cars = vec![
            rated("few", 4.5, 2),
            rated("top", 4.9, 1),
            rated("many", 4.5, 80),
            rated("low", 3.0, 500),
            rated("few-again", 4.5, 2),
        ];
        sort_cars(&mut cars, CarSort::Rating, None);
        assert_eq!(ids(&cars), vec!["top", "many", "few", "few-again", "low"]);
        assert!(cars.windows(2).all(|pair| {
            let a = (pair[0].owner.rating, pair[0].owner.number_of_reviews);
            let b = (pair[1].owner.rating, pair[1].owner.number_of_reviews);
            a.0 > b.0 || (a.0 == b.0 && a.1 >= b.1)
        }));
    }

    #[test]
    fn test_closest_orders_by_distance() {
        let origin = GeoPoint::new(55.6761, 12.5683);
        let mut unknown = car("unknown", CarType::Medium, 5.0);
        unknown.lat = None;
        let mut cars = vec![
            located("aarhus", 56.1629, 10.2039),
            unknown,
            located("here", 55.6761, 12.5683),
            located("malmo", 55.6050, 13.0038),
        ];
        sort_cars(&mut cars, CarSort::Closest, Some(origin));
        assert_eq!(ids(&cars), vec!["here", "malmo", "aarhus", "unknown"]);
    }

    #[test]
    fn test_closest_without_origin_is_a_no_op() {
        let mut cars = vec![
            located("aarhus", 56.1629, 10.2039),
            located("here", 55.6761, 12.5683),
        ];
        sort_cars(&mut cars, CarSort::Closest, None);
        assert_eq!(ids(&cars), vec!["aarhus", "here"]);
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!("Cheapest".parse::<CarSort>().unwrap(), CarSort::Cheapest);
        assert_eq!("rating".parse::<CarSort>().unwrap(), CarSort::Rating);
        assert!("random".parse::<CarSort>().is_err());
    }
}
