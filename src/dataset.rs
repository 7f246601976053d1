// Fixed catalog used by the in-memory service, the demo binary and the benchmark

use serde::Deserialize;

use crate::car::Car;
use crate::error::CarServiceError;
use crate::wire::{cars_from_wire, WireCar};

// Sample file path (relative to the crate root)
pub const SAMPLE_CATALOG_PATH: &str = "samples/catalog.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub owner_id: u64,
    pub stars: u8,
}

#[derive(Debug, Deserialize)]
struct WireCatalog {
    #[serde(default)]
    cars: Vec<WireCar>,
    #[serde(default)]
    reviews: Vec<Review>,
}

fn check_stars(reviews: &[Review]) -> Result<(), CarServiceError> {
    match reviews.iter().find(|r| !(1..=5).contains(&r.stars)) {
        Some(review) => Err(CarServiceError::MalformedResponse(format!(
            "review for owner {} has {} stars",
            review.owner_id, review.stars
        ))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogDataset {
    pub cars: Vec<Car>,
    pub reviews: Vec<Review>,
}

impl CatalogDataset {
    pub fn new(cars: Vec<Car>) -> Self {
        Self {
            cars,
            reviews: Vec::new(),
        }
    }

    /// Attaches reviews; every review must carry 1 to 5 stars.
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Result<Self, CarServiceError> {
        check_stars(&reviews)?;
        self.reviews = reviews;
        Ok(self)
    }

    /// Parses a catalog written in the backend's wire shape.
    pub fn from_json(json: &str) -> Result<Self, CarServiceError> {
        let catalog: WireCatalog = serde_json::from_str(json)
            .map_err(|e| CarServiceError::MalformedResponse(e.to_string()))?;

        Self::new(cars_from_wire(catalog.cars)?).with_reviews(catalog.reviews)
    }

    pub fn load_sample() -> Result<Self, CarServiceError> {
        let json = std::fs::read_to_string(SAMPLE_CATALOG_PATH).map_err(|e| {
            CarServiceError::MalformedResponse(format!(
                "cannot read {}: {}",
                SAMPLE_CATALOG_PATH, e
            ))
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::CarType;

    #[test]
    fn test_load_sample() {
        let result = CatalogDataset::load_sample();
        assert!(result.is_ok(), "Failed to load sample catalog: {:?}", result.err());

        let dataset = result.unwrap();
        assert_eq!(dataset.cars.len(), 8);
        assert!(dataset.cars.iter().any(|car| car.car_type == CarType::Suv));
        assert!(dataset.cars.iter().any(|car| car.availability.is_empty()));
        assert!(!dataset.reviews.is_empty());
    }

    #[test]
    fn test_rejects_out_of_range_review() {
        let json = r#"{"cars": [], "reviews": [{"ownerId": 1, "stars": 6}]}"#;
        assert!(matches!(
            CatalogDataset::from_json(json),
            Err(CarServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_with_reviews_checks_stars() {
        let dataset = CatalogDataset::default();
        let rejected = dataset.clone().with_reviews(vec![Review { owner_id: 3, stars: 0 }]);
        assert!(matches!(rejected, Err(CarServiceError::MalformedResponse(_))));

        let accepted = dataset.with_reviews(vec![Review { owner_id: 3, stars: 5 }]).unwrap();
        assert_eq!(accepted.reviews.len(), 1);
    }

    #[test]
    fn test_empty_catalog() {
        let dataset = CatalogDataset::from_json("{}").unwrap();
        assert!(dataset.cars.is_empty());
        assert!(dataset.reviews.is_empty());
    }
}
