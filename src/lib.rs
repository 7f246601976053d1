// Core of the peer-to-peer car rental marketplace: search, availability and bookings

pub mod booking;
pub mod car;
pub mod credentials;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod geo;
pub mod interval;
pub mod ledger;
pub mod memory_service;
pub mod remote_service;
pub mod service;
pub mod sort;
pub mod wire;

// Re-export key types for convenience
pub use booking::{BookingLifecycle, BookingRequest, BookingState, CancelOutcome};
pub use car::{
    Availability, Booking, Car, CarOwner, CarType, FuelType, NewCarBody, Transmission,
};
pub use credentials::{CredentialProvider, SessionCredentials};
pub use dataset::{CatalogDataset, Review};
pub use error::{CarServiceError, ErrorKind};
pub use filter::{filter_cars, CarFilter};
pub use geo::GeoPoint;
pub use interval::Interval;
pub use ledger::AvailabilityLedger;
pub use memory_service::{CatalogConfig, InMemoryCarService};
pub use remote_service::{ClientConfig, RemoteCarService};
pub use service::{CarService, ReviewDistribution};
pub use sort::{sort_cars, CarSort};
