// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{error, model};

// === INTERNAL MODULES ===
// Exposed for wiring in binaries and for tests; consumers should stick to
// `contract` and the service aliases below.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

pub use config::ListingsConfig;
pub use domain::service::ListingService;

/// Listing service over `animal_rankings`.
pub type RankingsService = ListingService<model::AnimalRanking>;

/// Listing service over `resources`.
pub type ResourcesService = ListingService<model::Resource>;

/// A list call over `animal_rankings`.
pub type RankingsRequest = model::ListRequest<model::AnimalRankingSortKey>;

/// A list call over `resources`.
pub type ResourcesRequest = model::ListRequest<model::ResourceSortKey>;
