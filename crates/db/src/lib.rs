pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, open_pool, DbPool};
pub use fixtures::{CampaignSeedInfo, DemoCatalog, SeedResult, VerificationResult};
pub use repositories::{
    InMemoryCardOwnership, InMemoryCatalog, InMemoryRecommendationLog, RepositoryError,
    SqlCampaignRepository, SqlCardOwnershipRepository, SqlRecommendationLog,
};
