//! Storage seams used by [`crate::service::RecommendationService`]. The db
//! crate provides SQLite and in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::campaign::CampaignId;
use crate::domain::catalog::{CampaignCatalog, CardOwnership, CatalogEntry};
use crate::domain::recommendation::{RecommendationClick, RecommendationRecord};
use crate::errors::ApplicationError;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Snapshot of the campaigns that may be live at `as_of`, joined with
    /// their card, bank and merchant.
    async fn load_catalog(&self, as_of: DateTime<Utc>)
        -> Result<CampaignCatalog, ApplicationError>;

    async fn find_entry(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CatalogEntry>, ApplicationError>;
}

#[async_trait]
pub trait CardOwnershipSource: Send + Sync {
    /// Cards with an active association to `user_id`.
    async fn owned_cards(&self, user_id: i64) -> Result<CardOwnership, ApplicationError>;
}

#[async_trait]
pub trait RecommendationLog: Send + Sync {
    async fn record_generated(
        &self,
        records: &[RecommendationRecord],
    ) -> Result<(), ApplicationError>;

    async fn record_click(&self, click: &RecommendationClick) -> Result<(), ApplicationError>;
}
