use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use cardwise_core::domain::campaign::CampaignId;
use cardwise_core::domain::catalog::{CampaignCatalog, CardId, CardOwnership, CatalogEntry};
use cardwise_core::domain::recommendation::{RecommendationClick, RecommendationRecord};
use cardwise_core::errors::ApplicationError;
use cardwise_core::ports::{CardOwnershipSource, CatalogSource, RecommendationLog};

#[derive(Default)]
pub struct InMemoryCatalog {
    entries: RwLock<BTreeMap<CampaignId, CatalogEntry>>,
}

impl InMemoryCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: RwLock::new(
                entries.into_iter().map(|entry| (entry.campaign.id, entry)).collect(),
            ),
        }
    }

    pub async fn upsert(&self, entry: CatalogEntry) {
        self.entries.write().await.insert(entry.campaign.id, entry);
    }
}

#[async_trait::async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn load_catalog(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<CampaignCatalog, ApplicationError> {
        let entries = self.entries.read().await;
        Ok(CampaignCatalog::new(
            entries.values().filter(|entry| entry.campaign.is_live_at(as_of)).cloned().collect(),
        ))
    }

    async fn find_entry(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CatalogEntry>, ApplicationError> {
        Ok(self.entries.read().await.get(&campaign_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCardOwnership {
    links: RwLock<HashMap<i64, HashSet<CardId>>>,
}

impl InMemoryCardOwnership {
    pub async fn link_card(&self, user_id: i64, card_id: CardId) {
        self.links.write().await.entry(user_id).or_default().insert(card_id);
    }

    pub async fn unlink_card(&self, user_id: i64, card_id: CardId) -> bool {
        self.links.write().await.get_mut(&user_id).is_some_and(|cards| cards.remove(&card_id))
    }
}

#[async_trait::async_trait]
impl CardOwnershipSource for InMemoryCardOwnership {
    async fn owned_cards(&self, user_id: i64) -> Result<CardOwnership, ApplicationError> {
        let links = self.links.read().await;
        Ok(links
            .get(&user_id)
            .map(|cards| CardOwnership::from_ids(cards.iter().copied()))
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryRecommendationLog {
    records: RwLock<Vec<RecommendationRecord>>,
    clicks: RwLock<Vec<RecommendationClick>>,
}

impl InMemoryRecommendationLog {
    pub async fn records(&self) -> Vec<RecommendationRecord> {
        self.records.read().await.clone()
    }

    pub async fn clicks(&self) -> Vec<RecommendationClick> {
        self.clicks.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RecommendationLog for InMemoryRecommendationLog {
    async fn record_generated(
        &self,
        records: &[RecommendationRecord],
    ) -> Result<(), ApplicationError> {
        self.records.write().await.extend_from_slice(records);
        Ok(())
    }

    async fn record_click(&self, click: &RecommendationClick) -> Result<(), ApplicationError> {
        self.clicks.write().await.push(click.clone());
        Ok(())
    }
}
