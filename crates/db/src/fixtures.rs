use chrono::Utc;
use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::{format_timestamp, RepositoryError};

/// Campaigns the demo fixture promises to create, keyed by id.
const SEED_CAMPAIGNS: &[SeedCampaignContract] = &[
    SeedCampaignContract {
        id: 1,
        label: "campaign-migros-percentage",
        category: "grocery",
        status: "approved",
        live: true,
        description: "Migros 10% off, capped at 100, for Bonus Card",
    },
    SeedCampaignContract {
        id: 2,
        label: "campaign-axess-cashback",
        category: "grocery",
        status: "approved",
        live: true,
        description: "Grocery cashback for Axess, enrollment required",
    },
    SeedCampaignContract {
        id: 3,
        label: "campaign-world-points",
        category: "grocery",
        status: "approved",
        live: true,
        description: "World Card reward points at the market",
    },
    SeedCampaignContract {
        id: 4,
        label: "campaign-maximum-installment",
        category: "electronics",
        status: "approved",
        live: true,
        description: "Teknosa installments for Maximum",
    },
    SeedCampaignContract {
        id: 5,
        label: "campaign-wings-electronics",
        category: "electronics",
        status: "approved",
        live: true,
        description: "Electronics 5% off for Wings, enrollment required",
    },
    SeedCampaignContract {
        id: 6,
        label: "campaign-shell-cashback",
        category: "fuel",
        status: "approved",
        live: true,
        description: "Shell fuel cashback for Bonus Card",
    },
    SeedCampaignContract {
        id: 7,
        label: "campaign-pegasus-points",
        category: "travel",
        status: "approved",
        live: true,
        description: "Pegasus miles for Wings",
    },
    SeedCampaignContract {
        id: 8,
        label: "campaign-expired-grocery",
        category: "grocery",
        status: "approved",
        live: false,
        description: "Expired grocery campaign, never recommended",
    },
    SeedCampaignContract {
        id: 9,
        label: "campaign-imported-pending",
        category: "restaurant",
        status: "pending",
        live: false,
        description: "Bank feed import awaiting review",
    },
];

const SEED_BANK_COUNT: i64 = 4;
const SEED_CARD_COUNT: i64 = 5;
const SEED_MERCHANT_COUNT: i64 = 4;

/// Deterministic demo catalog for local runs and storage tests.
pub struct DemoCatalog;

impl DemoCatalog {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/demo_catalog.sql");

    /// Loads (or refreshes) the demo catalog in one transaction.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let campaigns_seeded = SEED_CAMPAIGNS
            .iter()
            .map(|campaign| CampaignSeedInfo {
                campaign_id: campaign.id,
                label: campaign.label,
                description: campaign.description,
            })
            .collect();

        Ok(SeedResult { campaigns_seeded })
    }

    /// Checks that the seeded rows exist and that the live/non-live split
    /// holds at the current time.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (label, table, expected) in [
            ("banks", "banks", SEED_BANK_COUNT),
            ("credit-cards", "credit_cards", SEED_CARD_COUNT),
            ("merchants", "merchants", SEED_MERCHANT_COUNT),
        ] {
            let count: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(1) FROM {table} WHERE id <= {expected}"
            ))
            .fetch_one(pool)
            .await?;
            checks.push((label, count == expected));
        }

        let now = format_timestamp(Utc::now());
        for campaign in SEED_CAMPAIGNS {
            let live: Option<i64> = sqlx::query_scalar(
                "SELECT is_active = 1 AND valid_from <= ?4 AND valid_until >= ?4
                 FROM campaigns
                 WHERE id = ?1 AND category = ?2 AND status = ?3",
            )
            .bind(campaign.id)
            .bind(campaign.category)
            .bind(campaign.status)
            .bind(&now)
            .fetch_optional(pool)
            .await?;
            checks.push((campaign.label, live.map(|flag| flag == 1) == Some(campaign.live)));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

struct SeedCampaignContract {
    id: i64,
    label: &'static str,
    category: &'static str,
    status: &'static str,
    live: bool,
    description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub campaigns_seeded: Vec<CampaignSeedInfo>,
}

#[derive(Debug)]
pub struct CampaignSeedInfo {
    pub campaign_id: i64,
    pub label: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
