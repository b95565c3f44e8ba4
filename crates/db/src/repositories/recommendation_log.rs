use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use cardwise_core::domain::campaign::CampaignId;
use cardwise_core::domain::recommendation::{
    CampaignEngagement, ClickAction, RecommendationClick, RecommendationRecord,
};
use cardwise_core::errors::ApplicationError;
use cardwise_core::lenient::LenientEnum;
use cardwise_core::ports::RecommendationLog;

use super::{decode_error, format_timestamp, parse_decimal, parse_timestamp, RepositoryError};
use crate::DbPool;

/// Analytics sink for shown recommendations and their clicks.
pub struct SqlRecommendationLog {
    pool: DbPool,
}

impl SqlRecommendationLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert_records(
        &self,
        records: &[RecommendationRecord],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                "INSERT INTO recommendations (user_id, session_id, campaign_id, merchant_name,
                                              cart_amount, cart_category, discount_amount,
                                              original_amount, is_existing_card,
                                              needs_enrollment, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(record.user_id)
            .bind(&record.session_id)
            .bind(record.campaign_id.0)
            .bind(&record.merchant_name)
            .bind(record.cart_amount.to_string())
            .bind(&record.cart_category)
            .bind(record.discount_amount.to_string())
            .bind(record.original_amount.to_string())
            .bind(record.is_existing_card)
            .bind(record.needs_enrollment)
            .bind(format_timestamp(record.created_at))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Stores the click and links it to the latest recommendation shown for
    /// the same campaign and session, when there is one.
    pub async fn insert_click(&self, click: &RecommendationClick) -> Result<i64, RepositoryError> {
        let recommendation_id: Option<i64> = match &click.session_id {
            Some(session_id) => {
                sqlx::query_scalar(
                    "SELECT id FROM recommendations
                     WHERE campaign_id = ? AND session_id = ?
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1",
                )
                .bind(click.campaign_id.0)
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO recommendation_clicks (recommendation_id, campaign_id, session_id,
                                                actor_id, action_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(recommendation_id)
        .bind(click.campaign_id.0)
        .bind(&click.session_id)
        .bind(click.actor_id)
        .bind(click.action_type.as_str())
        .bind(format_timestamp(click.created_at))
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn records_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<RecommendationRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, session_id, campaign_id, merchant_name, cart_amount, cart_category,
                    discount_amount, original_amount, is_existing_card, needs_enrollment,
                    created_at
             FROM recommendations
             WHERE session_id = ?
             ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Shown and click counts for `campaign_id`, optionally restricted to
    /// events at or after `since`.
    pub async fn engagement(
        &self,
        campaign_id: CampaignId,
        since: Option<DateTime<Utc>>,
    ) -> Result<CampaignEngagement, RepositoryError> {
        let since = since.map(format_timestamp);

        let shown: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM recommendations
             WHERE campaign_id = ?1 AND (?2 IS NULL OR created_at >= ?2)",
        )
        .bind(campaign_id.0)
        .bind(&since)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            "SELECT action_type, COUNT(*) AS clicks FROM recommendation_clicks
             WHERE campaign_id = ?1 AND (?2 IS NULL OR created_at >= ?2)
             GROUP BY action_type",
        )
        .bind(campaign_id.0)
        .bind(&since)
        .fetch_all(&self.pool)
        .await?;

        let (mut card_apply, mut enroll, mut select) = (0, 0, 0);
        for row in &rows {
            let action: String = row.try_get("action_type").map_err(decode_error)?;
            let clicks: i64 = row.try_get("clicks").map_err(decode_error)?;
            match ClickAction::parse_lenient(&action) {
                Some(ClickAction::CardApply) => card_apply = count(clicks),
                Some(ClickAction::Enroll) => enroll = count(clicks),
                Some(ClickAction::Select) => select = count(clicks),
                None => {
                    return Err(RepositoryError::Decode(format!(
                        "action_type: unknown label `{action}`"
                    )))
                }
            }
        }

        Ok(CampaignEngagement::from_counts(count(shown), card_apply, enroll, select))
    }
}

fn count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn row_to_record(row: &SqliteRow) -> Result<RecommendationRecord, RepositoryError> {
    let cart_amount: String = row.try_get("cart_amount").map_err(decode_error)?;
    let discount_amount: String = row.try_get("discount_amount").map_err(decode_error)?;
    let original_amount: String = row.try_get("original_amount").map_err(decode_error)?;
    let created_at: String = row.try_get("created_at").map_err(decode_error)?;

    Ok(RecommendationRecord {
        user_id: row.try_get("user_id").map_err(decode_error)?,
        session_id: row.try_get("session_id").map_err(decode_error)?,
        campaign_id: CampaignId(row.try_get("campaign_id").map_err(decode_error)?),
        merchant_name: row.try_get("merchant_name").map_err(decode_error)?,
        cart_amount: parse_decimal("cart_amount", &cart_amount)?,
        cart_category: row.try_get("cart_category").map_err(decode_error)?,
        discount_amount: parse_decimal("discount_amount", &discount_amount)?,
        original_amount: parse_decimal("original_amount", &original_amount)?,
        is_existing_card: row.try_get("is_existing_card").map_err(decode_error)?,
        needs_enrollment: row.try_get("needs_enrollment").map_err(decode_error)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl RecommendationLog for SqlRecommendationLog {
    async fn record_generated(
        &self,
        records: &[RecommendationRecord],
    ) -> Result<(), ApplicationError> {
        Ok(self.insert_records(records).await?)
    }

    async fn record_click(&self, click: &RecommendationClick) -> Result<(), ApplicationError> {
        self.insert_click(click).await?;
        Ok(())
    }
}
