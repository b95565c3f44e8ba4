use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::info;

use cardwise_core::domain::campaign::{
    Campaign, CampaignId, CampaignSource, CampaignStatus, Category, DiscountKind, DiscountModel,
    NewCampaign,
};
use cardwise_core::domain::catalog::{
    Bank, BankId, CampaignCatalog, CardId, CatalogEntry, CreditCard, Merchant, MerchantId,
};
use cardwise_core::errors::ApplicationError;
use cardwise_core::import::{review_campaign, ImportAction, ImportPlan, ReviewDecision};
use cardwise_core::lenient::LenientEnum;
use cardwise_core::ports::CatalogSource;

use super::{decode_error, format_timestamp, parse_decimal, parse_timestamp, RepositoryError};
use crate::DbPool;

const CAMPAIGN_COLUMNS: &str = "c.id, c.name, c.bank_id, c.card_id, c.category, c.discount_type,
    c.discount_value, c.max_discount, c.min_amount, c.valid_from, c.valid_until, c.merchant_id,
    c.is_active, c.requires_enrollment, c.enrollment_url, c.source, c.status, c.external_id,
    c.priority";

const ENTRY_JOINS: &str = "FROM campaigns c
    JOIN credit_cards cc ON cc.id = c.card_id
    JOIN banks b ON b.id = c.bank_id
    LEFT JOIN merchants m ON m.id = c.merchant_id";

const ENTRY_EXTRA_COLUMNS: &str = "cc.bank_id AS card_bank_id, cc.name AS card_name,
    cc.card_type, cc.card_tier, cc.application_url, cc.affiliate_code,
    cc.logo_url AS card_logo_url, cc.is_active AS card_is_active,
    b.name AS bank_name, b.logo_url AS bank_logo_url,
    m.name AS merchant_name, m.city AS merchant_city";

pub struct SqlCampaignRepository {
    pool: DbPool,
}

impl SqlCampaignRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns c WHERE c.id = ?"))
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(row_to_campaign).transpose()
    }

    pub async fn find_by_external_id(
        &self,
        bank_id: BankId,
        external_id: &str,
    ) -> Result<Option<Campaign>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns c
             WHERE c.bank_id = ? AND c.source = ? AND c.external_id = ?"
        ))
        .bind(bank_id.0)
        .bind(CampaignSource::BankApi.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_campaign).transpose()
    }

    pub async fn list_for_bank(&self, bank_id: BankId) -> Result<Vec<Campaign>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns c WHERE c.bank_id = ? ORDER BY c.id"
        ))
        .bind(bank_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_campaign).collect()
    }

    /// Review queue: campaigns in `status`, oldest first.
    pub async fn list_by_status(
        &self,
        status: CampaignStatus,
        limit: u32,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns c
             WHERE c.status = ?
             ORDER BY c.created_at, c.id
             LIMIT ?"
        ))
        .bind(status.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_campaign).collect()
    }

    pub async fn insert_campaign(
        &self,
        campaign: &NewCampaign,
    ) -> Result<CampaignId, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_campaign_tx(&mut tx, campaign, Utc::now()).await?;
        tx.commit().await?;
        Ok(id)
    }

    pub async fn update_campaign(&self, campaign: &Campaign) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        update_campaign_tx(&mut tx, campaign, Utc::now()).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Soft delete (or restore). Returns whether the campaign exists.
    pub async fn set_active(
        &self,
        id: CampaignId,
        is_active: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE campaigns SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(format_timestamp(Utc::now()))
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn review(
        &self,
        id: CampaignId,
        decision: ReviewDecision,
    ) -> Result<Campaign, ApplicationError> {
        let mut campaign = self
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound { entity: "campaign", id: id.0 })?;
        review_campaign(&mut campaign, decision)?;
        self.update_campaign(&campaign).await?;

        info!(
            event_name = "campaign.reviewed",
            campaign_id = id.0,
            status = %campaign.status,
            "campaign review recorded"
        );
        Ok(campaign)
    }

    /// Writes every create and update of `plan` in one transaction and
    /// returns the ids of the created campaigns.
    pub async fn apply_import(
        &self,
        plan: &ImportPlan,
    ) -> Result<Vec<CampaignId>, RepositoryError> {
        let now = Utc::now();
        let mut created = Vec::new();
        let mut tx = self.pool.begin().await?;

        for action in &plan.actions {
            match action {
                ImportAction::Create(campaign) => {
                    created.push(insert_campaign_tx(&mut tx, campaign, now).await?);
                }
                ImportAction::Update(campaign) => update_campaign_tx(&mut tx, campaign, now).await?,
                ImportAction::Skip { .. } => {}
            }
        }

        tx.commit().await?;

        info!(
            event_name = "import.plan.applied",
            created = plan.stats.created,
            updated = plan.stats.updated,
            skipped = plan.stats.skipped,
            "import plan applied"
        );
        Ok(created)
    }

    async fn catalog_entries(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS}, {ENTRY_EXTRA_COLUMNS} {ENTRY_JOINS}
             WHERE c.is_active = 1 AND c.valid_from <= ?1 AND c.valid_until >= ?1
             ORDER BY c.id"
        ))
        .bind(format_timestamp(as_of))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn entry_by_id(&self, id: CampaignId) -> Result<Option<CatalogEntry>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS}, {ENTRY_EXTRA_COLUMNS} {ENTRY_JOINS} WHERE c.id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }
}

#[async_trait::async_trait]
impl CatalogSource for SqlCampaignRepository {
    async fn load_catalog(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<CampaignCatalog, ApplicationError> {
        Ok(CampaignCatalog::new(self.catalog_entries(as_of).await?))
    }

    async fn find_entry(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CatalogEntry>, ApplicationError> {
        Ok(self.entry_by_id(campaign_id).await?)
    }
}

async fn insert_campaign_tx(
    tx: &mut Transaction<'_, Sqlite>,
    campaign: &NewCampaign,
    now: DateTime<Utc>,
) -> Result<CampaignId, RepositoryError> {
    let timestamp = format_timestamp(now);
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO campaigns (name, bank_id, card_id, category, discount_type, discount_value,
                                max_discount, min_amount, valid_from, valid_until, merchant_id,
                                is_active, requires_enrollment, enrollment_url, source, status,
                                external_id, priority, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(&campaign.name)
    .bind(campaign.bank_id.0)
    .bind(campaign.card_id.0)
    .bind(campaign.category.as_str())
    .bind(campaign.discount.kind().as_str())
    .bind(campaign.discount.value().to_string())
    .bind(campaign.discount.max_discount().map(|value| value.to_string()))
    .bind(campaign.min_amount.to_string())
    .bind(format_timestamp(campaign.valid_from))
    .bind(format_timestamp(campaign.valid_until))
    .bind(campaign.merchant_id.map(|id| id.0))
    .bind(campaign.is_active)
    .bind(campaign.requires_enrollment)
    .bind(&campaign.enrollment_url)
    .bind(campaign.source.as_str())
    .bind(campaign.status.as_str())
    .bind(&campaign.external_id)
    .bind(campaign.priority)
    .bind(&timestamp)
    .bind(&timestamp)
    .fetch_one(&mut **tx)
    .await?;

    Ok(CampaignId(id))
}

async fn update_campaign_tx(
    tx: &mut Transaction<'_, Sqlite>,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE campaigns SET
             name = ?, bank_id = ?, card_id = ?, category = ?, discount_type = ?,
             discount_value = ?, max_discount = ?, min_amount = ?, valid_from = ?,
             valid_until = ?, merchant_id = ?, is_active = ?, requires_enrollment = ?,
             enrollment_url = ?, source = ?, status = ?, external_id = ?, priority = ?,
             updated_at = ?
         WHERE id = ?",
    )
    .bind(&campaign.name)
    .bind(campaign.bank_id.0)
    .bind(campaign.card_id.0)
    .bind(campaign.category.as_str())
    .bind(campaign.discount.kind().as_str())
    .bind(campaign.discount.value().to_string())
    .bind(campaign.discount.max_discount().map(|value| value.to_string()))
    .bind(campaign.min_amount.to_string())
    .bind(format_timestamp(campaign.valid_from))
    .bind(format_timestamp(campaign.valid_until))
    .bind(campaign.merchant_id.map(|id| id.0))
    .bind(campaign.is_active)
    .bind(campaign.requires_enrollment)
    .bind(&campaign.enrollment_url)
    .bind(campaign.source.as_str())
    .bind(campaign.status.as_str())
    .bind(&campaign.external_id)
    .bind(campaign.priority)
    .bind(format_timestamp(now))
    .bind(campaign.id.0)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound { entity: "campaign", id: campaign.id.0 });
    }
    Ok(())
}

fn row_to_campaign(row: &SqliteRow) -> Result<Campaign, RepositoryError> {
    let discount_type: String = row.try_get("discount_type").map_err(decode_error)?;
    let discount_value: String = row.try_get("discount_value").map_err(decode_error)?;
    let max_discount: Option<String> = row.try_get("max_discount").map_err(decode_error)?;
    let min_amount: String = row.try_get("min_amount").map_err(decode_error)?;
    let valid_from: String = row.try_get("valid_from").map_err(decode_error)?;
    let valid_until: String = row.try_get("valid_until").map_err(decode_error)?;
    let category: String = row.try_get("category").map_err(decode_error)?;
    let source: String = row.try_get("source").map_err(decode_error)?;
    let status: String = row.try_get("status").map_err(decode_error)?;
    let merchant_id: Option<i64> = row.try_get("merchant_id").map_err(decode_error)?;

    let kind = DiscountKind::parse_lenient(&discount_type).ok_or_else(|| {
        RepositoryError::Decode(format!("discount_type: unknown label `{discount_type}`"))
    })?;
    let max_discount =
        max_discount.as_deref().map(|raw| parse_decimal("max_discount", raw)).transpose()?;

    Ok(Campaign {
        id: CampaignId(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        bank_id: BankId(row.try_get("bank_id").map_err(decode_error)?),
        card_id: CardId(row.try_get("card_id").map_err(decode_error)?),
        category: Category::parse_or(&category, Category::Other),
        discount: DiscountModel::from_parts(
            kind,
            parse_decimal("discount_value", &discount_value)?,
            max_discount,
        ),
        min_amount: parse_decimal("min_amount", &min_amount)?,
        valid_from: parse_timestamp("valid_from", &valid_from)?,
        valid_until: parse_timestamp("valid_until", &valid_until)?,
        merchant_id: merchant_id.map(MerchantId),
        is_active: row.try_get("is_active").map_err(decode_error)?,
        requires_enrollment: row.try_get("requires_enrollment").map_err(decode_error)?,
        enrollment_url: row.try_get("enrollment_url").map_err(decode_error)?,
        source: CampaignSource::parse_or(&source, CampaignSource::Manual),
        status: CampaignStatus::parse_or(&status, CampaignStatus::Pending),
        external_id: row.try_get("external_id").map_err(decode_error)?,
        priority: row.try_get("priority").map_err(decode_error)?,
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<CatalogEntry, RepositoryError> {
    let campaign = row_to_campaign(row)?;

    let card = CreditCard {
        id: campaign.card_id,
        bank_id: BankId(row.try_get("card_bank_id").map_err(decode_error)?),
        name: row.try_get("card_name").map_err(decode_error)?,
        card_type: row.try_get("card_type").map_err(decode_error)?,
        card_tier: row.try_get("card_tier").map_err(decode_error)?,
        application_url: row.try_get("application_url").map_err(decode_error)?,
        affiliate_code: row.try_get("affiliate_code").map_err(decode_error)?,
        logo_url: row.try_get("card_logo_url").map_err(decode_error)?,
        is_active: row.try_get("card_is_active").map_err(decode_error)?,
    };
    let bank = Bank {
        id: campaign.bank_id,
        name: row.try_get("bank_name").map_err(decode_error)?,
        logo_url: row.try_get("bank_logo_url").map_err(decode_error)?,
    };
    let merchant_name: Option<String> = row.try_get("merchant_name").map_err(decode_error)?;
    let merchant = match (campaign.merchant_id, merchant_name) {
        (Some(id), Some(name)) => Some(Merchant {
            id,
            name,
            city: row.try_get("merchant_city").map_err(decode_error)?,
        }),
        _ => None,
    };

    Ok(CatalogEntry { campaign, card, bank, merchant })
}
