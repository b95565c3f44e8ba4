//! Planning for bank campaign feeds.
//!
//! A feed is a list of loosely typed campaign payloads. [`plan_import`]
//! decides, without touching storage, which payloads create campaigns, which
//! refresh a previously imported one and which are skipped. The db crate
//! applies the resulting [`ImportPlan`] in one transaction.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::campaign::{
    Campaign, CampaignSource, CampaignStatus, Category, DiscountKind, DiscountModel, NewCampaign,
};
use crate::domain::catalog::{BankId, CardId, MerchantId};
use crate::errors::DomainError;
use crate::lenient::{normalize_label, LenientEnum};

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DEFAULT_CAMPAIGN_NAME: &str = "Unnamed Campaign";

/// One campaign as published by a bank feed. Every field is optional;
/// identifiers may arrive as strings or numbers.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ExternalCampaign {
    #[serde(default)]
    pub external_id: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub min_amount: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub card_id: Option<i64>,
    #[serde(default)]
    pub merchant_id: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub requires_enrollment: Option<bool>,
    #[serde(default)]
    pub enrollment_url: Option<String>,
}

impl ExternalCampaign {
    /// `external_id`, falling back to `id`. Blank strings and non-scalar
    /// values count as missing.
    pub fn external_key(&self) -> Option<String> {
        [&self.external_id, &self.id].into_iter().flatten().find_map(scalar_key)
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportAction {
    Create(NewCampaign),
    Update(Campaign),
    Skip { external_id: Option<String>, reason: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub imported: u32,
    pub created: u32,
    pub updated: u32,
    pub pending_approval: u32,
    pub auto_approved: u32,
    pub skipped: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub actions: Vec<ImportAction>,
    pub stats: ImportStats,
}

impl ImportPlan {
    fn skip(&mut self, external_id: Option<String>, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(
            event_name = "import.campaign.skipped",
            external_id = external_id.as_deref().unwrap_or("<missing>"),
            reason = %reason,
            "skipping imported campaign"
        );
        self.stats.skipped += 1;
        self.actions.push(ImportAction::Skip { external_id, reason });
    }
}

/// Plans a feed for `bank_id`. `existing` holds the bank's stored campaigns;
/// only those that came from the bank API are matched by external id.
pub fn plan_import(
    bank_id: BankId,
    payloads: &[ExternalCampaign],
    existing: &[Campaign],
    auto_approve: bool,
    now: DateTime<Utc>,
) -> ImportPlan {
    let mut plan = ImportPlan::default();

    for payload in payloads {
        let Some(external_id) = payload.external_key() else {
            plan.skip(None, "campaign has no external id");
            continue;
        };

        let stored = existing.iter().find(|campaign| {
            campaign.bank_id == bank_id
                && campaign.source == CampaignSource::BankApi
                && campaign.external_id.as_deref() == Some(external_id.as_str())
        });

        match stored {
            Some(campaign) if !campaign.status.accepts_sync_updates() => {
                let reason =
                    format!("campaign {} is {} and no longer synced", campaign.id, campaign.status);
                plan.skip(Some(external_id), reason);
            }
            Some(campaign) => {
                plan.actions.push(ImportAction::Update(apply_update(campaign, payload, now)));
                plan.stats.updated += 1;
                plan.stats.imported += 1;
            }
            None => {
                let Some(card_id) = payload.card_id else {
                    plan.skip(Some(external_id), "new campaign has no card_id");
                    continue;
                };
                let status = if auto_approve {
                    plan.stats.auto_approved += 1;
                    CampaignStatus::Approved
                } else {
                    plan.stats.pending_approval += 1;
                    CampaignStatus::Pending
                };
                plan.actions.push(ImportAction::Create(new_campaign(
                    bank_id,
                    CardId(card_id),
                    external_id,
                    payload,
                    status,
                    now,
                )));
                plan.stats.created += 1;
                plan.stats.imported += 1;
            }
        }
    }

    plan
}

fn new_campaign(
    bank_id: BankId,
    card_id: CardId,
    external_id: String,
    payload: &ExternalCampaign,
    status: CampaignStatus,
    now: DateTime<Utc>,
) -> NewCampaign {
    let kind =
        payload.discount_type.as_deref().map_or(DiscountKind::Percentage, map_discount_kind);
    let value = payload.discount_value.unwrap_or(Decimal::ZERO);

    NewCampaign {
        name: payload
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CAMPAIGN_NAME.to_string()),
        bank_id,
        card_id,
        category: payload.category.as_deref().map_or(Category::Other, map_category),
        discount: DiscountModel::from_parts(kind, value, payload.max_discount),
        min_amount: payload.min_amount.unwrap_or(Decimal::ZERO),
        valid_from: parse_feed_date(payload.start_date.as_deref(), now),
        valid_until: parse_feed_date(payload.end_date.as_deref(), now),
        merchant_id: payload.merchant_id.map(MerchantId),
        is_active: payload.is_active.unwrap_or(true),
        requires_enrollment: payload.requires_enrollment.unwrap_or(false),
        enrollment_url: payload.enrollment_url.clone(),
        source: CampaignSource::BankApi,
        status,
        external_id: Some(external_id),
        priority: 0,
    }
}

/// Provided fields overwrite, absent ones keep the stored value.
fn apply_update(stored: &Campaign, payload: &ExternalCampaign, now: DateTime<Utc>) -> Campaign {
    let mut campaign = stored.clone();

    if let Some(name) = payload.name.as_ref().filter(|name| !name.trim().is_empty()) {
        campaign.name = name.clone();
    }
    if let Some(card_id) = payload.card_id {
        campaign.card_id = CardId(card_id);
    }
    if let Some(category) = non_blank(&payload.category) {
        campaign.category = map_category(category);
    }

    let kind = non_blank(&payload.discount_type)
        .map_or_else(|| campaign.discount.kind(), map_discount_kind);
    let value = payload.discount_value.unwrap_or_else(|| campaign.discount.value());
    let max_discount = payload.max_discount.or_else(|| campaign.discount.max_discount());
    campaign.discount = DiscountModel::from_parts(kind, value, max_discount);

    if let Some(min_amount) = payload.min_amount {
        campaign.min_amount = min_amount;
    }
    if let Some(start) = non_blank(&payload.start_date) {
        campaign.valid_from = parse_feed_date(Some(start), now);
    }
    if let Some(end) = non_blank(&payload.end_date) {
        campaign.valid_until = parse_feed_date(Some(end), now);
    }
    if let Some(merchant_id) = payload.merchant_id {
        campaign.merchant_id = Some(MerchantId(merchant_id));
    }
    if let Some(is_active) = payload.is_active {
        campaign.is_active = is_active;
    }
    if let Some(requires_enrollment) = payload.requires_enrollment {
        campaign.requires_enrollment = requires_enrollment;
    }
    if let Some(url) = non_blank(&payload.enrollment_url) {
        campaign.enrollment_url = Some(url.to_string());
    }

    campaign
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

/// Feed category label to a category. Known bank synonyms first, then the
/// canonical labels, then `other`.
pub fn map_category(label: &str) -> Category {
    let normalized = normalize_label(label);
    let mapped = match normalized.as_str() {
        "electronic" | "tech" => Some(Category::Electronics),
        "clothing" | "apparel" => Some(Category::Fashion),
        "supermarket" | "food" => Some(Category::Grocery),
        "flight" | "hotel" => Some(Category::Travel),
        "dining" | "cafe" => Some(Category::Restaurant),
        "gas" | "petrol" => Some(Category::Fuel),
        "movie" | "game" => Some(Category::Entertainment),
        _ => None,
    };
    mapped.unwrap_or_else(|| Category::parse_or(&normalized, Category::Other))
}

/// Feed discount label to a discount kind, defaulting to percentage.
pub fn map_discount_kind(label: &str) -> DiscountKind {
    let normalized = normalize_label(label);
    let mapped = match normalized.as_str() {
        "percent" | "%" => Some(DiscountKind::Percentage),
        "cash_back" | "rebate" => Some(DiscountKind::Cashback),
        "point" | "mile" | "miles" => Some(DiscountKind::Points),
        "installments" | "payment_plan" => Some(DiscountKind::Installment),
        _ => None,
    };
    mapped.unwrap_or_else(|| DiscountKind::parse_or(&normalized, DiscountKind::Percentage))
}

/// Accepts ISO date-times with or without offset, space separated
/// date-times and bare dates (midnight UTC). Anything else resolves to `now`.
pub fn parse_feed_date(value: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return now;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return parsed.with_timezone(&Utc);
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return parsed.and_utc();
        }
    }
    if let Some(midnight) =
        NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return midnight.and_utc();
    }

    now
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Moves a pending campaign to approved (and live) or rejected (and
/// inactive). Any other status is left untouched.
pub fn review_campaign(
    campaign: &mut Campaign,
    decision: ReviewDecision,
) -> Result<(), DomainError> {
    if campaign.status != CampaignStatus::Pending {
        return Err(DomainError::InvalidInput(format!(
            "campaign {} is not pending approval (current status: {})",
            campaign.id, campaign.status
        )));
    }

    match decision {
        ReviewDecision::Approve => {
            campaign.status = CampaignStatus::Approved;
            campaign.is_active = true;
        }
        ReviewDecision::Reject => {
            campaign.status = CampaignStatus::Rejected;
            campaign.is_active = false;
        }
    }
    Ok(())
}
