use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{BankId, CardId, MerchantId};
use crate::lenient::{lenient_label_impls, LenientEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grocery,
    Electronics,
    Travel,
    Fuel,
    Restaurant,
    Entertainment,
    Fashion,
    Health,
    Education,
    Insurance,
    Telecom,
    Cosmetics,
    Jewelry,
    Home,
    Automotive,
    Other,
}

impl LenientEnum for Category {
    const VARIANTS: &'static [Self] = &[
        Self::Grocery,
        Self::Electronics,
        Self::Travel,
        Self::Fuel,
        Self::Restaurant,
        Self::Entertainment,
        Self::Fashion,
        Self::Health,
        Self::Education,
        Self::Insurance,
        Self::Telecom,
        Self::Cosmetics,
        Self::Jewelry,
        Self::Home,
        Self::Automotive,
        Self::Other,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Grocery => "grocery",
            Self::Electronics => "electronics",
            Self::Travel => "travel",
            Self::Fuel => "fuel",
            Self::Restaurant => "restaurant",
            Self::Entertainment => "entertainment",
            Self::Fashion => "fashion",
            Self::Health => "health",
            Self::Education => "education",
            Self::Insurance => "insurance",
            Self::Telecom => "telecom",
            Self::Cosmetics => "cosmetics",
            Self::Jewelry => "jewelry",
            Self::Home => "home",
            Self::Automotive => "automotive",
            Self::Other => "other",
        }
    }
}

lenient_label_impls!(Category, "category");

/// Discount kind without its parameters, as stored and reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Cashback,
    Points,
    Installment,
}

impl LenientEnum for DiscountKind {
    const VARIANTS: &'static [Self] =
        &[Self::Percentage, Self::Cashback, Self::Points, Self::Installment];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Cashback => "cashback",
            Self::Points => "points",
            Self::Installment => "installment",
        }
    }
}

lenient_label_impls!(DiscountKind, "discount type");

/// How a campaign rewards the shopper. Each model carries only the
/// parameters its savings formula reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountModel {
    /// `rate` is a percentage (10 means 10 %), optionally capped.
    Percentage { rate: Decimal, max_discount: Option<Decimal> },
    /// Flat payout. `max_discount` is stored but never applied; the payout is
    /// bounded by the fixed 30 % of cart rule instead.
    Cashback { amount: Decimal, max_discount: Option<Decimal> },
    Points { points: Decimal },
    Installment { installments: Decimal },
}

impl DiscountModel {
    /// Rebuilds a model from its flat storage columns.
    pub fn from_parts(kind: DiscountKind, value: Decimal, max_discount: Option<Decimal>) -> Self {
        match kind {
            DiscountKind::Percentage => Self::Percentage { rate: value, max_discount },
            DiscountKind::Cashback => Self::Cashback { amount: value, max_discount },
            DiscountKind::Points => Self::Points { points: value },
            DiscountKind::Installment => Self::Installment { installments: value },
        }
    }

    pub fn kind(&self) -> DiscountKind {
        match self {
            Self::Percentage { .. } => DiscountKind::Percentage,
            Self::Cashback { .. } => DiscountKind::Cashback,
            Self::Points { .. } => DiscountKind::Points,
            Self::Installment { .. } => DiscountKind::Installment,
        }
    }

    pub fn value(&self) -> Decimal {
        match self {
            Self::Percentage { rate, .. } => *rate,
            Self::Cashback { amount, .. } => *amount,
            Self::Points { points } => *points,
            Self::Installment { installments } => *installments,
        }
    }

    pub fn max_discount(&self) -> Option<Decimal> {
        match self {
            Self::Percentage { max_discount, .. } | Self::Cashback { max_discount, .. } => {
                *max_discount
            }
            Self::Points { .. } | Self::Installment { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignSource {
    Manual,
    BankApi,
    FintechApi,
    PartnerApi,
}

impl LenientEnum for CampaignSource {
    const VARIANTS: &'static [Self] =
        &[Self::Manual, Self::BankApi, Self::FintechApi, Self::PartnerApi];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::BankApi => "bank_api",
            Self::FintechApi => "fintech_api",
            Self::PartnerApi => "partner_api",
        }
    }
}

lenient_label_impls!(CampaignSource, "campaign source");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Archived,
}

impl LenientEnum for CampaignStatus {
    const VARIANTS: &'static [Self] =
        &[Self::Draft, Self::Pending, Self::Approved, Self::Rejected, Self::Archived];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }
}

lenient_label_impls!(CampaignStatus, "campaign status");

impl CampaignStatus {
    /// Statuses a bank sync is still allowed to overwrite.
    pub fn accepts_sync_updates(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub bank_id: BankId,
    pub card_id: CardId,
    pub category: Category,
    pub discount: DiscountModel,
    pub min_amount: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub merchant_id: Option<MerchantId>,
    pub is_active: bool,
    pub requires_enrollment: bool,
    pub enrollment_url: Option<String>,
    pub source: CampaignSource,
    pub status: CampaignStatus,
    pub external_id: Option<String>,
    pub priority: i32,
}

impl Campaign {
    /// Active flag plus inclusive validity window.
    pub fn is_live_at(&self, as_of: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= as_of && as_of <= self.valid_until
    }

    pub fn accepts_amount(&self, cart_amount: Decimal) -> bool {
        self.min_amount <= cart_amount
    }

    /// Enrollment URL as shown to the shopper: only when enrollment is required.
    pub fn visible_enrollment_url(&self) -> Option<String> {
        if self.requires_enrollment {
            self.enrollment_url.clone()
        } else {
            None
        }
    }
}

/// A campaign that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCampaign {
    pub name: String,
    pub bank_id: BankId,
    pub card_id: CardId,
    pub category: Category,
    pub discount: DiscountModel,
    pub min_amount: Decimal,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub merchant_id: Option<MerchantId>,
    pub is_active: bool,
    pub requires_enrollment: bool,
    pub enrollment_url: Option<String>,
    pub source: CampaignSource,
    pub status: CampaignStatus,
    pub external_id: Option<String>,
    pub priority: i32,
}

impl NewCampaign {
    pub fn into_campaign(self, id: CampaignId) -> Campaign {
        Campaign {
            id,
            name: self.name,
            bank_id: self.bank_id,
            card_id: self.card_id,
            category: self.category,
            discount: self.discount,
            min_amount: self.min_amount,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            merchant_id: self.merchant_id,
            is_active: self.is_active,
            requires_enrollment: self.requires_enrollment,
            enrollment_url: self.enrollment_url,
            source: self.source,
            status: self.status,
            external_id: self.external_id,
            priority: self.priority,
        }
    }
}
