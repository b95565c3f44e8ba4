use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::campaign::{CampaignId, DiscountKind};
use crate::domain::catalog::CardId;
use crate::lenient::{lenient_label_impls, LenientEnum};

/// Cart context for one evaluation plus the cards the caller says the
/// requester holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
    pub cart_amount: Decimal,
    pub cart_category: String,
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub user_cards: Vec<CardId>,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

impl RecommendationRequest {
    pub fn new(cart_amount: Decimal, cart_category: impl Into<String>) -> Self {
        Self {
            user_id: None,
            session_id: None,
            cart_amount,
            cart_category: cart_category.into(),
            merchant_name: None,
            user_cards: Vec::new(),
            as_of: None,
        }
    }

    pub fn with_merchant(mut self, merchant_name: impl Into<String>) -> Self {
        self.merchant_name = Some(merchant_name.into());
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_cards(mut self, cards: Vec<CardId>) -> Self {
        self.user_cards = cards;
        self
    }

    pub fn as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecommendation {
    pub campaign_id: CampaignId,
    pub card_id: CardId,
    pub card_name: String,
    pub bank_name: String,
    pub discount_type: DiscountKind,
    pub discount_value: Decimal,
    pub final_amount: Decimal,
    pub savings_amount: Decimal,
    pub is_existing_card: bool,
    pub requires_enrollment: bool,
    pub enrollment_url: Option<String>,
    pub application_url: Option<String>,
    pub affiliate_code: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub cart_amount: Decimal,
    pub cart_category: String,
    pub merchant_name: Option<String>,
    pub existing_card_recommendations: Vec<CardRecommendation>,
    pub new_card_recommendations: Vec<CardRecommendation>,
}

impl RecommendationResponse {
    pub fn is_empty(&self) -> bool {
        self.existing_card_recommendations.is_empty() && self.new_card_recommendations.is_empty()
    }

    /// Existing-card recommendations first, then new-card ones.
    pub fn all(&self) -> impl Iterator<Item = &CardRecommendation> {
        self.existing_card_recommendations.iter().chain(self.new_card_recommendations.iter())
    }
}

/// Analytics row written for every recommendation that was returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub user_id: Option<i64>,
    pub session_id: String,
    pub campaign_id: CampaignId,
    pub merchant_name: Option<String>,
    pub cart_amount: Decimal,
    pub cart_category: String,
    pub discount_amount: Decimal,
    pub original_amount: Decimal,
    pub is_existing_card: bool,
    pub needs_enrollment: bool,
    pub created_at: DateTime<Utc>,
}

impl RecommendationRecord {
    /// One record per returned recommendation. The session falls back to the
    /// response's request id so anonymous clicks can still be attributed.
    pub fn from_response(
        request: &RecommendationRequest,
        response: &RecommendationResponse,
    ) -> Vec<Self> {
        let session_id = request.session_id.clone().unwrap_or_else(|| response.request_id.clone());

        response
            .all()
            .map(|recommendation| Self {
                user_id: request.user_id,
                session_id: session_id.clone(),
                campaign_id: recommendation.campaign_id,
                merchant_name: response.merchant_name.clone(),
                cart_amount: response.cart_amount,
                cart_category: response.cart_category.clone(),
                discount_amount: recommendation.savings_amount,
                original_amount: response.cart_amount,
                is_existing_card: recommendation.is_existing_card,
                needs_enrollment: recommendation.requires_enrollment,
                created_at: response.timestamp,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickAction {
    CardApply,
    Enroll,
    Select,
}

impl LenientEnum for ClickAction {
    const VARIANTS: &'static [Self] = &[Self::CardApply, Self::Enroll, Self::Select];

    fn as_str(&self) -> &'static str {
        match self {
            Self::CardApply => "card_apply",
            Self::Enroll => "enroll",
            Self::Select => "select",
        }
    }
}

lenient_label_impls!(ClickAction, "click action");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickRequest {
    pub recommendation_campaign_id: CampaignId,
    pub session_id: Option<String>,
    pub actor_id: Option<i64>,
    pub action_type: ClickAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickResponse {
    pub success: bool,
    pub redirect_url: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationClick {
    pub campaign_id: CampaignId,
    pub session_id: Option<String>,
    pub actor_id: Option<i64>,
    pub action_type: ClickAction,
    pub created_at: DateTime<Utc>,
}

/// Click-through figures for one campaign.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CampaignEngagement {
    pub shown_count: u32,
    pub card_apply_count: u32,
    pub enroll_count: u32,
    pub select_count: u32,
    pub click_rate: f64,
}

impl CampaignEngagement {
    pub fn from_counts(shown: u32, card_apply: u32, enroll: u32, select: u32) -> Self {
        let clicks = card_apply + enroll + select;
        let click_rate = if shown == 0 { 0.0 } else { f64::from(clicks) / f64::from(shown) };
        Self {
            shown_count: shown,
            card_apply_count: card_apply,
            enroll_count: enroll,
            select_count: select,
            click_rate,
        }
    }
}
