use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::domain::catalog::{CampaignCatalog, CardOwnership};
use crate::domain::recommendation::{RecommendationRequest, RecommendationResponse};
use crate::errors::DomainError;
use crate::matching::eligibility::EligibilityCriteria;
use crate::matching::ranking::{rank, RankedRecommendations};
use crate::matching::{DEFAULT_TOP_N, MAX_CATEGORY_LEN, MAX_SESSION_ID_LEN};

/// Synchronous matching pipeline: validate, filter, price, rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecommendationEngine {
    top_n: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self { top_n: DEFAULT_TOP_N }
    }
}

/// Result of one evaluation before it is wrapped into a response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub eligible_count: usize,
    pub ranked: RankedRecommendations,
}

impl RecommendationEngine {
    pub fn new(top_n: usize) -> Self {
        Self { top_n: top_n.max(1) }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Ranks `catalog` for the request at `as_of`. Pure: identical inputs
    /// give identical rankings.
    pub fn evaluate(
        &self,
        catalog: &CampaignCatalog,
        request: &RecommendationRequest,
        owned: &CardOwnership,
        as_of: DateTime<Utc>,
    ) -> Result<Evaluation, DomainError> {
        validate_request(request)?;

        let criteria = EligibilityCriteria::new(
            request.cart_amount,
            &request.cart_category,
            request.merchant_name.as_deref(),
            as_of,
        );
        if criteria.category.is_none() {
            debug!(
                event_name = "matching.category.unmapped",
                cart_category = %request.cart_category,
                "category label is not a known category; matching all categories"
            );
        }

        let eligible = catalog.matching(&criteria);
        let eligible_count = eligible.len();
        let ranked = rank(eligible, owned, request.cart_amount, self.top_n);

        Ok(Evaluation { eligible_count, ranked })
    }

    /// Evaluates and wraps the ranking into a response with a fresh request id.
    /// `now` stamps the response and stands in for a missing `as_of`.
    pub fn recommend(
        &self,
        catalog: &CampaignCatalog,
        request: &RecommendationRequest,
        owned: &CardOwnership,
        now: DateTime<Utc>,
    ) -> Result<RecommendationResponse, DomainError> {
        let timestamp = now;
        let as_of = request.as_of.unwrap_or(now);
        let evaluation = self.evaluate(catalog, request, owned, as_of)?;

        Ok(RecommendationResponse {
            request_id: Uuid::new_v4().to_string(),
            timestamp,
            cart_amount: request.cart_amount,
            cart_category: request.cart_category.clone(),
            merchant_name: request.merchant_name.clone(),
            existing_card_recommendations: evaluation.ranked.existing,
            new_card_recommendations: evaluation.ranked.new,
        })
    }
}

pub fn validate_request(request: &RecommendationRequest) -> Result<(), DomainError> {
    if request.cart_amount <= Decimal::ZERO {
        return Err(DomainError::InvalidInput(format!(
            "cart_amount must be greater than zero, got {}",
            request.cart_amount
        )));
    }

    let category = request.cart_category.trim();
    if category.is_empty() {
        return Err(DomainError::InvalidInput("cart_category must not be blank".to_string()));
    }
    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(DomainError::InvalidInput(format!(
            "cart_category must be at most {MAX_CATEGORY_LEN} characters"
        )));
    }

    if let Some(merchant) = &request.merchant_name {
        if merchant.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "merchant_name must not be blank when provided".to_string(),
            ));
        }
    }

    if let Some(session_id) = &request.session_id {
        if session_id.len() > MAX_SESSION_ID_LEN {
            return Err(DomainError::InvalidInput(format!(
                "session_id must be at most {MAX_SESSION_ID_LEN} bytes"
            )));
        }
    }

    Ok(())
}
