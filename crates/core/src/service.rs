use chrono::Utc;
use tracing::{info, warn};

use crate::domain::catalog::CardOwnership;
use crate::domain::recommendation::{
    ClickAction, ClickRequest, ClickResponse, RecommendationClick, RecommendationRecord,
    RecommendationRequest, RecommendationResponse,
};
use crate::errors::{ApplicationError, DomainError};
use crate::matching::engine::{validate_request, RecommendationEngine};
use crate::ports::{CardOwnershipSource, CatalogSource, RecommendationLog};

/// Request-scoped orchestration around the pure [`RecommendationEngine`]:
/// resolves ownership, loads a catalog snapshot and records what was shown.
pub struct RecommendationService<C, O, L> {
    catalog: C,
    ownership: O,
    log: L,
    engine: RecommendationEngine,
}

impl<C, O, L> RecommendationService<C, O, L>
where
    C: CatalogSource,
    O: CardOwnershipSource,
    L: RecommendationLog,
{
    pub fn new(catalog: C, ownership: O, log: L, engine: RecommendationEngine) -> Self {
        Self { catalog, ownership, log, engine }
    }

    pub fn engine(&self) -> &RecommendationEngine {
        &self.engine
    }

    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse, ApplicationError> {
        validate_request(&request)?;

        let mut owned = CardOwnership::from_ids(request.user_cards.iter().copied());
        if let Some(user_id) = request.user_id {
            let persisted = self.ownership.owned_cards(user_id).await?;
            owned = owned.union(&persisted);
        }

        let now = Utc::now();
        let catalog = self.catalog.load_catalog(request.as_of.unwrap_or(now)).await?;
        let response = self.engine.recommend(&catalog, &request, &owned, now)?;

        info!(
            event_name = "recommendation.generated",
            correlation_id = %response.request_id,
            cart_category = %response.cart_category,
            existing_count = response.existing_card_recommendations.len(),
            new_count = response.new_card_recommendations.len(),
            catalog_size = catalog.len(),
            "recommendations generated"
        );

        let records = RecommendationRecord::from_response(&request, &response);
        if !records.is_empty() {
            if let Err(error) = self.log.record_generated(&records).await {
                warn!(
                    event_name = "recommendation.record.failed",
                    correlation_id = %response.request_id,
                    error = %error,
                    "failed to record recommendations; returning response anyway"
                );
            }
        }

        Ok(response)
    }

    pub async fn track_click(
        &self,
        request: ClickRequest,
    ) -> Result<ClickResponse, ApplicationError> {
        let campaign_id = request.recommendation_campaign_id;
        let entry = self
            .catalog
            .find_entry(campaign_id)
            .await?
            .ok_or(DomainError::UnknownCampaign { campaign_id })?;

        let click = RecommendationClick {
            campaign_id,
            session_id: request.session_id.clone(),
            actor_id: request.actor_id,
            action_type: request.action_type,
            created_at: Utc::now(),
        };
        if let Err(error) = self.log.record_click(&click).await {
            warn!(
                event_name = "recommendation.click.record_failed",
                campaign_id = campaign_id.0,
                action = %request.action_type,
                error = %error,
                "failed to record click"
            );
        }

        let redirect_url = match request.action_type {
            ClickAction::CardApply => entry.card.application_url.clone(),
            ClickAction::Enroll => entry.campaign.enrollment_url.clone(),
            ClickAction::Select => None,
        };

        info!(
            event_name = "recommendation.click.tracked",
            campaign_id = campaign_id.0,
            action = %request.action_type,
            has_redirect = redirect_url.is_some(),
            "click tracked"
        );

        Ok(ClickResponse {
            success: true,
            redirect_url,
            message: format!("Successfully tracked {} action", request.action_type),
        })
    }
}
