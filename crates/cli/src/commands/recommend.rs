use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;

use cardwise_core::config::LoadOptions;
use cardwise_core::{
    CardId, RecommendationEngine, RecommendationRequest, RecommendationResponse,
    RecommendationService,
};
use cardwise_db::{SqlCampaignRepository, SqlCardOwnershipRepository, SqlRecommendationLog};

use crate::commands::{
    application_failure, new_correlation_id, with_database, CommandResult, Completed,
};

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Cart total in the configured currency")]
    pub amount: Decimal,
    #[arg(long, help = "Cart category label, e.g. grocery or electronics")]
    pub category: String,
    #[arg(long, help = "Only match campaigns whose merchant name contains this text")]
    pub merchant: Option<String>,
    #[arg(long, help = "Merge the cards stored for this user into the owned set")]
    pub user_id: Option<i64>,
    #[arg(long, help = "Session id recorded with the recommendations")]
    pub session_id: Option<String>,
    #[arg(long = "card", help = "Card id the requester holds (repeatable)")]
    pub cards: Vec<i64>,
    #[arg(long, help = "Evaluate validity windows at this RFC 3339 instant")]
    pub as_of: Option<DateTime<Utc>>,
}

impl RecommendArgs {
    pub fn into_request(self) -> RecommendationRequest {
        let mut request = RecommendationRequest::new(self.amount, self.category)
            .with_cards(self.cards.into_iter().map(CardId).collect());
        request.merchant_name = self.merchant;
        request.user_id = self.user_id;
        request.session_id = self.session_id;
        request.as_of = self.as_of;
        request
    }
}

pub fn run(options: LoadOptions, args: RecommendArgs) -> CommandResult {
    let correlation_id = new_correlation_id();
    with_database("recommend", options, |config, pool| async move {
        let service = RecommendationService::new(
            SqlCampaignRepository::new(pool.clone()),
            SqlCardOwnershipRepository::new(pool.clone()),
            SqlRecommendationLog::new(pool),
            RecommendationEngine::new(config.recommendations.top_n),
        );

        let response = service
            .recommend(args.into_request())
            .await
            .map_err(|error| application_failure(error, &correlation_id))?;

        let message = summary(&response, &config.recommendations.default_currency);
        Completed::with_data(message, &response)
    })
}

fn summary(response: &RecommendationResponse, currency: &str) -> String {
    let best = response
        .all()
        .max_by(|left, right| left.savings_amount.cmp(&right.savings_amount))
        .map(|best| {
            format!(
                "; best saving {} {currency} with {} ({})",
                best.savings_amount, best.card_name, best.bank_name
            )
        })
        .unwrap_or_default();

    format!(
        "{} existing-card and {} new-card recommendations for {} {currency} in {}{best}",
        response.existing_card_recommendations.len(),
        response.new_card_recommendations.len(),
        response.cart_amount,
        response.cart_category,
    )
}
