use clap::Args;

use cardwise_core::config::LoadOptions;
use cardwise_core::{
    CampaignId, ClickAction, ClickRequest, RecommendationEngine, RecommendationService,
};
use cardwise_db::{SqlCampaignRepository, SqlCardOwnershipRepository, SqlRecommendationLog};

use crate::commands::{
    application_failure, new_correlation_id, with_database, CommandResult, Completed,
};

#[derive(Debug, Clone, Args)]
pub struct ClickArgs {
    #[arg(long, help = "Campaign the user interacted with")]
    pub campaign_id: i64,
    #[arg(long, help = "card_apply | enroll | select")]
    pub action: ClickAction,
    #[arg(long, help = "Session the recommendation was shown in")]
    pub session_id: Option<String>,
    #[arg(long, help = "Acting user id")]
    pub user_id: Option<i64>,
}

pub fn run(options: LoadOptions, args: ClickArgs) -> CommandResult {
    let correlation_id = new_correlation_id();
    with_database("click", options, |config, pool| async move {
        let service = RecommendationService::new(
            SqlCampaignRepository::new(pool.clone()),
            SqlCardOwnershipRepository::new(pool.clone()),
            SqlRecommendationLog::new(pool),
            RecommendationEngine::new(config.recommendations.top_n),
        );

        let response = service
            .track_click(ClickRequest {
                recommendation_campaign_id: CampaignId(args.campaign_id),
                session_id: args.session_id,
                actor_id: args.user_id,
                action_type: args.action,
            })
            .await
            .map_err(|error| application_failure(error, &correlation_id))?;

        Completed::with_data(response.message.clone(), &response)
    })
}
