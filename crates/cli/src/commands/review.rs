use clap::{Args, ValueEnum};

use cardwise_core::config::LoadOptions;
use cardwise_core::import::ReviewDecision;
use cardwise_core::{CampaignId, CampaignStatus};
use cardwise_db::SqlCampaignRepository;

use crate::commands::{
    application_failure, new_correlation_id, with_database, CommandResult, Completed,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
    Approve,
    Reject,
}

impl From<DecisionArg> for ReviewDecision {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Approve => ReviewDecision::Approve,
            DecisionArg::Reject => ReviewDecision::Reject,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ReviewArgs {
    #[arg(long, help = "Pending campaign to review")]
    pub campaign_id: i64,
    #[arg(long, value_enum)]
    pub decision: DecisionArg,
}

#[derive(Debug, Clone, Args)]
pub struct PendingArgs {
    #[arg(long, default_value_t = 50, help = "Maximum number of campaigns to list")]
    pub limit: u32,
}

pub fn run(options: LoadOptions, args: ReviewArgs) -> CommandResult {
    let correlation_id = new_correlation_id();
    with_database("review", options, |_config, pool| async move {
        let campaign = SqlCampaignRepository::new(pool)
            .review(CampaignId(args.campaign_id), args.decision.into())
            .await
            .map_err(|error| application_failure(error, &correlation_id))?;

        Completed::with_data(
            format!("campaign {} is now {}", campaign.id, campaign.status),
            &campaign,
        )
    })
}

pub fn pending(options: LoadOptions, args: PendingArgs) -> CommandResult {
    with_database("pending", options, |_config, pool| async move {
        let campaigns = SqlCampaignRepository::new(pool)
            .list_by_status(CampaignStatus::Pending, args.limit)
            .await
            .map_err(|error| ("persistence", error.to_string(), 8u8))?;

        Completed::with_data(format!("{} campaigns awaiting review", campaigns.len()), &campaigns)
    })
}
