use chrono::{DateTime, Utc};
use clap::Args;

use cardwise_core::config::LoadOptions;
use cardwise_core::CampaignId;
use cardwise_db::SqlRecommendationLog;

use crate::commands::{with_database, CommandResult, Completed};

#[derive(Debug, Clone, Args)]
pub struct StatsArgs {
    #[arg(long)]
    pub campaign_id: i64,
    #[arg(long, help = "Only count events at or after this RFC 3339 instant")]
    pub since: Option<DateTime<Utc>>,
}

pub fn run(options: LoadOptions, args: StatsArgs) -> CommandResult {
    with_database("stats", options, |_config, pool| async move {
        let engagement = SqlRecommendationLog::new(pool)
            .engagement(CampaignId(args.campaign_id), args.since)
            .await
            .map_err(|error| ("persistence", error.to_string(), 8u8))?;

        Completed::with_data(
            format!(
                "campaign {} shown {} times, {} clicks ({:.1}% click-through)",
                args.campaign_id,
                engagement.shown_count,
                engagement.card_apply_count + engagement.enroll_count + engagement.select_count,
                engagement.click_rate * 100.0
            ),
            engagement,
        )
    })
}
