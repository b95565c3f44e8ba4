use cardwise_core::config::LoadOptions;
use cardwise_db::{CampaignSeedInfo, DemoCatalog};

use crate::commands::{with_database, CommandResult, Completed};

pub fn run(options: LoadOptions) -> CommandResult {
    with_database("seed", options, |_config, pool| async move {
        let seed_result = DemoCatalog::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoCatalog::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            return Err(("seed_verification", verification_failure_message(&failed_checks), 6u8));
        }

        Ok(Completed::new(seed_summary(&seed_result.campaigns_seeded)))
    })
}

fn verification_failure_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

fn seed_summary(campaigns: &[CampaignSeedInfo]) -> String {
    let lines: Vec<String> = campaigns
        .iter()
        .map(|seed| {
            format!("  - {}: campaign {} ({})", seed.label, seed.campaign_id, seed.description)
        })
        .collect();
    format!("Demo catalog loaded with {} campaigns:\n{}", campaigns.len(), lines.join("\n"))
}
