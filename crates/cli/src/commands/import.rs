use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use serde_json::Value;
use tracing::info;

use cardwise_core::config::LoadOptions;
use cardwise_core::import::{plan_import, ExternalCampaign};
use cardwise_core::BankId;
use cardwise_db::SqlCampaignRepository;

use crate::commands::{with_database, CommandResult, Completed, Failure};

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    #[arg(long, help = "Bank the feed belongs to")]
    pub bank_id: i64,
    #[arg(long, help = "JSON feed: an array of campaigns or an object with a `campaigns` array")]
    pub file: PathBuf,
    #[arg(long, help = "Approve new campaigns immediately instead of queueing them for review")]
    pub auto_approve: bool,
}

pub fn run(mut options: LoadOptions, args: ImportArgs) -> CommandResult {
    let payloads = match read_feed(&args.file) {
        Ok(payloads) => payloads,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("import", error_class, message, exit_code);
        }
    };
    if args.auto_approve {
        options.overrides.auto_approve = Some(true);
    }

    with_database("import", options, |config, pool| async move {
        let bank_id = BankId(args.bank_id);
        let repository = SqlCampaignRepository::new(pool);
        let existing = repository
            .list_for_bank(bank_id)
            .await
            .map_err(|error| ("persistence", error.to_string(), 8u8))?;

        let plan =
            plan_import(bank_id, &payloads, &existing, config.import.auto_approve, Utc::now());
        repository
            .apply_import(&plan)
            .await
            .map_err(|error| ("persistence", error.to_string(), 8u8))?;

        info!(
            event_name = "import.completed",
            bank_id = bank_id.0,
            imported = plan.stats.imported,
            skipped = plan.stats.skipped,
            "campaign feed imported"
        );

        let stats = plan.stats;
        Completed::with_data(
            format!(
                "imported {} campaigns ({} created, {} updated, {} skipped)",
                stats.imported, stats.created, stats.updated, stats.skipped
            ),
            stats,
        )
    })
}

fn read_feed(path: &Path) -> Result<Vec<ExternalCampaign>, Failure> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ("feed_read", format!("could not read `{}`: {error}", path.display()), 6u8)
    })?;
    parse_feed(&raw)
}

/// Accepts a bare array or an object wrapping it in `campaigns`.
fn parse_feed(raw: &str) -> Result<Vec<ExternalCampaign>, Failure> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|error| ("feed_parse", format!("feed is not valid JSON: {error}"), 6u8))?;

    let campaigns = match document {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut object) => object.remove("campaigns").ok_or_else(|| {
            ("feed_parse", "feed object has no `campaigns` array".to_string(), 6u8)
        })?,
        _ => {
            return Err(("feed_parse", "feed must be a JSON array or object".to_string(), 6u8));
        }
    };

    serde_json::from_value(campaigns)
        .map_err(|error| ("feed_parse", format!("feed entries are malformed: {error}"), 6u8))
}
