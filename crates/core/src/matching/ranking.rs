use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::campaign::CampaignId;
use crate::domain::catalog::{CardOwnership, CatalogEntry};
use crate::domain::recommendation::CardRecommendation;
use crate::matching::builder::build;
use crate::matching::calculator::CalculatorError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecommendations {
    pub existing: Vec<CardRecommendation>,
    pub new: Vec<CardRecommendation>,
    pub skipped: Vec<SkippedCampaign>,
}

/// A campaign left out of the ranking because its configuration produced
/// an impossible price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCampaign {
    pub campaign_id: CampaignId,
    pub reason: String,
}

/// Savings descending, then campaign id ascending so equal savings always
/// come out in the same order.
pub fn compare_by_savings(left: &CardRecommendation, right: &CardRecommendation) -> Ordering {
    right
        .savings_amount
        .cmp(&left.savings_amount)
        .then_with(|| left.campaign_id.cmp(&right.campaign_id))
}

/// Builds, partitions by ownership, orders, and truncates each bucket to
/// `top_n`. A campaign whose pricing breaks an invariant is skipped and
/// reported; the rest are still ranked.
pub fn rank<'a>(
    entries: impl IntoIterator<Item = &'a CatalogEntry>,
    owned: &CardOwnership,
    cart_amount: Decimal,
    top_n: usize,
) -> RankedRecommendations {
    let mut ranked = RankedRecommendations::default();

    for entry in entries {
        let is_existing_card = owned.contains(entry.campaign.card_id);
        match build(entry, cart_amount, is_existing_card) {
            Ok(recommendation) if is_existing_card => ranked.existing.push(recommendation),
            Ok(recommendation) => ranked.new.push(recommendation),
            Err(error) => ranked.skipped.push(skip(entry, &error)),
        }
    }

    for bucket in [&mut ranked.existing, &mut ranked.new] {
        bucket.sort_by(compare_by_savings);
        bucket.truncate(top_n);
    }

    ranked
}

fn skip(entry: &CatalogEntry, error: &CalculatorError) -> SkippedCampaign {
    warn!(
        event_name = "matching.campaign.skipped",
        campaign_id = entry.campaign.id.0,
        card_id = entry.campaign.card_id.0,
        error = %error,
        "campaign skipped: pricing violated a calculator invariant"
    );
    SkippedCampaign { campaign_id: entry.campaign.id, reason: error.to_string() }
}
