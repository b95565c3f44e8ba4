//! Campaign matching: eligibility filtering, savings pricing and ranking.

pub mod builder;
pub mod calculator;
pub mod eligibility;
pub mod engine;
pub mod ranking;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::build;
pub use calculator::{calculate, CalculatorError, SavingsOutcome};
pub use eligibility::EligibilityCriteria;
pub use engine::{validate_request, Evaluation, RecommendationEngine};
pub use ranking::{rank, RankedRecommendations, SkippedCampaign};

/// Recommendations kept per bucket unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 3;

pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_SESSION_ID_LEN: usize = 255;
