pub mod config;
pub mod domain;
pub mod errors;
pub mod import;
pub mod lenient;
pub mod matching;
pub mod ports;
pub mod service;

pub use domain::campaign::{
    Campaign, CampaignId, CampaignSource, CampaignStatus, Category, DiscountKind, DiscountModel,
    NewCampaign,
};
pub use domain::catalog::{
    Bank, BankId, CampaignCatalog, CardId, CardOwnership, CatalogEntry, CreditCard, Merchant,
    MerchantId,
};
pub use domain::recommendation::{
    CampaignEngagement, CardRecommendation, ClickAction, ClickRequest, ClickResponse,
    RecommendationClick, RecommendationRecord, RecommendationRequest, RecommendationResponse,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use import::{plan_import, ExternalCampaign, ImportAction, ImportPlan, ImportStats};
pub use lenient::LenientEnum;
pub use matching::{CalculatorError, RecommendationEngine, SavingsOutcome};
pub use ports::{CardOwnershipSource, CatalogSource, RecommendationLog};
pub use service::RecommendationService;
