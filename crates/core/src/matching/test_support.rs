use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::campaign::{
    Campaign, CampaignId, CampaignSource, CampaignStatus, Category, DiscountModel,
};
use crate::domain::catalog::{
    Bank, BankId, CardId, CatalogEntry, CreditCard, Merchant, MerchantId,
};

pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().expect("valid date")
}

/// Live percentage campaign (capped at 100, minimum cart 100) on its own card.
pub(crate) fn entry(id: i64, category: Category, rate: i64) -> CatalogEntry {
    let card_id = CardId(100 + id);
    let bank = Bank {
        id: BankId(1),
        name: "Example Bank".to_string(),
        logo_url: Some("https://bank.example/logo.png".to_string()),
    };
    let card = CreditCard {
        id: card_id,
        bank_id: bank.id,
        name: format!("Card {id}"),
        card_type: "credit".to_string(),
        card_tier: "classic".to_string(),
        application_url: Some(format!("https://bank.example/apply/{id}")),
        affiliate_code: Some(format!("AFF-{id}")),
        logo_url: Some(format!("https://bank.example/cards/{id}.png")),
        is_active: true,
    };
    let campaign = Campaign {
        id: CampaignId(id),
        name: format!("Campaign {id}"),
        bank_id: bank.id,
        card_id,
        category,
        discount: DiscountModel::Percentage {
            rate: Decimal::from(rate),
            max_discount: Some(Decimal::from(100)),
        },
        min_amount: Decimal::from(100),
        valid_from: now() - Duration::days(30),
        valid_until: now() + Duration::days(30),
        merchant_id: None,
        is_active: true,
        requires_enrollment: false,
        enrollment_url: None,
        source: CampaignSource::Manual,
        status: CampaignStatus::Approved,
        external_id: None,
        priority: 0,
    };

    CatalogEntry { campaign, card, bank, merchant: None }
}

pub(crate) fn merchant(id: i64, name: &str) -> Merchant {
    Merchant { id: MerchantId(id), name: name.to_string(), city: None }
}
