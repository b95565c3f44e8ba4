use rust_decimal::Decimal;

use crate::domain::catalog::CatalogEntry;
use crate::domain::recommendation::CardRecommendation;
use crate::matching::calculator::{calculate, CalculatorError};

/// Prices `entry` for the cart and fills the card/bank display fields.
///
/// Acquisition fields (application URL, affiliate code) are only filled for
/// cards the requester does not hold yet.
pub fn build(
    entry: &CatalogEntry,
    cart_amount: Decimal,
    is_existing_card: bool,
) -> Result<CardRecommendation, CalculatorError> {
    let campaign = &entry.campaign;
    let outcome = calculate(&campaign.discount, cart_amount)?;

    let (application_url, affiliate_code) = if is_existing_card {
        (None, None)
    } else {
        (entry.card.application_url.clone(), entry.card.affiliate_code.clone())
    };

    Ok(CardRecommendation {
        campaign_id: campaign.id,
        card_id: entry.card.id,
        card_name: entry.card.name.clone(),
        bank_name: entry.bank.name.clone(),
        discount_type: campaign.discount.kind(),
        discount_value: campaign.discount.value(),
        final_amount: outcome.final_amount,
        savings_amount: outcome.savings_amount,
        is_existing_card,
        requires_enrollment: campaign.requires_enrollment,
        enrollment_url: campaign.visible_enrollment_url(),
        application_url,
        affiliate_code,
        logo_url: entry.card.logo_url.clone(),
    })
}
