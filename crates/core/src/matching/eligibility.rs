use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::campaign::Category;
use crate::domain::catalog::{CampaignCatalog, CatalogEntry};
use crate::lenient::LenientEnum;

/// Normalized filter derived from the cart. A category label that does not
/// name a known category leaves `category` empty, which disables the
/// category constraint instead of rejecting every campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EligibilityCriteria {
    pub cart_amount: Decimal,
    pub category: Option<Category>,
    pub merchant_needle: Option<String>,
    pub as_of: DateTime<Utc>,
}

impl EligibilityCriteria {
    pub fn new(
        cart_amount: Decimal,
        category_label: &str,
        merchant_name: Option<&str>,
        as_of: DateTime<Utc>,
    ) -> Self {
        let merchant_needle = merchant_name
            .map(|name| name.trim().to_lowercase())
            .filter(|needle| !needle.is_empty());

        Self {
            cart_amount,
            category: Category::parse_lenient(category_label),
            merchant_needle,
            as_of,
        }
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        let campaign = &entry.campaign;

        if !campaign.is_live_at(self.as_of) || !campaign.accepts_amount(self.cart_amount) {
            return false;
        }

        if let Some(category) = self.category {
            if campaign.category != category {
                return false;
            }
        }

        match &self.merchant_needle {
            None => true,
            Some(needle) => entry
                .merchant
                .as_ref()
                .is_some_and(|merchant| merchant.name.to_lowercase().contains(needle.as_str())),
        }
    }
}

impl CampaignCatalog {
    /// Campaigns a cart qualifies for at `as_of`, in catalog order.
    pub fn find_matching(
        &self,
        cart_amount: Decimal,
        category: &str,
        merchant_name: Option<&str>,
        as_of: DateTime<Utc>,
    ) -> Vec<&CatalogEntry> {
        let criteria = EligibilityCriteria::new(cart_amount, category, merchant_name, as_of);
        self.matching(&criteria)
    }

    pub fn matching(&self, criteria: &EligibilityCriteria) -> Vec<&CatalogEntry> {
        self.entries().iter().filter(|entry| criteria.matches(entry)).collect()
    }
}
