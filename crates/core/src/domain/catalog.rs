use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::campaign::{Campaign, CampaignId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: CardId,
    pub bank_id: BankId,
    pub name: String,
    pub card_type: String,
    pub card_tier: String,
    pub application_url: Option<String>,
    pub affiliate_code: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    pub city: Option<String>,
}

/// A campaign together with the card, bank and merchant it references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub campaign: Campaign,
    pub card: CreditCard,
    pub bank: Bank,
    pub merchant: Option<Merchant>,
}

/// Campaign snapshot used for a single evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CampaignCatalog {
    entries: Vec<CatalogEntry>,
}

impl CampaignCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn find(&self, campaign_id: CampaignId) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.campaign.id == campaign_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cards a requester already holds. Built once per request and only read
/// afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardOwnership {
    cards: BTreeSet<CardId>,
}

impl CardOwnership {
    pub fn from_ids(ids: impl IntoIterator<Item = CardId>) -> Self {
        Self { cards: ids.into_iter().collect() }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    /// Ownership covering the cards of both sets.
    pub fn union(&self, other: &CardOwnership) -> CardOwnership {
        Self { cards: self.cards.union(&other.cards).copied().collect() }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().copied()
    }
}
