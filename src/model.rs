//! Records the engine works on: partner offers from the feeds and the watch list.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const LIVELO_CAMPAIGN_URL_BASE: &str = "https://www.livelo.com.br/ganhe-pontos-compre-pontue-";

/// Loyalty program a feed belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Program {
    Livelo,
    Esfera,
}

impl Program {
    pub fn label(self) -> &'static str {
        match self {
            Program::Livelo => "Livelo",
            Program::Esfera => "Esfera",
        }
    }

    /// Landing page for a partner when the feed itself carries no URL.
    /// Livelo pages are addressed by the watcher's label; Esfera always sends one.
    pub fn campaign_url(self, label: &str) -> Option<String> {
        match self {
            Program::Livelo => {
                let slug: String = label
                    .to_lowercase()
                    .chars()
                    .filter(|c| *c != ' ')
                    .collect();
                Some(format!("{LIVELO_CAMPAIGN_URL_BASE}{slug}"))
            }
            Program::Esfera => None,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One partner store as advertised by a program feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerOffer {
    pub program: Program,
    /// Partner code (Livelo) or URL slug (Esfera); key into the watch list.
    pub code: String,
    pub name: String,
    /// Advertised base accrual, as the feed wrote it ("4", "Até 4 pts", ...).
    pub accrual: String,
    /// Raw legal terms, possibly HTML.
    pub legal_terms: Option<String>,
    pub target_url: Option<String>,
    /// Feed flag marking the partner as currently on promotion.
    #[serde(default)]
    pub promotion: bool,
}

/// One watcher's interest in a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchCriteria {
    /// Filled from the watch-list key when loaded.
    #[serde(default)]
    pub partner: String,
    pub name: String,
    pub min_points: Decimal,
    /// Highest acceptable "compras acima de" threshold. `None` means unbounded.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    /// Case- and accent-sensitive substrings.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Last day this watcher is active (`YYYY-MM-DD`).
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl WatchCriteria {
    pub fn new(partner: impl Into<String>, name: impl Into<String>, min_points: Decimal) -> Self {
        Self {
            partner: partner.into(),
            name: name.into(),
            min_points,
            max_amount: None,
            categories: Vec::new(),
            valid_until: None,
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_amount(mut self, max_amount: Decimal) -> Self {
        self.max_amount = Some(max_amount);
        self
    }

    pub fn with_valid_until(mut self, date: NaiveDate) -> Self {
        self.valid_until = Some(date);
        self
    }

    /// A watcher without an expiry never lapses.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.valid_until.map_or(true, |until| until >= today)
    }
}

/// Watchers of one program, keyed by partner id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WatchList {
    entries: BTreeMap<String, WatchCriteria>,
}

impl WatchList {
    pub fn from_map(map: BTreeMap<String, WatchCriteria>) -> Self {
        let entries = map
            .into_iter()
            .map(|(partner, mut criteria)| {
                criteria.partner = partner.clone();
                (partner, criteria)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, partner: &str) -> Option<&WatchCriteria> {
        self.entries.get(partner)
    }

    pub fn contains(&self, partner: &str) -> bool {
        self.entries.contains_key(partner)
    }

    pub fn partner_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchCriteria> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<WatchCriteria> for WatchList {
    fn from_iter<T: IntoIterator<Item = WatchCriteria>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|c| (c.partner.clone(), c)).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for WatchList {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, WatchCriteria>::deserialize(d)?;
        Ok(Self::from_map(map))
    }
}

/// Whole watch configuration: one list per program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub livelo: WatchList,
    #[serde(default)]
    pub esfera: WatchList,
}

impl WatchConfig {
    pub fn for_program(&self, program: Program) -> &WatchList {
        match program {
            Program::Livelo => &self.livelo,
            Program::Esfera => &self.esfera,
        }
    }
}
