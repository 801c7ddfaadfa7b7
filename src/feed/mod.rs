//! Program feeds: fetch partner offers and check the response shape before anything
//! else looks at it.

pub mod esfera;
pub mod html;
pub mod livelo;

use anyhow::Result;
use async_trait::async_trait;
use metrics::describe_counter;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::error::FeedError;
use crate::model::{PartnerOffer, Program, WatchList};

pub use esfera::EsferaProvider;
pub use livelo::LiveloProvider;

/// Fields every Livelo campaign record must carry.
pub const LIVELO_REQUIRED: &[&str] = &["parityClub", "legalTerms"];
/// Fields every Esfera product record must carry.
pub const ESFERA_REQUIRED: &[&str] = &[
    "seoUrlSlugDerived",
    "esf_accumulationAmount",
    "esf_accumulationHowItWorks",
];

#[async_trait]
pub trait FeedProvider: Send + Sync {
    fn program(&self) -> Program;

    /// Offers currently advertised. `watch` lets providers narrow the upstream query.
    async fn fetch_offers(&self, watch: &WatchList) -> Result<Vec<PartnerOffer>>;
}

pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_records_total", "Partner records parsed from feeds.");
        describe_counter!(
            "feed_errors_total",
            "Feed fetch, shape or per-record decode errors."
        );
    });
}

/// Check that a decoded response has the shape the program's parser relies on.
///
/// Missing fields are collected across all records and reported together.
pub fn validate_api_info(program: Program, body: &Value) -> Result<(), FeedError> {
    let (records, required) = match program {
        Program::Livelo => {
            let records = body
                .as_array()
                .ok_or_else(|| FeedError::NotACollection("expected a JSON array".into()))?;
            (records, LIVELO_REQUIRED)
        }
        Program::Esfera => {
            let records = body
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| FeedError::NotACollection("expected an \"items\" array".into()))?;
            (records, ESFERA_REQUIRED)
        }
    };

    let missing: Vec<String> = records
        .iter()
        .flat_map(|rec| {
            required
                .iter()
                .filter(move |field| rec.get(**field).is_none())
                .map(|field| format!("{field} is not present on records"))
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FeedError::MissingFields(missing))
    }
}

/// Accrual fields arrive as numbers or strings depending on the partner.
pub(crate) fn accrual_label(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// HTTP-backed provider for a program.
pub fn provider_for(program: Program) -> Box<dyn FeedProvider> {
    match program {
        Program::Livelo => Box::new(LiveloProvider::new()),
        Program::Esfera => Box::new(EsferaProvider::new()),
    }
}
