//! Esfera partner catalogue (Oracle Commerce products endpoint).

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{accrual_label, ensure_metrics_described, validate_api_info, FeedProvider};
use crate::error::FeedError;
use crate::model::{PartnerOffer, Program, WatchList};

pub const ESFERA_PRODUCTS_URL: &str = "https://www.esfera.com.vc/ccstoreui/v1/products";
/// Catalogue category holding the "Junte pontos" partner stores.
pub const ESFERA_PARTNERS_CATEGORY: &str = "esf02163";

#[derive(Debug, Deserialize)]
struct Products {
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(rename = "seoUrlSlugDerived")]
    slug: String,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "esf_accumulationAmount")]
    accumulation_amount: Value,
    #[serde(rename = "esf_accumulationHowItWorks")]
    how_it_works: Option<String>,
    #[serde(rename = "esf_accumulationTargetURL", default)]
    target_url: Option<String>,
}

pub struct EsferaProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl EsferaProvider {
    pub fn new() -> Self {
        Self::from_url(ESFERA_PRODUCTS_URL)
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    /// Decode and validate a response body. Terms stay as the raw HTML the feed sent.
    pub fn parse_feed(body: &str) -> Result<Vec<PartnerOffer>, FeedError> {
        ensure_metrics_described();
        let raw: Value = serde_json::from_str(body)?;
        validate_api_info(Program::Esfera, &raw)?;
        let products: Products = serde_json::from_value(raw)?;

        let mut out = Vec::with_capacity(products.items.len());
        for item in products.items {
            let product: Product = match serde_json::from_value(item) {
                Ok(p) => p,
                Err(e) => {
                    warn!(target: "feed", program = "esfera", error = %e, "skipping record");
                    counter!("feed_errors_total").increment(1);
                    continue;
                }
            };
            out.push(PartnerOffer {
                program: Program::Esfera,
                name: product
                    .display_name
                    .unwrap_or_else(|| product.slug.clone()),
                code: product.slug,
                accrual: accrual_label(&product.accumulation_amount),
                legal_terms: product.how_it_works,
                target_url: product.target_url.filter(|u| !u.is_empty()),
                promotion: false,
            });
        }

        counter!("feed_records_total").increment(out.len() as u64);
        debug!(target: "feed", program = "esfera", records = out.len(), "feed parsed");
        Ok(out)
    }
}

impl Default for EsferaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedProvider for EsferaProvider {
    fn program(&self) -> Program {
        Program::Esfera
    }

    // The catalogue endpoint cannot be filtered by partner; the engine drops unwatched ones.
    async fn fetch_offers(&self, _watch: &WatchList) -> Result<Vec<PartnerOffer>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_feed(s)?),
            Mode::Http { url, client } => {
                let resp = match client
                    .get(url.as_str())
                    .query(&[("categoryId", ESFERA_PARTNERS_CATEGORY)])
                    .send()
                    .await
                {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!(target: "feed", error = ?e, program = "esfera", "provider http error");
                        counter!("feed_errors_total").increment(1);
                        return Err(e).context("esfera http get()");
                    }
                };
                let body = resp.text().await.context("esfera http .text()")?;
                Self::parse_feed(&body).with_context(|| format!("esfera feed at {url}"))
            }
        }
    }
}
