//! Livelo active-campaigns API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{accrual_label, ensure_metrics_described, validate_api_info, FeedProvider};
use crate::error::FeedError;
use crate::model::{PartnerOffer, Program, WatchList};

pub const LIVELO_CAMPAIGNS_URL: &str =
    "https://apis.pontoslivelo.com.br/partners-campaign/v1/campaigns/active";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Campaign {
    partner_code: Option<String>,
    #[serde(default)]
    partner_name: Option<String>,
    parity_club: Value,
    legal_terms: Option<String>,
    #[serde(default)]
    promotion: bool,
}

pub struct LiveloProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl LiveloProvider {
    pub fn new() -> Self {
        Self::from_url(LIVELO_CAMPAIGNS_URL)
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

    /// Decode and validate a response body. Records without a partner code are skipped.
    pub fn parse_feed(body: &str) -> Result<Vec<PartnerOffer>, FeedError> {
        ensure_metrics_described();
        let raw: Value = serde_json::from_str(body)?;
        validate_api_info(Program::Livelo, &raw)?;

        let Value::Array(records) = raw else {
            return Err(FeedError::NotACollection("expected a JSON array".into()));
        };

        let mut out = Vec::with_capacity(records.len());
        for rec in records {
            let campaign: Campaign = match serde_json::from_value(rec) {
                Ok(c) => c,
                Err(e) => {
                    warn!(target: "feed", program = "livelo", error = %e, "skipping record");
                    counter!("feed_errors_total").increment(1);
                    continue;
                }
            };
            let Some(code) = campaign.partner_code.filter(|c| !c.trim().is_empty()) else {
                warn!(target: "feed", program = "livelo", "record without partnerCode; skipping");
                counter!("feed_errors_total").increment(1);
                continue;
            };
            out.push(PartnerOffer {
                program: Program::Livelo,
                name: campaign.partner_name.unwrap_or_else(|| code.clone()),
                code,
                accrual: accrual_label(&campaign.parity_club),
                legal_terms: campaign.legal_terms,
                target_url: None,
                promotion: campaign.promotion,
            });
        }

        counter!("feed_records_total").increment(out.len() as u64);
        debug!(target: "feed", program = "livelo", records = out.len(), "feed parsed");
        Ok(out)
    }
}

impl Default for LiveloProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedProvider for LiveloProvider {
    fn program(&self) -> Program {
        Program::Livelo
    }

    async fn fetch_offers(&self, watch: &WatchList) -> Result<Vec<PartnerOffer>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_feed(s)?),
            Mode::Http { url, client } => {
                let query: Vec<(&str, &str)> =
                    watch.partner_ids().map(|id| ("partnersCodes", id)).collect();
                let resp = match client.get(url.as_str()).query(&query).send().await {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!(target: "feed", error = ?e, program = "livelo", "provider http error");
                        counter!("feed_errors_total").increment(1);
                        return Err(e).context("livelo http get()");
                    }
                };
                let body = resp.text().await.context("livelo http .text()")?;
                Self::parse_feed(&body).with_context(|| format!("livelo feed at {url}"))
            }
        }
    }
}
