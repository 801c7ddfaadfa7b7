//! decision.rs: output record of one partner evaluation, with explainability.
//!
//! Every check the engine runs leaves a `Reason`, so a reader of the report (or of the
//! JSON dump) can see why a promotion did or did not match.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{Program, WatchCriteria};
use crate::terms::CampaignWindow;

/// Which check produced a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Parity,
    SelectedProducts,
    MinimumPurchase,
    Category,
    Timeliness,
}

/// One piece of evidence behind a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub kind: ReasonKind,
    pub passed: bool,
    /// Human-readable detail ("base ratio 4 >= 3", "hit 'brinquedos' at 4 pts").
    pub message: String,
}

impl Reason {
    pub fn pass(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(kind: ReasonKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            passed: false,
            message: message.into(),
        }
    }
}

/// Final verdict for one partner against one watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub matched: bool,
    pub program: Program,
    pub partner: String,
    pub criteria: WatchCriteria,
    /// Base accrual parsed from the feed's label.
    pub base_ratio: Decimal,
    /// Terms as the feed sent them (HTML or plain), attached on match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_terms: Option<String>,
    /// Landing page, attached on match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<CampaignWindow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<Reason>,
}

impl PromotionDecision {
    /// Skeleton decision, not matched, without evidence.
    pub fn new(
        program: Program,
        partner: impl Into<String>,
        criteria: WatchCriteria,
        base_ratio: Decimal,
    ) -> Self {
        Self {
            matched: false,
            program,
            partner: partner.into(),
            criteria,
            base_ratio,
            legal_terms: None,
            url: None,
            window: None,
            reasons: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.reasons.push(reason);
        self
    }

    pub fn with_window(mut self, window: Option<CampaignWindow>) -> Self {
        self.window = window;
        self
    }

    /// Mark as matched and attach what the notification needs.
    pub fn matched(mut self, url: Option<String>, legal_terms: Option<String>) -> Self {
        self.matched = true;
        self.url = url;
        self.legal_terms = legal_terms;
        self
    }

    /// First failing check, if any.
    pub fn rejection(&self) -> Option<&Reason> {
        self.reasons.iter().find(|r| !r.passed)
    }
}
