// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod clock;
pub mod config;
pub mod decision;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod feed;
pub mod model;
pub mod notify;
pub mod terms;

// ---- Re-exports for stable public API ----
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::decision::{PromotionDecision, Reason, ReasonKind};
pub use crate::engine::{evaluate, evaluate_all, promotional_partners, RunOutcome};
pub use crate::error::{EvalError, FeedError, TermsError};
pub use crate::feed::{validate_api_info, FeedProvider};
pub use crate::model::{PartnerOffer, Program, WatchConfig, WatchCriteria, WatchList};
pub use crate::notify::{Notifier, Report};
