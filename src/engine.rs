//! # Promotion Evaluation Engine
//! Pure, testable logic that maps `(PartnerOffer, WatchCriteria, today)` → `PromotionDecision`.
//! No I/O; the caller fetches feeds and injects the date.
//!
//! Policy, in order, stopping at the first failing check:
//! 1) base accrual ratio ≥ watcher minimum
//! 2) terms do not restrict the rate to "produtos selecionados"
//! 3) "compras acima de" amount ≤ watcher ceiling
//! 4) a points-bearing sentence matches a watched category (or "demais categorias")
//! 5) the promotion starts or ends today

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::decision::{PromotionDecision, Reason, ReasonKind};
use crate::eligibility::{timeliness, Timeliness};
use crate::error::{EvalError, TermsError};
use crate::feed::html::to_plain_text;
use crate::model::{PartnerOffer, WatchCriteria, WatchList};
use crate::terms::{
    check_purchase_ceiling, match_categories, CategoryVerdict, HitVia, PurchaseCheck,
    TermsAnalysis, SELECTED_PRODUCTS,
};

/// Noise partners wrap around the accrual number, stripped in this order.
const RATIO_NOISE: &[&str] = &["Até ", "até ", " pts", " pt", "de ", " a "];

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "promo_partners_evaluated_total",
            "Partners evaluated against a watcher."
        );
        describe_counter!("promo_matches_total", "Evaluations that produced a match.");
        describe_counter!(
            "promo_partners_skipped_total",
            "Partners skipped because their data could not be parsed."
        );
    });
}

/// Parse a feed accrual label ("4", "Até 4 pts", "2,5 pts") into a decimal.
///
/// Range labels such as "de 2 a 10 pts" collapse to the digits glued together ("210");
/// partners rarely publish ranges and the label is only a coarse pre-filter.
pub fn parse_accrual_ratio(raw: &str) -> Option<Decimal> {
    let stripped = RATIO_NOISE
        .iter()
        .fold(raw.trim().to_string(), |acc, noise| acc.replace(noise, ""));
    Decimal::from_str(stripped.trim().replace(',', ".").as_str()).ok()
}

/// Evaluate one offer for one watcher on `today`.
pub fn evaluate(
    offer: &PartnerOffer,
    criteria: &WatchCriteria,
    today: chrono::NaiveDate,
) -> Result<PromotionDecision, EvalError> {
    let base_ratio = parse_accrual_ratio(&offer.accrual).ok_or_else(|| EvalError::Ratio {
        partner: offer.code.clone(),
        raw: offer.accrual.clone(),
    })?;

    let decision =
        PromotionDecision::new(offer.program, &offer.code, criteria.clone(), base_ratio);

    if base_ratio < criteria.min_points {
        return Ok(decision.with_reason(Reason::fail(
            ReasonKind::Parity,
            format!("base ratio {base_ratio} < {}", criteria.min_points),
        )));
    }
    let decision = decision.with_reason(Reason::pass(
        ReasonKind::Parity,
        format!("base ratio {base_ratio} >= {}", criteria.min_points),
    ));

    let plain = offer
        .legal_terms
        .as_deref()
        .map(to_plain_text)
        .unwrap_or_default();
    let decision = decision.with_window(TermsAnalysis::analyze(&plain).window);

    let decision = match check_terms(&plain, criteria) {
        Ok(TermsCheck::Passed(reasons)) => reasons
            .into_iter()
            .fold(decision, PromotionDecision::with_reason),
        Ok(TermsCheck::Rejected(reasons)) => {
            return Ok(reasons
                .into_iter()
                .fold(decision, PromotionDecision::with_reason));
        }
        Err(TermsError::Amount { raw }) | Err(TermsError::Date { raw }) => {
            return Err(EvalError::Amount {
                partner: offer.code.clone(),
                raw,
            });
        }
    };

    let when = timeliness(&plain, today);
    let eligible = when.is_eligible();
    let decision = decision.with_reason(timeliness_reason(&when));
    if !eligible {
        return Ok(decision);
    }

    let url = offer
        .target_url
        .clone()
        .or_else(|| offer.program.campaign_url(&criteria.name));
    Ok(decision.matched(url, offer.legal_terms.clone()))
}

enum TermsCheck {
    Passed(Vec<Reason>),
    Rejected(Vec<Reason>),
}

/// Selected-products, purchase-ceiling and category checks over plain terms.
/// Empty terms satisfy all of them.
fn check_terms(plain: &str, criteria: &WatchCriteria) -> Result<TermsCheck, TermsError> {
    let mut reasons = Vec::new();
    if plain.is_empty() {
        reasons.push(Reason::pass(ReasonKind::Category, "no legal terms"));
        return Ok(TermsCheck::Passed(reasons));
    }

    if plain.contains(SELECTED_PRODUCTS) {
        reasons.push(Reason::fail(
            ReasonKind::SelectedProducts,
            "rate limited to selected products",
        ));
        return Ok(TermsCheck::Rejected(reasons));
    }

    match check_purchase_ceiling(plain, criteria.max_amount)? {
        PurchaseCheck::NoMinimum => {}
        PurchaseCheck::Within(amount) => reasons.push(Reason::pass(
            ReasonKind::MinimumPurchase,
            format!("minimum purchase R$ {amount} within ceiling"),
        )),
        PurchaseCheck::Exceeds(amount) => {
            reasons.push(Reason::fail(
                ReasonKind::MinimumPurchase,
                format!("minimum purchase R$ {amount} above ceiling"),
            ));
            return Ok(TermsCheck::Rejected(reasons));
        }
    }

    match match_categories(plain, &criteria.categories, criteria.min_points) {
        CategoryVerdict::NotRequired => {}
        CategoryVerdict::Hit(hit) => {
            let via = match &hit.via {
                HitVia::Keyword(k) => format!("category '{k}'"),
                HitVia::OtherCategories => "other categories".to_string(),
            };
            reasons.push(Reason::pass(
                ReasonKind::Category,
                format!("{via} at {} pts: \"{}\"", hit.points, hit.clause),
            ));
        }
        CategoryVerdict::Miss => {
            reasons.push(Reason::fail(
                ReasonKind::Category,
                format!(
                    "no sentence offers {} pts for {}",
                    criteria.min_points,
                    criteria.categories.join(", ")
                ),
            ));
            return Ok(TermsCheck::Rejected(reasons));
        }
    }

    Ok(TermsCheck::Passed(reasons))
}

fn timeliness_reason(t: &Timeliness) -> Reason {
    match t {
        Timeliness::NoTerms => Reason::pass(ReasonKind::Timeliness, "no date constraint"),
        Timeliness::BoundaryToday { date } => {
            Reason::pass(ReasonKind::Timeliness, format!("campaign starts or ends {date}"))
        }
        Timeliness::DayToday { marker } => {
            Reason::pass(ReasonKind::Timeliness, format!("campaign day {marker} is today"))
        }
        Timeliness::NotToday => Reason::fail(ReasonKind::Timeliness, "campaign dates are not today"),
        Timeliness::NoDates => Reason::fail(ReasonKind::Timeliness, "campaign is lacking dates"),
    }
}

/// Result of evaluating a whole feed against one watch list.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// One decision per watched, active partner, in feed order.
    pub decisions: Vec<PromotionDecision>,
    /// Partners whose data could not be parsed.
    pub skipped: Vec<EvalError>,
    /// Offers for partners nobody watches.
    pub unwatched: usize,
    /// Offers whose watcher expired.
    pub inactive: usize,
}

impl RunOutcome {
    pub fn matches(&self) -> impl Iterator<Item = &PromotionDecision> {
        self.decisions.iter().filter(|d| d.matched)
    }
}

/// Evaluate every offer that has an active watcher. Each partner is independent.
pub fn evaluate_all(offers: &[PartnerOffer], watch: &WatchList, clock: &dyn Clock) -> RunOutcome {
    ensure_metrics_described();

    let today = clock.today();
    let mut out = RunOutcome::default();

    for offer in offers {
        let Some(criteria) = watch.get(&offer.code) else {
            out.unwatched += 1;
            continue;
        };
        if !criteria.is_active(today) {
            debug!(target: "engine", partner = %offer.code, "watcher expired; skipping");
            out.inactive += 1;
            continue;
        }

        info!(target: "engine", partner = %offer.code, name = %criteria.name, "observing");
        counter!("promo_partners_evaluated_total").increment(1);

        match evaluate(offer, criteria, today) {
            Ok(decision) => {
                if decision.matched {
                    counter!("promo_matches_total").increment(1);
                    info!(
                        target: "engine",
                        partner = %offer.code,
                        url = decision.url.as_deref().unwrap_or_default(),
                        "promotion found"
                    );
                } else if let Some(r) = decision.rejection() {
                    debug!(target: "engine", partner = %offer.code, reason = %r.message, "no match");
                }
                out.decisions.push(decision);
            }
            Err(e) => {
                warn!(target: "engine", error = %e, "skipping partner");
                counter!("promo_partners_skipped_total").increment(1);
                out.skipped.push(e);
            }
        }
    }

    out
}

/// Offers flagged as on promotion whose advertised ceiling rate reaches `desired_points`,
/// optionally restricted to partners present in `watch`.
pub fn promotional_partners<'a>(
    offers: &'a [PartnerOffer],
    desired_points: Decimal,
    watch: Option<&WatchList>,
) -> Vec<&'a PartnerOffer> {
    offers
        .iter()
        .filter(|o| o.promotion)
        .filter(|o| watch.map_or(true, |w| w.contains(&o.code)))
        .filter(|o| {
            let plain = o.legal_terms.as_deref().map(to_plain_text).unwrap_or_default();
            TermsAnalysis::analyze(&plain).highest_point() >= desired_points
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::Program;
    use chrono::NaiveDate;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn ymd(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn offer(code: &str, accrual: &str, terms: Option<&str>) -> PartnerOffer {
        PartnerOffer {
            program: Program::Livelo,
            code: code.into(),
            name: code.into(),
            accrual: accrual.into(),
            legal_terms: terms.map(str::to_string),
            target_url: None,
            promotion: true,
        }
    }

    #[test]
    fn accrual_labels() {
        assert_eq!(parse_accrual_ratio("4"), Some(d("4")));
        assert_eq!(parse_accrual_ratio("Até 4 pts"), Some(d("4")));
        assert_eq!(parse_accrual_ratio("até 1 pt"), Some(d("1")));
        assert_eq!(parse_accrual_ratio("2,5 pts"), Some(d("2.5")));
        assert_eq!(parse_accrual_ratio("de 2 a 10 pts"), Some(d("210")));
        assert_eq!(parse_accrual_ratio("sem pontos"), None);
    }

    #[test]
    fn low_ratio_rejects_immediately() {
        let w = WatchCriteria::new("CEN", "Centauro", d("5"));
        let dec = evaluate(&offer("CEN", "4", None), &w, ymd(2024, 1, 1)).unwrap();
        assert!(!dec.matched);
        assert_eq!(dec.rejection().unwrap().kind, ReasonKind::Parity);
    }

    #[test]
    fn empty_terms_match_and_get_livelo_url() {
        let w = WatchCriteria::new("CEN", "Centauro", d("4")).with_categories(["tênis"]);
        let dec = evaluate(&offer("CEN", "4", None), &w, ymd(2024, 1, 1)).unwrap();
        assert!(dec.matched);
        assert_eq!(
            dec.url.as_deref(),
            Some("https://www.livelo.com.br/ganhe-pontos-compre-pontue-centauro")
        );
        assert!(dec.legal_terms.is_none());
    }

    #[test]
    fn selected_products_reject() {
        let w = WatchCriteria::new("CEN", "Centauro", d("4"));
        let o = offer("CEN", "6", Some("Ganhe 6 pontos por real em produtos selecionados."));
        let dec = evaluate(&o, &w, ymd(2024, 1, 1)).unwrap();
        assert_eq!(dec.rejection().unwrap().kind, ReasonKind::SelectedProducts);
    }

    #[test]
    fn bad_amount_is_a_partner_skip() {
        let w = WatchCriteria::new("CEN", "Centauro", d("4"));
        let o = offer("CEN", "6", Some("Válido para compras acima de valor mínimo."));
        let err = evaluate(&o, &w, ymd(2024, 1, 1)).unwrap_err();
        assert_eq!(err.partner(), "CEN");
    }

    #[test]
    fn full_match_on_start_day() {
        let terms = "Ganhe 4 pontos por real na categoria brinquedos e 1 ponto por real nas demais categorias. Válido de 10/05/2024 a 12/05/2024.";
        let w = WatchCriteria::new("AMZ", "Amazon", d("3")).with_categories(["brinquedos"]);
        let dec = evaluate(&offer("AMZ", "Até 4 pts", Some(terms)), &w, ymd(2024, 5, 10)).unwrap();
        assert!(dec.matched, "{:?}", dec.reasons);
        assert_eq!(dec.legal_terms.as_deref(), Some(terms));

        let later = evaluate(&offer("AMZ", "Até 4 pts", Some(terms)), &w, ymd(2024, 5, 11)).unwrap();
        assert!(!later.matched);
        assert_eq!(later.rejection().unwrap().kind, ReasonKind::Timeliness);
    }

    #[test]
    fn run_skips_unwatched_and_expired() {
        let watch: WatchList = [
            WatchCriteria::new("CEN", "Centauro", d("2")),
            WatchCriteria::new("OLD", "Old", d("1")).with_valid_until(ymd(2020, 1, 1)),
            WatchCriteria::new("BAD", "Bad", d("1")),
        ]
        .into_iter()
        .collect();
        let offers = vec![
            offer("CEN", "3", None),
            offer("OLD", "3", None),
            offer("BAD", "n/a", None),
            offer("XYZ", "9", None),
        ];
        let out = evaluate_all(&offers, &watch, &FixedClock(ymd(2024, 1, 1)));
        assert_eq!(out.decisions.len(), 1);
        assert_eq!(out.matches().count(), 1);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.unwatched, 1);
        assert_eq!(out.inactive, 1);
    }

    #[test]
    fn promotional_filter() {
        let mut off = offer("BOK", "4", Some("Não acumulam pontos."));
        off.promotion = false;
        let offers = vec![
            offer("CEN", "2", Some("Ganhe 4 pontos por real. Campanha válida de 1 a 30/12/2099.")),
            off,
        ];
        let found = promotional_partners(&offers, d("4"), None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "CEN");

        let watch: WatchList = [WatchCriteria::new("EXT", "Extra", d("6"))].into_iter().collect();
        assert!(promotional_partners(&offers, d("4"), Some(&watch)).is_empty());
    }
}
