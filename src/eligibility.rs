//! Notification timeliness.
//!
//! Independent from the campaign window extractor: dates in partner terms are written
//! too inconsistently to share one parser, so this pass scans raw text on its own and
//! compares `DD/MM/YYYY` strings with today's.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::clock::format_br;

fn full_date_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d{2}/\d{2}/\d{2,4}").unwrap())
}

fn bare_day_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r" \d{2} ").unwrap())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timeliness {
    /// No terms at all: nothing to violate.
    NoTerms,
    /// Today is the first or second date found.
    BoundaryToday { date: String },
    /// Today's day-of-month matches the bare day marker, or the single full date.
    DayToday { marker: String },
    NotToday,
    /// No full date pair and no bare day marker.
    NoDates,
}

impl Timeliness {
    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            Timeliness::NoTerms | Timeliness::BoundaryToday { .. } | Timeliness::DayToday { .. }
        )
    }
}

/// Decide whether a promotion is worth notifying about on `today`.
pub fn timeliness(text: &str, today: NaiveDate) -> Timeliness {
    if text.trim().is_empty() {
        return Timeliness::NoTerms;
    }

    let today_br = format_br(today);
    let dates: Vec<&str> = full_date_re().find_iter(text).map(|m| m.as_str()).collect();

    if let [start, end, ..] = dates.as_slice() {
        return if *start == today_br || *end == today_br {
            Timeliness::BoundaryToday { date: today_br }
        } else {
            Timeliness::NotToday
        };
    }

    let Some(marker) = bare_day_re().find(text) else {
        warn!(target: "eligibility", "campaign is lacking dates");
        return Timeliness::NoDates;
    };
    let day = marker.as_str().trim();
    let today_day = today.format("%d").to_string();

    if day == today_day || dates.first().is_some_and(|d| *d == today_br) {
        Timeliness::DayToday {
            marker: day.to_string(),
        }
    } else {
        Timeliness::NotToday
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_terms_are_always_eligible() {
        assert!(timeliness("", ymd(2024, 1, 1)).is_eligible());
        assert_eq!(timeliness("   ", ymd(2024, 1, 1)), Timeliness::NoTerms);
    }

    #[test]
    fn start_or_end_today() {
        let text = "Promoção válida de 10/05/2024 até 12/05/2024.";
        assert!(timeliness(text, ymd(2024, 5, 10)).is_eligible());
        assert!(timeliness(text, ymd(2024, 5, 12)).is_eligible());
        assert_eq!(timeliness(text, ymd(2024, 5, 11)), Timeliness::NotToday);
    }

    #[test]
    fn only_first_two_dates_count() {
        let text = "De 01/05/2024 a 02/05/2024, crédito até 30/06/2024.";
        assert_eq!(timeliness(text, ymd(2024, 6, 30)), Timeliness::NotToday);
    }

    #[test]
    fn bare_day_marker() {
        let text = "Válido de 15 a 17/05/2024 para compras no app.";
        assert!(timeliness(text, ymd(2024, 5, 15)).is_eligible());
        assert!(timeliness(text, ymd(2024, 5, 17)).is_eligible());
        assert_eq!(timeliness(text, ymd(2024, 5, 16)), Timeliness::NotToday);
    }

    #[test]
    fn no_dates_suppresses() {
        let text = "Ganhe 4 pontos por real em todo o site.";
        assert_eq!(timeliness(text, ymd(2024, 5, 16)), Timeliness::NoDates);
        assert!(!timeliness(text, ymd(2024, 5, 16)).is_eligible());
    }
}
