//! Category matching over normalized terms.
//!
//! Only sentences containing "por real" are inspected. Inside a sentence each
//! comma sub-clause is scanned for point offers (carrying the last rate forward),
//! then checked against the watcher's category keywords and the catch-all
//! "demais categorias" clause. First hit wins, scanning left to right.

use rust_decimal::Decimal;
use tracing::debug;

use super::points::{ClauseOffers, PointScanner};
use super::{normalize, sentences, sub_clauses};

/// Marker of a points-bearing sentence once shorthands are normalized.
pub const POINTS_MARKER: &str = "por real";
/// The "all other categories" rate clause.
pub const OTHER_CATEGORIES: &str = "demais categorias";

/// How a clause satisfied the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitVia {
    Keyword(String),
    OtherCategories,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryHit {
    pub clause: String,
    pub points: Decimal,
    pub via: HitVia,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryVerdict {
    /// Watcher has no categories; the text was not inspected.
    NotRequired,
    Hit(CategoryHit),
    Miss,
}

impl CategoryVerdict {
    pub fn is_satisfied(&self) -> bool {
        !matches!(self, CategoryVerdict::Miss)
    }
}

/// Category/points verdict for a whole plain-text terms string.
pub fn match_categories(text: &str, categories: &[String], min_points: Decimal) -> CategoryVerdict {
    if categories.is_empty() {
        return CategoryVerdict::NotRequired;
    }

    let normalized = normalize(text);
    for sentence in sentences(&normalized) {
        if !sentence.text.contains(POINTS_MARKER) {
            continue;
        }
        let clauses: Vec<&str> = sub_clauses(sentence.text).map(|c| c.text).collect();
        if let Some(hit) = match_sentence(&clauses, categories, min_points) {
            return CategoryVerdict::Hit(hit);
        }
    }
    CategoryVerdict::Miss
}

/// Decide one sentence from its sub-clauses.
pub fn match_sentence(
    clauses: &[&str],
    categories: &[String],
    min_points: Decimal,
) -> Option<CategoryHit> {
    let mut scanner = PointScanner::new();
    for clause in clauses {
        let offers = scanner.scan(clause);
        let hit = if offers.nonzero_count() > 1 {
            match_compound(clause, &offers, categories, min_points)
        } else {
            match_single(clause, offers.primary(), categories, min_points)
        };
        if hit.is_some() {
            return hit;
        }
    }
    None
}

fn match_single(
    clause: &str,
    points: Decimal,
    categories: &[String],
    min_points: Decimal,
) -> Option<CategoryHit> {
    if points < min_points {
        return None;
    }
    if let Some(keyword) = keyword_in(clause, categories) {
        return Some(hit(clause, points, HitVia::Keyword(keyword.to_string())));
    }
    if clause.contains(OTHER_CATEGORIES) {
        return Some(hit(clause, points, HitVia::OtherCategories));
    }
    None
}

/// "4 pontos em brinquedos e 1 ponto nas demais categorias": the left part is
/// judged with the first offer, the right part with the second.
fn match_compound(
    clause: &str,
    offers: &ClauseOffers,
    categories: &[String],
    min_points: Decimal,
) -> Option<CategoryHit> {
    let parts = split_compound(clause, offers.last_literal.as_deref());
    let has_other = clause.contains(OTHER_CATEGORIES);

    for (index, part) in parts.iter().enumerate() {
        let Some(points) = offers.values.get(index).copied() else {
            break;
        };
        if points >= min_points {
            if let Some(keyword) = keyword_in(part, categories) {
                return Some(hit(part, points, HitVia::Keyword(keyword.to_string())));
            }
        }
        if has_other && offers.last() >= min_points {
            return Some(hit(clause, offers.last(), HitVia::OtherCategories));
        }
    }
    None
}

/// Split at " e N ponto(s)" or, failing that, " e ganhe N ponto(s)". When neither
/// connective is present the whole clause is a single part judged with the first offer.
// NOTE: the single-part fallback can under-match clauses with several rates and an
// unusual connective; kept as-is until real terms show a better split.
fn split_compound<'a>(clause: &'a str, literal: Option<&str>) -> Vec<&'a str> {
    let Some(literal) = literal else {
        return vec![clause];
    };
    let unit = if Decimal::from_str_exact(literal).is_ok_and(|v| v == Decimal::ONE) {
        "ponto"
    } else {
        "pontos"
    };

    let connectives = [
        format!(" e {literal} {unit}"),
        format!(" e ganhe {literal} {unit}"),
    ];
    match connectives.iter().find_map(|c| clause.find(c.as_str())) {
        Some(pos) => vec![&clause[..pos], &clause[pos..]],
        None => {
            debug!(target: "terms", clause, "no point connective found; judging clause as one part");
            vec![clause]
        }
    }
}

fn keyword_in<'c>(text: &str, categories: &'c [String]) -> Option<&'c str> {
    categories
        .iter()
        .map(String::as_str)
        .find(|c| text.contains(c))
}

fn hit(clause: &str, points: Decimal, via: HitVia) -> CategoryHit {
    CategoryHit {
        clause: clause.trim().to_string(),
        points,
        via,
    }
}
