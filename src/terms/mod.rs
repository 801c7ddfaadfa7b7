//! Legal-terms text primitives.
//!
//! Partner terms are Portuguese marketing copy with irregular punctuation. Everything
//! here is a fixed heuristic tuned to the phrasings the programs actually publish:
//! - `normalize` rewrites shorthand point notations so later patterns match uniformly.
//! - `sentences` / `sub_clauses` segment text lazily (restartable, borrowed slices).
//! - `TermsAnalysis` summarises the phrase-anchored point rates and the campaign window.
//!
//! Submodules hold the individual extractors and matchers.

pub mod categories;
pub mod points;
pub mod purchase;
pub mod window;

use rust_decimal::Decimal;

pub use categories::{match_categories, CategoryHit, CategoryVerdict, HitVia};
pub use points::{anchored_points, ClauseOffers, PointScanner};
pub use purchase::{check_purchase_ceiling, minimum_purchase, PurchaseCheck};
pub use window::CampaignWindow;

/// Terms restricting the advertised rate to a product subset.
pub const SELECTED_PRODUCTS: &str = "produtos selecionados";

const SENTENCE_BREAKS: &[char] = &['.', ';'];
const CLAUSE_BREAKS: &[char] = &[','];

/// Rewrites applied before category/points analysis, in order.
const SHORTHANDS: &[(&str, &str)] = &[
    (". ", "."),
    ("1:1", "1 ponto por real"),
    (":1", " pontos por real"),
    (" a cada R$ 1,00", " por real"),
];

/// Normalize raw terms for segmentation and point matching.
pub fn normalize(raw: &str) -> String {
    SHORTHANDS
        .iter()
        .fold(raw.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// One segment of terms text and its position among the non-empty segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause<'a> {
    pub text: &'a str,
    pub ordinal: usize,
}

/// Lazy splitter over a borrowed text. Cloning restarts nothing; call again to rescan.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: Option<&'a str>,
    breaks: &'static [char],
    ordinal: usize,
}

impl<'a> Segments<'a> {
    fn new(text: &'a str, breaks: &'static [char]) -> Self {
        Self {
            rest: Some(text),
            breaks,
            ordinal: 0,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Clause<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = self.rest?;
            let (head, tail) = match rest.find(self.breaks) {
                Some(pos) => {
                    let brk = rest[pos..].chars().next().map_or(1, char::len_utf8);
                    (&rest[..pos], Some(&rest[pos + brk..]))
                }
                None => (rest, None),
            };
            self.rest = tail;

            let text = head.trim();
            if text.is_empty() {
                continue;
            }
            let clause = Clause {
                text,
                ordinal: self.ordinal,
            };
            self.ordinal += 1;
            return Some(clause);
        }
    }
}

/// Top-level sentences: split on `.` and `;`, trimmed, empty fragments dropped.
pub fn sentences(text: &str) -> Segments<'_> {
    Segments::new(text, SENTENCE_BREAKS)
}

/// Comma-delimited sub-clauses of one sentence.
pub fn sub_clauses(sentence: &str) -> Segments<'_> {
    Segments::new(sentence, CLAUSE_BREAKS)
}

/// Phrase-anchored point rates of one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePoints {
    pub sentence: String,
    pub points: Vec<Decimal>,
}

/// Summary of a terms text: anchored rates per sentence plus the campaign window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermsAnalysis {
    pub sentences: Vec<SentencePoints>,
    pub window: Option<CampaignWindow>,
}

impl TermsAnalysis {
    /// Scan raw (un-normalized) plain text. Calendar digits never count as points.
    pub fn analyze(text: &str) -> Self {
        let sentences = sentences(text)
            .map(|c| SentencePoints {
                sentence: c.text.to_string(),
                points: anchored_points(c.text),
            })
            .collect();

        Self {
            sentences,
            window: window::campaign_window(text),
        }
    }

    /// Partner's ceiling rate: max across every sentence, zero when none is advertised.
    pub fn highest_point(&self) -> Decimal {
        self.sentences
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rewrites_shorthands() {
        assert_eq!(
            normalize("Ganhe 1:1 nas compras. Depois 3:1 em livros"),
            "Ganhe 1 ponto por real nas compras.Depois 3 pontos por real em livros"
        );
        assert_eq!(
            normalize("4 pontos a cada R$ 1,00 gasto"),
            "4 pontos por real gasto"
        );
    }

    #[test]
    fn sentences_drop_empty_fragments() {
        let text = "Primeira frase. ; Segunda;. Terceira.";
        let got: Vec<_> = sentences(text).map(|c| (c.ordinal, c.text)).collect();
        assert_eq!(
            got,
            vec![(0, "Primeira frase"), (1, "Segunda"), (2, "Terceira")]
        );
    }

    #[test]
    fn segments_are_restartable() {
        let text = "a, b, c";
        let first: Vec<_> = sub_clauses(text).collect();
        let second: Vec<_> = sub_clauses(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(sentences("").count(), 0);
        assert_eq!(sentences("  . ;  ").count(), 0);
    }

    #[test]
    fn analysis_picks_max_and_window() {
        let a = TermsAnalysis::analyze(
            "Ganhe 4 pontos por real em compras. Campanha válida de 1 a 30/12/2099.",
        );
        assert_eq!(a.highest_point(), Decimal::from(4));
        let w = a.window.unwrap();
        assert_eq!(w.start.to_string(), "2099-12-01");
        assert_eq!(w.end.to_string(), "2099-12-30");
    }

    #[test]
    fn highest_point_is_max_not_last() {
        let a = TermsAnalysis::analyze("Ganhe 5 pontos por real; Ganhe 3 pontos por R$ 1.");
        assert_eq!(a.highest_point(), Decimal::from(5));
    }

    #[test]
    fn no_points_means_zero() {
        assert_eq!(
            TermsAnalysis::analyze("Não acumulam pontos.").highest_point(),
            Decimal::ZERO
        );
        assert_eq!(TermsAnalysis::analyze("").highest_point(), Decimal::ZERO);
    }
}
