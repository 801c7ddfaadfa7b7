//! Point-rate extraction.
//!
//! Two scans coexist:
//! - the generic digit scan feeds category matching and carries the last rate forward
//!   into clauses that omit one;
//! - the phrase-anchored scan only trusts digits written as "N pontos por real" (and
//!   variants), which keeps calendar digits out of the partner's ceiling rate.

use once_cell::sync::OnceCell;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

fn digit_run_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn anchored_res() -> &'static [Regex] {
    static RES: OnceCell<Vec<Regex>> = OnceCell::new();
    RES.get_or_init(|| {
        [
            r"(\d+)\s+pontos\s+por\s+real",
            r"(\d+)\s+pontos\s+por\s+R\$\s*1",
            r"(\d+)\s+pontos\s+a\s+cada\s+real",
            r"(\d+)\s+pontos\s+a\s+cada\s+R\$\s*1",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Point values found in (or inherited by) one clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseOffers {
    /// Left-to-right values. A clause without digits holds exactly the inherited value.
    pub values: Vec<Decimal>,
    /// Last digit run as written in the clause, used to rebuild the " e N pontos" connective.
    pub last_literal: Option<String>,
    pub inherited: bool,
}

impl ClauseOffers {
    pub fn nonzero_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_zero()).count()
    }

    /// The single rate of a one-offer clause: first nonzero value, else the first value.
    pub fn primary(&self) -> Decimal {
        self.values
            .iter()
            .copied()
            .find(|v| !v.is_zero())
            .or_else(|| self.values.first().copied())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn last(&self) -> Decimal {
        self.values.last().copied().unwrap_or(Decimal::ZERO)
    }
}

/// Generic digit scan with carry-forward across the clauses of one sentence.
#[derive(Debug, Clone, Default)]
pub struct PointScanner {
    carry: Decimal,
}

impl PointScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent nonzero value seen so far (zero before any).
    pub fn carry(&self) -> Decimal {
        self.carry
    }

    pub fn scan(&mut self, clause: &str) -> ClauseOffers {
        let runs = digit_runs(clause);
        if runs.is_empty() {
            return ClauseOffers {
                values: vec![self.carry],
                last_literal: None,
                inherited: true,
            };
        }

        for (_, value) in &runs {
            if !value.is_zero() {
                self.carry = *value;
            }
        }

        ClauseOffers {
            last_literal: runs.last().map(|(lit, _)| lit.to_string()),
            values: runs.into_iter().map(|(_, v)| v).collect(),
            inherited: false,
        }
    }
}

/// Every maximal digit run, in order, with its decimal value.
/// Runs too long for a `Decimal` are ignored.
pub fn digit_runs(clause: &str) -> Vec<(&str, Decimal)> {
    digit_run_re()
        .find_iter(clause)
        .filter_map(|m| {
            Decimal::from_str(m.as_str())
                .ok()
                .map(|v| (m.as_str(), v))
        })
        .collect()
}

/// Rates written as "N pontos por real", "N pontos por R$ 1", "N pontos a cada real" or
/// "N pontos a cada R$ 1". First hit of each phrase, in phrase order.
pub fn anchored_points(sentence: &str) -> Vec<Decimal> {
    anchored_res()
        .iter()
        .filter_map(|re| re.captures(sentence))
        .filter_map(|caps| Decimal::from_str(&caps[1]).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn carry_forward_uses_last_nonzero() {
        let mut s = PointScanner::new();
        let first = s.scan("sem pontos aqui");
        assert_eq!(first.values, vec![d(0)]);
        assert!(first.inherited);

        let second = s.scan("Ganhe 6 pontos por real");
        assert_eq!(second.values, vec![d(6)]);
        assert_eq!(second.last_literal.as_deref(), Some("6"));

        let third = s.scan(" nas categorias de casa");
        assert_eq!(third.values, vec![d(6)]);
        assert!(third.inherited);
    }

    #[test]
    fn zero_runs_do_not_reset_carry() {
        let mut s = PointScanner::new();
        s.scan("3 pontos");
        s.scan("00");
        assert_eq!(s.carry(), d(3));
        assert_eq!(s.scan("e mais").values, vec![d(3)]);
    }

    #[test]
    fn compound_clause_keeps_order() {
        let mut s = PointScanner::new();
        let o = s.scan("4 pontos na categoria brinquedos e 1 ponto nas demais categorias");
        assert_eq!(o.values, vec![d(4), d(1)]);
        assert_eq!(o.nonzero_count(), 2);
        assert_eq!(o.last(), d(1));
        assert_eq!(o.last_literal.as_deref(), Some("1"));
    }

    #[test]
    fn anchored_ignores_calendar_digits() {
        let pts = anchored_points("Ganhe 8 pontos por real até 31/12/2099");
        assert_eq!(pts, vec![d(8)]);
        assert!(anchored_points("Válido de 1 a 30/12/2099").is_empty());
    }

    #[test]
    fn anchored_variants() {
        assert_eq!(anchored_points("10 pontos a cada real"), vec![d(10)]);
        assert_eq!(anchored_points("3 pontos por R$1 gasto"), vec![d(3)]);
        assert_eq!(anchored_points("2  pontos a cada R$ 1"), vec![d(2)]);
        // literal words are case-sensitive
        assert!(anchored_points("5 Pontos por real").is_empty());
    }
}
