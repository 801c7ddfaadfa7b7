//! "compras acima de R$ X" minimum-purchase constraint.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::TermsError;

pub const MIN_PURCHASE_MARKER: &str = "compras acima de ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseCheck {
    /// The terms impose no minimum purchase.
    NoMinimum,
    Within(Decimal),
    Exceeds(Decimal),
}

impl PurchaseCheck {
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, PurchaseCheck::Exceeds(_))
    }
}

/// Amount following the first "compras acima de ", if the phrase is present.
pub fn minimum_purchase(text: &str) -> Result<Option<Decimal>, TermsError> {
    let Some((_, after)) = text.split_once(MIN_PURCHASE_MARKER) else {
        return Ok(None);
    };
    parse_amount(after).map(Some)
}

/// Compare the terms' minimum purchase with the watcher's ceiling (`None` = unbounded).
pub fn check_purchase_ceiling(
    text: &str,
    ceiling: Option<Decimal>,
) -> Result<PurchaseCheck, TermsError> {
    let Some(amount) = minimum_purchase(text)? else {
        return Ok(PurchaseCheck::NoMinimum);
    };
    Ok(match ceiling {
        Some(max) if amount > max => PurchaseCheck::Exceeds(amount),
        _ => PurchaseCheck::Within(amount),
    })
}

/// Brazilian currency token: optional "R$", "." thousands, "," decimals.
fn parse_amount(after: &str) -> Result<Decimal, TermsError> {
    let rest = after.trim_start();
    let rest = rest.strip_prefix("R$").unwrap_or(rest).trim_start();
    let token = rest.split_whitespace().next().unwrap_or_default();
    let digits = token.trim_end_matches(|c: char| !c.is_ascii_digit());

    let cleaned = digits.replace('.', "").replace(',', ".");
    Decimal::from_str(&cleaned).map_err(|_| TermsError::Amount {
        raw: token.to_string(),
    })
}
