//! Campaign window extraction ("de 1 a 30/04/2024").

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::sentences;
use crate::error::TermsError;

fn range_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"de (\d{1,2}) a (\d{1,2}/\d{2}/\d{2,4})").unwrap())
}

fn full_date_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d{2}/\d{2}/\d{2,4}").unwrap())
}

/// Inclusive date range during which a promotional rate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CampaignWindow {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.start <= today && today <= self.end
    }
}

/// Window of a whole text.
///
/// Range phrases are looked up sentence by sentence and the last valid one wins.
/// Without any range phrase, exactly two standalone dates are taken as (start, end).
pub fn campaign_window(text: &str) -> Option<CampaignWindow> {
    let mut window = None;
    let mut saw_range = false;
    for sentence in sentences(text) {
        match window_in_sentence(sentence.text) {
            Some(Ok(w)) => {
                saw_range = true;
                window = Some(w);
            }
            Some(Err(e)) => {
                saw_range = true;
                warn!(target: "terms", error = %e, sentence = sentence.text, "invalid campaign date");
            }
            None => {}
        }
    }
    if saw_range {
        return window;
    }

    let dates: Vec<&str> = full_date_re().find_iter(text).map(|m| m.as_str()).collect();
    match dates.as_slice() {
        [start, end] => match (parse_br_date(start), parse_br_date(end)) {
            (Ok(start), Ok(end)) => Some(CampaignWindow { start, end }),
            (Err(e), _) | (_, Err(e)) => {
                warn!(target: "terms", error = %e, "invalid campaign date");
                None
            }
        },
        _ => None,
    }
}

/// `None` when the sentence has no range phrase; `Some(Err)` when its dates are invalid.
pub fn window_in_sentence(sentence: &str) -> Option<Result<CampaignWindow, TermsError>> {
    let caps = range_re().captures(sentence)?;
    let end_raw = &caps[2];
    Some(parse_br_date(end_raw).and_then(|end| {
        let (_, month_year) = end_raw.split_once('/').unwrap_or_default();
        let start_raw = format!("{:0>2}/{month_year}", &caps[1]);
        let start = parse_br_date(&start_raw)?;
        Ok(CampaignWindow { start, end })
    }))
}

/// `DD/MM/YYYY` or `DD/MM/YY` (20YY).
pub fn parse_br_date(raw: &str) -> Result<NaiveDate, TermsError> {
    let invalid = || TermsError::Date {
        raw: raw.to_string(),
    };
    let mut parts = raw.split('/');
    let (Some(d), Some(m), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let day: u32 = d.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    let year: i32 = match y.len() {
        2 => 2000 + y.parse::<i32>().map_err(|_| invalid())?,
        4 => y.parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}
