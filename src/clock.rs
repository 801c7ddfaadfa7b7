//! Date source for the engine. "Today" is injected so runs are reproducible.

use chrono::NaiveDate;

/// Format used when comparing "today" against dates found in legal terms.
pub const BR_DATE_FORMAT: &str = "%d/%m/%Y";

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always answers the same date. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// `DD/MM/YYYY`, the shape partner terms use.
pub fn format_br(date: NaiveDate) -> String {
    date.format(BR_DATE_FORMAT).to_string()
}
