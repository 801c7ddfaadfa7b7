//! HTML report of the promotions found in one run.

use chrono::NaiveDate;
use html_escape::encode_text;

use crate::clock::format_br;
use crate::decision::PromotionDecision;
use crate::model::Program;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub program: Program,
    pub subject: String,
    pub html: String,
    /// Number of promotions listed.
    pub rows: usize,
}

impl Report {
    /// Build the report from matched decisions. Unmatched ones are ignored.
    pub fn compose(program: Program, today: NaiveDate, decisions: &[&PromotionDecision]) -> Self {
        let mut html = format!(
            "<table align='center'><tr><th><h1>{} - {}</h1></th></tr>",
            program.label(),
            format_br(today)
        );
        let mut rows = 0;
        for d in decisions.iter().filter(|d| d.matched) {
            html.push_str(&row(d));
            rows += 1;
        }
        html.push_str("</table>");

        Self {
            program,
            subject: format!("Analysis Report - {}", program.label()),
            html,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

fn row(d: &PromotionDecision) -> String {
    let categories = if d.criteria.categories.is_empty() {
        "No category".to_string()
    } else {
        encode_text(&d.criteria.categories.join(", ")).into_owned()
    };
    format!(
        "<tr><td><strong>{name}</strong><br/><p>Search Terms: {categories}</p>\
         <p>Minimum amount of points: {min}</p><p>{terms}</p>\
         <p>URL Access: {url}</p></td></tr>",
        name = encode_text(&d.criteria.name),
        min = d.criteria.min_points,
        terms = terms_html(d.legal_terms.as_deref().unwrap_or_default()),
        url = encode_text(d.url.as_deref().unwrap_or_default()),
    )
}

/// HTML terms are embedded as sent; plain terms get one line per sentence.
fn terms_html(terms: &str) -> String {
    if terms.contains('<') && terms.contains('>') {
        return terms.to_string();
    }
    encode_text(terms).split(". ").collect::<Vec<_>>().join(".<br/>")
}
