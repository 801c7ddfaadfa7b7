// src/feed/html.rs
//! HTML fragment → plain text for legal terms.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Strip markup from a terms fragment.
///
/// 1) drop tags (replaced by a space so adjacent blocks do not glue together)
/// 2) decode entities (`&nbsp;`, `&eacute;`, `&bull;`, ...)
/// 3) remove the `•` bullets partners put in front of each rule
/// 4) collapse whitespace (NBSP included) and trim
pub fn to_plain_text(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let out = re_tags.replace_all(s, " ");

    let out = html_escape::decode_html_entities(&out).replace('•', "");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}
