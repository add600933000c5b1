//! Typed value extraction from parsed pages
//!
//! Every extractor is total: a query that matches nothing, or text that does
//! not parse, yields `None` rather than an error. Scrapers store the result
//! as-is so a missing field reads as "not available yet".

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::OddsRange;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("leading number pattern"));

/// First element under `scope` matching the CSS selector `query`
pub fn select_first<'a>(scope: ElementRef<'a>, query: &str) -> Option<ElementRef<'a>> {
    let selector = match Selector::parse(query) {
        Ok(selector) => selector,
        Err(_) => {
            tracing::warn!("Unparseable selector: {}", query);
            return None;
        }
    };
    let found = scope.select(&selector).next();
    found
}

/// All elements under `scope` matching `query`, in document order
pub fn select_all<'a>(scope: ElementRef<'a>, query: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(query) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => {
            tracing::warn!("Unparseable selector: {}", query);
            Vec::new()
        }
    }
}

/// Normalized text content of the first match
pub fn extract_text(scope: ElementRef, query: &str) -> Option<String> {
    select_first(scope, query).map(|element| normalize_text(&element_text(element)))
}

/// Normalized `class` attribute of the first match
pub fn extract_class_token(scope: ElementRef, query: &str) -> Option<String> {
    select_first(scope, query)
        .and_then(|element| element.value().attr("class"))
        .map(normalize_text)
}

/// Text of the first match coerced to a decimal
pub fn extract_number(scope: ElementRef, query: &str) -> Option<f64> {
    select_first(scope, query).and_then(|element| coerce_number(&element_text(element)))
}

/// "lower-upper" odds of the first match.
///
/// Anything other than exactly two `-`-separated parts gives an empty range.
pub fn extract_range(scope: ElementRef, query: &str) -> OddsRange {
    select_first(scope, query)
        .map(|element| parse_range(&element_text(element)))
        .unwrap_or_default()
}

/// Text content of an element, all descendant text nodes concatenated
pub fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Full-width ASCII to half-width, whitespace runs collapsed, ends trimmed
pub fn normalize_text(text: &str) -> String {
    let halfwidth: String = text.chars().map(to_halfwidth).collect();
    halfwidth.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn to_halfwidth(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{3000}' => ' ',
        _ => c,
    }
}

/// Leading decimal literal of `text`, ignoring thousands separators, yen
/// signs and trailing units ("3m", "12.0℃")
pub fn coerce_number(text: &str) -> Option<f64> {
    let cleaned: String = normalize_text(text)
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | '￥'))
        .collect();

    LEADING_NUMBER
        .find(cleaned.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Split "lower-upper" into a range
pub fn parse_range(text: &str) -> OddsRange {
    let normalized = normalize_text(text);
    let parts: Vec<&str> = normalized.split('-').collect();
    if parts.len() != 2 {
        return OddsRange::default();
    }

    OddsRange {
        low: coerce_number(parts[0]),
        high: coerce_number(parts[1]),
    }
}
