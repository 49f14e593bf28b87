//! Rate text parsing and sanity validation.
//!
//! Scraped and API-provided rates arrive as free text in either Brazilian
//! (`R$ 5,2534`, `1.234,56`) or plain (`5.2534`) formatting. Parsing applies
//! an ordered list of strategies and keeps the first finite result.

use lazy_static::lazy_static;
use regex::Regex;
use crate::error::{Error, Result};

/// Exclusive lower bound for a plausible USD/BRL rate.
pub const MIN_RATE: f64 = 1.0;
/// Exclusive upper bound for a plausible USD/BRL rate.
pub const MAX_RATE: f64 = 10.0;

lazy_static! {
    static ref DECIMAL_COMMA: Regex =
        Regex::new(r"[-+]?\d{1,3}(?:\.\d{3})+,\d+|[-+]?\d+,\d+").expect("valid decimal-comma pattern");
    static ref PERCENT: Regex =
        Regex::new(r"([-+]?\d+(?:[.,]\d+)?)\s*%").expect("valid percent pattern");
    static ref SIGNED_NUMBER: Regex =
        Regex::new(r"[-+]?\d+(?:[.,]\d+)?").expect("valid number pattern");
}

type Strategy = fn(&str) -> Option<f64>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("decimal_comma", parse_decimal_comma),
    ("digit_cleanup", parse_digit_cleanup),
];

/// Parses rate text, trying each strategy in order.
pub fn parse_rate_text(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::ParseError(text.to_string()));
    }

    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(trimmed).filter(|v| v.is_finite()) {
            tracing::trace!(strategy = name, value, "Parsed rate text");
            return Ok(value);
        }
    }

    Err(Error::ParseError(text.to_string()))
}

/// `1.234,56` -> 1234.56, `R$ 5,25` -> 5.25
fn parse_decimal_comma(text: &str) -> Option<f64> {
    let matched = DECIMAL_COMMA.find(text)?.as_str();
    matched.replace('.', "").replace(',', ".").parse().ok()
}

/// Drops everything but digits, `.` and `-` and parses the rest.
fn parse_digit_cleanup(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Extracts a signed percent from text such as `+0,29%` or `(-0.15%)`.
pub fn parse_percent(text: &str) -> Option<f64> {
    let captured = PERCENT.captures(text)?.get(1)?.as_str();
    normalize_signed(captured)
}

/// Extracts the first signed number that is not a percent, e.g. the
/// `+0,0150` in `+0,0150 (+0,29%)`.
pub fn parse_absolute_change(text: &str) -> Option<f64> {
    let without_percent = PERCENT.replace_all(text, "");
    let matched = SIGNED_NUMBER.find(&without_percent)?.as_str();
    normalize_signed(matched)
}

fn normalize_signed(number: &str) -> Option<f64> {
    number
        .replace(',', ".")
        .trim_start_matches('+')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > MIN_RATE && rate < MAX_RATE
}

pub fn validate_rate(rate: f64) -> Result<f64> {
    if is_valid_rate(rate) {
        Ok(rate)
    } else {
        Err(Error::ValidationError { rate })
    }
}
