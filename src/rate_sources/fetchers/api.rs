use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::Value;
use crate::error::{Error, Result};
use crate::rate_sources::fetchers::RateFetcher;
use crate::rate_sources::parser::parse_rate_text;
use crate::rate_sources::{RawQuote, SourceDescriptor};
use crate::variation::RawVariation;

/// Quote currency looked up in `rates` tables.
const QUOTE_CURRENCY: &str = "BRL";

/// Top-level fields probed when the response has no known shape.
const RATE_FIELDS: &[&str] = &["rate", "bid", "price"];

/// Fetches JSON from an HTTP API and extracts the rate.
pub struct ApiFetcher {
    client: Client,
}

impl ApiFetcher {
    pub fn new(client: Client) -> Self {
        ApiFetcher { client }
    }
}

#[async_trait]
impl RateFetcher for ApiFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<RawQuote> {
        let response = self
            .client
            .get(&source.url)
            .header(ACCEPT, "application/json")
            .timeout(source.timeout())
            .send()
            .await
            .map_err(|e| unavailable(source, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(source, format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::DeserializationError(e.to_string()))?;

        extract_quote(&body, source.field.as_deref())
    }
}

fn unavailable(source: &SourceDescriptor, reason: String) -> Error {
    Error::SourceUnavailable {
        source_name: source.name.clone(),
        reason,
    }
}

/// Pulls a rate (and a variation, when the payload has one) out of an API
/// response. Known shapes are tried in order:
///
/// 1. the descriptor's JSON pointer
/// 2. pair-keyed ticker objects: `{"USDBRL": {"bid": "5.25", "pctChange": "0.29", "varBid": "0.015"}}`
/// 3. rate tables: `{"rates": {"BRL": 5.25}}`
/// 4. a top-level `rate`, `bid` or `price`
pub fn extract_quote(body: &Value, field: Option<&str>) -> Result<RawQuote> {
    if let Some(pointer) = field {
        let value = body
            .pointer(pointer)
            .ok_or_else(|| Error::ParseError(format!("no value at {}", pointer)))?;
        return value_to_rate(value).map(RawQuote::new);
    }

    if let Some(ticker) = find_ticker(body) {
        let rate = value_to_rate(&ticker["bid"])?;
        let variation = RawVariation {
            percent: ticker.get("pctChange").and_then(|v| value_to_rate(v).ok()),
            absolute_change: ticker.get("varBid").and_then(|v| value_to_rate(v).ok()),
            hint: None,
        };
        return Ok(RawQuote::new(rate).with_variation(variation));
    }

    if let Some(value) = body.get("rates").and_then(|rates| rates.get(QUOTE_CURRENCY)) {
        return value_to_rate(value).map(RawQuote::new);
    }

    for name in RATE_FIELDS {
        if let Some(value) = body.get(*name) {
            return value_to_rate(value).map(RawQuote::new);
        }
    }

    Err(Error::ParseError("no rate field in response".to_string()))
}

fn find_ticker(body: &Value) -> Option<&Value> {
    body.as_object()?
        .values()
        .find(|v| v.is_object() && v.get("bid").is_some())
}

fn value_to_rate(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::ParseError(n.to_string())),
        Value::String(s) => parse_rate_text(s),
        other => Err(Error::ParseError(other.to_string())),
    }
}
