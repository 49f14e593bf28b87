use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use crate::error::{Error, Result};
use crate::rate_sources::fetchers::RateFetcher;
use crate::rate_sources::parser::{parse_absolute_change, parse_percent, parse_rate_text};
use crate::rate_sources::{RawQuote, SourceDescriptor, SourceSelectors};
use crate::variation::{Direction, RawVariation};

/// Scrapes a rendered quote page using the descriptor's CSS selectors.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        PageFetcher { client }
    }
}

#[async_trait]
impl RateFetcher for PageFetcher {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<RawQuote> {
        let selectors = source.selectors.as_ref().ok_or_else(|| {
            Error::ConfigError(format!("source {} has no selectors", source.name))
        })?;

        let response = self
            .client
            .get(&source.url)
            .timeout(source.timeout())
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable {
                source_name: source.name.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                source_name: source.name.clone(),
                reason: format!("HTTP {}", status),
            });
        }

        let html = response.text().await.map_err(|e| Error::SourceUnavailable {
            source_name: source.name.clone(),
            reason: e.to_string(),
        })?;

        extract_from_page(&html, selectors)
    }
}

/// Reads the rate, and optionally the variation, out of page markup.
pub fn extract_from_page(html: &str, selectors: &SourceSelectors) -> Result<RawQuote> {
    let document = Html::parse_document(html);

    let rate_selector = parse_selector(&selectors.rate)?;
    let rate_text = document
        .select(&rate_selector)
        .next()
        .map(element_text)
        .ok_or_else(|| Error::SelectorNotFound(selectors.rate.clone()))?;
    let rate = parse_rate_text(&rate_text)?;

    let mut quote = RawQuote::new(rate);
    if let Some(variation_selector) = &selectors.variation {
        let selector = parse_selector(variation_selector)?;
        // A missing variation element leaves the quote without variation.
        if let Some(element) = document.select(&selector).next() {
            let hint = selectors
                .hint_attribute
                .as_deref()
                .and_then(|attr| element.value().attr(attr))
                .map(str::to_string);
            quote = quote.with_variation(read_variation(&element_text(element), hint));
        }
    }

    Ok(quote)
}

fn read_variation(text: &str, hint: Option<String>) -> RawVariation {
    let mut percent = parse_percent(text);
    let mut absolute_change = parse_absolute_change(text);

    // Pages often print unsigned magnitudes and carry the sign in the hint.
    if hint.as_deref().and_then(Direction::from_hint) == Some(Direction::Down) {
        percent = percent.map(|p| -p.abs());
        absolute_change = absolute_change.map(|c| -c.abs());
    }

    RawVariation {
        percent,
        absolute_change,
        hint,
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::ConfigError(format!("invalid selector {:?}: {:?}", selector, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
