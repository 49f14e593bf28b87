use crate::rate_sources::{SourceDescriptor, SourceSelectors};

/// Built-in providers used when configuration lists none.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::browser(
            "Google Finance",
            "https://www.google.com/finance/quote/USD-BRL",
            SourceSelectors {
                rate: "div.YMlKec.fxKbKc".to_string(),
                variation: Some("div.JwB6zf".to_string()),
                hint_attribute: Some("aria-label".to_string()),
            },
            1,
        ),
        SourceDescriptor::api(
            "AwesomeAPI",
            "https://economia.awesomeapi.com.br/json/last/USD-BRL",
            2,
        ),
        SourceDescriptor::api(
            "ExchangeRate-API",
            "https://api.exchangerate-api.com/v4/latest/USD",
            3,
        ),
    ]
}
