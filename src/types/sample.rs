use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::variation::{format_change, Variation};

/// Source name carried by the synthesized sample when every source failed.
pub const FALLBACK_SOURCE: &str = "Fallback";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSample {
    pub rate: f64,
    pub source: String,
    pub variation: Variation,
    pub captured_at: DateTime<Utc>,
}

impl RateSample {
    pub fn new(rate: f64, source: impl Into<String>, variation: Variation) -> Self {
        RateSample {
            rate,
            source: source.into(),
            variation,
            captured_at: Utc::now(),
        }
    }

    pub fn fallback(rate: f64) -> Self {
        RateSample::new(rate, FALLBACK_SOURCE, Variation::stable())
    }

    pub fn is_fallback(&self) -> bool {
        self.source == FALLBACK_SOURCE
    }
}

impl fmt::Display for RateSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "USD/BRL R$ {:.2} {} {} ({}) via {}",
            self.rate,
            self.variation.direction.symbol(),
            self.variation.percent,
            format_change(self.variation.absolute_change),
            self.source
        )
    }
}
