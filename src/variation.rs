use serde::{Deserialize, Serialize};
use std::fmt;

/// Changes smaller than this are treated as no movement.
pub const CHANGE_EPSILON: f64 = 1e-9;

const INCREASE_TERMS: &[&str] = &["up", "increase", "rise", "alta", "subiu", "aumento"];
const DECREASE_TERMS: &[&str] = &["down", "decrease", "fall", "queda", "caiu", "baixa"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    pub fn from_change(change: f64) -> Self {
        if !change.is_finite() || change.abs() < CHANGE_EPSILON {
            Direction::Stable
        } else if change > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Reads increase/decrease terms out of descriptive text such as an
    /// `aria-label` ("Up by 0.29%", "Queda de 0,15%").
    pub fn from_hint(hint: &str) -> Option<Self> {
        let lowered = hint.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if words.iter().any(|w| INCREASE_TERMS.contains(w)) {
            Some(Direction::Up)
        } else if words.iter().any(|w| DECREASE_TERMS.contains(w)) {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// Magnitude wins over the hint; the hint is only consulted when neither
    /// the absolute change nor the percent is known.
    pub fn infer(absolute_change: Option<f64>, percent: Option<f64>, hint: Option<&str>) -> Self {
        if let Some(change) = absolute_change.filter(|c| c.is_finite()) {
            return Direction::from_change(change);
        }
        if let Some(pct) = percent.filter(|p| p.is_finite()) {
            return Direction::from_change(pct);
        }
        hint.and_then(Direction::from_hint).unwrap_or(Direction::Stable)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Stable => "●",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Stable => write!(f, "stable"),
        }
    }
}

/// Variation reported by a source before it is normalized.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawVariation {
    pub percent: Option<f64>,
    pub absolute_change: Option<f64>,
    pub hint: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub percent: String,
    pub absolute_change: f64,
    pub direction: Direction,
}

impl Variation {
    pub fn stable() -> Self {
        Variation {
            percent: format_percent(0.0),
            absolute_change: 0.0,
            direction: Direction::Stable,
        }
    }

    /// Variation between two consecutive samples.
    pub fn between(previous: f64, current: f64) -> Self {
        if !previous.is_finite() || !current.is_finite() || previous == 0.0 {
            return Variation::stable();
        }

        let change = current - previous;
        let direction = Direction::from_change(change);
        if direction == Direction::Stable {
            return Variation::stable();
        }

        Variation {
            percent: format_percent(change / previous * 100.0),
            absolute_change: change,
            direction,
        }
    }

    /// Normalizes a source-provided variation for a sample at `rate`.
    ///
    /// Missing magnitudes are derived from the one that is present: an
    /// absolute change implies a percent against `rate - change`, and a
    /// percent implies the change from the previous rate `rate / (1 + p)`.
    pub fn from_raw(raw: &RawVariation, rate: f64) -> Self {
        let percent = raw.percent.filter(|p| p.is_finite());
        let change = raw.absolute_change.filter(|c| c.is_finite());
        let direction = Direction::infer(change, percent, raw.hint.as_deref());

        let (percent, change) = match (percent, change) {
            (Some(p), Some(c)) => (p, c),
            (None, Some(c)) => {
                let previous = rate - c;
                let p = if previous.abs() < CHANGE_EPSILON { 0.0 } else { c / previous * 100.0 };
                (p, c)
            }
            (Some(p), None) => {
                let previous = rate / (1.0 + p / 100.0);
                let c = rate - previous;
                // -100% has no previous rate; keep the percent, drop the change.
                (p, if c.is_finite() { c } else { 0.0 })
            }
            (None, None) => (0.0, 0.0),
        };

        if direction == Direction::Stable && change.abs() < CHANGE_EPSILON {
            return Variation::stable();
        }

        Variation {
            percent: format_percent(percent),
            absolute_change: change,
            direction,
        }
    }
}

impl Default for Variation {
    fn default() -> Self {
        Self::stable()
    }
}

/// `+0.29%`, `-0.15%`, `0.00%`.
pub fn format_percent(percent: f64) -> String {
    let rounded = (percent * 100.0).round() / 100.0;
    if !rounded.is_finite() || rounded == 0.0 {
        "0.00%".to_string()
    } else {
        format!("{:+.2}%", rounded)
    }
}

/// Signed change with four decimal places, `+0.0150`.
pub fn format_change(change: f64) -> String {
    if change.abs() < 0.00005 {
        "0.0000".to_string()
    } else {
        format!("{:+.4}", change)
    }
}
