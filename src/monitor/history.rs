//! In-memory sample history for variation summaries.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use crate::types::RateSample;
use crate::variation::{format_change, format_percent, Direction};

/// Maximum number of samples kept in memory.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Ring buffer of the most recent samples. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct RateHistory {
    samples: VecDeque<RateSample>,
    capacity: usize,
}

/// Aggregate view over the buffered samples.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationSummary {
    pub count: usize,
    pub first_rate: f64,
    pub last_rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub average_rate: f64,
    pub absolute_change: f64,
    pub percent_change: String,
    pub direction: Direction,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl Default for RateHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RateHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: RateSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&RateSample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&RateSample> {
        self.samples.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateSample> {
        self.samples.iter()
    }

    /// Summary across the buffer, `None` while empty.
    pub fn summary(&self) -> Option<VariationSummary> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;

        let (min_rate, max_rate, sum) = self.samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), s| (min.min(s.rate), max.max(s.rate), sum + s.rate),
        );

        let absolute_change = last.rate - first.rate;
        let percent = if first.rate == 0.0 { 0.0 } else { absolute_change / first.rate * 100.0 };

        Some(VariationSummary {
            count: self.samples.len(),
            first_rate: first.rate,
            last_rate: last.rate,
            min_rate,
            max_rate,
            average_rate: sum / self.samples.len() as f64,
            absolute_change,
            percent_change: format_percent(percent),
            direction: Direction::from_change(absolute_change),
            since: first.captured_at,
            until: last.captured_at,
        })
    }

    /// Newest-first display lines, at most `limit` of them.
    pub fn formatted(&self, limit: usize) -> Vec<String> {
        self.samples
            .iter()
            .rev()
            .take(limit)
            .map(format_line)
            .collect()
    }
}

fn format_line(sample: &RateSample) -> String {
    format!(
        "{} | R$ {:.2} | {} {} ({}) | {}",
        sample.captured_at.with_timezone(&Local).format("%d/%m/%Y %H:%M:%S"),
        sample.rate,
        sample.variation.direction.symbol(),
        sample.variation.percent,
        format_change(sample.variation.absolute_change),
        sample.source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variation::Variation;
    use proptest::prelude::*;

    fn sample(rate: f64) -> RateSample {
        RateSample::new(rate, "Test", Variation::stable())
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut history = RateHistory::default();
        for i in 0..DEFAULT_HISTORY_CAPACITY {
            history.push(sample(5.0 + i as f64 / 10_000.0));
        }
        assert_eq!(history.len(), 1000);
        assert_eq!(history.oldest().unwrap().rate, 5.0);

        history.push(sample(6.0));
        assert_eq!(history.len(), 1000);
        assert_eq!(history.oldest().unwrap().rate, 5.0 + 1.0 / 10_000.0);
        assert_eq!(history.latest().unwrap().rate, 6.0);
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        let mut history = RateHistory::new(0);
        assert_eq!(history.capacity(), 1);

        history.push(sample(5.10));
        history.push(sample(5.20));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().rate, 5.20);
    }

    #[test]
    fn test_summary() {
        let mut history = RateHistory::new(10);
        assert!(history.summary().is_none());

        for rate in [5.20, 5.30, 5.10, 5.25] {
            history.push(sample(rate));
        }
        let summary = history.summary().unwrap();

        assert_eq!(summary.count, 4);
        assert_eq!(summary.min_rate, 5.10);
        assert_eq!(summary.max_rate, 5.30);
        assert!((summary.average_rate - 5.2125).abs() < 1e-9);
        assert!((summary.absolute_change - 0.05).abs() < 1e-9);
        assert_eq!(summary.percent_change, "+0.96%");
        assert_eq!(summary.direction, Direction::Up);
    }

    #[test]
    fn test_formatted_is_newest_first_and_limited() {
        let mut history = RateHistory::new(10);
        history.push(sample(5.10));
        history.push(sample(5.20));
        history.push(sample(5.30));

        let lines = history.formatted(2);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("R$ 5.30"));
        assert!(lines[1].contains("R$ 5.20"));
        assert!(lines[0].ends_with("| Test"));

        assert_eq!(history.formatted(50).len(), 3);
        assert!(history.formatted(0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(capacity in 1usize..64, pushes in 0usize..200) {
            let mut history = RateHistory::new(capacity);
            for i in 0..pushes {
                history.push(sample(5.0 + i as f64));
                prop_assert!(history.len() <= capacity);
            }
            prop_assert_eq!(history.len(), pushes.min(capacity));
        }
    }
}
