pub mod sample;

pub use sample::{RateSample, FALLBACK_SOURCE};
