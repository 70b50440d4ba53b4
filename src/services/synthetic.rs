//! Deterministic stand-in metrics for pages that could not be retrieved.
//!
//! The URL is hashed into a seed, the seed picks a base complexity factor, and a
//! keyword table nudges the factor for well-known kinds of sites. Every metric
//! is then a linear function of that one factor, so the output is internally
//! consistent and identical for identical URLs.

use tracing::debug;

use crate::error::FetchFailure;
use crate::models::{AnalysisResult, ComplexityMetrics, MetricSet};

const FACTOR_MIN: f64 = 0.1;
const FACTOR_MAX: f64 = 0.9;

/// Keyword groups and the offset applied to the base factor when any keyword of
/// a group occurs in the lowercased URL.
#[derive(Debug, Clone)]
pub struct KeywordOffsets {
    entries: Vec<(Vec<String>, f64)>,
}

impl KeywordOffsets {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with(mut self, keywords: &[&str], offset: f64) -> Self {
        self.entries.push((
            keywords.iter().map(|k| k.to_lowercase()).collect(),
            offset,
        ));
        self
    }

    pub fn adjustment(&self, url_lower: &str) -> f64 {
        self.entries
            .iter()
            .filter(|(keywords, _)| keywords.iter().any(|k| url_lower.contains(k.as_str())))
            .map(|(_, offset)| offset)
            .sum()
    }
}

impl Default for KeywordOffsets {
    fn default() -> Self {
        Self::empty()
            .with(&[".edu"], 0.1)
            .with(&["landing"], -0.2)
            .with(&["shop", "store"], 0.25)
            .with(&["github"], 0.1)
            .with(&["google"], -0.1)
            .with(&["facebook"], 0.2)
    }
}

pub struct SyntheticMetricsGenerator {
    offsets: KeywordOffsets,
}

impl SyntheticMetricsGenerator {
    pub fn new(offsets: KeywordOffsets) -> Self {
        Self { offsets }
    }

    /// Rolling `h * 31 + c` over UTF-16 code units, wrapped to 32 bits.
    pub fn url_hash(url: &str) -> i32 {
        url.encode_utf16().fold(0i32, |hash, unit| {
            hash.wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit))
        })
    }

    pub fn seed(url: &str) -> f64 {
        (Self::url_hash(url) as i64).abs() as f64
    }

    /// Fractional part of `sin(seed) * 10000`, in `[0, 1)`.
    pub fn seeded_random(seed: f64) -> f64 {
        let x = seed.sin() * 10000.0;
        x - x.floor()
    }

    /// The complexity factor every synthetic metric is derived from, in `[0.1, 0.9]`.
    pub fn complexity_factor(&self, url: &str) -> f64 {
        let base = Self::seeded_random(Self::seed(url)) * 0.6 + 0.2;
        let adjusted = base + self.offsets.adjustment(&url.to_lowercase());
        adjusted.clamp(FACTOR_MIN, FACTOR_MAX)
    }

    pub fn generate(&self, url: &str) -> ComplexityMetrics {
        let f = self.complexity_factor(url);
        debug!(url, factor = f, "Generating synthetic metrics");

        let scaled = |scale: f64, offset: f64| (f * scale + offset).floor() as usize;

        let metrics = MetricSet {
            dom_depth: scaled(25.0, 5.0),
            total_elements: scaled(800.0, 100.0),
            element_types: scaled(40.0, 10.0),
            nesting_ratio: round_to(f * 0.05 + 0.01, 3),
            image_count: scaled(200.0, 20.0),
            text_length: scaled(10000.0, 1000.0),
            image_to_text_ratio: round_to(f * 5.0 + 1.0, 2),
            css_rules: scaled(400.0, 50.0),
            layout_elements: scaled(80.0, 10.0),
            positioned_elements: scaled(20.0, 2.0),
            clickable_elements: scaled(40.0, 5.0),
            form_elements: scaled(5.0, 1.0),
            input_elements: scaled(15.0, 2.0),
            font_families: scaled(8.0, 2.0),
            font_sizes: scaled(15.0, 5.0),
            color_count: scaled(25.0, 8.0),
            contrast_issues: scaled(10.0, 0.0),
        };

        ComplexityMetrics::new(metrics, scaled(100.0, 0.0) as u8)
    }

    /// Wraps generated metrics in a result that names the failure behind them.
    pub fn substitute(&self, url: &str, failure: &FetchFailure, attempts: u32) -> AnalysisResult {
        AnalysisResult::synthetic(
            url.to_string(),
            self.generate(url),
            failure.code.as_wire(),
            failure.message.clone(),
            attempts,
        )
    }
}

impl Default for SyntheticMetricsGenerator {
    fn default() -> Self {
        Self::new(KeywordOffsets::default())
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
