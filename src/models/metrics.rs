use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The sixteen raw page metrics, before scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSet {
    // Structure
    pub dom_depth: usize,
    pub total_elements: usize,
    pub element_types: usize,
    pub nesting_ratio: f64,

    // Visual content
    pub image_count: usize,
    pub text_length: usize,
    pub image_to_text_ratio: f64,

    // Layout
    pub css_rules: usize,
    pub layout_elements: usize,
    pub positioned_elements: usize,

    // Interaction
    pub clickable_elements: usize,
    pub form_elements: usize,
    pub input_elements: usize,

    // Typography
    pub font_families: usize,
    pub font_sizes: usize,

    // Color
    pub color_count: usize,
    pub contrast_issues: usize,
}

impl MetricSet {
    /// `domDepth / totalElements`, zero for an empty document.
    pub fn nesting_ratio_of(dom_depth: usize, total_elements: usize) -> f64 {
        if total_elements == 0 {
            0.0
        } else {
            dom_depth as f64 / total_elements as f64
        }
    }

    /// Images per thousand characters of text, zero when there is no text.
    pub fn image_to_text_ratio_of(image_count: usize, text_length: usize) -> f64 {
        if text_length == 0 {
            0.0
        } else {
            image_count as f64 / (text_length as f64 / 1000.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    #[serde(flatten)]
    pub metrics: MetricSet,
    pub complexity_score: u8,
}

impl ComplexityMetrics {
    pub fn new(metrics: MetricSet, complexity_score: u8) -> Self {
        Self {
            metrics,
            complexity_score: complexity_score.min(100),
        }
    }
}

/// Where a set of metrics came from. Synthetic metrics always carry the failure
/// that forced them so callers can label them as simulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricsOrigin {
    Extracted,
    Synthetic { code: String, reason: String },
}

impl MetricsOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, MetricsOrigin::Synthetic { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub metrics: ComplexityMetrics,
    pub origin: MetricsOrigin,
    pub cached: bool,
    pub attempts: u32,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn extracted(url: Option<String>, metrics: ComplexityMetrics, attempts: u32) -> Self {
        Self {
            url,
            metrics,
            origin: MetricsOrigin::Extracted,
            cached: false,
            attempts,
            analyzed_at: Utc::now(),
        }
    }

    pub fn synthetic(
        url: String,
        metrics: ComplexityMetrics,
        code: String,
        reason: String,
        attempts: u32,
    ) -> Self {
        Self {
            url: Some(url),
            metrics,
            origin: MetricsOrigin::Synthetic { code, reason },
            cached: false,
            attempts,
            analyzed_at: Utc::now(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin.is_synthetic()
    }

    pub fn score(&self) -> u8 {
        self.metrics.complexity_score
    }
}
