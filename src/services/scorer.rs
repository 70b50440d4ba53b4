use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{ComplexityMetrics, MetricSet};

/// Controls how many images it takes to saturate the image component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    Classic,
    #[default]
    Standard,
    MediaHeavy,
}

impl ScoringProfile {
    pub fn image_scale(&self) -> f64 {
        match self {
            ScoringProfile::Classic => 100.0,
            ScoringProfile::Standard => 250.0,
            ScoringProfile::MediaHeavy => 300.0,
        }
    }
}

impl FromStr for ScoringProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "classic" => Ok(Self::Classic),
            "standard" => Ok(Self::Standard),
            "media_heavy" => Ok(Self::MediaHeavy),
            other => Err(format!("unknown scoring profile '{}'", other)),
        }
    }
}

impl fmt::Display for ScoringProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoringProfile::Classic => "classic",
            ScoringProfile::Standard => "standard",
            ScoringProfile::MediaHeavy => "media_heavy",
        };
        f.write_str(name)
    }
}

/// One weighted term of the composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub normalized: f64,
    pub weight: f64,
}

impl ScoreComponent {
    pub fn contribution(&self) -> f64 {
        self.normalized * self.weight
    }
}

pub struct ComplexityScorer {
    profile: ScoringProfile,
}

impl ComplexityScorer {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> ScoringProfile {
        self.profile
    }

    /// Weights sum to 1.0, so the score saturates at 100 only when every
    /// component is at its cap.
    pub fn components(&self, m: &MetricSet) -> [ScoreComponent; 9] {
        [
            component("domDepth", m.dom_depth, 20.0, 0.15),
            component("totalElements", m.total_elements, 1000.0, 0.12),
            component("elementTypes", m.element_types, 50.0, 0.10),
            component("imageCount", m.image_count, self.profile.image_scale(), 0.08),
            component("layoutElements", m.layout_elements, 100.0, 0.12),
            component("clickableElements", m.clickable_elements, 50.0, 0.08),
            component("fontSizes", m.font_sizes, 20.0, 0.10),
            component("colorCount", m.color_count, 30.0, 0.10),
            component("cssRules", m.css_rules, 500.0, 0.15),
        ]
    }

    pub fn score(&self, metrics: &MetricSet) -> u8 {
        let sum: f64 = self
            .components(metrics)
            .iter()
            .map(ScoreComponent::contribution)
            .sum();
        (sum * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn finish(&self, metrics: MetricSet) -> ComplexityMetrics {
        let score = self.score(&metrics);
        ComplexityMetrics::new(metrics, score)
    }
}

impl Default for ComplexityScorer {
    fn default() -> Self {
        Self::new(ScoringProfile::default())
    }
}

fn component(name: &'static str, value: usize, scale: f64, weight: f64) -> ScoreComponent {
    ScoreComponent {
        name,
        normalized: (value as f64 / scale).min(1.0),
        weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn saturated() -> MetricSet {
        MetricSet {
            dom_depth: 40,
            total_elements: 5000,
            element_types: 90,
            image_count: 1000,
            layout_elements: 300,
            clickable_elements: 200,
            font_sizes: 50,
            color_count: 90,
            css_rules: 2000,
            ..Default::default()
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let scorer = ComplexityScorer::default();
        let total: f64 = scorer
            .components(&MetricSet::default())
            .iter()
            .map(|c| c.weight)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_metrics_score_zero() {
        assert_eq!(ComplexityScorer::default().score(&MetricSet::default()), 0);
    }

    #[test]
    fn saturated_metrics_score_hundred() {
        assert_eq!(ComplexityScorer::default().score(&saturated()), 100);
    }

    #[test]
    fn half_scale_metrics_score_fifty() {
        let metrics = MetricSet {
            dom_depth: 10,
            total_elements: 500,
            element_types: 25,
            image_count: 125,
            layout_elements: 50,
            clickable_elements: 25,
            font_sizes: 10,
            color_count: 15,
            css_rules: 250,
            ..Default::default()
        };
        assert_eq!(ComplexityScorer::new(ScoringProfile::Standard).score(&metrics), 50);
    }

    #[test]
    fn image_scale_depends_on_profile() {
        let metrics = MetricSet {
            image_count: 100,
            ..Default::default()
        };
        assert_eq!(ComplexityScorer::new(ScoringProfile::Classic).score(&metrics), 8);
        assert_eq!(ComplexityScorer::new(ScoringProfile::Standard).score(&metrics), 3);
        assert_eq!(ComplexityScorer::new(ScoringProfile::MediaHeavy).score(&metrics), 3);
    }

    #[test]
    fn unscored_fields_do_not_move_the_score() {
        let scorer = ComplexityScorer::default();
        let base = saturated();
        let mut noisy = base.clone();
        noisy.text_length = 123_456;
        noisy.form_elements = 77;
        noisy.contrast_issues = 9;
        noisy.nesting_ratio = 0.3;
        assert_eq!(scorer.score(&base), scorer.score(&noisy));
    }

    #[test]
    fn profile_parses_from_env_strings() {
        assert_eq!("media-heavy".parse::<ScoringProfile>(), Ok(ScoringProfile::MediaHeavy));
        assert_eq!("Classic".parse::<ScoringProfile>(), Ok(ScoringProfile::Classic));
        assert!("fancy".parse::<ScoringProfile>().is_err());
    }
}
