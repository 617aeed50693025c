//! Valuation scoring: four axis scores, value tier, contributing factors, and confidence.

use crate::aggregate::{mean, population_std_dev};
use crate::config::EngineConfig;
use crate::types::{
    ComparisonSetResult, ContributingFactor, FactorDirection, ValuationReport, ValuationScores,
    ValueCategory,
};

/// One row of the score-to-tier mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueTier {
    pub min_score: f64,
    pub category: ValueCategory,
    pub multiplier: f64,
    pub reasoning: &'static str,
}

/// Tiers in descending order of `min_score`; the first match wins.
pub const VALUE_TIERS: &[ValueTier] = &[
    ValueTier {
        min_score: 85.0,
        category: ValueCategory::Premium,
        multiplier: 1.15,
        reasoning: "Exceptional photographic evidence: high quality, consistent, and closely matched imagery supports a premium valuation.",
    },
    ValueTier {
        min_score: 70.0,
        category: ValueCategory::HighTier,
        multiplier: 1.08,
        reasoning: "Strong imagery with good quality and consistency supports an above-market valuation.",
    },
    ValueTier {
        min_score: 55.0,
        category: ValueCategory::Standard,
        multiplier: 1.00,
        reasoning: "Adequate imagery supports a market-rate valuation without adjustment.",
    },
    ValueTier {
        min_score: 40.0,
        category: ValueCategory::Basic,
        multiplier: 0.95,
        reasoning: "Imagery shows gaps in quality or consistency; a modest downward adjustment applies.",
    },
    ValueTier {
        min_score: f64::NEG_INFINITY,
        category: ValueCategory::NeedsAttention,
        multiplier: 0.88,
        reasoning: "Imagery is weak or inconsistent; the property needs further inspection before valuation.",
    },
];

const NO_COMPARISON_REASONING: &str =
    "No comparison available: at least one image set had no usable photographs.";

/// Map an overall score to its value tier.
pub fn categorize(overall: f64) -> &'static ValueTier {
    VALUE_TIERS
        .iter()
        .find(|tier| overall >= tier.min_score)
        .unwrap_or(&VALUE_TIERS[VALUE_TIERS.len() - 1])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Quality,
    Consistency,
    VisualAppeal,
    Authenticity,
}

impl Axis {
    fn value(self, scores: &ValuationScores) -> f64 {
        match self {
            Axis::Quality => scores.quality,
            Axis::Consistency => scores.consistency,
            Axis::VisualAppeal => scores.visual_appeal,
            Axis::Authenticity => scores.authenticity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    AtLeast(f64),
    Below(f64),
}

impl Bound {
    fn holds(self, value: f64) -> bool {
        match self {
            Bound::AtLeast(t) => value >= t,
            Bound::Below(t) => value < t,
        }
    }
}

struct FactorRule {
    axis: Axis,
    bound: Bound,
    factor: &'static str,
    impact: &'static str,
    direction: FactorDirection,
    description: &'static str,
}

const FACTOR_RULES: &[FactorRule] = &[
    FactorRule {
        axis: Axis::Quality,
        bound: Bound::AtLeast(80.0),
        factor: "High image quality",
        impact: "+5%",
        direction: FactorDirection::Positive,
        description: "Photographs are well exposed, sharp, and high resolution.",
    },
    FactorRule {
        axis: Axis::Quality,
        bound: Bound::Below(50.0),
        factor: "Low image quality",
        impact: "-5%",
        direction: FactorDirection::Negative,
        description: "Poor exposure, focus, or resolution limits what the photographs show.",
    },
    FactorRule {
        axis: Axis::Consistency,
        bound: Bound::AtLeast(80.0),
        factor: "Consistent presentation",
        impact: "+3%",
        direction: FactorDirection::Positive,
        description: "Reference and candidate photographs are visually consistent.",
    },
    FactorRule {
        axis: Axis::Consistency,
        bound: Bound::Below(50.0),
        factor: "Inconsistent presentation",
        impact: "-3%",
        direction: FactorDirection::Negative,
        description: "Reference and candidate photographs differ markedly.",
    },
    FactorRule {
        axis: Axis::VisualAppeal,
        bound: Bound::AtLeast(85.0),
        factor: "Strong visual appeal",
        impact: "+4%",
        direction: FactorDirection::Positive,
        description: "The closest photograph pairings match very well.",
    },
    FactorRule {
        axis: Axis::Authenticity,
        bound: Bound::AtLeast(85.0),
        factor: "Reliable sourcing",
        impact: "+2%",
        direction: FactorDirection::Positive,
        description: "Similarity is uniform across pairs, suggesting a single consistent source.",
    },
    FactorRule {
        axis: Axis::Authenticity,
        bound: Bound::Below(60.0),
        factor: "Questionable sourcing",
        impact: "-4%",
        direction: FactorDirection::Negative,
        description: "Similarity varies widely across pairs; some images may come from elsewhere.",
    },
];

fn contributing_factors(scores: &ValuationScores) -> Vec<ContributingFactor> {
    FACTOR_RULES
        .iter()
        .filter(|rule| rule.bound.holds(rule.axis.value(scores)))
        .map(|rule| ContributingFactor {
            factor: rule.factor.to_string(),
            impact: rule.impact.to_string(),
            direction: rule.direction,
            description: rule.description.to_string(),
        })
        .collect()
}

fn percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Score a comparison set using the default configuration.
pub fn score(set: &ComparisonSetResult) -> ValuationReport {
    score_with(set, &EngineConfig::default())
}

/// Turn aggregated comparison statistics into a valuation report.
///
/// `visual_appeal` averages only the ranked best matches, so it tracks the
/// strongest pairings while `consistency` averages every pair.
pub fn score_with(set: &ComparisonSetResult, config: &EngineConfig) -> ValuationReport {
    if set.is_empty() {
        let tier = categorize(0.0);
        return ValuationReport {
            scores: ValuationScores {
                quality: 0.0,
                consistency: 0.0,
                visual_appeal: 0.0,
                authenticity: 0.0,
                overall: 0.0,
            },
            value_category: tier.category,
            multiplier: tier.multiplier,
            reasoning: NO_COMPARISON_REASONING.to_string(),
            contributing_factors: Vec::new(),
            confidence: 0.0,
        };
    }

    let qualities: Vec<f64> = set
        .comparisons
        .iter()
        .map(|c| c.quality_comparison.mean_quality)
        .collect();
    let similarities: Vec<f64> = set.comparisons.iter().map(|c| c.similarity.overall).collect();
    let best: Vec<f64> = set.summary.best_matches.iter().map(|m| m.similarity).collect();

    let quality = percent(mean(&qualities).unwrap_or_default());
    let consistency = percent(mean(&similarities).unwrap_or_default());
    let visual_appeal = percent(mean(&best).unwrap_or(consistency));
    let authenticity = percent(100.0 - population_std_dev(&similarities));
    let axis_mean = (quality + consistency + visual_appeal + authenticity) / 4.0;

    let scores = ValuationScores {
        quality,
        consistency,
        visual_appeal,
        authenticity,
        overall: percent(axis_mean),
    };

    let degraded = set.comparisons.iter().filter(|c| c.degraded).count();
    let degraded_fraction = degraded as f64 / set.comparisons.len() as f64;
    let confidence =
        percent(axis_mean * (1.0 - config.valuation.degraded_confidence_penalty * degraded_fraction));

    let tier = categorize(scores.overall);
    let reasoning = format!(
        "{} Overall score {:.1}/100 across {} comparison(s).",
        tier.reasoning,
        scores.overall,
        set.comparisons.len()
    );

    tracing::info!(
        "Valuation: {} (x{:.2}), overall {:.1}, confidence {:.1}",
        tier.category,
        tier.multiplier,
        scores.overall,
        confidence
    );

    ValuationReport {
        contributing_factors: contributing_factors(&scores),
        scores,
        value_category: tier.category,
        multiplier: tier.multiplier,
        reasoning,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::compare_sets;
    use crate::types::{ColorStats, Dimensions, FeatureVector, QualityScore};

    fn vector(name: &str, gray: f64, quality: f64, degraded: bool) -> FeatureVector {
        FeatureVector {
            name: name.to_string(),
            media_type: "image/png".to_string(),
            byte_length: 0,
            dimensions: Dimensions::new(16, 9),
            color_stats: ColorStats {
                mean_r: gray,
                mean_g: gray,
                mean_b: gray,
                colorfulness: 0.0,
            },
            brightness: gray,
            contrast: 40.0,
            sharpness: 8.0,
            dominant_colors: Vec::new(),
            quality_score: QualityScore {
                overall: quality,
                resolution: quality,
                brightness: quality,
                contrast: quality,
                sharpness: quality,
            },
            degraded,
        }
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(categorize(85.0).category, ValueCategory::Premium);
        assert_eq!(categorize(85.0).multiplier, 1.15);
        assert_eq!(categorize(84.999).category, ValueCategory::HighTier);
        assert_eq!(categorize(70.0).category, ValueCategory::HighTier);
        assert_eq!(categorize(55.0).category, ValueCategory::Standard);
        assert_eq!(categorize(40.0).category, ValueCategory::Basic);
        assert_eq!(categorize(39.9).category, ValueCategory::NeedsAttention);
        assert_eq!(categorize(0.0).multiplier, 0.88);
    }

    #[test]
    fn test_tiers_descend() {
        assert!(VALUE_TIERS.windows(2).all(|w| w[0].min_score > w[1].min_score));
    }

    #[test]
    fn test_empty_set_reports_no_comparison() {
        let set = compare_sets(&[], &[vector("c", 100.0, 90.0, false)]);
        let report = score(&set);
        assert_eq!(report.scores.overall, 0.0);
        assert_eq!(report.confidence, 0.0);
        assert_eq!(report.value_category, ValueCategory::NeedsAttention);
        assert!(report.contributing_factors.is_empty());
        assert!(report.reasoning.starts_with("No comparison available"));
    }

    #[test]
    fn test_identical_high_quality_sets_are_premium() {
        let reference = vec![vector("r", 120.0, 90.0, false)];
        let candidate = vec![vector("c", 120.0, 90.0, false)];
        let report = score(&compare_sets(&reference, &candidate));

        assert_eq!(report.scores.quality, 90.0);
        assert_eq!(report.scores.consistency, 100.0);
        assert_eq!(report.scores.visual_appeal, 100.0);
        assert_eq!(report.scores.authenticity, 100.0);
        assert_eq!(report.scores.overall, 97.5);
        assert_eq!(report.value_category, ValueCategory::Premium);
        assert_eq!(report.confidence, 97.5);

        let factors: Vec<&str> = report
            .contributing_factors
            .iter()
            .map(|f| f.factor.as_str())
            .collect();
        assert_eq!(
            factors,
            vec![
                "High image quality",
                "Consistent presentation",
                "Strong visual appeal",
                "Reliable sourcing"
            ]
        );
    }

    #[test]
    fn test_authenticity_reflects_similarity_spread() {
        let reference = vec![vector("r", 0.0, 60.0, false)];
        let candidate = vec![vector("same", 0.0, 60.0, false), vector("opposite", 255.0, 60.0, false)];
        let report = score(&compare_sets(&reference, &candidate));
        // Similarities are 100 and 50: mean 75, std dev 25.
        assert_eq!(report.scores.consistency, 75.0);
        assert_eq!(report.scores.authenticity, 75.0);
    }

    #[test]
    fn test_visual_appeal_tracks_best_matches() {
        let mut config = EngineConfig::default();
        config.best_match_limit = 1;
        let reference = vec![vector("r", 0.0, 60.0, false)];
        let candidate = vec![vector("same", 0.0, 60.0, false), vector("opposite", 255.0, 60.0, false)];
        let set = crate::aggregate::compare_sets_with(&reference, &candidate, &config);
        let report = score_with(&set, &config);
        assert_eq!(report.scores.visual_appeal, 100.0);
        assert_eq!(report.scores.consistency, 75.0);
    }

    #[test]
    fn test_degraded_pairs_lower_confidence_only() {
        let reference = vec![vector("r", 120.0, 90.0, true)];
        let candidate = vec![vector("c", 120.0, 90.0, false)];
        let report = score(&compare_sets(&reference, &candidate));
        assert_eq!(report.scores.overall, 97.5);
        assert!(report.confidence < report.scores.overall);
        assert!((report.confidence - 97.5 * 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_low_scores_produce_negative_factors() {
        let reference = vec![vector("r", 0.0, 10.0, false)];
        let candidate = vec![vector("c", 255.0, 10.0, false)];
        let report = score(&compare_sets(&reference, &candidate));
        assert!(report
            .contributing_factors
            .iter()
            .any(|f| f.factor == "Low image quality" && f.direction == FactorDirection::Negative));
        assert!(report.multiplier < 1.0);
    }
}
