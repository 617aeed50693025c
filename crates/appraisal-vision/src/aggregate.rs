//! Cross-set comparison: every (reference, candidate) pair, ranked matches, and recommendations.

use rayon::prelude::*;

use crate::compare::compare;
use crate::config::{EngineConfig, RecommendationThresholds};
use crate::types::{
    BestMatch, ComparisonSetResult, FeatureVector, PairComparison, Recommendation,
    RecommendationKind, SetAverages, SetSummary,
};

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation, 0 for an empty slice.
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    let Some(m) = mean(values) else {
        return 0.0;
    };
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Aggregate figures the recommendation rules are evaluated against.
#[derive(Debug, Clone, Copy)]
struct SetStatistics {
    reference_count: usize,
    candidate_count: usize,
    reference_quality: Option<f64>,
    candidate_quality: Option<f64>,
    mean_similarity: Option<f64>,
    similarity_spread: f64,
    best_similarity: Option<f64>,
    degraded_pairs: usize,
}

struct RecommendationRule {
    kind: RecommendationKind,
    applies: fn(&SetStatistics, &RecommendationThresholds) -> bool,
    message: fn(&SetStatistics) -> String,
}

/// Evaluated in order; every rule that applies contributes one recommendation.
/// When either set is empty only `NoComparison` applies.
const RECOMMENDATION_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        kind: RecommendationKind::NoComparison,
        applies: no_comparison,
        message: no_comparison_message,
    },
    RecommendationRule {
        kind: RecommendationKind::ReferenceImageQuality,
        applies: low_reference_quality,
        message: low_reference_quality_message,
    },
    RecommendationRule {
        kind: RecommendationKind::CandidateImageQuality,
        applies: low_candidate_quality,
        message: low_candidate_quality_message,
    },
    RecommendationRule {
        kind: RecommendationKind::AuthenticityReview,
        applies: wide_similarity_spread,
        message: wide_similarity_spread_message,
    },
    RecommendationRule {
        kind: RecommendationKind::LowSimilarity,
        applies: low_similarity,
        message: low_similarity_message,
    },
    RecommendationRule {
        kind: RecommendationKind::StrongMatch,
        applies: strong_match,
        message: strong_match_message,
    },
    RecommendationRule {
        kind: RecommendationKind::DegradedImages,
        applies: has_degraded_pairs,
        message: degraded_pairs_message,
    },
];

fn no_comparison(s: &SetStatistics, _: &RecommendationThresholds) -> bool {
    s.reference_count == 0 || s.candidate_count == 0
}

fn no_comparison_message(s: &SetStatistics) -> String {
    format!(
        "No comparison was possible: the reference set has {} usable image(s) and the candidate set has {}.",
        s.reference_count, s.candidate_count
    )
}

fn low_reference_quality(s: &SetStatistics, t: &RecommendationThresholds) -> bool {
    !no_comparison(s, t) && s.reference_quality.is_some_and(|q| q < t.low_quality)
}

fn low_reference_quality_message(s: &SetStatistics) -> String {
    format!(
        "Reference photographs average {:.1}/100 quality; recapture them with better lighting and resolution.",
        s.reference_quality.unwrap_or_default()
    )
}

fn low_candidate_quality(s: &SetStatistics, t: &RecommendationThresholds) -> bool {
    !no_comparison(s, t) && s.candidate_quality.is_some_and(|q| q < t.low_quality)
}

fn low_candidate_quality_message(s: &SetStatistics) -> String {
    format!(
        "Candidate photographs average {:.1}/100 quality; request higher quality images.",
        s.candidate_quality.unwrap_or_default()
    )
}

fn wide_similarity_spread(s: &SetStatistics, t: &RecommendationThresholds) -> bool {
    s.mean_similarity.is_some() && s.similarity_spread > t.similarity_spread
}

fn wide_similarity_spread_message(s: &SetStatistics) -> String {
    format!(
        "Similarity varies widely across pairs (std dev {:.1}); review the images for authenticity and consistent sourcing.",
        s.similarity_spread
    )
}

fn low_similarity(s: &SetStatistics, t: &RecommendationThresholds) -> bool {
    s.mean_similarity.is_some_and(|m| m < t.low_similarity)
}

fn low_similarity_message(s: &SetStatistics) -> String {
    format!(
        "Average similarity is only {:.1}/100; the sets may depict different properties or conditions.",
        s.mean_similarity.unwrap_or_default()
    )
}

fn strong_match(s: &SetStatistics, t: &RecommendationThresholds) -> bool {
    s.best_similarity.is_some_and(|b| b >= t.strong_match)
}

fn strong_match_message(s: &SetStatistics) -> String {
    format!(
        "The closest pair reaches {:.1}/100 similarity and is a reliable basis for comparison.",
        s.best_similarity.unwrap_or_default()
    )
}

fn has_degraded_pairs(s: &SetStatistics, _: &RecommendationThresholds) -> bool {
    s.degraded_pairs > 0
}

fn degraded_pairs_message(s: &SetStatistics) -> String {
    format!(
        "{} pair(s) involve images too small to assess sharpness; supply larger photographs.",
        s.degraded_pairs
    )
}

fn recommendations(stats: &SetStatistics, thresholds: &RecommendationThresholds) -> Vec<Recommendation> {
    RECOMMENDATION_RULES
        .iter()
        .filter(|rule| (rule.applies)(stats, thresholds))
        .map(|rule| Recommendation {
            kind: rule.kind,
            message: (rule.message)(stats),
        })
        .collect()
}

fn average_quality(set: &[FeatureVector]) -> Option<f64> {
    let scores: Vec<f64> = set.iter().map(|f| f.quality_score.overall).collect();
    mean(&scores)
}

/// Rank pairs by similarity, preferring the closer quality on ties.
fn best_matches(
    reference: &[FeatureVector],
    candidate: &[FeatureVector],
    comparisons: &[PairComparison],
    limit: usize,
) -> Vec<BestMatch> {
    let columns = candidate.len();
    let mut matches: Vec<BestMatch> = comparisons
        .iter()
        .enumerate()
        .map(|(k, cmp)| {
            let (r, c) = (k / columns, k % columns);
            BestMatch {
                reference_index: r,
                candidate_index: c,
                reference_name: reference[r].name.clone(),
                candidate_name: candidate[c].name.clone(),
                similarity: cmp.similarity.overall,
                quality_difference: cmp.quality_comparison.difference,
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.quality_difference.total_cmp(&b.quality_difference))
            .then_with(|| a.reference_index.cmp(&b.reference_index))
            .then_with(|| a.candidate_index.cmp(&b.candidate_index))
    });
    matches.truncate(limit);
    matches
}

/// Compare two sets using the default configuration.
pub fn compare_sets(reference: &[FeatureVector], candidate: &[FeatureVector]) -> ComparisonSetResult {
    compare_sets_with(reference, candidate, &EngineConfig::default())
}

/// Compare every reference image against every candidate image.
///
/// An empty set on either side yields no comparisons and a single
/// `NoComparison` recommendation.
pub fn compare_sets_with(
    reference: &[FeatureVector],
    candidate: &[FeatureVector],
    config: &EngineConfig,
) -> ComparisonSetResult {
    let columns = candidate.len();
    let comparisons: Vec<PairComparison> = if reference.is_empty() || candidate.is_empty() {
        Vec::new()
    } else {
        (0..reference.len() * columns)
            .into_par_iter()
            .map(|k| compare(&reference[k / columns], &candidate[k % columns]))
            .collect()
    };

    let similarities: Vec<f64> = comparisons.iter().map(|c| c.similarity.overall).collect();
    let best_matches = best_matches(reference, candidate, &comparisons, config.best_match_limit);

    let stats = SetStatistics {
        reference_count: reference.len(),
        candidate_count: candidate.len(),
        reference_quality: average_quality(reference),
        candidate_quality: average_quality(candidate),
        mean_similarity: mean(&similarities),
        similarity_spread: population_std_dev(&similarities),
        best_similarity: similarities.iter().copied().reduce(f64::max),
        degraded_pairs: comparisons.iter().filter(|c| c.degraded).count(),
    };

    let recommendations = recommendations(&stats, &config.recommendations);

    tracing::info!(
        "Compared {} reference x {} candidate image(s): {} pair(s), mean similarity {:.1}",
        reference.len(),
        candidate.len(),
        comparisons.len(),
        stats.mean_similarity.unwrap_or_default()
    );

    ComparisonSetResult {
        reference_count: reference.len(),
        candidate_count: candidate.len(),
        comparisons,
        summary: SetSummary {
            average_quality_per_set: SetAverages {
                reference: stats.reference_quality,
                candidate: stats.candidate_quality,
            },
            best_matches,
            recommendations,
        },
    }
}
