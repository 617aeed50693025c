//! Pairwise comparison of two feature vectors.

use crate::types::{
    ColorComparison, DimensionComparison, FeatureVector, MetricDetail, PairComparison,
    QualityComparison, QualityMetric, QualityScore, Similarity, Winner,
};

/// Channel range used to normalize color and brightness deltas.
const CHANNEL_RANGE: f64 = 255.0;

/// Contrast delta at which contrast similarity reaches zero.
const CONTRAST_RANGE: f64 = 100.0;

/// Aspect-ratio delta at which aspect similarity reaches zero.
const ASPECT_RANGE: f64 = 2.0;

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// `1 - mean(|dR|, |dG|, |dB|) / 255` over the channel means, in [0, 1].
pub fn color_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let (ca, cb) = (&a.color_stats, &b.color_stats);
    let delta = ((ca.mean_r - cb.mean_r).abs()
        + (ca.mean_g - cb.mean_g).abs()
        + (ca.mean_b - cb.mean_b).abs())
        / 3.0;
    unit(1.0 - delta / CHANNEL_RANGE)
}

pub fn brightness_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    unit(1.0 - (a.brightness - b.brightness).abs() / CHANNEL_RANGE)
}

pub fn contrast_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    unit(1.0 - (a.contrast - b.contrast).abs() / CONTRAST_RANGE)
}

pub fn aspect_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    unit(1.0 - (a.dimensions.aspect_ratio - b.dimensions.aspect_ratio).abs() / ASPECT_RANGE)
}

/// Compare two feature vectors.
pub fn compare(a: &FeatureVector, b: &FeatureVector) -> PairComparison {
    let color = color_similarity(a, b);
    let brightness = brightness_similarity(a, b);
    let contrast = contrast_similarity(a, b);
    let aspect = aspect_similarity(a, b);

    let similarity = Similarity {
        overall: (color + brightness + contrast + aspect) / 4.0 * 100.0,
        color: color * 100.0,
        brightness: brightness * 100.0,
        contrast: contrast * 100.0,
        aspect: aspect * 100.0,
    };

    let pixels_a = a.dimensions.pixel_count();
    let pixels_b = b.dimensions.pixel_count();

    tracing::debug!(
        "Compared {} with {}: similarity {:.1}",
        a.name,
        b.name,
        similarity.overall
    );

    PairComparison {
        image_a: a.name.clone(),
        image_b: b.name.clone(),
        similarity,
        quality_comparison: compare_quality(&a.quality_score, &b.quality_score),
        color_comparison: ColorComparison {
            similarity: similarity.color,
            dominant_colors_a: a.dominant_colors.clone(),
            dominant_colors_b: b.dominant_colors.clone(),
            colorfulness_winner: Winner::from_values(
                a.color_stats.colorfulness,
                b.color_stats.colorfulness,
            ),
        },
        dimension_comparison: DimensionComparison {
            pixels_a,
            pixels_b,
            resolution_winner: Winner::from_values(pixels_a as f64, pixels_b as f64),
            aspect_ratio_similarity: similarity.aspect,
        },
        degraded: a.degraded || b.degraded,
    }
}

fn compare_quality(a: &QualityScore, b: &QualityScore) -> QualityComparison {
    let per_metric_detail = [
        (QualityMetric::Resolution, a.resolution, b.resolution),
        (QualityMetric::Brightness, a.brightness, b.brightness),
        (QualityMetric::Contrast, a.contrast, b.contrast),
        (QualityMetric::Sharpness, a.sharpness, b.sharpness),
    ]
    .into_iter()
    .map(|(metric, va, vb)| MetricDetail {
        metric,
        a: va,
        b: vb,
        winner: Winner::from_values(va, vb),
    })
    .collect();

    QualityComparison {
        winner: Winner::from_values(a.overall, b.overall),
        difference: (a.overall - b.overall).abs(),
        mean_quality: (a.overall + b.overall) / 2.0,
        per_metric_detail,
    }
}
