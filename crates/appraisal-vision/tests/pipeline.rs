//! End-to-end tests: encoded images through extraction, comparison, aggregation, and scoring.

use appraisal_vision::*;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Rgba, RgbaImage};

// ─────────────────────── helpers ───────────────────────

fn encode(img: RgbaImage, name: &str) -> ImageBlob {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_with_encoder(PngEncoder::new(&mut buf))
        .unwrap();
    ImageBlob::new(buf, "image/png", name)
}

fn solid(name: &str, width: u32, height: u32, rgb: [u8; 3]) -> ImageBlob {
    encode(
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255])),
        name,
    )
}

/// A gradient with some texture so every measurement is non-trivial.
fn scene(name: &str, width: u32, height: u32, tint: u8) -> ImageBlob {
    encode(
        RgbaImage::from_fn(width, height, |x, y| {
            let stripe = if (x / 4 + y / 4) % 2 == 0 { 40 } else { 0 };
            Rgba([
                ((x * 255 / width.max(1)) as u8).saturating_add(stripe),
                ((y * 255 / height.max(1)) as u8).saturating_sub(stripe),
                tint,
                255,
            ])
        }),
        name,
    )
}

fn features(blob: &ImageBlob) -> FeatureVector {
    extract_features(blob).unwrap()
}

// ─────────────────────── extractor ───────────────────────

#[test]
fn test_solid_red_against_itself() {
    let a = features(&solid("red_a.png", 2, 2, [255, 0, 0]));
    let b = features(&solid("red_b.png", 2, 2, [255, 0, 0]));
    let cmp = compare(&a, &b);

    assert_eq!(cmp.similarity.overall, 100.0);
    assert_eq!(cmp.color_comparison.similarity, 100.0);
    assert_eq!(cmp.quality_comparison.difference, 0.0);
    assert!(a.degraded, "2x2 images cannot measure sharpness");
    assert!(cmp.degraded);
}

#[test]
fn test_black_versus_white() {
    let black = features(&solid("black.png", 2, 2, [0, 0, 0]));
    let white = features(&solid("white.png", 2, 2, [255, 255, 255]));
    assert_eq!(black.brightness, 0.0);
    assert_eq!(white.brightness, 255.0);

    let cmp = compare(&black, &white);
    assert!(cmp.similarity.color.abs() < 1e-9);
    assert!(cmp.similarity.brightness.abs() < 1e-9);
    // Only contrast and aspect still agree.
    assert_eq!(cmp.similarity.overall, 50.0);
}

#[test]
fn test_extraction_is_idempotent() {
    let blob = scene("living_room.png", 64, 40, 90);
    assert_eq!(features(&blob), features(&blob));
}

#[test]
fn test_scores_bounded_for_extreme_images() {
    let blobs = [
        solid("black", 1, 1, [0, 0, 0]),
        solid("white", 1, 1, [255, 255, 255]),
        solid("black_big", 50, 50, [0, 0, 0]),
        solid("white_wide", 300, 2, [255, 255, 255]),
        scene("textured", 80, 60, 200),
    ];
    let vectors: Vec<FeatureVector> = blobs.iter().map(features).collect();

    for f in &vectors {
        let q = f.quality_score;
        for v in [q.overall, q.resolution, q.brightness, q.contrast, q.sharpness] {
            assert!((0.0..=100.0).contains(&v), "{}: {v}", f.name);
        }
        assert!(f.dimensions.width > 0 && f.dimensions.height > 0);
    }

    for a in &vectors {
        for b in &vectors {
            let ab = compare(a, b);
            let ba = compare(b, a);
            assert!((0.0..=100.0).contains(&ab.similarity.overall));
            assert_eq!(ab.similarity.overall, ba.similarity.overall);
        }
        assert_eq!(compare(a, a).similarity.overall, 100.0);
    }

    let report = score(&compare_sets(&vectors, &vectors));
    let s = report.scores;
    for v in [s.quality, s.consistency, s.visual_appeal, s.authenticity, s.overall, report.confidence] {
        assert!((0.0..=100.0).contains(&v));
    }
}

#[test]
fn test_resolution_score_monotonic_in_pixel_count() {
    let mut previous = -1.0;
    for side in [4u32, 16, 64, 256] {
        let f = features(&solid("gray", side, side, [128, 128, 128]));
        assert!(f.quality_score.resolution >= previous);
        previous = f.quality_score.resolution;
    }
}

#[test]
fn test_corrupt_blob_fails_decode() {
    let blob = ImageBlob::new(vec![0x89, b'P', b'N', b'G', 0, 0], "image/png", "truncated.png");
    match extract_features(&blob) {
        Err(ExtractionError::DecodeFailed { name, .. }) => assert_eq!(name, "truncated.png"),
        other => panic!("expected DecodeFailed, got {other:?}"),
    }
}

// ─────────────────────── aggregation & scoring ───────────────────────

#[test]
fn test_empty_reference_set_is_not_an_error() {
    let f1 = features(&scene("front.png", 32, 32, 50));
    let result = compare_sets(&[], &[f1]);
    assert_eq!(result.comparisons.len(), 0);
    assert!(!result.summary.recommendations.is_empty());
    assert_eq!(
        result.summary.recommendations[0].kind,
        RecommendationKind::NoComparison
    );

    let report = score(&result);
    assert_eq!(report.value_category, ValueCategory::NeedsAttention);
}

#[test]
fn test_premium_boundary() {
    assert_eq!(categorize(85.0).category, ValueCategory::Premium);
    assert_eq!(categorize(85.0).multiplier, 1.15);
    assert_eq!(categorize(84.999).category, ValueCategory::HighTier);
    assert_eq!(categorize(84.999).multiplier, 1.08);
}

#[test]
fn test_report_serializes_to_json() {
    let reference = vec![features(&scene("r.png", 40, 30, 10))];
    let candidate = vec![features(&scene("c.png", 40, 30, 30))];
    let set = compare_sets(&reference, &candidate);
    let report = score(&set);

    let value = serde_json::to_value(&set).unwrap();
    assert!(value["summary"]["bestMatches"].is_array());
    assert!(value["comparisons"][0]["similarity"]["overall"].is_number());

    let value = serde_json::to_value(&report).unwrap();
    assert!(value["valueCategory"].is_string());
    assert!(value["scores"]["visualAppeal"].is_number());
}

#[tokio::test]
async fn test_analyze_end_to_end() {
    let reference = vec![
        scene("ref_front.png", 48, 32, 60),
        scene("ref_back.png", 48, 32, 70),
        ImageBlob::new(b"not an image".to_vec(), "image/jpeg", "ref_broken.jpg"),
    ];
    let candidate = vec![scene("cand_front.png", 48, 32, 62), scene("cand_back.png", 32, 48, 180)];

    let report = analyze(reference, candidate, EngineConfig::default())
        .await
        .unwrap();

    assert_eq!(report.reference.features.len(), 2);
    assert_eq!(report.reference.failures.len(), 1);
    assert_eq!(report.reference.failures[0].name, "ref_broken.jpg");
    assert!(report.candidate.failures.is_empty());
    assert_eq!(report.comparison.comparisons.len(), 4);

    let best = &report.comparison.summary.best_matches[0];
    assert_eq!(best.reference_name, "ref_front.png");
    assert_eq!(best.candidate_name, "cand_front.png");
    assert!((0.0..=100.0).contains(&report.valuation.confidence));
}

#[tokio::test]
async fn test_analyze_all_images_broken() {
    let reference = vec![ImageBlob::new(Vec::new(), "image/png", "empty.png")];
    let candidate = vec![scene("c.png", 16, 16, 0)];
    let report = analyze(reference, candidate, EngineConfig::default())
        .await
        .unwrap();

    assert!(report.comparison.is_empty());
    assert_eq!(report.valuation.scores.overall, 0.0);
    assert_eq!(report.reference.failures.len(), 1);
}
