//! Per-image feature extraction: color statistics, tone, sharpness, palette, and quality.

use std::collections::HashMap;

use image::RgbaImage;

use crate::capture::{decode_blob, ensure_non_empty};
use crate::config::{EngineConfig, PaletteConfig, QualityConfig};
use crate::types::{
    ColorStats, Dimensions, DominantColor, ExtractionResult, FeatureVector, ImageBlob,
    QualityScore,
};

/// Smallest width/height with at least one interior pixel for the gradient.
const MIN_SHARPNESS_DIM: u32 = 3;

/// Images with fewer than `stride * MIN_PALETTE_SAMPLES` pixels are sampled more densely.
const MIN_PALETTE_SAMPLES: usize = 256;

/// Extract features from a blob using the default configuration.
pub fn extract_features(blob: &ImageBlob) -> ExtractionResult<FeatureVector> {
    extract_features_with(blob, &EngineConfig::default())
}

/// Decode a blob and extract its feature vector.
pub fn extract_features_with(
    blob: &ImageBlob,
    config: &EngineConfig,
) -> ExtractionResult<FeatureVector> {
    let rgba = decode_blob(blob)?;
    let features = features_from_pixels(
        &blob.name,
        &blob.media_type,
        blob.byte_length(),
        &rgba,
        config,
    )?;

    if features.degraded {
        tracing::warn!(
            "{} is {}x{}; sharpness cannot be measured",
            blob.name,
            rgba.width(),
            rgba.height()
        );
    }
    tracing::debug!(
        "Extracted {} ({}x{}): quality {:.1}",
        blob.name,
        rgba.width(),
        rgba.height(),
        features.quality_score.overall
    );
    Ok(features)
}

/// Derive a feature vector from an already decoded image.
///
/// A buffer with zero width or height is a `DecodeFailed` error.
pub fn features_from_pixels(
    name: &str,
    media_type: &str,
    byte_length: usize,
    rgba: &RgbaImage,
    config: &EngineConfig,
) -> ExtractionResult<FeatureVector> {
    ensure_non_empty(name, rgba)?;
    let (width, height) = rgba.dimensions();
    let dimensions = Dimensions::new(width, height);
    let luma = luma_plane(rgba);

    let color_stats = color_stats(rgba);
    let (brightness, contrast) = tone(&luma);
    let sharpness = sharpness(&luma, width, height);
    let degraded = sharpness.is_none();
    let sharpness = sharpness.unwrap_or(0.0);
    let dominant_colors = dominant_colors(rgba, &config.palette);
    let quality_score = quality_score(&dimensions, brightness, contrast, sharpness, &config.quality);

    Ok(FeatureVector {
        name: name.to_string(),
        media_type: media_type.to_string(),
        byte_length,
        dimensions,
        color_stats,
        brightness,
        contrast,
        sharpness,
        dominant_colors,
        quality_score,
        degraded,
    })
}

/// Per-pixel luma `(R+G+B)/3`, row-major.
fn luma_plane(rgba: &RgbaImage) -> Vec<f64> {
    rgba.pixels()
        .map(|p| (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0)
        .collect()
}

fn color_stats(rgba: &RgbaImage) -> ColorStats {
    let mut sum_r = 0.0;
    let mut sum_g = 0.0;
    let mut sum_b = 0.0;
    let mut sum_colorfulness = 0.0;

    for p in rgba.pixels() {
        let (r, g, b) = (p[0] as f64, p[1] as f64, p[2] as f64);
        sum_r += r;
        sum_g += g;
        sum_b += b;
        sum_colorfulness += (r - g).abs() + (0.5 * (r + g) - b).abs();
    }

    let n = (rgba.width() as f64 * rgba.height() as f64).max(1.0);
    ColorStats {
        mean_r: sum_r / n,
        mean_g: sum_g / n,
        mean_b: sum_b / n,
        colorfulness: sum_colorfulness / n,
    }
}

/// Mean luma and its population standard deviation.
fn tone(luma: &[f64]) -> (f64, f64) {
    if luma.is_empty() {
        return (0.0, 0.0);
    }
    let n = luma.len() as f64;
    let mean = luma.iter().sum::<f64>() / n;
    let variance = luma.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Mean first-difference gradient magnitude over interior pixels.
///
/// `None` when the image has no interior.
fn sharpness(luma: &[f64], width: u32, height: u32) -> Option<f64> {
    if width < MIN_SHARPNESS_DIM || height < MIN_SHARPNESS_DIM {
        return None;
    }
    let (w, h) = (width as usize, height as usize);

    let mut total = 0.0;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let gx = luma[i + 1] - luma[i];
            let gy = luma[i + w] - luma[i];
            total += (gx * gx + gy * gy).sqrt();
        }
    }

    Some(total / ((w - 2) * (h - 2)) as f64)
}

/// Most frequent quantized colors over a strided pixel sample.
fn dominant_colors(rgba: &RgbaImage, palette: &PaletteConfig) -> Vec<DominantColor> {
    let bucket = palette.bucket_size.max(1);
    let quantize = |v: u8| (v / bucket) * bucket;

    let pixels = rgba.as_raw();
    let pixel_count = pixels.len() / 4;
    let stride = palette
        .sample_stride
        .min((pixel_count / MIN_PALETTE_SAMPLES).max(1))
        .max(1);

    let mut histogram: HashMap<[u8; 3], u64> = HashMap::new();
    for px in pixels.chunks_exact(4).step_by(stride) {
        let key = [quantize(px[0]), quantize(px[1]), quantize(px[2])];
        *histogram.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<([u8; 3], u64)> = histogram.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(palette.max_colors);

    ranked
        .into_iter()
        .map(|(rgb, pixel_count)| DominantColor {
            rgb,
            hex_code: hex_code(rgb),
            pixel_count,
        })
        .collect()
}

fn hex_code(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

fn percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Normalize the raw measurements into 0-100 subscores.
fn quality_score(
    dimensions: &Dimensions,
    brightness: f64,
    contrast: f64,
    sharpness: f64,
    q: &QualityConfig,
) -> QualityScore {
    let resolution = percent(dimensions.pixel_count() as f64 / q.reference_pixels * 100.0);
    let brightness =
        percent(100.0 - (brightness - q.ideal_brightness).abs() / q.ideal_brightness * 100.0);
    let contrast = percent(contrast / q.contrast_reference * 100.0);
    let sharpness = percent(sharpness / q.sharpness_reference * 100.0);
    let overall = percent((resolution + brightness + contrast + sharpness) / 4.0);

    QualityScore {
        overall,
        resolution,
        brightness,
        contrast,
        sharpness,
    }
}

/// Indices of the highest-quality images, best first.
///
/// Ties go to the larger image, then to input order.
pub fn rank_by_quality(features: &[FeatureVector], limit: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..features.len()).collect();
    order.sort_by(|&a, &b| {
        let (fa, fb) = (&features[a], &features[b]);
        fb.quality_score
            .overall
            .total_cmp(&fa.quality_score.overall)
            .then_with(|| fb.dimensions.pixel_count().cmp(&fa.dimensions.pixel_count()))
            .then_with(|| a.cmp(&b))
    });
    order.truncate(limit);
    order
}
