//! Engine configuration: scoring references, palette sampling, and rule thresholds.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{VisionError, VisionResult};

/// Pixel count at which the resolution subscore saturates.
pub const REFERENCE_PIXELS: f64 = 2_000_000.0;

/// Mid-gray luma, the ideal brightness.
pub const IDEAL_BRIGHTNESS: f64 = 128.0;

/// Luma standard deviation at which the contrast subscore saturates.
pub const CONTRAST_REFERENCE: f64 = 50.0;

/// Mean gradient magnitude at which the sharpness subscore saturates.
pub const SHARPNESS_REFERENCE: f64 = 10.0;

/// Width of one quantization bucket per channel.
pub const PALETTE_BUCKET_SIZE: u8 = 32;

/// Number of dominant colors reported per image.
pub const DOMINANT_COLOR_COUNT: usize = 5;

/// Every Nth pixel is sampled for the palette histogram.
pub const PALETTE_SAMPLE_STRIDE: usize = 10;

/// Average set quality below which a recapture is recommended.
pub const LOW_QUALITY_THRESHOLD: f64 = 50.0;

/// Similarity standard deviation above which an authenticity review is recommended.
pub const SIMILARITY_SPREAD_THRESHOLD: f64 = 15.0;

/// Mean similarity below which the sets likely show different properties.
pub const LOW_SIMILARITY_THRESHOLD: f64 = 40.0;

/// Best-match similarity at or above which the pairing is called out as strong.
pub const STRONG_MATCH_THRESHOLD: f64 = 90.0;

/// Maximum number of ranked pairs kept in the summary.
pub const BEST_MATCH_LIMIT: usize = 5;

/// Fraction of confidence removed when every pair involves a degraded image.
pub const DEGRADED_CONFIDENCE_PENALTY: f64 = 0.25;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "APPRAISAL_VISION_CONFIG";

/// Project-local config file.
const LOCAL_CONFIG_PATH: &str = ".appraisal-vision/config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub reference_pixels: f64,
    pub ideal_brightness: f64,
    pub contrast_reference: f64,
    pub sharpness_reference: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            reference_pixels: REFERENCE_PIXELS,
            ideal_brightness: IDEAL_BRIGHTNESS,
            contrast_reference: CONTRAST_REFERENCE,
            sharpness_reference: SHARPNESS_REFERENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub bucket_size: u8,
    pub max_colors: usize,
    pub sample_stride: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            bucket_size: PALETTE_BUCKET_SIZE,
            max_colors: DOMINANT_COLOR_COUNT,
            sample_stride: PALETTE_SAMPLE_STRIDE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub low_quality: f64,
    pub similarity_spread: f64,
    pub low_similarity: f64,
    pub strong_match: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            low_quality: LOW_QUALITY_THRESHOLD,
            similarity_spread: SIMILARITY_SPREAD_THRESHOLD,
            low_similarity: LOW_SIMILARITY_THRESHOLD,
            strong_match: STRONG_MATCH_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub degraded_confidence_penalty: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            degraded_confidence_penalty: DEGRADED_CONFIDENCE_PENALTY,
        }
    }
}

/// Full engine configuration. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub quality: QualityConfig,
    pub palette: PaletteConfig,
    pub recommendations: RecommendationThresholds,
    pub valuation: ValuationConfig,
    pub best_match_limit: usize,
    /// Concurrent extraction workers; 0 means one per available core.
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quality: QualityConfig::default(),
            palette: PaletteConfig::default(),
            recommendations: RecommendationThresholds::default(),
            valuation: ValuationConfig::default(),
            best_match_limit: BEST_MATCH_LIMIT,
            workers: 0,
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file.
    pub fn from_file(path: &Path) -> VisionResult<Self> {
        let data = std::fs::read(path)?;
        let config: EngineConfig = serde_json::from_slice(&data)?;
        config.validate()?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Load the config found by [`resolve_config_path`], or the defaults.
    pub fn load(explicit: Option<&str>) -> VisionResult<Self> {
        match resolve_config_path(explicit) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would make the scoring formulas divide by zero.
    pub fn validate(&self) -> VisionResult<()> {
        let q = &self.quality;
        for (name, value) in [
            ("quality.reference_pixels", q.reference_pixels),
            ("quality.contrast_reference", q.contrast_reference),
            ("quality.sharpness_reference", q.sharpness_reference),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(VisionError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if !(q.ideal_brightness > 0.0 && q.ideal_brightness < 255.0) {
            return Err(VisionError::Config(format!(
                "quality.ideal_brightness must lie in (0, 255), got {}",
                q.ideal_brightness
            )));
        }
        if self.palette.bucket_size == 0 {
            return Err(VisionError::Config("palette.bucket_size must be non-zero".into()));
        }
        if self.palette.sample_stride == 0 {
            return Err(VisionError::Config("palette.sample_stride must be non-zero".into()));
        }
        let penalty = self.valuation.degraded_confidence_penalty;
        if !(0.0..=1.0).contains(&penalty) {
            return Err(VisionError::Config(format!(
                "valuation.degraded_confidence_penalty must lie in [0, 1], got {penalty}"
            )));
        }
        Ok(())
    }

    /// Worker count to use for concurrent extraction.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Resolve the config file path.
///
/// Order: explicit path, `APPRAISAL_VISION_CONFIG`, then the project-local file
/// if it exists. `None` means built-in defaults.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    if local.exists() {
        return Some(local);
    }

    None
}
