//! Core data types for feature vectors, comparisons, and valuation reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw image payload handed to the extractor by an upload collaborator.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub name: String,
}

impl ImageBlob {
    /// Wrap raw bytes with their declared media type and display name.
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            name: name.into(),
        }
    }

    /// Payload length in bytes.
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            aspect_ratio: width as f64 / height as f64,
        }
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Per-channel means and colorfulness over all pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorStats {
    pub mean_r: f64,
    pub mean_g: f64,
    pub mean_b: f64,
    pub colorfulness: f64,
}

/// A quantized color bucket and how many sampled pixels fell into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DominantColor {
    pub rgb: [u8; 3],
    pub hex_code: String,
    pub pixel_count: u64,
}

/// Normalized 0-100 quality subscores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall: f64,
    pub resolution: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub sharpness: f64,
}

/// Quantitative visual features derived from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub name: String,
    pub media_type: String,
    pub byte_length: usize,
    pub dimensions: Dimensions,
    pub color_stats: ColorStats,
    pub brightness: f64,
    pub contrast: f64,
    pub sharpness: f64,
    pub dominant_colors: Vec<DominantColor>,
    pub quality_score: QualityScore,
    /// Set when the image is too small for sharpness to be measured.
    pub degraded: bool,
}

/// Which side of a pairwise comparison came out ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    A,
    B,
    Tie,
}

impl Winner {
    /// Pick the side with the larger value; equal values tie.
    pub fn from_values(a: f64, b: f64) -> Self {
        if a > b {
            Winner::A
        } else if b > a {
            Winner::B
        } else {
            Winner::Tie
        }
    }
}

/// Similarity sub-terms, each scaled to 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub overall: f64,
    pub color: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub aspect: f64,
}

/// One of the four quality subscores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    Resolution,
    Brightness,
    Contrast,
    Sharpness,
}

/// Both sides' value for one quality subscore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDetail {
    pub metric: QualityMetric,
    pub a: f64,
    pub b: f64,
    pub winner: Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityComparison {
    pub winner: Winner,
    pub difference: f64,
    /// Mean of both images' overall quality.
    pub mean_quality: f64,
    pub per_metric_detail: Vec<MetricDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorComparison {
    pub similarity: f64,
    pub dominant_colors_a: Vec<DominantColor>,
    pub dominant_colors_b: Vec<DominantColor>,
    pub colorfulness_winner: Winner,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionComparison {
    pub pixels_a: u64,
    pub pixels_b: u64,
    pub resolution_winner: Winner,
    pub aspect_ratio_similarity: f64,
}

/// Result of comparing two feature vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairComparison {
    pub image_a: String,
    pub image_b: String,
    pub similarity: Similarity,
    pub quality_comparison: QualityComparison,
    pub color_comparison: ColorComparison,
    pub dimension_comparison: DimensionComparison,
    /// True when either input was flagged degraded.
    pub degraded: bool,
}

/// A ranked (reference, candidate) pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMatch {
    pub reference_index: usize,
    pub candidate_index: usize,
    pub reference_name: String,
    pub candidate_name: String,
    pub similarity: f64,
    pub quality_difference: f64,
}

/// Mean overall quality of each input set, `None` for an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetAverages {
    pub reference: Option<f64>,
    pub candidate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    NoComparison,
    ReferenceImageQuality,
    CandidateImageQuality,
    AuthenticityReview,
    LowSimilarity,
    StrongMatch,
    DegradedImages,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSummary {
    pub average_quality_per_set: SetAverages,
    pub best_matches: Vec<BestMatch>,
    pub recommendations: Vec<Recommendation>,
}

/// Every cross-pair comparison plus the aggregate summary.
///
/// `comparisons` is row-major: the pair (reference `i`, candidate `j`) sits at
/// `i * candidate_count + j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSetResult {
    pub reference_count: usize,
    pub candidate_count: usize,
    pub comparisons: Vec<PairComparison>,
    pub summary: SetSummary,
}

impl ComparisonSetResult {
    /// Whether no pair could be compared.
    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    /// Look up the comparison for a (reference, candidate) pair.
    pub fn pair(&self, reference_index: usize, candidate_index: usize) -> Option<&PairComparison> {
        if reference_index >= self.reference_count || candidate_index >= self.candidate_count {
            return None;
        }
        self.comparisons
            .get(reference_index * self.candidate_count + candidate_index)
    }
}

/// Four-axis valuation scores plus their mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationScores {
    pub quality: f64,
    pub consistency: f64,
    pub visual_appeal: f64,
    pub authenticity: f64,
    pub overall: f64,
}

/// Ordered value tiers, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueCategory {
    #[serde(rename = "Premium")]
    Premium,
    #[serde(rename = "High-Tier")]
    HighTier,
    #[serde(rename = "Standard")]
    Standard,
    #[serde(rename = "Basic")]
    Basic,
    #[serde(rename = "Needs-Attention")]
    NeedsAttention,
}

impl ValueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueCategory::Premium => "Premium",
            ValueCategory::HighTier => "High-Tier",
            ValueCategory::Standard => "Standard",
            ValueCategory::Basic => "Basic",
            ValueCategory::NeedsAttention => "Needs-Attention",
        }
    }
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorDirection {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub factor: String,
    pub impact: String,
    pub direction: FactorDirection,
    pub description: String,
}

/// Valuation judgment derived from a comparison set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationReport {
    pub scores: ValuationScores,
    pub value_category: ValueCategory,
    pub multiplier: f64,
    pub reasoning: String,
    pub contributing_factors: Vec<ContributingFactor>,
    pub confidence: f64,
}

/// Which input set an image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetRole {
    Reference,
    Candidate,
}

/// An image dropped from its set during batch extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub set: SetRole,
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Errors raised while turning an image blob into a feature vector.
#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to decode {name}: {reason}")]
    DecodeFailed { name: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur in the vision library.
#[derive(thiserror::Error, Debug)]
pub enum VisionError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Worker task failed: {0}")]
    Task(String),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Convenience result type.
pub type VisionResult<T> = Result<T, VisionError>;
