//! AppraisalVision — image feature extraction and comparative valuation for property photographs.

pub mod aggregate;
pub mod batch;
pub mod capture;
pub mod compare;
pub mod config;
pub mod features;
pub mod types;
pub mod valuation;

pub use aggregate::{compare_sets, compare_sets_with};
pub use batch::{analyze, extract_batch, extract_batch_with, worker_pool, AnalysisReport, BatchExtraction};
pub use capture::{decode_blob, is_supported_format, media_type_for_path};
pub use compare::compare;
pub use config::{resolve_config_path, EngineConfig};
pub use features::{extract_features, extract_features_with, features_from_pixels, rank_by_quality};
pub use types::*;
pub use valuation::{categorize, score, score_with, ValueTier, VALUE_TIERS};
