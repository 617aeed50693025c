//! Concurrent batch pipeline: extract every image, compare the sets, score the result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::aggregate::compare_sets_with;
use crate::config::EngineConfig;
use crate::features::extract_features_with;
use crate::types::{
    ComparisonSetResult, ExtractionFailure, FeatureVector, ImageBlob, SetRole, ValuationReport,
    VisionError, VisionResult,
};
use crate::valuation::score_with;

/// Feature vectors that extracted cleanly plus the images that were dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExtraction {
    pub features: Vec<FeatureVector>,
    /// Input index of each entry in `features`.
    pub source_indices: Vec<usize>,
    pub failures: Vec<ExtractionFailure>,
}

/// Complete result of one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub reference: BatchExtraction,
    pub candidate: BatchExtraction,
    pub comparison: ComparisonSetResult,
    pub valuation: ValuationReport,
}

/// Semaphore bounding concurrent extractions to `config.effective_workers()`.
///
/// Share one pool across every `extract_batch_with` call that should count
/// against the same limit.
pub fn worker_pool(config: &EngineConfig) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(config.effective_workers().max(1)))
}

/// Run `work` over every item on the blocking pool, one permit per running item.
///
/// Slots are `None` for items whose worker panicked or was aborted.
async fn run_bounded<I, T, F>(items: Vec<I>, pool: Arc<Semaphore>, work: F) -> Vec<Option<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> T + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let len = items.len();
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let pool = Arc::clone(&pool);
        let work = Arc::clone(&work);
        tasks.spawn(async move {
            // Held until the blocking work below has finished.
            let _permit = pool.acquire_owned().await.ok();
            let result = tokio::task::spawn_blocking(move || work(item)).await;
            (index, result)
        });
    }

    let mut settled: Vec<Option<T>> = (0..len).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(value))) => settled[index] = Some(value),
            Ok((index, Err(e))) => tracing::error!("Worker for item {index} failed: {e}"),
            Err(e) => tracing::error!("Worker task aborted: {e}"),
        }
    }
    settled
}

/// Extract features for every blob concurrently with a pool of its own.
pub async fn extract_batch(
    blobs: Vec<ImageBlob>,
    role: SetRole,
    config: Arc<EngineConfig>,
) -> BatchExtraction {
    let pool = worker_pool(&config);
    extract_batch_with(blobs, role, config, pool).await
}

/// Extract features for every blob, drawing permits from `pool`.
///
/// Each extraction runs on the blocking pool with its own decode buffer.
/// Results complete in any order and are returned in input order. Failed
/// images are reported, not retried.
pub async fn extract_batch_with(
    blobs: Vec<ImageBlob>,
    role: SetRole,
    config: Arc<EngineConfig>,
    pool: Arc<Semaphore>,
) -> BatchExtraction {
    let names: Vec<String> = blobs.iter().map(|b| b.name.clone()).collect();
    let settled = run_bounded(blobs, pool, move |blob: ImageBlob| {
        extract_features_with(&blob, &config).map_err(|e| e.to_string())
    })
    .await;

    let mut batch = BatchExtraction::default();
    for (index, (name, outcome)) in names.into_iter().zip(settled).enumerate() {
        match outcome.unwrap_or_else(|| Err("extraction worker panicked or was aborted".to_string())) {
            Ok(features) => {
                batch.features.push(features);
                batch.source_indices.push(index);
            }
            Err(reason) => {
                tracing::warn!("Dropping {name} from {role:?} set: {reason}");
                batch.failures.push(ExtractionFailure {
                    set: role,
                    index,
                    name,
                    reason,
                });
            }
        }
    }

    tracing::info!(
        "Extracted {:?} set: {} ok, {} failed",
        role,
        batch.features.len(),
        batch.failures.len()
    );
    batch
}

/// Run the full pipeline over a reference and a candidate image set.
///
/// Both sets share one worker pool, so at most `config.effective_workers()`
/// extractions run at once across the whole request. Only an invalid configuration or a crashed comparison worker is an error;
/// undecodable images and empty sets are reported inside the result.
pub async fn analyze(
    reference: Vec<ImageBlob>,
    candidate: Vec<ImageBlob>,
    config: EngineConfig,
) -> VisionResult<AnalysisReport> {
    config.validate()?;
    let config = Arc::new(config);
    let pool = worker_pool(&config);

    let (reference, candidate) = tokio::join!(
        extract_batch_with(reference, SetRole::Reference, Arc::clone(&config), Arc::clone(&pool)),
        extract_batch_with(candidate, SetRole::Candidate, Arc::clone(&config), Arc::clone(&pool)),
    );

    let reference_features = reference.features.clone();
    let candidate_features = candidate.features.clone();
    let scoring_config = Arc::clone(&config);
    let (comparison, valuation) = tokio::task::spawn_blocking(move || {
        let comparison =
            compare_sets_with(&reference_features, &candidate_features, &scoring_config);
        let valuation = score_with(&comparison, &scoring_config);
        (comparison, valuation)
    })
    .await
    .map_err(|e| VisionError::Task(e.to_string()))?;

    Ok(AnalysisReport {
        reference,
        candidate,
        comparison,
        valuation,
    })
}
