use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::params::ViewshedConfig;
use crate::core::processing::pipeline::{ViewshedOutput, compute_fuzzy_viewshed, derive_observer};
use crate::engine::VisibilityEngine;
use crate::error::{Error, Result};
use crate::io::raster::Terrain;
use crate::io::writers::OutputSink;
use crate::types::FeatureRecord;

/// Shared flag that stops features from starting once set.
///
/// Features already running finish; the rest are reported as `Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result for one input feature, in input order
#[derive(Debug)]
pub struct FeatureOutcome<T = ViewshedOutput> {
    pub id: String,
    pub result: Result<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureFailure {
    pub id: String,
    pub reason: String,
}

/// Batch processing report
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub failures: Vec<FeatureFailure>,
    pub outputs: Vec<PathBuf>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

impl BatchReport {
    fn from_outcomes(outcomes: Vec<FeatureOutcome<PathBuf>>, started: DateTime<Utc>) -> Self {
        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(path) => outputs.push(path),
                Err(e) => failures.push(FeatureFailure {
                    id: outcome.id,
                    reason: e.to_string(),
                }),
            }
        }
        Self {
            processed: outputs.len(),
            failed: failures.len(),
            failures,
            outputs,
            started,
            finished: Utc::now(),
        }
    }
}

/// Indices of records whose key was already taken by an earlier record.
fn duplicate_indices(features: &[FeatureRecord], key: impl Fn(&str) -> String) -> HashSet<usize> {
    let mut seen = HashSet::new();
    features
        .iter()
        .enumerate()
        .filter(|(_, rec)| !seen.insert(key(&rec.id)))
        .map(|(i, _)| i)
        .collect()
}

fn run_batch<T, F>(
    terrain: &Terrain,
    features: &[FeatureRecord],
    engine: &dyn VisibilityEngine,
    config: &ViewshedConfig,
    duplicates: &HashSet<usize>,
    cancel: &CancelToken,
    finish: F,
) -> Result<Vec<FeatureOutcome<T>>>
where
    T: Send,
    F: Fn(ViewshedOutput) -> Result<T> + Sync,
{
    config.validate()?;
    info!(
        "Starting batch: {} features, engine {}, {}x{} grid",
        features.len(),
        engine.name(),
        terrain.grid.rows,
        terrain.grid.cols
    );

    // Set on fatal errors, and on any failure in strict mode
    let abort = CancelToken::new();

    let work = || -> Vec<FeatureOutcome<T>> {
        features
            .par_iter()
            .enumerate()
            .map(|(i, record)| {
                let id = record.id.clone();
                let result = if cancel.is_cancelled() || abort.is_cancelled() {
                    Err(Error::Cancelled { feature: id.clone() })
                } else if duplicates.contains(&i) {
                    Err(Error::DuplicateFeatureId { feature: id.clone() })
                } else {
                    derive_observer(record)
                        .and_then(|feature| {
                            compute_fuzzy_viewshed(terrain, &feature, engine, config)
                        })
                        .and_then(&finish)
                };
                if let Err(e) = &result {
                    if !matches!(e, Error::Cancelled { .. }) {
                        warn!("Feature {} failed: {}", id, e);
                        if e.is_fatal() || config.strict {
                            abort.cancel();
                        }
                    }
                }
                FeatureOutcome { id, result }
            })
            .collect()
    };

    let mut outcomes = match config.jobs {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| Error::Processing(format!("thread pool: {}", e)))?
            .install(work),
        None => work(),
    };

    let mut first_failure = None;
    for (i, outcome) in outcomes.iter().enumerate() {
        if let Err(e) = &outcome.result {
            if e.is_fatal() {
                first_failure = Some(i);
                break;
            }
            if config.strict && first_failure.is_none() && !matches!(e, Error::Cancelled { .. }) {
                first_failure = Some(i);
            }
        }
    }
    match first_failure.map(|i| outcomes.swap_remove(i).result) {
        Some(Err(e)) => Err(e),
        _ => Ok(outcomes),
    }
}

/// Compute one fuzzy viewshed per feature, keeping results in memory.
///
/// Configuration and grid-invariant errors abort the run; other failures are
/// returned per feature unless `config.strict` is set.
pub fn process_feature_collection(
    terrain: &Terrain,
    features: &[FeatureRecord],
    engine: &dyn VisibilityEngine,
    config: &ViewshedConfig,
    cancel: &CancelToken,
) -> Result<Vec<FeatureOutcome>> {
    let duplicates = duplicate_indices(features, str::to_string);
    run_batch(terrain, features, engine, config, &duplicates, cancel, Ok)
}

/// Compute and write one output per feature through `sink`, dropping each grid
/// once written.
pub fn process_features_to_sink(
    terrain: &Terrain,
    features: &[FeatureRecord],
    engine: &dyn VisibilityEngine,
    config: &ViewshedConfig,
    sink: &dyn OutputSink,
    cancel: &CancelToken,
) -> Result<BatchReport> {
    let started = Utc::now();
    let duplicates = duplicate_indices(features, |id| sink.key(id));
    let outcomes = run_batch(terrain, features, engine, config, &duplicates, cancel, |output| {
        sink.write(terrain, &output)
    })?;
    let report = BatchReport::from_outcomes(outcomes, started);
    info!(
        "Batch processing complete! Processed: {}, Failed: {}",
        report.processed, report.failed
    );
    Ok(report)
}
