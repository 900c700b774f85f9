//! Engine orchestration: validation, dispatch under the engine lock, batches.

use crate::config::EngineConfig;
use crate::conflicts::filter_conflicts;
use crate::dispatch::{is_near_duplicate, Dispatcher, MAX_PER_PATTERN};
use crate::error::{EngineError, Result};
use crate::hardware::HardwareModel;
use crate::pattern::ClassifiedPattern;
use crate::rank::{rank, rank_preferring_automatic};
use crate::recommendation::Recommendation;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Running totals kept by an engine across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub patterns_analyzed: u64,
    pub total_recommendations: u64,
    pub average_expected_improvement: f64,
}

impl EngineStats {
    fn record(&mut self, recs: &[Recommendation]) {
        self.patterns_analyzed += 1;
        if recs.is_empty() {
            return;
        }
        let previous = self.total_recommendations as f64;
        let added: f64 = recs.iter().map(|r| r.expected_improvement_percent).sum();
        self.total_recommendations += recs.len() as u64;
        self.average_expected_improvement = (self.average_expected_improvement * previous + added)
            / self.total_recommendations as f64;
    }
}

/// Cache-optimization recommendation engine.
///
/// Config and hardware model are fixed at creation. The only mutable state is
/// [`EngineStats`], guarded by a mutex that is also held for the duration of
/// each [`analyze`](Self::analyze) call, so one engine can be shared across
/// threads. Every returned list is owned by the caller.
pub struct RecommendationEngine {
    config: EngineConfig,
    hardware: HardwareModel,
    stats: Mutex<EngineStats>,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig, hardware: HardwareModel) -> Result<Self> {
        config.validate()?;
        info!(
            min_improvement = config.min_expected_improvement_percent,
            max_per_pattern = config.max_recommendations_per_pattern,
            cache_levels = hardware.depth(),
            "created recommendation engine"
        );
        Ok(Self {
            config,
            hardware,
            stats: Mutex::new(EngineStats::default()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hardware(&self) -> &HardwareModel {
        &self.hardware
    }

    pub fn stats(&self) -> EngineStats {
        *self.lock_stats()
    }

    fn lock_stats(&self) -> MutexGuard<'_, EngineStats> {
        // Counters stay consistent even if a holder panicked.
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(&self.config, &self.hardware)
    }

    /// Recommendations for a single pattern, in dispatch order.
    pub fn analyze(&self, pattern: &ClassifiedPattern) -> Result<Vec<Recommendation>> {
        pattern.validate()?;
        debug!(
            antipattern = %pattern.antipattern,
            access = ?pattern.dominant_pattern(),
            location = ?pattern.location(),
            severity = pattern.severity_score,
            "analyzing pattern"
        );

        let mut stats = self.lock_stats();
        let recs = self.dispatcher().dispatch(pattern);
        stats.record(&recs);
        Ok(recs)
    }

    /// Output buffer for a batch. No pattern yields more than
    /// [`MAX_PER_PATTERN`] entries, whatever the configured cap.
    fn reserve_batch(&self, patterns: usize) -> Result<Vec<Recommendation>> {
        let per_pattern = self
            .config
            .max_recommendations_per_pattern
            .min(MAX_PER_PATTERN);
        let requested = patterns
            .checked_mul(per_pattern)
            .ok_or(EngineError::AllocationFailure {
                requested: usize::MAX,
            })?;
        let mut out = Vec::new();
        out.try_reserve(requested)
            .map_err(|_| EngineError::AllocationFailure { requested })?;
        Ok(out)
    }

    /// Concatenation of [`analyze`](Self::analyze) over `patterns`.
    ///
    /// A pattern that fails validation is logged and skipped; the rest of the
    /// batch still runs.
    pub fn analyze_all(&self, patterns: &[ClassifiedPattern]) -> Result<Vec<Recommendation>> {
        let mut out = self.reserve_batch(patterns.len())?;
        let mut skipped = 0usize;

        for (index, pattern) in patterns.iter().enumerate() {
            match self.analyze(pattern) {
                Ok(recs) => out.extend(recs),
                Err(e) => {
                    warn!(index, error = %e, "skipping pattern");
                    skipped += 1;
                }
            }
        }

        info!(
            patterns = patterns.len(),
            skipped,
            recommendations = out.len(),
            "analyzed batch"
        );
        Ok(out)
    }

    /// Same output as [`analyze_all`](Self::analyze_all), dispatching patterns on
    /// the rayon pool. Only the statistics update takes the engine lock.
    pub fn analyze_all_parallel(
        &self,
        patterns: &[ClassifiedPattern],
    ) -> Result<Vec<Recommendation>> {
        let mut out = self.reserve_batch(patterns.len())?;

        let per_pattern: Vec<Result<Vec<Recommendation>>> = patterns
            .par_iter()
            .map(|pattern| -> Result<Vec<Recommendation>> {
                pattern.validate()?;
                let recs = self.dispatcher().dispatch(pattern);
                self.lock_stats().record(&recs);
                Ok(recs)
            })
            .collect();

        let mut skipped = 0usize;
        for (index, result) in per_pattern.into_iter().enumerate() {
            match result {
                Ok(recs) => out.extend(recs),
                Err(e) => {
                    warn!(index, error = %e, "skipping pattern");
                    skipped += 1;
                }
            }
        }

        info!(
            patterns = patterns.len(),
            skipped,
            recommendations = out.len(),
            "analyzed batch in parallel"
        );
        Ok(out)
    }

    /// Full pipeline: batch analysis, cross-pattern de-duplication, ranking,
    /// then conflict filtering.
    pub fn recommend(&self, patterns: &[ClassifiedPattern]) -> Result<Vec<Recommendation>> {
        let all = self.analyze_all(patterns)?;
        let generated = all.len();

        let mut unique: Vec<Recommendation> = Vec::with_capacity(all.len());
        for rec in all {
            if !unique.iter().any(|kept| is_near_duplicate(kept, &rec)) {
                unique.push(rec);
            }
        }
        let deduplicated = unique.len();

        let ranked = if self.config.prefer_automatic {
            rank_preferring_automatic(unique)
        } else {
            rank(unique)
        };
        let filtered = filter_conflicts(ranked);

        info!(
            generated,
            deduplicated,
            kept = filtered.len(),
            "generated recommendations after de-duplication and conflict filtering"
        );
        Ok(filtered)
    }
}

impl Drop for RecommendationEngine {
    fn drop(&mut self) {
        let stats = self.stats();
        debug!(
            patterns = stats.patterns_analyzed,
            recommendations = stats.total_recommendations,
            "destroying recommendation engine"
        );
    }
}
