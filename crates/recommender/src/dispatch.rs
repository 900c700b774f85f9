//! Per-pattern dispatch: choose generators by antipattern, then post-process.

use crate::config::EngineConfig;
use crate::generators::{
    AlignmentGenerator, DataLayoutGenerator, Generator, LoopInterchangeGenerator,
    LoopUnrollGenerator, PrefetchGenerator, TilingGenerator, VectorizeGenerator,
};
use crate::hardware::HardwareModel;
use crate::pattern::{AccessPattern, Antipattern, ClassifiedPattern};
use crate::recommendation::Recommendation;
use tracing::{debug, warn};

/// Two recommendations of the same kind closer than this many lines in the
/// same file are treated as duplicates.
pub const DEDUP_LINE_WINDOW: u32 = 5;

/// Most recommendations any single pattern can produce, over every dispatch table.
pub const MAX_PER_PATTERN: usize = 5;

const CAPACITY_PRESSURE: &[&dyn Generator] = &[&TilingGenerator, &PrefetchGenerator];
const SHARED_LINES: &[&dyn Generator] = &[&AlignmentGenerator];
const SCATTERED_ACCESS: &[&dyn Generator] = &[&LoopUnrollGenerator, &DataLayoutGenerator];
const DEPENDENCY_CHAIN: &[&dyn Generator] = &[&LoopUnrollGenerator];
const STRIDED_FALLBACK: &[&dyn Generator] = &[&PrefetchGenerator];
const SEQUENTIAL_HINT: &[&dyn Generator] = &[&VectorizeGenerator];
const NESTED_HINT: &[&dyn Generator] = &[&LoopInterchangeGenerator];
const NONE: &[&dyn Generator] = &[];

/// Whether `candidate` repeats `existing`: same kind, same file, and lines
/// less than [`DEDUP_LINE_WINDOW`] apart.
pub fn is_near_duplicate(existing: &Recommendation, candidate: &Recommendation) -> bool {
    if existing.kind != candidate.kind {
        return false;
    }
    match (existing.location(), candidate.location()) {
        (Some(a), Some(b)) => a.file == b.file && a.line.abs_diff(b.line) < DEDUP_LINE_WINDOW,
        _ => false,
    }
}

/// Runs the generators for one pattern under a fixed config and hardware model.
pub struct Dispatcher<'a> {
    config: &'a EngineConfig,
    hardware: &'a HardwareModel,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a EngineConfig, hardware: &'a HardwareModel) -> Self {
        Self { config, hardware }
    }

    /// Generators to run for `pattern`, in dispatch order.
    pub fn generators_for(
        &self,
        pattern: &ClassifiedPattern,
    ) -> &'static [&'static dyn Generator] {
        match pattern.antipattern {
            Antipattern::Thrashing | Antipattern::StreamingEviction => CAPACITY_PRESSURE,
            Antipattern::FalseSharing => SHARED_LINES,
            Antipattern::IrregularGatherScatter | Antipattern::UncoalescedAccess => {
                SCATTERED_ACCESS
            }
            Antipattern::CacheLoopCarriedDep => DEPENDENCY_CHAIN,
            Antipattern::Other => match pattern.dominant_pattern() {
                Some(AccessPattern::Strided) => STRIDED_FALLBACK,
                Some(AccessPattern::Sequential) if self.config.access_pattern_hints => {
                    SEQUENTIAL_HINT
                }
                Some(AccessPattern::Nested) if self.config.access_pattern_hints => NESTED_HINT,
                _ => NONE,
            },
        }
    }

    /// Produce the recommendations for one pattern.
    ///
    /// Output keeps dispatch order, carries compiler flags when enabled, and
    /// contains only entries at or above the minimum expected improvement,
    /// at most `max_recommendations_per_pattern` of them.
    pub fn dispatch(&self, pattern: &ClassifiedPattern) -> Vec<Recommendation> {
        let generators = self.generators_for(pattern);
        let mut recs: Vec<Recommendation> = Vec::with_capacity(generators.len());

        for generator in generators {
            let Some(rec) = generator.generate(pattern, self.hardware) else {
                let reason = if pattern.hotspot.is_none() {
                    "no hotspot data"
                } else {
                    "declined"
                };
                debug!(
                    generator = generator.name(),
                    antipattern = %pattern.antipattern,
                    reason,
                    "generator skipped"
                );
                continue;
            };

            if let Err(e) = rec.validate() {
                warn!(
                    generator = generator.name(),
                    error = %e,
                    "discarding malformed recommendation"
                );
                continue;
            }
            if recs.iter().any(|existing| is_near_duplicate(existing, &rec)) {
                debug!(
                    generator = generator.name(),
                    kind = %rec.kind,
                    "dropping duplicate recommendation"
                );
                continue;
            }
            recs.push(rec);
        }

        for rec in recs.iter_mut() {
            if !self.config.generate_code_examples {
                rec.code_suggestion.clear();
            }
            if self.config.consider_compiler_flags {
                rec.compiler_flags = rec.kind.compiler_flags().to_string();
            }
        }

        let generated = recs.len();
        let min = self.config.min_expected_improvement_percent;
        recs.retain(|rec| rec.expected_improvement_percent >= min);
        recs.truncate(self.config.max_recommendations_per_pattern);

        debug!(
            antipattern = %pattern.antipattern,
            generated,
            kept = recs.len(),
            min_improvement = min,
            "dispatched pattern"
        );
        recs
    }
}
