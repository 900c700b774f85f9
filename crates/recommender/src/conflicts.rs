//! Removal of mutually exclusive recommendations.

use crate::pattern::AccessPattern;
use crate::recommendation::{OptimizationKind, Recommendation};
use std::cmp::Ordering;
use tracing::debug;

fn same_location(a: &Recommendation, b: &Recommendation) -> bool {
    match (a.location(), b.location()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Whether `a` and `b` cannot both be applied to the same target.
///
/// Only recommendations at the same `(file, line)` can conflict:
/// - loop tiling and loop unrolling rewrite the same loop nest incompatibly;
/// - a target gets at most one data-layout change;
/// - a target cannot be both `SEQUENTIAL` and `GATHER_SCATTER`.
pub fn conflicts(a: &Recommendation, b: &Recommendation) -> bool {
    if !same_location(a, b) {
        return false;
    }

    use OptimizationKind::*;
    let kinds_conflict = matches!(
        (a.kind, b.kind),
        (LoopTiling, LoopUnroll) | (LoopUnroll, LoopTiling) | (DataLayoutChange, DataLayoutChange)
    );

    let shapes_conflict = matches!(
        (a.source_pattern.dominant_pattern(), b.source_pattern.dominant_pattern()),
        (Some(AccessPattern::Sequential), Some(AccessPattern::GatherScatter))
            | (Some(AccessPattern::GatherScatter), Some(AccessPattern::Sequential))
    );

    kinds_conflict || shapes_conflict
}

/// `Less` when `a` should be kept over `b`: better priority, then higher improvement.
/// `Equal` keeps the earlier entry.
fn preference(a: &Recommendation, b: &Recommendation) -> Ordering {
    a.priority.cmp(&b.priority).then_with(|| {
        b.expected_improvement_percent
            .total_cmp(&a.expected_improvement_percent)
    })
}

/// Drop the weaker member of every conflicting pair, preserving relative order.
///
/// The result contains no conflicting pair, so filtering twice is the same as
/// filtering once.
pub fn filter_conflicts(recs: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut removed = vec![false; recs.len()];

    for i in 0..recs.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..recs.len() {
            if removed[j] || !conflicts(&recs[i], &recs[j]) {
                continue;
            }
            let (winner, loser) = if preference(&recs[j], &recs[i]) == Ordering::Less {
                (j, i)
            } else {
                (i, j)
            };
            debug!(
                kept = %recs[winner].kind,
                dropped = %recs[loser].kind,
                "conflicting recommendations"
            );
            removed[loser] = true;
            if loser == i {
                break;
            }
        }
    }

    recs.into_iter()
        .zip(removed)
        .filter_map(|(rec, gone)| (!gone).then_some(rec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Antipattern, ClassifiedPattern, Hotspot, SourceLocation};

    fn rec_at(
        kind: OptimizationKind,
        line: u32,
        shape: AccessPattern,
        priority: u8,
        improvement: f64,
    ) -> Recommendation {
        let hotspot = Hotspot::new(SourceLocation::new("solver.c", line), shape, 0.4);
        let pattern = ClassifiedPattern::new(Antipattern::Thrashing, hotspot, 50);
        let mut rec = Recommendation::new(kind, &pattern);
        rec.priority = priority;
        rec.expected_improvement_percent = improvement;
        rec
    }

    #[test]
    fn test_tiling_beats_unroll() {
        let tiling = rec_at(OptimizationKind::LoopTiling, 7, AccessPattern::Strided, 1, 60.0);
        let unroll = rec_at(OptimizationKind::LoopUnroll, 7, AccessPattern::Strided, 2, 25.0);
        let kept = filter_conflicts(vec![unroll, tiling]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, OptimizationKind::LoopTiling);
    }

    #[test]
    fn test_one_layout_change_per_target() {
        let layout = |improvement| {
            rec_at(OptimizationKind::DataLayoutChange, 3, AccessPattern::Random, 1, improvement)
        };
        let weaker = layout(40.0);
        let stronger = layout(50.0);
        let kept = filter_conflicts(vec![weaker, stronger]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].expected_improvement_percent, 50.0);
    }

    #[test]
    fn test_contradictory_shapes() {
        let prefetch = |shape, improvement| {
            rec_at(OptimizationKind::PrefetchHints, 9, shape, 2, improvement)
        };
        let seq = prefetch(AccessPattern::Sequential, 20.0);
        let gather = prefetch(AccessPattern::GatherScatter, 30.0);
        let kept = filter_conflicts(vec![seq, gather]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source_pattern.dominant_pattern(), Some(AccessPattern::GatherScatter));
    }

    #[test]
    fn test_different_locations_do_not_conflict() {
        let tiling = rec_at(OptimizationKind::LoopTiling, 7, AccessPattern::Strided, 1, 60.0);
        let unroll = rec_at(OptimizationKind::LoopUnroll, 8, AccessPattern::Strided, 2, 25.0);
        let kept = filter_conflicts(vec![tiling, unroll]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_full_tie_keeps_earlier_and_order_is_preserved() {
        let a = rec_at(OptimizationKind::DataLayoutChange, 1, AccessPattern::Random, 1, 50.0);
        let mut b = a.clone();
        b.rationale = "later".into();
        let other = rec_at(OptimizationKind::PrefetchHints, 40, AccessPattern::Strided, 2, 20.0);

        let kept = filter_conflicts(vec![a, other.clone(), b]);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].rationale.is_empty());
        assert_eq!(kept[1], other);
        assert_eq!(filter_conflicts(kept.clone()), kept);
    }
}
