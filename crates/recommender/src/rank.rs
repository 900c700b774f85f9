//! Composite scoring, priority buckets, and ordering.

use crate::recommendation::Recommendation;
use std::cmp::Ordering;

/// Score multiplier for recommendations the toolchain can apply unaided.
pub const AUTOMATIC_BONUS: f64 = 1.2;
/// Scores strictly above this land in priority 1.
pub const PRIORITY_1_SCORE: f64 = 50.0;
/// Scores strictly above this (and not above [`PRIORITY_1_SCORE`]) land in priority 2.
pub const PRIORITY_2_SCORE: f64 = 30.0;

/// `improvement * confidence * automatic bonus * ease`, with ease = `(11 - difficulty) / 10`.
pub fn score(rec: &Recommendation) -> f64 {
    let bonus = if rec.is_automatic { AUTOMATIC_BONUS } else { 1.0 };
    let ease = (11.0 - f64::from(rec.implementation_difficulty)) / 10.0;
    rec.expected_improvement_percent * rec.confidence * bonus * ease
}

pub fn priority_for_score(score: f64) -> u8 {
    if score > PRIORITY_1_SCORE {
        1
    } else if score > PRIORITY_2_SCORE {
        2
    } else {
        3
    }
}

/// Priority ascending, then expected improvement descending.
fn ranking_order(a: &Recommendation, b: &Recommendation) -> Ordering {
    a.priority.cmp(&b.priority).then_with(|| {
        b.expected_improvement_percent
            .total_cmp(&a.expected_improvement_percent)
    })
}

/// Re-bucket every recommendation by score and sort.
///
/// The sort is stable, so entries equal on both keys keep their input order.
pub fn rank(mut recs: Vec<Recommendation>) -> Vec<Recommendation> {
    for rec in recs.iter_mut() {
        rec.priority = priority_for_score(score(rec));
    }
    recs.sort_by(ranking_order);
    recs
}

/// [`rank`], with automatic recommendations first among otherwise equal entries.
pub fn rank_preferring_automatic(recs: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut recs = rank(recs);
    recs.sort_by(|a, b| ranking_order(a, b).then_with(|| b.is_automatic.cmp(&a.is_automatic)));
    recs
}

/// Whether `recs` is already in ranking order.
pub fn is_ranked(recs: &[Recommendation]) -> bool {
    recs.windows(2)
        .all(|pair| ranking_order(&pair[0], &pair[1]) != Ordering::Greater)
}
