//! Engine configuration - the switches and thresholds a caller can turn.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Behaviour switches for a [`crate::RecommendationEngine`].
///
/// Fixed for the engine's lifetime once it is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Keep code examples in emitted recommendations.
    pub generate_code_examples: bool,
    /// Attach compiler-flag hints by optimization kind.
    pub consider_compiler_flags: bool,
    /// Break ranking ties in favour of automatic recommendations.
    pub prefer_automatic: bool,
    /// Upper bound on recommendations kept per pattern.
    pub max_recommendations_per_pattern: usize,
    /// Recommendations below this expected improvement are dropped.
    pub min_expected_improvement_percent: f64,
    /// Dispatch vectorize / interchange suggestions for `OTHER` patterns
    /// based on their dominant access shape.
    pub access_pattern_hints: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generate_code_examples: true,
            consider_compiler_flags: true,
            prefer_automatic: false,
            max_recommendations_per_pattern: 5,
            min_expected_improvement_percent: 10.0,
            access_pattern_hints: false,
        }
    }
}

impl EngineConfig {
    /// Only high-payoff suggestions, at most three per pattern.
    pub fn strict() -> Self {
        Self {
            max_recommendations_per_pattern: 3,
            min_expected_improvement_percent: 25.0,
            ..Default::default()
        }
    }

    /// Everything the engine knows how to suggest.
    pub fn exhaustive() -> Self {
        Self {
            max_recommendations_per_pattern: 8,
            min_expected_improvement_percent: 0.0,
            access_pattern_hints: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_recommendations_per_pattern == 0 {
            return Err(EngineError::invalid(
                "max_recommendations_per_pattern must be > 0",
            ));
        }
        if !self.min_expected_improvement_percent.is_finite()
            || self.min_expected_improvement_percent < 0.0
        {
            return Err(EngineError::invalid(format!(
                "min_expected_improvement_percent must be a non-negative number, got {}",
                self.min_expected_improvement_percent
            )));
        }
        Ok(())
    }
}
