//! Recommendation record - the uniform output of every generator.

use crate::error::{EngineError, Result};
use crate::pattern::{ClassifiedPattern, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of optimization being suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationKind {
    LoopTiling,
    PrefetchHints,
    DataLayoutChange,
    MemoryAlignment,
    LoopUnroll,
    LoopInterchange,
    Vectorize,
}

impl OptimizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationKind::LoopTiling => "LOOP_TILING",
            OptimizationKind::PrefetchHints => "PREFETCH_HINTS",
            OptimizationKind::DataLayoutChange => "DATA_LAYOUT_CHANGE",
            OptimizationKind::MemoryAlignment => "MEMORY_ALIGNMENT",
            OptimizationKind::LoopUnroll => "LOOP_UNROLL",
            OptimizationKind::LoopInterchange => "LOOP_INTERCHANGE",
            OptimizationKind::Vectorize => "VECTORIZE",
        }
    }

    /// Compiler flags that let the toolchain attempt this transformation itself.
    pub fn compiler_flags(&self) -> &'static str {
        match self {
            OptimizationKind::LoopTiling => "-floop-block -floop-interchange",
            OptimizationKind::PrefetchHints => "-fprefetch-loop-arrays",
            OptimizationKind::Vectorize => "-ftree-vectorize -mavx2",
            _ => "-O3 -march=native",
        }
    }
}

impl fmt::Display for OptimizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured optimization suggestion.
///
/// `source_pattern` is an owned copy of the pattern the suggestion was derived
/// from, so a recommendation stays readable after the input batch is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: OptimizationKind,
    pub source_pattern: ClassifiedPattern,
    pub expected_improvement_percent: f64,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// 1 (trivial) to 10 (major rewrite).
    pub implementation_difficulty: u8,
    /// 1 (highest) to 3 (lowest).
    pub priority: u8,
    pub is_automatic: bool,
    pub code_suggestion: String,
    pub implementation_guide: String,
    pub rationale: String,
    #[serde(default)]
    pub compiler_flags: String,
}

impl Recommendation {
    /// Start a recommendation of `kind` for `pattern`; generators fill in the rest.
    pub fn new(kind: OptimizationKind, pattern: &ClassifiedPattern) -> Self {
        Self {
            kind,
            source_pattern: pattern.clone(),
            expected_improvement_percent: 0.0,
            confidence: 0.0,
            implementation_difficulty: 1,
            priority: 3,
            is_automatic: false,
            code_suggestion: String::new(),
            implementation_guide: String::new(),
            rationale: String::new(),
            compiler_flags: String::new(),
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.source_pattern.location()
    }

    /// Check the record-level bounds every emitted recommendation must satisfy.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.priority) {
            return Err(EngineError::invalid(format!(
                "{} priority {} outside 1..=3",
                self.kind, self.priority
            )));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(EngineError::invalid(format!(
                "{} confidence {} outside [0, 1]",
                self.kind, self.confidence
            )));
        }
        if !(1..=10).contains(&self.implementation_difficulty) {
            return Err(EngineError::invalid(format!(
                "{} difficulty {} outside 1..=10",
                self.kind, self.implementation_difficulty
            )));
        }
        let improvement = self.expected_improvement_percent;
        if !improvement.is_finite() || improvement < 0.0 {
            return Err(EngineError::invalid(format!(
                "{} expected improvement {} is negative",
                self.kind, improvement
            )));
        }
        Ok(())
    }
}
