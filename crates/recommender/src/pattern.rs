//! Classified access patterns consumed by the engine.
//!
//! These records are produced upstream by the pattern classifier. The engine
//! only reads them; a recommendation keeps its own copy of the pattern it was
//! derived from.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dominant shape of the memory accesses at a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessPattern {
    Sequential,
    Strided,
    Random,
    GatherScatter,
    Indirect,
    Nested,
    LoopCarried,
}

impl AccessPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPattern::Sequential => "SEQUENTIAL",
            AccessPattern::Strided => "STRIDED",
            AccessPattern::Random => "RANDOM",
            AccessPattern::GatherScatter => "GATHER_SCATTER",
            AccessPattern::Indirect => "INDIRECT",
            AccessPattern::Nested => "NESTED",
            AccessPattern::LoopCarried => "LOOP_CARRIED",
        }
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a hotspot is cache-unfriendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Antipattern {
    Thrashing,
    StreamingEviction,
    FalseSharing,
    IrregularGatherScatter,
    UncoalescedAccess,
    CacheLoopCarriedDep,
    Other,
}

impl Antipattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Antipattern::Thrashing => "THRASHING",
            Antipattern::StreamingEviction => "STREAMING_EVICTION",
            Antipattern::FalseSharing => "FALSE_SHARING",
            Antipattern::IrregularGatherScatter => "IRREGULAR_GATHER_SCATTER",
            Antipattern::UncoalescedAccess => "UNCOALESCED_ACCESS",
            Antipattern::CacheLoopCarriedDep => "CACHE_LOOP_CARRIED_DEP",
            Antipattern::Other => "OTHER",
        }
    }
}

impl fmt::Display for Antipattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A program location responsible for a large share of cache misses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub location: SourceLocation,
    pub dominant_pattern: AccessPattern,
    /// Fraction of accesses that miss, in `[0, 1]`.
    pub miss_rate: f64,
    #[serde(default)]
    pub address_range_start: u64,
    #[serde(default)]
    pub address_range_end: u64,
}

impl Hotspot {
    pub fn new(location: SourceLocation, dominant_pattern: AccessPattern, miss_rate: f64) -> Self {
        Self {
            location,
            dominant_pattern,
            miss_rate,
            address_range_start: 0,
            address_range_end: 0,
        }
    }

    pub fn with_address_range(mut self, start: u64, end: u64) -> Self {
        self.address_range_start = start;
        self.address_range_end = end;
        self
    }

    /// Bytes spanned by the sampled address range.
    pub fn working_set_bytes(&self) -> u64 {
        self.address_range_end.saturating_sub(self.address_range_start)
    }
}

/// Engine input: one classified antipattern at one hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedPattern {
    pub antipattern: Antipattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<Hotspot>,
    /// 0 (benign) to 100 (severe).
    pub severity_score: u8,
    /// Bit `i - 1` is set when cache level `i` is affected.
    #[serde(default)]
    pub affected_cache_levels: u32,
}

impl ClassifiedPattern {
    pub fn new(antipattern: Antipattern, hotspot: Hotspot, severity_score: u8) -> Self {
        Self {
            antipattern,
            hotspot: Some(hotspot),
            severity_score,
            affected_cache_levels: 0b1,
        }
    }

    /// Pattern with no hotspot attached. Generators that need hotspot data skip it.
    pub fn without_hotspot(antipattern: Antipattern, severity_score: u8) -> Self {
        Self {
            antipattern,
            hotspot: None,
            severity_score,
            affected_cache_levels: 0b1,
        }
    }

    pub fn with_affected_levels(mut self, mask: u32) -> Self {
        self.affected_cache_levels = mask;
        self
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.hotspot.as_ref().map(|h| &h.location)
    }

    pub fn dominant_pattern(&self) -> Option<AccessPattern> {
        self.hotspot.as_ref().map(|h| h.dominant_pattern)
    }

    pub fn is_level_affected(&self, level_index: u8) -> bool {
        level_index >= 1
            && level_index <= 32
            && self.affected_cache_levels & (1 << (level_index - 1)) != 0
    }

    /// Smallest affected cache level, defaulting to L1 when the mask is empty.
    pub fn lowest_affected_level(&self) -> u8 {
        if self.affected_cache_levels == 0 {
            return 1;
        }
        self.affected_cache_levels.trailing_zeros() as u8 + 1
    }

    /// Reject records the classifier should never have produced.
    pub fn validate(&self) -> Result<()> {
        if self.severity_score > 100 {
            return Err(EngineError::invalid(format!(
                "severity score {} is outside 0..=100",
                self.severity_score
            )));
        }
        if let Some(hotspot) = &self.hotspot {
            if hotspot.location.file.is_empty() {
                return Err(EngineError::invalid("hotspot has an empty source file"));
            }
            if !hotspot.miss_rate.is_finite() || !(0.0..=1.0).contains(&hotspot.miss_rate) {
                return Err(EngineError::invalid(format!(
                    "miss rate {} is outside [0, 1]",
                    hotspot.miss_rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot() -> Hotspot {
        Hotspot::new(SourceLocation::new("matmul.c", 42), AccessPattern::Strided, 0.6)
    }

    #[test]
    fn test_lowest_affected_level() {
        let pattern = ClassifiedPattern::new(Antipattern::Thrashing, hotspot(), 40);
        assert_eq!(pattern.lowest_affected_level(), 1);

        let pattern = pattern.with_affected_levels(0b110);
        assert_eq!(pattern.lowest_affected_level(), 2);
        assert!(pattern.is_level_affected(3));
        assert!(!pattern.is_level_affected(1));

        let pattern = pattern.with_affected_levels(0);
        assert_eq!(pattern.lowest_affected_level(), 1);
    }

    #[test]
    fn test_working_set() {
        let spot = hotspot().with_address_range(0x1000, 0x1000 + 256 * 1024);
        assert_eq!(spot.working_set_bytes(), 256 * 1024);

        let inverted = hotspot().with_address_range(0x2000, 0x1000);
        assert_eq!(inverted.working_set_bytes(), 0);
    }

    #[test]
    fn test_validate() {
        let pattern = ClassifiedPattern::new(Antipattern::Thrashing, hotspot(), 40);
        assert!(pattern.validate().is_ok());

        let mut bad = pattern.clone();
        bad.severity_score = 101;
        assert!(bad.validate().is_err());

        let mut bad = pattern.clone();
        bad.hotspot.as_mut().unwrap().miss_rate = 1.5;
        assert!(bad.validate().is_err());

        let mut bad = pattern;
        bad.hotspot.as_mut().unwrap().location.file.clear();
        assert!(bad.validate().is_err());

        assert!(ClassifiedPattern::without_hotspot(Antipattern::FalseSharing, 80)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(Antipattern::CacheLoopCarriedDep.to_string(), "CACHE_LOOP_CARRIED_DEP");
        assert_eq!(AccessPattern::GatherScatter.to_string(), "GATHER_SCATTER");
        let json = serde_json::to_string(&Antipattern::UncoalescedAccess).unwrap();
        assert_eq!(json, "\"UNCOALESCED_ACCESS\"");
    }
}
