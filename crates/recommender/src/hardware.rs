//! Cache hierarchy description of the target machine.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// One level of the cache hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheLevel {
    /// 1 for L1, 2 for L2, ...
    pub level_index: u8,
    pub size_bytes: usize,
    pub line_bytes: usize,
    pub associativity: usize,
}

impl CacheLevel {
    pub fn new(
        level_index: u8,
        size_bytes: usize,
        line_bytes: usize,
        associativity: usize,
    ) -> Self {
        Self {
            level_index,
            size_bytes,
            line_bytes,
            associativity,
        }
    }

    pub fn size_kib(&self) -> usize {
        self.size_bytes / 1024
    }
}

/// Ordered cache levels, L1 first.
///
/// Sizes are non-decreasing from one level to the next and level indices run
/// 1..=N without gaps. Both are checked in [`HardwareModel::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CacheLevel>", into = "Vec<CacheLevel>")]
pub struct HardwareModel {
    levels: Vec<CacheLevel>,
}

impl HardwareModel {
    pub fn new(levels: Vec<CacheLevel>) -> Result<Self> {
        if levels.is_empty() {
            return Err(EngineError::invalid("hardware model has no cache levels"));
        }

        for (position, level) in levels.iter().enumerate() {
            let expected = position + 1;
            if usize::from(level.level_index) != expected {
                return Err(EngineError::invalid(format!(
                    "cache level at position {} has index {}, expected {}",
                    position, level.level_index, expected
                )));
            }
            if level.size_bytes == 0 || level.line_bytes == 0 {
                return Err(EngineError::invalid(format!(
                    "L{} cache must have non-zero size and line size",
                    level.level_index
                )));
            }
        }

        if let Some(pair) = levels
            .windows(2)
            .find(|pair| pair[1].size_bytes < pair[0].size_bytes)
        {
            return Err(EngineError::invalid(format!(
                "L{} ({} bytes) is smaller than L{} ({} bytes)",
                pair[1].level_index, pair[1].size_bytes, pair[0].level_index, pair[0].size_bytes
            )));
        }

        Ok(Self { levels })
    }

    /// Two-level hierarchy, the shape most tests and demos use.
    pub fn two_level(l1_bytes: usize, l2_bytes: usize) -> Result<Self> {
        Self::new(vec![
            CacheLevel::new(1, l1_bytes, 64, 8),
            CacheLevel::new(2, l2_bytes, 64, 8),
        ])
    }

    /// 32 KiB L1, 512 KiB L2, 16 MiB L3, 64-byte lines.
    pub fn typical_desktop() -> Self {
        Self {
            levels: vec![
                CacheLevel::new(1, 32 * 1024, 64, 8),
                CacheLevel::new(2, 512 * 1024, 64, 8),
                CacheLevel::new(3, 16 * 1024 * 1024, 64, 16),
            ],
        }
    }

    pub fn levels(&self) -> &[CacheLevel] {
        &self.levels
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Look up a level by its 1-based index.
    pub fn level(&self, level_index: u8) -> Option<&CacheLevel> {
        self.levels
            .iter()
            .find(|level| level.level_index == level_index)
    }

    pub fn l1(&self) -> &CacheLevel {
        &self.levels[0]
    }

    /// L2 if present, otherwise the last-level cache.
    pub fn l2_or_last(&self) -> &CacheLevel {
        self.level(2).unwrap_or_else(|| self.last_level())
    }

    pub fn last_level(&self) -> &CacheLevel {
        &self.levels[self.levels.len() - 1]
    }

    pub fn line_bytes(&self) -> usize {
        self.l1().line_bytes
    }
}

impl TryFrom<Vec<CacheLevel>> for HardwareModel {
    type Error = EngineError;

    fn try_from(levels: Vec<CacheLevel>) -> Result<Self> {
        Self::new(levels)
    }
}

impl From<HardwareModel> for Vec<CacheLevel> {
    fn from(model: HardwareModel) -> Self {
        model.levels
    }
}

impl Default for HardwareModel {
    fn default() -> Self {
        Self::typical_desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typical_desktop_is_valid() {
        let model = HardwareModel::typical_desktop();
        assert!(HardwareModel::new(model.levels().to_vec()).is_ok());
        assert_eq!(model.depth(), 3);
        assert_eq!(model.l1().size_kib(), 32);
        assert_eq!(model.l2_or_last().level_index, 2);
    }

    #[test]
    fn test_rejects_shrinking_levels() {
        let result = HardwareModel::new(vec![
            CacheLevel::new(1, 64 * 1024, 64, 8),
            CacheLevel::new(2, 32 * 1024, 64, 8),
        ]);
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_rejects_empty_and_misnumbered() {
        assert!(HardwareModel::new(Vec::new()).is_err());
        let result = HardwareModel::new(vec![CacheLevel::new(2, 32 * 1024, 64, 8)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_single_level_falls_back_to_last() {
        let model = HardwareModel::new(vec![CacheLevel::new(1, 32 * 1024, 64, 8)]).unwrap();
        assert_eq!(model.l2_or_last().level_index, 1);
        assert!(model.level(2).is_none());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[{"level_index":1,"size_bytes":65536,"line_bytes":64,"associativity":8},
                      {"level_index":2,"size_bytes":1024,"line_bytes":64,"associativity":8}]"#;
        assert!(serde_json::from_str::<HardwareModel>(json).is_err());

        let model = HardwareModel::two_level(32 * 1024, 512 * 1024).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let parsed: HardwareModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, parsed);
    }
}
