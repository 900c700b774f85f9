//! Persisted report artifacts: a JSON bundle and a plain-text file report.

use crate::config::EngineConfig;
use crate::engine::{EngineStats, RecommendationEngine};
use crate::hardware::HardwareModel;
use crate::recommendation::Recommendation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

const LOCATION_SEPARATOR: &str = "========================================";

/// Everything needed to review a run after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    /// Hardware model the recommendations were sized for.
    pub hardware: HardwareModel,

    /// Engine configuration in effect.
    pub config: EngineConfig,

    /// Engine statistics at the time the report was taken.
    pub stats: EngineStats,

    /// Unix timestamp (seconds) of report creation.
    pub generated_at: u64,

    /// Recommendations in presentation order.
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationReport {
    /// Snapshot `engine` together with the list it produced.
    pub fn new(engine: &RecommendationEngine, recommendations: Vec<Recommendation>) -> Self {
        Self {
            hardware: engine.hardware().clone(),
            config: engine.config().clone(),
            stats: engine.stats(),
            generated_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            recommendations,
        }
    }

    /// Save report to JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load report from JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }
}

/// Plain-text file report. A separator line precedes each run of
/// recommendations that share a source location.
pub struct TextReport<'a>(pub &'a [Recommendation]);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cache Optimization Recommendations")?;
        writeln!(f, "==================================")?;
        writeln!(f)?;
        writeln!(f, "Total recommendations: {}", self.0.len())?;
        writeln!(f)?;

        let mut previous: Option<&Recommendation> = None;
        for (i, rec) in self.0.iter().enumerate() {
            let same_location = match (previous.and_then(|p| p.location()), rec.location()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };
            if !same_location {
                writeln!(f)?;
                writeln!(f, "{}", LOCATION_SEPARATOR)?;
                writeln!(f)?;
            }
            previous = Some(rec);

            writeln!(f, "Recommendation #{}", i + 1)?;
            writeln!(f, "-----------------")?;
            writeln!(f, "Type: {}", rec.kind)?;
            writeln!(f, "Priority: {}", rec.priority)?;
            writeln!(
                f,
                "Expected Improvement: {:.1}%",
                rec.expected_improvement_percent
            )?;
            writeln!(f, "Confidence: {:.0}%", rec.confidence * 100.0)?;
            writeln!(
                f,
                "Implementation Difficulty: {}/10",
                rec.implementation_difficulty
            )?;
            if let Some(location) = rec.location() {
                writeln!(f, "Location: {}", location)?;
            }

            write!(f, "\nRationale:\n{}\n", rec.rationale)?;
            if !rec.compiler_flags.is_empty() {
                write!(f, "\nCompiler Flags:\n{}\n", rec.compiler_flags)?;
            }
            if !rec.implementation_guide.is_empty() {
                write!(f, "\nImplementation Guide:\n{}\n", rec.implementation_guide)?;
            }
            if !rec.code_suggestion.is_empty() {
                write!(f, "\nCode Example:\n{}\n", rec.code_suggestion)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// [`TextReport`] as a string.
pub fn render_text_report(recs: &[Recommendation]) -> String {
    TextReport(recs).to_string()
}

/// Write [`render_text_report`] output to `path`.
pub fn write_text_report(
    recs: &[Recommendation],
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    std::fs::write(path, render_text_report(recs))?;
    info!(count = recs.len(), path = %path.display(), "saved text report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{AccessPattern, Antipattern, ClassifiedPattern, Hotspot, SourceLocation};

    fn patterns() -> Vec<ClassifiedPattern> {
        let at = |line| {
            Hotspot::new(SourceLocation::new("grid.c", line), AccessPattern::Strided, 0.6)
        };
        vec![
            ClassifiedPattern::new(Antipattern::Thrashing, at(10), 40),
            ClassifiedPattern::new(Antipattern::FalseSharing, at(80), 70),
        ]
    }

    #[test]
    fn test_text_report_groups_by_location() {
        let engine =
            RecommendationEngine::new(EngineConfig::default(), HardwareModel::typical_desktop())
                .unwrap();
        let recs = engine.analyze_all(&patterns()).unwrap();
        assert_eq!(recs.len(), 3);

        let text = render_text_report(&recs);
        assert!(text.starts_with("Cache Optimization Recommendations\n"));
        assert!(text.contains("Total recommendations: 3"));
        assert!(text.contains("Recommendation #3"));
        // grid.c:10 holds two entries, grid.c:80 one.
        assert_eq!(text.matches(LOCATION_SEPARATOR).count(), 2);
        assert!(text.contains("Type: MEMORY_ALIGNMENT"));
        assert!(text.contains("Location: grid.c:80"));
    }

    #[test]
    fn test_report_save_and_load() {
        let engine =
            RecommendationEngine::new(EngineConfig::strict(), HardwareModel::typical_desktop())
                .unwrap();
        let recs = engine.recommend(&patterns()).unwrap();
        let report = RecommendationReport::new(&engine, recs);
        assert_eq!(report.stats.patterns_analyzed, 2);

        let dir = std::env::temp_dir()
            .join(format!("cachesight-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");
        report.save(&path).unwrap();
        let loaded = RecommendationReport::load(&path).unwrap();
        assert_eq!(loaded, report);

        let text_path = dir.join("report.txt");
        write_text_report(&report.recommendations, &text_path).unwrap();
        let text = std::fs::read_to_string(&text_path).unwrap();
        let total = format!("Total recommendations: {}", report.recommendations.len());
        assert!(text.contains(&total));
        assert_eq!(text, TextReport(&report.recommendations).to_string());
        std::fs::remove_dir_all(&dir).ok();
    }
}
