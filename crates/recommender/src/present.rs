//! Human-readable rendering of recommendation lists.

use crate::recommendation::Recommendation;
use std::fmt;

const SEPARATOR: &str = "----------------------------------------";

/// Numbered text listing of recommendations in list order.
pub struct Listing<'a>(pub &'a [Recommendation]);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Optimization Recommendations ===")?;
        writeln!(f, "Found {} optimization opportunities:", self.0.len())?;
        writeln!(f)?;

        for (i, rec) in self.0.iter().enumerate() {
            writeln!(f, "[{}] {} (Priority: {})", i + 1, rec.kind, rec.priority)?;
            writeln!(
                f,
                "    Expected improvement: {:.1}%",
                rec.expected_improvement_percent
            )?;
            writeln!(f, "    Confidence: {:.0}%", rec.confidence * 100.0)?;
            writeln!(f, "    Difficulty: {}/10", rec.implementation_difficulty)?;
            if rec.is_automatic {
                writeln!(f, "    Automatic: yes")?;
            }
            if let Some(location) = rec.location() {
                writeln!(f, "    Location: {}", location)?;
            }
            writeln!(f)?;
            writeln!(f, "    Rationale: {}", rec.rationale)?;

            if !rec.compiler_flags.is_empty() {
                writeln!(f, "    Compiler flags: {}", rec.compiler_flags)?;
            }
            if !rec.implementation_guide.is_empty() {
                writeln!(f)?;
                writeln!(f, "    Implementation guide:")?;
                for line in rec.implementation_guide.lines() {
                    writeln!(f, "      {}", line)?;
                }
            }
            if !rec.code_suggestion.is_empty() {
                writeln!(f)?;
                writeln!(f, "    Code example:")?;
                for line in rec.code_suggestion.lines() {
                    writeln!(f, "      {}", line)?;
                }
            }
            writeln!(f, "{}", SEPARATOR)?;
        }
        Ok(())
    }
}

/// Render `recs` in list order as a numbered text block.
pub fn render(recs: &[Recommendation]) -> String {
    Listing(recs).to_string()
}

/// Print `recs` to stdout.
pub fn print(recs: &[Recommendation]) {
    print!("{}", Listing(recs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{AccessPattern, Antipattern, ClassifiedPattern, Hotspot, SourceLocation};
    use crate::recommendation::OptimizationKind;

    #[test]
    fn test_render_empty() {
        let text = render(&[]);
        assert!(text.starts_with("=== Optimization Recommendations ==="));
        assert!(text.contains("Found 0 optimization opportunities:"));
        assert!(!text.contains("[1]"));
    }

    #[test]
    fn test_render_fields() {
        let location = SourceLocation::new("matmul.c", 42);
        let hotspot = Hotspot::new(location, AccessPattern::Strided, 0.6);
        let pattern = ClassifiedPattern::new(Antipattern::Thrashing, hotspot, 40);
        let mut rec = Recommendation::new(OptimizationKind::LoopTiling, &pattern);
        rec.expected_improvement_percent = 60.0;
        rec.confidence = 0.85;
        rec.implementation_difficulty = 6;
        rec.priority = 1;
        rec.rationale = "tile it".into();
        rec.implementation_guide = "1. step one\n2. step two".into();
        rec.compiler_flags = "-floop-block".into();

        let text = render(&[rec]);
        assert!(text.contains("[1] LOOP_TILING (Priority: 1)"));
        assert!(text.contains("Expected improvement: 60.0%"));
        assert!(text.contains("Confidence: 85%"));
        assert!(text.contains("Difficulty: 6/10"));
        assert!(text.contains("Location: matmul.c:42"));
        assert!(text.contains("Compiler flags: -floop-block"));
        assert!(text.contains("      2. step two"));
        assert!(!text.contains("Code example:"));
        assert!(text.ends_with(&format!("{}\n", SEPARATOR)));
    }

    #[test]
    fn test_listing_display_matches_render() {
        let pattern = ClassifiedPattern::without_hotspot(Antipattern::FalseSharing, 80);
        let mut rec = Recommendation::new(OptimizationKind::MemoryAlignment, &pattern);
        rec.is_automatic = true;
        rec.code_suggestion = "alignas(64) int x;".into();

        let recs = [rec];
        let out = format!("{}", Listing(&recs));
        assert_eq!(out, render(&recs));
        assert!(out.contains("    Automatic: yes"));
        assert!(out.contains("      alignas(64) int x;"));
        assert!(!out.contains("Location:"));
    }
}
