//! CLI wiring for the cachesight recommender.

use crate::config::EngineConfig;
use crate::engine::RecommendationEngine;
use crate::hardware::HardwareModel;
use crate::pattern::{AccessPattern, Antipattern, ClassifiedPattern, Hotspot, SourceLocation};
use crate::present;
use crate::report::{write_text_report, RecommendationReport};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "cachesight",
    about = "Cache optimization recommendations from classified access patterns"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend optimizations for a JSON list of classified patterns.
    Recommend {
        #[arg(long)]
        patterns: PathBuf,
        /// JSON list of cache levels; defaults to a typical desktop hierarchy.
        #[arg(long)]
        hardware: Option<PathBuf>,
        #[arg(long)]
        min_improvement: Option<f64>,
        #[arg(long)]
        max_per_pattern: Option<usize>,
        #[arg(long, default_value_t = false)]
        no_compiler_flags: bool,
        #[arg(long, default_value_t = false)]
        no_code: bool,
        /// Suggest vectorization / loop interchange for unclassified shapes.
        #[arg(long, default_value_t = false)]
        hints: bool,
        #[arg(long, default_value_t = false)]
        prefer_automatic: bool,
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run a handful of representative patterns against a typical desktop.
    Demo,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    match cli.command {
        Command::Recommend {
            patterns,
            hardware,
            min_improvement,
            max_per_pattern,
            no_compiler_flags,
            no_code,
            hints,
            prefer_automatic,
            json,
            report,
        } => {
            let mut config = EngineConfig::default();
            if let Some(min) = min_improvement {
                config.min_expected_improvement_percent = min;
            }
            if let Some(max) = max_per_pattern {
                config.max_recommendations_per_pattern = max;
            }
            config.consider_compiler_flags = !no_compiler_flags;
            config.generate_code_examples = !no_code;
            config.access_pattern_hints = hints;
            config.prefer_automatic = prefer_automatic;

            let hardware = match hardware {
                Some(path) => read_json::<HardwareModel>(&path)?,
                None => HardwareModel::typical_desktop(),
            };
            let patterns: Vec<ClassifiedPattern> = read_json(&patterns)?;
            info!(count = patterns.len(), "loaded patterns");

            let engine = RecommendationEngine::new(config, hardware)?;
            let recs = engine.recommend(&patterns)?;
            present::print(&recs);

            if let Some(path) = report {
                write_text_report(&recs, &path)?;
            }
            if let Some(path) = json {
                RecommendationReport::new(&engine, recs).save(&path)?;
                info!(path = %path.display(), "saved JSON report");
            }
        }
        Command::Demo => {
            let engine = RecommendationEngine::new(
                EngineConfig::default(),
                HardwareModel::typical_desktop(),
            )?;
            let recs = engine.recommend(&demo_patterns())?;
            present::print(&recs);

            let stats = engine.stats();
            println!("\n=== Engine Statistics ===");
            println!("Patterns analyzed: {}", stats.patterns_analyzed);
            println!("Recommendations generated: {}", stats.total_recommendations);
            println!(
                "Average expected improvement: {:.1}%",
                stats.average_expected_improvement
            );
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn demo_patterns() -> Vec<ClassifiedPattern> {
    let at = |line: u32, shape: AccessPattern, miss_rate: f64| {
        Hotspot::new(SourceLocation::new("demo/kernel.c", line), shape, miss_rate)
    };

    vec![
        ClassifiedPattern::new(
            Antipattern::Thrashing,
            at(42, AccessPattern::Strided, 0.6).with_address_range(0x10000, 0x10000 + 256 * 1024),
            40,
        ),
        ClassifiedPattern::new(Antipattern::FalseSharing, at(118, AccessPattern::Random, 0.3), 80)
            .with_affected_levels(0b11),
        ClassifiedPattern::new(
            Antipattern::IrregularGatherScatter,
            at(203, AccessPattern::GatherScatter, 0.5),
            60,
        ),
        ClassifiedPattern::new(
            Antipattern::CacheLoopCarriedDep,
            at(310, AccessPattern::LoopCarried, 0.25),
            35,
        ),
        ClassifiedPattern::new(Antipattern::Other, at(377, AccessPattern::Strided, 0.4), 20),
    ]
}
