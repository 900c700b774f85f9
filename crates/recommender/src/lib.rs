//! Cache Optimization Recommendation Engine
//!
//! Turns classified memory-access antipatterns into concrete, ranked and
//! de-conflicted optimization recommendations sized for a given cache hierarchy.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────┐     ┌────────────┐
//! │ ClassifiedPattern│────▶│  Dispatcher  │────▶│  Ranker  │────▶│  Conflict  │
//! │  + HardwareModel │     │ (generators) │     │ (score)  │     │  filter    │
//! └──────────────────┘     └──────────────┘     └──────────┘     └────────────┘
//!                                                                      │
//!                                                                      ▼
//!                                                         presenter / reports
//! ```
//!
//! # Key Components
//!
//! - [`engine::RecommendationEngine`]: Validated config + hardware, mutex-guarded statistics
//! - [`generators::Generator`]: Trait for turning a pattern into one recommendation
//! - [`dispatch::Dispatcher`]: Antipattern → generator table, dedup and filtering
//! - [`rank::rank`]: Composite score, priority buckets and stable ordering
//! - [`conflicts::filter_conflicts`]: Removes mutually exclusive recommendations
//! - [`present::Listing`]: Human-readable listing

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conflicts;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod generators;
pub mod hardware;
pub mod pattern;
pub mod present;
pub mod rank;
pub mod recommendation;
pub mod report;

#[cfg(feature = "cli")]
pub use cli::{run_cli, Cli, Command};
pub use config::EngineConfig;
pub use conflicts::{conflicts, filter_conflicts};
pub use engine::{EngineStats, RecommendationEngine};
pub use error::{EngineError, Result};
pub use generators::Generator;
pub use hardware::{CacheLevel, HardwareModel};
pub use pattern::{AccessPattern, Antipattern, ClassifiedPattern, Hotspot, SourceLocation};
pub use rank::rank;
pub use recommendation::{OptimizationKind, Recommendation};
pub use report::{write_text_report, RecommendationReport};
