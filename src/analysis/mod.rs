//! Pure analyses over data gathered by checks.

pub mod cross_node;

pub use cross_node::{CrossNodeAnalysis, CrossNodeIndexAnalyzer, IndexUsage, UnusedIndex};
