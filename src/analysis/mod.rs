mod entry_points;
mod reachability;

pub use entry_points::RootSetDetector;
pub use reachability::{AnalysisResult, ReachabilityAnalyzer, ReachabilitySet};
