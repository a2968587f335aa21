//! deadbind - find unused ZK ViewModel classes and methods
//!
//! Java ViewModels are bound to ZUL templates through annotations such as
//! `@Command` and `@Init` and through binding expressions in the markup. This
//! library builds one usage graph over both and reports what nothing reaches.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **File Discovery** - Find all .java and .zul files
//! 2. **Extraction** - Parse Java sources with tree-sitter into class models
//! 3. **Template Scanning** - Collect bindings, references and includes from ZUL
//! 4. **Graph Building** - Merge both sides into one usage graph
//! 5. **Reachability Analysis** - Close over the root set, derive unused code
//! 6. **Reporting** - Markdown, JSON or a terminal summary

pub mod analysis;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod report;

pub use analysis::{AnalysisResult, ReachabilityAnalyzer, RootSetDetector};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use discovery::FileFinder;
pub use error::{DeadbindError, Result};
pub use graph::{CallGraphBuilder, UsageGraph};
pub use pipeline::{AnalysisOutcome, Pipeline, UnitInput};
pub use report::{Report, ReportFormat, ReportGenerator, Reporter};
