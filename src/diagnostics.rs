//! Non-fatal findings collected while extracting, scanning and building the graph.
//!
//! Diagnostics degrade precision but never abort a run. They are reported next
//! to the results so a user can judge how much to trust them.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A source or template unit could not be parsed and was skipped
    ParseError,
    /// An edge endpoint could not be matched to a known node and was dropped
    UnresolvedReference,
    /// A superclass name matched several classes and was left unresolved
    AmbiguousSuperclass,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseError => "parse error",
            DiagnosticKind::UnresolvedReference => "unresolved reference",
            DiagnosticKind::AmbiguousSuperclass => "ambiguous superclass",
        }
    }
}

// Field order drives the derived ordering: path, line, kind, message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Diagnostic {
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            path: None,
            line: None,
            kind,
            message: message.into(),
        }
    }

    pub fn parse_error(path: &Path, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::ParseError, message).at(path, None)
    }

    pub fn unresolved(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::UnresolvedReference, message).at(path, Some(line))
    }

    pub fn at(mut self, path: &Path, line: Option<usize>) -> Self {
        self.path = Some(path.to_path_buf());
        self.line = line;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, " at {}:{}", path.display(), line)?,
            (Some(path), None) => write!(f, " at {}", path.display())?,
            _ => {}
        }
        write!(f, ": {}", self.message)
    }
}

/// Collector threaded through the pipeline stages
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Sorted and deduplicated, so repeated runs print identical output
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort();
        self.items.dedup();
        self.items
    }
}
