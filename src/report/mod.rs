mod json;
mod markdown;
mod terminal;

pub use json::JsonReporter;
pub use markdown::MarkdownReporter;
pub use terminal::TerminalReporter;

use crate::analysis::AnalysisResult;
use crate::diagnostics::Diagnostic;
use crate::error::{DeadbindError, Result};
use crate::model::ProjectIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for ReportFormat {
    type Err = DeadbindError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            other => Err(DeadbindError::config(format!(
                "unknown report format `{}` (expected markdown or json)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedClass {
    pub qualified_name: String,
    pub path: PathBuf,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedMethod {
    pub name: String,
    pub line: usize,
    pub arity: usize,
}

/// Unused methods of one active ViewModel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodGroup {
    pub qualified_name: String,
    pub path: PathBuf,
    pub methods: Vec<UnusedMethod>,
}

/// Ordered findings of one run, ready to render
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub unused_classes: Vec<UnusedClass>,
    pub method_groups: Vec<MethodGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.unused_classes.is_empty() && self.method_groups.is_empty()
    }

    pub fn method_count(&self) -> usize {
        self.method_groups.iter().map(|g| g.methods.len()).sum()
    }
}

/// Turns an analysis result into a [`Report`] with a stable order
pub struct ReportGenerator<'a> {
    index: &'a ProjectIndex,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self { index }
    }

    pub fn generate(&self, result: &AnalysisResult, diagnostics: Vec<Diagnostic>) -> Report {
        let mut unused_classes: Vec<UnusedClass> = result
            .completely_unused
            .iter()
            .map(|&id| {
                let class = self.index.class(id);
                UnusedClass {
                    qualified_name: class.qualified_name.clone(),
                    path: class.path.clone(),
                    line: class.line,
                }
            })
            .collect();
        unused_classes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });

        let mut groups: BTreeMap<(PathBuf, String), Vec<UnusedMethod>> = BTreeMap::new();
        for &id in &result.unused_methods {
            let class = self.index.class(id.class);
            let method = self.index.method(id);
            groups
                .entry((class.path.clone(), class.qualified_name.clone()))
                .or_default()
                .push(UnusedMethod {
                    name: method.name.clone(),
                    line: method.line,
                    arity: method.arity,
                });
        }

        let method_groups = groups
            .into_iter()
            .filter(|(_, methods)| !methods.is_empty())
            .map(|((path, qualified_name), mut methods)| {
                methods.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
                MethodGroup {
                    qualified_name,
                    path,
                    methods,
                }
            })
            .collect();

        Report {
            unused_classes,
            method_groups,
            diagnostics,
        }
    }
}

/// Writes a rendered report to a file or to stdout
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
        }
    }

    pub fn render(&self, report: &Report) -> Result<String> {
        match self.format {
            ReportFormat::Markdown => Ok(MarkdownReporter::new().render(report)),
            ReportFormat::Json => JsonReporter::new().render(report),
        }
    }

    pub fn report(&self, report: &Report) -> Result<()> {
        let rendered = self.render(report)?;
        match &self.output_path {
            Some(path) => {
                std::fs::write(path, &rendered).map_err(|source| DeadbindError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!("Report written to {}", path.display());
            }
            None => print!("{}", rendered),
        }
        Ok(())
    }
}
