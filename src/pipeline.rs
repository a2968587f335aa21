//! Wires extraction, scanning, graph construction, reachability and reporting.
//!
//! Per-unit work is pure, so it runs either sequentially behind a progress bar
//! or on rayon's pool. Both modes keep input order, which keeps diagnostics and
//! class ids identical between them.

use crate::analysis::{AnalysisResult, ReachabilityAnalyzer};
use crate::config::Config;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::discovery::{FileFinder, FileType, SourceFile};
use crate::error::{DeadbindError, Result};
use crate::graph::{CallGraphBuilder, UsageGraph};
use crate::model::{ClassModel, ProjectIndex, TemplateUnit};
use crate::parser::{JavaParser, Parser, ZulParser};
use crate::report::{Report, ReportGenerator};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// One source or template text with the path it is reported under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitInput {
    pub path: PathBuf,
    pub contents: String,
}

impl UnitInput {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Everything one run produces
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub index: ProjectIndex,
    pub graph: UsageGraph,
    pub result: AnalysisResult,

    /// Findings plus sorted diagnostics
    pub report: Report,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    parallel: bool,
    progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            parallel: false,
            progress: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Show a progress bar while extracting sequentially
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Discover, read and analyze every input under `root`
    pub fn analyze_project(&self, root: &Path) -> Result<AnalysisOutcome> {
        let files = FileFinder::new(self.config).find_files(root)?;
        if !files.iter().any(|f| f.file_type == FileType::Java) {
            return Err(DeadbindError::NoInput {
                root: root.to_path_buf(),
            });
        }

        let mut diagnostics = Diagnostics::new();
        let mut sources = Vec::new();
        let mut templates = Vec::new();
        for file in &files {
            match read_unit(file) {
                Ok(unit) if file.file_type == FileType::Java => sources.push(unit),
                Ok(unit) => templates.push(unit),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
        info!(
            "Found {} source files and {} templates",
            sources.len(),
            templates.len()
        );

        Ok(self.run_with(&sources, &templates, diagnostics))
    }

    /// Analyze already-read inputs
    pub fn run(&self, sources: &[UnitInput], templates: &[UnitInput]) -> AnalysisOutcome {
        self.run_with(sources, templates, Diagnostics::new())
    }

    fn run_with(
        &self,
        sources: &[UnitInput],
        templates: &[UnitInput],
        mut diagnostics: Diagnostics,
    ) -> AnalysisOutcome {
        let start = Instant::now();

        let java = JavaParser::new(self.config.annotations.clone());
        let classes: Vec<ClassModel> = self
            .extract(&java, sources, &mut diagnostics)
            .into_iter()
            .flatten()
            .collect();
        let units: Vec<TemplateUnit> = self.extract(&ZulParser::new(), templates, &mut diagnostics);
        info!(
            "Extracted {} classes and {} templates in {:.2}s",
            classes.len(),
            units.len(),
            start.elapsed().as_secs_f64()
        );

        let index = ProjectIndex::build(classes, &mut diagnostics);
        info!(
            "Indexed {} classes, {} methods",
            index.class_count(),
            index.method_count()
        );

        let graph = CallGraphBuilder::new(&index, &units).build(&mut diagnostics);
        let result = ReachabilityAnalyzer::new(self.config, &index).analyze(&graph);
        let report = ReportGenerator::new(&index).generate(&result, diagnostics.into_sorted());

        AnalysisOutcome {
            index,
            graph,
            result,
            report,
        }
    }

    /// Parse every unit; failed units become diagnostics and are skipped
    fn extract<P>(&self, parser: &P, units: &[UnitInput], diagnostics: &mut Diagnostics) -> Vec<P::Output>
    where
        P: Parser,
        P::Output: Send,
    {
        let parse = |unit: &UnitInput| {
            debug!("Parsing {}", unit.path.display());
            parser.parse(&unit.path, &unit.contents)
        };

        let results: Vec<_> = if self.parallel {
            units.par_iter().map(parse).collect()
        } else {
            let pb = if self.progress {
                ProgressBar::new(units.len() as u64)
            } else {
                ProgressBar::hidden()
            };
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            let results: Vec<_> = units
                .iter()
                .map(|unit| {
                    let result = parse(unit);
                    pb.inc(1);
                    result
                })
                .collect();
            pb.finish_and_clear();
            results
        };

        let mut outputs = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
        outputs
    }
}

fn read_unit(file: &SourceFile) -> std::result::Result<UnitInput, Diagnostic> {
    file.read_contents()
        .map(|contents| UnitInput::new(file.relative.clone(), contents))
        .map_err(|e| Diagnostic::parse_error(&file.relative, format!("cannot read file: {}", e)))
}
