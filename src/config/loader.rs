use crate::error::{DeadbindError, Result};
use crate::model::AnnotationKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration for a deadbind analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which Java files to analyze
    pub sources: FileFilter,

    /// Which ZUL templates to scan
    pub templates: FileFilter,

    /// Annotation names recognized for each binding kind
    pub annotations: AnnotationConfig,

    /// Class name suffixes that mark a class as a ViewModel
    pub viewmodel_suffixes: Vec<String>,

    /// Patterns to retain - never report as unused (`Class.method`, `method`, `*Suffix`)
    #[serde(alias = "retain")]
    pub retain_patterns: Vec<String>,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilter {
    /// Gitignore-style globs; empty means everything under the project root
    pub include: Vec<String>,

    /// Gitignore-style globs excluded from the walk
    pub exclude: Vec<String>,

    /// File extensions, without the dot
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Lifecycle annotations, always roots
    pub init: Vec<String>,

    /// Commands bound from the owning ViewModel's template
    pub command: Vec<String>,

    /// Commands broadcast across composed templates, always roots
    pub global_command: Vec<String>,

    /// Property change notifications
    pub notify_change: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: markdown, json
    pub format: String,

    /// Report file path
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: FileFilter::with_extensions(&["java"]),
            templates: FileFilter::with_extensions(&["zul"]),
            annotations: AnnotationConfig::default(),
            viewmodel_suffixes: vec!["ViewModel".to_string()],
            retain_patterns: vec![],
            report: ReportConfig::default(),
        }
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::with_extensions(&[])
    }
}

impl FileFilter {
    fn with_extensions(extensions: &[&str]) -> Self {
        Self {
            include: vec![],
            exclude: vec![
                "**/build/**".to_string(),
                "**/target/**".to_string(),
                "**/.idea/**".to_string(),
            ],
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            init: vec!["Init".into(), "AfterCompose".into(), "Destroy".into()],
            command: vec!["Command".into()],
            global_command: vec![
                "GlobalCommand".into(),
                "DefaultCommand".into(),
                "DefaultGlobalCommand".into(),
            ],
            notify_change: vec!["NotifyChange".into()],
        }
    }
}

impl AnnotationConfig {
    /// Kind for an annotation name; qualified names are matched by their last segment
    pub fn kind_of(&self, name: &str) -> Option<AnnotationKind> {
        let simple = name.trim_start_matches('@');
        let simple = simple.rsplit('.').next().unwrap_or(simple);

        let lists = [
            (&self.init, AnnotationKind::Init),
            (&self.command, AnnotationKind::Command),
            (&self.global_command, AnnotationKind::GlobalCommand),
            (&self.notify_change, AnnotationKind::NotifyChange),
        ];
        for (names, kind) in lists {
            if names.iter().any(|n| n == simple || n.rsplit('.').next() == Some(simple)) {
                return Some(kind);
            }
        }
        if simple == "Override" {
            return Some(AnnotationKind::Override);
        }
        None
    }

    pub fn validate(&self) -> Result<()> {
        if self.init.is_empty() {
            return Err(DeadbindError::config("annotations.init must name at least one annotation"));
        }
        if self.command.is_empty() {
            return Err(DeadbindError::config("annotations.command must name at least one annotation"));
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        let lists = [
            ("init", &self.init),
            ("command", &self.command),
            ("global_command", &self.global_command),
            ("notify_change", &self.notify_change),
        ];
        for (kind, names) in lists {
            for name in names {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(DeadbindError::config(format!("annotations.{} contains an empty name", kind)));
                }
                if trimmed == "Override" {
                    return Err(DeadbindError::config("`Override` cannot be mapped to a binding kind"));
                }
                if let Some(previous) = seen.insert(trimmed, kind) {
                    if previous != kind {
                        return Err(DeadbindError::config(format!(
                            "annotation `{}` is mapped to both {} and {}",
                            trimmed, previous, kind
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "markdown".to_string(),
            output: PathBuf::from("unused_viewmodel_report.md"),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DeadbindError::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| DeadbindError::config(format!("failed to parse YAML config: {}", e)))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| DeadbindError::config(format!("failed to parse TOML config: {}", e)))?,
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    config
                } else {
                    toml::from_str(&contents)
                        .map_err(|e| DeadbindError::config(format!("failed to parse config file: {}", e)))?
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".deadbind.yml",
            ".deadbind.yaml",
            ".deadbind.toml",
            "deadbind.yml",
            "deadbind.yaml",
            "deadbind.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        self.annotations.validate()?;
        if self.sources.extensions.is_empty() {
            return Err(DeadbindError::config("sources.extensions must not be empty"));
        }
        if self.templates.extensions.is_empty() {
            return Err(DeadbindError::config("templates.extensions must not be empty"));
        }
        match self.report.format.as_str() {
            "markdown" | "json" => Ok(()),
            other => Err(DeadbindError::config(format!("unknown report format `{}`", other))),
        }
    }

    /// Check if a class name ends with one of the ViewModel suffixes
    pub fn is_viewmodel_name(&self, simple_name: &str) -> bool {
        self.viewmodel_suffixes
            .iter()
            .any(|suffix| simple_name.ends_with(suffix.as_str()))
    }

    /// Check if a method should be retained
    pub fn should_retain(&self, class_name: &str, qualified_class: &str, method: &str) -> bool {
        let simple_target = format!("{}.{}", class_name, method);
        let qualified_target = format!("{}.{}", qualified_class, method);
        self.retain_patterns.iter().any(|p| {
            glob_match(p, method) || glob_match(p, &simple_target) || glob_match(p, &qualified_target)
        })
    }
}

/// Simple glob matching for name patterns like "*Command" or "OrderViewModel.*"
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if let Some(middle) = suffix.strip_suffix('*') {
            return text.contains(middle);
        }
        return text.ends_with(suffix);
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return text.starts_with(prefix);
    }

    text == pattern
}
