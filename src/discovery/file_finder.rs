use crate::config::{Config, FileFilter};
use crate::error::{DeadbindError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Type of input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Java,
    Zul,
}

/// Represents a discovered input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as walked, used for reading
    pub path: PathBuf,

    /// Path relative to the project root, used in reports
    pub relative: PathBuf,

    pub file_type: FileType,
}

impl SourceFile {
    /// Load and return owned contents
    pub fn read_contents(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// Include/exclude globs of one [`FileFilter`], compiled against the project root
struct PathFilter<'a> {
    filter: &'a FileFilter,
    include: Option<Gitignore>,
    exclude: Gitignore,
}

impl<'a> PathFilter<'a> {
    fn new(root: &Path, filter: &'a FileFilter) -> Result<Self> {
        let include = if filter.include.is_empty() {
            None
        } else {
            Some(build_matcher(root, &filter.include)?)
        };
        Ok(Self {
            filter,
            include,
            exclude: build_matcher(root, &filter.exclude)?,
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        if !self.filter.matches_extension(path) {
            return false;
        }
        if self.exclude.matched_path_or_any_parents(path, false).is_ignore() {
            trace!("Excluding: {}", path.display());
            return false;
        }
        match &self.include {
            Some(include) => include.matched_path_or_any_parents(path, false).is_ignore(),
            None => true,
        }
    }
}

fn build_matcher(root: &Path, patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| DeadbindError::config(format!("invalid glob `{}`: {}", pattern, e)))?;
    }
    builder
        .build()
        .map_err(|e| DeadbindError::config(format!("invalid glob set: {}", e)))
}

/// File finder for discovering Java sources and ZUL templates in a project
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find every source and template file under `root`, sorted by path
    pub fn find_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        if !root.is_dir() {
            return Err(DeadbindError::config(format!(
                "project root {} is not a readable directory",
                root.display()
            )));
        }
        debug!("Scanning for files in: {}", root.display());

        let sources = PathFilter::new(root, &self.config.sources)?;
        let templates = PathFilter::new(root, &self.config.templates)?;

        let walker = WalkBuilder::new(root)
            .hidden(true)           // Skip hidden files
            .git_ignore(true)       // Respect .gitignore
            .git_exclude(true)      // Respect .git/info/exclude
            .ignore(true)           // Respect .ignore files
            .parents(false)
            .follow_links(false)
            .build();

        let mut files: Vec<SourceFile> = walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                let file_type = if sources.accepts(path) {
                    FileType::Java
                } else if templates.accepts(path) {
                    FileType::Zul
                } else {
                    return None;
                };

                trace!("Found {:?}: {}", file_type, path.display());
                Some(SourceFile {
                    relative: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
                    path: path.to_path_buf(),
                    file_type,
                })
            })
            .collect();

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        debug!("Found {} files", files.len());
        Ok(files)
    }
}

/// Statistics about discovered files
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileStats {
    pub java_files: usize,
    pub templates: usize,
}

impl FileStats {
    pub fn from_files(files: &[SourceFile]) -> Self {
        let mut stats = Self::default();
        for file in files {
            match file.file_type {
                FileType::Java => stats.java_files += 1,
                FileType::Zul => stats.templates += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.java_files + self.templates
    }
}
