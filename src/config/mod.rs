mod loader;

pub use loader::{glob_match, AnnotationConfig, Config, FileFilter, ReportConfig};
