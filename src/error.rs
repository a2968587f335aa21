use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Everything else is a [`crate::diagnostics::Diagnostic`].
#[derive(Error, Diagnostic, Debug)]
pub enum DeadbindError {
    #[error("configuration error: {message}")]
    #[diagnostic(code(deadbind::config))]
    Configuration { message: String },

    #[error("no source files found under {}", .root.display())]
    #[diagnostic(
        code(deadbind::no_input),
        help("check the project path and the --source-include/--source-exclude filters")
    )]
    NoInput { root: PathBuf },

    #[error("failed to write {}", .path.display())]
    #[diagnostic(code(deadbind::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeadbindError {
    pub fn config(message: impl Into<String>) -> Self {
        DeadbindError::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T, E = DeadbindError> = std::result::Result<T, E>;
