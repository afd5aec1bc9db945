use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors raised while analyzing a project or writing its report.
///
/// Only `InvalidInput` and `ReportGeneration` ever reach the caller, file-level
/// errors are logged and the file is skipped.
pub enum AnalysisError {
    /// Bad project path, column name or output path.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A source file could not be read.
    #[error("could not read {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A source file could not be parsed into a usable declaration.
    #[error("could not parse {path:?}: {reason}")]
    FileParse { path: PathBuf, reason: String },
    /// The report could not be written.
    #[error("could not generate report {path:?}: {source}")]
    ReportGeneration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(message.into())
    }

    /// true iff the error only concerns a single source file.
    pub fn is_file_local(&self) -> bool {
        matches!(
            self,
            AnalysisError::FileRead { .. } | AnalysisError::FileParse { .. }
        )
    }
}
