use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::raster::ConversionFailure;

#[derive(Debug, Error, Diagnostic)]
pub enum ExplorerError {
    #[error("failed to build catalog from {path}: {message}")]
    #[diagnostic(help("check --root or the \"root\" entry of dmid-explorer.json"))]
    CatalogInit { path: PathBuf, message: String },

    #[error(transparent)]
    Conversion(#[from] ConversionFailure),

    #[error("failed to read metadata table at {path}: {message}")]
    MetadataRead { path: PathBuf, message: String },

    #[error("failed to parse metadata table: {0}")]
    MetadataParse(String),

    #[error("no metadata row for {0}")]
    MetadataNotFound(String),

    #[error("failed to read report at {path}: {message}")]
    ReportRead { path: PathBuf, message: String },

    #[error("navigation index {index} out of range for {count} studies")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("invalid study identifier: {0}")]
    InvalidStudyId(String),

    #[error("study {0} is not in the catalog")]
    StudyNotCataloged(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("staging error: {0}")]
    Staging(String),

    #[error("terminal error: {0}")]
    Terminal(String),
}

impl ExplorerError {
    /// Startup failures: the explorer cannot open the dataset at all.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ExplorerError::CatalogInit { .. }
                | ExplorerError::MetadataRead { .. }
                | ExplorerError::MetadataParse(_)
                | ExplorerError::ConfigRead(_)
                | ExplorerError::ConfigParse(_)
        )
    }
}
