use std::fmt;
use std::fs;
use std::io;

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::domain::StudyId;
use crate::error::ExplorerError;

pub const REPORT_UNAVAILABLE: &str = "No report available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ReportText {
    Available(String),
    Unavailable,
}

impl ReportText {
    pub fn as_str(&self) -> &str {
        match self {
            ReportText::Available(text) => text,
            ReportText::Unavailable => REPORT_UNAVAILABLE,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ReportText::Available(_))
    }
}

impl fmt::Display for ReportText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ReportText> for String {
    fn from(report: ReportText) -> Self {
        match report {
            ReportText::Available(text) => text,
            ReportText::Unavailable => REPORT_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: Utf8PathBuf,
}

impl ReportStore {
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }

    pub fn report_path(&self, id: StudyId) -> Utf8PathBuf {
        self.dir.join(id.report_file_name())
    }

    /// A missing file is the sentinel, not an error.
    pub fn load(&self, id: StudyId) -> Result<ReportText, ExplorerError> {
        let path = self.report_path(id);
        match fs::read_to_string(path.as_std_path()) {
            Ok(text) => Ok(ReportText::Available(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ReportText::Unavailable),
            Err(err) => Err(ExplorerError::ReportRead {
                path: path.into_std_path_buf(),
                message: err.to_string(),
            }),
        }
    }
}
