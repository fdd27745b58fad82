use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};

use crate::app::DisplayRecord;
use crate::domain::AssetRole;
use crate::error::ExplorerError;

/// PNG copies of a record's images for viewers that need file paths.
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct StagedRecord {
    dir: TempDir,
    paths: Vec<(AssetRole, PathBuf)>,
}

impl StagedRecord {
    pub fn write(record: &DisplayRecord) -> Result<Self, ExplorerError> {
        let dir = Builder::new()
            .prefix("dmid-explorer-")
            .tempdir()
            .map_err(|err| ExplorerError::Staging(err.to_string()))?;

        let mut paths = Vec::with_capacity(AssetRole::ALL.len());
        for role in AssetRole::ALL {
            let path = dir
                .path()
                .join(format!("{}-{role}.png", record.study.image_key()));
            record
                .image(role)
                .save_png(&path)
                .map_err(|err| ExplorerError::Staging(format!("{}: {err}", path.display())))?;
            paths.push((role, path));
        }

        Ok(Self { dir, paths })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, role: AssetRole) -> Option<&Path> {
        self.paths
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, path)| path.as_path())
    }

    pub fn paths(&self) -> &[(AssetRole, PathBuf)] {
        &self.paths
    }
}
