use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::StudyId;
use crate::error::ExplorerError;

static RASTER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^IMG(\d{3})\.tif$").expect("valid raster name pattern"));

/// Sorted study identifiers found in the raw image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    ids: Vec<StudyId>,
}

impl Catalog {
    pub fn scan(dir: &Path) -> Result<Self, ExplorerError> {
        let init_error = |message: String| ExplorerError::CatalogInit {
            path: dir.to_path_buf(),
            message,
        };

        let entries = fs::read_dir(dir).map_err(|err| init_error(err.to_string()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| init_error(err.to_string()))?;
            let is_file = entry
                .file_type()
                .map(|kind| kind.is_file() || kind.is_symlink())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(parse_raster_name) {
                ids.push(id);
            }
        }

        let catalog = Self::from_ids(ids);
        if catalog.is_empty() {
            return Err(init_error("no studies found".to_string()));
        }
        tracing::info!(
            studies = catalog.len(),
            dir = %dir.display(),
            "catalog scanned"
        );
        Ok(catalog)
    }

    pub fn from_ids(mut ids: Vec<StudyId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id_at(&self, index: usize) -> Result<StudyId, ExplorerError> {
        self.ids
            .get(index)
            .copied()
            .ok_or(ExplorerError::IndexOutOfRange {
                index,
                count: self.ids.len(),
            })
    }

    pub fn position_of(&self, id: StudyId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    pub fn ids(&self) -> &[StudyId] {
        &self.ids
    }
}

fn parse_raster_name(name: &str) -> Option<StudyId> {
    let captures = RASTER_NAME.captures(name)?;
    captures[1].parse::<u32>().ok().map(StudyId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_name_convention() {
        assert_eq!(parse_raster_name("IMG004.tif"), Some(StudyId::new(4)));
        assert_eq!(parse_raster_name("IMG120.tif"), Some(StudyId::new(120)));
        assert_eq!(parse_raster_name("IMG04.tif"), None);
        assert_eq!(parse_raster_name("IMG0004.tif"), None);
        assert_eq!(parse_raster_name("Img004.tif"), None);
        assert_eq!(parse_raster_name("IMG004.tiff"), None);
        assert_eq!(parse_raster_name("IMG004.tif.bak"), None);
    }

    #[test]
    fn ids_sorted_and_unique() {
        let catalog = Catalog::from_ids(vec![
            StudyId::new(3),
            StudyId::new(1),
            StudyId::new(3),
            StudyId::new(2),
        ]);
        assert_eq!(
            catalog.ids(),
            &[StudyId::new(1), StudyId::new(2), StudyId::new(3)]
        );
        assert_eq!(catalog.position_of(StudyId::new(2)), Some(1));
        assert_eq!(catalog.position_of(StudyId::new(9)), None);
    }
}
