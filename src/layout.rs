use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{AssetRole, StudyId};

pub const DEFAULT_ROOT: &str = "data/DMID";
pub const DEFAULT_IMAGES_DIR: &str = "tiff-images";
pub const DEFAULT_ANNOTATIONS_DIR: &str = "pixel-level-annotations";
pub const DEFAULT_ROI_DIR: &str = "roi-masks";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_METADATA_FILE: &str = "metadata.txt";

/// On-disk arrangement of one DMID copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: Utf8PathBuf,
    images: String,
    annotations: String,
    roi_masks: String,
    reports: String,
    metadata: String,
}

impl DatasetLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: DEFAULT_IMAGES_DIR.to_string(),
            annotations: DEFAULT_ANNOTATIONS_DIR.to_string(),
            roi_masks: DEFAULT_ROI_DIR.to_string(),
            reports: DEFAULT_REPORTS_DIR.to_string(),
            metadata: DEFAULT_METADATA_FILE.to_string(),
        }
    }

    pub fn with_names(
        root: impl Into<Utf8PathBuf>,
        images: String,
        annotations: String,
        roi_masks: String,
        reports: String,
        metadata: String,
    ) -> Self {
        Self {
            root: root.into(),
            images,
            annotations,
            roi_masks,
            reports,
            metadata,
        }
    }

    pub fn with_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn role_dir(&self, role: AssetRole) -> Utf8PathBuf {
        let name = match role {
            AssetRole::Raw => &self.images,
            AssetRole::Annotation => &self.annotations,
            AssetRole::Roi => &self.roi_masks,
        };
        self.root.join(name)
    }

    pub fn raster_path(&self, role: AssetRole, id: StudyId) -> Utf8PathBuf {
        self.role_dir(role).join(id.raster_file_name())
    }

    pub fn reports_dir(&self) -> Utf8PathBuf {
        self.root.join(&self.reports)
    }

    pub fn report_path(&self, id: StudyId) -> Utf8PathBuf {
        self.reports_dir().join(id.report_file_name())
    }

    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.root.join(&self.metadata)
    }
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}
