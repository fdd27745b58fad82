use std::fmt;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::ResolvedConfig;
use crate::domain::{AssetRole, StudyId};
use crate::error::ExplorerError;
use crate::layout::DatasetLayout;
use crate::metadata::{MetadataRow, MetadataStore};
use crate::placeholder::PlaceholderFactory;
use crate::raster::{NormalizedImage, RasterConverter};
use crate::report::{ReportStore, ReportText};

/// Everything shown for one navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRecord {
    pub index: usize,
    pub study: StudyId,
    pub raw: NormalizedImage,
    pub annotation: NormalizedImage,
    pub roi: NormalizedImage,
    pub metadata: MetadataRow,
    pub report: ReportText,
}

impl DisplayRecord {
    pub fn image(&self, role: AssetRole) -> &NormalizedImage {
        match role {
            AssetRole::Raw => &self.raw,
            AssetRole::Annotation => &self.annotation,
            AssetRole::Roi => &self.roi,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub root: String,
    pub count: usize,
    pub studies: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub index: usize,
    pub study: String,
    pub raw: bool,
    pub annotation: bool,
    pub roi: bool,
    pub report: bool,
    pub metadata: bool,
}

/// Diagnostic emitted while a record is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyEvent {
    ImageDecoded {
        study: StudyId,
        role: AssetRole,
        width: u32,
        height: u32,
        channels: u8,
    },
    ImageMissing {
        study: StudyId,
        role: AssetRole,
        path: String,
    },
    ImageFailed {
        study: StudyId,
        role: AssetRole,
        cause: String,
    },
    MetadataMissing {
        study: StudyId,
    },
    ReportMissing {
        study: StudyId,
    },
    ReportFailed {
        study: StudyId,
        cause: String,
    },
}

impl fmt::Display for AssemblyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyEvent::ImageDecoded {
                study,
                role,
                width,
                height,
                channels,
            } => write!(f, "{study} {role}: decoded {width}x{height}x{channels}"),
            AssemblyEvent::ImageMissing { study, role, path } => {
                write!(f, "{study} {role}: missing ({path})")
            }
            AssemblyEvent::ImageFailed { study, role, cause } => {
                write!(f, "{study} {role}: conversion failed ({cause})")
            }
            AssemblyEvent::MetadataMissing { study } => {
                write!(f, "{study} metadata: no row in table")
            }
            AssemblyEvent::ReportMissing { study } => write!(f, "{study} report: not found"),
            AssemblyEvent::ReportFailed { study, cause } => {
                write!(f, "{study} report: read failed ({cause})")
            }
        }
    }
}

pub trait AssemblySink {
    fn event(&self, event: AssemblyEvent);
}

/// Dataset context built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct App {
    layout: DatasetLayout,
    catalog: Catalog,
    metadata: MetadataStore,
    reports: ReportStore,
    converter: RasterConverter,
    placeholders: PlaceholderFactory,
}

impl App {
    pub fn open(config: &ResolvedConfig) -> Result<Self, ExplorerError> {
        let layout = config.layout.clone();
        let catalog = Catalog::scan(layout.role_dir(AssetRole::Raw).as_std_path())?;
        let metadata = MetadataStore::load(layout.metadata_path().as_std_path())?;
        Ok(Self::from_parts(
            layout,
            catalog,
            metadata,
            PlaceholderFactory::new(config.placeholder.clone()),
        ))
    }

    pub fn from_parts(
        layout: DatasetLayout,
        catalog: Catalog,
        metadata: MetadataStore,
        placeholders: PlaceholderFactory,
    ) -> Self {
        let reports = ReportStore::new(layout.reports_dir());
        Self {
            layout,
            catalog,
            metadata,
            reports,
            converter: RasterConverter::new(),
            placeholders,
        }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn study_count(&self) -> usize {
        self.catalog.len()
    }

    /// Which assets exist on disk for every cataloged study.
    pub fn list(&self) -> CatalogListing {
        let studies = self
            .catalog
            .ids()
            .iter()
            .enumerate()
            .map(|(index, &study)| {
                let exists =
                    |role| self.layout.raster_path(role, study).as_std_path().is_file();
                CatalogEntry {
                    index,
                    study: study.image_key(),
                    raw: exists(AssetRole::Raw),
                    annotation: exists(AssetRole::Annotation),
                    roi: exists(AssetRole::Roi),
                    report: self.reports.report_path(study).as_std_path().is_file(),
                    metadata: self.metadata.contains(study),
                }
            })
            .collect();
        CatalogListing {
            root: self.layout.root().to_string(),
            count: self.catalog.len(),
            studies,
        }
    }

    /// Builds the record for `index`; only an out-of-range index fails.
    pub fn assemble(
        &self,
        index: usize,
        sink: &dyn AssemblySink,
    ) -> Result<DisplayRecord, ExplorerError> {
        let study = self.catalog.id_at(index)?;

        let raw = self.resolve_image(study, AssetRole::Raw, sink);
        let annotation = self.resolve_image(study, AssetRole::Annotation, sink);
        let roi = self.resolve_image(study, AssetRole::Roi, sink);
        let metadata = self.resolve_metadata(study, sink);
        let report = self.resolve_report(study, sink);

        tracing::debug!(index, %study, "record assembled");
        Ok(DisplayRecord {
            index,
            study,
            raw,
            annotation,
            roi,
            metadata,
            report,
        })
    }

    fn resolve_image(
        &self,
        study: StudyId,
        role: AssetRole,
        sink: &dyn AssemblySink,
    ) -> NormalizedImage {
        let path = self.layout.raster_path(role, study);
        if !path.as_std_path().is_file() {
            tracing::debug!(%study, %role, path = %path, "asset missing, using placeholder");
            sink.event(AssemblyEvent::ImageMissing {
                study,
                role,
                path: path.to_string(),
            });
            return self.placeholders.standard();
        }

        match self.converter.convert(path.as_std_path()) {
            Ok(image) => {
                sink.event(AssemblyEvent::ImageDecoded {
                    study,
                    role,
                    width: image.width(),
                    height: image.height(),
                    channels: image.channels(),
                });
                image
            }
            Err(err) => {
                tracing::warn!(%study, %role, error = %err, "conversion failed, using placeholder");
                sink.event(AssemblyEvent::ImageFailed {
                    study,
                    role,
                    cause: err.to_string(),
                });
                self.placeholders.standard()
            }
        }
    }

    fn resolve_metadata(&self, study: StudyId, sink: &dyn AssemblySink) -> MetadataRow {
        match self.metadata.lookup(study) {
            Ok(row) => row,
            Err(err) => {
                tracing::warn!(%study, error = %err, "cataloged study has no metadata row");
                sink.event(AssemblyEvent::MetadataMissing { study });
                self.metadata.placeholder_row(study)
            }
        }
    }

    fn resolve_report(&self, study: StudyId, sink: &dyn AssemblySink) -> ReportText {
        match self.reports.load(study) {
            Ok(ReportText::Unavailable) => {
                sink.event(AssemblyEvent::ReportMissing { study });
                ReportText::Unavailable
            }
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(%study, error = %err, "report unreadable, using sentinel");
                sink.event(AssemblyEvent::ReportFailed {
                    study,
                    cause: err.to_string(),
                });
                ReportText::Unavailable
            }
        }
    }
}
