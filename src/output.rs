use std::io::{self, Write};

use serde::Serialize;

use crate::app::{AssemblyEvent, AssemblySink, CatalogListing, DisplayRecord};
use crate::domain::AssetRole;
use crate::staging::StagedRecord;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub index: usize,
    pub study: String,
    pub images: Vec<ImageSummary>,
    pub metadata: Vec<MetadataField>,
    pub report: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub role: AssetRole,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

impl RecordSummary {
    pub fn new(record: &DisplayRecord, staged: Option<&StagedRecord>) -> Self {
        let images = AssetRole::ALL
            .into_iter()
            .map(|role| {
                let image = record.image(role);
                ImageSummary {
                    role,
                    width: image.width(),
                    height: image.height(),
                    channels: image.channels(),
                    staged_path: staged
                        .and_then(|staged| staged.path(role))
                        .map(|path| path.display().to_string()),
                }
            })
            .collect();
        let metadata = record
            .metadata
            .fields()
            .map(|(name, value)| MetadataField {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect();
        Self {
            index: record.index,
            study: record.study.image_key(),
            images,
            metadata,
            report: record.report.as_str().to_string(),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_list(result: &CatalogListing) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_record(result: &RecordSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl AssemblySink for JsonOutput {
    fn event(&self, _event: AssemblyEvent) {}
}
