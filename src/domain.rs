use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// Numeric study key shared by every artifact of one imaging case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudyId(u32);

impl StudyId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// `IMG004`: raster file stem and metadata row key.
    pub fn image_key(self) -> String {
        format!("IMG{:03}", self.0)
    }

    pub fn raster_file_name(self) -> String {
        format!("{}.tif", self.image_key())
    }

    pub fn report_file_name(self) -> String {
        format!("Img{:03}.txt", self.0)
    }
}

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.image_key())
    }
}

impl FromStr for StudyId {
    type Err = ExplorerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("IMG") => &trimmed[3..],
            _ => trimmed,
        };
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ExplorerError::InvalidStudyId(value.to_string()));
        }
        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| ExplorerError::InvalidStudyId(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetRole {
    Raw,
    Annotation,
    Roi,
}

impl AssetRole {
    pub const ALL: [AssetRole; 3] = [AssetRole::Raw, AssetRole::Annotation, AssetRole::Roi];

    pub fn label(self) -> &'static str {
        match self {
            AssetRole::Raw => "TIFF Image",
            AssetRole::Annotation => "Pixel-level Annotation",
            AssetRole::Roi => "ROI Mask",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRole::Raw => write!(f, "raw"),
            AssetRole::Annotation => write!(f, "annotation"),
            AssetRole::Roi => write!(f, "roi"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn study_id_file_names() {
        let id = StudyId::new(4);
        assert_eq!(id.image_key(), "IMG004");
        assert_eq!(id.raster_file_name(), "IMG004.tif");
        assert_eq!(id.report_file_name(), "Img004.txt");
    }

    #[test]
    fn parse_study_id_forms() {
        assert_eq!("IMG004".parse::<StudyId>().unwrap(), StudyId::new(4));
        assert_eq!("img017".parse::<StudyId>().unwrap(), StudyId::new(17));
        assert_eq!(" 12 ".parse::<StudyId>().unwrap(), StudyId::new(12));
    }

    #[test]
    fn parse_study_id_invalid() {
        assert_matches!("IMG".parse::<StudyId>(), Err(ExplorerError::InvalidStudyId(_)));
        assert_matches!("IMG0x4".parse::<StudyId>(), Err(ExplorerError::InvalidStudyId(_)));
        assert_matches!("-3".parse::<StudyId>(), Err(ExplorerError::InvalidStudyId(_)));
    }
}
