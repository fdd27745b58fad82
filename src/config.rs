use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;
use crate::layout::{
    DEFAULT_ANNOTATIONS_DIR, DEFAULT_IMAGES_DIR, DEFAULT_METADATA_FILE, DEFAULT_REPORTS_DIR,
    DEFAULT_ROI_DIR, DEFAULT_ROOT, DatasetLayout,
};
use crate::placeholder::{DEFAULT_CAPTION, DEFAULT_SIZE, PlaceholderSpec};

pub const DEFAULT_CONFIG_FILE: &str = "dmid-explorer.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub layout: Option<LayoutEntry>,
    #[serde(default)]
    pub placeholder: Option<PlaceholderEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LayoutEntry {
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub annotations: Option<String>,
    #[serde(default)]
    pub roi_masks: Option<String>,
    #[serde(default)]
    pub reports: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PlaceholderEntry {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub layout: DatasetLayout,
    pub placeholder: PlaceholderSpec,
}

impl ResolvedConfig {
    pub fn with_root(mut self, root: Option<&str>) -> Self {
        if let Some(root) = root {
            self.layout = self.layout.with_root(Utf8PathBuf::from(root));
        }
        self
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit `path` must exist; the default file is optional.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ExplorerError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ExplorerError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ExplorerError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let root = config.root.unwrap_or_else(|| DEFAULT_ROOT.to_string());
        let layout = config.layout.unwrap_or_default();
        let layout = DatasetLayout::with_names(
            Utf8PathBuf::from(root),
            layout
                .images
                .unwrap_or_else(|| DEFAULT_IMAGES_DIR.to_string()),
            layout
                .annotations
                .unwrap_or_else(|| DEFAULT_ANNOTATIONS_DIR.to_string()),
            layout
                .roi_masks
                .unwrap_or_else(|| DEFAULT_ROI_DIR.to_string()),
            layout
                .reports
                .unwrap_or_else(|| DEFAULT_REPORTS_DIR.to_string()),
            layout
                .metadata
                .unwrap_or_else(|| DEFAULT_METADATA_FILE.to_string()),
        );

        let placeholder = config.placeholder.unwrap_or_default();
        let placeholder = PlaceholderSpec {
            width: placeholder.width.filter(|w| *w > 0).unwrap_or(DEFAULT_SIZE.0),
            height: placeholder.height.filter(|h| *h > 0).unwrap_or(DEFAULT_SIZE.1),
            caption: placeholder
                .caption
                .unwrap_or_else(|| DEFAULT_CAPTION.to_string()),
        };

        ResolvedConfig {
            layout,
            placeholder,
        }
    }
}
