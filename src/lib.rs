pub mod app;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod navigation;
pub mod output;
pub mod placeholder;
pub mod raster;
pub mod report;
pub mod staging;
pub mod tui;
