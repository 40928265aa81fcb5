// file: src/exporter/mod.rs
// description: report export module exports
// reference: internal module structure

pub mod json;

pub use json::{ExportManifest, JsonExporter, ManifestEntry, REPORTS_DIR, SUMMARY_FILE};
