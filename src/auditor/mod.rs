// file: src/auditor/mod.rs
// description: dependency auditor module exports
// reference: internal module structure

pub mod composer;

pub use composer::{ComposerAuditor, MANIFEST_FILE};
