// file: src/parser/mod.rs
// description: composer output parsing module exports
// reference: internal module structure

pub mod output;

pub use output::{Recovery, outdated_packages, recover};
