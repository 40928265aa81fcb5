// file: src/repository/mod.rs
// description: Working copy operations module exports
// reference: Internal module structure

pub mod sync;

pub use sync::WorkingCopySync;
