// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod audit;
pub mod repository;

pub use audit::{Abort, AuditResult, Payload, Stage, StageFailure};
pub use repository::{CloneProtocol, FALLBACK_BRANCH, RemoteRepository, RepositoryDescriptor};
