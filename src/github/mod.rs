// file: src/github/mod.rs
// description: GitHub repository listing module exports
// reference: internal module structure

pub mod client;
pub mod credentials;
pub mod source;

pub use client::GitHubClient;
pub use credentials::discover_token;
pub use source::{RepositoryCatalog, RepositorySource, SelectionRules, select_repositories};
