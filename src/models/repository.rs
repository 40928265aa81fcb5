// file: src/models/repository.rs
// description: remote repository listing entries and the descriptors the pipeline consumes
// reference: https://docs.github.com/en/rest/repos/repos

use serde::{Deserialize, Serialize};

/// Branch assumed when the API does not report one.
pub const FALLBACK_BRANCH: &str = "master";

/// Which URL the working copy is cloned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneProtocol {
    #[default]
    Ssh,
    Https,
}

/// One entry of a GitHub repository listing, as returned by the REST API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteRepository {
    pub name: String,
    pub clone_url: String,
    pub ssh_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub clone_url: String,
    pub primary_language: String,
    pub default_branch: String,
}

impl RepositoryDescriptor {
    pub fn from_remote(remote: &RemoteRepository, protocol: CloneProtocol) -> Self {
        let clone_url = match protocol {
            CloneProtocol::Ssh => remote.ssh_url.clone(),
            CloneProtocol::Https => remote.clone_url.clone(),
        };

        Self {
            name: remote.name.clone(),
            clone_url,
            primary_language: remote.language.clone().unwrap_or_default(),
            default_branch: remote
                .default_branch
                .clone()
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| FALLBACK_BRANCH.to_string()),
        }
    }
}
