// file: src/github/source.rs
// description: repository selection: listing, filtering, de-duplication and ordering
// reference: internal pipeline structure

use crate::config::Config;
use crate::error::{AuditError, Result};
use crate::models::{CloneProtocol, RemoteRepository, RepositoryDescriptor};
use crate::utils::Validator;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Read access to a hosting platform's repository listings.
#[allow(async_fn_in_trait)]
pub trait RepositoryCatalog {
    async fn organisation_repositories(&self, organisation: &str) -> Result<Vec<RemoteRepository>>;
    async fn user_repositories(&self, username: &str) -> Result<Vec<RemoteRepository>>;
}

#[derive(Debug, Clone)]
pub struct SelectionRules {
    pub language: String,
    pub protocol: CloneProtocol,
    pub include_archived: bool,
    pub include_forks: bool,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            language: "PHP".to_string(),
            protocol: CloneProtocol::Ssh,
            include_archived: false,
            include_forks: true,
        }
    }
}

impl From<&Config> for SelectionRules {
    fn from(config: &Config) -> Self {
        Self {
            language: config.github.language.clone(),
            protocol: config.github.protocol,
            include_archived: config.pipeline.include_archived,
            include_forks: config.pipeline.include_forks,
        }
    }
}

pub struct RepositorySource<C> {
    catalog: C,
    rules: SelectionRules,
}

impl<C: RepositoryCatalog> RepositorySource<C> {
    pub fn new(catalog: C, rules: SelectionRules) -> Self {
        Self { catalog, rules }
    }

    /// Organisation and user listings are combined when both are given.
    pub async fn list(
        &self,
        organisation: Option<&str>,
        username: Option<&str>,
        skip: &BTreeSet<String>,
    ) -> Result<Vec<RepositoryDescriptor>> {
        if organisation.is_none() && username.is_none() {
            return Err(AuditError::Config(
                "Missing either github.organisation or github.username key".to_string(),
            ));
        }

        let mut remote = Vec::new();
        if let Some(organisation) = organisation {
            info!("Listing repositories of organisation {}", organisation);
            remote.extend(self.catalog.organisation_repositories(organisation).await?);
        }
        if let Some(username) = username {
            info!("Listing repositories of user {}", username);
            remote.extend(self.catalog.user_repositories(username).await?);
        }

        let selected = select_repositories(remote, skip, &self.rules);
        info!("Selected {} {} repositories", selected.len(), self.rules.language);
        Ok(selected)
    }
}

/// Drops skipped names, other languages, archived repositories and (optionally) forks,
/// then de-duplicates by name and sorts case-insensitively.
pub fn select_repositories(
    remote: Vec<RemoteRepository>,
    skip: &BTreeSet<String>,
    rules: &SelectionRules,
) -> Vec<RepositoryDescriptor> {
    let mut selected: Vec<RepositoryDescriptor> = remote
        .iter()
        .filter(|repo| {
            if skip.contains(&repo.name) {
                debug!("Skipping {} (skip list)", repo.name);
                return false;
            }
            if repo.language.as_deref() != Some(rules.language.as_str()) {
                return false;
            }
            if repo.archived && !rules.include_archived {
                debug!("Skipping {} (archived)", repo.name);
                return false;
            }
            if repo.fork && !rules.include_forks {
                debug!("Skipping {} (fork)", repo.name);
                return false;
            }
            if let Err(e) = Validator::validate_repository_name(&repo.name) {
                warn!("Skipping repository: {}", e);
                return false;
            }
            true
        })
        .map(|repo| RepositoryDescriptor::from_remote(repo, rules.protocol))
        .collect();

    selected.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut seen = HashSet::new();
    selected.retain(|repo| seen.insert(repo.name.clone()));
    selected
}
