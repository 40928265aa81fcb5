// file: src/github/credentials.rs
// description: GitHub token discovery from configuration or composer's auth.json
// reference: https://getcomposer.org/doc/articles/authentication-for-private-packages.md#github-oauth

use crate::config::GitHubConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const GITHUB_HOST: &str = "github.com";

#[derive(Debug, Deserialize)]
struct ComposerAuth {
    #[serde(rename = "github-oauth", default)]
    github_oauth: HashMap<String, String>,
}

pub fn composer_auth_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".composer").join("auth.json"))
}

/// Token from `github.token`, else from `~/.composer/auth.json`. Absence is not an error:
/// the API is then used unauthenticated.
pub fn discover_token(github: &GitHubConfig) -> Option<String> {
    if let Some(token) = github.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        debug!("Using GitHub token from configuration");
        return Some(token.to_string());
    }

    composer_auth_path().and_then(|path| read_composer_auth(&path))
}

pub fn read_composer_auth(path: &Path) -> Option<String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No composer auth at {}: {}", path.display(), e);
            return None;
        }
    };

    let auth: ComposerAuth = match serde_json::from_str(&content) {
        Ok(auth) => auth,
        Err(e) => {
            debug!("Ignoring unreadable {}: {}", path.display(), e);
            return None;
        }
    };

    let token = auth
        .github_oauth
        .get(GITHUB_HOST)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    if token.is_some() {
        debug!("Using GitHub token from {}", path.display());
    }
    token
}
