// file: src/github/client.rs
// description: paginated GitHub REST client for organisation and user repository listings
// reference: https://docs.github.com/en/rest/repos/repos#list-organization-repositories

use crate::error::{AuditError, Result};
use crate::github::source::RepositoryCatalog;
use crate::models::RemoteRepository;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info};

const DEFAULT_PAGE_SIZE: usize = 100;

pub struct GitHubClient {
    client: Client,
    api_url: String,
    per_page: usize,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("github-outdated"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AuditError::Config(format!("Invalid GitHub token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            debug!("No GitHub token found, using unauthenticated requests");
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            per_page: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, per_page: usize) -> Self {
        self.per_page = per_page.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    fn page_url(&self, path: &str, page: usize) -> String {
        format!(
            "{}/{}?per_page={}&page={}",
            self.api_url,
            path.trim_start_matches('/'),
            self.per_page,
            page
        )
    }

    /// Follows `page=1,2,..` until a page comes back shorter than `per_page`.
    async fn list_all(&self, path: &str) -> Result<Vec<RemoteRepository>> {
        let mut repositories = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.fetch_page(&self.page_url(path, page)).await?;
            let received = batch.len();
            repositories.extend(batch);

            if received < self.per_page {
                break;
            }
            page += 1;
        }

        info!("Listed {} repositories from {}", repositories.len(), path);
        Ok(repositories)
    }

    async fn fetch_page(&self, url: &str) -> Result<Vec<RemoteRepository>> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AuditError::Transport(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AuditError::Transport(format!(
                "GET {} returned {}: {}",
                url,
                status,
                body.trim()
            )));
        }

        response
            .json::<Vec<RemoteRepository>>()
            .await
            .map_err(|e| AuditError::Transport(format!("Failed to decode {}: {}", url, e)))
    }
}

impl RepositoryCatalog for GitHubClient {
    async fn organisation_repositories(&self, organisation: &str) -> Result<Vec<RemoteRepository>> {
        self.list_all(&format!("orgs/{}/repos", organisation)).await
    }

    async fn user_repositories(&self, username: &str) -> Result<Vec<RemoteRepository>> {
        self.list_all(&format!("users/{}/repos", username)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one canned response per connection and hands back the raw requests.
    fn serve(responses: Vec<(u16, String)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                    let read = stream.read(&mut chunk).unwrap();
                    if read == 0 {
                        break;
                    }
                    buffer.extend_from_slice(&chunk[..read]);
                }
                requests.push(String::from_utf8_lossy(&buffer).to_string());

                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
            requests
        });

        (address, handle)
    }

    fn repo_json(name: &str) -> String {
        format!(
            r#"{{"name":"{0}","clone_url":"https://github.com/acme/{0}.git","ssh_url":"git@github.com:acme/{0}.git","language":"PHP","default_branch":"main"}}"#,
            name
        )
    }

    #[test]
    fn test_page_url() {
        let client = GitHubClient::new("https://api.github.com/", None)
            .unwrap()
            .with_page_size(30);
        assert_eq!(
            client.page_url("orgs/acme/repos", 2),
            "https://api.github.com/orgs/acme/repos?per_page=30&page=2"
        );
    }

    #[test]
    fn test_follows_pages_until_short_page() {
        let (address, handle) = serve(vec![
            (200, format!("[{},{}]", repo_json("alpha"), repo_json("beta"))),
            (200, format!("[{}]", repo_json("gamma"))),
        ]);

        let client = GitHubClient::new(&address, Some("secret"))
            .unwrap()
            .with_page_size(2);
        let repositories =
            tokio_test::block_on(client.organisation_repositories("acme")).unwrap();

        let names: Vec<&str> = repositories.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);

        let requests = handle.join().unwrap();
        assert!(requests[0].starts_with("GET /orgs/acme/repos?per_page=2&page=1 "));
        assert!(requests[1].starts_with("GET /orgs/acme/repos?per_page=2&page=2 "));
        assert!(requests[0].to_lowercase().contains("authorization: bearer secret"));
        assert!(requests[0].to_lowercase().contains("user-agent: github-outdated"));
    }

    #[test]
    fn test_user_listing_path() {
        let (address, handle) = serve(vec![(200, "[]".to_string())]);

        let client = GitHubClient::new(&address, None).unwrap();
        let repositories = tokio_test::block_on(client.user_repositories("octocat")).unwrap();

        assert!(repositories.is_empty());
        let requests = handle.join().unwrap();
        assert!(requests[0].starts_with("GET /users/octocat/repos?per_page=100&page=1 "));
        assert!(!requests[0].to_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_error_status_is_transport_error() {
        let (address, handle) = serve(vec![(404, r#"{"message":"Not Found"}"#.to_string())]);

        let client = GitHubClient::new(&address, None).unwrap();
        let err = tokio_test::block_on(client.organisation_repositories("missing")).unwrap_err();
        handle.join().unwrap();

        match err {
            AuditError::Transport(message) => {
                assert!(message.contains("404"));
                assert!(message.contains("Not Found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
