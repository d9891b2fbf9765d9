//! GitHub implementation of [HostingPlatform] over the REST API.
//!
//! Requests are blocking and made one at a time through a shared
//! [`ureq::Agent`]. Non-2xx responses surface as [ReleaseError::Hosting]
//! carrying the status code and response text, except a 404 from the
//! latest-release endpoint, which means the repository has no release yet.

use serde::Deserialize;
use tracing::debug;
use ureq::Agent;

use super::{HostingPlatform, LatestRelease, ReleaseDraft, ReleaseHandle};
use crate::error::{ReleaseError, Result};
use crate::locator::RepoIdentity;

const ACCEPT_VALUE: &str = "application/vnd.github+json";

const USER_AGENT_VALUE: &str = concat!("release-cycle/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

#[derive(Deserialize)]
struct LatestReleaseResponse {
    tag_name: String,
}

#[derive(Deserialize)]
struct CreatedReleaseResponse {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    tag_name: String,
    html_url: String,
}

/// GitHub REST client authenticated with a repository token.
pub struct GitHubClient {
    agent: Agent,
    token: String,
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a client for `api_base` (e.g. `https://api.github.com`).
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        GitHubClient {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT_VALUE).build(),
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn repo_url(&self, repo: &RepoIdentity, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_base, repo.organization, repo.repository, suffix
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        debug!(method, url, "GitHub request");
        self.agent
            .request(method, url)
            .set("Authorization", &format!("token {}", self.token))
            .set("Accept", ACCEPT_VALUE)
    }
}

/// Converts a failed request into a hosting error naming what was attempted.
fn api_error(context: &str, err: ureq::Error) -> ReleaseError {
    match err {
        ureq::Error::Status(code, response) => {
            let text = response.into_string().unwrap_or_default();
            ReleaseError::hosting(format!(
                "{} failed with status {}: {}",
                context,
                code,
                text.trim()
            ))
        }
        ureq::Error::Transport(transport) => {
            ReleaseError::hosting(format!("{} failed: {}", context, transport))
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(context: &str, response: ureq::Response) -> Result<T> {
    response.into_json().map_err(|e| {
        ReleaseError::hosting(format!("{} returned an unexpected response: {}", context, e))
    })
}

impl HostingPlatform for GitHubClient {
    fn default_branch(&self, repo: &RepoIdentity) -> Result<String> {
        let context = "Fetching repository details";
        let response = self
            .request("GET", &self.repo_url(repo, ""))
            .call()
            .map_err(|e| api_error(context, e))?;

        let details: RepositoryResponse = decode(context, response)?;
        Ok(details.default_branch)
    }

    fn latest_release(&self, repo: &RepoIdentity) -> Result<LatestRelease> {
        let context = "Fetching latest release";
        match self
            .request("GET", &self.repo_url(repo, "/releases/latest"))
            .call()
        {
            Ok(response) => {
                let release: LatestReleaseResponse = decode(context, response)?;
                Ok(LatestRelease::Found {
                    tag_name: release.tag_name,
                })
            }
            Err(ureq::Error::Status(404, _)) => Ok(LatestRelease::NotFound),
            Err(e) => Err(api_error(context, e)),
        }
    }

    fn create_release(&self, repo: &RepoIdentity, draft: &ReleaseDraft) -> Result<ReleaseHandle> {
        let context = "Creating release";
        let response = self
            .request("POST", &self.repo_url(repo, "/releases"))
            .send_json(draft)
            .map_err(|e| api_error(context, e))?;

        let created: CreatedReleaseResponse = decode(context, response)?;
        Ok(ReleaseHandle {
            id: created.id,
            name: created.name.unwrap_or(created.tag_name),
            url: created.html_url,
        })
    }
}
