//! Hosting platform abstraction layer
//!
//! The release workflow needs three things from the platform that hosts the
//! repository: its default branch, the tag of its latest published release,
//! and a way to create draft releases.
//!
//! - [github::GitHubClient]: GitHub REST API implementation
//! - [mock::MockHosting]: In-memory implementation for testing

pub mod github;
pub mod mock;

pub use github::GitHubClient;
pub use mock::MockHosting;

use serde::Serialize;

use crate::error::Result;
use crate::locator::RepoIdentity;

/// Outcome of looking up the latest published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestRelease {
    Found { tag_name: String },
    NotFound,
}

/// A draft release ready to be submitted.
///
/// Serializes to the body of a create-release request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseDraft {
    #[serde(skip)]
    pub version: String,
    pub tag_name: String,
    #[serde(rename = "name")]
    pub title: String,
    pub body: String,
    pub draft: bool,
}

impl ReleaseDraft {
    /// A draft named and tagged with `version`.
    pub fn new(version: impl Into<String>, body: impl Into<String>) -> Self {
        let version = version.into();
        ReleaseDraft {
            tag_name: version.clone(),
            title: version.clone(),
            version,
            body: body.into(),
            draft: true,
        }
    }
}

/// A release record created on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHandle {
    pub id: u64,
    pub name: String,
    pub url: String,
}

/// Hosting-platform capability consumed by the release workflow.
pub trait HostingPlatform {
    /// Name of the repository's default branch.
    fn default_branch(&self, repo: &RepoIdentity) -> Result<String>;

    /// Tag of the latest published (non-draft, non-prerelease) release.
    fn latest_release(&self, repo: &RepoIdentity) -> Result<LatestRelease>;

    /// Creates a release from `draft`.
    fn create_release(&self, repo: &RepoIdentity, draft: &ReleaseDraft) -> Result<ReleaseHandle>;
}
