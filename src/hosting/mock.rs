use std::cell::RefCell;

use super::{HostingPlatform, LatestRelease, ReleaseDraft, ReleaseHandle};
use crate::error::{ReleaseError, Result};
use crate::locator::RepoIdentity;

/// In-memory hosting platform for testing
///
/// Records every draft it receives. Failures can be scripted per endpoint.
pub struct MockHosting {
    default_branch: String,
    latest_release: Option<String>,
    latest_release_error: Option<String>,
    reject_release: Option<String>,
    drafts: RefCell<Vec<ReleaseDraft>>,
}

impl MockHosting {
    /// A platform reporting `default_branch` and no releases
    pub fn new(default_branch: impl Into<String>) -> Self {
        MockHosting {
            default_branch: default_branch.into(),
            latest_release: None,
            latest_release_error: None,
            reject_release: None,
            drafts: RefCell::new(Vec::new()),
        }
    }

    /// Report `tag` as the latest published release
    pub fn with_latest_release(mut self, tag: impl Into<String>) -> Self {
        self.latest_release = Some(tag.into());
        self
    }

    /// Fail latest-release lookups with `message`
    pub fn with_latest_release_error(mut self, message: impl Into<String>) -> Self {
        self.latest_release_error = Some(message.into());
        self
    }

    /// Reject release creation with `message`
    pub fn rejecting_releases(mut self, message: impl Into<String>) -> Self {
        self.reject_release = Some(message.into());
        self
    }

    /// Drafts submitted so far
    pub fn drafts(&self) -> Vec<ReleaseDraft> {
        self.drafts.borrow().clone()
    }
}

impl HostingPlatform for MockHosting {
    fn default_branch(&self, _repo: &RepoIdentity) -> Result<String> {
        Ok(self.default_branch.clone())
    }

    fn latest_release(&self, _repo: &RepoIdentity) -> Result<LatestRelease> {
        if let Some(message) = &self.latest_release_error {
            return Err(ReleaseError::hosting(message.clone()));
        }
        Ok(match &self.latest_release {
            Some(tag) => LatestRelease::Found {
                tag_name: tag.clone(),
            },
            None => LatestRelease::NotFound,
        })
    }

    fn create_release(&self, repo: &RepoIdentity, draft: &ReleaseDraft) -> Result<ReleaseHandle> {
        if let Some(message) = &self.reject_release {
            return Err(ReleaseError::hosting(message.clone()));
        }

        let mut drafts = self.drafts.borrow_mut();
        drafts.push(draft.clone());
        let id = drafts.len() as u64;

        Ok(ReleaseHandle {
            id,
            name: draft.title.clone(),
            url: format!(
                "https://github.com/{}/{}/releases/tag/{}",
                repo.organization, repo.repository, draft.tag_name
            ),
        })
    }
}
