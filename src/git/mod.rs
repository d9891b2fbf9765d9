//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! operations the release workflow needs, with a real implementation and a
//! mock for testing.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A recording implementation for testing
//!
//! The working tree is a single shared resource, so every operation that
//! changes it (staging, committing, tagging, checkouts, fetches, pushes)
//! takes `&mut self`. Whoever holds the mutable handle owns the checkout.
//!
//! ```rust
//! # use release_cycle::git::Repository;
//! # fn example<R: Repository>(repo: &mut R) -> release_cycle::Result<()> {
//! let head = repo.head_commit()?;
//! let commit = repo.commit("CI: Prerelease: 1.2.4-0")?;
//! repo.create_tag("1.2.4-0", commit)?;
//! let changes = repo.log_range(head, commit)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{GitOperation, MockRepository};
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::Path;

/// One commit as reported by the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLogEntry {
    /// Full commit hash
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    /// First line of the commit message
    pub subject: String,
    /// Remainder of the commit message after the subject, if any
    pub body: Option<String>,
}

impl CommitLogEntry {
    /// The 7-character abbreviated hash.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }
}

/// Version-control capability consumed by the release workflow.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map their
/// underlying errors (like `git2::Error`) to [crate::error::ReleaseError].
pub trait Repository {
    /// The most recent commit on the current checkout.
    fn head_commit(&self) -> Result<Oid>;

    /// Name of the checked-out branch, or `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>>;

    /// Push URL of the named remote, or `None` if no such remote exists.
    ///
    /// Falls back to the fetch URL when no explicit push URL is configured.
    fn remote_push_url(&self, remote: &str) -> Result<Option<String>>;

    /// Sets the author/committer identity for commits created by this handle.
    fn set_identity(&mut self, name: &str, email: &str) -> Result<()>;

    /// Stages every working-tree change, including deletions.
    fn stage_all(&mut self) -> Result<()>;

    /// Commits the staged index on top of HEAD.
    fn commit(&mut self, message: &str) -> Result<Oid>;

    /// Commits only the given paths on top of HEAD.
    fn commit_paths(&mut self, message: &str, paths: &[&Path]) -> Result<Oid>;

    /// Creates a lightweight tag pointing at `target`.
    fn create_tag(&mut self, name: &str, target: Oid) -> Result<()>;

    /// Pushes `branch` and the listed tags to `remote`.
    fn push_branch(&mut self, remote: &str, branch: &str, tags: &[&str]) -> Result<()>;

    /// Pushes every local tag to `remote`.
    fn push_tags(&mut self, remote: &str) -> Result<()>;

    /// Fetches all branches and tags from `remote`.
    fn fetch(&mut self, remote: &str) -> Result<()>;

    /// Fetches the complete history from `remote` if the clone is shallow.
    fn unshallow(&mut self, remote: &str) -> Result<()>;

    /// Switches the working tree to a local branch, creating it from
    /// `<remote>/<branch>` when it does not exist yet.
    fn checkout_branch(&mut self, remote: &str, branch: &str) -> Result<()>;

    /// Switches the working tree to a commit with a detached HEAD.
    fn checkout_detached(&mut self, commit: Oid) -> Result<()>;

    /// Resolves a tag name, branch name or hash to a commit.
    fn resolve_commit(&self, reference: &str) -> Result<Oid>;

    /// Commits reachable from `to` but not from `from`, newest first.
    fn log_range(&self, from: Oid, to: Oid) -> Result<Vec<CommitLogEntry>>;

    /// The root commit of the history reachable from `from`.
    fn earliest_commit(&self, from: Oid) -> Result<Oid>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        let entry = CommitLogEntry {
            hash: "0123456789abcdef".to_string(),
            author_name: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
            subject: "Add widgets".to_string(),
            body: None,
        };
        assert_eq!(entry.short_hash(), "0123456");
    }

    #[test]
    fn test_short_hash_of_short_input() {
        let entry = CommitLogEntry {
            hash: "abc".to_string(),
            author_name: String::new(),
            author_email: String::new(),
            subject: String::new(),
            body: None,
        };
        assert_eq!(entry.short_hash(), "abc");
    }
}
