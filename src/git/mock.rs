use crate::error::{ReleaseError, Result};
use crate::git::{CommitLogEntry, Repository};
use git2::Oid;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A state-changing call recorded by [MockRepository].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOperation {
    SetIdentity { name: String, email: String },
    StageAll,
    Commit { message: String, id: Oid },
    CommitPaths { message: String, paths: Vec<PathBuf>, id: Oid },
    CreateTag { name: String, target: Oid },
    PushBranch { remote: String, branch: String, tags: Vec<String> },
    PushTags { remote: String },
    Fetch { remote: String },
    Unshallow { remote: String },
    CheckoutBranch { remote: String, branch: String },
    CheckoutDetached { commit: Oid },
}

/// Mock repository for testing without actual git operations
///
/// History is linear and stored newest first. Commits created through the
/// trait get deterministic ids and are prepended to that history.
pub struct MockRepository {
    head: Oid,
    branch: Option<String>,
    remotes: HashMap<String, String>,
    branches: HashMap<String, Oid>,
    tags: HashMap<String, Oid>,
    history: Vec<CommitLogEntry>,
    checkout_files: HashMap<String, Vec<(PathBuf, String)>>,
    next_commit: u8,
    operations: Vec<GitOperation>,
}

impl MockRepository {
    /// Create a mock checkout of `branch` whose HEAD is `head`
    pub fn new(head: Oid, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let mut branches = HashMap::new();
        branches.insert(branch.clone(), head);

        MockRepository {
            head,
            branch: Some(branch),
            remotes: HashMap::new(),
            branches,
            tags: HashMap::new(),
            history: Vec::new(),
            checkout_files: HashMap::new(),
            next_commit: 1,
            operations: Vec::new(),
        }
    }

    /// Configure a remote with the given push URL
    pub fn add_remote(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.remotes.insert(name.into(), url.into());
    }

    /// Append a commit to the history; call oldest last
    pub fn add_commit(&mut self, entry: CommitLogEntry) {
        self.history.push(entry);
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&mut self, name: impl Into<String>, oid: Oid) {
        self.tags.insert(name.into(), oid);
    }

    /// Set a branch head
    pub fn set_branch_head(&mut self, branch: impl Into<String>, oid: Oid) {
        self.branches.insert(branch.into(), oid);
    }

    /// Write `content` to `path` whenever `branch` is checked out
    pub fn on_checkout_write(
        &mut self,
        branch: impl Into<String>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) {
        self.checkout_files
            .entry(branch.into())
            .or_default()
            .push((path.into(), content.into()));
    }

    /// Every state-changing call made so far, in order
    pub fn operations(&self) -> &[GitOperation] {
        &self.operations
    }

    /// The commit a tag points at, if it was created or added
    pub fn tag_target(&self, name: &str) -> Option<Oid> {
        self.tags.get(name).copied()
    }

    fn new_commit(&mut self, message: &str) -> Result<Oid> {
        let id = Oid::from_bytes(&[self.next_commit; 20])?;
        self.next_commit = self.next_commit.wrapping_add(1);

        self.history.insert(
            0,
            CommitLogEntry {
                hash: id.to_string(),
                author_name: "GitHub Action".to_string(),
                author_email: "github-action@users.noreply.github.com".to_string(),
                subject: message.lines().next().unwrap_or_default().to_string(),
                body: None,
            },
        );

        self.head = id;
        if let Some(branch) = &self.branch {
            self.branches.insert(branch.clone(), id);
        }
        Ok(id)
    }

    fn position(&self, oid: Oid) -> Option<usize> {
        let hash = oid.to_string();
        self.history.iter().position(|entry| entry.hash == hash)
    }
}

impl Repository for MockRepository {
    fn head_commit(&self) -> Result<Oid> {
        Ok(self.head)
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.branch.clone())
    }

    fn remote_push_url(&self, remote: &str) -> Result<Option<String>> {
        Ok(self.remotes.get(remote).cloned())
    }

    fn set_identity(&mut self, name: &str, email: &str) -> Result<()> {
        self.operations.push(GitOperation::SetIdentity {
            name: name.to_string(),
            email: email.to_string(),
        });
        Ok(())
    }

    fn stage_all(&mut self) -> Result<()> {
        self.operations.push(GitOperation::StageAll);
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<Oid> {
        let id = self.new_commit(message)?;
        self.operations.push(GitOperation::Commit {
            message: message.to_string(),
            id,
        });
        Ok(id)
    }

    fn commit_paths(&mut self, message: &str, paths: &[&Path]) -> Result<Oid> {
        let id = self.new_commit(message)?;
        self.operations.push(GitOperation::CommitPaths {
            message: message.to_string(),
            paths: paths.iter().map(|p| p.to_path_buf()).collect(),
            id,
        });
        Ok(id)
    }

    fn create_tag(&mut self, name: &str, target: Oid) -> Result<()> {
        if self.tags.contains_key(name) {
            return Err(ReleaseError::Git(git2::Error::from_str(&format!(
                "tag '{}' already exists",
                name
            ))));
        }
        self.tags.insert(name.to_string(), target);
        self.operations.push(GitOperation::CreateTag {
            name: name.to_string(),
            target,
        });
        Ok(())
    }

    fn push_branch(&mut self, remote: &str, branch: &str, tags: &[&str]) -> Result<()> {
        self.operations.push(GitOperation::PushBranch {
            remote: remote.to_string(),
            branch: branch.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        Ok(())
    }

    fn push_tags(&mut self, remote: &str) -> Result<()> {
        self.operations.push(GitOperation::PushTags {
            remote: remote.to_string(),
        });
        Ok(())
    }

    fn fetch(&mut self, remote: &str) -> Result<()> {
        self.operations.push(GitOperation::Fetch {
            remote: remote.to_string(),
        });
        Ok(())
    }

    fn unshallow(&mut self, remote: &str) -> Result<()> {
        self.operations.push(GitOperation::Unshallow {
            remote: remote.to_string(),
        });
        Ok(())
    }

    fn checkout_branch(&mut self, remote: &str, branch: &str) -> Result<()> {
        let head = self.branches.get(branch).copied().ok_or_else(|| {
            ReleaseError::config(format!("Cannot find branch '{}'", branch))
        })?;

        if let Some(files) = self.checkout_files.get(branch) {
            for (path, content) in files {
                fs::write(path, content)?;
            }
        }

        self.head = head;
        self.branch = Some(branch.to_string());
        self.operations.push(GitOperation::CheckoutBranch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn checkout_detached(&mut self, commit: Oid) -> Result<()> {
        self.head = commit;
        self.branch = None;
        self.operations.push(GitOperation::CheckoutDetached { commit });
        Ok(())
    }

    fn resolve_commit(&self, reference: &str) -> Result<Oid> {
        if let Some(oid) = self.tags.get(reference).or_else(|| self.branches.get(reference)) {
            return Ok(*oid);
        }
        Ok(Oid::from_str(reference)?)
    }

    fn log_range(&self, from: Oid, to: Oid) -> Result<Vec<CommitLogEntry>> {
        let start = match self.position(to) {
            Some(index) => index,
            None => return Ok(Vec::new()),
        };
        let from_hash = from.to_string();

        Ok(self.history[start..]
            .iter()
            .take_while(|entry| entry.hash != from_hash)
            .cloned()
            .collect())
    }

    fn earliest_commit(&self, from: Oid) -> Result<Oid> {
        let start = self.position(from).unwrap_or(0);
        match self.history[start..].last() {
            Some(entry) => Ok(Oid::from_str(&entry.hash)?),
            None => Ok(from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8, subject: &str) -> CommitLogEntry {
        CommitLogEntry {
            hash: Oid::from_bytes(&[byte; 20]).unwrap().to_string(),
            author_name: "Ada".to_string(),
            author_email: "ada@example.com".to_string(),
            subject: subject.to_string(),
            body: None,
        }
    }

    fn oid(byte: u8) -> Oid {
        Oid::from_bytes(&[byte; 20]).unwrap()
    }

    #[test]
    fn test_mock_log_range() {
        let mut repo = MockRepository::new(oid(0xc3), "main");
        repo.add_commit(entry(0xc3, "third"));
        repo.add_commit(entry(0xc2, "second"));
        repo.add_commit(entry(0xc1, "first"));

        let log = repo.log_range(oid(0xc1), oid(0xc3)).unwrap();
        let subjects: Vec<_> = log.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["third", "second"]);

        assert!(repo.log_range(oid(0xc3), oid(0xc3)).unwrap().is_empty());
        assert_eq!(repo.earliest_commit(oid(0xc3)).unwrap(), oid(0xc1));
    }

    #[test]
    fn test_mock_commit_moves_head_and_branch() {
        let mut repo = MockRepository::new(oid(0xaa), "main");
        let id = repo.commit("CI: Prerelease: 1.0.1-0").unwrap();

        assert_eq!(repo.head_commit().unwrap(), id);
        assert_eq!(repo.resolve_commit("main").unwrap(), id);
        assert_eq!(
            repo.operations(),
            &[GitOperation::Commit {
                message: "CI: Prerelease: 1.0.1-0".to_string(),
                id
            }]
        );
    }

    #[test]
    fn test_mock_duplicate_tag_fails() {
        let mut repo = MockRepository::new(oid(0xaa), "main");
        repo.create_tag("1.0.0", oid(0xaa)).unwrap();
        assert!(repo.create_tag("1.0.0", oid(0xaa)).is_err());
        assert_eq!(repo.tag_target("1.0.0"), Some(oid(0xaa)));
    }

    #[test]
    fn test_mock_checkout_detached() {
        let mut repo = MockRepository::new(oid(0xaa), "main");
        repo.checkout_detached(oid(0xbb)).unwrap();
        assert_eq!(repo.current_branch().unwrap(), None);
        assert_eq!(repo.head_commit().unwrap(), oid(0xbb));
    }
}
