use std::cell::Cell;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, Oid, Repository as Git2Repo, Sort};
use tracing::{debug, warn};

use crate::error::{ReleaseError, Result};
use crate::git::CommitLogEntry;

/// libgit2 asks again after a rejected credential; give up after this many tries.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    token: Option<String>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo, token: None })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo, token: None }
    }

    /// Authenticate HTTPS remotes with a hosting platform access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds remote callbacks that supply credentials.
    ///
    /// Tries, in order: the access token over HTTPS, SSH keys from `~/.ssh/`,
    /// the SSH agent, and finally git's default credentials.
    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let token = self.token.as_deref();
        let attempts = Cell::new(0usize);

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("Authentication failed"));
            }

            if let Some(token) = token {
                if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                    return git2::Cred::userpass_plaintext("x-access-token", token);
                }
            }

            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let username = username_from_url.unwrap_or("git");
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });

        callbacks
    }

    fn push_refspecs(&self, remote_name: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self.find_remote(remote_name)?;

        let mut callbacks = self.remote_callbacks();
        // A rejected ref update does not fail `push` by itself
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => {
                warn!("Could not update reference {}: {}", refname, status);
                Err(git2::Error::from_str(&format!(
                    "Push rejected for {}: {}",
                    refname, status
                )))
            }
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();
        debug!(remote = remote_name, refspecs = ?refspec_strs, "pushing");

        remote
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| match e.class() {
                git2::ErrorClass::Net => {
                    ReleaseError::Git(git2::Error::from_str(&format!(
                        "Network error during push to '{}': {}",
                        remote_name, e
                    )))
                }
                _ => ReleaseError::Git(e),
            })
    }

    fn fetch_with_depth(&self, remote_name: &str, depth: Option<i32>) -> Result<()> {
        let mut remote = self.find_remote(remote_name)?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());
        if let Some(depth) = depth {
            fetch_options.depth(depth);
        }

        // - "+refs/heads/*:refs/remotes/{remote}/*" - all remote branches
        // - "+refs/tags/*:refs/tags/*" - all tags
        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote_name);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];
        remote.fetch(&refspecs, Some(&mut fetch_options), None)?;

        Ok(())
    }

    fn find_remote(&self, remote_name: &str) -> Result<git2::Remote<'_>> {
        self.repo.find_remote(remote_name).map_err(|e| {
            ReleaseError::config(format!("Cannot find remote '{}': {}", remote_name, e))
        })
    }

    /// Makes a local branch match its remote counterpart.
    ///
    /// Creates the branch from `<remote>/<branch>` when it does not exist locally,
    /// and fast-forwards it when the remote is strictly ahead. Diverged branches
    /// are left alone.
    fn update_branch_from_remote(&self, remote_name: &str, branch_name: &str) -> Result<()> {
        let remote_ref_name = format!("refs/remotes/{}/{}", remote_name, branch_name);
        let remote_oid = match self.repo.find_reference(&remote_ref_name) {
            Ok(reference) => reference.peel_to_commit()?.id(),
            // Remote branch doesn't exist, nothing to update
            Err(_) => return Ok(()),
        };

        let local_branch = match self.repo.find_branch(branch_name, BranchType::Local) {
            Ok(branch) => branch,
            Err(_) => {
                let remote_commit = self.repo.find_commit(remote_oid)?;
                let mut branch = self.repo.branch(branch_name, &remote_commit, false)?;
                let upstream = format!("{}/{}", remote_name, branch_name);
                branch.set_upstream(Some(upstream.as_str()))?;
                debug!(branch = branch_name, "created local branch from remote");
                return Ok(());
            }
        };

        let mut local_ref = local_branch.into_reference();
        let local_oid = match local_ref.target() {
            Some(oid) => oid,
            None => return Ok(()),
        };

        if local_oid != remote_oid && self.repo.graph_descendant_of(remote_oid, local_oid)? {
            local_ref.set_target(
                remote_oid,
                &format!("fast-forward from {}/{}", remote_name, branch_name),
            )?;
            debug!(branch = branch_name, "fast-forwarded local branch");
        }

        Ok(())
    }

    fn commit_index(&self, index: &mut git2::Index, message: &str) -> Result<Oid> {
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        Ok(oid)
    }

    /// Path of `path` relative to the working directory root.
    fn workdir_relative(&self, path: &Path) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::config("Repository has no working directory"))?
            .canonicalize()?;

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let absolute = absolute.canonicalize()?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::config(format!(
                    "'{}' is outside the repository at '{}'",
                    path.display(),
                    workdir.display()
                ))
            })
    }
}

impl super::Repository for Git2Repository {
    fn head_commit(&self) -> Result<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    fn current_branch(&self) -> Result<Option<String>> {
        if self.repo.head_detached()? {
            return Ok(None);
        }
        let head = self.repo.head()?;
        Ok(head.shorthand().map(str::to_string))
    }

    fn remote_push_url(&self, remote: &str) -> Result<Option<String>> {
        let remotes = self.repo.remotes()?;
        if !remotes.iter().flatten().any(|name| name == remote) {
            return Ok(None);
        }

        let remote = self.repo.find_remote(remote)?;
        Ok(remote.pushurl().or_else(|| remote.url()).map(str::to_string))
    }

    fn set_identity(&mut self, name: &str, email: &str) -> Result<()> {
        let mut config = self.repo.config()?.open_level(git2::ConfigLevel::Local)?;
        config.set_str("user.name", name)?;
        config.set_str("user.email", email)?;
        Ok(())
    }

    fn stage_all(&mut self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        self.commit_index(&mut index, message)
    }

    fn commit_paths(&mut self, message: &str, paths: &[&Path]) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let head_tree = self.repo.head()?.peel_to_tree()?;
        index.read_tree(&head_tree)?;

        for path in paths {
            let relative = self.workdir_relative(path)?;
            index.add_path(&relative)?;
        }
        index.write()?;

        self.commit_index(&mut index, message)
    }

    fn create_tag(&mut self, name: &str, target: Oid) -> Result<()> {
        let object = self.repo.find_object(target, None)?;
        self.repo.tag_lightweight(name, &object, false)?;
        Ok(())
    }

    fn push_branch(&mut self, remote: &str, branch: &str, tags: &[&str]) -> Result<()> {
        let mut refspecs = vec![format!("refs/heads/{}:refs/heads/{}", branch, branch)];
        refspecs.extend(
            tags.iter()
                .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag)),
        );
        self.push_refspecs(remote, &refspecs)
    }

    fn push_tags(&mut self, remote: &str) -> Result<()> {
        let tags = self.repo.tag_names(None)?;
        let refspecs: Vec<String> = tags
            .iter()
            .flatten()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();

        if refspecs.is_empty() {
            return Ok(());
        }
        self.push_refspecs(remote, &refspecs)
    }

    fn fetch(&mut self, remote: &str) -> Result<()> {
        self.fetch_with_depth(remote, None)
    }

    fn unshallow(&mut self, remote: &str) -> Result<()> {
        if self.repo.is_shallow() {
            // i32::MAX is libgit2's "unshallow" depth
            self.fetch_with_depth(remote, Some(i32::MAX))
        } else {
            self.fetch_with_depth(remote, None)
        }
    }

    fn checkout_branch(&mut self, remote: &str, branch: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", branch);

        // HEAD must stay on the old commit while the branch is fast-forwarded,
        // otherwise the checkout below compares against the new tree and
        // leaves the old files on disk
        let head = self.repo.head()?;
        if head.name() == Some(refname.as_str()) {
            let current = head.peel_to_commit()?.id();
            self.repo.set_head_detached(current)?;
        }

        self.update_branch_from_remote(remote, branch)?;

        let target = self
            .repo
            .find_reference(&refname)
            .map_err(|e| ReleaseError::config(format!("Cannot find branch '{}': {}", branch, e)))?
            .peel_to_commit()?;

        self.repo
            .checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        Ok(())
    }

    fn checkout_detached(&mut self, commit: Oid) -> Result<()> {
        let target = self.repo.find_commit(commit)?;
        self.repo
            .checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head_detached(commit)?;
        Ok(())
    }

    fn resolve_commit(&self, reference: &str) -> Result<Oid> {
        if let Ok(tag) = self.repo.find_reference(&format!("refs/tags/{}", reference)) {
            return Ok(tag.peel_to_commit()?.id());
        }
        Ok(self.repo.revparse_single(reference)?.peel_to_commit()?.id())
    }

    fn log_range(&self, from: Oid, to: Oid) -> Result<Vec<CommitLogEntry>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(to)?;
        revwalk.hide(from)?;

        let mut entries = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let author = commit.author();
            let body = commit
                .body()
                .map(str::trim)
                .filter(|body| !body.is_empty())
                .map(str::to_string);

            entries.push(CommitLogEntry {
                hash: commit.id().to_string(),
                author_name: author.name().unwrap_or("unknown").to_string(),
                author_email: author.email().unwrap_or_default().to_string(),
                subject: commit.summary().unwrap_or_default().to_string(),
                body,
            });
        }

        Ok(entries)
    }

    fn earliest_commit(&self, from: Oid) -> Result<Oid> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(from)?;

        match revwalk.next() {
            Some(oid) => Ok(oid?),
            None => Err(ReleaseError::Git(git2::Error::from_str("History is empty"))),
        }
    }
}
