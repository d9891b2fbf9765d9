//! Release workflow orchestration
//!
//! Implements the two release transitions on top of the version-control and
//! hosting capabilities. This keeps the CLI layer down to argument parsing
//! and error reporting.
//!
//! - `prerelease`: bump to the next prerelease, commit, tag and push that
//!   commit, then draft release notes for the commit that was checked out
//!   when the run started.
//! - `postrelease`: after a release is published, bump the default branch to
//!   the next patch version and tag the released commit with it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use git2::Oid;
use semver::Version;
use tracing::info;

use crate::changelog;
use crate::config::Config;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::hosting::{HostingPlatform, ReleaseHandle};
use crate::locator::{self, RepoIdentity, ORIGIN};
use crate::publisher;
use crate::version::{increment, Increment};
use crate::version_file;

/// The two release transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Prerelease,
    Postrelease,
}

impl FromStr for Action {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prerelease" => Ok(Action::Prerelease),
            "postrelease" => Ok(Action::Postrelease),
            other => Err(ReleaseError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Prerelease => write!(f, "prerelease"),
            Action::Postrelease => write!(f, "postrelease"),
        }
    }
}

/// Arguments for the release workflow
///
/// Mirrors the CLI arguments without depending on clap, so the workflow can
/// be driven programmatically.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWorkflowArgs {
    /// Action name; parsed by the workflow so unknown names abort before any change
    pub action: String,

    /// Path to the JSON file holding the version
    pub version_file: PathBuf,
}

/// Result of a successful release workflow
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    pub action: Action,

    /// Version read from the version file before the bump
    pub previous_version: Version,

    /// Version written and tagged
    pub version: Version,

    /// The tag that was created
    pub tag: String,

    /// The commit the tag points at
    pub tagged_commit: Oid,

    /// Draft release created by `prerelease`
    pub release: Option<ReleaseHandle>,
}

/// Main release workflow
///
/// 1. Parse the action (unknown actions fail before anything is touched)
/// 2. Configure the commit identity
/// 3. Locate the repository on the hosting platform
/// 4. Run the requested transition
pub fn run_release_workflow<R, H>(
    repo: &mut R,
    hosting: &H,
    args: &ReleaseWorkflowArgs,
    config: &Config,
) -> Result<WorkflowResult>
where
    R: Repository + ?Sized,
    H: HostingPlatform + ?Sized,
{
    let action: Action = args.action.parse()?;

    repo.set_identity(&config.identity.name, &config.identity.email)?;
    let identity = locator::locate(&*repo)?;

    info!(%action, "starting release workflow");
    match action {
        Action::Prerelease => prerelease(repo, hosting, &identity, &args.version_file),
        Action::Postrelease => postrelease(repo, hosting, &identity, &args.version_file),
    }
}

/// Bumps to the next prerelease, tags the bump commit and drafts release notes.
///
/// The notes cover the commits up to `identity.head_commit`, the commit that
/// was checked out before the bump.
pub fn prerelease<R, H>(
    repo: &mut R,
    hosting: &H,
    identity: &RepoIdentity,
    version_file: &Path,
) -> Result<WorkflowResult>
where
    R: Repository + ?Sized,
    H: HostingPlatform + ?Sized,
{
    let branch = repo
        .current_branch()?
        .ok_or_else(|| ReleaseError::config("Cannot prerelease from a detached HEAD"))?;

    let current = version_file::fetch(version_file)?;
    info!(version = %current, "current version");

    let next = increment(&current, Increment::Prerelease)?;
    version_file::set(version_file, &next)?;
    info!(version = %next, "new version");

    let tag = next.to_string();

    repo.stage_all()?;
    let commit = repo.commit(&format!("CI: Prerelease: {}", next))?;
    info!(%commit, "committed new version");

    repo.create_tag(&tag, commit)?;
    info!(%tag, "created tag");

    // The second push is what the release pipeline has always done; the first
    // already carries the tag.
    repo.push_branch(ORIGIN, &branch, &[tag.as_str()])?;
    repo.push_tags(ORIGIN)?;
    info!(%branch, %tag, "pushed");

    let body = changelog::assemble(repo, hosting, identity, identity.head_commit, &next)?;
    let release = publisher::publish(hosting, identity, &next, &body)?;

    Ok(WorkflowResult {
        action: Action::Prerelease,
        previous_version: current,
        version: next,
        tag,
        tagged_commit: commit,
        release: Some(release),
    })
}

/// Advances the default branch to the next patch version and tags the released commit.
///
/// `identity.head_commit` is the commit that was released. The version bump
/// is committed to the default branch only; the new tag goes on the released
/// commit. The bump is always a patch bump, whatever the prerelease cycle
/// contained.
pub fn postrelease<R, H>(
    repo: &mut R,
    hosting: &H,
    identity: &RepoIdentity,
    version_file: &Path,
) -> Result<WorkflowResult>
where
    R: Repository + ?Sized,
    H: HostingPlatform + ?Sized,
{
    let released = identity.head_commit;
    let default_branch = hosting.default_branch(identity)?;
    info!(branch = %default_branch, "default branch");

    repo.fetch(ORIGIN)?;
    repo.checkout_branch(ORIGIN, &default_branch)?;

    let current = version_file::fetch(version_file)?;
    info!(version = %current, branch = %default_branch, "current version");

    let next = increment(&current, Increment::Patch)?;
    version_file::set(version_file, &next)?;
    info!(version = %next, "new version");

    let commit = repo.commit_paths(&format!("CI: Postrelease: {}", next), &[version_file])?;
    info!(%commit, "committed new version");

    repo.push_branch(ORIGIN, &default_branch, &[])?;
    info!(branch = %default_branch, "pushed");

    let tag = next.to_string();
    repo.checkout_detached(released)?;
    repo.create_tag(&tag, released)?;
    info!(%tag, commit = %released, "created tag");

    repo.push_tags(ORIGIN)?;
    info!(%tag, "pushed tags");

    Ok(WorkflowResult {
        action: Action::Postrelease,
        previous_version: current,
        version: next,
        tag,
        tagged_commit: released,
        release: None,
    })
}
