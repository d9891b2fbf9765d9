//! Release notes assembled from the commit log since the last release.

use std::fmt::Write;

use git2::Oid;
use semver::Version;
use tracing::{info, warn};

use crate::boundary::BoundaryWarning;
use crate::error::Result;
use crate::git::{CommitLogEntry, Repository};
use crate::hosting::{HostingPlatform, LatestRelease};
use crate::locator::{RepoIdentity, ORIGIN};

/// Where the changelog range begins (exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeStart {
    /// The tag of the latest published release
    Release { tag: String, commit: Oid },
    /// The earliest reachable commit, used when there is no usable release
    FirstCommit(Oid),
}

impl RangeStart {
    pub fn commit(&self) -> Oid {
        match self {
            RangeStart::Release { commit, .. } => *commit,
            RangeStart::FirstCommit(commit) => *commit,
        }
    }
}

/// Determines the start of the changelog range.
///
/// Uses the latest release's tag when the platform reports one. A missing
/// release or a failed lookup falls back to the earliest commit reachable
/// from `to_commit`; both cases are logged, neither is an error.
pub fn range_start<R, H>(
    repo: &R,
    hosting: &H,
    identity: &RepoIdentity,
    to_commit: Oid,
) -> Result<RangeStart>
where
    R: Repository + ?Sized,
    H: HostingPlatform + ?Sized,
{
    let fallback_warning = match hosting.latest_release(identity) {
        Ok(LatestRelease::Found { tag_name }) => {
            let commit = repo.resolve_commit(&tag_name)?;
            info!(tag = %tag_name, %commit, "changelog starts at latest release");
            return Ok(RangeStart::Release {
                tag: tag_name,
                commit,
            });
        }
        Ok(LatestRelease::NotFound) => None,
        Err(e) => Some(e.to_string()),
    };

    let first = repo.earliest_commit(to_commit)?;
    let warning = match fallback_warning {
        None => BoundaryWarning::NoPriorRelease {
            fallback_commit: first.to_string(),
        },
        Some(reason) => BoundaryWarning::LatestReleaseUnavailable {
            reason,
            fallback_commit: first.to_string(),
        },
    };
    warn!("{}", warning);

    Ok(RangeStart::FirstCommit(first))
}

/// Assembles the release notes for `version` covering `(last release, to_commit]`.
///
/// Fetches the full history first so the earliest-commit fallback is not
/// cut short by a shallow clone.
pub fn assemble<R, H>(
    repo: &mut R,
    hosting: &H,
    identity: &RepoIdentity,
    to_commit: Oid,
    version: &Version,
) -> Result<String>
where
    R: Repository + ?Sized,
    H: HostingPlatform + ?Sized,
{
    repo.unshallow(ORIGIN)?;

    let start = range_start(&*repo, hosting, identity, to_commit)?;
    let entries = repo.log_range(start.commit(), to_commit)?;

    if entries.is_empty() {
        warn!(
            "{}",
            BoundaryWarning::NoNewCommits {
                from: start.commit().to_string(),
                to: to_commit.to_string(),
            }
        );
    }
    info!(commits = entries.len(), "assembled changelog");

    Ok(render(version, &entries))
}

/// Renders the changelog document, commits in the order given.
pub fn render(version: &Version, entries: &[CommitLogEntry]) -> String {
    let mut out = format!("# Release {}:\n\n## Changes:\n", version);
    for entry in entries {
        out.push('\n');
        out.push_str(&render_entry(entry));
    }
    out
}

/// One commit as a collapsible block.
fn render_entry(entry: &CommitLogEntry) -> String {
    let mut message = entry.subject.clone();
    if let Some(body) = &entry.body {
        message.push_str("\n\n");
        message.push_str(body);
    }

    let mut block = String::new();
    // Writing to a String cannot fail
    let _ = write!(
        block,
        "<details>\n  <summary>{}: {}</summary>\n\n  {}\n\n  _By: [{}](mailto:{})_\n\n</details>\n",
        entry.short_hash(),
        entry.subject,
        message,
        entry.author_name,
        entry.author_email
    );
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{GitOperation, MockRepository};
    use crate::hosting::MockHosting;

    fn oid(byte: u8) -> Oid {
        Oid::from_bytes(&[byte; 20]).unwrap()
    }

    fn entry(byte: u8, subject: &str, body: Option<&str>) -> CommitLogEntry {
        CommitLogEntry {
            hash: oid(byte).to_string(),
            author_name: "Ada Lovelace".to_string(),
            author_email: "ada@example.com".to_string(),
            subject: subject.to_string(),
            body: body.map(str::to_string),
        }
    }

    fn identity(head: Oid) -> RepoIdentity {
        RepoIdentity {
            organization: "acme".to_string(),
            repository: "widgets".to_string(),
            head_commit: head,
        }
    }

    /// History, newest first: c4 <- c3 <- c2 <- c1
    fn repo() -> MockRepository {
        let mut repo = MockRepository::new(oid(0xc4), "main");
        repo.add_commit(entry(0xc4, "Add gears", Some("Gears turn.\n\nCloses #4")));
        repo.add_commit(entry(0xc3, "Fix sprockets", None));
        repo.add_commit(entry(0xc2, "Add sprockets", None));
        repo.add_commit(entry(0xc1, "Initial commit", None));
        repo.add_tag("1.0.0", oid(0xc2));
        repo
    }

    #[test]
    fn test_render_entry() {
        let rendered = render_entry(&entry(0xab, "Add gears", Some("Gears turn.")));
        assert_eq!(
            rendered,
            "<details>\n  <summary>abababa: Add gears</summary>\n\n  Add gears\n\nGears turn.\n\n  _By: [Ada Lovelace](mailto:ada@example.com)_\n\n</details>\n"
        );
    }

    #[test]
    fn test_render_without_entries() {
        let version = Version::parse("1.0.1-0").unwrap();
        assert_eq!(render(&version, &[]), "# Release 1.0.1-0:\n\n## Changes:\n");
    }

    #[test]
    fn test_assemble_since_latest_release() {
        let mut repo = repo();
        let hosting = MockHosting::new("main").with_latest_release("1.0.0");
        let version = Version::parse("1.0.1-0").unwrap();

        let notes = assemble(&mut repo, &hosting, &identity(oid(0xc4)), oid(0xc4), &version)
            .unwrap();

        assert!(notes.starts_with("# Release 1.0.1-0:\n\n## Changes:\n"));
        let gears = notes.find("Add gears").unwrap();
        let fix = notes.find("Fix sprockets").unwrap();
        assert!(gears < fix, "newest commit must come first");
        assert!(!notes.contains("Add sprockets"));
        assert!(notes.contains("Gears turn.\n\nCloses #4"));
        assert_eq!(notes.matches("<details>").count(), 2);
        assert_eq!(
            repo.operations(),
            &[GitOperation::Unshallow {
                remote: "origin".to_string()
            }]
        );
    }

    #[test]
    fn test_falls_back_to_first_commit_without_release() {
        let repo = repo();
        let hosting = MockHosting::new("main");

        let start = range_start(&repo, &hosting, &identity(oid(0xc4)), oid(0xc4)).unwrap();
        assert_eq!(start, RangeStart::FirstCommit(oid(0xc1)));
    }

    #[test]
    fn test_falls_back_to_first_commit_on_lookup_error() {
        let mut repo = repo();
        let hosting = MockHosting::new("main").with_latest_release_error("status 500");
        let version = Version::parse("0.0.1-0").unwrap();

        let notes = assemble(&mut repo, &hosting, &identity(oid(0xc4)), oid(0xc4), &version)
            .unwrap();

        assert!(notes.starts_with("# Release 0.0.1-0:"));
        assert_eq!(notes.matches("<details>").count(), 3);
        assert!(!notes.contains("Initial commit"));
    }

    #[test]
    fn test_single_commit_history() {
        let mut repo = MockRepository::new(oid(0xc2), "main");
        repo.add_commit(entry(0xc2, "Add sprockets", None));
        repo.add_commit(entry(0xc1, "Initial commit", None));
        let version = Version::parse("0.1.1-0").unwrap();

        let notes = assemble(
            &mut repo,
            &MockHosting::new("main"),
            &identity(oid(0xc2)),
            oid(0xc2),
            &version,
        )
        .unwrap();

        assert_eq!(notes.matches("<details>").count(), 1);
        assert!(notes.contains("c2c2c2c: Add sprockets"));
    }

    #[test]
    fn test_empty_range_yields_heading_only() {
        let mut repo = repo();
        repo.add_tag("1.0.1", oid(0xc4));
        let hosting = MockHosting::new("main").with_latest_release("1.0.1");
        let version = Version::parse("1.0.2-0").unwrap();

        let notes = assemble(&mut repo, &hosting, &identity(oid(0xc4)), oid(0xc4), &version)
            .unwrap();

        assert_eq!(notes, "# Release 1.0.2-0:\n\n## Changes:\n");
    }
}
