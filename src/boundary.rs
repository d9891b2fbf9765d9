use std::fmt;

/// Non-fatal conditions met while assembling a release.
/// These are logged as warnings and never abort the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// The hosting platform has no published release yet
    NoPriorRelease { fallback_commit: String },
    /// The latest release could not be retrieved
    LatestReleaseUnavailable {
        reason: String,
        fallback_commit: String,
    },
    /// No commits between the previous release and the released commit
    NoNewCommits { from: String, to: String },
}

fn short(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoPriorRelease { fallback_commit } => write!(
                f,
                "No previous release found, listing changes since first commit {}",
                short(fallback_commit)
            ),
            BoundaryWarning::LatestReleaseUnavailable {
                reason,
                fallback_commit,
            } => write!(
                f,
                "Unable to find latest release ({}), listing changes since first commit {}",
                reason,
                short(fallback_commit)
            ),
            BoundaryWarning::NoNewCommits { from, to } => write!(
                f,
                "No new commits between {} and {}",
                short(from),
                short(to)
            ),
        }
    }
}
