use semver::Version;
use tracing::info;

use crate::error::{ReleaseError, Result};
use crate::hosting::{HostingPlatform, ReleaseDraft, ReleaseHandle};
use crate::locator::RepoIdentity;

/// Submits release notes as a draft release named and tagged with `version`.
///
/// The draft is left unpublished. Any rejection by the platform is reported
/// as [ReleaseError::Publish].
pub fn publish<H: HostingPlatform + ?Sized>(
    hosting: &H,
    identity: &RepoIdentity,
    version: &Version,
    body: &str,
) -> Result<ReleaseHandle> {
    let draft = ReleaseDraft::new(version.to_string(), body);

    let handle = hosting
        .create_release(identity, &draft)
        .map_err(|e| ReleaseError::publish(format!("{} ({})", draft.tag_name, e)))?;

    info!(name = %handle.name, url = %handle.url, "created draft release");
    Ok(handle)
}
