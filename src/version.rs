use semver::{BuildMetadata, Prerelease, Version};

use crate::error::{ReleaseError, Result};

/// Represents the kind of semantic version increment to apply.
///
/// The release workflow only ever uses `Prerelease` (while preparing a draft)
/// and `Patch` (after a draft has been published).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    Major,
    Minor,
    Patch,
    Prerelease,
}

/// Increments a version according to the specified increment kind.
///
/// - **Major**: major += 1, minor = 0, patch = 0
/// - **Minor**: minor += 1, patch = 0
/// - **Patch**: patch += 1
/// - **Prerelease**: on a stable version, patch += 1 and the prerelease becomes `0`;
///   on a prerelease, the last numeric identifier is incremented, or `.0` is appended
///   when there is none
///
/// Stable increments clear the prerelease component. Build metadata is always dropped.
///
/// # Example
/// ```ignore
/// let v = Version::parse("1.2.3")?;
/// assert_eq!(increment(&v, Increment::Prerelease)?.to_string(), "1.2.4-0");
/// assert_eq!(increment(&v, Increment::Patch)?.to_string(), "1.2.4");
/// ```
pub fn increment(version: &Version, kind: Increment) -> Result<Version> {
    let mut next = version.clone();
    next.build = BuildMetadata::EMPTY;

    match kind {
        Increment::Major => {
            next.major = bump(version.major, "major")?;
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        Increment::Minor => {
            next.minor = bump(version.minor, "minor")?;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        Increment::Patch => {
            next.patch = bump(version.patch, "patch")?;
            next.pre = Prerelease::EMPTY;
        }
        Increment::Prerelease => {
            if version.pre.is_empty() {
                next.patch = bump(version.patch, "patch")?;
                next.pre = prerelease("0")?;
            } else {
                next.pre = prerelease(&next_prerelease(version.pre.as_str()))?;
            }
        }
    }

    Ok(next)
}

fn bump(component: u64, name: &str) -> Result<u64> {
    component.checked_add(1).ok_or_else(|| {
        ReleaseError::parse(format!("Cannot increment {} component {}", name, component))
    })
}

/// Bumps the last numeric dot-separated identifier, or appends `0`.
fn next_prerelease(current: &str) -> String {
    let mut identifiers: Vec<String> = current.split('.').map(str::to_string).collect();

    let last_numeric = identifiers
        .iter()
        .rposition(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()));

    let bumped = last_numeric.and_then(|index| {
        let value = identifiers[index].parse::<u64>().ok()?.checked_add(1)?;
        Some((index, value))
    });

    match bumped {
        Some((index, value)) => identifiers[index] = value.to_string(),
        None => identifiers.push("0".to_string()),
    }

    identifiers.join(".")
}

fn prerelease(text: &str) -> Result<Prerelease> {
    Prerelease::new(text)
        .map_err(|e| ReleaseError::parse(format!("Invalid prerelease '{}': {}", text, e)))
}
