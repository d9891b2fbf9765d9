//! Reading and writing the version stored in a JSON version file.
//!
//! The document is held as a key-ordered map of raw JSON values. Only the
//! `version` entry is ever interpreted; every other value keeps its exact
//! source text when the file is written back.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use semver::Version;
use serde_json::value::RawValue;
use tracing::debug;

use crate::error::{ReleaseError, Result};

const VERSION_KEY: &str = "version";

/// A version file document with one typed accessor and an opaque remainder.
#[derive(Debug)]
pub struct VersionDocument {
    fields: IndexMap<String, Box<RawValue>>,
    trailing_newline: bool,
}

impl VersionDocument {
    /// Parse a JSON object document.
    pub fn parse(content: &str) -> Result<Self> {
        let fields: IndexMap<String, Box<RawValue>> = serde_json::from_str(content)
            .map_err(|e| ReleaseError::parse(format!("Expected a JSON object: {}", e)))?;

        Ok(VersionDocument {
            fields,
            trailing_newline: content.ends_with('\n'),
        })
    }

    /// The semantic version held in the `version` field.
    pub fn version(&self) -> Result<Version> {
        let raw = self
            .fields
            .get(VERSION_KEY)
            .ok_or_else(|| ReleaseError::parse("Missing 'version' field"))?;

        let text: String = serde_json::from_str(raw.get()).map_err(|_| {
            ReleaseError::parse(format!("'version' must be a string, found {}", raw.get()))
        })?;

        Version::parse(&text)
            .map_err(|e| ReleaseError::parse(format!("Invalid version '{}': {}", text, e)))
    }

    /// Replace the `version` field, keeping its position in the document.
    pub fn set_version(&mut self, version: &Version) -> Result<()> {
        let encoded = serde_json::to_string(&version.to_string())
            .and_then(RawValue::from_string)
            .map_err(|e| ReleaseError::parse(format!("Cannot encode version: {}", e)))?;

        self.fields.insert(VERSION_KEY.to_string(), encoded);
        Ok(())
    }

    /// Render the document with a two-space indented top level.
    pub fn render(&self) -> Result<String> {
        let mut rendered = serde_json::to_string_pretty(&self.fields)
            .map_err(|e| ReleaseError::parse(format!("Cannot render version file: {}", e)))?;

        if self.trailing_newline {
            rendered.push('\n');
        }
        Ok(rendered)
    }

    /// Write the rendered document to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()?)?;
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<VersionDocument> {
    let content = fs::read_to_string(path).map_err(|e| {
        ReleaseError::parse(format!("Cannot read version file '{}': {}", path.display(), e))
    })?;

    VersionDocument::parse(&content).map_err(|e| match e {
        ReleaseError::Parse(msg) => ReleaseError::parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Reads the current version from the version file.
///
/// Every call goes back to disk so a checkout between calls is always observed.
///
/// # Returns
/// * `Ok(Version)` - The parsed version
/// * `Err(ReleaseError::Parse)` - If the file is missing, malformed, or holds an invalid version
pub fn fetch(path: &Path) -> Result<Version> {
    let version = read_document(path)?.version()?;
    debug!(path = %path.display(), %version, "read version");
    Ok(version)
}

/// Writes a new version into the version file, leaving all other fields untouched.
///
/// # Returns
/// * `Ok(())` - File rewritten
/// * `Err(ReleaseError::Parse)` - If the existing file cannot be read or parsed
/// * `Err(ReleaseError::Io)` - If the file cannot be written
pub fn set(path: &Path, version: &Version) -> Result<()> {
    let mut document = read_document(path)?;
    document.set_version(version)?;
    document.write_to(path)?;
    debug!(path = %path.display(), %version, "wrote version");
    Ok(())
}
