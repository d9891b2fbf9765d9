pub mod boundary;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod hosting;
pub mod locator;
pub mod publisher;
pub mod ui;
pub mod version;
pub mod version_file;

pub use error::{ReleaseError, Result};
