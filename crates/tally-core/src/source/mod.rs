//! Issue sources: where raw change-log records come from.
//!
//! The metrics engine only consumes [`RawItem`]s already in memory. Sources
//! deliver the full population up front; a failure to deliver it is fatal
//! for the run (see [`SourceError`]).

pub mod jira;

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::model::item::RawItem;

/// Errors raised while obtaining raw items.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The remote tracker could not be reached or refused the request.
    #[error("issue source unreachable: {0}")]
    Unreachable(String),

    /// The export file could not be read.
    #[error("failed to read export {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload is not a Jira search response or issue array.
    #[error("malformed issue export: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SourceError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unreachable(_) | Self::Io { .. } => ErrorCode::SourceUnavailable,
            Self::Malformed(_) => ErrorCode::MalformedExport,
        }
    }
}

/// Anything that can deliver the complete set of raw items for one run.
pub trait IssueSource {
    /// Fetch every raw item.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the items cannot be obtained at all.
    fn fetch(&self) -> Result<Vec<RawItem>, SourceError>;
}

/// A Jira search export stored on disk.
///
/// Accepts either a search response (`{"issues": [...]}`) or a bare array of
/// issues, each fetched with `expand=changelog`.
#[derive(Debug, Clone)]
pub struct ExportFile {
    path: PathBuf,
}

impl ExportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IssueSource for ExportFile {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch(&self) -> Result<Vec<RawItem>, SourceError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let issues = jira::parse_export(&content)?;
        debug!(issues = issues.len(), "export decoded");
        Ok(jira::convert_issues(&issues))
    }
}
