/// Error types for catalog configuration and persistence.
///
/// Everything in [`CatalogError`] is fatal for a run: the caller is expected
/// to stop before touching any drive. Per-volume and per-directory failures
/// are never represented here; they are contained where they happen and
/// surfaced as warnings (see [`crate::identity::ResolveError`] and
/// [`crate::scanner::ScanIssue`]).
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("naming rules not found at {0}")]
    NamingRulesMissing(PathBuf),

    #[error("invalid JSON in naming rules {path}: {source}")]
    NamingRulesMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("naming rules rejected: {0}")]
    NamingRulesInvalid(String),

    #[error("invalid JSON in registry {path}: {source}")]
    RegistryMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("registry {path} lists drive id '{id}' more than once")]
    RegistryDuplicateId { path: PathBuf, id: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no drive with id '{0}' in the registry")]
    UnknownDrive(String),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
