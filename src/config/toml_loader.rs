//! TOML catalog file parsing.
use serde::Deserialize;
use std::path::Path;

use super::{ConfigDescriptor, Kind};
use crate::error::SyncError;

/// Catalog file location, relative to the repository root.
pub const CATALOG_FILE: &str = "conf/configs.toml";

/// One `[[config]]` or `[[secret]]` table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    name: String,
    repo: String,
    system: String,
    kind: Kind,
    #[serde(default)]
    exclude: Vec<String>,
}

impl From<Entry> for ConfigDescriptor {
    fn from(entry: Entry) -> Self {
        Self::new(entry.name, entry.repo, entry.system, entry.kind, entry.exclude)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    config: Vec<Entry>,
    #[serde(default)]
    secret: Vec<Entry>,
}

/// Descriptors parsed from a catalog file, not yet validated.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Bulk-operation configs in file order.
    pub configs: Vec<ConfigDescriptor>,
    /// Secret configs in file order.
    pub secrets: Vec<ConfigDescriptor>,
}

/// Parse catalog text.
///
/// # Errors
///
/// Returns [`SyncError::Catalog`] if the text is not a valid catalog.
pub fn parse(content: &str) -> Result<Catalog, SyncError> {
    let file: CatalogFile =
        toml::from_str(content).map_err(|e| SyncError::Catalog(e.message().to_string()))?;
    Ok(Catalog {
        configs: file.config.into_iter().map(Into::into).collect(),
        secrets: file.secret.into_iter().map(Into::into).collect(),
    })
}

/// Read and parse the catalog file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Catalog, SyncError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| SyncError::io(format!("reading {}", path.display()), e))?;
    parse(&content).map_err(|e| match e {
        SyncError::Catalog(msg) => SyncError::Catalog(format!("{}: {msg}", path.display())),
        other => other,
    })
}
