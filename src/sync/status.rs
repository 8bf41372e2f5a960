//! Read-only drift detection between the repository and system copies.
use std::fmt;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::Kind;
use crate::mirror::ExcludeSet;

/// How the two copies of a config relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriftState {
    /// Both copies exist with identical content.
    InSync,
    /// Both copies exist but differ.
    Drifted,
    /// Only the system copy exists.
    MissingRepo,
    /// Only the repository copy exists.
    MissingSystem,
    /// Neither copy exists.
    MissingBoth,
}

impl DriftState {
    /// Compare two optional digests.
    #[must_use]
    pub fn compare(repo: Option<&str>, system: Option<&str>) -> Self {
        match (repo, system) {
            (Some(a), Some(b)) if a == b => Self::InSync,
            (Some(_), Some(_)) => Self::Drifted,
            (None, Some(_)) => Self::MissingRepo,
            (Some(_), None) => Self::MissingSystem,
            (None, None) => Self::MissingBoth,
        }
    }
}

impl fmt::Display for DriftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InSync => "in sync",
            Self::Drifted => "drifted",
            Self::MissingRepo => "missing from repo",
            Self::MissingSystem => "not deployed",
            Self::MissingBoth => "missing",
        })
    }
}

/// Drift report for one config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigStatus {
    /// Config name.
    pub name: String,
    /// Comparison result.
    pub state: DriftState,
}

/// SHA-256 over the content at `path`, or `None` if nothing is there.
///
/// For a directory the digest covers every non-excluded entry's relative
/// path and type, file contents, and symlink targets, in sorted order.
///
/// # Errors
///
/// Returns an error if an entry exists but cannot be read.
pub fn digest(path: &Path, kind: Kind, excludes: &ExcludeSet) -> Result<Option<String>> {
    if path.symlink_metadata().is_err() {
        return Ok(None);
    }
    let mut hasher = Sha256::new();
    match kind {
        Kind::File => hash_file(&mut hasher, path)?,
        Kind::Directory => {
            let walker = WalkDir::new(path)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    !excludes.is_excluded(e.path().strip_prefix(path).unwrap_or(e.path()))
                });
            for entry in walker {
                let entry = entry.with_context(|| format!("reading {}", path.display()))?;
                let rel = entry.path().strip_prefix(path).unwrap_or(entry.path());
                let file_type = entry.file_type();
                hasher.update(rel.to_string_lossy().as_bytes());
                if file_type.is_symlink() {
                    hasher.update(b"\0l\0");
                    let target = std::fs::read_link(entry.path())
                        .with_context(|| format!("reading link {}", entry.path().display()))?;
                    hasher.update(target.to_string_lossy().as_bytes());
                } else if file_type.is_dir() {
                    hasher.update(b"\0d\0");
                } else {
                    hasher.update(b"\0f\0");
                    hash_file(&mut hasher, entry.path())?;
                }
                hasher.update(b"\n");
            }
        }
    }
    Ok(Some(hex(&hasher.finalize())))
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    std::io::copy(&mut file, hasher).with_context(|| format!("reading {}", path.display()))?;
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    use fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
