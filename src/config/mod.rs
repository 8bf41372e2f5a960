//! Declarative model of a synchronizable config.
pub mod registry;
pub mod toml_loader;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Baseline exclusion patterns applied to every sync, before any
/// per-config patterns.
pub const BASELINE_EXCLUDES: &[&str] = &[".git", "*.swp", "*.swo"];

/// Whether a config is a single file or a full directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A single file; copied without deletion semantics.
    File,
    /// A directory tree; mirrored recursively with stale entries deleted.
    Directory,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Which of a config's two locations to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Location inside the source repository.
    Repo,
    /// Location on the local system (after `~` expansion).
    System,
}

/// Immutable description of one synchronizable config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDescriptor {
    name: String,
    repo_path: String,
    system_path: String,
    kind: Kind,
    excludes: Vec<String>,
}

impl ConfigDescriptor {
    /// Create a descriptor.
    ///
    /// Invariants (relative repo path, unique names) are enforced when the
    /// descriptor is registered, not here.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        repo_path: impl Into<String>,
        system_path: impl Into<String>,
        kind: Kind,
        excludes: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo_path: repo_path.into(),
            system_path: system_path.into(),
            kind,
            excludes,
        }
    }

    /// Shorthand for a [`Kind::File`] descriptor with no extra excludes.
    #[must_use]
    pub fn file(name: &str, repo_path: &str, system_path: &str) -> Self {
        Self::new(name, repo_path, system_path, Kind::File, Vec::new())
    }

    /// Shorthand for a [`Kind::Directory`] descriptor with no extra excludes.
    #[must_use]
    pub fn directory(name: &str, repo_path: &str, system_path: &str) -> Self {
        Self::new(name, repo_path, system_path, Kind::Directory, Vec::new())
    }

    /// Builder-style: append exclusion patterns.
    #[must_use]
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Unique, case-insensitive identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the repository root.
    #[must_use]
    pub fn repo_path(&self) -> &str {
        &self.repo_path
    }

    /// Unexpanded system path (may start with `~`).
    #[must_use]
    pub fn system_path(&self) -> &str {
        &self.system_path
    }

    /// File or directory.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Per-config exclusion patterns, in declaration order.
    #[must_use]
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Baseline excludes followed by this config's own patterns.
    #[must_use]
    pub fn effective_excludes(&self) -> Vec<String> {
        let mut all: Vec<String> = BASELINE_EXCLUDES.iter().map(|p| (*p).to_string()).collect();
        for pattern in &self.excludes {
            if !all.contains(pattern) {
                all.push(pattern.clone());
            }
        }
        all
    }

    /// Whether `name` refers to this config under [`normalize_name`].
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        normalize_name(&self.name) == normalize_name(name)
    }
}

/// Canonical form of a config name: surrounding whitespace dropped,
/// Unicode-lowercased.  Uniqueness and lookup both compare in this form.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(Kind::File.to_string(), "file");
        assert_eq!(Kind::Directory.to_string(), "directory");
    }

    #[test]
    fn effective_excludes_start_with_baseline() {
        let d = ConfigDescriptor::directory("alacritty", "config/alacritty", "~/.config/alacritty")
            .with_excludes([".DS_Store"]);
        assert_eq!(
            d.effective_excludes(),
            vec![".git", "*.swp", "*.swo", ".DS_Store"]
        );
    }

    #[test]
    fn effective_excludes_drop_duplicates_of_baseline() {
        let d = ConfigDescriptor::directory("nvim", "config/nvim", "~/.config/nvim")
            .with_excludes([".git", "lazy-lock.json"]);
        assert_eq!(
            d.effective_excludes(),
            vec![".git", "*.swp", "*.swo", "lazy-lock.json"]
        );
    }

    #[test]
    fn matches_name_ignores_case() {
        let d = ConfigDescriptor::file("zsh", "config/zshrc", "~/.zshrc");
        assert!(d.matches_name("ZSH"));
        assert!(d.matches_name("Zsh"));
        assert!(!d.matches_name("zs"));
    }

    #[test]
    fn matches_name_trims_and_folds_unicode() {
        let d = ConfigDescriptor::file(" Überzug ", "config/u", "~/.u");
        assert!(d.matches_name("überzug"));
        assert!(d.matches_name("ÜBERZUG "));
    }

    #[test]
    fn kind_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: Kind,
        }
        let w: Wrapper = toml::from_str("kind = \"directory\"").unwrap();
        assert_eq!(w.kind, Kind::Directory);
    }
}
