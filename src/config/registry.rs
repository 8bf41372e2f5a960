//! The catalog of named configs.
//!
//! A [`Registry`] is built once at startup and passed by reference into the
//! engine; it is never mutated afterwards.  It holds two disjoint catalogs:
//! the configs that take part in bulk operations, and secret configs that
//! are only reachable through the secrets guard.
use std::path::{Component, Path};

use super::{ConfigDescriptor, normalize_name, toml_loader};
use crate::error::SyncError;

/// Name of the built-in secrets config.
pub const ZSH_SECRETS: &str = "zsh-secrets";

/// Immutable catalog of config descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    configs: Vec<ConfigDescriptor>,
    secrets: Vec<ConfigDescriptor>,
}

impl Registry {
    /// Build a registry from the two catalogs.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Catalog`] if a name is empty or duplicated
    /// (case-insensitively, across both catalogs) or a repository path is
    /// absolute or escapes the repository.
    pub fn new(
        configs: Vec<ConfigDescriptor>,
        secrets: Vec<ConfigDescriptor>,
    ) -> Result<Self, SyncError> {
        let mut seen: Vec<String> = Vec::new();
        for descriptor in configs.iter().chain(&secrets) {
            let normalized = normalize_name(descriptor.name());
            if normalized.is_empty() {
                return Err(SyncError::Catalog("config name must not be empty".into()));
            }
            if seen.contains(&normalized) {
                return Err(SyncError::Catalog(format!(
                    "duplicate config name: {}",
                    descriptor.name().trim()
                )));
            }
            seen.push(normalized);
            validate_repo_path(descriptor)?;
        }
        Ok(Self { configs, secrets })
    }

    /// The catalog compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            configs: vec![
                ConfigDescriptor::directory("neovim", "config/nvim", "~/.config/nvim"),
                ConfigDescriptor::file("zsh", "config/zshrc", "~/.zshrc"),
                ConfigDescriptor::file("asdf", "config/tool-versions", "~/.tool-versions"),
                ConfigDescriptor::directory(
                    "alacritty",
                    "config/alacritty",
                    "~/.config/alacritty",
                )
                .with_excludes([".DS_Store"]),
                ConfigDescriptor::file("oh-my-posh", "config/omp.json", "~/.omp.json"),
            ],
            secrets: vec![ConfigDescriptor::file(
                ZSH_SECRETS,
                "config/zsh_secrets.templ",
                "~/.zsh_secrets",
            )],
        }
    }

    /// Load the catalog for a repository.
    ///
    /// Uses `<root>/conf/configs.toml` when present, otherwise the built-in
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file exists but cannot be read, parsed,
    /// or validated.
    pub fn load(root: &Path) -> Result<Self, SyncError> {
        let path = root.join(toml_loader::CATALOG_FILE);
        if !path.exists() {
            return Ok(Self::builtin());
        }
        let catalog = toml_loader::load(&path)?;
        Self::new(catalog.configs, catalog.secrets)
    }

    /// Look up a bulk-operation config by name (case-insensitive, exact).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if no config has that name.  Secret
    /// configs are never returned here.
    pub fn lookup(&self, name: &str) -> Result<&ConfigDescriptor, SyncError> {
        self.configs
            .iter()
            .find(|c| c.matches_name(name))
            .ok_or_else(|| SyncError::NotFound(name.to_string()))
    }

    /// Look up a secret config by name (case-insensitive, exact).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if no secret config has that name.
    pub fn lookup_secret(&self, name: &str) -> Result<&ConfigDescriptor, SyncError> {
        self.secrets
            .iter()
            .find(|c| c.matches_name(name))
            .ok_or_else(|| SyncError::NotFound(name.to_string()))
    }

    /// All bulk-operation configs in registration order.
    #[must_use]
    pub fn all(&self) -> &[ConfigDescriptor] {
        &self.configs
    }

    /// All secret configs in registration order.
    #[must_use]
    pub fn secrets(&self) -> &[ConfigDescriptor] {
        &self.secrets
    }
}

fn validate_repo_path(descriptor: &ConfigDescriptor) -> Result<(), SyncError> {
    let path = Path::new(descriptor.repo_path());
    if descriptor.repo_path().is_empty() {
        return Err(SyncError::Catalog(format!(
            "{}: repository path must not be empty",
            descriptor.name()
        )));
    }
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::RootDir | Component::Prefix(_) | Component::ParentDir
        )
    });
    if escapes {
        return Err(SyncError::Catalog(format!(
            "{}: repository path must be relative to the repository root: {}",
            descriptor.name(),
            descriptor.repo_path()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::Kind;

    #[test]
    fn builtin_catalog_is_valid() {
        let builtin = Registry::builtin();
        Registry::new(builtin.all().to_vec(), builtin.secrets().to_vec()).unwrap();
    }

    #[test]
    fn builtin_order_is_registration_order() {
        let registry = Registry::builtin();
        let names: Vec<&str> = registry.all().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["neovim", "zsh", "asdf", "alacritty", "oh-my-posh"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = Registry::builtin();
        let upper = registry.lookup("NEOVIM").unwrap();
        let lower = registry.lookup("neovim").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.kind(), Kind::Directory);
    }

    #[test]
    fn padded_name_is_reachable_by_lookup() {
        let registry = Registry::new(
            vec![ConfigDescriptor::file(" zsh", "config/zshrc", "~/.zshrc")],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(registry.lookup("zsh").unwrap().repo_path(), "config/zshrc");
        assert!(registry.lookup("ZSH ").is_ok());
    }

    #[test]
    fn non_ascii_names_compare_case_insensitively() {
        let err = Registry::new(
            vec![
                ConfigDescriptor::file("Émacs", "config/emacs", "~/.emacs"),
                ConfigDescriptor::file("émacs", "config/emacs2", "~/.emacs2"),
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate config name"));

        let registry = Registry::new(
            vec![ConfigDescriptor::file("Émacs", "config/emacs", "~/.emacs")],
            Vec::new(),
        )
        .unwrap();
        assert!(registry.lookup("éMACS").is_ok());
    }

    #[test]
    fn lookup_has_no_partial_matching() {
        let registry = Registry::builtin();
        let err = registry.lookup("neo").unwrap_err();
        assert!(matches!(err, SyncError::NotFound(ref n) if n == "neo"));
    }

    #[test]
    fn secrets_are_not_in_bulk_catalog() {
        let registry = Registry::builtin();
        assert!(registry.lookup(ZSH_SECRETS).is_err());
        assert!(registry.all().iter().all(|c| c.name() != ZSH_SECRETS));
        assert_eq!(registry.lookup_secret("ZSH-Secrets").unwrap().name(), ZSH_SECRETS);
    }

    #[test]
    fn rejects_duplicate_names_case_insensitively() {
        let err = Registry::new(
            vec![
                ConfigDescriptor::file("zsh", "config/zshrc", "~/.zshrc"),
                ConfigDescriptor::file("ZSH", "config/zshrc2", "~/.zshrc2"),
            ],
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate config name"));
    }

    #[test]
    fn rejects_duplicates_across_catalogs() {
        let err = Registry::new(
            vec![ConfigDescriptor::file("secrets", "a", "~/.a")],
            vec![ConfigDescriptor::file("secrets", "b", "~/.b")],
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Catalog(_)));
    }

    #[test]
    fn rejects_absolute_repo_path() {
        let err = Registry::new(
            vec![ConfigDescriptor::file("zsh", "/etc/zshrc", "~/.zshrc")],
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("relative"));
    }

    #[test]
    fn rejects_parent_traversal() {
        let err = Registry::new(
            vec![ConfigDescriptor::file("zsh", "../outside/zshrc", "~/.zshrc")],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Catalog(_)));
    }

    #[test]
    fn rejects_empty_name() {
        let err = Registry::new(
            vec![ConfigDescriptor::file("  ", "config/x", "~/.x")],
            Vec::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn load_without_catalog_file_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(dir.path()).unwrap();
        assert_eq!(registry.all().len(), Registry::builtin().all().len());
    }

    #[test]
    fn load_reads_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("conf")).unwrap();
        std::fs::write(
            dir.path().join("conf/configs.toml"),
            r#"
[[config]]
name = "git"
repo = "config/gitconfig"
system = "~/.gitconfig"
kind = "file"
"#,
        )
        .unwrap();
        let registry = Registry::load(dir.path()).unwrap();
        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.all()[0].name(), "git");
        assert!(registry.secrets().is_empty());
    }
}
