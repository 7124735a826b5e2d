//! Multi-file configuration loading.
//!
//! Files are interpolated, parsed and merged in order. Directories contribute
//! their `.yaml`/`.yml`/`.json` files sorted by name. Errors from every file
//! are collected before failing.

use std::path::Path;

use crate::config::{ConfigPath, interpolate, is_config_file};
use crate::error::ConfigError;

/// Trait for configs that can be merged from multiple files.
pub trait Mergeable: Sized + Default {
    /// Names that must stay unique across merged files.
    fn keys(&self) -> Vec<String>;

    /// Append the components of `other`, after duplicates were ruled out.
    fn absorb(&mut self, other: Self);

    fn parse_yaml(contents: &str) -> Result<Self, ConfigError>;

    fn merge(&mut self, other: Self) -> Result<(), ConfigError> {
        let existing = self.keys();
        let duplicates: Vec<String> = other
            .keys()
            .into_iter()
            .filter(|key| existing.contains(key))
            .collect();

        if !duplicates.is_empty() {
            return Err(ConfigError::DuplicateTables { tables: duplicates });
        }

        self.absorb(other);
        Ok(())
    }
}

pub fn load_from_paths<C: Mergeable>(paths: &[ConfigPath]) -> Result<C, ConfigError> {
    let mut config = C::default();
    let mut errors = Vec::new();

    for path in paths {
        let (display, loaded) = match path {
            ConfigPath::File(file) => (file.display(), load_file::<C>(file)),
            ConfigPath::Dir(dir) => (dir.display(), load_dir::<C>(dir)),
        };

        if let Err(e) = loaded.and_then(|partial| config.merge(partial)) {
            errors.push(format!("{display}: {e}"));
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MultipleErrors { errors });
    }
    Ok(config)
}

fn load_file<C: Mergeable>(path: &Path) -> Result<C, ConfigError> {
    if !is_config_file(path) {
        return Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let contents =
        std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile { source })?;

    let result = interpolate(&contents);
    if !result.is_ok() {
        return Err(ConfigError::EnvInterpolation {
            message: result.errors.join("\n"),
        });
    }

    C::parse_yaml(&result.text)
}

fn load_dir<C: Mergeable>(dir: &Path) -> Result<C, ConfigError> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| ConfigError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_config_file(path))
        .collect();
    files.sort();

    let mut config = C::default();
    let mut errors = Vec::new();

    for path in files {
        if let Err(e) = load_file::<C>(&path).and_then(|partial| config.merge(partial)) {
            errors.push(format!("{}: {}", path.display(), e));
        }
    }

    if !errors.is_empty() {
        return Err(ConfigError::MultipleErrors { errors });
    }
    Ok(config)
}
