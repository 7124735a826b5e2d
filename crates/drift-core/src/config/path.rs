//! Configuration path types for multi-file loading.

use std::path::PathBuf;

use clap::Parser;

/// A configuration source - either a single file or a directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigPath {
    /// A single configuration file.
    File(PathBuf),
    /// A directory containing configuration files.
    Dir(PathBuf),
}

impl ConfigPath {
    /// Combine config file paths and config directory paths into a single list.
    ///
    /// Files come first, then directories, preserving the order within each group.
    pub fn from_cli_args(config_files: &[PathBuf], config_dirs: &[PathBuf]) -> Vec<Self> {
        config_files
            .iter()
            .cloned()
            .map(ConfigPath::File)
            .chain(config_dirs.iter().cloned().map(ConfigPath::Dir))
            .collect()
    }
}

/// Check if a path has a YAML or JSON extension.
///
/// JSON files are read with the YAML parser, which accepts them unchanged.
pub fn is_config_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yaml" | "yml" | "json"))
}

#[derive(Parser, Debug)]
#[command(version)]
pub struct CliArgs {
    /// Path to configuration file (can be specified multiple times)
    #[arg(short, long)]
    pub config: Vec<PathBuf>,

    /// Path to configuration directory (can be specified multiple times)
    #[arg(short = 'C', long = "config-dir")]
    pub config_dirs: Vec<PathBuf>,
}

impl CliArgs {
    /// Convert CLI arguments to configuration paths.
    pub fn config_paths(&self) -> Vec<ConfigPath> {
        ConfigPath::from_cli_args(&self.config, &self.config_dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_is_config_file() {
        assert!(is_config_file(Path::new("config.yaml")));
        assert!(is_config_file(Path::new("config.yml")));
        assert!(is_config_file(Path::new("spec.json")));
        assert!(!is_config_file(Path::new("config.toml")));
        assert!(!is_config_file(Path::new("README")));
    }

    #[test]
    fn test_cli_paths_files_before_dirs() {
        let args = CliArgs::parse_from(["drift", "-C", "conf.d", "-c", "a.yaml", "-c", "b.yaml"]);
        assert_eq!(
            args.config_paths(),
            vec![
                ConfigPath::File(PathBuf::from("a.yaml")),
                ConfigPath::File(PathBuf::from("b.yaml")),
                ConfigPath::Dir(PathBuf::from("conf.d")),
            ]
        );
    }
}
