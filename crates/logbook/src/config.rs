use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub vault: VaultConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub interchange: InterchangeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Default locations of the JSON interchange files.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InterchangeConfig {
    pub daily_metrics: Option<PathBuf>,
    pub wearable_metrics: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.vault.root.as_os_str().is_empty() {
        bail!("vault.root must not be empty");
    }

    for pattern in config
        .vault
        .include_globs
        .iter()
        .chain(config.vault.exclude_globs.iter())
    {
        Glob::new(pattern).with_context(|| format!("Invalid vault glob: '{}'", pattern))?;
    }

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => bail!(
            "Unknown logging level: '{}'. Must be trace, debug, info, warn, or error.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("logbook.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_applied() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "[db]\npath = \"./data/lb.sqlite\"\n\n[vault]\nroot = \"./vault\"\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.vault.include_globs, vec!["**/*.md"]);
        assert!(cfg.vault.exclude_globs.is_empty());
        assert!(!cfg.vault.follow_symlinks);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.interchange.daily_metrics.is_none());
    }

    #[test]
    fn test_rejects_bad_level() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "[db]\npath = \"x.sqlite\"\n[vault]\nroot = \"v\"\n[logging]\nlevel = \"loud\"\n",
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("logging level"));
    }

    #[test]
    fn test_rejects_bad_glob() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "[db]\npath = \"x.sqlite\"\n[vault]\nroot = \"v\"\ninclude_globs = [\"a/{b\"]\n",
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_rejects_empty_root() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[db]\npath = \"x.sqlite\"\n[vault]\nroot = \"\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/logbook.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
