use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up by [`discover_config`]
pub const CONFIG_FILE_NAME: &str = "fabrik-inputs.toml";

/// Complete configuration (loaded from TOML file)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InputsConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// How path values are turned into files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Directory relative paths resolve against
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Follow symbolic links while walking input directories
    #[serde(default)]
    pub follow_links: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            follow_links: false,
        }
    }
}

/// What `validate` checks beyond missing values
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    /// Require input files and directories to exist
    #[serde(default = "default_true")]
    pub check_existence: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_existence: true,
        }
    }
}

// Default value functions
fn default_base_dir() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

impl InputsConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: InputsConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        // Relative base directories are relative to the config file
        if let Some(parent) = path.as_ref().parent() {
            let base_dir = Path::new(&config.resolver.base_dir);
            if base_dir.is_relative() && !parent.as_os_str().is_empty() {
                config.resolver.base_dir = parent.join(base_dir).to_string_lossy().to_string();
            }
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.resolver.base_dir.trim().is_empty() {
            anyhow::bail!("resolver.base_dir must not be empty");
        }

        let base_dir = Path::new(&self.resolver.base_dir);
        if base_dir.exists() && !base_dir.is_dir() {
            anyhow::bail!(
                "resolver.base_dir must be a directory: {}",
                self.resolver.base_dir
            );
        }

        Ok(())
    }
}

/// Discovers configuration by traversing up the directory tree
pub fn discover_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        // Try to go up one level
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Loads configuration with auto-discovery support
///
/// If `explicit_path` is provided, loads config from that path.
/// Otherwise, auto-discovers config by traversing up from `start_dir`.
///
/// Falls back to the defaults when no config is found.
pub fn load_with_discovery(explicit_path: Option<&Path>, start_dir: &Path) -> Result<InputsConfig> {
    let config = match explicit_path {
        Some(path) => InputsConfig::from_file(path)?,
        None => match discover_config(start_dir) {
            Some(discovered) => InputsConfig::from_file(&discovered)?,
            None => InputsConfig {
                resolver: ResolverConfig {
                    base_dir: start_dir.to_string_lossy().to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        },
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = InputsConfig::default();
        assert_eq!(config.resolver.base_dir, ".");
        assert!(!config.resolver.follow_links);
        assert!(config.validation.check_existence);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: InputsConfig = toml::from_str("[resolver]\nfollow_links = true\n").unwrap();
        assert!(config.resolver.follow_links);
        assert_eq!(config.resolver.base_dir, ".");
        assert!(config.validation.check_existence);
    }

    #[test]
    fn test_from_file_resolves_base_dir_against_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[resolver]\nbase_dir = \"project\"\n\n[validation]\ncheck_existence = false\n",
        )
        .unwrap();

        let config = InputsConfig::from_file(&path).unwrap();
        assert_eq!(
            PathBuf::from(&config.resolver.base_dir),
            temp.path().join("project")
        );
        assert!(!config.validation.check_existence);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[resolver\n").unwrap();

        let err = InputsConfig::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_base_dir_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        fs::write(&file, "").unwrap();

        let mut config = InputsConfig::default();
        config.resolver.base_dir = file.to_string_lossy().to_string();
        assert!(config.validate().is_err());

        config.resolver.base_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_config_finds_nearest() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        let subdir = project.join("subdir");
        fs::create_dir_all(&subdir).unwrap();

        let config_path = project.join(CONFIG_FILE_NAME);
        fs::write(&config_path, "# test config").unwrap();

        assert_eq!(discover_config(&subdir), Some(config_path));
    }

    #[test]
    fn test_load_without_config_uses_start_dir() {
        let temp = TempDir::new().unwrap();
        let config = load_with_discovery(None, temp.path()).unwrap();
        assert_eq!(
            PathBuf::from(&config.resolver.base_dir),
            temp.path().to_path_buf()
        );
    }
}
