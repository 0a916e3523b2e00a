//! Configuration types and parsing for stepwise.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file names searched by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["stepwise.yml", "stepwise.yaml"];

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "SW_TARGET";

/// Main configuration from stepwise.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Installation name, used in logs
    pub name: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Domain the upgrade runs for; exposed to script templates as `domain_id`
    #[serde(default = "default_domain_id")]
    pub domain_id: u32,

    /// Directory holding uploaded custom files (relative to the project dir)
    #[serde(default)]
    pub upload_dir: Option<String>,

    /// Directories searched for `<version>.sql` and `<version>.sql.j2` scripts
    #[serde(default)]
    pub script_paths: Vec<String>,

    /// Extra variables available in script templates
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,

    /// Named target configurations (e.g., staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Variable overrides (merged with base vars)
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

fn default_domain_id() -> u32 {
    1
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        log::debug!("Loaded config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for stepwise.yml or stepwise.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Self::load(&candidate);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "name cannot be empty".to_string(),
            });
        }

        if self.domain_id == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "domain_id must be 1 or greater".to_string(),
            });
        }

        if let Some(path) = self.script_paths.iter().find(|p| p.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: format!("script_paths contains an empty entry: '{path}'"),
            });
        }

        Ok(())
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config = self.targets.get(name).ok_or_else(|| {
                    let mut available: Vec<&str> = self.targets.keys().map(String::as_str).collect();
                    available.sort_unstable();
                    CoreError::ConfigInvalid {
                        message: format!(
                            "Target '{}' not found. Available targets: {}",
                            name,
                            available.join(", ")
                        ),
                    }
                })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Get merged variables, with target overrides taking precedence.
    pub fn get_merged_vars(
        &self,
        target: Option<&str>,
    ) -> Cow<'_, HashMap<String, serde_yaml::Value>> {
        let target_config = target.and_then(|name| self.targets.get(name));
        match target_config.filter(|tc| !tc.vars.is_empty()) {
            Some(tc) => {
                let mut vars = self.vars.clone();
                for (key, value) in &tc.vars {
                    vars.insert(key.clone(), value.clone());
                }
                Cow::Owned(vars)
            }
            None => Cow::Borrowed(&self.vars),
        }
    }

    /// Script directories resolved against the project root
    pub fn script_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        self.script_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Upload directory resolved against the project root
    pub fn upload_dir_absolute(&self, root: &Path) -> Option<PathBuf> {
        self.upload_dir.as_ref().map(|p| root.join(p))
    }

    /// Resolve target from CLI flag or the SW_TARGET environment variable
    ///
    /// Priority: CLI flag > SW_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
