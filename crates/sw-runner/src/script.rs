//! SQL script loading, template rendering and discovery.
//!
//! Scripts are rendered with minijinja before execution. The template sees
//! `version`, `domain_id` and every configured variable at the top level;
//! referencing anything else is an error rather than an empty string.

use crate::context::UpgradeContext;
use crate::error::{UpgradeError, UpgradeResult};
use crate::task::ScriptSource;
use minijinja::{Environment, UndefinedBehavior, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use sw_core::Version;

const SCRIPT_SUFFIXES: &[&str] = &[".sql.j2", ".sql"];

/// Load the raw text of a script.
pub fn load(source: &ScriptSource) -> UpgradeResult<String> {
    match source {
        ScriptSource::Embedded { sql, .. } => Ok(sql.clone()),
        ScriptSource::File(path) => {
            std::fs::read_to_string(path).map_err(|e| UpgradeError::Script {
                name: source.name(),
                message: format!("cannot read file: {e}"),
            })
        }
        ScriptSource::Step(version) => Err(UpgradeError::Script {
            name: source.name(),
            message: format!("no script is registered for {version}"),
        }),
    }
}

/// Render a script template against the run's variables.
pub fn render(name: &str, template: &str, ctx: &UpgradeContext) -> UpgradeResult<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let mut vars: BTreeMap<String, Value> = ctx
        .vars()
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
        .collect();
    vars.insert(
        "version".to_string(),
        Value::from(ctx.version().map(|v| v.to_string()).unwrap_or_default()),
    );
    vars.insert("domain_id".to_string(), Value::from(ctx.domain_id()));

    env.render_str(template, vars)
        .map_err(|e| UpgradeError::Script {
            name: name.to_string(),
            message: e.to_string(),
        })
}

/// Load a script and render it when it is a template.
///
/// Embedded scripts and `.sql.j2` files are templates; plain `.sql` files
/// run verbatim.
pub fn prepare(source: &ScriptSource, ctx: &UpgradeContext) -> UpgradeResult<String> {
    let text = load(source)?;
    let is_template = match source {
        ScriptSource::File(_) => source.is_template_file(),
        _ => true,
    };
    if is_template {
        render(&source.name(), &text, ctx)
    } else {
        Ok(text)
    }
}

/// Version scripts found on disk, keyed by version.
#[derive(Debug, Default)]
pub struct ScriptCatalog {
    scripts: BTreeMap<Version, PathBuf>,
}

impl ScriptCatalog {
    /// Scan `dirs` for `<version>.sql` and `<version>.sql.j2` files.
    ///
    /// Files whose stem is not a version are skipped with a warning. Two
    /// scripts for the same version are a registration error.
    pub fn discover(dirs: &[PathBuf]) -> UpgradeResult<Self> {
        let mut catalog = Self::default();
        for dir in dirs {
            catalog.scan_dir(dir)?;
        }
        Ok(catalog)
    }

    fn scan_dir(&mut self, dir: &Path) -> UpgradeResult<()> {
        if !dir.is_dir() {
            return Err(UpgradeError::Script {
                name: dir.display().to_string(),
                message: "script directory does not exist".to_string(),
            });
        }

        let base = glob::Pattern::escape(&dir.display().to_string());
        let pattern = format!("{base}/*.sql*");
        let entries = glob::glob(&pattern).map_err(|e| UpgradeError::Script {
            name: pattern.clone(),
            message: e.to_string(),
        })?;

        for path in entries.flatten() {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = version_stem(file_name) else {
                continue;
            };
            let version = match Version::parse(stem) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Skipping script {}: {e}", path.display());
                    continue;
                }
            };

            if let Some(existing) = self.scripts.get(&version) {
                return Err(UpgradeError::Registration {
                    version: version.to_string(),
                    message: format!(
                        "two scripts found: {} and {}",
                        existing.display(),
                        path.display()
                    ),
                });
            }
            log::debug!("Discovered script {} for {version}", path.display());
            self.scripts.insert(version, path);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn get(&self, version: &Version) -> Option<&Path> {
        self.scripts.get(version).map(PathBuf::as_path)
    }

    /// Discovered scripts in ascending version order.
    pub fn into_sources(self) -> impl Iterator<Item = (Version, ScriptSource)> {
        self.scripts
            .into_iter()
            .map(|(v, path)| (v, ScriptSource::File(path)))
    }
}

/// `6.2.alpha1.sql.j2` -> `6.2.alpha1`
fn version_stem(file_name: &str) -> Option<&str> {
    SCRIPT_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
