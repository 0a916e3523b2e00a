//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use sw_core::{Config, Version};
use sw_db::{Database, DuckDbBackend};
use sw_runner::{steps, StepRegistry, UpgradeContext, Upgrader};

use crate::cli::GlobalArgs;

/// Loaded configuration, step registry and database connection
pub struct RuntimeContext {
    pub root: PathBuf,
    pub config: Config,
    pub target: Option<String>,
    pub registry: StepRegistry,
    pub db: Box<dyn Database>,
}

impl RuntimeContext {
    /// Load config, build the registry and connect to the database
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);
        let config = load_config(args, &root)?;
        let target = Config::resolve_target(args.target.as_deref());

        let registry = load_registry(&config, &root)?;

        let db_config = config
            .get_database_config(target.as_deref())
            .context("Failed to resolve database target")?;
        let db_path = if db_config.path == ":memory:" || Path::new(&db_config.path).is_absolute() {
            db_config.path.clone()
        } else {
            root.join(&db_config.path).display().to_string()
        };
        log::debug!("Connecting to {db_path}");
        let db: Box<dyn Database> =
            Box::new(DuckDbBackend::new(&db_path).context("Failed to connect to database")?);

        Ok(Self {
            root,
            config,
            target,
            registry,
            db,
        })
    }

    pub fn upgrader(&self) -> Upgrader<'_> {
        Upgrader::new(&self.registry, self.db.as_ref())
    }

    /// Fresh per-run context from the loaded configuration
    pub fn upgrade_context(&self) -> UpgradeContext {
        UpgradeContext::from_config(&self.config, &self.root, self.target.as_deref())
    }

    /// Parse `--to`, defaulting to the latest registered version
    pub fn target_version(&self, to: Option<&str>) -> Result<Version> {
        match to {
            Some(raw) => Version::parse(raw).context("Invalid --to version"),
            None => self
                .registry
                .latest()
                .cloned()
                .context("No upgrade steps are registered"),
        }
    }
}

/// Registry for the project in `args`, without opening the database
pub fn registry_for(args: &GlobalArgs) -> Result<StepRegistry> {
    let root = PathBuf::from(&args.project_dir);
    let config = load_config(args, &root)?;
    load_registry(&config, &root)
}

fn load_config(args: &GlobalArgs, root: &Path) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load(Path::new(path)).context("Failed to load configuration file"),
        None => Config::load_from_dir(root).context("Failed to load project configuration"),
    }
}

/// Built-in steps plus scripts from the configured script paths
fn load_registry(config: &Config, root: &Path) -> Result<StepRegistry> {
    steps::registry(&config.script_paths_absolute(root)).context("Failed to build step registry")
}
