//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use committee_domain::Scenario;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "beta-committee";
const PROJECT_FILES: [&str; 2] = ["committee.toml", ".committee.toml"];
const ENV_PREFIX: &str = "COMMITTEE_";

/// Failure to read a standalone scenario file
#[derive(Debug, Error)]
pub enum ScenarioLoadError {
    #[error("unsupported scenario format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Parse(#[from] Box<figment::Error>),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `COMMITTEE_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./committee.toml` or `./.committee.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/beta-committee/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES.iter().map(PathBuf::from).find(|path| path.exists())
    }

    /// Read a scenario from a `.toml` or `.json` file
    pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioLoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let figment = match extension.as_str() {
            "toml" => Figment::from(Toml::file(path)),
            "json" => Figment::from(Json::file(path)),
            other => return Err(ScenarioLoadError::UnsupportedFormat(other.to_string())),
        };
        Ok(figment.extract().map_err(Box::new)?)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     {}*", ENV_PREFIX);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./{} or ./{}", PROJECT_FILES[0], PROJECT_FILES[1]);
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}
