pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::Cli;
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// File name looked up in the global config dir and the project root.
pub const CONFIG_FILE_NAME: &str = "pm-agents.toml";

/// Load configuration by merging global, project, and CLI sources.
/// Precedence: CLI > project config > global config > defaults.
///
/// Missing config files are handled gracefully (defaults apply).
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    // Layer 1: Global config (~/.config/pm-agents/pm-agents.toml or platform equivalent)
    let global = load_global_config();

    // Determine the project root from CLI or global config, for loading the project config.
    let project_root = cli
        .project_root
        .clone()
        .or_else(|| global.project_root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    // Layer 2: Project config (explicit --config path wins over the default location)
    let project_file = cli
        .config
        .clone()
        .unwrap_or_else(|| project_root.join(CONFIG_FILE_NAME));
    let project = load_toml_file(&project_file).unwrap_or_default();

    // Layer 3: CLI args
    let cli_partial = cli_to_partial(cli);

    let config = cli_partial
        .with_fallback(project)
        .with_fallback(global)
        .finalize();

    Ok(config)
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => load_toml_file(&p).unwrap_or_default(),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns None on file-not-found or parse errors; parse errors are logged.
fn load_toml_file(path: &Path) -> Option<PartialConfig> {
    match parse_config_file(path) {
        Ok(partial) => {
            tracing::info!("Loaded config from {}", path.display());
            Some(partial)
        }
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Config error: {e}");
            None
        }
    }
}

/// Read and parse one config file.
pub fn parse_config_file(path: &Path) -> Result<PartialConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(file.to_partial())
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/pm-agents/pm-agents.toml
/// macOS: ~/Library/Application Support/pm-agents/pm-agents.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pm-agents")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    PartialConfig {
        project_root: cli.project_root.clone(),
        agent: AgentSection {
            model: cli.model.clone(),
            max_iterations: cli.max_iterations,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Read the Anthropic API key from the environment, falling back to an
/// `ANTHROPIC_API_KEY=` line in the project's `.env` file.
pub fn resolve_api_key(project_root: &Path) -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_VAR) {
        if !key.trim().is_empty() {
            return Some(key);
        }
    }

    let contents = std::fs::read_to_string(project_root.join(".env")).ok()?;
    api_key_from_dotenv(&contents)
}

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

fn api_key_from_dotenv(contents: &str) -> Option<String> {
    let prefix = format!("{API_KEY_VAR}=");
    contents
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .map(|value| value.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|value| !value.is_empty())
}
