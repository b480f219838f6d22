use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{AppContext, InitArgs};
use crate::core::tagger::TokenizeOpts;

/// Engine configuration errors. Data-quality problems never raise;
/// only an impossible configuration does.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("len_min ({0}) exceeds len_max ({1})")]
    WindowInverted(usize, usize),

    #[error("len_max must be at least 1")]
    EmptyWindow,
}

/// Options for one coverage pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum sentence length (tokens) to index
    pub len_min: usize,

    /// Maximum sentence length (tokens) to index
    pub len_max: usize,

    /// Sentence budget for the greedy selector; 0 = unlimited
    pub target_count: usize,

    /// Strip diacritics when building normalized keys
    pub fold_diacritics: bool,

    /// Resolve leading elision contractions in sentence tokens
    pub handle_elisions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            len_min: 2,
            len_max: 12,
            target_count: 0,
            fold_diacritics: false,
            handle_elisions: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.len_max == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.len_min > self.len_max {
            return Err(ConfigError::WindowInverted(self.len_min, self.len_max));
        }
        Ok(())
    }

    pub fn tokenize_opts(&self) -> TokenizeOpts {
        TokenizeOpts {
            fold_diacritics: self.fold_diacritics,
            handle_elisions: self.handle_elisions,
        }
    }
}

/// Thresholds for the non-greedy filter mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum in-list content-word matches to keep a sentence
    pub min_content_words: usize,

    /// Maximum token count to keep a sentence
    pub max_tokens: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_content_words: 4,
            max_tokens: 8,
        }
    }
}

/// Top-level file/environment configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Coverage pass defaults
    pub engine: EngineConfig,

    /// Filter mode defaults
    pub filter: FilterConfig,
}

pub fn load_config() -> Result<Config> {
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    let config_paths = ["lexicover.toml", ".lexicover.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
            break;
        }
    }

    // Add environment variables with LEXICOVER_ prefix
    builder = builder.add_source(config::Environment::with_prefix("LEXICOVER").separator("_"));

    let cfg = builder.build().context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(args: InitArgs, ctx: &AppContext) -> Result<()> {
    let config_path = args.path.join("lexicover.toml");

    if config_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let cfg = EngineConfig {
            len_min: 10,
            len_max: 3,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::WindowInverted(10, 3)));
    }

    #[test]
    fn zero_len_max_is_rejected() {
        let cfg = EngineConfig {
            len_min: 0,
            len_max: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyWindow));
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let toml_string = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.engine.len_max, 12);
        assert_eq!(parsed.filter.min_content_words, 4);
    }
}
