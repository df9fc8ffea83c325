use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub history_max: usize,
    pub history_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "$ ".to_string(),
            history_max: 500,
            history_file: None,
        }
    }

    /// `RAWSH_CONFIG` if set, otherwise `~/.rawshrc` when it exists.
    pub fn locate(home: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("RAWSH_CONFIG") {
            return Some(PathBuf::from(path));
        }
        home.map(|h| h.join(".rawshrc")).filter(|p| p.is_file())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let src = fs::read_to_string(path)?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (lineno, line) in src.lines().enumerate() {
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse(format!("Line {}: No '=' found: {}", lineno + 1, line)));
            };

            // Value is kept verbatim so a prompt can end in spaces.
            match key.trim() {
                "prompt" => config.prompt = value.to_string(),
                "history_max" => {
                    config.history_max = value.trim().parse::<usize>().map_err(|_| {
                        ConfigError::Parse(format!("Line {}: Invalid usize: {}", lineno + 1, line))
                    })?
                }
                "history_file" => {
                    let value = value.trim();
                    config.history_file = (!value.is_empty()).then(|| value.to_string());
                }
                k => return Err(ConfigError::Parse(format!("Line {}: Unknown key: {}", lineno + 1, k))),
            }
        }
        Ok(config)
    }
}
