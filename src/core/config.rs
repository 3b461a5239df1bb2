use crate::error::InitProcessError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BUFFER_SIZE: usize = 65535;
const MIN_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub divert: DivertConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivertConfig {
    pub priority: i16,
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub log_file: Option<PathBuf>,
    pub color: bool,
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, InitProcessError> {
        LevelFilter::from_str(&self.level)
            .map_err(|e| InitProcessError::Config(format!("無効なログレベル {}: {}", self.level, e)))
    }
}

impl Configuration {
    pub fn from_env() -> Result<Self, InitProcessError> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self, InitProcessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let priority = var("DIVERT_PRIORITY")
            .unwrap_or_else(|| "0".to_string())
            .parse::<i16>()
            .map_err(|e| InitProcessError::Config(format!("無効な優先度: {}", e)))?;

        let buffer_size = match var("DIVERT_BUFFER_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .map_err(|e| InitProcessError::Config(format!("無効なバッファサイズ: {}", e)))?,
            None => DEFAULT_BUFFER_SIZE,
        };
        if !(MIN_BUFFER_SIZE..=DEFAULT_BUFFER_SIZE).contains(&buffer_size) {
            return Err(InitProcessError::Config(format!(
                "バッファサイズは {} から {} の範囲で指定してください: {}",
                MIN_BUFFER_SIZE, DEFAULT_BUFFER_SIZE, buffer_size
            )));
        }

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_file: var("LOG_FILE").filter(|path| !path.is_empty()).map(PathBuf::from),
            color: var("NO_COLOR").is_none(),
        };
        logging.level_filter()?;

        Ok(Configuration {
            divert: DivertConfig {
                priority,
                buffer_size,
            },
            logging,
        })
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            divert: DivertConfig {
                priority: 0,
                buffer_size: DEFAULT_BUFFER_SIZE,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                log_file: None,
                color: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Configuration, InitProcessError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Configuration::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_variables() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.divert.priority, 0);
        assert_eq!(config.divert.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Info);
        assert!(config.logging.log_file.is_none());
        assert!(config.logging.color);
    }

    #[test]
    fn reads_every_variable() {
        let config = from_map(&[
            ("DIVERT_PRIORITY", "-100"),
            ("DIVERT_BUFFER_SIZE", "2048"),
            ("LOG_LEVEL", "warn"),
            ("LOG_FILE", "reject.log"),
            ("NO_COLOR", "1"),
        ])
        .unwrap();
        assert_eq!(config.divert.priority, -100);
        assert_eq!(config.divert.buffer_size, 2048);
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Warn);
        assert_eq!(config.logging.log_file, Some(PathBuf::from("reject.log")));
        assert!(!config.logging.color);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(from_map(&[("DIVERT_PRIORITY", "high")]), Err(InitProcessError::Config(_))));
        assert!(matches!(from_map(&[("DIVERT_BUFFER_SIZE", "16")]), Err(InitProcessError::Config(_))));
        assert!(matches!(from_map(&[("DIVERT_BUFFER_SIZE", "70000")]), Err(InitProcessError::Config(_))));
        assert!(matches!(from_map(&[("LOG_LEVEL", "loud")]), Err(InitProcessError::Config(_))));
    }

    #[test]
    fn testing_configuration_is_valid() {
        let config = Configuration::for_testing();
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::Debug);
    }
}
