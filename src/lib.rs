use config::{Config, ConfigError};
use serde::Deserialize;

pub mod application;
pub mod domain;
pub mod infrastructure;

const DEFAULT_STORAGE_PATH: &str = "./data";

#[derive(Clone, Debug, Deserialize)]
pub struct KontorConfig {
    pub storage: Storage,
    pub logger: Logger,
}

impl KontorConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("kontor.toml")
    }

    /// 設定ファイルを指定して読み込む（ファイルが無ければ既定値と環境変数のみ）
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("storage.path", DEFAULT_STORAGE_PATH)?
            .set_default("logger.level", "INFO")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("KONTOR").separator("_"))
            .build()?
            .try_deserialize::<KontorConfig>()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
    pub path: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Logger {
    pub level: Level,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum Level {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl From<&Level> for tracing::Level {
    fn from(value: &Level) -> Self {
        match value {
            Level::TRACE => tracing::Level::TRACE,
            Level::DEBUG => tracing::Level::DEBUG,
            Level::INFO => tracing::Level::INFO,
            Level::WARN => tracing::Level::WARN,
            Level::ERROR => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_load_defaults_without_file() {
        let config = KontorConfig::load_from("kontor-missing-for-test.toml").unwrap();
        assert_eq!(config.storage.path, DEFAULT_STORAGE_PATH);
        assert_eq!(config.logger.level, Level::INFO);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("kontor-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[storage]\npath = \"/var/lib/kontor\"\n\n[logger]\nlevel = \"DEBUG\"\n",
        )
        .unwrap();
        let config = KontorConfig::load_from(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.storage.path, "/var/lib/kontor");
        assert_eq!(config.logger.level, Level::DEBUG);
        assert_eq!(tracing::Level::from(&config.logger.level), tracing::Level::DEBUG);
    }
}
