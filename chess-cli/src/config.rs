//! 配置加载
//!
//! 配置文件为 JSON，缺省字段使用默认值；命令行参数优先于配置文件。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chess_io::{NetworkConfig, LISTEN_HOST};
use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// 默认日志过滤
pub const DEFAULT_LOG_FILTER: &str = "chess_cli=info,chess_io=info";

/// 应用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    /// tracing 过滤指令，逗号分隔，如 `chess_core=debug,chess_io=info`
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// 读取配置文件，未指定时使用默认配置
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {:?}", path))
    }

    /// 用命令行参数覆盖
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(port) = args.port {
            self.network.port = port;
        }
        if let Some(addr) = &args.connect {
            self.network.host = addr.clone();
        }
        self
    }

    /// 建房时的监听配置
    pub fn listen_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: LISTEN_HOST.to_string(),
            ..self.network.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.network.port, 1234);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        let json = r#"{"network": {"port": 4321}, "log_filter": "chess_core=debug"}"#;
        write!(file, "{}", json).unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.network.port, 4321);
        assert_eq!(config.network.host, "127.0.0.1");
        assert_eq!(config.network.accept_timeout_secs, 300);
        assert_eq!(config.log_filter, "chess_core=debug");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(AppConfig::load(Some(missing.as_path())).is_err());

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(AppConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_overrides() {
        let args =
            Args::parse_from(["chess-cli", "game.txt", "--connect", "10.0.0.2", "--port", "5000"]);
        let config = AppConfig::default().with_overrides(&args);
        assert_eq!(config.network.addr(), "10.0.0.2:5000");

        let listen = config.listen_config();
        assert_eq!(listen.addr(), "0.0.0.0:5000");
    }
}
