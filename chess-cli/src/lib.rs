//! 国际象棋命令行
//!
//! 包含:
//! - 命令行参数
//! - 配置加载
//! - 离线回放和联机对局

pub mod app;
pub mod cli;
pub mod config;

pub use cli::{Args, Mode};
pub use config::AppConfig;
