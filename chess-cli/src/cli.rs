//! 命令行参数

use std::path::PathBuf;

use clap::Parser;

/// 国际象棋命令行
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "chess-cli",
    version,
    about = "Replay a chess setup file and play it over the network"
)]
pub struct Args {
    /// 开局指令文件
    pub file: PathBuf,

    /// 建房并等待对方加入（执白）
    #[arg(long, conflicts_with = "connect")]
    pub host: bool,

    /// 加入指定主机的对局（执黑）
    #[arg(long, value_name = "ADDR")]
    pub connect: Option<String>,

    /// 端口，覆盖配置文件
    #[arg(long)]
    pub port: Option<u16>,

    /// JSON 配置文件
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 只回放并打印结果
    Offline,
    Host,
    Join,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.host {
            Mode::Host
        } else if self.connect.is_some() {
            Mode::Join
        } else {
            Mode::Offline
        }
    }
}
