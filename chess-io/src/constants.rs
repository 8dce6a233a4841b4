//! 传输常量定义

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 1024;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 1234;

/// 默认主机地址
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// 建房时监听的地址
pub const LISTEN_HOST: &str = "0.0.0.0";

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 等待对方加入的超时（秒）
pub const ACCEPT_TIMEOUT_SECS: u64 = 300;

