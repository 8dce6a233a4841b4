//! 开局读取与联机
//!
//! 包含:
//! - 文本开局指令读取 (ChessReader)
//! - 走子数据包 (MovementPacket)
//! - 帧编解码和 TCP 传输 (FrameReader, FrameWriter, Host)
//! - 联机对局循环 (Session)

mod constants;
mod error;
mod packet;
mod reader;
mod session;
mod transport;

pub use constants::*;
pub use error::{ProtocolError, Result};
pub use packet::MovementPacket;
pub use reader::{ChessReader, Directive, GameLoad, SkipReason, SkippedLine};
pub use session::{
    await_greeting, greet_guest, Command, Greeting, Session, SessionEnd, SessionEvent,
};
pub use transport::{
    connect, Connection, FrameReader, FrameWriter, FramedConnection, Host, NetworkConfig,
    TcpConnection,
};
