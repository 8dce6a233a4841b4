//! 联机对局
//!
//! 一方为本地、另一方为远端。本地走子只在本方回合有效，成功后发送给对方；
//! 远端数据包只在对方回合被接受。

use std::str::FromStr;

use chess_core::{Board, ChessError, Coordinate, GameState, Move, MoveHandler, Side};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ProtocolError, Result};
use crate::packet::MovementPacket;
use crate::transport::{Connection, FrameReader, FrameWriter, FramedConnection};

/// 收包队列长度
const INCOMING_CAPACITY: usize = 16;

/// 握手消息：告知加入方执哪一方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub guest_side: Side,
}

/// 建房方握手，返回本地一方（白方）
pub async fn greet_guest<C: Connection>(conn: &mut C) -> Result<Side> {
    let greeting = Greeting {
        guest_side: Side::Black,
    };
    conn.send(&greeting).await?;
    Ok(greeting.guest_side.opponent())
}

/// 加入方握手，返回本地一方
pub async fn await_greeting<C: Connection>(conn: &mut C) -> Result<Side> {
    let greeting: Greeting = conn.recv().await?;
    debug!(side = %greeting.guest_side, "greeting received");
    Ok(greeting.guest_side)
}

/// 本地输入的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move { from: Coordinate, to: Coordinate },
    Quit,
}

/// 解析 `e2 e4` 或 `quit`
impl FromStr for Command {
    type Err = ChessError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("quit") {
            return Ok(Command::Quit);
        }

        let mut tokens = s.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(from), Some(to), None) => Ok(Command::Move {
                from: from.parse()?,
                to: to.parse()?,
            }),
            _ => Err(ChessError::InvalidFormat {
                what: "command",
                text: s.to_string(),
            }),
        }
    }
}

/// 对局过程中的通知
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 一方走子成功
    Moved {
        by: Side,
        mv: Move,
        board: Board,
        state: GameState,
    },
    /// 本地命令或远端数据包被拒绝
    Rejected { by: Side, reason: String },
}

/// 对局结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    GameOver(GameState),
    Quit,
    PeerClosed,
}

/// 联机对局
pub struct Session<W> {
    handler: MoveHandler,
    local: Side,
    writer: FrameWriter<W>,
    incoming: mpsc::Receiver<Result<MovementPacket>>,
    reader_task: JoinHandle<()>,
}

impl<W: AsyncWrite + Unpin + Send> Session<W> {
    /// 开始对局并启动收包任务（需要在 tokio 运行时中调用）
    pub fn start<R>(mut handler: MoveHandler, local: Side, conn: FramedConnection<R, W>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        handler.set_remote(Some(local.opponent()));
        let (reader, writer) = conn.split();
        let (tx, incoming) = mpsc::channel(INCOMING_CAPACITY);
        let reader_task = tokio::spawn(forward_packets(reader, tx));

        info!(%local, "session started");
        Self {
            handler,
            local,
            writer,
            incoming,
            reader_task,
        }
    }

    pub fn handler(&self) -> &MoveHandler {
        &self.handler
    }

    pub fn local(&self) -> Side {
        self.local
    }

    /// 本地走子，成功后发送给对方
    pub async fn play_local(&mut self, from: Coordinate, to: Coordinate) -> Result<()> {
        if self.handler.turn() != self.local {
            return Err(ChessError::NotYourTurn.into());
        }
        self.handler.make_move(from, to)?;
        self.writer.write_frame(&MovementPacket::new(from, to)).await
    }

    /// 等待并执行对方的下一步
    pub async fn await_remote(&mut self) -> Result<MovementPacket> {
        let packet = self
            .incoming
            .recv()
            .await
            .ok_or(ProtocolError::ConnectionClosed)??;
        self.apply_remote(packet)?;
        Ok(packet)
    }

    fn apply_remote(&mut self, packet: MovementPacket) -> Result<()> {
        if self.handler.turn() == self.local {
            return Err(ChessError::NotYourTurn.into());
        }
        packet.apply(&mut self.handler)
    }

    /// 对局主循环：处理本地命令和远端数据包，直到终局、退出或断线
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<SessionEnd> {
        loop {
            if self.handler.state().is_over() {
                info!(state = %self.handler.state(), "session finished");
                return Ok(SessionEnd::GameOver(self.handler.state()));
            }

            tokio::select! {
                command = commands.recv() => {
                    let (from, to) = match command {
                        Some(Command::Move { from, to }) => (from, to),
                        Some(Command::Quit) | None => return Ok(SessionEnd::Quit),
                    };
                    let result = self.play_local(from, to).await;
                    self.report(self.local, result, &events).await?;
                }
                packet = self.incoming.recv() => {
                    let packet = match packet {
                        Some(Ok(packet)) => packet,
                        Some(Err(ProtocolError::ConnectionClosed)) | None => {
                            info!("opponent left");
                            return Ok(SessionEnd::PeerClosed);
                        }
                        Some(Err(e)) => return Err(e),
                    };
                    let result = self.apply_remote(packet);
                    self.report(self.local.opponent(), result, &events).await?;
                }
            }
        }
    }

    /// 把一次走子的结果通知出去；规则错误只记录，其他错误向上返回
    async fn report(
        &self,
        by: Side,
        result: Result<()>,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Result<()> {
        let event = match result {
            Ok(()) => {
                let Some(mv) = self.handler.last_move().copied() else {
                    return Ok(());
                };
                SessionEvent::Moved {
                    by,
                    mv,
                    board: self.handler.board().clone(),
                    state: self.handler.state(),
                }
            }
            Err(ProtocolError::Chess(e)) => {
                warn!(%by, "move rejected: {}", e);
                SessionEvent::Rejected {
                    by,
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        let _ = events.send(event).await;
        Ok(())
    }
}

impl<W> Drop for Session<W> {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// 收包任务：逐帧读取并转发，读到错误后停止
async fn forward_packets<R>(mut reader: FrameReader<R>, tx: mpsc::Sender<Result<MovementPacket>>)
where
    R: AsyncRead + Unpin + Send,
{
    loop {
        let frame = reader.read_frame::<MovementPacket>().await;
        let failed = frame.is_err();
        if tx.send(frame).await.is_err() || failed {
            break;
        }
    }
}
