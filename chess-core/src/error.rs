//! 错误类型定义

use thiserror::Error;

use crate::coord::Coordinate;
use crate::piece::PieceKind;

/// 规则引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChessError {
    // === 格式错误 ===
    /// 无法识别的文本编码（坐标、阵营或棋子类型）
    #[error("Invalid {what} encoding: {text:?}")]
    InvalidFormat { what: &'static str, text: String },

    // === 越界 ===
    /// 坐标超出棋盘，走法生成时作为"出界"信号使用
    #[error("Coordinate out of range: ({x}, {y})")]
    OutOfRange { x: i32, y: i32 },

    // === 状态冲突 ===
    /// 目标格子已有棋子
    #[error("There is already a piece at {at}")]
    SquareOccupied { at: Coordinate },

    /// 只有兵可以升变
    #[error("Can only promote pawns, found {kind:?}")]
    PromoteNonPawn { kind: PieceKind },

    /// 不能升变为王
    #[error("Cannot promote to king")]
    PromoteToKing,

    // === 无效请求 ===
    /// 起点没有可走的棋子
    #[error("There is no movable piece at {at}")]
    NoPiece { at: Coordinate },

    /// 目标格子不在合法走法表中
    #[error("No legal move from {from} to {to}")]
    IllegalDestination { from: Coordinate, to: Coordinate },

    /// 空走法
    #[error("Move is missing")]
    NoMove,

    /// 不是该方回合
    #[error("Not your turn")]
    NotYourTurn,

    /// 没有可以悔棋的走法
    #[error("No move to undo")]
    NothingToUndo,

    // === 模拟故障 ===
    /// 执行或撤销时起点为空
    #[error("Simulation fault: no piece at {at}")]
    EmptySource { at: Coordinate },

    /// 执行或撤销时目标格子意外被占
    #[error("Simulation fault: {at} is unexpectedly occupied")]
    OccupiedDestination { at: Coordinate },
}

impl ChessError {
    /// 是否为"出界"信号
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, ChessError::OutOfRange { .. })
    }

    /// 是否为调用方的无效请求（不会修改任何状态）
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            ChessError::NoPiece { .. }
                | ChessError::IllegalDestination { .. }
                | ChessError::NoMove
                | ChessError::NotYourTurn
                | ChessError::NothingToUndo
        )
    }
}

/// 规则引擎操作结果类型
pub type Result<T> = std::result::Result<T, ChessError>;
