//! 国际象棋规则引擎
//!
//! 包含:
//! - 坐标、棋子、棋盘等核心数据结构
//! - 各兵种的走法生成和威胁计算
//! - 可撤销的走法 (Move)
//! - 回合控制、将军/将死/困毙判定 (MoveHandler)

mod board;
mod constants;
mod coord;
mod error;
mod handler;
mod moves;
mod piece;
mod rules;
mod state;

pub use board::{Board, Tile, Tiles};
pub use constants::*;
pub use coord::Coordinate;
pub use error::{ChessError, Result};
pub use handler::{threat_map, LegalMoves, MoveHandler};
pub use moves::{CastleMove, DoubleStepMove, EnPassantMove, Move, SimpleMove};
pub use piece::{Piece, PieceKind, Side};
pub use rules::MoveTable;
pub use state::GameState;
