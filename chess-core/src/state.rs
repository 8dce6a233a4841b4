//! 对局状态

use std::fmt;

use serde::{Deserialize, Serialize};

/// 对局状态
///
/// 只在一个回合完整结束时重新计算；回合进行中读到的是上一回合的结果。
/// 不识别三次重复和五十步规则，困毙只表示"无合法走法且未被将军"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// 尚未走过任何一步
    #[default]
    NoGame,
    /// 对局进行中
    InGame,
    /// 将军
    Check,
    /// 将死
    Checkmate,
    /// 困毙
    Stalemate,
}

impl GameState {
    /// 对局是否已经结束
    pub fn is_over(&self) -> bool {
        matches!(self, GameState::Checkmate | GameState::Stalemate)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::NoGame => "nogame",
            GameState::InGame => "ingame",
            GameState::Check => "check",
            GameState::Checkmate => "checkmate",
            GameState::Stalemate => "stalemate",
        };
        f.write_str(name)
    }
}
