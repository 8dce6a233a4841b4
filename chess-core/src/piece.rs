//! 棋子定义

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, Result};

/// 棋子类型
///
/// 各类型的走法生成与威胁投射见 `rules` 模块。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 兵
    Pawn,
    /// 车
    Rook,
    /// 马
    Knight,
    /// 象
    Bishop,
    /// 后
    Queen,
    /// 王
    King,
}

impl PieceKind {
    /// 全部类型
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// 获取文件字符
    pub fn to_file_char(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// 从文件字符解析
    pub fn from_file_char(c: char) -> Result<PieceKind> {
        match c {
            'p' => Ok(PieceKind::Pawn),
            'r' => Ok(PieceKind::Rook),
            'n' => Ok(PieceKind::Knight),
            'b' => Ok(PieceKind::Bishop),
            'q' => Ok(PieceKind::Queen),
            'k' => Ok(PieceKind::King),
            _ => Err(ChessError::InvalidFormat {
                what: "piece kind",
                text: c.to_string(),
            }),
        }
    }
}

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 白方（先手，在下方）
    White,
    /// 黑方（后手，在上方）
    Black,
}

impl Side {
    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// 兵的前进方向（行增量）
    pub fn forward(&self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// 获取文件字符（l = 浅色，d = 深色）
    pub fn to_file_char(&self) -> char {
        match self {
            Side::White => 'l',
            Side::Black => 'd',
        }
    }

    /// 从文件字符解析
    pub fn from_file_char(c: char) -> Result<Side> {
        match c {
            'l' => Ok(Side::White),
            'd' => Ok(Side::Black),
            _ => Err(ChessError::InvalidFormat {
                what: "side",
                text: c.to_string(),
            }),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    kind: PieceKind,
    side: Side,
    /// 是否已经移动过（决定兵能否走两步）
    moved: bool,
}

impl Piece {
    /// 创建未移动过的新棋子
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Self::with_moved(kind, side, false)
    }

    /// 创建指定移动状态的棋子
    pub fn with_moved(kind: PieceKind, side: Side, moved: bool) -> Self {
        Self { kind, side, moved }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn has_moved(&self) -> bool {
        self.moved
    }

    pub fn set_moved(&mut self, moved: bool) {
        self.moved = moved;
    }

    /// 兵升变为其他棋子
    ///
    /// 目标为王时返回 `PromoteToKing`，当前不是兵时返回 `PromoteNonPawn`，
    /// 两种情况下棋子都保持不变。
    pub fn promote(&mut self, kind: PieceKind) -> Result<()> {
        if kind == PieceKind::King {
            return Err(ChessError::PromoteToKing);
        }
        if self.kind != PieceKind::Pawn {
            return Err(ChessError::PromoteNonPawn { kind: self.kind });
        }
        self.kind = kind;
        Ok(())
    }

    /// 是否属于指定阵营的指定类型
    pub fn is(&self, kind: PieceKind, side: Side) -> bool {
        self.kind == kind && self.side == side
    }

    /// 获取棋盘显示字符（白方大写，黑方小写）
    pub fn display_char(&self) -> char {
        let c = self.kind.to_file_char();
        match self.side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

/// 文件编码：类型字符 + 阵营字符，例如 `pl`
impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.to_file_char(), self.side.to_file_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_chars() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_file_char(kind.to_file_char()), Ok(kind));
        }
        assert_eq!(Side::from_file_char('l'), Ok(Side::White));
        assert_eq!(Side::from_file_char('d'), Ok(Side::Black));

        assert!(matches!(
            PieceKind::from_file_char('x'),
            Err(ChessError::InvalidFormat { what: "piece kind", .. })
        ));
        assert!(matches!(
            Side::from_file_char('w'),
            Err(ChessError::InvalidFormat { what: "side", .. })
        ));
    }

    #[test]
    fn test_piece_display() {
        let pawn = Piece::new(PieceKind::Pawn, Side::White);
        assert_eq!(pawn.to_string(), "pl");
        assert_eq!(pawn.display_char(), 'P');

        let queen = Piece::new(PieceKind::Queen, Side::Black);
        assert_eq!(queen.to_string(), "qd");
        assert_eq!(queen.display_char(), 'q');
    }

    #[test]
    fn test_promote() {
        let mut pawn = Piece::with_moved(PieceKind::Pawn, Side::White, true);
        pawn.promote(PieceKind::Queen).unwrap();
        assert_eq!(pawn.kind(), PieceKind::Queen);
        assert!(pawn.has_moved());

        // 已经不是兵
        assert_eq!(
            pawn.promote(PieceKind::Rook),
            Err(ChessError::PromoteNonPawn { kind: PieceKind::Queen })
        );
        assert_eq!(pawn.kind(), PieceKind::Queen);
    }

    #[test]
    fn test_promote_to_king_rejected() {
        let mut pawn = Piece::new(PieceKind::Pawn, Side::Black);
        assert_eq!(pawn.promote(PieceKind::King), Err(ChessError::PromoteToKing));
        assert_eq!(pawn.kind(), PieceKind::Pawn);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::Black.opponent(), Side::White);
        assert_eq!(Side::White.forward(), 1);
        assert_eq!(Side::Black.forward(), -1);
    }
}
