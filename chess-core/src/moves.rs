//! 走法命令
//!
//! 每个走法在生成时记录撤销所需的全部信息（被吃的棋子、原先的移动标记），
//! `execute` 与 `revert` 互为逆操作。两者都先校验再修改：失败时棋盘保持不变。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::coord::Coordinate;
use crate::error::{ChessError, Result};
use crate::piece::Piece;

/// 普通走法（含吃子）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleMove {
    from: Coordinate,
    to: Coordinate,
    /// 被吃的棋子（如果有）
    captured: Option<Piece>,
    /// 走子前的移动标记
    previously_moved: bool,
}

impl SimpleMove {
    /// 基于当前棋盘创建走法
    pub fn new(board: &Board, from: Coordinate, to: Coordinate) -> Result<Self> {
        let piece = board.piece(from).ok_or(ChessError::NoPiece { at: from })?;
        Ok(Self {
            from,
            to,
            captured: board.piece(to).copied(),
            previously_moved: piece.has_moved(),
        })
    }

    pub fn from(&self) -> Coordinate {
        self.from
    }

    pub fn to(&self) -> Coordinate {
        self.to
    }

    pub fn captured(&self) -> Option<Piece> {
        self.captured
    }

    fn execute(&self, board: &mut Board) -> Result<()> {
        if !board.is_occupied(self.from) {
            return Err(ChessError::EmptySource { at: self.from });
        }
        board.move_piece(self.from, self.to);
        set_moved(board, self.to, true);
        Ok(())
    }

    fn revert(&self, board: &mut Board) -> Result<()> {
        if !board.is_occupied(self.to) {
            return Err(ChessError::EmptySource { at: self.to });
        }
        if board.is_occupied(self.from) {
            return Err(ChessError::OccupiedDestination { at: self.from });
        }
        board.move_piece(self.to, self.from);
        set_moved(board, self.from, self.previously_moved);
        board.put(self.to, self.captured);
        Ok(())
    }
}

/// 兵前进两格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoubleStepMove {
    step: SimpleMove,
    /// 被越过的格子，下一步吃过路兵时使用
    skipped: Coordinate,
}

impl DoubleStepMove {
    pub fn new(
        board: &Board,
        from: Coordinate,
        to: Coordinate,
        skipped: Coordinate,
    ) -> Result<Self> {
        Ok(Self {
            step: SimpleMove::new(board, from, to)?,
            skipped,
        })
    }

    pub fn from(&self) -> Coordinate {
        self.step.from
    }

    pub fn to(&self) -> Coordinate {
        self.step.to
    }

    pub fn skipped(&self) -> Coordinate {
        self.skipped
    }
}

/// 吃过路兵
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnPassantMove {
    from: Coordinate,
    to: Coordinate,
    /// 被吃的兵所在位置（不是落点）
    enemy: Coordinate,
    captured: Piece,
    previously_moved: bool,
}

impl EnPassantMove {
    pub fn new(board: &Board, from: Coordinate, to: Coordinate, enemy: Coordinate) -> Result<Self> {
        let piece = board.piece(from).ok_or(ChessError::NoPiece { at: from })?;
        let captured = *board.piece(enemy).ok_or(ChessError::NoPiece { at: enemy })?;
        Ok(Self {
            from,
            to,
            enemy,
            captured,
            previously_moved: piece.has_moved(),
        })
    }

    pub fn enemy(&self) -> Coordinate {
        self.enemy
    }

    fn execute(&self, board: &mut Board) -> Result<()> {
        if !board.is_occupied(self.from) {
            return Err(ChessError::EmptySource { at: self.from });
        }
        if !board.is_occupied(self.enemy) {
            return Err(ChessError::EmptySource { at: self.enemy });
        }
        if board.is_occupied(self.to) {
            return Err(ChessError::OccupiedDestination { at: self.to });
        }
        board.move_piece(self.from, self.to);
        board.put(self.enemy, None);
        set_moved(board, self.to, true);
        Ok(())
    }

    fn revert(&self, board: &mut Board) -> Result<()> {
        if !board.is_occupied(self.to) {
            return Err(ChessError::EmptySource { at: self.to });
        }
        for at in [self.from, self.enemy] {
            if board.is_occupied(at) {
                return Err(ChessError::OccupiedDestination { at });
            }
        }
        board.move_piece(self.to, self.from);
        set_moved(board, self.from, self.previously_moved);
        board.put(self.enemy, Some(self.captured));
        Ok(())
    }
}

/// 王车易位（只保留数据结构，走法生成从不产生）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastleMove {
    first: (Coordinate, Coordinate),
    second: (Coordinate, Coordinate),
    first_moved: bool,
    second_moved: bool,
}

impl CastleMove {
    pub fn new(
        board: &Board,
        from1: Coordinate,
        to1: Coordinate,
        from2: Coordinate,
        to2: Coordinate,
    ) -> Result<Self> {
        let first = board.piece(from1).ok_or(ChessError::NoPiece { at: from1 })?;
        let second = board.piece(from2).ok_or(ChessError::NoPiece { at: from2 })?;
        Ok(Self {
            first: (from1, to1),
            second: (from2, to2),
            first_moved: first.has_moved(),
            second_moved: second.has_moved(),
        })
    }

    fn execute(&self, board: &mut Board) -> Result<()> {
        let (from1, to1) = self.first;
        let (from2, to2) = self.second;
        for from in [from1, from2] {
            if !board.is_occupied(from) {
                return Err(ChessError::EmptySource { at: from });
            }
        }
        for to in [to1, to2] {
            if to != from1 && to != from2 && board.is_occupied(to) {
                return Err(ChessError::OccupiedDestination { at: to });
            }
        }

        // 先取出两枚棋子，避免落点与另一枚的起点重合时互相覆盖
        let a = board.put(from1, None);
        let b = board.put(from2, None);
        board.put(to1, a);
        board.put(to2, b);
        set_moved(board, to1, true);
        set_moved(board, to2, true);
        Ok(())
    }

    fn revert(&self, board: &mut Board) -> Result<()> {
        let (from1, to1) = self.first;
        let (from2, to2) = self.second;
        for to in [to1, to2] {
            if !board.is_occupied(to) {
                return Err(ChessError::EmptySource { at: to });
            }
        }
        for from in [from1, from2] {
            if from != to1 && from != to2 && board.is_occupied(from) {
                return Err(ChessError::OccupiedDestination { at: from });
            }
        }

        let a = board.put(to1, None);
        let b = board.put(to2, None);
        board.put(from1, a);
        board.put(from2, b);
        set_moved(board, from1, self.first_moved);
        set_moved(board, from2, self.second_moved);
        Ok(())
    }
}

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Simple(SimpleMove),
    DoubleStep(DoubleStepMove),
    EnPassant(EnPassantMove),
    Castle(CastleMove),
}

impl Move {
    /// 执行走法并设置移动标记
    pub fn execute(&self, board: &mut Board) -> Result<()> {
        match self {
            Move::Simple(m) => m.execute(board),
            Move::DoubleStep(m) => m.step.execute(board),
            Move::EnPassant(m) => m.execute(board),
            Move::Castle(m) => m.execute(board),
        }
    }

    /// 撤销走法，恢复被吃的棋子和原先的移动标记
    pub fn revert(&self, board: &mut Board) -> Result<()> {
        match self {
            Move::Simple(m) => m.revert(board),
            Move::DoubleStep(m) => m.step.revert(board),
            Move::EnPassant(m) => m.revert(board),
            Move::Castle(m) => m.revert(board),
        }
    }

    /// 起点（易位时为第一枚棋子的起点）
    pub fn from(&self) -> Coordinate {
        match self {
            Move::Simple(m) => m.from,
            Move::DoubleStep(m) => m.step.from,
            Move::EnPassant(m) => m.from,
            Move::Castle(m) => m.first.0,
        }
    }

    /// 落点（易位时为第一枚棋子的落点）
    pub fn to(&self) -> Coordinate {
        match self {
            Move::Simple(m) => m.to,
            Move::DoubleStep(m) => m.step.to,
            Move::EnPassant(m) => m.to,
            Move::Castle(m) => m.first.1,
        }
    }

    /// 被吃的棋子
    pub fn captured(&self) -> Option<Piece> {
        match self {
            Move::Simple(m) => m.captured,
            Move::DoubleStep(m) => m.step.captured,
            Move::EnPassant(m) => Some(m.captured),
            Move::Castle(_) => None,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured().is_some()
    }

    /// 兵走两格时被越过的格子
    pub fn skipped(&self) -> Option<Coordinate> {
        match self {
            Move::DoubleStep(m) => Some(m.skipped),
            _ => None,
        }
    }
}

/// 与读谱格式一致：`e2 e4`，吃子加 `*`；易位输出四个坐标
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Castle(m) => write!(
                f,
                "{} {} {} {}",
                m.first.0, m.first.1, m.second.0, m.second.1
            ),
            _ => {
                write!(f, "{} {}", self.from(), self.to())?;
                if self.is_capture() {
                    f.write_str("*")?;
                }
                Ok(())
            }
        }
    }
}

fn set_moved(board: &mut Board, at: Coordinate, moved: bool) {
    if let Some(piece) = board.piece_mut(at) {
        piece.set_moved(moved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{PieceKind, Side};

    fn c(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn assert_round_trip(board: &mut Board, mv: Move) {
        let before = board.clone();
        mv.execute(board).unwrap();
        assert_ne!(*board, before, "{mv} should change the board");
        mv.revert(board).unwrap();
        assert_eq!(*board, before, "{mv} should revert exactly");
    }

    #[test]
    fn test_simple_move_round_trip() {
        let mut board = Board::initial();
        let mv = Move::Simple(SimpleMove::new(&board, c("g1"), c("f3")).unwrap());
        assert_round_trip(&mut board, mv);

        mv.execute(&mut board).unwrap();
        assert!(board.piece(c("f3")).unwrap().has_moved());
        assert!(board.piece(c("g1")).is_none());
    }

    #[test]
    fn test_capture_round_trip() {
        let mut board = Board::empty();
        board.place(c("d4"), Piece::with_moved(PieceKind::Rook, Side::White, true)).unwrap();
        board.place(c("d7"), Piece::new(PieceKind::Bishop, Side::Black)).unwrap();

        let mv = Move::Simple(SimpleMove::new(&board, c("d4"), c("d7")).unwrap());
        assert!(mv.is_capture());
        assert_eq!(mv.to_string(), "d4 d7*");
        assert_round_trip(&mut board, mv);
        assert_eq!(board.piece(c("d7")), Some(&Piece::new(PieceKind::Bishop, Side::Black)));
    }

    #[test]
    fn test_double_step_round_trip() {
        let mut board = Board::initial();
        let step = DoubleStepMove::new(&board, c("e2"), c("e4"), c("e3")).unwrap();
        let mv = Move::DoubleStep(step);
        assert_eq!(mv.skipped(), Some(c("e3")));
        assert_eq!(mv.to_string(), "e2 e4");
        assert_round_trip(&mut board, mv);
        assert!(!board.piece(c("e2")).unwrap().has_moved());
    }

    #[test]
    fn test_en_passant_round_trip() {
        let mut board = Board::empty();
        board.place(c("e5"), Piece::with_moved(PieceKind::Pawn, Side::White, true)).unwrap();
        board.place(c("d5"), Piece::with_moved(PieceKind::Pawn, Side::Black, true)).unwrap();

        let mv = Move::EnPassant(EnPassantMove::new(&board, c("e5"), c("d6"), c("d5")).unwrap());
        assert_eq!(mv.captured(), Some(Piece::with_moved(PieceKind::Pawn, Side::Black, true)));
        assert_round_trip(&mut board, mv);

        mv.execute(&mut board).unwrap();
        assert!(board.piece(c("d5")).is_none());
        assert!(board.piece(c("e5")).is_none());
        assert!(board.piece(c("d6")).is_some());
    }

    #[test]
    fn test_castle_round_trip() {
        let mut board = Board::empty();
        board.place(c("e1"), Piece::new(PieceKind::King, Side::White)).unwrap();
        board.place(c("h1"), Piece::new(PieceKind::Rook, Side::White)).unwrap();

        let castle = CastleMove::new(&board, c("e1"), c("g1"), c("h1"), c("f1")).unwrap();
        let mv = Move::Castle(castle);
        assert_eq!(mv.to_string(), "e1 g1 h1 f1");
        assert_round_trip(&mut board, mv);

        mv.execute(&mut board).unwrap();
        assert!(board.piece(c("g1")).unwrap().is(PieceKind::King, Side::White));
        assert!(board.piece(c("f1")).unwrap().has_moved());
    }

    #[test]
    fn test_execute_is_atomic_on_fault() {
        let mut board = Board::initial();
        let mv = Move::Simple(SimpleMove::new(&board, c("b1"), c("c3")).unwrap());
        board.remove(c("b1"));
        let before = board.clone();

        assert_eq!(mv.execute(&mut board), Err(ChessError::EmptySource { at: c("b1") }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_revert_is_atomic_on_fault() {
        let mut board = Board::initial();
        let mv = Move::Simple(SimpleMove::new(&board, c("e2"), c("e3")).unwrap());
        mv.execute(&mut board).unwrap();
        board.place(c("e2"), Piece::new(PieceKind::Queen, Side::White)).unwrap();
        let before = board.clone();

        assert_eq!(mv.revert(&mut board), Err(ChessError::OccupiedDestination { at: c("e2") }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_en_passant_revert_checks_enemy_square() {
        let mut board = Board::empty();
        board.place(c("e5"), Piece::with_moved(PieceKind::Pawn, Side::White, true)).unwrap();
        board.place(c("d5"), Piece::with_moved(PieceKind::Pawn, Side::Black, true)).unwrap();
        let mv = Move::EnPassant(EnPassantMove::new(&board, c("e5"), c("d6"), c("d5")).unwrap());
        mv.execute(&mut board).unwrap();

        board.place(c("d5"), Piece::new(PieceKind::Knight, Side::Black)).unwrap();
        let before = board.clone();
        assert_eq!(mv.revert(&mut board), Err(ChessError::OccupiedDestination { at: c("d5") }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_castle_revert_checks_sources() {
        let mut board = Board::empty();
        board.place(c("e1"), Piece::new(PieceKind::King, Side::White)).unwrap();
        board.place(c("h1"), Piece::new(PieceKind::Rook, Side::White)).unwrap();
        let castle = CastleMove::new(&board, c("e1"), c("g1"), c("h1"), c("f1")).unwrap();
        let mv = Move::Castle(castle);
        mv.execute(&mut board).unwrap();

        board.place(c("h1"), Piece::new(PieceKind::Bishop, Side::White)).unwrap();
        let before = board.clone();
        assert_eq!(mv.revert(&mut board), Err(ChessError::OccupiedDestination { at: c("h1") }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_new_requires_piece() {
        let board = Board::empty();
        assert_eq!(
            SimpleMove::new(&board, c("a1"), c("a2")),
            Err(ChessError::NoPiece { at: c("a1") })
        );
    }
}
