//! 各类棋子的走法生成与威胁投射
//!
//! `legal_moves` 只读棋盘，生成不考虑自将的候选走法；
//! `apply_threat` 在快照上标记棋子能吃到的所有格子，用于构建威胁图。
//! 出界 (`OutOfRange`) 在这里只表示"此方向没有格子"，按候选逐个跳过。

use std::collections::BTreeMap;

use crate::board::{Board, Tiles};
use crate::constants::{
    BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, QUEEN_DIRECTIONS, ROOK_DIRECTIONS,
};
use crate::coord::Coordinate;
use crate::moves::{DoubleStepMove, EnPassantMove, Move, SimpleMove};
use crate::piece::{Piece, PieceKind, Side};

/// 单枚棋子的走法表：落点 -> 走法
pub type MoveTable = BTreeMap<Coordinate, Move>;

impl PieceKind {
    /// 生成位于 `at` 的棋子的候选走法
    ///
    /// `last_move` 为上一步走法，只有兵用它判断能否吃过路兵。
    /// 王不生成易位。
    pub fn legal_moves(self, board: &Board, last_move: Option<&Move>, at: Coordinate) -> MoveTable {
        let mut moves = MoveTable::new();
        let Some(piece) = board.piece(at).copied() else {
            return moves;
        };

        match self {
            PieceKind::Pawn => pawn_moves(board, last_move, at, piece, &mut moves),
            PieceKind::Rook => ray_moves(board, at, piece.side(), &ROOK_DIRECTIONS, &mut moves),
            PieceKind::Bishop => ray_moves(board, at, piece.side(), &BISHOP_DIRECTIONS, &mut moves),
            PieceKind::Queen => ray_moves(board, at, piece.side(), &QUEEN_DIRECTIONS, &mut moves),
            PieceKind::Knight => step_moves(board, at, piece.side(), &KNIGHT_OFFSETS, &mut moves),
            PieceKind::King => step_moves(board, at, piece.side(), &KING_OFFSETS, &mut moves),
        }

        moves
    }

    /// 在威胁图上标记位于 `at` 的棋子能吃到的格子
    pub fn apply_threat(self, map: &mut Tiles, at: Coordinate) {
        match self {
            PieceKind::Pawn => {
                let Some(piece) = map[at].piece().copied() else {
                    return;
                };
                let forward = piece.side().forward();
                step_threat(map, at, &[(1, forward), (-1, forward)]);
            }
            PieceKind::Rook => ray_threat(map, at, &ROOK_DIRECTIONS),
            PieceKind::Bishop => ray_threat(map, at, &BISHOP_DIRECTIONS),
            PieceKind::Queen => ray_threat(map, at, &QUEEN_DIRECTIONS),
            PieceKind::Knight => step_threat(map, at, &KNIGHT_OFFSETS),
            PieceKind::King => step_threat(map, at, &KING_OFFSETS),
        }
    }
}

/// 兵的走法：前进一格、斜吃、吃过路兵、首次前进两格
fn pawn_moves(
    board: &Board,
    last_move: Option<&Move>,
    at: Coordinate,
    piece: Piece,
    moves: &mut MoveTable,
) {
    let side = piece.side();
    let forward = side.forward();

    // 前进一格
    if let Ok(to) = at.offset(0, forward) {
        if !board.is_occupied(to) {
            add_simple(board, at, to, moves);
        }
    }

    for dx in [1, -1] {
        let Ok(to) = at.offset(dx, forward) else {
            continue;
        };

        // 斜吃
        if is_enemy(board, to, side) {
            add_simple(board, at, to, moves);
        }

        // 吃过路兵：上一步必须是对方兵走两格，越过的正是这个斜前方格子且该格为空
        if let Some(Move::DoubleStep(step)) = last_move {
            let enemy = step.to();
            let is_enemy_pawn = board
                .piece(enemy)
                .is_some_and(|p| p.is(PieceKind::Pawn, side.opponent()));
            if step.skipped() == to && is_enemy_pawn && !board.is_occupied(to) {
                if let Ok(m) = EnPassantMove::new(board, at, to, enemy) {
                    moves.insert(to, Move::EnPassant(m));
                }
            }
        }
    }

    // 首次前进两格
    if piece.has_moved() {
        return;
    }
    let Ok(skipped) = at.offset(0, forward) else {
        return;
    };
    let Ok(to) = skipped.offset(0, forward) else {
        return;
    };
    if !board.is_occupied(skipped) && !board.is_occupied(to) {
        if let Ok(m) = DoubleStepMove::new(board, at, to, skipped) {
            moves.insert(to, Move::DoubleStep(m));
        }
    }
}

/// 沿方向射线生成走法，遇到第一枚棋子停止（对方棋子可吃）
fn ray_moves(
    board: &Board,
    at: Coordinate,
    side: Side,
    directions: &[(i8, i8)],
    moves: &mut MoveTable,
) {
    for &(dx, dy) in directions {
        let mut current = at;
        while let Ok(to) = current.offset(dx, dy) {
            if board.is_occupied(to) {
                if is_enemy(board, to, side) {
                    add_simple(board, at, to, moves);
                }
                break;
            }
            add_simple(board, at, to, moves);
            current = to;
        }
    }
}

/// 固定偏移生成走法：落点为空或为对方棋子
fn step_moves(
    board: &Board,
    at: Coordinate,
    side: Side,
    offsets: &[(i8, i8)],
    moves: &mut MoveTable,
) {
    for &(dx, dy) in offsets {
        if let Ok(to) = at.offset(dx, dy) {
            if !board.is_occupied(to) || is_enemy(board, to, side) {
                add_simple(board, at, to, moves);
            }
        }
    }
}

/// 射线威胁：标记沿途空格和第一枚阻挡棋子（不分敌我）
fn ray_threat(map: &mut Tiles, at: Coordinate, directions: &[(i8, i8)]) {
    for &(dx, dy) in directions {
        let mut current = at;
        while let Ok(to) = current.offset(dx, dy) {
            map[to].set_threatened(true);
            if map[to].is_occupied() {
                break;
            }
            current = to;
        }
    }
}

/// 固定偏移威胁：不看占位
fn step_threat(map: &mut Tiles, at: Coordinate, offsets: &[(i8, i8)]) {
    for &(dx, dy) in offsets {
        if let Ok(to) = at.offset(dx, dy) {
            map[to].set_threatened(true);
        }
    }
}

fn is_enemy(board: &Board, at: Coordinate, side: Side) -> bool {
    board.piece(at).is_some_and(|p| p.side() != side)
}

fn add_simple(board: &Board, from: Coordinate, to: Coordinate, moves: &mut MoveTable) {
    if let Ok(m) = SimpleMove::new(board, from, to) {
        moves.insert(to, Move::Simple(m));
    }
}
