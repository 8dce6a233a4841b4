//! 回合控制
//!
//! `MoveHandler` 持有棋盘，维护走子方、王的位置缓存、上一步走法和对局状态，
//! 每次落子后重建合法走法表并过滤会导致自将的走法。

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, error, info, warn};

use crate::board::{Board, Tile, Tiles};
use crate::coord::Coordinate;
use crate::error::{ChessError, Result};
use crate::moves::Move;
use crate::piece::{Piece, PieceKind, Side};
use crate::rules::MoveTable;
use crate::state::GameState;

/// 合法走法表：起点 -> (落点 -> 走法)
pub type LegalMoves = BTreeMap<Coordinate, MoveTable>;

/// 已执行的一步，保存悔棋需要的状态
#[derive(Debug, Clone, Copy)]
struct Ply {
    mv: Move,
    state_before: GameState,
}

/// 回合控制器
#[derive(Debug, Clone)]
pub struct MoveHandler {
    board: Board,
    /// 当前走子方
    turn: Side,
    /// 王的位置缓存，失效时重新扫描
    kings: HashMap<Side, Coordinate>,
    last_move: Option<Move>,
    state: GameState,
    legal_moves: LegalMoves,
    /// 由远端控制的一方（联机模式）
    remote: Option<Side>,
    history: Vec<Ply>,
}

impl MoveHandler {
    /// 以给定棋盘创建，白方先走
    pub fn new(board: Board) -> Self {
        let kings = [Side::White, Side::Black]
            .into_iter()
            .filter_map(|side| board.find_king(side).map(|at| (side, at)))
            .collect();

        let mut handler = Self {
            board,
            turn: Side::White,
            kings,
            last_move: None,
            state: GameState::NoGame,
            legal_moves: LegalMoves::new(),
            remote: None,
            history: Vec::new(),
        };
        handler.update();
        handler
    }

    /// 标准初始局面
    pub fn standard() -> Self {
        Self::new(Board::initial())
    }

    /// 空棋盘
    pub fn empty() -> Self {
        Self::new(Board::empty())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 棋盘快照
    pub fn tiles(&self) -> Tiles {
        self.board.snapshot()
    }

    pub fn tile(&self, at: Coordinate) -> &Tile {
        self.board.tile(at)
    }

    pub fn piece(&self, at: Coordinate) -> Option<&Piece> {
        self.board.piece(at)
    }

    /// 当前走子方
    pub fn turn(&self) -> Side {
        self.turn
    }

    /// 对局状态（上一个完整回合结束时的结果）
    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    /// 已执行的走法，按先后顺序
    pub fn history(&self) -> impl Iterator<Item = &Move> + '_ {
        self.history.iter().map(|ply| &ply.mv)
    }

    /// 缓存的王的位置
    pub fn king(&self, side: Side) -> Option<Coordinate> {
        self.kings.get(&side).copied()
    }

    pub fn remote(&self) -> Option<Side> {
        self.remote
    }

    /// 设置由远端控制的一方，`None` 表示本地双方
    pub fn set_remote(&mut self, side: Option<Side>) {
        self.remote = side;
    }

    /// 放置棋子并重建走法表
    ///
    /// 放置王时会移除同一阵营原有的王。
    pub fn place(&mut self, at: Coordinate, piece: Piece) -> Result<()> {
        let evicted = self.board.place(at, piece)?;
        if piece.kind() == PieceKind::King {
            self.kings.insert(piece.side(), at);
        }
        debug!(%at, %piece, ?evicted, "piece placed");
        self.update();
        Ok(())
    }

    /// 移除棋子，返回该位置原先是否有棋子
    pub fn remove(&mut self, at: Coordinate) -> bool {
        let removed = self.board.remove(at);
        if removed {
            self.update();
        }
        removed
    }

    /// 兵升变（不会自动触发）
    pub fn promote(&mut self, at: Coordinate, kind: PieceKind) -> Result<()> {
        let piece = self
            .board
            .piece_mut(at)
            .ok_or(ChessError::NoPiece { at })?;
        piece.promote(kind)?;
        self.update();
        Ok(())
    }

    /// 获取指定棋子的合法走法
    ///
    /// 联机模式下轮到远端一方时返回 `None`，本地无法查询或替对方走子。
    pub fn legal_moves(&self, at: Coordinate) -> Option<&MoveTable> {
        if self.remote == Some(self.turn) {
            return None;
        }
        self.legal_moves.get(&at)
    }

    /// 走子方是否还有合法走法
    pub fn has_legal_moves(&self) -> bool {
        self.legal_moves.values().any(|moves| !moves.is_empty())
    }

    /// 按起点、落点走子
    ///
    /// 起点不在走法表中或落点不合法时记录警告并返回错误，不修改任何状态。
    pub fn make_move(&mut self, from: Coordinate, to: Coordinate) -> Result<()> {
        let Some(moves) = self.legal_moves.get(&from) else {
            warn!(%from, side = %self.turn, "there is no movable piece at the source");
            return Err(ChessError::NoPiece { at: from });
        };

        match moves.get(&to).copied() {
            Some(mv) => self.make_move_with(Some(mv)),
            None => {
                warn!(%from, %to, "destination is not a legal move");
                Err(ChessError::IllegalDestination { from, to })
            }
        }
    }

    /// 执行选定的走法并结束回合
    pub fn make_move_with(&mut self, mv: Option<Move>) -> Result<()> {
        let Some(mv) = mv else {
            warn!("move is missing");
            return Err(ChessError::NoMove);
        };

        if let Err(e) = mv.execute(&mut self.board) {
            warn!(%mv, "move could not be executed: {}", e);
            return Err(e);
        }

        debug!(side = %self.turn, %mv, "move executed");
        self.history.push(Ply {
            mv,
            state_before: self.state,
        });
        self.last_move = Some(mv);
        self.finish_turn();
        Ok(())
    }

    /// 悔棋：撤销最后一步，恢复走子方和状态
    ///
    /// 走子后摆放的棋子占住了需要恢复的格子时返回错误，棋盘和历史保持不变。
    pub fn undo(&mut self) -> Result<()> {
        let Some(ply) = self.history.last().copied() else {
            return Err(ChessError::NothingToUndo);
        };
        if let Err(e) = ply.mv.revert(&mut self.board) {
            warn!(mv = %ply.mv, error = %e, "cannot undo move");
            return Err(e);
        }
        self.history.pop();

        self.turn = self.turn.opponent();
        self.last_move = self.history.last().map(|p| p.mv);
        self.state = ply.state_before;
        self.update();

        let map = threat_map(&self.board, self.turn);
        self.board.set_threats(&map);
        debug!(mv = %ply.mv, "move undone");
        Ok(())
    }

    /// 指定阵营受到的威胁图
    pub fn threat_map(&self, side: Side) -> Tiles {
        threat_map(&self.board, side)
    }

    /// 指定阵营的王是否被将军
    pub fn is_in_check(&self, side: Side) -> bool {
        locate_king(&self.board, side, self.king(side))
            .is_some_and(|king| threat_map(&self.board, side).is_threatened(king))
    }

    /// 结束回合：换边、重建走法表、判断将军和终局
    fn finish_turn(&mut self) {
        self.turn = self.turn.opponent();
        self.state = GameState::InGame;
        self.update();
        self.check();
        self.checkmates();
    }

    /// 重建走子方的走法表并过滤自将走法
    fn update(&mut self) {
        let mut table = LegalMoves::new();
        for (at, piece) in self.board.pieces(self.turn) {
            let moves = piece
                .kind()
                .legal_moves(&self.board, self.last_move.as_ref(), at);
            table.insert(at, moves);
        }

        self.refresh_king(self.turn);
        self.legal_moves = self.filter_self_checks(table);
        debug!(
            side = %self.turn,
            moves = self.legal_moves.values().map(MoveTable::len).sum::<usize>(),
            "legal move table rebuilt"
        );
    }

    /// 在棋盘副本上逐个执行、检查、撤销候选走法，去掉让己方王被威胁的走法
    ///
    /// 模拟出错时记录日志并保留该走法；实际棋盘不参与模拟。
    fn filter_self_checks(&self, mut table: LegalMoves) -> LegalMoves {
        let mut scratch = self.board.clone();
        let hint = self.king(self.turn);
        let mut invalid = Vec::new();

        for (from, moves) in &table {
            for (to, mv) in moves {
                if let Err(e) = mv.execute(&mut scratch) {
                    error!(%from, %to, "simulation fault: {}", e);
                    scratch = self.board.clone();
                    continue;
                }

                let exposed = locate_king(&scratch, self.turn, hint)
                    .is_some_and(|king| threat_map(&scratch, self.turn).is_threatened(king));
                if exposed {
                    invalid.push((*from, *to));
                }

                if let Err(e) = mv.revert(&mut scratch) {
                    error!(%from, %to, "simulation fault while reverting: {}", e);
                    scratch = self.board.clone();
                }
            }
        }

        for (from, to) in invalid {
            if let Some(moves) = table.get_mut(&from) {
                moves.remove(&to);
            }
        }
        table
    }

    /// 构建威胁图，王被威胁时设为将军
    fn check(&mut self) {
        let map = threat_map(&self.board, self.turn);
        self.board.set_threats(&map);

        if let Some(king) = self.refresh_king(self.turn) {
            if map.is_threatened(king) {
                self.state = GameState::Check;
                debug!(side = %self.turn, %king, "king is in check");
            }
        }
    }

    /// 无合法走法时判定将死或困毙
    fn checkmates(&mut self) {
        if self.has_legal_moves() {
            return;
        }
        self.state = if self.is_in_check(self.turn) {
            GameState::Checkmate
        } else {
            GameState::Stalemate
        };
        info!(side = %self.turn, state = %self.state, "game over");
    }

    /// 校验王的位置缓存，失效时重新扫描
    fn refresh_king(&mut self, side: Side) -> Option<Coordinate> {
        let found = locate_king(&self.board, side, self.king(side));
        match found {
            Some(at) => {
                self.kings.insert(side, at);
            }
            None => {
                self.kings.remove(&side);
            }
        }
        found
    }
}

impl Default for MoveHandler {
    fn default() -> Self {
        Self::standard()
    }
}

/// 构建 `side` 受到的威胁图：对方每枚棋子在新快照上投射威胁
pub fn threat_map(board: &Board, side: Side) -> Tiles {
    let mut map = board.snapshot();
    map.clear_threats();
    for (at, piece) in board.all_pieces() {
        if piece.side() != side {
            piece.kind().apply_threat(&mut map, at);
        }
    }
    map
}

/// 先看缓存位置，不对再扫描棋盘
fn locate_king(board: &Board, side: Side, hint: Option<Coordinate>) -> Option<Coordinate> {
    match hint {
        Some(at) if board.piece(at).is_some_and(|p| p.is(PieceKind::King, side)) => Some(at),
        _ => board.find_king(side),
    }
}
