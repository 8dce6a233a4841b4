//! 棋盘状态

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{BOARD_SIZE, SQUARE_COUNT};
use crate::coord::Coordinate;
use crate::error::{ChessError, Result};
use crate::piece::{Piece, PieceKind, Side};

/// 棋盘上的一个格子
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    piece: Option<Piece>,
    /// 是否被对方威胁（每回合重新计算）
    threatened: bool,
}

impl Tile {
    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub fn piece_mut(&mut self) -> Option<&mut Piece> {
        self.piece.as_mut()
    }

    pub fn is_occupied(&self) -> bool {
        self.piece.is_some()
    }

    pub fn is_threatened(&self) -> bool {
        self.threatened
    }

    pub fn set_threatened(&mut self, threatened: bool) {
        self.threatened = threatened;
    }

    /// 放入棋子，返回原来的棋子
    pub(crate) fn set_piece(&mut self, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.piece, piece)
    }
}

/// 64 个格子的有序集合
///
/// 既是棋盘的存储，也是 `snapshot()` 返回的快照和威胁图的载体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tile>", into = "Vec<Tile>")]
pub struct Tiles {
    /// 索引为 rank * 8 + file，使用 Vec 以支持 serde
    tiles: Vec<Tile>,
}

impl Tiles {
    fn new() -> Self {
        Self {
            tiles: vec![Tile::default(); SQUARE_COUNT],
        }
    }

    /// 按坐标顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &Tile)> + '_ {
        Coordinate::all().zip(self.tiles.iter())
    }

    /// 遍历有棋子的格子
    pub fn occupied(&self) -> impl Iterator<Item = (Coordinate, &Piece)> + '_ {
        self.iter()
            .filter_map(|(at, tile)| tile.piece().map(|piece| (at, piece)))
    }

    /// 指定格子是否被威胁
    pub fn is_threatened(&self, at: Coordinate) -> bool {
        self[at].threatened
    }

    /// 所有被威胁的格子
    pub fn threatened(&self) -> Vec<Coordinate> {
        self.iter()
            .filter(|(_, tile)| tile.threatened)
            .map(|(at, _)| at)
            .collect()
    }

    /// 清除全部威胁标记
    pub fn clear_threats(&mut self) {
        for tile in &mut self.tiles {
            tile.threatened = false;
        }
    }
}

/// 反序列化时校验格子数量
impl TryFrom<Vec<Tile>> for Tiles {
    type Error = ChessError;

    fn try_from(tiles: Vec<Tile>) -> Result<Self> {
        if tiles.len() != SQUARE_COUNT {
            return Err(ChessError::InvalidFormat {
                what: "board",
                text: format!("{} tiles", tiles.len()),
            });
        }
        Ok(Self { tiles })
    }
}

impl From<Tiles> for Vec<Tile> {
    fn from(tiles: Tiles) -> Self {
        tiles.tiles
    }
}

impl Index<Coordinate> for Tiles {
    type Output = Tile;

    fn index(&self, at: Coordinate) -> &Tile {
        &self.tiles[at.index()]
    }
}

impl IndexMut<Coordinate> for Tiles {
    fn index_mut(&mut self, at: Coordinate) -> &mut Tile {
        &mut self.tiles[at.index()]
    }
}

/// 棋盘
///
/// 只负责占位，不检查走法是否合法；合法性由 `MoveHandler` 负责。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    tiles: Tiles,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            tiles: Tiles::new(),
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        const BACK_RANK: [PieceKind; BOARD_SIZE] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut board = Self::empty();
        for (x, kind) in BACK_RANK.iter().enumerate() {
            let x = x as u8;
            let rows = [
                (0, *kind, Side::White),
                (1, PieceKind::Pawn, Side::White),
                (6, PieceKind::Pawn, Side::Black),
                (7, *kind, Side::Black),
            ];
            for (y, kind, side) in rows {
                board.put(Coordinate::new_unchecked(x, y), Some(Piece::new(kind, side)));
            }
        }
        board
    }

    /// 获取指定位置的棋子
    pub fn piece(&self, at: Coordinate) -> Option<&Piece> {
        self.tiles[at].piece()
    }

    /// 获取指定位置棋子的可变引用
    pub fn piece_mut(&mut self, at: Coordinate) -> Option<&mut Piece> {
        self.tiles[at].piece_mut()
    }

    /// 获取指定位置的格子
    pub fn tile(&self, at: Coordinate) -> &Tile {
        &self.tiles[at]
    }

    /// 指定位置是否有棋子
    pub fn is_occupied(&self, at: Coordinate) -> bool {
        self.tiles[at].is_occupied()
    }

    /// 放置棋子
    ///
    /// 目标格已有棋子时返回 `SquareOccupied`，棋盘保持不变。
    /// 放置王时会移除同一阵营已有的王（按遍历顺序的第一个），返回其位置。
    pub fn place(&mut self, at: Coordinate, piece: Piece) -> Result<Option<Coordinate>> {
        if self.is_occupied(at) {
            return Err(ChessError::SquareOccupied { at });
        }

        let mut evicted = None;
        if piece.kind() == PieceKind::King {
            evicted = self
                .tiles
                .occupied()
                .find(|(loc, p)| *loc != at && p.is(PieceKind::King, piece.side()))
                .map(|(loc, _)| loc);
            if let Some(loc) = evicted {
                debug!(side = %piece.side(), %at, evicted = %loc, "king replaced");
                self.put(loc, None);
            }
        }

        self.put(at, Some(piece));
        Ok(evicted)
    }

    /// 移除棋子，返回该位置原先是否有棋子
    pub fn remove(&mut self, at: Coordinate) -> bool {
        self.put(at, None).is_some()
    }

    /// 移动棋子（不检查规则），返回目标位置原先的棋子
    pub fn move_piece(&mut self, from: Coordinate, to: Coordinate) -> Option<Piece> {
        let piece = self.put(from, None);
        self.put(to, piece)
    }

    /// 直接设置格子内容，返回原来的棋子
    pub(crate) fn put(&mut self, at: Coordinate, piece: Option<Piece>) -> Option<Piece> {
        self.tiles[at].set_piece(piece)
    }

    /// 逐格复制的快照，包含威胁标记
    ///
    /// 快照与棋盘互不影响：修改快照中的格子或棋子不会改变棋盘。
    pub fn snapshot(&self) -> Tiles {
        self.tiles.clone()
    }

    /// 以威胁图覆盖棋盘上的威胁标记
    pub fn set_threats(&mut self, map: &Tiles) {
        for at in Coordinate::all() {
            self.tiles[at].set_threatened(map.is_threatened(at));
        }
    }

    /// 查找指定阵营的王
    pub fn find_king(&self, side: Side) -> Option<Coordinate> {
        self.tiles
            .occupied()
            .find(|(_, piece)| piece.is(PieceKind::King, side))
            .map(|(at, _)| at)
    }

    /// 获取指定阵营的所有棋子位置
    pub fn pieces(&self, side: Side) -> Vec<(Coordinate, Piece)> {
        self.tiles
            .occupied()
            .filter(|(_, piece)| piece.side() == side)
            .map(|(at, piece)| (at, *piece))
            .collect()
    }

    /// 获取所有棋子
    pub fn all_pieces(&self) -> Vec<(Coordinate, Piece)> {
        self.tiles.occupied().map(|(at, piece)| (at, *piece)).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 文本棋盘，第 8 行在上，空格用 `.` 表示
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..BOARD_SIZE as u8).rev() {
            write!(f, "{} ", y + 1)?;
            for x in 0..BOARD_SIZE as u8 {
                let c = self
                    .piece(Coordinate::new_unchecked(x, y))
                    .map_or('.', Piece::display_char);
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}
