//! 棋盘坐标

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, FIRST_FILE, FIRST_RANK, SQUARE_COUNT};
use crate::error::{ChessError, Result};

/// 棋盘坐标
///
/// 纯值类型，共 64 个取值。字段顺序决定派生的排序：先比较行，再比较列。
/// 序列化为 `(列, 行)` 偏移量，反序列化时检查边界。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct Coordinate {
    /// 行 (0-7)，0 为第 1 行
    rank: u8,
    /// 列 (0-7)，0 为 a 列
    file: u8,
}

impl Coordinate {
    /// 创建坐标（不检查边界，内部使用）
    pub(crate) const fn new_unchecked(file: u8, rank: u8) -> Self {
        Self { rank, file }
    }

    /// 由列、行偏移量创建坐标
    pub fn from_offsets(x: i32, y: i32) -> Result<Self> {
        let size = BOARD_SIZE as i32;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Ok(Self::new_unchecked(x as u8, y as u8))
        } else {
            Err(ChessError::OutOfRange { x, y })
        }
    }

    /// 获取偏移后的坐标，出界时返回 `OutOfRange`
    pub fn offset(&self, dx: i8, dy: i8) -> Result<Self> {
        Self::from_offsets(self.file as i32 + dx as i32, self.rank as i32 + dy as i32)
    }

    /// 列 (0-7)
    pub fn file(&self) -> u8 {
        self.file
    }

    /// 行 (0-7)
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// 转换为数组索引（按行优先）
    pub fn index(&self) -> usize {
        self.rank as usize * BOARD_SIZE + self.file as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < SQUARE_COUNT {
            Some(Self::new_unchecked(
                (index % BOARD_SIZE) as u8,
                (index / BOARD_SIZE) as u8,
            ))
        } else {
            None
        }
    }

    /// 按行优先顺序遍历全部 64 个坐标
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0..SQUARE_COUNT).filter_map(Self::from_index)
    }
}

impl TryFrom<(i32, i32)> for Coordinate {
    type Error = ChessError;

    fn try_from((x, y): (i32, i32)) -> Result<Self> {
        Self::from_offsets(x, y)
    }
}

impl From<Coordinate> for (i32, i32) {
    fn from(at: Coordinate) -> Self {
        (at.file as i32, at.rank as i32)
    }
}

impl FromStr for Coordinate {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ChessError::InvalidFormat {
            what: "coordinate",
            text: s.to_string(),
        };

        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }

        let file = bytes[0].wrapping_sub(FIRST_FILE as u8);
        let rank = bytes[1].wrapping_sub(FIRST_RANK as u8);
        if (file as usize) < BOARD_SIZE && (rank as usize) < BOARD_SIZE {
            Ok(Self::new_unchecked(file, rank))
        } else {
            Err(invalid())
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (FIRST_FILE as u8 + self.file) as char,
            (FIRST_RANK as u8 + self.rank) as char
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let e4 = c("e4");
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.to_string(), "e4");

        assert_eq!(c("a1"), Coordinate::from_offsets(0, 0).unwrap());
        assert_eq!(c("h8"), Coordinate::from_offsets(7, 7).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "e", "i1", "a0", "a9", "A1", "e44", " e4", "4e"] {
            let err = bad.parse::<Coordinate>().unwrap_err();
            assert!(
                matches!(err, ChessError::InvalidFormat { what: "coordinate", .. }),
                "{bad:?} should be a format error"
            );
        }
    }

    #[test]
    fn test_from_offsets_range() {
        assert!(Coordinate::from_offsets(-1, 0).unwrap_err().is_out_of_range());
        assert!(Coordinate::from_offsets(0, 8).unwrap_err().is_out_of_range());
        assert_eq!(
            Coordinate::from_offsets(8, 3),
            Err(ChessError::OutOfRange { x: 8, y: 3 })
        );
    }

    #[test]
    fn test_offset() {
        assert_eq!(c("e2").offset(0, 2).unwrap(), c("e4"));
        assert_eq!(c("b1").offset(1, 2).unwrap(), c("c3"));
        assert!(c("h8").offset(1, 0).unwrap_err().is_out_of_range());
        assert!(c("a1").offset(0, -1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_rank_major_ordering() {
        // h1 在第 1 行，a2 在第 2 行
        assert!(c("h1") < c("a2"));
        assert!(c("a1") < c("b1"));
        assert!(c("e4") > c("d4"));

        let all: Vec<Coordinate> = Coordinate::all().collect();
        assert_eq!(all.len(), 64);
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(all[0], c("a1"));
        assert_eq!(all[8], c("a2"));
    }

    #[test]
    fn test_index_roundtrip() {
        for coord in Coordinate::all() {
            assert_eq!(Coordinate::from_index(coord.index()), Some(coord));
        }
        assert_eq!(Coordinate::from_index(64), None);
    }

    #[test]
    fn test_deserialize_checks_range() {
        let json = serde_json::to_string(&c("e4")).unwrap();
        assert_eq!(json, "[4,3]");
        assert_eq!(serde_json::from_str::<Coordinate>(&json).unwrap(), c("e4"));

        assert!(serde_json::from_str::<Coordinate>("[9,9]").is_err());
        assert!(serde_json::from_str::<Coordinate>("[0,-1]").is_err());
    }
}
