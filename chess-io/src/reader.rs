//! 文本开局读取
//!
//! 每行一条指令：
//! - `kle1`：棋子类型 + 阵营 + 坐标，放置棋子
//! - `e2 e4`，可带 `*` 后缀表示吃子：走一步
//! - `e1 g1 h1 f1`：双子移动，只记录日志
//!
//! 无法识别的行和被拒绝的指令会带行号报告，读取继续进行。

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use chess_core::{ChessError, Coordinate, MoveHandler, Piece, PieceKind, Side};
use tracing::{debug, info, warn};

use crate::error::Result;

/// 一行指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// 放置棋子
    Place { at: Coordinate, piece: Piece },
    /// 单子移动，`capture` 只是记录上的标记
    Move {
        from: Coordinate,
        to: Coordinate,
        capture: bool,
    },
    /// 双子移动（如王车易位的记录）
    DoubleMove {
        first: (Coordinate, Coordinate),
        second: (Coordinate, Coordinate),
    },
}

impl FromStr for Directive {
    type Err = ChessError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ChessError::InvalidFormat {
            what: "directive",
            text: line.to_string(),
        };

        if !line.contains(' ') {
            let mut chars = line.chars();
            let (Some(kind), Some(side)) = (chars.next(), chars.next()) else {
                return Err(invalid());
            };
            return Ok(Directive::Place {
                at: chars.as_str().parse().map_err(|_| invalid())?,
                piece: Piece::new(
                    PieceKind::from_file_char(kind).map_err(|_| invalid())?,
                    Side::from_file_char(side).map_err(|_| invalid())?,
                ),
            });
        }

        let coord = |s: &str| s.parse::<Coordinate>().map_err(|_| invalid());
        let tokens: Vec<&str> = line.split(' ').collect();
        match tokens.as_slice() {
            [from, to] => {
                let (to, capture) = match to.strip_suffix('*') {
                    Some(to) => (to, true),
                    None => (*to, false),
                };
                Ok(Directive::Move {
                    from: coord(from)?,
                    to: coord(to)?,
                    capture,
                })
            }
            [from1, to1, from2, to2] => Ok(Directive::DoubleMove {
                first: (coord(from1)?, coord(to1)?),
                second: (coord(from2)?, coord(to2)?),
            }),
            _ => Err(invalid()),
        }
    }
}

/// 被跳过的一行
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 行号，从 1 开始
    pub line_no: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// 跳过的原因
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// 不符合任何指令格式
    Unrecognized,
    /// 指令格式正确但被引擎拒绝
    Rejected(ChessError),
}

impl fmt::Display for SkippedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::Unrecognized => {
                write!(f, "Invalid command {:?} at line {}", self.text, self.line_no)
            }
            SkipReason::Rejected(e) => {
                write!(f, "Rejected command {:?} at line {}: {}", self.text, self.line_no, e)
            }
        }
    }
}

/// 读取结果
#[derive(Debug)]
pub struct GameLoad {
    pub handler: MoveHandler,
    pub skipped: Vec<SkippedLine>,
    /// 只记录、不执行的双子移动
    pub double_moves: Vec<[Coordinate; 4]>,
}

/// 文本开局读取器
pub struct ChessReader<R> {
    input: R,
}

impl ChessReader<BufReader<File>> {
    /// 打开文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ChessReader<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    /// 读取全部指令，从无子棋盘开始构建对局
    ///
    /// 读完即释放输入；只有 IO 错误会中断读取。
    pub fn read_game(self) -> Result<GameLoad> {
        let mut load = GameLoad {
            handler: MoveHandler::empty(),
            skipped: Vec::new(),
            double_moves: Vec::new(),
        };

        for (i, line) in self.input.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;

            let result = match line.parse::<Directive>() {
                Ok(directive) => apply(&mut load, directive),
                Err(_) => {
                    let skipped = SkippedLine {
                        line_no,
                        text: line,
                        reason: SkipReason::Unrecognized,
                    };
                    warn!("{}", skipped);
                    load.skipped.push(skipped);
                    continue;
                }
            };

            if let Err(e) = result {
                let skipped = SkippedLine {
                    line_no,
                    text: line,
                    reason: SkipReason::Rejected(e),
                };
                warn!("{}", skipped);
                load.skipped.push(skipped);
            }
        }

        debug!(
            skipped = load.skipped.len(),
            state = %load.handler.state(),
            "game loaded"
        );
        Ok(load)
    }
}

fn apply(load: &mut GameLoad, directive: Directive) -> chess_core::Result<()> {
    match directive {
        Directive::Place { at, piece } => load.handler.place(at, piece),
        Directive::Move { from, to, .. } => {
            load.handler.make_move(from, to)?;
            debug!("\n{}", load.handler.board());
            Ok(())
        }
        Directive::DoubleMove {
            first: (from1, to1),
            second: (from2, to2),
        } => {
            info!(
                "Double piece movement: {} to {}, {} to {}",
                from1, to1, from2, to2
            );
            load.double_moves.push([from1, to1, from2, to2]);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::GameState;

    fn c(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn read(text: &str) -> GameLoad {
        ChessReader::new(text.as_bytes()).read_game().unwrap()
    }

    #[test]
    fn test_parse_directives() {
        assert_eq!(
            "qld1".parse::<Directive>().unwrap(),
            Directive::Place {
                at: c("d1"),
                piece: Piece::new(PieceKind::Queen, Side::White),
            }
        );
        assert_eq!(
            "e2 e4".parse::<Directive>().unwrap(),
            Directive::Move { from: c("e2"), to: c("e4"), capture: false }
        );
        assert_eq!(
            "d4 e5*".parse::<Directive>().unwrap(),
            Directive::Move { from: c("d4"), to: c("e5"), capture: true }
        );
        assert_eq!(
            "e1 g1 h1 f1".parse::<Directive>().unwrap(),
            Directive::DoubleMove {
                first: (c("e1"), c("g1")),
                second: (c("h1"), c("f1")),
            }
        );

        let malformed = [
            "xle1", "kxe1", "kle9", "kl", "", " ", "e2  e4", "e2 e4 e5", "e2-e4", "E2 E4",
            "e2 e4**",
        ];
        for bad in malformed {
            assert!(bad.parse::<Directive>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_placements_and_moves() {
        let load = read("kle1\nkde8\npld2\npde7\nd2 d4\ne7 e5\nd4 e5*\n");

        assert!(load.skipped.is_empty());
        let handler = &load.handler;
        assert_eq!(handler.turn(), Side::Black);
        assert_eq!(handler.state(), GameState::InGame);
        assert!(handler.piece(c("e5")).unwrap().is(PieceKind::Pawn, Side::White));
        assert_eq!(handler.board().pieces(Side::Black).len(), 1);
    }

    #[test]
    fn test_unrecognized_lines_are_reported_with_line_numbers() {
        let load = read("kle1\nhello\nkde8\n\nz9 a1\n");

        // 空行同样报告
        let reported: Vec<usize> = load.skipped.iter().map(|s| s.line_no).collect();
        assert_eq!(reported, vec![2, 4, 5]);
        assert!(load.skipped.iter().all(|s| s.reason == SkipReason::Unrecognized));
        assert_eq!(load.skipped[0].to_string(), "Invalid command \"hello\" at line 2");

        // 后续行照常处理
        assert_eq!(load.handler.king(Side::Black), Some(c("e8")));
    }

    #[test]
    fn test_rejected_directives_do_not_abort() {
        let load = read("kle1\nqle1\ne1 e3\nkde8\n");

        assert_eq!(load.skipped.len(), 2);
        assert_eq!(
            load.skipped[0].reason,
            SkipReason::Rejected(ChessError::SquareOccupied { at: c("e1") })
        );
        assert_eq!(
            load.skipped[1].reason,
            SkipReason::Rejected(ChessError::IllegalDestination { from: c("e1"), to: c("e3") })
        );
        assert_eq!(load.handler.turn(), Side::White);
        assert_eq!(load.handler.king(Side::Black), Some(c("e8")));
    }

    #[test]
    fn test_double_moves_are_only_logged() {
        let load = read("kle1\nrlh1\nkde8\ne1 g1 h1 f1\n");

        assert!(load.skipped.is_empty());
        assert_eq!(load.double_moves, vec![[c("e1"), c("g1"), c("h1"), c("f1")]]);
        assert_eq!(load.handler.king(Side::White), Some(c("e1")));
        assert!(load.handler.piece(c("h1")).is_some());
        assert_eq!(load.handler.turn(), Side::White);
    }

    #[test]
    fn test_starts_from_empty_board() {
        let load = read("");
        assert!(load.handler.board().all_pieces().is_empty());
        assert_eq!(load.handler.state(), GameState::NoGame);
    }
}
