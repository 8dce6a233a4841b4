//! 走子数据包
//!
//! 联机时双方只交换起点和终点，由接收方的引擎重新查表执行。

use chess_core::{Coordinate, MoveHandler};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 走子数据包：起点和终点的列、行偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementPacket {
    pub from_x: i32,
    pub from_y: i32,
    pub to_x: i32,
    pub to_y: i32,
}

impl MovementPacket {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        Self {
            from_x: from.file() as i32,
            from_y: from.rank() as i32,
            to_x: to.file() as i32,
            to_y: to.rank() as i32,
        }
    }

    /// 起点，越界时返回错误
    pub fn from(&self) -> Result<Coordinate> {
        Ok(Coordinate::from_offsets(self.from_x, self.from_y)?)
    }

    /// 终点，越界时返回错误
    pub fn to(&self) -> Result<Coordinate> {
        Ok(Coordinate::from_offsets(self.to_x, self.to_y)?)
    }

    /// 在本地引擎上执行
    pub fn apply(&self, handler: &mut MoveHandler) -> Result<()> {
        handler.make_move(self.from()?, self.to()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use chess_core::{ChessError, PieceKind, Side};

    fn c(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    #[test]
    fn test_packet_offsets() {
        let packet = MovementPacket::new(c("e2"), c("e4"));
        assert_eq!(
            packet,
            MovementPacket { from_x: 4, from_y: 1, to_x: 4, to_y: 3 }
        );
        assert_eq!(packet.from().unwrap(), c("e2"));
        assert_eq!(packet.to().unwrap(), c("e4"));
    }

    #[test]
    fn test_out_of_range_packet() {
        let packet = MovementPacket { from_x: 4, from_y: 1, to_x: 4, to_y: 8 };
        assert!(matches!(
            packet.to(),
            Err(ProtocolError::Chess(ChessError::OutOfRange { x: 4, y: 8 }))
        ));

        let mut handler = MoveHandler::standard();
        assert!(packet.apply(&mut handler).is_err());
        assert_eq!(handler.turn(), Side::White);
    }

    #[test]
    fn test_apply() {
        let mut handler = MoveHandler::standard();
        MovementPacket::new(c("g1"), c("f3")).apply(&mut handler).unwrap();

        assert!(handler.piece(c("f3")).unwrap().is(PieceKind::Knight, Side::White));
        assert_eq!(handler.turn(), Side::Black);

        let illegal = MovementPacket::new(c("e7"), c("e3"));
        assert!(matches!(
            illegal.apply(&mut handler),
            Err(ProtocolError::Chess(ChessError::IllegalDestination { .. }))
        ));
    }

    #[test]
    fn test_bincode_payload() {
        let packet = MovementPacket::new(c("a1"), c("h8"));
        let bytes = bincode::serialize(&packet).unwrap();
        assert_eq!(bytes.len(), 16);
        let decoded: MovementPacket = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }
}
