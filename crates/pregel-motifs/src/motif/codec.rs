//! Neighbor announcement messages and their fixed 24-byte layout
//!
//! ```text
//! offset  size  field
//!      0     8  origin   (u64, little endian)
//!      8     8  neighbor (u64, little endian)
//!     16     8  role tag (i64, little endian; 1 = IN, 2 = OUT)
//! ```

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::pregel::{DecodeError, VertexId, VertexMessage};

/// What a message claims about `neighbor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeighborRole {
    /// `neighbor` is an in-neighbor of `origin`
    In,
    /// `neighbor` is an out-neighbor of `origin`
    Out,
}

impl NeighborRole {
    pub const IN_TAG: i64 = 1;
    pub const OUT_TAG: i64 = 2;

    pub fn tag(self) -> i64 {
        match self {
            NeighborRole::In => Self::IN_TAG,
            NeighborRole::Out => Self::OUT_TAG,
        }
    }
}

impl TryFrom<i64> for NeighborRole {
    type Error = DecodeError;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        match tag {
            Self::IN_TAG => Ok(NeighborRole::In),
            Self::OUT_TAG => Ok(NeighborRole::Out),
            value => Err(DecodeError::InvalidTag {
                field: "role",
                value,
            }),
        }
    }
}

/// `origin` announces that `neighbor` is one of its in- or out-neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeighborMessage {
    pub origin: VertexId,
    pub neighbor: VertexId,
    pub role: NeighborRole,
}

impl NeighborMessage {
    pub fn new(origin: impl Into<VertexId>, neighbor: impl Into<VertexId>, role: NeighborRole) -> Self {
        Self {
            origin: origin.into(),
            neighbor: neighbor.into(),
            role,
        }
    }

    pub fn in_neighbor(origin: impl Into<VertexId>, neighbor: impl Into<VertexId>) -> Self {
        Self::new(origin, neighbor, NeighborRole::In)
    }

    pub fn out_neighbor(origin: impl Into<VertexId>, neighbor: impl Into<VertexId>) -> Self {
        Self::new(origin, neighbor, NeighborRole::Out)
    }
}

impl VertexMessage for NeighborMessage {
    const WIRE_SIZE: usize = 24;

    fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(Self::WIRE_SIZE);
        buf.put_u64_le(self.origin.get());
        buf.put_u64_le(self.neighbor.get());
        buf.put_i64_le(self.role.tag());
    }

    fn decode<B: Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        if buf.remaining() < Self::WIRE_SIZE {
            return Err(DecodeError::Truncated {
                expected: Self::WIRE_SIZE,
                found: buf.remaining(),
            });
        }
        let origin = VertexId::new(buf.get_u64_le());
        let neighbor = VertexId::new(buf.get_u64_le());
        let role = NeighborRole::try_from(buf.get_i64_le())?;
        Ok(Self {
            origin,
            neighbor,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let mut buf = BytesMut::new();
        NeighborMessage::out_neighbor(0x0102u64, 7u64).encode(&mut buf);

        assert_eq!(buf.len(), NeighborMessage::WIRE_SIZE);
        assert_eq!(&buf[0..8], &0x0102u64.to_le_bytes());
        assert_eq!(&buf[8..16], &7u64.to_le_bytes());
        assert_eq!(&buf[16..24], &2i64.to_le_bytes());
    }

    #[test]
    fn test_decode_reads_both_roles() {
        let mut buf = BytesMut::new();
        NeighborMessage::in_neighbor(1u64, 2u64).encode(&mut buf);
        NeighborMessage::out_neighbor(3u64, 4u64).encode(&mut buf);

        let mut bytes = &buf[..];
        let first = NeighborMessage::decode(&mut bytes).unwrap();
        let second = NeighborMessage::decode(&mut bytes).unwrap();
        assert_eq!(first.role, NeighborRole::In);
        assert_eq!(second, NeighborMessage::out_neighbor(3u64, 4u64));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u64_le(1);
        buf.put_u64_le(2);
        buf.put_i64_le(3);

        let err = NeighborMessage::decode(&mut &buf[..]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidTag {
                field: "role",
                value: 3
            }
        );
    }

    #[test]
    fn test_short_record_rejected() {
        let err = NeighborMessage::decode(&mut &[0u8; 10][..]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                expected: 24,
                found: 10
            }
        );
    }

    #[test]
    fn test_role_tags() {
        assert_eq!(NeighborRole::In.tag(), 1);
        assert_eq!(NeighborRole::try_from(2).unwrap(), NeighborRole::Out);
        assert!(NeighborRole::try_from(0).is_err());
    }
}
