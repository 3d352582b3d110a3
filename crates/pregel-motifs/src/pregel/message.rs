//! Message records for Pregel vertex communication
//!
//! Vertices communicate by sending messages to each other. Every message type
//! has a fixed-size binary layout; the runtime buffers outgoing messages as
//! encoded records and the receiving vertex decodes them at the start of the
//! next superstep.

use bytes::{Buf, BytesMut};
use std::marker::PhantomData;
use thiserror::Error;

use super::error::PregelError;
use super::vertex::VertexId;

/// Failure to decode a single message record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes than one record
    #[error("truncated record: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// A tag field holds a value outside its enumeration
    #[error("invalid {field} tag: {value}")]
    InvalidTag { field: &'static str, value: i64 },
}

/// Trait bound for vertex messages
pub trait VertexMessage: Clone + Send + Sync + 'static {
    /// Size in bytes of one encoded record
    const WIRE_SIZE: usize;

    /// Append exactly `WIRE_SIZE` bytes to `buf`
    fn encode(&self, buf: &mut BytesMut);

    /// Read one record from the front of `buf`
    ///
    /// Callers guarantee at least `WIRE_SIZE` bytes remain.
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, DecodeError>;
}

/// Iterator decoding the records delivered to one vertex
///
/// Yields `PregelError::MalformedMessage` for a record that fails to decode
/// or for trailing bytes that do not form a whole record, then stops.
pub struct MessageIter<'a, M> {
    vertex_id: VertexId,
    remaining: &'a [u8],
    failed: bool,
    _message: PhantomData<M>,
}

impl<'a, M: VertexMessage> MessageIter<'a, M> {
    pub fn new(vertex_id: VertexId, records: &'a [u8]) -> Self {
        Self {
            vertex_id,
            remaining: records,
            failed: false,
            _message: PhantomData,
        }
    }

    fn malformed(&mut self, err: DecodeError) -> PregelError {
        self.failed = true;
        self.remaining = &[];
        PregelError::malformed_message(self.vertex_id, err.to_string())
    }
}

impl<M: VertexMessage> Iterator for MessageIter<'_, M> {
    type Item = Result<M, PregelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }

        if self.remaining.len() < M::WIRE_SIZE {
            let err = DecodeError::Truncated {
                expected: M::WIRE_SIZE,
                found: self.remaining.len(),
            };
            return Some(Err(self.malformed(err)));
        }

        let (record, rest) = self.remaining.split_at(M::WIRE_SIZE);
        self.remaining = rest;
        let mut record = record;
        match M::decode(&mut record) {
            Ok(msg) => Some(Ok(msg)),
            Err(err) => Some(Err(self.malformed(err))),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let whole = self.remaining.len() / M::WIRE_SIZE;
        let partial = usize::from(self.remaining.len() % M::WIRE_SIZE != 0);
        (0, Some(whole + partial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    // Two-field test record: value + tag (tag must be 0 or 1)
    #[derive(Debug, Clone, PartialEq)]
    struct Tagged {
        value: u32,
        flag: bool,
    }

    impl VertexMessage for Tagged {
        const WIRE_SIZE: usize = 5;

        fn encode(&self, buf: &mut BytesMut) {
            buf.put_u32_le(self.value);
            buf.put_u8(u8::from(self.flag));
        }

        fn decode<B: Buf>(buf: &mut B) -> Result<Self, DecodeError> {
            let value = buf.get_u32_le();
            let flag = match buf.get_u8() {
                0 => false,
                1 => true,
                other => {
                    return Err(DecodeError::InvalidTag {
                        field: "flag",
                        value: i64::from(other),
                    })
                }
            };
            Ok(Tagged { value, flag })
        }
    }

    #[test]
    fn test_iterates_whole_records() {
        let mut buf = BytesMut::new();
        Tagged { value: 7, flag: true }.encode(&mut buf);
        Tagged { value: 9, flag: false }.encode(&mut buf);

        let msgs: Vec<Tagged> = MessageIter::new(VertexId::new(1), &buf)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            msgs,
            vec![
                Tagged { value: 7, flag: true },
                Tagged { value: 9, flag: false }
            ]
        );
    }

    #[test]
    fn test_invalid_tag_is_malformed() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1);
        buf.put_u8(4);

        let mut iter = MessageIter::<Tagged>::new(VertexId::new(3), &buf);
        match iter.next() {
            Some(Err(PregelError::MalformedMessage { vertex_id, reason })) => {
                assert_eq!(vertex_id, VertexId::new(3));
                assert!(reason.contains("flag"));
            }
            other => panic!("expected malformed message, got {:?}", other),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_trailing_bytes_are_malformed() {
        let mut buf = BytesMut::new();
        Tagged { value: 1, flag: false }.encode(&mut buf);
        buf.put_u16_le(0);

        let results: Vec<_> = MessageIter::<Tagged>::new(VertexId::new(2), &buf).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(PregelError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_empty_inbox() {
        let mut iter = MessageIter::<Tagged>::new(VertexId::new(1), &[]);
        assert!(iter.next().is_none());
    }
}
