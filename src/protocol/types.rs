//! Text Protocol Data Types
//!
//! This module defines the commands a client can send and the replies the
//! server writes back. The wire format is a subset of the memcached text
//! protocol; every line ends with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Store: `set key1 value1 10\r\n` → `STORED\r\n`
//! Fetch: `get key1 missing\r\n` → `VALUE key1 6\r\nvalue1\r\nEND\r\n`
//! Error: `bogus\r\n` → `ERROR\r\n`

use crate::protocol::parser::ParseError;
use bytes::Bytes;
use std::io::Write;

/// The CRLF terminator ending every reply line
pub const CRLF: &[u8] = b"\r\n";

/// Command verbs, as they appear on the wire
pub mod verb {
    pub const SET: &[u8] = b"set";
    pub const GET: &[u8] = b"get";
    pub const QUIT: &[u8] = b"quit";
}

/// Fixed reply lines (without the terminator)
pub mod reply {
    pub const STORED: &[u8] = b"STORED";
    pub const ERROR: &[u8] = b"ERROR";
    pub const END: &[u8] = b"END";
    pub const VALUE: &[u8] = b"VALUE";
}

/// A parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `set <key> <value> <ttlSeconds>`
    Set { key: Bytes, value: Bytes, ttl: i64 },

    /// `get <key1> [<key2> ...]`
    Get { keys: Vec<Bytes> },

    /// `quit`
    Quit,

    /// Anything that does not match the grammar
    Invalid(ParseError),
}

impl Command {
    /// Returns the lower-case verb name, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "set",
            Command::Get { .. } => "get",
            Command::Quit => "quit",
            Command::Invalid(_) => "invalid",
        }
    }
}

/// One cache hit inside a `get` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueBlock {
    pub key: Bytes,
    pub value: Bytes,
}

/// A reply to a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `STORED\r\n`
    Stored,

    /// `ERROR\r\n`
    Error,

    /// Zero or more value blocks followed by `END\r\n`
    Values(Vec<ValueBlock>),

    /// Close the connection without writing anything
    Close,
}

impl Response {
    /// Serializes the response to bytes for sending over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the response into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Response::Stored => {
                buf.extend_from_slice(reply::STORED);
                buf.extend_from_slice(CRLF);
            }
            Response::Error => {
                buf.extend_from_slice(reply::ERROR);
                buf.extend_from_slice(CRLF);
            }
            Response::Values(blocks) => {
                for block in blocks {
                    buf.extend_from_slice(reply::VALUE);
                    buf.push(b' ');
                    buf.extend_from_slice(&block.key);
                    // Writing into a Vec cannot fail
                    let _ = write!(buf, " {}\r\n", block.value.len());
                    buf.extend_from_slice(&block.value);
                    buf.extend_from_slice(CRLF);
                }
                buf.extend_from_slice(reply::END);
                buf.extend_from_slice(CRLF);
            }
            Response::Close => {}
        }
    }

    /// Returns true if the connection must be closed after this response.
    pub fn closes_connection(&self) -> bool {
        matches!(self, Response::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(key: &'static str, value: &'static str) -> ValueBlock {
        ValueBlock {
            key: Bytes::from(key),
            value: Bytes::from(value),
        }
    }

    #[test]
    fn test_stored_serialize() {
        assert_eq!(Response::Stored.serialize(), b"STORED\r\n");
    }

    #[test]
    fn test_error_serialize() {
        assert_eq!(Response::Error.serialize(), b"ERROR\r\n");
    }

    #[test]
    fn test_empty_values_serialize() {
        assert_eq!(Response::Values(vec![]).serialize(), b"END\r\n");
    }

    #[test]
    fn test_values_serialize_in_order() {
        let response = Response::Values(vec![block("key1", "value1"), block("k2", "v")]);
        assert_eq!(
            response.serialize(),
            b"VALUE key1 6\r\nvalue1\r\nVALUE k2 1\r\nv\r\nEND\r\n"
        );
    }

    #[test]
    fn test_value_length_counts_bytes() {
        let response = Response::Values(vec![ValueBlock {
            key: Bytes::from("k"),
            value: Bytes::from("héllo"),
        }]);
        assert_eq!(response.serialize(), "VALUE k 6\r\nhéllo\r\nEND\r\n".as_bytes());
    }

    #[test]
    fn test_multi_digit_length_appends_to_buffer() {
        let value = Bytes::from(vec![b'x'; 1234]);
        let response = Response::Values(vec![ValueBlock {
            key: Bytes::from("big"),
            value: value.clone(),
        }]);

        let mut buf = b"STORED\r\n".to_vec();
        response.serialize_into(&mut buf);

        let mut expected = b"STORED\r\nVALUE big 1234\r\n".to_vec();
        expected.extend_from_slice(&value);
        expected.extend_from_slice(b"\r\nEND\r\n");
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_close_writes_nothing() {
        assert!(Response::Close.serialize().is_empty());
        assert!(Response::Close.closes_connection());
        assert!(!Response::Stored.closes_connection());
    }
}
