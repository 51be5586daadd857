//! Text Protocol Implementation
//!
//! This module implements the memcached-style text protocol spoken by
//! flashcache: `set`, `get` and `quit` requests, one per line.
//!
//! ## Modules
//!
//! - `types`: Defines `Command`, `Response` and reply serialization
//! - `parser`: Line framing and the zero-copy command parser
//!
//! ## Example
//!
//! ```
//! use flashcache::protocol::{parse_message, Command, Response};
//! use bytes::{Bytes, BytesMut};
//!
//! let mut buf = BytesMut::from(&b"get name\r\n"[..]);
//! let command = parse_message(&mut buf).unwrap();
//! assert_eq!(command, Command::Get { keys: vec![Bytes::from("name")] });
//!
//! assert_eq!(Response::Stored.serialize(), b"STORED\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{
    next_line, parse_command, parse_message, ParseError, ParseResult, MAX_LINE_LENGTH,
};
pub use types::{Command, Response, ValueBlock, CRLF};
