//! Line Framing and Command Parser
//!
//! Incoming bytes are accumulated in a `BytesMut` buffer. `next_line` cuts
//! one `\n`-terminated line off the front of that buffer, and
//! `parse_command` turns the line into a typed [`Command`].
//!
//! ## Framing
//!
//! TCP is a byte stream, so a read may end in the middle of a command or
//! carry several commands at once. The caller appends every read to the
//! buffer and then drains complete lines:
//!
//! 1. `next_line` returns `Some(line)` and advances the buffer, or
//! 2. `None` when no terminator has arrived yet (read more).
//!
//! ## Parsing
//!
//! A line is trimmed of surrounding ASCII whitespace (which also drops the
//! `\r` of a CRLF) and split on single spaces. Tokens are zero-copy slices of
//! the line, so keys and values flow into the store without reallocation.
//! Parsing is pure: a malformed line becomes `Command::Invalid` carrying the
//! reason, it never touches the cache.

use crate::protocol::types::{verb, Command};
use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// Longest line accepted before the connection is dropped (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Reasons a line is rejected with `ERROR`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Blank line
    #[error("empty command")]
    EmptyLine,

    /// First token is not a known verb
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Known verb with the wrong number of tokens
    #[error("wrong number of arguments for '{command}': {got} token(s)")]
    WrongArity { command: &'static str, got: usize },

    /// TTL token is not a signed 64-bit integer
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Splits the first complete line off the front of `buf`.
///
/// The returned line excludes the `\n`. Returns `None`, leaving `buf`
/// untouched, when no terminator is buffered yet.
pub fn next_line(buf: &mut BytesMut) -> Option<Bytes> {
    let newline = buf.iter().position(|&b| b == b'\n')?;
    let mut line = buf.split_to(newline + 1).freeze();
    line.truncate(newline);
    Some(line)
}

/// Parses one command unit.
///
/// Never fails: syntax errors are reported as `Command::Invalid`.
pub fn parse_command(line: &Bytes) -> Command {
    match try_parse(line) {
        Ok(command) => command,
        Err(e) => Command::Invalid(e),
    }
}

/// Frames and parses the next command buffered in `buf`, if any.
pub fn parse_message(buf: &mut BytesMut) -> Option<Command> {
    next_line(buf).map(|line| parse_command(&line))
}

fn try_parse(line: &Bytes) -> ParseResult<Command> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyLine);
    }

    let tokens: Vec<Bytes> = trimmed
        .split(|&b| b == b' ')
        .map(|token| line.slice_ref(token))
        .collect();

    let name = tokens[0].clone();
    match &name[..] {
        verb::SET => {
            let [_, key, value, ttl]: [Bytes; 4] =
                tokens
                    .try_into()
                    .map_err(|tokens: Vec<Bytes>| ParseError::WrongArity {
                        command: "set",
                        got: tokens.len(),
                    })?;
            let ttl = parse_ttl(&ttl)?;
            Ok(Command::Set { key, value, ttl })
        }
        verb::GET => {
            if tokens.len() < 2 {
                return Err(ParseError::WrongArity {
                    command: "get",
                    got: tokens.len(),
                });
            }
            Ok(Command::Get {
                keys: tokens.into_iter().skip(1).collect(),
            })
        }
        verb::QUIT => {
            if tokens.len() != 1 {
                return Err(ParseError::WrongArity {
                    command: "quit",
                    got: tokens.len(),
                });
            }
            Ok(Command::Quit)
        }
        other => Err(ParseError::UnknownCommand(
            String::from_utf8_lossy(other).into_owned(),
        )),
    }
}

fn parse_ttl(token: &[u8]) -> ParseResult<i64> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ParseError::InvalidTtl(String::from_utf8_lossy(token).into_owned()))
}
