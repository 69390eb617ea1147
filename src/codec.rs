//! Outbound command formatting and incremental inbound reply parsing.
//!
//! The inbound parser is an explicit state enum with a single `feed` entry
//! point: no recursion, and it resumes correctly no matter how the
//! underlying socket chunks its reads.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::optab::Op;

/// A parsed server reply. Bulk elements of a multi-bulk reply are
/// themselves bulk strings (possibly nil).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Option<Bytes>),
    MultiBulk(Option<Vec<Option<Bytes>>>),
}

impl Reply {
    /// The payload of a non-nil bulk reply, if this is one.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            Reply::Bulk(Some(b)) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum BulkState {
    Header,
    Body(i64),
}

#[derive(Debug)]
struct MultiState {
    count: Option<i64>,
    items: Vec<Option<Bytes>>,
    current: BulkState,
}

#[derive(Debug)]
enum State {
    Unknown,
    SimpleLine { is_error: bool },
    Integer,
    Bulk(BulkState),
    MultiBulk(MultiState),
}

/// Incremental RESP reply parser. Feed it byte chunks as they arrive from
/// the socket; `feed` returns `Ok(Some(reply))` exactly once a full reply
/// has been assembled, `Ok(None)` if more bytes are needed, and `Err` on a
/// malformed leading type byte, which is unrecoverable for the connection.
pub struct ReplyParser {
    buf: BytesMut,
    state: State,
}

impl ReplyParser {
    pub fn new() -> Self {
        ReplyParser {
            buf: BytesMut::new(),
            state: State::Unknown,
        }
    }

    /// Append `chunk` and try to complete the in-progress reply.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<Reply>> {
        self.buf.extend_from_slice(chunk);
        self.advance()
    }

    fn advance(&mut self) -> Result<Option<Reply>> {
        loop {
            match &mut self.state {
                State::Unknown => {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    self.state = match self.buf[0] {
                        b'+' => State::SimpleLine { is_error: false },
                        b'-' => State::SimpleLine { is_error: true },
                        b':' => State::Integer,
                        b'$' => State::Bulk(BulkState::Header),
                        b'*' => State::MultiBulk(MultiState {
                            count: None,
                            items: Vec::new(),
                            current: BulkState::Header,
                        }),
                        other => {
                            return Err(Error::Protocol(format!(
                                "unrecognized reply type byte {other:#x}"
                            )))
                        }
                    };
                }
                State::SimpleLine { is_error } => {
                    let is_error = *is_error;
                    match take_line(&mut self.buf)? {
                        None => return Ok(None),
                        Some(line) => {
                            let text = String::from_utf8_lossy(&line[1..]).into_owned();
                            self.state = State::Unknown;
                            return Ok(Some(if is_error {
                                Reply::Error(text)
                            } else {
                                Reply::Status(text)
                            }));
                        }
                    }
                }
                State::Integer => match take_line(&mut self.buf)? {
                    None => return Ok(None),
                    Some(line) => {
                        let n = parse_i64(&line[1..])?;
                        self.state = State::Unknown;
                        return Ok(Some(Reply::Integer(n)));
                    }
                },
                State::Bulk(bulk) => match try_parse_bulk(&mut self.buf, bulk)? {
                    None => return Ok(None),
                    Some(body) => {
                        self.state = State::Unknown;
                        return Ok(Some(Reply::Bulk(body)));
                    }
                },
                State::MultiBulk(m) => {
                    if m.count.is_none() {
                        match take_line(&mut self.buf)? {
                            None => return Ok(None),
                            Some(line) => {
                                let n = parse_i64(&line[1..])?;
                                if n == -1 {
                                    self.state = State::Unknown;
                                    return Ok(Some(Reply::MultiBulk(None)));
                                }
                                m.count = Some(n);
                                m.items = Vec::with_capacity(n.max(0) as usize);
                                m.current = BulkState::Header;
                            }
                        }
                    } else {
                        let count = m.count.unwrap();
                        if m.items.len() as i64 >= count {
                            let items = std::mem::take(&mut m.items);
                            self.state = State::Unknown;
                            return Ok(Some(Reply::MultiBulk(Some(items))));
                        }
                        match try_parse_bulk(&mut self.buf, &mut m.current)? {
                            None => return Ok(None),
                            Some(body) => {
                                m.items.push(body);
                                m.current = BulkState::Header;
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_i64(text: &[u8]) -> Result<i64> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.trim_end().parse::<i64>().ok())
        .ok_or_else(|| Error::Protocol(format!("bad integer field: {text:?}")))
}

/// Consume and return one CRLF- or LF-terminated line from the front of
/// `buf`, excluding the terminator. `None` if no terminator has arrived yet.
fn take_line(buf: &mut BytesMut) -> Result<Option<Bytes>> {
    let Some(pos) = buf.iter().position(|&b| b == b'\n') else {
        return Ok(None);
    };
    let mut line_end = pos;
    if line_end > 0 && buf[line_end - 1] == b'\r' {
        line_end -= 1;
    }
    let consumed_terminator = pos - line_end + 1;
    let line = buf.split_to(line_end).freeze();
    buf.advance(consumed_terminator);
    Ok(Some(line))
}

/// Drive one bulk-string's header + body through to completion (or report
/// that more bytes are needed). Shared between top-level `$` replies and
/// each element of a `*` reply.
fn try_parse_bulk(buf: &mut BytesMut, state: &mut BulkState) -> Result<Option<Option<Bytes>>> {
    loop {
        match state {
            BulkState::Header => match take_line(buf)? {
                None => return Ok(None),
                Some(line) => {
                    let n = parse_i64(&line[1..])?;
                    if n == -1 {
                        return Ok(Some(None));
                    }
                    if n < -1 {
                        return Err(Error::Protocol(format!("negative bulk length: {n}")));
                    }
                    *state = BulkState::Body(n);
                }
            },
            BulkState::Body(n) => {
                let n = *n as usize;
                if buf.len() < n + 2 {
                    return Ok(None);
                }
                let data = buf.split_to(n);
                buf.advance(2);
                return Ok(Some(Some(data.freeze())));
            }
        }
    }
}

/// A small growable-buffer formatter for assembling one RESP command.
struct Buffer(BytesMut);

impl Buffer {
    fn new() -> Self {
        Buffer(BytesMut::new())
    }

    fn append_bytes(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    fn append_u64_decimal(&mut self, n: u64) {
        self.append_bytes(n.to_string().as_bytes());
    }

    fn freeze(self) -> Bytes {
        self.0.freeze()
    }
}

/// Format a RESP multi-bulk array command from raw argument bytes.
fn build_command(parts: &[Vec<u8>]) -> Bytes {
    let mut buf = Buffer::new();
    buf.append_bytes(b"*");
    buf.append_u64_decimal(parts.len() as u64);
    buf.append_bytes(b"\r\n");
    for part in parts {
        buf.append_bytes(b"$");
        buf.append_u64_decimal(part.len() as u64);
        buf.append_bytes(b"\r\n");
        buf.append_bytes(part);
        buf.append_bytes(b"\r\n");
    }
    buf.freeze()
}

fn key_name(prefix: &str, id: u64) -> Vec<u8> {
    format!("{prefix}:{id}").into_bytes()
}

/// Build the outbound command for `op` against key `k` (and hash field `h`
/// for hash ops). Returns `None` for [`Op::Idle`], which sends nothing at
/// all.
pub fn format_request(op: Op, k: u64, h: u64, payload: &[u8]) -> Option<Bytes> {
    let parts: Vec<Vec<u8>> = match op {
        Op::Idle => return None,
        Op::Set => vec![b"SET".to_vec(), key_name("string", k), payload.to_vec()],
        Op::Get => vec![b"GET".to_vec(), key_name("string", k)],
        Op::Del => vec![
            b"DEL".to_vec(),
            key_name("string", k),
            key_name("list", k),
            key_name("hash", k),
        ],
        Op::LPush => vec![b"LPUSH".to_vec(), key_name("list", k), payload.to_vec()],
        Op::LPop => vec![b"LPOP".to_vec(), key_name("list", k)],
        Op::HSet => vec![
            b"HSET".to_vec(),
            key_name("hash", k),
            key_name("key", h),
            payload.to_vec(),
        ],
        Op::HGet => vec![b"HGET".to_vec(), key_name("hash", k), key_name("key", h)],
        Op::HGetAll => vec![b"HGETALL".to_vec(), key_name("hash", k)],
        Op::SwapIn => vec![
            b"DEBUG".to_vec(),
            b"SWAPIN".to_vec(),
            key_name("string", k),
        ],
    };
    Some(build_command(&parts))
}
