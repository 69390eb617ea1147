//! Per-client connection state machine.
//!
//! Each pool slot runs this as one `tokio` task. States are still tracked
//! explicitly (`ConnState`) for logging and testability even though tokio's
//! `.await` points (not manual fd re-registration) drive the transitions.

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::codec::{format_request, Reply, ReplyParser};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::optab::Op;
use crate::payload;

/// Tracked purely for observability, since the async control flow below
/// enforces the actual transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    Connecting,
    Sending,
    Reading,
    Completing,
}

/// Run one pool slot until the benchmark is done, stopping, or a fatal
/// error occurs. Non-fatal I/O errors are logged and trigger a reconnect,
/// folded into this task's own loop rather than requiring the pool to spawn
/// a replacement task.
pub async fn run_slot(id: usize, engine: Engine) -> Result<()> {
    engine.mark_connected();
    let result = run_slot_inner(id, &engine).await;
    engine.mark_disconnected();
    result
}

async fn run_slot_inner(id: usize, engine: &Engine) -> Result<()> {
    loop {
        if engine.is_done() {
            return Ok(());
        }

        let mut state = ConnState::Connecting;
        tracing::trace!(slot = id, ?state, "connecting");
        let addr = (engine.config.host.as_str(), engine.config.port);
        let stream = match TcpStream::connect(addr).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(slot = id, error = %e, "connect failed, retrying");
                tokio::task::yield_now().await;
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(slot = id, error = %e, "failed to set TCP_NODELAY");
        }
        tracing::debug!(slot = id, "connected");

        if engine.config.idle {
            idle_until_stopped(engine, stream).await;
            return Ok(());
        }

        match drive_connection(id, engine, stream, &mut state).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                engine.signal_fatal();
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(slot = id, error = %e, "connection failed, reconnecting");
            }
        }

        if engine.is_done() || engine.is_stopping() {
            return Ok(());
        }
    }
}

/// Drive one connection through as many requests as keepalive allows.
async fn drive_connection(
    id: usize,
    engine: &Engine,
    mut stream: TcpStream,
    state: &mut ConnState,
) -> Result<()> {
    loop {
        let Some((op, k, h)) = engine.next_request() else {
            return Ok(());
        };

        let payload = match op {
            Op::Set | Op::LPush | Op::HSet => engine.payload_for(k),
            _ => Vec::new(),
        };
        let Some(cmd) = format_request(op, k, h, &payload) else {
            continue; // Op::Idle never appears in a non-idle OpTab
        };

        *state = ConnState::Sending;
        tracing::trace!(slot = id, ?state, ?op, key = k, "sending");
        let start = Instant::now();
        stream.write_all(&cmd).await?;

        *state = ConnState::Reading;
        tracing::trace!(slot = id, ?state, "reading");
        let reply = read_reply(&mut stream).await?;

        *state = ConnState::Completing;
        let latency_ms = start.elapsed().as_millis() as u64;

        if engine.config.check && matches!(op, Op::Get) {
            if let Some(bytes) = reply.as_bulk() {
                payload::verify(k, engine.config.min_data_size, engine.config.max_data_size, bytes)?;
            }
        }

        engine.complete_request(latency_ms);
        tracing::trace!(slot = id, ?state, latency_ms, "completed");

        if engine.is_done() || engine.is_stopping() {
            return Ok(());
        }
        if !engine.config.keepalive {
            return Ok(());
        }
        // keepalive: loop around and issue the next request on this socket
    }
}

async fn idle_until_stopped(engine: &Engine, stream: TcpStream) {
    let (mut rd, _wr) = stream.into_split();
    let mut probe = [0u8; 1];
    loop {
        if engine.is_done() || engine.is_stopping() {
            return;
        }
        tokio::select! {
            _ = rd.read(&mut probe) => return,
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
        }
    }
}

async fn read_reply(stream: &mut TcpStream) -> Result<Reply> {
    let mut parser = ReplyParser::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "server closed connection mid-reply",
            )));
        }
        if let Some(reply) = parser.feed(&buf[..n])? {
            return Ok(reply);
        }
    }
}
