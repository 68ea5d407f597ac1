//! Wire protocol between a dispatcher and its worker process.
//!
//! Newline-delimited JSON over the child's stdio:
//!
//! ```text
//! parent ── stdin ──▶ {"layout":{"root":".","modules":["a.schema"]}}\n   (then EOF)
//! parent ◀─ stdout ── {"kind":"result","result":{"types":[...]}}\n
//!                  or {"kind":"error","message":"..."}\n
//! ```
//!
//! Exactly one line flows each way. Both payloads are plain data, so the
//! worker gets a deep copy of the layout and the parent a deep copy of the
//! result.

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use typeweave_core::{ExtractionResult, LayoutDescriptor};

/// Maximum line size (16 MiB) accepted from either side.
pub const MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

/// The worker's sole initial input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInput {
    pub layout: LayoutDescriptor,
}

/// The worker's single outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerFrame {
    Result { result: ExtractionResult },
    Error { message: String },
}

/// Serializes `value` as one newline-terminated JSON line.
pub fn encode_line<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(line)
}

/// Reads the worker input from a blocking reader (worker side).
///
/// # Errors
///
/// `UnexpectedEof` if the parent closed stdin without sending anything,
/// `InvalidData` if the line is oversized or not a valid [`WorkerInput`].
pub fn read_input(reader: impl BufRead) -> io::Result<WorkerInput> {
    let mut line = Vec::new();
    let read = reader.take(MAX_FRAME_BYTES + 1).read_until(b'\n', &mut line)?;
    if read == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no worker input received",
        ));
    }
    check_size(&line)?;
    serde_json::from_slice(&line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Writes one frame and flushes (worker side).
pub fn write_frame(mut writer: impl Write, frame: &WorkerFrame) -> io::Result<()> {
    let line = encode_line(frame).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.write_all(&line)?;
    writer.flush()
}

fn check_size(line: &[u8]) -> io::Result<()> {
    if line.len() as u64 > MAX_FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame exceeds maximum of {} bytes", MAX_FRAME_BYTES),
        ));
    }
    Ok(())
}

/// Reads [`WorkerFrame`]s from a worker's stdout (parent side).
pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on EOF. Blank lines are skipped.
    /// Returns `InvalidData` on oversized or malformed lines.
    pub async fn read_frame(&mut self) -> io::Result<Option<WorkerFrame>> {
        loop {
            let mut line = Vec::new();
            let read = (&mut self.reader)
                .take(MAX_FRAME_BYTES + 1)
                .read_until(b'\n', &mut line)
                .await?;
            if read == 0 {
                return Ok(None);
            }
            check_size(&line)?;

            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            return serde_json::from_slice(&line)
                .map(Some)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
        }
    }
}
