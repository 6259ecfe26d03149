//! COPY IN streaming.
//!
//! The stream itself is started elsewhere, typically with
//! `execute_simple(conn, ExecStatus::CopyIn, "COPY t FROM STDIN")`.
//! Chunks pushed here must already be escaped.

use crate::connection::{Connection, QueryResult};
use crate::error::{ExecError, ExecResult};
use crate::escape::{EscapeStyle, escape_with};
use crate::status::{CopyPush, ExecStatus};
use tracing::{debug, trace};

/// Default flush threshold for [`CopyRowBuffer`].
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Push one pre-escaped chunk into the active COPY stream.
///
/// A full channel ([`CopyPush::WouldBlock`]) is treated as fatal, the same
/// as a hard failure, but carries no server diagnostic.
pub fn put_copy_data<C: Connection>(context: &str, conn: &mut C, chunk: &[u8]) -> ExecResult<()> {
    trace!("{}>>> {}", context, String::from_utf8_lossy(chunk));
    match conn.put_copy_data(chunk) {
        CopyPush::Accepted => Ok(()),
        CopyPush::WouldBlock => Err(ExecError::copy_refused(context, chunk)),
        CopyPush::Failed => Err(ExecError::copy_failed(
            context,
            chunk,
            conn.error_message(),
        )),
    }
}

/// End the COPY stream and require the server to acknowledge it.
pub fn finish_copy<C: Connection>(context: &str, conn: &mut C) -> ExecResult<()> {
    debug!("{}: ending COPY", context);
    match conn.put_copy_end(None) {
        CopyPush::Accepted => {}
        CopyPush::WouldBlock => return Err(ExecError::copy_refused(context, b"")),
        CopyPush::Failed => {
            return Err(ExecError::copy_failed(context, b"", conn.error_message()));
        }
    }

    let mut failure = None;
    // Drain every pending result so the connection is usable afterwards.
    while let Some(res) = conn.get_result() {
        let status = res.status();
        drop(res);
        if status != ExecStatus::CommandOk && failure.is_none() {
            failure = Some(conn.error_message());
        }
    }

    match failure {
        Some(message) => Err(ExecError::copy_failed(context, b"", message)),
        None => Ok(()),
    }
}

/// Append one COPY text row: tab separated, newline terminated, `\N` for NULL.
pub fn encode_copy_row(fields: &[Option<&str>], style: EscapeStyle, dst: &mut Vec<u8>) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            dst.push(b'\t');
        }
        match field {
            Some(text) => escape_with(style, text.as_bytes(), dst),
            None => dst.extend_from_slice(b"\\N"),
        }
    }
    dst.push(b'\n');
}

/// Batches encoded rows and pushes them once the buffer passes `chunk_size`.
#[derive(Debug)]
pub struct CopyRowBuffer {
    context: String,
    style: EscapeStyle,
    chunk_size: usize,
    buf: Vec<u8>,
    rows: u64,
}

impl CopyRowBuffer {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            style: EscapeStyle::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            buf: Vec::with_capacity(DEFAULT_CHUNK_SIZE),
            rows: 0,
        }
    }

    pub fn style(mut self, style: EscapeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Encode a row, flushing first if the buffer is full.
    pub fn push_row<C: Connection>(&mut self, conn: &mut C, fields: &[Option<&str>]) -> ExecResult<()> {
        encode_copy_row(fields, self.style, &mut self.buf);
        self.rows += 1;
        if self.buf.len() >= self.chunk_size {
            self.flush(conn)?;
        }
        Ok(())
    }

    /// Push whatever is buffered.
    pub fn flush<C: Connection>(&mut self, conn: &mut C) -> ExecResult<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        put_copy_data(&self.context, conn, &self.buf)?;
        self.buf.clear();
        Ok(())
    }

    /// Flush the remainder and end the stream. Returns the number of rows encoded.
    pub fn finish<C: Connection>(mut self, conn: &mut C) -> ExecResult<u64> {
        self.flush(conn)?;
        finish_copy(&self.context, conn)?;
        Ok(self.rows)
    }

    /// Rows encoded so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Bytes waiting to be pushed.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }
}
