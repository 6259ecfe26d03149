//! Capacity-probing statement builder.
//!
//! Formats `fmt::Arguments` into a buffer of a guessed size. When the
//! guess is too small the builder either learns the exact size from the
//! first pass and retries once, or, when probing is off, doubles the
//! buffer until the text fits.

use crate::error::{ExecError, ExecResult};
use std::fmt::{self, Write};

/// Initial guess for the statement length.
pub const DEFAULT_CAPACITY: usize = 100;

/// Builds statement text from format arguments.
#[derive(Debug, Clone, Copy)]
pub struct SqlFormatter {
    initial_capacity: usize,
    probe_length: bool,
}

impl Default for SqlFormatter {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            probe_length: true,
        }
    }
}

impl SqlFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first buffer size tried. Zero is bumped to one.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity.max(1);
        self
    }

    /// When false, an overflowing pass only reports "insufficient" and the
    /// buffer grows by doubling.
    pub fn probe_length(mut self, probe: bool) -> Self {
        self.probe_length = probe;
        self
    }

    /// Format `args` into a buffer sized to fit.
    pub fn format(&self, args: fmt::Arguments<'_>) -> ExecResult<String> {
        let mut capacity = self.initial_capacity;
        let mut buf = allocate(capacity)?;

        loop {
            match format_capped(&mut buf, capacity, self.probe_length, args)? {
                Pass::Fits => break,
                Pass::Needs(required) => {
                    capacity = required;
                }
                Pass::Insufficient => {
                    capacity = capacity.checked_mul(2).ok_or_else(|| {
                        ExecError::Allocation(format!(
                            "statement buffer cannot grow past {} bytes",
                            capacity
                        ))
                    })?;
                }
            }
            buf = allocate(capacity)?;
        }

        String::from_utf8(buf).map_err(|_| ExecError::Format)
    }
}

/// Format with the default [`SqlFormatter`].
pub fn format_sql(args: fmt::Arguments<'_>) -> ExecResult<String> {
    SqlFormatter::default().format(args)
}

enum Pass {
    Fits,
    Needs(usize),
    Insufficient,
}

fn allocate(capacity: usize) -> ExecResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity).map_err(|e| {
        ExecError::Allocation(format!("statement buffer of {} bytes: {}", capacity, e))
    })?;
    Ok(buf)
}

fn format_capped(
    buf: &mut Vec<u8>,
    capacity: usize,
    probe: bool,
    args: fmt::Arguments<'_>,
) -> ExecResult<Pass> {
    buf.clear();
    let mut writer = CappedWriter {
        buf,
        capacity,
        required: 0,
        overflowed: false,
        probe,
    };

    let outcome = writer.write_fmt(args);
    if writer.overflowed {
        if probe {
            return Ok(Pass::Needs(writer.required));
        }
        return Ok(Pass::Insufficient);
    }
    outcome.map_err(|_| ExecError::Format)?;
    Ok(Pass::Fits)
}

/// Writes into `buf` up to `capacity` bytes. Past that point it either keeps
/// counting (probe) or aborts the pass.
struct CappedWriter<'a> {
    buf: &'a mut Vec<u8>,
    capacity: usize,
    required: usize,
    overflowed: bool,
    probe: bool,
}

impl Write for CappedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.required = self.required.saturating_add(s.len());
        if self.required > self.capacity {
            self.overflowed = true;
            if !self.probe {
                return Err(fmt::Error);
            }
            return Ok(());
        }
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
