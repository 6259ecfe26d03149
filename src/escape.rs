//! COPY text escaping.
//!
//! Escapes backslash itself, newline, carriage return, and the column
//! delimiter (tab). Everything else passes through unchanged.
//!
//! The default [`EscapeStyle::Literal`] writes a backslash followed by the
//! raw control byte. PostgreSQL's COPY documentation describes the
//! two-character forms (`\n`, `\r`, `\t`) instead; those are produced by
//! [`EscapeStyle::Symbolic`] and must be selected explicitly.

use serde::Deserialize;
use std::fmt;
use tracing::warn;

/// How control characters are written after the escaping backslash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeStyle {
    /// Backslash followed by the raw LF / CR / TAB byte.
    #[default]
    Literal,
    /// Backslash followed by `n`, `r` or `t`.
    Symbolic,
}

impl EscapeStyle {
    /// The two bytes that replace `byte`, or `None` if it passes through.
    #[inline]
    fn escape_pair(self, byte: u8) -> Option<[u8; 2]> {
        match (byte, self) {
            (b'\\', _) => Some(*b"\\\\"),
            (b'\n', Self::Literal) => Some(*b"\\\n"),
            (b'\r', Self::Literal) => Some(*b"\\\r"),
            (b'\t', Self::Literal) => Some(*b"\\\t"),
            (b'\n', Self::Symbolic) => Some(*b"\\n"),
            (b'\r', Self::Symbolic) => Some(*b"\\r"),
            (b'\t', Self::Symbolic) => Some(*b"\\t"),
            _ => None,
        }
    }
}

impl fmt::Display for EscapeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => f.write_str("literal"),
            Self::Symbolic => f.write_str("symbolic"),
        }
    }
}

impl std::str::FromStr for EscapeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "symbolic" => Ok(Self::Symbolic),
            other => Err(format!("unknown escape style '{}'", other)),
        }
    }
}

/// Append `src` to `dst` in COPY text encoding ([`EscapeStyle::Literal`]).
///
/// Every byte of `src` is consumed, NUL included.
#[inline]
pub fn escape(src: &[u8], dst: &mut Vec<u8>) {
    escape_with(EscapeStyle::Literal, src, dst);
}

/// Append `src` to `dst` in COPY text encoding using `style`.
pub fn escape_with(style: EscapeStyle, src: &[u8], dst: &mut Vec<u8>) {
    dst.reserve(src.len());
    for &byte in src {
        match style.escape_pair(byte) {
            Some(pair) => dst.extend_from_slice(&pair),
            None => dst.push(byte),
        }
    }
}

/// Convenience wrapper returning a fresh buffer.
pub fn escape_to_vec(src: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(src.len());
    escape(src, &mut dst);
    dst
}

/// Outcome of [`escape_bounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Escaped {
    /// Bytes written before the terminating NUL.
    pub written: usize,
    /// Source bytes consumed.
    pub consumed: usize,
    /// Whether the source was cut short.
    pub truncated: bool,
}

impl Escaped {
    /// The escaped bytes inside `out`, without the terminator.
    pub fn bytes<'a>(&self, out: &'a [u8]) -> &'a [u8] {
        &out[..self.written]
    }
}

/// Escape `src` into the fixed buffer `out`, always NUL-terminating.
///
/// Copying stops once fewer than three bytes of headroom remain, so a
/// final two-byte escape plus the terminator always fit. Unlike [`escape`],
/// the source is read as a C string: a NUL byte ends it and nothing after
/// it is copied or counted as truncated. Truncation is logged and
/// reported in the returned [`Escaped`], it is not an error.
pub fn escape_bounded(out: &mut [u8], src: &[u8]) -> Escaped {
    escape_bounded_with(EscapeStyle::Literal, out, src)
}

/// [`escape_bounded`] with an explicit [`EscapeStyle`].
pub fn escape_bounded_with(style: EscapeStyle, out: &mut [u8], src: &[u8]) -> Escaped {
    let src = match src.iter().position(|&b| b == 0) {
        Some(end) => &src[..end],
        None => src,
    };

    if out.is_empty() {
        return Escaped {
            written: 0,
            consumed: 0,
            truncated: !src.is_empty(),
        };
    }

    let limit = out.len().saturating_sub(3);
    let mut written = 0;
    let mut consumed = 0;

    while consumed < src.len() && written < limit {
        let byte = src[consumed];
        match style.escape_pair(byte) {
            Some(pair) => {
                out[written..written + 2].copy_from_slice(&pair);
                written += 2;
            }
            None => {
                out[written] = byte;
                written += 1;
            }
        }
        consumed += 1;
    }
    out[written] = 0;

    let truncated = consumed < src.len();
    if truncated {
        warn!(
            written,
            input = %String::from_utf8_lossy(src),
            output = %String::from_utf8_lossy(&out[..written]),
            "escape_bounded truncated at {} chars",
            written
        );
    }

    Escaped {
        written,
        consumed,
        truncated,
    }
}
