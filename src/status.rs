//! Result status classes and the COPY push outcome.

use std::fmt;
use std::str::FromStr;

/// Outcome class of an executed statement (libpq `ExecStatusType`).
///
/// Callers declare the status they expect before executing; the executors
/// compare the actual status against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecStatus {
    EmptyQuery,
    CommandOk,
    TuplesOk,
    CopyOut,
    CopyIn,
    BadResponse,
    NonfatalError,
    FatalError,
    CopyBoth,
    SingleTuple,
    PipelineSync,
    PipelineAborted,
}

impl ExecStatus {
    /// Map a raw libpq status code. Unknown codes are treated as a bad response.
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::EmptyQuery,
            1 => Self::CommandOk,
            2 => Self::TuplesOk,
            3 => Self::CopyOut,
            4 => Self::CopyIn,
            5 => Self::BadResponse,
            6 => Self::NonfatalError,
            7 => Self::FatalError,
            8 => Self::CopyBoth,
            9 => Self::SingleTuple,
            10 => Self::PipelineSync,
            11 => Self::PipelineAborted,
            _ => Self::BadResponse,
        }
    }

    /// The libpq constant name, e.g. `PGRES_COMMAND_OK`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "PGRES_EMPTY_QUERY",
            Self::CommandOk => "PGRES_COMMAND_OK",
            Self::TuplesOk => "PGRES_TUPLES_OK",
            Self::CopyOut => "PGRES_COPY_OUT",
            Self::CopyIn => "PGRES_COPY_IN",
            Self::BadResponse => "PGRES_BAD_RESPONSE",
            Self::NonfatalError => "PGRES_NONFATAL_ERROR",
            Self::FatalError => "PGRES_FATAL_ERROR",
            Self::CopyBoth => "PGRES_COPY_BOTH",
            Self::SingleTuple => "PGRES_SINGLE_TUPLE",
            Self::PipelineSync => "PGRES_PIPELINE_SYNC",
            Self::PipelineAborted => "PGRES_PIPELINE_ABORTED",
        }
    }

    /// Whether a result with this status carries rows the caller wants to read.
    pub fn returns_tuples(&self) -> bool {
        matches!(self, Self::TuplesOk)
    }
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecStatus {
    type Err = String;

    /// Accepts `command_ok`, `COMMAND_OK`, `PGRES_COMMAND_OK` and `command-ok`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase().replace('-', "_");
        let name = upper.strip_prefix("PGRES_").unwrap_or(&upper);
        let status = match name {
            "EMPTY_QUERY" => Self::EmptyQuery,
            "COMMAND_OK" => Self::CommandOk,
            "TUPLES_OK" => Self::TuplesOk,
            "COPY_OUT" => Self::CopyOut,
            "COPY_IN" => Self::CopyIn,
            "BAD_RESPONSE" => Self::BadResponse,
            "NONFATAL_ERROR" => Self::NonfatalError,
            "FATAL_ERROR" => Self::FatalError,
            "COPY_BOTH" => Self::CopyBoth,
            "SINGLE_TUPLE" => Self::SingleTuple,
            "PIPELINE_SYNC" => Self::PipelineSync,
            "PIPELINE_ABORTED" => Self::PipelineAborted,
            _ => return Err(format!("unknown result status '{}'", s)),
        };
        Ok(status)
    }
}

/// Outcome of pushing one chunk into a COPY IN stream (`PQputCopyData`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPush {
    /// All bytes were queued.
    Accepted,
    /// The channel is full; a non-blocking caller would wait and retry.
    WouldBlock,
    /// Hard failure; the connection's error message says why.
    Failed,
}

impl CopyPush {
    /// Map the raw libpq return code (`1`, `0`, `-1`).
    pub fn from_raw(code: i32) -> Self {
        match code {
            1 => Self::Accepted,
            0 => Self::WouldBlock,
            _ => Self::Failed,
        }
    }
}
