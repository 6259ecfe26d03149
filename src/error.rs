//! Error types for pgexec.

use crate::params::Params;
use crate::status::ExecStatus;
use thiserror::Error;

/// The main error type for pgexec operations.
///
/// Every variant that comes from the server carries the connection's
/// diagnostic text verbatim, next to whatever was being attempted.
#[derive(Debug, Error)]
pub enum ExecError {
    /// An ad-hoc statement finished with a status other than the expected one.
    #[error("{sql} failed: {} (expected {expected}, got {actual})", trim_diag(.message))]
    Statement {
        sql: String,
        expected: ExecStatus,
        actual: ExecStatus,
        message: String,
    },

    /// A prepared statement finished with a status other than the expected one.
    #[error("{name} failed: {}({actual}){}", trim_diag(.message), render_args(.params))]
    Prepared {
        name: String,
        expected: ExecStatus,
        actual: ExecStatus,
        message: String,
        params: Params,
    },

    /// Growing the statement buffer failed.
    #[error("Memory allocation failed: {0}")]
    Allocation(String),

    /// A `Display` implementation reported an error while formatting.
    #[error("Formatting error while building statement")]
    Format,

    /// Pushing data into an active COPY stream failed or was refused.
    #[error("{}", render_copy(.context, .data, .message.as_deref()))]
    Copy {
        context: String,
        data: String,
        message: Option<String>,
    },

    /// Text contains a NUL byte and cannot be handed to the C API.
    #[error("Value contains NUL byte (0x00): {0}")]
    NulByte(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Create a copy error without server diagnostics (the channel refused data).
    pub fn copy_refused(context: impl Into<String>, data: &[u8]) -> Self {
        Self::Copy {
            context: context.into(),
            data: String::from_utf8_lossy(data).into_owned(),
            message: None,
        }
    }

    /// Create a copy error carrying the connection's diagnostic text.
    pub fn copy_failed(context: impl Into<String>, data: &[u8], message: impl Into<String>) -> Self {
        Self::Copy {
            context: context.into(),
            data: String::from_utf8_lossy(data).into_owned(),
            message: Some(message.into()),
        }
    }

    /// The connection diagnostic attached to this error, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Statement { message, .. } | Self::Prepared { message, .. } => Some(message),
            Self::Copy { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// True for the status-mismatch family of errors.
    pub fn is_status_mismatch(&self) -> bool {
        matches!(self, Self::Statement { .. } | Self::Prepared { .. })
    }
}

fn trim_diag(message: &str) -> &str {
    message.trim_end()
}

fn render_args(params: &Params) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("\nArguments were: {}", params)
    }
}

fn render_copy(context: &str, data: &str, message: Option<&str>) -> String {
    match message {
        Some(msg) => format!(
            "{}: {} - bad result during COPY, data {}",
            trim_diag(msg),
            context,
            data
        ),
        None => format!("{} - bad result during COPY, data {}", context, data),
    }
}

/// Result type alias for pgexec operations.
pub type ExecResult<T> = Result<T, ExecError>;
