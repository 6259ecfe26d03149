//! # pgexec — checked execution and COPY encoding for PostgreSQL
//!
//! A thin layer between application code and an open PostgreSQL
//! connection:
//!
//! - run ad-hoc and prepared statements, asserting the result status
//! - encode text for the COPY text format and stream it into `COPY ... FROM STDIN`
//! - report every mismatch with the statement, parameters and server message
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use pgexec::prelude::*;
//!
//! let mut session = PqSession::connect("dbname=gis")?;
//! let mut conn = session.handle();
//!
//! execute_simple(&mut conn, ExecStatus::CopyIn, "COPY nodes FROM STDIN")?;
//! let mut rows = CopyRowBuffer::new("nodes");
//! rows.push_row(&mut conn, &[Some("1"), Some("a\tb"), None])?;
//! rows.finish(&mut conn)?;
//!
//! let params = Params::new().with("1");
//! let res = execute_prepared(&mut conn, "get_node", &params, ExecStatus::TuplesOk)?;
//! ```
//!
//! Connections are never opened or closed by the library itself; it works
//! against anything implementing [`Connection`].

pub mod config;
pub mod connection;
pub mod copy;
pub mod error;
pub mod escape;
pub mod exec;
pub mod format;
#[cfg(feature = "libpq")]
pub mod libpq;
pub mod logging;
pub mod params;
pub mod status;

pub use connection::{Connection, QueryResult};
pub use error::{ExecError, ExecResult};
pub use params::Params;
pub use status::{CopyPush, ExecStatus};

pub mod prelude {
    pub use crate::config::ExecConfig;
    pub use crate::connection::{Connection, QueryResult};
    pub use crate::copy::{CopyRowBuffer, encode_copy_row, finish_copy, put_copy_data};
    pub use crate::error::*;
    pub use crate::escape::{
        EscapeStyle, Escaped, escape, escape_bounded, escape_bounded_with, escape_with,
    };
    pub use crate::exec::{execute, execute_prepared, execute_simple};
    pub use crate::exec_sql;
    pub use crate::format::{SqlFormatter, format_sql};
    #[cfg(feature = "libpq")]
    pub use crate::libpq::{PqConnection, PqResult, PqSession};
    pub use crate::params::Params;
    pub use crate::status::{CopyPush, ExecStatus};
}
