//! The connection seam.
//!
//! pgexec never opens or closes sessions. It is handed something that
//! implements [`Connection`] and issues operations against it. The libpq
//! binding lives in [`crate::libpq`]; tests use an in-memory double.

use crate::error::ExecResult;
use crate::status::{CopyPush, ExecStatus};

/// A result returned by the server.
///
/// Owned by whoever holds it and released exactly once, on drop.
/// Implementations must not be `Clone`.
pub trait QueryResult {
    /// Status class of this result.
    fn status(&self) -> ExecStatus;

    /// Number of rows.
    fn rows(&self) -> usize;

    /// Number of columns.
    fn columns(&self) -> usize;

    /// Column name, if `col` is in range.
    fn column_name(&self, col: usize) -> Option<&str>;

    /// Text value of a cell. `None` for SQL NULL or out-of-range indices.
    fn value(&self, row: usize, col: usize) -> Option<&str>;

    /// Rows affected by the command, parsed from the command tag.
    fn affected_rows(&self) -> Option<u64>;
}

/// A live session to the database, owned elsewhere.
///
/// All methods block until the server answers. `&mut self` keeps one
/// operation in flight per handle.
pub trait Connection {
    type Result: QueryResult;

    /// Send one statement through the simple query protocol.
    fn exec(&mut self, sql: &str) -> ExecResult<Self::Result>;

    /// Execute a statement previously registered under `name`.
    fn exec_prepared(&mut self, name: &str, params: &[Option<&str>]) -> ExecResult<Self::Result>;

    /// Queue one chunk into an active COPY IN stream.
    fn put_copy_data(&mut self, chunk: &[u8]) -> CopyPush;

    /// Send end-of-data. `error` aborts the COPY with that message.
    fn put_copy_end(&mut self, error: Option<&str>) -> CopyPush;

    /// Fetch the next pending result, if any.
    fn get_result(&mut self) -> Option<Self::Result>;

    /// The connection's most recent error message. Empty when there is none.
    fn error_message(&self) -> String;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    type Result = C::Result;

    fn exec(&mut self, sql: &str) -> ExecResult<Self::Result> {
        (**self).exec(sql)
    }

    fn exec_prepared(&mut self, name: &str, params: &[Option<&str>]) -> ExecResult<Self::Result> {
        (**self).exec_prepared(name, params)
    }

    fn put_copy_data(&mut self, chunk: &[u8]) -> CopyPush {
        (**self).put_copy_data(chunk)
    }

    fn put_copy_end(&mut self, error: Option<&str>) -> CopyPush {
        (**self).put_copy_end(error)
    }

    fn get_result(&mut self) -> Option<Self::Result> {
        (**self).get_result()
    }

    fn error_message(&self) -> String {
        (**self).error_message()
    }
}

/// Parse the affected-row count out of a command tag such as `INSERT 0 5`.
pub fn parse_affected_rows(tag: &str) -> Option<u64> {
    tag.split_whitespace().last()?.parse().ok()
}
