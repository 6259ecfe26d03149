//! Status-checked statement execution.
//!
//! Every executor compares the server's result status against the status
//! the caller declared. A mismatch drops the result before the error is
//! returned, so no result outlives a failure.

use crate::connection::{Connection, QueryResult};
use crate::error::{ExecError, ExecResult};
use crate::format::format_sql;
use crate::params::Params;
use crate::status::ExecStatus;
use std::fmt;
use tracing::debug;

/// Execute `sql` and require `expect`. Returns the owned result on success.
pub fn execute_simple<C: Connection>(
    conn: &mut C,
    expect: ExecStatus,
    sql: &str,
) -> ExecResult<C::Result> {
    debug!("Executing: {}", sql);
    let res = conn.exec(sql)?;
    let actual = res.status();
    if actual != expect {
        drop(res);
        return Err(ExecError::Statement {
            sql: sql.to_string(),
            expected: expect,
            actual,
            message: conn.error_message(),
        });
    }
    Ok(res)
}

/// Format a statement, execute it and require `expect`. The result is
/// released before returning.
///
/// Usually called through [`exec_sql!`](crate::exec_sql).
pub fn execute<C: Connection>(
    conn: &mut C,
    expect: ExecStatus,
    args: fmt::Arguments<'_>,
) -> ExecResult<()> {
    let sql = format_sql(args)?;
    execute_simple(conn, expect, &sql).map(drop)
}

/// Execute the prepared statement `name` with positional text parameters.
///
/// When `expect` is [`ExecStatus::TuplesOk`] the result is handed back.
/// For any other expectation the result is released here and `None` is
/// returned.
pub fn execute_prepared<C: Connection>(
    conn: &mut C,
    name: &str,
    params: &Params,
    expect: ExecStatus,
) -> ExecResult<Option<C::Result>> {
    debug!("ExecPrepared: {}", name);
    let res = conn.exec_prepared(name, &params.as_refs())?;
    let actual = res.status();
    if actual != expect {
        drop(res);
        return Err(ExecError::Prepared {
            name: name.to_string(),
            expected: expect,
            actual,
            message: conn.error_message(),
            params: params.clone(),
        });
    }

    if expect.returns_tuples() {
        Ok(Some(res))
    } else {
        Ok(None)
    }
}

/// Format and execute a statement, checking its status.
///
/// ```ignore
/// exec_sql!(conn, ExecStatus::CommandOk, "DROP TABLE IF EXISTS {}", table)?;
/// ```
#[macro_export]
macro_rules! exec_sql {
    ($conn:expr, $expect:expr, $($arg:tt)+) => {
        $crate::exec::execute($conn, $expect, format_args!($($arg)+))
    };
}
