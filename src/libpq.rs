//! libpq binding for [`Connection`].
//!
//! Enabled with the `libpq` feature; links against the system `libpq`.
//! [`PqConnection`] borrows a `PGconn*` that somebody else owns.
//! [`PqSession`] owns one and is meant for tools such as the CLI.

use crate::connection::{Connection, QueryResult, parse_affected_rows};
use crate::error::{ExecError, ExecResult};
use crate::status::{CopyPush, ExecStatus};
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};

#[link(name = "pq")]
unsafe extern "C" {
    fn PQconnectdb(conninfo: *const c_char) -> *mut c_void;
    fn PQstatus(conn: *const c_void) -> c_int;
    fn PQfinish(conn: *mut c_void);
    fn PQexec(conn: *mut c_void, query: *const c_char) -> *mut c_void;
    fn PQexecPrepared(
        conn: *mut c_void,
        stmt_name: *const c_char,
        n_params: c_int,
        param_values: *const *const c_char,
        param_lengths: *const c_int,
        param_formats: *const c_int,
        result_format: c_int,
    ) -> *mut c_void;
    fn PQclear(res: *mut c_void);
    fn PQresultStatus(res: *const c_void) -> c_int;
    fn PQerrorMessage(conn: *const c_void) -> *const c_char;
    fn PQputCopyData(conn: *mut c_void, buffer: *const c_char, nbytes: c_int) -> c_int;
    fn PQputCopyEnd(conn: *mut c_void, errormsg: *const c_char) -> c_int;
    fn PQgetResult(conn: *mut c_void) -> *mut c_void;
    fn PQntuples(res: *const c_void) -> c_int;
    fn PQnfields(res: *const c_void) -> c_int;
    fn PQfname(res: *const c_void, field_num: c_int) -> *const c_char;
    fn PQgetvalue(res: *const c_void, tup_num: c_int, field_num: c_int) -> *const c_char;
    fn PQgetisnull(res: *const c_void, tup_num: c_int, field_num: c_int) -> c_int;
    fn PQcmdTuples(res: *mut c_void) -> *const c_char;
}

const CONNECTION_OK: c_int = 0;
const PGRES_FATAL_ERROR: c_int = 7;

fn to_cstring(text: &str) -> ExecResult<CString> {
    CString::new(text).map_err(|_| ExecError::NulByte(text.to_string()))
}

fn last_error(conn: NonNull<c_void>) -> String {
    // SAFETY: libpq returns a NUL-terminated string owned by the connection.
    unsafe {
        let msg = PQerrorMessage(conn.as_ptr());
        if msg.is_null() {
            String::new()
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    }
}

/// Borrowed handle to a live libpq connection.
pub struct PqConnection<'a> {
    raw: NonNull<c_void>,
    _session: PhantomData<&'a mut c_void>,
}

impl<'a> PqConnection<'a> {
    /// Wrap a connection owned by someone else.
    ///
    /// # Safety
    /// `raw` must be a valid `PGconn*` that stays open, and is not used
    /// through any other path, for `'a`.
    pub unsafe fn from_raw(raw: NonNull<c_void>) -> Self {
        Self {
            raw,
            _session: PhantomData,
        }
    }

    fn as_ptr(&self) -> *mut c_void {
        self.raw.as_ptr()
    }
}

impl Connection for PqConnection<'_> {
    type Result = PqResult;

    fn exec(&mut self, sql: &str) -> ExecResult<PqResult> {
        let sql = to_cstring(sql)?;
        // SAFETY: the handle is valid for 'a and `sql` outlives the call.
        let res = unsafe { PQexec(self.as_ptr(), sql.as_ptr()) };
        Ok(PqResult::from_raw(res))
    }

    fn exec_prepared(&mut self, name: &str, params: &[Option<&str>]) -> ExecResult<PqResult> {
        let name = to_cstring(name)?;
        let owned: Vec<Option<CString>> = params
            .iter()
            .map(|p| p.map(to_cstring).transpose())
            .collect::<ExecResult<_>>()?;
        let values: Vec<*const c_char> = owned
            .iter()
            .map(|p| p.as_ref().map_or(ptr::null(), |c| c.as_ptr()))
            .collect();
        let count = c_int::try_from(values.len())
            .map_err(|_| ExecError::Connection(format!("too many parameters: {}", values.len())))?;

        // SAFETY: `values` points into `owned`, which lives across the call.
        let res = unsafe {
            PQexecPrepared(
                self.as_ptr(),
                name.as_ptr(),
                count,
                values.as_ptr(),
                ptr::null(),
                ptr::null(),
                0,
            )
        };
        Ok(PqResult::from_raw(res))
    }

    fn put_copy_data(&mut self, chunk: &[u8]) -> CopyPush {
        let Ok(len) = c_int::try_from(chunk.len()) else {
            return CopyPush::Failed;
        };
        // SAFETY: libpq copies `len` bytes out of `chunk` before returning.
        let rc = unsafe { PQputCopyData(self.as_ptr(), chunk.as_ptr().cast(), len) };
        CopyPush::from_raw(rc)
    }

    fn put_copy_end(&mut self, error: Option<&str>) -> CopyPush {
        let msg = match error.map(to_cstring).transpose() {
            Ok(msg) => msg,
            Err(_) => return CopyPush::Failed,
        };
        let msg_ptr = msg.as_ref().map_or(ptr::null(), |m| m.as_ptr());
        // SAFETY: `msg` outlives the call.
        let rc = unsafe { PQputCopyEnd(self.as_ptr(), msg_ptr) };
        CopyPush::from_raw(rc)
    }

    fn get_result(&mut self) -> Option<PqResult> {
        // SAFETY: valid handle.
        let res = unsafe { PQgetResult(self.as_ptr()) };
        NonNull::new(res).map(|raw| PqResult { raw: Some(raw) })
    }

    fn error_message(&self) -> String {
        last_error(self.raw)
    }
}

/// Owned `PGresult*`, cleared on drop.
///
/// A null result (libpq out of memory or lost connection) reports
/// [`ExecStatus::FatalError`] and has no rows.
pub struct PqResult {
    raw: Option<NonNull<c_void>>,
}

impl PqResult {
    fn from_raw(raw: *mut c_void) -> Self {
        Self {
            raw: NonNull::new(raw),
        }
    }

    fn in_range(&self, row: usize, col: usize) -> Option<(c_int, c_int)> {
        if row >= self.rows() || col >= self.columns() {
            return None;
        }
        Some((c_int::try_from(row).ok()?, c_int::try_from(col).ok()?))
    }
}

impl QueryResult for PqResult {
    fn status(&self) -> ExecStatus {
        let code = match self.raw {
            // SAFETY: non-null result owned by self.
            Some(raw) => unsafe { PQresultStatus(raw.as_ptr()) },
            None => PGRES_FATAL_ERROR,
        };
        ExecStatus::from_raw(code)
    }

    fn rows(&self) -> usize {
        self.raw
            .map(|raw| unsafe { PQntuples(raw.as_ptr()) })
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    fn columns(&self) -> usize {
        self.raw
            .map(|raw| unsafe { PQnfields(raw.as_ptr()) })
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        let raw = self.raw?;
        if col >= self.columns() {
            return None;
        }
        // SAFETY: index checked; the name lives as long as the result.
        unsafe {
            let name = PQfname(raw.as_ptr(), c_int::try_from(col).ok()?);
            if name.is_null() {
                return None;
            }
            CStr::from_ptr(name).to_str().ok()
        }
    }

    fn value(&self, row: usize, col: usize) -> Option<&str> {
        let raw = self.raw?;
        let (row, col) = self.in_range(row, col)?;
        // SAFETY: indices checked; the value lives as long as the result.
        unsafe {
            if PQgetisnull(raw.as_ptr(), row, col) != 0 {
                return None;
            }
            let value = PQgetvalue(raw.as_ptr(), row, col);
            if value.is_null() {
                return None;
            }
            CStr::from_ptr(value).to_str().ok()
        }
    }

    fn affected_rows(&self) -> Option<u64> {
        let raw = self.raw?;
        // SAFETY: the tag lives as long as the result.
        let tag = unsafe {
            let tag = PQcmdTuples(raw.as_ptr());
            if tag.is_null() {
                return None;
            }
            CStr::from_ptr(tag).to_str().ok()?
        };
        parse_affected_rows(tag)
    }
}

impl Drop for PqResult {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            // SAFETY: cleared exactly once, here.
            unsafe { PQclear(raw.as_ptr()) };
        }
    }
}

/// An owned libpq session, finished on drop.
pub struct PqSession {
    raw: NonNull<c_void>,
}

impl PqSession {
    /// Open a session from a libpq conninfo string or URI.
    pub fn connect(conninfo: &str) -> ExecResult<Self> {
        let info = to_cstring(conninfo)?;
        // SAFETY: `info` outlives the call.
        let raw = unsafe { PQconnectdb(info.as_ptr()) };
        let raw = NonNull::new(raw)
            .ok_or_else(|| ExecError::Connection("out of memory allocating PGconn".to_string()))?;
        let session = Self { raw };
        // SAFETY: valid handle.
        if unsafe { PQstatus(raw.as_ptr()) } != CONNECTION_OK {
            let msg = last_error(session.raw);
            return Err(ExecError::Connection(msg.trim_end().to_string()));
        }
        Ok(session)
    }

    /// Borrow the session as a [`Connection`].
    pub fn handle(&mut self) -> PqConnection<'_> {
        // SAFETY: the returned handle borrows `self` mutably.
        unsafe { PqConnection::from_raw(self.raw) }
    }
}

impl Drop for PqSession {
    fn drop(&mut self) {
        // SAFETY: finished exactly once, here.
        unsafe { PQfinish(self.raw.as_ptr()) };
    }
}
