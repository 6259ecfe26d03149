//! In-memory connection used by the integration tests.

#![allow(dead_code)]

use pgexec::{Connection, CopyPush, ExecResult, ExecStatus, QueryResult};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Scripted reply to one statement.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: ExecStatus,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    pub tag: Option<String>,
    pub error: Option<String>,
}

impl Reply {
    pub fn status(status: ExecStatus) -> Self {
        Self {
            status,
            columns: Vec::new(),
            rows: Vec::new(),
            tag: None,
            error: None,
        }
    }

    pub fn command(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::status(ExecStatus::CommandOk)
        }
    }

    pub fn tuples(columns: &[&str], rows: &[&[Option<&str>]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
            ..Self::status(ExecStatus::TuplesOk)
        }
    }

    pub fn fatal(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::status(ExecStatus::FatalError)
        }
    }
}

/// What the connection was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exec(String),
    Prepared(String, Vec<Option<String>>),
    CopyData(Vec<u8>),
    CopyEnd,
}

#[derive(Debug)]
pub struct MockResult {
    reply: Reply,
    live: Rc<Cell<usize>>,
}

impl QueryResult for MockResult {
    fn status(&self) -> ExecStatus {
        self.reply.status
    }

    fn rows(&self) -> usize {
        self.reply.rows.len()
    }

    fn columns(&self) -> usize {
        self.reply.columns.len()
    }

    fn column_name(&self, col: usize) -> Option<&str> {
        self.reply.columns.get(col).map(String::as_str)
    }

    fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.reply.rows.get(row)?.get(col)?.as_deref()
    }

    fn affected_rows(&self) -> Option<u64> {
        pgexec::connection::parse_affected_rows(self.reply.tag.as_deref()?)
    }
}

impl Drop for MockResult {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Default)]
pub struct MockConnection {
    replies: VecDeque<Reply>,
    pending: VecDeque<Reply>,
    copy_pushes: VecDeque<CopyPush>,
    pub calls: RefCell<Vec<Call>>,
    live: Rc<Cell<usize>>,
    error: String,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the reply for the next `exec` / `exec_prepared`.
    pub fn reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }

    /// Queue a result handed out by `get_result` after COPY ends.
    pub fn pending(mut self, reply: Reply) -> Self {
        self.pending.push_back(reply);
        self
    }

    /// Queue the outcome of the next copy push (data or end).
    pub fn copy_push(mut self, push: CopyPush) -> Self {
        self.copy_pushes.push_back(push);
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = message.to_string();
        self
    }

    /// Results handed out and not yet dropped.
    pub fn live_results(&self) -> usize {
        self.live.get()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn answer(&mut self, reply: Option<Reply>) -> MockResult {
        let reply = reply.unwrap_or_else(|| Reply::fatal("no reply scripted\n"));
        if let Some(err) = &reply.error {
            self.error = err.clone();
        }
        self.live.set(self.live.get() + 1);
        MockResult {
            reply,
            live: Rc::clone(&self.live),
        }
    }

    fn next_push(&mut self) -> CopyPush {
        let push = self.copy_pushes.pop_front().unwrap_or(CopyPush::Accepted);
        if push == CopyPush::Failed && self.error.is_empty() {
            self.error = "no COPY in progress\n".to_string();
        }
        push
    }
}

impl Connection for MockConnection {
    type Result = MockResult;

    fn exec(&mut self, sql: &str) -> ExecResult<MockResult> {
        if sql.contains('\0') {
            return Err(pgexec::ExecError::NulByte(sql.to_string()));
        }
        self.calls.borrow_mut().push(Call::Exec(sql.to_string()));
        let reply = self.replies.pop_front();
        Ok(self.answer(reply))
    }

    fn exec_prepared(&mut self, name: &str, params: &[Option<&str>]) -> ExecResult<MockResult> {
        self.calls.borrow_mut().push(Call::Prepared(
            name.to_string(),
            params.iter().map(|p| p.map(str::to_string)).collect(),
        ));
        let reply = self.replies.pop_front();
        Ok(self.answer(reply))
    }

    fn put_copy_data(&mut self, chunk: &[u8]) -> CopyPush {
        self.calls.borrow_mut().push(Call::CopyData(chunk.to_vec()));
        self.next_push()
    }

    fn put_copy_end(&mut self, _error: Option<&str>) -> CopyPush {
        self.calls.borrow_mut().push(Call::CopyEnd);
        self.next_push()
    }

    fn get_result(&mut self) -> Option<MockResult> {
        let reply = self.pending.pop_front()?;
        Some(self.answer(Some(reply)))
    }

    fn error_message(&self) -> String {
        self.error.clone()
    }
}
