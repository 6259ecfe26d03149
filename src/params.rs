//! Positional text parameters for prepared statements.

use std::fmt;

/// Ordered list of text-encoded parameters; `None` is SQL NULL.
///
/// The length is not checked against the statement's declared parameter
/// count here, the server rejects mismatches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<Option<String>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text value.
    pub fn push(&mut self, value: impl Into<String>) -> &mut Self {
        self.values.push(Some(value.into()));
        self
    }

    /// Append SQL NULL.
    pub fn push_null(&mut self) -> &mut Self {
        self.values.push(None);
        self
    }

    /// Builder-style [`Params::push`].
    pub fn with(mut self, value: impl Into<String>) -> Self {
        self.push(value);
        self
    }

    /// Builder-style [`Params::push_null`].
    pub fn with_null(mut self) -> Self {
        self.push_null();
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrowed view handed to [`Connection::exec_prepared`](crate::Connection::exec_prepared).
    pub fn as_refs(&self) -> Vec<Option<&str>> {
        self.values.iter().map(|v| v.as_deref()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.values.iter().map(|v| v.as_deref())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Some(v) => f.write_str(v)?,
                None => f.write_str("NULL")?,
            }
        }
        Ok(())
    }
}

impl From<Vec<Option<String>>> for Params {
    fn from(values: Vec<Option<String>>) -> Self {
        Self { values }
    }
}

impl From<Vec<String>> for Params {
    fn from(values: Vec<String>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }
}

impl<'a> From<&[Option<&'a str>]> for Params {
    fn from(values: &[Option<&'a str>]) -> Self {
        Self {
            values: values.iter().map(|v| v.map(str::to_string)).collect(),
        }
    }
}

impl<T: Into<String>> FromIterator<Option<T>> for Params {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|v| v.map(Into::into)).collect(),
        }
    }
}
