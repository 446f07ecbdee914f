//! Command Replies
//!
//! [`Reply`] is the uniform result of a dispatched command, the in-process
//! counterpart of a server's response. The typed API on `Store` returns plain
//! Rust values; generic dispatch and transactions convert those into a
//! `Reply` so results of different commands can sit in one `Vec`.
//!
//! Unordered results (sets, hashes) are sorted on conversion, so replies
//! compare and print deterministically.

use std::collections::{HashMap, HashSet};
use std::fmt;

/// The result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Acknowledgement with no payload (SET).
    Ok,
    /// Absent value (GET on a missing key, LPOP on an empty list).
    Nil,
    /// Counts, lengths, booleans (as 0/1) and HINCRBY results.
    Integer(i64),
    /// A single string value.
    Bulk(String),
    /// An ordered sequence (LRANGE).
    List(Vec<String>),
    /// Set members or key names, sorted.
    Set(Vec<String>),
    /// Hash contents as field/value pairs, sorted by field.
    Map(Vec<(String, String)>),
}

impl Reply {
    /// Returns the integer payload, if this is an integer reply.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a bulk reply.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Bulk(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this is the nil reply.
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Ok
    }
}

impl From<bool> for Reply {
    fn from(value: bool) -> Self {
        Reply::Integer(i64::from(value))
    }
}

impl From<i64> for Reply {
    fn from(value: i64) -> Self {
        Reply::Integer(value)
    }
}

impl From<usize> for Reply {
    fn from(value: usize) -> Self {
        Reply::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Reply::Bulk(value)
    }
}

impl From<Option<String>> for Reply {
    fn from(value: Option<String>) -> Self {
        value.map_or(Reply::Nil, Reply::Bulk)
    }
}

impl From<Vec<String>> for Reply {
    fn from(value: Vec<String>) -> Self {
        Reply::List(value)
    }
}

impl From<HashSet<String>> for Reply {
    fn from(value: HashSet<String>) -> Self {
        let mut members: Vec<String> = value.into_iter().collect();
        members.sort_unstable();
        Reply::Set(members)
    }
}

impl From<HashMap<String, String>> for Reply {
    fn from(value: HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = value.into_iter().collect();
        pairs.sort_unstable();
        Reply::Map(pairs)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(s) => write!(f, "\"{}\"", s),
            Reply::List(values) | Reply::Set(values) => write_numbered(f, values.iter()),
            Reply::Map(pairs) => write_numbered(
                f,
                pairs
                    .iter()
                    .flat_map(|(field, value)| [field, value]),
            ),
        }
    }
}

fn write_numbered<'a>(
    f: &mut fmt::Formatter<'_>,
    values: impl Iterator<Item = &'a String>,
) -> fmt::Result {
    let mut empty = true;
    for (i, value) in values.enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        write!(f, "{}) \"{}\"", i + 1, value)?;
        empty = false;
    }
    if empty {
        write!(f, "(empty array)")?;
    }
    Ok(())
}
