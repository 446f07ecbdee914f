//! Error Types
//!
//! Every failure mode of the store is a variant of [`KvError`]. Commands never
//! panic on bad input and never log-and-swallow: the error is handed back to
//! the caller, who can branch on the variant.
//!
//! Messages for the data errors match what a real server would answer
//! (`WRONGTYPE ...`, `ERR hash value is not an integer`), so tests written
//! against this crate read the same as tests against the real thing.

use crate::storage::EntryKind;
use thiserror::Error;

/// Errors returned by store, transaction and dispatch operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The key holds a value of another kind than the command works on.
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    TypeMismatch {
        key: String,
        expected: EntryKind,
        found: EntryKind,
    },

    /// HINCRBY on a field whose current value is not a base-10 integer.
    #[error("ERR hash value is not an integer")]
    NotAnInteger { key: String, field: String },

    /// HINCRBY would leave the i64 range.
    #[error("ERR increment or decrement would overflow")]
    IncrementOverflow { key: String, field: String },

    /// A direct command was issued while a transaction is open on the store.
    #[error("cannot run {operation} while a transaction is open; queue it on the transaction instead")]
    TransactionModeViolation { operation: &'static str },

    /// A transaction response was read before its command ran, either because
    /// the transaction has not been executed or because it aborted earlier.
    #[error("the result of {operation} is not available: the command has not been executed")]
    ResultNotReady { operation: &'static str },

    /// The command exists in the real server but is not implemented here.
    #[error("the operation {operation} is not supported by mimickv")]
    Unsupported { operation: String },

    /// A queued command failed while the transaction was being executed.
    #[error("transaction aborted at command #{index} ({operation}): {source}")]
    TransactionExecutionFault {
        index: usize,
        operation: &'static str,
        source: Box<KvError>,
    },

    /// A command was given the wrong number of arguments.
    #[error("ERR wrong number of arguments for '{operation}' command")]
    WrongArity { operation: &'static str },

    /// An argument that must be an integer could not be parsed.
    #[error("ERR value is not an integer or out of range: '{value}'")]
    InvalidInteger { value: String },

    /// The command name is not known at all.
    #[error("ERR unknown command '{name}'")]
    UnknownCommand { name: String },

    /// A console line ended inside a quoted argument.
    #[error("ERR unbalanced quotes in request")]
    UnbalancedQuotes,
}

impl KvError {
    pub(crate) fn type_mismatch(key: &str, expected: EntryKind, found: EntryKind) -> Self {
        KvError::TypeMismatch {
            key: key.to_string(),
            expected,
            found,
        }
    }

    /// Builds the error reported for an operation outside the supported surface.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        KvError::Unsupported {
            operation: operation.into(),
        }
    }

    /// Returns true for errors caused by the caller misusing the API rather
    /// than by the data it operated on.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            KvError::TransactionModeViolation { .. } | KvError::ResultNotReady { .. }
        )
    }
}

/// Result type for store operations.
pub type KvResult<T> = Result<T, KvError>;
