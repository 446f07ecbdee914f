//! Deferred results of queued commands.

use crate::commands::Operation;
use crate::error::{KvError, KvResult};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Handle to the result of a command queued on a transaction.
///
/// The handle is filled in when the transaction executes. Reading it before
/// that fails with `ResultNotReady`. Clones share the same slot.
pub struct Response<T> {
    operation: Operation,
    slot: Arc<OnceLock<KvResult<T>>>,
}

impl<T> Response<T> {
    pub(crate) fn pending(operation: Operation) -> Self {
        Self {
            operation,
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Stores the outcome. Only the first call has any effect.
    pub(crate) fn resolve(&self, result: KvResult<T>) {
        let _ = self.slot.set(result);
    }

    /// The operation this handle belongs to.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns true once the transaction has run this command.
    pub fn is_ready(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl<T: Clone> Response<T> {
    /// Returns the command's result.
    ///
    /// `ResultNotReady` while the command has not run: before the
    /// transaction is executed, or for good if an earlier command aborted
    /// it. If the command itself failed during execution, that error is
    /// returned.
    pub fn get(&self) -> KvResult<T> {
        match self.slot.get() {
            Some(result) => result.clone(),
            None => Err(KvError::ResultNotReady {
                operation: self.operation.as_str(),
            }),
        }
    }
}

impl<T> Clone for Response<T> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation,
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("operation", &self.operation)
            .field("result", &self.slot.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_until_resolved() {
        let response = Response::<i64>::pending(Operation::HIncrBy);
        assert!(!response.is_ready());
        assert_eq!(
            response.get(),
            Err(KvError::ResultNotReady {
                operation: "HINCRBY"
            })
        );

        response.resolve(Ok(3));
        assert!(response.is_ready());
        assert_eq!(response.get(), Ok(3));
    }

    #[test]
    fn test_clones_share_the_slot() {
        let response = Response::<String>::pending(Operation::Get);
        let copy = response.clone();

        response.resolve(Ok("v".to_string()));
        assert_eq!(copy.get(), Ok("v".to_string()));

        // Later resolutions are ignored.
        copy.resolve(Ok("other".to_string()));
        assert_eq!(response.get(), Ok("v".to_string()));
    }
}
