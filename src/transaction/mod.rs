//! Transaction Module
//!
//! This module implements MULTI/EXEC for mimickv. [`Store::multi`] flips the
//! store's mode guard and hands back a [`Transaction`]. Commands queued on it
//! are recorded as typed closures; nothing touches the keyspace until
//! [`Transaction::exec`].
//!
//! ## Lifecycle
//!
//! ```text
//!   Store::multi()
//!        │   guard: Direct -> InTransaction
//!        ▼
//!  ┌───────────┐  queue  ┌───────────┐
//!  │  Queuing  │────────>│  Queuing  │──── Response<T> handles
//!  └─────┬─────┘         └───────────┘
//!        │
//!        ├── exec() ────> Committed   one lock for the whole batch,
//!        │                            guard back to Direct, FIFO order
//!        │
//!        └── discard() / drop ──> Discarded   guard back to Direct
//! ```
//!
//! ## Failure Semantics
//!
//! If a queued command fails during `exec`, execution stops there. Commands
//! already applied keep their effects. The failing command's handle carries
//! its error, later handles stay unresolved, and `exec` returns
//! `TransactionExecutionFault` naming the position and operation.

pub mod response;

pub use response::Response;

use crate::commands::{Command, Operation, Reply};
use crate::error::{KvError, KvResult};
use crate::storage::{Keyspace, Store};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};

type QueuedFn = Box<dyn FnOnce(&mut Keyspace) -> KvResult<Reply> + Send>;

struct QueuedCommand {
    operation: Operation,
    run: QueuedFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Queuing,
    Committed,
    Discarded,
}

/// A batch of commands applied atomically by [`Transaction::exec`].
///
/// While it exists, direct commands on the store fail with
/// `TransactionModeViolation`. Dropping it without calling `exec` discards
/// the queue.
///
/// # Example
///
/// ```
/// use mimickv::Store;
///
/// let store = Store::new();
/// let mut tx = store.multi().unwrap();
/// let first = tx.hincrby("user:1", "visits", 3);
/// let second = tx.hincrby("user:1", "visits", 4);
/// tx.exec().unwrap();
///
/// assert_eq!(first.get().unwrap(), 3);
/// assert_eq!(second.get().unwrap(), 7);
/// ```
pub struct Transaction<'a> {
    store: &'a Store,
    queued: Vec<QueuedCommand>,
    state: TransactionState,
}

impl Store {
    /// Opens a transaction on this store.
    ///
    /// Fails with `TransactionModeViolation` if one is already open.
    pub fn multi(&self) -> KvResult<Transaction<'_>> {
        self.lock_state().enter_transaction()?;
        debug!("transaction opened");
        Ok(Transaction {
            store: self,
            queued: Vec::new(),
            state: TransactionState::Queuing,
        })
    }
}

impl<'a> Transaction<'a> {
    /// Records `f` and returns the handle its result will land in.
    fn enqueue<T, F>(&mut self, operation: Operation, f: F) -> Response<T>
    where
        T: Clone + Into<Reply> + Send + Sync + 'static,
        F: FnOnce(&mut Keyspace) -> KvResult<T> + Send + 'static,
    {
        let response = Response::pending(operation);
        let slot = response.clone();
        trace!(operation = %operation, position = self.queued.len(), "command queued");
        self.queued.push(QueuedCommand {
            operation,
            run: Box::new(move |keyspace: &mut Keyspace| {
                let result = f(keyspace);
                slot.resolve(result.clone());
                result.map(Into::into)
            }),
        });
        response
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Returns true if nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    // ========================================================================
    // String / Key Commands
    // ========================================================================

    /// SET key value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Response<()> {
        let (key, value) = (key.into(), value.into());
        self.enqueue(Operation::Set, move |ks| {
            ks.set(&key, value);
            Ok(())
        })
    }

    /// GET key
    pub fn get(&mut self, key: impl Into<String>) -> Response<Option<String>> {
        let key = key.into();
        self.enqueue(Operation::Get, move |ks| ks.get(&key))
    }

    /// SETNX key value
    pub fn setnx(&mut self, key: impl Into<String>, value: impl Into<String>) -> Response<bool> {
        let (key, value) = (key.into(), value.into());
        self.enqueue(Operation::SetNx, move |ks| ks.setnx(&key, value))
    }

    /// DEL key [key ...]
    pub fn del<I>(&mut self, keys: I) -> Response<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.enqueue(Operation::Del, move |ks| Ok(ks.del(&keys)))
    }

    /// UNLINK key [key ...]
    pub fn unlink<I>(&mut self, keys: I) -> Response<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.enqueue(Operation::Unlink, move |ks| Ok(ks.del(&keys)))
    }

    /// EXISTS key
    pub fn exists(&mut self, key: impl Into<String>) -> Response<bool> {
        let key = key.into();
        self.enqueue(Operation::Exists, move |ks| Ok(ks.exists(&key)))
    }

    /// KEYS pattern
    pub fn keys(&mut self, pattern: impl Into<String>) -> Response<HashSet<String>> {
        let pattern = pattern.into();
        self.enqueue(Operation::Keys, move |ks| Ok(ks.keys(&pattern)))
    }

    // ========================================================================
    // List Commands
    // ========================================================================

    /// LPUSH key value [value ...]
    pub fn lpush<I>(&mut self, key: impl Into<String>, values: I) -> Response<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.enqueue(Operation::LPush, move |ks| ks.lpush(&key, values))
    }

    /// LPOP key
    pub fn lpop(&mut self, key: impl Into<String>) -> Response<Option<String>> {
        let key = key.into();
        self.enqueue(Operation::LPop, move |ks| ks.lpop(&key))
    }

    /// LLEN key
    pub fn llen(&mut self, key: impl Into<String>) -> Response<usize> {
        let key = key.into();
        self.enqueue(Operation::LLen, move |ks| ks.llen(&key))
    }

    /// LRANGE key start end
    pub fn lrange(&mut self, key: impl Into<String>, start: i64, end: i64) -> Response<Vec<String>> {
        let key = key.into();
        self.enqueue(Operation::LRange, move |ks| ks.lrange(&key, start, end))
    }

    // ========================================================================
    // Hash Commands
    // ========================================================================

    /// HSET key field value
    pub fn hset(
        &mut self,
        key: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Response<bool> {
        let (key, field, value) = (key.into(), field.into(), value.into());
        self.enqueue(Operation::HSet, move |ks| ks.hset(&key, field, value))
    }

    /// HGET key field
    pub fn hget(&mut self, key: impl Into<String>, field: impl Into<String>) -> Response<Option<String>> {
        let (key, field) = (key.into(), field.into());
        self.enqueue(Operation::HGet, move |ks| ks.hget(&key, &field))
    }

    /// HDEL key field [field ...]
    pub fn hdel<I>(&mut self, key: impl Into<String>, fields: I) -> Response<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let key = key.into();
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.enqueue(Operation::HDel, move |ks| ks.hdel(&key, &fields))
    }

    /// HINCRBY key field delta
    pub fn hincrby(&mut self, key: impl Into<String>, field: impl Into<String>, delta: i64) -> Response<i64> {
        let (key, field) = (key.into(), field.into());
        self.enqueue(Operation::HIncrBy, move |ks| ks.hincrby(&key, &field, delta))
    }

    /// HGETALL key
    pub fn hgetall(&mut self, key: impl Into<String>) -> Response<HashMap<String, String>> {
        let key = key.into();
        self.enqueue(Operation::HGetAll, move |ks| ks.hgetall(&key))
    }

    // ========================================================================
    // Set Commands
    // ========================================================================

    /// SADD key member [member ...]
    pub fn sadd<I>(&mut self, key: impl Into<String>, members: I) -> Response<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let key = key.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        self.enqueue(Operation::SAdd, move |ks| ks.sadd(&key, members))
    }

    /// SREM key member [member ...]
    pub fn srem<I>(&mut self, key: impl Into<String>, members: I) -> Response<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let key = key.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        self.enqueue(Operation::SRem, move |ks| ks.srem(&key, &members))
    }

    /// SMEMBERS key
    pub fn smembers(&mut self, key: impl Into<String>) -> Response<HashSet<String>> {
        let key = key.into();
        self.enqueue(Operation::SMembers, move |ks| ks.smembers(&key))
    }

    /// SISMEMBER key member
    pub fn sismember(&mut self, key: impl Into<String>, member: impl Into<String>) -> Response<bool> {
        let (key, member) = (key.into(), member.into());
        self.enqueue(Operation::SIsMember, move |ks| ks.sismember(&key, &member))
    }

    // ========================================================================
    // Generic Dispatch
    // ========================================================================

    /// Queues a parsed command.
    pub fn queue(&mut self, command: Command) -> Response<Reply> {
        self.enqueue(command.operation(), move |ks| command.apply(ks))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Runs every queued command in order under a single lock acquisition.
    ///
    /// Returns the replies in queue order. The store is back in direct mode
    /// afterwards, whether or not a command failed.
    pub fn exec(mut self) -> KvResult<Vec<Reply>> {
        let queued = std::mem::take(&mut self.queued);
        self.state = TransactionState::Committed;
        debug!(commands = queued.len(), "executing transaction");

        let mut state = self.store.lock_state();
        state.leave_transaction();

        let mut replies = Vec::with_capacity(queued.len());
        for (index, command) in queued.into_iter().enumerate() {
            let operation = command.operation;
            match (command.run)(&mut state.keyspace) {
                Ok(reply) => replies.push(reply),
                Err(source) => {
                    warn!(
                        index,
                        operation = %operation,
                        error = %source,
                        "transaction aborted"
                    );
                    return Err(KvError::TransactionExecutionFault {
                        index,
                        operation: operation.as_str(),
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(replies)
    }

    /// Drops the queue without running anything.
    pub fn discard(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.state != TransactionState::Queuing {
            return;
        }
        self.state = TransactionState::Discarded;
        self.store.lock_state().leave_transaction();
        debug!(commands = self.queued.len(), "transaction discarded");
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operations: Vec<Operation> = self.queued.iter().map(|c| c.operation).collect();
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("queued", &operations)
            .finish()
    }
}
