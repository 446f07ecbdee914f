//! Direct Command Surface
//!
//! This module implements the method-per-command API on [`Store`]. Each
//! method takes the store's lock once, checks the mode guard, and runs the
//! matching keyspace operation.
//!
//! ## Supported Commands
//!
//! ### String / Key Commands
//! - `SET key value` - Set a key, replacing any value of any kind
//! - `GET key` - Get a string value
//! - `SETNX key value` - Set only if no string is present
//! - `DEL key [key ...]` / `UNLINK key [key ...]` - Delete keys
//! - `EXISTS key` - Check whether a key holds anything
//! - `KEYS pattern` - Find keys by glob pattern
//!
//! ### List Commands
//! - `LPUSH key value [value ...]` - Push values to the head of a list
//! - `LPOP key` - Remove and return the first element
//! - `LLEN key` - Get the length of a list
//! - `LRANGE key start stop` - Get a range of elements
//!
//! ### Hash Commands
//! - `HSET key field value`, `HGET key field`, `HDEL key field [field ...]`
//! - `HINCRBY key field delta`, `HGETALL key`
//!
//! ### Set Commands
//! - `SADD key member [member ...]`, `SREM key member [member ...]`
//! - `SMEMBERS key`, `SISMEMBER key member`
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Store                          │
//! │                                                      │
//! │  ┌──────────┐    ┌──────────────┐    ┌────────────┐  │
//! │  │  lock()  │───>│  mode guard  │───>│  Keyspace  │  │
//! │  └──────────┘    └──────────────┘    │  operation │  │
//! │                                      └────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! While a transaction is open, every method here fails with
//! `TransactionModeViolation` without touching the keyspace.

use crate::commands::command::{Command, Operation};
use crate::commands::reply::Reply;
use crate::error::{KvError, KvResult};
use crate::storage::{Keyspace, Store};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

fn owned<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl Store {
    /// Runs `f` under the lock if the store is in direct mode.
    fn run<T>(&self, operation: Operation, f: impl FnOnce(&mut Keyspace) -> KvResult<T>) -> KvResult<T> {
        let mut state = self.lock_state();
        if state.in_transaction() {
            debug!(operation = %operation, "rejected direct command during transaction");
            return Err(KvError::TransactionModeViolation {
                operation: operation.as_str(),
            });
        }

        trace!(operation = %operation, "executing command");
        let result = f(&mut state.keyspace);
        if let Err(e) = &result {
            debug!(operation = %operation, error = %e, "command failed");
        }
        result
    }

    // ========================================================================
    // String / Key Commands
    // ========================================================================

    /// SET key value
    pub fn set(&self, key: &str, value: impl Into<String>) -> KvResult<()> {
        let value = value.into();
        self.run(Operation::Set, |ks| {
            ks.set(key, value);
            Ok(())
        })
    }

    /// GET key
    pub fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.run(Operation::Get, |ks| ks.get(key))
    }

    /// SETNX key value
    ///
    /// Returns `true` if the value was written.
    pub fn setnx(&self, key: &str, value: impl Into<String>) -> KvResult<bool> {
        let value = value.into();
        self.run(Operation::SetNx, |ks| ks.setnx(key, value))
    }

    /// DEL key [key ...]
    ///
    /// Returns the number of keys that existed.
    pub fn del<I>(&self, keys: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys = owned(keys);
        self.run(Operation::Del, |ks| Ok(ks.del(&keys)))
    }

    /// UNLINK key [key ...]
    ///
    /// Same as DEL; there is no background reclamation to defer to.
    pub fn unlink<I>(&self, keys: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys = owned(keys);
        self.run(Operation::Unlink, |ks| Ok(ks.del(&keys)))
    }

    /// EXISTS key
    pub fn exists(&self, key: &str) -> KvResult<bool> {
        self.run(Operation::Exists, |ks| Ok(ks.exists(key)))
    }

    /// KEYS pattern
    pub fn keys(&self, pattern: &str) -> KvResult<HashSet<String>> {
        self.run(Operation::Keys, |ks| Ok(ks.keys(pattern)))
    }

    // ========================================================================
    // List Commands
    // ========================================================================

    /// LPUSH key value [value ...]
    ///
    /// Returns the length of the list after the push.
    pub fn lpush<I>(&self, key: &str, values: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let values = owned(values);
        self.run(Operation::LPush, |ks| ks.lpush(key, values))
    }

    /// LPOP key
    pub fn lpop(&self, key: &str) -> KvResult<Option<String>> {
        self.run(Operation::LPop, |ks| ks.lpop(key))
    }

    /// LLEN key
    pub fn llen(&self, key: &str) -> KvResult<usize> {
        self.run(Operation::LLen, |ks| ks.llen(key))
    }

    /// LRANGE key start end
    pub fn lrange(&self, key: &str, start: i64, end: i64) -> KvResult<Vec<String>> {
        self.run(Operation::LRange, |ks| ks.lrange(key, start, end))
    }

    // ========================================================================
    // Hash Commands
    // ========================================================================

    /// HSET key field value
    ///
    /// Returns `true` if the field is new.
    pub fn hset(&self, key: &str, field: impl Into<String>, value: impl Into<String>) -> KvResult<bool> {
        let (field, value) = (field.into(), value.into());
        self.run(Operation::HSet, |ks| ks.hset(key, field, value))
    }

    /// HGET key field
    pub fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        self.run(Operation::HGet, |ks| ks.hget(key, field))
    }

    /// HDEL key field [field ...]
    pub fn hdel<I>(&self, key: &str, fields: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let fields = owned(fields);
        self.run(Operation::HDel, |ks| ks.hdel(key, &fields))
    }

    /// HINCRBY key field delta
    ///
    /// Atomic with respect to every other caller of this store.
    pub fn hincrby(&self, key: &str, field: &str, delta: i64) -> KvResult<i64> {
        self.run(Operation::HIncrBy, |ks| ks.hincrby(key, field, delta))
    }

    /// HGETALL key
    pub fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        self.run(Operation::HGetAll, |ks| ks.hgetall(key))
    }

    // ========================================================================
    // Set Commands
    // ========================================================================

    /// SADD key member [member ...]
    pub fn sadd<I>(&self, key: &str, members: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let members = owned(members);
        self.run(Operation::SAdd, |ks| ks.sadd(key, members))
    }

    /// SREM key member [member ...]
    pub fn srem<I>(&self, key: &str, members: I) -> KvResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let members = owned(members);
        self.run(Operation::SRem, |ks| ks.srem(key, &members))
    }

    /// SMEMBERS key
    pub fn smembers(&self, key: &str) -> KvResult<HashSet<String>> {
        self.run(Operation::SMembers, |ks| ks.smembers(key))
    }

    /// SISMEMBER key member
    pub fn sismember(&self, key: &str, member: &str) -> KvResult<bool> {
        self.run(Operation::SIsMember, |ks| ks.sismember(key, member))
    }

    // ========================================================================
    // Generic Dispatch
    // ========================================================================

    /// Executes a parsed command directly.
    pub fn execute(&self, command: Command) -> KvResult<Reply> {
        self.run(command.operation(), |ks| command.apply(ks))
    }

    /// Reports an operation this store does not implement.
    ///
    /// Layers that mirror a full client API call this from every method
    /// outside the supported set, so callers get a stable, named error.
    pub fn unsupported<T>(&self, operation: &str) -> KvResult<T> {
        debug!(operation, "unsupported operation requested");
        Err(KvError::unsupported(operation.to_ascii_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Entry, HashValue};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_get() {
        let store = Store::new();
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap(), Some("value".to_string()));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_set_replaces_other_kinds() {
        let store = Store::new();
        store.lpush("k", ["a"]).unwrap();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_push_then_pop() {
        let store = Store::new();
        assert_eq!(store.lpush("list", ["a"]).unwrap(), 1);
        assert_eq!(store.lpop("list").unwrap(), Some("a".to_string()));
        assert_eq!(store.llen("list").unwrap(), 0);
    }

    #[test]
    fn test_llen_on_hash_is_type_error() {
        let store = Store::new();
        store.hset("h", "f", "v").unwrap();
        assert!(matches!(
            store.llen("h"),
            Err(KvError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_hash_commands() {
        let store = Store::new();
        assert!(store.hset("h", "a", "1").unwrap());
        assert!(!store.hset("h", "a", "2").unwrap());
        assert_eq!(store.hget("h", "a").unwrap(), Some("2".to_string()));
        assert_eq!(store.hincrby("h", "a", 5).unwrap(), 7);
        assert_eq!(store.hdel("h", ["a", "b"]).unwrap(), 1);
        assert!(store.hgetall("h").unwrap().is_empty());
    }

    #[test]
    fn test_set_commands() {
        let store = Store::new();
        assert_eq!(store.sadd("s", ["a", "b", "a"]).unwrap(), 2);
        assert!(store.sismember("s", "a").unwrap());
        assert_eq!(store.srem("s", ["a", "z"]).unwrap(), 1);
        assert_eq!(
            store.smembers("s").unwrap(),
            HashSet::from(["b".to_string()])
        );
    }

    #[test]
    fn test_reads_do_not_create_keys() {
        let store = Store::new();
        assert!(store.smembers("s").unwrap().is_empty());
        assert_eq!(store.llen("l").unwrap(), 0);
        assert_eq!(store.lpop("l").unwrap(), None);
        assert!(store.hgetall("h").unwrap().is_empty());
        assert!(store.keys("*").unwrap().is_empty());
    }

    #[test]
    fn test_del_and_unlink() {
        let store = Store::new();
        store.set("a", "1").unwrap();
        store.sadd("b", ["m"]).unwrap();
        store.set("c", "3").unwrap();

        assert_eq!(store.del(["a", "b", "missing"]).unwrap(), 2);
        assert_eq!(store.unlink(vec!["c".to_string()]).unwrap(), 1);
        assert!(!store.exists("a").unwrap());
        assert!(!store.exists("b").unwrap());
        assert!(!store.exists("c").unwrap());
    }

    #[test]
    fn test_commands_on_fixture_keyspace() {
        let mut fixture = Keyspace::new();
        fixture.insert("h", Entry::Hash(HashValue::from([("n".to_string(), "40".to_string())])));

        let store = Store::from_keyspace(fixture);
        assert_eq!(store.hincrby("h", "n", 2).unwrap(), 42);
        assert!(matches!(
            store.lpush("h", ["x"]),
            Err(KvError::TypeMismatch { .. })
        ));
        assert_eq!(
            store
                .execute(Command::from_args(["HGET", "h", "n"]).unwrap())
                .unwrap()
                .as_str(),
            Some("42")
        );
        assert!(store
            .execute(Command::from_args(["GET", "missing"]).unwrap())
            .unwrap()
            .is_nil());
    }

    #[test]
    fn test_execute() {
        let store = Store::new();
        let reply = store
            .execute(Command::from_args(["SADD", "s", "x", "y"]).unwrap())
            .unwrap();
        assert_eq!(reply, Reply::Integer(2));

        let reply = store
            .execute(Command::from_args(["SMEMBERS", "s"]).unwrap())
            .unwrap();
        assert_eq!(reply, Reply::Set(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn test_unsupported_names_operation() {
        let store = Store::new();
        let err = store.unsupported::<()>("mget").unwrap_err();
        assert_eq!(
            err,
            KvError::Unsupported {
                operation: "MGET".into()
            }
        );
        assert!(err.to_string().contains("MGET"));
    }

    #[test]
    fn test_direct_commands_rejected_in_transaction() {
        let store = Store::new();
        store.set("k", "v").unwrap();
        store.lock_state().enter_transaction().unwrap();

        assert_eq!(
            store.get("k"),
            Err(KvError::TransactionModeViolation { operation: "GET" })
        );
        assert_eq!(
            store.set("k", "other"),
            Err(KvError::TransactionModeViolation { operation: "SET" })
        );
        assert!(store
            .execute(Command::from_args(["LLEN", "k"]).unwrap())
            .is_err());

        store.lock_state().leave_transaction();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_concurrent_hincrby() {
        let store = Arc::new(Store::new());
        store.hset("counter", "n", "0").unwrap();

        let handles: Vec<_> = [1i64, -1]
            .into_iter()
            .map(|sign| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..1000 {
                        store.hincrby("counter", "n", sign * i).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.hget("counter", "n").unwrap(), Some("0".to_string()));
    }
}
