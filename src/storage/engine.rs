//! Keyspace and Store
//!
//! This module implements the core storage of mimickv: a map from key to
//! typed [`Entry`], and the [`Store`] that owns it behind one exclusive lock.
//!
//! ## Design Decisions
//!
//! 1. **One lock for everything**: every command, read or write, holds the
//!    store's mutex for its whole duration. Compound commands such as
//!    HINCRBY are therefore atomic, and a transaction's batch is applied
//!    without any other caller observing a partial state.
//! 2. **Typed access**: commands ask the keyspace for a payload type
//!    (`ListValue`, `HashValue`, ...) rather than an untyped entry. A key that
//!    holds another variant yields `TypeMismatch` and nothing is touched.
//! 3. **Mode guard inside the lock**: whether a transaction is open is part
//!    of the locked state, so checking it and running the command can never
//!    race.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Store                     │
//! │  ┌────────────────────────────────────────┐  │
//! │  │         Mutex<StoreState>              │  │
//! │  │  ┌──────────────┐  ┌───────────────┐   │  │
//! │  │  │   Keyspace   │  │     Mode      │   │  │
//! │  │  │ key -> Entry │  │ Direct | InTx │   │  │
//! │  │  └──────────────┘  └───────────────┘   │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

use crate::error::{KvError, KvResult};
use crate::storage::entry::{Entry, EntryKind, EntryValue};
use crate::storage::glob::GlobPattern;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{HashMap, HashSet};

/// The key → entry table.
///
/// A keyspace does no locking of its own; the [`Store`] wraps it in a mutex.
#[derive(Debug, Default, Clone)]
pub struct Keyspace {
    entries: HashMap<String, Entry>,
}

impl Keyspace {
    /// Creates an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload at `key` if it is of type `V`.
    ///
    /// Returns `Ok(None)` for a missing key and `TypeMismatch` if the key
    /// holds another variant.
    pub fn get_typed<V: EntryValue>(&self, key: &str) -> KvResult<Option<&V>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(entry) => V::from_entry(entry)
                .map(Some)
                .ok_or_else(|| KvError::type_mismatch(key, V::KIND, entry.kind())),
        }
    }

    /// Mutable variant of [`Keyspace::get_typed`].
    pub fn get_typed_mut<V: EntryValue>(&mut self, key: &str) -> KvResult<Option<&mut V>> {
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(entry) => {
                let found = entry.kind();
                V::from_entry_mut(entry)
                    .map(Some)
                    .ok_or_else(|| KvError::type_mismatch(key, V::KIND, found))
            }
        }
    }

    /// Returns the payload at `key`, inserting an empty `V` if the key is
    /// missing.
    pub fn get_or_create_typed<V: EntryValue + Default>(&mut self, key: &str) -> KvResult<&mut V> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| V::default().into_entry());
        let found = entry.kind();
        V::from_entry_mut(entry).ok_or_else(|| KvError::type_mismatch(key, V::KIND, found))
    }

    /// Stores `entry` at `key`, replacing whatever was there.
    ///
    /// Returns the previous entry, of any variant.
    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(key.into(), entry)
    }

    /// Removes the entry at `key`.
    ///
    /// Returns `true` if there was one.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Checks whether `key` holds an entry of any variant.
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the variant held at `key`, if any.
    pub fn kind_of(&self, key: &str) -> Option<EntryKind> {
        self.entries.get(key).map(Entry::kind)
    }

    /// Returns every key matching the glob `pattern`.
    ///
    /// The match is anchored to the whole key. See [`GlobPattern`] for the
    /// supported syntax.
    pub fn keys_matching(&self, pattern: &str) -> HashSet<String> {
        let pattern = GlobPattern::new(pattern);
        self.entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether direct commands are currently allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Commands may be invoked on the store directly.
    Direct,
    /// A transaction is open; only its `exec` may touch the keyspace.
    InTransaction,
}

/// Everything the store's lock protects.
#[derive(Debug)]
pub(crate) struct StoreState {
    pub(crate) keyspace: Keyspace,
    mode: Mode,
}

impl StoreState {
    pub(crate) fn in_transaction(&self) -> bool {
        self.mode == Mode::InTransaction
    }

    /// Switches to `InTransaction`. Fails if a transaction is already open.
    pub(crate) fn enter_transaction(&mut self) -> KvResult<()> {
        if self.in_transaction() {
            return Err(KvError::TransactionModeViolation { operation: "MULTI" });
        }
        self.mode = Mode::InTransaction;
        Ok(())
    }

    pub(crate) fn leave_transaction(&mut self) {
        self.mode = Mode::Direct;
    }
}

/// The main store.
///
/// Owns the keyspace and serializes every access to it. Share it between
/// threads with an `Arc`.
///
/// # Example
///
/// ```
/// use mimickv::Store;
///
/// let store = Store::new();
/// store.hset("user:1", "visits", "4").unwrap();
/// assert_eq!(store.hincrby("user:1", "visits", 3).unwrap(), 7);
/// ```
pub struct Store {
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Store");
        match self.state.try_lock() {
            Some(state) => debug
                .field("keys", &state.keyspace.len())
                .field("mode", &state.mode),
            None => debug.field("state", &"<locked>"),
        };
        debug.finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store in direct mode.
    pub fn new() -> Self {
        Self::from_keyspace(Keyspace::new())
    }

    /// Creates a store pre-populated with `keyspace`.
    pub fn from_keyspace(keyspace: Keyspace) -> Self {
        Self {
            state: Mutex::new(StoreState {
                keyspace,
                mode: Mode::Direct,
            }),
        }
    }

    /// Acquires the store's lock. The guard releases it on drop.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock()
    }

    /// Returns true while a transaction is open on this store.
    pub fn in_transaction(&self) -> bool {
        self.lock_state().in_transaction()
    }

    /// Returns a copy of the whole keyspace.
    ///
    /// Fails with `TransactionModeViolation` while a transaction is open,
    /// like any other direct read.
    pub fn snapshot(&self) -> KvResult<Keyspace> {
        let state = self.lock_state();
        if state.in_transaction() {
            return Err(KvError::TransactionModeViolation {
                operation: "SNAPSHOT",
            });
        }
        Ok(state.keyspace.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::entry::{HashValue, ListValue, SetValue};

    #[test]
    fn test_get_typed_missing_key() {
        let keyspace = Keyspace::new();
        assert_eq!(keyspace.get_typed::<ListValue>("nope"), Ok(None));
    }

    #[test]
    fn test_get_typed_wrong_kind() {
        let mut keyspace = Keyspace::new();
        keyspace.insert("k", Entry::String("v".into()));

        let err = keyspace.get_typed::<HashValue>("k").unwrap_err();
        assert_eq!(
            err,
            KvError::TypeMismatch {
                key: "k".into(),
                expected: EntryKind::Hash,
                found: EntryKind::String,
            }
        );
    }

    #[test]
    fn test_get_or_create_inserts_empty_value() {
        let mut keyspace = Keyspace::new();

        let list = keyspace.get_or_create_typed::<ListValue>("l").unwrap();
        assert!(list.is_empty());
        list.push_front("a".into());

        assert!(keyspace.exists("l"));
        assert_eq!(keyspace.kind_of("l"), Some(EntryKind::List));
        assert_eq!(keyspace.get_typed::<ListValue>("l").unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_get_or_create_does_not_clobber_other_kind() {
        let mut keyspace = Keyspace::new();
        keyspace.insert("k", Entry::Set(SetValue::from(["m".to_string()])));

        assert!(keyspace.get_or_create_typed::<HashValue>("k").is_err());
        assert_eq!(keyspace.kind_of("k"), Some(EntryKind::Set));
    }

    #[test]
    fn test_delete() {
        let mut keyspace = Keyspace::new();
        keyspace.insert("k", Entry::String("v".into()));

        assert!(keyspace.delete("k"));
        assert!(!keyspace.exists("k"));
        assert!(!keyspace.delete("k"));
    }

    #[test]
    fn test_keys_matching() {
        let mut keyspace = Keyspace::new();
        for key in ["test", "testing", "other"] {
            keyspace.insert(key, Entry::String("v".into()));
        }

        let keys = keyspace.keys_matching("test*");
        assert_eq!(
            keys,
            HashSet::from(["test".to_string(), "testing".to_string()])
        );
        assert_eq!(keyspace.keys_matching("*").len(), 3);
        assert!(keyspace.keys_matching("nothing*").is_empty());
    }

    #[test]
    fn test_mode_transitions() {
        let store = Store::new();
        assert!(!store.in_transaction());

        store.lock_state().enter_transaction().unwrap();
        assert!(store.in_transaction());
        assert!(store.lock_state().enter_transaction().is_err());
        assert!(store.snapshot().is_err());

        store.lock_state().leave_transaction();
        assert!(!store.in_transaction());
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_store_from_fixture_keyspace() {
        let mut fixture = Keyspace::new();
        fixture.insert("name", Entry::String("mimic".into()));
        fixture.insert(
            "queue",
            Entry::List(ListValue::from(vec!["a".to_string(), "b".to_string()])),
        );

        let store = Store::from_keyspace(fixture);
        assert!(!store.in_transaction());

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.kind_of("name"), Some(EntryKind::String));
        assert_eq!(
            snapshot.get_typed::<ListValue>("queue").unwrap().map(|l| l.len()),
            Some(2)
        );
    }

    #[test]
    fn test_debug_does_not_deadlock() {
        let store = Store::new();
        let _guard = store.lock_state();
        assert!(format!("{:?}", store).contains("<locked>"));
    }
}
