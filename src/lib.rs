//! # mimickv - An In-Process, Type-Checked Redis Stand-In
//!
//! mimickv is an in-memory fake of a Redis subset for use in tests and
//! tooling. It keeps the same data model (strings, lists, hashes and sets
//! under string keys) and the same error behavior as the real server, but
//! runs entirely inside the calling process with no network or async runtime.
//!
//! ## Features
//!
//! - **Typed entries**: each key holds exactly one kind of value; using it as
//!   another kind fails with `TypeMismatch` instead of corrupting it
//! - **Atomic commands**: every command runs under one exclusive lock, so
//!   read-modify-write commands like HINCRBY never lose updates
//! - **Transactions**: MULTI/EXEC with typed deferred results
//! - **Mode guard**: direct commands are rejected while a transaction is open
//! - **Generic dispatch**: parse `["HSET", "k", "f", "v"]` into a [`Command`]
//!   and get back a [`Reply`]
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                              mimickv                              │
//! │                                                                   │
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────────────┐  │
//! │  │  Direct API  │   │   Command    │   │     Transaction       │  │
//! │  │ store.hset() │   │  dispatch    │   │ tx.hset() -> Response │  │
//! │  └──────┬───────┘   └──────┬───────┘   └───────────┬───────────┘  │
//! │         │                  │                       │ exec()       │
//! │         ▼                  ▼                       ▼              │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │                         Store                               │  │
//! │  │   Mutex ─┬─ Mode guard (Direct | InTransaction)             │  │
//! │  │          └─ Keyspace: key -> String | List | Hash | Set     │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use mimickv::{KvError, Store};
//!
//! let store = Store::new();
//! store.lpush("jobs", ["a", "b"]).unwrap();
//! assert_eq!(store.lrange("jobs", 0, -1).unwrap(), vec!["b", "a"]);
//!
//! // Wrong kind of value
//! assert!(matches!(store.hget("jobs", "f"), Err(KvError::TypeMismatch { .. })));
//!
//! // Transactions
//! let mut tx = store.multi().unwrap();
//! let popped = tx.lpop("jobs");
//! assert!(store.llen("jobs").is_err()); // direct calls are rejected meanwhile
//! tx.exec().unwrap();
//! assert_eq!(popped.get().unwrap(), Some("b".to_string()));
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: typed entries, the keyspace and the locked store
//! - [`commands`]: command semantics, the direct API and generic dispatch
//! - [`transaction`]: MULTI/EXEC and deferred responses
//! - [`error`]: the error type shared by all of the above
//!
//! ## Design Highlights
//!
//! ### One Lock
//!
//! The store holds a single `parking_lot::Mutex`. Reads take it too, so no
//! caller ever observes a command half-applied, and a transaction's whole
//! batch runs under one acquisition.
//!
//! ### Typed Closures Instead of Reflection
//!
//! A queued command is a closure over its owned arguments, captured when it
//! is queued. Executing a transaction is just calling them in order; there
//! is no by-name lookup at exec time.

pub mod commands;
pub mod error;
pub mod storage;
pub mod transaction;

// Re-export commonly used types for convenience
pub use commands::{Command, Operation, Reply};
pub use error::{KvError, KvResult};
pub use storage::{Keyspace, Store};
pub use transaction::{Response, Transaction};

/// Version of mimickv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
