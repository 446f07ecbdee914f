//! Storage Module
//!
//! This module provides the typed keyspace and the [`Store`] that guards it.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                    Store                      │
//! │        one exclusive lock + mode guard        │
//! └──────────────────────┬────────────────────────┘
//!                        │
//!                        ▼
//! ┌───────────────────────────────────────────────┐
//! │                  Keyspace                     │
//! │   "a" -> String   "b" -> List   "c" -> Hash   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Typed entries**: a key holds one of string, list, hash or set
//! - **Type enforcement**: commands on the wrong kind fail with `TypeMismatch`
//! - **Lazy creation**: write commands create an empty entry on first use
//! - **Glob matching**: anchored patterns for the KEYS command
//!
//! ## Example
//!
//! ```
//! use mimickv::storage::{Keyspace, ListValue};
//!
//! let mut keyspace = Keyspace::new();
//! keyspace
//!     .get_or_create_typed::<ListValue>("queue")
//!     .unwrap()
//!     .push_front("job".to_string());
//!
//! assert!(keyspace.exists("queue"));
//! assert!(keyspace.get_typed::<String>("queue").is_err());
//! ```

pub mod engine;
pub mod entry;
pub mod glob;

// Re-export commonly used types
pub use engine::{Keyspace, Store};
pub use entry::{Entry, EntryKind, EntryValue, HashValue, ListValue, SetValue};
pub use glob::GlobPattern;
