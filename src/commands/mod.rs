//! Command Module
//!
//! This module implements the command layer of mimickv: the semantics of
//! every supported command, the direct method-per-command API on `Store`,
//! and generic dispatch through [`Command`] and [`Reply`].
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   │                         ["HSET", "k", "f", "v"]
//!   │                                   │
//!   │                                   ▼
//!   │                         ┌──────────────────┐
//!   │                         │ Command parsing  │  (command.rs)
//!   │                         └────────┬─────────┘
//!   ▼                                  ▼
//! ┌─────────────────────────────────────────────┐
//! │ Store direct API / Store::execute           │  (handler.rs)
//! │  - lock                                     │
//! │  - mode guard                               │
//! └────────────────────┬────────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────────┐
//! │ Keyspace operations                         │  (ops.rs)
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - Strings and keys: `SET`, `GET`, `SETNX`, `DEL`, `UNLINK`, `EXISTS`, `KEYS`
//! - Lists: `LPUSH`, `LPOP`, `LLEN`, `LRANGE`
//! - Hashes: `HSET`, `HGET`, `HDEL`, `HINCRBY`, `HGETALL`
//! - Sets: `SADD`, `SREM`, `SMEMBERS`, `SISMEMBER`

pub mod command;
pub mod handler;
mod ops;
pub mod reply;

pub use command::{Command, Operation};
pub use reply::Reply;
