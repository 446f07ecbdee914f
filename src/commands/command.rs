//! Generic Command Dispatch
//!
//! Turns a command line (`["HINCRBY", "user:1", "visits", "3"]`) into a typed
//! [`Command`], and applies a `Command` to a keyspace producing a [`Reply`].
//!
//! ## Parsing
//!
//! ```text
//! ["hset", "k", "f", "v"]
//!     │
//!     ▼
//! Operation::lookup("hset") ── no ──> UNSUPPORTED_COMMANDS? ── yes ──> Unsupported
//!     │ yes                                  │ no
//!     ▼                                      ▼
//! arity check ── fail ──> WrongArity      UnknownCommand
//!     │
//!     ▼
//! Command::HSet { key, field, value }
//! ```

use crate::commands::reply::Reply;
use crate::error::{KvError, KvResult};
use crate::storage::Keyspace;
use std::fmt;

/// Commands of the real server that this crate deliberately does not
/// implement. Naming one yields `Unsupported` rather than `UnknownCommand`.
const UNSUPPORTED_COMMANDS: &[&str] = &[
    // Strings
    "APPEND", "DECR", "DECRBY", "GETDEL", "GETSET", "INCR", "INCRBY", "MGET", "MSET", "PSETEX",
    "SETEX", "STRLEN",
    // Keys
    "EXPIRE", "EXPIREAT", "PERSIST", "PEXPIRE", "PTTL", "RENAME", "RENAMENX", "SCAN", "TTL", "TYPE",
    // Lists
    "BLPOP", "BRPOP", "LINDEX", "LINSERT", "LREM", "LSET", "LTRIM", "RPOP", "RPUSH",
    // Hashes
    "HEXISTS", "HKEYS", "HLEN", "HMGET", "HMSET", "HSETNX", "HVALS",
    // Sets
    "SCARD", "SDIFF", "SINTER", "SMOVE", "SPOP", "SRANDMEMBER", "SUNION",
    // Server
    "DBSIZE", "FLUSHALL", "FLUSHDB", "INFO", "PING", "WATCH",
];

/// How many arguments (after the command name) an operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

/// Tag naming every supported command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    SetNx,
    Del,
    Unlink,
    Exists,
    Keys,
    LPush,
    LPop,
    LLen,
    LRange,
    HSet,
    HGet,
    HDel,
    HIncrBy,
    HGetAll,
    SAdd,
    SRem,
    SMembers,
    SIsMember,
}

impl Operation {
    /// Every supported operation, in documentation order.
    pub const ALL: [Operation; 20] = [
        Operation::Get,
        Operation::Set,
        Operation::SetNx,
        Operation::Del,
        Operation::Unlink,
        Operation::Exists,
        Operation::Keys,
        Operation::LPush,
        Operation::LPop,
        Operation::LLen,
        Operation::LRange,
        Operation::HSet,
        Operation::HGet,
        Operation::HDel,
        Operation::HIncrBy,
        Operation::HGetAll,
        Operation::SAdd,
        Operation::SRem,
        Operation::SMembers,
        Operation::SIsMember,
    ];

    /// The upper-case command name.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Set => "SET",
            Operation::SetNx => "SETNX",
            Operation::Del => "DEL",
            Operation::Unlink => "UNLINK",
            Operation::Exists => "EXISTS",
            Operation::Keys => "KEYS",
            Operation::LPush => "LPUSH",
            Operation::LPop => "LPOP",
            Operation::LLen => "LLEN",
            Operation::LRange => "LRANGE",
            Operation::HSet => "HSET",
            Operation::HGet => "HGET",
            Operation::HDel => "HDEL",
            Operation::HIncrBy => "HINCRBY",
            Operation::HGetAll => "HGETALL",
            Operation::SAdd => "SADD",
            Operation::SRem => "SREM",
            Operation::SMembers => "SMEMBERS",
            Operation::SIsMember => "SISMEMBER",
        }
    }

    /// Finds the operation for a command name, ignoring case.
    pub fn lookup(name: &str) -> Option<Operation> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name))
    }

    fn arity(self) -> Arity {
        match self {
            Operation::Get
            | Operation::Exists
            | Operation::Keys
            | Operation::LPop
            | Operation::LLen
            | Operation::HGetAll
            | Operation::SMembers => Arity::Exact(1),
            Operation::Set | Operation::SetNx | Operation::HGet | Operation::SIsMember => {
                Arity::Exact(2)
            }
            Operation::LRange | Operation::HSet | Operation::HIncrBy => Arity::Exact(3),
            Operation::Del | Operation::Unlink => Arity::AtLeast(1),
            Operation::LPush | Operation::HDel | Operation::SAdd | Operation::SRem => {
                Arity::AtLeast(2)
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parsed command with owned arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: String },
    Set { key: String, value: String },
    SetNx { key: String, value: String },
    Del { keys: Vec<String> },
    Unlink { keys: Vec<String> },
    Exists { key: String },
    Keys { pattern: String },
    LPush { key: String, values: Vec<String> },
    LPop { key: String },
    LLen { key: String },
    LRange { key: String, start: i64, end: i64 },
    HSet { key: String, field: String, value: String },
    HGet { key: String, field: String },
    HDel { key: String, fields: Vec<String> },
    HIncrBy { key: String, field: String, delta: i64 },
    HGetAll { key: String },
    SAdd { key: String, members: Vec<String> },
    SRem { key: String, members: Vec<String> },
    SMembers { key: String },
    SIsMember { key: String, member: String },
}

impl Command {
    /// Parses a command name followed by its arguments.
    ///
    /// # Example
    ///
    /// ```
    /// use mimickv::{Command, KvError};
    ///
    /// let cmd = Command::from_args(["hincrby", "user:1", "visits", "3"]).unwrap();
    /// assert_eq!(cmd.operation().as_str(), "HINCRBY");
    ///
    /// assert!(matches!(
    ///     Command::from_args(["RPUSH", "k", "v"]),
    ///     Err(KvError::Unsupported { .. })
    /// ));
    /// ```
    pub fn from_args<I, S>(args: I) -> KvResult<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let name = args.next().ok_or_else(|| KvError::UnknownCommand {
            name: String::new(),
        })?;

        let Some(operation) = Operation::lookup(&name) else {
            let upper = name.to_ascii_uppercase();
            return Err(if UNSUPPORTED_COMMANDS.contains(&upper.as_str()) {
                KvError::unsupported(upper)
            } else {
                KvError::UnknownCommand { name }
            });
        };

        let args: Vec<String> = args.collect();
        if !operation.arity().accepts(args.len()) {
            return Err(KvError::WrongArity {
                operation: operation.as_str(),
            });
        }

        let mut args = args.into_iter();

        let command = match operation {
            Operation::Get => Command::Get { key: next(&mut args) },
            Operation::Set => Command::Set {
                key: next(&mut args),
                value: next(&mut args),
            },
            Operation::SetNx => Command::SetNx {
                key: next(&mut args),
                value: next(&mut args),
            },
            Operation::Del => Command::Del {
                keys: args.collect(),
            },
            Operation::Unlink => Command::Unlink {
                keys: args.collect(),
            },
            Operation::Exists => Command::Exists { key: next(&mut args) },
            Operation::Keys => Command::Keys { pattern: next(&mut args) },
            Operation::LPush => Command::LPush {
                key: next(&mut args),
                values: args.collect(),
            },
            Operation::LPop => Command::LPop { key: next(&mut args) },
            Operation::LLen => Command::LLen { key: next(&mut args) },
            Operation::LRange => Command::LRange {
                key: next(&mut args),
                start: parse_integer(next(&mut args))?,
                end: parse_integer(next(&mut args))?,
            },
            Operation::HSet => Command::HSet {
                key: next(&mut args),
                field: next(&mut args),
                value: next(&mut args),
            },
            Operation::HGet => Command::HGet {
                key: next(&mut args),
                field: next(&mut args),
            },
            Operation::HDel => Command::HDel {
                key: next(&mut args),
                fields: args.collect(),
            },
            Operation::HIncrBy => Command::HIncrBy {
                key: next(&mut args),
                field: next(&mut args),
                delta: parse_integer(next(&mut args))?,
            },
            Operation::HGetAll => Command::HGetAll { key: next(&mut args) },
            Operation::SAdd => Command::SAdd {
                key: next(&mut args),
                members: args.collect(),
            },
            Operation::SRem => Command::SRem {
                key: next(&mut args),
                members: args.collect(),
            },
            Operation::SMembers => Command::SMembers { key: next(&mut args) },
            Operation::SIsMember => Command::SIsMember {
                key: next(&mut args),
                member: next(&mut args),
            },
        };

        Ok(command)
    }

    /// The operation this command runs.
    pub fn operation(&self) -> Operation {
        match self {
            Command::Get { .. } => Operation::Get,
            Command::Set { .. } => Operation::Set,
            Command::SetNx { .. } => Operation::SetNx,
            Command::Del { .. } => Operation::Del,
            Command::Unlink { .. } => Operation::Unlink,
            Command::Exists { .. } => Operation::Exists,
            Command::Keys { .. } => Operation::Keys,
            Command::LPush { .. } => Operation::LPush,
            Command::LPop { .. } => Operation::LPop,
            Command::LLen { .. } => Operation::LLen,
            Command::LRange { .. } => Operation::LRange,
            Command::HSet { .. } => Operation::HSet,
            Command::HGet { .. } => Operation::HGet,
            Command::HDel { .. } => Operation::HDel,
            Command::HIncrBy { .. } => Operation::HIncrBy,
            Command::HGetAll { .. } => Operation::HGetAll,
            Command::SAdd { .. } => Operation::SAdd,
            Command::SRem { .. } => Operation::SRem,
            Command::SMembers { .. } => Operation::SMembers,
            Command::SIsMember { .. } => Operation::SIsMember,
        }
    }

    /// Runs the command against `keyspace`.
    ///
    /// The caller holds the store's lock and has checked the mode guard.
    pub(crate) fn apply(self, keyspace: &mut Keyspace) -> KvResult<Reply> {
        let reply = match self {
            Command::Get { key } => keyspace.get(&key)?.into(),
            Command::Set { key, value } => keyspace.set(&key, value).into(),
            Command::SetNx { key, value } => keyspace.setnx(&key, value)?.into(),
            Command::Del { keys } | Command::Unlink { keys } => keyspace.del(&keys).into(),
            Command::Exists { key } => keyspace.exists(&key).into(),
            Command::Keys { pattern } => keyspace.keys(&pattern).into(),
            Command::LPush { key, values } => keyspace.lpush(&key, values)?.into(),
            Command::LPop { key } => keyspace.lpop(&key)?.into(),
            Command::LLen { key } => keyspace.llen(&key)?.into(),
            Command::LRange { key, start, end } => keyspace.lrange(&key, start, end)?.into(),
            Command::HSet { key, field, value } => keyspace.hset(&key, field, value)?.into(),
            Command::HGet { key, field } => keyspace.hget(&key, &field)?.into(),
            Command::HDel { key, fields } => keyspace.hdel(&key, &fields)?.into(),
            Command::HIncrBy { key, field, delta } => {
                keyspace.hincrby(&key, &field, delta)?.into()
            }
            Command::HGetAll { key } => keyspace.hgetall(&key)?.into(),
            Command::SAdd { key, members } => keyspace.sadd(&key, members)?.into(),
            Command::SRem { key, members } => keyspace.srem(&key, &members)?.into(),
            Command::SMembers { key } => keyspace.smembers(&key)?.into(),
            Command::SIsMember { key, member } => keyspace.sismember(&key, &member)?.into(),
        };
        Ok(reply)
    }
}

/// Takes the next positional argument. Arity is checked before parsing, so
/// this never runs dry.
fn next(args: &mut std::vec::IntoIter<String>) -> String {
    args.next().unwrap_or_default()
}

fn parse_integer(value: String) -> KvResult<i64> {
    value
        .parse::<i64>()
        .map_err(|_| KvError::InvalidInteger { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Operation::lookup("hincrby"), Some(Operation::HIncrBy));
        assert_eq!(Operation::lookup("SMembers"), Some(Operation::SMembers));
        assert_eq!(Operation::lookup("nope"), None);
    }

    #[test]
    fn test_every_operation_round_trips_through_its_name() {
        for op in Operation::ALL {
            assert_eq!(Operation::lookup(op.as_str()), Some(op));
        }
    }

    #[test]
    fn test_parse_variadic() {
        let cmd = Command::from_args(["LPUSH", "queue", "a", "b", "c"]).unwrap();
        assert_eq!(
            cmd,
            Command::LPush {
                key: "queue".into(),
                values: vec!["a".into(), "b".into(), "c".into()],
            }
        );

        let cmd = Command::from_args(["del", "a", "b"]).unwrap();
        assert_eq!(
            cmd,
            Command::Del {
                keys: vec!["a".into(), "b".into()],
            }
        );
    }

    #[test]
    fn test_parse_integers() {
        let cmd = Command::from_args(["LRANGE", "l", "0", "-1"]).unwrap();
        assert_eq!(
            cmd,
            Command::LRange {
                key: "l".into(),
                start: 0,
                end: -1,
            }
        );

        let err = Command::from_args(["HINCRBY", "h", "f", "three"]).unwrap_err();
        assert_eq!(
            err,
            KvError::InvalidInteger {
                value: "three".into()
            }
        );
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            Command::from_args(["GET"]).unwrap_err(),
            KvError::WrongArity { operation: "GET" }
        );
        assert_eq!(
            Command::from_args(["SET", "k"]).unwrap_err(),
            KvError::WrongArity { operation: "SET" }
        );
        assert_eq!(
            Command::from_args(["SADD", "k"]).unwrap_err(),
            KvError::WrongArity { operation: "SADD" }
        );
        assert!(Command::from_args(["HGET", "k", "f", "extra"]).is_err());
    }

    #[test]
    fn test_unsupported_and_unknown() {
        assert_eq!(
            Command::from_args(["mget", "a", "b"]).unwrap_err(),
            KvError::Unsupported {
                operation: "MGET".into()
            }
        );
        assert_eq!(
            Command::from_args(["FROBNICATE"]).unwrap_err(),
            KvError::UnknownCommand {
                name: "FROBNICATE".into()
            }
        );
        assert!(Command::from_args(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_apply() {
        let mut keyspace = Keyspace::new();

        let reply = Command::from_args(["HINCRBY", "h", "f", "3"])
            .unwrap()
            .apply(&mut keyspace)
            .unwrap();
        assert_eq!(reply, Reply::Integer(3));

        let reply = Command::from_args(["HGET", "h", "f"])
            .unwrap()
            .apply(&mut keyspace)
            .unwrap();
        assert_eq!(reply, Reply::Bulk("3".into()));

        let reply = Command::from_args(["SET", "s", "v"])
            .unwrap()
            .apply(&mut keyspace)
            .unwrap();
        assert_eq!(reply, Reply::Ok);

        let err = Command::from_args(["LLEN", "h"])
            .unwrap()
            .apply(&mut keyspace)
            .unwrap_err();
        assert!(matches!(err, KvError::TypeMismatch { .. }));
    }
}
