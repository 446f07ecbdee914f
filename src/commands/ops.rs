//! Command Semantics
//!
//! Every supported command is implemented here as a method on [`Keyspace`].
//! These methods do no locking and no mode checks: callers (the direct
//! surface on `Store` and the transaction engine) hold the store's lock and
//! have already checked the mode guard.
//!
//! Reads hand back owned copies. Nothing returned from here borrows the
//! keyspace, so nothing a caller holds can change the store behind the lock's
//! back.

use crate::error::{KvError, KvResult};
use crate::storage::{Entry, HashValue, Keyspace, ListValue, SetValue};
use std::collections::{HashMap, HashSet};

impl Keyspace {
    // ========================================================================
    // String Commands
    // ========================================================================

    /// SET key value
    ///
    /// Replaces any entry at `key`, whatever its kind.
    pub(crate) fn set(&mut self, key: &str, value: String) {
        self.insert(key, Entry::String(value));
    }

    /// GET key
    pub(crate) fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.get_typed::<String>(key)?.cloned())
    }

    /// SETNX key value
    ///
    /// Writes only when the key holds no string. A key of another kind is a
    /// type error, not a "no".
    pub(crate) fn setnx(&mut self, key: &str, value: String) -> KvResult<bool> {
        if self.get_typed::<String>(key)?.is_some() {
            return Ok(false);
        }
        self.set(key, value);
        Ok(true)
    }

    /// DEL key [key ...]
    pub(crate) fn del(&mut self, keys: &[String]) -> usize {
        keys.iter().filter(|key| self.delete(key)).count()
    }

    /// KEYS pattern
    pub(crate) fn keys(&self, pattern: &str) -> HashSet<String> {
        self.keys_matching(pattern)
    }

    // ========================================================================
    // List Commands
    // ========================================================================

    /// LPUSH key value [value ...]
    ///
    /// Each value in turn becomes the new head, so `LPUSH k a b c` leaves
    /// `c, b, a`. Returns the length after the push.
    pub(crate) fn lpush(&mut self, key: &str, values: Vec<String>) -> KvResult<usize> {
        let list = self.get_or_create_typed::<ListValue>(key)?;
        for value in values {
            list.push_front(value);
        }
        Ok(list.len())
    }

    /// LPOP key
    pub(crate) fn lpop(&mut self, key: &str) -> KvResult<Option<String>> {
        Ok(self
            .get_typed_mut::<ListValue>(key)?
            .and_then(|list| list.pop_front()))
    }

    /// LLEN key
    pub(crate) fn llen(&self, key: &str) -> KvResult<usize> {
        Ok(self.get_typed::<ListValue>(key)?.map_or(0, |list| list.len()))
    }

    /// LRANGE key start end
    ///
    /// `end` is inclusive. Negative indices count from the tail (`-1` is the
    /// last element). Out-of-range indices are clamped, never an error.
    pub(crate) fn lrange(&self, key: &str, start: i64, end: i64) -> KvResult<Vec<String>> {
        let Some(list) = self.get_typed::<ListValue>(key)? else {
            return Ok(Vec::new());
        };

        let (start, end) = match range_bounds(list.len(), start, end) {
            Some(bounds) => bounds,
            None => return Ok(Vec::new()),
        };

        Ok(list.range(start..end).cloned().collect())
    }

    // ========================================================================
    // Hash Commands
    // ========================================================================

    /// HSET key field value
    ///
    /// Returns `true` if the field was created, `false` if it was overwritten.
    pub(crate) fn hset(&mut self, key: &str, field: String, value: String) -> KvResult<bool> {
        let hash = self.get_or_create_typed::<HashValue>(key)?;
        Ok(hash.insert(field, value).is_none())
    }

    /// HGET key field
    pub(crate) fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        Ok(self
            .get_typed::<HashValue>(key)?
            .and_then(|hash| hash.get(field).cloned()))
    }

    /// HDEL key field [field ...]
    pub(crate) fn hdel(&mut self, key: &str, fields: &[String]) -> KvResult<usize> {
        let Some(hash) = self.get_typed_mut::<HashValue>(key)? else {
            return Ok(0);
        };
        Ok(fields
            .iter()
            .filter(|field| hash.remove(field.as_str()).is_some())
            .count())
    }

    /// HINCRBY key field delta
    ///
    /// A missing field counts as 0. The field is left untouched when its
    /// value is not an integer or the sum overflows.
    pub(crate) fn hincrby(&mut self, key: &str, field: &str, delta: i64) -> KvResult<i64> {
        let hash = self.get_or_create_typed::<HashValue>(key)?;

        let current = match hash.get(field) {
            Some(raw) => raw.parse::<i64>().map_err(|_| KvError::NotAnInteger {
                key: key.to_string(),
                field: field.to_string(),
            })?,
            None => 0,
        };

        let updated = current
            .checked_add(delta)
            .ok_or_else(|| KvError::IncrementOverflow {
                key: key.to_string(),
                field: field.to_string(),
            })?;

        hash.insert(field.to_string(), updated.to_string());
        Ok(updated)
    }

    /// HGETALL key
    pub(crate) fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        Ok(self.get_typed::<HashValue>(key)?.cloned().unwrap_or_default())
    }

    // ========================================================================
    // Set Commands
    // ========================================================================

    /// SADD key member [member ...]
    ///
    /// Returns how many members were not already present.
    pub(crate) fn sadd(&mut self, key: &str, members: Vec<String>) -> KvResult<usize> {
        let set = self.get_or_create_typed::<SetValue>(key)?;
        Ok(members
            .into_iter()
            .map(|member| set.insert(member))
            .filter(|added| *added)
            .count())
    }

    /// SREM key member [member ...]
    pub(crate) fn srem(&mut self, key: &str, members: &[String]) -> KvResult<usize> {
        let Some(set) = self.get_typed_mut::<SetValue>(key)? else {
            return Ok(0);
        };
        Ok(members.iter().filter(|member| set.remove(member.as_str())).count())
    }

    /// SMEMBERS key
    ///
    /// A missing key reads as the empty set; no entry is created.
    pub(crate) fn smembers(&self, key: &str) -> KvResult<HashSet<String>> {
        Ok(self.get_typed::<SetValue>(key)?.cloned().unwrap_or_default())
    }

    /// SISMEMBER key member
    pub(crate) fn sismember(&self, key: &str, member: &str) -> KvResult<bool> {
        Ok(self
            .get_typed::<SetValue>(key)?
            .is_some_and(|set| set.contains(member)))
    }
}

/// Resolves LRANGE's inclusive `start`/`end` against a list of `len` items.
///
/// Returns the half-open slice bounds, or `None` when the range selects
/// nothing.
fn range_bounds(len: usize, start: i64, end: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut start = start;
    let mut end = end.saturating_add(1);

    if start < 0 {
        start += len;
    }
    // `end` is exclusive here, so only values below 1 came from a negative index.
    if end < 1 {
        end += len;
    }

    if start > end {
        return None;
    }

    let start = start.max(0);
    let end = end.min(len);
    if start >= end {
        return None;
    }

    Some((start as usize, end as usize))
}
