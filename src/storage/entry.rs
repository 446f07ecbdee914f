//! Typed Entries
//!
//! Each key in the keyspace holds exactly one [`Entry`]. The variant decides
//! which commands may touch the key: list commands only see lists, hash
//! commands only hashes, and so on.
//!
//! The [`EntryValue`] trait ties each variant's payload type to its tag, so the
//! keyspace can hand out `&mut VecDeque<String>` for a list key without every
//! caller matching on the enum.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Payload of a list entry. The front is the head.
pub type ListValue = VecDeque<String>;

/// Payload of a hash entry.
pub type HashValue = HashMap<String, String>;

/// Payload of a set entry.
pub type SetValue = HashSet<String>;

/// The value stored at a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A plain string. Writes replace it wholesale.
    String(String),
    /// An ordered list with O(1) push/pop at the head.
    List(ListValue),
    /// A field → value map.
    Hash(HashValue),
    /// An unordered set of unique members.
    Set(SetValue),
}

impl Entry {
    /// Returns the variant tag of this entry.
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::String(_) => EntryKind::String,
            Entry::List(_) => EntryKind::List,
            Entry::Hash(_) => EntryKind::Hash,
            Entry::Set(_) => EntryKind::Set,
        }
    }
}

/// The variant tag of an [`Entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    String,
    List,
    Hash,
    Set,
}

impl EntryKind {
    /// The lower-case name a real server reports for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::String => "string",
            EntryKind::List => "list",
            EntryKind::Hash => "hash",
            EntryKind::Set => "set",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload type that lives inside exactly one [`Entry`] variant.
pub trait EntryValue: Sized {
    /// The variant this payload belongs to.
    const KIND: EntryKind;

    /// Wraps the payload into its entry variant.
    fn into_entry(self) -> Entry;

    /// Borrows the payload if `entry` is of this variant.
    fn from_entry(entry: &Entry) -> Option<&Self>;

    /// Mutably borrows the payload if `entry` is of this variant.
    fn from_entry_mut(entry: &mut Entry) -> Option<&mut Self>;
}

macro_rules! entry_value {
    ($ty:ty, $variant:ident) => {
        impl EntryValue for $ty {
            const KIND: EntryKind = EntryKind::$variant;

            fn into_entry(self) -> Entry {
                Entry::$variant(self)
            }

            fn from_entry(entry: &Entry) -> Option<&Self> {
                match entry {
                    Entry::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn from_entry_mut(entry: &mut Entry) -> Option<&mut Self> {
                match entry {
                    Entry::$variant(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

entry_value!(String, String);
entry_value!(ListValue, List);
entry_value!(HashValue, Hash);
entry_value!(SetValue, Set);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Entry::String("v".into()).kind(), EntryKind::String);
        assert_eq!(Entry::List(ListValue::new()).kind(), EntryKind::List);
        assert_eq!(Entry::Hash(HashValue::new()).kind(), EntryKind::Hash);
        assert_eq!(Entry::Set(SetValue::new()).kind(), EntryKind::Set);
    }

    #[test]
    fn test_from_entry_rejects_other_variants() {
        let entry = Entry::List(ListValue::from(vec!["a".to_string()]));
        assert!(<HashValue as EntryValue>::from_entry(&entry).is_none());
        assert_eq!(
            <ListValue as EntryValue>::from_entry(&entry).map(|l| l.len()),
            Some(1)
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EntryKind::Hash.to_string(), "hash");
        assert_eq!(<SetValue as EntryValue>::KIND, EntryKind::Set);
    }
}
