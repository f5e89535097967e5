//! String table: interning of dictionary keys into dense integer ids.
//!
//! The table is a path-compressed trie serialized into a single immutable
//! blob. [`StringTableBuilder`] performs the offline, write-once
//! construction from (key, weight) pairs; [`StringTable`] is a zero-copy
//! reader over the resulting bytes, wherever they ended up stored (a heap
//! buffer, or a record inside a mapped arena). A given input set always
//! produces the same id assignment and the same serialized bytes, so
//! dictionary builds are reproducible across machines.

pub mod builder;
pub mod format;
pub mod table;

#[cfg(test)]
mod tests;

pub use builder::{KeyToken, StringTableBuilder};
pub use table::StringTable;

/// A dense, zero-based identifier assigned to an interned key within one
/// table build. Ids are stable for the lifetime of that build and are
/// reassigned on every build.
pub type StringId = u32;

/// Serialized sentinel for "no such string". API-level absence is expressed
/// as `Option<StringId>`; this value only appears on the wire.
pub const INVALID_STRING_ID: StringId = u32::MAX;
