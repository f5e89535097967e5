//! Memory-mapped arena storage for dictionary files.
//!
//! The arena is a single growable backing file mapped into memory as one
//! contiguous region. Records are carved out of it sequentially via bump
//! allocation; the arena itself imposes no structure beyond contiguous byte
//! ranges, so record layout is entirely the caller's business.

pub mod arena_file;

#[cfg_attr(unix, path = "mmap_unix.rs")]
#[cfg_attr(windows, path = "mmap_win.rs")]
#[cfg_attr(not(any(unix, windows)), path = "mmap_fallback.rs")]
pub mod mmap;


pub use arena_file::{ArenaFile, ArenaRange, StringRecord};
