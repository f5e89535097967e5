//! On-disk layout of the string table blob.
//!
//! All integers are little-endian. The blob is:
//!
//! ```text
//! header (24 bytes)
//!   magic            [u8; 4]
//!   version          u16
//!   reserved         u16
//!   num_keys         u32
//!   node_count       u32
//!   key_index_offset u32
//!   binary_size      u32
//! nodes, depth-first preorder, root first at offset 24
//!   parent offset    u32     (NO_NODE for the root)
//!   key id           u32     (INVALID_STRING_ID when not terminal)
//!   edge length      u16
//!   child count      u16
//!   edge bytes       [u8; edge length]
//!   child offsets    [u32; child count]
//! key index at key_index_offset
//!   node offset      [u32; num_keys]   (indexed by string id)
//! ```
//!
//! The key index gives reverse lookup its O(depth) walk: the terminal node
//! of an id is found directly, and the key is reassembled by following
//! parent offsets up to the root.

use lexica_common::verify_data;

pub const MAGIC: [u8; 4] = *b"LXST";
pub const VERSION: u16 = 1;

pub const HEADER_SIZE: usize = 24;
pub const NODE_HEADER_SIZE: usize = 12;

/// Sentinel node offset: the root's parent.
pub const NO_NODE: u32 = u32::MAX;

/// Longest representable key: a path-compressed edge can carry an entire
/// key tail, and edge lengths are stored as `u16`.
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

#[inline]
pub fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_le_bytes(bytes.try_into().expect("u16 bytes")))
}

#[inline]
pub fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().expect("u32 bytes")))
}

#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub num_keys: u32,
    pub node_count: u32,
    pub key_index_offset: u32,
    pub binary_size: u32,
}

impl Header {
    /// Parses and validates the header of a string table blob.
    pub fn parse(data: &[u8]) -> lexica_common::Result<Header> {
        verify_data!(string_table, data.len() >= HEADER_SIZE);
        verify_data!(string_table, data[0..4] == MAGIC);
        verify_data!(string_table, read_u16(data, 4) == Some(VERSION));
        let header = Header {
            num_keys: read_u32(data, 8).expect("num_keys"),
            node_count: read_u32(data, 12).expect("node_count"),
            key_index_offset: read_u32(data, 16).expect("key_index_offset"),
            binary_size: read_u32(data, 20).expect("binary_size"),
        };
        let index_size = header.num_keys as usize * 4;
        verify_data!(string_table, header.binary_size as usize <= data.len());
        verify_data!(
            string_table,
            header.key_index_offset as usize >= HEADER_SIZE
                && header.key_index_offset as usize + index_size == header.binary_size as usize
        );
        Ok(header)
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.num_keys.to_le_bytes());
        out.extend_from_slice(&self.node_count.to_le_bytes());
        out.extend_from_slice(&self.key_index_offset.to_le_bytes());
        out.extend_from_slice(&self.binary_size.to_le_bytes());
    }
}
