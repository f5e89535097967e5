//! Zero-copy reader over a serialized string table blob.

use lexica_common::error::Error;

use crate::format::{HEADER_SIZE, Header, NO_NODE, NODE_HEADER_SIZE, read_u16, read_u32};
use crate::{INVALID_STRING_ID, StringId};

/// A read-only view over a string table blob.
///
/// The view borrows the blob without copying, so the backing memory (heap
/// buffer, mapped arena, ...) must outlive it. Multiple concurrent readers
/// over the same blob are safe; every query uses only call-local state.
pub struct StringTable<'a> {
    data: &'a [u8],
    header: Header,
}

struct NodeRef<'a> {
    parent: u32,
    key_id: StringId,
    edge: &'a [u8],
    child_offsets: &'a [u8],
}

impl<'a> NodeRef<'a> {
    fn children(&self) -> impl Iterator<Item = u32> + '_ {
        self.child_offsets
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().expect("child offset bytes")))
    }
}

impl<'a> StringTable<'a> {
    /// Wraps an existing blob, validating its header. The blob may sit at
    /// the start of a larger buffer; everything beyond
    /// [`binary_size`](Self::binary_size) bytes is ignored.
    pub fn map(data: &'a [u8]) -> lexica_common::Result<StringTable<'a>> {
        let header = Header::parse(data)?;
        Ok(StringTable { data, header })
    }

    /// Exact membership test.
    pub fn has_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns the id of `key`, or `None` when absent.
    pub fn lookup(&self, key: impl AsRef<[u8]>) -> Option<StringId> {
        let key = key.as_ref();
        let mut node = self.node(HEADER_SIZE as u32)?;
        let mut pos = 0;
        while pos < key.len() {
            let child = self.matching_child(&node, key[pos])?;
            if !key[pos..].starts_with(child.edge) {
                return None;
            }
            pos += child.edge.len();
            node = child;
        }
        (node.key_id != INVALID_STRING_ID).then_some(node.key_id)
    }

    /// Returns every stored key that is a prefix of `query`, ordered by
    /// increasing key length (shortest match first).
    pub fn common_prefix_match(&self, query: impl AsRef<[u8]>) -> Vec<StringId> {
        let query = query.as_ref();
        let mut result = Vec::new();
        let Some(mut node) = self.node(HEADER_SIZE as u32) else {
            return result;
        };
        let mut pos = 0;
        loop {
            if node.key_id != INVALID_STRING_ID {
                result.push(node.key_id);
            }
            if pos == query.len() {
                break;
            }
            let Some(child) = self.matching_child(&node, query[pos]) else {
                break;
            };
            if !query[pos..].starts_with(child.edge) {
                break;
            }
            pos += child.edge.len();
            node = child;
        }
        result
    }

    /// Returns every stored key for which `query` is itself a prefix
    /// (completion candidates).
    ///
    /// Results come out in serialized preorder: a stored key that is a
    /// prefix of another precedes it, and sibling subtrees are visited
    /// in descending weight order.
    pub fn predict(&self, query: impl AsRef<[u8]>) -> Vec<StringId> {
        let query = query.as_ref();
        let mut result = Vec::new();
        let Some(mut node) = self.node(HEADER_SIZE as u32) else {
            return result;
        };
        let mut pos = 0;
        while pos < query.len() {
            let Some(child) = self.matching_child(&node, query[pos]) else {
                return result;
            };
            let remaining = &query[pos..];
            if remaining.len() < child.edge.len() {
                // The query ends inside this edge; the whole subtree
                // completes it iff the edge continues the query.
                if !child.edge.starts_with(remaining) {
                    return result;
                }
                self.collect_subtree(&child, &mut result);
                return result;
            }
            if !remaining.starts_with(child.edge) {
                return result;
            }
            pos += child.edge.len();
            node = child;
        }
        self.collect_subtree(&node, &mut result);
        result
    }

    /// Reverse lookup: reassembles the key assigned to `id`.
    ///
    /// An out-of-range id is an error, reported and recoverable; it never
    /// disrupts lookups of unrelated entries.
    pub fn get_string(&self, id: StringId) -> lexica_common::Result<String> {
        if id as usize >= self.num_keys() {
            log::error!("invalid id for string table: {id}");
            return Err(Error::id_out_of_range(id, self.num_keys()));
        }
        let index_offset = self.header.key_index_offset as usize + id as usize * 4;
        let offset = read_u32(self.data, index_offset)
            .ok_or_else(|| Error::invalid_format("string_table", "key index out of bounds"))?;

        // Follow parent offsets up to the root, then reverse the edges.
        let mut parts: Vec<&[u8]> = Vec::new();
        let mut cursor = offset;
        let mut steps = 0;
        while cursor != NO_NODE {
            if steps > self.header.node_count {
                return Err(Error::invalid_format("string_table", "parent chain cycle"));
            }
            steps += 1;
            let node = self
                .node(cursor)
                .ok_or_else(|| Error::invalid_format("string_table", "node out of bounds"))?;
            parts.push(node.edge);
            cursor = node.parent;
        }
        let mut bytes = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
        for part in parts.into_iter().rev() {
            bytes.extend_from_slice(part);
        }
        String::from_utf8(bytes)
            .map_err(|_| Error::invalid_format("string_table", "key is not valid utf-8"))
    }

    /// The cardinality of the id domain.
    pub fn num_keys(&self) -> usize {
        self.header.num_keys as usize
    }

    /// Serialized byte length of this table.
    pub fn binary_size(&self) -> usize {
        self.header.binary_size as usize
    }

    fn node(&self, offset: u32) -> Option<NodeRef<'a>> {
        let offset = offset as usize;
        if offset + NODE_HEADER_SIZE > self.header.key_index_offset as usize {
            return None;
        }
        let parent = read_u32(self.data, offset)?;
        let key_id = read_u32(self.data, offset + 4)?;
        let edge_len = read_u16(self.data, offset + 8)? as usize;
        let child_count = read_u16(self.data, offset + 10)? as usize;
        let edge_start = offset + NODE_HEADER_SIZE;
        let children_start = edge_start + edge_len;
        let end = children_start + child_count * 4;
        if end > self.header.key_index_offset as usize {
            return None;
        }
        Some(NodeRef {
            parent,
            key_id,
            edge: &self.data[edge_start..children_start],
            child_offsets: &self.data[children_start..end],
        })
    }

    fn matching_child(&self, node: &NodeRef<'a>, byte: u8) -> Option<NodeRef<'a>> {
        node.children()
            .filter_map(|offset| self.node(offset))
            .find(|child| child.edge.first() == Some(&byte))
    }

    /// Depth-first preorder over `node`'s subtree; children were serialized
    /// in weight order, so ids come out weight-preferred among siblings.
    fn collect_subtree(&self, node: &NodeRef<'a>, result: &mut Vec<StringId>) {
        if node.key_id != INVALID_STRING_ID {
            result.push(node.key_id);
        }
        for offset in node.children() {
            if let Some(child) = self.node(offset) {
                self.collect_subtree(&child, result);
            }
        }
    }
}
