//! Offline construction of string table blobs.

use std::collections::BTreeMap;

use lexica_common::error::{Error, ErrorKind};

use crate::format::{HEADER_SIZE, Header, MAX_KEY_LEN, NO_NODE, NODE_HEADER_SIZE};
use crate::{INVALID_STRING_ID, StringId};

/// A provisional handle returned by [`StringTableBuilder::add`], exchanged
/// for the key's final [`StringId`] once [`StringTableBuilder::build`] has
/// run. This replaces back-filled id slots with an explicit resolution
/// step: callers that need forward references record the token and resolve
/// it after the whole key set is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyToken(usize);

/// Builds a compressed string trie from (key, weight) pairs.
///
/// Construction is deterministic: the same set of keys and final weights
/// yields the same id assignment and the same serialized bytes regardless
/// of insertion order. Duplicate keys are allowed; the last weight added
/// for a key wins, and every token for that key resolves to the same id.
#[derive(Default)]
pub struct StringTableBuilder {
    pairs: Vec<(Vec<u8>, f64)>,
    ids: Vec<Option<StringId>>,
    blob: Vec<u8>,
}

impl StringTableBuilder {
    pub fn new() -> StringTableBuilder {
        Default::default()
    }

    /// Records one (key, weight) pair. The key must be non-empty and at
    /// most [`MAX_KEY_LEN`] bytes long.
    ///
    /// Higher weights make a key preferred among sibling completions in
    /// predictive query ordering. The returned token resolves to the key's
    /// id after [`build`](Self::build).
    pub fn add(&mut self, key: impl AsRef<[u8]>, weight: f64) -> lexica_common::Result<KeyToken> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(Error::invalid_arg("key", "key must be non-empty"));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(Error::invalid_arg("key", "key exceeds maximum length"));
        }
        let token = KeyToken(self.pairs.len());
        self.pairs.push((key.to_vec(), weight));
        self.ids.push(None);
        Ok(token)
    }

    /// Constructs the trie over all accumulated keys, serializes it, and
    /// resolves all outstanding tokens to their final ids.
    pub fn build(&mut self) -> lexica_common::Result<()> {
        // Last write wins for duplicate keys; BTreeMap fixes the key order
        // independently of insertion order.
        let mut weights: BTreeMap<&[u8], f64> = BTreeMap::new();
        for (key, weight) in &self.pairs {
            weights.insert(key.as_slice(), *weight);
        }

        let mut trie = RadixTrie::new();
        for (key, weight) in &weights {
            trie.insert(key, *weight);
        }
        trie.finish();

        self.blob = trie.serialize();

        let mut key_ids: BTreeMap<&[u8], StringId> = BTreeMap::new();
        trie.collect_key_ids(&weights, &mut key_ids);
        for (i, (key, _)) in self.pairs.iter().enumerate() {
            self.ids[i] = key_ids.get(key.as_slice()).copied();
        }
        Ok(())
    }

    /// The final id of the key behind `token`, or `None` before
    /// [`build`](Self::build) (or after [`clear`](Self::clear)).
    pub fn resolve(&self, token: KeyToken) -> Option<StringId> {
        self.ids.get(token.0).copied().flatten()
    }

    /// Discards all accumulated pairs and any built trie. Tokens handed out
    /// before the call no longer resolve.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.ids.clear();
        self.blob.clear();
    }

    /// Byte length of the serialized trie; 0 before [`build`](Self::build).
    pub fn binary_size(&self) -> usize {
        self.blob.len()
    }

    /// The serialized trie produced by the last [`build`](Self::build).
    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    /// Writes exactly [`binary_size`](Self::binary_size) bytes into `buf`
    /// and returns the count. When `buf` is too small the buffer is left
    /// untouched and the error is recoverable.
    pub fn dump(&self, buf: &mut [u8]) -> lexica_common::Result<usize> {
        if self.blob.is_empty() {
            return Err(Error::invalid_operation("dump before build"));
        }
        if buf.len() < self.blob.len() {
            log::error!("insufficient buffer to dump string table");
            return Err(ErrorKind::DestBufferTooSmall.into());
        }
        buf[..self.blob.len()].copy_from_slice(&self.blob);
        Ok(self.blob.len())
    }
}

struct Node {
    edge: Vec<u8>,
    weight: Option<f64>,
    max_weight: f64,
    key_id: StringId,
    children: Vec<usize>,
}

impl Node {
    fn new(edge: Vec<u8>) -> Node {
        Node {
            edge,
            weight: None,
            max_weight: f64::NEG_INFINITY,
            key_id: INVALID_STRING_ID,
            children: Vec::new(),
        }
    }
}

/// In-memory path-compressed trie used only during construction.
struct RadixTrie {
    nodes: Vec<Node>,
}

const ROOT: usize = 0;

impl RadixTrie {
    fn new() -> RadixTrie {
        RadixTrie {
            nodes: vec![Node::new(Vec::new())],
        }
    }

    fn insert(&mut self, key: &[u8], weight: f64) {
        let mut node = ROOT;
        let mut pos = 0;
        loop {
            if pos == key.len() {
                self.nodes[node].weight = Some(weight);
                return;
            }
            let next = self.nodes[node]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].edge[0] == key[pos]);
            let Some(child) = next else {
                let leaf = self.push_node(key[pos..].to_vec());
                self.nodes[leaf].weight = Some(weight);
                self.nodes[node].children.push(leaf);
                return;
            };
            let common = common_prefix(&self.nodes[child].edge, &key[pos..]);
            if common == self.nodes[child].edge.len() {
                node = child;
                pos += common;
                continue;
            }
            // The key diverges inside the child's edge: split it.
            let fork = self.push_node(key[pos..pos + common].to_vec());
            self.nodes[child].edge.drain(..common);
            let slot = self.nodes[node]
                .children
                .iter()
                .position(|&c| c == child)
                .expect("child slot");
            self.nodes[node].children[slot] = fork;
            self.nodes[fork].children.push(child);
            if pos + common == key.len() {
                self.nodes[fork].weight = Some(weight);
            } else {
                let leaf = self.push_node(key[pos + common..].to_vec());
                self.nodes[leaf].weight = Some(weight);
                self.nodes[fork].children.push(leaf);
            }
            return;
        }
    }

    /// Orders children and assigns string ids. Children are sorted by
    /// descending subtree weight, ties by edge byte, which fixes both the
    /// id assignment and the predictive query order: siblings come out
    /// weight-preferred, while a stored key always precedes the keys it
    /// is a prefix of. Ids then follow a depth-first preorder over the
    /// ordered trie.
    fn finish(&mut self) {
        self.compute_max_weight(ROOT);
        self.sort_children(ROOT);
        let mut next_id = 0;
        self.assign_ids(ROOT, &mut next_id);
    }

    fn compute_max_weight(&mut self, node: usize) -> f64 {
        let mut max = self.nodes[node].weight.unwrap_or(f64::NEG_INFINITY);
        let children = self.nodes[node].children.clone();
        for child in children {
            max = max.max(self.compute_max_weight(child));
        }
        self.nodes[node].max_weight = max;
        max
    }

    fn sort_children(&mut self, node: usize) {
        let mut children = std::mem::take(&mut self.nodes[node].children);
        children.sort_by(|&a, &b| {
            self.nodes[b]
                .max_weight
                .total_cmp(&self.nodes[a].max_weight)
                .then(self.nodes[a].edge[0].cmp(&self.nodes[b].edge[0]))
        });
        for &child in &children {
            self.sort_children(child);
        }
        self.nodes[node].children = children;
    }

    fn assign_ids(&mut self, node: usize, next_id: &mut StringId) {
        if self.nodes[node].weight.is_some() {
            self.nodes[node].key_id = *next_id;
            *next_id += 1;
        }
        let children = self.nodes[node].children.clone();
        for child in children {
            self.assign_ids(child, next_id);
        }
    }

    fn serialize(&self) -> Vec<u8> {
        // First pass: blob offset of every node, in preorder.
        let mut offsets = vec![0u32; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut cursor = HEADER_SIZE;
        let mut stack = vec![ROOT];
        while let Some(node) = stack.pop() {
            offsets[node] = cursor as u32;
            order.push(node);
            cursor += NODE_HEADER_SIZE
                + self.nodes[node].edge.len()
                + self.nodes[node].children.len() * 4;
            for &child in self.nodes[node].children.iter().rev() {
                stack.push(child);
            }
        }

        let num_keys = self
            .nodes
            .iter()
            .filter(|n| n.key_id != INVALID_STRING_ID)
            .count() as u32;
        let key_index_offset = cursor as u32;
        let binary_size = key_index_offset + num_keys * 4;

        let mut out = Vec::with_capacity(binary_size as usize);
        Header {
            num_keys,
            node_count: self.nodes.len() as u32,
            key_index_offset,
            binary_size,
        }
        .write(&mut out);

        let mut parents = vec![NO_NODE; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            for &child in &node.children {
                parents[child] = offsets[index];
            }
        }

        let mut key_index = vec![0u32; num_keys as usize];
        for &index in &order {
            let node = &self.nodes[index];
            out.extend_from_slice(&parents[index].to_le_bytes());
            out.extend_from_slice(&node.key_id.to_le_bytes());
            out.extend_from_slice(&(node.edge.len() as u16).to_le_bytes());
            out.extend_from_slice(&(node.children.len() as u16).to_le_bytes());
            out.extend_from_slice(&node.edge);
            for &child in &node.children {
                out.extend_from_slice(&offsets[child].to_le_bytes());
            }
            if node.key_id != INVALID_STRING_ID {
                key_index[node.key_id as usize] = offsets[index];
            }
        }
        for offset in key_index {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        debug_assert_eq!(out.len(), binary_size as usize);
        out
    }

    fn collect_key_ids<'a>(
        &self,
        weights: &BTreeMap<&'a [u8], f64>,
        out: &mut BTreeMap<&'a [u8], StringId>,
    ) {
        for &key in weights.keys() {
            if let Some(id) = self.id_of(key) {
                out.insert(key, id);
            }
        }
    }

    fn id_of(&self, key: &[u8]) -> Option<StringId> {
        let mut node = ROOT;
        let mut pos = 0;
        while pos < key.len() {
            let child = self.nodes[node]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].edge[0] == key[pos])?;
            if !key[pos..].starts_with(&self.nodes[child].edge) {
                return None;
            }
            pos += self.nodes[child].edge.len();
            node = child;
        }
        (self.nodes[node].key_id != INVALID_STRING_ID).then_some(self.nodes[node].key_id)
    }

    fn push_node(&mut self, edge: Vec<u8>) -> usize {
        self.nodes.push(Node::new(edge));
        self.nodes.len() - 1
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
