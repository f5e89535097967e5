//! Minimal framing of a trie blob inside an arena file.
//!
//! The dictionary file is an arena whose first record is a 16-byte header
//! (magic, blob length, blob checksum, reserved) followed by one record
//! holding the serialized string table. This framing is tool-local glue;
//! the arena itself imposes no structure.

use std::path::Path;

use anyhow::{Context, bail};
use lexica_arena::ArenaFile;
use lexica_trie::{StringTable, StringTableBuilder};

pub const DICT_MAGIC: [u8; 4] = *b"LXDC";
pub const DICT_HEADER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct DictHeader {
    pub blob_len: u32,
    pub blob_crc: u32,
}

impl DictHeader {
    fn to_bytes(self) -> [u8; DICT_HEADER_SIZE] {
        let mut bytes = [0u8; DICT_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&DICT_MAGIC);
        bytes[4..8].copy_from_slice(&self.blob_len.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.blob_crc.to_le_bytes());
        bytes
    }

    fn parse(bytes: &[u8]) -> anyhow::Result<DictHeader> {
        if bytes.len() < DICT_HEADER_SIZE || bytes[0..4] != DICT_MAGIC {
            bail!("not a lexica dictionary file");
        }
        Ok(DictHeader {
            blob_len: u32::from_le_bytes(bytes[4..8].try_into().expect("blob_len bytes")),
            blob_crc: u32::from_le_bytes(bytes[8..12].try_into().expect("blob_crc bytes")),
        })
    }
}

/// Serializes a built string table into a fresh dictionary file at `path`.
pub fn write_dict(path: &Path, builder: &StringTableBuilder) -> anyhow::Result<()> {
    let blob_len = builder.binary_size();
    if blob_len == 0 {
        bail!("string table has not been built");
    }

    let mut arena = ArenaFile::new(path);
    arena
        .create(DICT_HEADER_SIZE + blob_len)
        .context("failed to create dictionary file")?;

    let header_range = arena
        .allocate(DICT_HEADER_SIZE, 1)
        .context("arena exhausted writing header")?;
    let blob_range = arena
        .allocate(blob_len, 1)
        .context("arena exhausted writing string table")?;

    builder
        .dump(arena.bytes_mut(blob_range))
        .context("failed to dump string table")?;
    let blob_crc = crc32fast::hash(arena.bytes(blob_range));

    let header = DictHeader {
        blob_len: blob_len as u32,
        blob_crc,
    };
    arena
        .bytes_mut(header_range)
        .copy_from_slice(&header.to_bytes());

    if !arena.flush() {
        bail!("failed to flush dictionary file");
    }
    if !arena.shrink_to_fit() {
        bail!("failed to trim dictionary file");
    }
    Ok(())
}

/// A dictionary file opened read-only; the arena mapping stays alive for as
/// long as this value does, so string tables borrowed from it remain valid.
pub struct OpenDict {
    arena: ArenaFile,
    header: DictHeader,
}

impl OpenDict {
    pub fn open(path: &Path) -> anyhow::Result<OpenDict> {
        let mut arena = ArenaFile::new(path);
        arena
            .open_read_only()
            .context("failed to open dictionary file")?;
        let header = DictHeader::parse(arena.as_bytes())?;
        let end = DICT_HEADER_SIZE + header.blob_len as usize;
        if end > arena.capacity() {
            bail!("dictionary file is truncated");
        }
        Ok(OpenDict { arena, header })
    }

    pub fn header(&self) -> DictHeader {
        self.header
    }

    pub fn file_size(&self) -> usize {
        self.arena.capacity()
    }

    pub fn blob(&self) -> &[u8] {
        &self.arena.as_bytes()[DICT_HEADER_SIZE..DICT_HEADER_SIZE + self.header.blob_len as usize]
    }

    pub fn table(&self) -> anyhow::Result<StringTable<'_>> {
        StringTable::map(self.blob()).context("invalid string table")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("demo.dict.bin");

        let mut builder = StringTableBuilder::new();
        builder.add("hello", 1.0).expect("add");
        builder.add("help", 2.0).expect("add");
        builder.build().expect("build");
        write_dict(&path, &builder).expect("write_dict");

        let dict = OpenDict::open(&path).expect("open");
        assert_eq!(
            dict.file_size(),
            DICT_HEADER_SIZE + builder.binary_size(),
            "file is shrunk to its logical size"
        );
        assert_eq!(crc32fast::hash(dict.blob()), dict.header().blob_crc);

        let table = dict.table().expect("table");
        assert_eq!(table.num_keys(), 2);
        assert!(table.has_key("hello"));
        assert!(!table.has_key("hel"));
    }

    #[test]
    fn test_open_rejects_other_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("not_a_dict.bin");
        std::fs::write(&path, b"plain text, long enough to hold a header")
            .expect("write");
        assert!(OpenDict::open(&path).is_err());
    }
}
