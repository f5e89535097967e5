use std::path::Path;

use anyhow::Context;
use lexica_text::tsv::{TsvSource, TsvWriter, key_value_formatter};
use lexica_trie::StringTable;

use crate::dict::OpenDict;

struct TableSource<'a> {
    table: &'a StringTable<'a>,
    next_id: u32,
}

impl TsvSource for TableSource<'_> {
    fn meta_get(&mut self) -> Option<(String, String)> {
        None
    }

    fn get(&mut self) -> Option<(String, String)> {
        while (self.next_id as usize) < self.table.num_keys() {
            let id = self.next_id;
            self.next_id += 1;
            // A bad entry must not abort the rest of the export.
            if let Ok(key) = self.table.get_string(id) {
                return Some((key, id.to_string()));
            }
        }
        None
    }
}

pub fn run(dict_path: String, tsv_path: String) -> anyhow::Result<()> {
    let dict = OpenDict::open(Path::new(&dict_path))?;
    let table = dict.table()?;

    let mut writer = TsvWriter::new(&tsv_path, key_value_formatter);
    writer.file_description = format!("exported from {dict_path}");
    let num_entries = writer
        .write(&mut TableSource {
            table: &table,
            next_id: 0,
        })
        .context("failed to write tsv file")?;

    println!("exported {num_entries} entries to {tsv_path}");
    Ok(())
}
