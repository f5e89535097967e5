use std::path::Path;

use anyhow::Context;
use lexica_text::tsv::{TsvReader, TsvSink, key_value_parser};
use lexica_trie::StringTableBuilder;

use crate::dict;

struct BuilderSink<'a> {
    builder: &'a mut StringTableBuilder,
}

impl TsvSink for BuilderSink<'_> {
    fn meta_put(&mut self, _key: &str, _value: &str) -> bool {
        true
    }

    fn put(&mut self, key: &str, value: &str) -> bool {
        let Ok(weight) = value.parse::<f64>() else {
            return false;
        };
        self.builder.add(key, weight).is_ok()
    }
}

pub fn run(tsv_path: String, dict_path: String) -> anyhow::Result<()> {
    let mut builder = StringTableBuilder::new();
    let reader = TsvReader::new(&tsv_path, key_value_parser);
    let num_entries = reader
        .read(&mut BuilderSink {
            builder: &mut builder,
        })
        .context("failed to read tsv source")?;

    builder.build().context("failed to build string table")?;
    dict::write_dict(Path::new(&dict_path), &builder)?;

    println!(
        "built {dict_path}: {num_entries} entries, {} bytes",
        dict::DICT_HEADER_SIZE + builder.binary_size()
    );
    Ok(())
}
