use std::path::Path;

use crate::dict::OpenDict;

pub fn run_lookup(dict_path: String, key: String) -> anyhow::Result<()> {
    let dict = OpenDict::open(Path::new(&dict_path))?;
    let table = dict.table()?;
    match table.lookup(&key) {
        Some(id) => println!("{id}\t{key}"),
        None => println!("key not found: {key}"),
    }
    Ok(())
}

pub fn run_prefix(dict_path: String, query: String) -> anyhow::Result<()> {
    let dict = OpenDict::open(Path::new(&dict_path))?;
    let table = dict.table()?;
    for id in table.common_prefix_match(&query) {
        println!("{id}\t{}", table.get_string(id)?);
    }
    Ok(())
}

pub fn run_predict(dict_path: String, query: String) -> anyhow::Result<()> {
    let dict = OpenDict::open(Path::new(&dict_path))?;
    let table = dict.table()?;
    for id in table.predict(&query) {
        println!("{id}\t{}", table.get_string(id)?);
    }
    Ok(())
}
