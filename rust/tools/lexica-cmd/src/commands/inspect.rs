use std::path::Path;

use crate::dict::OpenDict;

pub fn run(dict_path: String) -> anyhow::Result<()> {
    let dict = OpenDict::open(Path::new(&dict_path))?;
    let header = dict.header();
    let table = dict.table()?;

    let actual_crc = crc32fast::hash(dict.blob());
    println!("dictionary: {dict_path}");
    println!("  file size:    {} bytes", dict.file_size());
    println!("  blob size:    {} bytes", header.blob_len);
    println!("  keys:         {}", table.num_keys());
    println!(
        "  checksum:     {:08x} ({})",
        header.blob_crc,
        if actual_crc == header.blob_crc {
            "valid"
        } else {
            "MISMATCH"
        }
    );
    Ok(())
}
