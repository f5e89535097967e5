//! Newline-delimited, tab-separated import and export.
//!
//! The format carries ordinary (key, value, ...) rows plus two special line
//! shapes: `#@name<TAB>value` metadata pairs, and a literal `# no comment`
//! marker that disables comment parsing for the remainder of the stream
//! (so later entries may legitimately start with `#`).

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use lexica_common::error::Error;

/// Receives parsed entries and metadata from a [`TsvReader`]. Returning
/// `false` rejects the record; the reader logs it and moves on.
pub trait TsvSink {
    fn meta_put(&mut self, key: &str, value: &str) -> bool;
    fn put(&mut self, key: &str, value: &str) -> bool;
}

/// Supplies metadata and entries to a [`TsvWriter`].
pub trait TsvSource {
    fn meta_get(&mut self) -> Option<(String, String)>;
    fn get(&mut self) -> Option<(String, String)>;
}

/// Maps a row of tab-separated fields to a (key, value) entry; `None`
/// rejects the row.
pub type TsvParser = fn(&[&str]) -> Option<(String, String)>;

/// Maps a (key, value) entry back to a row of fields; `None` skips the entry.
pub type TsvFormatter = fn(&str, &str) -> Option<Vec<String>>;

/// First field is the key, second the value; remaining fields are ignored.
pub fn key_value_parser(row: &[&str]) -> Option<(String, String)> {
    if row.len() < 2 {
        return None;
    }
    Some((row[0].to_string(), row[1].to_string()))
}

pub fn key_value_formatter(key: &str, value: &str) -> Option<Vec<String>> {
    Some(vec![key.to_string(), value.to_string()])
}

pub struct TsvReader {
    path: PathBuf,
    parser: TsvParser,
}

impl TsvReader {
    pub fn new(path: impl Into<PathBuf>, parser: TsvParser) -> TsvReader {
        TsvReader {
            path: path.into(),
            parser,
        }
    }

    /// Reads the file, feeding metadata and entries into `sink`. Malformed
    /// lines are logged and skipped, never fatal. Returns the number of
    /// entries accepted by the sink.
    pub fn read(&self, sink: &mut impl TsvSink) -> lexica_common::Result<usize> {
        log::info!("reading tsv file: {}", self.path.display());
        let file = File::open(&self.path)
            .map_err(|e| Error::io(self.path.display().to_string(), e))?;
        let mut num_entries = 0;
        let mut enable_comment = true;
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| Error::io(self.path.display().to_string(), e))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if enable_comment && line.starts_with('#') {
                if let Some(meta) = line.strip_prefix("#@") {
                    let row: Vec<&str> = meta.split('\t').collect();
                    if row.len() != 2 || !sink.meta_put(row[0], row[1]) {
                        log::warn!("invalid metadata at line {line_no}");
                    }
                } else if line == "# no comment" {
                    enable_comment = false;
                }
                continue;
            }
            let row: Vec<&str> = line.split('\t').collect();
            match (self.parser)(&row) {
                Some((key, value)) => {
                    if sink.put(&key, &value) {
                        num_entries += 1;
                    } else {
                        log::warn!("invalid entry at line {line_no}");
                    }
                }
                None => log::warn!("invalid entry at line {line_no}"),
            }
        }
        Ok(num_entries)
    }
}

pub struct TsvWriter {
    path: PathBuf,
    formatter: TsvFormatter,
    /// Emitted as a leading `# ...` comment line when non-empty.
    pub file_description: String,
}

impl TsvWriter {
    pub fn new(path: impl Into<PathBuf>, formatter: TsvFormatter) -> TsvWriter {
        TsvWriter {
            path: path.into(),
            formatter,
            file_description: String::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drains `source` into the file: description comment, metadata lines,
    /// then formatted rows. Returns the number of entries written.
    pub fn write(&self, source: &mut impl TsvSource) -> lexica_common::Result<usize> {
        log::info!("writing tsv file: {}", self.path.display());
        let file = File::create(&self.path)
            .map_err(|e| Error::io(self.path.display().to_string(), e))?;
        let mut out = BufWriter::new(file);
        let io_err = |e| Error::io(self.path.display().to_string(), e);
        if !self.file_description.is_empty() {
            writeln!(out, "# {}", self.file_description).map_err(io_err)?;
        }
        while let Some((key, value)) = source.meta_get() {
            writeln!(out, "#@{key}\t{value}").map_err(io_err)?;
        }
        let mut num_entries = 0;
        while let Some((key, value)) = source.get() {
            if let Some(row) = (self.formatter)(&key, &value) {
                if row.is_empty() {
                    continue;
                }
                writeln!(out, "{}", row.join("\t")).map_err(io_err)?;
                num_entries += 1;
            }
        }
        out.flush().map_err(io_err)?;
        Ok(num_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        meta: Vec<(String, String)>,
        entries: Vec<(String, String)>,
    }

    impl TsvSink for RecordingSink {
        fn meta_put(&mut self, key: &str, value: &str) -> bool {
            self.meta.push((key.to_string(), value.to_string()));
            true
        }

        fn put(&mut self, key: &str, value: &str) -> bool {
            self.entries.push((key.to_string(), value.to_string()));
            true
        }
    }

    struct VecSource {
        meta: std::vec::IntoIter<(String, String)>,
        entries: std::vec::IntoIter<(String, String)>,
    }

    impl TsvSource for VecSource {
        fn meta_get(&mut self) -> Option<(String, String)> {
            self.meta.next()
        }

        fn get(&mut self) -> Option<(String, String)> {
            self.entries.next()
        }
    }

    fn write_fixture(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dict.txt");
        std::fs::write(&path, content).expect("write fixture");
        (dir, path)
    }

    #[test]
    fn test_read_entries_and_metadata() {
        let (_dir, path) = write_fixture(
            "#@name\ttest_dict\n\
             #@version\t1.0\n\
             # a plain comment\n\
             \n\
             apple\t1.5\n\
             banana\t2.0\textra\n",
        );
        let reader = TsvReader::new(&path, key_value_parser);
        let mut sink = RecordingSink::default();
        let count = reader.read(&mut sink).expect("read");
        assert_eq!(count, 2);
        assert_eq!(
            sink.meta,
            [
                ("name".to_string(), "test_dict".to_string()),
                ("version".to_string(), "1.0".to_string())
            ]
        );
        assert_eq!(sink.entries[0], ("apple".to_string(), "1.5".to_string()));
        assert_eq!(sink.entries[1], ("banana".to_string(), "2.0".to_string()));
    }

    #[test]
    fn test_no_comment_marker() {
        let (_dir, path) = write_fixture(
            "# skipped\n\
             # no comment\n\
             #literal\t1.0\n",
        );
        let reader = TsvReader::new(&path, key_value_parser);
        let mut sink = RecordingSink::default();
        let count = reader.read(&mut sink).expect("read");
        assert_eq!(count, 1, "entries after the marker may start with '#'");
        assert_eq!(sink.entries[0].0, "#literal");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let (_dir, path) = write_fixture(
            "#@only_one_field\n\
             no_tab_here\n\
             good\t1.0\n",
        );
        let reader = TsvReader::new(&path, key_value_parser);
        let mut sink = RecordingSink::default();
        let count = reader.read(&mut sink).expect("read");
        assert_eq!(count, 1);
        assert!(sink.meta.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let reader = TsvReader::new(dir.path().join("absent.txt"), key_value_parser);
        let mut sink = RecordingSink::default();
        assert!(reader.read(&mut sink).is_err());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        let mut writer = TsvWriter::new(&path, key_value_formatter);
        writer.file_description = "exported dictionary".to_string();
        let mut source = VecSource {
            meta: vec![("name".to_string(), "demo".to_string())].into_iter(),
            entries: vec![
                ("alpha".to_string(), "1".to_string()),
                ("beta".to_string(), "2".to_string()),
            ]
            .into_iter(),
        };
        let written = writer.write(&mut source).expect("write");
        assert_eq!(written, 2);

        let reader = TsvReader::new(&path, key_value_parser);
        let mut sink = RecordingSink::default();
        let count = reader.read(&mut sink).expect("read back");
        assert_eq!(count, 2);
        assert_eq!(sink.meta, [("name".to_string(), "demo".to_string())]);
        assert_eq!(sink.entries[1], ("beta".to_string(), "2".to_string()));
    }
}
