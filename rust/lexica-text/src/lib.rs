//! Text-side collaborators of the dictionary storage: TSV import/export,
//! resource-id resolution, and the staleness-check utilities (version-string
//! comparison, whole-file checksums).

pub mod checksum;
pub mod resource;
pub mod tsv;
pub mod version;
