//! On-disk index snapshot: a directory holding the bincode index, a JSON
//! header describing it and a plain-text vocabulary sample.

use crate::error::Result;
use crate::index::InvertedIndex;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;
pub const VOCAB_SAMPLE_SIZE: usize = 100;

const INDEX_FILE: &str = "index.bin";
const HEADER_FILE: &str = "meta.json";
const VOCAB_FILE: &str = "sample_tokens.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

impl SnapshotHeader {
    fn describe(index: &InvertedIndex) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            num_docs: index.num_docs() as u32,
            num_terms: index.num_terms() as u32,
            created_at,
            version: SNAPSHOT_VERSION,
        }
    }
}

/// Write `index` under `dir` and return the header stored next to it.
pub fn save_snapshot<P: AsRef<Path>>(dir: P, index: &InvertedIndex) -> Result<SnapshotHeader> {
    let dir = dir.as_ref();
    create_dir_all(dir)?;

    let mut out = BufWriter::new(File::create(dir.join(INDEX_FILE))?);
    bincode::serialize_into(&mut out, index)?;
    out.flush()?;

    let header = SnapshotHeader::describe(index);
    fs::write(dir.join(HEADER_FILE), serde_json::to_string_pretty(&header)?)?;
    write_vocab_sample(dir.join(VOCAB_FILE), index, VOCAB_SAMPLE_SIZE)?;

    tracing::info!(dir = %dir.display(), num_docs = header.num_docs, num_terms = header.num_terms, "saved index snapshot");
    Ok(header)
}

/// Load a snapshot written by [`save_snapshot`]. A version mismatch is logged,
/// not rejected.
pub fn load_snapshot<P: AsRef<Path>>(dir: P) -> Result<InvertedIndex> {
    let dir = dir.as_ref();
    let header: SnapshotHeader = serde_json::from_str(&fs::read_to_string(dir.join(HEADER_FILE))?)?;
    if header.version != SNAPSHOT_VERSION {
        tracing::warn!(found = header.version, expected = SNAPSHOT_VERSION, "index snapshot version mismatch");
    }
    let index: InvertedIndex = bincode::deserialize_from(BufReader::new(File::open(dir.join(INDEX_FILE))?))?;
    tracing::info!(
        dir = %dir.display(),
        num_docs = index.num_docs(),
        num_terms = index.num_terms(),
        created_at = %header.created_at,
        "loaded index snapshot"
    );
    Ok(index)
}

/// First `n` vocabulary terms in first-seen order, one per line.
pub fn write_vocab_sample<P: AsRef<Path>>(path: P, index: &InvertedIndex, n: usize) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut f = BufWriter::new(File::create(path)?);
    for term in index.vocabulary().take(n) {
        writeln!(f, "{term}")?;
    }
    f.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use tempfile::tempdir;

    #[test]
    fn snapshot_roundtrip_keeps_postings_and_max_tf() {
        let mut b = IndexBuilder::new();
        b.add_document("d1", &["apple", "apple", "pear"][..]).unwrap();
        b.add_document("d2", &["pear"][..]).unwrap();
        let index = b.finish();

        let dir = tempdir().unwrap();
        let header = save_snapshot(dir.path(), &index).unwrap();
        assert_eq!(header.num_docs, 2);
        assert_eq!(header.num_terms, 2);

        let loaded = load_snapshot(dir.path()).unwrap();
        assert_eq!(loaded.postings_for("pear"), index.postings_for("pear"));
        assert_eq!(loaded.doc(0).max_tf, 2);
        let sample = std::fs::read_to_string(dir.path().join(VOCAB_FILE)).unwrap();
        assert_eq!(sample, "apple\npear\n");
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_snapshot(dir.path().join("absent")).is_err());
    }
}
