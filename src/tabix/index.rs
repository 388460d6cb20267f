//! Loading, building and writing of Tabix (`.tbi`) indices through `noodles-tabix`.

use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use noodles::bgzf;
use noodles::core::{region::Interval, Position};
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::csi::binning_index::index::header;
use noodles::csi::BinningIndex as _;
use noodles::tabix;

use crate::common::io::std::write_atomically;
use crate::error::Error;
use crate::vcf::VcfLine;

/// Largest position addressable with the Tabix binning scheme (`min_shift=14`, `depth=5`).
pub const MAX_POSITION: usize = (1 << 29) - 1;

/// A Tabix index together with its sequence names.
#[derive(Debug, Clone)]
pub struct TabixIndex {
    inner: tabix::Index,
    names: Vec<String>,
}

impl TabixIndex {
    fn new(inner: tabix::Index) -> Self {
        let names = inner
            .header()
            .map(|header| {
                header
                    .reference_sequence_names()
                    .iter()
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Self { inner, names }
    }

    /// Path of the index that belongs to a data file.
    pub fn path_for(data_path: &Path) -> PathBuf {
        let mut path = data_path.as_os_str().to_owned();
        path.push(".tbi");
        PathBuf::from(path)
    }

    /// Load the index from a `.tbi` file.
    pub fn from_path<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        tracing::debug!("Reading Tabix index {:?}", path.as_ref());
        let inner = tabix::fs::read(path.as_ref()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Io(e)
            } else {
                Error::invalid_index(format!("{}: {}", path.as_ref().display(), e))
            }
        })?;
        if inner.header().is_none() {
            return Err(Error::invalid_index(format!(
                "{}: no Tabix header",
                path.as_ref().display()
            )));
        }
        Ok(Self::new(inner))
    }

    /// Write the index to `path`.
    ///
    /// Nothing is left at `path` if writing fails.
    pub fn write<P>(&self, path: P) -> Result<(), anyhow::Error>
    where
        P: AsRef<Path>,
    {
        write_atomically(path.as_ref(), |out| {
            let mut writer = tabix::io::Writer::new(out);
            writer.write_index(&self.inner)?;
            writer.try_finish()?;
            Ok(true)
        })?;
        Ok(())
    }

    /// Sequence names, the position is the numeric sequence id.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Numeric id of a sequence name.
    pub fn sequence_id(&self, name: &str) -> Option<usize> {
        self.inner
            .header()?
            .reference_sequence_names()
            .get_index_of(name.as_bytes())
    }

    /// Chunks to read for the 1-based half-open region `[start, end)` on sequence `id`.
    ///
    /// The chunks are sorted by start offset and merged where overlapping, so reading them in
    /// order visits every candidate record once.  The region is clamped to the addressable range.
    pub fn query_chunks(&self, id: usize, start: i32, end: i32) -> Result<Vec<Chunk>, Error> {
        let first = usize::try_from(start).unwrap_or(0).clamp(1, MAX_POSITION);
        let last = usize::try_from(end.saturating_sub(1))
            .unwrap_or(0)
            .min(MAX_POSITION);
        let (Some(first), Some(last)) = (Position::new(first), Position::new(last)) else {
            return Ok(Vec::new());
        };
        if first > last {
            return Ok(Vec::new());
        }
        self.inner
            .query(id, Interval::from(first..=last))
            .map_err(|e| Error::invalid_index(e.to_string()))
    }
}

/// Incremental construction of a Tabix index from position-sorted records.
#[derive(Debug)]
pub struct IndexBuilder {
    indexer: tabix::index::Indexer,
    /// Current sequence and 1-based start of its last record, to check sorting.
    last: Option<(String, usize)>,
    seen: Vec<String>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        let mut indexer = tabix::index::Indexer::default();
        indexer.set_header(header::Builder::vcf().build());
        Self {
            indexer,
            last: None,
            seen: Vec::new(),
        }
    }
}

impl IndexBuilder {
    /// Add one record with its 1-based half-open interval and the chunk holding its line.
    pub fn add_record(
        &mut self,
        chrom: &str,
        start: i32,
        end: i32,
        chunk: Chunk,
    ) -> Result<(), Error> {
        let first = usize::try_from(start).unwrap_or(0).clamp(1, MAX_POSITION);
        let last = usize::try_from(end.saturating_sub(1))
            .unwrap_or(0)
            .clamp(first, MAX_POSITION);

        match self.last.as_mut() {
            Some((name, last_start)) if name == chrom => {
                if first < *last_start {
                    return Err(Error::invalid_index(format!(
                        "records not sorted by position on {} at {}",
                        chrom, start
                    )));
                }
                *last_start = first;
            }
            _ => {
                if self.seen.iter().any(|name| name == chrom) {
                    return Err(Error::invalid_index(format!(
                        "records of chromosome {} are not contiguous",
                        chrom
                    )));
                }
                self.seen.push(chrom.to_string());
                self.last = Some((chrom.to_string(), first));
            }
        }

        let (Some(first), Some(last)) = (Position::new(first), Position::new(last)) else {
            return Err(Error::invalid_index(format!(
                "invalid interval {}..{} on {}",
                start, end, chrom
            )));
        };
        self.indexer
            .add_record(chrom, first, last, chunk)
            .map_err(|e| Error::invalid_index(e.to_string()))
    }

    /// Finish building.
    pub fn build(self) -> TabixIndex {
        TabixIndex::new(self.indexer.build())
    }

    /// Build the index of a bgzip-compressed, position-sorted VCF file.
    pub fn build_from_path<P>(path: P) -> Result<TabixIndex, Error>
    where
        P: AsRef<Path>,
    {
        tracing::info!("Indexing {:?}", path.as_ref());
        let mut reader = bgzf::io::Reader::new(File::open(path.as_ref())?);
        let mut builder = Self::default();
        let mut buf = String::new();
        let mut line_number = 0;
        loop {
            let begin = reader.virtual_position();
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                break;
            }
            line_number += 1;
            if buf.starts_with('#') || buf.trim().is_empty() {
                continue;
            }
            let end = reader.virtual_position();

            let line = VcfLine::parse(&buf, line_number)?;
            let interval = line.interval();
            builder.add_record(
                line.chromosome(),
                interval.start,
                interval.end,
                Chunk::new(begin, end),
            )?;
        }

        let index = builder.build();
        tracing::info!("... indexed {} sequences", index.names().len());
        Ok(index)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::testing;

    fn chunk(start: u64, end: u64) -> Chunk {
        Chunk::new(
            bgzf::VirtualPosition::from(start),
            bgzf::VirtualPosition::from(end),
        )
    }

    #[test]
    fn builder_names_and_ids() -> Result<(), anyhow::Error> {
        let mut builder = IndexBuilder::default();
        builder.add_record("1", 100, 101, chunk(10, 20))?;
        builder.add_record("1", 151, 152, chunk(20, 30))?;
        builder.add_record("1", 40_001, 40_002, chunk(30, 40))?;
        builder.add_record("2", 6, 7, chunk(40, 50))?;
        let index = builder.build();

        assert_eq!(index.names(), &["1".to_string(), "2".to_string()]);
        assert_eq!(index.sequence_id("2"), Some(1));
        assert_eq!(index.sequence_id("3"), None);

        Ok(())
    }

    #[test]
    fn builder_rejects_unsorted() -> Result<(), anyhow::Error> {
        let mut builder = IndexBuilder::default();
        builder.add_record("1", 100, 101, chunk(10, 20))?;
        assert!(builder.add_record("1", 51, 52, chunk(20, 30)).is_err());

        let mut builder = IndexBuilder::default();
        builder.add_record("1", 100, 101, chunk(10, 20))?;
        builder.add_record("2", 100, 101, chunk(20, 30))?;
        assert!(builder.add_record("1", 201, 202, chunk(30, 40)).is_err());

        Ok(())
    }

    #[test]
    fn builder_clamps_huge_positions() -> Result<(), anyhow::Error> {
        let mut builder = IndexBuilder::default();
        builder.add_record("1", 100, 101, chunk(10, 20))?;
        builder.add_record("1", i32::MAX - 1, i32::MAX, chunk(20, 30))?;
        let index = builder.build();

        assert_eq!(
            index.query_chunks(0, i32::MAX - 1, i32::MAX)?,
            vec![chunk(20, 30)]
        );

        Ok(())
    }

    #[test]
    fn query_chunks_merges_and_uses_linear_index() -> Result<(), anyhow::Error> {
        let mut builder = IndexBuilder::default();
        builder.add_record("1", 101, 102, chunk(10, 20))?;
        builder.add_record("1", 20_001, 20_002, chunk(20, 30))?;
        builder.add_record("1", 20_101, 140_001, chunk(30, 40))?;
        builder.add_record("1", 40_001, 40_002, chunk(40, 50))?;
        let index = builder.build();

        // Everything, merged into one contiguous chunk.
        assert_eq!(index.query_chunks(0, 1, 200_001)?, vec![chunk(10, 50)]);
        // The first window is skipped through the linear index.
        assert_eq!(
            index.query_chunks(0, 40_001, 40_002)?,
            vec![chunk(30, 50)]
        );
        assert!(index.query_chunks(0, 10, 10)?.is_empty());
        assert!(index.query_chunks(5, 1, 10).is_err());

        Ok(())
    }

    #[test]
    fn build_from_path_and_write() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("sample.vcf.gz");
        testing::write_bgzf_vcf(&path, testing::HEADER, &testing::two_chromosome_lines(), 3)?;

        let index = IndexBuilder::build_from_path(&path)?;
        assert_eq!(index.names(), &["1".to_string(), "2".to_string()]);

        let index_path = TabixIndex::path_for(&path);
        index.write(&index_path)?;
        let loaded = TabixIndex::from_path(&index_path)?;
        assert_eq!(loaded.names(), index.names());
        assert_eq!(
            loaded.query_chunks(1, 1, 100)?,
            index.query_chunks(1, 1, 100)?
        );

        Ok(())
    }

    #[test]
    fn from_path_rejects_garbage() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("broken.vcf.gz.tbi");
        std::fs::write(&path, b"BAI\x01")?;

        assert!(matches!(
            TabixIndex::from_path(&path),
            Err(Error::InvalidIndex(_))
        ));
        assert!(matches!(
            TabixIndex::from_path(tmp_dir.join("missing.tbi")),
            Err(Error::Io(_))
        ));

        Ok(())
    }
}
