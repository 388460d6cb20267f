//! Line-oriented access to (BGZF-compressed) VCF files with Tabix-assisted region queries.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use noodles::bgzf;

use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;

use super::index::TabixIndex;
use crate::common::io::std::is_gz;
use crate::common::overlaps;
use crate::error::Error;
use crate::vcf::{VcfHeader, VcfLine};

/// The underlying stream of a reader.
enum Source {
    Bgzf(bgzf::io::Reader<File>),
    Plain(BufReader<File>),
}

impl Source {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        match self {
            Source::Bgzf(reader) => reader.read_line(buf),
            Source::Plain(reader) => reader.read_line(buf),
        }
    }
}

/// Cursor state of a region query.
#[derive(Debug)]
struct Region {
    chromosome: String,
    /// 1-based half-open interval.
    start: i32,
    end: i32,
    chunks: std::vec::IntoIter<Chunk>,
    /// End of the chunk being read.
    chunk_end: Option<bgzf::VirtualPosition>,
    done: bool,
}

impl Region {
    /// Read the next line of the region into `buf`, returning `false` when the region is done.
    ///
    /// Lines that cannot be parsed are returned as they are, the scanners report them.
    fn next_line(
        &mut self,
        reader: &mut bgzf::io::Reader<File>,
        buf: &mut String,
    ) -> Result<bool, Error> {
        while !self.done {
            let position = reader.virtual_position();
            if !matches!(self.chunk_end, Some(end) if position < end) {
                let Some(chunk) = self.chunks.next() else {
                    self.done = true;
                    break;
                };
                if position != chunk.start() {
                    reader.seek(chunk.start())?;
                }
                self.chunk_end = Some(chunk.end());
            }

            buf.clear();
            if reader.read_line(buf)? == 0 {
                self.done = true;
                break;
            }
            if buf.starts_with('#') || buf.trim().is_empty() {
                continue;
            }

            let Ok(line) = VcfLine::parse(buf, 0) else {
                return Ok(true);
            };
            if line.chromosome() != self.chromosome {
                continue;
            }
            let interval = line.interval();
            if interval.start >= self.end {
                self.done = true;
            } else if overlaps(&interval, &(self.start..self.end)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Reader for one VCF file.
///
/// The reader keeps a single current line.  After `open` the header has been consumed and no
/// line is current; each `go_next_line` moves to the next data line.  After `seek_region` the
/// reader only visits the lines overlapping that region.
pub struct TabixReader {
    path: PathBuf,
    header: Arc<VcfHeader>,
    index: Option<TabixIndex>,
    source: Option<Source>,
    /// Active region query, if any.
    region: Option<Region>,
    /// First data line, read while looking for the end of the header.
    pending: Option<String>,
    current: Option<String>,
    /// 1-based number of the current line; counted from the region start in region mode.
    line_number: usize,
    buf: String,
}

impl std::fmt::Debug for TabixReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabixReader")
            .field("path", &self.path)
            .field("indexed", &self.index.is_some())
            .field("open", &self.source.is_some())
            .field("region", &self.region)
            .field("line_number", &self.line_number)
            .finish()
    }
}

impl TabixReader {
    /// Open the file at `path` and read its header.
    ///
    /// Files ending in `.gz`/`.bgz` are read through BGZF; `<path>.tbi` is loaded if present.
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        tracing::debug!("Opening VCF file {:?}", path);
        let file = File::open(path)?;
        let (mut source, index) = if is_gz(path) {
            let index_path = TabixIndex::path_for(path);
            let index = if index_path.exists() {
                Some(TabixIndex::from_path(&index_path)?)
            } else {
                tracing::debug!("... no index at {:?}", &index_path);
                None
            };
            (Source::Bgzf(bgzf::io::Reader::new(file)), index)
        } else {
            (Source::Plain(BufReader::new(file)), None)
        };

        let mut text = String::new();
        let mut pending = None;
        let mut line_number = 0;
        let mut buf = String::new();
        loop {
            buf.clear();
            if source.read_line(&mut buf)? == 0 {
                break;
            }
            if buf.starts_with('#') {
                line_number += 1;
                text.push_str(buf.trim_end_matches(['\r', '\n']));
                text.push('\n');
            } else {
                pending = Some(std::mem::take(&mut buf));
                break;
            }
        }
        let header = VcfHeader::parse(&text, path)?;

        Ok(Self {
            path: path.to_path_buf(),
            header: Arc::new(header),
            index,
            source: Some(source),
            region: None,
            pending,
            current: None,
            line_number,
            buf,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Arc<VcfHeader> {
        &self.header
    }

    /// The Tabix index, if one was found.
    pub fn index(&self) -> Option<&TabixIndex> {
        self.index.as_ref()
    }

    /// Raw text of the current line without line terminator.
    pub fn current_line(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Number of the current line, see [`TabixReader`].
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Advance to the next data line; blank lines are skipped.
    ///
    /// Returns `Ok(false)` at the end of the file or region, after which no line is current.
    pub fn go_next_line(&mut self) -> Result<bool, Error> {
        let Some(source) = self.source.as_mut() else {
            return Err(closed(&self.path).into());
        };

        if let Some(region) = self.region.as_mut() {
            let Source::Bgzf(reader) = source else {
                return Err(Error::MissingIndex(self.path.clone()));
            };
            if region.next_line(reader, &mut self.buf)? {
                self.line_number += 1;
                self.current = Some(self.buf.trim_end_matches(['\r', '\n']).to_string());
                return Ok(true);
            }
            self.current = None;
            return Ok(false);
        }

        loop {
            let text = match self.pending.take() {
                Some(text) => text,
                None => {
                    self.buf.clear();
                    if source.read_line(&mut self.buf)? == 0 {
                        self.current = None;
                        return Ok(false);
                    }
                    std::mem::take(&mut self.buf)
                }
            };
            self.line_number += 1;
            let text = text.trim_end_matches(['\r', '\n']);
            if text.trim().is_empty() || text.starts_with('#') {
                continue;
            }
            self.current = Some(text.to_string());
            return Ok(true);
        }
    }

    /// Restrict the reader to the lines overlapping the 1-based half-open interval
    /// `[start, end)` of `chrom`.
    ///
    /// The current line is reset; the next `go_next_line` moves to the first overlapping line.
    pub fn seek_region(&mut self, chrom: &str, start: i32, end: i32) -> Result<(), Error> {
        let Some(index) = self.index.as_ref() else {
            return Err(Error::MissingIndex(self.path.clone()));
        };
        let id = index
            .sequence_id(chrom)
            .ok_or_else(|| Error::InvalidChromosome(chrom.to_string()))?;
        let chunks = index.query_chunks(id, start, end)?;
        tracing::trace!(
            "Query {}:{}-{} reads {} chunk(s)",
            chrom,
            start,
            end,
            chunks.len()
        );
        match self.source {
            Some(Source::Bgzf(_)) => (),
            Some(Source::Plain(_)) => return Err(Error::MissingIndex(self.path.clone())),
            None => return Err(closed(&self.path).into()),
        }

        self.region = Some(Region {
            chromosome: chrom.to_string(),
            start,
            end,
            chunks: chunks.into_iter(),
            chunk_end: None,
            done: false,
        });
        self.pending = None;
        self.current = None;
        self.line_number = 0;
        Ok(())
    }

    /// Query the lines overlapping the 1-based half-open interval `[start, end)` of `chrom`.
    pub fn query(&mut self, chrom: &str, start: i32, end: i32) -> Result<Query<'_>, Error> {
        self.seek_region(chrom, start, end)?;
        Ok(Query {
            reader: self,
            done: false,
        })
    }

    /// Release the file handle; further reads fail.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            tracing::trace!("Closed {:?}", &self.path);
        }
        self.region = None;
        self.pending = None;
        self.current = None;
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }
}

fn closed(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("reader for {} is closed", path.display()),
    )
}

/// Iterator over the lines of a region query.
///
/// Yields each overlapping line once in ascending position order.
pub struct Query<'r> {
    reader: &'r mut TabixReader,
    done: bool,
}

impl Iterator for Query<'_> {
    type Item = Result<VcfLine, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.go_next_line() {
            Ok(true) => {
                let text = self.reader.current_line().unwrap_or_default();
                Some(VcfLine::parse(text, self.reader.line_number()))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
