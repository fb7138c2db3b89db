//! Region-bounded line sources.
//!
//! The ingestion pass consumes a `RegionSource`: the final header line of
//! the variant file plus the body lines falling inside one genomic region,
//! in file order. `VcfFileSource` is the shipped implementation over plain
//! or gzip-compressed VCF text; an index-driven reader can implement the
//! same trait.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;

use crate::region::Region;

/// A stream of body lines bounded to one genomic region.
pub trait RegionSource {
    /// The region this source is bounded to.
    fn region(&self) -> &Region;

    /// The last header line of the underlying file, if one was present.
    fn header(&self) -> Option<&str>;

    /// Next in-region body line, in file order. `None` once the region is
    /// exhausted.
    fn next_line(&mut self) -> Result<Option<String>>;
}

/// Line source over a `.vcf` or `.vcf.gz` file.
///
/// BGZF output from bgzip/tabix pipelines is a valid multi-member gzip
/// stream, so compressed inputs are decoded with `MultiGzDecoder` and
/// scanned linearly. Compressed inputs must still carry their `.tbi`
/// index artifact; running against an unindexed file is a setup error.
/// The file handle is owned here and released when the source is dropped,
/// on every exit path.
pub struct VcfFileSource {
    region: Region,
    reader: BufReader<Box<dyn Read>>,
    header: Option<String>,
    /// First body line, read while scanning past the header block.
    pending: Option<String>,
    /// Set once the sorted stream moves past the region's end.
    done: bool,
}

impl VcfFileSource {
    /// Open a variant file and position the stream after its header block.
    pub fn open<P: AsRef<Path>>(path: P, region: Region) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open genotype file: {}", path.display()))?;

        let compressed = path.extension().is_some_and(|e| e == "gz");
        let raw: Box<dyn Read> = if compressed {
            let index = path.with_extension("gz.tbi");
            if !index.is_file() {
                bail!("Index file missing [{}]", index.display());
            }
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let mut reader = BufReader::new(raw);

        // Scan the header block, keeping the last header line. The first
        // non-header line is held back for the body stream.
        let mut header = None;
        let mut pending = None;
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = reader
                .read_line(&mut buf)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if n == 0 {
                break;
            }
            let line = buf.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                header = Some(line.to_string());
            } else {
                pending = Some(line.to_string());
                break;
            }
        }

        Ok(Self {
            region,
            reader,
            header,
            pending,
            done: false,
        })
    }

    fn read_raw_line(&mut self) -> Result<Option<String>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = self
                .reader
                .read_line(&mut buf)
                .context("Failed to read genotype file")?;
            if n == 0 {
                return Ok(None);
            }
            let line = buf.trim_end_matches(['\n', '\r']);
            if !line.is_empty() {
                return Ok(Some(line.to_string()));
            }
        }
    }
}

impl RegionSource for VcfFileSource {
    fn region(&self) -> &Region {
        &self.region
    }

    fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if self.done {
            return Ok(None);
        }
        while let Some(line) = self.read_raw_line()? {
            let (chrom, pos) = locus_of(&line)?;
            if self.region.is_past(chrom, pos) {
                // Positions are sorted within a chromosome.
                self.done = true;
                return Ok(None);
            }
            if self.region.contains(chrom, pos) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

/// Pull CHROM and POS out of a body line without tokenizing the rest.
fn locus_of(line: &str) -> Result<(&str, u64)> {
    let (chrom, rest) = line
        .split_once('\t')
        .with_context(|| format!("Malformed body line (no tab): {:.40}", line))?;
    let pos_field = rest.split('\t').next().unwrap_or("");
    let pos: u64 = pos_field
        .parse()
        .with_context(|| format!("Malformed position '{}' on chromosome {}", pos_field, chrom))?;
    Ok((chrom, pos))
}
