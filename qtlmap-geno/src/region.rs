//! Genomic region descriptors.
//!
//! A region bounds the line stream to one genomic interval, either a whole
//! chromosome (`"chr1"`) or a closed interval (`"chr1:10000-20000"`).

use std::fmt;

use anyhow::{bail, Context, Result};

/// One genomic interval, 1-based and inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Parse a region descriptor: `chrom` or `chrom:start-end`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("Empty region descriptor");
        }
        match s.split_once(':') {
            None => Ok(Self::new(s, 1, u64::MAX)),
            Some((chrom, span)) => {
                if chrom.is_empty() {
                    bail!("Invalid region '{}': missing chromosome", s);
                }
                let (start, end) = span
                    .split_once('-')
                    .with_context(|| format!("Invalid region '{}': expected chrom:start-end", s))?;
                let start: u64 = start
                    .parse()
                    .with_context(|| format!("Invalid region start in '{}'", s))?;
                let end: u64 = end
                    .parse()
                    .with_context(|| format!("Invalid region end in '{}'", s))?;
                if start == 0 || end < start {
                    bail!("Invalid region '{}': bounds must satisfy 1 <= start <= end", s);
                }
                Ok(Self::new(chrom, start, end))
            }
        }
    }

    /// Whether a position on a chromosome falls inside this region.
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        chrom == self.chrom && pos >= self.start && pos <= self.end
    }

    /// Whether a position on this region's chromosome lies past its end.
    /// Used to stop scanning a position-sorted stream early.
    pub fn is_past(&self, chrom: &str, pos: u64) -> bool {
        chrom == self.chrom && pos > self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == 1 && self.end == u64::MAX {
            write!(f, "{}", self.chrom)
        } else {
            write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
        }
    }
}
