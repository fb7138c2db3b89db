//! qtlmap-geno: Genotype ingestion for qtlmap-rs
//!
//! Reads genotype data for one genomic region from a tab-delimited,
//! region-indexed variant file, reconciles the file's sample columns
//! against the analysis cohort, computes per-variant allele statistics,
//! and filters variants by allele-frequency and sample-count thresholds.
//! The surviving variants are handed to the downstream engine as an
//! in-memory, position-ordered panel.

pub mod cohort;
pub mod covariate;
pub mod ingest;
pub mod record;
pub mod region;
pub mod source;
pub mod stats;

pub use cohort::{Cohort, ColumnMap};
pub use ingest::{read_genotypes, GenotypePanel, IngestConfig, IngestSummary, VariantRecord};
pub use region::Region;
pub use source::{RegionSource, VcfFileSource};
