//! The streaming ingestion pass for one genomic region.
//!
//! Reconciles the file's sample columns against the cohort, precomputes the
//! interaction covariate median when stratified filtering is enabled, then
//! walks the region's body lines once. Each line is either accepted into
//! the output panel or rejected with exactly one tagged reason; the tags
//! are aggregated into the run summary. Fatal conditions abort the whole
//! region scan.

use std::collections::HashSet;

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::cohort::{map_header_columns, Cohort, ColumnMap};
use crate::covariate::median;
use crate::record::{
    extract_dosages, info_allele_frequency, resolve_format, FORMAT_COL, INFO_COL,
};
use crate::source::RegionSource;
use crate::stats::{allele_stats, stratified_maf, ClassCounts};

const PROGRESS_EVERY: u64 = 100_000;

/// Thresholds for the region pass. A zero threshold disables its filter.
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    /// Minimum global minor-allele frequency to keep a variant.
    pub maf_threshold: f64,
    /// Minimum number of samples carrying the minor allele.
    pub ma_sample_threshold: u32,
    /// Symmetric band around the extremes of the population allele
    /// frequency annotation; near-fixed sites inside the band are dropped.
    pub global_af_threshold: f64,
    /// Minimum per-half minor-allele frequency under covariate
    /// stratification; zero disables stratification entirely.
    pub interaction_maf_threshold: f64,
}

/// Optional variant-ID include/exclude sets.
#[derive(Debug, Clone, Default)]
pub struct VariantIdFilter {
    pub include: Option<HashSet<String>>,
    pub exclude: HashSet<String>,
}

impl VariantIdFilter {
    pub fn is_retained(&self, id: &str) -> bool {
        if self.exclude.contains(id) {
            return false;
        }
        match &self.include {
            Some(keep) => keep.contains(id),
            None => true,
        }
    }
}

/// One accepted variant. Created only after every filter stage passed;
/// not mutated again by this crate.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub id: String,
    pub chrom: String,
    pub pos: u64,
    /// Original dosages in cohort order, `-1.0` for missing.
    pub dosages: Vec<f64>,
    /// Zeroed working copy, reserved for downstream transformation.
    pub work: Vec<f64>,
    pub maf: f64,
    pub ma_count: u32,
    pub ma_samples: u32,
    pub ref_factor: i8,
}

/// Why a line was rejected. Exactly one reason per rejected line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Variant ID filtered by the include/exclude sets.
    ExcludedId,
    /// Neither DS nor GT declared in FORMAT.
    MissingFormat,
    /// Population allele frequency inside the near-fixation band.
    GlobalAf,
    /// Below the MAF, minor-allele-sample, or stratified thresholds.
    BelowThresholds,
}

/// Aggregate counts for one region pass.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub n_parsed: u64,
    pub n_included: u64,
    pub n_excluded_id: u64,
    pub n_missing_format: u64,
    pub n_global_af: u64,
    pub n_below_thresholds: u64,
    pub n_samples_included: usize,
    pub n_samples_excluded: usize,
    pub n_samples_unmatched: usize,
}

impl IngestSummary {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::ExcludedId => self.n_excluded_id += 1,
            Rejection::MissingFormat => self.n_missing_format += 1,
            Rejection::GlobalAf => self.n_global_af += 1,
            Rejection::BelowThresholds => self.n_below_thresholds += 1,
        }
    }

    fn log(&self, config: &IngestConfig) {
        info!("{} samples included", self.n_samples_included);
        if self.n_samples_excluded > 0 {
            info!("{} samples excluded", self.n_samples_excluded);
        }
        if self.n_samples_unmatched > 0 {
            info!("{} samples without a cohort entry", self.n_samples_unmatched);
        }
        info!("{} sites included", self.n_included);
        if self.n_excluded_id > 0 {
            info!("{} sites excluded by the variant ID filter", self.n_excluded_id);
        }
        if self.n_missing_format > 0 {
            info!(
                "{} sites excluded because of missing GT/DS field",
                self.n_missing_format
            );
        }
        if self.n_below_thresholds > 0 {
            info!(
                "{} sites excluded because below minor allele thresholds for selected samples",
                self.n_below_thresholds
            );
        }
        if self.n_global_af > 0 {
            info!(
                "{} sites excluded because global allele frequency outside [{}, {}]",
                self.n_global_af,
                config.global_af_threshold,
                1.0 - config.global_af_threshold
            );
        }
    }
}

/// Accepted variants, in input (position) order, plus the run summary.
#[derive(Debug, Clone, Default)]
pub struct GenotypePanel {
    pub variants: Vec<VariantRecord>,
    pub summary: IngestSummary,
}

/// Run the region pass.
///
/// `interaction` is the per-sample covariate in cohort order; required
/// exactly when `interaction_maf_threshold > 0`.
pub fn read_genotypes<S: RegionSource>(
    source: &mut S,
    cohort: &Cohort,
    config: &IngestConfig,
    interaction: Option<&[f64]>,
    id_filter: &VariantIdFilter,
) -> Result<GenotypePanel> {
    let region = source.region().clone();
    info!("Reading genotype data for region {}", region);

    let stratified = config.interaction_maf_threshold > 0.0;
    let interaction = if stratified {
        let values = match interaction {
            Some(v) => v,
            None => bail!("Stratified filtering requires an interaction covariate"),
        };
        if values.len() != cohort.len() {
            bail!(
                "Interaction covariate has {} values for {} cohort samples",
                values.len(),
                cohort.len()
            );
        }
        Some(values)
    } else {
        None
    };
    let split = interaction.map(median).unwrap_or(0.0);
    if stratified {
        debug!("Interaction covariate median = {}", split);
    }

    let header = match source.header() {
        Some(h) => h.to_string(),
        None => bail!("No header line detected"),
    };
    let map = map_header_columns(&header, cohort)?;

    let mut panel = GenotypePanel::default();
    panel.summary.n_samples_included = map.n_included;
    panel.summary.n_samples_excluded = map.n_excluded;
    panel.summary.n_samples_unmatched = map.n_unmatched;

    let n = cohort.len();
    while let Some(line) = source.next_line()? {
        panel.summary.n_parsed += 1;
        if panel.summary.n_parsed % PROGRESS_EVERY == 0 {
            info!("{} lines parsed", panel.summary.n_parsed);
        }

        if let Some(rejection) = process_line(&line, &map, config, interaction, split, id_filter, n, &mut panel)? {
            panel.summary.record(rejection);
        } else {
            panel.summary.n_included += 1;
        }
    }

    panel.summary.log(config);
    if panel.variants.is_empty() {
        bail!("No genotypes passed the filters in region {}", region);
    }
    Ok(panel)
}

/// Process one body line: append to the panel on acceptance, or return the
/// single rejection reason. Fatal parse conditions propagate as errors.
#[allow(clippy::too_many_arguments)]
fn process_line(
    line: &str,
    map: &ColumnMap,
    config: &IngestConfig,
    interaction: Option<&[f64]>,
    split: f64,
    id_filter: &VariantIdFilter,
    n: usize,
    panel: &mut GenotypePanel,
) -> Result<Option<Rejection>> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() <= FORMAT_COL {
        bail!("Body line has only {} columns: {:.60}", cols.len(), line);
    }

    if !id_filter.is_retained(cols[2]) {
        return Ok(Some(Rejection::ExcludedId));
    }

    let fmt = match resolve_format(cols[FORMAT_COL]) {
        Some(fmt) => fmt,
        None => return Ok(Some(Rejection::MissingFormat)),
    };

    if config.global_af_threshold > 0.0 {
        if let Some(af) = info_allele_frequency(cols[INFO_COL]) {
            if af < config.global_af_threshold || af > 1.0 - config.global_af_threshold {
                return Ok(Some(Rejection::GlobalAf));
            }
        }
        // No AF annotation: the site does not fail this filter.
    }

    let dosages = extract_dosages(&cols, fmt, map, n)?;
    let counts = ClassCounts::from_dosages(&dosages)?;
    let stats = allele_stats(&counts);

    // Half-frequencies default to 0.0 when stratification is disabled; the
    // threshold is 0.0 in that case, so the comparison below is vacuous.
    let (maf_lower, maf_upper) = match interaction {
        Some(covar) => {
            let s = stratified_maf(&dosages, covar, split)?;
            (s.lower, s.upper)
        }
        None => (0.0, 0.0),
    };

    let accepted = stats.maf >= config.maf_threshold
        && stats.ma_samples >= config.ma_sample_threshold
        && maf_lower >= config.interaction_maf_threshold
        && maf_upper >= config.interaction_maf_threshold;
    if !accepted {
        return Ok(Some(Rejection::BelowThresholds));
    }

    let pos: u64 = cols[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("Malformed position '{}' for variant {}", cols[1], cols[2]))?;
    panel.variants.push(VariantRecord {
        id: cols[2].to_string(),
        chrom: cols[0].to_string(),
        pos,
        dosages,
        work: vec![0.0; n],
        maf: stats.maf,
        ma_count: stats.ma_count,
        ma_samples: stats.ma_samples,
        ref_factor: stats.ref_factor,
    });
    Ok(None)
}
