//! Cohort registry and sample reconciliation.
//!
//! The cohort is the ordered set of samples the analysis runs on. Sample
//! columns in the genotype file are reconciled against it before the
//! streaming pass: each column label either resolves to a cohort slot, is
//! excluded by the membership predicate, or belongs to no cohort sample.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Ordered cohort sample IDs with O(1) slot lookup.
#[derive(Debug, Clone)]
pub struct Cohort {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    include: Option<HashSet<String>>,
    exclude: HashSet<String>,
}

impl Cohort {
    pub fn new(ids: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                bail!("Duplicate sample ID in cohort: {}", id);
            }
        }
        Ok(Self {
            ids,
            index,
            include: None,
            exclude: HashSet::new(),
        })
    }

    /// Load cohort sample IDs from a file, one per line (first whitespace
    /// column), skipping blanks and `#` comments.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let ids = load_id_list(path.as_ref())?;
        if ids.is_empty() {
            bail!("Empty sample list: {}", path.as_ref().display());
        }
        Self::new(ids)
    }

    /// Restrict the cohort to the given IDs; the retained set also drives
    /// the column membership predicate.
    pub fn with_include(mut self, keep: HashSet<String>) -> Result<Self> {
        let ids: Vec<String> = self.ids.drain(..).filter(|id| keep.contains(id)).collect();
        let mut cohort = Self::new(ids)?;
        cohort.include = Some(keep);
        cohort.exclude = self.exclude;
        Ok(cohort)
    }

    /// Drop the given IDs from the cohort; dropped IDs are also excluded
    /// from column membership.
    pub fn with_exclude(mut self, drop: HashSet<String>) -> Result<Self> {
        let ids: Vec<String> = self.ids.drain(..).filter(|id| !drop.contains(id)).collect();
        let mut cohort = Self::new(ids)?;
        cohort.include = self.include;
        cohort.exclude = drop;
        Ok(cohort)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Slot of a sample ID in cohort order, if it is a cohort sample.
    pub fn slot(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Membership predicate for a file column label: does this label belong
    /// to the analysis at all?
    pub fn is_candidate(&self, id: &str) -> bool {
        if self.exclude.contains(id) {
            return false;
        }
        match &self.include {
            Some(keep) => keep.contains(id),
            None => true,
        }
    }
}

/// Column-to-slot mapping for the sample columns of one genotype file.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// One entry per sample column past the fixed prefix. `Some(slot)` is a
    /// cohort slot, `None` an excluded or unmatched column, never written.
    pub slots: Vec<Option<usize>>,
    pub n_included: usize,
    pub n_excluded: usize,
    pub n_unmatched: usize,
}

/// Number of fixed columns before the sample columns:
/// CHROM, POS, ID, REF, ALT, QUAL, FILTER, INFO, FORMAT.
pub const FIXED_COLS: usize = 9;

/// Reconcile header sample columns against the cohort.
///
/// Fatal when the header is too short or when the columns resolving into
/// the cohort do not cover it exactly; that is a cohort/file mismatch that
/// cannot be silently reconciled.
pub fn map_header_columns(header: &str, cohort: &Cohort) -> Result<ColumnMap> {
    let cols: Vec<&str> = header.split('\t').collect();
    if cols.len() < FIXED_COLS + 1 {
        bail!(
            "Wrong header format: {} columns, expected at least {}",
            cols.len(),
            FIXED_COLS + 1
        );
    }

    let mut map = ColumnMap {
        slots: Vec::with_capacity(cols.len() - FIXED_COLS),
        n_included: 0,
        n_excluded: 0,
        n_unmatched: 0,
    };
    for &label in &cols[FIXED_COLS..] {
        if !cohort.is_candidate(label) {
            map.slots.push(None);
            map.n_excluded += 1;
        } else if let Some(slot) = cohort.slot(label) {
            map.slots.push(Some(slot));
            map.n_included += 1;
        } else {
            map.slots.push(None);
            map.n_unmatched += 1;
        }
    }

    if map.n_included != cohort.len() {
        bail!(
            "Genotype data does not overlap the cohort: matched {} of {} samples, check your files",
            map.n_included,
            cohort.len()
        );
    }
    Ok(map)
}

/// Load IDs from a file, first whitespace column per line.
fn load_id_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample list: {}", path.display()))?;
    let mut ids = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(id) = line.split_whitespace().next() {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Load a set of IDs from a file (same layout as the sample list).
pub fn load_id_set<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    Ok(load_id_list(path.as_ref())?.into_iter().collect())
}
