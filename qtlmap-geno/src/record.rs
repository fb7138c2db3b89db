//! Body-line parsing: FORMAT resolution, INFO annotations, and per-sample
//! dosage extraction.
//!
//! Sample fields carry either a continuous dosage (`DS`, a single decimal
//! token) or a discrete genotype call (`GT`, two single-character allele
//! symbols around a phase delimiter). Missing data is mapped to the
//! [`MISSING`] sentinel; dosage values otherwise live in [0, 2].

use anyhow::{bail, Context, Result};

use crate::cohort::{ColumnMap, FIXED_COLS};

/// Missing-dosage sentinel.
pub const MISSING: f64 = -1.0;

/// Index of the INFO column in a body line.
pub const INFO_COL: usize = 7;
/// Index of the FORMAT column in a body line.
pub const FORMAT_COL: usize = 8;

/// How the designated sub-field encodes the genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Continuous dosage (`DS`).
    Dosage,
    /// Discrete genotype call (`GT`).
    Genotype,
}

/// Position and encoding of the genotype sub-field within sample columns.
#[derive(Debug, Clone, Copy)]
pub struct FormatField {
    pub index: usize,
    pub encoding: Encoding,
}

/// Resolve the FORMAT column: `DS` wins over `GT`; `None` when neither
/// sub-field is declared.
pub fn resolve_format(format: &str) -> Option<FormatField> {
    if let Some(index) = format.split(':').position(|f| f == "DS") {
        return Some(FormatField {
            index,
            encoding: Encoding::Dosage,
        });
    }
    format
        .split(':')
        .position(|f| f == "GT")
        .map(|index| FormatField {
            index,
            encoding: Encoding::Genotype,
        })
}

/// Scan the semicolon-separated INFO column for `AF=value`. Returns `None`
/// when the annotation is absent or unparseable; the prefilter treats both
/// as passing.
pub fn info_allele_frequency(info: &str) -> Option<f64> {
    for entry in info.split(';') {
        if let Some((key, value)) = entry.split_once('=') {
            if key == "AF" {
                return value.parse().ok();
            }
        }
    }
    None
}

/// A validated genotype call: either a no-call or an allele pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtCall {
    Missing,
    Alleles(u8, u8),
}

impl GtCall {
    /// Alternate-allele dosage of the call, `MISSING` for a no-call.
    pub fn dosage(self) -> f64 {
        match self {
            GtCall::Missing => MISSING,
            GtCall::Alleles(a0, a1) => f64::from(a0) + f64::from(a1),
        }
    }
}

/// Parse a GT value (`0/1`, `1|0`, `./.`) into a validated call.
///
/// The pair is tokenized on the phase delimiter rather than read at fixed
/// character offsets; a no-call on either side marks the whole call
/// missing. An allele sum outside [0, 2] is fatal: it indicates file
/// corruption, not expected sparsity.
pub fn parse_gt(gt: &str) -> Result<GtCall> {
    let sep = if gt.contains('|') { '|' } else { '/' };
    let mut alleles = gt.split(sep);
    let (a0, a1) = match (alleles.next(), alleles.next(), alleles.next()) {
        (Some(a0), Some(a1), None) => (a0, a1),
        _ => bail!("Genotypes must be diploid calls like 0/0, 0/1 or 1/1, check: {}", gt),
    };
    if a0 == "." || a1 == "." {
        return Ok(GtCall::Missing);
    }
    let a0: u8 = a0
        .parse()
        .with_context(|| format!("Invalid allele in genotype: {}", gt))?;
    let a1: u8 = a1
        .parse()
        .with_context(|| format!("Invalid allele in genotype: {}", gt))?;
    if u16::from(a0) + u16::from(a1) > 2 {
        bail!("Genotypes must be 0/0, 0/1, or 1/1, check: {}", gt);
    }
    Ok(GtCall::Alleles(a0, a1))
}

/// Whole-column no-call tokens, including an empty column.
fn is_no_call(raw: &str) -> bool {
    matches!(raw, "" | "." | "NN" | "NA")
}

/// Dosage of one sample column under the resolved format.
pub fn sample_dosage(raw: &str, fmt: FormatField) -> Result<f64> {
    if is_no_call(raw) {
        return Ok(MISSING);
    }
    // Sub-fields are parallel to the FORMAT declaration; trailing fields
    // may be dropped, which counts as missing.
    let field = match raw.split(':').nth(fmt.index) {
        Some(f) => f,
        None => return Ok(MISSING),
    };
    match fmt.encoding {
        Encoding::Dosage => {
            if field.starts_with('.') {
                Ok(MISSING)
            } else {
                field
                    .parse()
                    .with_context(|| format!("Invalid dosage value: {}", field))
            }
        }
        Encoding::Genotype => Ok(parse_gt(field)?.dosage()),
    }
}

/// Extract the full dosage vector for one body line.
///
/// The vector starts zero-filled; only columns mapped to a cohort slot are
/// written, so excluded columns are never visited. Cohort samples whose
/// column carries a no-call end up at `MISSING`.
pub fn extract_dosages(cols: &[&str], fmt: FormatField, map: &ColumnMap, n: usize) -> Result<Vec<f64>> {
    let expected = FIXED_COLS + map.slots.len();
    if cols.len() != expected {
        bail!(
            "Body line has {} columns, expected {} (header declares {} sample columns)",
            cols.len(),
            expected,
            map.slots.len()
        );
    }
    let mut dosages = vec![0.0; n];
    for (raw, slot) in cols[FIXED_COLS..].iter().zip(&map.slots) {
        if let Some(slot) = *slot {
            dosages[slot] = sample_dosage(raw, fmt)?;
        }
    }
    Ok(dosages)
}
