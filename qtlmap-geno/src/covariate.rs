//! Interaction covariate loading and its median split point.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cohort::Cohort;

/// Load a per-sample covariate from a two-column file (`sample_id value`,
/// tab or space separated, `#` comments skipped) and reorder it to cohort
/// order. Every cohort sample must carry a value.
pub fn load_covariate<P: AsRef<Path>>(path: P, cohort: &Cohort) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read covariate file: {}", path.display()))?;

    let mut by_id: HashMap<&str, f64> = HashMap::with_capacity(cohort.len());
    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let id = fields.next().unwrap_or("");
        let raw = fields
            .next()
            .with_context(|| format!("Line {}: missing covariate value", line_num + 1))?;
        let val: f64 = raw
            .parse()
            .with_context(|| format!("Line {}: invalid covariate value '{}'", line_num + 1, raw))?;
        by_id.insert(id, val);
    }

    let mut values = Vec::with_capacity(cohort.len());
    let mut n_missing = 0usize;
    for id in cohort.ids() {
        match by_id.get(id.as_str()) {
            Some(&v) => values.push(v),
            None => n_missing += 1,
        }
    }
    if n_missing > 0 {
        bail!(
            "Covariate file {} is missing {} of {} cohort samples",
            path.display(),
            n_missing,
            cohort.len()
        );
    }
    Ok(values)
}

/// Median over a copy of the values: middle element for odd length, average
/// of the two central elements for even length.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let s = sorted.len();
    if s % 2 == 0 {
        (sorted[s / 2] + sorted[s / 2 - 1]) / 2.0
    } else {
        sorted[s / 2]
    }
}
