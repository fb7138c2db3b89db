//! Allele statistics: genotype-class counts, minor-allele frequency and
//! orientation, and the covariate-stratified frequency split.

use anyhow::{bail, Result};

use crate::record::MISSING;

/// Counts of samples in each genotype class: 0, 1, or 2 copies of the
/// alternate allele. The class domain is closed, so a fixed array indexed
/// by class replaces any keyed structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts([usize; 3]);

impl ClassCounts {
    /// Tally the non-missing entries of a dosage vector.
    pub fn from_dosages(dosages: &[f64]) -> Result<Self> {
        let mut counts = Self::default();
        for &d in dosages {
            if d != MISSING {
                counts.0[genotype_class(d)?] += 1;
            }
        }
        Ok(counts)
    }

    pub fn add(&mut self, class: usize) {
        self.0[class] += 1;
    }

    /// Number of non-missing samples.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn ref_alleles(&self) -> usize {
        2 * self.0[0] + self.0[1]
    }

    pub fn alt_alleles(&self) -> usize {
        self.0[1] + 2 * self.0[2]
    }

    /// Alternate-allele frequency within this tally. NaN when the tally is
    /// empty; every downstream threshold comparison then fails, so empty
    /// halves reject the variant rather than passing it.
    pub fn alt_frequency(&self) -> f64 {
        self.alt_alleles() as f64 / (2.0 * self.total() as f64)
    }
}

/// Round a non-missing dosage to its genotype class. A class outside
/// {0, 1, 2} is fatal: the vector was validated at extraction, so this
/// indicates corruption.
pub fn genotype_class(dosage: f64) -> Result<usize> {
    let r = dosage.round();
    if !(0.0..=2.0).contains(&r) {
        bail!("Dosage values must be between 0 and 2, check: {}", dosage);
    }
    Ok(r as usize)
}

/// Per-variant minor-allele statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlleleStats {
    /// Minor-allele frequency, <= 0.5 whenever any sample was observed.
    pub maf: f64,
    /// Total minor-allele copies across non-missing samples.
    pub ma_count: u32,
    /// Number of samples carrying at least one minor allele.
    pub ma_samples: u32,
    /// +1 when the alternate allele is minor, -1 when the reference is.
    pub ref_factor: i8,
}

/// Derive minor-allele statistics from a class tally. The minor allele is
/// whichever side has fewer copies across non-missing samples; ties keep
/// the alternate allele minor.
pub fn allele_stats(counts: &ClassCounts) -> AlleleStats {
    let ref_alleles = counts.ref_alleles();
    let alt_alleles = counts.alt_alleles();
    let denom = 2.0 * counts.total() as f64;
    let c = &counts.0;
    if ref_alleles >= alt_alleles {
        AlleleStats {
            maf: alt_alleles as f64 / denom,
            ma_count: alt_alleles as u32,
            ma_samples: (c[1] + c[2]) as u32,
            ref_factor: 1,
        }
    } else {
        AlleleStats {
            maf: ref_alleles as f64 / denom,
            ma_count: ref_alleles as u32,
            ma_samples: (c[0] + c[1]) as u32,
            ref_factor: -1,
        }
    }
}

/// Minor-allele frequency within each covariate half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StratifiedMaf {
    pub lower: f64,
    pub upper: f64,
}

/// Recompute the alternate-allele frequency separately on the two halves of
/// the covariate split (>= the median goes to the upper half), then fold
/// each half to the minor-allele convention. The folding is per half,
/// independent of the global orientation.
pub fn stratified_maf(dosages: &[f64], covariate: &[f64], split: f64) -> Result<StratifiedMaf> {
    let mut upper = ClassCounts::default();
    let mut lower = ClassCounts::default();
    for (&d, &v) in dosages.iter().zip(covariate) {
        if d != MISSING {
            let class = genotype_class(d)?;
            if v >= split {
                upper.add(class);
            } else {
                lower.add(class);
            }
        }
    }
    Ok(StratifiedMaf {
        lower: fold(lower.alt_frequency()),
        upper: fold(upper.alt_frequency()),
    })
}

fn fold(freq: f64) -> f64 {
    if freq > 0.5 {
        1.0 - freq
    } else {
        freq
    }
}
