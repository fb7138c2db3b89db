//! End-to-end ingestion tests over on-disk VCF fixtures.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use qtlmap_geno::cohort::Cohort;
use qtlmap_geno::covariate::median;
use qtlmap_geno::ingest::{read_genotypes, GenotypePanel, IngestConfig, VariantIdFilter};
use qtlmap_geno::region::Region;
use qtlmap_geno::source::VcfFileSource;

const HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3\tS4";

fn write_fixture(dir: &tempfile::TempDir, body: &[&str]) -> PathBuf {
    let path = dir.path().join("geno.vcf");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "##fileformat=VCFv4.2").unwrap();
    writeln!(f, "{}", HEADER).unwrap();
    for line in body {
        writeln!(f, "{}", line).unwrap();
    }
    path
}

fn cohort4() -> Cohort {
    Cohort::new(vec!["S1".into(), "S2".into(), "S3".into(), "S4".into()]).unwrap()
}

fn ingest(
    path: &std::path::Path,
    region: &str,
    config: &IngestConfig,
    interaction: Option<&[f64]>,
) -> anyhow::Result<GenotypePanel> {
    let mut source = VcfFileSource::open(path, Region::parse(region)?)?;
    read_genotypes(
        &mut source,
        &cohort4(),
        config,
        interaction,
        &VariantIdFilter::default(),
    )
}

#[test]
fn genotype_and_dosage_lines_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        &[
            "1\t100\tv1\tA\tG\t.\tPASS\tAF=0.3\tGT:DP\t0/1:10\t1/1:12\t./.:0\t0/0:9",
            "1\t200\tv2\tA\tG\t.\tPASS\t.\tDS\t1.7\t0.0\t0.2\t1.0",
        ],
    );
    let panel = ingest(&path, "1:1-500", &IngestConfig::default(), None).unwrap();

    assert_eq!(panel.variants.len(), 2);
    assert_eq!(panel.summary.n_parsed, 2);

    let v1 = &panel.variants[0];
    assert_eq!(v1.dosages, vec![1.0, 2.0, -1.0, 0.0]);
    // Classes 1, 2, 0 over three non-missing samples: ref=3, alt=3.
    assert_eq!(v1.maf, 0.5);
    assert_eq!(v1.ma_samples, 2);
    assert_eq!(v1.ref_factor, 1);

    let v2 = &panel.variants[1];
    assert_eq!(v2.dosages, vec![1.7, 0.0, 0.2, 1.0]);
    // Rounded classes 2, 0, 0, 1: alt = 3 of 8.
    assert_eq!(v2.maf, 3.0 / 8.0);
    assert_eq!(v2.ma_count, 3);
}

#[test]
fn region_bounds_limit_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        &[
            "1\t100\tv1\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1",
            "1\t200\tv2\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1",
            "1\t300\tv3\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1",
        ],
    );
    let panel = ingest(&path, "1:150-250", &IngestConfig::default(), None).unwrap();
    assert_eq!(panel.variants.len(), 1);
    assert_eq!(panel.variants[0].id, "v2");

    // A region with no overlapping variants cannot produce a usable panel.
    assert!(ingest(&path, "1:400-500", &IngestConfig::default(), None).is_err());
}

#[test]
fn gzipped_input_with_index_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geno.vcf.gz");
    let f = File::create(&path).unwrap();
    let mut gz = flate2::write::GzEncoder::new(f, flate2::Compression::default());
    writeln!(gz, "{}", HEADER).unwrap();
    writeln!(gz, "1\t100\tv1\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1").unwrap();
    gz.finish().unwrap();

    // Without the index: fatal before any line is read.
    assert!(VcfFileSource::open(&path, Region::parse("1").unwrap()).is_err());

    File::create(dir.path().join("geno.vcf.gz.tbi")).unwrap();
    let panel = ingest(&path, "1", &IngestConfig::default(), None).unwrap();
    assert_eq!(panel.variants.len(), 1);
}

#[test]
fn global_af_prefilter_rejects_before_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        &[
            // The sample fields of v1 are corrupt, but the AF prefilter
            // rejects the line before per-sample extraction ever runs.
            "1\t100\tv1\tA\tG\t.\tPASS\tAF=0.01\tGT\t5/5\t5/5\t5/5\t5/5",
            "1\t200\tv2\tA\tG\t.\tPASS\tAF=0.40\tGT\t0/1\t0/1\t0/0\t0/0",
        ],
    );
    let config = IngestConfig {
        global_af_threshold: 0.05,
        ..Default::default()
    };
    let panel = ingest(&path, "1", &config, None).unwrap();
    assert_eq!(panel.summary.n_global_af, 1);
    assert_eq!(panel.variants.len(), 1);
    assert_eq!(panel.variants[0].id, "v2");
}

#[test]
fn cohort_mismatch_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, &["1\t100\tv1\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1"]);

    let cohort = Cohort::new(vec!["S1".into(), "S2".into(), "MISSING".into()]).unwrap();
    let mut source = VcfFileSource::open(&path, Region::parse("1").unwrap()).unwrap();
    let err = read_genotypes(
        &mut source,
        &cohort,
        &IngestConfig::default(),
        None,
        &VariantIdFilter::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("does not overlap"));
}

#[test]
fn malformed_genotype_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        &[
            "1\t100\tv1\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1",
            "1\t200\tv2\tA\tG\t.\tPASS\t.\tGT\t0/1\t2/1\t0/1\t0/1",
        ],
    );
    assert!(ingest(&path, "1", &IngestConfig::default(), None).is_err());
}

#[test]
fn stratified_pass_uses_the_covariate_median() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        &[
            // Upper half (S3, S4) is monomorphic alt: folds to 0.0.
            "1\t100\tv1\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t1/1\t1/1",
            // Both halves carry the alt allele at 0.25.
            "1\t200\tv2\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/0\t0/1\t0/0",
        ],
    );
    let covar = [1.0, 2.0, 3.0, 4.0];
    assert_eq!(median(&covar), 2.5);

    let config = IngestConfig {
        interaction_maf_threshold: 0.2,
        ..Default::default()
    };
    let panel = ingest(&path, "1", &config, Some(&covar)).unwrap();
    assert_eq!(panel.variants.len(), 1);
    assert_eq!(panel.variants[0].id, "v2");
    assert_eq!(panel.summary.n_below_thresholds, 1);

    // Disabled stratification admits both variants with the same input.
    let panel = ingest(&path, "1", &IngestConfig::default(), None).unwrap();
    assert_eq!(panel.variants.len(), 2);
}

#[test]
fn summary_tallies_are_mutually_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        &dir,
        &[
            "1\t100\tskipme\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1",
            "1\t200\tv2\tA\tG\t.\tPASS\t.\tGP\tx\tx\tx\tx",
            "1\t300\tv3\tA\tG\t.\tPASS\tAF=0.001\tGT\t0/1\t0/1\t0/1\t0/1",
            "1\t400\tv4\tA\tG\t.\tPASS\t.\tGT\t0/0\t0/0\t0/0\t0/1",
            "1\t500\tv5\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1",
        ],
    );
    let config = IngestConfig {
        maf_threshold: 0.2,
        global_af_threshold: 0.05,
        ..Default::default()
    };
    let filter = VariantIdFilter {
        include: None,
        exclude: ["skipme".to_string()].into_iter().collect(),
    };
    let mut source = VcfFileSource::open(&path, Region::parse("1").unwrap()).unwrap();
    let panel = read_genotypes(&mut source, &cohort4(), &config, None, &filter).unwrap();

    assert_eq!(panel.summary.n_parsed, 5);
    assert_eq!(panel.summary.n_excluded_id, 1);
    assert_eq!(panel.summary.n_missing_format, 1);
    assert_eq!(panel.summary.n_global_af, 1);
    assert_eq!(panel.summary.n_below_thresholds, 1);
    assert_eq!(panel.summary.n_included, 1);
    assert_eq!(panel.variants[0].id, "v5");
}
