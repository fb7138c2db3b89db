//! Region ingestion command.
//!
//! qtlmap ingest --vcf-file ... --region chr:start-end --samples-file ... --output-file ...

use std::io::{BufWriter, Write};

use anyhow::Result;
use clap::Args;
use tracing::info;

use qtlmap_geno::cohort::{load_id_set, Cohort};
use qtlmap_geno::covariate::load_covariate;
use qtlmap_geno::ingest::{read_genotypes, IngestConfig, VariantIdFilter, VariantRecord};
use qtlmap_geno::region::Region;
use qtlmap_geno::source::VcfFileSource;

#[derive(Args)]
pub struct IngestArgs {
    /// Genotype VCF file (.vcf or .vcf.gz; compressed files need a .tbi)
    #[arg(long)]
    vcf_file: String,

    /// Region to ingest: chrom or chrom:start-end
    #[arg(long)]
    region: String,

    /// Cohort sample list, one sample ID per line
    #[arg(long)]
    samples_file: String,

    /// Output TSV of accepted variants
    #[arg(long)]
    output_file: String,

    /// Minimum minor allele frequency
    #[arg(long, default_value = "0.0")]
    maf_threshold: f64,

    /// Minimum number of samples carrying the minor allele
    #[arg(long, default_value = "0")]
    ma_sample_threshold: u32,

    /// Reject sites whose INFO AF lies within this band of 0 or 1 (0 disables)
    #[arg(long, default_value = "0.0")]
    global_af_threshold: f64,

    /// Minimum per-half MAF under covariate stratification (0 disables)
    #[arg(long, default_value = "0.0")]
    interaction_maf_threshold: f64,

    /// Interaction covariate file: sample ID and value per line
    #[arg(long)]
    interaction_file: Option<String>,

    /// Keep only these sample IDs from the cohort list
    #[arg(long)]
    include_samples: Option<String>,

    /// Drop these sample IDs from the cohort list
    #[arg(long)]
    exclude_samples: Option<String>,

    /// Keep only these variant IDs
    #[arg(long)]
    include_variants: Option<String>,

    /// Drop these variant IDs
    #[arg(long)]
    exclude_variants: Option<String>,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let region = Region::parse(&args.region)?;

    let mut cohort = Cohort::from_file(&args.samples_file)?;
    if let Some(ref path) = args.include_samples {
        cohort = cohort.with_include(load_id_set(path)?)?;
    }
    if let Some(ref path) = args.exclude_samples {
        cohort = cohort.with_exclude(load_id_set(path)?)?;
    }
    info!("Cohort: {} samples", cohort.len());

    let id_filter = VariantIdFilter {
        include: match args.include_variants {
            Some(ref path) => Some(load_id_set(path)?),
            None => None,
        },
        exclude: match args.exclude_variants {
            Some(ref path) => load_id_set(path)?,
            None => Default::default(),
        },
    };

    let config = IngestConfig {
        maf_threshold: args.maf_threshold,
        ma_sample_threshold: args.ma_sample_threshold,
        global_af_threshold: args.global_af_threshold,
        interaction_maf_threshold: args.interaction_maf_threshold,
    };

    let interaction = match args.interaction_file {
        Some(ref path) => Some(load_covariate(path, &cohort)?),
        None => None,
    };

    let mut source = VcfFileSource::open(&args.vcf_file, region)?;
    let panel = read_genotypes(
        &mut source,
        &cohort,
        &config,
        interaction.as_deref(),
        &id_filter,
    )?;

    let output = std::fs::File::create(&args.output_file)?;
    let mut writer = BufWriter::new(output);
    write_summary_header(&mut writer)?;
    for variant in &panel.variants {
        write_summary_line(&mut writer, variant)?;
    }
    writer.flush()?;

    info!(
        "{} variants written to {}",
        panel.variants.len(),
        args.output_file
    );
    Ok(())
}

fn write_summary_header<W: Write>(w: &mut W) -> Result<()> {
    writeln!(w, "id\tchrom\tpos\tmaf\tma_count\tma_samples\tref_factor")?;
    Ok(())
}

fn write_summary_line<W: Write>(w: &mut W, v: &VariantRecord) -> Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{:.6}\t{}\t{}\t{}",
        v.id, v.chrom, v.pos, v.maf, v.ma_count, v.ma_samples, v.ref_factor
    )?;
    Ok(())
}
