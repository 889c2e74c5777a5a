use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::cli::{resolve_config, OutputFormat};
use crate::core::config::ContigSelector;
use crate::parsing::contigs::parse_contig_list_file;
use crate::parsing::seqfile::parse_seqfile;
use crate::split::{run_split, ExportSummary, SplitRequest, Toolchain};
use crate::utils::location::Location;

/// Which program pulls sequences out of genome FASTAs
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum ExtractorKind {
    /// `samtools faidx --region-file`
    #[default]
    Samtools,
    /// Built-in FASTA reader; no external dependency
    Native,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Seqfile: optional Newick tree on the first line, then `genome path` rows
    pub seqfile: PathBuf,

    /// Reference graph in rGFA format (may be gzipped; path or http(s) URL)
    pub graph: String,

    /// Alignment of every genome to the graph in PAF format (may be gzipped)
    pub alignment: String,

    /// Output directory or http(s) URL
    #[arg(long, required = true)]
    pub out_dir: String,

    /// Reference contigs to keep as separate chromosomes
    #[arg(long, num_args = 1..)]
    pub ref_contigs: Vec<String>,

    /// File of reference contigs, one per line (merged with --ref-contigs)
    #[arg(long)]
    pub ref_contigs_file: Option<PathBuf>,

    /// Label pooling every reference contig not listed in --ref-contigs
    #[arg(long)]
    pub other_contig: Option<String>,

    /// Reference genome, exempt from ambiguity filtering
    #[arg(long)]
    pub reference: Option<String>,

    /// Ignore soft-masked runs at least this long when partitioning (0 disables)
    #[arg(long)]
    pub mask_filter: Option<u64>,

    /// JSON configuration file (thresholds, label names, tool paths)
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Directory for intermediate files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Maximum number of tasks to run at once
    #[arg(short = 'j', long)]
    pub max_jobs: Option<usize>,

    /// Region extractor used to slice genomes
    #[arg(long, value_enum, default_value = "samtools")]
    pub extractor: ExtractorKind,
}

/// Execute split subcommand
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any stage of the split fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SplitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = resolve_config(args.config_file.as_deref(), args.mask_filter, args.max_jobs)?;

    let mut contigs = args.ref_contigs.clone();
    if let Some(path) = &args.ref_contigs_file {
        let from_file = parse_contig_list_file(path)
            .with_context(|| format!("Failed to read contigs from {}", path.display()))?;
        info!("Read {} reference contigs from {}", from_file.len(), path.display());
        contigs.extend(from_file);
    }
    let selector = ContigSelector::new(contigs, args.other_contig.clone(), args.reference.clone())?;

    let seqfile = parse_seqfile(&args.seqfile)
        .with_context(|| format!("Failed to parse seqfile {}", args.seqfile.display()))?;

    let toolchain = match args.extractor {
        ExtractorKind::Samtools => Toolchain::external(&config),
        ExtractorKind::Native => Toolchain::external(&config).with_native_extractor(),
    };

    let request = SplitRequest {
        seqfile,
        graph: Location::parse(&args.graph)?,
        alignment: Location::parse(&args.alignment)?,
        out_dir: Location::parse(&args.out_dir)?,
        config,
        selector,
        work_dir: args.work_dir.clone(),
    };
    let summary = run_split(request, toolchain)?;

    print_summary(&summary, format)
}

fn print_summary(summary: &ExportSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "Split into {} chromosomes ({} files written)",
                summary.labels, summary.files
            );
            println!("Chromfile: {}", summary.chromfile);
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "labels": summary.labels,
                "files": summary.files,
                "chromfile": summary.chromfile.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
