use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{resolve_config, OutputFormat};
use crate::parsing::seqfile::parse_seqfile;
use crate::split::run_mask;

#[derive(Args)]
pub struct MaskArgs {
    /// Seqfile: optional Newick tree on the first line, then `genome path` rows
    pub seqfile: PathBuf,

    /// Output interval file (`id=<genome>|<contig>  start  end`)
    pub output: PathBuf,

    /// Minimum length of a reported soft-masked run
    #[arg(long)]
    pub mask_filter: Option<u64>,

    /// JSON configuration file
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Directory for intermediate files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Maximum number of genomes to scan at once
    #[arg(short = 'j', long)]
    pub max_jobs: Option<usize>,
}

/// Execute mask subcommand
///
/// # Errors
///
/// Returns an error if masking is disabled, the seqfile is invalid, or a genome can't be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MaskArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = resolve_config(args.config_file.as_deref(), args.mask_filter, args.max_jobs)?;
    let seqfile = parse_seqfile(&args.seqfile)
        .with_context(|| format!("Failed to parse seqfile {}", args.seqfile.display()))?;

    let genomes = run_mask(&seqfile, config, &args.output, args.work_dir.as_deref())?;

    match format {
        OutputFormat::Text => {
            println!(
                "Masked {genomes} genomes into {}",
                args.output.display()
            );
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "genomes": genomes,
                "output": args.output.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}
