use chrom_split::cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("chrom_split=debug,info")
    } else {
        EnvFilter::new("chrom_split=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Split(args) => {
            cli::split::run(args, cli.format)?;
        }
        cli::Commands::Mask(args) => {
            cli::mask::run(args, cli.format)?;
        }
    }

    Ok(())
}
