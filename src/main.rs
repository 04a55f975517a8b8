// Taxonomy Reader - command-line front end
// Reads IOC or SOF workbooks and prints the taxonomy as JSON, writes it to
// per-taxon files, or prints statistics.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bird_taxonomy::config::DEFAULT_DATA_DIR;
use bird_taxonomy::{
    open_sources, open_workbook, process_ioc_batch, read_sof, write_to_dir, Checklist,
    ReaderConfig, Taxonomy, TaxonomyError,
};

const DRY_RUN_NOTICE: &str = "Dry-run: No taxonomy information will be written to files or to stdout";

#[derive(Parser, Debug)]
#[command(name = "taxonomy-reader", version)]
#[command(about = "Read bird checklist workbooks and print JSON representations to stdout or to files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read IOC World Bird List files (master, other lists, multilingual, complementary)
    Ioc {
        /// IOC file(s) to read, in any order
        files: Vec<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Read a SOF (BirdLife Sweden) names list
    Sof {
        /// SOF names list workbook
        file: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write to JSON files instead of stdout
    #[arg(short, long)]
    write: bool,

    /// Print statistics on the taxonomy
    #[arg(short, long)]
    info: bool,

    /// Print what's going on
    #[arg(short, long)]
    verbose: bool,

    /// Read and check the files, produce no taxonomy output
    #[arg(short, long)]
    dry_run: bool,

    /// Directory generated taxonomies are written under
    #[arg(short, long, env = "TAXONOMY_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    output_dir: PathBuf,
}

impl OutputArgs {
    fn config(&self, checklist: Checklist) -> ReaderConfig {
        ReaderConfig::new(checklist)
            .with_data_dir(&self.output_dir)
            .with_write(self.write)
            .with_info(self.info)
            .with_verbose(self.verbose)
            .with_dry_run(self.dry_run)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Ioc { output, .. } | Command::Sof { output, .. } => output.verbose,
    };
    init_logging(verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<TaxonomyError>())
            .map(TaxonomyError::exit_code)
            .unwrap_or(8);
        process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Ioc { files, output } => {
            let config = output.config(Checklist::Ioc);
            let sources = open_sources(&files)?;
            let outcome = process_ioc_batch(sources, &config.taxonomy_dir())?;
            for (kind, report) in &outcome.merges {
                info!("{}: {} matched, {} updated", kind, report.matched, report.updated);
            }
            emit(&outcome.taxonomy, &config)
        }
        Command::Sof { file, output } => {
            let config = output.config(Checklist::Sof);
            let workbook = open_workbook(&file)?;
            let taxonomy = read_sof(&workbook)?;
            emit(&taxonomy, &config)
        }
    }
}

fn emit(taxonomy: &Taxonomy, config: &ReaderConfig) -> Result<()> {
    if config.dry_run && config.verbose {
        println!("{DRY_RUN_NOTICE}");
    }
    if config.writes_files() {
        let dir = config.taxonomy_dir();
        write_to_dir(taxonomy, &dir)
            .with_context(|| format!("writing taxonomy to {}", dir.display()))?;
    } else if config.prints_json() {
        println!("{}", taxonomy.to_json_pretty()?);
    }
    if config.info {
        print!("{}", taxonomy.info());
    }
    Ok(())
}
