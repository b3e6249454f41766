//! Docmap CLI - aggregate, search and build documentation maps

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use docmap_core::config::CONFIG_FILE;
use docmap_core::DocmapConfig;

mod build;
mod output;
mod read;
mod search;

#[derive(Parser)]
#[command(name = "docmap")]
#[command(version = docmap_core::VERSION)]
#[command(about = "Aggregate documentation maps across packages", long_about = None)]
struct Cli {
    /// Configuration file (defaults to docmap.toml in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by `read` and `search`.
#[derive(Args, Debug, Clone, Default)]
struct ReadArgs {
    /// Root docmap.json
    #[arg(long)]
    input: Option<PathBuf>,

    /// Only read the root package
    #[arg(long)]
    no_dependencies: bool,

    /// Dotted path to sort shallowly (repeatable)
    #[arg(long)]
    sort: Vec<String>,

    /// Dotted path to sort deeply (repeatable)
    #[arg(long)]
    sort_deep: Vec<String>,

    /// Write the JSON to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<ReadArgs> for read::ReadOptions {
    fn from(args: ReadArgs) -> Self {
        Self {
            input: args.input,
            no_dependencies: args.no_dependencies,
            sort: args.sort,
            sort_deep: args.sort_deep,
            output: args.output,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate the root docmap and its dependencies
    Read {
        #[command(flatten)]
        read: ReadArgs,
    },

    /// Search the aggregated docmap
    Search {
        /// Pattern for the entry type (glob or /regex/)
        #[arg(long = "type")]
        kind: Option<String>,

        /// Pattern for the entry id
        #[arg(long)]
        id: Option<String>,

        /// Pattern for the menu slug
        #[arg(long)]
        slug: Option<String>,

        /// Pattern for the namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Scan sources for docblocks and write docmap.json
    Build {
        /// Source glob relative to the package root (repeatable, replaces the defaults)
        #[arg(long = "glob")]
        globs: Vec<String>,

        /// Glob of files to skip (repeatable, replaces the defaults)
        #[arg(long)]
        exclude: Vec<String>,

        /// Output docmap.json
        #[arg(long)]
        out_path: Option<PathBuf>,

        /// Directory receiving one file per entry
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Also write per-entry MDX files
        #[arg(long)]
        mdx: bool,

        /// Do not write anything
        #[arg(long)]
        no_save: bool,

        /// Remove previous outputs first
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the log subscriber")?;

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = load_config(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Read { read } => {
            read::read_docmap(config, &cwd, read.into())?;
        }

        Commands::Search {
            kind,
            id,
            slug,
            namespace,
            read,
        } => {
            let options = search::SearchOptions {
                kind,
                id,
                slug,
                namespace,
                read: read.into(),
            };
            search::search_docmap(config, &cwd, options)?;
        }

        Commands::Build {
            globs,
            exclude,
            out_path,
            out_dir,
            mdx,
            no_save,
            clear,
        } => {
            let options = build::BuildOptions {
                globs,
                exclude,
                out_path,
                out_dir,
                mdx,
                no_save,
                clear,
            };
            build::build_docmap(config, &cwd, options)?;
        }
    }

    Ok(())
}

/// Load `--config`, or `docmap.toml` from the working directory when present.
fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<DocmapConfig> {
    match explicit {
        Some(path) => {
            let path = cwd.join(path);
            DocmapConfig::from_path(&path)
                .with_context(|| format!("Failed to load configuration '{}'", path.display()))
        }
        None => DocmapConfig::load(cwd)
            .with_context(|| format!("Failed to load {} from '{}'", CONFIG_FILE, cwd.display())),
    }
}
