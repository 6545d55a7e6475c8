use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use jsbloat_cli::OutputFormat;
use jsbloat_cli::commands;
use jsbloat_cli::commands::unused::UnusedArgs;
use jsbloat_core::analysis::{
    AuditOptions, DEFAULT_BUNDLE_SOURCE_UNUSED_THRESHOLD, DEFAULT_UNUSED_THRESHOLD,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jsbloat")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Find JavaScript a page downloads but never runs",
    long_about = "jsbloat reads a page load's HAR file and the browser's precise JS coverage, \
                  estimates how many transferred bytes of each script went unused, and rolls \
                  the waste up by the entity that served it."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Report unused JavaScript per script and per entity
    Unused {
        /// HAR file recorded during the page load
        #[arg(long, value_name = "FILE")]
        har: PathBuf,

        /// Precise coverage dump (parsed scripts and function ranges)
        #[arg(long, value_name = "FILE")]
        coverage: PathBuf,

        /// Source map bundles of the page's scripts
        #[arg(long, value_name = "FILE")]
        bundles: Option<PathBuf>,

        /// Extra entity definitions, taking precedence over the builtin catalog
        #[arg(long, value_name = "FILE")]
        entities: Option<PathBuf>,

        /// URL of the audited page (defaults to the first document in the HAR)
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,

        /// Report scripts wasting strictly more transfer bytes than this
        #[arg(
            long,
            value_name = "BYTES",
            env = "JSBLOAT_UNUSED_THRESHOLD",
            default_value_t = DEFAULT_UNUSED_THRESHOLD,
            allow_negative_numbers = true
        )]
        unused_threshold: i64,

        /// List bundle sources wasting strictly more transfer bytes than this
        #[arg(
            long,
            value_name = "BYTES",
            env = "JSBLOAT_SOURCE_THRESHOLD",
            default_value_t = DEFAULT_BUNDLE_SOURCE_UNUSED_THRESHOLD,
            allow_negative_numbers = true
        )]
        source_threshold: i64,

        /// Scripts summarized concurrently
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        concurrency: u64,
    },

    /// List the entity catalog, or classify URLs against it
    Entities {
        /// Extra entity definitions, taking precedence over the builtin catalog
        #[arg(long, value_name = "FILE")]
        entities: Option<PathBuf>,

        /// URLs to classify
        #[arg(value_name = "URL")]
        urls: Vec<String>,
    },

    /// Generate shell completion scripts
    #[command(long_about = "Generate shell completion scripts for jsbloat.

SUPPORTED SHELLS:
  bash, zsh, fish, powershell, elvish

INSTALLATION:

  Bash:
    jsbloat completion --shell bash > ~/.local/share/bash-completion/completions/jsbloat

  Zsh:
    jsbloat completion --shell zsh > ~/.zfunc/_jsbloat
    # Add to ~/.zshrc: fpath=(~/.zfunc $fpath); autoload -Uz compinit; compinit

  Fish:
    jsbloat completion --shell fish > ~/.config/fish/completions/jsbloat.fish

  PowerShell:
    jsbloat completion --shell powershell >> $PROFILE")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Unused {
            har,
            coverage,
            bundles,
            entities,
            page_url,
            unused_threshold,
            source_threshold,
            concurrency,
        } => {
            let args = UnusedArgs {
                bundles,
                entities,
                page_url,
                options: AuditOptions::default()
                    .with_unused_threshold(unused_threshold)
                    .with_bundle_source_unused_threshold(source_threshold)
                    .with_concurrency(concurrency as usize),
                ..UnusedArgs::new(har, coverage)
            };
            commands::unused::execute(&args, cli.format)
        }
        Commands::Entities { entities, urls } => {
            commands::entities::execute(entities.as_deref(), &urls, cli.format)
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("jsbloat=debug,jsbloat_cli=debug,jsbloat_core=debug,jsbloat_entities=debug")
    } else {
        EnvFilter::new("jsbloat=info,jsbloat_cli=info")
    };

    // Logs go to stderr so json and table output stay parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
