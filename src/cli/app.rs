//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use super::context::AppContext;
use super::output::{Output, OutputFormat};
use super::{item, tui};
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about = "A small persistent todo list")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Directory holding the item list
    #[arg(long, global = true, env = "TODO_DIR")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new item
    Add {
        /// Item title
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// List items
    #[command(alias = "ls")]
    List {
        /// Filter: all, active or completed
        filter: Option<String>,
    },

    /// Show one item
    Show {
        /// Item ID or unambiguous prefix
        id: String,
    },

    /// Flip an item between active and completed
    Toggle {
        /// Item ID or unambiguous prefix
        id: String,
    },

    /// Mark every item completed (or active)
    ToggleAll {
        /// Completion state to set; completes all unless all are already completed
        #[arg(value_parser = clap::value_parser!(bool))]
        status: Option<bool>,
    },

    /// Change an item's title; an empty title removes the item
    Edit {
        /// Item ID or unambiguous prefix
        id: String,

        /// New title
        title: Vec<String>,
    },

    /// Remove an item
    #[command(visible_alias = "remove", alias = "destroy")]
    Rm {
        /// Item ID or unambiguous prefix
        id: String,
    },

    /// Remove all completed items
    #[command(alias = "clear")]
    ClearCompleted,

    /// Show the remaining count and filter bar
    Status,

    /// Print the effective configuration
    Config,

    /// Open the interactive terminal UI
    Ui {
        /// Initial filter: all, active or completed
        filter: Option<String>,
    },
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.dir.as_deref())?;
    let format = cli.format.unwrap_or(config.default_format);
    let output = Output::new(format, cli.verbose);

    output.verbose("todo starting");

    let mut ctx = AppContext::open(config, output)?;

    match cli.command {
        Commands::Add { title } => item::add(&mut ctx, &title)?,
        Commands::List { filter } => item::list(&ctx, filter.as_deref())?,
        Commands::Show { id } => item::show(&ctx, &id)?,
        Commands::Toggle { id } => item::toggle(&mut ctx, &id)?,
        Commands::ToggleAll { status } => item::toggle_all(&mut ctx, status)?,
        Commands::Edit { id, title } => item::edit(&mut ctx, &id, &title)?,
        Commands::Rm { id } => item::remove(&mut ctx, &id)?,
        Commands::ClearCompleted => item::clear_completed(&mut ctx)?,
        Commands::Status => item::status(&ctx)?,
        Commands::Ui { filter } => tui::run(&mut ctx, filter.as_deref())?,
        Commands::Config => show_config(&ctx)?,
    }

    Ok(())
}

/// Library diagnostics go to stderr so they never mix with command output
fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// `RUST_LOG` wins when set and valid; otherwise `warn`, or `debug` under `--verbose`
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

fn show_config(ctx: &AppContext) -> Result<()> {
    let config = &ctx.config;
    let data_dir = ctx.data_dir();

    if ctx.output.is_json() {
        ctx.output.data(&serde_json::json!({
            "data_dir": data_dir,
            "storage_key": config.storage_key,
            "default_filter": config.default_filter,
            "default_format": config.default_format,
        }));
    } else {
        println!("data_dir:       {}", data_dir.display());
        println!("storage_key:    {}", config.storage_key);
        println!("default_filter: {}", config.default_filter);
        println!(
            "default_format: {}",
            if config.default_format == OutputFormat::Json { "json" } else { "text" }
        );
    }

    Ok(())
}
