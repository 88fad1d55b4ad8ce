//! CLI entry point for Ruby code intelligence.
//!
//! Indexes a handful of files and answers hover or ancestor queries against
//! them, using nothing beyond the library API.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use ruby_insight::workspace::path_to_uri;
use ruby_insight::{Settings, Workspace, logging};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct HoverOutput {
    file: String,
    line: u32,
    column: u16,
    contents: Option<String>,
}

#[derive(Debug, Serialize)]
struct AncestorsOutput {
    namespace: String,
    ancestors: Vec<String>,
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "ruby-insight",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hover and ancestor queries over Ruby source",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show hover content at a zero-based position
    Hover {
        /// File to hover in (Ruby, `.erb`, or a Gemfile)
        file: PathBuf,

        /// Zero-based line
        line: u32,

        /// Zero-based column
        column: u16,

        /// Additional files to index before answering
        #[arg(short, long = "with", value_name = "FILE")]
        with: Vec<PathBuf>,

        /// Print JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// Print the linearized ancestors of a class or module
    Ancestors {
        /// Fully qualified namespace, e.g. `Foo::Bar`
        namespace: String,

        /// Files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print JSON instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Create .ruby-insight/settings.toml with default settings
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,
}

fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {}",
                path.display(),
                e
            );
            std::process::exit(1);
        }),
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    logging::init(&settings.logging, cli.verbose || settings.debug);

    if let Err(e) = run(cli.command, settings) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands, settings: Settings) -> Result<()> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            Ok(())
        }
        Commands::Config => {
            println!("{}", settings.to_toml().context("failed to render settings")?);
            Ok(())
        }
        Commands::Hover {
            file,
            line,
            column,
            with,
            json,
        } => hover(settings, &file, line, column, &with, json),
        Commands::Ancestors {
            namespace,
            files,
            json,
        } => ancestors(settings, &namespace, &files, json),
    }
}

fn hover(
    settings: Settings,
    file: &Path,
    line: u32,
    column: u16,
    with: &[PathBuf],
    json: bool,
) -> Result<()> {
    let workspace = Workspace::new(settings)?;
    for path in with {
        workspace.index_path(path)?;
    }

    if let Some(lockfile) = lockfile_for(file) {
        workspace.load_lockfile(&lockfile)?;
    }

    let file_id = workspace.open_path(file)?;
    let contents = workspace.resolve_at(file_id, line, column)?;

    if json {
        let output = HoverOutput {
            file: path_to_uri(file),
            line,
            column,
            contents,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match contents {
            Some(text) => println!("{text}"),
            None => eprintln!("No hover content at {}:{line}:{column}", file.display()),
        }
    }
    Ok(())
}

/// `Gemfile.lock` next to a hovered `Gemfile`, when there is one.
fn lockfile_for(file: &Path) -> Option<PathBuf> {
    if file.file_name()? != "Gemfile" {
        return None;
    }
    let lockfile = file.with_file_name("Gemfile.lock");
    lockfile.is_file().then_some(lockfile)
}

fn ancestors(settings: Settings, namespace: &str, files: &[PathBuf], json: bool) -> Result<()> {
    let workspace = Workspace::new(settings)?;
    for path in files {
        workspace.index_path(path)?;
    }

    let ancestors = workspace.index().ancestors(namespace);
    if json {
        let output = AncestorsOutput {
            namespace: namespace.to_string(),
            ancestors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for name in &ancestors {
            println!("{name}");
        }
    }
    Ok(())
}
