//! # webpub CLI
//!
//! Generates the Makefile that publishes a tree of LaTeX documents, and runs
//! the HTML post-processing steps that Makefile calls back into.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "webpub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "web-publishing.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the Makefile for the current project
    Genmakefile {
        /// Extra files to copy into the build directory (comma separated)
        #[arg(short = 'c', long = "copy", value_delimiter = ',')]
        copy: Vec<PathBuf>,

        /// Makefile to write
        #[arg(short, long, default_value = "Makefile")]
        output: PathBuf,

        /// Print the Makefile instead of writing it
        #[arg(long)]
        stdout: bool,

        /// Print a JSON summary of every registered document
        #[arg(long)]
        json: bool,
    },

    /// Turn make4ht output into a page template for the site generator
    Prepare {
        /// Page data as key=value pairs (comma separated)
        #[arg(short, long, default_value = "")]
        data: String,

        /// HTML produced by make4ht
        input: PathBuf,

        /// Stylesheet produced alongside the HTML
        css: PathBuf,

        /// Page template to write
        output: PathBuf,
    },

    /// Render the site navigation from converted pages
    Navigation {
        /// Site path of the PDF book to link from the menu
        #[arg(short, long)]
        book: Option<String>,

        /// Navigation partial to write
        #[arg(short, long, default_value = "source/_navigation.erb")]
        output: PathBuf,

        /// Build directory prefix to strip from each HTML path
        #[arg(short = 'd', long = "build-dir", default_value = "")]
        build_dir: PathBuf,

        /// Converted HTML pages
        html: Vec<PathBuf>,
    },

    /// Write a starter configuration file
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --stdout output stays clean
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Genmakefile {
            copy,
            output,
            stdout,
            json,
        } => commands::generate_makefile(
            &cli.config,
            &commands::GenerateOptions {
                copy_files: copy,
                output,
                stdout,
                json,
            },
        ),
        Commands::Prepare {
            data,
            input,
            css,
            output,
        } => commands::prepare_page(&data, &input, &css, &output),
        Commands::Navigation {
            book,
            output,
            build_dir,
            html,
        } => commands::write_navigation(&html, &build_dir, book.as_deref(), &output),
        Commands::Init { path } => commands::init_project(path.as_deref()),
    }
}
