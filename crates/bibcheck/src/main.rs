//! bibcheck - unit tests for the Bath bibliography styles

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Session;

#[derive(Parser)]
#[command(name = "bibcheck")]
#[command(version)]
#[command(
    about = "Performs unit tests on LaTeX and CSL output from the Bath (Harvard) bibliography styles",
    long_about = None
)]
struct Cli {
    /// Project root that artifact paths resolve against
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: <root>/bibcheck.yml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never run make; missing artifacts are fatal
    #[arg(long, global = true)]
    no_build: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test output from the bath-bst BibTeX style
    Bst,

    /// Test output from the previous version of the BibTeX style
    BstOld,

    /// Test output from the biblatex style
    Biblatex,

    /// Test the biblatex style against the BibTeX database
    Compat,

    /// Test output from the CSL style rendered by pandoc
    Csl,

    /// Contrast CSL output from pandoc and citeproc-js
    CslImpl,

    /// Contrast the target texts for BibTeX, biblatex and CSL
    Sync,

    /// Pair rendered references with their targets in pandoc HTML
    Align {
        /// Raw HTML rendered by pandoc
        input: PathBuf,

        /// Where to write the annotated document (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibcheck=info,bibcheck_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        root,
        config,
        no_build,
        command,
    } = cli;
    let session = || Session::open(&root, config.as_deref(), !no_build);

    let result = match command {
        Commands::Align { input, output } => {
            commands::align::execute(&input, output.as_deref())?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Bst => commands::latex::bst(&mut session()?)?,
        Commands::BstOld => commands::latex::bst_old(&mut session()?)?,
        Commands::Biblatex => commands::latex::biblatex(&mut session()?)?,
        Commands::Compat => commands::latex::compat(&mut session()?)?,
        Commands::Csl => commands::csl::csl(&mut session()?)?,
        Commands::CslImpl => commands::csl::csl_impl(&mut session()?)?,
        Commands::Sync => commands::sync::execute(&mut session()?)?,
    };

    Ok(commands::print_report(&result))
}
