use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "srv-ann-check")]
#[command(
    about = "Check that every method of @Service + @Transactional classes carries @PreAuthorize"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./srv-ann-check.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// CFR decompiler jar, needed only for compiled classes
    #[arg(long, value_name = "FILE")]
    pub cfr: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan and report methods without an authorization annotation
    Check {
        #[command(flatten)]
        scan: ScanArgs,

        #[arg(long, value_name = "DIR")]
        report_dir: Option<PathBuf>,

        #[arg(long)]
        no_report: bool,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Do nothing and exit successfully
        #[arg(long)]
        skip: bool,
    },
    /// Print the loaded symbol table as JSON
    Symbols {
        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Source directories, .java files, class directories or jars
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    #[arg(short = 'p', long = "package", value_name = "PKG")]
    pub package: Option<String>,

    #[arg(long = "ignore-class", value_name = "FQN")]
    pub ignore_classes: Vec<String>,

    #[arg(long, value_name = "FQN")]
    pub ignore_annotation: Option<String>,

    /// Pre-built JSON symbol table, used instead of loading PATHs
    #[arg(long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
