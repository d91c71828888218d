use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use srv_ann_check::cfr::Cfr;
use srv_ann_check::cli::{Cli, Commands, OutputFormat, ScanArgs};
use srv_ann_check::config::{
    Effective, load_file_config, resolve_cfr_path, resolve_effective, skip_requested,
};
use srv_ann_check::discover::discover_inputs;
use srv_ann_check::loader::{Loader, load_symbol_table};
use srv_ann_check::report::write_reports;
use srv_ann_check::scanner::{ScanResult, scan};
use srv_ann_check::symbol::TypeSymbol;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_FINDINGS: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    init_tracing();
    let cli = parse_cli();

    let outcome = match cli.command.clone() {
        Commands::Check {
            scan,
            report_dir,
            no_report,
            format,
            skip,
        } => run_check(&cli, &scan, report_dir.as_deref(), no_report, format, skip),
        Commands::Symbols { scan } => run_symbols(&cli, &scan).map(|()| ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_check(args))
}

fn rewrite_args_for_implicit_check(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["check", "symbols", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--config" || a == "--cfr" {
            idx += 2;
            continue;
        }

        if a.starts_with("--config=") || a.starts_with("--cfr=") {
            idx += 1;
            continue;
        }

        if a == "-h" || a == "--help" {
            return args;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "check".to_string());
        }
    }

    args
}

fn effective(
    cli: &Cli,
    args: &ScanArgs,
    report_dir: Option<&Path>,
    no_report: bool,
) -> Result<Effective> {
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let file = load_file_config(cli.config.as_deref(), &cwd)?;
    Ok(resolve_effective(args, file, report_dir, no_report, &cwd))
}

fn run_check(
    cli: &Cli,
    args: &ScanArgs,
    report_dir: Option<&Path>,
    no_report: bool,
    format: OutputFormat,
    skip: bool,
) -> Result<ExitCode> {
    if skip_requested(skip) {
        tracing::info!("srv-ann-check is skipped");
        return Ok(ExitCode::SUCCESS);
    }

    let eff = effective(cli, args, report_dir, no_report)?;
    eff.scan.validate()?;
    tracing::info!(package = %eff.scan.scope, "Using package");

    let symbols = load_symbols(cli, &eff)?;
    let result = scan(symbols, &eff.scan)?;

    let filter = &result.filter;
    tracing::info!(count = filter.service_types, "Found @Service classes");
    tracing::info!(count = filter.transactional_types, "Found @Transactional classes");
    tracing::info!(
        count = filter.candidates,
        "Found classes with @Service and @Transactional"
    );
    for ignored in &filter.ignored {
        tracing::info!(class = %ignored, "Ignoring class");
    }
    for line in &result.diagnostics {
        tracing::error!("{line}");
    }

    if let Some(dir) = &eff.report_dir {
        let generated_at = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string();
        let paths = write_reports(dir, &result, &generated_at)?;
        tracing::info!(
            json = %paths.json.display(),
            html = %paths.html.display(),
            "Reports written"
        );
    }

    write_check_output(&result, format)?;

    if result.is_compliant() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_FINDINGS))
    }
}

fn run_symbols(cli: &Cli, args: &ScanArgs) -> Result<()> {
    let eff = effective(cli, args, None, true)?;
    eff.scan.validate()?;

    let mut symbols = Vec::new();
    for symbol in load_symbols(cli, &eff)? {
        symbols.push(symbol?);
    }
    println!("{}", serde_json::to_string_pretty(&symbols)?);
    Ok(())
}

fn load_symbols(cli: &Cli, eff: &Effective) -> Result<Vec<Result<TypeSymbol>>> {
    if let Some(path) = &eff.symbols {
        let table = load_symbol_table(path)?;
        tracing::info!(types = table.len(), table = %path.display(), "Loaded symbol table");
        return Ok(table.into_iter().map(Ok).collect());
    }

    if eff.paths.is_empty() {
        anyhow::bail!(
            "No input paths given (pass PATHs, set `paths` in the config file, or use --symbols)"
        );
    }

    let inputs = discover_inputs(&eff.paths)?;
    tracing::info!(
        sources = inputs.sources.len(),
        class_files = inputs.class_files.len(),
        jars = inputs.jars.len(),
        "Discovered inputs"
    );

    let mut loader = Loader::new(&eff.scan);
    if loader.needs_decompiler(&inputs) {
        loader = loader.with_cfr(Cfr::new(resolve_cfr_path(cli)?));
    }
    Ok(loader.load(&inputs))
}

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    compliant: bool,
    scanned_types: usize,
    in_scope_types: usize,
    findings: &'a [srv_ann_check::Finding],
    diagnostics: &'a [String],
}

fn write_check_output(result: &ScanResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = CheckOutput {
                compliant: result.is_compliant(),
                scanned_types: result.scanned_type_count,
                in_scope_types: result.in_scope_type_count,
                findings: &result.findings,
                diagnostics: &result.diagnostics,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            for line in &result.diagnostics {
                println!("{line}");
            }
            println!(
                "scanned: {}, in scope: {}, findings: {}",
                result.scanned_type_count,
                result.in_scope_type_count,
                result.findings.len()
            );
        }
    }
    Ok(())
}
