use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::catalog::{Catalog, CategorySet};
use crate::error::MutateError;
use crate::options::{DEFAULT_PROGRAM, FileConfig, Options};
use crate::report::{print_all_mutants, print_sites, print_summary, print_surviving_mutants};
use crate::run_report::MutationRunReport;
use crate::runner::{Orchestrator, RunSettings, UnitRun};
use crate::scan::{UnitOverview, scan_unit};
use crate::ui::Ui;
use crate::unit::{DirResolver, UnitResolver};
use crate::verify::CommandVerifier;

const EXIT_OK: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_SURVIVORS: u8 = 2;

/// Top-level CLI arguments for the `op-mutant` binary.
#[derive(Debug, Parser)]
#[command(
    name = "op-mutant",
    version,
    about = "Operator mutation testing for Rust crates"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands supported by `op-mutant`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List mutation sites without running anything.
    Scan {
        /// Directory of Rust sources, or a single `.rs` file. Only the files
        /// directly inside it are staged, so a `cargo test` unit needs its
        /// `Cargo.toml` (with `[lib] path = "lib.rs"`) next to the sources.
        unit: PathBuf,

        /// Comma-separated categories to enable (comparison, logical, arithmetic, bitwise).
        #[arg(long)]
        categories: Option<String>,

        /// Emit a machine-readable JSON overview to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Run mutation testing.
    Run {
        /// Directory of Rust sources, or a single `.rs` file. Only the files
        /// directly inside it are staged, so a `cargo test` unit needs its
        /// `Cargo.toml` (with `[lib] path = "lib.rs"`) next to the sources.
        unit: PathBuf,

        /// Comma-separated categories to enable (comparison, logical, arithmetic, bitwise).
        #[arg(long)]
        categories: Option<String>,

        /// TOML file with categories and verification settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Verification program [default: cargo].
        #[arg(long)]
        program: Option<String>,

        /// Prefix of the last output line that marks a failing test run
        /// [default: "error: test failed"].
        #[arg(long)]
        failure_marker: Option<String>,

        /// Kill a verification run after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Run only the first N discovered mutants (deterministic order).
        #[arg(long)]
        limit: Option<usize>,

        /// Skip the verification run on the unmutated workspace.
        #[arg(long)]
        no_baseline: bool,

        /// Leave the staged workspace on disk after the run.
        #[arg(long)]
        keep_workspace: bool,

        /// Print a detailed list of all mutants and their outcomes.
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Emit a machine-readable JSON report to stdout.
        #[arg(long)]
        json: bool,

        /// Exit with code 2 if any mutants survive (useful for CI).
        #[arg(long)]
        fail_on_survivors: bool,

        /// Arguments passed through to the verification command.
        #[arg(last = true)]
        verify_args: Vec<String>,
    },
}

/// Parse CLI arguments and dispatch the selected command.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            unit,
            categories,
            json,
        } => {
            let categories = categories
                .as_deref()
                .map(CategorySet::parse)
                .unwrap_or_default();
            scan(unit, categories, json)
        }

        Command::Run {
            unit,
            categories,
            config,
            program,
            failure_marker,
            timeout,
            limit,
            no_baseline,
            keep_workspace,
            verbose,
            json,
            fail_on_survivors,
            verify_args,
        } => {
            let mut options = Options::new(unit);
            if let Some(path) = config {
                options = options.with_file_config(FileConfig::load(&path)?);
            }
            if let Some(list) = categories {
                options.categories = CategorySet::parse(&list);
            }
            if let Some(program) = program {
                options.verify.program = program;
            }
            if let Some(marker) = failure_marker {
                options.verify.failure_marker = marker;
            }
            if timeout.is_some() {
                options.verify.timeout_secs = timeout;
            }
            options.passthrough = verify_args;
            options.mutant_limit = limit;
            options.baseline = !no_baseline;
            options.keep_workspace = keep_workspace;
            options.json_output = json;

            mutate(&options, verbose, fail_on_survivors)
        }
    }
}

fn scan(unit: PathBuf, categories: CategorySet, json: bool) -> Result<ExitCode> {
    let ui = Ui::new(json);
    ui.title("op-mutant: scan");
    ui.line(format!("unit: {:?}", unit));

    let unit = DirResolver.resolve(&unit)?;
    let overview = scan_unit(&unit, &Catalog::standard(), &categories)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(ExitCode::from(EXIT_OK));
    }

    for file in &overview.files {
        print_sites(&ui, file.file.display(), &file.sites);
    }
    print_scan_summary(&ui, &overview);

    Ok(ExitCode::from(EXIT_OK))
}

fn mutate(options: &Options, verbose: bool, fail_on_survivors: bool) -> Result<ExitCode> {
    let json = options.json_output;
    let mut ui = Ui::new(json);

    ui.title("op-mutant: run");
    ui.line(format!("unit: {:?}", options.unit));
    ui.line(format!("categories: {}", options.categories));
    if options.categories.is_empty() {
        ui.warn("no known operator categories enabled; nothing will be mutated");
    }

    let catalog = Catalog::standard();

    let unit = match DirResolver.resolve(&options.unit) {
        Ok(u) => u,
        Err(e) => return setup_failure(options, e),
    };

    if options.verify.program == DEFAULT_PROGRAM && !unit.has_manifest() {
        ui.warn(format!(
            "no Cargo.toml in {}; only files directly inside the unit are staged, so `cargo test` cannot build it",
            unit.root().display()
        ));
    }

    let settings = RunSettings {
        categories: options.categories.clone(),
        args: options.verification_args(),
        failure_marker: options.verify.failure_marker.clone(),
        limit: options.mutant_limit,
        baseline: options.baseline,
    };
    let verifier = CommandVerifier::new(options.verify.program.clone(), options.timeout());

    ui.line(format!(
        "verification: {} {}",
        verifier.program(),
        settings.args.join(" ")
    ));

    let run = Orchestrator::new(&catalog, &settings, &verifier, &mut ui).run_unit(&unit);
    let UnitRun {
        mut workspace,
        report,
    } = match run {
        Ok(r) => r,
        Err(e) => return setup_failure(options, e),
    };

    if options.keep_workspace {
        let kept = workspace.keep();
        ui.diag(format!("kept workspace at {}", kept.display()));
    }

    let wants_ci_fail = fail_on_survivors && report.summary.survived > 0;
    let exit_code = if report.error.is_some() {
        EXIT_ERROR
    } else if wants_ci_fail {
        EXIT_SURVIVORS
    } else {
        EXIT_OK
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::from(exit_code));
    }

    print_summary(&ui, &report);

    if verbose {
        print_all_mutants(&ui, &report);
    }

    print_surviving_mutants(&ui, &report);

    if let Some(error) = &report.error {
        ui.error(format!("mutation run aborted: {error}"));
    } else if wants_ci_fail {
        ui.warn(format!(
            "mutation testing failed policy: {} mutant(s) survived (--fail-on-survivors)",
            report.summary.survived
        ));
    }

    Ok(ExitCode::from(exit_code))
}

/// Resolution, staging, parse and baseline failures end the run without a mutation report.
fn setup_failure(options: &Options, error: MutateError) -> Result<ExitCode> {
    if options.json_output {
        let report = MutationRunReport::failure(
            options.unit.clone(),
            options.categories.clone(),
            error.to_string(),
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::from(EXIT_ERROR));
    }

    Err(error.into())
}

/// Print a short summary based on the unit overview.
fn print_scan_summary(ui: &Ui, overview: &UnitOverview) {
    ui.title("--- unit overview ---");
    ui.line(format!("unit root:       {}", overview.root.display()));
    ui.line(format!("source files:    {}", overview.files.len()));
    ui.line(format!("mutation sites:  {}", overview.total_sites()));
    for (category, count) in &overview.per_category {
        ui.line(format!("  {:<12}   {}", category.name(), count));
    }
}
