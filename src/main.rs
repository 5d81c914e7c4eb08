mod catalog;
mod cli;
mod discover;
mod error;
mod mutant;
mod options;
mod patch;
mod report;
mod run_report;
mod runner;
mod scan;
mod source;
mod span;
mod stage;
mod ui;
mod unit;
mod verify;

/// Entry point for the `op-mutant` binary.
fn main() -> anyhow::Result<std::process::ExitCode> {
    cli::run()
}
