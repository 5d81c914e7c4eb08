use console::{Term, style};
use std::{env, fmt::Display};

use crate::mutant::{Mutant, MutantOutcome};

/// Small UI helper:
/// - per-event diagnostics (site counts, mutant outcomes) go to stderr
/// - summaries go to stdout, or to stderr in `--json` mode (stdout stays machine-readable JSON)
/// - fancy styling only on a real TTY and when NO_COLOR/CI are not set
#[derive(Debug, Clone)]
pub struct Ui {
    out: Term,
    err: Term,
    fancy: bool,
    enabled: bool,

    // Observability hooks (used by unit tests). These do not affect output formatting.
    progress_killed: u64,
    progress_survived: u64,
    progress_errored: u64,
    progress_timed_out: u64,
    progress_fatal: u64,
    runner_errors: u64,
}

impl Ui {
    pub fn new(json: bool) -> Self {
        let out = if json { Term::stderr() } else { Term::stdout() };
        let err = Term::stderr();

        // Progress lines are the bulk of the output and they go to stderr.
        let err_is_tty = err.is_term();

        let no_color = env::var_os("NO_COLOR").is_some();
        let in_ci = env::var_os("CI").is_some();

        let fancy = err_is_tty && !no_color && !in_ci;

        Self::with_terms(out, err, fancy, true)
    }

    /// Useful for unit tests to avoid noisy output.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self::with_terms(Term::stdout(), Term::stderr(), false, false)
    }

    fn with_terms(out: Term, err: Term, fancy: bool, enabled: bool) -> Self {
        Self {
            out,
            err,
            fancy,
            enabled,
            progress_killed: 0,
            progress_survived: 0,
            progress_errored: 0,
            progress_timed_out: 0,
            progress_fatal: 0,
            runner_errors: 0,
        }
    }

    fn write_out(&self, s: &str) {
        if self.enabled {
            let _ = self.out.write_line(s);
        }
    }

    fn write_err(&self, s: &str) {
        if self.enabled {
            let _ = self.err.write_line(s);
        }
    }

    pub fn line(&self, msg: impl Display) {
        self.write_out(&msg.to_string());
    }

    pub fn title(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_out(&style(s).bold().to_string());
        } else {
            self.write_out(&s);
        }
    }

    /// Plain line on the diagnostic stream.
    pub fn diag(&self, msg: impl Display) {
        self.write_err(&msg.to_string());
    }

    pub fn warn(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_err(&style(s).yellow().to_string());
        } else {
            self.write_err(&s);
        }
    }

    pub fn error(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.fancy {
            self.write_err(&style(s).red().bold().to_string());
        } else {
            self.write_err(&s);
        }
    }

    /// `lib.rs has 3 mutation sites`
    pub fn file_sites(&self, file: impl Display, count: usize) {
        let s = format!("{file} has {count} mutation sites");
        if self.fancy {
            self.write_err(&style(s).bold().to_string());
        } else {
            self.write_err(&s);
        }
    }

    /// Per-mutant progress line.
    ///
    /// In non-fancy mode this prints the stable `<id> <outcome>` lines that
    /// scripts and the integration tests match on.
    pub fn mutant_progress(&mut self, m: &Mutant) {
        match m.outcome {
            MutantOutcome::Killed => self.progress_killed = self.progress_killed.saturating_add(1),
            MutantOutcome::Survived => {
                self.progress_survived = self.progress_survived.saturating_add(1)
            }
            MutantOutcome::Errored { .. } => {
                self.progress_errored = self.progress_errored.saturating_add(1)
            }
            MutantOutcome::TimedOut => {
                self.progress_timed_out = self.progress_timed_out.saturating_add(1)
            }
            MutantOutcome::Fatal { .. } => {
                self.progress_fatal = self.progress_fatal.saturating_add(1)
            }
            MutantOutcome::NotRun => return,
        }

        if !self.fancy {
            self.write_err(&plain_progress_line(m));
            return;
        }

        let tag = match m.outcome {
            MutantOutcome::Killed => style("KILLED").green().bold(),
            MutantOutcome::Survived => style("SURVIVED").red().bold(),
            MutantOutcome::Errored { .. } => style("ERRORED").yellow().bold(),
            MutantOutcome::TimedOut => style("TIMEOUT").yellow().bold(),
            MutantOutcome::Fatal { .. } => style("FATAL").red().bold(),
            MutantOutcome::NotRun => return,
        };

        let dur = m
            .duration_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "-".to_string());

        let change = format!(
            "{} -> {} ({})",
            m.site.operator(),
            m.site.replacement(),
            m.site.category()
        );

        let detail = match &m.outcome {
            MutantOutcome::Errored { detail } => format!(": {detail}"),
            MutantOutcome::Fatal { reason } => format!(": {reason}"),
            _ => String::new(),
        };

        self.write_err(&format!(
            "{tag:<8} {dur:>7}  {id} {change}{detail}",
            tag = tag,
            id = m.id,
        ));
    }

    /// Used for runner errors; keeps stderr/stdout routing consistent.
    pub fn runner_error(&mut self, msg: impl Display) {
        self.runner_errors += 1;
        self.error(msg);
    }
}

/// Unstyled progress line for one executed mutant.
pub fn plain_progress_line(m: &Mutant) -> String {
    match &m.outcome {
        MutantOutcome::Killed => format!("{} killed", m.id),
        MutantOutcome::Survived => format!("{} survived", m.id),
        MutantOutcome::Errored { detail } => format!("{} errored: {detail}", m.id),
        MutantOutcome::TimedOut => format!("{} timed out", m.id),
        MutantOutcome::Fatal { reason } => format!("{} fatal: {reason}", m.id),
        MutantOutcome::NotRun => format!("{} not run", m.id),
    }
}
