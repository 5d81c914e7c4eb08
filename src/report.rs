use crate::mutant::{Mutant, MutantOutcome, MutationSite};
use crate::run_report::MutationRunReport;
use crate::ui::Ui;

/// Print the outcome counts.
pub fn print_summary(ui: &Ui, report: &MutationRunReport) {
    let s = &report.summary;

    ui.title("--- mutation run summary ---");
    ui.line(format!("mutation sites:   {}", report.discovered()));
    ui.line(format!("mutants run:      {}", s.executed()));
    ui.line(format!("mutants killed:   {}", s.killed));
    ui.line(format!("mutants survived: {}", s.survived));
    ui.line(format!("mutants errored:  {}", s.errored));
    if s.timed_out > 0 {
        ui.line(format!("mutants timed out: {}", s.timed_out));
    }
    if s.not_run > 0 {
        ui.line(format!("mutants not run:  {}", s.not_run));
    }
}

/// Print a detailed list of all mutants and their outcomes.
pub fn print_all_mutants(ui: &Ui, report: &MutationRunReport) {
    let mutants: Vec<&Mutant> = report.mutants().collect();
    if mutants.is_empty() {
        return;
    }

    ui.title("--- mutants (detailed) ---");
    for m in mutants {
        let outcome = outcome_label(&m.outcome);
        let duration = duration_label(m.duration_ms);

        ui.line(format!("{:>9} {:>8} {}", outcome, duration, format_mutant(m)));
    }
}

/// Print a short list of surviving mutants.
pub fn print_surviving_mutants(ui: &Ui, report: &MutationRunReport) {
    let total = report.mutants().count();
    let survivors: Vec<&Mutant> = report
        .mutants()
        .filter(|m| m.outcome == MutantOutcome::Survived)
        .collect();

    if survivors.is_empty() {
        return;
    }

    ui.title(format!(
        "--- surviving mutants ({} of {}) ---",
        survivors.len(),
        total
    ));

    for m in survivors {
        ui.line(format_mutant(m));
    }
}

/// Print every site of one scanned file.
pub fn print_sites(ui: &Ui, file: impl std::fmt::Display, sites: &[MutationSite]) {
    ui.title(format!("{file} has {} mutation sites", sites.len()));
    for site in sites {
        ui.line(format!("  {}", format_site(site)));
    }
}

fn outcome_label(outcome: &MutantOutcome) -> &'static str {
    match outcome {
        MutantOutcome::NotRun => "not_run",
        MutantOutcome::Killed => "killed",
        MutantOutcome::Survived => "survived",
        MutantOutcome::Errored { .. } => "errored",
        MutantOutcome::TimedOut => "timed_out",
        MutantOutcome::Fatal { .. } => "fatal",
    }
}

fn duration_label(duration_ms: Option<u64>) -> String {
    match duration_ms {
        Some(ms) => format!("{ms}ms"),
        None => "-".to_string(),
    }
}

/// Format one mutant as a single, readable line.
pub fn format_mutant(m: &Mutant) -> String {
    format_site(&m.site)
}

/// `lib.rs:3:7 [40..42] comparison: "==" -> "!="`
pub fn format_site(site: &MutationSite) -> String {
    format!(
        "{id} [{start}..{end}] {category}: {orig:?} -> {mutated:?}",
        id = site.id(),
        start = site.span.start,
        end = site.span.end,
        category = site.category(),
        orig = site.operator().symbol(),
        mutated = site.replacement().symbol(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Operator, OperatorEntry};
    use crate::span::{Position, SourceSpan};
    use std::path::PathBuf;

    #[test]
    fn format_mutant_is_stable() {
        let site = MutationSite {
            entry: OperatorEntry {
                original: Operator::Shl,
                replacement: Operator::Shr,
                category: Category::Bitwise,
            },
            span: SourceSpan {
                file: PathBuf::from("bits.rs"),
                start: 12,
                end: 14,
            },
            position: Position {
                line: 1,
                column: 13,
            },
        };
        let m = Mutant {
            outcome: MutantOutcome::Survived,
            duration_ms: Some(123),
            ..Mutant::not_run(site)
        };

        insta::assert_snapshot!(format_mutant(&m), @r###"bits.rs:1:13 [12..14] bitwise: "<<" -> ">>""###);
    }

    #[test]
    fn labels_cover_every_outcome() {
        assert_eq!(outcome_label(&MutantOutcome::TimedOut), "timed_out");
        assert_eq!(
            outcome_label(&MutantOutcome::Errored {
                detail: String::new()
            }),
            "errored"
        );
        assert_eq!(duration_label(Some(7)), "7ms");
        assert_eq!(duration_label(None), "-");
    }
}
