use std::path::Path;

use crate::catalog::{Catalog, CategorySet};
use crate::discover::find_sites;
use crate::error::MutateError;
use crate::mutant::{Mutant, MutantOutcome, MutationSite};
use crate::patch;
use crate::run_report::{BaselineReport, FileReport, MutationRunReport, RunSummary};
use crate::source::SourceUnit;
use crate::stage::{Workspace, stage};
use crate::ui::Ui;
use crate::unit::CompilationUnit;
use crate::verify::{Verifier, classify};

/// Knobs for one mutation run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub categories: CategorySet,

    /// Arguments handed to the verifier on every run.
    pub args: Vec<String>,

    /// Prefix of the last output line that marks a kill.
    pub failure_marker: String,

    /// Execute at most this many mutants across the whole unit.
    pub limit: Option<usize>,

    /// Verify the unmutated workspace before mutating anything.
    pub baseline: bool,
}

/// A finished run: the staged workspace (still on disk) and its report.
#[derive(Debug)]
pub struct UnitRun {
    pub workspace: Workspace,
    pub report: MutationRunReport,
}

/// Drives stage -> find -> (apply -> verify -> revert -> classify)* per file.
///
/// Strictly sequential: the verifier sees the whole workspace, so only one
/// operator may differ from the pristine sources at any time.
pub struct Orchestrator<'a, V> {
    catalog: &'a Catalog,
    settings: &'a RunSettings,
    verifier: &'a V,
    ui: &'a mut Ui,

    /// Mutants left under `--limit`.
    remaining: Option<usize>,

    /// Set by the first fatal outcome; everything after it is not run.
    fatal: Option<String>,
}

impl<'a, V: Verifier> Orchestrator<'a, V> {
    pub fn new(catalog: &'a Catalog, settings: &'a RunSettings, verifier: &'a V, ui: &'a mut Ui) -> Self {
        Self {
            catalog,
            settings,
            verifier,
            ui,
            remaining: settings.limit,
            fatal: None,
        }
    }

    /// Stage `unit` and mutate every source file in it.
    ///
    /// Resolution, staging, parse and I/O failures return `Err`. A fatal
    /// verification outcome stops the run but still returns a report, with
    /// `error` set and the unprocessed sites marked `NotRun`.
    pub fn run_unit(mut self, unit: &CompilationUnit) -> Result<UnitRun, MutateError> {
        let workspace = stage(unit.root())?;
        self.ui.diag(format!(
            "using {} as a temporary directory",
            workspace.path().display()
        ));

        let mut report =
            MutationRunReport::new(unit.root().to_path_buf(), self.settings.categories.clone());

        if self.settings.baseline {
            report.baseline = Some(self.run_baseline(workspace.path())?);
        }

        for rel in unit.source_files() {
            if self.fatal.is_some() {
                break;
            }
            report.files.push(self.mutate_file(workspace.path(), rel)?);
        }

        report.summary = RunSummary::from_mutants(report.mutants());
        report.error = self.fatal.take();

        Ok(UnitRun { workspace, report })
    }

    fn run_baseline(&mut self, root: &Path) -> Result<BaselineReport, MutateError> {
        let verification = self.verifier.run(root, &self.settings.args)?;
        let baseline = BaselineReport::from_verification(&verification);

        if !baseline.success {
            return Err(MutateError::Baseline {
                detail: baseline.detail,
            });
        }

        self.ui.diag(format!(
            "baseline verification passed in {}ms",
            baseline.duration_ms
        ));
        Ok(baseline)
    }

    /// Run the mutation loop for one staged file and leave it pristine.
    pub fn mutate_file(&mut self, root: &Path, rel: &Path) -> Result<FileReport, MutateError> {
        let source = SourceUnit::load(root, rel)?;

        // Computed once, from the pristine tree.
        let sites = find_sites(&source, self.catalog, &self.settings.categories);
        self.ui.file_sites(source.file_name(), sites.len());

        let mut mutants = Vec::with_capacity(sites.len());
        for site in sites {
            if self.fatal.is_some() || self.remaining == Some(0) {
                mutants.push(Mutant::not_run(site));
                continue;
            }

            let mutant = self.mutate_site(root, &source, site)?;

            if let Some(n) = self.remaining.as_mut() {
                *n -= 1;
            }
            self.ui.mutant_progress(&mutant);

            if let MutantOutcome::Fatal { reason } = &mutant.outcome {
                let msg = format!("mutation {} could not be verified: {reason}", mutant.id);
                self.ui.runner_error(&msg);
                self.fatal = Some(msg);
            }

            mutants.push(mutant);
        }

        // Pristine on every exit of the loop, including zero sites.
        source.write_pristine()?;

        Ok(FileReport {
            file: rel.to_path_buf(),
            sites: mutants.len(),
            mutants,
        })
    }

    fn mutate_site(
        &mut self,
        root: &Path,
        source: &SourceUnit,
        site: MutationSite,
    ) -> Result<Mutant, MutateError> {
        let mut applied = patch::apply(source, &site)?;
        let verification = self.verifier.run(root, &self.settings.args);
        applied.revert()?;

        let (outcome, duration_ms) = match verification {
            Ok(v) => (
                classify(&v, &self.settings.failure_marker),
                Some(v.duration.as_millis() as u64),
            ),
            Err(e) => (
                MutantOutcome::Fatal {
                    reason: e.to_string(),
                },
                None,
            ),
        };

        Ok(Mutant {
            id: site.id(),
            site,
            outcome,
            duration_ms,
        })
    }
}
