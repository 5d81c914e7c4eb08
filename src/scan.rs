use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::{Catalog, Category, CategorySet};
use crate::discover::find_sites;
use crate::error::MutateError;
use crate::mutant::MutationSite;
use crate::source::SourceUnit;
use crate::unit::CompilationUnit;

/// Mutation sites of one file, found without running anything.
#[derive(Debug, Clone, Serialize)]
pub struct FileOverview {
    pub file: PathBuf,
    pub sites: Vec<MutationSite>,
}

/// High-level overview of a compilation unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitOverview {
    /// Directory holding the sources.
    pub root: PathBuf,

    /// Per-file sites in processing order.
    pub files: Vec<FileOverview>,

    /// Number of sites per enabled category.
    pub per_category: BTreeMap<Category, usize>,
}

impl UnitOverview {
    pub fn total_sites(&self) -> usize {
        self.files.iter().map(|f| f.sites.len()).sum()
    }
}

/// Parse the original sources in place (read-only) and list their sites.
pub fn scan_unit(
    unit: &CompilationUnit,
    catalog: &Catalog,
    categories: &CategorySet,
) -> Result<UnitOverview, MutateError> {
    let mut per_category: BTreeMap<Category, usize> =
        categories.iter().map(|c| (c, 0)).collect();
    let mut files = Vec::with_capacity(unit.source_files().len());

    for rel in unit.source_files() {
        let source = SourceUnit::load(unit.root(), rel)?;
        let sites = find_sites(&source, catalog, categories);

        for site in &sites {
            *per_category.entry(site.category()).or_default() += 1;
        }

        files.push(FileOverview {
            file: rel.clone(),
            sites,
        });
    }

    Ok(UnitOverview {
        root: unit.root().to_path_buf(),
        files,
        per_category,
    })
}
