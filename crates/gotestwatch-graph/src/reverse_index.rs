use gotestwatch_core::{Package, PackageSnapshot};
use std::collections::{BTreeSet, HashMap};

/// Maps an import path to the in-module packages whose production or test
/// code imports it.
///
/// Only direct imports are recorded for test files, so a dependency that a
/// test reaches through another package is not seen here. A package is never
/// listed as its own dependent.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    // dependency import path -> dependent import paths
    dependents: HashMap<String, BTreeSet<String>>,
}

impl ReverseIndex {
    pub fn build(snapshot: &PackageSnapshot) -> Self {
        let mut index = Self::default();
        for pkg in snapshot.packages() {
            index.record_package(pkg);
        }
        tracing::debug!(
            "Built reverse dependency index: {} imported packages from {} packages",
            index.dependents.len(),
            snapshot.len()
        );
        index
    }

    fn record_package(&mut self, pkg: &Package) {
        // `Deps` does not include test-only imports, so both sets feed the index.
        for dep in pkg.dependencies.iter().chain(pkg.test_dependencies()) {
            if dep == &pkg.import_path || !pkg.is_in_module(dep) {
                continue;
            }
            self.dependents
                .entry(dep.clone())
                .or_default()
                .insert(pkg.import_path.clone());
        }
    }

    /// Packages depending on `import_path`, sorted by import path.
    pub fn dependents_of(&self, import_path: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(import_path)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn dependent_count(&self, import_path: &str) -> usize {
        self.dependents.get(import_path).map_or(0, BTreeSet::len)
    }

    /// Number of import paths with at least one dependent.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}
