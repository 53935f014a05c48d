use crate::{Package, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Every package of one module, keyed by its absolute source directory.
///
/// Built once at startup from the build system's metadata and never mutated.
#[derive(Debug, Clone, Default)]
pub struct PackageSnapshot {
    packages: HashMap<PathBuf, Package>,
    by_import_path: HashMap<String, PathBuf>,
}

impl PackageSnapshot {
    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        let mut snapshot = Self::default();
        for pkg in packages {
            snapshot
                .by_import_path
                .insert(pkg.import_path.clone(), pkg.dir.clone());
            snapshot.packages.insert(pkg.dir.clone(), pkg);
        }
        snapshot
    }

    /// Decode the concatenated JSON objects printed by `go list -json`.
    pub fn from_go_list_json(bytes: &[u8]) -> Result<Self> {
        let packages = serde_json::Deserializer::from_slice(bytes)
            .into_iter::<Package>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::from_packages(packages))
    }

    /// Replace every package directory with its canonical form.
    ///
    /// Some notifier backends report canonical paths (`/private/tmp` for
    /// `/tmp` on macOS), so directories must be canonical both when watched
    /// and when looked up. Directories that cannot be resolved are kept as
    /// reported.
    pub fn canonicalized(self) -> Self {
        Self::from_packages(self.packages.into_values().map(|mut pkg| {
            match std::fs::canonicalize(&pkg.dir) {
                Ok(dir) => pkg.dir = dir,
                Err(e) => debug!("Keeping {:?} as reported: {}", pkg.dir, e),
            }
            pkg
        }))
    }

    pub fn get(&self, dir: &Path) -> Option<&Package> {
        self.packages.get(dir)
    }

    pub fn get_by_import_path(&self, import_path: &str) -> Option<&Package> {
        self.by_import_path
            .get(import_path)
            .and_then(|dir| self.packages.get(dir))
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.packages.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
