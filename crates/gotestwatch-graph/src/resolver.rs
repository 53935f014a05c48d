use crate::ReverseIndex;
use gotestwatch_core::{Package, PackageSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Select the packages whose tests must run after `changed` files were touched.
///
/// Changes are grouped by directory. A group made up only of test files
/// selects its own package; any other file also selects every direct
/// dependent. Files excluded by build constraints and directories without a
/// package are dropped, and packages without tests never appear in the result.
pub fn resolve<I, P>(changed: I, snapshot: &PackageSnapshot, index: &ReverseIndex) -> BTreeSet<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut affected: BTreeSet<&str> = BTreeSet::new();
    for (dir, files) in group_by_directory(changed) {
        let Some(pkg) = snapshot.get(&dir) else {
            debug!("Ignoring {} change(s) outside known packages in {:?}", files.len(), dir);
            continue;
        };
        affected.extend(affected_by(pkg, &files, index));
    }

    affected
        .into_iter()
        .filter(|import_path| {
            snapshot
                .get_by_import_path(import_path)
                .is_some_and(Package::has_tests)
        })
        .map(str::to_string)
        .collect()
}

fn group_by_directory<I, P>(changed: I) -> BTreeMap<PathBuf, BTreeSet<String>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut by_dir: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();
    for path in changed {
        let path = path.as_ref();
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            continue;
        };
        by_dir
            .entry(dir.to_path_buf())
            .or_default()
            .insert(name.to_string_lossy().into_owned());
    }
    by_dir
}

fn affected_by<'a>(
    pkg: &'a Package,
    files: &BTreeSet<String>,
    index: &'a ReverseIndex,
) -> Vec<&'a str> {
    let relevant: Vec<&String> = files
        .iter()
        .filter(|name| !pkg.is_ignored_file(name))
        .collect();
    if relevant.is_empty() {
        debug!("Only build-constrained files changed in {}", pkg.import_path);
        return Vec::new();
    }

    // Dependents never observe test files.
    if relevant.iter().all(|name| pkg.is_test_file(name)) {
        return vec![pkg.import_path.as_str()];
    }

    // A package is not its own reverse dependency, so add it explicitly.
    let mut targets: Vec<&str> = index.dependents_of(&pkg.import_path).collect();
    targets.push(pkg.import_path.as_str());
    debug!("{} change affects {} package(s)", pkg.import_path, targets.len());
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{package, MODULE};

    fn ip(name: &str) -> String {
        format!("{MODULE}/{name}")
    }

    fn file(pkg: &str, name: &str) -> PathBuf {
        PathBuf::from(format!("/src/app/{pkg}/{name}"))
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| ip(n)).collect()
    }

    /// core <- api <- cmd, with cmd carrying no tests.
    fn app() -> (PackageSnapshot, ReverseIndex) {
        let mut core = package("core", &[], &["core.go"], &["core_test.go"]);
        core.external_test_files = ["example_test.go".to_string()].into();
        core.ignored_files = ["core_windows.go".to_string()].into();
        let snapshot = PackageSnapshot::from_packages([
            core,
            package("api", &["core"], &["api.go"], &["api_test.go"]),
            package("cmd", &["api", "core"], &["main.go"], &[]),
        ]);
        let index = ReverseIndex::build(&snapshot);
        (snapshot, index)
    }

    #[test]
    fn test_production_change_selects_self_and_dependents() {
        let (snapshot, index) = app();
        let targets = resolve([file("core", "core.go")], &snapshot, &index);
        assert_eq!(targets, set(&["api", "core"]));
    }

    #[test]
    fn test_test_file_change_selects_only_own_package() {
        let (snapshot, index) = app();
        let targets = resolve([file("api", "api_test.go")], &snapshot, &index);
        assert_eq!(targets, set(&["api"]));

        let targets = resolve(
            [file("core", "core_test.go"), file("core", "example_test.go")],
            &snapshot,
            &index,
        );
        assert_eq!(targets, set(&["core"]));
    }

    #[test]
    fn test_mixed_change_counts_as_production() {
        let (snapshot, index) = app();
        let targets = resolve(
            [file("core", "core_test.go"), file("core", "core.go")],
            &snapshot,
            &index,
        );
        assert_eq!(targets, set(&["api", "core"]));
    }

    #[test]
    fn test_unlisted_file_counts_as_production() {
        let (snapshot, index) = app();
        let targets = resolve([file("core", "testdata.json")], &snapshot, &index);
        assert_eq!(targets, set(&["api", "core"]));
    }

    #[test]
    fn test_ignored_files_contribute_nothing() {
        let (snapshot, index) = app();
        let targets = resolve([file("core", "core_windows.go")], &snapshot, &index);
        assert!(targets.is_empty());

        // Ignored files are dropped before the test-only check.
        let targets = resolve(
            [file("core", "core_windows.go"), file("core", "core_test.go")],
            &snapshot,
            &index,
        );
        assert_eq!(targets, set(&["core"]));
    }

    #[test]
    fn test_self_inclusion_without_dependents() {
        let (snapshot, index) = app();
        let targets = resolve([file("api", "api.go")], &snapshot, &index);
        // cmd depends on api but has no tests.
        assert_eq!(targets, set(&["api"]));

        let targets = resolve([file("cmd", "main.go")], &snapshot, &index);
        assert!(targets.is_empty());
    }

    #[test]
    fn test_single_level_reverse_lookup() {
        let snapshot = PackageSnapshot::from_packages([
            package("c", &[], &["c.go"], &["c_test.go"]),
            package("b", &["c"], &["b.go"], &["b_test.go"]),
            package("a", &["b"], &["a.go"], &["a_test.go"]),
        ]);
        let index = ReverseIndex::build(&snapshot);
        let targets = resolve([file("c", "c.go")], &snapshot, &index);
        assert!(targets.contains(&ip("b")));
        assert!(targets.contains(&ip("c")));
        assert!(!targets.contains(&ip("a")));
    }

    #[test]
    fn test_test_only_import_selects_dependent() {
        let mut api = package("api", &[], &["api.go"], &["api_test.go"]);
        api.test_imports = [ip("fixtures")].into();
        let snapshot = PackageSnapshot::from_packages([
            package("fixtures", &[], &["fixtures.go"], &[]),
            api,
        ]);
        let index = ReverseIndex::build(&snapshot);
        let targets = resolve([file("fixtures", "fixtures.go")], &snapshot, &index);
        assert_eq!(targets, set(&["api"]));
    }

    #[test]
    fn test_unknown_directories_yield_nothing() {
        let (snapshot, index) = app();
        let targets = resolve(
            [
                PathBuf::from("/src/app/README.md"),
                PathBuf::from("/elsewhere/main.go"),
                PathBuf::from(""),
                PathBuf::from("/"),
            ],
            &snapshot,
            &index,
        );
        assert!(targets.is_empty());
    }

    #[test]
    fn test_batch_equals_union_of_parts() {
        let (snapshot, index) = app();
        let a = file("core", "core.go");
        let b = file("api", "api_test.go");
        let together = resolve([&a, &b], &snapshot, &index);
        let mut separate = resolve([&a], &snapshot, &index);
        separate.extend(resolve([&b], &snapshot, &index));
        assert_eq!(together, separate);
    }

    #[test]
    fn test_duplicates_collapse() {
        let (snapshot, index) = app();
        let targets = resolve(
            [
                file("core", "core.go"),
                file("core", "core.go"),
                file("api", "api.go"),
            ],
            &snapshot,
            &index,
        );
        assert_eq!(targets, set(&["api", "core"]));
        assert_eq!(targets.len(), 2);
    }
}
