use gotestwatch_core::{ModuleRef, Package};
use std::path::PathBuf;

pub(crate) const MODULE: &str = "example.com/app";

/// A package at `/src/app/<name>` whose `deps` are sibling package names.
pub(crate) fn package(name: &str, deps: &[&str], files: &[&str], tests: &[&str]) -> Package {
    Package {
        dir: PathBuf::from(format!("/src/app/{name}")),
        import_path: format!("{MODULE}/{name}"),
        module: Some(ModuleRef {
            path: MODULE.to_string(),
        }),
        dependencies: deps
            .iter()
            .map(|d| format!("{MODULE}/{d}"))
            .chain(["fmt".to_string()])
            .collect(),
        production_files: files.iter().map(|f| f.to_string()).collect(),
        test_files: tests.iter().map(|f| f.to_string()).collect(),
        ..Default::default()
    }
}
