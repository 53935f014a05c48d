use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Owning module of a package, as reported by `go list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    #[serde(rename = "Path", default)]
    pub path: String,
}

/// One Go package as described by `go list -json`.
///
/// File sets hold bare file names relative to `dir`. `test_imports` and
/// `external_test_imports` are the direct imports of the test files only; they
/// are not expanded transitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    #[serde(rename = "Dir")]
    pub dir: PathBuf,

    #[serde(rename = "ImportPath")]
    pub import_path: String,

    #[serde(rename = "Module", default)]
    pub module: Option<ModuleRef>,

    /// Production dependencies; `go list` reports these transitively.
    #[serde(rename = "Deps", default)]
    pub dependencies: BTreeSet<String>,

    #[serde(rename = "GoFiles", default)]
    pub production_files: BTreeSet<String>,

    #[serde(rename = "IgnoredGoFiles", default)]
    pub ignored_files: BTreeSet<String>,

    #[serde(rename = "TestGoFiles", default)]
    pub test_files: BTreeSet<String>,

    #[serde(rename = "XTestGoFiles", default)]
    pub external_test_files: BTreeSet<String>,

    #[serde(rename = "EmbedFiles", default)]
    pub embed_files: BTreeSet<String>,

    #[serde(rename = "TestImports", default)]
    pub test_imports: BTreeSet<String>,

    #[serde(rename = "XTestImports", default)]
    pub external_test_imports: BTreeSet<String>,
}

impl Package {
    pub fn module_path(&self) -> &str {
        self.module.as_ref().map(|m| m.path.as_str()).unwrap_or("")
    }

    /// True when the package has at least one test or external-test file.
    pub fn has_tests(&self) -> bool {
        !self.test_files.is_empty() || !self.external_test_files.is_empty()
    }

    pub fn is_test_file(&self, name: &str) -> bool {
        self.test_files.contains(name) || self.external_test_files.contains(name)
    }

    pub fn is_ignored_file(&self, name: &str) -> bool {
        self.ignored_files.contains(name)
    }

    /// Imports used only by the package's tests (internal and external).
    pub fn test_dependencies(&self) -> impl Iterator<Item = &String> {
        self.test_imports.union(&self.external_test_imports)
    }

    /// Whether `import_path` lives inside this package's module.
    pub fn is_in_module(&self, import_path: &str) -> bool {
        is_within_module(import_path, self.module_path())
    }
}

/// `import_path` belongs to `module` when it is the module root itself or
/// one of its sub-packages. An empty module owns nothing.
pub fn is_within_module(import_path: &str, module: &str) -> bool {
    if module.is_empty() {
        return false;
    }
    match import_path.strip_prefix(module) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// A single "something changed at this path" notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Events collected over one quiet window, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub events: Vec<ChangeEvent>,
}

impl ChangeBatch {
    pub fn new(events: Vec<ChangeEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first(&self) -> Option<&ChangeEvent> {
        self.events.first()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.events.iter().map(ChangeEvent::path)
    }
}

/// Result of one completed test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed { detail: String },
}
