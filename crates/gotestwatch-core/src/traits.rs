use crate::{PackageSnapshot, Result, TestOutcome};
use std::path::Path;

/// Build-system metadata source, queried once at startup.
pub trait PackageSource {
    fn load(&self, module_root: &Path) -> Result<PackageSnapshot>;
}

/// Runs the tests of the given packages to completion.
///
/// `Ok` carries the pass/fail verdict; `Err` means the run could not be
/// performed at all (e.g. the test binary failed to spawn).
pub trait TestExecutor {
    fn run(&mut self, targets: &[String]) -> Result<TestOutcome>;
}
