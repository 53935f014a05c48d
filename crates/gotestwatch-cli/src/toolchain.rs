use gotestwatch_core::{
    PackageSnapshot, PackageSource, Result, TestExecutor, TestOutcome, WatchError,
};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

/// Thin wrapper over the `go` command.
///
/// Every invocation gets an explicit working directory; the process-wide
/// current directory is never changed.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    binary: String,
}

impl GoToolchain {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command_line(&self, args: &[&str]) -> String {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run `go <args>` in `dir`, capturing stdout and passing stderr through.
    fn output(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        let command = self.command_line(args);
        debug!("Running `{}` in {:?}", command, dir);
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| WatchError::toolchain(&command, e.to_string()))?;
        if !output.status.success() {
            return Err(WatchError::toolchain(command, output.status.to_string()));
        }
        Ok(output)
    }

    /// Locate the root of the module containing `start_dir` via `go env GOMOD`.
    pub fn module_root(&self, start_dir: &Path) -> Result<PathBuf> {
        let output = self.output(start_dir, &["env", "GOMOD"])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let root = parse_gomod(&stdout)
            .ok_or_else(|| WatchError::NotInModule(start_dir.display().to_string()))?;
        info!("Using Go module at {:?}", root);
        Ok(root)
    }
}

/// Directory holding `go.mod`, given the output of `go env GOMOD`.
///
/// Outside a module the toolchain prints an empty line, or the null device
/// when module mode is forced on.
pub fn parse_gomod(stdout: &str) -> Option<PathBuf> {
    let gomod = stdout.trim();
    if gomod.is_empty() || gomod == "/dev/null" || gomod.eq_ignore_ascii_case("NUL") {
        return None;
    }
    Path::new(gomod).parent().map(Path::to_path_buf)
}

/// Package metadata from `go list -json ./...`.
#[derive(Debug, Clone)]
pub struct GoListSource {
    toolchain: GoToolchain,
}

impl GoListSource {
    pub fn new(toolchain: GoToolchain) -> Self {
        Self { toolchain }
    }
}

impl PackageSource for GoListSource {
    fn load(&self, module_root: &Path) -> Result<PackageSnapshot> {
        let output = self
            .toolchain
            .output(module_root, &["list", "-json", "./..."])?;
        let snapshot = PackageSnapshot::from_go_list_json(&output.stdout)?.canonicalized();
        info!("Loaded {} packages from {:?}", snapshot.len(), module_root);
        Ok(snapshot)
    }
}

/// Runs `go test [args] <packages>` at the module root with the terminal
/// attached.
#[derive(Debug, Clone)]
pub struct GoTestExecutor {
    toolchain: GoToolchain,
    module_root: PathBuf,
    test_args: Vec<String>,
}

impl GoTestExecutor {
    pub fn new(toolchain: GoToolchain, module_root: PathBuf, test_args: Vec<String>) -> Self {
        Self {
            toolchain,
            module_root,
            test_args,
        }
    }
}

impl TestExecutor for GoTestExecutor {
    fn run(&mut self, targets: &[String]) -> Result<TestOutcome> {
        debug!("go test {:?} {:?}", self.test_args, targets);
        let status = Command::new(self.toolchain.binary())
            .arg("test")
            .args(&self.test_args)
            .args(targets)
            .current_dir(&self.module_root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| WatchError::Executor(format!("failed to run go test: {}", e)))?;
        if status.success() {
            Ok(TestOutcome::Passed)
        } else {
            Ok(TestOutcome::Failed {
                detail: status.to_string(),
            })
        }
    }
}
