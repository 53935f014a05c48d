use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use gotestwatch_core::{ChangeFilter, PackageSource, WatchConfig};
use gotestwatch_daemon::{spawn_error_monitor, DebounceCollector, PackageWatcher, WatchSession};
use std::path::PathBuf;
use std::process::ExitCode;

mod logging;
mod toolchain;

use toolchain::{GoListSource, GoTestExecutor, GoToolchain};

#[derive(Parser, Debug)]
#[command(name = "gotestwatch")]
#[command(about = "Watches a Go module and re-runs the tests affected by each change", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory to start in (defaults to the current directory)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Configuration file (defaults to gotestwatch.toml at the module root)
    #[arg(long, env = "GOTESTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Quiet period in milliseconds that closes a batch of changes
    #[arg(long, env = "GOTESTWATCH_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    /// File notifications treated as changes (close-write, write)
    #[arg(long)]
    change_filter: Option<ChangeFilter>,

    /// Go toolchain binary
    #[arg(long = "go", value_name = "BINARY", env = "GOTESTWATCH_GO")]
    go_binary: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Extra flags for `go test`, given after `--`
    #[arg(last = true, value_name = "GO_TEST_FLAGS")]
    test_args: Vec<String>,
}

impl Cli {
    /// Command-line values win over the configuration file.
    fn apply_to(&self, config: &mut WatchConfig) {
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(filter) = self.change_filter {
            config.change_filter = filter;
        }
        if let Some(go) = &self.go_binary {
            config.go_binary = go.clone();
        }
        if !self.test_args.is_empty() {
            config.test_args = self.test_args.clone();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Running gotestwatch failed:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let start_dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    if !start_dir.is_dir() {
        bail!("{} is not a directory", start_dir.display());
    }

    // The module root has to be known before its config file can be read.
    let discovery = GoToolchain::new(cli.go_binary.as_deref().unwrap_or("go"));
    let module_root = discovery
        .module_root(&start_dir)
        .context("Failed to locate the Go module")?;

    let mut config = match &cli.config {
        Some(path) => WatchConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => WatchConfig::load(&module_root).context("Failed to load configuration")?,
    };
    cli.apply_to(&mut config);
    config.validate().context("Invalid configuration")?;

    let toolchain = GoToolchain::new(config.go_binary.clone());
    let snapshot = GoListSource::new(toolchain.clone())
        .load(&module_root)
        .context("Failed to load packages")?;

    let (watcher, channels) = PackageWatcher::start(snapshot.directories(), config.change_filter)
        .context("Failed to set up filesystem watcher")?;
    println!("Watching {} directories...", watcher.directories());

    spawn_error_monitor(channels.errors, |err| {
        eprintln!("{} {}", "Error watching directories:".red().bold(), err);
        std::process::exit(1);
    })
    .context("Failed to start watch error monitor")?;

    let executor = GoTestExecutor::new(toolchain, module_root, config.test_args.clone());
    let mut session = WatchSession::new(
        snapshot,
        DebounceCollector::new(config.quiet_window()),
        executor,
        std::io::stdout(),
    );
    session.run(&channels.events).context("Watch loop failed")?;

    drop(watcher);
    Ok(())
}
