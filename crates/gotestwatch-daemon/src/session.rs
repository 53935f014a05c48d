// ABOUTME: Watch session that connects debounced change batches with test selection
// ABOUTME: Resolves each batch to affected packages and runs their tests sequentially

use colored::Colorize;
use crossbeam_channel::Receiver;
use gotestwatch_core::{
    ChangeBatch, ChangeEvent, PackageSnapshot, Result, TestExecutor, TestOutcome,
};
use gotestwatch_graph::{resolve, ReverseIndex};
use std::io::Write;
use tracing::{debug, info, warn};

use crate::DebounceCollector;

/// Terminal state of one processed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    NoAffectedTests,
    Passed { packages: usize },
    Failed { packages: usize, detail: String },
}

/// Watch session - owns the package model and drives the
/// debounce -> resolve -> execute cycle.
///
/// Batches are handled strictly one after another: a new batch does not start
/// collecting until the previous test run has finished.
pub struct WatchSession<E, W> {
    snapshot: PackageSnapshot,
    index: ReverseIndex,
    collector: DebounceCollector,
    executor: E,
    out: W,
}

impl<E: TestExecutor, W: Write> WatchSession<E, W> {
    pub fn new(snapshot: PackageSnapshot, collector: DebounceCollector, executor: E, out: W) -> Self {
        let index = ReverseIndex::build(&snapshot);
        Self {
            snapshot,
            index,
            collector,
            executor,
            out,
        }
    }

    pub fn snapshot(&self) -> &PackageSnapshot {
        &self.snapshot
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Process batches until the event channel closes.
    ///
    /// Test failures are reported and the loop keeps going; only failures to
    /// write progress output end the session with an error.
    pub fn run(&mut self, events: &Receiver<ChangeEvent>) -> Result<()> {
        while let Some(batch) = self.collector.next_batch(events) {
            self.process_batch(&batch)?;
        }
        info!("Change stream closed, stopping watch session");
        Ok(())
    }

    /// Resolve one batch, run the affected tests and report the outcome.
    pub fn process_batch(&mut self, batch: &ChangeBatch) -> Result<BatchOutcome> {
        self.report_changes(batch)?;

        let targets: Vec<String> = resolve(batch.paths(), &self.snapshot, &self.index)
            .into_iter()
            .collect();
        debug!("Batch of {} change(s) resolved to {:?}", batch.len(), targets);

        let outcome = if targets.is_empty() {
            writeln!(self.out, "No affected tests to run")?;
            BatchOutcome::NoAffectedTests
        } else {
            self.execute(&targets)?
        };

        writeln!(self.out)?;
        self.out.flush()?;
        Ok(outcome)
    }

    fn report_changes(&mut self, batch: &ChangeBatch) -> Result<()> {
        let Some(first) = batch.first() else {
            return Ok(());
        };
        write!(self.out, "{} changed", first.path().display())?;
        if batch.len() > 1 {
            writeln!(self.out, " (and {} others)", batch.len() - 1)?;
        } else {
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn execute(&mut self, targets: &[String]) -> Result<BatchOutcome> {
        let packages = targets.len();
        if packages == 1 {
            writeln!(self.out, "Running tests in 1 package...")?;
        } else {
            writeln!(self.out, "Running tests in {} packages...", packages)?;
        }
        // The test run shares the terminal.
        self.out.flush()?;

        let failure = match self.executor.run(targets) {
            Ok(TestOutcome::Passed) => {
                writeln!(self.out, "{}", "Tests passed".green())?;
                return Ok(BatchOutcome::Passed { packages });
            }
            Ok(TestOutcome::Failed { detail }) => detail,
            Err(e) => e.to_string(),
        };
        warn!("Test run over {} package(s) failed: {}", packages, failure);
        writeln!(self.out, "{} {}", "Tests failed:".red(), failure)?;
        Ok(BatchOutcome::Failed {
            packages,
            detail: failure,
        })
    }
}
