// ABOUTME: Watch loop for gotestwatch, separated from the command-line front end
// ABOUTME: Debounces notifier events, resolves affected packages and dispatches test runs

pub mod debounce;
pub mod session;
pub mod watcher;

pub use debounce::{collect, DebounceCollector};
pub use session::{BatchOutcome, WatchSession};
pub use watcher::{is_change, spawn_error_monitor, PackageWatcher, WatchChannels};
