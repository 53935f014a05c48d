// ABOUTME: notify-backed watches on package directories
// ABOUTME: Forwards change paths and watcher errors over separate crossbeam channels

use crossbeam_channel::{unbounded, Receiver, Sender};
use gotestwatch_core::{ChangeEvent, ChangeFilter, Result, WatchError};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Receiving ends of a running [`PackageWatcher`].
pub struct WatchChannels {
    pub events: Receiver<ChangeEvent>,
    pub errors: Receiver<WatchError>,
}

/// Non-recursive watches on every package directory of a module.
///
/// Package directories are watched individually because subdirectories are
/// either other packages (watched on their own) or not Go packages at all.
/// Dropping the watcher stops notifications and closes the event channel.
pub struct PackageWatcher {
    _watcher: RecommendedWatcher,
    directories: usize,
}

impl PackageWatcher {
    pub fn start<'a>(
        directories: impl IntoIterator<Item = &'a Path>,
        filter: ChangeFilter,
    ) -> Result<(Self, WatchChannels)> {
        let (event_tx, event_rx) = unbounded();
        let (error_tx, error_rx) = unbounded();

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            forward(result, filter, &event_tx, &error_tx)
        })?;

        let mut count = 0usize;
        for dir in directories {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| WatchError::Notify(e.add_path(dir.to_path_buf())))?;
            count += 1;
        }
        info!("Watching {} package directories ({:?})", count, filter);

        Ok((
            Self {
                _watcher: watcher,
                directories: count,
            },
            WatchChannels {
                events: event_rx,
                errors: error_rx,
            },
        ))
    }

    pub fn directories(&self) -> usize {
        self.directories
    }
}

/// Route one notifier result onto the event or error channel.
///
/// A rescan request means the backend dropped notifications (an inotify queue
/// overflow, for example), which is reported as an error like any other
/// watch failure.
fn forward(
    result: notify::Result<Event>,
    filter: ChangeFilter,
    event_tx: &Sender<ChangeEvent>,
    error_tx: &Sender<WatchError>,
) {
    let event = match result {
        Ok(event) => event,
        Err(e) => {
            let _ = error_tx.send(WatchError::Notify(e));
            return;
        }
    };
    if event.need_rescan() {
        let err = notify::Error::generic("event queue overflowed, changes were lost")
            .set_paths(event.paths);
        let _ = error_tx.send(WatchError::Notify(err));
        return;
    }
    if !is_change(&event.kind, filter) {
        return;
    }
    debug!("Change notification {:?} for {:?}", event.kind, event.paths);

    // Backends that cannot tell rename sources from targets report both
    // sides; only the side still present on disk is a change.
    let rename_either_side = matches!(
        event.kind,
        EventKind::Modify(ModifyKind::Name(RenameMode::Any | RenameMode::Both))
    );
    for path in event.paths {
        if path.as_os_str().is_empty() || (rename_either_side && !path.exists()) {
            continue;
        }
        let _ = event_tx.send(ChangeEvent::new(path));
    }
}

/// Whether a notifier event counts as a content change under `filter`.
pub fn is_change(kind: &EventKind, filter: ChangeFilter) -> bool {
    match filter {
        ChangeFilter::CloseWrite => {
            matches!(kind, EventKind::Access(AccessKind::Close(AccessMode::Write)))
        }
        ChangeFilter::Write => matches!(
            kind,
            EventKind::Create(_)
                | EventKind::Modify(ModifyKind::Data(_))
                | EventKind::Modify(ModifyKind::Any)
                | EventKind::Modify(ModifyKind::Name(
                    RenameMode::To | RenameMode::Any | RenameMode::Both
                ))
        ),
    }
}

/// Drain the watcher's error channel on a dedicated thread.
///
/// The first error is logged and handed to `on_fatal`: a broken watch would
/// silently miss changes, so the caller is expected to shut down. The thread
/// ends quietly if the error channel closes first.
pub fn spawn_error_monitor<F>(errors: Receiver<WatchError>, on_fatal: F) -> Result<JoinHandle<()>>
where
    F: FnOnce(WatchError) + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("gotestwatch-watch-errors".to_string())
        .spawn(move || {
            if let Ok(err) = errors.recv() {
                error!("Error watching directories: {}", err);
                on_fatal(err);
            }
        })?;
    Ok(handle)
}
