//! Storage file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::apply::{ApplyHandle, ApplyTrigger};
use crate::store::FileStore;

/// Watches the storage file and re-applies when it changes on disk.
pub struct StoreWatcher {
    store: Arc<FileStore>,
    apply: ApplyHandle,
}

impl StoreWatcher {
    pub fn new(store: Arc<FileStore>, apply: ApplyHandle) -> Self {
        Self { store, apply }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched rather than the file itself because
    /// the store replaces the file by rename on every write.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.store.path().to_path_buf();
        let dir = watch_dir(&path);
        let store = self.store.clone();
        let apply = self.apply.clone();
        let file = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| same_file(p, &file));
                    if !relevant {
                        return;
                    }
                    tracing::debug!(path = ?file, "Storage file change detected, reloading...");
                    match store.reload() {
                        Ok(()) => apply.request(ApplyTrigger::StoreChanged),
                        Err(e) => {
                            tracing::error!("Failed to reload storage: {}. Keeping current profiles.", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Storage watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn same_file(event_path: &Path, file: &Path) -> bool {
    event_path == file
        || (event_path.file_name().is_some() && event_path.file_name() == file.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_dir() {
        assert_eq!(watch_dir(Path::new("profiles.json")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("a/b/profiles.json")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_same_file() {
        let file = Path::new("data/profiles.json");
        assert!(same_file(Path::new("/abs/data/profiles.json"), file));
        assert!(!same_file(Path::new("/abs/data/profiles.tmp"), file));
    }
}
