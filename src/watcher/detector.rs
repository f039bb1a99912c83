//! Debounced file system change detection.

use anyhow::{Context as _, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer, RecommendedCache};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Type of file change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// File system watcher delivering one batch of changes per debounce window
pub struct FileWatcher {
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl FileWatcher {
    pub fn new(debounce: Duration) -> Result<(Self, mpsc::UnboundedReceiver<Vec<FileChange>>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| match result {
            Ok(events) => {
                let batch: Vec<FileChange> = events.iter().flat_map(debounced_event_to_changes).collect();
                if !batch.is_empty() {
                    let _ = tx.send(batch);
                }
            }
            Err(errors) => {
                for error in errors {
                    tracing::warn!("watch error: {}", error);
                }
            }
        })
        .context("Failed to create file watcher")?;

        Ok((Self { debouncer: Some(debouncer) }, rx))
    }

    /// Watch a directory recursively
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(debouncer) = &mut self.debouncer {
            debouncer
                .watch(path.as_ref(), RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch: {}", path.as_ref().display()))?;

            tracing::debug!("👁️  File Watcher started: {}", path.as_ref().display());
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.debouncer = None;
    }
}

/// One change per non-ignored path. A rename carrying both ends reports the
/// source as deleted and the target as created.
fn debounced_event_to_changes(debounced_event: &DebouncedEvent) -> Vec<FileChange> {
    let event = &debounced_event.event;
    let kinds: &[ChangeKind] = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => &[ChangeKind::Deleted, ChangeKind::Created],
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => &[ChangeKind::Deleted],
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => &[ChangeKind::Created],
        EventKind::Create(_) => &[ChangeKind::Created],
        EventKind::Modify(_) => &[ChangeKind::Modified],
        EventKind::Remove(_) => &[ChangeKind::Deleted],
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .enumerate()
        .filter(|(_, path)| !is_ignored(path))
        .map(|(i, path)| FileChange {
            path: path.clone(),
            kind: kinds.get(i).or(kinds.last()).copied().unwrap_or(ChangeKind::Modified),
        })
        .collect()
}

/// Hidden files and editor temp files
fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .map(|name| {
            let name = name.to_string_lossy();
            name.starts_with('.') || name.contains('~') || name.ends_with(".tmp")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::Event;
    use std::time::Instant;
    use tempfile::TempDir;
    use tokio::fs;

    fn debounced(kind: EventKind, paths: &[&str]) -> DebouncedEvent {
        let event = paths.iter().fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)));
        DebouncedEvent::new(event, Instant::now())
    }

    #[test]
    fn test_rename_over_target_keeps_target() {
        let rename = EventKind::Modify(ModifyKind::Name(RenameMode::Both));

        let changes = debounced_event_to_changes(&debounced(rename, &["/p/src/index.html.tmp", "/p/src/index.html"]));
        assert_eq!(
            changes,
            vec![FileChange { path: "/p/src/index.html".into(), kind: ChangeKind::Created }]
        );

        let changes = debounced_event_to_changes(&debounced(rename, &["/p/src/js/old.txt", "/p/src/js/menu.js"]));
        assert_eq!(
            changes,
            vec![
                FileChange { path: "/p/src/js/old.txt".into(), kind: ChangeKind::Deleted },
                FileChange { path: "/p/src/js/menu.js".into(), kind: ChangeKind::Created },
            ]
        );
    }

    #[test]
    fn test_event_kinds() {
        let write = EventKind::Modify(ModifyKind::Data(notify::event::DataChange::Content));
        let changes = debounced_event_to_changes(&debounced(write, &["/p/src/index.html"]));
        assert_eq!(changes[0].kind, ChangeKind::Modified);

        let access = EventKind::Access(notify::event::AccessKind::Any);
        assert!(debounced_event_to_changes(&debounced(access, &["/p/src/index.html"])).is_empty());
    }

    #[test]
    fn test_ignored_names() {
        assert!(is_ignored(Path::new("src/.index.html.swp")));
        assert!(is_ignored(Path::new("src/style.scss~")));
        assert!(is_ignored(Path::new("src/js/script.js.tmp")));
        assert!(!is_ignored(Path::new("src/index.html")));
    }

    #[tokio::test]
    async fn test_file_watcher_detects_changes() {
        let temp_dir = TempDir::new().unwrap();
        let (mut watcher, mut rx) = FileWatcher::new(Duration::from_millis(50)).unwrap();
        watcher.watch(temp_dir.path()).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(temp_dir.path().join("index.html"), "<p>hi</p>").await.unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no change batch within 5s")
            .expect("watcher channel closed");
        assert!(batch.iter().any(|c| c.path.ends_with("index.html")));

        watcher.stop();
    }
}
