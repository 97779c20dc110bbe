//! File system watcher with write-stable debouncing.
//!
//! Watches the workspace root recursively, ignoring `node_modules`, `.git`,
//! `dist` and hidden paths. A change is emitted only after its file has
//! been quiet for the debounce window, so editors that write in bursts
//! produce a single event.

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::Result;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// File was modified
    Modified(PathBuf),
    /// File was created
    Created(PathBuf),
    /// File was removed
    Removed(PathBuf),
}

impl FileChange {
    /// Path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Recursive watcher emitting debounced change events.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Attach to `root` and start watching.
    ///
    /// # Returns
    ///
    /// The watcher handle plus the receiver stabilized changes arrive on.
    ///
    /// # Errors
    ///
    /// Returns an error when the watcher cannot be created or the root does
    /// not exist. Later internal watcher failures are logged and the
    /// affected subtree silently stops producing events.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(swite_core::CoreError::FileNotFound(root).into());
        }

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<FileChange>();
        let (out_tx, out_rx) = mpsc::channel(100);

        let root_clone = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "file watcher error, continuing");
                    return;
                }
            };
            for path in &event.paths {
                if should_ignore(path, &root_clone, &ignore_patterns) {
                    continue;
                }
                let change = match event.kind {
                    notify::EventKind::Create(_) => FileChange::Created(path.clone()),
                    notify::EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    notify::EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                let _ = raw_tx.send(change);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        tokio::spawn(debounce_loop(
            raw_rx,
            out_tx,
            Duration::from_millis(debounce_ms),
        ));

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            out_rx,
        ))
    }

    /// Root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Hold each change until its path has been quiet for `window`, then emit
/// the latest event for that path.
async fn debounce_loop(
    mut raw_rx: mpsc::UnboundedReceiver<FileChange>,
    out_tx: mpsc::Sender<FileChange>,
    window: Duration,
) {
    let mut pending: FxHashMap<PathBuf, (FileChange, Instant)> = FxHashMap::default();
    let tick = window.min(Duration::from_millis(50)).max(Duration::from_millis(10));

    loop {
        let recv_timeout = tokio::time::timeout(tick, raw_rx.recv());
        match recv_timeout.await {
            Ok(Some(change)) => {
                pending.insert(change.path().to_path_buf(), (change, Instant::now()));
            }
            Ok(None) => break,
            Err(_) => {}
        }

        let now = Instant::now();
        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, (_, at))| now.duration_since(*at) >= window)
            .map(|(path, _)| path.clone())
            .collect();
        for path in ready {
            if let Some((change, _)) = pending.remove(&path) {
                // Fire and forget: a full queue drops the event rather than
                // back-pressuring the watcher.
                if out_tx.try_send(change).is_err() {
                    tracing::warn!(path = %path.display(), "change queue full, event dropped");
                }
            }
        }
    }
}

/// True when a path must not produce change events.
fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    if !path.starts_with(root) {
        return true;
    }

    let rel_path = match path.strip_prefix(root) {
        Ok(p) => p,
        Err(_) => return true,
    };
    let path_str = rel_path.to_string_lossy();

    for pattern in ignore_patterns {
        if let Some(ext) = pattern.strip_prefix('*') {
            if path_str.ends_with(ext) {
                return true;
            }
        } else if path_str.starts_with(pattern.as_str())
            || path_str.contains(&format!("/{}", pattern))
        {
            return true;
        }
    }

    for component in rel_path.components() {
        if let Some(name) = component.as_os_str().to_str() {
            if name.starts_with('.') && name != "." && name != ".." {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_node_modules_and_dist() {
        let root = PathBuf::from("/project");
        let patterns = vec!["node_modules".to_string(), "dist".to_string()];

        assert!(should_ignore(
            Path::new("/project/node_modules/pkg/index.js"),
            &root,
            &patterns
        ));
        assert!(should_ignore(
            Path::new("/project/dist/out.js"),
            &root,
            &patterns
        ));
        assert!(!should_ignore(
            Path::new("/project/src/index.ui"),
            &root,
            &patterns
        ));
    }

    #[test]
    fn ignores_hidden_paths_and_outside_root() {
        let root = PathBuf::from("/project");
        let patterns = vec![];

        assert!(should_ignore(Path::new("/project/.git/config"), &root, &patterns));
        assert!(should_ignore(
            Path::new("/project/src/.cache/x.js"),
            &root,
            &patterns
        ));
        assert!(should_ignore(Path::new("/elsewhere/x.js"), &root, &patterns));
    }

    #[test]
    fn extension_patterns_match_suffix() {
        let root = PathBuf::from("/project");
        let patterns = vec!["*.log".to_string()];

        assert!(should_ignore(Path::new("/project/debug.log"), &root, &patterns));
        assert!(!should_ignore(Path::new("/project/src/a.ts"), &root, &patterns));
    }

    #[tokio::test]
    async fn debounce_collapses_bursts_per_path() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::channel(10);
        tokio::spawn(debounce_loop(raw_rx, out_tx, Duration::from_millis(30)));

        let path = PathBuf::from("/w/src/a.ui");
        for _ in 0..5 {
            raw_tx.send(FileChange::Modified(path.clone())).unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let first = tokio::time::timeout(Duration::from_millis(500), out_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, FileChange::Modified(path));

        // The burst produced exactly one stabilized event.
        let second = tokio::time::timeout(Duration::from_millis(100), out_rx.recv()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn distinct_paths_each_emit() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::channel(10);
        tokio::spawn(debounce_loop(raw_rx, out_tx, Duration::from_millis(20)));

        raw_tx
            .send(FileChange::Modified(PathBuf::from("/w/a.ts")))
            .unwrap();
        raw_tx
            .send(FileChange::Created(PathBuf::from("/w/b.ts")))
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            let change = tokio::time::timeout(Duration::from_millis(500), out_rx.recv())
                .await
                .unwrap()
                .unwrap();
            seen.push(change.path().to_path_buf());
        }
        seen.sort();
        assert_eq!(seen, vec![PathBuf::from("/w/a.ts"), PathBuf::from("/w/b.ts")]);
    }
}
