//! Watcher integration over a real filesystem: events arrive debounced,
//! ignored subtrees stay silent, and classifications match the change
//! protocol.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use swite_server::{classify_change, FileChange, FileWatcher, UpdateType};

fn default_ignore() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        "dist".to_string(),
    ]
}

async fn next_change(
    rx: &mut tokio::sync::mpsc::Receiver<FileChange>,
) -> Option<FileChange> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .ok()
        .flatten()
}

#[tokio::test]
async fn file_creation_produces_a_debounced_event() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("src/components")).unwrap();

    let (_watcher, mut rx) = FileWatcher::new(root.clone(), default_ignore(), 50).unwrap();

    // Give the watcher a moment to attach before producing events.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let target = root.join("src/components/button.ui");
    fs::write(&target, "export const Button = 1;").unwrap();

    let mut saw_target = false;
    while let Some(change) = next_change(&mut rx).await {
        if change.path() == target {
            saw_target = true;
            break;
        }
    }
    assert!(saw_target, "expected an event for {}", target.display());
    assert_eq!(classify_change(&target), UpdateType::Hot);
}

#[tokio::test]
async fn ignored_directories_produce_no_events() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();

    let (_watcher, mut rx) = FileWatcher::new(root.clone(), default_ignore(), 50).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    fs::write(root.join("node_modules/pkg/index.js"), "ignored").unwrap();
    // A visible change afterwards proves the channel is alive and ordered.
    let visible = root.join("src/main.css");
    fs::write(&visible, "body {}").unwrap();

    let mut seen: Vec<PathBuf> = Vec::new();
    while let Some(change) = next_change(&mut rx).await {
        seen.push(change.path().to_path_buf());
        if change.path() == visible {
            break;
        }
    }

    assert!(seen.iter().any(|p| p == &visible));
    assert!(
        !seen.iter().any(|p| p.starts_with(root.join("node_modules"))),
        "node_modules changes must not surface: {seen:?}"
    );
    assert_eq!(classify_change(&visible), UpdateType::Style);
}

#[tokio::test]
async fn missing_root_is_rejected() {
    let err = FileWatcher::new(
        PathBuf::from("/definitely/not/a/real/root"),
        default_ignore(),
        50,
    )
    .err();
    assert!(err.is_some());
}
