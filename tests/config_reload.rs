//! Hot reload of the configuration file.

use std::path::PathBuf;
use std::time::Duration;

use secure_gate::config::watcher::{ConfigWatcher, DEBOUNCE};

const STRICT: &str = r#"
[policy]
allowed_hosts = ["ssl.example.com"]
ssl_redirect = true
"#;

/// Fresh directory holding a config file with the given content.
fn config_file(content: &str) -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("secure-gate-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("gate.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

/// Long enough for the watcher to see a write and finish its reload.
fn settle() -> Duration {
    DEBOUNCE * 3
}

#[tokio::test]
async fn test_watcher_emits_valid_reloads_only() {
    let (dir, path) = config_file(STRICT);
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _guard = watcher.run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Rejected by validation: nothing may be emitted for it.
    std::fs::write(&path, "[listener]\nbind_address = \"nope\"\n").unwrap();
    tokio::time::sleep(settle()).await;
    std::fs::write(&path, "[policy]\nsts_seconds = 60\n").unwrap();

    let first = tokio::time::timeout(Duration::from_secs(10), updates.recv())
        .await
        .expect("no reload observed")
        .expect("watcher stopped");

    assert_eq!(first.policy.sts_seconds, 60);
    assert_eq!(first.listener.bind_address, "0.0.0.0:8080");
    assert!(first.policy.allowed_hosts.is_empty());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_truncated_file_is_not_applied() {
    let (dir, path) = config_file(STRICT);
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _guard = watcher.run().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    std::fs::write(&path, "").unwrap();
    let emitted = tokio::time::timeout(settle() * 3, updates.recv()).await;
    assert!(emitted.is_err(), "empty file was applied: {emitted:?}");

    std::fs::write(&path, " \n\n").unwrap();
    let emitted = tokio::time::timeout(settle() * 3, updates.recv()).await;
    assert!(emitted.is_err(), "blank file was applied: {emitted:?}");

    // The watcher keeps going after a rejected reload.
    std::fs::write(&path, STRICT).unwrap();
    let reloaded = tokio::time::timeout(Duration::from_secs(10), updates.recv())
        .await
        .expect("no reload observed")
        .expect("watcher stopped");
    assert_eq!(reloaded.policy.allowed_hosts, vec!["ssl.example.com".to_string()]);
    assert!(reloaded.policy.ssl_redirect);
    let _ = std::fs::remove_dir_all(&dir);
}
