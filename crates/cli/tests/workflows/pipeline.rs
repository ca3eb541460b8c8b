//! Watch pipeline driven in-process with a gated generator

use crate::common::stub::Gated;
use cli_lib::Pipeline;
use helper_core::{Annotator, Config, Metrics};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use watcher::ChangeDetector;

struct Harness {
    generator: Gated,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
    cancel: CancellationToken,
    pipeline: Pipeline<Gated>,
}

fn harness(max_concurrency: usize) -> Harness {
    let generator = Gated::new();
    let metrics = Arc::new(Metrics::new());
    let annotator = Annotator::new(&Config::default(), generator.clone(), Arc::clone(&metrics));
    let shutdown = CancellationToken::new();
    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(
        Arc::new(annotator),
        max_concurrency,
        shutdown.clone(),
        cancel.clone(),
    );

    Harness {
        generator,
        metrics,
        shutdown,
        cancel,
        pipeline,
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_same_path_is_queued_once() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a.py");
    let b = temp_dir.path().join("b.py");
    fs::write(&a, "//ai first\n").unwrap();
    fs::write(&b, "//ai second\n").unwrap();

    let mut h = harness(1);
    h.pipeline.dispatch(a.clone());
    h.pipeline.dispatch(b.clone());
    h.pipeline.dispatch(b.clone());
    assert_eq!(h.pipeline.pending(), 2);

    h.generator.open(10);
    h.pipeline.drain().await;

    assert_eq!(h.generator.calls(), 2);
    assert!(read(&a).contains("// 1. Plan first"));
    assert!(read(&b).contains("// 1. Plan second"));
    assert_eq!(h.metrics.snapshot().tasks, 4);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let temp_dir = TempDir::new().unwrap();
    let mut h = harness(2);

    for name in ["a.js", "b.js", "c.js", "d.js"] {
        let path = temp_dir.path().join(name);
        fs::write(&path, "//ai task\n").unwrap();
        h.pipeline.dispatch(path);
    }

    let generator = h.generator.clone();
    wait_for(|| generator.calls() == 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.generator.calls(), 2);

    h.generator.open(10);
    h.pipeline.drain().await;
    assert_eq!(h.generator.calls(), 4);
}

#[tokio::test]
async fn test_shutdown_drops_waiting_then_cancel_abandons_running() {
    let temp_dir = TempDir::new().unwrap();
    let running = temp_dir.path().join("running.py");
    let waiting = temp_dir.path().join("waiting.py");
    fs::write(&running, "//ai slow one\n").unwrap();
    fs::write(&waiting, "//ai never started\n").unwrap();

    let mut h = harness(1);
    h.pipeline.dispatch(running.clone());
    h.pipeline.dispatch(waiting.clone());

    let generator = h.generator.clone();
    wait_for(|| generator.calls() == 1).await;

    h.shutdown.cancel();
    h.cancel.cancel();
    h.pipeline.drain().await;

    assert_eq!(h.generator.calls(), 1);
    assert_eq!(read(&running), "//ai slow one\n");
    assert_eq!(read(&waiting), "//ai never started\n");
    assert_eq!(h.metrics.snapshot().errors, 0);
}

#[tokio::test]
async fn test_shutdown_lets_running_pass_finish() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("main.ts");
    fs::write(&path, "//ai keep going\n").unwrap();

    let mut h = harness(1);
    h.pipeline.dispatch(path.clone());

    let generator = h.generator.clone();
    wait_for(|| generator.calls() == 1).await;

    h.shutdown.cancel();
    h.generator.open(1);
    h.pipeline.drain().await;

    assert!(read(&path).contains("// 2. Build it"));
}

#[tokio::test]
async fn test_run_annotates_watched_change() {
    let temp_dir = TempDir::new().unwrap();
    let mut detector = ChangeDetector::new(temp_dir.path(), &Config::default()).unwrap();
    detector.start().unwrap();
    let target = detector.root().join("app.py");

    let mut h = harness(2);
    h.generator.open(100);
    let shutdown = h.shutdown.clone();
    let mut pipeline = h.pipeline;
    let runner = tokio::spawn(async move {
        pipeline.run(&mut detector).await;
    });

    // Land the content in one step so no event sees a half-written file
    let staged = temp_dir.path().join("app.py.partial");
    fs::write(&staged, "def run():\n    //ai add retries\n    pass\n").unwrap();
    fs::rename(&staged, &target).unwrap();
    wait_for(|| read(&target).contains("// 1. Plan add retries")).await;

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap();

    // The rewrite itself does not trigger a second expansion
    let text = read(&target);
    assert_eq!(text.matches("// 1. Plan add retries").count(), 1);
}
