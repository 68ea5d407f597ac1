//! Dispatches against real child processes.
#![cfg(unix)]

use std::time::{Duration, Instant};

use tempfile::TempDir;

use typeweave_core::{ExtractedType, ExtractionResult, LayoutDescriptor};
use typeweave_dispatch::{DispatchError, Dispatcher, ExecutionMode, WorkerCommand};
use typeweave_schema::{SchemaModelBuilder, TypeExtractor};

fn sh_dispatcher(script: &str) -> Dispatcher<SchemaModelBuilder, TypeExtractor> {
    Dispatcher::builder(SchemaModelBuilder::new(), TypeExtractor::new())
        .worker_command(WorkerCommand::new("/bin/sh").arg("-c").arg(script))
        .timeout(Duration::from_secs(30))
        .build()
}

fn layout() -> LayoutDescriptor {
    LayoutDescriptor::new(".").with_module("a.schema")
}

#[tokio::test]
async fn test_result_frame_resolves() {
    let dispatcher = sh_dispatcher(
        r#"cat >/dev/null; echo '{"kind":"result","result":{"types":[{"name":"Foo"}]}}'"#,
    );
    assert_eq!(dispatcher.mode(), ExecutionMode::Background);

    let result = dispatcher.dispatch(&layout()).await.unwrap();
    assert_eq!(result, ExtractionResult::new(vec![ExtractedType::named("Foo")]));
}

#[tokio::test]
async fn test_error_frame_rejects() {
    let dispatcher = sh_dispatcher(
        r#"cat >/dev/null; echo '{"kind":"error","message":"parse failure"}'; exit 1"#,
    );

    let err = dispatcher.dispatch(&layout()).await.unwrap_err();
    assert!(err.is_worker_reported());
    assert!(err.to_string().contains("parse failure"));
}

#[tokio::test]
async fn test_silent_exit_is_unexpected() {
    let dispatcher = sh_dispatcher("cat >/dev/null; exit 3");

    let err = tokio::time::timeout(Duration::from_secs(10), dispatcher.dispatch(&layout()))
        .await
        .expect("dispatch must not hang")
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnexpectedExit { code: Some(3) }));
}

#[tokio::test]
async fn test_hung_worker_times_out() {
    let dispatcher = Dispatcher::builder(SchemaModelBuilder::new(), TypeExtractor::new())
        .worker_command(WorkerCommand::new("/bin/sh").arg("-c").arg("sleep 30"))
        .timeout(Duration::from_millis(200))
        .build();

    let err = dispatcher.dispatch(&layout()).await.unwrap_err();
    assert!(matches!(err, DispatchError::TimedOut { .. }));
}

#[tokio::test]
async fn test_first_frame_wins() {
    let dispatcher = sh_dispatcher(
        r#"cat >/dev/null; echo '{"kind":"error","message":"first"}'; echo '{"kind":"result","result":{"types":[]}}'"#,
    );

    let err = dispatcher.dispatch(&layout()).await.unwrap_err();
    assert!(err.to_string().contains("first"));
}

#[tokio::test]
async fn test_success_detaches_lingering_worker() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("finished");
    let dispatcher = sh_dispatcher(&format!(
        r#"cat >/dev/null; echo '{{"kind":"result","result":{{"types":[]}}}}'; sleep 2; touch '{}'"#,
        marker.display()
    ));

    let started = Instant::now();
    let result = dispatcher.dispatch(&layout()).await.unwrap();
    assert!(result.is_empty());
    // Resolved on the frame, not on the worker's exit.
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!marker.exists());

    // Detached, not killed: the worker runs to its natural end.
    let deadline = Instant::now() + Duration::from_secs(15);
    while !marker.exists() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(marker.exists(), "detached worker was terminated");
}
