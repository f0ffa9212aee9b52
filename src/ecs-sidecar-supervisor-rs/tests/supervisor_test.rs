use ecs_sidecar_supervisor_rs::metadata::TaskFuture;
use ecs_sidecar_supervisor_rs::{supervise, Container, Error, MetadataApi, Outcome, Settings, Task};
use mockall::mock;
use nix::sys::signal::Signal;
use serial_test::serial;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

mock! {
    pub MetadataApi {}

    impl MetadataApi for MetadataApi {
        fn get_task(&self) -> TaskFuture;
    }
}

fn settings(command: &[&str]) -> Settings {
    let mut settings = Settings::new(command.iter().map(|s| s.to_string()).collect()).unwrap();
    settings.poll_interval = Duration::from_millis(20);
    settings.grace_period = Duration::from_millis(200);
    settings
}

fn task(containers: &[(&str, &str)]) -> Task {
    Task {
        containers: containers
            .iter()
            .map(|(name, status)| Container {
                name: name.to_string(),
                known_status: status.to_string(),
            })
            .collect(),
    }
}

fn reply(containers: &[(&str, &str)]) -> TaskFuture {
    let task = task(containers);
    Box::pin(async move { Ok::<Task, Error>(task) })
}

fn hang() -> TaskFuture {
    Box::pin(pending::<Result<Task, Error>>())
}

fn no_signal() -> impl std::future::Future<Output = Signal> {
    pending::<Signal>()
}

#[tokio::test]
#[serial]
async fn test_child_exit_ends_supervision() {
    let mut mock_api = MockMetadataApi::new();
    mock_api
        .expect_get_task()
        .returning(|| reply(&[("app", "RUNNING")]));

    let result = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["true"]), no_signal()),
    )
    .await;

    assert!(result.is_ok(), "Should not timeout");
    let outcome = result.unwrap().unwrap();
    assert!(matches!(outcome, Outcome::ChildExited(_)));
    assert_eq!(outcome.exit_code(), 0);
}

#[tokio::test]
#[serial]
async fn test_child_exit_code_is_kept() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().returning(hang);

    let outcome = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["sh", "-c", "exit 7"]), no_signal()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome.exit_code(), 7);
}

#[tokio::test]
#[serial]
async fn test_all_running_keeps_supervising() {
    let mut mock_api = MockMetadataApi::new();
    mock_api
        .expect_get_task()
        .returning(|| reply(&[("app", "RUNNING"), ("~internal~ecs~pause", "RUNNING")]));

    let result = timeout(
        Duration::from_millis(500),
        supervise(Arc::new(mock_api), &settings(&["sleep", "30"]), no_signal()),
    )
    .await;

    assert!(result.is_err(), "Should timeout while containers keep running");
}

#[tokio::test]
#[serial]
async fn test_task_stopped_ends_supervision() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().times(1).returning(|| reply(&[("~internal~sidecar", "RUNNING"), ("app", "STOPPED")]));

    let start = Instant::now();
    let outcome = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["sleep", "30"]), no_signal()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, Outcome::TaskStopped);
    assert_eq!(outcome.exit_code(), 0);
    assert!(start.elapsed() < Duration::from_secs(5), "Child should have been killed");
}

#[tokio::test]
#[serial]
async fn test_task_stops_after_a_few_polls() {
    let mut seq = mockall::Sequence::new();
    let mut mock_api = MockMetadataApi::new();
    mock_api
        .expect_get_task()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|| reply(&[("app", "RUNNING")]));
    mock_api
        .expect_get_task()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| reply(&[("app", "STOPPED")]));

    let outcome = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["sleep", "30"]), no_signal()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, Outcome::TaskStopped);
}

#[tokio::test]
#[serial]
async fn test_empty_task_counts_as_stopped() {
    let mut mock_api = MockMetadataApi::new();
    mock_api
        .expect_get_task()
        .times(1)
        .returning(|| reply(&[]));

    let outcome = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["sleep", "30"]), no_signal()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, Outcome::TaskStopped);
}

#[tokio::test]
#[serial]
async fn test_metadata_error_is_fatal() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().times(1).returning(|| {
        let e = serde_json::from_str::<Task>("{not json").unwrap_err();
        Box::pin(async move { Err::<Task, Error>(Error::Decode(e)) })
    });

    let result = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["sleep", "30"]), no_signal()),
    )
    .await
    .unwrap();

    assert!(matches!(result, Err(Error::Decode(_))));
}

#[tokio::test]
#[serial]
async fn test_launch_failure_skips_monitoring() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().times(0);

    let result = supervise(
        Arc::new(mock_api),
        &settings(&["/nonexistent/ecs-sidecar-test-binary"]),
        no_signal(),
    )
    .await;

    assert!(matches!(result, Err(Error::Launch { .. })));
}

#[tokio::test]
#[serial]
async fn test_empty_command_rejected() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().times(0);

    let result = supervise(Arc::new(mock_api), &settings(&[]), no_signal()).await;

    assert!(matches!(result, Err(Error::EmptyCommand)));
}

#[tokio::test]
#[serial]
async fn test_signal_waits_for_grace_period() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().returning(hang);

    let start = Instant::now();
    let signal = async {
        sleep(Duration::from_millis(100)).await;
        Signal::SIGTERM
    };
    let outcome = timeout(
        Duration::from_secs(5),
        supervise(Arc::new(mock_api), &settings(&["sleep", "30"]), signal),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, Outcome::ShutdownRequested);
    assert!(start.elapsed() >= Duration::from_millis(300), "Grace period cut short");
}

#[tokio::test]
#[serial]
async fn test_forwarded_signal_reaches_child() {
    let mut mock_api = MockMetadataApi::new();
    mock_api.expect_get_task().returning(hang);

    let mut settings = settings(&["sleep", "30"]);
    settings.forward_signals = true;
    settings.grace_period = Duration::from_secs(10);

    let signal = async {
        sleep(Duration::from_millis(100)).await;
        Signal::SIGTERM
    };
    let outcome = timeout(Duration::from_secs(5), supervise(Arc::new(mock_api), &settings, signal))
        .await
        .expect("child should exit before the grace period ends")
        .unwrap();

    assert!(matches!(outcome, Outcome::ChildExited(_)));
    assert_eq!(outcome.exit_code(), 128 + Signal::SIGTERM as i32);
}
