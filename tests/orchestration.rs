//! End-to-end behavior of the executor, fan-in and outcome handler together.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use framevisor::{
    BoundedExecutor, BroadcastNotifier, ChannelId, ExecutorConfig, FrameStatus, HandlerError, HandlerState,
    NotifyError, OutcomeHandler, Promise, ReportContext, Rendered, SaturationError, SaturationPolicy, TaskError,
    fan_in,
};

const WAIT: Duration = Duration::from_secs(5);

fn pool(max_workers: usize, max_queue_depth: usize, policy: SaturationPolicy) -> BoundedExecutor {
    BoundedExecutor::new(ExecutorConfig {
        min_workers: 0,
        max_workers,
        max_queue_depth,
        policy,
        ..ExecutorConfig::default()
    })
}

fn sleepy<T: Clone + Send + 'static>(exec: &BoundedExecutor, ms: u64, value: T) -> Promise<T> {
    exec.submit(move || {
        thread::sleep(Duration::from_millis(ms));
        Ok::<_, TaskError>(value)
    })
    .unwrap()
}

fn failing<T: Clone + Send + 'static>(exec: &BoundedExecutor, ms: u64, msg: &'static str) -> Promise<T> {
    exec.submit(move || {
        thread::sleep(Duration::from_millis(ms));
        Err::<T, _>(TaskError::fail(msg))
    })
    .unwrap()
}

/// Occupies one worker until the returned sender is dropped or signalled.
fn occupy(exec: &BoundedExecutor) -> mpsc::Sender<()> {
    let (tx, rx) = mpsc::channel::<()>();
    exec.submit(move || {
        let _ = rx.recv();
        Ok::<_, TaskError>(())
    })
    .unwrap();
    tx
}

fn wait_terminal(status: &FrameStatus) {
    let deadline = Instant::now() + WAIT;
    while !status.is_terminal() {
        assert!(Instant::now() < deadline, "handler never reached a terminal state");
        thread::sleep(Duration::from_millis(5));
    }
}

// ---- Scenarios ----

#[test]
fn two_tasks_settle_after_the_slowest_in_submission_order() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let bus = BroadcastNotifier::default();
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let captured = Arc::clone(&seen);

    let handler = OutcomeHandler::new("pair", bus.clone())
        .with_executor(exec.clone())
        .on_success(move |values: &[String]| {
            captured.lock().unwrap().extend_from_slice(values);
            "ok"
        });
    let mut sub = bus.subscribe(handler.channel_id());

    let started = Instant::now();
    handler.launch(vec![
        sleepy(&exec, 100, "a".to_string()),
        sleepy(&exec, 300, "b".to_string()),
    ]);

    let published = sub.blocking_recv().unwrap();
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(published.payload.as_str(), "ok");
    assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
}

#[test]
fn one_failing_task_reports_once_and_renders_its_error() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let bus = BroadcastNotifier::default();
    let reports = Arc::new(Mutex::new(Vec::<HandlerError>::new()));
    let sink_reports = Arc::clone(&reports);

    let handler = OutcomeHandler::new("trio", bus.clone())
        .with_executor(exec.clone())
        .with_error_sink(move |err: &HandlerError, _: &ReportContext| {
            sink_reports.lock().unwrap().push(err.clone());
        })
        .on_success(|_: &[u32]| "unexpected")
        .on_failure(|err: &HandlerError| format!("failed: {err}"));
    let mut sub = bus.subscribe(handler.channel_id());

    let frame = handler.launch(vec![
        sleepy(&exec, 10, 1),
        failing(&exec, 20, "boom"),
        sleepy(&exec, 30, 3),
    ]);

    let published = sub.blocking_recv().unwrap();
    assert_eq!(published.payload.as_str(), "failed: execution failed: boom");
    assert_eq!(frame.status.state(), HandlerState::Failed);
    assert_eq!(*reports.lock().unwrap(), vec![HandlerError::from(TaskError::fail("boom"))]);
}

#[test]
fn default_strategies_show_loading_then_content_loaded() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let bus = BroadcastNotifier::default();
    let handler = OutcomeHandler::new("defaults", bus.clone()).with_executor(exec.clone());
    let mut sub = bus.subscribe(handler.channel_id());

    let frame = handler.launch(vec![sleepy(&exec, 20, ())]);
    assert_eq!(frame.loading.as_str(), "Loading...");
    assert_eq!(frame.target, "defaults");

    let published = sub.blocking_recv().unwrap();
    assert_eq!(published.payload.as_str(), "Content loaded!");
    assert_eq!(&*published.target, "defaults");
    assert_eq!(published.channel, frame.channel_id);
}

#[test]
fn reject_policy_refuses_second_concurrent_submission() {
    let exec = pool(1, 0, SaturationPolicy::Reject);
    let gate = occupy(&exec);

    let err = exec.submit(|| Ok::<_, TaskError>(2)).unwrap_err();
    assert_eq!(
        err,
        SaturationError::Full {
            max_workers: 1,
            max_queue_depth: 0
        }
    );

    gate.send(()).unwrap();
    exec.shutdown();
    assert!(exec.wait_for_termination(WAIT));
}

fn single_task_handler_succeeds(policy: SaturationPolicy) {
    let exec = pool(1, 0, policy);
    let bus = BroadcastNotifier::default();
    let handler = OutcomeHandler::new("single", bus.clone()).with_executor(exec.clone());
    let mut sub = bus.subscribe(handler.channel_id());

    let frame = handler.launch(vec![sleepy(&exec, 20, 1u8)]);

    let published = sub.blocking_recv().unwrap();
    assert_eq!(published.payload.as_str(), "Content loaded!");
    wait_terminal(&frame.status);
    assert_eq!(frame.status.state(), HandlerState::Succeeded);
    exec.shutdown();
    assert!(exec.wait_for_termination(WAIT));
}

#[test]
fn handler_succeeds_on_single_worker_reject_pool() {
    single_task_handler_succeeds(SaturationPolicy::Reject);
}

#[test]
fn handler_succeeds_on_single_worker_block_pool() {
    single_task_handler_succeeds(SaturationPolicy::Block);
}

#[test]
fn chains_complete_on_single_worker_reject_pool() {
    let exec = pool(1, 0, SaturationPolicy::Reject);

    let doubled = sleepy(&exec, 10, 21u32).then(|v| v * 2);
    assert_eq!(doubled.wait(), Ok(42));

    let rescued = failing::<u32>(&exec, 10, "down").rescue(|_| 0);
    assert_eq!(rescued.wait(), Ok(0));

    let chained = sleepy(&exec, 10, 1u32)
        .and_then(|v| Ok(v + 1))
        .then(|v| v + 1);
    assert_eq!(chained.wait(), Ok(3));
    exec.shutdown();
}

#[test]
fn then_callbacks_on_one_promise_run_in_registration_order() {
    let exec = pool(1, 100, SaturationPolicy::Reject);
    let (resolver, source) = Promise::<u32>::resolvable(&exec);
    let order = Arc::new(Mutex::new(Vec::new()));

    let followers: Vec<Promise<()>> = (0..8)
        .map(|i| {
            let order = Arc::clone(&order);
            source.then(move |_| order.lock().unwrap().push(i))
        })
        .collect();

    resolver.settle(Ok(1));
    for f in &followers {
        assert_eq!(f.wait(), Ok(()));
    }
    assert_eq!(*order.lock().unwrap(), (0..8).collect::<Vec<_>>());
    exec.shutdown();
}

// ---- Properties ----

#[test]
fn fan_in_preserves_submission_order_not_completion_order() {
    let exec = BoundedExecutor::new(ExecutorConfig {
        max_workers: 8,
        ..ExecutorConfig::default()
    });
    let delays = [70u64, 10, 50, 0, 30, 60, 20, 40];
    let promises = delays
        .iter()
        .enumerate()
        .map(|(i, ms)| sleepy(&exec, *ms, i))
        .collect();

    assert_eq!(fan_in(&exec, promises).wait(), Ok((0..delays.len()).collect()));
}

#[test]
fn settled_value_is_stable_and_late_callbacks_fire_once() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let promise = Promise::fulfilled(&exec, 7u8);
    assert_eq!(promise.wait(), Ok(7));
    assert_eq!(promise.peek(), Some(Ok(7)));

    let calls = Arc::new(AtomicUsize::new(0));
    let late: Vec<_> = (0..3)
        .map(|_| {
            let calls = Arc::clone(&calls);
            promise.then(move |v| {
                calls.fetch_add(1, Ordering::SeqCst);
                v
            })
        })
        .collect();

    for p in &late {
        assert_eq!(p.wait(), Ok(7));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(promise.wait(), Ok(7));
}

#[test]
fn combined_rejection_is_the_lowest_index_one() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let promises = vec![
        sleepy(&exec, 10, 0u8),
        failing(&exec, 80, "late but first"),
        failing(&exec, 0, "early but second"),
        sleepy(&exec, 40, 3u8),
    ];

    assert_eq!(
        fan_in(&exec, promises).wait(),
        Err(TaskError::fail("late but first"))
    );
}

#[test]
fn every_handler_publishes_exactly_once() {
    let exec = BoundedExecutor::new(ExecutorConfig {
        max_workers: 4,
        ..ExecutorConfig::default()
    });
    let counts: Arc<Mutex<HashMap<ChannelId, Vec<Rendered>>>> = Arc::default();
    let recorder = Arc::clone(&counts);
    let notifier: Arc<dyn framevisor::Notifier> =
        Arc::new(move |ch: &ChannelId, _: &str, payload: &Rendered| {
            recorder
                .lock()
                .unwrap()
                .entry(ch.clone())
                .or_default()
                .push(payload.clone());
            Ok::<(), NotifyError>(())
        });

    let mut statuses = Vec::new();
    for i in 0..20u64 {
        let promises = if i % 3 == 0 {
            vec![sleepy(&exec, i, i), failing(&exec, 20 - i, "nope")]
        } else {
            vec![sleepy(&exec, i, i), sleepy(&exec, 20 - i, i)]
        };
        let handler = OutcomeHandler::with_shared_notifier(format!("frame-{i}"), Arc::clone(&notifier))
            .with_executor(exec.clone())
            .with_error_sink(|_: &HandlerError, _: &ReportContext| {});
        statuses.push((handler.channel_id().clone(), handler.launch(promises).status));
    }

    for (_, status) in &statuses {
        wait_terminal(status);
    }
    thread::sleep(Duration::from_millis(50));

    let counts = counts.lock().unwrap();
    assert_eq!(counts.len(), statuses.len());
    for (channel, status) in &statuses {
        let payloads = &counts[channel];
        assert_eq!(payloads.len(), 1, "channel {channel} published {payloads:?}");
        let expected = match status.state() {
            HandlerState::Succeeded => "Content loaded!",
            _ => "Error loading content",
        };
        assert_eq!(payloads[0].as_str(), expected);
    }
}

#[test]
fn empty_promise_list_publishes_and_reports_nothing() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let publishes = Arc::new(AtomicUsize::new(0));
    let reports = Arc::new(AtomicUsize::new(0));
    let (p, r) = (Arc::clone(&publishes), Arc::clone(&reports));

    let status = OutcomeHandler::<u8>::new("empty", move |_: &ChannelId, _: &str, _: &Rendered| {
        p.fetch_add(1, Ordering::SeqCst);
        Ok::<(), NotifyError>(())
    })
    .with_executor(exec)
    .with_error_sink(move |_: &HandlerError, _: &ReportContext| {
        r.fetch_add(1, Ordering::SeqCst);
    })
    .handle_promises(Vec::new());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(status.state(), HandlerState::Idle);
    assert_eq!(publishes.load(Ordering::SeqCst), 0);
    assert_eq!(reports.load(Ordering::SeqCst), 0);
}

#[test]
fn run_inline_policy_executes_overflow_on_the_caller() {
    let exec = pool(1, 0, SaturationPolicy::RunInline);
    let gate = occupy(&exec);

    let caller = thread::current().id();
    let started = Instant::now();
    let promise = exec
        .submit(|| Ok::<_, TaskError>(thread::current().id()))
        .unwrap();

    // Settled before submit returned, on this thread.
    assert!(promise.is_settled());
    assert_eq!(promise.peek(), Some(Ok(caller)));
    assert!(started.elapsed() < WAIT);

    gate.send(()).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_subscriber_receives_the_outcome() {
    let exec = BoundedExecutor::new(ExecutorConfig::default());
    let bus = BroadcastNotifier::default();
    let handler = OutcomeHandler::new("async", bus.clone())
        .with_executor(exec.clone())
        .on_success(|values: &[u32]| values.iter().sum::<u32>().to_string());
    let mut sub = bus.subscribe(handler.channel_id());

    let all = fan_in(&exec, vec![sleepy(&exec, 20, 20u32), sleepy(&exec, 10, 22u32)]);
    assert_eq!(all.settled().await, Ok(vec![20, 22]));

    handler.launch(vec![all.then(|v| v[0]), all.then(|v| v[1])]);
    let published = tokio::time::timeout(WAIT, sub.recv()).await.unwrap().unwrap();
    assert_eq!(published.payload.as_str(), "42");
}
