//! Tests for the tracer lifecycle: start, consume, interrupt, join.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracetree::*;

fn fast_config() -> TracerConfig {
    TracerConfig::builder()
        .poll_timeout(Duration::from_millis(20))
        .build()
        .unwrap()
}

fn run_method() -> Event {
    Event::FrameEnter {
        iid: 0,
        mid: 0,
        method: MethodRef::new("app/Task", "run", "()V"),
    }
}

fn void_return(iid: i32) -> Event {
    Event::FrameExit {
        iid,
        mid: iid,
        exit: ExitKind::VoidReturn,
    }
}

#[test]
fn test_spawn_traces_current_thread() {
    let sink = MemorySink::new();
    let (tracer, guard) = spawn_with_config(sink.clone(), fast_config()).unwrap();
    assert!(tracer.is_started());

    tracer.consume(run_method());
    tracer.consume(Event::HeapAccess {
        iid: 1,
        mid: 3,
        object_id: 9,
        field: "state".into(),
    });
    tracer.consume(void_return(2));
    drop(guard);

    let report = tracer.join().unwrap();
    assert_eq!(report.outcome, TraceOutcome::Completed);
    assert_eq!(
        sink.lines(),
        vec!["BEGIN app/Task#run()V", "HEAPLOAD(1,3,9,state)", "RET"]
    );
    assert!(sink.is_closed());
}

#[test]
fn test_producer_on_observed_thread() {
    let sink = MemorySink::new();
    let (sender_tx, sender_rx) = mpsc::channel::<EventSender>();

    let observed = thread::spawn(move || {
        let events = sender_rx.recv().unwrap();
        events.put(run_method());
        for i in 1..50 {
            events.put(Event::Instruction { iid: i, mid: i });
        }
        events.put(void_return(50));
    });

    let mut tracer = Tracer::with_config(observed, sink.clone(), fast_config());
    sender_tx.send(tracer.sender()).unwrap();
    tracer.start().unwrap();

    let report = tracer.join().unwrap();
    assert_eq!(report.outcome, TraceOutcome::Completed);
    assert_eq!(report.events_consumed, 51);
    assert_eq!(sink.lines(), vec!["BEGIN app/Task#run()V", "RET"]);
}

#[test]
fn test_bounded_channel_blocks_producer_until_drained() {
    let sink = MemorySink::new();
    let config = TracerConfig::builder()
        .poll_timeout(Duration::from_millis(20))
        .channel_capacity(1usize)
        .build()
        .unwrap();
    let (tracee, guard) = TraceeHandle::new();
    let mut tracer = Tracer::with_config(tracee, sink.clone(), config);
    tracer.start().unwrap();

    tracer.consume(run_method());
    for i in 1..20 {
        tracer.consume(Event::Branch { iid: i, mid: i });
        tracer.consume(Event::DidNotBranch);
    }
    tracer.consume(void_return(99));
    guard.finish();

    let report = tracer.join().unwrap();
    assert_eq!(report.outcome, TraceOutcome::Completed);
    let lines = sink.lines();
    assert_eq!(lines.len(), 21);
    assert_eq!(lines[1], "BRANCH(-1,1)");
    assert_eq!(lines[19], "BRANCH(-19,19)");
}

#[test]
fn test_interrupt_stops_live_tracer() {
    let sink = MemorySink::new();
    let (tracee, _guard) = TraceeHandle::new();
    let mut tracer = Tracer::with_config(tracee, sink.clone(), fast_config());
    tracer.start().unwrap();

    tracer.consume(run_method());
    thread::sleep(Duration::from_millis(50));
    tracer.interrupt();

    let report = tracer.join().unwrap();
    assert_eq!(report.outcome, TraceOutcome::Cancelled);
    assert_eq!(sink.lines(), vec!["BEGIN app/Task#run()V"]);
    assert!(sink.is_closed());
}

#[test]
fn test_consume_after_tracer_finished() {
    let mut tracer = Tracer::with_config(TraceeHandle::finished(), MemorySink::new(), fast_config());
    let late = tracer.sender();
    tracer.start().unwrap();

    let report = tracer.join().unwrap();
    assert_eq!(report.outcome, TraceOutcome::Cancelled);
    assert_eq!(report.events_consumed, 0);

    assert!(!late.put(run_method()));
}

#[test]
fn test_start_twice_is_rejected() {
    let mut tracer = Tracer::with_config(TraceeHandle::finished(), MemorySink::new(), fast_config());
    tracer.start().unwrap();

    let err = tracer.start().unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyStarted));
    let _ = tracer.join().unwrap();
}

#[test]
fn test_join_without_start_is_rejected() {
    let tracer = Tracer::new(TraceeHandle::finished(), MemorySink::new());
    assert!(!tracer.is_started());

    let err = tracer.join().unwrap_err();
    assert!(matches!(err, LifecycleError::NotStarted));
}

#[test]
fn test_run_after_start_is_rejected() {
    let mut tracer = Tracer::with_config(TraceeHandle::finished(), MemorySink::new(), fast_config());
    tracer.start().unwrap();

    let err = tracer.run().unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyStarted));
}

#[test]
fn test_file_sink_written_on_fault() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.log");

    let sink = FileSink::create(&path).unwrap();
    let tracer = Tracer::new(TraceeHandle::finished(), sink);
    tracer.consume(run_method());
    tracer.consume(Event::InvokeCompleted {
        iid: 4,
        mid: 5,
        completion: CompletionKind::Exception,
    });
    let report = tracer.run().unwrap();
    assert!(report.is_faulted());
    assert_eq!(report.lines_written, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "BEGIN app/Task#run()V");
    assert!(lines[1].starts_with("FAULT Consistency fault:"));
}

#[test]
fn test_config_defaults() {
    let config = TracerConfig::default();
    assert_eq!(config.poll_timeout, Duration::from_secs(1));
    assert!(config.is_entrypoint(MAIN_ENTRYPOINT));
    assert!(config.is_entrypoint(RUN_ENTRYPOINT));
    assert!(!config.is_entrypoint("call()Ljava/lang/Object;"));
    assert_eq!(config.thread_name, "__TRACER__");
    assert_eq!(config.channel_capacity, None);
}

#[test]
fn test_config_builder_rejects_invalid_values() {
    let err = TracerConfig::builder()
        .poll_timeout(Duration::ZERO)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("poll_timeout"));

    let err = TracerConfig::builder()
        .entrypoints(Vec::<String>::new())
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("entrypoints"));
}

#[test]
fn test_custom_thread_name() {
    let config = TracerConfig::builder()
        .thread_name("tracer-worker-1")
        .poll_timeout(Duration::from_millis(20))
        .build()
        .unwrap();
    assert_eq!(config.thread_name, "tracer-worker-1");

    let mut tracer = Tracer::with_config(TraceeHandle::finished(), MemorySink::new(), config);
    tracer.start().unwrap();
    let report = tracer.join().unwrap();
    assert_eq!(report.outcome, TraceOutcome::Cancelled);
}
