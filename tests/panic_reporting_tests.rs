//! Tests for the panic hook scoped to a run
//!
//! The panic hook is process-wide, so everything touching it lives in this one test binary and in a single test
//! function; nothing else can swap the hook concurrently.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use concord::engine::{Capabilities, Coordinator, EngineConfig, MemorySink};

/// Panics seen by the hook installed before any run.
static OUTER_HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

const FATAL_LOG: &str = "participant terminated fatally";

/// Log buffer shared with a `tracing-subscriber` writer.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn fatal_reports(&self) -> usize {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).matches(FATAL_LOG).count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn leader(root: &std::path::Path, sink: &MemorySink, crash: bool) -> Coordinator<String> {
    Coordinator::new("NodeAccess", "node", sink.clone(), move |_| {
        Capabilities::new().initiator("initiateFoo", move |_| {
            if crash {
                panic!("fatal error in participant");
            }
            Ok("state".to_string())
        })
    })
    .with_config(EngineConfig::new().with_files_root(root).with_capture_panics(true))
}

fn panic_outside_run() {
    let result = panic::catch_unwind(|| panic!("outside any run"));
    assert!(result.is_err());
}

#[test]
fn test_run_scopes_the_fatal_error_report() {
    panic::set_hook(Box::new(|_| {
        OUTER_HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let root = tempfile::tempdir().unwrap();

        // A clean run puts the previous hook back: later panics reach it without a fatal report.
        let sink = MemorySink::new();
        leader(root.path(), &sink, false).run().unwrap();
        panic_outside_run();
        assert_eq!(OUTER_HOOK_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(logs.fatal_reports(), 0);

        // A panicking run reports the termination and still hands it to the previous hook.
        let sink = MemorySink::new();
        let mut crashing = leader(root.path(), &sink, true);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| crashing.run()));
        assert!(outcome.is_err());
        assert_eq!(OUTER_HOOK_CALLS.load(Ordering::SeqCst), 2);
        assert_eq!(logs.fatal_reports(), 1);
        assert_eq!(sink.leftover_markers().len(), 1);

        // The reporting layer of the panicking run stays installed and keeps delegating.
        panic_outside_run();
        assert_eq!(OUTER_HOOK_CALLS.load(Ordering::SeqCst), 3);
        assert_eq!(logs.fatal_reports(), 2);
    });

    let _ = panic::take_hook();
}
