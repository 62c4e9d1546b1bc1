use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use weft::Error;
use weft::combinator::Combinator;
use weft::diagnostics::{Level, check, deprecate, log};

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn captured<R>(f: impl FnOnce() -> R) -> (R, String) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_env_filter(EnvFilter::new("weft=trace"))
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture.contents())
}

#[test]
fn test_log_levels_and_error_field() {
    let cause = Error::Cancelled;
    let ((), output) = captured(|| {
        log(Level::Warn, "first", None);
        log(Level::Error, "second", Some(&cause as &dyn std::error::Error));
    });

    assert!(output.contains("WARN"));
    assert!(output.contains("weft: first"));
    assert!(output.contains("ERROR"));
    assert!(output.contains("weft: second"));
    assert!(output.contains("error=operation was cancelled"));
}

#[test]
#[cfg(debug_assertions)]
fn test_deprecate_warns_on_every_call() {
    let old_double = deprecate(|n: u32| n * 2, "old_double is deprecated");

    let (results, output) = captured(|| (old_double(1), old_double(2)));

    assert_eq!(results, (2, 4));
    assert_eq!(output.matches("old_double is deprecated").count(), 2);
}

#[test]
fn test_check_failure_is_assertion_error() {
    let err = check(Vec::<u8>::new(), |v| !v.is_empty(), "expected items").unwrap_err();

    assert_eq!(err, Error::Assertion("expected items".into()));
    assert!(err.to_string().contains("expected items"));
}

#[test]
fn test_duplicate_slot_report_is_logged() {
    let ((), output) = captured(|| {
        let fan = Combinator::<usize, u8, ()>::sequence(2, |_| {});
        fan.slot(0).unwrap().succeed(1);
        fan.slot(0).unwrap().succeed(2);
    });

    assert!(output.contains("slot reported twice"));
}

#[test]
fn test_events_outside_the_crate_are_filtered() {
    let ((), output) = captured(|| {
        tracing::warn!(target: "other_crate", "not ours");
        log(Level::Warn, "ours", None);
    });

    assert!(!output.contains("not ours"));
    assert!(output.contains("weft: ours"));
}
