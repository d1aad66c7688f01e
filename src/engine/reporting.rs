//! Scoped error reporting for the duration of a run.
//!
//! A panic in participant code is a fatal termination the engine does not recover from. While a run is active, a
//! panic hook logs such a termination with the run's identity before handing over to whatever hook was installed
//! before the run; that hook is put back when the run ends.

use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

use uuid::Uuid;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Restores the previous panic hook on drop.
#[must_use = "dropping the guard immediately restores the previous hook"]
pub struct ErrorReportingGuard {
    previous: Option<Arc<PanicHook>>,
}

impl ErrorReportingGuard {
    pub fn install(run_id: Uuid, scenario: &str) -> Self {
        if std::thread::panicking() {
            return Self { previous: None };
        }
        let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
        let delegate = Arc::clone(&previous);
        let scenario = scenario.to_string();
        panic::set_hook(Box::new(move |info| {
            tracing::error!(%run_id, scenario = %scenario, "participant terminated fatally: {info}");
            (delegate.as_ref())(info);
        }));
        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for ErrorReportingGuard {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        // The hook cannot be swapped while unwinding, so the logging hook stays installed and keeps delegating.
        // Each run that panics under a guard therefore adds one more logging layer to the process-wide hook chain.
        if std::thread::panicking() {
            return;
        }
        let _ = panic::take_hook();
        panic::set_hook(Box::new(move |info| (previous.as_ref())(info)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_installs_and_restores() {
        let guard = ErrorReportingGuard::install(Uuid::new_v4(), "Scenario");
        assert!(guard.previous.is_some());
        drop(guard);

        // A panic after restoration is still reported by the restored hook and caught here.
        let result = panic::catch_unwind(|| panic!("after run"));
        assert!(result.is_err());
    }
}
