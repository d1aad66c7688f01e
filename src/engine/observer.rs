//! Progress notifications of a run.

use super::dispatch::InitiatorDescriptor;
use super::summary::{InitiatorOutcome, RunSummary};

/// Observes a run as it progresses.
///
/// Implement this trait to render progress (console, JSON lines, ...). Every method has a no-op default.
pub trait RunObserver {
    /// Called once the collaborators of the run are known, leader first.
    fn on_collaborators(&mut self, _scenario: &str, _modules: &[String]) {}

    /// Called before the leader's setup for an initiator.
    fn on_initiator_start(&mut self, _initiator: &InitiatorDescriptor) {}

    /// Called after teardown for an initiator.
    fn on_initiator_complete(&mut self, _initiator: &InitiatorDescriptor, _outcome: &InitiatorOutcome) {}

    /// Called when the run finished without a fatal error.
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

impl<T: RunObserver + ?Sized> RunObserver for Box<T> {
    fn on_collaborators(&mut self, scenario: &str, modules: &[String]) {
        (**self).on_collaborators(scenario, modules);
    }

    fn on_initiator_start(&mut self, initiator: &InitiatorDescriptor) {
        (**self).on_initiator_start(initiator);
    }

    fn on_initiator_complete(&mut self, initiator: &InitiatorDescriptor, outcome: &InitiatorOutcome) {
        (**self).on_initiator_complete(initiator, outcome);
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        (**self).on_run_complete(summary);
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}
