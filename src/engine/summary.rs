//! What a run reports back to its caller.
//!
//! Assertions themselves live in the leader's sink; the summary only describes how the run went.

use serde::Serialize;
use uuid::Uuid;

/// How one initiator's iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InitiatorOutcome {
    /// The initiator produced a state and every verifier was invoked with it.
    Completed { verifier_failures: usize },
    /// The initiator returned an error; no verifier was invoked.
    InitiatorFailed,
    /// The leader's setup failed; the initiator was not invoked.
    SetupFailed,
}

impl InitiatorOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self, InitiatorOutcome::Completed { verifier_failures: 0 })
    }
}

/// One iteration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitiatorReport {
    pub module: String,
    pub name: String,
    pub key: String,
    #[serde(flatten)]
    pub outcome: InitiatorOutcome,
}

/// Result of a run that was able to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub scenario: String,
    pub leader: String,
    /// Name of the isolated namespace the run used.
    pub namespace: String,
    /// Participating modules, leader first.
    pub collaborators: Vec<String>,
    pub initiators: Vec<InitiatorReport>,
    pub verifier_invocations: usize,
    /// Status messages queued during the run and discarded at its end.
    pub discarded_messages: usize,
}

impl RunSummary {
    pub fn verifier_failures(&self) -> usize {
        self.initiators
            .iter()
            .map(|r| match r.outcome {
                InitiatorOutcome::Completed { verifier_failures } => verifier_failures,
                _ => 0,
            })
            .sum()
    }

    /// Iterations that hit a setup, initiator or verifier error. Failed assertions are not counted; they live in the
    /// sink.
    pub fn failed_iterations(&self) -> usize {
        self.initiators.iter().filter(|r| !r.outcome.is_clean()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_iterations() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(key: &str, outcome: InitiatorOutcome) -> InitiatorReport {
        InitiatorReport {
            module: "a".to_string(),
            name: format!("initiate{key}"),
            key: key.to_string(),
            outcome,
        }
    }

    fn summary(initiators: Vec<InitiatorReport>) -> RunSummary {
        RunSummary {
            run_id: Uuid::nil(),
            scenario: "Scenario".to_string(),
            leader: "a".to_string(),
            namespace: "collab000000000000".to_string(),
            collaborators: vec!["a".to_string()],
            initiators,
            verifier_invocations: 0,
            discarded_messages: 0,
        }
    }

    #[test]
    fn test_failure_counts() {
        let s = summary(vec![
            report("Foo", InitiatorOutcome::Completed { verifier_failures: 0 }),
            report("Bar", InitiatorOutcome::Completed { verifier_failures: 2 }),
            report("Baz", InitiatorOutcome::InitiatorFailed),
            report("Qux", InitiatorOutcome::SetupFailed),
        ]);
        assert_eq!(s.verifier_failures(), 2);
        assert_eq!(s.failed_iterations(), 3);
        assert!(!s.is_clean());
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let json = serde_json::to_value(report("Foo", InitiatorOutcome::Completed { verifier_failures: 1 })).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["verifier_failures"], 1);
        assert_eq!(json["key"], "Foo");
    }
}
