//! Property-based tests for collaboration runs
//!
//! Random collaborator shapes (how many initiators each module has, whether it verifies, whether it is enabled) are
//! run through the engine to check pairing and ordering invariants that hand-written scenarios only sample.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::rc::Rc;

use concord::engine::{
    Capabilities, CollaboratorRegistry, Coordinator, EnvironmentContext, Fixture, MemorySink, ModuleListing,
    Provisioner, ResultChannel, RunError, RunSummary, SetupError, StructuralError,
};
use proptest::prelude::*;

const SCENARIO: &str = "Shapes";

/// Provisioner that never touches the file system.
struct NullProvisioner;

impl Provisioner for NullProvisioner {
    fn exists(&self, _dir: &Path) -> bool {
        false
    }

    fn provision(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }

    fn discard(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }
}

struct NoopFixture;

impl Fixture for NoopFixture {
    fn set_up(&mut self, _context: &EnvironmentContext) -> Result<(), SetupError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Shape {
    initiators: usize,
    verifies: bool,
    enabled: bool,
}

fn shape() -> impl Strategy<Value = Shape> {
    (0usize..3, any::<bool>(), any::<bool>()).prop_map(|(initiators, verifies, enabled)| Shape {
        initiators,
        verifies,
        enabled,
    })
}

type CallLog = Rc<RefCell<Vec<String>>>;

fn participant(
    module: String,
    shape: Shape,
    log: CallLog,
) -> impl Fn(&ResultChannel) -> Capabilities<String> + 'static {
    move |_| {
        let mut caps = Capabilities::new();
        for i in 0..shape.initiators {
            let state = format!("{module}-state{i}");
            caps = caps.initiator(format!("initiate{module}{i}"), move |_| Ok(state.clone()));
        }
        if shape.verifies {
            let log = Rc::clone(&log);
            let module = module.clone();
            caps = caps.verifier(move |_, key, state: &String| {
                log.borrow_mut().push(format!("{module}:{key}:{state}"));
                Ok(())
            });
        }
        caps
    }
}

/// Run the leader (`m0`) with the given shapes for `m1..`; returns the run outcome and the verifier call log.
fn run_shapes(leader: &Shape, others: &[Shape]) -> (Result<RunSummary, RunError>, Vec<String>, MemorySink) {
    let log = CallLog::default();
    let mut listing = ModuleListing::new();
    for (i, shape) in others.iter().enumerate() {
        let name = format!("m{}", i + 1);
        listing = if shape.enabled {
            listing.enabled(name.clone(), name)
        } else {
            listing.disabled(name.clone(), name)
        };
    }
    let mut registry = CollaboratorRegistry::new(listing);
    for (i, shape) in others.iter().enumerate() {
        let name = format!("m{}", i + 1);
        registry.register(&name, SCENARIO, participant(name.clone(), shape.clone(), Rc::clone(&log)));
    }

    let sink = MemorySink::new();
    let mut coordinator = Coordinator::new(
        SCENARIO,
        "m0",
        sink.clone(),
        participant("m0".to_string(), leader.clone(), Rc::clone(&log)),
    )
    .with_registry(Rc::new(registry))
    .with_provisioner(Rc::new(NullProvisioner))
    .with_fixture(NoopFixture);

    let result = coordinator.run();
    let calls = log.borrow().clone();
    (result, calls, sink)
}

// =============================================================================
// Pairing Properties
// =============================================================================

proptest! {
    /// Property: every initiator is paired with every verifier exactly once
    #[test]
    fn every_initiator_meets_every_verifier_once(
        leader in shape(),
        others in prop::collection::vec(shape(), 0..5),
    ) {
        let participants: Vec<&Shape> = std::iter::once(&leader).chain(others.iter().filter(|s| s.enabled)).collect();
        let initiators: usize = participants.iter().map(|s| s.initiators).sum();
        let verifiers = participants.iter().filter(|s| s.verifies).count();

        let (result, calls, sink) = run_shapes(&leader, &others);

        if initiators == 0 {
            let is_no_initiators =
                matches!(result, Err(RunError::Structural(StructuralError::NoInitiators { .. })));
            prop_assert!(is_no_initiators);
            prop_assert!(calls.is_empty());
            prop_assert!(sink.records().is_empty());
        } else {
            let summary = result.unwrap();
            prop_assert_eq!(summary.initiators.len(), initiators);
            prop_assert_eq!(summary.verifier_invocations, initiators * verifiers);
            prop_assert_eq!(calls.len(), initiators * verifiers);

            let distinct: BTreeSet<(String, String)> = calls
                .iter()
                .map(|c| {
                    let mut parts = c.split(':');
                    (parts.next().unwrap().to_string(), parts.next().unwrap().to_string())
                })
                .collect();
            prop_assert_eq!(distinct.len(), calls.len());

            prop_assert_eq!(sink.markers_inserted(), initiators);
            prop_assert_eq!(sink.markers_deleted(), initiators);
            prop_assert!(sink.leftover_markers().is_empty());
        }
    }

    /// Property: the leader verifies first, then the others in module order, for every initiator
    #[test]
    fn verifiers_run_in_seat_order(
        leader in shape(),
        others in prop::collection::vec(shape(), 0..5),
    ) {
        let (result, calls, _) = run_shapes(&leader, &others);
        prop_assume!(result.is_ok());
        let summary = result.unwrap();

        let mut expected_order: Vec<String> = Vec::new();
        if leader.verifies {
            expected_order.push("m0".to_string());
        }
        for (i, shape) in others.iter().enumerate() {
            if shape.enabled && shape.verifies {
                expected_order.push(format!("m{}", i + 1));
            }
        }

        let mut expected = Vec::new();
        for report in &summary.initiators {
            let state = format!("{}-state{}", report.module, &report.key[report.module.len()..]);
            for verifier in &expected_order {
                expected.push(format!("{verifier}:{}:{state}", report.key));
            }
        }
        prop_assert_eq!(calls, expected);
    }

    /// Property: two runs of the same shapes make the same calls in the same order
    #[test]
    fn runs_are_deterministic(
        leader in shape(),
        others in prop::collection::vec(shape(), 0..5),
    ) {
        let (first, first_calls, first_sink) = run_shapes(&leader, &others);
        let (second, second_calls, second_sink) = run_shapes(&leader, &others);

        prop_assert_eq!(first.is_ok(), second.is_ok());
        prop_assert_eq!(first_calls, second_calls);
        if let (Ok(a), Ok(b)) = (first, second) {
            prop_assert_eq!(a.collaborators, b.collaborators);
            prop_assert_eq!(a.initiators, b.initiators);
        }
        prop_assert_eq!(first_sink.records().len(), second_sink.records().len());
    }
}
