//! Role dispatch: turn the collaborators of a run into a pairing plan.
//!
//! ## Notes
//! - Initiators are flattened in collaborator order, then registration order within a collaborator.
//! - Verifiers are keyed by [`Seat`], so their invocation order is fixed (leader first, then modules by name) and does
//!   not depend on discovery order.
//! - A routine is only considered for the role its name qualifies it for; anything else is ignored with a warning.

use std::collections::BTreeMap;

use concord_core::naming::routine_label;
use concord_core::{is_verifier_name, permutation_key};

use super::collaborator::{Collaborator, RoutineBody, Seat};
use super::error::StructuralError;
use super::sink::CallerInfo;

/// One initiator routine of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatorDescriptor {
    /// Index of the owning collaborator in discovery order.
    pub collaborator: usize,
    /// Index of the routine within the collaborator's capabilities.
    pub routine: usize,
    pub seat: Seat,
    pub module: String,
    pub name: String,
    /// The routine name with the `initiate` prefix stripped.
    pub key: String,
    /// Registration site, recorded as provenance of the completion marker.
    pub caller: CallerInfo,
}

/// The verifier routine of one collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierDescriptor {
    pub collaborator: usize,
    pub routine: usize,
    pub seat: Seat,
    pub module: String,
    pub caller: CallerInfo,
}

/// Every initiator of a run, to be paired with every verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingPlan {
    pub initiators: Vec<InitiatorDescriptor>,
    pub verifiers: BTreeMap<Seat, VerifierDescriptor>,
}

impl PairingPlan {
    /// Number of verifier invocations a fully successful run performs.
    pub fn pair_count(&self) -> usize {
        self.initiators.len() * self.verifiers.len()
    }
}

/// Classify every collaborator's routines and build the pairing plan.
///
/// ## Errors
/// - [`StructuralError::NoInitiators`] when no collaborator exposes a qualifying initiator.
#[tracing::instrument(skip_all, fields(scenario = %scenario, collaborators = collaborators.len()))]
pub fn plan<S>(scenario: &str, collaborators: &[Collaborator<S>]) -> Result<PairingPlan, StructuralError> {
    let mut plan = PairingPlan::default();

    for (ci, collaborator) in collaborators.iter().enumerate() {
        for (ri, routine) in collaborator.capabilities().routines().iter().enumerate() {
            let name = routine.name();
            let caller = CallerInfo::from_location(
                routine.origin(),
                routine_label(scenario, collaborator.module(), name),
            );
            match routine.body() {
                RoutineBody::Initiate(_) => {
                    let Some(key) = permutation_key(name) else {
                        tracing::warn!(module = collaborator.module(), routine = name, "initiator name lacks the `initiate` prefix; ignored");
                        continue;
                    };
                    plan.initiators.push(InitiatorDescriptor {
                        collaborator: ci,
                        routine: ri,
                        seat: collaborator.seat().clone(),
                        module: collaborator.module().to_string(),
                        name: name.to_string(),
                        key: key.to_string(),
                        caller,
                    });
                }
                RoutineBody::Verify(_) => {
                    if !is_verifier_name(name) {
                        tracing::warn!(module = collaborator.module(), routine = name, "verifier not named `verify`; ignored");
                        continue;
                    }
                    let descriptor = VerifierDescriptor {
                        collaborator: ci,
                        routine: ri,
                        seat: collaborator.seat().clone(),
                        module: collaborator.module().to_string(),
                        caller,
                    };
                    if plan.verifiers.insert(collaborator.seat().clone(), descriptor).is_some() {
                        tracing::warn!(module = collaborator.module(), "more than one verifier registered; keeping the last");
                    }
                }
            }
        }
    }

    if plan.initiators.is_empty() {
        return Err(StructuralError::NoInitiators {
            scenario: scenario.to_string(),
        });
    }

    tracing::debug!(
        initiators = plan.initiators.len(),
        verifiers = plan.verifiers.len(),
        "pairing plan built"
    );
    Ok(plan)
}
