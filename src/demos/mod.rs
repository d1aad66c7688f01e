//! Built-in collaboration scenarios.
//!
//! Each scenario registers a handful of modules that cooperate on shared files inside the run's isolated
//! namespace. They give the CLI something to run and exercise the engine end to end.
//!
//! ## Notes
//! - Scenarios are generic over their own state type; a [`Demo`] erases it behind plain function pointers so the
//!   catalog can be listed and launched uniformly.

pub mod content_lifecycle;
pub mod stale_cache;

use std::cell::RefCell;
use std::rc::Rc;

use concord_core::{is_verifier_name, permutation_key};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{
    Capabilities, CollaboratorRegistry, EngineConfig, MemorySink, Namespace, NoExtensions, ResultChannel,
    RunObserver, RunResult, RunSummary, SharedSink,
};

/// Everything a launched scenario needs from its caller.
pub struct DemoRun {
    pub config: EngineConfig,
    pub sink: MemorySink,
    pub observer: Box<dyn RunObserver>,
}

/// Roles one module plays in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRoles {
    pub module: String,
    pub leader: bool,
    pub enabled: bool,
    /// Qualifying initiator names, in registration order.
    pub initiators: Vec<String>,
    pub verifier: bool,
}

/// A launchable scenario of the catalog.
#[derive(Clone, Copy)]
pub struct Demo {
    pub name: &'static str,
    pub leader: &'static str,
    pub description: &'static str,
    launch: fn(DemoRun) -> RunResult<RunSummary>,
    roles: fn() -> Vec<ModuleRoles>,
}

impl Demo {
    /// Run the scenario with `run`'s configuration, recording into its sink.
    pub fn launch(&self, run: DemoRun) -> RunResult<RunSummary> {
        (self.launch)(run)
    }

    /// Roles of the leader and every module providing the scenario.
    pub fn roles(&self) -> Vec<ModuleRoles> {
        (self.roles)()
    }
}

impl std::fmt::Debug for Demo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demo")
            .field("name", &self.name)
            .field("leader", &self.leader)
            .finish_non_exhaustive()
    }
}

/// All built-in scenarios, sorted by name.
pub fn catalog() -> Vec<Demo> {
    vec![
        Demo {
            name: content_lifecycle::SCENARIO,
            leader: content_lifecycle::LEADER,
            description: "Articles saved by node and revision, checked by every module including search",
            launch: content_lifecycle::launch,
            roles: content_lifecycle::roles,
        },
        Demo {
            name: stale_cache::SCENARIO,
            leader: stale_cache::LEADER,
            description: "Page edits that skip cache invalidation; the cache verifier reports the stale entry",
            launch: stale_cache::launch,
            roles: stale_cache::roles,
        },
    ]
}

/// Look a scenario up by name, ignoring ASCII case.
pub fn find(name: &str) -> Option<Demo> {
    catalog().into_iter().find(|d| d.name.eq_ignore_ascii_case(name))
}

/// Describe the roles of `leader` and of every listed module registered for `scenario`.
///
/// Capabilities are built against a throwaway channel; factories must not have side effects.
pub(crate) fn describe<S>(
    scenario: &str,
    leader: &str,
    own: &dyn Fn(&ResultChannel) -> Capabilities<S>,
    registry: &CollaboratorRegistry<S>,
) -> Vec<ModuleRoles> {
    let sink: SharedSink = Rc::new(RefCell::new(MemorySink::new()));
    let probe = ResultChannel::open(
        Uuid::nil(),
        scenario,
        leader,
        Namespace::new("", std::env::temp_dir()),
        sink,
        Rc::new(NoExtensions),
    );

    let mut roles = vec![module_roles(leader, true, true, &own(&probe))];
    for entry in registry.listing().entries() {
        if entry.name == leader {
            continue;
        }
        let identity = concord_core::naming::collaboration_identity(&entry.name, scenario);
        if let Some(factory) = registry.resolve(&identity) {
            roles.push(module_roles(&entry.name, false, entry.enabled, &factory(&probe)));
        }
    }
    roles
}

fn module_roles<S>(module: &str, leader: bool, enabled: bool, capabilities: &Capabilities<S>) -> ModuleRoles {
    let routines = capabilities.routines();
    ModuleRoles {
        module: module.to_string(),
        leader,
        enabled,
        initiators: routines
            .iter()
            .filter(|r| r.is_initiate() && permutation_key(r.name()).is_some())
            .map(|r| r.name().to_string())
            .collect(),
        verifier: routines.iter().any(|r| !r.is_initiate() && is_verifier_name(r.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_sorted_and_unique() {
        let names: Vec<_> = catalog().iter().map(|d| d.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_find_ignores_case() {
        assert_eq!(find("contentlifecycle").map(|d| d.name), Some(content_lifecycle::SCENARIO));
        assert!(find("Nope").is_none());
    }

    #[test]
    fn test_roles_list_leader_first() {
        for demo in catalog() {
            let roles = demo.roles();
            assert_eq!(roles[0].module, demo.leader);
            assert!(roles[0].leader);
            assert!(roles.iter().skip(1).all(|r| !r.leader));
        }
    }
}
