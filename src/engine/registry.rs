//! Collaborator discovery.
//!
//! Hosts register collaborator factories at start-up under the conventional identity
//! `<module>/Tests/Collaboration/<Scenario>`. Discovery walks the enabled-module listing in its enumeration order and
//! instantiates every module that provides an implementation of the running scenario, each bound to the leader's
//! channel. A module without an implementation is skipped silently; that is the normal case.

use std::collections::{BTreeSet, HashMap};

use concord_core::naming::{collaboration_identity, split_identity};

use super::collaborator::{Capabilities, Collaborator, CollaboratorFactory, Seat};
use super::channel::ResultChannel;

/// One module known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    /// Where the module's implementation lives; informational only.
    pub location: String,
    pub enabled: bool,
}

/// Ordered listing of the host's modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleListing {
    modules: Vec<ModuleEntry>,
}

impl ModuleListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an enabled module.
    pub fn enabled(mut self, name: impl Into<String>, location: impl Into<String>) -> Self {
        self.modules.push(ModuleEntry {
            name: name.into(),
            location: location.into(),
            enabled: true,
        });
        self
    }

    /// Append a disabled module.
    pub fn disabled(mut self, name: impl Into<String>, location: impl Into<String>) -> Self {
        self.modules.push(ModuleEntry {
            name: name.into(),
            location: location.into(),
            enabled: false,
        });
        self
    }

    /// Enabled modules in enumeration order.
    pub fn iter_enabled(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.modules.iter().filter(|m| m.enabled)
    }

    pub fn entries(&self) -> &[ModuleEntry] {
        &self.modules
    }
}

/// Explicit registry of collaborator implementations.
pub struct CollaboratorRegistry<S> {
    listing: ModuleListing,
    factories: HashMap<String, CollaboratorFactory<S>>,
}

impl<S> CollaboratorRegistry<S> {
    pub fn new(listing: ModuleListing) -> Self {
        Self {
            listing,
            factories: HashMap::new(),
        }
    }

    /// Register `module`'s implementation of `scenario`. A later registration for the same pair replaces the earlier.
    pub fn register<F>(&mut self, module: &str, scenario: &str, factory: F) -> &mut Self
    where
        F: Fn(&ResultChannel) -> Capabilities<S> + 'static,
    {
        let identity = collaboration_identity(module, scenario);
        if self.factories.insert(identity.clone(), Box::new(factory)).is_some() {
            tracing::warn!(%identity, "collaborator implementation registered twice; keeping the last");
        }
        self
    }

    pub fn listing(&self) -> &ModuleListing {
        &self.listing
    }

    /// Resolve an implementation by identity; `None` when absent.
    pub fn resolve(&self, identity: &str) -> Option<&CollaboratorFactory<S>> {
        self.factories.get(identity)
    }

    /// Modules (enabled or not) that provide `scenario`, in listing order.
    pub fn providers(&self, scenario: &str) -> Vec<&str> {
        self.listing
            .entries()
            .iter()
            .filter(|m| self.factories.contains_key(&collaboration_identity(&m.name, scenario)))
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Scenario names with at least one registered implementation, sorted.
    pub fn scenarios(&self) -> BTreeSet<&str> {
        self.factories
            .keys()
            .filter_map(|identity| split_identity(identity).map(|(_, scenario)| scenario))
            .collect()
    }

    /// Build the collaborator list of a run: `leader` first, then every other enabled, non-excluded module providing
    /// the scenario, in listing order.
    #[tracing::instrument(skip_all, fields(scenario = leader.channel().scenario()))]
    pub fn discover(&self, leader: Collaborator<S>, excluded: &BTreeSet<String>) -> Vec<Collaborator<S>> {
        let channel = leader.channel().clone();
        let scenario = channel.scenario().to_string();
        let leader_module = leader.module().to_string();
        let mut collaborators = vec![leader];

        for module in self.listing.iter_enabled() {
            if module.name == leader_module {
                continue;
            }
            if excluded.contains(&module.name) {
                tracing::debug!(module = %module.name, "module excluded from discovery");
                continue;
            }
            let identity = collaboration_identity(&module.name, &scenario);
            let Some(factory) = self.resolve(&identity) else {
                tracing::trace!(%identity, "no collaborator implementation");
                continue;
            };
            let capabilities = factory(&channel);
            tracing::debug!(module = %module.name, routines = capabilities.routines().len(), "collaborator joined");
            collaborators.push(Collaborator::new(
                Seat::Module(module.name.clone()),
                module.name.clone(),
                channel.clone(),
                capabilities,
            ));
        }

        collaborators
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use uuid::Uuid;

    use super::*;
    use crate::engine::channel::SharedSink;
    use crate::engine::hooks::NoExtensions;
    use crate::engine::isolation::Namespace;
    use crate::engine::sink::MemorySink;

    fn channel() -> ResultChannel {
        let sink: SharedSink = Rc::new(RefCell::new(MemorySink::new()));
        ResultChannel::open(
            Uuid::new_v4(),
            "NodeAccess",
            "node",
            Namespace::new("", std::env::temp_dir()),
            sink,
            Rc::new(NoExtensions),
        )
    }

    fn leader(ch: &ResultChannel) -> Collaborator<()> {
        Collaborator::new(Seat::Leader, "node", ch.clone(), Capabilities::new())
    }

    fn listing() -> ModuleListing {
        ModuleListing::new()
            .enabled("node", "modules/node")
            .enabled("taxonomy", "modules/taxonomy")
            .enabled("comment", "modules/comment")
            .disabled("forum", "modules/forum")
            .enabled("user", "modules/user")
    }

    #[test]
    fn test_leader_first_then_listing_order() {
        let mut registry: CollaboratorRegistry<()> = CollaboratorRegistry::new(listing());
        registry
            .register("user", "NodeAccess", |_| Capabilities::new())
            .register("comment", "NodeAccess", |_| Capabilities::new());

        let ch = channel();
        let found = registry.discover(leader(&ch), &BTreeSet::new());
        let modules: Vec<_> = found.iter().map(|c| c.module()).collect();
        assert_eq!(modules, vec!["node", "comment", "user"]);
        assert_eq!(found[0].seat(), &Seat::Leader);
    }

    #[test]
    fn test_every_collaborator_reports_to_the_leader_channel() {
        let mut registry: CollaboratorRegistry<()> = CollaboratorRegistry::new(listing());
        registry.register("comment", "NodeAccess", |_| Capabilities::new());

        let ch = channel();
        let found = registry.discover(leader(&ch), &BTreeSet::new());
        assert!(found.iter().all(|c| c.channel().same_run(&ch)));
        assert!(found.iter().all(|c| c.reports_to() == "node"));
    }

    #[test]
    fn test_disabled_and_excluded_modules_are_skipped() {
        let mut registry: CollaboratorRegistry<()> = CollaboratorRegistry::new(listing());
        registry
            .register("forum", "NodeAccess", |_| Capabilities::new())
            .register("user", "NodeAccess", |_| Capabilities::new())
            .register("comment", "NodeAccess", |_| Capabilities::new());

        let excluded: BTreeSet<String> = ["user".to_string()].into_iter().collect();
        let found = registry.discover(leader(&channel()), &excluded);
        let modules: Vec<_> = found.iter().map(|c| c.module()).collect();
        assert_eq!(modules, vec!["node", "comment"]);
    }

    #[test]
    fn test_other_scenarios_are_not_discovered() {
        let mut registry: CollaboratorRegistry<()> = CollaboratorRegistry::new(listing());
        registry.register("comment", "Other", |_| Capabilities::new());
        let found = registry.discover(leader(&channel()), &BTreeSet::new());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_leader_module_is_not_instantiated_twice() {
        let mut registry: CollaboratorRegistry<()> = CollaboratorRegistry::new(listing());
        registry.register("node", "NodeAccess", |_| Capabilities::new());
        let found = registry.discover(leader(&channel()), &BTreeSet::new());
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_providers_and_scenarios() {
        let mut registry: CollaboratorRegistry<()> = CollaboratorRegistry::new(listing());
        registry
            .register("user", "NodeAccess", |_| Capabilities::new())
            .register("forum", "NodeAccess", |_| Capabilities::new())
            .register("node", "Revisions", |_| Capabilities::new());
        assert_eq!(registry.providers("NodeAccess"), vec!["forum", "user"]);
        assert_eq!(registry.scenarios().into_iter().collect::<Vec<_>>(), vec!["NodeAccess", "Revisions"]);
    }
}
