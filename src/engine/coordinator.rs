//! The participant that leads a collaboration run.
//!
//! A [`Coordinator`] is a participant of a scenario that may become the leader of a run. Calling
//! [`Coordinator::run`] makes it the leader: it isolates the environment, discovers the other collaborators of its
//! scenario, and pairs every initiator of every collaborator with every verifier of every collaborator.
//!
//! ## Notes
//! - For each initiator, in order: the leader's setup, a completion marker, the initiator, every verifier (leader
//!   first, then modules by name), the leader's teardown, removal of the marker.
//! - A panic inside participant code is not caught. The marker of the interrupted iteration stays in the sink as
//!   evidence of the crash while the environment guard still restores the previous namespace during unwinding.
//! - A coordinator that joined another leader's run reports its assertions to that leader and cannot run itself.

use std::panic::Location;
use std::rc::Rc;

use serde_json::Value;
use uuid::Uuid;

use concord_core::messages::{INITIATOR_INCOMPLETE_MSG, NOT_SET_UP_MSG, SETUP_GROUP};

use super::channel::{ResultChannel, SharedSink};
use super::collaborator::{Capabilities, Collaborator, CollaboratorFactory, Seat};
use super::config::EngineConfig;
use super::dispatch::{self, PairingPlan};
use super::error::{ParticipantError, RunResult, StructuralError};
use super::fixture::{CleanSlate, Fixture};
use super::hooks::{ExtensionPoints, NoExtensions};
use super::isolation::{
    ActiveNamespace, EnvironmentContext, EnvironmentIsolator, FsProvisioner, Namespace, Provisioner,
};
use super::observer::{RunObserver, SilentObserver};
use super::registry::{CollaboratorRegistry, ModuleListing};
use super::reporting::ErrorReportingGuard;
use super::sink::{Assertion, AssertionStatus, CallerInfo, ResultSink};
use super::summary::{InitiatorOutcome, InitiatorReport, RunSummary};

/// Who a coordinator's assertions go to.
#[derive(Debug, Clone)]
pub enum Leadership {
    /// No leader designated yet; the coordinator may become one.
    Unassigned,
    /// This coordinator leads (or led) a run.
    Leading,
    /// This coordinator joined another leader's run.
    ReportingTo(ResultChannel),
}

/// A participant able to lead collaboration runs of its scenario.
pub struct Coordinator<S> {
    scenario: String,
    module: String,
    leadership: Leadership,
    sink: SharedSink,
    capabilities: CollaboratorFactory<S>,
    registry: Rc<CollaboratorRegistry<S>>,
    /// `None` runs a [`CleanSlate`] over the coordinator's provisioner.
    fixture: Option<Box<dyn Fixture>>,
    extensions: Rc<dyn ExtensionPoints>,
    observer: Box<dyn RunObserver>,
    provisioner: Rc<dyn Provisioner>,
    isolator: EnvironmentIsolator,
    config: EngineConfig,
}

impl<S> Coordinator<S> {
    /// Create the `module` participant of `scenario`, recording into `sink` when leading.
    ///
    /// `capabilities` builds the participant's own routines for each run.
    pub fn new<K, F>(scenario: impl Into<String>, module: impl Into<String>, sink: K, capabilities: F) -> Self
    where
        K: ResultSink + 'static,
        F: Fn(&ResultChannel) -> Capabilities<S> + 'static,
    {
        let config = EngineConfig::default();
        let provisioner: Rc<dyn Provisioner> = Rc::new(FsProvisioner);
        let isolator = build_isolator(&config, &provisioner);
        let sink: SharedSink = Rc::new(std::cell::RefCell::new(sink));
        Self {
            scenario: scenario.into(),
            module: module.into(),
            leadership: Leadership::Unassigned,
            sink,
            capabilities: Box::new(capabilities),
            registry: Rc::new(CollaboratorRegistry::new(ModuleListing::new())),
            fixture: None,
            extensions: Rc::new(NoExtensions),
            observer: Box::new(SilentObserver),
            provisioner,
            isolator,
            config,
        }
    }

    /// Replace the configuration. Resets the active namespace to the one the config describes.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.isolator = build_isolator(&config, &self.provisioner);
        self.config = config;
        self
    }

    /// Replace how isolated file namespaces are created and removed.
    pub fn with_provisioner(mut self, provisioner: Rc<dyn Provisioner>) -> Self {
        self.isolator = build_isolator(&self.config, &provisioner);
        self.provisioner = provisioner;
        self
    }

    pub fn with_registry(mut self, registry: Rc<CollaboratorRegistry<S>>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_fixture(mut self, fixture: impl Fixture + 'static) -> Self {
        self.fixture = Some(Box::new(fixture));
        self
    }

    pub fn with_extensions(mut self, extensions: Rc<dyn ExtensionPoints>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn leadership(&self) -> &Leadership {
        &self.leadership
    }

    /// Module name of the leader this coordinator reports to; its own name unless it joined another run.
    pub fn leader(&self) -> &str {
        match &self.leadership {
            Leadership::ReportingTo(channel) => channel.leader(),
            Leadership::Unassigned | Leadership::Leading => &self.module,
        }
    }

    /// The namespace currently in effect for this coordinator's runs.
    pub fn active_namespace(&self) -> &ActiveNamespace {
        self.isolator.active()
    }

    /// Join another leader's run. From now on assertions go to that leader and [`run`](Self::run) is refused.
    pub fn join(&mut self, channel: ResultChannel) {
        tracing::debug!(module = %self.module, leader = channel.leader(), "joined collaboration run");
        self.leadership = Leadership::ReportingTo(channel);
    }

    /// Record an assertion: into the leader's sink when reporting to another run, into the own sink otherwise.
    ///
    /// ## Returns
    /// - (`bool`): `true` when the status is not a failure.
    #[track_caller]
    pub fn assert(
        &self,
        status: impl Into<AssertionStatus>,
        message: impl Into<String>,
        group: &str,
        caller: Option<CallerInfo>,
    ) -> bool {
        if let Leadership::ReportingTo(channel) = &self.leadership {
            return channel.assert(status, message, group, caller);
        }
        let status = status.into();
        let location = Location::caller();
        let caller = caller.unwrap_or_else(|| CallerInfo::from_location(location, &self.scenario));
        self.sink.borrow_mut().record_assertion(Assertion {
            status,
            message: message.into(),
            group: group.to_string(),
            caller: Some(caller),
        });
        !status.is_failure()
    }

    /// Invoke one module's implementation of an extension point.
    pub fn do_invoke(&self, module: &str, hook: &str, args: &[Value]) -> Option<Value> {
        self.extensions.invoke_on(module, hook, args)
    }

    /// Invoke every enabled module's implementation of an extension point.
    pub fn do_invoke_all(&self, hook: &str, args: &[Value]) -> Vec<Value> {
        self.extensions.invoke_all(hook, args)
    }

    /// Let every module alter `value`.
    pub fn do_alter(&self, hook: &str, value: Value) -> Value {
        self.extensions.alter_all(hook, value)
    }

    /// Lead one collaboration run of this coordinator's scenario.
    ///
    /// ## Errors
    /// - [`StructuralError::NotLeader`] if this coordinator joined another leader's run.
    /// - [`StructuralError::NoInitiators`] if no collaborator exposes an initiator. No setup or teardown ran.
    /// - [`EnvironmentError`](super::error::EnvironmentError) if the isolated environment cannot be acquired.
    ///
    /// Failures inside participants never surface here; they are recorded in the sink.
    #[tracing::instrument(skip_all, fields(scenario = %self.scenario, leader = %self.module))]
    pub fn run(&mut self) -> RunResult<RunSummary> {
        if let Leadership::ReportingTo(channel) = &self.leadership {
            return Err(StructuralError::NotLeader {
                leader: channel.leader().to_string(),
            }
            .into());
        }
        self.leadership = Leadership::Leading;

        let run_id = Uuid::new_v4();
        let _reporting = self
            .config
            .capture_panics
            .then(|| ErrorReportingGuard::install(run_id, &self.scenario));

        let environment = self.isolator.acquire(&self.config.namespace_base)?;
        let context = environment.context().clone();

        let channel = ResultChannel::open(
            run_id,
            &self.scenario,
            &self.module,
            context.isolated.clone(),
            Rc::clone(&self.sink),
            Rc::clone(&self.extensions),
        );
        let leader = Collaborator::new(Seat::Leader, self.module.clone(), channel.clone(), (self.capabilities)(&channel));
        let mut collaborators = self.registry.discover(leader, &self.config.disabled_modules);
        let modules: Vec<String> = collaborators.iter().map(|c| c.module().to_string()).collect();
        self.observer.on_collaborators(&self.scenario, &modules);

        let plan = dispatch::plan(&self.scenario, &collaborators)?;
        tracing::debug!(
            %run_id,
            collaborators = modules.len(),
            initiators = plan.initiators.len(),
            verifiers = plan.verifiers.len(),
            "collaboration run started"
        );

        let mut clean_slate;
        let fixture: &mut dyn Fixture = match self.fixture.as_deref_mut() {
            Some(fixture) => fixture,
            None => {
                clean_slate = CleanSlate::new(Rc::clone(&self.provisioner));
                &mut clean_slate
            }
        };
        let mut iterations = Iterations {
            plan: &plan,
            collaborators: &mut collaborators,
            channel: &channel,
            context: &context,
            fixture,
            observer: self.observer.as_mut(),
            verifier_invocations: 0,
        };
        let initiators = iterations.run_all();
        let verifier_invocations = iterations.verifier_invocations;

        let discarded = channel.drain_messages();
        if !discarded.is_empty() {
            tracing::debug!(count = discarded.len(), "discarding queued status messages");
        }
        environment.release();

        let summary = RunSummary {
            run_id,
            scenario: self.scenario.clone(),
            leader: self.module.clone(),
            namespace: context.name,
            collaborators: modules,
            initiators,
            verifier_invocations,
            discarded_messages: discarded.len(),
        };
        tracing::debug!(
            verifier_invocations = summary.verifier_invocations,
            failed_iterations = summary.failed_iterations(),
            "collaboration run finished"
        );
        self.observer.on_run_complete(&summary);
        Ok(summary)
    }
}

fn build_isolator(config: &EngineConfig, provisioner: &Rc<dyn Provisioner>) -> EnvironmentIsolator {
    let active = ActiveNamespace::new(Namespace::new(config.storage_prefix.clone(), config.files_root.clone()));
    EnvironmentIsolator::new(active, Rc::clone(provisioner)).with_keep_artifacts(config.keep_artifacts)
}

/// The per-initiator loop of one run.
struct Iterations<'a, S> {
    plan: &'a PairingPlan,
    collaborators: &'a mut [Collaborator<S>],
    channel: &'a ResultChannel,
    context: &'a EnvironmentContext,
    fixture: &'a mut dyn Fixture,
    observer: &'a mut dyn RunObserver,
    verifier_invocations: usize,
}

impl<S> Iterations<'_, S> {
    fn run_all(&mut self) -> Vec<InitiatorReport> {
        let plan = self.plan;
        plan.initiators
            .iter()
            .enumerate()
            .map(|(index, initiator)| {
                self.observer.on_initiator_start(initiator);
                let outcome = self.run_one(index);
                self.observer.on_initiator_complete(initiator, &outcome);
                InitiatorReport {
                    module: initiator.module.clone(),
                    name: initiator.name.clone(),
                    key: initiator.key.clone(),
                    outcome,
                }
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self), fields(initiator = %self.plan.initiators[index].caller.function))]
    fn run_one(&mut self, index: usize) -> InitiatorOutcome {
        let initiator = &self.plan.initiators[index];

        if let Err(e) = self.fixture.set_up(self.context) {
            tracing::warn!(error = %e, "leader setup failed; initiator skipped");
            self.channel
                .assert(AssertionStatus::Fail, NOT_SET_UP_MSG, SETUP_GROUP, Some(initiator.caller.clone()));
            return InitiatorOutcome::SetupFailed;
        }

        let marker = self.channel.insert_marker(INITIATOR_INCOMPLETE_MSG, initiator.caller.clone());

        let produced = self.collaborators[initiator.collaborator]
            .initiate(initiator.routine)
            .unwrap_or_else(|| Err(ParticipantError::new(format!("`{}` is not an initiator", initiator.name))));

        let outcome = match produced {
            Err(e) => {
                tracing::debug!(error = %e, "initiator failed; verifiers skipped");
                self.channel.exception(&e, Some(initiator.caller.clone()));
                InitiatorOutcome::InitiatorFailed
            }
            Ok(state) => {
                let mut verifier_failures = 0;
                for verifier in self.plan.verifiers.values() {
                    self.verifier_invocations += 1;
                    let verdict = self.collaborators[verifier.collaborator]
                        .verify(verifier.routine, &initiator.key, &state)
                        .unwrap_or_else(|| Err(ParticipantError::new("`verify` is not a verifier")));
                    if let Err(e) = verdict {
                        tracing::debug!(verifier = %verifier.seat, error = %e, "verifier failed");
                        self.channel.exception(&e, Some(verifier.caller.clone()));
                        verifier_failures += 1;
                    }
                }
                InitiatorOutcome::Completed { verifier_failures }
            }
        };

        self.fixture.tear_down(self.context);
        self.channel.delete_marker(marker);
        outcome
    }
}
