//! Participants and the routines they expose.
//!
//! A participant declares its routines explicitly through [`Capabilities`]: named initiators that produce a state
//! value, and at most one verifier that checks such a state. Which registered routines actually take part in a run is
//! decided by the dispatcher from their names (see [`concord_core::roles`]).

use std::fmt;
use std::panic::Location;

use concord_core::VERIFIER_NAME;

use super::channel::ResultChannel;
use super::error::ParticipantResult;

/// Produces the state of one test permutation.
pub type InitiateFn<S> = Box<dyn FnMut(&ResultChannel) -> ParticipantResult<S>>;

/// Checks a produced state; receives the permutation key and the state.
pub type VerifyFn<S> = Box<dyn FnMut(&ResultChannel, &str, &S) -> ParticipantResult<()>>;

/// Builds a participant's capabilities for a run, bound to the run's channel.
pub type CollaboratorFactory<S> = Box<dyn Fn(&ResultChannel) -> Capabilities<S>>;

/// The callable behind a routine.
pub enum RoutineBody<S> {
    Initiate(InitiateFn<S>),
    Verify(VerifyFn<S>),
}

/// A named routine and where it was registered.
pub struct Routine<S> {
    name: String,
    origin: &'static Location<'static>,
    body: RoutineBody<S>,
}

impl<S> Routine<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source location of the registration call.
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }

    pub fn body(&self) -> &RoutineBody<S> {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut RoutineBody<S> {
        &mut self.body
    }

    pub fn is_initiate(&self) -> bool {
        matches!(self.body, RoutineBody::Initiate(_))
    }
}

impl<S> fmt::Debug for Routine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_initiate() { "initiate" } else { "verify" };
        f.debug_struct("Routine")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("origin", &self.origin)
            .finish()
    }
}

/// The routines a participant exposes, in registration order.
pub struct Capabilities<S> {
    routines: Vec<Routine<S>>,
}

impl<S> Default for Capabilities<S> {
    fn default() -> Self {
        Self { routines: Vec::new() }
    }
}

impl<S> Capabilities<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state-producing routine. Only names starting with `initiate` take part in a run.
    #[track_caller]
    pub fn initiator<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&ResultChannel) -> ParticipantResult<S> + 'static,
    {
        self.routine(name, RoutineBody::Initiate(Box::new(f)))
    }

    /// Register the verifier. Registering twice keeps the last one.
    #[track_caller]
    pub fn verifier<F>(self, f: F) -> Self
    where
        F: FnMut(&ResultChannel, &str, &S) -> ParticipantResult<()> + 'static,
    {
        self.routine(VERIFIER_NAME, RoutineBody::Verify(Box::new(f)))
    }

    /// Register a routine under an arbitrary name.
    #[track_caller]
    pub fn routine(mut self, name: impl Into<String>, body: RoutineBody<S>) -> Self {
        self.routines.push(Routine {
            name: name.into(),
            origin: Location::caller(),
            body,
        });
        self
    }

    pub fn routines(&self) -> &[Routine<S>] {
        &self.routines
    }

    pub(crate) fn routine_mut(&mut self, index: usize) -> Option<&mut Routine<S>> {
        self.routines.get_mut(index)
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

/// Position of a collaborator in a run. The leader sorts before every module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Seat {
    Leader,
    Module(String),
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Leader => f.write_str("leader"),
            Seat::Module(name) => f.write_str(name),
        }
    }
}

/// One participant of a run, bound to the run's leader.
pub struct Collaborator<S> {
    seat: Seat,
    module: String,
    channel: ResultChannel,
    capabilities: Capabilities<S>,
}

impl<S> Collaborator<S> {
    pub fn new(seat: Seat, module: impl Into<String>, channel: ResultChannel, capabilities: Capabilities<S>) -> Self {
        Self {
            seat,
            module: module.into(),
            channel,
            capabilities,
        }
    }

    pub fn seat(&self) -> &Seat {
        &self.seat
    }

    /// Name of the module providing this participant.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn channel(&self) -> &ResultChannel {
        &self.channel
    }

    /// The leader this collaborator reports to.
    pub fn reports_to(&self) -> &str {
        self.channel.leader()
    }

    pub fn capabilities(&self) -> &Capabilities<S> {
        &self.capabilities
    }

    /// Invoke the initiator at `index`.
    pub(crate) fn initiate(&mut self, index: usize) -> Option<ParticipantResult<S>> {
        let channel = &self.channel;
        match self.capabilities.routine_mut(index)?.body_mut() {
            RoutineBody::Initiate(f) => Some(f(channel)),
            RoutineBody::Verify(_) => None,
        }
    }

    /// Invoke the verifier at `index`.
    pub(crate) fn verify(&mut self, index: usize, key: &str, state: &S) -> Option<ParticipantResult<()>> {
        let channel = &self.channel;
        match self.capabilities.routine_mut(index)?.body_mut() {
            RoutineBody::Verify(f) => Some(f(channel, key, state)),
            RoutineBody::Initiate(_) => None,
        }
    }
}

impl<S> fmt::Debug for Collaborator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborator")
            .field("seat", &self.seat)
            .field("module", &self.module)
            .field("routines", &self.capabilities.routines)
            .finish()
    }
}
