//! Assertion routing.
//!
//! Every participant of a run (the leader included) writes its results through one [`ResultChannel`]. All clones of
//! a channel share the leader's sink, so the sink observes one globally ordered log per run no matter which
//! participant raised an assertion.

use std::cell::RefCell;
use std::fmt::Debug;
use std::panic::Location;
use std::rc::Rc;

use concord_core::messages::{COMPLETION_GROUP, DEFAULT_GROUP, EXCEPTION_GROUP};
use uuid::Uuid;

use super::error::ParticipantError;
use super::hooks::ExtensionPoints;
use super::isolation::Namespace;
use super::sink::{Assertion, AssertionStatus, CallerInfo, CompletionMarker, MarkerId, ResultSink};

/// A result sink shared between the leader and its run's channel.
pub type SharedSink = Rc<RefCell<dyn ResultSink>>;

struct ChannelInner {
    run_id: Uuid,
    scenario: String,
    leader: String,
    namespace: Namespace,
    sink: SharedSink,
    extensions: Rc<dyn ExtensionPoints>,
    messages: RefCell<Vec<String>>,
}

/// Handle through which participants report to the leader of a run.
#[derive(Clone)]
pub struct ResultChannel {
    inner: Rc<ChannelInner>,
}

impl Debug for ResultChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultChannel")
            .field("run_id", &self.inner.run_id)
            .field("scenario", &self.inner.scenario)
            .field("leader", &self.inner.leader)
            .finish_non_exhaustive()
    }
}

impl ResultChannel {
    pub(crate) fn open(
        run_id: Uuid,
        scenario: &str,
        leader: &str,
        namespace: Namespace,
        sink: SharedSink,
        extensions: Rc<dyn ExtensionPoints>,
    ) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                run_id,
                scenario: scenario.to_string(),
                leader: leader.to_string(),
                namespace,
                sink,
                extensions,
                messages: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.inner.run_id
    }

    pub fn scenario(&self) -> &str {
        &self.inner.scenario
    }

    /// Module name of the leader every assertion is attributed to.
    pub fn leader(&self) -> &str {
        &self.inner.leader
    }

    /// The isolated namespace active for this run.
    pub fn namespace(&self) -> &Namespace {
        &self.inner.namespace
    }

    pub fn extensions(&self) -> &dyn ExtensionPoints {
        self.inner.extensions.as_ref()
    }

    /// Whether two handles belong to the same run.
    pub fn same_run(&self, other: &ResultChannel) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Record an assertion in the leader's sink.
    ///
    /// Without explicit `caller` info, the source location of the call is recorded.
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
        let status = status.into();
        let location = Location::caller();
        let caller = caller.unwrap_or_else(|| CallerInfo::from_location(location, self.scenario()));
        self.inner.sink.borrow_mut().record_assertion(Assertion {
            status,
            message: message.into(),
            group: group.to_string(),
            caller: Some(caller),
        });
        !status.is_failure()
    }

    #[track_caller]
    pub fn pass(&self, message: impl Into<String>) -> bool {
        self.assert(AssertionStatus::Pass, message, DEFAULT_GROUP, None)
    }

    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.assert(AssertionStatus::Fail, message, DEFAULT_GROUP, None)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) -> bool {
        self.assert(AssertionStatus::Debug, message, DEFAULT_GROUP, None)
    }

    #[track_caller]
    pub fn assert_true(&self, condition: bool, message: impl Into<String>) -> bool {
        self.assert(condition, message, DEFAULT_GROUP, None)
    }

    /// Assert that two values are equal; the recorded message includes both values.
    #[track_caller]
    pub fn assert_eq<T: PartialEq + Debug>(&self, left: T, right: T, message: impl Into<String>) -> bool {
        let message = message.into();
        if left == right {
            self.assert(AssertionStatus::Pass, message, DEFAULT_GROUP, None)
        } else {
            let detail = format!("{message}\n  left:  {left:?}\n  right: {right:?}");
            self.assert(AssertionStatus::Fail, detail, DEFAULT_GROUP, None)
        }
    }

    /// Record a participant error as an exception assertion.
    #[track_caller]
    pub fn exception(&self, err: &ParticipantError, caller: Option<CallerInfo>) -> bool {
        self.assert(AssertionStatus::Exception, err.message.clone(), EXCEPTION_GROUP, caller)
    }

    /// Queue a non-assertion status message; discarded when the run ends.
    pub fn notice(&self, message: impl Into<String>) {
        self.inner.messages.borrow_mut().push(message.into());
    }

    pub(crate) fn drain_messages(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.messages.borrow_mut())
    }

    pub(crate) fn insert_marker(&self, message: &str, caller: CallerInfo) -> MarkerId {
        let marker = CompletionMarker {
            run_id: self.inner.run_id,
            scenario: self.inner.scenario.clone(),
            succeeded: false,
            message: message.to_string(),
            caller,
        };
        let id = self.inner.sink.borrow_mut().insert_completion_marker(marker);
        tracing::trace!(marker = id.0, group = COMPLETION_GROUP, "completion marker inserted");
        id
    }

    pub(crate) fn delete_marker(&self, id: MarkerId) {
        self.inner.sink.borrow_mut().delete_completion_marker(id);
    }
}
