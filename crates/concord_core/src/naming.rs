//! Naming conventions for discovery identities, isolated namespaces and routine labels.
//!
//! ## Notes
//! - Discovery identities follow `<module>/Tests/Collaboration/<Scenario>`. Registries key collaborator factories by
//!   this string, so a module opts into a scenario simply by registering under the conventional identity.
//! - Isolated namespaces are `<base><suffix>`; the suffix is supplied by the caller (it must be unique, this module
//!   only formats).

/// Path segment between the module name and the scenario name in a discovery identity.
pub const COLLABORATION_SEGMENT: &str = "Tests/Collaboration";

/// Build the discovery identity of a module's implementation of a scenario.
///
/// ## Parameters
/// - `module`: the providing module name.
/// - `scenario`: the scenario name.
///
/// ## Returns
/// - (`String`): the identity, e.g. `node/Tests/Collaboration/NodeAccess`.
///
/// ## Examples
/// ```rust
/// use concord_core::naming::collaboration_identity;
///
/// assert_eq!(collaboration_identity("node", "NodeAccess"), "node/Tests/Collaboration/NodeAccess");
/// ```
pub fn collaboration_identity(module: &str, scenario: &str) -> String {
    format!("{module}/{COLLABORATION_SEGMENT}/{scenario}")
}

/// Split a discovery identity back into `(module, scenario)`.
///
/// ## Returns
/// - `Some((module, scenario))` when the identity follows the convention and both parts are non-empty.
pub fn split_identity(identity: &str) -> Option<(&str, &str)> {
    let (module, rest) = identity.split_once('/')?;
    let scenario = rest.strip_prefix(COLLABORATION_SEGMENT)?.strip_prefix('/')?;
    if module.is_empty() || scenario.is_empty() || scenario.contains('/') {
        return None;
    }
    Some((module, scenario))
}

/// Format the name of an isolated namespace.
///
/// ## Parameters
/// - `base`: the configured namespace base (e.g. `collab`).
/// - `suffix`: a unique suffix.
pub fn isolated_name(base: &str, suffix: &str) -> String {
    format!("{base}{suffix}")
}

/// Format the human-readable label of a routine, used as the `function` of caller info.
///
/// ## Examples
/// ```rust
/// use concord_core::naming::routine_label;
///
/// assert_eq!(routine_label("NodeAccess", "node", "initiatePublished"), "NodeAccess::node::initiatePublished()");
/// ```
pub fn routine_label(scenario: &str, module: &str, routine: &str) -> String {
    format!("{scenario}::{module}::{routine}()")
}
