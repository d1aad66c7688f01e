//! Routine naming rules for collaboration roles.
//!
//! A collaborator contributes routines by name. Two names carry meaning:
//! - any name whose lower-cased form starts with `initiate` is an **initiator**; the rest of the name, preserved
//!   verbatim, is its *permutation key*,
//! - the exact name `verify` is the collaborator's **verifier**.
//!
//! ## Notes
//! - The prefix match is ASCII case-insensitive (`InitiateFoo`, `INITIATEfoo` and `initiatefoo` all qualify).
//! - The verifier match is exact and case-sensitive.

/// Prefix that marks a routine as an initiator.
pub const INITIATOR_PREFIX: &str = "initiate";

/// Name that marks a routine as the verifier.
pub const VERIFIER_NAME: &str = "verify";

/// Derive the permutation key of an initiator routine name.
///
/// ## Parameters
/// - `name`: the routine name as registered.
///
/// ## Returns
/// - `Some(key)`: the name with the `initiate` prefix stripped, when the name qualifies as an initiator.
/// - `None`: when the name does not start with the prefix.
///
/// ## Examples
/// ```rust
/// use concord_core::permutation_key;
///
/// assert_eq!(permutation_key("initiateFoo"), Some("Foo"));
/// assert_eq!(permutation_key("InitiateBar_baz"), Some("Bar_baz"));
/// assert_eq!(permutation_key("initiate"), Some(""));
/// assert_eq!(permutation_key("verify"), None);
/// ```
pub fn permutation_key(name: &str) -> Option<&str> {
    let len = INITIATOR_PREFIX.len();
    if name.len() < len || !name.is_char_boundary(len) {
        return None;
    }
    let (head, rest) = name.split_at(len);
    head.eq_ignore_ascii_case(INITIATOR_PREFIX).then_some(rest)
}

/// Check whether a routine name is the verifier name.
///
/// ## Returns
/// - (`bool`): `true` only for the exact name `verify`.
pub fn is_verifier_name(name: &str) -> bool {
    name == VERIFIER_NAME
}
