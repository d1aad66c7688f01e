//! Extension points reachable from a collaboration run.
//!
//! Richer collaboration tests need to call into the modules under test: invoke one module's implementation of a
//! named extension point, invoke every enabled module's implementation, or let every module alter a value. The engine
//! only exposes these entry points; discovering and dispatching the implementations belongs to the host.

use serde_json::Value;

/// Dispatcher for named extension points.
pub trait ExtensionPoints {
    /// Invoke `hook` on a single `module`. `None` when the module does not implement it.
    fn invoke_on(&self, module: &str, hook: &str, args: &[Value]) -> Option<Value>;

    /// Invoke `hook` on every enabled module, collecting the results in module order.
    fn invoke_all(&self, hook: &str, args: &[Value]) -> Vec<Value>;

    /// Let every module implementing the alteration point `hook` mutate `value`.
    fn alter_all(&self, hook: &str, value: Value) -> Value;
}

/// Extension points with no implementations behind them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtensions;

impl ExtensionPoints for NoExtensions {
    fn invoke_on(&self, _module: &str, _hook: &str, _args: &[Value]) -> Option<Value> {
        None
    }

    fn invoke_all(&self, _hook: &str, _args: &[Value]) -> Vec<Value> {
        Vec::new()
    }

    fn alter_all(&self, _hook: &str, value: Value) -> Value {
        value
    }
}
