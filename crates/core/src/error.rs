//! # Error Types
//!
//! Every failure in the wiring engine is an attempt to assemble or resolve
//! something structurally undefined: attaching a component twice, wiring
//! two sockets of the same component, resolving a socket to two different
//! spaces. None of these are retried — the engine performs no speculative
//! recovery, and a failed build leaves the tree diagnosable but unusable.
//!
//! Every variant that can name a location carries the offending
//! component's global scope and the socket/variable name, so failures are
//! localizable without traversing the whole tree.

use thiserror::Error;

use crate::space::SpaceDesc;

/// Errors raised during assembly or the build pass.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A sibling component already uses this name.
    #[error("component '{name}' already exists under '{scope}'")]
    DuplicateName { scope: String, name: String },

    /// The component already has a parent; each component attaches at most once.
    #[error("component '{name}' is already attached under '{scope}'")]
    AlreadyAttached { scope: String, name: String },

    /// A socket with this name already exists on the component.
    #[error("socket '{name}' already exists on component '{scope}'")]
    DuplicateSocket { scope: String, name: String },

    /// Socket direction could not be inferred from the name.
    #[error("cannot infer socket direction (in/out) from name '{name}' on component '{scope}'")]
    AmbiguousDirection { scope: String, name: String },

    /// The fully-scoped variable key already exists in the ancestor chain.
    #[error("variable '{key}' already registered in the registry of '{scope}'")]
    DuplicateVariable { scope: String, key: String },

    /// Two inbound resolutions disagree on a socket's space.
    #[error("space conflict at '{scope}/{socket}': already resolved to {existing}, got {incoming}")]
    SpaceConflict {
        scope: String,
        socket: String,
        existing: SpaceDesc,
        incoming: SpaceDesc,
    },

    /// Propagation reached a fixed point with unresolved sockets left over
    /// (a cycle, a gap, or a dangling socket).
    #[error("build stuck, unresolved sockets: {}", stuck.join(", "))]
    UnresolvedGraph { stuck: Vec<String> },

    /// Structurally invalid connection (same-component socket pair,
    /// wrong-direction space attachment, mismatched shorthand).
    #[error("invalid connection on '{scope}': {reason}")]
    InvalidConnection { scope: String, reason: String },

    /// Structural mutation after a build pass.
    #[error("assembly '{scope}' is frozen after build, structural mutation is not allowed")]
    AssemblyFrozen { scope: String },

    /// No socket with this name on the component.
    #[error("no socket named '{name}' on component '{scope}'")]
    UnknownSocket { scope: String, name: String },

    /// No sub-component with this name.
    #[error("no sub-component named '{name}'")]
    UnknownComponent { name: String },

    /// Component scope string violates `[A-Za-z0-9_-]*`.
    #[error("scope '{scope}' contains characters outside [A-Za-z0-9_-]")]
    InvalidScope { scope: String },

    /// Socket count does not match the transform's declared arity.
    #[error("transform '{transform}' expects {expected} {side} sockets, got {got}")]
    ArityMismatch {
        transform: String,
        side: &'static str,
        expected: usize,
        got: usize,
    },

    /// Flattened container inputs disagree on their auto-key sets, or an
    /// auto-key map cannot be re-nested.
    #[error("container mismatch in {context}: {detail}")]
    ContainerMismatch { context: String, detail: String },
}
