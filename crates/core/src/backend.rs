//! # Execution-Backend Boundary
//!
//! The wiring engine does not evaluate anything. Once a binding's input
//! sockets are resolved it emits one ordered [`BuildRequest`] to a
//! [`BackendContext`], and the backend answers with an opaque operation
//! handle the engine stores verbatim. Variables work the same way: a
//! component's resolution hook asks the backend to materialize a variable
//! and only ever keeps the returned handle.
//!
//! The context is passed explicitly into every call that creates
//! operations or variables. There is no process-wide backend state.

use serde::{Deserialize, Serialize};

use crate::space::SpaceDesc;

/// Opaque handle to a backend-built operation. Never introspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpHandle(pub u64);

/// Opaque handle to a backend-built variable. Never introspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarHandle(pub u64);

/// Structural traversal flags for an operation binding.
///
/// `flatten` linearizes nested container inputs into auto-keyed leaves
/// before the transform runs per leaf; `auto_key` passes the positional
/// container key to the transform; `unflatten` re-nests the outputs
/// mirrored from the input container shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpFlags {
    pub flatten: bool,
    pub auto_key: bool,
    pub unflatten: bool,
}

impl Default for OpFlags {
    fn default() -> Self {
        Self {
            flatten: true,
            auto_key: false,
            unflatten: true,
        }
    }
}

impl OpFlags {
    /// No container traversal: the transform sees the spaces as declared.
    pub fn passthrough() -> Self {
        Self {
            flatten: false,
            auto_key: false,
            unflatten: false,
        }
    }
}

/// One ordered request to build an operation, emitted per resolved binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Name of the registered transform, meaningful to the backend.
    pub transform: String,
    /// Global scope of the component owning the binding.
    pub scope: String,
    pub input_spaces: Vec<SpaceDesc>,
    pub output_spaces: Vec<SpaceDesc>,
    pub flags: OpFlags,
}

/// One request to materialize a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRequest {
    /// Fully-scoped name, `global_scope + "/" + name`.
    pub name: String,
    pub space: SpaceDesc,
    pub trainable: bool,
}

/// The seam between the wiring engine and the numeric execution backend.
///
/// Implementations are free to build a real computation graph, record the
/// requests, or do nothing at all — the engine only stores the handles.
pub trait BackendContext {
    fn build_operation(&mut self, request: BuildRequest) -> OpHandle;

    fn create_variable(&mut self, request: VariableRequest) -> VarHandle;
}
