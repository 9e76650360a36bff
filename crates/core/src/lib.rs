//! # Core — Wiring Engine Foundations
//!
//! This crate provides the foundational abstractions for the graphwire
//! component wiring engine:
//!
//! - **Spaces**: abstract shape/type descriptors carried by resolved sockets
//! - **Constants**: seed values attachable to in-sockets
//! - **Errors**: the single assembly/build error taxonomy
//! - **Backend boundary**: opaque handles and build requests for the
//!   numeric execution backend
//!
//! ## Design Philosophy
//!
//! The engine establishes *what can be computed from what* — once, before
//! execution begins. Everything numeric lives behind the
//! [`backend::BackendContext`] seam; this crate never evaluates anything.

pub mod backend;
pub mod constant;
pub mod error;
pub mod space;

// Re-export key types at crate root for convenience
pub use backend::{BackendContext, BuildRequest, OpFlags, OpHandle, VarHandle, VariableRequest};
pub use constant::Constant;
pub use error::GraphError;
pub use space::{DType, SpaceDesc, ValueSpace};
