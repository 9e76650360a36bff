//! # graphwire-assembly
//!
//! Declarative component wiring: components declare directional sockets,
//! compose into a scoped tree, and connect through a typed wiring graph.
//! A build pass then propagates space information from the known edges of
//! the graph to a fixed point, emitting one ordered build request per
//! operation binding to an opaque execution backend.
//!
//! The library splits the work into two phases with a hard boundary:
//!
//! - **Assembly** ([`ComponentGraph`], [`AssemblyCtx`]) — create
//!   components, sockets, operation bindings, and connections. Everything
//!   is structural; nothing touches the backend.
//! - **Build** ([`ComponentGraph::build`]) — resolve every socket to a
//!   space, fire each component's completeness hook exactly once, emit
//!   build and variable requests. The assembly freezes afterwards.
//!
//! ```
//! use graphwire_assembly::{ComponentDef, ComponentGraph, PropagationOrder, SpaceMap, Wiring};
//! use graphwire_core::{BackendContext, SpaceDesc};
//!
//! # struct Noop;
//! # impl BackendContext for Noop {
//! #     fn build_operation(&mut self, _: graphwire_core::BuildRequest) -> graphwire_core::OpHandle {
//! #         graphwire_core::OpHandle(0)
//! #     }
//! #     fn create_variable(&mut self, _: graphwire_core::VariableRequest) -> graphwire_core::VarHandle {
//! #         graphwire_core::VarHandle(0)
//! #     }
//! # }
//! # fn main() -> Result<(), graphwire_core::GraphError> {
//! let mut graph = ComponentGraph::new(ComponentDef::new("pipeline").with_input("state"))?;
//! let root = graph.root();
//! let stage = graph.add_component(
//!     root,
//!     ComponentDef::new("stage").with_input("state").with_output("features"),
//!     Wiring::ExposeAll,
//! )?;
//! graph.add_operation(
//!     stage,
//!     graphwire_assembly::Transform::identity("embed"),
//!     &["state"],
//!     &["features"],
//!     Default::default(),
//! )?;
//!
//! let mut inputs = SpaceMap::new();
//! inputs.insert("state".to_string(), SpaceDesc::float(vec![4]));
//! let report = graph.build(&inputs, &mut Noop, PropagationOrder::Fifo)?;
//! assert_eq!(report.operations.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod component;
pub mod function;
pub mod graph;
pub mod registry;
pub mod socket;
pub mod template;

pub use build::{BuildReport, BuildState, PropagationOrder, VariableCtx};
pub use component::{ComponentBehavior, ComponentDef, ComponentId, NoBehavior, SpaceMap};
pub use function::{FnId, GraphFunction, Transform};
pub use graph::{AssemblyCtx, ComponentGraph, WireTarget, Wiring};
pub use registry::VariableRegistry;
pub use socket::{ConnectSpec, Socket, SocketId, SocketKind, SocketRole};
pub use template::ComponentTemplate;
