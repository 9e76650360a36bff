//! # Sockets — Directional Ports on Components
//!
//! A socket is a named, directional port through which a component
//! exchanges resolved space information with the rest of the tree. Sockets
//! only ever cross component boundaries or attach to operation bindings:
//! wiring two sockets of the same component directly is a hard error.
//!
//! Connection endpoints are a closed tagged variant ([`ConnectSpec`]);
//! every consumer pattern-matches exhaustively instead of dispatching on
//! runtime type.

use graphwire_core::{Constant, SpaceDesc};
use petgraph::stable_graph::NodeIndex;

use crate::component::ComponentId;
use crate::function::FnId;

/// Index of a socket in the wiring graph.
pub type SocketId = NodeIndex;

/// Direction of a socket, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    In,
    Out,
}

/// Whether a socket is part of the component's exposed interface or an
/// internal connection point between operation bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketRole {
    External,
    Internal,
}

/// A non-wire producer attached to a socket.
#[derive(Debug, Clone)]
pub(crate) enum Feed {
    /// An externally supplied space descriptor.
    Space(SpaceDesc),
    /// A constant value; resolves the socket from the constant's space.
    Constant(Constant),
    /// The socket is an output of this operation binding.
    Function(FnId),
}

/// Weight of a socket-to-socket edge in the wiring graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wire;

/// A typed port belonging to exactly one component.
#[derive(Debug, Clone)]
pub struct Socket {
    pub(crate) name: String,
    pub(crate) component: ComponentId,
    pub(crate) kind: SocketKind,
    pub(crate) role: SocketRole,
    pub(crate) feeds: Vec<Feed>,
    /// Operation bindings this socket feeds into.
    pub(crate) sinks: Vec<FnId>,
    /// Resolved space. Final for the lifetime of the build once set.
    pub(crate) space: Option<SpaceDesc>,
}

impl Socket {
    pub(crate) fn new(name: String, component: ComponentId, kind: SocketKind, role: SocketRole) -> Self {
        Self {
            name,
            component,
            kind,
            role,
            feeds: Vec::new(),
            sinks: Vec::new(),
            space: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    pub fn role(&self) -> SocketRole {
        self.role
    }

    pub fn is_resolved(&self) -> bool {
        self.space.is_some()
    }

    pub fn space(&self) -> Option<&SpaceDesc> {
        self.space.as_ref()
    }

    /// The operation binding that produces this socket, if any.
    pub fn feeding_binding(&self) -> Option<FnId> {
        self.feeds.iter().find_map(|feed| match feed {
            Feed::Function(id) => Some(*id),
            _ => None,
        })
    }
}

/// One side of a `connect`/`disconnect` call.
#[derive(Debug, Clone)]
pub enum ConnectSpec {
    /// A socket by id.
    Socket(SocketId),
    /// A socket by owning component and name.
    Named(ComponentId, String),
    /// Component shorthand: its only socket on the relevant side.
    Component(ComponentId),
    /// An externally supplied space descriptor (from-side only).
    Space(SpaceDesc),
    /// A constant value (from-side only).
    Constant(Constant),
}

impl ConnectSpec {
    pub fn named(component: ComponentId, socket: impl Into<String>) -> Self {
        ConnectSpec::Named(component, socket.into())
    }
}

/// Infer a socket direction from the `input`/`output` substring naming
/// convention: a name containing `input` is an in-socket, `output` an
/// out-socket. Names containing both or neither are ambiguous.
pub(crate) fn infer_kind(name: &str) -> Option<SocketKind> {
    let has_out = name.contains("output");
    // Strip "output" occurrences so their embedded letters cannot count
    // as an "input" match.
    let has_in = name.replace("output", "").contains("input");
    match (has_in, has_out) {
        (true, false) => Some(SocketKind::In),
        (false, true) => Some(SocketKind::Out),
        _ => None,
    }
}
