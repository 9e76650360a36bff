//! # The Assembly — Component Arena and Wiring Graph
//!
//! [`ComponentGraph`] owns the whole tree: a slab of components plus a
//! petgraph [`StableDiGraph`] whose nodes are sockets and whose edges are
//! the socket-to-socket connections. The connection graph is never stored
//! separately — it *is* the union of these edges plus the feed/sink links
//! of operation bindings.
//!
//! All structural mutation happens here, during the assembly phase. After
//! a build pass the assembly is frozen; every mutating entry point checks
//! [`ComponentGraph::ensure_mutable`] first.

use graphwire_core::{Constant, GraphError, OpFlags};
use petgraph::stable_graph::StableDiGraph;
use tracing::debug;

use crate::build::BuildState;
use crate::component::{join_scope, validate_scope, Component, ComponentDef, ComponentId, NoBehavior};
use crate::function::{FnId, GraphFunction, Transform};
use crate::socket::{infer_kind, ConnectSpec, Feed, Socket, SocketId, SocketKind, SocketRole, Wire};

/// Connection-spec policy applied when a sub-component is attached,
/// auto-creating and wiring matching external sockets on the parent.
#[derive(Debug, Clone)]
pub enum Wiring {
    /// Attach only; wire nothing.
    None,
    /// Expose every external in-socket of the child under its own name.
    ExposeInputs,
    /// Expose every external out-socket of the child under its own name.
    ExposeOuts,
    /// Expose every external socket of the child under its own name.
    ExposeAll,
    /// Single-name shorthand: expose one child socket under its own name.
    Expose(String),
    /// Explicit pair list: child socket name to parent socket name or a
    /// constant value bound in place of a socket.
    Pairs(Vec<(String, WireTarget)>),
}

/// Right-hand side of a wiring pair.
#[derive(Debug, Clone)]
pub enum WireTarget {
    /// Wire to a parent socket with this name (created if missing).
    Named(String),
    /// Bind the child in-socket to a constant value instead.
    Constant(Constant),
}

/// The assembled component tree and its socket wiring graph.
pub struct ComponentGraph {
    pub(crate) components: Vec<Component>,
    pub(crate) sockets: StableDiGraph<Socket, Wire>,
    pub(crate) functions: Vec<GraphFunction>,
    /// Bindings with zero input sockets; cannot be discovered by forward
    /// propagation and are seeded explicitly.
    pub(crate) entry_points: Vec<FnId>,
    pub(crate) state: BuildState,
    root: ComponentId,
}

impl ComponentGraph {
    /// Create an assembly with the given root component and run its
    /// behavior's `assemble` callback.
    pub fn new(def: ComponentDef) -> Result<Self, GraphError> {
        let mut graph = Self {
            components: Vec::new(),
            sockets: StableDiGraph::new(),
            functions: Vec::new(),
            entry_points: Vec::new(),
            state: BuildState::Unresolved,
            root: ComponentId(0),
        };
        let root = graph.add_detached(def)?;
        graph.root = root;
        Ok(graph)
    }

    pub fn root(&self) -> ComponentId {
        self.root
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    pub fn socket(&self, id: SocketId) -> &Socket {
        &self.sockets[id]
    }

    /// Look up a direct sub-component by its sibling-unique name.
    pub fn sub_component(&self, parent: ComponentId, name: &str) -> Result<ComponentId, GraphError> {
        self.components[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.components[c.0].name == name)
            .ok_or_else(|| GraphError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// Look up any socket of a component by name (external or internal).
    pub fn socket_id(&self, component: ComponentId, name: &str) -> Result<SocketId, GraphError> {
        self.socket_lookup(component, name)
            .ok_or_else(|| GraphError::UnknownSocket {
                scope: self.components[component.0].global_scope.clone(),
                name: name.to_string(),
            })
    }

    /// Convenience: the resolved space of a named socket, if any.
    pub fn socket_space(
        &self,
        component: ComponentId,
        name: &str,
    ) -> Result<Option<&graphwire_core::SpaceDesc>, GraphError> {
        Ok(self.sockets[self.socket_id(component, name)?].space.as_ref())
    }

    /// Diagnostic name of a socket: `global_scope/name`.
    pub(crate) fn scoped_socket_name(&self, id: SocketId) -> String {
        let sock = &self.sockets[id];
        join_scope(&self.components[sock.component.0].global_scope, &sock.name)
    }

    pub(crate) fn ensure_mutable(&self) -> Result<(), GraphError> {
        if self.state == BuildState::Unresolved {
            Ok(())
        } else {
            Err(GraphError::AssemblyFrozen {
                scope: self.components[self.root.0].global_scope.clone(),
            })
        }
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Create a component in the arena without attaching it to a parent.
    /// Declared external sockets are created and the behavior's
    /// `assemble` callback runs immediately.
    pub fn add_detached(&mut self, def: ComponentDef) -> Result<ComponentId, GraphError> {
        self.ensure_mutable()?;
        validate_scope(&def.scope)?;

        let id = ComponentId(self.components.len());
        self.components
            .push(Component::new(def.scope, def.name, def.behavior));
        for name in def.inputs {
            self.add_socket(id, &name, SocketKind::In)?;
        }
        for name in def.outputs {
            self.add_socket(id, &name, SocketKind::Out)?;
        }

        // Run the author's internal-wiring callback with the behavior
        // temporarily taken out of the arena.
        let mut behavior =
            std::mem::replace(&mut self.components[id.0].behavior, Box::new(NoBehavior));
        let result = behavior.assemble(&mut AssemblyCtx {
            graph: self,
            component: id,
        });
        self.components[id.0].behavior = behavior;
        result?;

        Ok(id)
    }

    /// Create a component and attach it under `parent` in one step.
    pub fn add_component(
        &mut self,
        parent: ComponentId,
        def: ComponentDef,
        wiring: Wiring,
    ) -> Result<ComponentId, GraphError> {
        let child = self.add_detached(def)?;
        self.attach(parent, child, wiring)?;
        Ok(child)
    }

    /// Attach an existing (detached) component under `parent`, recompute
    /// global scopes for the whole subtree, and apply the wiring policy.
    pub fn attach(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        wiring: Wiring,
    ) -> Result<(), GraphError> {
        self.ensure_mutable()?;

        let child_name = self.components[child.0].name.clone();
        if child == self.root || self.components[child.0].parent.is_some() {
            let holder = self.components[child.0]
                .parent
                .map(|p| self.components[p.0].global_scope.clone())
                .unwrap_or_else(|| self.components[self.root.0].global_scope.clone());
            return Err(GraphError::AlreadyAttached {
                scope: holder,
                name: child_name,
            });
        }
        // Attaching a component under itself or one of its descendants
        // would turn the tree into a cycle.
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(GraphError::InvalidConnection {
                    scope: self.components[child.0].global_scope.clone(),
                    reason: format!(
                        "attaching '{}' under '{}' would create a cycle in the component tree",
                        child_name, self.components[parent.0].name
                    ),
                });
            }
            cursor = self.components[id.0].parent;
        }
        if self
            .components[parent.0]
            .children
            .iter()
            .any(|c| self.components[c.0].name == child_name)
        {
            return Err(GraphError::DuplicateName {
                scope: self.components[parent.0].global_scope.clone(),
                name: child_name,
            });
        }

        self.components[child.0].parent = Some(parent);
        self.components[parent.0].children.push(child);
        self.propagate_scope(child);
        debug!(
            parent = %self.components[parent.0].global_scope,
            child = %self.components[child.0].global_scope,
            "attached component"
        );

        self.apply_wiring(parent, child, wiring)
    }

    /// Recompute `global_scope` for a subtree from its current position.
    /// Applied transitively, so re-parenting an already-populated subtree
    /// never leaves stale scopes behind.
    fn propagate_scope(&mut self, id: ComponentId) {
        let mut stack = vec![id];
        while let Some(cid) = stack.pop() {
            let parent_global = self.components[cid.0]
                .parent
                .map(|p| self.components[p.0].global_scope.clone())
                .unwrap_or_default();
            let scope = self.components[cid.0].scope.clone();
            self.components[cid.0].global_scope = join_scope(&parent_global, &scope);
            stack.extend(self.components[cid.0].children.iter().copied());
        }
    }

    fn apply_wiring(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        wiring: Wiring,
    ) -> Result<(), GraphError> {
        let socket_names = |graph: &Self, ids: &[SocketId]| -> Vec<String> {
            ids.iter().map(|s| graph.sockets[*s].name.clone()).collect()
        };
        match wiring {
            Wiring::None => Ok(()),
            Wiring::ExposeInputs => {
                for name in socket_names(self, &self.components[child.0].inputs.clone()) {
                    self.expose(parent, child, &name, &name)?;
                }
                Ok(())
            }
            Wiring::ExposeOuts => {
                for name in socket_names(self, &self.components[child.0].outputs.clone()) {
                    self.expose(parent, child, &name, &name)?;
                }
                Ok(())
            }
            Wiring::ExposeAll => {
                self.apply_wiring(parent, child, Wiring::ExposeInputs)?;
                self.apply_wiring(parent, child, Wiring::ExposeOuts)
            }
            Wiring::Expose(name) => self.expose(parent, child, &name, &name),
            Wiring::Pairs(pairs) => {
                for (child_name, target) in pairs {
                    match target {
                        WireTarget::Named(parent_name) => {
                            self.expose(parent, child, &child_name, &parent_name)?;
                        }
                        WireTarget::Constant(value) => {
                            self.connect(
                                ConnectSpec::Constant(value),
                                ConnectSpec::named(child, child_name),
                            )?;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Wire one external child socket through a matching parent socket,
    /// creating the parent socket when it does not exist yet.
    fn expose(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        child_name: &str,
        parent_name: &str,
    ) -> Result<(), GraphError> {
        let child_sock = self.external_socket_id(child, child_name)?;
        let kind = self.sockets[child_sock].kind;

        let parent_sock = match self.socket_lookup(parent, parent_name) {
            Some(existing) => {
                if self.sockets[existing].kind != kind {
                    return Err(GraphError::InvalidConnection {
                        scope: self.components[parent.0].global_scope.clone(),
                        reason: format!(
                            "cannot expose '{child_name}' through existing socket \
                             '{parent_name}' of the opposite direction"
                        ),
                    });
                }
                existing
            }
            None => self.add_socket(parent, parent_name, kind)?,
        };

        match kind {
            SocketKind::In => self.connect_sockets(parent_sock, child_sock),
            SocketKind::Out => self.connect_sockets(child_sock, parent_sock),
        }
    }

    // ------------------------------------------------------------------
    // Sockets
    // ------------------------------------------------------------------

    /// Create an external socket with an explicit direction.
    pub fn add_socket(
        &mut self,
        component: ComponentId,
        name: &str,
        kind: SocketKind,
    ) -> Result<SocketId, GraphError> {
        self.add_socket_with_role(component, name, kind, SocketRole::External)
    }

    /// Create an external socket, inferring the direction from the
    /// `input`/`output` substrings of the name. Prefer
    /// [`ComponentGraph::add_socket`]; this exists for socket sets whose
    /// names already follow the substring convention.
    pub fn add_socket_inferred(
        &mut self,
        component: ComponentId,
        name: &str,
    ) -> Result<SocketId, GraphError> {
        let kind = infer_kind(name).ok_or_else(|| GraphError::AmbiguousDirection {
            scope: self.components[component.0].global_scope.clone(),
            name: name.to_string(),
        })?;
        self.add_socket(component, name, kind)
    }

    /// Create an in-socket fed by a constant value.
    pub fn add_constant_socket(
        &mut self,
        component: ComponentId,
        name: &str,
        value: Constant,
    ) -> Result<SocketId, GraphError> {
        let id = self.add_socket(component, name, SocketKind::In)?;
        self.sockets[id].feeds.push(Feed::Constant(value));
        Ok(id)
    }

    fn add_socket_with_role(
        &mut self,
        component: ComponentId,
        name: &str,
        kind: SocketKind,
        role: SocketRole,
    ) -> Result<SocketId, GraphError> {
        self.ensure_mutable()?;
        if self.socket_lookup(component, name).is_some() {
            return Err(GraphError::DuplicateSocket {
                scope: self.components[component.0].global_scope.clone(),
                name: name.to_string(),
            });
        }
        let id = self
            .sockets
            .add_node(Socket::new(name.to_string(), component, kind, role));
        let comp = &mut self.components[component.0];
        match role {
            SocketRole::Internal => comp.internal.push(id),
            SocketRole::External => match kind {
                SocketKind::In => comp.inputs.push(id),
                SocketKind::Out => comp.outputs.push(id),
            },
        }
        Ok(id)
    }

    fn socket_lookup(&self, component: ComponentId, name: &str) -> Option<SocketId> {
        let comp = &self.components[component.0];
        comp.inputs
            .iter()
            .chain(comp.outputs.iter())
            .chain(comp.internal.iter())
            .copied()
            .find(|s| self.sockets[*s].name == name)
    }

    fn external_socket_id(
        &self,
        component: ComponentId,
        name: &str,
    ) -> Result<SocketId, GraphError> {
        let comp = &self.components[component.0];
        comp.inputs
            .iter()
            .chain(comp.outputs.iter())
            .copied()
            .find(|s| self.sockets[*s].name == name)
            .ok_or_else(|| GraphError::UnknownSocket {
                scope: comp.global_scope.clone(),
                name: name.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Operation bindings
    // ------------------------------------------------------------------

    /// Register an operation binding on a component. Socket names resolve
    /// against the component's declared sockets; unknown names auto-create
    /// internal sockets. A binding with no input sockets is registered as
    /// a graph entry point.
    pub fn add_operation(
        &mut self,
        component: ComponentId,
        transform: Transform,
        inputs: &[&str],
        outputs: &[&str],
        flags: OpFlags,
    ) -> Result<FnId, GraphError> {
        self.ensure_mutable()?;
        if inputs.len() != transform.in_arity() {
            return Err(GraphError::ArityMismatch {
                transform: transform.name().to_string(),
                side: "input",
                expected: transform.in_arity(),
                got: inputs.len(),
            });
        }
        if outputs.len() != transform.out_arity() {
            return Err(GraphError::ArityMismatch {
                transform: transform.name().to_string(),
                side: "output",
                expected: transform.out_arity(),
                got: outputs.len(),
            });
        }

        let input_ids = inputs
            .iter()
            .map(|name| self.socket_or_internal(component, name, SocketKind::In))
            .collect::<Result<Vec<_>, _>>()?;
        let output_ids = outputs
            .iter()
            .map(|name| self.socket_or_internal(component, name, SocketKind::Out))
            .collect::<Result<Vec<_>, _>>()?;

        let id = FnId(self.functions.len());
        for sock in &input_ids {
            self.sockets[*sock].sinks.push(id);
        }
        for sock in &output_ids {
            self.sockets[*sock].feeds.push(Feed::Function(id));
        }
        self.functions.push(GraphFunction {
            transform,
            component,
            inputs: input_ids,
            outputs: output_ids,
            flags,
            op: None,
        });
        self.components[component.0].functions.push(id);
        if inputs.is_empty() {
            self.entry_points.push(id);
        }
        Ok(id)
    }

    fn socket_or_internal(
        &mut self,
        component: ComponentId,
        name: &str,
        kind: SocketKind,
    ) -> Result<SocketId, GraphError> {
        match self.socket_lookup(component, name) {
            Some(id) => Ok(id),
            None => self.add_socket_with_role(component, name, kind, SocketRole::Internal),
        }
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Make a connection between two connect-specs. Spaces and constants
    /// may only appear on the from-side and only feed in-sockets;
    /// component shorthands resolve to the only socket on the relevant
    /// side; two sockets of the same component never connect directly.
    pub fn connect(&mut self, from: ConnectSpec, to: ConnectSpec) -> Result<(), GraphError> {
        self.ensure_mutable()?;
        match (from, to) {
            (ConnectSpec::Space(space), to) => {
                let sock = self.in_socket_for_feed(&to, "a space")?;
                self.sockets[sock].feeds.push(Feed::Space(space));
                Ok(())
            }
            (ConnectSpec::Constant(value), to) => {
                let sock = self.in_socket_for_feed(&to, "a constant")?;
                self.sockets[sock].feeds.push(Feed::Constant(value));
                Ok(())
            }
            (_, ConnectSpec::Space(_)) | (_, ConnectSpec::Constant(_)) => {
                Err(GraphError::InvalidConnection {
                    scope: self.components[self.root.0].global_scope.clone(),
                    reason: "spaces and constants can only appear on the from-side of a \
                             connection"
                        .to_string(),
                })
            }
            (ConnectSpec::Component(a), ConnectSpec::Component(b)) => {
                let outs = self.components[a.0].outputs.clone();
                let ins = self.components[b.0].inputs.clone();
                if outs.len() != ins.len() {
                    return Err(GraphError::InvalidConnection {
                        scope: self.components[a.0].global_scope.clone(),
                        reason: format!(
                            "component shorthand needs matching socket counts, '{}' has {} \
                             out-sockets while '{}' has {} in-sockets",
                            self.components[a.0].name,
                            outs.len(),
                            self.components[b.0].name,
                            ins.len()
                        ),
                    });
                }
                for (out_sock, in_sock) in outs.into_iter().zip(ins) {
                    self.connect_sockets(out_sock, in_sock)?;
                }
                Ok(())
            }
            (from, to) => {
                let from_sock = self.resolve_socket_spec(&from, SocketKind::Out)?;
                let to_sock = self.resolve_socket_spec(&to, SocketKind::In)?;
                self.connect_sockets(from_sock, to_sock)
            }
        }
    }

    /// Remove a connection previously made with [`ComponentGraph::connect`].
    pub fn disconnect(&mut self, from: ConnectSpec, to: ConnectSpec) -> Result<(), GraphError> {
        self.ensure_mutable()?;
        match (from, to) {
            (ConnectSpec::Space(space), to) => {
                let sock = self.in_socket_for_feed(&to, "a space")?;
                self.sockets[sock]
                    .feeds
                    .retain(|f| !matches!(f, Feed::Space(s) if *s == space));
                Ok(())
            }
            (ConnectSpec::Constant(value), to) => {
                let sock = self.in_socket_for_feed(&to, "a constant")?;
                self.sockets[sock]
                    .feeds
                    .retain(|f| !matches!(f, Feed::Constant(c) if *c == value));
                Ok(())
            }
            (_, ConnectSpec::Space(_)) | (_, ConnectSpec::Constant(_)) => {
                Err(GraphError::InvalidConnection {
                    scope: self.components[self.root.0].global_scope.clone(),
                    reason: "spaces and constants can only appear on the from-side of a \
                             connection"
                        .to_string(),
                })
            }
            (ConnectSpec::Component(a), ConnectSpec::Component(b)) => {
                let outs = self.components[a.0].outputs.clone();
                let ins = self.components[b.0].inputs.clone();
                for (out_sock, in_sock) in outs.into_iter().zip(ins) {
                    while let Some(edge) = self.sockets.find_edge(out_sock, in_sock) {
                        self.sockets.remove_edge(edge);
                    }
                }
                Ok(())
            }
            (from, to) => {
                let from_sock = self.resolve_socket_spec(&from, SocketKind::Out)?;
                let to_sock = self.resolve_socket_spec(&to, SocketKind::In)?;
                while let Some(edge) = self.sockets.find_edge(from_sock, to_sock) {
                    self.sockets.remove_edge(edge);
                }
                Ok(())
            }
        }
    }

    fn connect_sockets(&mut self, from: SocketId, to: SocketId) -> Result<(), GraphError> {
        let from_comp = self.sockets[from].component;
        let to_comp = self.sockets[to].component;
        if from_comp == to_comp {
            return Err(GraphError::InvalidConnection {
                scope: self.components[from_comp.0].global_scope.clone(),
                reason: format!(
                    "sockets '{}' and '{}' belong to the same component; sockets only cross \
                     component boundaries or attach to operation bindings",
                    self.sockets[from].name, self.sockets[to].name
                ),
            });
        }
        let from_kind = self.sockets[from].kind;
        let to_kind = self.sockets[to].kind;
        if from_kind == to_kind {
            // Same-direction edges are exposure edges and only legal
            // across a direct parent/child boundary.
            let related = self.components[from_comp.0].parent == Some(to_comp)
                || self.components[to_comp.0].parent == Some(from_comp);
            if !related {
                return Err(GraphError::InvalidConnection {
                    scope: self.components[from_comp.0].global_scope.clone(),
                    reason: format!(
                        "sockets '{}' and '{}' have the same direction; such edges only \
                         expose a socket across a direct parent/child boundary",
                        self.sockets[from].name, self.sockets[to].name
                    ),
                });
            }
        } else if !(from_kind == SocketKind::Out && to_kind == SocketKind::In) {
            return Err(GraphError::InvalidConnection {
                scope: self.components[from_comp.0].global_scope.clone(),
                reason: format!(
                    "cannot connect in-socket '{}' into out-socket '{}'; data flows \
                     out-socket to in-socket",
                    self.sockets[from].name, self.sockets[to].name
                ),
            });
        }
        self.sockets.add_edge(from, to, Wire);
        Ok(())
    }

    fn in_socket_for_feed(
        &mut self,
        spec: &ConnectSpec,
        what: &str,
    ) -> Result<SocketId, GraphError> {
        let sock = self.resolve_socket_spec(spec, SocketKind::In)?;
        if self.sockets[sock].kind != SocketKind::In {
            return Err(GraphError::InvalidConnection {
                scope: self.components[self.sockets[sock].component.0]
                    .global_scope
                    .clone(),
                reason: format!(
                    "cannot attach {what} to out-socket '{}'",
                    self.sockets[sock].name
                ),
            });
        }
        Ok(sock)
    }

    /// Resolve one side of a connection to a concrete socket. `side` only
    /// matters for the component shorthand, which picks the component's
    /// only socket on that side.
    fn resolve_socket_spec(
        &self,
        spec: &ConnectSpec,
        side: SocketKind,
    ) -> Result<SocketId, GraphError> {
        match spec {
            ConnectSpec::Socket(id) => Ok(*id),
            ConnectSpec::Named(component, name) => self.socket_id(*component, name),
            ConnectSpec::Component(component) => {
                let comp = &self.components[component.0];
                let list = match side {
                    SocketKind::In => &comp.inputs,
                    SocketKind::Out => &comp.outputs,
                };
                if list.len() == 1 {
                    Ok(list[0])
                } else {
                    Err(GraphError::InvalidConnection {
                        scope: comp.global_scope.clone(),
                        reason: format!(
                            "component shorthand needs exactly one {}-socket, '{}' has {}",
                            match side {
                                SocketKind::In => "in",
                                SocketKind::Out => "out",
                            },
                            comp.name,
                            list.len()
                        ),
                    })
                }
            }
            ConnectSpec::Space(_) | ConnectSpec::Constant(_) => {
                Err(GraphError::InvalidConnection {
                    scope: self.components[self.root.0].global_scope.clone(),
                    reason: "space/constant specs resolve to feeds, not sockets".to_string(),
                })
            }
        }
    }
}

/// Mutation handle passed to [`ComponentBehavior::assemble`]; all calls
/// act on the component being assembled.
///
/// [`ComponentBehavior::assemble`]: crate::component::ComponentBehavior::assemble
pub struct AssemblyCtx<'a> {
    pub(crate) graph: &'a mut ComponentGraph,
    pub(crate) component: ComponentId,
}

impl AssemblyCtx<'_> {
    pub fn id(&self) -> ComponentId {
        self.component
    }

    /// Connect-spec for one of this component's sockets.
    pub fn socket(&self, name: impl Into<String>) -> ConnectSpec {
        ConnectSpec::Named(self.component, name.into())
    }

    pub fn add_socket(&mut self, name: &str, kind: SocketKind) -> Result<SocketId, GraphError> {
        self.graph.add_socket(self.component, name, kind)
    }

    pub fn add_constant_socket(
        &mut self,
        name: &str,
        value: Constant,
    ) -> Result<SocketId, GraphError> {
        self.graph.add_constant_socket(self.component, name, value)
    }

    pub fn add_operation(
        &mut self,
        transform: Transform,
        inputs: &[&str],
        outputs: &[&str],
        flags: OpFlags,
    ) -> Result<FnId, GraphError> {
        self.graph
            .add_operation(self.component, transform, inputs, outputs, flags)
    }

    pub fn add_component(
        &mut self,
        def: ComponentDef,
        wiring: Wiring,
    ) -> Result<ComponentId, GraphError> {
        self.graph.add_component(self.component, def, wiring)
    }

    pub fn connect(&mut self, from: ConnectSpec, to: ConnectSpec) -> Result<(), GraphError> {
        self.graph.connect(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwire_core::SpaceDesc;

    fn passthrough_child(scope: &str) -> ComponentDef {
        ComponentDef::new(scope).with_input("x").with_output("y")
    }

    #[test]
    fn test_duplicate_sibling_name_rejected() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        graph
            .add_component(root, ComponentDef::named("dense", "layer"), Wiring::None)
            .unwrap();
        let err = graph
            .add_component(root, ComponentDef::named("conv", "layer"), Wiring::None)
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateName {
                scope: "core".to_string(),
                name: "layer".to_string(),
            }
        );
    }

    #[test]
    fn test_double_attach_rejected() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let a = graph
            .add_component(root, ComponentDef::new("a"), Wiring::None)
            .unwrap();
        let b = graph
            .add_component(root, ComponentDef::new("b"), Wiring::None)
            .unwrap();
        let err = graph.attach(b, a, Wiring::None).unwrap_err();
        assert!(matches!(err, GraphError::AlreadyAttached { .. }));
    }

    #[test]
    fn test_attach_under_own_descendant_rejected() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let a = graph.add_detached(ComponentDef::new("a")).unwrap();
        let b = graph.add_detached(ComponentDef::new("b")).unwrap();
        graph.attach(a, b, Wiring::None).unwrap();

        // `a` is now `b`'s ancestor; attaching it under `b` must fail
        // instead of looping through the cyclic parent chain.
        let err = graph.attach(b, a, Wiring::None).unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));

        let err = graph.attach(a, a, Wiring::None).unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));
    }

    #[test]
    fn test_sibling_same_direction_connections_rejected() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let a = graph
            .add_component(root, passthrough_child("a"), Wiring::None)
            .unwrap();
        let b = graph
            .add_component(root, passthrough_child("b"), Wiring::None)
            .unwrap();

        // out -> out between siblings.
        let err = graph
            .connect(ConnectSpec::named(a, "y"), ConnectSpec::named(b, "y"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));

        // in -> in between siblings.
        let err = graph
            .connect(ConnectSpec::named(a, "x"), ConnectSpec::named(b, "x"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));

        // in -> out is backwards regardless of the components involved.
        let err = graph
            .connect(ConnectSpec::named(a, "x"), ConnectSpec::named(b, "y"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));

        // The legal sibling edge still connects.
        graph
            .connect(ConnectSpec::named(a, "y"), ConnectSpec::named(b, "x"))
            .unwrap();
    }

    #[test]
    fn test_scope_propagates_through_reparented_subtree() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        // Assemble a detached subtree first: mid -> leaf.
        let mid = graph.add_detached(ComponentDef::new("mid")).unwrap();
        let leaf = graph.add_detached(ComponentDef::new("leaf")).unwrap();
        graph.attach(mid, leaf, Wiring::None).unwrap();
        assert_eq!(graph.component(leaf).global_scope(), "mid/leaf");

        // Attaching the populated subtree fixes the grandchild's scope too.
        graph.attach(graph.root(), mid, Wiring::None).unwrap();
        assert_eq!(graph.component(mid).global_scope(), "core/mid");
        assert_eq!(graph.component(leaf).global_scope(), "core/mid/leaf");
    }

    #[test]
    fn test_sub_component_lookup_by_name() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let child = graph
            .add_component(root, ComponentDef::named("dense", "layer"), Wiring::None)
            .unwrap();
        assert_eq!(graph.sub_component(root, "layer").unwrap(), child);
        assert!(matches!(
            graph.sub_component(root, "missing").unwrap_err(),
            GraphError::UnknownComponent { .. }
        ));
    }

    #[test]
    fn test_same_component_connection_rejected() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let child = graph
            .add_component(root, passthrough_child("child"), Wiring::None)
            .unwrap();
        let err = graph
            .connect(
                ConnectSpec::named(child, "x"),
                ConnectSpec::named(child, "y"),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));
    }

    #[test]
    fn test_space_cannot_feed_out_socket() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let child = graph
            .add_component(root, passthrough_child("child"), Wiring::None)
            .unwrap();
        let err = graph
            .connect(
                ConnectSpec::Space(SpaceDesc::float(vec![4])),
                ConnectSpec::named(child, "y"),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidConnection { .. }));
    }

    #[test]
    fn test_expose_all_creates_matching_parent_sockets() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        graph
            .add_component(root, passthrough_child("child"), Wiring::ExposeAll)
            .unwrap();
        assert!(graph.socket_id(root, "x").is_ok());
        assert!(graph.socket_id(root, "y").is_ok());
        assert_eq!(graph.socket(graph.socket_id(root, "x").unwrap()).kind(), SocketKind::In);
        assert_eq!(graph.socket(graph.socket_id(root, "y").unwrap()).kind(), SocketKind::Out);
    }

    #[test]
    fn test_duplicate_socket_rejected() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        graph.add_socket(root, "state", SocketKind::In).unwrap();
        let err = graph.add_socket(root, "state", SocketKind::Out).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateSocket { .. }));
    }

    #[test]
    fn test_inferred_direction_requires_unambiguous_name() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let id = graph.add_socket_inferred(root, "raw_input").unwrap();
        assert_eq!(graph.socket(id).kind(), SocketKind::In);
        let err = graph.add_socket_inferred(root, "records").unwrap_err();
        assert!(matches!(err, GraphError::AmbiguousDirection { .. }));
    }

    #[test]
    fn test_operation_arity_checked_at_registration() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let err = graph
            .add_operation(
                root,
                Transform::identity("id"),
                &["a", "b"],
                &["out"],
                OpFlags::default(),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::ArityMismatch { .. }));
    }

    #[test]
    fn test_operation_auto_creates_internal_sockets() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        let binding = graph
            .add_operation(
                root,
                Transform::identity("id"),
                &["hidden_in"],
                &["hidden_out"],
                OpFlags::default(),
            )
            .unwrap();
        let sock = graph.socket_id(root, "hidden_in").unwrap();
        assert_eq!(graph.socket(sock).role(), SocketRole::Internal);
        assert_eq!(graph.socket(sock).feeding_binding(), None);

        let out = graph.socket_id(root, "hidden_out").unwrap();
        assert_eq!(graph.socket(out).feeding_binding(), Some(binding));
    }
}
