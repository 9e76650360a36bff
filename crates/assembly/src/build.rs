//! # The Build Pass — Fixed-Point Space Propagation
//!
//! Building walks the wiring graph forward from everything that is known
//! up front (caller-supplied root spaces, space/constant feeds, zero-input
//! entry bindings) and resolves sockets until nothing changes. A socket's
//! space is monotonic: once set it never changes, and a disagreeing
//! inbound resolution aborts the pass with a [`GraphError::SpaceConflict`].
//!
//! When every external in-socket of a component is resolved, the
//! component's completeness hook fires exactly once; when every input
//! socket of an operation binding is resolved, one [`BuildRequest`] goes
//! to the backend and the returned handle is stored verbatim. The result
//! of a pass does not depend on the worklist order, which is why the
//! order is a caller-visible knob: running the same assembly under both
//! orders and comparing is the cheapest order-independence test there is.

use std::collections::{BTreeMap, VecDeque};
use std::mem;

use graphwire_core::{
    BackendContext, BuildRequest, GraphError, OpHandle, SpaceDesc, VarHandle, VariableRequest,
};
use petgraph::Direction;
use tracing::{debug, trace};

use crate::component::{join_scope, ComponentId, NoBehavior, SpaceMap};
use crate::function::FnId;
use crate::graph::ComponentGraph;
use crate::socket::{Feed, SocketId, SocketKind, SocketRole};

/// Lifecycle state of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Assembly phase; structural mutation allowed.
    Unresolved,
    /// A build pass is running.
    Propagating,
    /// Build reached a fixed point with every socket resolved.
    Done,
    /// Build reached a fixed point with unresolved sockets left over.
    Stuck,
}

/// Worklist discipline of the build pass. Results are identical either
/// way; exposing the knob makes that property checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationOrder {
    #[default]
    Fifo,
    Lifo,
}

/// Summary of a successful build pass.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Backend handles in emission order, one per built binding.
    pub operations: Vec<OpHandle>,
    /// Total number of resolved sockets.
    pub resolved_sockets: usize,
    /// Global scopes of components whose completeness hook fired, in
    /// firing order.
    pub completed_components: Vec<String>,
}

/// Variable-declaration handle passed to
/// [`ComponentBehavior::on_inputs_resolved`]. Every declaration goes
/// through the backend and lands in the component's own registry; the
/// engine merges registries upward after the hook returns.
///
/// [`ComponentBehavior::on_inputs_resolved`]: crate::component::ComponentBehavior::on_inputs_resolved
pub struct VariableCtx<'a> {
    pub(crate) graph: &'a mut ComponentGraph,
    pub(crate) component: ComponentId,
    pub(crate) backend: &'a mut dyn BackendContext,
}

impl VariableCtx<'_> {
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Global scope of the declaring component.
    pub fn scope(&self) -> &str {
        self.graph.component(self.component).global_scope()
    }

    /// Declare one variable. The name is scoped to
    /// `global_scope + "/" + name`; a key already present anywhere in the
    /// ancestor chain is rejected before the backend is asked to
    /// materialize anything.
    pub fn declare(
        &mut self,
        name: &str,
        space: SpaceDesc,
        trainable: bool,
    ) -> Result<VarHandle, GraphError> {
        let key = join_scope(self.scope(), name);
        let mut cursor = Some(self.component);
        while let Some(id) = cursor {
            let comp = self.graph.component(id);
            if comp.variables().contains(&key) {
                return Err(GraphError::DuplicateVariable {
                    scope: comp.global_scope().to_string(),
                    key,
                });
            }
            cursor = comp.parent();
        }
        let handle = self.backend.create_variable(VariableRequest {
            name: key.clone(),
            space,
            trainable,
        });
        trace!(key = %key, "declared variable");
        self.graph.components[self.component.0]
            .variables
            .insert(key, handle);
        Ok(handle)
    }

    /// Declare one variable per primitive leaf of a container space,
    /// suffixing the name with each auto-key (a plain value space keeps
    /// the plain name). Returns the handles keyed by auto-key.
    pub fn declare_flat(
        &mut self,
        name: &str,
        space: &SpaceDesc,
        trainable: bool,
    ) -> Result<BTreeMap<String, VarHandle>, GraphError> {
        let mut handles = BTreeMap::new();
        for (auto_key, leaf) in space.flatten() {
            let scoped = format!("{name}{auto_key}");
            let handle = self.declare(&scoped, SpaceDesc::Value(leaf), trainable)?;
            handles.insert(auto_key, handle);
        }
        Ok(handles)
    }

    /// Look up a previously declared variable of this component.
    pub fn get(&self, name: &str) -> Option<VarHandle> {
        let key = join_scope(self.scope(), name);
        self.graph.component(self.component).variables().get(&key)
    }
}

impl ComponentGraph {
    /// Run the build pass: seed, propagate to a fixed point, report. The
    /// assembly freezes regardless of the outcome; a stuck or failed
    /// build leaves the tree diagnosable but unusable.
    pub fn build(
        &mut self,
        input_spaces: &SpaceMap,
        backend: &mut dyn BackendContext,
        order: PropagationOrder,
    ) -> Result<BuildReport, GraphError> {
        self.ensure_mutable()?;
        self.state = BuildState::Propagating;
        debug!(?order, root = %self.component(self.root()).global_scope(), "build pass started");
        let result = self.run_build(input_spaces, backend, order);
        self.state = match &result {
            Ok(_) => BuildState::Done,
            Err(_) => BuildState::Stuck,
        };
        result
    }

    fn run_build(
        &mut self,
        input_spaces: &SpaceMap,
        backend: &mut dyn BackendContext,
        order: PropagationOrder,
    ) -> Result<BuildReport, GraphError> {
        let mut worklist = VecDeque::new();
        let mut operations = Vec::new();
        let mut completed = Vec::new();

        // Components with no external in-sockets are vacuously complete;
        // their hooks fire before any operation is built, so declaration
        // collisions surface before the backend sees a single request.
        for idx in 0..self.components.len() {
            self.check_completeness(ComponentId(idx), backend, &mut completed)?;
        }

        // Caller-supplied spaces land on the root's external in-sockets.
        let root = self.root();
        for (name, space) in input_spaces {
            let sock = self.socket_id(root, name)?;
            if self.sockets[sock].kind != SocketKind::In {
                return Err(GraphError::InvalidConnection {
                    scope: self.component(root).global_scope().to_string(),
                    reason: format!("cannot seed out-socket '{name}' with an input space"),
                });
            }
            self.resolve_socket(sock, space.clone(), backend, &mut worklist, &mut completed)?;
        }

        // Space and constant feeds attached during assembly.
        for sock in self.sockets.node_indices().collect::<Vec<_>>() {
            for feed in self.sockets[sock].feeds.clone() {
                match feed {
                    Feed::Space(space) => {
                        self.resolve_socket(sock, space, backend, &mut worklist, &mut completed)?;
                    }
                    Feed::Constant(value) => {
                        self.resolve_socket(
                            sock,
                            value.space.clone(),
                            backend,
                            &mut worklist,
                            &mut completed,
                        )?;
                    }
                    Feed::Function(_) => {}
                }
            }
        }

        // Zero-input bindings cannot be reached by propagation.
        for entry in self.entry_points.clone() {
            self.try_build_function(entry, backend, &mut worklist, &mut operations, &mut completed)?;
        }

        // Propagate until the fixed point.
        loop {
            let sock = match order {
                PropagationOrder::Fifo => worklist.pop_front(),
                PropagationOrder::Lifo => worklist.pop_back(),
            };
            let Some(sock) = sock else { break };
            let Some(space) = self.sockets[sock].space.clone() else {
                continue;
            };
            let targets: Vec<SocketId> = self
                .sockets
                .neighbors_directed(sock, Direction::Outgoing)
                .collect();
            for target in targets {
                self.resolve_socket(target, space.clone(), backend, &mut worklist, &mut completed)?;
            }
            for sink in self.sockets[sock].sinks.clone() {
                self.try_build_function(sink, backend, &mut worklist, &mut operations, &mut completed)?;
            }
        }

        let mut stuck: Vec<String> = self
            .sockets
            .node_indices()
            .filter(|s| self.sockets[*s].space.is_none())
            .map(|s| self.scoped_socket_name(s))
            .collect();
        if !stuck.is_empty() {
            stuck.sort();
            return Err(GraphError::UnresolvedGraph { stuck });
        }

        let resolved_sockets = self.sockets.node_count();
        debug!(
            operations = operations.len(),
            resolved_sockets, "build pass reached fixed point"
        );
        Ok(BuildReport {
            operations,
            resolved_sockets,
            completed_components: completed,
        })
    }

    /// Assign a space to a socket. Re-resolving with a compatible space
    /// is a no-op; a disagreeing space is a hard error.
    fn resolve_socket(
        &mut self,
        id: SocketId,
        space: SpaceDesc,
        backend: &mut dyn BackendContext,
        worklist: &mut VecDeque<SocketId>,
        completed: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        if let Some(existing) = &self.sockets[id].space {
            if existing.is_compatible(&space) {
                return Ok(());
            }
            let component = self.sockets[id].component;
            return Err(GraphError::SpaceConflict {
                scope: self.component(component).global_scope().to_string(),
                socket: self.sockets[id].name.clone(),
                existing: existing.clone(),
                incoming: space,
            });
        }
        trace!(socket = %self.scoped_socket_name(id), space = %space, "resolved socket");
        self.sockets[id].space = Some(space);
        worklist.push_back(id);

        let component = self.sockets[id].component;
        if self.sockets[id].kind == SocketKind::In && self.sockets[id].role == SocketRole::External
        {
            self.check_completeness(component, backend, completed)?;
        }
        Ok(())
    }

    /// Fire the completeness hook if every external in-socket of the
    /// component is resolved. Monotonic and one-shot per component.
    fn check_completeness(
        &mut self,
        id: ComponentId,
        backend: &mut dyn BackendContext,
        completed: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        if self.components[id.0].input_complete {
            return Ok(());
        }
        let mut spaces = SpaceMap::new();
        for sock in &self.components[id.0].inputs {
            match &self.sockets[*sock].space {
                Some(space) => {
                    spaces.insert(self.sockets[*sock].name.clone(), space.clone());
                }
                None => return Ok(()),
            }
        }
        self.components[id.0].input_complete = true;
        debug!(scope = %self.components[id.0].global_scope, "component inputs complete");

        // Take the behavior out of the arena so the hook can borrow the
        // graph mutably through the variable context.
        let mut behavior =
            mem::replace(&mut self.components[id.0].behavior, Box::new(NoBehavior));
        let result = behavior.check_input_spaces(&spaces).and_then(|()| {
            let mut vars = VariableCtx {
                graph: self,
                component: id,
                backend,
            };
            behavior.on_inputs_resolved(&mut vars, &spaces)
        });
        self.components[id.0].behavior = behavior;
        result?;

        self.merge_variables_up(id)?;
        completed.push(self.components[id.0].global_scope.clone());
        Ok(())
    }

    /// Merge the component's registry into every ancestor's registry.
    fn merge_variables_up(&mut self, id: ComponentId) -> Result<(), GraphError> {
        let variables = self.components[id.0].variables.clone();
        if variables.is_empty() {
            return Ok(());
        }
        let mut cursor = self.components[id.0].parent;
        while let Some(ancestor) = cursor {
            if let Err(key) = variables.merge_into(&mut self.components[ancestor.0].variables) {
                return Err(GraphError::DuplicateVariable {
                    scope: self.components[ancestor.0].global_scope.clone(),
                    key,
                });
            }
            cursor = self.components[ancestor.0].parent;
        }
        Ok(())
    }

    /// Emit the build request for a binding whose input sockets are all
    /// resolved, then resolve its output sockets from the transform's
    /// space map.
    fn try_build_function(
        &mut self,
        id: FnId,
        backend: &mut dyn BackendContext,
        worklist: &mut VecDeque<SocketId>,
        operations: &mut Vec<OpHandle>,
        completed: &mut Vec<String>,
    ) -> Result<(), GraphError> {
        if self.functions[id.0].op.is_some() {
            return Ok(());
        }
        let mut input_spaces = Vec::new();
        for sock in &self.functions[id.0].inputs {
            match &self.sockets[*sock].space {
                Some(space) => input_spaces.push(space.clone()),
                None => return Ok(()),
            }
        }
        let output_spaces = self.functions[id.0].resolve_output_spaces(&input_spaces)?;
        let (request, outputs) = {
            let function = &self.functions[id.0];
            let request = BuildRequest {
                transform: function.transform_name().to_string(),
                scope: self.components[function.component.0].global_scope.clone(),
                input_spaces,
                output_spaces: output_spaces.clone(),
                flags: function.flags,
            };
            (request, function.outputs.clone())
        };
        debug!(transform = %request.transform, scope = %request.scope, "building operation");
        let handle = backend.build_operation(request);
        self.functions[id.0].op = Some(handle);
        operations.push(handle);

        for (sock, space) in outputs.into_iter().zip(output_spaces) {
            self.resolve_socket(sock, space, backend, worklist, completed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentDef;
    use crate::function::Transform;
    use crate::graph::Wiring;
    use crate::socket::ConnectSpec;
    use graphwire_core::OpFlags;

    /// Minimal counting backend for inline resolver tests; the full
    /// recording backend lives in its own crate.
    #[derive(Default)]
    struct CountingBackend {
        ops: u64,
        vars: u64,
    }

    impl BackendContext for CountingBackend {
        fn build_operation(&mut self, _request: BuildRequest) -> OpHandle {
            self.ops += 1;
            OpHandle(self.ops)
        }

        fn create_variable(&mut self, _request: VariableRequest) -> VarHandle {
            self.vars += 1;
            VarHandle(self.vars)
        }
    }

    #[test]
    fn test_conflicting_feeds_abort_the_build() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core").with_input("x")).unwrap();
        let root = graph.root();
        graph
            .connect(
                ConnectSpec::Space(SpaceDesc::float(vec![4])),
                ConnectSpec::named(root, "x"),
            )
            .unwrap();
        graph
            .connect(
                ConnectSpec::Space(SpaceDesc::float(vec![8])),
                ConnectSpec::named(root, "x"),
            )
            .unwrap();
        let err = graph
            .build(
                &SpaceMap::new(),
                &mut CountingBackend::default(),
                PropagationOrder::Fifo,
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::SpaceConflict { .. }));
        assert_eq!(graph.state(), BuildState::Stuck);
    }

    #[test]
    fn test_agreeing_feeds_resolve_once() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core").with_input("x")).unwrap();
        let root = graph.root();
        for _ in 0..2 {
            graph
                .connect(
                    ConnectSpec::Space(SpaceDesc::float(vec![4])),
                    ConnectSpec::named(root, "x"),
                )
                .unwrap();
        }
        graph
            .build(
                &SpaceMap::new(),
                &mut CountingBackend::default(),
                PropagationOrder::Fifo,
            )
            .unwrap();
        assert_eq!(
            graph.socket_space(root, "x").unwrap(),
            Some(&SpaceDesc::float(vec![4]))
        );
    }

    #[test]
    fn test_unconnected_socket_reported_as_stuck() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core").with_input("x")).unwrap();
        let err = graph
            .build(
                &SpaceMap::new(),
                &mut CountingBackend::default(),
                PropagationOrder::Fifo,
            )
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedGraph {
                stuck: vec!["core/x".to_string()],
            }
        );
    }

    #[test]
    fn test_entry_point_binding_builds_without_inputs() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        graph
            .add_operation(
                root,
                Transform::source("noise", SpaceDesc::float(vec![2])),
                &[],
                &["sample"],
                OpFlags::passthrough(),
            )
            .unwrap();
        let report = graph
            .build(
                &SpaceMap::new(),
                &mut CountingBackend::default(),
                PropagationOrder::Fifo,
            )
            .unwrap();
        assert_eq!(report.operations.len(), 1);
        assert_eq!(
            graph.socket_space(root, "sample").unwrap(),
            Some(&SpaceDesc::float(vec![2]))
        );
        assert_eq!(graph.state(), BuildState::Done);
    }

    #[test]
    fn test_build_freezes_the_assembly() {
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        graph
            .build(
                &SpaceMap::new(),
                &mut CountingBackend::default(),
                PropagationOrder::Fifo,
            )
            .unwrap();
        let err = graph
            .add_component(root, ComponentDef::new("late"), Wiring::None)
            .unwrap_err();
        assert!(matches!(err, GraphError::AssemblyFrozen { .. }));
    }

    #[test]
    fn test_vacuous_completeness_fires_before_any_operation() {
        struct Declaring;
        impl crate::component::ComponentBehavior for Declaring {
            fn on_inputs_resolved(
                &mut self,
                vars: &mut VariableCtx<'_>,
                _spaces: &SpaceMap,
            ) -> Result<(), GraphError> {
                vars.declare("w", SpaceDesc::float(vec![3]), true)?;
                Ok(())
            }
        }
        let mut graph = ComponentGraph::new(ComponentDef::new("core")).unwrap();
        let root = graph.root();
        // Two instances with the same scope collide on the scoped key.
        graph
            .add_component(
                root,
                ComponentDef::named("dense", "a").with_behavior(Declaring),
                Wiring::None,
            )
            .unwrap();
        graph
            .add_component(
                root,
                ComponentDef::named("dense", "b").with_behavior(Declaring),
                Wiring::None,
            )
            .unwrap();
        let mut backend = CountingBackend::default();
        let err = graph
            .build(&SpaceMap::new(), &mut backend, PropagationOrder::Fifo)
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateVariable { .. }));
        assert_eq!(backend.ops, 0);
    }
}
