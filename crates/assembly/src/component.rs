//! # Components — Scoped, Composable Wiring Units
//!
//! A component is a named, scoped node that owns sub-components, sockets,
//! and operation bindings. Components live in the [`ComponentGraph`]
//! arena and are addressed by [`ComponentId`]; each one is attached to at
//! most one parent, enforced at attach time.
//!
//! Component authors supply plain data ([`ComponentDef`]) plus a
//! [`ComponentBehavior`] callback object. The engine handles scope
//! propagation and registry bookkeeping; the author never does.
//!
//! [`ComponentGraph`]: crate::graph::ComponentGraph

use std::collections::BTreeMap;

use graphwire_core::{GraphError, SpaceDesc};

use crate::build::VariableCtx;
use crate::graph::AssemblyCtx;
use crate::registry::VariableRegistry;
use crate::socket::SocketId;
use crate::function::FnId;

/// Index of a component in the assembly arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) usize);

/// Resolved spaces of a component's external input sockets, keyed by
/// socket name.
pub type SpaceMap = BTreeMap<String, SpaceDesc>;

/// Author callback object attached to a component.
///
/// `assemble` materializes the component's internal wiring when it is
/// created; `on_inputs_resolved` fires exactly once, the first time all
/// external input sockets are resolved, and is the only place variables
/// may be declared.
pub trait ComponentBehavior {
    /// Materialize internal sockets, operation bindings, and
    /// sub-components.
    fn assemble(&mut self, ctx: &mut AssemblyCtx<'_>) -> Result<(), GraphError> {
        let _ = ctx;
        Ok(())
    }

    /// Validate the spaces that arrived at the external input sockets.
    fn check_input_spaces(&self, spaces: &SpaceMap) -> Result<(), GraphError> {
        let _ = spaces;
        Ok(())
    }

    /// Declare variables and capture input spaces. Invoked exactly once.
    fn on_inputs_resolved(
        &mut self,
        vars: &mut VariableCtx<'_>,
        spaces: &SpaceMap,
    ) -> Result<(), GraphError> {
        let _ = (vars, spaces);
        Ok(())
    }
}

/// The do-nothing behavior; also the placeholder while a real behavior is
/// temporarily taken out of the arena to run a hook.
#[derive(Debug, Default)]
pub struct NoBehavior;

impl ComponentBehavior for NoBehavior {}

/// Plain-data description of a component to be created: its scope, name,
/// declared external sockets, and behavior.
pub struct ComponentDef {
    pub scope: String,
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub behavior: Box<dyn ComponentBehavior>,
}

impl ComponentDef {
    /// A definition whose name equals its scope.
    pub fn new(scope: impl Into<String>) -> Self {
        let scope = scope.into();
        Self {
            name: scope.clone(),
            scope,
            inputs: Vec::new(),
            outputs: Vec::new(),
            behavior: Box::new(NoBehavior),
        }
    }

    /// A definition with a sibling-unique name different from its scope.
    pub fn named(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            behavior: Box::new(NoBehavior),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    pub fn with_behavior(mut self, behavior: impl ComponentBehavior + 'static) -> Self {
        self.behavior = Box::new(behavior);
        self
    }
}

/// A node in the component tree.
pub struct Component {
    pub(crate) scope: String,
    pub(crate) name: String,
    /// Derived: ancestor scopes joined with `/` down to this node.
    pub(crate) global_scope: String,
    pub(crate) parent: Option<ComponentId>,
    /// Attach-ordered children.
    pub(crate) children: Vec<ComponentId>,
    pub(crate) inputs: Vec<SocketId>,
    pub(crate) outputs: Vec<SocketId>,
    pub(crate) internal: Vec<SocketId>,
    pub(crate) functions: Vec<FnId>,
    pub(crate) variables: VariableRegistry,
    /// Monotonic: false -> true, exactly once.
    pub(crate) input_complete: bool,
    pub(crate) behavior: Box<dyn ComponentBehavior>,
}

impl Component {
    pub(crate) fn new(scope: String, name: String, behavior: Box<dyn ComponentBehavior>) -> Self {
        Self {
            global_scope: scope.clone(),
            scope,
            name,
            parent: None,
            children: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            internal: Vec::new(),
            functions: Vec::new(),
            variables: VariableRegistry::new(),
            input_complete: false,
            behavior,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn global_scope(&self) -> &str {
        &self.global_scope
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn input_complete(&self) -> bool {
        self.input_complete
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }
}

/// Join a parent global scope with a child scope segment. Empty segments
/// collapse instead of producing `//`.
pub(crate) fn join_scope(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{parent}/{child}"),
    }
}

/// Check a scope segment against `[A-Za-z0-9_-]*`.
pub(crate) fn validate_scope(scope: &str) -> Result<(), GraphError> {
    if scope
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(GraphError::InvalidScope {
            scope: scope.to_string(),
        })
    }
}
