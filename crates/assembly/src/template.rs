//! Component templates.
//!
//! A template is immutable structural data describing a component's scope
//! and declared external sockets. Instantiation produces a fresh
//! [`ComponentDef`] with empty connection lists every time — there is no
//! structural deep copy and no link cutting. Reusing a component shape
//! under several parents means instantiating the template once per use.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentBehavior, ComponentDef};

/// Immutable structural description of a component kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    pub scope: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl ComponentTemplate {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
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

    /// A fresh instance definition named after the template's scope.
    pub fn instantiate(&self) -> ComponentDef {
        self.instantiate_named(self.scope.clone())
    }

    /// A fresh instance with a sibling-unique name (the scope stays the
    /// template's scope).
    pub fn instantiate_named(&self, name: impl Into<String>) -> ComponentDef {
        let mut def = ComponentDef::named(self.scope.clone(), name);
        for input in &self.inputs {
            def = def.with_input(input.clone());
        }
        for output in &self.outputs {
            def = def.with_output(output.clone());
        }
        def
    }

    /// A fresh instance with its own behavior object.
    pub fn instantiate_with(
        &self,
        name: impl Into<String>,
        behavior: impl ComponentBehavior + 'static,
    ) -> ComponentDef {
        self.instantiate_named(name).with_behavior(behavior)
    }
}
