//! # Operation Bindings (GraphFunctions)
//!
//! An operation binding links an ordered set of input sockets to an
//! ordered set of output sockets via a pure transformation. The binding
//! resolves only once *all* of its input sockets are resolved; resolution
//! is a deterministic function of the structural flags — flatten nested
//! containers into auto-keyed leaves, run the transform's space map per
//! leaf, re-nest mirrored from the input container shape.
//!
//! Bindings with zero input sockets are graph entry points (constants,
//! generators); they cannot be discovered by backward traversal from
//! outputs and are tracked separately by the assembly.

use std::collections::BTreeMap;
use std::fmt;

use graphwire_core::{GraphError, OpFlags, OpHandle, SpaceDesc, ValueSpace};

use crate::component::ComponentId;
use crate::socket::SocketId;

/// Index of an operation binding in the assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FnId(pub(crate) usize);

type SpaceMapFn = Box<dyn Fn(Option<&str>, &[SpaceDesc]) -> Result<Vec<SpaceDesc>, GraphError>>;

/// A pure transformation with declared arity and a space-mapping callback.
///
/// The callback maps input spaces to output spaces; the numeric work it
/// stands for lives in the backend, addressed by `name`. When the binding
/// runs in flattened mode the callback is invoked once per auto-key with
/// primitive leaf spaces; otherwise once with the declared spaces.
pub struct Transform {
    name: String,
    in_arity: usize,
    out_arity: usize,
    map: SpaceMapFn,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, in_arity: usize, out_arity: usize, map: F) -> Self
    where
        F: Fn(Option<&str>, &[SpaceDesc]) -> Result<Vec<SpaceDesc>, GraphError> + 'static,
    {
        Self {
            name: name.into(),
            in_arity,
            out_arity,
            map: Box::new(map),
        }
    }

    /// A 1-to-1 transform whose output space equals its input space.
    pub fn identity(name: impl Into<String>) -> Self {
        Self::new(name, 1, 1, |_, inputs| Ok(vec![inputs[0].clone()]))
    }

    /// A 0-to-1 entry-point transform producing a fixed space.
    pub fn source(name: impl Into<String>, space: SpaceDesc) -> Self {
        Self::new(name, 0, 1, move |_, _| Ok(vec![space.clone()]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn in_arity(&self) -> usize {
        self.in_arity
    }

    pub fn out_arity(&self) -> usize {
        self.out_arity
    }

    /// Run the space map and check the result against the declared
    /// output arity.
    fn map_spaces(
        &self,
        key: Option<&str>,
        inputs: &[SpaceDesc],
    ) -> Result<Vec<SpaceDesc>, GraphError> {
        let out = (self.map)(key, inputs)?;
        if out.len() != self.out_arity {
            return Err(GraphError::ArityMismatch {
                transform: self.name.clone(),
                side: "output",
                expected: self.out_arity,
                got: out.len(),
            });
        }
        Ok(out)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("in_arity", &self.in_arity)
            .field("out_arity", &self.out_arity)
            .finish()
    }
}

/// A registered operation binding inside a component.
pub struct GraphFunction {
    pub(crate) transform: Transform,
    pub(crate) component: ComponentId,
    pub(crate) inputs: Vec<SocketId>,
    pub(crate) outputs: Vec<SocketId>,
    pub(crate) flags: OpFlags,
    /// Backend handle, stored verbatim once the binding is built.
    pub(crate) op: Option<OpHandle>,
}

impl GraphFunction {
    pub fn transform_name(&self) -> &str {
        self.transform.name()
    }

    pub fn op_handle(&self) -> Option<OpHandle> {
        self.op
    }

    /// Compute the output spaces for resolved input spaces under this
    /// binding's structural flags.
    pub(crate) fn resolve_output_spaces(
        &self,
        input_spaces: &[SpaceDesc],
    ) -> Result<Vec<SpaceDesc>, GraphError> {
        if input_spaces.is_empty() || !self.flags.flatten {
            return self.transform.map_spaces(None, input_spaces);
        }

        // Flatten every input and make sure they agree on their auto-keys.
        let flat_inputs: Vec<BTreeMap<String, ValueSpace>> =
            input_spaces.iter().map(SpaceDesc::flatten).collect();
        let keys: Vec<&String> = flat_inputs[0].keys().collect();
        for (idx, flat) in flat_inputs.iter().enumerate().skip(1) {
            if flat.keys().collect::<Vec<_>>() != keys {
                return Err(GraphError::ContainerMismatch {
                    context: format!("transform '{}'", self.transform.name()),
                    detail: format!(
                        "input {idx} has auto-keys [{}] but input 0 has [{}]",
                        flat.keys().cloned().collect::<Vec<_>>().join(", "),
                        keys.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
                    ),
                });
            }
        }

        // Run the space map once per auto-key over the primitive leaves.
        let mut flat_outputs: Vec<BTreeMap<String, ValueSpace>> =
            vec![BTreeMap::new(); self.transform.out_arity()];
        for key in &keys {
            let leaves: Vec<SpaceDesc> = flat_inputs
                .iter()
                .map(|flat| SpaceDesc::Value(flat[key.as_str()].clone()))
                .collect();
            let map_key = if self.flags.auto_key {
                Some(key.as_str())
            } else {
                None
            };
            let outs = self.transform.map_spaces(map_key, &leaves)?;
            for (slot, out) in outs.into_iter().enumerate() {
                match out {
                    SpaceDesc::Value(v) => {
                        flat_outputs[slot].insert((*key).clone(), v);
                    }
                    other => {
                        return Err(GraphError::ContainerMismatch {
                            context: format!("transform '{}'", self.transform.name()),
                            detail: format!(
                                "per-leaf output for key '{key}' is a container: {other}"
                            ),
                        })
                    }
                }
            }
        }

        // Re-nest mirrored from the input container shape, or keep the
        // flat auto-key map as a Dict.
        flat_outputs
            .into_iter()
            .map(|flat| {
                if self.flags.unflatten {
                    SpaceDesc::unflatten(&flat)
                } else if flat.len() == 1 && flat.contains_key("") {
                    SpaceDesc::unflatten(&flat)
                } else {
                    Ok(SpaceDesc::Dict(
                        flat.into_iter().map(|(k, v)| (k, SpaceDesc::Value(v))).collect(),
                    ))
                }
            })
            .collect()
    }
}
