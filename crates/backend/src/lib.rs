//! # graphwire-backend
//!
//! A recording implementation of the execution-backend seam. It builds
//! nothing: every [`BuildRequest`] and [`VariableRequest`] is appended to
//! an in-memory log and answered with the next sequential handle. Tests
//! assert against the log; demos serialize it to see exactly what a real
//! backend would have been asked to do.

use graphwire_core::{BackendContext, BuildRequest, OpHandle, VarHandle, VariableRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backend that records every request verbatim.
///
/// Handles are sequential per kind, starting at 0, so a request's handle
/// doubles as its index into the corresponding log.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RecordingBackend {
    requests: Vec<BuildRequest>,
    variables: Vec<VariableRequest>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation requests in emission order.
    pub fn requests(&self) -> &[BuildRequest] {
        &self.requests
    }

    /// Variable requests in emission order.
    pub fn variables(&self) -> &[VariableRequest] {
        &self.variables
    }

    /// The request a handle was answered for.
    pub fn request_for(&self, handle: OpHandle) -> Option<&BuildRequest> {
        self.requests.get(handle.0 as usize)
    }

    /// The variable request a handle was answered for.
    pub fn variable_for(&self, handle: VarHandle) -> Option<&VariableRequest> {
        self.variables.get(handle.0 as usize)
    }
}

impl BackendContext for RecordingBackend {
    fn build_operation(&mut self, request: BuildRequest) -> OpHandle {
        let handle = OpHandle(self.requests.len() as u64);
        debug!(transform = %request.transform, scope = %request.scope, handle = handle.0, "recorded operation");
        self.requests.push(request);
        handle
    }

    fn create_variable(&mut self, request: VariableRequest) -> VarHandle {
        let handle = VarHandle(self.variables.len() as u64);
        debug!(name = %request.name, handle = handle.0, "recorded variable");
        self.variables.push(request);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphwire_core::{OpFlags, SpaceDesc};

    fn request(transform: &str) -> BuildRequest {
        BuildRequest {
            transform: transform.to_string(),
            scope: "agent/policy".to_string(),
            input_spaces: vec![SpaceDesc::float(vec![4])],
            output_spaces: vec![SpaceDesc::float(vec![2])],
            flags: OpFlags::default(),
        }
    }

    #[test]
    fn test_handles_are_sequential_and_index_the_log() {
        let mut backend = RecordingBackend::new();
        let a = backend.build_operation(request("dense"));
        let b = backend.build_operation(request("softmax"));
        assert_eq!(a, OpHandle(0));
        assert_eq!(b, OpHandle(1));
        assert_eq!(backend.request_for(b).unwrap().transform, "softmax");
        assert_eq!(backend.requests().len(), 2);
    }

    #[test]
    fn test_variable_log_is_independent_of_operations() {
        let mut backend = RecordingBackend::new();
        backend.build_operation(request("dense"));
        let v = backend.create_variable(VariableRequest {
            name: "agent/policy/w".to_string(),
            space: SpaceDesc::float(vec![4, 2]),
            trainable: true,
        });
        assert_eq!(v, VarHandle(0));
        assert!(backend.variable_for(v).unwrap().trainable);
    }
}
