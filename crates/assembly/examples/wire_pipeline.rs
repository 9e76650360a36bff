//! Wire a small two-stage pipeline, build it against the recording
//! backend, and print everything the backend was asked to do.
//!
//! ```sh
//! cargo run -p graphwire-assembly --example wire_pipeline
//! ```

use graphwire_assembly::{
    ComponentBehavior, ComponentDef, ComponentGraph, PropagationOrder, SpaceMap, Transform,
    VariableCtx, Wiring,
};
use graphwire_backend::RecordingBackend;
use graphwire_core::{GraphError, OpFlags, SpaceDesc};

/// Dense-style stage: projects its input to a fixed width and declares a
/// weight matrix once the input space is known.
struct Projection {
    units: usize,
}

impl ComponentBehavior for Projection {
    fn on_inputs_resolved(
        &mut self,
        vars: &mut VariableCtx<'_>,
        spaces: &SpaceMap,
    ) -> Result<(), GraphError> {
        if let SpaceDesc::Value(input) = &spaces["input"] {
            let mut shape = input.shape.clone();
            shape.push(self.units);
            vars.declare("weights", SpaceDesc::float(shape), true)?;
            vars.declare("bias", SpaceDesc::float(vec![self.units]), true)?;
        }
        Ok(())
    }
}

fn projection_stage(name: &str, units: usize) -> ComponentDef {
    ComponentDef::new(name)
        .with_input("input")
        .with_output("output")
        .with_behavior(Projection { units })
}

fn project_transform(units: usize) -> Transform {
    Transform::new("project", 1, 1, move |_, _| {
        Ok(vec![SpaceDesc::float(vec![units])])
    })
}

fn assemble() -> Result<ComponentGraph, GraphError> {
    let mut graph = ComponentGraph::new(
        ComponentDef::new("pipeline")
            .with_input("state")
            .with_output("logits"),
    )?;
    let root = graph.root();

    let hidden = graph.add_component(root, projection_stage("hidden", 16), Wiring::None)?;
    let head = graph.add_component(root, projection_stage("head", 4), Wiring::None)?;
    graph.add_operation(
        hidden,
        project_transform(16),
        &["input"],
        &["output"],
        OpFlags::passthrough(),
    )?;
    graph.add_operation(
        head,
        project_transform(4),
        &["input"],
        &["output"],
        OpFlags::passthrough(),
    )?;

    use graphwire_assembly::ConnectSpec;
    graph.connect(ConnectSpec::named(root, "state"), ConnectSpec::named(hidden, "input"))?;
    graph.connect(ConnectSpec::Component(hidden), ConnectSpec::Component(head))?;
    graph.connect(ConnectSpec::named(head, "output"), ConnectSpec::named(root, "logits"))?;
    Ok(graph)
}

fn main() -> Result<(), GraphError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let mut graph = assemble()?;
    let root = graph.root();

    let mut inputs = SpaceMap::new();
    inputs.insert("state".to_string(), SpaceDesc::float(vec![8]));

    let mut backend = RecordingBackend::new();
    let report = graph.build(&inputs, &mut backend, PropagationOrder::Fifo)?;

    println!(
        "built {} operations, {} sockets resolved",
        report.operations.len(),
        report.resolved_sockets
    );
    for request in backend.requests() {
        println!(
            "  op   {:<20} {} -> {}",
            format!("{}/{}", request.scope, request.transform),
            request
                .input_spaces
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            request
                .output_spaces
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
    }
    for variable in backend.variables() {
        println!("  var  {:<30} {}", variable.name, variable.space);
    }
    println!(
        "logits space: {}",
        graph
            .socket_space(root, "logits")?
            .map(|s| s.to_string())
            .unwrap_or_else(|| "<unresolved>".to_string())
    );
    Ok(())
}
