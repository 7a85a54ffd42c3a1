use proptest::prelude::*;
use proptest::sample::Index;
use rendernet::buffers::HeapBufferProvider;
use rendernet::core::{Lead, NodeId};
use rendernet::engine::{FrameCache, RenderProcess, StateClosure};
use rendernet::nodes::FnOperation;
use rendernet::wiring::{NodeNetwork, WiringFactory, WiringSpec};
use std::sync::Arc;

const SIZE: usize = 4;

#[derive(Debug, Clone)]
struct NodeShape {
    source: bool,
    nr_out: usize,
    cache: bool,
    inplace: bool,
    leads: Vec<(Index, usize)>,
}

fn node_shape() -> impl Strategy<Value = NodeShape> {
    (
        any::<bool>(),
        1usize..=2,
        any::<bool>(),
        any::<bool>(),
        prop::collection::vec((any::<Index>(), 0usize..2), 1..=2),
    )
        .prop_map(|(source, nr_out, cache, inplace, leads)| NodeShape {
            source,
            nr_out,
            cache,
            inplace,
            leads,
        })
}

/// Resolved layout: output count and predecessors (`None` for sources)
struct Built {
    nr_out: usize,
    leads: Option<Vec<(usize, usize)>>,
}

/// Sources yield `index + 1 + channel`, processing nodes sum their inputs plus the output index
fn summing() -> FnOperation {
    FnOperation::process("sum", |feed| {
        for o in 0..feed.nr_outputs() {
            feed.with_inputs(o, |inputs, out| {
                for (k, sample) in out.iter_mut().enumerate() {
                    *sample = inputs.iter().map(|input| input[k]).sum::<f64>() + o as f64;
                }
            });
        }
        Ok(())
    })
}

fn build(shapes: &[NodeShape]) -> (NodeNetwork, Vec<Built>) {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("random");
    let mut built: Vec<Built> = Vec::new();

    for (i, shape) in shapes.iter().enumerate() {
        let name = format!("n{}", i);
        if i == 0 || shape.source {
            let base = i as f64 + 1.0;
            let op = FnOperation::source(name.clone(), move |frame, buffer| {
                buffer.fill(base + frame.channel as f64);
                Ok(())
            });
            let spec = WiringSpec::new(Arc::new(op), shape.nr_out, 0)
                .cache(shape.cache)
                .buffer_size(SIZE);
            let wiring = factory.build(&mut network, spec).unwrap();
            network.add_node(name, wiring, vec![]).unwrap();
            built.push(Built {
                nr_out: shape.nr_out,
                leads: None,
            });
        } else {
            let leads: Vec<(usize, usize)> = shape
                .leads
                .iter()
                .map(|(idx, port)| {
                    let node = idx.index(i);
                    (node, port % built[node].nr_out)
                })
                .collect();
            let nr_out = if shape.inplace { 1 } else { shape.nr_out };
            let spec = WiringSpec::new(Arc::new(summing()), nr_out, leads.len())
                .cache(shape.cache)
                .inplace(shape.inplace)
                .buffer_size(SIZE);
            let wiring = factory.build(&mut network, spec).unwrap();
            let node_leads = leads
                .iter()
                .map(|&(node, port)| Lead::new(NodeId(node), port))
                .collect();
            network.add_node(name, wiring, node_leads).unwrap();
            built.push(Built {
                nr_out,
                leads: Some(leads),
            });
        }
    }
    (network, built)
}

fn expected(built: &[Built], node: usize, port: usize) -> f64 {
    match &built[node].leads {
        None => node as f64 + 1.0 + port as f64,
        Some(leads) => {
            leads
                .iter()
                .map(|&(pred, p)| expected(built, pred, p))
                .sum::<f64>()
                + port as f64
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn recursive_pulls_leave_arena_and_provider_balanced(
        shapes in prop::collection::vec(node_shape(), 1..8),
    ) {
        let (network, built) = build(&shapes);
        let exit = built.len() - 1;

        let working = Arc::new(HeapBufferProvider::new());
        let cache = Arc::new(FrameCache::new(64));
        let process = RenderProcess::new(&network, working.clone(), cache, 256);

        for frame in 0..2 {
            process.set_frame(frame);
            for port in 0..built[exit].nr_out {
                prop_assert_eq!(process.table_storage().level(), 0);

                let handle = process
                    .pull(NodeId(exit), port)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                let samples = handle
                    .read()
                    .map_err(|e| TestCaseError::fail(e.to_string()))?
                    .to_vec();
                let want = expected(&built, exit, port);
                prop_assert!(
                    samples.iter().all(|s| (s - want).abs() < 1e-9),
                    "port {} gave {:?}, expected {}", port, samples, want
                );

                process
                    .release_buffer(&handle)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(process.table_storage().level(), 0);
                prop_assert_eq!(working.active_count(), 0);
            }
        }
    }
}
