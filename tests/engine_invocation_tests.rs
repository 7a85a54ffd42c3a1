use rendernet::buffers::{BufferProvider, HeapBufferProvider, TrackingHeapBlockProvider};
use rendernet::core::{Lead, NodeId};
use rendernet::engine::{FrameCache, RenderProcess, StateClosure};
use rendernet::nodes::{FnOperation, Gain, Mix, Passthrough};
use rendernet::wiring::{NodeNetwork, WiringFactory, WiringSpec};
use rendernet::EngineError;
use std::sync::Arc;

const SIZE: usize = 8;

fn add(network: &mut NodeNetwork, name: &str, spec: WiringSpec, leads: Vec<Lead>) -> NodeId {
    let wiring = WiringFactory::new()
        .build(network, spec.buffer_size(SIZE))
        .unwrap();
    network.add_node(name, wiring, leads).unwrap()
}

fn constant(value: f64) -> WiringSpec {
    WiringSpec::new(Arc::new(FnOperation::constant("const", value)), 1, 0)
}

fn gain(db: f64) -> WiringSpec {
    WiringSpec::new(Arc::new(Gain::new(db)), 1, 1)
}

fn all_close(samples: &[f64], expected: f64) -> bool {
    samples.len() == SIZE && samples.iter().all(|s| (s - expected).abs() < 1e-9)
}

#[test]
fn test_pull_source_gain_chain() {
    let mut network = NodeNetwork::new("chain");
    let src = add(&mut network, "src", constant(1.0), vec![]);
    let amp = add(&mut network, "amp", gain(20.0), vec![Lead::new(src, 0)]);

    let working = Arc::new(HeapBufferProvider::new());
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 64);

    let out = process.pull(amp, 0).unwrap();
    assert!(all_close(&out.read().unwrap(), 10.0));
    assert_eq!(working.active_count(), 1);
    assert_eq!(process.table_storage().level(), 0);

    process.release_buffer(&out).unwrap();
    assert_eq!(working.active_count(), 0);
}

fn blocks_created(inplace: bool) -> usize {
    let mut network = NodeNetwork::new("inplace");
    let src = add(&mut network, "src", constant(2.0), vec![]);
    let amp = add(&mut network, "amp", gain(0.0).inplace(inplace), vec![Lead::new(src, 0)]);

    let working = Arc::new(TrackingHeapBlockProvider::new());
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 64);
    let out = process.pull(amp, 0).unwrap();
    assert!(all_close(&out.read().unwrap(), 2.0));
    process.release_buffer(&out).unwrap();

    assert!(working.all_idle());
    working.pooled_count()
}

#[test]
fn test_inplace_reuses_input_buffer() {
    assert_eq!(blocks_created(true), 1);
    assert_eq!(blocks_created(false), 2);
}

#[test]
fn test_inplace_leaves_cached_input_untouched() {
    let mut network = NodeNetwork::new("fallback");
    let src = add(&mut network, "src", constant(3.0), vec![]);
    let kept = add(
        &mut network,
        "kept",
        WiringSpec::new(Arc::new(Passthrough::default()), 1, 1).cache(true),
        vec![Lead::new(src, 0)],
    );
    let amp = add(&mut network, "amp", gain(20.0).inplace(true), vec![Lead::new(kept, 0)]);

    let cache = Arc::new(FrameCache::new(4));
    let working = Arc::new(HeapBufferProvider::new());
    let process = RenderProcess::new(&network, working, cache.clone(), 64);

    let out = process.pull(amp, 0).unwrap();
    assert!(all_close(&out.read().unwrap(), 30.0));
    process.release_buffer(&out).unwrap();

    let retained = process.pull(kept, 0).unwrap();
    assert!(all_close(&retained.read().unwrap(), 3.0));
    assert_eq!(cache.hits(), 1);
    process.release_buffer(&retained).unwrap();
}

#[test]
fn test_processing_failure_releases_buffers() {
    let mut network = NodeNetwork::new("failing");
    let src = add(&mut network, "src", constant(1.0), vec![]);
    let broken = FnOperation::process("broken", |_| anyhow::bail!("boom"));
    let node = add(
        &mut network,
        "broken",
        WiringSpec::new(Arc::new(broken), 1, 1).cache(true),
        vec![Lead::new(src, 0)],
    );

    let working = Arc::new(HeapBufferProvider::new());
    let cache = Arc::new(FrameCache::new(4));
    let process = RenderProcess::new(&network, working.clone(), cache.clone(), 64);

    match process.pull(node, 0) {
        Err(EngineError::Processing { node, cause }) => {
            assert_eq!(node, "broken");
            assert!(cause.to_string().contains("boom"));
        }
        other => panic!("expected processing error, got {:?}", other),
    }
    assert_eq!(working.active_count(), 0);
    assert_eq!(process.table_storage().level(), 0);
    assert!(cache.is_empty());
}

#[test]
fn test_source_without_reader_fails() {
    let mut network = NodeNetwork::new("no reader");
    let op = FnOperation::process("compute only", |_| Ok(()));
    let src = add(&mut network, "src", WiringSpec::new(Arc::new(op), 1, 0), vec![]);

    let working = Arc::new(HeapBufferProvider::new());
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 64);

    let err = process.pull(src, 0).unwrap_err();
    assert!(err.to_string().contains("can not read source data"));
    assert_eq!(working.active_count(), 0);
    assert_eq!(process.table_storage().level(), 0);
}

#[test]
fn test_output_index_out_of_range() {
    let mut network = NodeNetwork::new("range");
    let src = add(&mut network, "src", constant(1.0), vec![]);
    let process = RenderProcess::new(
        &network,
        Arc::new(HeapBufferProvider::new()),
        Arc::new(FrameCache::new(4)),
        64,
    );

    assert!(matches!(process.pull(src, 1), Err(EngineError::Wiring(_))));
    assert!(matches!(process.pull(NodeId(9), 0), Err(EngineError::Wiring(_))));
}

#[test]
fn test_table_overflow_unwinds_cleanly() {
    let mut network = NodeNetwork::new("deep");
    let src = add(&mut network, "src", constant(1.0), vec![]);
    let amp = add(&mut network, "amp", gain(0.0), vec![Lead::new(src, 0)]);

    let working = Arc::new(HeapBufferProvider::new());
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 3);

    let err = process.pull(amp, 0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::TableOverflow {
            requested: 2,
            level: 2,
            capacity: 3
        }
    ));
    assert_eq!(process.table_storage().level(), 0);
    assert_eq!(working.active_count(), 0);
}

#[test]
fn test_multi_output_source_keeps_requested_channel() {
    let mut network = NodeNetwork::new("channels");
    let op = FnOperation::source("channels", |frame, buffer| {
        buffer.fill(frame.channel as f64 + 1.0);
        Ok(())
    });
    let src = add(&mut network, "src", WiringSpec::new(Arc::new(op), 3, 0), vec![]);

    let working = Arc::new(HeapBufferProvider::new());
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 64);

    let out = process.pull(src, 2).unwrap();
    assert!(all_close(&out.read().unwrap(), 3.0));
    assert_eq!(working.active_count(), 1);
    process.release_buffer(&out).unwrap();
    assert_eq!(working.active_count(), 0);
}

#[test]
fn test_same_predecessor_on_both_inputs() {
    let mut network = NodeNetwork::new("diamond");
    let src = add(&mut network, "src", constant(2.0).cache(true), vec![]);
    let mix = add(
        &mut network,
        "mix",
        WiringSpec::new(Arc::new(Mix::default()), 1, 2),
        vec![Lead::new(src, 0), Lead::new(src, 0)],
    );

    let working = Arc::new(HeapBufferProvider::new());
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 64);

    let out = process.pull(mix, 0).unwrap();
    assert!(all_close(&out.read().unwrap(), 2.0));
    process.release_buffer(&out).unwrap();
    assert_eq!(working.active_count(), 0);
}

#[test]
fn test_working_buffer_descriptor_belongs_to_provider() {
    let working = Arc::new(HeapBufferProvider::new());
    let mut network = NodeNetwork::new("owner");
    let src = add(&mut network, "src", constant(0.5), vec![]);
    let process = RenderProcess::new(&network, working.clone(), Arc::new(FrameCache::new(4)), 8);

    let out = process.pull(src, 0).unwrap();
    assert_eq!(out.provider(), working.id());
    assert_eq!(out.descriptor().size(), SIZE);
    process.release_buffer(&out).unwrap();
}
