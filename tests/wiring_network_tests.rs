use rendernet::core::{Lead, NodeId, ProcessingNode};
use rendernet::nodes::{FnOperation, Gain, Mix};
use rendernet::wiring::{NodeNetwork, WiringFactory, WiringSpec};
use rendernet::EngineError;
use std::sync::Arc;

fn network_with_source() -> (NodeNetwork, NodeId) {
    let mut network = NodeNetwork::new("segment");
    let wiring = WiringFactory::new()
        .wire(&mut network, Arc::new(FnOperation::constant("one", 1.0)), 2, 0, false)
        .unwrap();
    let src = network.add_node("src", wiring, vec![]).unwrap();
    (network, src)
}

#[test]
fn test_nodes_share_descriptor() {
    let (mut network, src) = network_with_source();
    let gain = WiringFactory::new()
        .build(&mut network, WiringSpec::new(Arc::new(Gain::new(6.0)), 1, 1))
        .unwrap();

    let left = network.add_node("left", gain, vec![Lead::new(src, 0)]).unwrap();
    let right = network.add_node("right", gain, vec![Lead::new(src, 1)]).unwrap();

    assert_eq!(network.len(), 3);
    assert_eq!(network.wiring_count(), 2);
    assert_eq!(network.node(left).unwrap().wiring_id(), network.node(right).unwrap().wiring_id());
    assert_eq!(network.node_named("right").map(|n| n.id()), Some(right));
}

#[test]
fn test_forward_reference_rejected() {
    let (mut network, _) = network_with_source();
    let gain = WiringFactory::new()
        .build(&mut network, WiringSpec::new(Arc::new(Gain::default()), 1, 1))
        .unwrap();

    let err = network
        .add_node("ahead", gain, vec![Lead::new(NodeId(5), 0)])
        .unwrap_err();
    assert!(matches!(err, EngineError::Wiring(_)));
    assert_eq!(network.len(), 1);
}

#[test]
fn test_lead_count_must_match_inputs() {
    let (mut network, src) = network_with_source();
    let mix = WiringFactory::new()
        .build(&mut network, WiringSpec::new(Arc::new(Mix::default()), 1, 2))
        .unwrap();

    assert!(network.add_node("mix", mix, vec![Lead::new(src, 0)]).is_err());
    assert!(network
        .add_node("mix", mix, vec![Lead::new(src, 0), Lead::new(src, 1)])
        .is_ok());
}

#[test]
fn test_source_takes_no_leads() {
    let (mut network, src) = network_with_source();
    let wiring = network.node(src).unwrap().wiring_id();
    assert!(network.add_node("second", wiring, vec![Lead::new(src, 0)]).is_err());
}

#[test]
fn test_port_and_name_validation() {
    let (mut network, src) = network_with_source();
    let gain = WiringFactory::new()
        .build(&mut network, WiringSpec::new(Arc::new(Gain::default()), 1, 1))
        .unwrap();

    let bad_port = network.add_node("amp", gain, vec![Lead::new(src, 2)]).unwrap_err();
    assert!(bad_port.to_string().contains("output #2"));

    let dup = network.add_node("src", gain, vec![Lead::new(src, 0)]).unwrap_err();
    assert!(dup.to_string().contains("duplicate node name"));
}

#[test]
fn test_describe_lists_nodes() {
    let (mut network, src) = network_with_source();
    let gain = WiringFactory::new()
        .build(
            &mut network,
            WiringSpec::new(Arc::new(Gain::default()), 1, 1).cache(true),
        )
        .unwrap();
    network.add_node("amp", gain, vec![Lead::new(src, 1)]).unwrap();

    let text = network.describe();
    assert!(text.starts_with("network 'segment' (2 nodes)"));
    assert!(text.contains("'src': one(2→2) SOURCE via Source"));
    assert!(text.contains("'amp': Gain(1→1) CACHING|PROCESS via CachingProcess"));
    assert!(text.contains("<- [#0:1]"));
}

#[test]
fn test_buffer_size_mismatch_rejected() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("sizes");
    let short = factory
        .build(
            &mut network,
            WiringSpec::new(Arc::new(FnOperation::constant("one", 1.0)), 2, 0).buffer_size(4),
        )
        .unwrap();
    let src = network.add_node("src", short, vec![]).unwrap();
    let mix = factory
        .build(
            &mut network,
            WiringSpec::new(Arc::new(Mix::default()), 1, 2).buffer_size(8),
        )
        .unwrap();

    let err = network
        .add_node("mix", mix, vec![Lead::new(src, 0), Lead::new(src, 1)])
        .unwrap_err();
    assert!(matches!(err, EngineError::Wiring(_)));
    assert!(err.to_string().contains("8 samples"));
    assert_eq!(network.len(), 1);

    let matching = factory
        .build(
            &mut network,
            WiringSpec::new(Arc::new(Mix::default()), 1, 2).buffer_size(4),
        )
        .unwrap();
    assert!(network
        .add_node("mix", matching, vec![Lead::new(src, 0), Lead::new(src, 1)])
        .is_ok());
}
