use rendernet::engine::{OutputAlloc, Strategy};
use rendernet::nodes::{FnOperation, Passthrough};
use rendernet::wiring::{ConfigSelector, Configuration, NodeNetwork, WiringFactory, WiringSpec};
use rendernet::EngineError;
use std::sync::Arc;

fn spec(nr_out: usize, nr_in: usize) -> WiringSpec {
    WiringSpec::new(Arc::new(Passthrough::default()), nr_out, nr_in)
}

#[test]
fn test_dispatch_is_deterministic() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("dispatch");

    for code in factory.selector().codes().collect::<Vec<_>>() {
        let config = Configuration::from_code(code);
        let expected = Strategy::for_config(config).unwrap();
        for _ in 0..3 {
            let build = factory.selector().get(code).unwrap();
            let id = build(&mut network, &spec(1, 1)).unwrap();
            let descriptor = network.wiring(id).unwrap();
            assert_eq!(descriptor.strategy(), expected);
            assert_eq!(descriptor.config(), config);
        }
    }
    assert_eq!(network.wiring_count(), 7 * 3);
}

#[test]
fn test_unregistered_code_fails_reproducibly() {
    let selector = ConfigSelector::meaningful();
    let first = selector.get(5).err().unwrap().to_string();
    let second = selector.get(5).err().unwrap().to_string();
    assert_eq!(first, second);
    assert_eq!(first, "ConfigSelector: no preconfigured factory for config-bits=101");

    assert!(matches!(
        selector.get(8).err(),
        Some(EngineError::InvalidConfig { code: 8 })
    ));
}

#[test]
fn test_flag_extraction() {
    assert_eq!(WiringFactory::configuration(2, true, false).code(), 3);
    assert_eq!(WiringFactory::configuration(1, false, false), Configuration::PROCESS);
    assert_eq!(
        WiringFactory::configuration(1, false, true),
        Configuration::PROCESS | Configuration::INPLACE
    );
    assert_eq!(WiringFactory::configuration(0, false, false), Configuration::NONE);
    assert_eq!(WiringFactory::configuration(0, true, false), Configuration::CACHING);
}

#[test]
fn test_factory_picks_pipeline_from_triple() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("triple");
    let op = Arc::new(Passthrough::default());

    let caching = factory.wire(&mut network, op.clone(), 1, 1, true).unwrap();
    let plain = factory.wire(&mut network, op.clone(), 1, 1, false).unwrap();
    let source = factory.wire(&mut network, op, 2, 0, false).unwrap();

    assert_eq!(network.wiring(caching).unwrap().strategy(), Strategy::CachingProcess);
    assert_eq!(
        network.wiring(plain).unwrap().strategy(),
        Strategy::Process {
            output: OutputAlloc::Parent
        }
    );
    let source = network.wiring(source).unwrap();
    assert_eq!(source.strategy(), Strategy::Source);
    assert_eq!(source.nr_in(), 2);
    assert_eq!(source.nr_out(), 2);
}

#[test]
fn test_caching_inplace_source_is_configuration_error() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("invalid");

    let err = factory
        .build(&mut network, spec(1, 0).cache(true).inplace(true))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig { code: 5 }));
    assert_eq!(network.wiring_count(), 0);
}

#[test]
fn test_restricted_selector_rejects_other_configurations() {
    let selector = ConfigSelector::new([Configuration::PROCESS, Configuration::NONE]).unwrap();
    let factory = WiringFactory::with_selector(selector);
    let mut network = NodeNetwork::new("restricted");

    assert!(factory.build(&mut network, spec(1, 1)).is_ok());
    assert!(factory.build(&mut network, spec(1, 0)).is_ok());
    assert!(matches!(
        factory.build(&mut network, spec(1, 1).cache(true)),
        Err(EngineError::InvalidConfig { code: 3 })
    ));
}

#[test]
fn test_inplace_needs_input_per_output() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("inplace");

    let err = factory
        .build(&mut network, spec(2, 1).inplace(true))
        .unwrap_err();
    assert!(matches!(err, EngineError::Wiring(_)));

    let id = factory.build(&mut network, spec(1, 2).inplace(true)).unwrap();
    assert_eq!(
        network.wiring(id).unwrap().strategy().output_alloc(),
        Some(OutputAlloc::InPlace)
    );
}

#[test]
fn test_cached_inplace_ignores_port_check() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("cached-inplace");

    // code 7 runs the caching pipeline, outputs come from the cache
    let id = factory
        .build(&mut network, spec(2, 1).cache(true).inplace(true))
        .unwrap();
    let wiring = network.wiring(id).unwrap();
    assert_eq!(wiring.config().code(), 7);
    assert_eq!(wiring.strategy(), Strategy::CachingProcess);
    assert_eq!(wiring.strategy().output_alloc(), Some(OutputAlloc::Current));
}

#[test]
fn test_node_without_outputs_rejected() {
    let factory = WiringFactory::new();
    let mut network = NodeNetwork::new("empty");
    let op = Arc::new(FnOperation::constant("c", 1.0));

    assert!(matches!(
        factory.wire(&mut network, op, 0, 0, false),
        Err(EngineError::Wiring(_))
    ));
}
