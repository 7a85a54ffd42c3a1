use rendernet::buffers::HeapBufferProvider;
use rendernet::engine::render_concurrently;
use rendernet::{
    CalcStream, EngineConfig, FrameCache, NetworkBuilder, ProcessingNode, WiringFactory,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let engine = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    // Two oscillators mixed, then amplified; the mix is cached
    let description = serde_json::json!({
        "label": "demo",
        "nodes": [
            {"id": "low", "type": "sinegenerator", "config": {"frequency": 220.0}},
            {"id": "high", "type": "sinegenerator", "config": {"frequency": 880.0, "amplitude": 0.5}},
            {"id": "mix", "type": "mix", "config": {"balance": 0.3}, "cache": true},
            {"id": "amp", "type": "gain", "config": {"gain_db": -6.0}, "inplace": true}
        ],
        "connections": [
            {"from": "low", "to": "mix", "to_port": 0},
            {"from": "high", "to": "mix", "to_port": 1},
            {"from": "mix", "to": "amp"}
        ]
    });

    let network = NetworkBuilder::new(WiringFactory::new())
        .buffer_size(engine.frame_size)
        .build(&description)?;
    println!("{}", network.describe());

    let exit = network
        .node_named("amp")
        .map(ProcessingNode::id)
        .ok_or(anyhow::anyhow!("exit node missing"))?;
    let network = Arc::new(network);
    let working = Arc::new(HeapBufferProvider::new());
    let cache = Arc::new(FrameCache::new(engine.cache_capacity));

    let stream = CalcStream::new(
        network,
        working.clone(),
        cache.clone(),
        exit,
        0,
        engine.table_capacity,
    );
    let results = render_concurrently(vec![(stream.clone(), 0..8), (stream, 4..12)]).await?;

    for (i, frames) in results.iter().enumerate() {
        let peak = frames
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, s| acc.max(s.abs()));
        println!("stream {}: {} frames, peak {:.3}", i, frames.len(), peak);
    }
    println!(
        "cache: {} entries, {} hits, {} misses; {} working buffers outstanding",
        cache.len(),
        cache.hits(),
        cache.misses(),
        working.active_count()
    );
    Ok(())
}
