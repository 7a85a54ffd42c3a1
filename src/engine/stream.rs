use crate::buffers::BufferProvider;
use crate::core::{NodeId, Result};
use crate::engine::{FrameCache, RenderProcess, StateClosure};
use crate::wiring::NodeNetwork;
use log::debug;
use std::ops::Range;
use std::sync::Arc;

/// Independent chain of pulls on one exit node of a network.
///
/// Streams share the immutable network, the working provider and the
/// frame cache; each runs its pulls on a blocking task with its own
/// render process.
#[derive(Clone)]
pub struct CalcStream {
    network: Arc<NodeNetwork>,
    working: Arc<dyn BufferProvider>,
    cache: Arc<FrameCache>,
    exit: NodeId,
    port: usize,
    table_capacity: usize,
}

impl CalcStream {
    pub fn new(
        network: Arc<NodeNetwork>,
        working: Arc<dyn BufferProvider>,
        cache: Arc<FrameCache>,
        exit: NodeId,
        port: usize,
        table_capacity: usize,
    ) -> Self {
        Self {
            network,
            working,
            cache,
            exit,
            port,
            table_capacity,
        }
    }

    pub fn exit(&self) -> NodeId {
        self.exit
    }

    /// Pull every frame of `frames` synchronously, returning the samples
    pub fn render_range(&self, frames: Range<i64>) -> Result<Vec<Vec<f64>>> {
        let process = RenderProcess::new(
            &self.network,
            self.working.clone(),
            self.cache.clone(),
            self.table_capacity,
        );
        frames
            .map(|frame| {
                process.set_frame(frame);
                self.deliver(&process)
            })
            .collect()
    }

    pub fn render_frame(&self, frame: i64) -> Result<Vec<f64>> {
        let mut rendered = self.render_range(frame..frame + 1)?;
        Ok(rendered.pop().unwrap_or_default())
    }

    /// Render `frames` on a blocking task
    pub async fn render(&self, frames: Range<i64>) -> anyhow::Result<Vec<Vec<f64>>> {
        let stream = self.clone();
        let rendered = tokio::task::spawn_blocking(move || stream.render_range(frames)).await??;
        Ok(rendered)
    }

    fn deliver(&self, process: &RenderProcess<'_>) -> Result<Vec<f64>> {
        let handle = process.pull(self.exit, self.port)?;
        let samples = handle.read()?.to_vec();
        process.release_buffer(&handle)?;
        debug!(
            "stream on node {} delivered frame {} ({} samples)",
            self.exit,
            process.frame(),
            samples.len()
        );
        Ok(samples)
    }
}

/// Drive several streams concurrently, each over its own frame range
pub async fn render_concurrently(
    jobs: Vec<(CalcStream, Range<i64>)>,
) -> anyhow::Result<Vec<Vec<Vec<f64>>>> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|(stream, frames)| tokio::spawn(async move { stream.render(frames).await }))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await??);
    }
    Ok(results)
}
