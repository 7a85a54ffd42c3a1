use crate::core::{FrameId, NodeOperation};
use crate::engine::FeedManifold;
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type ProcessFn = dyn Fn(&mut FeedManifold<'_>) -> Result<()> + Send + Sync;
type SourceFn = dyn Fn(&FrameId, &mut [f64]) -> Result<()> + Send + Sync;

/// Operation backed by closures, counting its invocations.
///
/// Not registered by type name; wire it directly through the
/// [`WiringFactory`](crate::wiring::WiringFactory).
#[derive(Clone)]
pub struct FnOperation {
    name: String,
    process: Option<Arc<ProcessFn>>,
    source: Option<Arc<SourceFn>>,
    calls: Arc<AtomicUsize>,
}

impl FnOperation {
    pub fn process(
        name: impl Into<String>,
        f: impl Fn(&mut FeedManifold<'_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            process: Some(Arc::new(f)),
            source: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn source(
        name: impl Into<String>,
        f: impl Fn(&FrameId, &mut [f64]) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            process: None,
            source: Some(Arc::new(f)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source filling every sample with a constant
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self::source(name, move |_, buffer| {
            buffer.fill(value);
            Ok(())
        })
    }

    /// Shared counter of process and read calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NodeOperation for FnOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, feed: &mut FeedManifold<'_>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.process {
            Some(f) => f(feed),
            None => {
                let channels = feed.nr_outputs().min(feed.nr_inputs());
                for ch in 0..channels {
                    feed.apply(ch, ch, |sample| sample);
                }
                Ok(())
            }
        }
    }

    fn read_source(&self, frame: &FrameId, buffer: &mut [f64]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.source {
            Some(f) => f(frame, buffer),
            None => anyhow::bail!("{} can not read source data ({})", self.name, frame),
        }
    }
}
