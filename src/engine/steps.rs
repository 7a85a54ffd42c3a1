//! Elementary steps of node invocation.
//!
//! Each step does its part of the work on the [`Invocation`] and then hands
//! over to the remaining steps through [`proceed`], which lets a step wrap
//! everything that follows it (the cache query may short-circuit, the buffer
//! table allocation brackets the whole computation).

use crate::buffers::{BufferHandle, BufferState};
use crate::core::{EngineError, ProcessingNode, Result};
use crate::engine::{FeedManifold, Invocation, OutputAlloc, StateClosure};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    QueryCache,
    AllocBufferTable,
    PullInput,
    ReadSource,
    AllocOutput,
    ProcessData,
    FeedCache,
    ReleaseBuffers,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::QueryCache => "QueryCache",
            Self::AllocBufferTable => "AllocBufferTable",
            Self::PullInput => "PullInput",
            Self::ReadSource => "ReadSource",
            Self::AllocOutput => "AllocOutput",
            Self::ProcessData => "ProcessData",
            Self::FeedCache => "FeedCache",
            Self::ReleaseBuffers => "ReleaseBuffers",
        }
    }

    pub fn run(self, ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
        match self {
            Self::QueryCache => query_cache(ivo, next),
            Self::AllocBufferTable => alloc_buffer_table(ivo, next),
            Self::PullInput => pull_input(ivo, next),
            Self::ReadSource => read_source(ivo, next),
            Self::AllocOutput => alloc_output(ivo, next),
            Self::ProcessData => process_data(ivo, next),
            Self::FeedCache => feed_cache(ivo, next),
            Self::ReleaseBuffers => release_buffers(ivo, next),
        }
    }
}

/// Run the first of `steps`, which in turn proceeds with the rest
pub fn proceed(ivo: &mut Invocation<'_>, steps: &[Step]) -> Result<BufferHandle> {
    match steps.split_first() {
        Some((step, next)) => step.run(ivo, next),
        None => Err(EngineError::Logic(
            "invocation pipeline ended without yielding a buffer",
        )),
    }
}

pub fn query_cache(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    let frame = ivo.frame_id();
    if let Some(fetched) = ivo.current_state().fetch(&frame) {
        debug!("node '{}' served from cache: {}", ivo.node().name(), frame);
        return Ok(fetched);
    }
    proceed(ivo, next)
}

/// Claim the table chunk for the rest of the pipeline and give it back afterwards.
/// On failure, buffers still held in the table are released.
pub fn alloc_buffer_table(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    let storage = ivo.current_state().table_storage();
    ivo.table = Some(storage.claim(ivo.nr_out(), ivo.nr_in())?);
    debug_assert!(ivo.buff_tab_is_consistent());

    let result = proceed(ivo, next);
    if let Err(e) = &result {
        debug!("invocation of '{}' failed: {}", ivo.node().name(), e);
        if let Some(table) = &ivo.table {
            table.discard_buffers(ivo.current_state());
        }
    }
    ivo.table = None;
    result
}

pub fn pull_input(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    let node = ivo.node();
    let network = ivo.network_ref();
    for port in 0..ivo.nr_in() {
        let lead = node.lead(port)?;
        let predecessor = network.node(lead.node)?;
        let handle = predecessor.pull(&*ivo, lead.port)?;
        // now input #port is ready
        ivo.table()?.set_input(port, handle);
    }
    proceed(ivo, next)
}

/// Leaf variant of [`pull_input`]: the source data lands in caller-owned
/// buffers bound to input and output slot alike.
pub fn read_source(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    if ivo.nr_in() != ivo.nr_out() {
        return Err(EngineError::Logic("source channels must match outputs"));
    }
    let size = ivo.wiring().buffer_size();
    for ch in 0..ivo.nr_in() {
        let handle = ivo.parent().allocate_buffer(size)?;
        let table = ivo.table()?;
        table.set_input(ch, handle.clone());
        table.set_output(ch, handle.clone());

        let frame = ivo.channel_frame(ch);
        let mut data = handle.write()?;
        ivo.wiring()
            .operation()
            .read_source(&frame, &mut data)
            .map_err(|cause| ivo.processing_error(cause))?;
    }
    proceed(ivo, next)
}

pub fn alloc_output(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    let size = ivo.wiring().buffer_size();
    let mode = ivo
        .wiring()
        .strategy()
        .output_alloc()
        .ok_or(EngineError::Logic("strategy does not allocate outputs"))?;
    let parent = ivo.parent();
    let current = ivo.current_state();
    let table = ivo.table()?;

    match mode {
        OutputAlloc::Current => {
            table.lock_buffers(|| current.allocate_cached(size))?;
        }
        OutputAlloc::Parent => {
            table.lock_buffers(|| parent.allocate_buffer(size))?;
        }
        OutputAlloc::InPlace => {
            for ch in 0..ivo.nr_out() {
                let handle = match table.input(ch) {
                    Some(input) if input.state() == BufferState::Locked => input,
                    Some(_) => {
                        // input is a retained result and must stay untouched
                        trace!("node '{}': no in-place output #{}", ivo.node().name(), ch);
                        parent.allocate_buffer(size)?
                    }
                    None => return Err(EngineError::Logic("in-place output without input buffer")),
                };
                table.set_output(ch, handle);
            }
        }
    }
    proceed(ivo, next)
}

pub fn process_data(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    {
        debug_assert!(ivo.buff_tab_is_consistent());
        let table = ivo.table()?;
        table.verify_buffers()?;

        let inputs = (0..table.nr_in())
            .map(|i| table.input(i).ok_or(EngineError::Logic("input slot not populated")))
            .collect::<Result<Vec<_>>>()?;
        let outputs = (0..table.nr_out())
            .map(|i| table.output(i).ok_or(EngineError::Logic("output slot not populated")))
            .collect::<Result<Vec<_>>>()?;

        let mut feed = FeedManifold::assemble(ivo.frame_id(), &inputs, &outputs)?;
        ivo.wiring()
            .operation()
            .process(&mut feed)
            .map_err(|cause| ivo.processing_error(cause))?;
    }
    proceed(ivo, next)
}

pub fn feed_cache(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    for ch in 0..ivo.nr_out() {
        let handle = ivo
            .table()?
            .output(ch)
            .ok_or(EngineError::Logic("output slot not populated"))?;
        // declare output as finished
        ivo.current_state().is_calculated(&ivo.channel_frame(ch), &handle)?;
    }
    proceed(ivo, next)
}

/// Terminal step: keep the requested output, release everything else
pub fn release_buffers(ivo: &mut Invocation<'_>, next: &[Step]) -> Result<BufferHandle> {
    debug_assert!(next.is_empty(), "steps after ReleaseBuffers are never run");
    let state: &dyn StateClosure = ivo.current_state();
    let kept = ivo.table()?.release_buffers(state, ivo.out_nr())?;
    trace!("node '{}' yields output #{}", ivo.node().name(), ivo.out_nr());
    Ok(kept)
}
