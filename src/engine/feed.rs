use crate::buffers::BufferHandle;
use crate::core::{FrameId, Result};
use std::sync::MutexGuard;

/// Buffers handed to a node operation for one processing call.
///
/// Each distinct buffer is locked once, so an in-place output and the input
/// it reuses map onto the same storage.
pub struct FeedManifold<'b> {
    frame: FrameId,
    guards: Vec<MutexGuard<'b, Vec<f64>>>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

impl<'b> FeedManifold<'b> {
    /// Lock the buffers of `inputs` and `outputs`, deduplicated by block
    pub fn assemble(
        frame: FrameId,
        inputs: &'b [BufferHandle],
        outputs: &'b [BufferHandle],
    ) -> Result<Self> {
        // fixed locking order across threads sharing cached blocks
        let mut distinct: Vec<&'b BufferHandle> = Vec::new();
        for handle in inputs.iter().chain(outputs) {
            if !distinct.iter().any(|h| h.block_id() == handle.block_id()) {
                distinct.push(handle);
            }
        }
        distinct.sort_by_key(|h| h.block_id());

        let guards = distinct
            .iter()
            .map(|&h| h.write())
            .collect::<Result<Vec<_>>>()?;
        let slot_of = |h: &BufferHandle| {
            distinct
                .iter()
                .position(|d| d.block_id() == h.block_id())
                .unwrap_or_default()
        };

        Ok(Self {
            frame,
            inputs: inputs.iter().map(slot_of).collect(),
            outputs: outputs.iter().map(slot_of).collect(),
            guards,
        })
    }

    /// Identity of the result being computed
    pub fn frame(&self) -> &FrameId {
        &self.frame
    }

    pub fn nr_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn nr_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn input(&self, idx: usize) -> &[f64] {
        &self.guards[self.inputs[idx]]
    }

    pub fn output(&mut self, idx: usize) -> &mut [f64] {
        &mut self.guards[self.outputs[idx]]
    }

    /// Whether output `idx` shares its buffer with some input
    pub fn is_inplace(&self, idx: usize) -> bool {
        self.inputs.contains(&self.outputs[idx])
    }

    /// `output[i] = f(input[i])` sample by sample, in place if both share a buffer
    pub fn apply(&mut self, input: usize, output: usize, mut f: impl FnMut(f64) -> f64) {
        let src = self.inputs[input];
        let dst = self.outputs[output];
        if src == dst {
            for sample in self.guards[dst].iter_mut() {
                *sample = f(*sample);
            }
            return;
        }

        let (src_buf, dst_buf) = if src < dst {
            let (lo, hi) = self.guards.split_at_mut(dst);
            (&lo[src], &mut hi[0])
        } else {
            let (lo, hi) = self.guards.split_at_mut(src);
            (&hi[0], &mut lo[dst])
        };
        for (out, sample) in dst_buf.iter_mut().zip(src_buf.iter()) {
            *out = f(*sample);
        }
    }

    /// Give `f` all inputs and one output at once.
    ///
    /// An input sharing its buffer with the output is passed as a snapshot
    /// taken before `f` runs.
    pub fn with_inputs<R>(
        &mut self,
        output: usize,
        f: impl FnOnce(&[&[f64]], &mut [f64]) -> R,
    ) -> R {
        let target = self.outputs[output];
        let snapshots: Vec<Option<Vec<f64>>> = self
            .inputs
            .iter()
            .map(|&slot| (slot == target).then(|| self.guards[slot].to_vec()))
            .collect();

        let (before, rest) = self.guards.split_at_mut(target);
        let (out, after) = rest.split_at_mut(1);
        let sources: Vec<&[f64]> = self
            .inputs
            .iter()
            .zip(&snapshots)
            .map(|(&slot, snapshot)| match snapshot {
                Some(copy) => copy.as_slice(),
                None if slot < target => before[slot].as_slice(),
                None => after[slot - target - 1].as_slice(),
            })
            .collect();
        f(&sources, out[0].as_mut_slice())
    }
}
