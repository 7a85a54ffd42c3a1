use crate::buffers::BufferHandle;
use crate::core::{EngineError, Result};
use crate::engine::StateClosure;
use log::error;
use std::cell::{Cell, RefCell};
use std::ops::Range;

/// Arena for the buffer tables of one calculation stream.
///
/// Tables are claimed in strict stack order by nested invocations; the
/// current level moves up on each claim and back down when the table drops.
pub struct BuffTableStorage {
    handles: RefCell<Vec<Option<BufferHandle>>>,
    buffers: RefCell<Vec<Option<u64>>>,
    level: Cell<usize>,
}

impl BuffTableStorage {
    pub fn new(capacity: usize) -> Self {
        Self {
            handles: RefCell::new(vec![None; capacity]),
            buffers: RefCell::new(vec![None; capacity]),
            level: Cell::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.handles.borrow().len()
    }

    /// First free slot; equals zero whenever no invocation is in progress
    pub fn level(&self) -> usize {
        self.level.get()
    }

    /// Carve a table for `nr_out` outputs followed by `nr_in` inputs
    pub fn claim(&self, nr_out: usize, nr_in: usize) -> Result<BufferTable<'_>> {
        let base = self.level.get();
        let requested = nr_out + nr_in;
        if base + requested > self.capacity() {
            return Err(EngineError::TableOverflow {
                requested,
                level: base,
                capacity: self.capacity(),
            });
        }

        let table = BufferTable {
            storage: self,
            out: base..base + nr_out,
            inp: base + nr_out..base + requested,
        };
        assert!(
            table.is_consistent(),
            "buffer table layout broken: out={:?} in={:?}",
            table.out,
            table.inp
        );
        self.level.set(base + requested);
        Ok(table)
    }
}

/// Logical output and input slots of one invocation.
///
/// Two parallel arrays are kept per slot: the buffer handle and the id of
/// the buffer it is bound to. Outputs occupy `[0, nr_out)`, inputs follow.
pub struct BufferTable<'s> {
    storage: &'s BuffTableStorage,
    out: Range<usize>,
    inp: Range<usize>,
}

impl<'s> BufferTable<'s> {
    pub fn nr_out(&self) -> usize {
        self.out.len()
    }

    pub fn nr_in(&self) -> usize {
        self.inp.len()
    }

    pub fn size(&self) -> usize {
        self.nr_out() + self.nr_in()
    }

    /// Absolute slot range of the outputs within the arena
    pub fn output_range(&self) -> Range<usize> {
        self.out.clone()
    }

    pub fn input_range(&self) -> Range<usize> {
        self.inp.clone()
    }

    pub fn is_consistent(&self) -> bool {
        self.out.start <= self.out.end
            && self.out.end == self.inp.start
            && self.inp.start <= self.inp.end
            && self.inp.end <= self.storage.capacity()
    }

    pub fn set_output(&self, idx: usize, handle: BufferHandle) {
        assert!(idx < self.nr_out(), "output slot #{} out of range", idx);
        self.bind(self.out.start + idx, handle);
    }

    pub fn set_input(&self, idx: usize, handle: BufferHandle) {
        assert!(idx < self.nr_in(), "input slot #{} out of range", idx);
        self.bind(self.inp.start + idx, handle);
    }

    pub fn output(&self, idx: usize) -> Option<BufferHandle> {
        if idx >= self.nr_out() {
            return None;
        }
        self.storage.handles.borrow()[self.out.start + idx].clone()
    }

    pub fn input(&self, idx: usize) -> Option<BufferHandle> {
        if idx >= self.nr_in() {
            return None;
        }
        self.storage.handles.borrow()[self.inp.start + idx].clone()
    }

    /// Id of the buffer bound to an output slot
    pub fn bound_output(&self, idx: usize) -> Option<u64> {
        if idx >= self.nr_out() {
            return None;
        }
        self.storage.buffers.borrow()[self.out.start + idx]
    }

    pub fn bound_input(&self, idx: usize) -> Option<u64> {
        if idx >= self.nr_in() {
            return None;
        }
        self.storage.buffers.borrow()[self.inp.start + idx]
    }

    /// All populated slots, outputs first
    pub fn populated(&self) -> Vec<BufferHandle> {
        let handles = self.storage.handles.borrow();
        handles[self.out.start..self.inp.end]
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Check every populated slot still refers to a usable buffer
    pub fn verify_buffers(&self) -> Result<()> {
        if self.populated().iter().all(|h| h.is_valid()) {
            Ok(())
        } else {
            Err(EngineError::InvalidHandle)
        }
    }

    /// Lock a fresh buffer for every output slot that does not hold one of
    /// its own, i.e. is unbound or shares its lease with an input slot.
    /// Returns the number of buffers locked.
    pub fn lock_buffers(
        &self,
        mut lock: impl FnMut() -> Result<BufferHandle>,
    ) -> Result<usize> {
        let mut locked = 0;
        for idx in 0..self.nr_out() {
            let owned = match self.output(idx) {
                Some(out) => !(0..self.nr_in())
                    .filter_map(|i| self.input(i))
                    .any(|input| input.same_lease(&out)),
                None => false,
            };
            if !owned {
                self.set_output(idx, lock()?);
                locked += 1;
            }
        }
        Ok(locked)
    }

    /// Release every distinct buffer lease in the table, except the one
    /// bound to output `retain`, which is returned.
    pub fn release_buffers(
        &self,
        state: &dyn StateClosure,
        retain: usize,
    ) -> Result<BufferHandle> {
        let kept = self
            .output(retain)
            .ok_or(EngineError::Logic("required output slot not populated"))?;

        let mut released: Vec<BufferHandle> = Vec::new();
        for handle in self.populated() {
            if handle.same_lease(&kept) || released.iter().any(|h| h.same_lease(&handle)) {
                continue;
            }
            state.release_buffer(&handle)?;
            released.push(handle);
        }
        Ok(kept)
    }

    /// Emergency cleanup after a failed invocation: release whatever is still
    /// valid, logging and ignoring failures.
    pub(crate) fn discard_buffers(&self, state: &dyn StateClosure) {
        let mut released: Vec<BufferHandle> = Vec::new();
        for handle in self.populated() {
            if !handle.is_valid() || released.iter().any(|h| h.same_lease(&handle)) {
                continue;
            }
            if let Err(e) = state.release_buffer(&handle) {
                error!("cleanup of buffer {} failed: {}", handle.block_id(), e);
            }
            released.push(handle);
        }
    }

    fn bind(&self, slot: usize, handle: BufferHandle) {
        self.storage.buffers.borrow_mut()[slot] = Some(handle.block_id());
        self.storage.handles.borrow_mut()[slot] = Some(handle);
    }
}

impl Drop for BufferTable<'_> {
    fn drop(&mut self) {
        let mut handles = self.storage.handles.borrow_mut();
        let mut buffers = self.storage.buffers.borrow_mut();
        for slot in self.out.start..self.inp.end {
            handles[slot] = None;
            buffers[slot] = None;
        }
        debug_assert_eq!(
            self.storage.level.get(),
            self.inp.end,
            "buffer tables released out of stack order"
        );
        self.storage.level.set(self.out.start);
    }
}
