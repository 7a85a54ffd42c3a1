use std::sync::{Arc, Mutex};

/// Recycles sample storage between buffer leases.
///
/// Cloning yields another handle to the same free list.
pub struct BufferPool {
    buffers: Arc<Mutex<Vec<Vec<f64>>>>,
    max_retained: usize,
}

impl BufferPool {
    pub fn new(max_retained: usize) -> Self {
        Self {
            buffers: Arc::new(Mutex::new(Vec::new())),
            max_retained,
        }
    }

    /// Zeroed storage of `size` samples, reusing a recycled allocation if possible
    pub fn get(&self, size: usize) -> Vec<f64> {
        let mut buffers = self
            .buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut buffer = buffers.pop().unwrap_or_else(|| Vec::with_capacity(size));
        buffer.clear();
        buffer.resize(size, 0.0);
        buffer
    }

    pub fn recycle(&self, mut buffer: Vec<f64>) {
        if buffer.capacity() == 0 {
            return;
        }
        buffer.clear();
        let mut buffers = self
            .buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if buffers.len() < self.max_retained {
            buffers.push(buffer);
        }
    }

    pub fn pool_size(&self) -> usize {
        self.buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Clone for BufferPool {
    fn clone(&self) -> Self {
        Self {
            buffers: self.buffers.clone(),
            max_retained: self.max_retained,
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(64)
    }
}
