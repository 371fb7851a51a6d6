/// Bounded free-list of pixel buffers recycled between raster recomputes.
pub struct BufferPool {
    buffers: Vec<Vec<u8>>,
    max_capacity: usize,
}

impl BufferPool {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_capacity),
            max_capacity,
        }
    }

    /// Hands out a zeroed buffer of `length` bytes, reusing a released one when available.
    pub fn checkout(&mut self, length: usize) -> Vec<u8> {
        match self.buffers.pop() {
            Some(mut buffer) => {
                buffer.clear();
                buffer.resize(length, 0);
                buffer
            }
            None => vec![0; length],
        }
    }

    /// Returns a buffer to the pool; dropped if the pool is full.
    pub fn release(&mut self, mut buffer: Vec<u8>) {
        buffer.clear();
        if self.buffers.len() < self.max_capacity {
            self.buffers.push(buffer);
        }
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        self.buffers.len()
    }
}
