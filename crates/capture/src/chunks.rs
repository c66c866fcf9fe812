use std::cell::RefCell;
use std::rc::Rc;

/// An opaque piece of encoded output.
pub trait MediaChunk {
    fn byte_len(&self) -> u64;
}

impl MediaChunk for Vec<u8> {
    fn byte_len(&self) -> u64 {
        self.len() as u64
    }
}

/// Append-only list of chunks for one recording.
#[derive(Debug)]
pub struct ChunkBuffer<C> {
    chunks: Vec<C>,
    total_bytes: u64,
}

impl<C> Default for ChunkBuffer<C> {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            total_bytes: 0,
        }
    }
}

impl<C: MediaChunk> ChunkBuffer<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty chunks are dropped.
    pub fn push(&mut self, chunk: C) {
        let len = chunk.byte_len();
        if len == 0 {
            return;
        }
        self.total_bytes += len;
        self.chunks.push(chunk);
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    /// Move all chunks out, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<C> {
        self.total_bytes = 0;
        std::mem::take(&mut self.chunks)
    }
}

/// Buffer shared between the encoder's data callback and the controller.
pub type SharedChunks<C> = Rc<RefCell<ChunkBuffer<C>>>;

pub fn shared_chunks<C: MediaChunk>() -> SharedChunks<C> {
    Rc::new(RefCell::new(ChunkBuffer::new()))
}

#[cfg(test)]
mod tests {
    use super::ChunkBuffer;

    #[test]
    fn total_grows_monotonically() {
        let mut buf = ChunkBuffer::new();
        let mut last = 0;
        for n in [3usize, 0, 5, 1] {
            buf.push(vec![0u8; n]);
            assert!(buf.total_bytes() >= last);
            last = buf.total_bytes();
        }
        assert_eq!(buf.total_bytes(), 9);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn take_resets() {
        let mut buf = ChunkBuffer::new();
        buf.push(vec![1u8, 2]);
        let out = buf.take();
        assert_eq!(out, vec![vec![1u8, 2]]);
        assert!(buf.is_empty());
        assert_eq!(buf.total_bytes(), 0);
    }
}
