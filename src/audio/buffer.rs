//! Accumulation buffer for captured PCM chunks

/// Accumulates raw PCM chunks for the current recording session.
///
/// Chunks are kept in arrival order; the total sample count always equals
/// the sum of the chunk lengths.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    chunks: Vec<Vec<f32>>,
    active: bool,
}

impl CaptureBuffer {
    /// Create an empty, inactive buffer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunks: Vec::new(),
            active: false,
        }
    }

    /// Reset the buffer to empty and begin accepting chunks
    pub fn start(&mut self) {
        self.chunks.clear();
        self.active = true;
    }

    /// Append a chunk in arrival order.
    ///
    /// Chunks pushed while the session is inactive are dropped; delivery
    /// races with stop, so this is never fatal.
    pub fn push(&mut self, chunk: Vec<f32>) {
        if !self.active {
            tracing::warn!(samples = chunk.len(), "chunk dropped, session inactive");
            return;
        }
        self.chunks.push(chunk);
    }

    /// Mark the session inactive and take the accumulated chunks
    pub fn stop(&mut self) -> Vec<Vec<f32>> {
        self.active = false;
        std::mem::take(&mut self.chunks)
    }

    /// Whether the buffer is accepting chunks
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Total number of samples accumulated so far
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}
