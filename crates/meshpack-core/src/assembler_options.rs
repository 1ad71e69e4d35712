use std::fmt;
use std::sync::Arc;

/// Decides when the assembler starts a new buffer.
///
/// Regions are never split: the policy is asked once per region, before the
/// region is written, and a region always lands whole in one buffer.
pub trait BufferSplitPolicy: fmt::Debug + Send + Sync {
    /// `current_length` is the byte length of the buffer being filled,
    /// `region_length` how many bytes the buffer grows by if the next region
    /// is appended to it, alignment and trailing padding included.
    fn should_start_new_buffer(&self, current_length: usize, region_length: usize) -> bool;
}

/// Everything goes into one buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleBuffer;

impl BufferSplitPolicy for SingleBuffer {
    fn should_start_new_buffer(&self, _current_length: usize, _region_length: usize) -> bool {
        false
    }
}

/// Starts a new buffer when the next region would push a non-empty buffer
/// past the limit. A single region larger than the limit still gets its own
/// buffer.
#[derive(Debug, Clone, Copy)]
pub struct MaxBufferLength(pub usize);

impl BufferSplitPolicy for MaxBufferLength {
    fn should_start_new_buffer(&self, current_length: usize, region_length: usize) -> bool {
        current_length > 0 && current_length + region_length > self.0
    }
}

#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    alignment: usize,
    split_policy: Arc<dyn BufferSplitPolicy>,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            alignment: 4,
            split_policy: Arc::new(SingleBuffer),
        }
    }
}

impl AssemblerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Sets the absolute accessor alignment. Values below 4 are raised to 4,
    /// other values are rounded up to a multiple of 4.
    pub fn set_alignment(&mut self, alignment: usize) {
        self.alignment = crate::math_utils::round_up_to_4(alignment.max(4));
    }

    pub fn split_policy(&self) -> &dyn BufferSplitPolicy {
        self.split_policy.as_ref()
    }

    pub fn set_split_policy(&mut self, policy: impl BufferSplitPolicy + 'static) {
        self.split_policy = Arc::new(policy);
    }
}
