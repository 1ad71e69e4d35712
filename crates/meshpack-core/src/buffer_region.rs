use crate::entity_indices::{AccessorIndex, BufferIndex, RegionIndex};

/// How the bytes of a region are consumed; decides the stride rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex attributes (including morph-target attributes). Shares one
    /// declared stride across the region.
    Vertex,
    /// Element indices. No stride is declared.
    Index,
    /// Everything else: animation keyframes, inverse bind matrices.
    Generic,
}

impl BufferUsage {
    /// glTF `bufferView.target`, if the usage has one.
    pub fn gl_target(&self) -> Option<u32> {
        match self {
            BufferUsage::Vertex => Some(34962),
            BufferUsage::Index => Some(34963),
            BufferUsage::Generic => None,
        }
    }
}

/// A contiguous byte span ("buffer view") inside one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferRegion {
    usage: BufferUsage,
    buffer: BufferIndex,
    byte_offset: usize,
    byte_length: usize,
    declared_stride: Option<usize>,
    accessors: Vec<AccessorIndex>,
}

impl BufferRegion {
    pub(crate) fn new(
        usage: BufferUsage,
        accessors: Vec<AccessorIndex>,
        declared_stride: Option<usize>,
        byte_length: usize,
    ) -> Self {
        Self {
            usage,
            buffer: BufferIndex(0),
            byte_offset: 0,
            byte_length,
            declared_stride,
            accessors,
        }
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn buffer(&self) -> BufferIndex {
        self.buffer
    }

    /// Offset into the owning buffer.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Stride shared by every accessor in a vertex region; `None` otherwise.
    pub fn declared_stride(&self) -> Option<usize> {
        self.declared_stride
    }

    pub fn accessors(&self) -> &[AccessorIndex] {
        &self.accessors
    }

    pub(crate) fn set_placement(&mut self, buffer: BufferIndex, byte_offset: usize, byte_length: usize) {
        self.buffer = buffer;
        self.byte_offset = byte_offset;
        self.byte_length = byte_length;
    }
}

/// An assembled binary blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferModel {
    regions: Vec<RegionIndex>,
    data: Vec<u8>,
}

impl BufferModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    pub fn regions(&self) -> &[RegionIndex] {
        &self.regions
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    pub(crate) fn push_region(&mut self, region: RegionIndex) {
        self.regions.push(region);
    }
}
