//! Concatenates laid-out regions into binary buffers.
//!
//! The assembler is the only stage that writes bytes and the only stage
//! that assigns final offsets. It consumes the [`BufferLayout`], so the
//! accessors and regions it hands back can no longer be re-laid-out.

use log::debug;

use crate::accessor::AccessorModel;
use crate::assembler_options::AssemblerOptions;
use crate::buffer_region::{BufferModel, BufferRegion};
use crate::entity_indices::{AccessorIndex, BufferIndex, RegionIndex};
use crate::layout::BufferLayout;
use crate::math_utils::{align_up, padding_for, round_up_to_4};
use crate::status::{invalid_reference, Status};

/// Read-only result of assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedBuffers {
    accessors: Vec<AccessorModel>,
    regions: Vec<BufferRegion>,
    buffers: Vec<BufferModel>,
}

impl PackedBuffers {
    pub fn accessors(&self) -> &[AccessorModel] {
        &self.accessors
    }

    pub fn regions(&self) -> &[BufferRegion] {
        &self.regions
    }

    pub fn buffers(&self) -> &[BufferModel] {
        &self.buffers
    }

    pub fn accessor(&self, index: AccessorIndex) -> Option<&AccessorModel> {
        self.accessors.get(index.index())
    }

    pub fn region(&self, index: RegionIndex) -> Option<&BufferRegion> {
        self.regions.get(index.index())
    }

    pub fn buffer(&self, index: BufferIndex) -> Option<&BufferModel> {
        self.buffers.get(index.index())
    }

    /// Offset of an accessor from the start of its buffer, if it was placed.
    pub fn absolute_byte_offset(&self, index: AccessorIndex) -> Option<usize> {
        let accessor = self.accessor(index)?;
        let region = self.region(accessor.region()?)?;
        Some(region.byte_offset() + accessor.byte_offset())
    }
}

pub struct BufferAssembler {
    options: AssemblerOptions,
}

impl Default for BufferAssembler {
    fn default() -> Self {
        Self::new(AssemblerOptions::default())
    }
}

impl BufferAssembler {
    pub fn new(options: AssemblerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }

    /// Writes every region, in creation order, into one or more buffers.
    ///
    /// Accessors that were never placed in a region are kept in the output
    /// (they stay addressable by index) but contribute no bytes.
    pub fn assemble(&self, layout: BufferLayout) -> Status<PackedBuffers> {
        let alignment = self.options.alignment();
        let (mut accessors, mut regions) = layout.into_parts();
        let mut buffers = vec![BufferModel::new()];

        for (region_pos, region) in regions.iter_mut().enumerate() {
            let region_index = RegionIndex::from(region_pos);

            let current_length = buffers.last().map_or(0, |b| b.byte_length());
            let growth = padded_growth(current_length, region, &accessors, alignment);
            if self
                .options
                .split_policy()
                .should_start_new_buffer(current_length, growth)
            {
                debug!(
                    "starting buffer {} before region {} ({} bytes in current buffer)",
                    buffers.len(),
                    region_index,
                    current_length
                );
                buffers.push(BufferModel::new());
            }
            let buffer_index = BufferIndex::from(buffers.len() - 1);
            let buffer = buffers
                .last_mut()
                .ok_or_else(|| invalid_reference("assembler has no open buffer"))?;

            let data = buffer.data_mut();
            pad_to(data, alignment);
            let region_start = data.len();

            for accessor_index in region.accessors() {
                let accessor = accessors.get_mut(accessor_index.index()).ok_or_else(|| {
                    invalid_reference(format!(
                        "region {} references missing accessor {}",
                        region_index, accessor_index
                    ))
                })?;
                accessor.check_raw_length(&format!("accessor {}", accessor_index))?;

                pad_to(data, alignment);
                accessor.set_byte_offset(data.len() - region_start);
                write_strided(data, accessor);
            }

            let region_length = data.len() - region_start;
            region.set_placement(buffer_index, region_start, region_length);
            buffer.push_region(region_index);
        }

        // Trailing padding keeps every buffer length a multiple of 4, which
        // GLB requires for its BIN chunk anyway.
        for buffer in &mut buffers {
            pad_to(buffer.data_mut(), 4);
        }
        debug!(
            "assembled {} regions into {} buffer(s): {:?} bytes",
            regions.len(),
            buffers.len(),
            buffers.iter().map(BufferModel::byte_length).collect::<Vec<_>>()
        );

        Ok(PackedBuffers {
            accessors,
            regions,
            buffers,
        })
    }
}

/// Bytes a buffer of `current_length` grows by when `region` is appended,
/// counting alignment padding and the trailing pad to 4.
fn padded_growth(
    current_length: usize,
    region: &BufferRegion,
    accessors: &[AccessorModel],
    alignment: usize,
) -> usize {
    let mut end = align_up(current_length, alignment);
    for accessor_index in region.accessors() {
        if let Some(accessor) = accessors.get(accessor_index.index()) {
            end = align_up(end, alignment) + accessor.strided_length();
        }
    }
    round_up_to_4(end) - current_length
}

fn pad_to(data: &mut Vec<u8>, alignment: usize) {
    let padding = padding_for(data.len(), alignment);
    data.resize(data.len() + padding, 0);
}

/// Appends an accessor's elements at its stride, zero-filling each slot.
fn write_strided(data: &mut Vec<u8>, accessor: &AccessorModel) {
    let element_size = accessor.element_size();
    let stride = accessor.byte_stride();
    if stride == element_size {
        data.extend_from_slice(accessor.raw_data());
        return;
    }
    let start = data.len();
    data.resize(start + accessor.strided_length(), 0);
    for (i, element) in accessor.raw_data().chunks_exact(element_size).enumerate() {
        let at = start + i * stride;
        data[at..at + element_size].copy_from_slice(element);
    }
}
