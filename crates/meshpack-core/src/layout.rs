//! Stride and offset assignment for accessors sharing a buffer region.
//!
//! Vertex regions declare one stride for all of their accessors:
//! `round_up_to_4(max element size)`. Each accessor then occupies a block of
//! `element_count * stride` bytes, blocks following each other in input
//! order, so element `i` of any accessor lives at `offset + i * stride`.
//!
//! Index and generic regions declare no stride. Accessors keep their natural
//! element size as stride and are packed back to back; the assembler later
//! pads between them so each one starts on an aligned absolute offset.

use log::{debug, trace};

use crate::accessor::AccessorModel;
use crate::buffer_region::{BufferRegion, BufferUsage};
use crate::component_types::ElementType;
use crate::entity_indices::{AccessorIndex, RegionIndex};
use crate::math_utils::round_up_to_4;
use crate::status::{invalid_reference, unsupported_shape, Status};

/// Placement of one accessor relative to the start of its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorPlacement {
    pub byte_offset: usize,
    pub byte_stride: usize,
}

/// Result of laying out one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLayout {
    pub declared_stride: Option<usize>,
    pub placements: Vec<AccessorPlacement>,
    /// Length before any assembler padding.
    pub byte_length: usize,
}

/// Computes strides and relative offsets for accessors in discovery order.
pub fn compute_region_layout(usage: BufferUsage, accessors: &[&AccessorModel]) -> Status<RegionLayout> {
    match usage {
        BufferUsage::Vertex => Ok(vertex_layout(accessors)),
        BufferUsage::Index => {
            for (i, accessor) in accessors.iter().enumerate() {
                check_index_shape(i, accessor)?;
            }
            Ok(packed_layout(accessors))
        }
        BufferUsage::Generic => Ok(packed_layout(accessors)),
    }
}

fn vertex_layout(accessors: &[&AccessorModel]) -> RegionLayout {
    let max_element_size = accessors.iter().map(|a| a.element_size()).max().unwrap_or(0);
    let stride = round_up_to_4(max_element_size);

    let mut placements = Vec::with_capacity(accessors.len());
    let mut offset = 0;
    for accessor in accessors {
        placements.push(AccessorPlacement {
            byte_offset: offset,
            byte_stride: stride,
        });
        offset += accessor.element_count() * stride;
    }

    RegionLayout {
        declared_stride: Some(stride),
        placements,
        byte_length: offset,
    }
}

fn packed_layout(accessors: &[&AccessorModel]) -> RegionLayout {
    let mut placements = Vec::with_capacity(accessors.len());
    let mut offset = 0;
    for accessor in accessors {
        let stride = accessor.element_size();
        placements.push(AccessorPlacement {
            byte_offset: offset,
            byte_stride: stride,
        });
        offset += accessor.element_count() * stride;
    }

    RegionLayout {
        declared_stride: None,
        placements,
        byte_length: offset,
    }
}

fn check_index_shape(position: usize, accessor: &AccessorModel) -> Status<()> {
    if accessor.element_type() != ElementType::Scalar
        || !accessor.component_type().is_unsigned_integer()
    {
        return Err(unsupported_shape(format!(
            "index accessor #{} in region is {:?} {}, expected unsigned SCALAR",
            position,
            accessor.component_type(),
            accessor.element_type()
        )));
    }
    Ok(())
}

/// Builder-owned arena of accessors and the regions they are laid out in.
///
/// Accessors are added first, then grouped into regions. Adding a region
/// fixes the stride and relative offset of each member; the assembler
/// consumes the whole layout afterwards.
#[derive(Debug, Default, Clone)]
pub struct BufferLayout {
    accessors: Vec<AccessorModel>,
    regions: Vec<BufferRegion>,
}

impl BufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_accessor(&mut self, accessor: AccessorModel) -> AccessorIndex {
        let index = AccessorIndex::from(self.accessors.len());
        self.accessors.push(accessor);
        index
    }

    /// Groups accessors into a new region and lays them out.
    ///
    /// Every accessor must exist and must not already belong to a region.
    pub fn add_region(&mut self, usage: BufferUsage, members: Vec<AccessorIndex>) -> Status<RegionIndex> {
        for (i, index) in members.iter().enumerate() {
            let accessor = self.accessors.get(index.index()).ok_or_else(|| {
                invalid_reference(format!("region member accessor {} does not exist", index))
            })?;
            if let Some(region) = accessor.region() {
                return Err(invalid_reference(format!(
                    "accessor {} is already placed in region {}",
                    index, region
                )));
            }
            if members[..i].contains(index) {
                return Err(invalid_reference(format!(
                    "accessor {} listed twice in one region",
                    index
                )));
            }
        }

        let layout = {
            let views: Vec<&AccessorModel> =
                members.iter().map(|i| &self.accessors[i.index()]).collect();
            compute_region_layout(usage, &views)?
        };

        let region_index = RegionIndex::from(self.regions.len());
        for (index, placement) in members.iter().zip(&layout.placements) {
            trace!(
                "accessor {} -> region {} offset {} stride {}",
                index,
                region_index,
                placement.byte_offset,
                placement.byte_stride
            );
            self.accessors[index.index()].set_placement(
                region_index,
                placement.byte_offset,
                placement.byte_stride,
            );
        }
        debug!(
            "region {} ({:?}): {} accessors, {} bytes, stride {:?}",
            region_index,
            usage,
            members.len(),
            layout.byte_length,
            layout.declared_stride
        );
        self.regions.push(BufferRegion::new(
            usage,
            members,
            layout.declared_stride,
            layout.byte_length,
        ));
        Ok(region_index)
    }

    pub fn accessor(&self, index: AccessorIndex) -> Option<&AccessorModel> {
        self.accessors.get(index.index())
    }

    pub fn accessors(&self) -> &[AccessorModel] {
        &self.accessors
    }

    pub fn regions(&self) -> &[BufferRegion] {
        &self.regions
    }

    pub fn num_accessors(&self) -> usize {
        self.accessors.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<AccessorModel>, Vec<BufferRegion>) {
        (self.accessors, self.regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_types::ComponentType;

    fn accessor(ct: ComponentType, et: ElementType, count: usize) -> AccessorModel {
        let size = crate::component_types::element_size_bytes(ct, et);
        AccessorModel::new(ct, et, count, vec![0; size * count]).unwrap()
    }

    #[test]
    fn test_single_float_vec3_vertex_stride() {
        let a = accessor(ComponentType::Float32, ElementType::Vec3, 3);
        let layout = compute_region_layout(BufferUsage::Vertex, &[&a]).unwrap();
        assert_eq!(layout.declared_stride, Some(12));
        assert_eq!(layout.placements[0].byte_stride, 12);
    }

    #[test]
    fn test_single_byte_vec3_vertex_stride_is_rounded() {
        let a = accessor(ComponentType::Uint8, ElementType::Vec3, 5);
        let layout = compute_region_layout(BufferUsage::Vertex, &[&a]).unwrap();
        assert_eq!(layout.declared_stride, Some(4));
        assert_eq!(layout.byte_length, 20);
    }

    #[test]
    fn test_co_resident_vertex_accessors_share_max_stride() {
        let a = accessor(ComponentType::Uint16, ElementType::Vec3, 4); // 6 bytes
        let b = accessor(ComponentType::Float32, ElementType::Vec3, 4); // 12 bytes
        let layout = compute_region_layout(BufferUsage::Vertex, &[&a, &b]).unwrap();
        assert_eq!(layout.declared_stride, Some(12));
        assert_eq!(layout.placements[0], AccessorPlacement { byte_offset: 0, byte_stride: 12 });
        assert_eq!(layout.placements[1], AccessorPlacement { byte_offset: 48, byte_stride: 12 });
        assert_eq!(layout.byte_length, 96);
    }

    #[test]
    fn test_index_region_keeps_natural_stride() {
        let a = accessor(ComponentType::Uint16, ElementType::Scalar, 3);
        let b = accessor(ComponentType::Uint32, ElementType::Scalar, 3);
        let layout = compute_region_layout(BufferUsage::Index, &[&a, &b]).unwrap();
        assert_eq!(layout.declared_stride, None);
        assert_eq!(layout.placements[0], AccessorPlacement { byte_offset: 0, byte_stride: 2 });
        assert_eq!(layout.placements[1], AccessorPlacement { byte_offset: 6, byte_stride: 4 });
    }

    #[test]
    fn test_index_region_rejects_float_vectors() {
        let a = accessor(ComponentType::Float32, ElementType::Vec3, 3);
        let err = compute_region_layout(BufferUsage::Index, &[&a]).unwrap_err();
        assert!(matches!(err, crate::status::LayoutError::UnsupportedElementShape(_)));
    }

    #[test]
    fn test_generic_region_matrix_stride() {
        let a = accessor(ComponentType::Float32, ElementType::Mat4, 2);
        let layout = compute_region_layout(BufferUsage::Generic, &[&a]).unwrap();
        assert_eq!(layout.declared_stride, None);
        assert_eq!(layout.placements[0].byte_stride, 64);
    }

    #[test]
    fn test_add_region_writes_placements() {
        let mut layout = BufferLayout::new();
        let a = layout.add_accessor(accessor(ComponentType::Uint8, ElementType::Vec2, 2));
        let b = layout.add_accessor(accessor(ComponentType::Float32, ElementType::Vec2, 2));
        let region = layout.add_region(BufferUsage::Vertex, vec![a, b]).unwrap();

        assert_eq!(region, RegionIndex(0));
        let acc_b = layout.accessor(b).unwrap();
        assert_eq!(acc_b.region(), Some(region));
        assert_eq!(acc_b.byte_stride(), 8);
        assert_eq!(acc_b.byte_offset(), 16);
        assert_eq!(layout.regions()[0].declared_stride(), Some(8));
    }

    #[test]
    fn test_add_region_rejects_double_placement() {
        let mut layout = BufferLayout::new();
        let a = layout.add_accessor(accessor(ComponentType::Float32, ElementType::Vec3, 1));
        layout.add_region(BufferUsage::Vertex, vec![a]).unwrap();
        assert!(layout.add_region(BufferUsage::Vertex, vec![a]).is_err());
        assert!(layout
            .add_region(BufferUsage::Generic, vec![AccessorIndex(5)])
            .is_err());
    }
}
