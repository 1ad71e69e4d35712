//! Reads accessor data back out of assembled buffers.

use crate::buffer_assembler::PackedBuffers;
use crate::entity_indices::AccessorIndex;
use crate::status::{invalid_reference, LayoutError, Status};

/// Returns the tightly packed bytes of an accessor, gathered from its
/// buffer at `region offset + accessor offset + i * byte_stride`.
pub fn read_accessor_bytes(packed: &PackedBuffers, index: AccessorIndex) -> Status<Vec<u8>> {
    let accessor = packed
        .accessor(index)
        .ok_or_else(|| invalid_reference(format!("accessor {} does not exist", index)))?;
    let region_index = accessor
        .region()
        .ok_or_else(|| invalid_reference(format!("accessor {} was never placed", index)))?;
    let region = packed
        .region(region_index)
        .ok_or_else(|| invalid_reference(format!("region {} does not exist", region_index)))?;
    let buffer = packed
        .buffer(region.buffer())
        .ok_or_else(|| invalid_reference(format!("buffer {} does not exist", region.buffer())))?;

    let data = buffer.data();
    let start = region.byte_offset() + accessor.byte_offset();
    let element_size = accessor.element_size();
    let stride = accessor.byte_stride();

    let mut out = Vec::with_capacity(accessor.expected_raw_length());
    for i in 0..accessor.element_count() {
        let at = start + i * stride;
        let element = data.get(at..at + element_size).ok_or_else(|| {
            LayoutError::StructuralMismatch {
                context: format!("reading element {} of accessor {}", i, index),
                expected: at + element_size,
                actual: data.len(),
            }
        })?;
        out.extend_from_slice(element);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::AccessorModel;
    use crate::buffer_assembler::BufferAssembler;
    use crate::buffer_region::BufferUsage;
    use crate::component_types::ElementType;
    use crate::layout::BufferLayout;

    #[test]
    fn test_read_back_interleaved_region() {
        let mut layout = BufferLayout::new();
        let colors = AccessorModel::from_values(ElementType::Vec3, &[10u16, 11, 12, 13, 14, 15]).unwrap();
        let positions =
            AccessorModel::from_values(ElementType::Vec3, &[0.5f32, 1.5, 2.5, 3.5, 4.5, 5.5]).unwrap();
        let expected = [colors.raw_data().to_vec(), positions.raw_data().to_vec()];
        let a = layout.add_accessor(colors);
        let b = layout.add_accessor(positions);
        layout.add_region(BufferUsage::Vertex, vec![a, b]).unwrap();

        let packed = BufferAssembler::default().assemble(layout).unwrap();
        assert_eq!(read_accessor_bytes(&packed, a).unwrap(), expected[0]);
        assert_eq!(read_accessor_bytes(&packed, b).unwrap(), expected[1]);
    }

    #[test]
    fn test_read_unplaced_accessor_fails() {
        let mut layout = BufferLayout::new();
        let a = layout.add_accessor(AccessorModel::from_values(ElementType::Scalar, &[1u32]).unwrap());
        let packed = BufferAssembler::default().assemble(layout).unwrap();
        assert!(read_accessor_bytes(&packed, a).is_err());
        assert!(read_accessor_bytes(&packed, AccessorIndex(3)).is_err());
    }
}
