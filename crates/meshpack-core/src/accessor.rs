use crate::component_types::{
    column_stride, component_byte_offsets, element_size_bytes, ComponentType, ComponentValue,
    ElementType,
};
use crate::entity_indices::RegionIndex;
use crate::status::{LayoutError, Status};

/// A typed view over raw little-endian bytes.
///
/// `raw_data` is tightly packed (element after element, matrix columns
/// padded to 4 bytes) until the assembler copies it into its final,
/// possibly strided, place. `byte_offset`, `byte_stride` and `region` are
/// owned by the layout stages and are read-only for everyone else.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorModel {
    component_type: ComponentType,
    element_type: ElementType,
    element_count: usize,
    normalized: bool,
    byte_offset: usize,
    byte_stride: usize,
    region: Option<RegionIndex>,
    raw_data: Vec<u8>,
}

impl AccessorModel {
    /// Creates an accessor, checking the raw byte length against the shape.
    pub fn new(
        component_type: ComponentType,
        element_type: ElementType,
        element_count: usize,
        raw_data: Vec<u8>,
    ) -> Status<Self> {
        let accessor = Self {
            component_type,
            element_type,
            element_count,
            normalized: false,
            byte_offset: 0,
            byte_stride: element_size_bytes(component_type, element_type),
            region: None,
            raw_data,
        };
        accessor.check_raw_length("new accessor")?;
        Ok(accessor)
    }

    /// Packs typed component values into a new accessor.
    ///
    /// `values` holds `element_count * num_components` entries; matrix
    /// columns receive their padding here.
    pub fn from_values<T: ComponentValue>(element_type: ElementType, values: &[T]) -> Status<Self> {
        let component_type = T::COMPONENT_TYPE;
        let num_components = element_type.num_components();
        if values.len() % num_components != 0 {
            return Err(LayoutError::StructuralMismatch {
                context: format!("{} values for {}", values.len(), element_type),
                expected: (values.len() / num_components + 1) * num_components,
                actual: values.len(),
            });
        }
        let element_count = values.len() / num_components;
        let element_size = element_size_bytes(component_type, element_type);
        let offsets = component_byte_offsets(component_type, element_type);

        let mut raw_data = vec![0u8; element_count * element_size];
        for (element, chunk) in values.chunks(num_components).enumerate() {
            let base = element * element_size;
            for (value, offset) in chunk.iter().zip(&offsets) {
                let bytes = num_traits::ToBytes::to_le_bytes(value);
                let bytes = bytes.as_ref();
                raw_data[base + offset..base + offset + bytes.len()].copy_from_slice(bytes);
            }
        }
        Self::new(component_type, element_type, element_count, raw_data)
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    /// Offset inside the owning region.
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_stride(&self) -> usize {
        self.byte_stride
    }

    pub fn region(&self) -> Option<RegionIndex> {
        self.region
    }

    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    pub fn element_size(&self) -> usize {
        element_size_bytes(self.component_type, self.element_type)
    }

    pub fn expected_raw_length(&self) -> usize {
        self.element_count * self.element_size()
    }

    /// Bytes the accessor occupies inside its region once strided.
    ///
    /// The last element only needs its own size, not a full stride, but
    /// regions reserve full strides so interleave blocks stay aligned.
    pub fn strided_length(&self) -> usize {
        self.element_count * self.byte_stride
    }

    pub fn check_raw_length(&self, context: &str) -> Status<()> {
        let expected = self.expected_raw_length();
        if self.raw_data.len() != expected {
            return Err(LayoutError::StructuralMismatch {
                context: format!(
                    "{} ({} x {:?} {})",
                    context, self.element_count, self.component_type, self.element_type
                ),
                expected,
                actual: self.raw_data.len(),
            });
        }
        Ok(())
    }

    /// Per-component minimum and maximum over all elements.
    ///
    /// Returns empty vectors for an accessor without elements.
    pub fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        if self.element_count == 0 {
            return (Vec::new(), Vec::new());
        }
        let offsets = component_byte_offsets(self.component_type, self.element_type);
        let size = self.element_size();
        let mut min = vec![f64::INFINITY; offsets.len()];
        let mut max = vec![f64::NEG_INFINITY; offsets.len()];
        for element in self.raw_data.chunks_exact(size) {
            for (c, offset) in offsets.iter().enumerate() {
                let value = element
                    .get(*offset..)
                    .and_then(|bytes| self.component_type.read_as_f64(bytes));
                if let Some(value) = value {
                    min[c] = min[c].min(value);
                    max[c] = max[c].max(value);
                }
            }
        }
        (min, max)
    }

    /// Byte distance between matrix columns; element size for other shapes.
    pub fn column_stride(&self) -> usize {
        column_stride(self.component_type, self.element_type)
    }

    pub(crate) fn set_placement(&mut self, region: RegionIndex, byte_offset: usize, byte_stride: usize) {
        self.region = Some(region);
        self.byte_offset = byte_offset;
        self.byte_stride = byte_stride;
    }

    pub(crate) fn set_byte_offset(&mut self, byte_offset: usize) {
        self.byte_offset = byte_offset;
    }
}
