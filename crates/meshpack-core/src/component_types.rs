//! Type registry: component types, element shapes and their byte sizes.
//!
//! glTF stores matrices column by column and requires every column to start
//! on a 4-byte boundary. For 1- and 2-byte components this inserts padding
//! inside a single element, so the element size is not simply
//! `component size * component count`.

use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};

use crate::math_utils::{exact_sqrt, round_up_to_4};
use crate::status::{unsupported_shape, LayoutError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Uint32,
    Float32,
}

impl ComponentType {
    pub fn byte_length(&self) -> usize {
        match self {
            ComponentType::Int8 | ComponentType::Uint8 => 1,
            ComponentType::Int16 | ComponentType::Uint16 => 2,
            ComponentType::Uint32 | ComponentType::Float32 => 4,
        }
    }

    /// The OpenGL enum value glTF uses for `componentType`.
    pub fn gl_code(&self) -> u32 {
        match self {
            ComponentType::Int8 => 5120,
            ComponentType::Uint8 => 5121,
            ComponentType::Int16 => 5122,
            ComponentType::Uint16 => 5123,
            ComponentType::Uint32 => 5125,
            ComponentType::Float32 => 5126,
        }
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self,
            ComponentType::Uint8 | ComponentType::Uint16 | ComponentType::Uint32
        )
    }

    /// Decodes one little-endian component from the start of `bytes`.
    ///
    /// Returns `None` when `bytes` is shorter than one component.
    pub fn read_as_f64(&self, bytes: &[u8]) -> Option<f64> {
        let bytes = bytes.get(..self.byte_length())?;
        let value = match self {
            ComponentType::Int8 => bytes[0] as i8 as f64,
            ComponentType::Uint8 => bytes[0] as f64,
            ComponentType::Int16 => LittleEndian::read_i16(bytes) as f64,
            ComponentType::Uint16 => LittleEndian::read_u16(bytes) as f64,
            ComponentType::Uint32 => LittleEndian::read_u32(bytes) as f64,
            ComponentType::Float32 => LittleEndian::read_f32(bytes) as f64,
        };
        Some(value)
    }
}

impl TryFrom<u32> for ComponentType {
    type Error = LayoutError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            5120 => Ok(ComponentType::Int8),
            5121 => Ok(ComponentType::Uint8),
            5122 => Ok(ComponentType::Int16),
            5123 => Ok(ComponentType::Uint16),
            5125 => Ok(ComponentType::Uint32),
            5126 => Ok(ComponentType::Float32),
            _ => Err(unsupported_shape(format!("unknown component type {}", code))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub fn num_components(&self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 | ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, ElementType::Mat2 | ElementType::Mat3 | ElementType::Mat4)
    }

    /// Columns of a matrix shape; vectors and scalars count as one column.
    pub fn num_columns(&self) -> usize {
        if self.is_matrix() {
            exact_sqrt(self.num_components()).unwrap_or(1)
        } else {
            1
        }
    }

    /// Rows per column (the full component count for non-matrix shapes).
    pub fn num_rows(&self) -> usize {
        self.num_components() / self.num_columns()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Scalar => "SCALAR",
            ElementType::Vec2 => "VEC2",
            ElementType::Vec3 => "VEC3",
            ElementType::Vec4 => "VEC4",
            ElementType::Mat2 => "MAT2",
            ElementType::Mat3 => "MAT3",
            ElementType::Mat4 => "MAT4",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCALAR" => Ok(ElementType::Scalar),
            "VEC2" => Ok(ElementType::Vec2),
            "VEC3" => Ok(ElementType::Vec3),
            "VEC4" => Ok(ElementType::Vec4),
            "MAT2" => Ok(ElementType::Mat2),
            "MAT3" => Ok(ElementType::Mat3),
            "MAT4" => Ok(ElementType::Mat4),
            _ => Err(unsupported_shape(format!("unknown element type {:?}", s))),
        }
    }
}

/// Byte distance between the starts of two matrix columns.
///
/// For non-matrix shapes this is the whole element size.
pub fn column_stride(component_type: ComponentType, element_type: ElementType) -> usize {
    let column_bytes = element_type.num_rows() * component_type.byte_length();
    if element_type.is_matrix() {
        round_up_to_4(column_bytes)
    } else {
        column_bytes
    }
}

/// Size in bytes of one element, including matrix column padding.
///
/// # Examples
/// ```
/// use meshpack_core::component_types::{element_size_bytes, ComponentType, ElementType};
/// assert_eq!(element_size_bytes(ComponentType::Float32, ElementType::Vec3), 12);
/// assert_eq!(element_size_bytes(ComponentType::Uint8, ElementType::Mat2), 8);
/// assert_eq!(element_size_bytes(ComponentType::Uint8, ElementType::Mat3), 12);
/// assert_eq!(element_size_bytes(ComponentType::Int16, ElementType::Mat3), 24);
/// ```
pub fn element_size_bytes(component_type: ComponentType, element_type: ElementType) -> usize {
    element_type.num_columns() * column_stride(component_type, element_type)
}

/// Byte offset of every component inside one element, in storage order,
/// skipping column padding.
pub fn component_byte_offsets(
    component_type: ComponentType,
    element_type: ElementType,
) -> Vec<usize> {
    let stride = column_stride(component_type, element_type);
    let size = component_type.byte_length();
    (0..element_type.num_columns())
        .flat_map(|column| {
            (0..element_type.num_rows()).map(move |row| column * stride + row * size)
        })
        .collect()
}

/// Rust numeric types that map onto a glTF component type.
pub trait ComponentValue: num_traits::ToBytes + Copy {
    const COMPONENT_TYPE: ComponentType;
}

macro_rules! impl_component_value {
    ($t:ty, $ct:expr) => {
        impl ComponentValue for $t {
            const COMPONENT_TYPE: ComponentType = $ct;
        }
    };
}

impl_component_value!(i8, ComponentType::Int8);
impl_component_value!(u8, ComponentType::Uint8);
impl_component_value!(i16, ComponentType::Int16);
impl_component_value!(u16, ComponentType::Uint16);
impl_component_value!(u32, ComponentType::Uint32);
impl_component_value!(f32, ComponentType::Float32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_and_vector_sizes() {
        assert_eq!(element_size_bytes(ComponentType::Uint8, ElementType::Vec3), 3);
        assert_eq!(element_size_bytes(ComponentType::Uint16, ElementType::Vec3), 6);
        assert_eq!(element_size_bytes(ComponentType::Uint32, ElementType::Scalar), 4);
        assert_eq!(element_size_bytes(ComponentType::Float32, ElementType::Vec4), 16);
    }

    #[test]
    fn test_matrix_column_padding() {
        // 2 columns * round_up_to_4(2 * 1)
        assert_eq!(element_size_bytes(ComponentType::Int8, ElementType::Mat2), 8);
        // 3 columns * round_up_to_4(3 * 2)
        assert_eq!(element_size_bytes(ComponentType::Uint16, ElementType::Mat3), 24);
        assert_eq!(element_size_bytes(ComponentType::Int16, ElementType::Mat4), 32);
        assert_eq!(element_size_bytes(ComponentType::Float32, ElementType::Mat4), 64);
        assert_eq!(element_size_bytes(ComponentType::Float32, ElementType::Mat3), 36);
    }

    #[test]
    fn test_component_offsets_skip_padding() {
        assert_eq!(
            component_byte_offsets(ComponentType::Uint8, ElementType::Mat2),
            vec![0, 1, 4, 5]
        );
        assert_eq!(
            component_byte_offsets(ComponentType::Float32, ElementType::Vec3),
            vec![0, 4, 8]
        );
    }

    #[test]
    fn test_gl_codes() {
        for ct in [
            ComponentType::Int8,
            ComponentType::Uint8,
            ComponentType::Int16,
            ComponentType::Uint16,
            ComponentType::Uint32,
            ComponentType::Float32,
        ] {
            assert_eq!(ComponentType::try_from(ct.gl_code()), Ok(ct));
        }
        assert!(matches!(
            ComponentType::try_from(5124),
            Err(LayoutError::UnsupportedElementShape(_))
        ));
    }

    #[test]
    fn test_element_type_names() {
        assert_eq!("MAT4".parse::<ElementType>(), Ok(ElementType::Mat4));
        assert_eq!(ElementType::Vec2.to_string(), "VEC2");
        assert!("VEC5".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_read_as_f64() {
        assert_eq!(ComponentType::Int8.read_as_f64(&[0xFF]), Some(-1.0));
        assert_eq!(ComponentType::Uint16.read_as_f64(&[0x34, 0x12, 0x99]), Some(4660.0));
        assert_eq!(ComponentType::Float32.read_as_f64(&1.5f32.to_le_bytes()), Some(1.5));
    }

    #[test]
    fn test_read_as_f64_short_slice() {
        assert_eq!(ComponentType::Uint8.read_as_f64(&[]), None);
        assert_eq!(ComponentType::Uint16.read_as_f64(&[0x34]), None);
        assert_eq!(ComponentType::Float32.read_as_f64(&[0, 0, 0]), None);
    }
}
