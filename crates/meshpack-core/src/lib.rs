//! meshpack core
//!
//! Buffer and accessor layout for glTF 2.0 binary data: a registry of
//! component and element types, the per-region stride and offset algorithm,
//! and the assembler that concatenates regions into aligned buffers.
//!
//! ```
//! use meshpack_core::{AccessorModel, BufferAssembler, BufferLayout, BufferUsage, ElementType};
//!
//! let mut layout = BufferLayout::new();
//! let positions = layout.add_accessor(
//!     AccessorModel::from_values(ElementType::Vec3, &[0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap(),
//! );
//! layout.add_region(BufferUsage::Vertex, vec![positions]).unwrap();
//!
//! let packed = BufferAssembler::default().assemble(layout).unwrap();
//! assert_eq!(packed.accessor(positions).unwrap().byte_stride(), 12);
//! assert_eq!(packed.buffers()[0].byte_length(), 24);
//! ```

pub mod accessor;
pub mod accessor_reader;
pub mod assembler_options;
pub mod buffer_assembler;
pub mod buffer_region;
pub mod component_types;
pub mod entity_indices;
pub mod layout;
pub mod math_utils;
pub mod status;

pub use accessor::AccessorModel;
pub use accessor_reader::read_accessor_bytes;
pub use assembler_options::{AssemblerOptions, BufferSplitPolicy, MaxBufferLength, SingleBuffer};
pub use buffer_assembler::{BufferAssembler, PackedBuffers};
pub use buffer_region::{BufferModel, BufferRegion, BufferUsage};
pub use component_types::{element_size_bytes, ComponentType, ComponentValue, ElementType};
pub use entity_indices::{AccessorIndex, BufferIndex, RegionIndex};
pub use layout::{compute_region_layout, AccessorPlacement, BufferLayout, RegionLayout};
pub use status::{LayoutError, Status};
