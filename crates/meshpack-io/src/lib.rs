//! meshpack I/O
//!
//! Turns an arena-backed scene graph into a packed glTF 2.0 model and writes
//! it out.
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Input | [`scene`] | [`SceneGraph`] with typed ids |
//! | Collect | [`collector`] | deduplicated entities plus a `BufferLayout` |
//! | Build | [`model_builder`] | [`PackedModel`] |
//! | Write | [`gltf_writer`] | `.glb`, `.gltf` + `.bin`, or embedded `.gltf` |
//!
//! Entities are deduplicated by identity: a primitive, mesh or accessor
//! referenced from several places is emitted once and referenced by index
//! everywhere else.
//!
//! ```ignore
//! use meshpack_core::{AccessorModel, ElementType};
//! use meshpack_io::scene::{Mesh, Node, Primitive, Scene, SceneGraph};
//! use meshpack_io::{BuildOptions, GltfWriter, ModelBuilder};
//!
//! let mut graph = SceneGraph::new();
//! let positions = graph.add_accessor(AccessorModel::from_values(ElementType::Vec3, &coords)?);
//! let primitive = graph.add_primitive(Primitive::new().with_attribute("POSITION", positions));
//! let mesh = graph.add_mesh(Mesh::new(Some("Triangle")).with_primitive(primitive));
//!
//! // Two nodes share one mesh; its accessors are written once.
//! let left = graph.add_node(Node::new(Some("Left")).with_mesh(mesh));
//! let right = graph.add_node(Node::new(Some("Right")).with_mesh(mesh));
//! graph.add_scene(Scene::new(None).with_node(left).with_node(right));
//!
//! let model = ModelBuilder::new(&graph, BuildOptions::default()).build()?;
//! GltfWriter::new(&model).write_glb("shared.glb")?;
//! ```

pub mod collector;
pub mod gltf_writer;
pub mod model_builder;
pub mod packed_model;
pub mod scene;

pub use collector::{CollectedGraph, Collector};
pub use gltf_writer::{GltfWriteError, GltfWriter};
pub use model_builder::{BuildOptions, ModelBuilder};
pub use packed_model::{PackedModel, SceneEntities};
pub use scene::SceneGraph;
