//! End-to-end output: build a scene graph, write it, inspect the files.

use std::fs;

use meshpack_core::{AccessorModel, AssemblerOptions, ElementType, MaxBufferLength};
use meshpack_io::scene::{Mesh, Node, Primitive, Scene, SceneGraph, Transform};
use meshpack_io::{BuildOptions, GltfWriter, ModelBuilder};
use serde_json::Value;

/// Two nodes sharing one quad mesh with positions, normals and indices.
fn shared_quad_graph() -> SceneGraph {
    let mut graph = SceneGraph::new();
    let positions = graph.add_accessor(
        AccessorModel::from_values(
            ElementType::Vec3,
            &[0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
        )
        .unwrap(),
    );
    let normals = graph.add_accessor(
        AccessorModel::from_values(ElementType::Vec3, &[0i8, 0, 127, 0, 0, 127, 0, 0, 127, 0, 0, 127])
            .unwrap()
            .with_normalized(true),
    );
    let indices = graph.add_accessor(
        AccessorModel::from_values(ElementType::Scalar, &[0u16, 1, 2, 0, 2, 3]).unwrap(),
    );
    let primitive = graph.add_primitive(
        Primitive::new()
            .with_indices(indices)
            .with_attribute("POSITION", positions)
            .with_attribute("NORMAL", normals),
    );
    let mesh = graph.add_mesh(Mesh::new(Some("Quad")).with_primitive(primitive));
    let left = graph.add_node(
        Node::new(Some("Left"))
            .with_mesh(mesh)
            .with_transform(Transform::translation(-1.0, 0.0, 0.0)),
    );
    let right = graph.add_node(
        Node::new(Some("Right"))
            .with_mesh(mesh)
            .with_transform(Transform::translation(1.0, 0.0, 0.0)),
    );
    graph.add_scene(Scene::new(Some("Quads")).with_node(left).with_node(right));
    graph
}

fn read_glb_json(glb: &[u8]) -> Value {
    let json_len = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize;
    serde_json::from_slice(&glb[20..20 + json_len]).unwrap()
}

#[test]
fn test_shared_mesh_glb() {
    let graph = shared_quad_graph();
    let options = BuildOptions::new().with_generator("meshpack");
    let model = ModelBuilder::new(&graph, options).build().unwrap();
    let glb = GltfWriter::new(&model).to_glb().unwrap();
    let json = read_glb_json(&glb);

    assert_eq!(json["asset"]["generator"], "meshpack");
    assert_eq!(json["accessors"].as_array().unwrap().len(), 3);
    assert_eq!(json["meshes"].as_array().unwrap().len(), 1);
    assert_eq!(json["nodes"][0]["mesh"], 0);
    assert_eq!(json["nodes"][1]["mesh"], 0);

    // Index view first, unstrided; vertex view shares the widest stride.
    let views = json["bufferViews"].as_array().unwrap();
    assert_eq!(views.len(), 2);
    assert!(views[0].get("byteStride").is_none());
    assert_eq!(views[0]["byteLength"], 12);
    assert_eq!(views[1]["byteStride"], 12);
    assert_eq!(views[1]["byteOffset"], 12);
    assert_eq!(views[1]["byteLength"], 96);

    let normal = json["meshes"][0]["primitives"][0]["attributes"]["NORMAL"]
        .as_u64()
        .unwrap() as usize;
    assert_eq!(json["accessors"][normal]["normalized"], true);
    assert_eq!(json["accessors"][normal]["byteOffset"], 48);

    // BIN chunk follows the JSON chunk.
    let json_len = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize;
    let bin_header = 20 + json_len;
    assert_eq!(&glb[bin_header + 4..bin_header + 8], b"BIN\0");
    let bin_len = u32::from_le_bytes([
        glb[bin_header],
        glb[bin_header + 1],
        glb[bin_header + 2],
        glb[bin_header + 3],
    ]) as usize;
    assert_eq!(bin_len, 108);
    assert_eq!(json["buffers"][0]["byteLength"], 108);
}

#[test]
fn test_write_gltf_with_split_buffers() {
    let graph = shared_quad_graph();
    let mut assembler = AssemblerOptions::default();
    assembler.set_split_policy(MaxBufferLength(64));
    let model = ModelBuilder::new(&graph, BuildOptions::new().with_assembler(assembler))
        .build()
        .unwrap();
    assert_eq!(model.buffers().buffers().len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("quads.gltf");
    let bin_path = dir.path().join("quads.bin");
    GltfWriter::new(&model).write_gltf(&json_path, &bin_path).unwrap();

    let json: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["buffers"][0]["uri"], "quads.bin");
    assert_eq!(json["buffers"][1]["uri"], "quads_1.bin");
    assert_eq!(fs::read(&bin_path).unwrap().len(), 12);
    assert_eq!(fs::read(dir.path().join("quads_1.bin")).unwrap().len(), 96);
    assert_eq!(json["bufferViews"][1]["buffer"], 1);
}

#[test]
fn test_write_glb_file() {
    let graph = shared_quad_graph();
    let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quads.glb");
    let writer = GltfWriter::new(&model);
    writer.write_glb(&path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), writer.to_glb().unwrap());
}

#[test]
fn test_write_embedded_gltf_file() {
    let graph = shared_quad_graph();
    let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quads.gltf");
    GltfWriter::new(&model).write_gltf_embedded(&path).unwrap();

    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let uri = json["buffers"][0]["uri"].as_str().unwrap();
    assert!(uri.starts_with("data:application/octet-stream;base64,"));
    // 108 bytes -> 36 base64 quads.
    assert_eq!(uri.len(), "data:application/octet-stream;base64,".len() + 144);
}
