// glTF 2.0 / GLB writer for packed models.
//
// Three output forms are supported:
//
// - **GLB** - binary container (single .glb file, at most one buffer)
// - **glTF + .bin** - JSON plus one binary file per buffer
// - **glTF (embedded)** - single JSON file with base64 data URIs
//
// Buffer views map one-to-one onto the model's non-empty regions. Vertex
// views carry the region's declared `byteStride`; index and generic views
// never do. Accessor `byteOffset`s are the region-relative offsets assigned
// by the assembler.
//
// # Example - GLB
//
// ```ignore
// use meshpack_io::{BuildOptions, GltfWriter, ModelBuilder};
//
// let model = ModelBuilder::new(&graph, BuildOptions::default()).build()?;
// GltfWriter::new(&model).write_glb("output.glb")?;
// ```
//
// # Example - Split buffers
//
// ```ignore
// // Writes scene.gltf, scene.bin, scene_1.bin, ...
// GltfWriter::new(&model).write_gltf("scene.gltf", "scene.bin")?;
// ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use meshpack_core::{AccessorIndex, BufferUsage, LayoutError};
use serde::Serialize;
use thiserror::Error;

use crate::packed_model::{PackedMaterial, PackedModel};
use crate::scene::{PrimitiveMode, TextureRef, TextureSlot, Transform};

/// Errors that can occur when writing glTF files.
#[derive(Error, Debug)]
pub enum GltfWriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("GLB holds a single buffer but the model has {0}")]
    MultipleBuffers(usize),

    #[error("Expected {expected} buffer URIs, got {actual}")]
    BufferUriCount { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, GltfWriteError>;

// ============================================================================
// glTF JSON Schema for Writing
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GltfRoot {
    asset: Asset,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    accessors: Vec<AccessorOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffer_views: Vec<BufferViewOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buffers: Vec<BufferOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    meshes: Vec<MeshOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<NodeOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    scenes: Vec<SceneOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    materials: Vec<MaterialOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    textures: Vec<TextureOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<ImageOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    samplers: Vec<SamplerOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skins: Vec<SkinOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    animations: Vec<AnimationOut>,
}

#[derive(Debug, Serialize)]
struct Asset {
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    generator: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessorOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    buffer_view: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    byte_offset: Option<usize>,
    component_type: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    normalized: bool,
    count: usize,
    #[serde(rename = "type")]
    accessor_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    min: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    max: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewOut {
    buffer: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    byte_offset: Option<usize>,
    byte_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    byte_stride: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BufferOut {
    byte_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    primitives: Vec<PrimitiveOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    weights: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrimitiveOut {
    attributes: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    indices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    material: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    targets: Vec<BTreeMap<String, usize>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mesh: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skin: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<usize>,
    /// 4x4 transformation matrix (column-major).
    #[serde(skip_serializing_if = "Option::is_none")]
    matrix: Option<[f32; 16]>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextureInfoOut {
    index: usize,
    #[serde(skip_serializing_if = "is_zero")]
    tex_coord: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PbrOut {
    base_color_factor: [f32; 4],
    metallic_factor: f32,
    roughness_factor: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_color_texture: Option<TextureInfoOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metallic_roughness_texture: Option<TextureInfoOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MaterialOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    pbr_metallic_roughness: PbrOut,
    #[serde(skip_serializing_if = "Option::is_none")]
    normal_texture: Option<TextureInfoOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occlusion_texture: Option<TextureInfoOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emissive_texture: Option<TextureInfoOut>,
    emissive_factor: [f32; 3],
    alpha_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    alpha_cutoff: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    double_sided: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextureOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampler: Option<usize>,
    source: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SamplerOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    mag_filter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_filter: Option<u32>,
    wrap_s: u32,
    wrap_t: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkinOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inverse_bind_matrices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skeleton: Option<usize>,
    joints: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct ChannelTargetOut {
    node: usize,
    path: &'static str,
}

#[derive(Debug, Serialize)]
struct ChannelOut {
    sampler: usize,
    target: ChannelTargetOut,
}

#[derive(Debug, Serialize)]
struct AnimationSamplerOut {
    input: usize,
    output: usize,
    interpolation: &'static str,
}

#[derive(Debug, Serialize)]
struct AnimationOut {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    channels: Vec<ChannelOut>,
    samplers: Vec<AnimationSamplerOut>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

// ============================================================================
// GLB Constants
// ============================================================================

const GLB_MAGIC: u32 = 0x46546C67; // "glTF"
const GLB_VERSION: u32 = 2;
const GLB_CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
const GLB_CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

// ============================================================================
// GltfWriter
// ============================================================================

/// Serializes a [`PackedModel`] to glTF JSON, embedded glTF, or GLB.
pub struct GltfWriter<'a> {
    model: &'a PackedModel,
}

impl<'a> GltfWriter<'a> {
    pub fn new(model: &'a PackedModel) -> Self {
        Self { model }
    }

    /// Non-empty buffers, in buffer order. Empty buffers are not written.
    fn written_buffers(&self) -> Vec<&'a [u8]> {
        self.model
            .buffers()
            .buffers()
            .iter()
            .map(|b| b.data())
            .filter(|d| !d.is_empty())
            .collect()
    }

    /// Number of buffers a `.gltf` output references.
    pub fn num_written_buffers(&self) -> usize {
        self.written_buffers().len()
    }

    /// glTF JSON referencing each written buffer by the matching URI.
    pub fn to_gltf_json(&self, buffer_uris: &[String]) -> Result<String> {
        let root = self.build_gltf_root(Some(buffer_uris))?;
        Ok(serde_json::to_string_pretty(&root)?)
    }

    /// Write as GLB (binary glTF) file.
    pub fn write_glb<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let glb_data = self.to_glb()?;
        fs::write(path, glb_data)?;
        Ok(())
    }

    /// Write as glTF JSON plus one binary file per buffer.
    ///
    /// The first buffer goes to `bin_path`; further buffers get `_1`, `_2`,
    /// ... appended to its file stem.
    pub fn write_gltf<P: AsRef<Path>>(&self, json_path: P, bin_path: P) -> Result<()> {
        let bin_path = bin_path.as_ref();
        let buffers = self.written_buffers();

        let mut uris = Vec::with_capacity(buffers.len());
        for (i, data) in buffers.iter().enumerate() {
            let path = numbered_bin_path(bin_path, i);
            fs::write(&path, data)?;
            uris.push(
                path.file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| format!("buffer{}.bin", i)),
            );
        }

        let json = self.to_gltf_json(&uris)?;
        fs::write(json_path, json)?;
        debug!("wrote glTF with {} external buffer(s)", uris.len());
        Ok(())
    }

    /// Write as a single glTF JSON file with embedded base64 data URIs.
    pub fn write_gltf_embedded<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_gltf_embedded()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Convert to glTF JSON string with embedded base64 data.
    pub fn to_gltf_embedded(&self) -> Result<String> {
        let uris: Vec<String> = self
            .written_buffers()
            .into_iter()
            .map(encode_data_uri)
            .collect();
        self.to_gltf_json(&uris)
    }

    /// Convert to GLB bytes.
    pub fn to_glb(&self) -> Result<Vec<u8>> {
        let buffers = self.written_buffers();
        if buffers.len() > 1 {
            return Err(GltfWriteError::MultipleBuffers(buffers.len()));
        }
        let binary_data: &[u8] = buffers.first().copied().unwrap_or(&[]);

        let root = self.build_gltf_root(None)?;
        let json = serde_json::to_string(&root)?;
        let json_bytes = json.as_bytes();

        let json_padding = (4 - (json_bytes.len() % 4)) % 4;
        let padded_json_len = json_bytes.len() + json_padding;

        let bin_padding = (4 - (binary_data.len() % 4)) % 4;
        let padded_bin_len = binary_data.len() + bin_padding;

        let mut total_len = 12 + 8 + padded_json_len;
        if !binary_data.is_empty() {
            total_len += 8 + padded_bin_len;
        }

        let mut output = Vec::with_capacity(total_len);

        // Header
        output.write_u32::<LittleEndian>(GLB_MAGIC)?;
        output.write_u32::<LittleEndian>(GLB_VERSION)?;
        output.write_u32::<LittleEndian>(total_len as u32)?;

        // JSON chunk, padded with spaces
        output.write_u32::<LittleEndian>(padded_json_len as u32)?;
        output.write_u32::<LittleEndian>(GLB_CHUNK_JSON)?;
        output.write_all(json_bytes)?;
        output.resize(output.len() + json_padding, b' ');

        // Binary chunk, padded with zeros
        if !binary_data.is_empty() {
            output.write_u32::<LittleEndian>(padded_bin_len as u32)?;
            output.write_u32::<LittleEndian>(GLB_CHUNK_BIN)?;
            output.write_all(binary_data)?;
            output.resize(output.len() + bin_padding, 0);
        }

        Ok(output)
    }

    /// `buffer_uris` is `None` for GLB, where the single buffer has no URI.
    fn build_gltf_root(&self, buffer_uris: Option<&[String]>) -> Result<GltfRoot> {
        let model = self.model;
        let packed = model.buffers();

        // Buffer index remap that skips empty buffers.
        let mut buffer_slots = Vec::with_capacity(packed.buffers().len());
        let mut buffers = Vec::new();
        for buffer in packed.buffers() {
            if buffer.byte_length() == 0 {
                buffer_slots.push(None);
                continue;
            }
            buffer_slots.push(Some(buffers.len()));
            buffers.push(BufferOut {
                byte_length: buffer.byte_length(),
                uri: None,
            });
        }
        if let Some(uris) = buffer_uris {
            if uris.len() != buffers.len() {
                return Err(GltfWriteError::BufferUriCount {
                    expected: buffers.len(),
                    actual: uris.len(),
                });
            }
            for (buffer, uri) in buffers.iter_mut().zip(uris) {
                buffer.uri = Some(uri.clone());
            }
        }

        // One view per non-empty region.
        let mut region_views = Vec::with_capacity(packed.regions().len());
        let mut buffer_views = Vec::new();
        for region in packed.regions() {
            let buffer = buffer_slots.get(region.buffer().index()).copied().flatten();
            match buffer {
                Some(buffer) if region.byte_length() > 0 => {
                    region_views.push(Some(buffer_views.len()));
                    buffer_views.push(BufferViewOut {
                        buffer,
                        byte_offset: Some(region.byte_offset()),
                        byte_length: region.byte_length(),
                        byte_stride: match region.usage() {
                            BufferUsage::Vertex => region.declared_stride(),
                            BufferUsage::Index | BufferUsage::Generic => None,
                        },
                        target: region.usage().gl_target(),
                    });
                }
                _ => region_views.push(None),
            }
        }

        let bounded = self.accessors_needing_bounds();
        let accessors = packed
            .accessors()
            .iter()
            .enumerate()
            .map(|(i, accessor)| {
                let buffer_view = accessor
                    .region()
                    .and_then(|r| region_views.get(r.index()).copied().flatten());
                let (min, max) = if bounded.contains(&AccessorIndex::from(i)) {
                    accessor.bounds()
                } else {
                    (Vec::new(), Vec::new())
                };
                AccessorOut {
                    buffer_view,
                    byte_offset: buffer_view.map(|_| accessor.byte_offset()),
                    component_type: accessor.component_type().gl_code(),
                    normalized: accessor.normalized(),
                    count: accessor.element_count(),
                    accessor_type: accessor.element_type().as_str(),
                    min,
                    max,
                }
            })
            .collect();

        let meshes = model
            .meshes()
            .iter()
            .map(|mesh| {
                let primitives = mesh
                    .primitives
                    .iter()
                    .filter_map(|p| model.primitives().get(*p))
                    .map(|p| PrimitiveOut {
                        attributes: attribute_map(&p.attributes),
                        indices: p.indices.map(AccessorIndex::index),
                        material: p.material,
                        mode: match p.mode {
                            PrimitiveMode::Triangles => None,
                            other => Some(other.gl_code()),
                        },
                        targets: p.targets.iter().map(|t| attribute_map(t)).collect(),
                    })
                    .collect();
                MeshOut {
                    name: mesh.name.clone(),
                    primitives,
                    weights: mesh.weights.clone(),
                }
            })
            .collect();

        let nodes = model
            .nodes()
            .iter()
            .map(|node| NodeOut {
                name: node.name.clone(),
                mesh: node.mesh,
                skin: node.skin,
                children: node.children.clone(),
                matrix: node
                    .transform
                    .filter(|t| *t != Transform::IDENTITY)
                    .map(|t| t.to_column_major()),
            })
            .collect();

        let scenes = model
            .scenes()
            .iter()
            .map(|scene| SceneOut {
                name: scene.name.clone(),
                nodes: scene.nodes.clone(),
            })
            .collect();

        let textures = model
            .textures()
            .iter()
            .map(|t| TextureOut {
                name: t.name.clone(),
                sampler: t.sampler,
                source: t.image,
            })
            .collect();

        let images = model
            .images()
            .iter()
            .map(|image| ImageOut {
                name: image.name.clone(),
                uri: image.uri.clone(),
                mime_type: image.mime_type.clone(),
            })
            .collect();

        let samplers = model
            .samplers()
            .iter()
            .map(|s| SamplerOut {
                mag_filter: s.mag_filter,
                min_filter: s.min_filter,
                wrap_s: s.wrap_s,
                wrap_t: s.wrap_t,
            })
            .collect();

        let skins = model
            .skins()
            .iter()
            .map(|skin| SkinOut {
                name: skin.name.clone(),
                inverse_bind_matrices: skin.inverse_bind_matrices.map(AccessorIndex::index),
                skeleton: skin.skeleton,
                joints: skin.joints.clone(),
            })
            .collect();

        let animations = model
            .animations()
            .iter()
            .map(|animation| AnimationOut {
                name: animation.name.clone(),
                channels: animation
                    .channels
                    .iter()
                    .map(|c| ChannelOut {
                        sampler: c.sampler,
                        target: ChannelTargetOut {
                            node: c.node,
                            path: c.path.as_str(),
                        },
                    })
                    .collect(),
                samplers: animation
                    .samplers
                    .iter()
                    .map(|s| AnimationSamplerOut {
                        input: s.input.index(),
                        output: s.output.index(),
                        interpolation: s.interpolation.as_str(),
                    })
                    .collect(),
            })
            .collect();

        Ok(GltfRoot {
            asset: Asset {
                version: "2.0".to_string(),
                generator: model.generator().map(String::from),
            },
            accessors,
            buffer_views,
            buffers,
            meshes,
            nodes,
            scene: model.default_scene(),
            scenes,
            materials: model.materials().iter().map(material_out).collect(),
            textures,
            images,
            samplers,
            skins,
            animations,
        })
    }

    /// POSITION attributes (base and morph target) and animation inputs
    /// must carry `min`/`max`.
    fn accessors_needing_bounds(&self) -> HashSet<AccessorIndex> {
        let mut bounded = HashSet::new();
        for primitive in self.model.primitives() {
            let targets = primitive.targets.iter().flatten();
            for (name, accessor) in primitive.attributes.iter().chain(targets) {
                if name == "POSITION" {
                    bounded.insert(*accessor);
                }
            }
        }
        for animation in self.model.animations() {
            bounded.extend(animation.samplers.iter().map(|s| s.input));
        }
        bounded
    }
}

fn attribute_map(attributes: &[(String, AccessorIndex)]) -> BTreeMap<String, usize> {
    attributes
        .iter()
        .map(|(name, accessor)| (name.clone(), accessor.index()))
        .collect()
}

fn material_out(material: &PackedMaterial) -> MaterialOut {
    let info = |slot: TextureSlot| {
        material
            .texture(slot)
            .map(|TextureRef { texture, tex_coord }| TextureInfoOut {
                index: *texture,
                tex_coord: *tex_coord,
            })
    };
    MaterialOut {
        name: material.name.clone(),
        pbr_metallic_roughness: PbrOut {
            base_color_factor: material.base_color_factor,
            metallic_factor: material.metallic_factor,
            roughness_factor: material.roughness_factor,
            base_color_texture: info(TextureSlot::BaseColor),
            metallic_roughness_texture: info(TextureSlot::MetallicRoughness),
        },
        normal_texture: info(TextureSlot::Normal),
        occlusion_texture: info(TextureSlot::Occlusion),
        emissive_texture: info(TextureSlot::Emissive),
        emissive_factor: material.emissive_factor,
        alpha_mode: material.alpha_mode.as_str(),
        alpha_cutoff: material.alpha_cutoff,
        double_sided: material.double_sided,
    }
}

/// `scene.bin`, `scene_1.bin`, `scene_2.bin`, ...
fn numbered_bin_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "buffer".to_string());
    let file_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(file_name)
}

fn encode_data_uri(data: &[u8]) -> String {
    const ENCODE_TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut output = String::with_capacity(DATA_URI_PREFIX.len() + (data.len() + 2) / 3 * 4);
    output.push_str(DATA_URI_PREFIX);

    for chunk in data.chunks(3) {
        let b1 = chunk[0];
        let b2 = chunk.get(1).copied().unwrap_or(0);
        let b3 = chunk.get(2).copied().unwrap_or(0);

        let n = ((b1 as u32) << 16) | ((b2 as u32) << 8) | (b3 as u32);

        output.push(ENCODE_TABLE[((n >> 18) & 0x3F) as usize] as char);
        output.push(ENCODE_TABLE[((n >> 12) & 0x3F) as usize] as char);

        if chunk.len() > 1 {
            output.push(ENCODE_TABLE[((n >> 6) & 0x3F) as usize] as char);
        } else {
            output.push('=');
        }

        if chunk.len() > 2 {
            output.push(ENCODE_TABLE[(n & 0x3F) as usize] as char);
        } else {
            output.push('=');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_builder::{BuildOptions, ModelBuilder};
    use crate::scene::{Mesh, Node, Primitive, Scene, SceneGraph};
    use meshpack_core::{AccessorModel, AssemblerOptions, ElementType, MaxBufferLength};
    use serde_json::Value;

    fn triangle_graph() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let positions = graph.add_accessor(
            AccessorModel::from_values(
                ElementType::Vec3,
                &[0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            )
            .unwrap(),
        );
        let indices =
            graph.add_accessor(AccessorModel::from_values(ElementType::Scalar, &[0u16, 1, 2]).unwrap());
        let primitive = graph.add_primitive(
            Primitive::new()
                .with_indices(indices)
                .with_attribute("POSITION", positions),
        );
        let mesh = graph.add_mesh(Mesh::new(Some("Triangle")).with_primitive(primitive));
        let root = graph.add_node(
            Node::new(Some("Root"))
                .with_mesh(mesh)
                .with_transform(Transform::translation(1.0, 2.0, 3.0)),
        );
        graph.add_scene(Scene::new(Some("TestScene")).with_node(root));
        graph
    }

    fn glb_json(glb: &[u8]) -> Value {
        let json_len = u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize;
        serde_json::from_slice(&glb[20..20 + json_len]).unwrap()
    }

    #[test]
    fn test_create_glb() {
        let graph = triangle_graph();
        let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();
        let glb = GltfWriter::new(&model).to_glb().unwrap();

        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes([glb[4], glb[5], glb[6], glb[7]]), 2);
        assert_eq!(
            u32::from_le_bytes([glb[8], glb[9], glb[10], glb[11]]) as usize,
            glb.len()
        );
        assert_eq!(&glb[16..20], b"JSON");
        assert_eq!(glb.len() % 4, 0);

        let json = glb_json(&glb);
        assert_eq!(json["asset"]["version"], "2.0");
        assert_eq!(json["buffers"].as_array().unwrap().len(), 1);
        assert!(json["buffers"][0].get("uri").is_none());
    }

    #[test]
    fn test_index_view_has_no_stride() {
        let graph = triangle_graph();
        let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();
        let json = glb_json(&GltfWriter::new(&model).to_glb().unwrap());

        let views = json["bufferViews"].as_array().unwrap();
        assert_eq!(views.len(), 2);
        assert!(views[0].get("byteStride").is_none());
        assert_eq!(views[0]["target"], 34963);
        assert_eq!(views[1]["byteStride"], 12);
        assert_eq!(views[1]["target"], 34962);
        assert_eq!(views[1]["byteOffset"], 8);
    }

    #[test]
    fn test_position_bounds_and_node_matrix() {
        let graph = triangle_graph();
        let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();
        let json = glb_json(&GltfWriter::new(&model).to_glb().unwrap());

        let position = json["meshes"][0]["primitives"][0]["attributes"]["POSITION"]
            .as_u64()
            .unwrap() as usize;
        let accessor = &json["accessors"][position];
        assert_eq!(accessor["type"], "VEC3");
        assert_eq!(accessor["min"], serde_json::json!([0.0, 0.0, 0.0]));
        assert_eq!(accessor["max"], serde_json::json!([1.0, 1.0, 0.0]));

        let indices = json["meshes"][0]["primitives"][0]["indices"].as_u64().unwrap() as usize;
        assert!(json["accessors"][indices].get("min").is_none());

        let matrix = json["nodes"][0]["matrix"].as_array().unwrap();
        assert_eq!(matrix[12], 1.0);
        assert_eq!(matrix[13], 2.0);
        assert_eq!(matrix[14], 3.0);
        assert_eq!(json["scene"], 0);
        assert_eq!(json["scenes"][0]["name"], "TestScene");
    }

    #[test]
    fn test_glb_rejects_multiple_buffers() {
        let graph = triangle_graph();
        let mut assembler = AssemblerOptions::default();
        assembler.set_split_policy(MaxBufferLength(16));
        let options = BuildOptions::new().with_assembler(assembler);
        let model = ModelBuilder::new(&graph, options).build().unwrap();
        assert_eq!(model.buffers().buffers().len(), 2);

        let writer = GltfWriter::new(&model);
        assert!(matches!(writer.to_glb(), Err(GltfWriteError::MultipleBuffers(2))));

        let json: Value = serde_json::from_str(&writer.to_gltf_embedded().unwrap()).unwrap();
        assert_eq!(json["buffers"].as_array().unwrap().len(), 2);
        assert_eq!(json["bufferViews"][1]["buffer"], 1);
        assert_eq!(json["bufferViews"][1]["byteOffset"], 0);
    }

    #[test]
    fn test_uri_count_must_match() {
        let graph = triangle_graph();
        let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();
        let writer = GltfWriter::new(&model);
        assert!(matches!(
            writer.to_gltf_json(&[]),
            Err(GltfWriteError::BufferUriCount { expected: 1, actual: 0 })
        ));
        let json = writer.to_gltf_json(&["scene.bin".to_string()]).unwrap();
        assert!(json.contains("scene.bin"));
    }

    #[test]
    fn test_embedded_gltf() {
        let graph = triangle_graph();
        let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();
        let json = GltfWriter::new(&model).to_gltf_embedded().unwrap();
        assert!(json.contains("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_empty_model_writes_no_buffers() {
        let graph = SceneGraph::new();
        let model = ModelBuilder::new(&graph, BuildOptions::default()).build().unwrap();
        let writer = GltfWriter::new(&model);
        assert_eq!(writer.num_written_buffers(), 0);

        let glb = writer.to_glb().unwrap();
        let json = glb_json(&glb);
        assert!(json.get("buffers").is_none());
        assert_eq!(glb.len(), 20 + u32::from_le_bytes([glb[12], glb[13], glb[14], glb[15]]) as usize);
    }

    #[test]
    fn test_numbered_bin_path() {
        let base = Path::new("out/scene.bin");
        assert_eq!(numbered_bin_path(base, 0), PathBuf::from("out/scene.bin"));
        assert_eq!(numbered_bin_path(base, 2), PathBuf::from("out/scene_2.bin"));
    }

    #[test]
    fn test_base64_encoding() {
        let encoded = encode_data_uri(b"Hello");
        assert!(encoded.starts_with("data:application/octet-stream;base64,"));
        assert!(encoded.ends_with("SGVsbG8="));

        let encoded = encode_data_uri(b"Hello World");
        assert!(encoded.ends_with("SGVsbG8gV29ybGQ="));
    }
}
