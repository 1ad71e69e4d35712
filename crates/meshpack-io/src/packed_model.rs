//! Finished, read-only output of a build.
//!
//! Entity references are indices into the lists held here; accessor
//! references are [`AccessorIndex`] values into [`PackedBuffers`].

use meshpack_core::{AccessorIndex, AccessorModel, BufferRegion, PackedBuffers};

use crate::scene::{Animation, Image, Material, Mesh, Node, Primitive, Sampler, Scene, Skin, Texture};

pub type PackedPrimitive = Primitive<AccessorIndex, usize>;
pub type PackedMesh = Mesh<usize>;
pub type PackedNode = Node<usize, usize, usize>;
pub type PackedScene = Scene<usize>;
pub type PackedMaterial = Material<usize>;
pub type PackedTexture = Texture<usize, usize>;
pub type PackedSkin = Skin<usize, AccessorIndex>;
pub type PackedAnimation = Animation<usize, AccessorIndex>;

/// Deduplicated entity lists in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneEntities {
    pub scenes: Vec<PackedScene>,
    pub nodes: Vec<PackedNode>,
    pub meshes: Vec<PackedMesh>,
    pub primitives: Vec<PackedPrimitive>,
    pub materials: Vec<PackedMaterial>,
    pub textures: Vec<PackedTexture>,
    pub images: Vec<Image>,
    pub samplers: Vec<Sampler>,
    pub skins: Vec<PackedSkin>,
    pub animations: Vec<PackedAnimation>,
    pub default_scene: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackedModel {
    buffers: PackedBuffers,
    entities: SceneEntities,
    generator: Option<String>,
}

impl PackedModel {
    pub(crate) fn new(buffers: PackedBuffers, entities: SceneEntities, generator: Option<String>) -> Self {
        Self {
            buffers,
            entities,
            generator,
        }
    }

    pub fn generator(&self) -> Option<&str> {
        self.generator.as_deref()
    }

    pub fn buffers(&self) -> &PackedBuffers {
        &self.buffers
    }

    pub fn entities(&self) -> &SceneEntities {
        &self.entities
    }

    pub fn accessors(&self) -> &[AccessorModel] {
        self.buffers.accessors()
    }

    pub fn regions(&self) -> &[BufferRegion] {
        self.buffers.regions()
    }

    pub fn scenes(&self) -> &[PackedScene] {
        &self.entities.scenes
    }

    pub fn nodes(&self) -> &[PackedNode] {
        &self.entities.nodes
    }

    pub fn meshes(&self) -> &[PackedMesh] {
        &self.entities.meshes
    }

    pub fn primitives(&self) -> &[PackedPrimitive] {
        &self.entities.primitives
    }

    pub fn materials(&self) -> &[PackedMaterial] {
        &self.entities.materials
    }

    pub fn textures(&self) -> &[PackedTexture] {
        &self.entities.textures
    }

    pub fn images(&self) -> &[Image] {
        &self.entities.images
    }

    pub fn samplers(&self) -> &[Sampler] {
        &self.entities.samplers
    }

    pub fn skins(&self) -> &[PackedSkin] {
        &self.entities.skins
    }

    pub fn animations(&self) -> &[PackedAnimation] {
        &self.entities.animations
    }

    pub fn default_scene(&self) -> Option<usize> {
        self.entities.default_scene
    }
}
