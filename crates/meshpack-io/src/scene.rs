//! Input scene graph.
//!
//! Entities live in typed arenas owned by a [`SceneGraph`] and refer to each
//! other through ids. An id is the identity of an entity: sharing an id
//! shares the entity, while two entities with equal contents added
//! separately stay distinct.
//!
//! The entity structs are generic over the kind of reference they hold so
//! the same shapes describe both the input graph (ids into the arenas) and
//! the packed output (indices into the output lists).
//!
//! ```ignore
//! use meshpack_io::scene::*;
//!
//! let mut graph = SceneGraph::new();
//! let positions = graph.add_accessor(AccessorModel::from_values(ElementType::Vec3, &coords)?);
//! let primitive = graph.add_primitive(Primitive::new().with_attribute("POSITION", positions));
//! let mesh = graph.add_mesh(Mesh::new(Some("Triangle")).with_primitive(primitive));
//! let node = graph.add_node(Node::new(Some("Root")).with_mesh(mesh));
//! graph.add_scene(Scene::new(Some("Scene")).with_node(node));
//! ```

use meshpack_core::status::{invalid_reference, Status};
use meshpack_core::AccessorModel;

macro_rules! define_id {
    ($name:ident, $what:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", $what, self.0)
            }
        }
    };
}

define_id!(AccessorId, "accessor");
define_id!(PrimitiveId, "primitive");
define_id!(MeshId, "mesh");
define_id!(NodeId, "node");
define_id!(SceneId, "scene");
define_id!(MaterialId, "material");
define_id!(TextureId, "texture");
define_id!(ImageId, "image");
define_id!(SamplerId, "sampler");
define_id!(SkinId, "skin");
define_id!(AnimationId, "animation");

/// 4x4 row-major transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub matrix: [[f32; 4]; 4],
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        matrix: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut t = Self::IDENTITY;
        t.matrix[0][3] = x;
        t.matrix[1][3] = y;
        t.matrix[2][3] = z;
        t
    }

    /// Column-major layout used by glTF `node.matrix`.
    pub fn to_column_major(&self) -> [f32; 16] {
        let m = &self.matrix;
        [
            m[0][0], m[1][0], m[2][0], m[3][0],
            m[0][1], m[1][1], m[2][1], m[3][1],
            m[0][2], m[1][2], m[2][2], m[3][2],
            m[0][3], m[1][3], m[2][3], m[3][3],
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    pub fn gl_code(&self) -> u32 {
        match self {
            PrimitiveMode::Points => 0,
            PrimitiveMode::Lines => 1,
            PrimitiveMode::LineLoop => 2,
            PrimitiveMode::LineStrip => 3,
            PrimitiveMode::Triangles => 4,
            PrimitiveMode::TriangleStrip => 5,
            PrimitiveMode::TriangleFan => 6,
        }
    }
}

/// Named attribute accessors of one morph target, in declaration order.
pub type MorphTarget<A = AccessorId> = Vec<(String, A)>;

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive<A = AccessorId, M = MaterialId> {
    pub mode: PrimitiveMode,
    pub indices: Option<A>,
    pub attributes: Vec<(String, A)>,
    pub targets: Vec<MorphTarget<A>>,
    pub material: Option<M>,
}

impl<A, M> Default for Primitive<A, M> {
    fn default() -> Self {
        Self {
            mode: PrimitiveMode::default(),
            indices: None,
            attributes: Vec::new(),
            targets: Vec::new(),
            material: None,
        }
    }
}

impl<A, M> Primitive<A, M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indices(mut self, indices: A) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, accessor: A) -> Self {
        self.attributes.push((name.into(), accessor));
        self
    }

    pub fn with_target(mut self, target: MorphTarget<A>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_material(mut self, material: M) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_mode(mut self, mode: PrimitiveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&A> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<P = PrimitiveId> {
    pub name: Option<String>,
    pub primitives: Vec<P>,
    /// Default morph target weights.
    pub weights: Vec<f32>,
}

impl<P> Mesh<P> {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            primitives: Vec::new(),
            weights: Vec::new(),
        }
    }

    pub fn with_primitive(mut self, primitive: P) -> Self {
        self.primitives.push(primitive);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<N = NodeId, M = MeshId, S = SkinId> {
    pub name: Option<String>,
    pub transform: Option<Transform>,
    pub mesh: Option<M>,
    pub skin: Option<S>,
    pub children: Vec<N>,
}

impl<N, M, S> Node<N, M, S> {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            transform: None,
            mesh: None,
            skin: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: M) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_skin(mut self, skin: S) -> Self {
        self.skin = Some(skin);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_child(mut self, child: N) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene<N = NodeId> {
    pub name: Option<String>,
    pub nodes: Vec<N>,
}

impl<N> Scene<N> {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            nodes: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: N) -> Self {
        self.nodes.push(node);
        self
    }
}

/// Material texture slots, in the order the collector visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    BaseColor,
    MetallicRoughness,
    Normal,
    Occlusion,
    Emissive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureRef<T = TextureId> {
    pub texture: T,
    pub tex_coord: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl AlphaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlphaMode::Opaque => "OPAQUE",
            AlphaMode::Mask => "MASK",
            AlphaMode::Blend => "BLEND",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material<T = TextureId> {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: Option<f32>,
    pub double_sided: bool,
    /// At most one entry per slot; kept sorted by slot.
    pub textures: Vec<(TextureSlot, TextureRef<T>)>,
}

impl<T> Material<T> {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0, 0.0, 0.0],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: None,
            double_sided: false,
            textures: Vec::new(),
        }
    }

    /// Sets (or replaces) the texture bound to `slot`.
    pub fn with_texture(mut self, slot: TextureSlot, texture: T, tex_coord: u32) -> Self {
        self.textures.retain(|(s, _)| *s != slot);
        self.textures.push((slot, TextureRef { texture, tex_coord }));
        self.textures.sort_by_key(|(s, _)| *s);
        self
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureRef<T>> {
        self.textures.iter().find(|(s, _)| *s == slot).map(|(_, t)| t)
    }

    /// Rebuilds the material with every texture reference mapped through `f`.
    pub fn try_map_textures<U>(&self, mut f: impl FnMut(&T) -> Status<U>) -> Status<Material<U>> {
        let mut textures = Vec::with_capacity(self.textures.len());
        for (slot, tex) in &self.textures {
            textures.push((
                *slot,
                TextureRef {
                    texture: f(&tex.texture)?,
                    tex_coord: tex.tex_coord,
                },
            ));
        }
        Ok(Material {
            name: self.name.clone(),
            base_color_factor: self.base_color_factor,
            metallic_factor: self.metallic_factor,
            roughness_factor: self.roughness_factor,
            emissive_factor: self.emissive_factor,
            alpha_mode: self.alpha_mode,
            alpha_cutoff: self.alpha_cutoff,
            double_sided: self.double_sided,
            textures,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture<I = ImageId, S = SamplerId> {
    pub name: Option<String>,
    pub image: I,
    pub sampler: Option<S>,
}

impl<I, S> Texture<I, S> {
    pub fn new(image: I) -> Self {
        Self {
            name: None,
            image,
            sampler: None,
        }
    }

    pub fn with_sampler(mut self, sampler: S) -> Self {
        self.sampler = Some(sampler);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub mime_type: Option<String>,
}

impl Image {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            name: None,
            uri: Some(uri.into()),
            mime_type: None,
        }
    }
}

/// Texture sampling parameters, as glTF GL enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    pub mag_filter: Option<u32>,
    pub min_filter: Option<u32>,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            mag_filter: None,
            min_filter: None,
            wrap_s: 10497, // REPEAT
            wrap_t: 10497,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skin<N = NodeId, A = AccessorId> {
    pub name: Option<String>,
    pub joints: Vec<N>,
    pub skeleton: Option<N>,
    pub inverse_bind_matrices: Option<A>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    Weights,
}

impl TargetPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPath::Translation => "translation",
            TargetPath::Rotation => "rotation",
            TargetPath::Scale => "scale",
            TargetPath::Weights => "weights",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
    CubicSpline,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Linear => "LINEAR",
            Interpolation::Step => "STEP",
            Interpolation::CubicSpline => "CUBICSPLINE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationChannel<N = NodeId> {
    /// Index into the owning animation's `samplers`.
    pub sampler: usize,
    pub node: N,
    pub path: TargetPath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSampler<A = AccessorId> {
    pub input: A,
    pub output: A,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation<N = NodeId, A = AccessorId> {
    pub name: Option<String>,
    pub channels: Vec<AnimationChannel<N>>,
    pub samplers: Vec<AnimationSampler<A>>,
}

/// Arena-backed input graph.
#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    accessors: Vec<AccessorModel>,
    primitives: Vec<Primitive>,
    meshes: Vec<Mesh>,
    nodes: Vec<Node>,
    scenes: Vec<Scene>,
    materials: Vec<Material>,
    textures: Vec<Texture>,
    images: Vec<Image>,
    samplers: Vec<Sampler>,
    skins: Vec<Skin>,
    animations: Vec<Animation>,
    default_scene: Option<SceneId>,
}

macro_rules! arena_accessors {
    ($add:ident, $get:ident, $all:ident, $field:ident, $ty:ty, $id:ident) => {
        pub fn $add(&mut self, value: $ty) -> $id {
            let id = $id(self.$field.len() as u32);
            self.$field.push(value);
            id
        }

        /// Looks up an entity, failing with `InvalidGraphReference` for a
        /// dangling id.
        pub fn $get(&self, id: $id) -> Status<&$ty> {
            self.$field
                .get(id.index())
                .ok_or_else(|| invalid_reference(format!("{} does not exist", id)))
        }

        pub fn $all(&self) -> &[$ty] {
            &self.$field
        }
    };
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    arena_accessors!(add_accessor, accessor, accessors, accessors, AccessorModel, AccessorId);
    arena_accessors!(add_primitive, primitive, primitives, primitives, Primitive, PrimitiveId);
    arena_accessors!(add_mesh, mesh, meshes, meshes, Mesh, MeshId);
    arena_accessors!(add_node, node, nodes, nodes, Node, NodeId);
    arena_accessors!(add_material, material, materials, materials, Material, MaterialId);
    arena_accessors!(add_texture, texture, textures, textures, Texture, TextureId);
    arena_accessors!(add_image, image, images, images, Image, ImageId);
    arena_accessors!(add_sampler, sampler, samplers, samplers, Sampler, SamplerId);
    arena_accessors!(add_skin, skin, skins, skins, Skin, SkinId);
    arena_accessors!(add_animation, animation, animations, animations, Animation, AnimationId);

    /// Adds a scene; the first scene added becomes the default one.
    pub fn add_scene(&mut self, scene: Scene) -> SceneId {
        let id = SceneId(self.scenes.len() as u32);
        self.scenes.push(scene);
        self.default_scene.get_or_insert(id);
        id
    }

    pub fn scene(&self, id: SceneId) -> Status<&Scene> {
        self.scenes
            .get(id.index())
            .ok_or_else(|| invalid_reference(format!("{} does not exist", id)))
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn default_scene(&self) -> Option<SceneId> {
        self.default_scene
    }

    pub fn set_default_scene(&mut self, scene: SceneId) {
        self.default_scene = Some(scene);
    }

    /// Appends `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Status<()> {
        let node = self
            .nodes
            .get_mut(parent.index())
            .ok_or_else(|| invalid_reference(format!("{} does not exist", parent)))?;
        node.children.push(child);
        Ok(())
    }
}
