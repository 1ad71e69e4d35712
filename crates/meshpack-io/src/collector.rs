//! Scene graph traversal with identity-based deduplication.
//!
//! Traversal order: scenes, then each scene's root nodes depth first
//! (parent before children). For a node: its mesh, then its skin, then its
//! children. For a mesh: each primitive. For a primitive: the index
//! accessor, the attribute accessors, the morph-target accessors, then the
//! material with its textures, their samplers and images. Animations are
//! visited after all scenes.
//!
//! Every category keeps an id -> output slot map. The first encounter of an
//! id appends the entity to its output list; later encounters reuse the
//! slot. Equal contents under different ids are never merged.
//!
//! Nodes may be shared between scenes as roots, but a node has at most one
//! parent and a node with a parent is never a scene root.
//!
//! Accessors are handed to the [`BufferLayout`] as they are discovered. The
//! accessors a primitive introduces form one index region and one vertex
//! region (morph targets included); a skin's or an animation's new
//! accessors form one generic region.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

use log::{debug, trace};
use meshpack_core::status::invalid_reference;
use meshpack_core::{AccessorIndex, BufferLayout, BufferUsage, LayoutError, Status};

use crate::packed_model::{
    PackedAnimation, PackedMesh, PackedNode, PackedPrimitive, PackedScene, PackedSkin,
    PackedTexture, SceneEntities,
};
use crate::scene::{
    AccessorId, Animation, AnimationChannel, AnimationSampler, ImageId, MaterialId, MeshId, NodeId,
    PrimitiveId, Sampler, SamplerId, SceneGraph, SkinId, TextureId,
};

/// Output of a collection pass: the laid-out accessors plus entity lists.
#[derive(Debug, Clone)]
pub struct CollectedGraph {
    pub layout: BufferLayout,
    pub entities: SceneEntities,
}

/// Identity-keyed visited map that remembers each entity's output slot.
#[derive(Debug)]
struct SlotMap<K> {
    slots: HashMap<K, usize>,
}

impl<K: Eq + Hash + Copy + Display> SlotMap<K> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    fn get(&self, key: K) -> Option<usize> {
        let slot = self.slots.get(&key).copied();
        if slot.is_some() {
            trace!("{} already collected", key);
        }
        slot
    }

    fn insert(&mut self, key: K, slot: usize) {
        self.slots.insert(key, slot);
    }
}

pub struct Collector<'a> {
    graph: &'a SceneGraph,
    use_default_sampler: bool,
    layout: BufferLayout,
    out: SceneEntities,
    accessors: HashMap<AccessorId, (AccessorIndex, BufferUsage)>,
    primitives: SlotMap<PrimitiveId>,
    meshes: SlotMap<MeshId>,
    nodes: SlotMap<NodeId>,
    materials: SlotMap<MaterialId>,
    textures: SlotMap<TextureId>,
    images: SlotMap<ImageId>,
    samplers: SlotMap<SamplerId>,
    skins: SlotMap<SkinId>,
    skin_order: Vec<SkinId>,
    nodes_in_progress: HashSet<NodeId>,
    parents: HashMap<NodeId, NodeId>,
    default_sampler: Option<usize>,
}

impl<'a> Collector<'a> {
    pub fn new(graph: &'a SceneGraph) -> Self {
        Self {
            graph,
            use_default_sampler: false,
            layout: BufferLayout::new(),
            out: SceneEntities::default(),
            accessors: HashMap::new(),
            primitives: SlotMap::new(),
            meshes: SlotMap::new(),
            nodes: SlotMap::new(),
            materials: SlotMap::new(),
            textures: SlotMap::new(),
            images: SlotMap::new(),
            samplers: SlotMap::new(),
            skins: SlotMap::new(),
            skin_order: Vec::new(),
            nodes_in_progress: HashSet::new(),
            parents: HashMap::new(),
            default_sampler: None,
        }
    }

    /// Gives textures without a sampler one shared default sampler.
    pub fn with_default_sampler(mut self, enabled: bool) -> Self {
        self.use_default_sampler = enabled;
        self
    }

    pub fn collect(mut self) -> Status<CollectedGraph> {
        let graph = self.graph;
        if let Some(default_scene) = graph.default_scene() {
            graph
                .scene(default_scene)
                .map_err(|_| dangling(&"default scene", default_scene))?;
        }

        for (i, scene) in graph.scenes().iter().enumerate() {
            let owner = format!("scene {}", i);
            let mut roots = Vec::with_capacity(scene.nodes.len());
            for node in &scene.nodes {
                roots.push(self.visit_node(*node, &owner)?);
            }
            self.out.scenes.push(PackedScene {
                name: scene.name.clone(),
                nodes: roots,
            });
        }
        for scene in graph.scenes() {
            for root in &scene.nodes {
                if let Some(parent) = self.parents.get(root) {
                    return Err(invalid_reference(format!(
                        "{} is a scene root but also a child of {}",
                        root, parent
                    )));
                }
            }
        }
        self.out.default_scene = graph.default_scene().map(|s| s.index());

        for (i, animation) in graph.animations().iter().enumerate() {
            let packed = self.collect_animation(i, animation)?;
            self.out.animations.push(packed);
        }

        self.resolve_skins()?;

        debug!(
            "collected {} accessors, {} regions, {} meshes, {} primitives, {} nodes, {} materials",
            self.layout.num_accessors(),
            self.layout.regions().len(),
            self.out.meshes.len(),
            self.out.primitives.len(),
            self.out.nodes.len(),
            self.out.materials.len()
        );

        Ok(CollectedGraph {
            layout: self.layout,
            entities: self.out,
        })
    }

    fn visit_node(&mut self, id: NodeId, owner: &dyn Display) -> Status<usize> {
        if self.nodes_in_progress.contains(&id) {
            return Err(invalid_reference(format!(
                "{} is its own ancestor (cycle via {})",
                id, owner
            )));
        }
        if let Some(slot) = self.nodes.get(id) {
            return Ok(slot);
        }
        let graph = self.graph;
        let node = graph.node(id).map_err(|_| dangling(owner, id))?;

        let slot = self.out.nodes.len();
        self.nodes.insert(id, slot);
        self.out.nodes.push(PackedNode::new(node.name.as_deref()));
        self.nodes_in_progress.insert(id);

        let mesh = match node.mesh {
            Some(mesh) => Some(self.visit_mesh(mesh, &id)?),
            None => None,
        };
        let skin = match node.skin {
            Some(skin) => Some(self.visit_skin(skin, &id)?),
            None => None,
        };
        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            if let Some(first) = self.parents.insert(*child, id) {
                return Err(invalid_reference(format!(
                    "{} has more than one parent ({} and {})",
                    child, first, id
                )));
            }
            children.push(self.visit_node(*child, &id)?);
        }

        self.nodes_in_progress.remove(&id);
        let packed = &mut self.out.nodes[slot];
        packed.transform = node.transform;
        packed.mesh = mesh;
        packed.skin = skin;
        packed.children = children;
        Ok(slot)
    }

    fn visit_mesh(&mut self, id: MeshId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.meshes.get(id) {
            return Ok(slot);
        }
        let graph = self.graph;
        let mesh = graph.mesh(id).map_err(|_| dangling(owner, id))?;

        let mut primitives = Vec::with_capacity(mesh.primitives.len());
        for primitive in &mesh.primitives {
            primitives.push(self.visit_primitive(*primitive, &id)?);
        }

        let slot = self.out.meshes.len();
        self.meshes.insert(id, slot);
        self.out.meshes.push(PackedMesh {
            name: mesh.name.clone(),
            primitives,
            weights: mesh.weights.clone(),
        });
        Ok(slot)
    }

    fn visit_primitive(&mut self, id: PrimitiveId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.primitives.get(id) {
            return Ok(slot);
        }
        let graph = self.graph;
        let primitive = graph.primitive(id).map_err(|_| dangling(owner, id))?;

        let mut index_members = Vec::new();
        let mut vertex_members = Vec::new();

        let indices = match primitive.indices {
            Some(accessor) => {
                Some(self.visit_accessor(accessor, BufferUsage::Index, &id, &mut index_members)?)
            }
            None => None,
        };

        let mut attributes = Vec::with_capacity(primitive.attributes.len());
        for (name, accessor) in &primitive.attributes {
            let index = self.visit_accessor(*accessor, BufferUsage::Vertex, &id, &mut vertex_members)?;
            attributes.push((name.clone(), index));
        }

        let mut targets = Vec::with_capacity(primitive.targets.len());
        for target in &primitive.targets {
            let mut packed_target = Vec::with_capacity(target.len());
            for (name, accessor) in target {
                let index =
                    self.visit_accessor(*accessor, BufferUsage::Vertex, &id, &mut vertex_members)?;
                packed_target.push((name.clone(), index));
            }
            targets.push(packed_target);
        }

        if !index_members.is_empty() {
            self.layout
                .add_region(BufferUsage::Index, index_members)
                .map_err(|e| in_context(e, id))?;
        }
        if !vertex_members.is_empty() {
            self.layout
                .add_region(BufferUsage::Vertex, vertex_members)
                .map_err(|e| in_context(e, id))?;
        }

        let material = match primitive.material {
            Some(material) => Some(self.visit_material(material, &id)?),
            None => None,
        };

        let slot = self.out.primitives.len();
        self.primitives.insert(id, slot);
        self.out.primitives.push(PackedPrimitive {
            mode: primitive.mode,
            indices,
            attributes,
            targets,
            material,
        });
        Ok(slot)
    }

    /// Resolves an accessor, adding it to the layout on first encounter.
    ///
    /// Newly added accessors are pushed to `new_members` so the caller can
    /// group them into a region.
    fn visit_accessor(
        &mut self,
        id: AccessorId,
        usage: BufferUsage,
        owner: &dyn Display,
        new_members: &mut Vec<AccessorIndex>,
    ) -> Status<AccessorIndex> {
        if let Some((index, seen_usage)) = self.accessors.get(&id).copied() {
            if seen_usage != usage {
                return Err(LayoutError::UsageConflict(format!(
                    "{} is used as {:?} data by {} but was first collected as {:?} data",
                    id, usage, owner, seen_usage
                )));
            }
            trace!("{} already collected as accessor {}", id, index);
            return Ok(index);
        }
        let graph = self.graph;
        let accessor = graph.accessor(id).map_err(|_| dangling(owner, id))?;
        accessor.check_raw_length(&format!("{} referenced by {}", id, owner))?;

        let index = self.layout.add_accessor(accessor.clone());
        self.accessors.insert(id, (index, usage));
        new_members.push(index);
        Ok(index)
    }

    fn visit_material(&mut self, id: MaterialId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.materials.get(id) {
            return Ok(slot);
        }
        let graph = self.graph;
        let material = graph.material(id).map_err(|_| dangling(owner, id))?;
        let packed = material.try_map_textures(|texture| self.visit_texture(*texture, &id))?;

        let slot = self.out.materials.len();
        self.materials.insert(id, slot);
        self.out.materials.push(packed);
        Ok(slot)
    }

    fn visit_texture(&mut self, id: TextureId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.textures.get(id) {
            return Ok(slot);
        }
        let graph = self.graph;
        let texture = graph.texture(id).map_err(|_| dangling(owner, id))?;

        let sampler = match texture.sampler {
            Some(sampler) => Some(self.visit_sampler(sampler, &id)?),
            None if self.use_default_sampler => Some(self.shared_default_sampler()),
            None => None,
        };
        let image = self.visit_image(texture.image, &id)?;

        let slot = self.out.textures.len();
        self.textures.insert(id, slot);
        self.out.textures.push(PackedTexture {
            name: texture.name.clone(),
            image,
            sampler,
        });
        Ok(slot)
    }

    fn visit_image(&mut self, id: ImageId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.images.get(id) {
            return Ok(slot);
        }
        let image = self.graph.image(id).map_err(|_| dangling(owner, id))?;
        let slot = self.out.images.len();
        self.images.insert(id, slot);
        self.out.images.push(image.clone());
        Ok(slot)
    }

    fn visit_sampler(&mut self, id: SamplerId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.samplers.get(id) {
            return Ok(slot);
        }
        let sampler = self.graph.sampler(id).map_err(|_| dangling(owner, id))?;
        let slot = self.out.samplers.len();
        self.samplers.insert(id, slot);
        self.out.samplers.push(*sampler);
        Ok(slot)
    }

    /// Created on first use, then shared by every sampler-less texture of
    /// this collection pass.
    fn shared_default_sampler(&mut self) -> usize {
        if let Some(slot) = self.default_sampler {
            return slot;
        }
        let slot = self.out.samplers.len();
        self.out.samplers.push(Sampler::default());
        self.default_sampler = Some(slot);
        slot
    }

    fn visit_skin(&mut self, id: SkinId, owner: &dyn Display) -> Status<usize> {
        if let Some(slot) = self.skins.get(id) {
            return Ok(slot);
        }
        let graph = self.graph;
        let skin = graph.skin(id).map_err(|_| dangling(owner, id))?;

        let mut members = Vec::new();
        let inverse_bind_matrices = match skin.inverse_bind_matrices {
            Some(accessor) => {
                Some(self.visit_accessor(accessor, BufferUsage::Generic, &id, &mut members)?)
            }
            None => None,
        };
        if !members.is_empty() {
            self.layout
                .add_region(BufferUsage::Generic, members)
                .map_err(|e| in_context(e, id))?;
        }

        // Joints are resolved once the whole hierarchy is known.
        let slot = self.out.skins.len();
        self.skins.insert(id, slot);
        self.skin_order.push(id);
        self.out.skins.push(PackedSkin {
            name: skin.name.clone(),
            joints: Vec::new(),
            skeleton: None,
            inverse_bind_matrices,
        });
        Ok(slot)
    }

    fn resolve_skins(&mut self) -> Status<()> {
        let graph = self.graph;
        for (slot, id) in self.skin_order.iter().enumerate() {
            let skin = graph.skin(*id)?;
            let mut joints = Vec::with_capacity(skin.joints.len());
            for joint in &skin.joints {
                joints.push(self.reachable_node(*joint, id)?);
            }
            let skeleton = match skin.skeleton {
                Some(node) => Some(self.reachable_node(node, id)?),
                None => None,
            };
            let packed = &mut self.out.skins[slot];
            packed.joints = joints;
            packed.skeleton = skeleton;
        }
        Ok(())
    }

    fn collect_animation(
        &mut self,
        position: usize,
        animation: &Animation,
    ) -> Status<PackedAnimation> {
        let owner = format!("animation {}", position);
        let mut members = Vec::new();

        let mut samplers = Vec::with_capacity(animation.samplers.len());
        for sampler in &animation.samplers {
            let input = self.visit_accessor(sampler.input, BufferUsage::Generic, &owner, &mut members)?;
            let output =
                self.visit_accessor(sampler.output, BufferUsage::Generic, &owner, &mut members)?;
            samplers.push(AnimationSampler {
                input,
                output,
                interpolation: sampler.interpolation,
            });
        }
        if !members.is_empty() {
            self.layout
                .add_region(BufferUsage::Generic, members)
                .map_err(|e| in_context(e, &owner))?;
        }

        let mut channels = Vec::with_capacity(animation.channels.len());
        for channel in &animation.channels {
            if channel.sampler >= samplers.len() {
                return Err(invalid_reference(format!(
                    "{} channel uses sampler {} but has only {}",
                    owner,
                    channel.sampler,
                    samplers.len()
                )));
            }
            channels.push(AnimationChannel {
                sampler: channel.sampler,
                node: self.reachable_node(channel.node, &owner)?,
                path: channel.path,
            });
        }

        Ok(PackedAnimation {
            name: animation.name.clone(),
            channels,
            samplers,
        })
    }

    /// Output slot of a node that must already have been reached from a
    /// scene.
    fn reachable_node(&self, id: NodeId, owner: &dyn Display) -> Status<usize> {
        self.nodes.get(id).ok_or_else(|| {
            invalid_reference(format!(
                "{} references {} which is not reachable from any scene",
                owner, id
            ))
        })
    }
}

fn dangling(owner: &dyn Display, target: impl Display) -> LayoutError {
    invalid_reference(format!("{} references {} which does not exist", owner, target))
}

/// Prefixes layout errors with the entity whose region failed.
fn in_context(error: LayoutError, owner: impl Display) -> LayoutError {
    match error {
        LayoutError::UnsupportedElementShape(msg) => {
            LayoutError::UnsupportedElementShape(format!("{}: {}", owner, msg))
        }
        LayoutError::InvalidGraphReference(msg) => {
            LayoutError::InvalidGraphReference(format!("{}: {}", owner, msg))
        }
        other => other,
    }
}
