//! Builds a [`PackedModel`] from a [`SceneGraph`]: collect, lay out, assemble.
//!
//! ```ignore
//! use meshpack_io::{BuildOptions, ModelBuilder};
//!
//! let model = ModelBuilder::new(&graph, BuildOptions::default()).build()?;
//! assert_eq!(model.buffers().buffers().len(), 1);
//! ```

use log::debug;
use meshpack_core::{AssemblerOptions, BufferAssembler, Status};

use crate::collector::{CollectedGraph, Collector};
use crate::packed_model::PackedModel;
use crate::scene::SceneGraph;

/// Options for a single build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Buffer alignment and split policy.
    pub assembler: AssemblerOptions,
    /// Give textures without a sampler one shared default sampler.
    pub default_sampler: bool,
    /// `asset.generator` written by the glTF writer.
    pub generator: Option<String>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assembler(mut self, assembler: AssemblerOptions) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_default_sampler(mut self, enabled: bool) -> Self {
        self.default_sampler = enabled;
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }
}

/// Single-use builder; [`ModelBuilder::build`] consumes it.
pub struct ModelBuilder<'a> {
    graph: &'a SceneGraph,
    options: BuildOptions,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(graph: &'a SceneGraph, options: BuildOptions) -> Self {
        Self { graph, options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn build(self) -> Status<PackedModel> {
        let CollectedGraph { layout, entities } = Collector::new(self.graph)
            .with_default_sampler(self.options.default_sampler)
            .collect()?;

        let buffers = BufferAssembler::new(self.options.assembler).assemble(layout)?;
        debug!(
            "built model with {} buffers, {} regions, {} accessors",
            buffers.buffers().len(),
            buffers.regions().len(),
            buffers.accessors().len()
        );

        Ok(PackedModel::new(buffers, entities, self.options.generator))
    }
}
