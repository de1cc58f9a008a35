use glam::Mat4;
use hexscape_common::DescriptorId;
use serde::Serialize;

use crate::config::RendererConfig;
use crate::context::{BufferUsage, ClearBuffers, GraphicsContext};
use crate::descriptor::EntityDescriptor;
use crate::entity::Entity;
use crate::error::{BuildError, DrawError, SurfaceError};
use crate::registry::{DescriptorHandle, Registry};
use crate::scene::Scene;

/// Everything a renderer is built from.
#[derive(Debug)]
pub struct RendererDesc<C> {
    pub surface: Option<C>,
    pub descriptors: Vec<EntityDescriptor>,
    pub config: RendererConfig,
}

impl<C> Default for RendererDesc<C> {
    fn default() -> Self {
        Self {
            surface: None,
            descriptors: Vec::new(),
            config: RendererConfig::default(),
        }
    }
}

/// What one frame submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FrameStats {
    pub entities: usize,
    pub draw_calls: usize,
    pub bytes_uploaded: usize,
}

/// Draws entities through the bindings built for their descriptors.
///
/// The renderer owns its context and every GPU object created through it; they
/// are released when the renderer is dropped. The registry never changes after
/// construction.
#[derive(Debug)]
pub struct Renderer<C: GraphicsContext> {
    ctx: C,
    registry: Registry<C>,
    config: RendererConfig,
}

impl<C: GraphicsContext> Renderer<C> {
    /// Validate the description and build every binding. Either all descriptors
    /// are registered or no renderer is returned.
    pub fn new(desc: RendererDesc<C>) -> Result<Self, BuildError> {
        let _span = tracing::info_span!("renderer_build").entered();
        let RendererDesc {
            surface,
            descriptors,
            config,
        } = desc;

        let mut ctx = surface.ok_or(SurfaceError::Missing)?;
        if descriptors.is_empty() {
            return Err(BuildError::EmptyRegistration);
        }

        let registry = Registry::build(&mut ctx, descriptors, &config.uniforms)?;

        ctx.clear_color(config.clear_color);
        ctx.clear(ClearBuffers::Color);
        if let Some(func) = config.depth_test {
            ctx.enable_depth_test(func);
        }

        let (width, height) = ctx.drawable_size();
        tracing::info!(descriptors = registry.len(), width, height, "renderer ready");

        Ok(Self {
            ctx,
            registry,
            config,
        })
    }

    pub fn builder() -> RendererBuilder<C> {
        RendererBuilder::default()
    }

    /// Perspective used by [`Renderer::draw_entities`], following the surface aspect.
    pub fn default_projection(&self) -> Mat4 {
        let (width, height) = self.ctx.drawable_size();
        self.config.perspective.matrix(width, height)
    }

    /// Draw `entities` in order under the default projection.
    ///
    /// Stops at the first entity that cannot be drawn; nothing after it is submitted.
    pub fn draw_entities(&mut self, entities: &[Entity]) -> Result<FrameStats, DrawError> {
        let _span = tracing::debug_span!("draw_frame", entities = entities.len()).entered();
        let projection = self.default_projection().to_cols_array();
        self.ctx.clear(ClearBuffers::ColorAndDepth);

        let mut stats = FrameStats::default();
        for entity in entities {
            let handle = self.lookup(entity.descriptor())?;
            self.draw_entity(handle, entity, &projection, &mut stats)?;
        }
        Ok(stats)
    }

    /// Draw a scene under its own projection, one descriptor group at a time.
    pub fn draw_scene(&mut self, scene: &Scene) -> Result<FrameStats, DrawError> {
        let _span = tracing::debug_span!("draw_scene", entities = scene.len()).entered();
        let projection = scene.projection().to_cols_array();
        self.ctx.clear(ClearBuffers::ColorAndDepth);

        let mut stats = FrameStats::default();
        for (id, entities) in scene.entities() {
            let handle = self.lookup(id)?;
            for entity in entities {
                self.draw_entity(handle, entity, &projection, &mut stats)?;
            }
        }
        Ok(stats)
    }

    fn lookup(&self, id: &DescriptorId) -> Result<DescriptorHandle, DrawError> {
        self.registry.resolve(id).ok_or_else(|| {
            tracing::warn!(%id, "draw aborted, descriptor is not registered");
            DrawError::UnknownDescriptor(id.clone())
        })
    }

    fn draw_entity(
        &mut self,
        handle: DescriptorHandle,
        entity: &Entity,
        projection: &[f32; 16],
        stats: &mut FrameStats,
    ) -> Result<(), DrawError> {
        let Self { ctx, registry, .. } = self;
        let Some(binding) = registry.get(handle) else {
            return Err(DrawError::UnknownDescriptor(entity.descriptor().clone()));
        };
        let vertex_count = binding.check_entity(entity)?;

        ctx.bind_vertex_array(Some(&binding.vertex_array));
        if let Some(mesh) = entity.mesh() {
            for input in &mesh.inputs {
                if let Some(stream) = binding.stream(input.location) {
                    let bytes = input.data.as_bytes();
                    ctx.bind_buffer(stream.target, Some(&stream.buffer));
                    ctx.buffer_data(stream.target, bytes, BufferUsage::DynamicDraw);
                    stats.bytes_uploaded += bytes.len();
                }
            }
        }

        ctx.use_program(Some(&binding.program.handle));
        ctx.uniform_matrix4(&binding.program.projection, projection);
        ctx.uniform_matrix4(
            &binding.program.model_view,
            &entity.model_view().to_cols_array(),
        );
        ctx.draw_arrays(binding.descriptor.draw_mode, 0, vertex_count);
        ctx.bind_vertex_array(None);

        stats.entities += 1;
        stats.draw_calls += 1;
        tracing::trace!(descriptor = %binding.descriptor.id, vertex_count, "entity drawn");
        Ok(())
    }

    pub fn handle(&self, id: &DescriptorId) -> Option<DescriptorHandle> {
        self.registry.resolve(id)
    }

    pub fn contains(&self, id: &DescriptorId) -> bool {
        self.registry.contains(id)
    }

    pub fn descriptor(&self, id: &DescriptorId) -> Option<&EntityDescriptor> {
        let handle = self.registry.resolve(id)?;
        self.registry.get(handle).map(|b| b.descriptor())
    }

    /// Registered descriptor ids in registration order.
    pub fn descriptor_ids(&self) -> impl Iterator<Item = &DescriptorId> {
        self.registry.ids()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    /// For surface housekeeping such as resizing. Objects owned by the renderer
    /// must not be deleted through this.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }
}

impl<C: GraphicsContext> Drop for Renderer<C> {
    fn drop(&mut self) {
        tracing::debug!(descriptors = self.registry.len(), "releasing renderer");
        self.registry.release(&mut self.ctx);
    }
}

/// Chained setters over [`RendererDesc`].
#[derive(Debug)]
pub struct RendererBuilder<C> {
    desc: RendererDesc<C>,
}

impl<C> Default for RendererBuilder<C> {
    fn default() -> Self {
        Self {
            desc: RendererDesc::default(),
        }
    }
}

impl<C: GraphicsContext> RendererBuilder<C> {
    pub fn with_surface(mut self, surface: C) -> Self {
        self.desc.surface = Some(surface);
        self
    }

    pub fn with_config(mut self, config: RendererConfig) -> Self {
        self.desc.config = config;
        self
    }

    pub fn register_entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.desc.descriptors.push(descriptor);
        self
    }

    pub fn build(self) -> Result<Renderer<C>, BuildError> {
        Renderer::new(self.desc)
    }
}
