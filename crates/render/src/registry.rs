//! Entity renderer registry: the GPU state derived from each registered descriptor.
//!
//! Bindings are stored in an arena and addressed by [`DescriptorHandle`]. The
//! id-to-handle map is filled during the build; at draw time a handle is a plain
//! index.

use hexscape_common::DescriptorId;
use std::collections::HashMap;

use crate::config::UniformNames;
use crate::context::{BufferTarget, BufferUsage, ComponentType, GraphicsContext, ShaderStage};
use crate::descriptor::EntityDescriptor;
use crate::entity::Entity;
use crate::error::{BuildError, DrawError};
use crate::program::{LinkedProgram, link_program};
use crate::shader::compile_shader;

/// Index of a binding inside a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorHandle(u32);

impl DescriptorHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The buffer backing one attribute location.
#[derive(Debug)]
pub(crate) struct StreamBuffer<C: GraphicsContext> {
    pub(crate) location: u32,
    pub(crate) target: BufferTarget,
    pub(crate) component_type: ComponentType,
    pub(crate) components: u8,
    pub(crate) buffer: C::Buffer,
    /// Vertices uploaded once at build time from the descriptor. Such a
    /// stream is never written again.
    pub(crate) static_vertices: Option<usize>,
}

impl<C: GraphicsContext> StreamBuffer<C> {
    pub(crate) fn is_static(&self) -> bool {
        self.static_vertices.is_some()
    }
}

/// Compiled program, resolved uniforms, and configured vertex layout for one descriptor.
#[derive(Debug)]
pub struct EntityRendererBinding<C: GraphicsContext> {
    pub(crate) descriptor: EntityDescriptor,
    pub(crate) program: LinkedProgram<C>,
    pub(crate) vertex_array: C::VertexArray,
    pub(crate) streams: Vec<StreamBuffer<C>>,
}

impl<C: GraphicsContext> EntityRendererBinding<C> {
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub(crate) fn stream(&self, location: u32) -> Option<&StreamBuffer<C>> {
        self.streams.iter().find(|s| s.location == location)
    }

    /// Check an entity's geometry against this layout and return the vertex count to draw.
    ///
    /// Dynamic data may only target streams without a static payload, and every
    /// stream must back at least as many vertices as are drawn.
    pub(crate) fn check_entity(&self, entity: &Entity) -> Result<i32, DrawError> {
        let descriptor = &self.descriptor.id;
        let mesh = entity.mesh();

        if let Some(mesh) = mesh {
            for input in &mesh.inputs {
                let stream = self
                    .stream(input.location)
                    .ok_or_else(|| DrawError::UnknownInput {
                        descriptor: descriptor.clone(),
                        location: input.location,
                    })?;
                if stream.is_static() {
                    return Err(DrawError::StaticInput {
                        descriptor: descriptor.clone(),
                        location: input.location,
                    });
                }
                if input.data.component_type() != stream.component_type {
                    return Err(DrawError::PayloadType {
                        descriptor: descriptor.clone(),
                        location: input.location,
                        declared: stream.component_type,
                        supplied: input.data.component_type(),
                    });
                }
            }
        }

        let vertex_count = mesh
            .and_then(|m| m.vertex_count)
            .unwrap_or(self.descriptor.vertex_count);
        for stream in &self.streams {
            let supplied = mesh
                .and_then(|m| m.input(stream.location))
                .map(|input| input.data.len() / usize::from(stream.components.max(1)));
            let Some(vertices) = stream.static_vertices.or(supplied) else {
                return Err(DrawError::MissingVertexData {
                    descriptor: descriptor.clone(),
                    location: stream.location,
                });
            };
            if vertices < vertex_count as usize {
                return Err(DrawError::VertexCount {
                    descriptor: descriptor.clone(),
                    location: stream.location,
                    vertices,
                    vertex_count,
                });
            }
        }

        i32::try_from(vertex_count).map_err(|_| DrawError::VertexCount {
            descriptor: descriptor.clone(),
            location: self.streams.first().map_or(0, |s| s.location),
            vertices: i32::MAX as usize,
            vertex_count,
        })
    }

    fn release(self, ctx: &mut C) {
        for stream in self.streams {
            ctx.delete_buffer(stream.buffer);
        }
        ctx.delete_vertex_array(self.vertex_array);
        self.program.release(ctx);
    }
}

/// All bindings of one renderer, in registration order.
#[derive(Debug)]
pub struct Registry<C: GraphicsContext> {
    bindings: Vec<EntityRendererBinding<C>>,
    index: HashMap<DescriptorId, DescriptorHandle>,
}

impl<C: GraphicsContext> Registry<C> {
    /// Build bindings for every descriptor, in order. On the first failure every
    /// object created so far is released and the error is returned.
    pub(crate) fn build(
        ctx: &mut C,
        descriptors: Vec<EntityDescriptor>,
        uniforms: &UniformNames,
    ) -> Result<Self, BuildError> {
        let _span = tracing::info_span!("registry_build", descriptors = descriptors.len()).entered();
        let mut registry = Self {
            bindings: Vec::with_capacity(descriptors.len()),
            index: HashMap::with_capacity(descriptors.len()),
        };
        for descriptor in descriptors {
            if let Err(err) = registry.register(ctx, descriptor, uniforms) {
                tracing::debug!(error = %err, "registry build aborted, releasing bindings");
                registry.release(ctx);
                return Err(err);
            }
        }
        Ok(registry)
    }

    fn register(
        &mut self,
        ctx: &mut C,
        descriptor: EntityDescriptor,
        uniforms: &UniformNames,
    ) -> Result<DescriptorHandle, BuildError> {
        if self.index.contains_key(&descriptor.id) {
            return Err(BuildError::DuplicateDescriptor(descriptor.id));
        }
        descriptor
            .validate()
            .map_err(|issue| BuildError::InvalidDescriptor {
                id: descriptor.id.clone(),
                issue,
            })?;

        let program = build_program(ctx, &descriptor, uniforms)?;
        let binding = configure_layout(ctx, descriptor, program)?;

        let handle = DescriptorHandle(self.bindings.len() as u32);
        tracing::debug!(
            id = %binding.descriptor.id,
            inputs = binding.streams.len(),
            handle = handle.0,
            "entity descriptor registered"
        );
        self.index.insert(binding.descriptor.id.clone(), handle);
        self.bindings.push(binding);
        Ok(handle)
    }

    pub fn resolve(&self, id: &DescriptorId) -> Option<DescriptorHandle> {
        self.index.get(id).copied()
    }

    pub fn get(&self, handle: DescriptorHandle) -> Option<&EntityRendererBinding<C>> {
        self.bindings.get(handle.index())
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &DescriptorId> {
        self.bindings.iter().map(|b| &b.descriptor.id)
    }

    pub fn contains(&self, id: &DescriptorId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn release(&mut self, ctx: &mut C) {
        self.index.clear();
        for binding in self.bindings.drain(..) {
            binding.release(ctx);
        }
    }
}

fn build_program<C: GraphicsContext>(
    ctx: &mut C,
    descriptor: &EntityDescriptor,
    uniforms: &UniformNames,
) -> Result<LinkedProgram<C>, BuildError> {
    let compile_err = |source| BuildError::Compile {
        id: descriptor.id.clone(),
        source,
    };
    let vertex =
        compile_shader(ctx, ShaderStage::Vertex, &descriptor.vertex_shader).map_err(compile_err)?;
    let fragment = match compile_shader(ctx, ShaderStage::Fragment, &descriptor.fragment_shader) {
        Ok(fragment) => fragment,
        Err(source) => {
            vertex.release(ctx);
            return Err(compile_err(source));
        }
    };
    link_program(ctx, vertex, fragment, uniforms).map_err(|source| BuildError::Link {
        id: descriptor.id.clone(),
        source,
    })
}

fn configure_layout<C: GraphicsContext>(
    ctx: &mut C,
    descriptor: EntityDescriptor,
    program: LinkedProgram<C>,
) -> Result<EntityRendererBinding<C>, BuildError> {
    let vertex_array = match ctx.create_vertex_array() {
        Ok(vertex_array) => vertex_array,
        Err(message) => {
            program.release(ctx);
            return Err(BuildError::Resource {
                id: descriptor.id,
                resource: "vertex array",
                message,
            });
        }
    };

    let mut streams = Vec::with_capacity(descriptor.inputs.len());
    let mut failure = None;
    for input in &descriptor.inputs {
        match ctx.create_buffer() {
            Ok(buffer) => streams.push(StreamBuffer {
                location: input.location,
                target: input.buffer_target,
                component_type: input.component_type,
                components: input.components,
                buffer,
                static_vertices: input.vertices(),
            }),
            Err(message) => {
                failure = Some(message);
                break;
            }
        }
    }

    let binding = EntityRendererBinding {
        descriptor,
        program,
        vertex_array,
        streams,
    };
    if let Some(message) = failure {
        let id = binding.descriptor.id.clone();
        binding.release(ctx);
        return Err(BuildError::Resource {
            id,
            resource: "vertex buffer",
            message,
        });
    }

    ctx.bind_vertex_array(Some(&binding.vertex_array));
    for (input, stream) in binding.descriptor.inputs.iter().zip(&binding.streams) {
        ctx.bind_buffer(input.buffer_target, Some(&stream.buffer));
        if let Some(data) = &input.data {
            ctx.buffer_data(input.buffer_target, data.as_bytes(), BufferUsage::StaticDraw);
        }
        ctx.enable_vertex_attrib_array(input.location);
        ctx.vertex_attrib_pointer(
            input.location,
            input.components,
            input.component_type,
            false,
            0,
            0,
        );
    }
    ctx.bind_vertex_array(None);

    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DrawMode;
    use crate::descriptor::{InputDescriptor, VertexData};
    use crate::entity::DynamicMesh;
    use crate::recording::{Call, ObjectKind, RecordingContext};
    use glam::Vec3;

    const VS: &str = "layout(location = 0) in vec4 position; uniform mat4 uModelViewMatrix; uniform mat4 uProjectionMatrix;";
    const FS: &str = "out vec4 fragColor; void main() { fragColor = vec4(1.0); }";

    fn descriptor(id: &str, inputs: Vec<InputDescriptor>) -> EntityDescriptor {
        EntityDescriptor {
            id: id.into(),
            vertex_shader: VS.into(),
            fragment_shader: FS.into(),
            inputs,
            draw_mode: DrawMode::TriangleStrip,
            vertex_count: 4,
        }
    }

    fn quad(id: &str) -> EntityDescriptor {
        descriptor(
            id,
            vec![InputDescriptor::float(0, 2).with_data(vec![
                1.0f32, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0,
            ])],
        )
    }

    fn build(
        ctx: &mut RecordingContext,
        descriptors: Vec<EntityDescriptor>,
    ) -> Result<Registry<RecordingContext>, BuildError> {
        Registry::build(ctx, descriptors, &UniformNames::default())
    }

    #[test]
    fn registers_in_order_with_dense_handles() {
        let mut ctx = RecordingContext::default();
        let registry = build(&mut ctx, vec![quad("a"), quad("b")]).unwrap();
        assert_eq!(registry.len(), 2);
        let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(registry.resolve(&"b".into()).map(|h| h.index()), Some(1));
        assert!(registry.resolve(&"c".into()).is_none());
    }

    #[test]
    fn layout_is_configured_once_against_the_input_buffer() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let registry = build(&mut ctx, vec![quad("a")]).unwrap();
        let binding = registry.get(DescriptorHandle(0)).unwrap();
        let buffer = binding.streams[0].buffer;

        let pointers: Vec<Call> = journal
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::VertexAttribPointer { .. }))
            .collect();
        assert_eq!(
            pointers,
            vec![Call::VertexAttribPointer {
                vertex_array: Some(binding.vertex_array),
                buffer: Some(buffer),
                location: 0,
                components: 2,
                component_type: ComponentType::Float,
                normalized: false,
                stride: 0,
                offset: 0,
            }]
        );
        assert_eq!(
            journal.count(|c| matches!(
                c,
                Call::BufferData {
                    len: 32,
                    usage: BufferUsage::StaticDraw,
                    ..
                }
            )),
            1
        );
        assert_eq!(journal.calls().last(), Some(&Call::BindVertexArray(None)));
    }

    #[test]
    fn one_buffer_per_input() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let d = descriptor(
            "colored",
            vec![
                InputDescriptor::float(0, 2).with_data(vec![0.0f32; 8]),
                InputDescriptor::float(1, 4).with_data(vec![1.0f32; 16]),
            ],
        );
        let registry = build(&mut ctx, vec![d]).unwrap();
        let binding = registry.get(DescriptorHandle(0)).unwrap();
        assert_ne!(binding.streams[0].buffer, binding.streams[1].buffer);
        assert_eq!(journal.live_buffers(), 2);
        assert_eq!(journal.live_vertex_arrays(), 1);
    }

    #[test]
    fn duplicate_id_aborts_and_releases_everything() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let err = build(&mut ctx, vec![quad("a"), quad("a")]).unwrap_err();
        assert_eq!(err, BuildError::DuplicateDescriptor("a".into()));
        assert!(journal.is_released());
    }

    #[test]
    fn invalid_descriptor_is_rejected_before_compiling() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let err = build(&mut ctx, vec![descriptor("empty", vec![])]).unwrap_err();
        assert!(matches!(err, BuildError::InvalidDescriptor { .. }));
        assert_eq!(journal.count(|c| matches!(c, Call::CreateShader { .. })), 0);
    }

    #[test]
    fn fragment_failure_releases_vertex_stage() {
        let mut ctx = RecordingContext::default().fail_compile_on("fragColor", "bad output");
        let journal = ctx.journal();
        let err = build(&mut ctx, vec![quad("a")]).unwrap_err();
        match err {
            BuildError::Compile { id, source } => {
                assert_eq!(id.as_str(), "a");
                assert_eq!(source.stage, ShaderStage::Fragment);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(journal.is_released());
    }

    #[test]
    fn allocation_failures_release_partial_binding() {
        for kind in [ObjectKind::VertexArray, ObjectKind::Buffer] {
            let mut ctx = RecordingContext::default().refuse(kind);
            let journal = ctx.journal();
            let err = build(&mut ctx, vec![quad("a")]).unwrap_err();
            assert!(matches!(err, BuildError::Resource { .. }), "{kind:?}");
            assert!(journal.is_released(), "{kind:?}");
        }
    }

    #[test]
    fn static_entity_needs_static_inputs() {
        let mut ctx = RecordingContext::default();
        let dynamic = descriptor("line", vec![InputDescriptor::float(0, 2)]);
        let registry = build(&mut ctx, vec![dynamic]).unwrap();
        let binding = registry.get(DescriptorHandle(0)).unwrap();

        let err = binding.check_entity(&Entity::new("line", Vec3::ZERO)).unwrap_err();
        assert_eq!(
            err,
            DrawError::MissingVertexData {
                descriptor: "line".into(),
                location: 0
            }
        );

        let ok = Entity::dynamic(
            "line",
            Vec3::ZERO,
            DynamicMesh::new().with_input(0, vec![0.0f32, 0.0, 1.0, 1.0]).with_vertex_count(2),
        );
        assert_eq!(binding.check_entity(&ok), Ok(2));
    }

    fn mixed() -> EntityDescriptor {
        descriptor(
            "mixed",
            vec![
                InputDescriptor::float(0, 2).with_data(vec![
                    1.0f32, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, -1.0,
                ]),
                InputDescriptor::float(1, 4),
            ],
        )
    }

    fn colors(vertices: usize) -> DynamicMesh {
        DynamicMesh::new().with_input(1, vec![1.0f32; vertices * 4])
    }

    #[test]
    fn dynamic_payloads_are_checked_against_layout() {
        let mut ctx = RecordingContext::default();
        let registry = build(&mut ctx, vec![mixed()]).unwrap();
        let binding = registry.get(DescriptorHandle(0)).unwrap();

        let unknown = Entity::dynamic("mixed", Vec3::ZERO, colors(4).with_input(7, vec![0.0f32]));
        assert!(matches!(
            binding.check_entity(&unknown),
            Err(DrawError::UnknownInput { location: 7, .. })
        ));

        let mut mesh = DynamicMesh::new();
        mesh.inputs.push(crate::entity::MeshInput {
            location: 1,
            data: VertexData::UnsignedShort(vec![1, 2, 3, 4]),
        });
        assert!(matches!(
            binding.check_entity(&Entity::dynamic("mixed", Vec3::ZERO, mesh)),
            Err(DrawError::PayloadType { location: 1, .. })
        ));

        let ok = Entity::dynamic("mixed", Vec3::ZERO, colors(4));
        assert_eq!(binding.check_entity(&ok), Ok(4));
    }

    #[test]
    fn static_streams_cannot_be_overwritten() {
        let mut ctx = RecordingContext::default();
        let registry = build(&mut ctx, vec![mixed()]).unwrap();
        let binding = registry.get(DescriptorHandle(0)).unwrap();

        let overriding = Entity::dynamic(
            "mixed",
            Vec3::ZERO,
            colors(4).with_input(0, vec![0.0f32, 0.0]),
        );
        assert_eq!(
            binding.check_entity(&overriding),
            Err(DrawError::StaticInput {
                descriptor: "mixed".into(),
                location: 0
            })
        );
    }

    #[test]
    fn vertex_count_must_fit_every_stream() {
        let mut ctx = RecordingContext::default();
        let registry = build(&mut ctx, vec![mixed()]).unwrap();
        let binding = registry.get(DescriptorHandle(0)).unwrap();

        let short = Entity::dynamic("mixed", Vec3::ZERO, colors(2));
        assert_eq!(
            binding.check_entity(&short),
            Err(DrawError::VertexCount {
                descriptor: "mixed".into(),
                location: 1,
                vertices: 2,
                vertex_count: 4
            })
        );

        // The static stream holds four vertices, so a larger override fails on it.
        let beyond_static = Entity::dynamic("mixed", Vec3::ZERO, colors(5).with_vertex_count(5));
        assert!(matches!(
            binding.check_entity(&beyond_static),
            Err(DrawError::VertexCount { location: 0, vertices: 4, .. })
        ));

        let huge = Entity::dynamic("mixed", Vec3::ZERO, colors(1).with_vertex_count(u32::MAX));
        assert!(matches!(
            binding.check_entity(&huge),
            Err(DrawError::VertexCount { vertex_count: u32::MAX, .. })
        ));

        let fewer = Entity::dynamic("mixed", Vec3::ZERO, colors(4).with_vertex_count(3));
        assert_eq!(binding.check_entity(&fewer), Ok(3));
    }

    #[test]
    fn descriptor_count_beyond_static_payload_is_rejected_at_build() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let mut d = quad("a");
        d.vertex_count = 5;
        let err = build(&mut ctx, vec![d]).unwrap_err();
        assert!(matches!(
            err,
            BuildError::InvalidDescriptor {
                issue: crate::error::DescriptorIssue::VertexCount { vertices: 4, .. },
                ..
            }
        ));
        assert!(journal.is_released());
    }

    #[test]
    fn release_deletes_all_objects() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let mut registry = build(&mut ctx, vec![quad("a"), quad("b")]).unwrap();
        assert_eq!(journal.live_programs(), 2);
        registry.release(&mut ctx);
        assert!(registry.is_empty());
        assert!(journal.is_released());
    }
}
