use hexscape_common::DescriptorId;

use crate::context::{ComponentType, ShaderStage};
use crate::scene::SceneParameter;

/// Problems acquiring the drawing surface or its rendering context.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("no drawing surface was supplied to the renderer")]
    Missing,
    #[error("element <{0}> is not a drawing surface")]
    NotASurface(String),
    #[error("rendering context `{0}` is not supported by this surface")]
    UnsupportedContext(String),
}

/// A shader stage that did not compile. Carries the compiler's diagnostics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{stage} shader failed to compile: {log}")]
pub struct CompileError {
    pub stage: ShaderStage,
    pub log: String,
}

/// Program creation, link, or uniform resolution failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("unable to create shader program: {0}")]
    Allocation(String),
    #[error("unable to link shader program: {0}")]
    Failed(String),
    #[error("linked program has no `{0}` uniform")]
    MissingUniform(String),
}

/// A descriptor whose shape cannot be turned into a vertex layout.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorIssue {
    #[error("at least one input is required")]
    NoInputs,
    #[error("input at location {location} has {count} components, expected 1 to 4")]
    ComponentCount { location: u32, count: u8 },
    #[error("location {0} is declared more than once")]
    DuplicateLocation(u32),
    #[error("input at location {location} declares {declared} components but carries {supplied} data")]
    PayloadType {
        location: u32,
        declared: ComponentType,
        supplied: ComponentType,
    },
    #[error("input at location {location} carries {len} values, not a multiple of {components}")]
    PayloadLength {
        location: u32,
        len: usize,
        components: u8,
    },
    #[error("input at location {location} holds {vertices} vertices, fewer than the {vertex_count} drawn")]
    VertexCount {
        location: u32,
        vertices: usize,
        vertex_count: u32,
    },
}

/// Renderer construction failure. The build is all-or-nothing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("at least one entity descriptor must be registered")]
    EmptyRegistration,
    #[error("an entity descriptor with id `{0}` has already been registered")]
    DuplicateDescriptor(DescriptorId),
    #[error("entity descriptor `{id}` is invalid: {issue}")]
    InvalidDescriptor {
        id: DescriptorId,
        #[source]
        issue: DescriptorIssue,
    },
    #[error("entity descriptor `{id}`: {source}")]
    Compile {
        id: DescriptorId,
        #[source]
        source: CompileError,
    },
    #[error("entity descriptor `{id}`: {source}")]
    Link {
        id: DescriptorId,
        #[source]
        source: LinkError,
    },
    #[error("entity descriptor `{id}`: unable to create {resource}: {message}")]
    Resource {
        id: DescriptorId,
        resource: &'static str,
        message: String,
    },
}

impl BuildError {
    /// Descriptor the failure is attributed to, if any.
    pub fn descriptor(&self) -> Option<&DescriptorId> {
        match self {
            BuildError::DuplicateDescriptor(id)
            | BuildError::InvalidDescriptor { id, .. }
            | BuildError::Compile { id, .. }
            | BuildError::Link { id, .. }
            | BuildError::Resource { id, .. } => Some(id),
            BuildError::Surface(_) | BuildError::EmptyRegistration => None,
        }
    }
}

/// A frame that was abandoned. The renderer stays usable for the next frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("no renderer found for descriptor `{0}`")]
    UnknownDescriptor(DescriptorId),
    #[error("entity of `{descriptor}` supplies data for location {location}, which the descriptor does not declare")]
    UnknownInput {
        descriptor: DescriptorId,
        location: u32,
    },
    #[error("entity of `{descriptor}` supplies data for location {location}, which holds the descriptor's static payload")]
    StaticInput {
        descriptor: DescriptorId,
        location: u32,
    },
    #[error("entity of `{descriptor}` supplies no vertex data for location {location}")]
    MissingVertexData {
        descriptor: DescriptorId,
        location: u32,
    },
    #[error("entity of `{descriptor}` supplies {supplied} data for location {location}, declared as {declared}")]
    PayloadType {
        descriptor: DescriptorId,
        location: u32,
        declared: ComponentType,
        supplied: ComponentType,
    },
    #[error("entity of `{descriptor}` draws {vertex_count} vertices but location {location} holds {vertices}")]
    VertexCount {
        descriptor: DescriptorId,
        location: u32,
        vertices: usize,
        vertex_count: u32,
    },
}

/// Scene construction failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("you must provide a {0}")]
    MissingParameter(SceneParameter),
    #[error("{parameter} must be a positive number, got {value}")]
    InvalidParameter { parameter: SceneParameter, value: f32 },
    #[error("far plane ({far}) must lie beyond the near plane ({near})")]
    DepthRange { near: f32, far: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_names_descriptor() {
        let err = BuildError::Compile {
            id: "hexTile".into(),
            source: CompileError {
                stage: ShaderStage::Vertex,
                log: "ERROR: 0:3: syntax error".into(),
            },
        };
        assert_eq!(err.descriptor().map(|d| d.as_str()), Some("hexTile"));
        let text = err.to_string();
        assert!(text.contains("hexTile"));
        assert!(text.contains("vertex shader failed to compile"));
    }

    #[test]
    fn surface_errors_are_transparent() {
        let err = BuildError::from(SurfaceError::Missing);
        assert_eq!(err.to_string(), SurfaceError::Missing.to_string());
        assert!(err.descriptor().is_none());
    }

    #[test]
    fn draw_error_mentions_id() {
        let err = DrawError::UnknownDescriptor("ghost".into());
        assert_eq!(err.to_string(), "no renderer found for descriptor `ghost`");
    }
}
