//! Entity renderer: compiles per-descriptor shader programs, configures vertex
//! layouts, and draws positioned entities through a [`GraphicsContext`].
//!
//! # Invariants
//! - The set of registered descriptors is fixed once a renderer is built.
//! - A failed build leaves no GPU object alive.
//! - Every drawn entity issues exactly one draw call, in submission order.
//! - A draw error stops the frame at the failing entity; earlier draws stand.

mod config;
mod context;
mod descriptor;
mod entity;
mod error;
mod program;
pub mod recording;
mod registry;
mod renderer;
mod scene;
mod shader;

pub use config::{PerspectiveConfig, RendererConfig, UniformNames};
pub use context::{
    BufferTarget, BufferUsage, ClearBuffers, ComponentType, DepthFunc, DrawMode, GraphicsContext,
    ShaderStage,
};
pub use descriptor::{EntityDescriptor, InputDescriptor, VertexData};
pub use entity::{DynamicMesh, Entity, MeshInput};
pub use error::{
    BuildError, CompileError, DescriptorIssue, DrawError, LinkError, SceneError, SurfaceError,
};
pub use hexscape_common::{DescriptorId, Placement, Transform};
pub use registry::{DescriptorHandle, EntityRendererBinding, Registry};
pub use renderer::{FrameStats, Renderer, RendererBuilder, RendererDesc};
pub use scene::{Scene, SceneBuilder, SceneParameter, SceneParams};

pub fn crate_info() -> &'static str {
    "hexscape-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
