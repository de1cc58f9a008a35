//! The graphics-context contract every backend implements.
//!
//! The renderer only talks to the GPU through [`GraphicsContext`]. Handle types
//! are backend-defined; enumeration values are forwarded to the backend as the
//! caller chose them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Programmable pipeline stage a shader is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Binding point a buffer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Numeric type of a single vertex component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Float,
}

impl ComponentType {
    pub fn size_in_bytes(&self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::Float => 4,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::Byte => "byte",
            ComponentType::UnsignedByte => "unsigned byte",
            ComponentType::Short => "short",
            ComponentType::UnsignedShort => "unsigned short",
            ComponentType::Float => "float",
        };
        f.write_str(name)
    }
}

/// Primitive topology used to assemble submitted vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Expected update frequency of a buffer's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
}

/// Depth comparison applied when depth testing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFunc {
    Less,
    LessOrEqual,
    Equal,
    Always,
}

/// Buffers cleared at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearBuffers {
    Color,
    ColorAndDepth,
}

/// A rendering context bound to one drawing surface.
///
/// Methods mirror the GL object model: objects are allocated, configured through
/// bind points, and released explicitly. Allocation failures are reported as the
/// backend's message; status queries report compile and link results.
pub trait GraphicsContext {
    type Shader: Clone + fmt::Debug;
    type Program: Clone + fmt::Debug;
    type Buffer: Clone + fmt::Debug;
    type VertexArray: Clone + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    /// Current drawable size in pixels.
    fn drawable_size(&self) -> (u32, u32);

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&mut self, shader: &Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: &Self::Shader);
    fn shader_compile_status(&self, shader: &Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self) -> Result<Self::Program, String>;
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    fn detach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&mut self, program: &Self::Program);
    fn program_link_status(&self, program: &Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> String;
    fn uniform_location(&self, program: &Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    fn use_program(&mut self, program: Option<&Self::Program>);
    fn delete_program(&mut self, program: Self::Program);

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&Self::Buffer>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>);
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);
    fn enable_vertex_attrib_array(&mut self, location: u32);
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u8,
        component_type: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    fn uniform_matrix4(&mut self, location: &Self::UniformLocation, matrix: &[f32; 16]);

    fn clear_color(&mut self, rgba: [f32; 4]);
    fn enable_depth_test(&mut self, func: DepthFunc);
    fn clear(&mut self, buffers: ClearBuffers);
    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32);
}
