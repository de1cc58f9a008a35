use glow::HasContext;
use hexscape_render::{
    BufferTarget, BufferUsage, ClearBuffers, ComponentType, DepthFunc, DrawMode,
    GraphicsContext, ShaderStage,
};
use std::fmt;

/// A [`GraphicsContext`] over a `glow::Context`.
pub struct GlowContext {
    gl: glow::Context,
    size: (u32, u32),
}

impl fmt::Debug for GlowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowContext")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl GlowContext {
    /// Wrap a loaded GL context whose default framebuffer is `width` x `height`.
    ///
    /// # Safety
    /// `gl` must be current on this thread for as long as the returned value
    /// (and any renderer that owns it) is used.
    pub unsafe fn new(gl: glow::Context, width: u32, height: u32) -> Self {
        let version = gl.version();
        tracing::info!(
            major = version.major,
            minor = version.minor,
            embedded = version.is_embedded,
            width,
            height,
            "glow context attached"
        );
        Self {
            gl,
            size: (width, height),
        }
    }

    /// Track a new framebuffer size and update the viewport to match.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        // SAFETY: the context is current, see `GlowContext::new`.
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

pub(crate) fn shader_type(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

pub(crate) fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub(crate) fn data_type(ty: ComponentType) -> u32 {
    match ty {
        ComponentType::Byte => glow::BYTE,
        ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
        ComponentType::Short => glow::SHORT,
        ComponentType::UnsignedShort => glow::UNSIGNED_SHORT,
        ComponentType::Float => glow::FLOAT,
    }
}

pub(crate) fn primitive(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::Points => glow::POINTS,
        DrawMode::Lines => glow::LINES,
        DrawMode::LineLoop => glow::LINE_LOOP,
        DrawMode::LineStrip => glow::LINE_STRIP,
        DrawMode::Triangles => glow::TRIANGLES,
        DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
        DrawMode::TriangleFan => glow::TRIANGLE_FAN,
    }
}

pub(crate) fn usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
    }
}

pub(crate) fn depth_func(func: DepthFunc) -> u32 {
    match func {
        DepthFunc::Less => glow::LESS,
        DepthFunc::LessOrEqual => glow::LEQUAL,
        DepthFunc::Equal => glow::EQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

pub(crate) fn clear_mask(buffers: ClearBuffers) -> u32 {
    match buffers {
        ClearBuffers::Color => glow::COLOR_BUFFER_BIT,
        ClearBuffers::ColorAndDepth => glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT,
    }
}

// SAFETY (all blocks below): the context is current, see `GlowContext::new`.
// Handles passed in were created by this same context.
impl GraphicsContext for GlowContext {
    type Shader = <glow::Context as HasContext>::Shader;
    type Program = <glow::Context as HasContext>::Program;
    type Buffer = <glow::Context as HasContext>::Buffer;
    type VertexArray = <glow::Context as HasContext>::VertexArray;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(shader_type(stage)) }
    }

    fn shader_source(&mut self, shader: &Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(*shader, source) }
    }

    fn compile_shader(&mut self, shader: &Self::Shader) {
        unsafe { self.gl.compile_shader(*shader) }
    }

    fn shader_compile_status(&self, shader: &Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(*shader) }
    }

    fn shader_info_log(&self, shader: &Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(*shader) }
    }

    fn delete_shader(&mut self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&mut self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader) {
        unsafe { self.gl.attach_shader(*program, *shader) }
    }

    fn detach_shader(&mut self, program: &Self::Program, shader: &Self::Shader) {
        unsafe { self.gl.detach_shader(*program, *shader) }
    }

    fn link_program(&mut self, program: &Self::Program) {
        unsafe { self.gl.link_program(*program) }
    }

    fn program_link_status(&self, program: &Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(*program) }
    }

    fn program_info_log(&self, program: &Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(*program) }
    }

    fn uniform_location(
        &self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(*program, name) }
    }

    fn use_program(&mut self, program: Option<&Self::Program>) {
        unsafe { self.gl.use_program(program.copied()) }
    }

    fn delete_program(&mut self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn create_buffer(&mut self) -> Result<Self::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&Self::Buffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer.copied()) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], buffer_usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, usage(buffer_usage))
        }
    }

    fn delete_buffer(&mut self, buffer: Self::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&Self::VertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.copied()) }
    }

    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u8,
        component_type: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                i32::from(components),
                data_type(component_type),
                normalized,
                stride,
                offset,
            )
        }
    }

    fn uniform_matrix4(&mut self, location: &Self::UniformLocation, matrix: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, matrix)
        }
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn enable_depth_test(&mut self, func: DepthFunc) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.depth_func(depth_func(func));
        }
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        unsafe { self.gl.clear(clear_mask(buffers)) }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive(mode), first, count) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_map_to_gl_constants() {
        assert_eq!(shader_type(ShaderStage::Vertex), 0x8B31);
        assert_eq!(shader_type(ShaderStage::Fragment), 0x8B30);
        assert_eq!(buffer_target(BufferTarget::Array), 0x8892);
        assert_eq!(buffer_target(BufferTarget::ElementArray), 0x8893);
        assert_eq!(data_type(ComponentType::Float), 0x1406);
        assert_eq!(data_type(ComponentType::UnsignedShort), 0x1403);
        assert_eq!(usage(BufferUsage::StaticDraw), 0x88E4);
        assert_eq!(usage(BufferUsage::DynamicDraw), 0x88E8);
        assert_eq!(depth_func(DepthFunc::LessOrEqual), 0x0203);
    }

    #[test]
    fn draw_modes_keep_gl_ordering() {
        let modes = [
            DrawMode::Points,
            DrawMode::Lines,
            DrawMode::LineLoop,
            DrawMode::LineStrip,
            DrawMode::Triangles,
            DrawMode::TriangleStrip,
            DrawMode::TriangleFan,
        ];
        let values: Vec<u32> = modes.into_iter().map(primitive).collect();
        assert_eq!(values, (0..7).collect::<Vec<u32>>());
    }

    #[test]
    fn color_and_depth_clear_sets_both_bits() {
        assert_eq!(clear_mask(ClearBuffers::Color), 0x4000);
        assert_eq!(clear_mask(ClearBuffers::ColorAndDepth), 0x4100);
    }
}
