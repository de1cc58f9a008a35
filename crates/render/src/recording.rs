//! Headless backend that records every call instead of talking to a GPU.
//!
//! Used by tests, benches, and the CLI to run the full build and draw pipeline
//! without a window. Compiling "succeeds" unless a configured failure marker is
//! present in the source; a uniform resolves when its name appears in one of
//! the program's attached shader sources.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::context::{
    BufferTarget, BufferUsage, ClearBuffers, ComponentType, DepthFunc, DrawMode,
    GraphicsContext, ShaderStage,
};

/// Kind of GPU object, for allocation failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Shader,
    Program,
    Buffer,
    VertexArray,
}

/// Location handle handed out by the recording backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordedUniform {
    pub program: u32,
    pub name: String,
}

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader { shader: u32, stage: ShaderStage },
    ShaderSource { shader: u32 },
    CompileShader { shader: u32, ok: bool },
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram { program: u32, ok: bool },
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    CreateBuffer(u32),
    BindBuffer {
        target: BufferTarget,
        buffer: Option<u32>,
    },
    BufferData {
        target: BufferTarget,
        buffer: Option<u32>,
        len: usize,
        usage: BufferUsage,
    },
    DeleteBuffer(u32),
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    EnableVertexAttribArray {
        vertex_array: Option<u32>,
        location: u32,
    },
    VertexAttribPointer {
        vertex_array: Option<u32>,
        buffer: Option<u32>,
        location: u32,
        components: u8,
        component_type: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    UniformMatrix4 {
        uniform: RecordedUniform,
        matrix: [f32; 16],
    },
    ClearColor([f32; 4]),
    EnableDepthTest(DepthFunc),
    Clear(ClearBuffers),
    DrawArrays(RecordedDraw),
}

/// A draw call together with the state bound when it was issued.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    pub mode: DrawMode,
    pub first: i32,
    pub count: i32,
    pub program: Option<u32>,
    pub vertex_array: Option<u32>,
}

#[derive(Debug)]
struct ShaderObject {
    source: String,
    log: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    sources: Vec<String>,
    log: String,
    linked: bool,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: HashSet<u32>,
    vertex_arrays: HashSet<u32>,
    current_program: Option<u32>,
    current_vertex_array: Option<u32>,
    bound_buffers: HashMap<BufferTarget, u32>,
}

impl State {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default, Clone)]
struct Faults {
    compile: Vec<(String, String)>,
    link: Vec<(String, String)>,
    refused: HashSet<ObjectKind>,
}

/// Shared, read-only view of what a [`RecordingContext`] has seen.
///
/// Stays valid after the context itself was moved into (or dropped with) a renderer.
#[derive(Debug, Clone)]
pub struct Journal {
    state: Rc<RefCell<State>>,
}

impl Journal {
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Forget recorded calls. Live objects are kept.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawArrays(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    /// Every matrix uploaded to a uniform with this name, in call order.
    pub fn uniform_uploads(&self, name: &str) -> Vec<[f32; 16]> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::UniformMatrix4 { uniform, matrix } if uniform.name == name => Some(*matrix),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    /// True when no GPU object created through the context is still alive.
    pub fn is_released(&self) -> bool {
        self.live_shaders() == 0
            && self.live_programs() == 0
            && self.live_buffers() == 0
            && self.live_vertex_arrays() == 0
    }
}

/// A [`GraphicsContext`] that records calls into a [`Journal`].
#[derive(Debug)]
pub struct RecordingContext {
    state: Rc<RefCell<State>>,
    faults: Faults,
    size: (u32, u32),
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::default())),
            faults: Faults::default(),
            size: (width, height),
        }
    }

    pub fn journal(&self) -> Journal {
        Journal {
            state: Rc::clone(&self.state),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    /// Any shader whose source contains `marker` fails to compile with `log`.
    pub fn fail_compile_on(mut self, marker: impl Into<String>, log: impl Into<String>) -> Self {
        self.faults.compile.push((marker.into(), log.into()));
        self
    }

    /// Any program with an attached source containing `marker` fails to link with `log`.
    pub fn fail_link_on(mut self, marker: impl Into<String>, log: impl Into<String>) -> Self {
        self.faults.link.push((marker.into(), log.into()));
        self
    }

    /// Allocation of this object kind always fails.
    pub fn refuse(mut self, kind: ObjectKind) -> Self {
        self.faults.refused.insert(kind);
        self
    }

    fn record(&mut self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn allocate(&mut self, kind: ObjectKind) -> Result<u32, String> {
        if self.faults.refused.contains(&kind) {
            return Err(format!("{kind:?} allocation refused"));
        }
        Ok(self.state.borrow_mut().allocate())
    }
}

impl GraphicsContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = RecordedUniform;

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<u32, String> {
        let shader = self.allocate(ObjectKind::Shader)?;
        self.state.borrow_mut().shaders.insert(
            shader,
            ShaderObject {
                source: String::new(),
                log: String::new(),
                compiled: false,
            },
        );
        self.record(Call::CreateShader { shader, stage });
        Ok(shader)
    }

    fn shader_source(&mut self, shader: &u32, source: &str) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(shader) {
            s.source = source.to_owned();
        }
        self.record(Call::ShaderSource { shader: *shader });
    }

    fn compile_shader(&mut self, shader: &u32) {
        let ok = {
            let mut state = self.state.borrow_mut();
            match state.shaders.get_mut(shader) {
                Some(s) => {
                    let fault = self
                        .faults
                        .compile
                        .iter()
                        .find(|(marker, _)| s.source.contains(marker.as_str()));
                    match fault {
                        Some((_, log)) => {
                            s.compiled = false;
                            s.log = log.clone();
                        }
                        None => s.compiled = true,
                    }
                    s.compiled
                }
                None => false,
            }
        };
        self.record(Call::CompileShader {
            shader: *shader,
            ok,
        });
    }

    fn shader_compile_status(&self, shader: &u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: &u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: u32) {
        self.state.borrow_mut().shaders.remove(&shader);
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> Result<u32, String> {
        let program = self.allocate(ObjectKind::Program)?;
        self.state
            .borrow_mut()
            .programs
            .insert(program, ProgramObject::default());
        self.record(Call::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&mut self, program: &u32, shader: &u32) {
        {
            let mut state = self.state.borrow_mut();
            let source = state.shaders.get(shader).map(|s| s.source.clone());
            if let (Some(p), Some(source)) = (state.programs.get_mut(program), source) {
                p.attached.push(*shader);
                p.sources.push(source);
            }
        }
        self.record(Call::AttachShader {
            program: *program,
            shader: *shader,
        });
    }

    fn detach_shader(&mut self, program: &u32, shader: &u32) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(program) {
            p.attached.retain(|s| s != shader);
        }
        self.record(Call::DetachShader {
            program: *program,
            shader: *shader,
        });
    }

    fn link_program(&mut self, program: &u32) {
        let ok = {
            let mut state = self.state.borrow_mut();
            match state.programs.get_mut(program) {
                Some(p) => {
                    let fault = self.faults.link.iter().find(|(marker, _)| {
                        p.sources.iter().any(|src| src.contains(marker.as_str()))
                    });
                    match fault {
                        Some((_, log)) => {
                            p.linked = false;
                            p.log = log.clone();
                        }
                        None => p.linked = p.attached.len() == 2,
                    }
                    p.linked
                }
                None => false,
            }
        };
        self.record(Call::LinkProgram {
            program: *program,
            ok,
        });
    }

    fn program_link_status(&self, program: &u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: &u32) -> String {
        self.state
            .borrow()
            .programs
            .get(program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn uniform_location(&self, program: &u32, name: &str) -> Option<RecordedUniform> {
        let state = self.state.borrow();
        let p = state.programs.get(program)?;
        if p.linked && p.sources.iter().any(|src| src.contains(name)) {
            Some(RecordedUniform {
                program: *program,
                name: name.to_owned(),
            })
        } else {
            None
        }
    }

    fn use_program(&mut self, program: Option<&u32>) {
        self.state.borrow_mut().current_program = program.copied();
        self.record(Call::UseProgram(program.copied()));
    }

    fn delete_program(&mut self, program: u32) {
        {
            let mut state = self.state.borrow_mut();
            state.programs.remove(&program);
            if state.current_program == Some(program) {
                state.current_program = None;
            }
        }
        self.record(Call::DeleteProgram(program));
    }

    fn create_buffer(&mut self) -> Result<u32, String> {
        let buffer = self.allocate(ObjectKind::Buffer)?;
        self.state.borrow_mut().buffers.insert(buffer);
        self.record(Call::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&u32>) {
        {
            let mut state = self.state.borrow_mut();
            match buffer {
                Some(b) => state.bound_buffers.insert(target, *b),
                None => state.bound_buffers.remove(&target),
            };
        }
        self.record(Call::BindBuffer {
            target,
            buffer: buffer.copied(),
        });
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let buffer = self.state.borrow().bound_buffers.get(&target).copied();
        self.record(Call::BufferData {
            target,
            buffer,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&mut self, buffer: u32) {
        {
            let mut state = self.state.borrow_mut();
            state.buffers.remove(&buffer);
            state.bound_buffers.retain(|_, b| *b != buffer);
        }
        self.record(Call::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&mut self) -> Result<u32, String> {
        let vertex_array = self.allocate(ObjectKind::VertexArray)?;
        self.state.borrow_mut().vertex_arrays.insert(vertex_array);
        self.record(Call::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<&u32>) {
        self.state.borrow_mut().current_vertex_array = vertex_array.copied();
        self.record(Call::BindVertexArray(vertex_array.copied()));
    }

    fn delete_vertex_array(&mut self, vertex_array: u32) {
        {
            let mut state = self.state.borrow_mut();
            state.vertex_arrays.remove(&vertex_array);
            if state.current_vertex_array == Some(vertex_array) {
                state.current_vertex_array = None;
            }
        }
        self.record(Call::DeleteVertexArray(vertex_array));
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        let vertex_array = self.state.borrow().current_vertex_array;
        self.record(Call::EnableVertexAttribArray {
            vertex_array,
            location,
        });
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
        let (vertex_array, buffer) = {
            let state = self.state.borrow();
            (
                state.current_vertex_array,
                state.bound_buffers.get(&BufferTarget::Array).copied(),
            )
        };
        self.record(Call::VertexAttribPointer {
            vertex_array,
            buffer,
            location,
            components,
            component_type,
            normalized,
            stride,
            offset,
        });
    }

    fn uniform_matrix4(&mut self, location: &RecordedUniform, matrix: &[f32; 16]) {
        self.record(Call::UniformMatrix4 {
            uniform: location.clone(),
            matrix: *matrix,
        });
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.record(Call::ClearColor(rgba));
    }

    fn enable_depth_test(&mut self, func: DepthFunc) {
        self.record(Call::EnableDepthTest(func));
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        self.record(Call::Clear(buffers));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: i32, count: i32) {
        let (program, vertex_array) = {
            let state = self.state.borrow();
            (state.current_program, state.current_vertex_array)
        };
        self.record(Call::DrawArrays(RecordedDraw {
            mode,
            first,
            count,
            program,
            vertex_array,
        }));
    }
}
