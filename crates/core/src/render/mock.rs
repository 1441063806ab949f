//! Recording mock of [`GlDevice`] for tests.
//!
//! `MockDevice` hands out integer handles, records every call in order,
//! and keeps just enough state (buffer contents, bindings, attribute
//! pointers, the current program) for assertions. Its "compiler" accepts
//! any source containing `void main` with balanced braces; link and
//! validation failures, and allocation refusal, are injected explicitly.
//!
//! Available in this crate's tests and to dependents through the `mock`
//! feature.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use super::device::{
    AttribType, BufferTarget, BufferUsage, Filter, GlDevice, ImageTarget, PixelFormat,
    ShaderStage, TextureKind, Wrap,
};
use crate::shape::Primitive;

/// A recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateShader { stage: ShaderStage, shader: u32 },
    CompileShader { shader: u32 },
    DeleteShader { shader: u32 },
    CreateProgram { program: u32 },
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram { program: u32 },
    ValidateProgram { program: u32 },
    DeleteProgram { program: u32 },
    UseProgram { program: Option<u32> },
    CreateBuffer { buffer: u32 },
    BindBuffer { target: BufferTarget, buffer: Option<u32> },
    BufferData { target: BufferTarget, len: usize, usage: BufferUsage },
    DeleteBuffer { buffer: u32 },
    VertexAttribPointer { index: u32, components: i32, ty: AttribType, stride: i32, offset: i32 },
    ClientVertexAttribPointer { index: u32, components: i32, stride: i32, len: usize },
    EnableVertexAttribArray { index: u32 },
    DrawArrays { primitive: Primitive, first: i32, count: i32 },
    DrawElements { primitive: Primitive, count: i32, offset: i32 },
    CreateTexture { texture: u32 },
    BindTexture { kind: TextureKind, texture: Option<u32> },
    TextureParameters { kind: TextureKind, min: Filter, mag: Filter, wrap: Wrap },
    TexImage2D { target: ImageTarget, width: u32, height: u32, format: PixelFormat, len: usize },
    GenerateMipmap { kind: TextureKind },
    DeleteTexture { texture: u32 },
}

/// Where an attribute reads its data from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttribSource {
    /// A device buffer and byte offset.
    Buffer { buffer: Option<u32>, offset: i32 },
    /// A copy of client-side floats.
    Client(Vec<f32>),
}

/// The recorded state of one vertex attribute slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AttribBinding {
    pub components: i32,
    pub ty: AttribType,
    pub stride: i32,
    pub source: AttribSource,
    pub enabled: bool,
}

#[derive(Debug)]
struct MockShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct MockProgram {
    attached: Vec<u32>,
    log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

/// A `GlDevice` that records calls instead of talking to a GPU.
#[derive(Debug, Default)]
pub struct MockDevice {
    next_id: Cell<u32>,
    refuse_allocations: Cell<bool>,
    link_failure: RefCell<Option<String>>,
    validation_failure: RefCell<Option<String>>,
    calls: RefCell<Vec<DeviceCall>>,
    shaders: RefCell<HashMap<u32, MockShader>>,
    programs: RefCell<HashMap<u32, MockProgram>>,
    buffers: RefCell<HashMap<u32, Vec<u8>>>,
    bindings: RefCell<HashMap<BufferTarget, u32>>,
    attributes: RefCell<HashMap<u32, AttribBinding>>,
    textures: RefCell<HashSet<u32>>,
    current_program: Cell<Option<u32>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `create_*` call fail, as an exhausted driver would.
    pub fn refusing_allocations(self) -> Self {
        self.refuse_allocations.set(true);
        self
    }

    /// Makes every link fail with `log`.
    pub fn failing_link(self, log: &str) -> Self {
        *self.link_failure.borrow_mut() = Some(log.to_string());
        self
    }

    /// Makes every validation fail with `log`.
    pub fn failing_validation(self, log: &str) -> Self {
        *self.validation_failure.borrow_mut() = Some(log.to_string());
        self
    }

    pub fn set_refuse_allocations(&self, refuse: bool) {
        self.refuse_allocations.set(refuse);
    }

    /// All calls recorded so far, in order.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn current_program(&self) -> Option<u32> {
        self.current_program.get()
    }

    /// Bytes last uploaded to `buffer`, if it is alive.
    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<u8>> {
        self.buffers.borrow().get(&buffer).cloned()
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<u32> {
        self.bindings.borrow().get(&target).copied()
    }

    pub fn attribute(&self, index: u32) -> Option<AttribBinding> {
        self.attributes.borrow().get(&index).cloned()
    }

    pub fn live_shader_count(&self) -> usize {
        self.shaders.borrow().len()
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.borrow().len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub fn live_texture_count(&self) -> usize {
        self.textures.borrow().len()
    }

    fn record(&self, call: DeviceCall) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self, what: &str) -> Result<u32, String> {
        if self.refuse_allocations.get() {
            return Err(format!("out of memory: cannot create {what}"));
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Ok(id)
    }
}

/// Checks performed by the mock compiler. Returns the info log on failure.
fn mock_compile(source: &str) -> Result<(), String> {
    let mut depth = 0i32;
    for (line_no, line) in source.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(format!("ERROR: 0:{}: '}}' : syntax error", line_no + 1));
            }
        }
    }
    if depth != 0 {
        return Err("ERROR: 0:1: unexpected end of file: unbalanced braces".to_string());
    }
    if !source.contains("void main") {
        return Err("ERROR: 0:1: 'main' : function is not defined".to_string());
    }
    Ok(())
}

/// Names declared with one of `qualifiers`, e.g. `attribute vec4 a_Position;`.
fn declared_names(source: &str, qualifiers: &[&str]) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            let qualifier = words.next()?;
            if !qualifiers.contains(&qualifier) {
                return None;
            }
            let name = words.nth(1)?;
            Some(name.trim_end_matches(';').to_string())
        })
        .collect()
}

impl GlDevice for MockDevice {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type Texture = u32;
    type UniformLocation = u32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let shader = self.allocate("shader")?;
        self.shaders.borrow_mut().insert(
            shader,
            MockShader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        self.record(DeviceCall::CreateShader { stage, shader });
        Ok(shader)
    }

    fn compile_shader(&self, shader: u32, source: &str) -> bool {
        self.record(DeviceCall::CompileShader { shader });
        let mut shaders = self.shaders.borrow_mut();
        let Some(entry) = shaders.get_mut(&shader) else {
            return false;
        };
        entry.source = source.to_string();
        match mock_compile(source) {
            Ok(()) => {
                entry.compiled = true;
                entry.log.clear();
            }
            Err(log) => {
                entry.compiled = false;
                entry.log = log;
            }
        }
        entry.compiled
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.shaders
            .borrow()
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        self.shaders.borrow_mut().remove(&shader);
        self.record(DeviceCall::DeleteShader { shader });
    }

    fn create_program(&self) -> Result<u32, String> {
        let program = self.allocate("program")?;
        self.programs
            .borrow_mut()
            .insert(program, MockProgram::default());
        self.record(DeviceCall::CreateProgram { program });
        Ok(program)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.push(shader);
        }
        self.record(DeviceCall::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(p) = self.programs.borrow_mut().get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
        self.record(DeviceCall::DetachShader { program, shader });
    }

    fn link_program(&self, program: u32) -> bool {
        self.record(DeviceCall::LinkProgram { program });
        let shaders = self.shaders.borrow();
        let mut programs = self.programs.borrow_mut();
        let Some(p) = programs.get_mut(&program) else {
            return false;
        };

        if let Some(log) = self.link_failure.borrow().as_ref() {
            p.log = log.clone();
            return false;
        }

        let attached: Vec<&MockShader> = p.attached.iter().filter_map(|s| shaders.get(s)).collect();
        let has_stage = |stage: ShaderStage| attached.iter().any(|s| s.stage == stage && s.compiled);
        if !has_stage(ShaderStage::Vertex) || !has_stage(ShaderStage::Fragment) {
            p.log = "ERROR: program requires a compiled vertex and fragment shader".to_string();
            return false;
        }

        p.attributes.clear();
        p.uniforms.clear();
        for s in &attached {
            if s.stage == ShaderStage::Vertex {
                p.attributes
                    .extend(declared_names(&s.source, &["attribute", "in"]));
            }
            for name in declared_names(&s.source, &["uniform"]) {
                if !p.uniforms.contains(&name) {
                    p.uniforms.push(name);
                }
            }
        }
        p.log.clear();
        true
    }

    fn validate_program(&self, program: u32) -> bool {
        self.record(DeviceCall::ValidateProgram { program });
        let mut programs = self.programs.borrow_mut();
        let Some(p) = programs.get_mut(&program) else {
            return false;
        };
        match self.validation_failure.borrow().as_ref() {
            Some(log) => {
                p.log = log.clone();
                false
            }
            None => true,
        }
    }

    fn program_info_log(&self, program: u32) -> String {
        self.programs
            .borrow()
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        self.programs.borrow_mut().remove(&program);
        if self.current_program.get() == Some(program) {
            self.current_program.set(None);
        }
        self.record(DeviceCall::DeleteProgram { program });
    }

    fn use_program(&self, program: Option<u32>) {
        self.current_program.set(program);
        self.record(DeviceCall::UseProgram { program });
    }

    fn attribute_location(&self, program: u32, name: &str) -> Option<u32> {
        let programs = self.programs.borrow();
        let index = programs
            .get(&program)?
            .attributes
            .iter()
            .position(|a| a == name)?;
        u32::try_from(index).ok()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        let programs = self.programs.borrow();
        let index = programs
            .get(&program)?
            .uniforms
            .iter()
            .position(|u| u == name)?;
        u32::try_from(index).ok()
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let buffer = self.allocate("buffer")?;
        self.buffers.borrow_mut().insert(buffer, Vec::new());
        self.record(DeviceCall::CreateBuffer { buffer });
        Ok(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<u32>) {
        let mut bindings = self.bindings.borrow_mut();
        match buffer {
            Some(b) => bindings.insert(target, b),
            None => bindings.remove(&target),
        };
        self.record(DeviceCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        if let Some(bound) = self.bound_buffer(target) {
            if let Some(contents) = self.buffers.borrow_mut().get_mut(&bound) {
                *contents = data.to_vec();
            }
        }
        self.record(DeviceCall::BufferData {
            target,
            len: data.len(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: u32) {
        self.buffers.borrow_mut().remove(&buffer);
        self.bindings.borrow_mut().retain(|_, b| *b != buffer);
        self.record(DeviceCall::DeleteBuffer { buffer });
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        ty: AttribType,
        stride: i32,
        offset: i32,
    ) {
        let buffer = self.bound_buffer(BufferTarget::Array);
        let mut attributes = self.attributes.borrow_mut();
        let enabled = attributes.get(&index).is_some_and(|a| a.enabled);
        attributes.insert(
            index,
            AttribBinding {
                components,
                ty,
                stride,
                source: AttribSource::Buffer { buffer, offset },
                enabled,
            },
        );
        self.record(DeviceCall::VertexAttribPointer {
            index,
            components,
            ty,
            stride,
            offset,
        });
    }

    fn client_vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        stride: i32,
        data: &[f32],
    ) -> Result<(), String> {
        if self.refuse_allocations.get() {
            return Err("out of memory: cannot stage client attribute data".to_string());
        }
        let mut attributes = self.attributes.borrow_mut();
        let enabled = attributes.get(&index).is_some_and(|a| a.enabled);
        attributes.insert(
            index,
            AttribBinding {
                components,
                ty: AttribType::F32,
                stride,
                source: AttribSource::Client(data.to_vec()),
                enabled,
            },
        );
        self.record(DeviceCall::ClientVertexAttribPointer {
            index,
            components,
            stride,
            len: data.len(),
        });
        Ok(())
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        if let Some(a) = self.attributes.borrow_mut().get_mut(&index) {
            a.enabled = true;
        }
        self.record(DeviceCall::EnableVertexAttribArray { index });
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        self.record(DeviceCall::DrawArrays {
            primitive,
            first,
            count,
        });
    }

    fn draw_elements(&self, primitive: Primitive, count: i32, offset: i32) {
        self.record(DeviceCall::DrawElements {
            primitive,
            count,
            offset,
        });
    }

    fn create_texture(&self) -> Result<u32, String> {
        let texture = self.allocate("texture")?;
        self.textures.borrow_mut().insert(texture);
        self.record(DeviceCall::CreateTexture { texture });
        Ok(texture)
    }

    fn bind_texture(&self, kind: TextureKind, texture: Option<u32>) {
        self.record(DeviceCall::BindTexture { kind, texture });
    }

    fn texture_parameters(&self, kind: TextureKind, min: Filter, mag: Filter, wrap: Wrap) {
        self.record(DeviceCall::TextureParameters {
            kind,
            min,
            mag,
            wrap,
        });
    }

    fn tex_image_2d(
        &self,
        target: ImageTarget,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    ) {
        self.record(DeviceCall::TexImage2D {
            target,
            width,
            height,
            format,
            len: pixels.len(),
        });
    }

    fn generate_mipmap(&self, kind: TextureKind) {
        self.record(DeviceCall::GenerateMipmap { kind });
    }

    fn delete_texture(&self, texture: u32) {
        self.textures.borrow_mut().remove(&texture);
        self.record(DeviceCall::DeleteTexture { texture });
    }
}
