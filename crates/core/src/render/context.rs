//! `GlDevice` backend over a live `glow::Context`.
//!
//! Desktop GL core profiles and WebGL2 cannot source vertex attributes
//! from client memory, so `client_vertex_attrib_pointer` stages the data
//! in a per-attribute scratch buffer that is reused across calls. Core
//! profiles also require the host to bind a vertex array object before
//! any attribute calls.

use std::cell::RefCell;
use std::collections::HashMap;

use glow::HasContext;

use super::device::{
    AttribType, BufferTarget, BufferUsage, CubeFace, Filter, GlDevice, ImageTarget, PixelFormat,
    ShaderStage, TextureKind, Wrap,
};
use crate::shape::Primitive;

/// Wraps a `glow::Context` created by the host.
///
/// Not `Sync`: every call must happen on the thread that owns the context.
pub struct GlContext {
    gl: glow::Context,
    scratch: RefCell<HashMap<u32, glow::Buffer>>,
}

impl GlContext {
    /// Takes ownership of a context that is current on this thread.
    pub fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            scratch: RefCell::new(HashMap::new()),
        }
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Deletes the attribute scratch buffers and returns the context.
    #[allow(unsafe_code)]
    pub fn into_gl(self) -> glow::Context {
        for (_, buffer) in self.scratch.into_inner() {
            // SAFETY: scratch buffers were created on this context and are
            // not referenced after this point.
            unsafe { self.gl.delete_buffer(buffer) };
        }
        self.gl
    }

    fn scratch_buffer(&self, index: u32) -> Result<glow::Buffer, String> {
        if let Some(buffer) = self.scratch.borrow().get(&index) {
            return Ok(*buffer);
        }
        let buffer = self.create_buffer()?;
        self.scratch.borrow_mut().insert(index, buffer);
        Ok(buffer)
    }
}

fn shader_type(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn buffer_usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

fn attrib_type(ty: AttribType) -> u32 {
    match ty {
        AttribType::F32 => glow::FLOAT,
        AttribType::U16 => glow::UNSIGNED_SHORT,
    }
}

fn primitive_mode(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
        Primitive::TriangleFan => glow::TRIANGLE_FAN,
        Primitive::Lines => glow::LINES,
    }
}

fn texture_target(kind: TextureKind) -> u32 {
    match kind {
        TextureKind::Texture2D => glow::TEXTURE_2D,
        TextureKind::CubeMap => glow::TEXTURE_CUBE_MAP,
    }
}

fn image_target(target: ImageTarget) -> u32 {
    match target {
        ImageTarget::Texture2D => glow::TEXTURE_2D,
        ImageTarget::CubeFace(face) => match face {
            CubeFace::NegativeX => glow::TEXTURE_CUBE_MAP_NEGATIVE_X,
            CubeFace::PositiveX => glow::TEXTURE_CUBE_MAP_POSITIVE_X,
            CubeFace::NegativeY => glow::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            CubeFace::PositiveY => glow::TEXTURE_CUBE_MAP_POSITIVE_Y,
            CubeFace::NegativeZ => glow::TEXTURE_CUBE_MAP_NEGATIVE_Z,
            CubeFace::PositiveZ => glow::TEXTURE_CUBE_MAP_POSITIVE_Z,
        },
    }
}

fn filter(filter: Filter) -> i32 {
    let value = match filter {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
        Filter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    };
    value as i32
}

fn wrap(wrap: Wrap) -> i32 {
    let value = match wrap {
        Wrap::Repeat => glow::REPEAT,
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
    };
    value as i32
}

/// `(internal_format, format)` for an 8-bit pixel layout.
fn pixel_formats(format: PixelFormat) -> (u32, u32) {
    match format {
        PixelFormat::Rgba8 => (glow::RGBA8, glow::RGBA),
        PixelFormat::Rgb8 => (glow::RGB8, glow::RGB),
        PixelFormat::R8 => (glow::R8, glow::RED),
    }
}

// SAFETY (applies to every unsafe block below): glow exposes raw GL entry
// points as unsafe. Each call passes handles created on `self.gl` and enum
// values produced by the mapping functions above, and runs on the thread
// that owns the context.
#[allow(unsafe_code)]
impl GlDevice for GlContext {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type Texture = glow::Texture;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<glow::Shader, String> {
        unsafe { self.gl.create_shader(shader_type(stage)) }
    }

    fn compile_shader(&self, shader: glow::Shader, source: &str) -> bool {
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            self.gl.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: glow::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<glow::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
        unsafe { self.gl.detach_shader(program, shader) }
    }

    fn link_program(&self, program: glow::Program) -> bool {
        unsafe {
            self.gl.link_program(program);
            self.gl.get_program_link_status(program)
        }
    }

    fn validate_program(&self, program: glow::Program) -> bool {
        unsafe {
            self.gl.validate_program(program);
            self.gl
                .get_program_parameter_i32(program, glow::VALIDATE_STATUS)
                != 0
        }
    }

    fn program_info_log(&self, program: glow::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<glow::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn attribute_location(&self, program: glow::Program, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn create_buffer(&self) -> Result<glow::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<glow::Buffer>) {
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(target), data, buffer_usage(usage))
        }
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn vertex_attrib_pointer(&self, index: u32, components: i32, ty: AttribType, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, attrib_type(ty), false, stride, offset)
        }
    }

    fn client_vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        stride: i32,
        data: &[f32],
    ) -> Result<(), String> {
        let buffer = self.scratch_buffer(index)?;
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STREAM_DRAW,
            );
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, 0);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
        Ok(())
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive_mode(primitive), first, count) }
    }

    fn draw_elements(&self, primitive: Primitive, count: i32, offset: i32) {
        unsafe {
            self.gl
                .draw_elements(primitive_mode(primitive), count, glow::UNSIGNED_SHORT, offset)
        }
    }

    fn create_texture(&self) -> Result<glow::Texture, String> {
        unsafe { self.gl.create_texture() }
    }

    fn bind_texture(&self, kind: TextureKind, texture: Option<glow::Texture>) {
        unsafe { self.gl.bind_texture(texture_target(kind), texture) }
    }

    fn texture_parameters(&self, kind: TextureKind, min: Filter, mag: Filter, wrap_mode: Wrap) {
        let target = texture_target(kind);
        unsafe {
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter(min));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter(mag));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap(wrap_mode));
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap(wrap_mode));
        }
    }

    fn tex_image_2d(&self, target: ImageTarget, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let (internal_format, pixel_format) = pixel_formats(format);
        unsafe {
            // Rows are tightly packed; RGB and R8 rows are not 4-byte aligned.
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                image_target(target),
                0,
                internal_format as i32,
                width as i32,
                height as i32,
                0,
                pixel_format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn generate_mipmap(&self, kind: TextureKind) {
        unsafe { self.gl.generate_mipmap(texture_target(kind)) }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { self.gl.delete_texture(texture) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_map_to_gl_modes() {
        assert_eq!(primitive_mode(Primitive::TriangleFan), glow::TRIANGLE_FAN);
        assert_eq!(primitive_mode(Primitive::Triangles), glow::TRIANGLES);
        assert_eq!(primitive_mode(Primitive::TriangleStrip), glow::TRIANGLE_STRIP);
        assert_eq!(primitive_mode(Primitive::Lines), glow::LINES);
    }

    #[test]
    fn index_attributes_are_unsigned_short() {
        assert_eq!(attrib_type(AttribType::U16), glow::UNSIGNED_SHORT);
        assert_eq!(attrib_type(AttribType::F32), glow::FLOAT);
    }

    #[test]
    fn cube_faces_map_to_distinct_targets() {
        let mut targets: Vec<u32> = CubeFace::ALL
            .into_iter()
            .map(|f| image_target(ImageTarget::CubeFace(f)))
            .collect();
        assert_eq!(targets[0], glow::TEXTURE_CUBE_MAP_NEGATIVE_X);
        assert_eq!(targets[5], glow::TEXTURE_CUBE_MAP_POSITIVE_Z);
        targets.sort_unstable();
        targets.dedup();
        assert_eq!(targets.len(), 6);
    }

    #[test]
    fn trilinear_filter_value() {
        assert_eq!(filter(Filter::LinearMipmapLinear), glow::LINEAR_MIPMAP_LINEAR as i32);
        assert_eq!(wrap(Wrap::ClampToEdge), glow::CLAMP_TO_EDGE as i32);
    }

    #[test]
    fn pixel_formats_match_channel_counts() {
        assert_eq!(pixel_formats(PixelFormat::Rgba8), (glow::RGBA8, glow::RGBA));
        assert_eq!(pixel_formats(PixelFormat::Rgb8), (glow::RGB8, glow::RGB));
        assert_eq!(pixel_formats(PixelFormat::R8), (glow::R8, glow::RED));
    }

    #[test]
    fn stages_and_targets_map() {
        assert_eq!(shader_type(ShaderStage::Vertex), glow::VERTEX_SHADER);
        assert_eq!(buffer_target(BufferTarget::ElementArray), glow::ELEMENT_ARRAY_BUFFER);
        assert_eq!(buffer_usage(BufferUsage::StreamDraw), glow::STREAM_DRAW);
        assert_eq!(texture_target(TextureKind::CubeMap), glow::TEXTURE_CUBE_MAP);
    }

    #[test]
    #[ignore = "requires GL context"]
    fn build_program_on_live_context() {
        // Would test: build_program(&GlContext::new(gl), vs, fs) returns a
        // program whose attribute_location("a_Position") is Some.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn client_attribute_reuses_scratch_buffer() {
        // Would test: two client_vertex_attrib_pointer calls on one index
        // create a single scratch buffer.
    }
}
