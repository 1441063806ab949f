//! The graphics-device seam.
//!
//! `GlDevice` is the narrow set of GL operations the buffer, shader, and
//! texture code needs. [`GlContext`](super::GlContext) implements it over
//! a live `glow::Context`; [`MockDevice`](super::mock::MockDevice) records
//! calls so the pipeline logic can be tested without a GPU.
//!
//! All methods take `&self` and must be called on the thread that owns
//! the context. Allocation methods return `Err` with a driver message
//! when the device refuses to create the object.

use crate::shape::Primitive;

/// A shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Lowercase stage name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data for `draw_elements`.
    ElementArray,
}

/// Upload usage hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    StaticDraw,
    /// Rewritten before nearly every draw.
    StreamDraw,
}

/// Component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttribType {
    F32,
    U16,
}

impl AttribType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            AttribType::F32 => std::mem::size_of::<f32>(),
            AttribType::U16 => std::mem::size_of::<u16>(),
        }
    }
}

/// Texture object kind used when binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    CubeMap,
}

/// One face of a cube map, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    NegativeX,
    PositiveX,
    NegativeY,
    PositiveY,
    NegativeZ,
    PositiveZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::NegativeX,
        CubeFace::PositiveX,
        CubeFace::NegativeY,
        CubeFace::PositiveY,
        CubeFace::NegativeZ,
        CubeFace::PositiveZ,
    ];
}

/// Destination of a `tex_image_2d` upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Texture2D,
    CubeFace(CubeFace),
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    /// Trilinear; only meaningful as a minification filter with mipmaps.
    LinearMipmapLinear,
}

/// Texture coordinate wrap mode, applied to both S and T.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
}

/// Pixel layout of decoded image data, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
    R8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::R8 => 1,
        }
    }
}

/// Operations on a graphics device context.
pub trait GlDevice {
    type Shader: Copy + std::fmt::Debug;
    type Program: Copy + std::fmt::Debug;
    type Buffer: Copy + std::fmt::Debug;
    type Texture: Copy + std::fmt::Debug;
    type UniformLocation: Clone + std::fmt::Debug;

    // Shaders and programs

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;

    /// Sets the source of `shader`, compiles it, and returns the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;

    fn shader_info_log(&self, shader: Self::Shader) -> String;

    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);

    /// Links `program` and returns the link status.
    fn link_program(&self, program: Self::Program) -> bool;

    /// Validates `program` against the current state and returns the validate status.
    fn validate_program(&self, program: Self::Program) -> bool;

    fn program_info_log(&self, program: Self::Program) -> String;

    fn delete_program(&self, program: Self::Program);

    fn use_program(&self, program: Option<Self::Program>);

    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    // Buffers and attributes

    fn create_buffer(&self) -> Result<Self::Buffer, String>;

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);

    /// Uploads `data` into the buffer bound at `target`, replacing its storage.
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    fn delete_buffer(&self, buffer: Self::Buffer);

    /// Points attribute `index` at the buffer bound to `BufferTarget::Array`,
    /// starting `offset` bytes in.
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        ty: AttribType,
        stride: i32,
        offset: i32,
    );

    /// Points attribute `index` at CPU-resident float data.
    ///
    /// The data is consumed during this call; implementations that cannot
    /// source attributes from client memory stage it in a device-side
    /// scratch buffer.
    fn client_vertex_attrib_pointer(
        &self,
        index: u32,
        components: i32,
        stride: i32,
        data: &[f32],
    ) -> Result<(), String>;

    fn enable_vertex_attrib_array(&self, index: u32);

    // Drawing

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32);

    /// Draws `count` `u16` indices from the bound element buffer, starting
    /// `offset` bytes in.
    fn draw_elements(&self, primitive: Primitive, count: i32, offset: i32);

    // Textures

    fn create_texture(&self) -> Result<Self::Texture, String>;

    fn bind_texture(&self, kind: TextureKind, texture: Option<Self::Texture>);

    /// Sets filters and wrap mode on the texture bound at `kind`.
    fn texture_parameters(&self, kind: TextureKind, min: Filter, mag: Filter, wrap: Wrap);

    /// Uploads level 0 of `target` from tightly packed `pixels`.
    fn tex_image_2d(
        &self,
        target: ImageTarget,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: &[u8],
    );

    fn generate_mipmap(&self, kind: TextureKind);

    fn delete_texture(&self, texture: Self::Texture);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_lowercase() {
        assert_eq!(ShaderStage::Vertex.name(), "vertex");
        assert_eq!(ShaderStage::Fragment.name(), "fragment");
    }

    #[test]
    fn attrib_type_sizes() {
        assert_eq!(AttribType::F32.size_in_bytes(), 4);
        assert_eq!(AttribType::U16.size_in_bytes(), 2);
    }

    #[test]
    fn pixel_format_channels() {
        assert_eq!(PixelFormat::Rgba8.channels(), 4);
        assert_eq!(PixelFormat::Rgb8.channels(), 3);
        assert_eq!(PixelFormat::R8.channels(), 1);
    }

    #[test]
    fn cube_faces_are_in_upload_order() {
        assert_eq!(CubeFace::ALL[0], CubeFace::NegativeX);
        assert_eq!(CubeFace::ALL[5], CubeFace::PositiveZ);
    }
}
