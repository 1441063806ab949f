//! Rendering support over a graphics device.
//!
//! Everything here is written against the [`GlDevice`] trait. The glow
//! backend ([`GlContext`]) is only available when the `render` feature is
//! enabled; the recording [`mock`] device is available in tests and with
//! the `mock` feature.
//!
//! # Module overview
//!
//! - [`device`] -- The `GlDevice` trait and its parameter enums.
//! - [`buffer`] -- CPU- and GPU-resident vertex/index buffers.
//! - [`shader`] -- Shader compilation, linking, validation, and error formatting.
//! - [`texture`] -- Texture and cube map upload from decoded pixels.
//! - [`drawable`] -- Per-object bind-and-draw contract.
//! - [`context`] -- `GlDevice` implementation over `glow::Context`.

pub mod buffer;
#[cfg(feature = "render")]
pub mod context;
pub mod device;
pub mod drawable;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod shader;
pub mod texture;

pub use buffer::{BufferError, BufferKind, CpuVertexBuffer, GpuBuffer, ShaderBuffer};
#[cfg(feature = "render")]
pub use context::GlContext;
pub use device::{
    AttribType, BufferTarget, BufferUsage, CubeFace, Filter, GlDevice, ImageTarget, PixelFormat,
    ShaderStage, TextureKind, Wrap,
};
pub use drawable::{Drawable, ShapeObject, POSITION_ATTRIBUTE};
pub use shader::{
    build_program, compile_shader, format_shader_error, link_program, validate_program,
    ProgramState, ShaderError, ShaderProgram, Validation,
};
pub use texture::{upload_cube_map, upload_texture, PixelData, Texture, TextureConfig, TextureError};
