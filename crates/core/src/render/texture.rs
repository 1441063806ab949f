//! Texture upload from already-decoded pixel data.
//!
//! Decoding image files is the host's job; this module takes tightly
//! packed 8-bit pixels, creates a texture object, applies a
//! [`TextureConfig`], and uploads level 0 (plus mipmaps when requested).

use thiserror::Error;

use super::device::{CubeFace, Filter, GlDevice, ImageTarget, PixelFormat, TextureKind, Wrap};

/// Errors from texture creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("could not create texture: {0}")]
    CreateFailed(String),
    #[error("invalid pixel data: {0}")]
    InvalidPixelData(String),
    /// Cube map faces must be square and share one size and format.
    #[error("cube map faces must be square and identical in size and format")]
    MismatchedCubeFaces,
}

/// Decoded, tightly packed pixels for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelData {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl PixelData {
    /// Wraps decoded pixels after checking the byte count.
    ///
    /// # Errors
    ///
    /// Returns `TextureError::InvalidPixelData` if either dimension is zero
    /// or `pixels.len()` is not `width * height * channels`.
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidPixelData(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or_else(|| TextureError::InvalidPixelData(format!("{width}x{height} image is too large")))?;
        if pixels.len() != expected {
            return Err(TextureError::InvalidPixelData(format!(
                "expected {expected} bytes for {width}x{height} {format:?}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Sampling parameters applied at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureConfig {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap: Wrap,
    /// Generate the mipmap chain after uploading level 0.
    pub mipmaps: bool,
}

impl TextureConfig {
    /// Trilinear minification with a generated mipmap chain. The usual
    /// choice for 2D textures.
    pub fn trilinear() -> Self {
        Self {
            min_filter: Filter::LinearMipmapLinear,
            mag_filter: Filter::Linear,
            wrap: Wrap::Repeat,
            mipmaps: true,
        }
    }

    /// Bilinear filtering without mipmaps. The usual choice for cube maps.
    pub fn bilinear() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap: Wrap::Repeat,
            mipmaps: false,
        }
    }

    /// Same config with coordinates clamped to the edge.
    pub fn clamped(self) -> Self {
        Self {
            wrap: Wrap::ClampToEdge,
            ..self
        }
    }
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self::trilinear()
    }
}

/// A texture object on the device.
pub struct Texture<D: GlDevice> {
    texture: D::Texture,
    kind: TextureKind,
    width: u32,
    height: u32,
}

impl<D: GlDevice> Texture<D> {
    pub fn handle(&self) -> D::Texture {
        self.texture
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// Size of level 0 (of each face, for cube maps).
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Binds the texture to its kind's target on the active unit.
    pub fn bind(&self, device: &D) {
        device.bind_texture(self.kind, Some(self.texture));
    }

    pub fn destroy(self, device: &D) {
        device.delete_texture(self.texture);
    }
}

impl<D: GlDevice> std::fmt::Debug for Texture<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("texture", &self.texture)
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

fn warn_if_incomplete(config: &TextureConfig) {
    if config.min_filter == Filter::LinearMipmapLinear && !config.mipmaps {
        log::warn!("mipmapped min filter without mipmaps; texture will sample as incomplete");
    }
}

/// Creates a 2D texture from `image`.
///
/// The texture is left unbound.
///
/// # Errors
///
/// Returns `TextureError::CreateFailed` if the device refuses the allocation.
pub fn upload_texture<D: GlDevice>(
    device: &D,
    image: &PixelData,
    config: &TextureConfig,
) -> Result<Texture<D>, TextureError> {
    warn_if_incomplete(config);
    let kind = TextureKind::Texture2D;
    let texture = device.create_texture().map_err(TextureError::CreateFailed)?;

    device.bind_texture(kind, Some(texture));
    device.texture_parameters(kind, config.min_filter, config.mag_filter, config.wrap);
    device.tex_image_2d(
        ImageTarget::Texture2D,
        image.width,
        image.height,
        image.format,
        &image.pixels,
    );
    if config.mipmaps {
        device.generate_mipmap(kind);
    }
    device.bind_texture(kind, None);

    log::debug!("uploaded {}x{} texture {texture:?}", image.width, image.height);
    Ok(Texture {
        texture,
        kind,
        width: image.width,
        height: image.height,
    })
}

/// Creates a cube map from six faces in `CubeFace::ALL` order:
/// -X, +X, -Y, +Y, -Z, +Z.
///
/// # Errors
///
/// Returns `TextureError::MismatchedCubeFaces` before touching the device
/// if the faces are not square or differ in size or format, and
/// `TextureError::CreateFailed` if the device refuses the allocation.
pub fn upload_cube_map<D: GlDevice>(
    device: &D,
    faces: &[PixelData; 6],
    config: &TextureConfig,
) -> Result<Texture<D>, TextureError> {
    let first = &faces[0];
    let consistent = faces.iter().all(|f| {
        f.width == f.height && f.width == first.width && f.format == first.format
    });
    if !consistent {
        return Err(TextureError::MismatchedCubeFaces);
    }
    warn_if_incomplete(config);

    let kind = TextureKind::CubeMap;
    let texture = device.create_texture().map_err(TextureError::CreateFailed)?;

    device.bind_texture(kind, Some(texture));
    device.texture_parameters(kind, config.min_filter, config.mag_filter, config.wrap);
    for (face, image) in CubeFace::ALL.into_iter().zip(faces) {
        device.tex_image_2d(
            ImageTarget::CubeFace(face),
            image.width,
            image.height,
            image.format,
            &image.pixels,
        );
    }
    if config.mipmaps {
        device.generate_mipmap(kind);
    }
    device.bind_texture(kind, None);

    log::debug!("uploaded {0}x{0} cube map {texture:?}", first.width);
    Ok(Texture {
        texture,
        kind,
        width: first.width,
        height: first.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mock::{DeviceCall, MockDevice};

    fn rgba(width: u32, height: u32) -> PixelData {
        PixelData::new(width, height, PixelFormat::Rgba8, vec![0; (width * height * 4) as usize]).unwrap()
    }

    fn faces(size: u32) -> [PixelData; 6] {
        std::array::from_fn(|_| rgba(size, size))
    }

    #[test]
    fn pixel_data_checks_length() {
        assert!(PixelData::new(2, 2, PixelFormat::Rgb8, vec![0; 12]).is_ok());
        let err = PixelData::new(2, 2, PixelFormat::Rgb8, vec![0; 11]).unwrap_err();
        assert!(matches!(err, TextureError::InvalidPixelData(ref m) if m.contains("12")), "got {err:?}");
    }

    #[test]
    fn pixel_data_rejects_zero_dimensions() {
        assert!(PixelData::new(0, 4, PixelFormat::R8, Vec::new()).is_err());
        assert!(PixelData::new(4, 0, PixelFormat::R8, Vec::new()).is_err());
    }

    #[test]
    fn trilinear_is_default_with_mipmaps() {
        let config = TextureConfig::default();
        assert_eq!(config.min_filter, Filter::LinearMipmapLinear);
        assert_eq!(config.mag_filter, Filter::Linear);
        assert!(config.mipmaps);
    }

    #[test]
    fn clamped_only_changes_wrap() {
        let config = TextureConfig::bilinear().clamped();
        assert_eq!(config.wrap, Wrap::ClampToEdge);
        assert_eq!(config.min_filter, Filter::Linear);
        assert!(!config.mipmaps);
    }

    #[test]
    fn upload_texture_issues_calls_in_order() {
        let device = MockDevice::new();
        let texture = upload_texture(&device, &rgba(4, 2), &TextureConfig::trilinear()).unwrap();
        let id = texture.handle();
        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::CreateTexture { texture: id },
                DeviceCall::BindTexture {
                    kind: TextureKind::Texture2D,
                    texture: Some(id)
                },
                DeviceCall::TextureParameters {
                    kind: TextureKind::Texture2D,
                    min: Filter::LinearMipmapLinear,
                    mag: Filter::Linear,
                    wrap: Wrap::Repeat
                },
                DeviceCall::TexImage2D {
                    target: ImageTarget::Texture2D,
                    width: 4,
                    height: 2,
                    format: PixelFormat::Rgba8,
                    len: 32
                },
                DeviceCall::GenerateMipmap {
                    kind: TextureKind::Texture2D
                },
                DeviceCall::BindTexture {
                    kind: TextureKind::Texture2D,
                    texture: None
                },
            ]
        );
        assert_eq!(texture.size(), (4, 2));
    }

    #[test]
    fn upload_without_mipmaps_skips_generation() {
        let device = MockDevice::new();
        upload_texture(&device, &rgba(1, 1), &TextureConfig::bilinear()).unwrap();
        assert!(!device
            .calls()
            .iter()
            .any(|c| matches!(c, DeviceCall::GenerateMipmap { .. })));
    }

    #[test]
    fn upload_texture_reports_refusal() {
        let device = MockDevice::new().refusing_allocations();
        let err = upload_texture(&device, &rgba(1, 1), &TextureConfig::default()).unwrap_err();
        assert!(matches!(err, TextureError::CreateFailed(_)));
    }

    #[test]
    fn cube_map_uploads_faces_in_order() {
        let device = MockDevice::new();
        upload_cube_map(&device, &faces(8), &TextureConfig::bilinear()).unwrap();
        let targets: Vec<ImageTarget> = device
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCall::TexImage2D { target, .. } => Some(target),
                _ => None,
            })
            .collect();
        let expected: Vec<ImageTarget> = CubeFace::ALL.into_iter().map(ImageTarget::CubeFace).collect();
        assert_eq!(targets, expected);
    }

    #[test]
    fn cube_map_rejects_mismatched_faces() {
        let device = MockDevice::new();
        let mut set = faces(8);
        set[3] = rgba(4, 4);
        assert_eq!(
            upload_cube_map(&device, &set, &TextureConfig::bilinear()).unwrap_err(),
            TextureError::MismatchedCubeFaces
        );
        assert!(device.calls().is_empty(), "nothing may be created for bad faces");
    }

    #[test]
    fn cube_map_rejects_non_square_faces() {
        let device = MockDevice::new();
        let set: [PixelData; 6] = std::array::from_fn(|_| rgba(8, 4));
        assert!(upload_cube_map(&device, &set, &TextureConfig::bilinear()).is_err());
    }

    #[test]
    fn destroy_deletes_texture() {
        let device = MockDevice::new();
        let texture = upload_texture(&device, &rgba(2, 2), &TextureConfig::default()).unwrap();
        assert_eq!(device.live_texture_count(), 1);
        texture.destroy(&device);
        assert_eq!(device.live_texture_count(), 0);
    }
}
