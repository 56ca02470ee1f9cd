//! Surface texture loading: CPU-side decode plus lazy GPU upload.
//!
//! Bodies own their equirectangular surface textures exclusively. Decoding
//! happens at construction time (plugin load, not per frame); the GPU copy
//! is created on first use so that body lifecycle management never needs a
//! device. Textures upload as `Rgba8Unorm`, not the sRGB variant: the body
//! shader performs its own sRGB decode in HDR mode and expects raw sRGB
//! values from the sampler.

use std::path::{Path, PathBuf};

use crate::gpu::Gpu;

/// Errors that can occur while decoding a surface texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The image file could not be read or decoded.
    #[error("failed to load surface texture {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// GPU-side resources for one surface texture.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// An equirectangular surface texture with decoded pixels and a lazily
/// created GPU copy.
pub struct SurfaceTexture {
    path: PathBuf,
    pixels: image::RgbaImage,
    generation: u64,
    gpu: Option<GpuTexture>,
}

impl SurfaceTexture {
    /// Decode an image file into CPU memory. Blocks on I/O and decode;
    /// acceptable during plugin load, never called per frame.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, TextureError> {
        let path = path.into();
        let pixels = image::open(&path)
            .map_err(|source| TextureError::Load {
                path: path.clone(),
                source,
            })?
            .to_rgba8();
        tracing::debug!(
            "Loaded surface texture {} ({}x{})",
            path.display(),
            pixels.width(),
            pixels.height()
        );
        Ok(Self {
            path,
            pixels,
            generation: 0,
            gpu: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bumped on every reload; lets callers detect that the GPU copy they
    /// bound is stale.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Take over the path and pixels of another decoded texture, bumping
    /// the generation so any cached GPU copy is recreated on next use.
    /// Decoding the replacement separately lets callers stage a whole batch
    /// of reloads and only apply them once every decode has succeeded.
    pub fn adopt(&mut self, replacement: SurfaceTexture) {
        self.path = replacement.path;
        self.pixels = replacement.pixels;
        self.generation += 1;
        self.gpu = None;
    }

    /// The GPU copy, uploading it first if necessary.
    pub fn gpu(&mut self, gpu: &Gpu) -> &GpuTexture {
        self.gpu
            .get_or_insert_with(|| upload(gpu, &self.pixels, &self.path))
    }
}

fn upload(gpu: &Gpu, pixels: &image::RgbaImage, path: &Path) -> GpuTexture {
    use wgpu::util::DeviceExt;

    let (width, height) = pixels.dimensions();
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: path.to_str(),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // raw sRGB values; the body shader linearises when needed
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        pixels.as_raw(),
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("surface-texture-sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    GpuTexture {
        texture,
        view,
        sampler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_png(dir: &Path, name: &str, shade: u8) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([shade, shade, shade, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_decode_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_png(dir.path(), "earth.png", 128);

        let texture = SurfaceTexture::from_file(&path).unwrap();
        assert_eq!(texture.dimensions(), (4, 2));
        assert_eq!(texture.generation(), 0);
        assert_eq!(texture.path(), path);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = SurfaceTexture::from_file("/nonexistent/texture.png")
            .err()
            .unwrap();
        assert!(err.to_string().contains("texture.png"));
    }

    #[test]
    fn test_adopt_bumps_generation() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_test_png(dir.path(), "a.png", 10);
        let second = write_test_png(dir.path(), "b.png", 200);

        let mut texture = SurfaceTexture::from_file(&first).unwrap();
        texture.adopt(SurfaceTexture::from_file(&second).unwrap());
        assert_eq!(texture.generation(), 1);
        assert_eq!(texture.path(), second);
    }

    #[test]
    fn test_failed_staging_leaves_the_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_test_png(dir.path(), "a.png", 10);

        let texture = SurfaceTexture::from_file(&first).unwrap();
        assert!(SurfaceTexture::from_file("/nonexistent/b.png").is_err());
        assert_eq!(texture.generation(), 0);
        assert_eq!(texture.path(), first);
    }
}
