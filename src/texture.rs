//! Textures and background image loading.
//!
//! [`TextureStore::load`] hands out a [`TextureId`] immediately. The handle
//! is backed by a 1x1 opaque blue placeholder until a worker thread has
//! decoded the file and [`TextureStore::poll`], called on the frame thread,
//! swaps the decoded image in. A load that fails leaves the placeholder in
//! place for good.

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use image::{RgbaImage, imageops::FilterType};
use log::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::error::TextureError;
use crate::gpu::GpuContext;
use crate::resources::TextureId;

/// RGBA of the placeholder shown while an image is loading.
pub const PLACEHOLDER_RGBA: [u8; 4] = [0, 0, 255, 255];

/// How a texture is sampled, decided by its dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sampling {
    /// Power-of-two images: repeat wrapping, linear filtering, full mip chain.
    RepeatMipmapped,
    /// Anything else: clamp to edge, linear filtering, no mips.
    ClampLinear,
}

impl Sampling {
    pub fn for_size(width: u32, height: u32) -> Self {
        if width.is_power_of_two() && height.is_power_of_two() {
            Sampling::RepeatMipmapped
        } else {
            Sampling::ClampLinear
        }
    }

    fn descriptor(self, label: &str) -> wgpu::SamplerDescriptor<'_> {
        let (address_mode, mipmap_filter) = match self {
            Sampling::RepeatMipmapped => (wgpu::AddressMode::Repeat, wgpu::FilterMode::Linear),
            Sampling::ClampLinear => (wgpu::AddressMode::ClampToEdge, wgpu::FilterMode::Nearest),
        };
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter,
            ..Default::default()
        }
    }
}

/// Decoded RGBA8 pixels with their mip chain, ready for upload.
#[derive(Clone, Debug)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    /// Level 0 first; one entry unless the image is mipmapped.
    pub levels: Vec<Vec<u8>>,
}

impl TextureImage {
    /// Wraps raw RGBA8 pixels, building mips for power-of-two sizes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        let found = data.len();
        let mismatch = TextureError::SizeMismatch {
            width,
            height,
            expected,
            found,
        };
        if found != expected {
            return Err(mismatch);
        }
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or(mismatch)
    }

    /// Reads and decodes an image file.
    pub fn open(path: &Path) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Decodes an in-memory image in any format the `image` crate detects.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self::from_image(image::load_from_memory(bytes)?.to_rgba8()))
    }

    fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut levels = Vec::new();

        if Sampling::for_size(width, height) == Sampling::RepeatMipmapped {
            let mut level = image;
            loop {
                let (w, h) = level.dimensions();
                let next = if w > 1 || h > 1 {
                    Some(image::imageops::resize(
                        &level,
                        (w / 2).max(1),
                        (h / 2).max(1),
                        FilterType::Triangle,
                    ))
                } else {
                    None
                };
                levels.push(level.into_raw());
                match next {
                    Some(n) => level = n,
                    None => break,
                }
            }
        } else {
            levels.push(image.into_raw());
        }

        Self {
            width,
            height,
            levels,
        }
    }

    pub fn sampling(&self) -> Sampling {
        Sampling::for_size(self.width, self.height)
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            levels: vec![PLACEHOLDER_RGBA.to_vec()],
        }
    }
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Uploads every mip level of `image`.
    pub fn upload(gpu: &GpuContext, image: &TextureImage, label: &str) -> Self {
        let data: Vec<u8> = image.levels.concat();
        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: image.mip_level_count(),
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler_label = format!("{label} Sampler");
        let sampler = gpu
            .device
            .create_sampler(&image.sampling().descriptor(&sampler_label));

        Self {
            texture,
            view,
            sampler,
            width: image.width,
            height: image.height,
        }
    }

    /// Uploads raw RGBA8 pixels.
    pub fn from_rgba(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Result<Self, TextureError> {
        let image = TextureImage::from_rgba(width, height, data.to_vec())?;
        Ok(Self::upload(gpu, &image, label))
    }

    /// The 1x1 opaque blue stand-in for an image that has not arrived.
    pub fn placeholder(gpu: &GpuContext) -> Self {
        Self::upload(gpu, &TextureImage::placeholder(), "Placeholder Texture")
    }
}

/// Outcome of a background decode, tagged with the handle it belongs to.
pub type LoadResult = (TextureId, PathBuf, Result<TextureImage, TextureError>);

/// Decodes image files on worker threads and delivers them over a channel.
pub struct TextureLoader {
    sender: Sender<LoadResult>,
    receiver: Receiver<LoadResult>,
    pending: usize,
}

impl Default for TextureLoader {
    fn default() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            pending: 0,
        }
    }
}

impl TextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts decoding `path` for `id` on a new thread.
    pub fn spawn(&mut self, id: TextureId, path: PathBuf) {
        let sender = self.sender.clone();
        self.pending += 1;
        thread::spawn(move || {
            let result = TextureImage::open(&path);
            // The receiver only goes away with the store, at which point
            // nobody wants the image.
            let _ = sender.send((id, path, result));
        });
    }

    /// Loads still in flight.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Next finished load, if any, without blocking.
    pub fn try_next(&mut self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.pending = self.pending.saturating_sub(1);
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks up to `timeout` for the next finished load.
    pub fn wait_next(&mut self, timeout: std::time::Duration) -> Option<LoadResult> {
        let result = self.receiver.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(result)
    }
}

/// All textures, addressed by [`TextureId`].
#[derive(Default)]
pub struct TextureStore {
    textures: Vec<Texture>,
    // Bumped whenever a slot's contents are replaced.
    generations: Vec<u64>,
    loader: TextureLoader,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len());
        self.textures.push(texture);
        self.generations.push(0);
        id
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    /// How many times the texture behind `id` has been replaced. Anything
    /// built from a texture's view, such as a bind group, is stale once this
    /// changes.
    pub fn generation(&self, id: TextureId) -> Option<u64> {
        self.generations.get(id.0).copied()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Returns a usable handle right away; the contents follow once the
    /// image is decoded and [`poll`](Self::poll) runs.
    pub fn load(&mut self, gpu: &GpuContext, path: impl AsRef<Path>) -> TextureId {
        let path = path.as_ref().to_path_buf();
        let id = self.insert(Texture::placeholder(gpu));
        debug!("loading texture {} as {:?}", path.display(), id);
        self.loader.spawn(id, path);
        id
    }

    /// Loads still waiting for [`poll`](Self::poll).
    pub fn pending(&self) -> usize {
        self.loader.pending()
    }

    /// Uploads every image decoded since the last call. Returns how many
    /// textures were replaced.
    pub fn poll(&mut self, gpu: &GpuContext) -> usize {
        let mut replaced = 0;
        while let Some((id, path, result)) = self.loader.try_next() {
            match result {
                Ok(image) => {
                    let label = path.display().to_string();
                    if let Some(slot) = self.textures.get_mut(id.0) {
                        *slot = Texture::upload(gpu, &image, &label);
                        if let Some(generation) = self.generations.get_mut(id.0) {
                            *generation += 1;
                        }
                        replaced += 1;
                        info!(
                            "loaded texture {} ({}x{}, {} mips)",
                            label,
                            image.width,
                            image.height,
                            image.mip_level_count()
                        );
                    }
                }
                Err(err) => warn!("keeping placeholder: {err}"),
            }
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn power_of_two_images_get_a_full_mip_chain() {
        let image = TextureImage::from_rgba(8, 2, vec![255; 8 * 2 * 4]).unwrap();
        assert_eq!(image.sampling(), Sampling::RepeatMipmapped);
        let sizes: Vec<usize> = image.levels.iter().map(Vec::len).collect();
        // 8x2, 4x1, 2x1, 1x1
        assert_eq!(sizes, vec![64, 16, 8, 4]);
    }

    #[test]
    fn other_sizes_clamp_without_mips() {
        let image = TextureImage::from_rgba(3, 4, vec![0; 3 * 4 * 4]).unwrap();
        assert_eq!(image.sampling(), Sampling::ClampLinear);
        assert_eq!(image.mip_level_count(), 1);
    }

    #[test]
    fn sampler_settings_follow_sampling() {
        let repeat = Sampling::RepeatMipmapped.descriptor("a");
        assert_eq!(repeat.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(repeat.min_filter, wgpu::FilterMode::Linear);

        let clamp = Sampling::ClampLinear.descriptor("b");
        assert_eq!(clamp.address_mode_v, wgpu::AddressMode::ClampToEdge);
        assert_eq!(clamp.mag_filter, wgpu::FilterMode::Linear);
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        let err = TextureImage::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            TextureError::SizeMismatch {
                expected: 16,
                found: 15,
                ..
            }
        ));
    }

    #[test]
    fn placeholder_is_opaque_blue() {
        let placeholder = TextureImage::placeholder();
        assert_eq!(placeholder.levels, vec![vec![0, 0, 255, 255]]);
    }

    #[test]
    fn unknown_ids_have_no_generation() {
        let store = TextureStore::new();
        assert!(store.is_empty());
        assert_eq!(store.generation(TextureId(0)), None);
    }

    #[test]
    fn loader_reports_missing_files_over_the_channel() {
        let mut loader = TextureLoader::new();
        loader.spawn(TextureId(5), PathBuf::from("no/such/texture.png"));
        assert_eq!(loader.pending(), 1);

        let (id, _, result) = loader
            .wait_next(Duration::from_secs(10))
            .expect("load finished");
        assert_eq!(id, TextureId(5));
        assert!(matches!(result, Err(TextureError::Io { .. })));
        assert_eq!(loader.pending(), 0);
        assert!(loader.try_next().is_none());
    }

    #[test]
    fn loader_decodes_real_images() {
        let path = std::env::temp_dir().join(format!("trireme-loader-{}.png", std::process::id()));
        RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let mut loader = TextureLoader::new();
        loader.spawn(TextureId(0), path.clone());
        let (_, _, result) = loader.wait_next(Duration::from_secs(10)).unwrap();
        let image = result.unwrap();
        assert_eq!((image.width, image.height), (4, 4));
        assert_eq!(&image.levels[0][..4], &[10, 20, 30, 255]);
        assert_eq!(image.mip_level_count(), 3);

        std::fs::remove_file(path).ok();
    }
}
