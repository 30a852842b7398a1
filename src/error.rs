//! Error types for fallible setup work.
//!
//! Runtime conditions that the frame loop tolerates (a shader that fails to
//! compile, a texture that never arrives, a missing component) are logged
//! and skipped instead of being reported through these types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to bring up the GPU.
#[derive(Error, Debug)]
pub enum GpuError {
    /// The window could not be turned into a drawable surface.
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    /// No adapter is compatible with the surface.
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The surface reports no usable configuration for this adapter.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Invalid mesh data.
#[derive(Error, Debug)]
pub enum MeshError {
    /// An index points past the end of the vertex array.
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A flat array does not hold a whole number of elements.
    #[error("{attribute} has {len} floats, not a multiple of {width}")]
    Ragged {
        attribute: &'static str,
        len: usize,
        width: usize,
    },

    /// An optional attribute does not match the vertex count.
    #[error("{attribute} describes {found} vertices but positions describe {expected}")]
    AttributeCount {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    /// No vertices or no indices, leaving nothing to draw.
    #[error("mesh is empty ({vertices} vertices, {indices} indices)")]
    Empty { vertices: usize, indices: usize },
}

/// Failure to load a texture image.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Pixel data length does not match the stated dimensions.
    #[error("expected {expected} bytes of RGBA data for {width}x{height}, got {found}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        found: usize,
    },
}

/// Failure to load an [`AppConfig`](crate::AppConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure of the application runner.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}
