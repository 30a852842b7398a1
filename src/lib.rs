//! # Trireme
//!
//! **A small 3D scene framework: transforms, components, ray picking and
//! wgpu mesh rendering.**
//!
//! A scene is an ordered list of [`GameObject`]s. Each object owns a
//! [`Transform`] and a list of [`Component`]s that are updated every frame.
//! Built-in components cover cameras, box colliders for ray picking,
//! waypoint movement and mesh drawing.
//!
//! ## Quick Start
//!
//! ```no_run
//! use trireme::*;
//!
//! fn main() -> Result<(), AppError> {
//!     run(|ctx| {
//!         let camera = GameObject::from_transform(Transform::from_position(Vec3::new(0.0, 0.0, 4.0)))
//!             .with(ctx.camera());
//!         let camera = ctx.scene.add(camera);
//!         ctx.scene.set_active_camera(camera);
//!
//!         let cube = ctx.add_mesh(&MeshData::cube(Color::WHITE))?;
//!         let red = ctx.add_material(UnlitMaterial::new(Color::rgb(1.0, 0.0, 0.0)));
//!         ctx.scene.add(
//!             GameObject::new()
//!                 .with(MeshRenderer::new(cube, red))
//!                 .with(BoxCollider::uniform(1.0)),
//!         );
//!
//!         Ok(move |frame: &mut Frame| {
//!             if frame.input.mouse_pressed(MouseButton::Left) {
//!                 if let Some(hit) = frame.pick() {
//!                     log::info!("picked {:?} at {}", hit.object, hit.point);
//!                 }
//!             }
//!         })
//!     })
//! }
//! ```
//!
//! ## Design
//!
//! - **Explicit context**: the runner lends the GPU, resources and scene to
//!   the setup and frame closures. There is no global state.
//! - **Tagged components**: lookups go through [`ComponentKind`], not type
//!   reflection.
//! - **Deferred drawing**: components queue [`DrawCommand`]s during update;
//!   the [`SceneRenderer`] draws the queue in one pass.
//! - **Non-blocking textures**: a texture handle is valid immediately and is
//!   filled in when the background decode finishes.

mod app;
mod camera;
mod color;
mod component;
mod config;
mod draw_queue;
mod error;
mod game_object;
mod gpu;
mod input;
mod material;
mod mesh;
mod mesh_renderer;
mod picking;
mod renderer;
mod resources;
mod scene;
mod shader;
mod texture;
mod transform;
mod waypoint;

pub use app::{Frame, SetupContext, run, run_with_config};
pub use camera::Camera;
pub use color::Color;
pub use component::{Component, ComponentKind, ComponentType, Tick, downcast_mut, downcast_ref};
pub use config::AppConfig;
pub use draw_queue::{DrawCommand, DrawQueue};
pub use error::{AppError, ConfigError, GpuError, MeshError, TextureError};
pub use game_object::GameObject;
pub use gpu::GpuContext;
pub use input::Input;
pub use material::{
    LitTextureMaterial, Material, MaterialUniforms, ShaderKind, UnlitMaterial, VertexAttribute,
};
pub use mesh::{GpuMesh, MeshData, Topology};
pub use mesh_renderer::MeshRenderer;
pub use picking::{BoxCollider, ColliderDebugDraw, DEBUG_COLOR, Ray, RayHit, intersect_box};
pub use renderer::SceneRenderer;
pub use resources::{MaterialId, MeshId, RenderResources, TextureId};
pub use scene::{ObjectId, Scene};
pub use shader::ShaderRegistry;
pub use texture::{
    LoadResult, PLACEHOLDER_RGBA, Sampling, Texture, TextureImage, TextureLoader, TextureStore,
};
pub use transform::{Transform, quat_from_euler_degrees};
pub use waypoint::WaypointFollower;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
