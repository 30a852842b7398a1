//! Picking demo: a spinning cube with a box collider, a smaller cube that
//! follows the cursor across the collider, and a floor of textured tiles.
//!
//! Controls: WASD to move, Space/Left Shift to rise and sink, Q/E to turn,
//! mouse to look. F locks mouse look and frees the cursor, G toggles collider
//! wireframes.
//!
//! Pass a TOML file as the first argument to override [`AppConfig`] fields.

use anyhow::Result;
use log::{debug, info};
use trireme::{
    AppConfig, AppError, BoxCollider, Color, Frame, GameObject, KeyCode, LitTextureMaterial,
    MeshData, MeshRenderer, MouseButton, ObjectId, SetupContext, Transform, UnlitMaterial, Vec2,
    Vec3, run_with_config,
};

const CUBE_COLOR: Color = Color::rgb(1.0, 0.5, 1.0);
const PLANE_COLOR: Color = Color::rgb(1.0, 0.5, 0.7);
const GRID_SIZE: i32 = 10;
const SPIN_DEGREES_PER_SECOND: f32 = 10.0;

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::default(),
    };
    run_with_config(config, |ctx| {
        let mut demo = Demo::build(ctx)?;
        Ok(move |frame: &mut Frame| demo.frame(frame))
    })?;
    Ok(())
}

struct Demo {
    camera: ObjectId,
    spinner: ObjectId,
    follower: ObjectId,
    mouse_look: bool,
}

impl Demo {
    fn build(ctx: &mut SetupContext) -> Result<Self, AppError> {
        let cube = ctx.add_mesh(&MeshData::cube(Color::YELLOW))?;
        let plane = ctx.add_mesh(&MeshData::plane(PLANE_COLOR))?;
        let wire_cube = ctx.add_mesh(&MeshData::wire_cube())?;

        let pink = ctx.add_material(UnlitMaterial::new(CUBE_COLOR));
        let wireframe = ctx.add_material(UnlitMaterial::new(Color::COLLIDER_DEBUG));
        let texture_path = ctx.config.texture_path.clone();
        let texture = ctx.load_texture(texture_path);
        let textured = ctx.add_material(LitTextureMaterial::new(Some(texture)));

        let camera = GameObject::from_transform(Transform::from_position(Vec3::new(0.0, 3.0, 2.0)))
            .named("camera")
            .with(ctx.camera());
        let camera = ctx.scene.add(camera);
        ctx.scene.set_active_camera(camera);

        let spinner = GameObject::from_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0)))
            .named("spinner")
            .with(MeshRenderer::new(cube, pink))
            .with(BoxCollider::uniform(1.5).with_debug_draw(wire_cube, wireframe));
        let spinner = ctx.scene.add(spinner);
        ctx.scene.set_collider_debug(true);

        let follower = GameObject::from_transform(Transform::new().with_scale(Vec3::splat(0.5)))
            .named("follower")
            .with(MeshRenderer::new(cube, textured));
        let follower = ctx.scene.add(follower);

        for i in 0..GRID_SIZE {
            for j in 0..GRID_SIZE {
                let position = Vec3::new(i as f32 * 2.0, 0.0, j as f32 * 2.0);
                ctx.scene.add(
                    GameObject::from_transform(Transform::from_position(position))
                        .with(MeshRenderer::new(plane, textured)),
                );
            }
        }
        info!("scene ready with {} objects", ctx.scene.len());

        Ok(Demo {
            camera,
            spinner,
            follower,
            mouse_look: true,
        })
    }

    fn frame(&mut self, frame: &mut Frame) {
        if frame.input.key_pressed(KeyCode::KeyF) {
            self.mouse_look = !self.mouse_look;
            debug!("mouse look {}", self.mouse_look);
        }
        if self.mouse_look != frame.cursor_grabbed() {
            frame.set_cursor_grab(self.mouse_look);
        }
        if frame.input.key_pressed(KeyCode::KeyG) {
            frame.scene.toggle_collider_debug();
        }

        let dt = frame.dt;
        if let Some(spinner) = frame.scene.get_mut(self.spinner) {
            spinner
                .transform_mut()
                .rotate_x(dt * SPIN_DEGREES_PER_SECOND);
        }

        self.fly(frame);

        let cursor_moved = frame.input.mouse_delta() != Vec2::ZERO
            || frame.input.mouse_motion() != Vec2::ZERO
            || frame.input.mouse_pressed(MouseButton::Left);
        if cursor_moved {
            if let Some(hit) = frame.pick() {
                if let Some(follower) = frame.scene.get_mut(self.follower) {
                    follower.transform_mut().translate(hit.point);
                }
            }
        }
    }

    fn fly(&self, frame: &mut Frame) {
        let input = frame.input;
        let config = frame.config;
        let step = frame.dt * config.move_speed;
        let turn = frame.dt * config.rotate_speed;
        let Some(camera) = frame.scene.get_mut(self.camera) else {
            return;
        };
        let transform = camera.transform_mut();

        if input.key_down(KeyCode::KeyQ) {
            transform.rotate_y(turn);
        }
        if input.key_down(KeyCode::KeyE) {
            transform.rotate_y(-turn);
        }
        // The camera looks down its local -Z.
        if input.key_down(KeyCode::KeyW) {
            transform.move_forward(-step);
        }
        if input.key_down(KeyCode::KeyS) {
            transform.move_forward(step);
        }
        if input.key_down(KeyCode::KeyA) {
            transform.move_right(-step);
        }
        if input.key_down(KeyCode::KeyD) {
            transform.move_right(step);
        }
        if input.key_down(KeyCode::Space) {
            transform.move_up(step);
        }
        if input.key_down(KeyCode::ShiftLeft) {
            transform.move_up(-step);
        }

        if self.mouse_look {
            let motion = input.mouse_motion() * config.mouse_sensitivity;
            transform.rotate_x(-motion.y);
            transform.rotate_y(-motion.x);
        }
    }
}
