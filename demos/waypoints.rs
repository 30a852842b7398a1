//! Cubes patrolling waypoint loops over a textured floor.
//!
//! Click a cube to stop or restart it. Q/E orbit the camera around the
//! square; G toggles collider wireframes.

use anyhow::Result;
use log::info;
use trireme::{
    AppConfig, AppError, BoxCollider, Color, Frame, GameObject, KeyCode, LitTextureMaterial,
    MeshData, MeshRenderer, MouseButton, ObjectId, SetupContext, Transform, UnlitMaterial, Vec3,
    WaypointFollower, run_with_config,
};

const PATROL_COLORS: [Color; 3] = [
    Color::rgb(0.9, 0.3, 0.3),
    Color::rgb(0.3, 0.9, 0.4),
    Color::rgb(0.3, 0.5, 0.9),
];

fn main() -> Result<()> {
    let config = AppConfig::new().title("Trireme - waypoints").size(1024, 640);
    run_with_config(config, |ctx| {
        let mut demo = Patrol::build(ctx)?;
        Ok(move |frame: &mut Frame| demo.frame(frame))
    })?;
    Ok(())
}

struct Patrol {
    camera: ObjectId,
    /// Walker objects and their patrol speeds.
    walkers: Vec<(ObjectId, f32)>,
}

impl Patrol {
    fn build(ctx: &mut SetupContext) -> Result<Self, AppError> {
        let cube = ctx.add_mesh(&MeshData::cube(Color::WHITE))?;
        let plane = ctx.add_mesh(&MeshData::plane(Color::rgb(0.5, 0.5, 0.5)))?;
        let wire_cube = ctx.add_mesh(&MeshData::wire_cube())?;
        let wireframe = ctx.add_material(UnlitMaterial::new(Color::COLLIDER_DEBUG));
        let texture_path = ctx.config.texture_path.clone();
        let texture = ctx.load_texture(texture_path);
        let floor = ctx.add_material(LitTextureMaterial::new(Some(texture)));

        let camera = GameObject::from_transform(
            Transform::from_position(Vec3::new(0.0, 12.0, 12.0))
                .with_euler_angles(Vec3::new(-45.0, 0.0, 0.0)),
        )
        .named("camera")
        .with(ctx.camera());
        let camera = ctx.scene.add(camera);
        ctx.scene.set_active_camera(camera);

        ctx.scene.add(
            GameObject::from_transform(Transform::new().with_scale(Vec3::new(6.0, 1.0, 6.0)))
                .named("floor")
                .with(MeshRenderer::new(plane, floor)),
        );

        let mut walkers = Vec::new();
        for (i, color) in PATROL_COLORS.into_iter().enumerate() {
            let radius = 1.5 + i as f32 * 1.5;
            let corners = vec![
                Vec3::new(-radius, 0.5, -radius),
                Vec3::new(radius, 0.5, -radius),
                Vec3::new(radius, 0.5, radius),
                Vec3::new(-radius, 0.5, radius),
            ];
            let start = corners[0];
            let speed = 3.0 * (1.0 + i as f32 * 0.5);
            let material = ctx.add_material(UnlitMaterial::new(color));
            let walker = GameObject::from_transform(Transform::from_position(start))
                .named(format!("walker {i}"))
                .with(WaypointFollower::new(corners, speed).looping(true))
                .with(MeshRenderer::new(cube, material))
                .with(BoxCollider::uniform(1.0).with_debug_draw(wire_cube, wireframe));
            walkers.push((ctx.scene.add(walker), speed));
        }
        ctx.scene.set_collider_debug(false);
        info!("{} walkers on patrol", walkers.len());

        Ok(Self { camera, walkers })
    }

    fn frame(&mut self, frame: &mut Frame) {
        if frame.input.key_pressed(KeyCode::KeyG) {
            frame.scene.toggle_collider_debug();
        }

        let turn = frame.dt * 90.0;
        if let Some(camera) = frame.scene.get_mut(self.camera) {
            let transform = camera.transform_mut();
            let yaw = if frame.input.key_down(KeyCode::KeyQ) {
                turn
            } else if frame.input.key_down(KeyCode::KeyE) {
                -turn
            } else {
                0.0
            };
            if yaw != 0.0 {
                transform.rotate_y(yaw);
                let angle = transform.euler_angles().y.to_radians();
                transform.translate(Vec3::new(12.0 * angle.sin(), 12.0, 12.0 * angle.cos()));
            }
        }

        if !frame.input.mouse_pressed(MouseButton::Left) {
            return;
        }
        let Some(hit) = frame.pick() else {
            return;
        };
        let Some(&(_, patrol_speed)) = self.walkers.iter().find(|(id, _)| *id == hit.object) else {
            return;
        };
        if let Some(follower) = frame
            .scene
            .get_mut(hit.object)
            .and_then(|walker| walker.component_mut::<WaypointFollower>())
        {
            let speed = if follower.speed() == 0.0 { patrol_speed } else { 0.0 };
            follower.set_speed(speed);
            info!("walker {} speed {speed}", hit.object.index());
        }
    }
}
