use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::component::{Component, ComponentKind, ComponentType, Tick};
use crate::picking::Ray;
use crate::transform::Transform;

/// A perspective camera, attached to a game object as a component.
///
/// The view matrix is the inverse of the owner's model matrix and is only
/// refreshed by [`update`](Component::update) (or [`update_view`](Self::update_view)).
/// Moving the owner without updating the camera leaves the view stale.
///
/// The owner's forward axis is local +Z, while the camera looks down local
/// -Z, so moving "forward" through the view means `move_forward(-amount)`.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    fov: f32, // radians
    aspect: f32,
    near: f32,
    far: f32,
    projection: Mat4,
    view: Mat4,
    /// Inverse of `view`, i.e. the owner's model matrix at the last update.
    world: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(75f32.to_radians(), 16.0 / 9.0, 1e-4, 1e10)
    }
}

impl Camera {
    /// `fov` is the vertical field of view in radians.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
        };
        camera.set_perspective(fov, aspect, near, far);
        camera
    }

    /// Stores the parameters and rebuilds the projection matrix
    /// (right-handed, depth mapped to `0..1` as wgpu expects).
    pub fn set_perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) {
        self.fov = fov;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.projection = Mat4::perspective_rh(fov, aspect, near, far);
    }

    /// Rebuilds the projection for a new aspect ratio, e.g. after a resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.set_perspective(self.fov, aspect, self.near, self.far);
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Owner position as of the last view update.
    pub fn position(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }

    /// Recomputes the view matrix from the owner's model matrix.
    pub fn update_view(&mut self, owner: &mut Transform) {
        self.world = owner.get_transformation();
        self.view = self.world.inverse();
    }

    /// Builds a picking ray through the given normalized device coordinates.
    ///
    /// A far-plane point is unprojected through the inverse projection to a
    /// view-space direction, which is taken to world space through the
    /// inverse view. The ray origin is `direction + camera position`, one unit
    /// in front of the eye rather than the eye itself.
    pub fn calculate_clip_space_position_in_world_space(&self, ndc: Vec2) -> Ray {
        let unprojected = self.projection.inverse() * Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
        let eye_direction = Vec4::new(unprojected.x, unprojected.y, -1.0, 0.0);
        let direction = (self.world * eye_direction).truncate().normalize_or_zero();

        Ray {
            origin: direction + self.position(),
            direction,
        }
    }

    /// Shorter name for [`calculate_clip_space_position_in_world_space`](Self::calculate_clip_space_position_in_world_space).
    pub fn screen_ray(&self, ndc: Vec2) -> Ray {
        self.calculate_clip_space_position_in_world_space(ndc)
    }
}

impl Component for Camera {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn init(&mut self, owner: &Transform) {
        self.world = owner.matrix();
        self.view = self.world.inverse();
    }

    fn update(&mut self, tick: &mut Tick<'_>) {
        self.update_view(tick.transform);
    }
}

impl ComponentType for Camera {
    const KIND: ComponentKind = ComponentKind::Camera;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-4;

    #[test]
    fn view_is_inverse_of_owner_model() {
        let mut owner = Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
            .with_euler_angles(Vec3::new(-20.0, 45.0, 0.0));
        let mut camera = Camera::default();
        camera.update_view(&mut owner);

        let product = camera.view_matrix() * owner.matrix();
        assert!(product.abs_diff_eq(Mat4::IDENTITY, EPS));
        assert!(camera.position().abs_diff_eq(owner.position(), EPS));
    }

    #[test]
    fn view_is_stale_until_updated() {
        let mut owner = Transform::new();
        let mut camera = Camera::default();
        camera.update_view(&mut owner);

        owner.translate(Vec3::new(0.0, 0.0, 10.0));
        assert_eq!(camera.view_matrix(), Mat4::IDENTITY);

        camera.update_view(&mut owner);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 0.0, 10.0), EPS));
    }

    #[test]
    fn centre_ray_points_down_negative_z() {
        let mut owner = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        let mut camera = Camera::new(FRAC_PI_2, 1.0, 0.1, 100.0);
        camera.update_view(&mut owner);

        let ray = camera.calculate_clip_space_position_in_world_space(Vec2::ZERO);
        assert!(ray.direction.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
        // Origin sits one unit along the direction from the eye.
        assert!(ray.origin.abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), EPS));
    }

    #[test]
    fn edge_ray_follows_field_of_view() {
        let mut owner = Transform::new();
        // 90 degree vertical fov with square aspect puts the right edge at 45 degrees.
        let mut camera = Camera::new(FRAC_PI_2, 1.0, 0.1, 100.0);
        camera.update_view(&mut owner);

        let ray = camera.screen_ray(Vec2::new(1.0, 0.0));
        let expected = Vec3::new(1.0, 0.0, -1.0).normalize();
        assert!(ray.direction.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn ray_rotates_with_owner() {
        let mut owner = Transform::new();
        owner.rotate_y(90.0);
        let mut camera = Camera::new(FRAC_PI_2, 1.0, 0.1, 100.0);
        camera.update_view(&mut owner);

        // -Z rotated +90 degrees about Y is -X.
        let ray = camera.screen_ray(Vec2::ZERO);
        assert!(ray.direction.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn set_aspect_keeps_other_parameters() {
        let mut camera = Camera::new(1.0, 1.0, 0.5, 50.0);
        camera.set_aspect(2.0);
        assert_eq!(camera.aspect(), 2.0);
        assert_eq!(camera.fov(), 1.0);
        assert_eq!(camera.near(), 0.5);
        assert_eq!(camera.far(), 50.0);
        assert!(
            camera
                .projection_matrix()
                .abs_diff_eq(Mat4::perspective_rh(1.0, 2.0, 0.5, 50.0), EPS)
        );
    }
}
