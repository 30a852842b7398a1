//! Position, scale and orientation of a single game object.
//!
//! A [`Transform`] keeps its orientation as a unit quaternion and derives an
//! orthonormal basis (`right`, `up`, `forward`) from it after every rotation.
//! Rotations are expressed as *accumulated* Euler angles in degrees: each
//! `rotate_*` call adds to the stored angle and rebuilds the quaternion from
//! the full triple, so the result only depends on the totals, never on the
//! order of the calls.
//!
//! # Example
//!
//! ```
//! use trireme::{Transform, Vec3};
//!
//! let mut transform = Transform::new();
//! transform.translate(Vec3::new(0.0, 2.0, 0.0));
//! transform.rotate_y(90.0);
//! transform.move_forward(1.0);
//!
//! let local = transform.world_to_local(Vec3::new(3.0, 2.0, 0.0));
//! let back = transform.local_to_world(local);
//! assert!(back.abs_diff_eq(Vec3::new(3.0, 2.0, 0.0), 1e-5));
//! ```

use glam::{Mat4, Quat, Vec3};

/// Builds an orientation from Euler angles given in degrees.
///
/// The X rotation is applied first, then Y, then Z (`q = qz * qy * qx`).
pub fn quat_from_euler_degrees(angles: Vec3) -> Quat {
    Quat::from_rotation_z(angles.z.to_radians())
        * Quat::from_rotation_y(angles.y.to_radians())
        * Quat::from_rotation_x(angles.x.to_radians())
}

/// Spatial state of one game object.
///
/// Fields are private so the basis can never go stale: every mutation of the
/// orientation goes through a method that re-derives `right`, `up` and
/// `forward`.
#[derive(Clone, Debug)]
pub struct Transform {
    position: Vec3,
    scale: Vec3,
    rotation: Quat,
    euler_angles: Vec3,
    right: Vec3,
    up: Vec3,
    forward: Vec3,
    model_matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
            euler_angles: Vec3::ZERO,
            right: Vec3::X,
            up: Vec3::Y,
            forward: Vec3::Z,
            model_matrix: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    /// Identity transform: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity transform placed at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder form of [`translate`](Self::translate).
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.translate(position);
        self
    }

    /// Builder form of [`rescale`](Self::rescale).
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.rescale(scale);
        self
    }

    /// Builder form of [`set_euler_angles`](Self::set_euler_angles).
    pub fn with_euler_angles(mut self, degrees: Vec3) -> Self {
        self.set_euler_angles(degrees);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Current orientation as a unit quaternion.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Accumulated Euler angles in degrees.
    pub fn euler_angles(&self) -> Vec3 {
        self.euler_angles
    }

    /// Local +X axis in world space.
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Local +Y axis in world space.
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Local +Z axis in world space.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Sets the position. The vector is copied; later changes to the
    /// caller's value do not affect the transform.
    pub fn translate(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Sets the per-axis scale.
    pub fn rescale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Adds `degrees` to the accumulated X angle and rebuilds the orientation.
    pub fn rotate_x(&mut self, degrees: f32) {
        self.euler_angles.x += degrees;
        self.rebuild_orientation();
    }

    /// Adds `degrees` to the accumulated Y angle and rebuilds the orientation.
    pub fn rotate_y(&mut self, degrees: f32) {
        self.euler_angles.y += degrees;
        self.rebuild_orientation();
    }

    /// Adds `degrees` to the accumulated Z angle and rebuilds the orientation.
    pub fn rotate_z(&mut self, degrees: f32) {
        self.euler_angles.z += degrees;
        self.rebuild_orientation();
    }

    /// Applies [`rotate_x`](Self::rotate_x), [`rotate_y`](Self::rotate_y) and
    /// [`rotate_z`](Self::rotate_z) in that order.
    pub fn rotate(&mut self, degrees: Vec3) {
        self.rotate_x(degrees.x);
        self.rotate_y(degrees.y);
        self.rotate_z(degrees.z);
    }

    /// Replaces the accumulated Euler angles and rebuilds once.
    pub fn set_euler_angles(&mut self, degrees: Vec3) {
        self.euler_angles = degrees;
        self.rebuild_orientation();
    }

    pub fn move_forward(&mut self, amount: f32) {
        self.position += self.forward * amount;
    }

    pub fn move_right(&mut self, amount: f32) {
        self.position += self.right * amount;
    }

    pub fn move_up(&mut self, amount: f32) {
        self.position += self.up * amount;
    }

    /// Maps a point expressed in the local basis to world space.
    ///
    /// Scale is not applied; this is a pure rigid change of frame.
    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        self.position + self.right * point.x + self.up * point.y + self.forward * point.z
    }

    /// Inverse of [`local_to_world`](Self::local_to_world).
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        let offset = point - self.position;
        Vec3::new(
            offset.dot(self.right),
            offset.dot(self.up),
            offset.dot(self.forward),
        )
    }

    /// Model matrix `translate * scale * rotate`, without touching the cache.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(self.scale)
            * Mat4::from_quat(self.rotation)
    }

    /// Recomputes the cached model matrix and returns it.
    ///
    /// The cache is overwritten on every call.
    pub fn get_transformation(&mut self) -> Mat4 {
        self.model_matrix = self.matrix();
        self.model_matrix
    }

    /// The model matrix produced by the last [`get_transformation`](Self::get_transformation).
    pub fn cached_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    fn rebuild_orientation(&mut self) {
        self.rotation = quat_from_euler_degrees(self.euler_angles);
        self.realign();
    }

    fn realign(&mut self) {
        self.forward = (self.rotation * Vec3::Z).normalize();
        self.right = (self.rotation * Vec3::X).normalize();
        self.up = (self.rotation * Vec3::Y).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(t: &Transform) {
        let (r, u, f) = (t.right(), t.up(), t.forward());
        assert!((r.length() - 1.0).abs() < EPS);
        assert!((u.length() - 1.0).abs() < EPS);
        assert!((f.length() - 1.0).abs() < EPS);
        assert!(r.dot(u).abs() < EPS);
        assert!(r.dot(f).abs() < EPS);
        assert!(u.dot(f).abs() < EPS);
    }

    #[test]
    fn default_basis_is_identity() {
        let t = Transform::new();
        assert_eq!(t.right(), Vec3::X);
        assert_eq!(t.up(), Vec3::Y);
        assert_eq!(t.forward(), Vec3::Z);
        assert_eq!(t.scale(), Vec3::ONE);
    }

    #[test]
    fn basis_stays_orthonormal_under_rotation() {
        let mut t = Transform::new();
        for step in 0..50 {
            t.rotate(Vec3::new(7.3, -13.1, 29.9 + step as f32));
            assert_orthonormal(&t);
        }
    }

    #[test]
    fn round_trip_local_world() {
        let mut t = Transform::from_position(Vec3::new(1.0, -2.0, 3.5));
        t.rotate(Vec3::new(33.0, 71.0, -12.0));
        t.rescale(Vec3::new(2.0, 0.5, 3.0));

        for p in [
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-4.5, 0.25, 10.0),
        ] {
            let back = t.world_to_local(t.local_to_world(p));
            assert!(back.abs_diff_eq(p, 1e-4), "{back:?} != {p:?}");
        }
    }

    #[test]
    fn incremental_rotation_matches_direct_euler() {
        let mut incremental = Transform::new();
        incremental.rotate_x(90.0);
        incremental.rotate_y(90.0);

        let direct = Transform::new().with_euler_angles(Vec3::new(90.0, 90.0, 0.0));

        assert!(incremental.right().abs_diff_eq(direct.right(), EPS));
        assert!(incremental.up().abs_diff_eq(direct.up(), EPS));
        assert!(incremental.forward().abs_diff_eq(direct.forward(), EPS));
    }

    #[test]
    fn rotation_applies_x_before_z() {
        // +90 about X takes +Y to +Z, then +90 about Z leaves +Z alone.
        let t = Transform::new().with_euler_angles(Vec3::new(90.0, 0.0, 90.0));
        assert!(t.up().abs_diff_eq(Vec3::Z, EPS));
    }

    #[test]
    fn zero_rotation_is_a_no_op() {
        let mut t = Transform::new().with_euler_angles(Vec3::new(10.0, 20.0, 30.0));
        let before = t.rotation();
        t.rotate_y(0.0);
        assert!(t.rotation().abs_diff_eq(before, EPS));
        assert_orthonormal(&t);
    }

    #[test]
    fn moves_along_basis() {
        let mut t = Transform::new();
        t.rotate_y(90.0);
        t.move_forward(2.0);
        // +90 about Y turns +Z toward +X.
        assert!(t.position().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPS));

        t.move_up(1.0);
        t.move_right(-1.0);
        assert!(t.position().abs_diff_eq(Vec3::new(2.0, 1.0, 1.0), EPS));
    }

    #[test]
    fn model_matrix_is_translate_scale_rotate() {
        let mut t = Transform::from_position(Vec3::new(5.0, 0.0, 0.0))
            .with_scale(Vec3::new(2.0, 1.0, 1.0))
            .with_euler_angles(Vec3::new(0.0, 0.0, 90.0));

        let m = t.get_transformation();
        // Rotate (1,0,0) to (0,1,0), then scale (x only, unaffected), then translate.
        let p = m.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(5.0, 1.0, 0.0), EPS));

        // (0,1,0) rotates to (-1,0,0), scaled on world X to (-2,0,0).
        let q = m.transform_point3(Vec3::Y);
        assert!(q.abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPS));
        assert_eq!(t.cached_matrix(), m);
    }

    #[test]
    fn translate_copies_value() {
        let mut source = Vec3::new(1.0, 2.0, 3.0);
        let mut t = Transform::new();
        t.translate(source);
        source.x = 100.0;
        assert_eq!(t.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(source.x, 100.0);
    }
}
