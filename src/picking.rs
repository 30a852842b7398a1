//! Ray casting against box colliders for pointer picking.
//!
//! This module provides:
//!
//! - [`Ray`]: an origin and a direction
//! - [`intersect_box`]: the slab test against an axis-aligned box
//! - [`BoxCollider`]: a component that keeps a world-space unit box in sync
//!   with its owner and answers ray queries
//! - [`RayHit`]: what a scene-wide raycast reports
//!
//! # Example
//!
//! ```
//! use trireme::{BoxCollider, Ray, Transform, Vec3};
//!
//! let owner = Transform::new();
//! let mut collider = BoxCollider::new(Vec3::ONE);
//!
//! let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
//! let hit = collider.check_collision(&owner, &ray).unwrap();
//! assert!(hit.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-6));
//! ```

use glam::Vec3;

use crate::color::Color;
use crate::component::{Component, ComponentKind, ComponentType, Tick};
use crate::draw_queue::DrawCommand;
use crate::mesh::Topology;
use crate::resources::{MaterialId, MeshId};
use crate::scene::ObjectId;
use crate::transform::Transform;

/// Corner of the unit box in collider space.
const BOX_MIN: Vec3 = Vec3::splat(-0.5);
/// Opposite corner of the unit box in collider space.
const BOX_MAX: Vec3 = Vec3::splat(0.5);

/// Colour of collider wireframes.
pub const DEBUG_COLOR: Color = Color::COLLIDER_DEBUG;

/// A ray in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized, or zero if constructed from a zero vector.
    pub direction: Vec3,
}

impl Ray {
    /// The direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Parametric distance to the box spanned by `min` and `max`, see
    /// [`intersect_box`].
    pub fn intersect_box(&self, min: Vec3, max: Vec3) -> Option<f32> {
        intersect_box(self, min, max)
    }
}

/// Slab test of `ray` against the box with corners `a` and `b`.
///
/// Returns the ray parameter of the hit: the entry point when the origin is
/// outside the box, the exit point when it is inside. Zero direction
/// components divide to infinities, so a ray parallel to a slab is rejected
/// when outside it and unconstrained when inside. A parallel ray whose origin
/// lies exactly on one of the slab planes divides `0 / 0`; `f32::min` and
/// `f32::max` then keep the infinite bound of the opposite plane, so the slab
/// collapses and the ray misses. Grazing a face exactly never counts as a hit.
pub fn intersect_box(ray: &Ray, a: Vec3, b: Vec3) -> Option<f32> {
    let t1 = (a.x - ray.origin.x) / ray.direction.x;
    let t2 = (b.x - ray.origin.x) / ray.direction.x;
    let t3 = (a.y - ray.origin.y) / ray.direction.y;
    let t4 = (b.y - ray.origin.y) / ray.direction.y;
    let t5 = (a.z - ray.origin.z) / ray.direction.z;
    let t6 = (b.z - ray.origin.z) / ray.direction.z;

    let t_min = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let t_max = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    // Box entirely behind the origin.
    if t_max < 0.0 {
        return None;
    }
    if t_min > t_max {
        return None;
    }

    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Wireframe resources used when a collider draws itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderDebugDraw {
    pub mesh: MeshId,
    pub material: MaterialId,
}

/// A box collider: a unit cube scaled by `scale` and by the owner's scale,
/// centred on the owner's position.
///
/// The owner's rotation is not applied; the box stays axis-aligned in world
/// space however the owner is oriented.
#[derive(Clone, Debug)]
pub struct BoxCollider {
    scale: Vec3,
    transform: Transform,
    debug: bool,
    debug_draw: Option<ColliderDebugDraw>,
}

impl BoxCollider {
    pub fn new(scale: Vec3) -> Self {
        Self {
            scale,
            transform: Transform::new(),
            debug: false,
            debug_draw: None,
        }
    }

    /// Collider with the same scale factor on every axis.
    pub fn uniform(scale: f32) -> Self {
        Self::new(Vec3::splat(scale))
    }

    /// Enables wireframe drawing with the given mesh and material.
    pub fn with_debug_draw(mut self, mesh: MeshId, material: MaterialId) -> Self {
        self.debug_draw = Some(ColliderDebugDraw { mesh, material });
        self.debug = true;
        self
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Turns wireframe drawing on or off. Has no visible effect until debug
    /// draw resources are assigned.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_debug_draw(&mut self, draw: Option<ColliderDebugDraw>) {
        self.debug_draw = draw;
    }

    /// World pose of the collider box as of the last refresh.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Recomputes the world pose from the owner: combined scale, owner
    /// position, no rotation.
    pub fn refresh(&mut self, owner: &Transform) {
        self.transform.rescale(self.scale * owner.scale());
        self.transform.translate(owner.position());
    }

    /// World-space corners of the box after a refresh.
    pub fn world_corners(&mut self) -> (Vec3, Vec3) {
        let matrix = self.transform.get_transformation();
        (
            matrix.transform_point3(BOX_MIN),
            matrix.transform_point3(BOX_MAX),
        )
    }

    /// Ray parameter of the hit against this collider, refreshed from `owner`.
    pub fn intersect(&mut self, owner: &Transform, ray: &Ray) -> Option<f32> {
        self.refresh(owner);
        let (min, max) = self.world_corners();
        intersect_box(ray, min, max)
    }

    /// World-space hit point against this collider, refreshed from `owner`.
    pub fn check_collision(&mut self, owner: &Transform, ray: &Ray) -> Option<Vec3> {
        self.intersect(owner, ray).map(|t| ray.point_at(t))
    }
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self::new(Vec3::ONE)
    }
}

impl Component for BoxCollider {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn init(&mut self, owner: &Transform) {
        self.refresh(owner);
    }

    fn update(&mut self, tick: &mut Tick<'_>) {
        self.refresh(tick.transform);

        if !self.debug {
            return;
        }
        if let Some(draw) = self.debug_draw {
            tick.draws.push(DrawCommand {
                mesh: draw.mesh,
                material: draw.material,
                topology: Topology::LineList,
                model: self.transform.get_transformation(),
            });
        }
    }
}

impl ComponentType for BoxCollider {
    const KIND: ComponentKind = ComponentKind::BoxCollider;
}

/// One collider hit by a scene raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Object owning the collider.
    pub object: ObjectId,
    /// Ray parameter of the hit.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_queue::DrawQueue;

    const EPS: f32 = 1e-5;

    fn down_z(origin: Vec3) -> Ray {
        Ray::new(origin, Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn hits_unit_box_front_face() {
        let mut collider = BoxCollider::default();
        let point = collider
            .check_collision(&Transform::new(), &down_z(Vec3::new(0.0, 0.0, 5.0)))
            .expect("hit");
        assert!(point.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), EPS));
    }

    #[test]
    fn misses_box_off_to_the_side() {
        let mut collider = BoxCollider::default();
        let hit = collider.check_collision(&Transform::new(), &down_z(Vec3::new(10.0, 10.0, 10.0)));
        assert_eq!(hit, None);
    }

    #[test]
    fn origin_inside_returns_exit_point() {
        let ray = down_z(Vec3::new(0.0, 0.0, 0.25));
        let t = intersect_box(&ray, BOX_MIN, BOX_MAX).expect("hit");
        assert!((t - 0.75).abs() < EPS);
        assert!(ray.point_at(t).abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), EPS));
    }

    #[test]
    fn box_behind_origin_is_rejected() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert_eq!(intersect_box(&ray, BOX_MIN, BOX_MAX), None);
    }

    #[test]
    fn parallel_ray_outside_slab_is_rejected() {
        // Direction has zero x and y; origin is outside the x slab.
        let ray = down_z(Vec3::new(0.75, 0.0, 5.0));
        assert_eq!(intersect_box(&ray, BOX_MIN, BOX_MAX), None);
    }

    #[test]
    fn parallel_ray_on_face_plane_misses() {
        for x in [-0.5, 0.5] {
            let ray = down_z(Vec3::new(x, 0.0, 5.0));
            assert_eq!(intersect_box(&ray, BOX_MIN, BOX_MAX), None, "x = {x}");
        }

        let inside = down_z(Vec3::new(0.49, 0.0, 5.0));
        let t = intersect_box(&inside, BOX_MIN, BOX_MAX).expect("hit");
        assert!((t - 4.5).abs() < EPS);
    }

    #[test]
    fn corner_order_does_not_matter() {
        let ray = down_z(Vec3::new(0.1, -0.2, 3.0));
        let a = intersect_box(&ray, BOX_MIN, BOX_MAX);
        let b = intersect_box(&ray, BOX_MAX, BOX_MIN);
        assert_eq!(a, b);
        assert!((a.unwrap() - 2.5).abs() < EPS);
    }

    #[test]
    fn collider_combines_owner_scale_and_position() {
        let owner = Transform::from_position(Vec3::new(0.0, 2.0, 0.0)).with_scale(Vec3::splat(2.0));
        let mut collider = BoxCollider::uniform(1.5);

        let ray = down_z(Vec3::new(0.0, 2.0, 10.0));
        let point = collider.check_collision(&owner, &ray).expect("hit");
        // Half extent is 0.5 * 1.5 * 2.
        assert!(point.abs_diff_eq(Vec3::new(0.0, 2.0, 1.5), EPS));
        assert_eq!(collider.transform().position(), owner.position());
    }

    #[test]
    fn collider_ignores_owner_rotation() {
        let owner = Transform::new()
            .with_scale(Vec3::new(4.0, 1.0, 1.0))
            .with_euler_angles(Vec3::new(0.0, 90.0, 0.0));
        let mut collider = BoxCollider::default();

        // A rotated box would be long along z; the collider stays long along x.
        let hit_x = collider.check_collision(&owner, &down_z(Vec3::new(1.5, 0.0, 5.0)));
        assert!(hit_x.is_some());
        let hit_far_z = collider.check_collision(&owner, &Ray::new(Vec3::new(5.0, 0.0, 1.5), -Vec3::X));
        assert_eq!(hit_far_z, None);
    }

    #[test]
    fn debug_draw_queues_line_list_only_when_enabled() {
        let mut owner = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let mut collider = BoxCollider::uniform(2.0).with_debug_draw(MeshId(3), MaterialId(1));
        let mut draws = DrawQueue::new();

        collider.update(&mut Tick {
            transform: &mut owner,
            dt: 0.016,
            draws: &mut draws,
        });
        assert_eq!(draws.len(), 1);
        let command = draws.as_slice()[0];
        assert_eq!(command.topology, Topology::LineList);
        assert_eq!(command.mesh, MeshId(3));
        assert!(
            command
                .model
                .transform_point3(BOX_MAX)
                .abs_diff_eq(Vec3::new(2.0, 1.0, 1.0), EPS)
        );

        collider.set_debug(false);
        draws.clear();
        collider.update(&mut Tick {
            transform: &mut owner,
            dt: 0.016,
            draws: &mut draws,
        });
        assert!(draws.is_empty());
    }
}
