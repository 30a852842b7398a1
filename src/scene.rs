//! The set of game objects updated and drawn each frame.

use glam::{Mat4, Vec2};
use log::debug;

use crate::camera::Camera;
use crate::draw_queue::DrawQueue;
use crate::game_object::GameObject;
use crate::picking::{BoxCollider, Ray, RayHit};

/// Index of an object in its [`Scene`], in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered collection of game objects plus the active camera.
///
/// Objects are never removed, so an [`ObjectId`] stays valid for the life of
/// the scene.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<GameObject>,
    active_camera: Option<ObjectId>,
    collider_debug: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object and returns its id. New colliders pick up the scene's
    /// current debug-draw setting.
    pub fn add(&mut self, mut object: GameObject) -> ObjectId {
        if self.collider_debug {
            let (_, colliders) = object.transform_and_components_mut::<BoxCollider>();
            for collider in colliders {
                collider.set_debug(true);
            }
        }
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectId(i), object))
    }

    /// Selects the object whose [`Camera`] drives rendering and picking.
    pub fn set_active_camera(&mut self, id: ObjectId) {
        self.active_camera = Some(id);
    }

    pub fn active_camera_id(&self) -> Option<ObjectId> {
        self.active_camera
    }

    pub fn active_camera(&self) -> Option<&Camera> {
        self.get(self.active_camera?)?.component::<Camera>()
    }

    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        let id = self.active_camera?;
        self.get_mut(id)?.component_mut::<Camera>()
    }

    /// `(view, projection)` of the active camera.
    pub fn camera_matrices(&self) -> Option<(Mat4, Mat4)> {
        self.active_camera()
            .map(|camera| (camera.view_matrix(), camera.projection_matrix()))
    }

    /// Updates the active camera's aspect ratio.
    pub fn set_camera_aspect(&mut self, aspect: f32) {
        if let Some(camera) = self.active_camera_mut() {
            camera.set_aspect(aspect);
        }
    }

    /// Re-reads the active camera's pose from its owner's transform, so edits
    /// made since the last [`update`](Self::update) are visible to rays.
    pub fn refresh_camera_view(&mut self) {
        let Some(object) = self.active_camera.and_then(|id| self.objects.get_mut(id.0)) else {
            return;
        };
        let (transform, cameras) = object.transform_and_components_mut::<Camera>();
        for camera in cameras {
            camera.update_view(transform);
        }
    }

    /// Picking ray from the active camera through `ndc`, using the camera
    /// pose of the last view update.
    pub fn camera_ray(&self, ndc: Vec2) -> Option<Ray> {
        self.active_camera().map(|camera| camera.screen_ray(ndc))
    }

    /// Updates every object in insertion order.
    pub fn update(&mut self, dt: f32, draws: &mut DrawQueue) {
        for object in &mut self.objects {
            object.update(dt, draws);
        }
    }

    /// Every collider hit by `ray`, in object order.
    pub fn raycast(&mut self, ray: &Ray) -> Vec<RayHit> {
        let mut hits = Vec::new();
        for (i, object) in self.objects.iter_mut().enumerate() {
            let (transform, colliders) = object.transform_and_components_mut::<BoxCollider>();
            for collider in colliders {
                if let Some(distance) = collider.intersect(transform, ray) {
                    hits.push(RayHit {
                        object: ObjectId(i),
                        distance,
                        point: ray.point_at(distance),
                    });
                }
            }
        }
        hits
    }

    /// The closest hit of `ray`; earlier objects win ties.
    pub fn pick(&mut self, ray: &Ray) -> Option<RayHit> {
        self.raycast(ray)
            .into_iter()
            .reduce(|best, hit| if hit.distance < best.distance { hit } else { best })
    }

    /// Casts the active camera's ray through `ndc` and returns the closest hit.
    /// The camera pose is refreshed first, so a camera moved earlier in the
    /// frame picks from where it is now.
    pub fn pick_ndc(&mut self, ndc: Vec2) -> Option<RayHit> {
        self.refresh_camera_view();
        let ray = self.camera_ray(ndc)?;
        self.pick(&ray)
    }

    pub fn collider_debug(&self) -> bool {
        self.collider_debug
    }

    /// Turns collider wireframes on or off for every collider in the scene.
    pub fn set_collider_debug(&mut self, enabled: bool) {
        self.collider_debug = enabled;
        let mut count = 0;
        for object in &mut self.objects {
            let (_, colliders) = object.transform_and_components_mut::<BoxCollider>();
            for collider in colliders {
                collider.set_debug(enabled);
                count += 1;
            }
        }
        debug!("collider debug drawing {enabled} for {count} colliders");
    }

    /// Flips the collider debug setting and returns the new value.
    pub fn toggle_collider_debug(&mut self) -> bool {
        let enabled = !self.collider_debug;
        self.set_collider_debug(enabled);
        enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use glam::Vec3;
    use std::f32::consts::FRAC_PI_2;

    fn boxed_at(position: Vec3) -> GameObject {
        let mut object = GameObject::new().with(BoxCollider::default());
        object.transform_mut().translate(position);
        object
    }

    fn camera_at(position: Vec3) -> GameObject {
        let mut object = GameObject::new();
        object.transform_mut().translate(position);
        object.with(Camera::new(FRAC_PI_2, 1.0, 0.1, 100.0))
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut scene = Scene::new();
        let a = scene.add(GameObject::new().named("a"));
        let b = scene.add(GameObject::new().named("b"));
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(scene.get(b).and_then(|o| o.name()), Some("b"));
        assert!(scene.get(ObjectId(7)).is_none());
    }

    #[test]
    fn raycast_reports_hits_in_object_order_and_pick_takes_closest() {
        let mut scene = Scene::new();
        let far = scene.add(boxed_at(Vec3::new(0.0, 0.0, -5.0)));
        let _miss = scene.add(boxed_at(Vec3::new(5.0, 0.0, 0.0)));
        let near = scene.add(boxed_at(Vec3::ZERO));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let hits = scene.raycast(&ray);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, far);
        assert_eq!(hits[1].object, near);

        let best = scene.pick(&ray).expect("hit");
        assert_eq!(best.object, near);
        assert!((best.distance - 4.5).abs() < 1e-5);
        assert!(best.point.abs_diff_eq(Vec3::new(0.0, 0.0, 0.5), 1e-5));
    }

    #[test]
    fn pick_through_active_camera() {
        let mut scene = Scene::new();
        let target = scene.add(boxed_at(Vec3::ZERO));
        let camera = scene.add(camera_at(Vec3::new(0.0, 0.0, 5.0)));
        scene.set_active_camera(camera);
        scene.update(0.016, &mut DrawQueue::new());

        let hit = scene.pick_ndc(Vec2::ZERO).expect("hit");
        assert_eq!(hit.object, target);
        // The ray starts one unit in front of the eye.
        assert!((hit.distance - 3.5).abs() < 1e-4);
    }

    #[test]
    fn pick_uses_camera_moved_since_last_update() {
        let mut scene = Scene::new();
        let target = scene.add(boxed_at(Vec3::new(3.0, 0.0, 0.0)));
        let camera = scene.add(camera_at(Vec3::new(0.0, 0.0, 5.0)));
        scene.set_active_camera(camera);
        scene.update(0.016, &mut DrawQueue::new());
        assert!(scene.pick_ndc(Vec2::ZERO).is_none());

        if let Some(object) = scene.get_mut(camera) {
            object.transform_mut().translate(Vec3::new(3.0, 0.0, 5.0));
        }
        let hit = scene.pick_ndc(Vec2::ZERO).expect("hit");
        assert_eq!(hit.object, target);
        assert!(hit.point.abs_diff_eq(Vec3::new(3.0, 0.0, 0.5), 1e-4));
    }

    #[test]
    fn camera_queries_need_an_active_camera() {
        let mut scene = Scene::new();
        scene.add(camera_at(Vec3::ZERO));
        assert!(scene.camera_ray(Vec2::ZERO).is_none());
        assert!(scene.camera_matrices().is_none());

        // An active object without a camera component is not a camera.
        let plain = scene.add(GameObject::new());
        scene.set_active_camera(plain);
        assert!(scene.active_camera().is_none());
    }

    #[test]
    fn set_camera_aspect_reaches_active_camera() {
        let mut scene = Scene::new();
        let camera = scene.add(camera_at(Vec3::ZERO));
        scene.set_active_camera(camera);
        scene.set_camera_aspect(2.5);
        assert_eq!(scene.active_camera().map(|c| c.aspect()), Some(2.5));
    }

    #[test]
    fn toggling_collider_debug_reaches_every_collider() {
        let mut scene = Scene::new();
        let a = scene.add(boxed_at(Vec3::ZERO));
        assert!(scene.toggle_collider_debug());

        let b = scene.add(boxed_at(Vec3::X));
        for id in [a, b] {
            let collider = scene.get(id).and_then(|o| o.component::<BoxCollider>());
            assert_eq!(collider.map(|c| c.debug()), Some(true));
        }

        assert!(!scene.toggle_collider_debug());
        let collider = scene.get(a).and_then(|o| o.component::<BoxCollider>());
        assert_eq!(collider.map(|c| c.debug()), Some(false));
    }

    #[test]
    fn update_refreshes_camera_view() {
        let mut scene = Scene::new();
        let mut object = GameObject::new().with(Camera::default());
        object.transform_mut().translate(Vec3::new(0.0, 3.0, 2.0));
        let id = scene.add(object);
        scene.set_active_camera(id);
        scene.update(0.1, &mut DrawQueue::new());

        let (view, _) = scene.camera_matrices().expect("camera");
        let eye = Transform::from_position(Vec3::new(0.0, 3.0, 2.0)).matrix();
        assert!((view * eye).abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
}
