use glam::Vec3;

use crate::component::{Component, ComponentKind, ComponentType, Tick};

/// Moves its owner along a list of waypoints at a constant speed.
///
/// When the owner is within one step of the current waypoint it snaps onto
/// it and heads for the next. After the last waypoint the follower either
/// starts over from the first or stops for good.
#[derive(Clone, Debug)]
pub struct WaypointFollower {
    waypoints: Vec<Vec3>,
    speed: f32,
    current: usize,
    looping: bool,
    finished: bool,
}

impl WaypointFollower {
    /// `speed` is in units per second.
    pub fn new(waypoints: Vec<Vec3>, speed: f32) -> Self {
        Self {
            waypoints,
            speed,
            current: 0,
            looping: false,
            finished: false,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Index of the waypoint currently being approached.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Restarts from the first waypoint.
    pub fn reset(&mut self) {
        self.current = 0;
        self.finished = false;
    }

    fn advance(&mut self) {
        self.current += 1;
        if self.current < self.waypoints.len() {
            return;
        }
        if self.looping {
            self.current = 0;
        } else {
            self.current = self.waypoints.len() - 1;
            self.finished = true;
        }
    }
}

impl Component for WaypointFollower {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn update(&mut self, tick: &mut Tick<'_>) {
        if self.finished {
            return;
        }
        let Some(&target) = self.waypoints.get(self.current) else {
            return;
        };

        let position = tick.transform.position();
        let to_target = target - position;
        let step = self.speed * tick.dt;

        if to_target.length() <= step {
            tick.transform.translate(target);
            self.advance();
        } else {
            tick.transform
                .translate(position + to_target.normalize() * step);
        }
    }
}

impl ComponentType for WaypointFollower {
    const KIND: ComponentKind = ComponentKind::WaypointFollower;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_object::GameObject;

    const EPS: f32 = 1e-5;

    fn position(object: &GameObject) -> Vec3 {
        object.transform().position()
    }

    #[test]
    fn moves_at_constant_speed_toward_target() {
        let mut object =
            GameObject::new().with(WaypointFollower::new(vec![Vec3::new(10.0, 0.0, 0.0)], 2.0));
        object.update_detached(1.0);
        assert!(position(&object).abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPS));
        object.update_detached(0.5);
        assert!(position(&object).abs_diff_eq(Vec3::new(3.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn snaps_onto_waypoint_within_one_step() {
        let waypoints = vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 5.0)];
        let mut object = GameObject::new().with(WaypointFollower::new(waypoints, 4.0));

        object.update_detached(1.0);
        assert_eq!(position(&object), Vec3::new(1.0, 0.0, 0.0));
        let follower = object.component::<WaypointFollower>().unwrap();
        assert_eq!(follower.current(), 1);
    }

    #[test]
    fn stops_after_last_waypoint_unless_looping() {
        let waypoints = vec![Vec3::X, Vec3::Y];

        let mut once = GameObject::new().with(WaypointFollower::new(waypoints.clone(), 10.0));
        for _ in 0..5 {
            once.update_detached(1.0);
        }
        assert_eq!(position(&once), Vec3::Y);
        assert!(once.component::<WaypointFollower>().unwrap().is_finished());

        let mut looped =
            GameObject::new().with(WaypointFollower::new(waypoints, 10.0).looping(true));
        looped.update_detached(1.0);
        looped.update_detached(1.0);
        looped.update_detached(1.0);
        assert_eq!(position(&looped), Vec3::X);
        let follower = looped.component::<WaypointFollower>().unwrap();
        assert!(!follower.is_finished());
        assert_eq!(follower.current(), 1);
    }

    #[test]
    fn empty_path_is_a_no_op() {
        let mut object = GameObject::new().with(WaypointFollower::new(Vec::new(), 3.0));
        object.transform_mut().translate(Vec3::ONE);
        object.update_detached(1.0);
        assert_eq!(position(&object), Vec3::ONE);
    }

    #[test]
    fn reset_restarts_a_finished_path() {
        let mut object = GameObject::new().with(WaypointFollower::new(vec![Vec3::X], 5.0));
        object.update_detached(1.0);
        let follower = object.component_mut::<WaypointFollower>().unwrap();
        assert!(follower.is_finished());
        follower.reset();
        assert!(!follower.is_finished());
        assert_eq!(follower.current(), 0);
    }
}
