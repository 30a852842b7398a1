//! Behaviours attached to a [`GameObject`](crate::GameObject).
//!
//! A component is anything implementing [`Component`]: it is initialised once
//! when attached and then updated every tick with mutable access to the
//! owner's [`Transform`]. Components are identified by a stable
//! [`ComponentKind`] rather than by runtime type inspection, so lookups are a
//! plain comparison of tags.
//!
//! # Example
//!
//! ```
//! use trireme::{Component, ComponentKind, ComponentType, GameObject, Tick, Vec3};
//!
//! struct Spin {
//!     degrees_per_second: f32,
//! }
//!
//! impl Component for Spin {
//!     fn kind(&self) -> ComponentKind {
//!         Self::KIND
//!     }
//!
//!     fn update(&mut self, tick: &mut Tick<'_>) {
//!         tick.transform.rotate_y(self.degrees_per_second * tick.dt);
//!     }
//! }
//!
//! impl ComponentType for Spin {
//!     const KIND: ComponentKind = ComponentKind::Custom("spin");
//! }
//!
//! let mut object = GameObject::new().with(Spin { degrees_per_second: 90.0 });
//! object.update_detached(1.0);
//! assert!((object.transform().euler_angles().y - 90.0).abs() < 1e-5);
//! assert!(object.component::<Spin>().is_some());
//! ```

use std::any::Any;

use crate::draw_queue::DrawQueue;
use crate::transform::Transform;

/// Stable identifier for a family of components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    MeshRenderer,
    Camera,
    BoxCollider,
    WaypointFollower,
    /// User-defined behaviours, keyed by name.
    Custom(&'static str),
}

/// Everything a component may touch during one update.
pub struct Tick<'a> {
    /// The owning object's transform, shared by all of its components.
    pub transform: &'a mut Transform,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Draw commands for this frame.
    pub draws: &'a mut DrawQueue,
}

/// Upcasting helper so trait objects can be downcast after a kind check.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A behaviour attached to a game object.
pub trait Component: AsAny {
    /// Tag used by [`GameObject::get_component`](crate::GameObject::get_component).
    fn kind(&self) -> ComponentKind;

    /// Called once, right after the component is attached.
    fn init(&mut self, _owner: &Transform) {}

    /// Called once per tick, in attachment order.
    fn update(&mut self, tick: &mut Tick<'_>);
}

/// Components that always report the same kind, enabling typed lookup.
pub trait ComponentType: Component + Sized {
    const KIND: ComponentKind;
}

/// Downcasts `component` to `T` if its kind matches.
pub fn downcast_ref<T: ComponentType>(component: &dyn Component) -> Option<&T> {
    if component.kind() == T::KIND {
        component.as_any().downcast_ref::<T>()
    } else {
        None
    }
}

/// Mutable variant of [`downcast_ref`].
pub fn downcast_mut<T: ComponentType>(component: &mut dyn Component) -> Option<&mut T> {
    if component.kind() == T::KIND {
        component.as_any_mut().downcast_mut::<T>()
    } else {
        None
    }
}
