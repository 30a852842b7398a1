//! A transform plus an ordered list of components.

use crate::component::{self, Component, ComponentKind, ComponentType, Tick};
use crate::draw_queue::DrawQueue;
use crate::transform::Transform;

/// An entity in the scene.
///
/// The object owns exactly one [`Transform`] and a sequence of components.
/// Components are updated in the order they were attached; a component that
/// moves the transform is observed by every component after it in the same
/// tick.
#[derive(Default)]
pub struct GameObject {
    name: Option<String>,
    transform: Transform,
    components: Vec<Box<dyn Component>>,
}

impl GameObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object placed at `transform`, so components attached
    /// afterwards initialise against it.
    pub fn from_transform(transform: Transform) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }

    /// Creates an object and attaches `components` in order.
    pub fn with_components(components: Vec<Box<dyn Component>>) -> Self {
        let mut object = Self::new();
        for component in components {
            object.attach_boxed(component);
        }
        object
    }

    /// Builder form of [`attach_component`](Self::attach_component).
    pub fn with(mut self, component: impl Component) -> Self {
        self.attach_component(component);
        self
    }

    /// Builder that sets a display name used in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Appends `component` and runs its `init` against this object's transform.
    pub fn attach_component(&mut self, component: impl Component) {
        self.attach_boxed(Box::new(component));
    }

    pub fn attach_boxed(&mut self, mut component: Box<dyn Component>) {
        component.init(&self.transform);
        self.components.push(component);
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Updates every component in attachment order.
    pub fn update(&mut self, dt: f32, draws: &mut DrawQueue) {
        for component in &mut self.components {
            let mut tick = Tick {
                transform: &mut self.transform,
                dt,
                draws: &mut *draws,
            };
            component.update(&mut tick);
        }
    }

    /// Updates with a throwaway draw queue. Handy for logic-only objects.
    pub fn update_detached(&mut self, dt: f32) {
        let mut draws = DrawQueue::new();
        self.update(dt, &mut draws);
    }

    /// First attached component whose kind is `kind`.
    pub fn get_component(&self, kind: ComponentKind) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| c.as_ref())
    }

    pub fn get_component_mut(&mut self, kind: ComponentKind) -> Option<&mut dyn Component> {
        for c in &mut self.components {
            if c.kind() == kind {
                return Some(c.as_mut());
            }
        }
        None
    }

    /// Typed lookup of the first component of type `T`.
    pub fn component<T: ComponentType>(&self) -> Option<&T> {
        self.get_component(T::KIND)
            .and_then(|c| component::downcast_ref::<T>(c))
    }

    pub fn component_mut<T: ComponentType>(&mut self) -> Option<&mut T> {
        self.get_component_mut(T::KIND)
            .and_then(|c| component::downcast_mut::<T>(c))
    }

    /// The transform together with every component of type `T`, so callers
    /// can refresh components against their owner without a second borrow.
    pub fn transform_and_components_mut<T: ComponentType>(
        &mut self,
    ) -> (&mut Transform, impl Iterator<Item = &mut T>) {
        let components = self
            .components
            .iter_mut()
            .filter_map(|c| component::downcast_mut::<T>(c.as_mut()));
        (&mut self.transform, components)
    }
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<ComponentKind> = self.components.iter().map(|c| c.kind()).collect();
        f.debug_struct("GameObject")
            .field("name", &self.name)
            .field("position", &self.transform.position())
            .field("components", &kinds)
            .finish()
    }
}
