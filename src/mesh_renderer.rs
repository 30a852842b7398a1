use crate::component::{Component, ComponentKind, ComponentType, Tick};
use crate::draw_queue::DrawCommand;
use crate::mesh::Topology;
use crate::resources::{MaterialId, MeshId};

/// Draws a mesh with a material at its owner's transform.
///
/// Each tick the renderer queues one [`DrawCommand`] carrying the owner's
/// model matrix; the actual GPU work happens when the frame's draw queue is
/// rendered.
#[derive(Clone, Copy, Debug)]
pub struct MeshRenderer {
    pub mesh: MeshId,
    pub material: MaterialId,
    pub topology: Topology,
    pub visible: bool,
}

impl MeshRenderer {
    pub fn new(mesh: MeshId, material: MaterialId) -> Self {
        Self {
            mesh,
            material,
            topology: Topology::TriangleList,
            visible: true,
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
}

impl Component for MeshRenderer {
    fn kind(&self) -> ComponentKind {
        Self::KIND
    }

    fn update(&mut self, tick: &mut Tick<'_>) {
        if !self.visible {
            return;
        }
        tick.draws.push(DrawCommand {
            mesh: self.mesh,
            material: self.material,
            topology: self.topology,
            model: tick.transform.get_transformation(),
        });
    }
}

impl ComponentType for MeshRenderer {
    const KIND: ComponentKind = ComponentKind::MeshRenderer;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_queue::DrawQueue;
    use crate::game_object::GameObject;
    use crate::waypoint::WaypointFollower;
    use glam::Vec3;

    #[test]
    fn queues_model_matrix_after_earlier_components() {
        let mut object = GameObject::new()
            .with(WaypointFollower::new(vec![Vec3::new(0.0, 5.0, 0.0)], 100.0))
            .with(MeshRenderer::new(MeshId(0), MaterialId(2)));
        let mut draws = DrawQueue::new();
        object.update(0.1, &mut draws);

        assert_eq!(draws.len(), 1);
        let command = draws.as_slice()[0];
        assert_eq!(command.material, MaterialId(2));
        assert_eq!(command.topology, Topology::TriangleList);
        assert_eq!(command.model.w_axis.truncate(), Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(object.transform().cached_matrix(), command.model);
    }

    #[test]
    fn hidden_renderer_queues_nothing() {
        let mut renderer = MeshRenderer::new(MeshId(1), MaterialId(1)).with_topology(Topology::LineList);
        renderer.visible = false;
        let mut object = GameObject::new().with(renderer);
        let mut draws = DrawQueue::new();
        object.update(0.1, &mut draws);
        assert!(draws.is_empty());
    }
}
