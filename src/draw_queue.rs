//! Deferred draw submission.
//!
//! Components never talk to the GPU directly. During a tick they push
//! [`DrawCommand`]s into the frame's [`DrawQueue`]; the
//! [`SceneRenderer`](crate::SceneRenderer) consumes the queue once every
//! object has been updated, using the camera matrices of that frame.

use glam::Mat4;

use crate::mesh::Topology;
use crate::resources::{MaterialId, MeshId};

/// One indexed draw of a mesh with a material.
#[derive(Clone, Copy, Debug)]
pub struct DrawCommand {
    pub mesh: MeshId,
    pub material: MaterialId,
    pub topology: Topology,
    /// Model matrix of the owning transform at queue time.
    pub model: Mat4,
}

/// Per-frame list of draw commands, in submission order.
#[derive(Debug, Default)]
pub struct DrawQueue {
    commands: Vec<DrawCommand>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Drops all commands, keeping the allocation for the next frame.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }

    pub fn as_slice(&self) -> &[DrawCommand] {
        &self.commands
    }
}
