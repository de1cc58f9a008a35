use glam::Mat4;
use hexscape_common::{DescriptorId, Placement};

use crate::descriptor::VertexData;

/// Vertex data an entity brings along for one attribute location.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInput {
    pub location: u32,
    pub data: VertexData,
}

/// Per-entity geometry uploaded right before the entity is drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicMesh {
    pub inputs: Vec<MeshInput>,
    /// Overrides the descriptor's vertex count when set.
    pub vertex_count: Option<u32>,
}

impl DynamicMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, location: u32, data: impl Into<VertexData>) -> Self {
        self.inputs.push(MeshInput {
            location,
            data: data.into(),
        });
        self
    }

    pub fn with_vertex_count(mut self, count: u32) -> Self {
        self.vertex_count = Some(count);
        self
    }

    pub fn input(&self, location: u32) -> Option<&MeshInput> {
        self.inputs.iter().find(|i| i.location == location)
    }
}

/// One draw instance for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Geometry comes from the descriptor, uploaded once at build time.
    Static {
        descriptor: DescriptorId,
        placement: Placement,
    },
    /// Geometry supplied by the entity, uploaded every time it is drawn.
    Dynamic {
        descriptor: DescriptorId,
        placement: Placement,
        mesh: DynamicMesh,
    },
}

impl Entity {
    pub fn new(descriptor: impl Into<DescriptorId>, placement: impl Into<Placement>) -> Self {
        Entity::Static {
            descriptor: descriptor.into(),
            placement: placement.into(),
        }
    }

    pub fn dynamic(
        descriptor: impl Into<DescriptorId>,
        placement: impl Into<Placement>,
        mesh: DynamicMesh,
    ) -> Self {
        Entity::Dynamic {
            descriptor: descriptor.into(),
            placement: placement.into(),
            mesh,
        }
    }

    pub fn descriptor(&self) -> &DescriptorId {
        match self {
            Entity::Static { descriptor, .. } | Entity::Dynamic { descriptor, .. } => descriptor,
        }
    }

    pub fn placement(&self) -> &Placement {
        match self {
            Entity::Static { placement, .. } | Entity::Dynamic { placement, .. } => placement,
        }
    }

    pub fn mesh(&self) -> Option<&DynamicMesh> {
        match self {
            Entity::Static { .. } => None,
            Entity::Dynamic { mesh, .. } => Some(mesh),
        }
    }

    pub fn model_view(&self) -> Mat4 {
        self.placement().model_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn static_entity_accessors() {
        let e = Entity::new("hexTile", Vec3::new(1.0, 2.0, -50.0));
        assert_eq!(e.descriptor().as_str(), "hexTile");
        assert!(e.mesh().is_none());
        assert_eq!(e.model_view(), Mat4::from_translation(Vec3::new(1.0, 2.0, -50.0)));
    }

    #[test]
    fn dynamic_entity_carries_mesh() {
        let mesh = DynamicMesh::new()
            .with_input(0, vec![0.0f32, 1.0, 1.0, 0.0])
            .with_vertex_count(2);
        let e = Entity::dynamic("line", Vec3::ZERO, mesh);
        let mesh = e.mesh().unwrap();
        assert_eq!(mesh.vertex_count, Some(2));
        assert!(mesh.input(0).is_some());
        assert!(mesh.input(1).is_none());
    }
}
