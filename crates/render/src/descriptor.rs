//! Entity descriptors: the immutable templates entities are drawn from.

use hexscape_common::DescriptorId;
use std::collections::HashSet;

use crate::context::{BufferTarget, ComponentType, DrawMode};
use crate::error::DescriptorIssue;

/// Vertex payload for one attribute stream.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexData {
    Byte(Vec<i8>),
    UnsignedByte(Vec<u8>),
    Short(Vec<i16>),
    UnsignedShort(Vec<u16>),
    Float(Vec<f32>),
}

impl VertexData {
    pub fn component_type(&self) -> ComponentType {
        match self {
            VertexData::Byte(_) => ComponentType::Byte,
            VertexData::UnsignedByte(_) => ComponentType::UnsignedByte,
            VertexData::Short(_) => ComponentType::Short,
            VertexData::UnsignedShort(_) => ComponentType::UnsignedShort,
            VertexData::Float(_) => ComponentType::Float,
        }
    }

    /// Number of scalar values, not vertices.
    pub fn len(&self) -> usize {
        match self {
            VertexData::Byte(v) => v.len(),
            VertexData::UnsignedByte(v) => v.len(),
            VertexData::Short(v) => v.len(),
            VertexData::UnsignedShort(v) => v.len(),
            VertexData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VertexData::Byte(v) => bytemuck::cast_slice(v),
            VertexData::UnsignedByte(v) => v.as_slice(),
            VertexData::Short(v) => bytemuck::cast_slice(v),
            VertexData::UnsignedShort(v) => bytemuck::cast_slice(v),
            VertexData::Float(v) => bytemuck::cast_slice(v),
        }
    }
}

impl From<Vec<f32>> for VertexData {
    fn from(v: Vec<f32>) -> Self {
        VertexData::Float(v)
    }
}

impl From<&[f32]> for VertexData {
    fn from(v: &[f32]) -> Self {
        VertexData::Float(v.to_vec())
    }
}

/// One vertex-attribute stream of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDescriptor {
    /// Attribute location, as declared by the vertex shader.
    pub location: u32,
    pub buffer_target: BufferTarget,
    pub component_type: ComponentType,
    /// Components per vertex, 1 to 4.
    pub components: u8,
    /// Uploaded once at build time. `None` means every entity supplies its own.
    pub data: Option<VertexData>,
}

impl InputDescriptor {
    /// A float attribute read from an array buffer.
    pub fn float(location: u32, components: u8) -> Self {
        Self {
            location,
            buffer_target: BufferTarget::Array,
            component_type: ComponentType::Float,
            components,
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<VertexData>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Whole vertices held by the static payload, if there is one.
    pub fn vertices(&self) -> Option<usize> {
        let components = usize::from(self.components.max(1));
        self.data.as_ref().map(|data| data.len() / components)
    }

    fn validate(&self) -> Result<(), DescriptorIssue> {
        if !(1..=4).contains(&self.components) {
            return Err(DescriptorIssue::ComponentCount {
                location: self.location,
                count: self.components,
            });
        }
        if let Some(data) = &self.data {
            if data.component_type() != self.component_type {
                return Err(DescriptorIssue::PayloadType {
                    location: self.location,
                    declared: self.component_type,
                    supplied: data.component_type(),
                });
            }
            if data.len() % self.components as usize != 0 {
                return Err(DescriptorIssue::PayloadLength {
                    location: self.location,
                    len: data.len(),
                    components: self.components,
                });
            }
        }
        Ok(())
    }
}

/// Template for a class of drawable entities: shaders, vertex layout, topology.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub id: DescriptorId,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub inputs: Vec<InputDescriptor>,
    pub draw_mode: DrawMode,
    /// Vertices submitted per draw call.
    pub vertex_count: u32,
}

impl EntityDescriptor {
    pub fn input(&self, location: u32) -> Option<&InputDescriptor> {
        self.inputs.iter().find(|i| i.location == location)
    }

    /// Check the layout can be bound. Shader text is checked by the compiler, not here.
    pub fn validate(&self) -> Result<(), DescriptorIssue> {
        if self.inputs.is_empty() {
            return Err(DescriptorIssue::NoInputs);
        }
        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.location) {
                return Err(DescriptorIssue::DuplicateLocation(input.location));
            }
            input.validate()?;
            if let Some(vertices) = input.vertices() {
                if vertices < self.vertex_count as usize {
                    return Err(DescriptorIssue::VertexCount {
                        location: input.location,
                        vertices,
                        vertex_count: self.vertex_count,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(inputs: Vec<InputDescriptor>) -> EntityDescriptor {
        EntityDescriptor {
            id: "quad".into(),
            vertex_shader: String::new(),
            fragment_shader: String::new(),
            inputs,
            draw_mode: DrawMode::TriangleStrip,
            vertex_count: 4,
        }
    }

    #[test]
    fn float_payload_bytes() {
        let data = VertexData::Float(vec![1.0, -1.0]);
        assert_eq!(data.as_bytes().len(), 8);
        assert_eq!(&data.as_bytes()[0..4], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn valid_descriptor_passes() {
        let d = descriptor(vec![
            InputDescriptor::float(0, 2).with_data(vec![0.0f32; 8]),
            InputDescriptor::float(3, 4),
        ]);
        assert_eq!(d.validate(), Ok(()));
        assert!(d.input(3).is_some());
        assert!(d.input(1).is_none());
    }

    #[test]
    fn rejects_empty_inputs() {
        assert_eq!(descriptor(vec![]).validate(), Err(DescriptorIssue::NoInputs));
    }

    #[test]
    fn rejects_component_counts_outside_range() {
        let d = descriptor(vec![InputDescriptor::float(0, 5)]);
        assert_eq!(
            d.validate(),
            Err(DescriptorIssue::ComponentCount {
                location: 0,
                count: 5
            })
        );
        let d = descriptor(vec![InputDescriptor::float(0, 0)]);
        assert!(d.validate().is_err());
    }

    #[test]
    fn rejects_payload_shorter_than_vertex_count() {
        let mut d = descriptor(vec![InputDescriptor::float(0, 2).with_data(vec![0.0f32; 6])]);
        assert_eq!(
            d.validate(),
            Err(DescriptorIssue::VertexCount {
                location: 0,
                vertices: 3,
                vertex_count: 4
            })
        );
        d.vertex_count = 3;
        assert_eq!(d.validate(), Ok(()));
        assert_eq!(d.inputs[0].vertices(), Some(3));
    }

    #[test]
    fn rejects_repeated_locations() {
        let d = descriptor(vec![InputDescriptor::float(2, 2), InputDescriptor::float(2, 3)]);
        assert_eq!(d.validate(), Err(DescriptorIssue::DuplicateLocation(2)));
    }

    #[test]
    fn rejects_mismatched_payload() {
        let mut input = InputDescriptor::float(0, 2);
        input.data = Some(VertexData::UnsignedByte(vec![0, 1]));
        let d = descriptor(vec![input]);
        assert!(matches!(
            d.validate(),
            Err(DescriptorIssue::PayloadType {
                supplied: ComponentType::UnsignedByte,
                ..
            })
        ));

        let d = descriptor(vec![InputDescriptor::float(0, 2).with_data(vec![0.0f32; 3])]);
        assert!(matches!(
            d.validate(),
            Err(DescriptorIssue::PayloadLength { len: 3, .. })
        ));
    }
}
