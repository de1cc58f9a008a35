//! Scene: one shared projection plus the entities to draw this frame, grouped by descriptor.

use glam::Mat4;
use hexscape_common::DescriptorId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::entity::Entity;
use crate::error::SceneError;

/// The numeric inputs a scene projection is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneParameter {
    FieldOfView,
    AspectRatio,
    Near,
    Far,
}

impl fmt::Display for SceneParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SceneParameter::FieldOfView => "field of view",
            SceneParameter::AspectRatio => "aspect ratio",
            SceneParameter::Near => "near plane",
            SceneParameter::Far => "far plane",
        };
        f.write_str(name)
    }
}

/// Projection parameters. Every field is required; `0` counts as unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    /// Vertical field of view in radians.
    pub field_of_view: Option<f32>,
    pub aspect_ratio: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
}

impl SceneParams {
    fn require(value: Option<f32>, parameter: SceneParameter) -> Result<f32, SceneError> {
        match value {
            None => Err(SceneError::MissingParameter(parameter)),
            Some(v) if v == 0.0 => Err(SceneError::MissingParameter(parameter)),
            Some(v) if !v.is_finite() || v < 0.0 => {
                Err(SceneError::InvalidParameter { parameter, value: v })
            }
            Some(v) => Ok(v),
        }
    }

    /// Validate and build the projection matrix.
    pub fn projection(&self) -> Result<Mat4, SceneError> {
        let fov = Self::require(self.field_of_view, SceneParameter::FieldOfView)?;
        let near = Self::require(self.near, SceneParameter::Near)?;
        let far = Self::require(self.far, SceneParameter::Far)?;
        let aspect = Self::require(self.aspect_ratio, SceneParameter::AspectRatio)?;
        if far <= near {
            return Err(SceneError::DepthRange { near, far });
        }
        Ok(Mat4::perspective_rh_gl(fov, aspect, near, far))
    }
}

/// Entities to draw, grouped by descriptor in first-seen order, under one projection.
#[derive(Debug, Clone)]
pub struct Scene {
    projection: Mat4,
    groups: Vec<(DescriptorId, Vec<Entity>)>,
    index: HashMap<DescriptorId, usize>,
}

impl Scene {
    pub fn new(params: SceneParams) -> Result<Self, SceneError> {
        let projection = params.projection()?;
        Ok(Self {
            projection,
            groups: Vec::new(),
            index: HashMap::new(),
        })
    }

    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn add_entity(&mut self, entity: Entity) {
        match self.index.get(entity.descriptor()) {
            Some(&i) => self.groups[i].1.push(entity),
            None => {
                let id = entity.descriptor().clone();
                self.index.insert(id.clone(), self.groups.len());
                self.groups.push((id, vec![entity]));
            }
        }
    }

    /// `(descriptor id, entities)` pairs in the order descriptors were first added.
    pub fn entities(&self) -> impl Iterator<Item = (&DescriptorId, &[Entity])> {
        self.groups.iter().map(|(id, list)| (id, list.as_slice()))
    }

    pub fn entities_of(&self, id: &DescriptorId) -> &[Entity] {
        self.index
            .get(id)
            .map(|&i| self.groups[i].1.as_slice())
            .unwrap_or(&[])
    }

    /// Returned by value; changing the copy leaves the scene untouched.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Total number of entities across all descriptors.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entities, keep the projection. Typically called between frames.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.index.clear();
    }
}

/// Chained setters over [`SceneParams`].
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    params: SceneParams,
}

impl SceneBuilder {
    pub fn with_field_of_view(mut self, radians: f32) -> Self {
        self.params.field_of_view = Some(radians);
        self
    }

    pub fn with_aspect_ratio(mut self, aspect: f32) -> Self {
        self.params.aspect_ratio = Some(aspect);
        self
    }

    pub fn with_near(mut self, near: f32) -> Self {
        self.params.near = Some(near);
        self
    }

    pub fn with_far(mut self, far: f32) -> Self {
        self.params.far = Some(far);
        self
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        Scene::new(self.params)
    }
}
