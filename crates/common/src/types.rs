use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity descriptor. Entities refer to their descriptor by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorId(String);

impl DescriptorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DescriptorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DescriptorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DescriptorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Where an entity sits relative to the camera.
///
/// Most entities only carry a position; the model-view matrix is then a pure
/// translation. Callers that already composed a matrix can hand it over as is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    Position(Vec3),
    Transform(Transform),
    ModelView(Mat4),
}

impl Placement {
    pub fn model_view(&self) -> Mat4 {
        match self {
            Placement::Position(p) => Mat4::from_translation(*p),
            Placement::Transform(t) => t.to_matrix(),
            Placement::ModelView(m) => *m,
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Position(Vec3::ZERO)
    }
}

impl From<Vec3> for Placement {
    fn from(position: Vec3) -> Self {
        Placement::Position(position)
    }
}

impl From<Transform> for Placement {
    fn from(transform: Transform) -> Self {
        Placement::Transform(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_id_display_and_eq() {
        let a = DescriptorId::from("hexTile");
        let b = DescriptorId::new(String::from("hexTile"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "hexTile");
        assert_eq!(a.as_str(), "hexTile");
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn position_placement_is_pure_translation() {
        let m = Placement::Position(Vec3::new(1.0, -2.0, -50.0)).model_view();
        assert_eq!(m, Mat4::from_translation(Vec3::new(1.0, -2.0, -50.0)));
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, -2.0, -50.0));
        assert_eq!(m.x_axis.truncate(), Vec3::X);
    }

    #[test]
    fn transform_placement_applies_scale() {
        let t = Transform {
            scale: Vec3::splat(2.0),
            ..Transform::from_position(Vec3::new(0.0, 0.0, -6.0))
        };
        let m = Placement::from(t).model_view();
        assert_eq!(m.transform_point3(Vec3::X), Vec3::new(2.0, 0.0, -6.0));
    }

    #[test]
    fn model_view_placement_passes_through() {
        let raw = Mat4::from_rotation_z(0.5);
        assert_eq!(Placement::ModelView(raw).model_view(), raw);
    }
}
