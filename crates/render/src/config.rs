use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::context::DepthFunc;

/// Names the matrix uniforms are looked up by in every linked program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformNames {
    pub projection: String,
    pub model_view: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            projection: "uProjectionMatrix".into(),
            model_view: "uModelViewMatrix".into(),
        }
    }
}

/// Projection used when a frame is drawn without a scene. Aspect follows the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveConfig {
    /// Projection for a surface of the given pixel size. A zero height is treated as one pixel.
    pub fn matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}

/// Renderer-wide settings applied once at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub clear_color: [f32; 4],
    /// `None` leaves depth testing disabled.
    pub depth_test: Option<DepthFunc>,
    pub perspective: PerspectiveConfig,
    pub uniforms: UniformNames,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: Some(DepthFunc::LessOrEqual),
            perspective: PerspectiveConfig::default(),
            uniforms: UniformNames::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_setup() {
        let cfg = RendererConfig::default();
        assert_eq!(cfg.perspective.fov_degrees, 45.0);
        assert_eq!(cfg.perspective.near, 0.1);
        assert_eq!(cfg.perspective.far, 100.0);
        assert_eq!(cfg.depth_test, Some(DepthFunc::LessOrEqual));
        assert_eq!(cfg.uniforms.projection, "uProjectionMatrix");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: RendererConfig = serde_yaml::from_str(
            "clear_color: [0.1, 0.1, 0.15, 1.0]\nperspective:\n  fov_degrees: 60.0\n",
        )
        .unwrap();
        assert_eq!(cfg.clear_color, [0.1, 0.1, 0.15, 1.0]);
        assert_eq!(cfg.perspective.fov_degrees, 60.0);
        assert_eq!(cfg.perspective.far, 100.0);
        assert_eq!(cfg.uniforms, UniformNames::default());
    }

    #[test]
    fn perspective_guards_zero_height() {
        let m = PerspectiveConfig::default().matrix(800, 0);
        assert!(m.is_finite());
        let square = PerspectiveConfig::default().matrix(100, 100);
        assert_eq!(square, Mat4::perspective_rh_gl(45f32.to_radians(), 1.0, 0.1, 100.0));
    }
}
