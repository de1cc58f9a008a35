//! The hex-tile demo: one descriptor, a grid of tiles, and the config it is driven by.

use anyhow::Context;
use hexscape_common::{HexLayout, hex_fan_vertices};
use hexscape_render::recording::RecordingContext;
use hexscape_render::{
    DrawMode, Entity, EntityDescriptor, FrameStats, InputDescriptor, Renderer, RendererConfig,
    Scene, SceneParams,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const HEX_TILE: &str = "hexTile";

const HEX_VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec4 aVertexPosition;

uniform mat4 uModelViewMatrix;
uniform mat4 uProjectionMatrix;

void main() {
    gl_Position = uProjectionMatrix * uModelViewMatrix * aVertexPosition;
}
"#;

const HEX_FRAGMENT_SHADER: &str = r#"#version 300 es
precision highp float;

out vec4 fragColor;

void main() {
    fragColor = vec4(0.85, 0.85, 0.8, 1.0);
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub rows: u32,
    pub cols: u32,
    pub layout: HexLayout,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            layout: HexLayout::default(),
        }
    }
}

/// Everything the `frame` command needs. Every section is optional in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub surface: SurfaceConfig,
    pub renderer: RendererConfig,
    pub scene: SceneParams,
    pub grid: GridConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceConfig::default(),
            renderer: RendererConfig::default(),
            scene: SceneParams {
                field_of_view: Some(45f32.to_radians()),
                aspect_ratio: Some(1.0),
                near: Some(0.1),
                far: Some(100.0),
            },
            grid: GridConfig::default(),
        }
    }
}

impl DemoConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

pub fn hex_tile_descriptor(size: f32) -> EntityDescriptor {
    EntityDescriptor {
        id: HEX_TILE.into(),
        vertex_shader: HEX_VERTEX_SHADER.into(),
        fragment_shader: HEX_FRAGMENT_SHADER.into(),
        inputs: vec![InputDescriptor::float(0, 2).with_data(hex_fan_vertices(size))],
        draw_mode: DrawMode::TriangleFan,
        vertex_count: 8,
    }
}

pub fn build_renderer(config: &DemoConfig) -> anyhow::Result<Renderer<RecordingContext>> {
    let ctx = RecordingContext::new(config.surface.width, config.surface.height);
    Renderer::builder()
        .with_surface(ctx)
        .with_config(config.renderer.clone())
        .register_entity(hex_tile_descriptor(config.grid.layout.size))
        .build()
        .context("building hex renderer")
}

pub fn build_scene(config: &DemoConfig) -> anyhow::Result<Scene> {
    let mut scene = Scene::new(config.scene).context("building scene")?;
    let grid = &config.grid;
    for position in grid.layout.grid(grid.rows, grid.cols) {
        scene.add_entity(Entity::new(HEX_TILE, position));
    }
    Ok(scene)
}

/// Draw `frames` frames of the grid and return the stats of each.
pub fn run_frames(config: &DemoConfig, frames: u32) -> anyhow::Result<Vec<FrameStats>> {
    let mut renderer = build_renderer(config)?;
    let scene = build_scene(config)?;
    tracing::info!(tiles = scene.len(), frames, "drawing hex grid");

    let mut stats = Vec::with_capacity(frames as usize);
    for frame in 0..frames {
        let frame_stats = renderer
            .draw_scene(&scene)
            .with_context(|| format!("drawing frame {frame}"))?;
        renderer.context().journal().clear_calls();
        stats.push(frame_stats);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_draws_one_call_per_tile() {
        let stats = run_frames(&DemoConfig::default(), 2).unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats.iter().all(|s| s.draw_calls == 100));
    }

    #[test]
    fn partial_yaml_overrides_only_given_fields() {
        let config: DemoConfig =
            serde_yaml::from_str("grid:\n  rows: 2\n  cols: 3\nsurface:\n  width: 800\n").unwrap();
        assert_eq!(config.grid.rows, 2);
        assert_eq!(config.grid.layout, HexLayout::default());
        assert_eq!(config.surface.height, 720);
        assert_eq!(config.scene, DemoConfig::default().scene);
        assert_eq!(run_frames(&config, 1).unwrap()[0].draw_calls, 6);
    }

    #[test]
    fn invalid_scene_is_reported() {
        let mut config = DemoConfig::default();
        config.scene.far = Some(0.05);
        let err = run_frames(&config, 1).unwrap_err();
        assert!(format!("{err:#}").contains("far"));
    }

    #[test]
    fn descriptor_uses_the_fan_outline() {
        let d = hex_tile_descriptor(1.0);
        assert_eq!(d.draw_mode, DrawMode::TriangleFan);
        assert_eq!(d.inputs[0].data.as_ref().map(|v| v.len()), Some(16));
        assert!(d.validate().is_ok());
    }
}
