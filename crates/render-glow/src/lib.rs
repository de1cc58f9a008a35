//! glow backend: drives `hexscape-render` through OpenGL 3.3+ / GLES 3 / WebGL 2.
//!
//! # Safety
//! A [`GlowContext`] must only be used while its GL context is current on the
//! calling thread. Constructing one is `unsafe` for that reason; every call
//! made afterwards relies on it.

mod context;
#[cfg(target_arch = "wasm32")]
mod web;

pub use context::GlowContext;
#[cfg(target_arch = "wasm32")]
pub use web::{context_from_canvas, context_from_canvas_id, context_from_element};

pub fn crate_info() -> &'static str {
    "hexscape-render-glow v0.1.0"
}
