//! Surface acquisition from a browser canvas.

use hexscape_render::SurfaceError;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlCanvasElement, WebGl2RenderingContext};

use crate::GlowContext;

const WEBGL2: &str = "webgl2";

/// Request a WebGL 2 context from `canvas`.
pub fn context_from_canvas(canvas: &HtmlCanvasElement) -> Result<GlowContext, SurfaceError> {
    let unsupported = || SurfaceError::UnsupportedContext(WEBGL2.to_owned());
    let webgl2 = canvas
        .get_context(WEBGL2)
        .map_err(|_| unsupported())?
        .ok_or_else(unsupported)?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| unsupported())?;

    let gl = glow::Context::from_webgl2_context(webgl2);
    // SAFETY: a WebGL context is always current on the thread that created it.
    Ok(unsafe { GlowContext::new(gl, canvas.width(), canvas.height()) })
}

/// Use `element` as the drawing surface. Anything but a `<canvas>` is rejected.
pub fn context_from_element(element: Element) -> Result<GlowContext, SurfaceError> {
    let tag = element.tag_name().to_lowercase();
    let canvas = element
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| SurfaceError::NotASurface(tag))?;
    context_from_canvas(&canvas)
}

/// Look up the element with `id` in the current document and use it as the surface.
pub fn context_from_canvas_id(id: &str) -> Result<GlowContext, SurfaceError> {
    let element = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
        .ok_or_else(|| {
            tracing::warn!(id, "no element with this id");
            SurfaceError::Missing
        })?;
    context_from_element(element)
}
