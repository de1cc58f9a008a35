use crate::context::{GraphicsContext, ShaderStage};
use crate::error::CompileError;

/// A shader object that compiled successfully. Must be consumed by linking or released.
#[derive(Debug)]
pub struct CompiledShader<C: GraphicsContext> {
    pub(crate) handle: C::Shader,
}

impl<C: GraphicsContext> CompiledShader<C> {
    pub fn release(self, ctx: &mut C) {
        ctx.delete_shader(self.handle);
    }
}

/// Compile one stage. A failed shader object is released before the error returns.
pub fn compile_shader<C: GraphicsContext>(
    ctx: &mut C,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledShader<C>, CompileError> {
    let handle = ctx.create_shader(stage).map_err(|message| CompileError {
        stage,
        log: format!("shader creation failed: {message}"),
    })?;

    ctx.shader_source(&handle, source);
    ctx.compile_shader(&handle);

    if !ctx.shader_compile_status(&handle) {
        let log = ctx.shader_info_log(&handle);
        ctx.delete_shader(handle);
        let log = if log.trim().is_empty() {
            "unspecified error, compile status false".to_owned()
        } else {
            log
        };
        tracing::debug!(%stage, %log, "shader compilation failed");
        return Err(CompileError { stage, log });
    }

    tracing::debug!(%stage, "shader compiled");
    Ok(CompiledShader { handle })
}
