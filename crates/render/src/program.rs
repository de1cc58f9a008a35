use crate::config::UniformNames;
use crate::context::GraphicsContext;
use crate::error::LinkError;
use crate::shader::CompiledShader;

/// A linked program with its per-draw uniforms resolved.
#[derive(Debug)]
pub struct LinkedProgram<C: GraphicsContext> {
    pub(crate) handle: C::Program,
    pub(crate) projection: C::UniformLocation,
    pub(crate) model_view: C::UniformLocation,
}

impl<C: GraphicsContext> LinkedProgram<C> {
    pub fn release(self, ctx: &mut C) {
        ctx.delete_program(self.handle);
    }
}

/// Link a vertex and a fragment stage and resolve the matrix uniforms.
///
/// Both shader objects are consumed: after the link attempt they are detached
/// and released regardless of the outcome. On any failure the program is
/// released as well.
pub fn link_program<C: GraphicsContext>(
    ctx: &mut C,
    vertex: CompiledShader<C>,
    fragment: CompiledShader<C>,
    uniforms: &UniformNames,
) -> Result<LinkedProgram<C>, LinkError> {
    let program = match ctx.create_program() {
        Ok(program) => program,
        Err(message) => {
            vertex.release(ctx);
            fragment.release(ctx);
            return Err(LinkError::Allocation(message));
        }
    };

    ctx.attach_shader(&program, &vertex.handle);
    ctx.attach_shader(&program, &fragment.handle);
    ctx.link_program(&program);
    let linked = ctx.program_link_status(&program);

    for shader in [vertex, fragment] {
        ctx.detach_shader(&program, &shader.handle);
        shader.release(ctx);
    }

    if !linked {
        let log = ctx.program_info_log(&program);
        ctx.delete_program(program);
        return Err(LinkError::Failed(log));
    }

    let Some(projection) = ctx.uniform_location(&program, &uniforms.projection) else {
        ctx.delete_program(program);
        return Err(LinkError::MissingUniform(uniforms.projection.clone()));
    };
    let Some(model_view) = ctx.uniform_location(&program, &uniforms.model_view) else {
        ctx.delete_program(program);
        return Err(LinkError::MissingUniform(uniforms.model_view.clone()));
    };

    Ok(LinkedProgram {
        handle: program,
        projection,
        model_view,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ShaderStage;
    use crate::recording::RecordingContext;
    use crate::shader::compile_shader;

    const VS: &str = "uniform mat4 uModelViewMatrix; uniform mat4 uProjectionMatrix;";
    const FS: &str = "void main() {}";

    fn stages(
        ctx: &mut RecordingContext,
        vs: &str,
    ) -> (CompiledShader<RecordingContext>, CompiledShader<RecordingContext>) {
        let v = compile_shader(ctx, ShaderStage::Vertex, vs).unwrap();
        let f = compile_shader(ctx, ShaderStage::Fragment, FS).unwrap();
        (v, f)
    }

    #[test]
    fn links_and_releases_stages() {
        let mut ctx = RecordingContext::default();
        let journal = ctx.journal();
        let (v, f) = stages(&mut ctx, VS);
        let program = link_program(&mut ctx, v, f, &UniformNames::default()).unwrap();
        assert_eq!(program.projection.name, "uProjectionMatrix");
        assert_eq!(program.model_view.name, "uModelViewMatrix");
        assert_eq!(journal.live_shaders(), 0);
        assert_eq!(journal.live_programs(), 1);
        program.release(&mut ctx);
        assert!(journal.is_released());
    }

    #[test]
    fn link_failure_returns_log() {
        let mut ctx = RecordingContext::default().fail_link_on("varying", "varyings do not match");
        let journal = ctx.journal();
        let (v, f) = stages(&mut ctx, "varying vec2 v; uniform mat4 uModelViewMatrix;");
        let err = link_program(&mut ctx, v, f, &UniformNames::default()).unwrap_err();
        assert_eq!(err, LinkError::Failed("varyings do not match".into()));
        assert!(journal.is_released());
    }

    #[test]
    fn each_missing_uniform_is_named() {
        let mut ctx = RecordingContext::default();
        let (v, f) = stages(&mut ctx, "uniform mat4 uModelViewMatrix;");
        let err = link_program(&mut ctx, v, f, &UniformNames::default()).unwrap_err();
        assert_eq!(err, LinkError::MissingUniform("uProjectionMatrix".into()));

        let (v, f) = stages(&mut ctx, "uniform mat4 uProjectionMatrix;");
        let err = link_program(&mut ctx, v, f, &UniformNames::default()).unwrap_err();
        assert_eq!(err, LinkError::MissingUniform("uModelViewMatrix".into()));
        assert_eq!(ctx.journal().live_programs(), 0);
    }

    #[test]
    fn custom_uniform_names() {
        let mut ctx = RecordingContext::default();
        let (v, f) = stages(&mut ctx, "uniform mat4 projectionMatrix; uniform mat4 modelViewMatrix;");
        let names = UniformNames {
            projection: "projectionMatrix".into(),
            model_view: "modelViewMatrix".into(),
        };
        assert!(link_program(&mut ctx, v, f, &names).is_ok());
    }
}
