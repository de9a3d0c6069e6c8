//! GLSL shader objects.

use crate::context::Context;
use crate::driver::Name;
use crate::error::Result;
use crate::gl;
use crate::resource::{Family, Object};
use std::{ffi, fmt, fs, path};

/// The pipeline stage a shader is compiled for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Corresponds to `GL_VERTEX_SHADER`.
    Vertex,

    /// Corresponds to `GL_TESS_CONTROL_SHADER`.
    TessControl,

    /// Corresponds to `GL_TESS_EVALUATION_SHADER`.
    TessEvaluation,

    /// Corresponds to `GL_GEOMETRY_SHADER`.
    Geometry,

    /// Corresponds to `GL_FRAGMENT_SHADER`.
    Fragment,

    /// Corresponds to `GL_COMPUTE_SHADER`.
    Compute,
}

impl Kind {
    /// Returns the equivalent OpenGL shader type enumeration constant.
    pub fn as_gl_enum(self) -> u32 {
        match self {
            Kind::Vertex => gl::VERTEX_SHADER,
            Kind::TessControl => gl::TESS_CONTROL_SHADER,
            Kind::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            Kind::Geometry => gl::GEOMETRY_SHADER,
            Kind::Fragment => gl::FRAGMENT_SHADER,
            Kind::Compute => gl::COMPUTE_SHADER,
        }
    }
}

/// A single shader object.
pub struct Shader {
    object: Object,
    kind: Kind,
}

impl Shader {
    /// Creates an empty shader object for the given stage.
    pub fn new(ctx: &Context, kind: Kind) -> Result<Self> {
        let object = Object::create(ctx, Family::Shader(kind.as_gl_enum()))?;
        Ok(Self { object, kind })
    }

    /// Creates a shader object and sets its source. Does not compile.
    pub fn from_source(ctx: &Context, kind: Kind, source: &str) -> Result<Self> {
        let mut shader = Self::new(ctx, kind)?;
        shader.source(source)?;
        Ok(shader)
    }

    /// Creates a shader object with source read from a file. Does not compile.
    pub fn from_source_file<P: AsRef<path::Path>>(ctx: &Context, kind: Kind, path: P) -> Result<Self> {
        let mut shader = Self::new(ctx, kind)?;
        shader.source_file(path)?;
        Ok(shader)
    }

    /// Returns the driver name of this shader.
    pub fn name(&self) -> Name {
        self.object.name()
    }

    /// Returns the pipeline stage of this shader.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Replaces the shader source.
    pub fn source(&mut self, source: &str) -> Result<()> {
        let source = ffi::CString::new(source)?;
        self.ctx().driver().shader_source(self.name(), &source);
        self.ctx().check("glShaderSource")
    }

    /// Replaces the shader source with the contents of a file.
    pub fn source_file<P: AsRef<path::Path>>(&mut self, path: P) -> Result<()> {
        let source = fs::read_to_string(path)?;
        self.source(&source)
    }

    /// Compiles the current source, returning whether compilation succeeded.
    ///
    /// Diagnostics are available from [`info_log`] either way.
    ///
    /// [`info_log`]: #method.info_log
    pub fn compile(&mut self) -> Result<bool> {
        self.ctx().driver().compile_shader(self.name());
        self.ctx().check("glCompileShader")?;
        let status = self.compile_status()?;
        if !status {
            warn!(target: "glbind", "shader {} failed to compile", self.name());
        }
        Ok(status)
    }

    /// Returns whether the last compilation succeeded.
    pub fn compile_status(&self) -> Result<bool> {
        let status = self.ctx().driver().get_shader(self.name(), gl::COMPILE_STATUS);
        self.ctx().check("glGetShaderiv")?;
        Ok(status == gl::TRUE as i32)
    }

    /// Returns the driver's diagnostic log for the last compilation.
    pub fn info_log(&self) -> Result<String> {
        let log = self.ctx().driver().get_shader_info_log(self.name());
        self.ctx().check("glGetShaderInfoLog")?;
        Ok(log)
    }

    fn ctx(&self) -> &Context {
        self.object.context()
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Shader {
            name: Name,
            kind: Kind,
        }

        Shader {
            name: self.object.name(),
            kind: self.kind,
        }.fmt(f)
    }
}
