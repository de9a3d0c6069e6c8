//! GLSL programs.

use crate::context::Context;
use crate::driver::Name;
use crate::error::Result;
use crate::gl;
use crate::resource::{Bind, Family, Object};
use crate::shader::Shader;
use std::collections::HashMap;
use std::{ffi, fmt};

/// An active uniform variable of a linked program.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Uniform {
    /// The name reported by the driver, e.g. `lights[0]` for arrays.
    pub name: String,

    /// The active uniform index.
    pub index: u32,

    /// The location, or `None` for uniforms inside a uniform block.
    pub location: Option<i32>,

    /// The number of array elements, or 1 for non-arrays.
    pub size: i32,

    /// The GLSL data type enumerant.
    pub ty: u32,
}

/// Active uniforms memoized after a successful link.
#[derive(Clone, Debug, Default)]
struct Uniforms {
    list: Vec<Uniform>,

    /// Maps names, and array base names, to indices into `list`.
    lookup: HashMap<String, usize>,
}

impl Uniforms {
    fn clear(&mut self) {
        self.list.clear();
        self.lookup.clear();
    }

    fn insert(&mut self, uniform: Uniform) {
        let position = self.list.len();
        if let Some(base) = uniform.name.strip_suffix("[0]") {
            self.lookup.insert(base.to_string(), position);
        }
        self.lookup.insert(uniform.name.clone(), position);
        self.list.push(uniform);
    }

    fn get(&self, name: &str) -> Option<&Uniform> {
        self.lookup.get(name).map(|&position| &self.list[position])
    }
}

/// A shader program.
///
/// When the uniform cache is enabled, every link attempt clears the cache and
/// a successful link repopulates it with one driver enumeration.
pub struct Program {
    object: Object,
    uniforms: Option<Uniforms>,
}

impl Program {
    /// Creates an empty program. Uses the context's uniform cache setting.
    pub fn new(ctx: &Context) -> Result<Self> {
        Self::with_uniform_cache(ctx, ctx.config().cache_uniforms)
    }

    /// Creates an empty program with the uniform cache explicitly enabled or
    /// disabled.
    pub fn with_uniform_cache(ctx: &Context, cache: bool) -> Result<Self> {
        let object = Object::create(ctx, Family::Program)?;
        let uniforms = if cache { Some(Uniforms::default()) } else { None };
        Ok(Self { object, uniforms })
    }

    /// Returns the name of the program currently in use, or 0.
    pub fn bound(ctx: &Context) -> Result<Name> {
        ctx.bound(gl::CURRENT_PROGRAM)
    }

    /// Installs this program as part of the current rendering state.
    pub fn use_program(&self) -> Result<()> {
        self.bind()
    }

    /// Uninstalls whichever program is current.
    pub fn unuse(&self) -> Result<()> {
        self.unbind()
    }

    /// Attaches a shader object.
    pub fn attach(&mut self, shader: &Shader) -> Result<()> {
        self.context().driver().attach_shader(self.name(), shader.name());
        self.context().check("glAttachShader")
    }

    /// Detaches a shader object.
    pub fn detach(&mut self, shader: &Shader) -> Result<()> {
        self.context().driver().detach_shader(self.name(), shader.name());
        self.context().check("glDetachShader")
    }

    /// Links and validates the program, returning whether linking succeeded.
    pub fn link(&mut self) -> Result<bool> {
        if let Some(uniforms) = self.uniforms.as_mut() {
            uniforms.clear();
        }

        self.context().driver().link_program(self.name());
        self.context().check("glLinkProgram")?;
        self.context().driver().validate_program(self.name());
        self.context().check("glValidateProgram")?;

        if !self.link_status()? {
            warn!(target: "glbind", "program {} failed to link", self.name());
            return Ok(false);
        }
        if self.uniforms.is_some() {
            let collected = self.collect_uniforms()?;
            self.uniforms = Some(collected);
        }
        Ok(true)
    }

    fn collect_uniforms(&self) -> Result<Uniforms> {
        let mut uniforms = Uniforms::default();
        let count = self.parameter(gl::ACTIVE_UNIFORMS)?;
        for index in 0..count.max(0) as u32 {
            let active = self.context().driver().get_active_uniform(self.name(), index);
            self.context().check("glGetActiveUniform")?;
            let location = self.query_location(&active.name)?;
            uniforms.insert(Uniform {
                name: active.name,
                index,
                location,
                size: active.size,
                ty: active.ty,
            });
        }
        debug!(
            target: "glbind",
            "program {} has {} active uniforms",
            self.name(),
            uniforms.list.len(),
        );
        Ok(uniforms)
    }

    /// Returns whether the last link succeeded.
    pub fn link_status(&self) -> Result<bool> {
        self.parameter(gl::LINK_STATUS).map(|status| status == gl::TRUE as i32)
    }

    /// Returns whether the last validation succeeded.
    pub fn validate_status(&self) -> Result<bool> {
        self.parameter(gl::VALIDATE_STATUS).map(|status| status == gl::TRUE as i32)
    }

    /// Returns the driver's diagnostic log for the last link or validation.
    pub fn info_log(&self) -> Result<String> {
        let log = self.context().driver().get_program_info_log(self.name());
        self.context().check("glGetProgramInfoLog")?;
        Ok(log)
    }

    /// Returns whether this program memoizes its uniforms.
    pub fn caches_uniforms(&self) -> bool {
        self.uniforms.is_some()
    }

    /// Returns the memoized active uniforms, or `None` without a cache.
    pub fn uniforms(&self) -> Option<&[Uniform]> {
        self.uniforms.as_ref().map(|uniforms| &uniforms.list[..])
    }

    /// Returns the number of active uniforms.
    pub fn uniform_count(&self) -> Result<usize> {
        match self.uniforms {
            Some(ref uniforms) => Ok(uniforms.list.len()),
            None => self.parameter(gl::ACTIVE_UNIFORMS).map(|count| count.max(0) as usize),
        }
    }

    /// Returns the location of a uniform variable, or `None` if the program
    /// has no such active uniform.
    ///
    /// Element names such as `lights[2]` that the cache does not hold are
    /// resolved by the driver.
    pub fn uniform_location(&self, name: &str) -> Result<Option<i32>> {
        match self.uniforms {
            Some(ref uniforms) => match uniforms.get(name) {
                Some(uniform) => Ok(uniform.location),
                None if name.ends_with(']') => self.query_location(name),
                None => Ok(None),
            },
            None => self.query_location(name),
        }
    }

    fn query_location(&self, name: &str) -> Result<Option<i32>> {
        let cname = ffi::CString::new(name)?;
        let location = self.context().driver().get_uniform_location(self.name(), &cname);
        self.context().check("glGetUniformLocation")?;
        Ok(if location < 0 { None } else { Some(location) })
    }

    fn parameter(&self, pname: u32) -> Result<i32> {
        let value = self.context().driver().get_program(self.name(), pname);
        self.context().check("glGetProgramiv")?;
        Ok(value)
    }
}

impl Bind for Program {
    const BINDING: u32 = gl::CURRENT_PROGRAM;

    fn name(&self) -> Name {
        self.object.name()
    }

    fn context(&self) -> &Context {
        self.object.context()
    }

    fn bind(&self) -> Result<()> {
        self.context().driver().use_program(self.name());
        self.context().check("glUseProgram")
    }

    fn unbind(&self) -> Result<()> {
        self.context().driver().use_program(0);
        self.context().check("glUseProgram")
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Program(Name);

        Program(self.object.name()).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(name: &str, location: i32) -> Uniform {
        Uniform {
            name: name.to_string(),
            index: location as u32,
            location: Some(location),
            size: 1,
            ty: gl::FLOAT,
        }
    }

    #[test]
    fn array_uniforms_resolve_by_base_name() {
        let mut uniforms = Uniforms::default();
        uniforms.insert(uniform("model", 0));
        uniforms.insert(uniform("lights[0]", 1));
        assert_eq!(uniforms.get("lights").map(|u| u.location), Some(Some(1)));
        assert_eq!(uniforms.get("lights[0]").map(|u| u.index), Some(1));
        assert!(uniforms.get("light").is_none());
        assert_eq!(uniforms.list.len(), 2);
    }

    #[test]
    fn clearing_forgets_everything() {
        let mut uniforms = Uniforms::default();
        uniforms.insert(uniform("color", 0));
        uniforms.clear();
        assert!(uniforms.get("color").is_none());
        assert!(uniforms.list.is_empty());
    }
}
