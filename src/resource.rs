//! Owned driver names and the binding model shared by every handle.

use crate::context::Context;
use crate::driver::{Driver, Name};
use crate::error::{Error, ErrorCode, Result};
use std::{fmt, ops};

/// The class of driver object a name belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Family {
    /// Created by `glGenBuffers`.
    Buffer,

    /// Created by `glGenVertexArrays`.
    VertexArray,

    /// Created by `glGenTextures`.
    Texture,

    /// Created by `glCreateShader`.
    Shader(u32),

    /// Created by `glCreateProgram`.
    Program,
}

impl Family {
    fn label(self) -> &'static str {
        match self {
            Family::Buffer => "buffer",
            Family::VertexArray => "vertex array",
            Family::Texture => "texture",
            Family::Shader(_) => "shader",
            Family::Program => "program",
        }
    }

    fn create_call(self) -> &'static str {
        match self {
            Family::Buffer => "glGenBuffers",
            Family::VertexArray => "glGenVertexArrays",
            Family::Texture => "glGenTextures",
            Family::Shader(_) => "glCreateShader",
            Family::Program => "glCreateProgram",
        }
    }
}

/// Exclusive owner of one driver name.
///
/// The name is released exactly once, when the owner is dropped.
pub(crate) struct Object {
    name: Name,
    family: Family,
    ctx: Context,
}

impl Object {
    /// Asks the driver for a new name.
    ///
    /// A name the driver hands out alongside an error is deleted again, so a
    /// failed creation leaves nothing behind.
    pub(crate) fn create(ctx: &Context, family: Family) -> Result<Self> {
        let driver = ctx.driver();
        let name = match family {
            Family::Buffer => driver.gen_buffer(),
            Family::VertexArray => driver.gen_vertex_array(),
            Family::Texture => driver.gen_texture(),
            Family::Shader(ty) => driver.create_shader(ty),
            Family::Program => driver.create_program(),
        };
        let allocation = Error::Allocation { kind: family.label() };
        match ctx.check(family.create_call()) {
            Err(err) => {
                if name != 0 {
                    // Nothing has seen the name yet, so nothing can have mapped it.
                    let call = unsafe { release(driver, family, name) };
                    if let Err(cleanup) = ctx.check(call) {
                        warn!(target: "glbind", "{}", cleanup);
                    }
                }
                return Err(match err {
                    Error::Driver { code: ErrorCode::OutOfMemory, .. } => allocation,
                    err => err,
                });
            }
            Ok(()) if name == 0 => return Err(allocation),
            Ok(()) => {}
        }
        debug!(target: "glbind", "created {} {}", family.label(), name);
        Ok(Self { name, family, ctx: ctx.clone() })
    }

    pub(crate) fn name(&self) -> Name {
        self.name
    }

    pub(crate) fn context(&self) -> &Context {
        &self.ctx
    }
}

impl ops::Drop for Object {
    fn drop(&mut self) {
        // Mappings borrow their buffer, so none outlives the owner.
        let call = unsafe { release(self.ctx.driver(), self.family, self.name) };
        debug!(target: "glbind", "deleted {} {}", self.family.label(), self.name);
        if let Err(err) = self.ctx.check(call) {
            error!(target: "glbind", "{}", err);
        }
    }
}

/// Deletes `name` through its family's entry point and returns the call name.
///
/// Buffers are released through the `unsafe` store contract of `Driver`: no
/// mapping of the buffer may be used afterwards.
unsafe fn release(driver: &dyn Driver, family: Family, name: Name) -> &'static str {
    match family {
        Family::Buffer => {
            driver.delete_buffer(name);
            "glDeleteBuffers"
        }
        Family::VertexArray => {
            driver.delete_vertex_array(name);
            "glDeleteVertexArrays"
        }
        Family::Texture => {
            driver.delete_texture(name);
            "glDeleteTextures"
        }
        Family::Shader(_) => {
            driver.delete_shader(name);
            "glDeleteShader"
        }
        Family::Program => {
            driver.delete_program(name);
            "glDeleteProgram"
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Object")
            .field("name", &self.name)
            .field("family", &self.family)
            .finish()
    }
}

/// A handle that occupies a single driver binding slot.
///
/// Implementors provide the unconditional bind and unbind commands; the
/// occupancy queries are always answered by the driver, never from a cache,
/// because any other code may rebind the slot between two calls.
pub trait Bind {
    /// The `glGet` key that reports the slot's current occupant.
    const BINDING: u32;

    /// Returns the driver name of this handle.
    fn name(&self) -> Name;

    /// Returns the context this handle was created in.
    fn context(&self) -> &Context;

    /// Makes this handle the occupant of its slot.
    fn bind(&self) -> Result<()>;

    /// Empties the slot.
    fn unbind(&self) -> Result<()>;

    /// Returns `true` if this handle currently occupies its slot.
    fn is_bound(&self) -> Result<bool> {
        Ok(self.context().bound(Self::BINDING)? == self.name())
    }

    /// Binds this handle unless the driver reports it already bound.
    ///
    /// Afterwards the handle occupies its slot regardless of the prior state.
    fn bind_if_unbound(&self) -> Result<()> {
        if !self.is_bound()? {
            self.bind()?;
        }
        Ok(())
    }
}
