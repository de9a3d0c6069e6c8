//! Vertex array objects.

use crate::buffer::{ArrayBuffer, ElementArrayBuffer, Format};
use crate::context::Context;
use crate::driver::Name;
use crate::error::Result;
use crate::gl;
use crate::resource::{Bind, Family, Object};
use std::fmt;

/// Layout of one vertex attribute within an array buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Attribute {
    /// The attribute data format.
    pub format: Format,

    /// The number of bytes into the buffer of the first item.
    pub offset: usize,

    /// The number of bytes between consecutive items, or 0 for tightly packed.
    pub stride: usize,
}

impl Attribute {
    /// A tightly packed attribute starting at the beginning of the buffer.
    pub fn packed(format: Format) -> Self {
        Self { format, offset: 0, stride: 0 }
    }
}

/// Corresponds to an OpenGL vertex array object.
pub struct VertexArray {
    object: Object,
}

impl VertexArray {
    /// Allocates a new vertex array name.
    pub fn new(ctx: &Context) -> Result<Self> {
        let object = Object::create(ctx, Family::VertexArray)?;
        Ok(Self { object })
    }

    /// Returns the name of the vertex array currently bound, or 0.
    pub fn bound(ctx: &Context) -> Result<Name> {
        ctx.bound(gl::VERTEX_ARRAY_BINDING)
    }

    /// Enables the attribute at `index`.
    pub fn enable_attribute(&mut self, index: u32) -> Result<()> {
        self.bind_if_unbound()?;
        self.context().driver().enable_vertex_attrib_array(index);
        self.context().check("glEnableVertexAttribArray")
    }

    /// Disables the attribute at `index`.
    pub fn disable_attribute(&mut self, index: u32) -> Result<()> {
        self.bind_if_unbound()?;
        self.context().driver().disable_vertex_attrib_array(index);
        self.context().check("glDisableVertexAttribArray")
    }

    /// Sources the attribute at `index` from `buffer` with the given layout.
    ///
    /// Binds `buffer` to `GL_ARRAY_BUFFER` if it is not bound already.
    pub fn set_attribute(
        &mut self,
        index: u32,
        buffer: &ArrayBuffer,
        attribute: Attribute,
    ) -> Result<()> {
        self.bind_if_unbound()?;
        buffer.bind_if_unbound()?;
        let format = attribute.format;
        self.context().driver().vertex_attrib_pointer(
            index,
            format.count as i32,
            format.component.as_gl_enum(),
            format.normalized,
            attribute.stride as i32,
            attribute.offset,
        );
        self.context().check("glVertexAttribPointer")
    }

    /// Records `buffer` as this vertex array's index buffer.
    pub fn set_element_buffer(&mut self, buffer: &ElementArrayBuffer) -> Result<()> {
        self.bind_if_unbound()?;
        buffer.bind_if_unbound()
    }

    /// Returns the name of the index buffer recorded in this vertex array.
    pub fn element_buffer(&self) -> Result<Name> {
        self.bind_if_unbound()?;
        self.context().bound(gl::ELEMENT_ARRAY_BUFFER_BINDING)
    }

    /// Returns the name of the buffer the attribute at `index` is sourced from.
    pub fn attribute_buffer(&self, index: u32) -> Result<Name> {
        self.attribute_parameter(index, gl::VERTEX_ATTRIB_ARRAY_BUFFER_BINDING)
            .map(|name| name as Name)
    }

    /// Returns `true` if the attribute at `index` is enabled.
    pub fn is_attribute_enabled(&self, index: u32) -> Result<bool> {
        self.attribute_parameter(index, gl::VERTEX_ATTRIB_ARRAY_ENABLED)
            .map(|enabled| enabled != 0)
    }

    fn attribute_parameter(&self, index: u32, pname: u32) -> Result<i32> {
        self.bind_if_unbound()?;
        let value = self.context().driver().get_vertex_attrib(index, pname);
        self.context().check("glGetVertexAttribiv")?;
        Ok(value)
    }
}

impl Bind for VertexArray {
    const BINDING: u32 = gl::VERTEX_ARRAY_BINDING;

    fn name(&self) -> Name {
        self.object.name()
    }

    fn context(&self) -> &Context {
        self.object.context()
    }

    fn bind(&self) -> Result<()> {
        self.context().driver().bind_vertex_array(self.name());
        self.context().check("glBindVertexArray")
    }

    fn unbind(&self) -> Result<()> {
        self.context().driver().bind_vertex_array(0);
        self.context().check("glBindVertexArray")
    }
}

impl fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct VertexArray(Name);

        VertexArray(self.object.name()).fmt(f)
    }
}
