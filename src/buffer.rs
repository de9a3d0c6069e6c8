//! GPU buffer management.

use crate::context::Context;
use crate::driver::Name;
use crate::error::{Error, Result};
use crate::gl;
use crate::resource::{Bind, Family, Object};
use std::{fmt, marker, ops, slice};

#[doc(inline)]
pub use self::format::Format;

/// Determines which binding point a buffer attaches to.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    /// Corresponds to `GL_ARRAY_BUFFER`.
    Array,

    /// Corresponds to `GL_COPY_READ_BUFFER`.
    CopyRead,

    /// Corresponds to `GL_COPY_WRITE_BUFFER`.
    CopyWrite,

    /// Corresponds to `GL_ELEMENT_ARRAY_BUFFER`.
    ElementArray,

    /// Corresponds to `GL_PIXEL_PACK_BUFFER`.
    PixelPack,

    /// Corresponds to `GL_PIXEL_UNPACK_BUFFER`.
    PixelUnpack,

    /// Corresponds to `GL_TRANSFORM_FEEDBACK_BUFFER`.
    TransformFeedback,

    /// Corresponds to `GL_UNIFORM_BUFFER`.
    Uniform,

    /// Corresponds to `GL_ATOMIC_COUNTER_BUFFER`.
    AtomicCounter,

    /// Corresponds to `GL_DISPATCH_INDIRECT_BUFFER`.
    DispatchIndirect,

    /// Corresponds to `GL_DRAW_INDIRECT_BUFFER`.
    DrawIndirect,

    /// Corresponds to `GL_QUERY_BUFFER`.
    Query,

    /// Corresponds to `GL_SHADER_STORAGE_BUFFER`.
    ShaderStorage,

    /// Corresponds to `GL_TEXTURE_BUFFER`.
    Texture,
}

impl Kind {
    /// Returns the equivalent OpenGL target enumeration constant.
    pub const fn as_gl_enum(self) -> u32 {
        match self {
            Kind::Array => gl::ARRAY_BUFFER,
            Kind::CopyRead => gl::COPY_READ_BUFFER,
            Kind::CopyWrite => gl::COPY_WRITE_BUFFER,
            Kind::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
            Kind::PixelPack => gl::PIXEL_PACK_BUFFER,
            Kind::PixelUnpack => gl::PIXEL_UNPACK_BUFFER,
            Kind::TransformFeedback => gl::TRANSFORM_FEEDBACK_BUFFER,
            Kind::Uniform => gl::UNIFORM_BUFFER,
            Kind::AtomicCounter => gl::ATOMIC_COUNTER_BUFFER,
            Kind::DispatchIndirect => gl::DISPATCH_INDIRECT_BUFFER,
            Kind::DrawIndirect => gl::DRAW_INDIRECT_BUFFER,
            Kind::Query => gl::QUERY_BUFFER,
            Kind::ShaderStorage => gl::SHADER_STORAGE_BUFFER,
            Kind::Texture => gl::TEXTURE_BUFFER,
        }
    }

    /// Returns the `glGet` key reporting the buffer bound to this target.
    pub const fn binding(self) -> u32 {
        match self {
            Kind::Array => gl::ARRAY_BUFFER_BINDING,
            Kind::CopyRead => gl::COPY_READ_BUFFER_BINDING,
            Kind::CopyWrite => gl::COPY_WRITE_BUFFER_BINDING,
            Kind::ElementArray => gl::ELEMENT_ARRAY_BUFFER_BINDING,
            Kind::PixelPack => gl::PIXEL_PACK_BUFFER_BINDING,
            Kind::PixelUnpack => gl::PIXEL_UNPACK_BUFFER_BINDING,
            Kind::TransformFeedback => gl::TRANSFORM_FEEDBACK_BUFFER_BINDING,
            Kind::Uniform => gl::UNIFORM_BUFFER_BINDING,
            Kind::AtomicCounter => gl::ATOMIC_COUNTER_BUFFER_BINDING,
            Kind::DispatchIndirect => gl::DISPATCH_INDIRECT_BUFFER_BINDING,
            Kind::DrawIndirect => gl::DRAW_INDIRECT_BUFFER_BINDING,
            Kind::Query => gl::QUERY_BUFFER_BINDING,
            Kind::ShaderStorage => gl::SHADER_STORAGE_BUFFER_BINDING,
            Kind::Texture => gl::TEXTURE_BUFFER_BINDING,
        }
    }
}

/// A buffer data usage hint.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Usage {
    /// Corresponds to `GL_STREAM_DRAW`.
    StreamDraw,

    /// Corresponds to `GL_STREAM_READ`.
    StreamRead,

    /// Corresponds to `GL_STREAM_COPY`.
    StreamCopy,

    /// Corresponds to `GL_STATIC_DRAW`.
    StaticDraw,

    /// Corresponds to `GL_STATIC_READ`.
    StaticRead,

    /// Corresponds to `GL_STATIC_COPY`.
    StaticCopy,

    /// Corresponds to `GL_DYNAMIC_DRAW`.
    DynamicDraw,

    /// Corresponds to `GL_DYNAMIC_READ`.
    DynamicRead,

    /// Corresponds to `GL_DYNAMIC_COPY`.
    DynamicCopy,
}

impl Usage {
    /// Returns the equivalent OpenGL usage enumeration constant.
    pub fn as_gl_enum(self) -> u32 {
        match self {
            Usage::StreamDraw => gl::STREAM_DRAW,
            Usage::StreamRead => gl::STREAM_READ,
            Usage::StreamCopy => gl::STREAM_COPY,
            Usage::StaticDraw => gl::STATIC_DRAW,
            Usage::StaticRead => gl::STATIC_READ,
            Usage::StaticCopy => gl::STATIC_COPY,
            Usage::DynamicDraw => gl::DYNAMIC_DRAW,
            Usage::DynamicRead => gl::DYNAMIC_READ,
            Usage::DynamicCopy => gl::DYNAMIC_COPY,
        }
    }

    /// Interprets a `GL_BUFFER_USAGE` query result.
    pub fn from_gl_enum(value: u32) -> Option<Self> {
        let usage = match value {
            gl::STREAM_DRAW => Usage::StreamDraw,
            gl::STREAM_READ => Usage::StreamRead,
            gl::STREAM_COPY => Usage::StreamCopy,
            gl::STATIC_DRAW => Usage::StaticDraw,
            gl::STATIC_READ => Usage::StaticRead,
            gl::STATIC_COPY => Usage::StaticCopy,
            gl::DYNAMIC_DRAW => Usage::DynamicDraw,
            gl::DYNAMIC_READ => Usage::DynamicRead,
            gl::DYNAMIC_COPY => Usage::DynamicCopy,
            _ => return None,
        };
        Some(usage)
    }
}

/// Access policy for a mapped buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Access {
    /// Corresponds to `GL_READ_ONLY`.
    ReadOnly,

    /// Corresponds to `GL_WRITE_ONLY`.
    WriteOnly,

    /// Corresponds to `GL_READ_WRITE`.
    ReadWrite,
}

impl Access {
    /// Returns the equivalent OpenGL access enumeration constant.
    pub fn as_gl_enum(self) -> u32 {
        match self {
            Access::ReadOnly => gl::READ_ONLY,
            Access::WriteOnly => gl::WRITE_ONLY,
            Access::ReadWrite => gl::READ_WRITE,
        }
    }
}

/// Compile-time descriptor of a buffer binding point.
pub trait Target {
    /// The binding point described.
    const KIND: Kind;
}

/// Binding point marker types.
pub mod target {
    use super::{Kind, Target};

    macro_rules! impl_target {
        ( $($ident:ident,)* ) => {
            $(
                #[doc = concat!("Marker for [`Kind::", stringify!($ident), "`](../enum.Kind.html).")]
                #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
                pub enum $ident {}

                impl Target for $ident {
                    const KIND: Kind = Kind::$ident;
                }
            )*
        };
    }

    impl_target!(
        Array,
        CopyRead,
        CopyWrite,
        ElementArray,
        PixelPack,
        PixelUnpack,
        TransformFeedback,
        Uniform,
        AtomicCounter,
        DispatchIndirect,
        DrawIndirect,
        Query,
        ShaderStorage,
        Texture,
    );
}

/// An owned buffer object attached to the binding point `T`.
pub struct Buffer<T: Target> {
    object: Object,
    _target: marker::PhantomData<T>,
}

/// A buffer attached to `GL_ARRAY_BUFFER`.
pub type ArrayBuffer = Buffer<target::Array>;

/// A buffer attached to `GL_COPY_READ_BUFFER`.
pub type CopyReadBuffer = Buffer<target::CopyRead>;

/// A buffer attached to `GL_COPY_WRITE_BUFFER`.
pub type CopyWriteBuffer = Buffer<target::CopyWrite>;

/// A buffer attached to `GL_ELEMENT_ARRAY_BUFFER`.
pub type ElementArrayBuffer = Buffer<target::ElementArray>;

/// A buffer attached to `GL_PIXEL_PACK_BUFFER`.
pub type PixelPackBuffer = Buffer<target::PixelPack>;

/// A buffer attached to `GL_PIXEL_UNPACK_BUFFER`.
pub type PixelUnpackBuffer = Buffer<target::PixelUnpack>;

/// A buffer attached to `GL_TRANSFORM_FEEDBACK_BUFFER`.
pub type TransformFeedbackBuffer = Buffer<target::TransformFeedback>;

/// A buffer attached to `GL_UNIFORM_BUFFER`.
pub type UniformBuffer = Buffer<target::Uniform>;

/// A buffer attached to `GL_ATOMIC_COUNTER_BUFFER`.
pub type AtomicCounterBuffer = Buffer<target::AtomicCounter>;

/// A buffer attached to `GL_DISPATCH_INDIRECT_BUFFER`.
pub type DispatchIndirectBuffer = Buffer<target::DispatchIndirect>;

/// A buffer attached to `GL_DRAW_INDIRECT_BUFFER`.
pub type DrawIndirectBuffer = Buffer<target::DrawIndirect>;

/// A buffer attached to `GL_QUERY_BUFFER`.
pub type QueryBuffer = Buffer<target::Query>;

/// A buffer attached to `GL_SHADER_STORAGE_BUFFER`.
pub type ShaderStorageBuffer = Buffer<target::ShaderStorage>;

/// A buffer attached to `GL_TEXTURE_BUFFER`.
pub type TextureBuffer = Buffer<target::Texture>;

impl<T: Target> Buffer<T> {
    /// Allocates a new buffer name. The buffer has no storage and is not bound.
    pub fn new(ctx: &Context) -> Result<Self> {
        let object = Object::create(ctx, Family::Buffer)?;
        Ok(Self {
            object,
            _target: marker::PhantomData,
        })
    }

    /// Returns the name of the buffer currently bound to `T`, or 0.
    pub fn bound(ctx: &Context) -> Result<Name> {
        ctx.bound(T::KIND.binding())
    }

    /// Returns the binding point kind.
    pub fn kind(&self) -> Kind {
        T::KIND
    }

    /// Creates a data store of `data.len()` bytes initialized from `data`.
    pub fn store(&mut self, data: &[u8], usage: Usage) -> Result<()> {
        self.bind_if_unbound()?;
        // A `Mapping` borrows the buffer mutably, so none is alive here.
        unsafe {
            self.ctx().driver().buffer_data(
                T::KIND.as_gl_enum(),
                data.len(),
                Some(data),
                usage.as_gl_enum(),
            );
        }
        self.ctx().check("glBufferData")
    }

    /// Creates an uninitialized data store of `size` bytes.
    pub fn initialize(&mut self, size: usize, usage: Usage) -> Result<()> {
        self.bind_if_unbound()?;
        unsafe {
            self.ctx().driver().buffer_data(T::KIND.as_gl_enum(), size, None, usage.as_gl_enum());
        }
        self.ctx().check("glBufferData")
    }

    /// Creates a data store initialized from a slice of plain values.
    pub fn store_slice<P: bytemuck::Pod>(&mut self, data: &[P], usage: Usage) -> Result<()> {
        self.store(bytemuck::cast_slice(data), usage)
    }

    /// Replaces `data.len()` bytes of the data store starting at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.bind_if_unbound()?;
        self.ctx().driver().buffer_sub_data(T::KIND.as_gl_enum(), offset, data);
        self.ctx().check("glBufferSubData")
    }

    /// Replaces part of the data store with a slice of plain values.
    ///
    /// `offset` is in bytes.
    pub fn write_slice<P: bytemuck::Pod>(&mut self, offset: usize, data: &[P]) -> Result<()> {
        self.write(offset, bytemuck::cast_slice(data))
    }

    /// Reads `len` bytes of the data store starting at `offset`.
    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.bind_if_unbound()?;
        let mut data = vec![0u8; len];
        self.ctx().driver().get_buffer_sub_data(T::KIND.as_gl_enum(), offset, &mut data);
        self.ctx().check("glGetBufferSubData")?;
        Ok(data)
    }

    /// Reads the whole data store.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let size = self.size()?;
        self.read(0, size)
    }

    /// Reads `count` plain values starting at byte `offset`.
    pub fn read_slice<P: bytemuck::Pod>(&self, offset: usize, count: usize) -> Result<Vec<P>> {
        self.bind_if_unbound()?;
        let mut data = vec![P::zeroed(); count];
        self.ctx().driver().get_buffer_sub_data(
            T::KIND.as_gl_enum(),
            offset,
            bytemuck::cast_slice_mut(&mut data),
        );
        self.ctx().check("glGetBufferSubData")?;
        Ok(data)
    }

    /// Maps the data store into client memory.
    ///
    /// The store stays mapped until the returned guard is unmapped or dropped.
    pub fn map(&mut self, access: Access) -> Result<Mapping<T>> {
        let len = self.size()?;
        self.bind_if_unbound()?;
        // The guard keeps the buffer borrowed until the store is unmapped.
        let ptr = unsafe {
            self.ctx().driver().map_buffer(T::KIND.as_gl_enum(), access.as_gl_enum())
        };
        self.ctx().check("glMapBuffer")?;
        if ptr.is_null() {
            return Err(Error::Map);
        }
        Ok(Mapping {
            buffer: self,
            ptr,
            len,
            access,
            mapped: true,
        })
    }

    /// Unmaps the data store.
    ///
    /// Returns `false` if the driver reports the contents were corrupted
    /// while mapped.
    pub fn unmap(&mut self) -> Result<bool> {
        self.bind_if_unbound()?;
        let intact = unsafe { self.ctx().driver().unmap_buffer(T::KIND.as_gl_enum()) };
        self.ctx().check("glUnmapBuffer")?;
        Ok(intact)
    }

    /// Returns the size of the data store in bytes.
    pub fn size(&self) -> Result<usize> {
        self.parameter(gl::BUFFER_SIZE).map(|size| size as usize)
    }

    /// Returns the usage hint the data store was created with.
    pub fn usage(&self) -> Result<Option<Usage>> {
        self.parameter(gl::BUFFER_USAGE).map(|usage| Usage::from_gl_enum(usage as u32))
    }

    fn parameter(&self, pname: u32) -> Result<i64> {
        self.bind_if_unbound()?;
        let value = self.ctx().driver().get_buffer_parameter(T::KIND.as_gl_enum(), pname);
        self.ctx().check("glGetBufferParameteri64v")?;
        Ok(value)
    }

    fn ctx(&self) -> &Context {
        self.object.context()
    }
}

impl<T: Target> Bind for Buffer<T> {
    const BINDING: u32 = T::KIND.binding();

    fn name(&self) -> Name {
        self.object.name()
    }

    fn context(&self) -> &Context {
        self.object.context()
    }

    fn bind(&self) -> Result<()> {
        self.ctx().driver().bind_buffer(T::KIND.as_gl_enum(), self.name());
        self.ctx().check("glBindBuffer")
    }

    fn unbind(&self) -> Result<()> {
        self.ctx().driver().bind_buffer(T::KIND.as_gl_enum(), 0);
        self.ctx().check("glBindBuffer")
    }
}

impl<T: Target> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Buffer {
            name: Name,
            kind: Kind,
        }

        Buffer {
            name: self.object.name(),
            kind: T::KIND,
        }.fmt(f)
    }
}

/// A mapped buffer data store.
///
/// The mapped bytes are readable unless the store was mapped write-only, and
/// writable unless it was mapped read-only. The store is unmapped when the
/// guard is dropped; call [`unmap`] to observe the result.
///
/// [`unmap`]: #method.unmap
pub struct Mapping<'a, T: Target> {
    buffer: &'a mut Buffer<T>,
    ptr: *mut u8,
    len: usize,
    access: Access,
    mapped: bool,
}

impl<'a, T: Target> Mapping<'a, T> {
    /// Returns the access policy the store was mapped with.
    pub fn access(&self) -> Access {
        self.access
    }

    /// Returns the mapped bytes, or `None` for write-only mappings.
    pub fn as_slice(&self) -> Option<&[u8]> {
        match self.access {
            Access::WriteOnly => None,
            Access::ReadOnly | Access::ReadWrite => {
                Some(unsafe { slice::from_raw_parts(self.ptr, self.len) })
            }
        }
    }

    /// Returns the mapped bytes for writing, or `None` for read-only mappings.
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self.access {
            Access::ReadOnly => None,
            Access::WriteOnly | Access::ReadWrite => {
                Some(unsafe { slice::from_raw_parts_mut(self.ptr, self.len) })
            }
        }
    }

    /// Unmaps the data store, returning `false` if its contents were lost.
    pub fn unmap(mut self) -> Result<bool> {
        self.mapped = false;
        self.buffer.unmap()
    }
}

impl<'a, T: Target> ops::Drop for Mapping<'a, T> {
    fn drop(&mut self) {
        if self.mapped {
            if let Err(err) = self.buffer.unmap() {
                error!(target: "glbind", "{}", err);
            }
        }
    }
}

/// Vertex attribute data formats.
pub mod format {
    use crate::gl;

    /// Scalar component type of a vertex attribute.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum Component {
        /// 32-bit floating point number.
        F32,

        /// Signed 8-bit integer.
        I8,

        /// Signed 16-bit integer.
        I16,

        /// Signed 32-bit integer.
        I32,

        /// Unsigned 8-bit integer.
        U8,

        /// Unsigned 16-bit integer.
        U16,

        /// Unsigned 32-bit integer.
        U32,
    }

    impl Component {
        /// Returns the corresponding GL data type enumeration constant.
        pub fn as_gl_enum(self) -> u32 {
            match self {
                Component::F32 => gl::FLOAT,
                Component::I8 => gl::BYTE,
                Component::I16 => gl::SHORT,
                Component::I32 => gl::INT,
                Component::U8 => gl::UNSIGNED_BYTE,
                Component::U16 => gl::UNSIGNED_SHORT,
                Component::U32 => gl::UNSIGNED_INT,
            }
        }

        /// Returns the size of one component in bytes.
        pub fn size(self) -> usize {
            match self {
                Component::I8 | Component::U8 => 1,
                Component::I16 | Component::U16 => 2,
                Component::F32 | Component::I32 | Component::U32 => 4,
            }
        }
    }

    /// Describes the data format of an individual item in a vertex attribute.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub struct Format {
        /// The scalar component type.
        pub component: Component,

        /// The number of components, between 1 and 4.
        pub count: u8,

        /// Whether integer components are normalized to `[0, 1]` or `[-1, 1]`.
        pub normalized: bool,
    }

    impl Format {
        /// A vector of `count` floats.
        pub const fn f32(count: u8) -> Self {
            Self { component: Component::F32, count, normalized: false }
        }

        /// A vector of `count` unnormalized integers.
        pub const fn int(component: Component, count: u8) -> Self {
            Self { component, count, normalized: false }
        }

        /// A vector of `count` normalized integers.
        pub const fn norm(component: Component, count: u8) -> Self {
            Self { component, count, normalized: true }
        }

        /// Returns the size of one item in bytes.
        pub fn size(self) -> usize {
            self.component.size() * self.count as usize
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn item_size() {
            assert_eq!(Format::f32(3).size(), 12);
            assert_eq!(Format::norm(Component::U8, 4).size(), 4);
            assert_eq!(Format::int(Component::I16, 2).size(), 4);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Config;
    use crate::soft::SoftDriver;
    use std::rc::Rc;

    fn context() -> (Rc<SoftDriver>, Context) {
        let driver = Rc::new(SoftDriver::new());
        let ctx = Context::new(driver.clone(), Config::default());
        (driver, ctx)
    }

    #[test]
    fn targets_carry_their_binding_query() {
        assert_eq!(ArrayBuffer::BINDING, gl::ARRAY_BUFFER_BINDING);
        assert_eq!(target::Array::KIND.as_gl_enum(), gl::ARRAY_BUFFER);
        assert_eq!(UniformBuffer::BINDING, gl::UNIFORM_BUFFER_BINDING);
        assert_eq!(Kind::ShaderStorage.binding(), gl::SHADER_STORAGE_BUFFER_BINDING);
    }

    #[test]
    fn usage_round_trips_through_gl_enum() {
        for usage in &[Usage::StreamRead, Usage::StaticDraw, Usage::DynamicCopy] {
            assert_eq!(Usage::from_gl_enum(usage.as_gl_enum()), Some(*usage));
        }
        assert_eq!(Usage::from_gl_enum(gl::FLOAT), None);
    }

    #[test]
    fn store_reports_usage() {
        let (_driver, ctx) = context();
        let mut vbo = ArrayBuffer::new(&ctx).unwrap();
        vbo.initialize(16, Usage::DynamicDraw).unwrap();
        assert_eq!(vbo.usage().unwrap(), Some(Usage::DynamicDraw));
    }

    #[test]
    fn read_only_mapping_refuses_writes() {
        let (_driver, ctx) = context();
        let mut vbo = ArrayBuffer::new(&ctx).unwrap();
        vbo.store(&[1, 2, 3, 4], Usage::StaticRead).unwrap();
        let mut mapping = vbo.map(Access::ReadOnly).unwrap();
        assert_eq!(mapping.as_slice(), Some(&[1, 2, 3, 4][..]));
        assert!(mapping.as_mut_slice().is_none());
        assert!(mapping.unmap().unwrap());
    }

    #[test]
    fn dropping_a_mapping_unmaps() {
        let (_driver, ctx) = context();
        let mut vbo = ArrayBuffer::new(&ctx).unwrap();
        vbo.initialize(4, Usage::DynamicDraw).unwrap();
        {
            let mut mapping = vbo.map(Access::WriteOnly).unwrap();
            assert!(mapping.as_slice().is_none());
            mapping.as_mut_slice().unwrap().copy_from_slice(&[9, 8, 7, 6]);
        }
        assert_eq!(vbo.parameter(gl::BUFFER_MAPPED).unwrap(), 0);
        assert_eq!(vbo.read_all().unwrap(), vec![9, 8, 7, 6]);
    }
}
