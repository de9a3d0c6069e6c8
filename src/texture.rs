//! GPU-visible pixel containers.
//!
//! Unlike buffers, textures are always bound unconditionally before an
//! operation, and a bind may be qualified with a texture unit. Selecting the
//! unit is an explicit extra command.

use crate::context::Context;
use crate::driver::Name;
use crate::error::{Error, Result};
use crate::gl;
use crate::image;
use crate::resource::{Bind, Family, Object};
use std::{fmt, marker};

/// Determines which binding point a texture attaches to.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    /// Corresponds to `GL_TEXTURE_1D`.
    D1,

    /// Corresponds to `GL_TEXTURE_2D`.
    D2,

    /// Corresponds to `GL_TEXTURE_3D`.
    D3,

    /// Corresponds to `GL_TEXTURE_1D_ARRAY`.
    D1Array,

    /// Corresponds to `GL_TEXTURE_2D_ARRAY`.
    D2Array,

    /// Corresponds to `GL_TEXTURE_CUBE_MAP`.
    CubeMap,
}

impl Kind {
    /// Returns the equivalent OpenGL target enumeration constant.
    pub const fn as_gl_enum(self) -> u32 {
        match self {
            Kind::D1 => gl::TEXTURE_1D,
            Kind::D2 => gl::TEXTURE_2D,
            Kind::D3 => gl::TEXTURE_3D,
            Kind::D1Array => gl::TEXTURE_1D_ARRAY,
            Kind::D2Array => gl::TEXTURE_2D_ARRAY,
            Kind::CubeMap => gl::TEXTURE_CUBE_MAP,
        }
    }

    /// Returns the `glGet` key reporting the texture bound to this target on
    /// the active unit.
    pub const fn binding(self) -> u32 {
        match self {
            Kind::D1 => gl::TEXTURE_BINDING_1D,
            Kind::D2 => gl::TEXTURE_BINDING_2D,
            Kind::D3 => gl::TEXTURE_BINDING_3D,
            Kind::D1Array => gl::TEXTURE_BINDING_1D_ARRAY,
            Kind::D2Array => gl::TEXTURE_BINDING_2D_ARRAY,
            Kind::CubeMap => gl::TEXTURE_BINDING_CUBE_MAP,
        }
    }
}

/// Compile-time descriptor of a texture binding point.
pub trait Target {
    /// The binding point described.
    const KIND: Kind;
}

/// Binding point marker types.
pub mod target {
    use super::{Kind, Target};

    /// Marker for `GL_TEXTURE_1D`.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum D1 {}

    /// Marker for `GL_TEXTURE_2D`.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum D2 {}

    /// Marker for `GL_TEXTURE_3D`.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum D3 {}

    /// Marker for `GL_TEXTURE_1D_ARRAY`.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum D1Array {}

    /// Marker for `GL_TEXTURE_2D_ARRAY`.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum D2Array {}

    /// Marker for `GL_TEXTURE_CUBE_MAP`.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum CubeMap {}

    impl Target for D1 {
        const KIND: Kind = Kind::D1;
    }

    impl Target for D2 {
        const KIND: Kind = Kind::D2;
    }

    impl Target for D3 {
        const KIND: Kind = Kind::D3;
    }

    impl Target for D1Array {
        const KIND: Kind = Kind::D1Array;
    }

    impl Target for D2Array {
        const KIND: Kind = Kind::D2Array;
    }

    impl Target for CubeMap {
        const KIND: Kind = Kind::CubeMap;
    }
}

/// Texture format descriptors.
pub mod format {
    /// 32-bit float format.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum F32 {
        /// Corresponds to `GL_DEPTH_COMPONENT32F`.
        Depth,

        /// Corresponds to `GL_R32F`.
        R,

        /// Corresponds to `GL_RG32F`.
        Rg,

        /// Corresponds to `GL_RGB32F`.
        Rgb,

        /// Corresponds to `GL_RGBA32F`.
        Rgba,
    }

    /// 8-bit fixed format.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub enum U8 {
        /// Corresponds to `GL_R8`.
        R,

        /// Corresponds to `GL_RG8`.
        Rg,

        /// Corresponds to `GL_RGB8`.
        Rgb,

        /// Corresponds to `GL_RGBA8`.
        Rgba,

        /// Corresponds to `GL_SRGB8_ALPHA8`.
        SrgbAlpha,
    }
}

/// Internal format of texture data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    /// 32-bit float.
    F32(format::F32),

    /// 8-bit fixed.
    U8(format::U8),

    /// Corresponds to `GL_DEPTH24_STENCIL8`.
    DepthStencil,
}

impl Format {
    /// Returns the equivalent OpenGL internal format enumeration constant.
    pub fn as_gl_enum(&self) -> u32 {
        match *self {
            Format::F32(format::F32::Depth) => gl::DEPTH_COMPONENT32F,
            Format::F32(format::F32::R) => gl::R32F,
            Format::F32(format::F32::Rg) => gl::RG32F,
            Format::F32(format::F32::Rgb) => gl::RGB32F,
            Format::F32(format::F32::Rgba) => gl::RGBA32F,

            Format::U8(format::U8::R) => gl::R8,
            Format::U8(format::U8::Rg) => gl::RG8,
            Format::U8(format::U8::Rgb) => gl::RGB8,
            Format::U8(format::U8::Rgba) => gl::RGBA8,
            Format::U8(format::U8::SrgbAlpha) => gl::SRGB8_ALPHA8,

            Format::DepthStencil => gl::DEPTH24_STENCIL8,
        }
    }
}

impl From<format::F32> for Format {
    fn from(format: format::F32) -> Self {
        Format::F32(format)
    }
}

impl From<format::U8> for Format {
    fn from(format: format::U8) -> Self {
        Format::U8(format)
    }
}

/// Texture filtering mode.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Filter {
    /// Corresponds to `GL_NEAREST`.
    Nearest,

    /// Corresponds to `GL_LINEAR`.
    Linear,

    /// Corresponds to `GL_NEAREST_MIPMAP_NEAREST`.
    NearestMipmapNearest,

    /// Corresponds to `GL_LINEAR_MIPMAP_NEAREST`.
    LinearMipmapNearest,

    /// Corresponds to `GL_NEAREST_MIPMAP_LINEAR`.
    NearestMipmapLinear,

    /// Corresponds to `GL_LINEAR_MIPMAP_LINEAR`.
    LinearMipmapLinear,
}

impl Filter {
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            Filter::Nearest => gl::NEAREST,
            Filter::Linear => gl::LINEAR,
            Filter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            Filter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            Filter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            Filter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

/// Texture co-ordinate wrapping mode.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
    /// Corresponds to `GL_REPEAT`.
    Repeat,

    /// Corresponds to `GL_MIRRORED_REPEAT`.
    MirroredRepeat,

    /// Corresponds to `GL_CLAMP_TO_EDGE`.
    ClampToEdge,

    /// Corresponds to `GL_CLAMP_TO_BORDER`.
    ClampToBorder,
}

impl Wrap {
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            Wrap::Repeat => gl::REPEAT,
            Wrap::MirroredRepeat => gl::MIRRORED_REPEAT,
            Wrap::ClampToEdge => gl::CLAMP_TO_EDGE,
            Wrap::ClampToBorder => gl::CLAMP_TO_BORDER,
        }
    }
}

/// A texture parameter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Param<'a> {
    /// Forwarded with `glTexParameteri`.
    Int(i32),

    /// Forwarded with `glTexParameterf`.
    Float(f32),

    /// Forwarded with `glTexParameteriv`.
    Ints(&'a [i32]),

    /// Forwarded with `glTexParameterfv`.
    Floats(&'a [f32]),
}

impl<'a> From<i32> for Param<'a> {
    fn from(value: i32) -> Self {
        Param::Int(value)
    }
}

impl<'a> From<f32> for Param<'a> {
    fn from(value: f32) -> Self {
        Param::Float(value)
    }
}

impl<'a> From<&'a [i32]> for Param<'a> {
    fn from(values: &'a [i32]) -> Self {
        Param::Ints(values)
    }
}

impl<'a> From<&'a [f32]> for Param<'a> {
    fn from(values: &'a [f32]) -> Self {
        Param::Floats(values)
    }
}

/// One face of a cube map.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Face {
    /// Corresponds to `GL_TEXTURE_CUBE_MAP_POSITIVE_X`.
    PositiveX,

    /// Corresponds to `GL_TEXTURE_CUBE_MAP_NEGATIVE_X`.
    NegativeX,

    /// Corresponds to `GL_TEXTURE_CUBE_MAP_POSITIVE_Y`.
    PositiveY,

    /// Corresponds to `GL_TEXTURE_CUBE_MAP_NEGATIVE_Y`.
    NegativeY,

    /// Corresponds to `GL_TEXTURE_CUBE_MAP_POSITIVE_Z`.
    PositiveZ,

    /// Corresponds to `GL_TEXTURE_CUBE_MAP_NEGATIVE_Z`.
    NegativeZ,
}

impl Face {
    fn as_gl_enum(self) -> u32 {
        match self {
            Face::PositiveX => gl::TEXTURE_CUBE_MAP_POSITIVE_X,
            Face::NegativeX => gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
            Face::PositiveY => gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
            Face::NegativeY => gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
            Face::PositiveZ => gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
            Face::NegativeZ => gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
        }
    }
}

/// Returns the active texture unit, counted from 0.
pub fn active_unit(ctx: &Context) -> Result<u32> {
    ctx.get_integer(gl::ACTIVE_TEXTURE)
        .map(|unit| (unit as u32).wrapping_sub(gl::TEXTURE0))
}

/// Selects the texture unit subsequent texture binds apply to.
pub fn set_active_unit(ctx: &Context, unit: u32) -> Result<()> {
    ctx.driver().active_texture(unit);
    ctx.check("glActiveTexture")
}

/// Number of values a vector parameter must supply for `pname`.
fn parameter_len(pname: u32) -> usize {
    match pname {
        gl::TEXTURE_BORDER_COLOR | gl::TEXTURE_SWIZZLE_RGBA => 4,
        _ => 1,
    }
}

/// An owned texture object attached to the binding point `T`.
pub struct Texture<T: Target> {
    object: Object,
    _target: marker::PhantomData<T>,
}

/// A texture attached to `GL_TEXTURE_1D`.
pub type Texture1D = Texture<target::D1>;

/// A texture attached to `GL_TEXTURE_2D`.
pub type Texture2D = Texture<target::D2>;

/// A texture attached to `GL_TEXTURE_3D`.
pub type Texture3D = Texture<target::D3>;

/// A texture attached to `GL_TEXTURE_1D_ARRAY`.
pub type Texture1DArray = Texture<target::D1Array>;

/// A texture attached to `GL_TEXTURE_2D_ARRAY`.
pub type Texture2DArray = Texture<target::D2Array>;

/// A texture attached to `GL_TEXTURE_CUBE_MAP`.
pub type TextureCubeMap = Texture<target::CubeMap>;

impl<T: Target> Texture<T> {
    /// Allocates a new texture name.
    pub fn new(ctx: &Context) -> Result<Self> {
        let object = Object::create(ctx, Family::Texture)?;
        Ok(Self {
            object,
            _target: marker::PhantomData,
        })
    }

    /// Returns the name of the texture bound to `T` on the active unit, or 0.
    pub fn bound(ctx: &Context) -> Result<Name> {
        ctx.bound(T::KIND.binding())
    }

    /// Returns the binding point kind.
    pub fn kind(&self) -> Kind {
        T::KIND
    }

    /// Selects texture unit `unit`, then binds this texture to it.
    pub fn bind_unit(&self, unit: u32) -> Result<()> {
        set_active_unit(self.context(), unit)?;
        self.bind()
    }

    /// Sets a texture parameter. Binds the texture.
    ///
    /// Vector parameters shorter than `pname` requires are rejected with
    /// [`Error::ParameterLength`] before anything reaches the driver.
    ///
    /// [`Error::ParameterLength`]: ../error/enum.Error.html#variant.ParameterLength
    pub fn parameter<'p, P: Into<Param<'p>>>(&mut self, pname: u32, param: P) -> Result<()> {
        let param = param.into();
        let actual = match param {
            Param::Ints(values) => Some(values.len()),
            Param::Floats(values) => Some(values.len()),
            Param::Int(_) | Param::Float(_) => None,
        };
        if let Some(actual) = actual {
            let expected = parameter_len(pname);
            if actual < expected {
                return Err(Error::ParameterLength { pname, expected, actual });
            }
        }
        self.bind()?;
        let driver = self.context().driver();
        let target = T::KIND.as_gl_enum();
        let call = match param {
            Param::Int(value) => {
                driver.tex_parameter_i(target, pname, value);
                "glTexParameteri"
            }
            Param::Float(value) => {
                driver.tex_parameter_f(target, pname, value);
                "glTexParameterf"
            }
            Param::Ints(values) => {
                driver.tex_parameter_iv(target, pname, values);
                "glTexParameteriv"
            }
            Param::Floats(values) => {
                driver.tex_parameter_fv(target, pname, values);
                "glTexParameterfv"
            }
        };
        self.context().check(call)
    }

    /// Reads back an integer texture parameter. Binds the texture.
    ///
    /// Vector parameters answer with their first component.
    pub fn get_parameter(&self, pname: u32) -> Result<i32> {
        self.bind()?;
        let value = self.context().driver().get_tex_parameter_i(T::KIND.as_gl_enum(), pname);
        self.context().check("glGetTexParameteriv")?;
        Ok(value)
    }

    /// Sets the minification and magnification filters.
    pub fn set_filters(&mut self, min: Filter, mag: Filter) -> Result<()> {
        self.parameter(gl::TEXTURE_MIN_FILTER, min.as_gl_enum() as i32)?;
        self.parameter(gl::TEXTURE_MAG_FILTER, mag.as_gl_enum() as i32)
    }

    /// Sets the wrapping mode of every texture co-ordinate axis.
    pub fn set_wrap(&mut self, wrap: Wrap) -> Result<()> {
        let value = wrap.as_gl_enum() as i32;
        self.parameter(gl::TEXTURE_WRAP_S, value)?;
        self.parameter(gl::TEXTURE_WRAP_T, value)?;
        self.parameter(gl::TEXTURE_WRAP_R, value)
    }

    /// Generates the mipmap chain from level 0.
    ///
    /// Uses direct state access and does not bind the texture.
    pub fn generate_mipmap(&mut self) -> Result<()> {
        self.context().driver().generate_texture_mipmap(self.name());
        self.context().check("glGenerateTextureMipmap")
    }

    fn image_2d_at(
        &mut self,
        target: u32,
        level: i32,
        internal_format: Format,
        (width, height): (u32, u32),
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        check_image_size(format, (width, height, 1), data)?;
        self.bind()?;
        let (pixel_format, ty) = format.as_gl_enums();
        self.context().driver().tex_image_2d(
            target,
            level,
            internal_format.as_gl_enum(),
            width,
            height,
            pixel_format,
            ty,
            data,
        );
        self.context().check("glTexImage2D")
    }

    fn image_3d_at(
        &mut self,
        level: i32,
        internal_format: Format,
        (width, height, depth): (u32, u32, u32),
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        check_image_size(format, (width, height, depth), data)?;
        self.bind()?;
        let (pixel_format, ty) = format.as_gl_enums();
        self.context().driver().tex_image_3d(
            T::KIND.as_gl_enum(),
            level,
            internal_format.as_gl_enum(),
            width,
            height,
            depth,
            pixel_format,
            ty,
            data,
        );
        self.context().check("glTexImage3D")
    }
}

fn check_image_size(
    format: image::Format,
    (width, height, depth): (u32, u32, u32),
    data: Option<&[u8]>,
) -> Result<()> {
    if let Some(data) = data {
        let expected = format.image_size(width, height, depth);
        if data.len() < expected {
            return Err(Error::ImageSize {
                expected,
                actual: data.len(),
            });
        }
    }
    Ok(())
}

impl Texture<target::D1> {
    /// Sets the image of mipmap `level`. Binds the texture.
    ///
    /// `None` allocates the level without initializing it.
    pub fn image(
        &mut self,
        level: i32,
        internal_format: Format,
        width: u32,
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        check_image_size(format, (width, 1, 1), data)?;
        self.bind()?;
        let (pixel_format, ty) = format.as_gl_enums();
        self.context().driver().tex_image_1d(
            gl::TEXTURE_1D,
            level,
            internal_format.as_gl_enum(),
            width,
            pixel_format,
            ty,
            data,
        );
        self.context().check("glTexImage1D")
    }
}

impl Texture<target::D2> {
    /// Sets the image of mipmap `level`. Binds the texture.
    ///
    /// `None` allocates the level without initializing it.
    pub fn image(
        &mut self,
        level: i32,
        internal_format: Format,
        width: u32,
        height: u32,
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.image_2d_at(gl::TEXTURE_2D, level, internal_format, (width, height), format, data)
    }
}

impl Texture<target::D1Array> {
    /// Sets the image of mipmap `level` for `layers` layers. Binds the texture.
    pub fn image(
        &mut self,
        level: i32,
        internal_format: Format,
        width: u32,
        layers: u32,
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.image_2d_at(gl::TEXTURE_1D_ARRAY, level, internal_format, (width, layers), format, data)
    }
}

impl Texture<target::CubeMap> {
    /// Sets the image of mipmap `level` of one cube face. Binds the texture.
    pub fn face_image(
        &mut self,
        face: Face,
        level: i32,
        internal_format: Format,
        size: u32,
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.image_2d_at(face.as_gl_enum(), level, internal_format, (size, size), format, data)
    }
}

impl Texture<target::D3> {
    /// Sets the image of mipmap `level`. Binds the texture.
    ///
    /// `None` allocates the level without initializing it.
    pub fn image(
        &mut self,
        level: i32,
        internal_format: Format,
        width: u32,
        height: u32,
        depth: u32,
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.image_3d_at(level, internal_format, (width, height, depth), format, data)
    }
}

impl Texture<target::D2Array> {
    /// Sets the image of mipmap `level` for `layers` layers. Binds the texture.
    pub fn image(
        &mut self,
        level: i32,
        internal_format: Format,
        width: u32,
        height: u32,
        layers: u32,
        format: image::Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.image_3d_at(level, internal_format, (width, height, layers), format, data)
    }
}

impl<T: Target> Bind for Texture<T> {
    const BINDING: u32 = T::KIND.binding();

    fn name(&self) -> Name {
        self.object.name()
    }

    fn context(&self) -> &Context {
        self.object.context()
    }

    fn bind(&self) -> Result<()> {
        self.context().driver().bind_texture(T::KIND.as_gl_enum(), self.name());
        self.context().check("glBindTexture")
    }

    fn unbind(&self) -> Result<()> {
        self.context().driver().bind_texture(T::KIND.as_gl_enum(), 0);
        self.context().check("glBindTexture")
    }
}

impl<T: Target> fmt::Debug for Texture<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Texture {
            name: Name,
            kind: Kind,
        }

        Texture {
            name: self.object.name(),
            kind: T::KIND,
        }.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Config;
    use crate::soft::SoftDriver;
    use std::rc::Rc;

    #[test]
    fn kinds_carry_their_binding_query() {
        assert_eq!(Texture2D::BINDING, gl::TEXTURE_BINDING_2D);
        assert_eq!(target::CubeMap::KIND.as_gl_enum(), gl::TEXTURE_CUBE_MAP);
        assert_eq!(Kind::D2Array.binding(), gl::TEXTURE_BINDING_2D_ARRAY);
    }

    #[test]
    fn short_image_data_is_rejected_before_the_call() {
        let driver = Rc::new(SoftDriver::new());
        let ctx = Context::new(driver.clone(), Config::default());
        let mut texture = Texture2D::new(&ctx).unwrap();
        let result = texture.image(
            0,
            Format::U8(format::U8::Rgba),
            2,
            2,
            image::Format::RGBA8,
            Some(&[0; 15]),
        );
        match result {
            Err(Error::ImageSize { expected, actual }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 15);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(driver.calls("glTexImage2D"), 0);
    }
}
