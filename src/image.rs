//! CPU-visible pixel formats.

use crate::gl;

/// Channel order of client pixel data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Channels {
    /// Corresponds to `GL_RED`.
    R,

    /// Corresponds to `GL_RG`.
    Rg,

    /// Corresponds to `GL_RGB`.
    Rgb,

    /// Corresponds to `GL_BGR`.
    Bgr,

    /// Corresponds to `GL_RGBA`.
    Rgba,

    /// Corresponds to `GL_BGRA`.
    Bgra,

    /// Corresponds to `GL_DEPTH_COMPONENT`.
    Depth,
}

impl Channels {
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            Channels::R => gl::RED,
            Channels::Rg => gl::RG,
            Channels::Rgb => gl::RGB,
            Channels::Bgr => gl::BGR,
            Channels::Rgba => gl::RGBA,
            Channels::Bgra => gl::BGRA,
            Channels::Depth => gl::DEPTH_COMPONENT,
        }
    }

    fn count(self) -> usize {
        match self {
            Channels::R | Channels::Depth => 1,
            Channels::Rg => 2,
            Channels::Rgb | Channels::Bgr => 3,
            Channels::Rgba | Channels::Bgra => 4,
        }
    }
}

/// Data type of each channel of client pixel data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataType {
    /// Corresponds to `GL_UNSIGNED_BYTE`.
    U8,

    /// Corresponds to `GL_BYTE`.
    I8,

    /// Corresponds to `GL_UNSIGNED_SHORT`.
    U16,

    /// Corresponds to `GL_SHORT`.
    I16,

    /// Corresponds to `GL_UNSIGNED_INT`.
    U32,

    /// Corresponds to `GL_INT`.
    I32,

    /// Corresponds to `GL_FLOAT`.
    F32,
}

impl DataType {
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            DataType::U8 => gl::UNSIGNED_BYTE,
            DataType::I8 => gl::BYTE,
            DataType::U16 => gl::UNSIGNED_SHORT,
            DataType::I16 => gl::SHORT,
            DataType::U32 => gl::UNSIGNED_INT,
            DataType::I32 => gl::INT,
            DataType::F32 => gl::FLOAT,
        }
    }

    fn size(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
        }
    }
}

/// An image pixel format.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Format {
    /// Channel order.
    pub channels: Channels,

    /// Per-channel data type.
    pub ty: DataType,
}

/// Row alignment the driver assumes for client pixel data (`GL_UNPACK_ALIGNMENT`).
pub(crate) const UNPACK_ALIGNMENT: usize = 4;

impl Format {
    /// Constructor.
    pub const fn new(channels: Channels, ty: DataType) -> Self {
        Self { channels, ty }
    }

    /// 8-bit RGBA, the most common upload format.
    pub const RGBA8: Format = Format::new(Channels::Rgba, DataType::U8);

    /// 32-bit float RGBA.
    pub const RGBA32F: Format = Format::new(Channels::Rgba, DataType::F32);

    /// Returns the `(format, type)` enumeration pair for pixel transfers.
    pub(crate) fn as_gl_enums(self) -> (u32, u32) {
        (self.channels.as_gl_enum(), self.ty.as_gl_enum())
    }

    /// Returns the number of bytes per pixel.
    pub fn pixel_size(self) -> usize {
        self.channels.count() * self.ty.size()
    }

    /// Returns the number of bytes the driver reads for an image of the
    /// given dimensions, honouring the default unpack row alignment.
    pub fn image_size(self, width: u32, height: u32, depth: u32) -> usize {
        let rows = height as usize * depth as usize;
        if width == 0 || rows == 0 {
            return 0;
        }
        let row = width as usize * self.pixel_size();
        let stride = (row + UNPACK_ALIGNMENT - 1) / UNPACK_ALIGNMENT * UNPACK_ALIGNMENT;
        stride * (rows - 1) + row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_pads_all_but_the_last_row() {
        let rgb = Format::new(Channels::Rgb, DataType::U8);
        assert_eq!(rgb.pixel_size(), 3);
        // 3-byte rows padded to 4.
        assert_eq!(rgb.image_size(1, 3, 1), 4 + 4 + 3);
        assert_eq!(Format::RGBA8.image_size(2, 2, 2), 32);
        assert_eq!(Format::RGBA8.image_size(0, 5, 1), 0);
    }
}
