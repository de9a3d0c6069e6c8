//! Error types.

use crate::gl;
use std::{ffi, fmt, io};
use thiserror::Error;

/// Alias for `Result<T, glbind::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Error enumerant reported by the driver's error queue.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorCode {
    /// Corresponds to `GL_INVALID_ENUM`.
    InvalidEnum,

    /// Corresponds to `GL_INVALID_VALUE`.
    InvalidValue,

    /// Corresponds to `GL_INVALID_OPERATION`.
    InvalidOperation,

    /// Corresponds to `GL_INVALID_FRAMEBUFFER_OPERATION`.
    InvalidFramebufferOperation,

    /// Corresponds to `GL_OUT_OF_MEMORY`.
    OutOfMemory,

    /// Corresponds to `GL_STACK_UNDERFLOW`.
    StackUnderflow,

    /// Corresponds to `GL_STACK_OVERFLOW`.
    StackOverflow,

    /// An enumerant this crate does not recognise.
    Unknown(u32),
}

impl ErrorCode {
    /// Interprets a `glGetError` result. `GL_NO_ERROR` yields `None`.
    pub fn from_gl_enum(value: u32) -> Option<Self> {
        match value {
            gl::NO_ERROR => None,
            gl::INVALID_ENUM => Some(ErrorCode::InvalidEnum),
            gl::INVALID_VALUE => Some(ErrorCode::InvalidValue),
            gl::INVALID_OPERATION => Some(ErrorCode::InvalidOperation),
            gl::INVALID_FRAMEBUFFER_OPERATION => Some(ErrorCode::InvalidFramebufferOperation),
            gl::OUT_OF_MEMORY => Some(ErrorCode::OutOfMemory),
            gl::STACK_UNDERFLOW => Some(ErrorCode::StackUnderflow),
            gl::STACK_OVERFLOW => Some(ErrorCode::StackOverflow),
            x => Some(ErrorCode::Unknown(x)),
        }
    }

    /// Returns the equivalent OpenGL error enumeration constant.
    pub fn as_gl_enum(self) -> u32 {
        match self {
            ErrorCode::InvalidEnum => gl::INVALID_ENUM,
            ErrorCode::InvalidValue => gl::INVALID_VALUE,
            ErrorCode::InvalidOperation => gl::INVALID_OPERATION,
            ErrorCode::InvalidFramebufferOperation => gl::INVALID_FRAMEBUFFER_OPERATION,
            ErrorCode::OutOfMemory => gl::OUT_OF_MEMORY,
            ErrorCode::StackUnderflow => gl::STACK_UNDERFLOW,
            ErrorCode::StackOverflow => gl::STACK_OVERFLOW,
            ErrorCode::Unknown(x) => x,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorCode::InvalidEnum => f.write_str("GL_INVALID_ENUM"),
            ErrorCode::InvalidValue => f.write_str("GL_INVALID_VALUE"),
            ErrorCode::InvalidOperation => f.write_str("GL_INVALID_OPERATION"),
            ErrorCode::InvalidFramebufferOperation => {
                f.write_str("GL_INVALID_FRAMEBUFFER_OPERATION")
            }
            ErrorCode::OutOfMemory => f.write_str("GL_OUT_OF_MEMORY"),
            ErrorCode::StackUnderflow => f.write_str("GL_STACK_UNDERFLOW"),
            ErrorCode::StackOverflow => f.write_str("GL_STACK_OVERFLOW"),
            ErrorCode::Unknown(x) => write!(f, "0x{:x}", x),
        }
    }
}

/// Everything that can go wrong in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The driver returned no name for a new object.
    #[error("could not allocate {kind} (driver returned no name)")]
    Allocation { kind: &'static str },

    /// The driver flagged an error after a forwarded call.
    #[error("{call} failed: {code}")]
    Driver { call: &'static str, code: ErrorCode },

    /// `glMapBuffer` returned null.
    #[error("could not map buffer")]
    Map,

    /// A string handed to the driver contained a NUL byte.
    #[error("string passed to the driver contains a NUL byte")]
    Nul(#[from] ffi::NulError),

    /// Shader source could not be read.
    #[error("could not read shader source: {0}")]
    Io(#[from] io::Error),

    /// Pixel data does not match the dimensions of a texture upload.
    #[error("texture image needs {expected} bytes but {actual} were supplied")]
    ImageSize { expected: usize, actual: usize },

    /// A vector texture parameter is shorter than its key requires.
    #[error("texture parameter 0x{pname:x} needs {expected} values but {actual} were supplied")]
    ParameterLength { pname: u32, expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error_is_none() {
        assert_eq!(ErrorCode::from_gl_enum(gl::NO_ERROR), None);
    }

    #[test]
    fn codes_display_as_symbolic_names() {
        let code = ErrorCode::from_gl_enum(gl::INVALID_OPERATION).unwrap();
        assert_eq!(code, ErrorCode::InvalidOperation);
        assert_eq!(code.to_string(), "GL_INVALID_OPERATION");
        assert_eq!(ErrorCode::Unknown(0x1234).to_string(), "0x1234");
    }

    #[test]
    fn driver_error_names_the_call() {
        let err = Error::Driver {
            call: "glBufferSubData",
            code: ErrorCode::InvalidValue,
        };
        assert_eq!(err.to_string(), "glBufferSubData failed: GL_INVALID_VALUE");
    }

    #[test]
    fn parameter_length_names_the_key() {
        let err = Error::ParameterLength {
            pname: gl::TEXTURE_BORDER_COLOR,
            expected: 4,
            actual: 1,
        };
        assert_eq!(err.to_string(), "texture parameter 0x1004 needs 4 values but 1 were supplied");
    }
}
