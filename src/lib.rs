//! Safe, owned handles for OpenGL objects.
//!
//! Every handle owns exactly one driver object and deletes it when dropped.
//! Handles reach the driver through a shared [`Context`], which also decides
//! what happens to the errors the driver records after each call.
//!
//! ```no_run
//! # fn query_proc_address(_: &str) -> *const std::os::raw::c_void { std::ptr::null() }
//! use glbind::buffer::{ArrayBuffer, Usage};
//!
//! let ctx = glbind::init(query_proc_address);
//! let mut vbo = ArrayBuffer::new(&ctx)?;
//! vbo.store_slice(&[0.0f32, 1.0, 2.0], Usage::StaticDraw)?;
//! # Ok::<(), glbind::Error>(())
//! ```
//!
//! [`Context`]: context/struct.Context.html

extern crate arrayvec;
extern crate bytemuck;
#[macro_use] extern crate log;
extern crate thiserror;
extern crate vec_map;

mod resource;
pub mod gl;

pub mod buffer;
pub mod context;
pub mod driver;
pub mod error;
pub mod image;
pub mod program;
pub mod shader;
pub mod soft;
pub mod texture;
pub mod vertex_array;

use std::{os, rc};

/// Loads the driver entry points and creates a context with the default
/// configuration.
///
/// A native graphics context must be current on the calling thread.
pub fn init<F>(query_proc_address: F) -> Context
    where F: FnMut(&str) -> *const os::raw::c_void
{
    init_with(Config::default(), query_proc_address)
}

/// Loads the driver entry points and creates a context.
pub fn init_with<F>(config: Config, query_proc_address: F) -> Context
    where F: FnMut(&str) -> *const os::raw::c_void
{
    // The backend is only reachable through the context's `Driver` surface.
    let backend = unsafe { gl::Backend::load(query_proc_address) };
    info!(target: "glbind", "driver loaded with {:?}", config);
    Context::new(rc::Rc::new(backend), config)
}

#[doc(inline)]
pub use buffer::Buffer;

#[doc(inline)]
pub use context::Config;

#[doc(inline)]
pub use context::Context;

#[doc(inline)]
pub use context::ErrorChecking;

#[doc(inline)]
pub use driver::Driver;

#[doc(inline)]
pub use error::Error;

#[doc(inline)]
pub use error::ErrorCode;

#[doc(inline)]
pub use error::Result;

#[doc(inline)]
pub use program::Program;

#[doc(inline)]
pub use resource::Bind;

#[doc(inline)]
pub use shader::Shader;

#[doc(inline)]
pub use soft::SoftDriver;

#[doc(inline)]
pub use texture::Texture;

#[doc(inline)]
pub use vertex_array::VertexArray;
