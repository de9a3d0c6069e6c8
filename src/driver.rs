//! The driver command surface.
//!
//! Every handle in this crate talks to the driver exclusively through the
//! [`Driver`] trait. Enumerants are passed through untouched, so an
//! implementation is expected to understand the OpenGL constants re-exported
//! in the [`gl`] module.
//!
//! [`Driver`]: trait.Driver.html
//! [`gl`]: ../gl/index.html

use std::ffi;

/// Driver-assigned object name. Zero means "no object".
pub type Name = u32;

/// Description of one active uniform variable in a linked program.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct ActiveUniform {
    /// The uniform name as reported by the driver, e.g. `lights[0]`.
    pub name: String,

    /// The number of array elements, or 1 for non-arrays.
    pub size: i32,

    /// The GLSL data type enumerant, e.g. `GL_FLOAT_VEC4`.
    pub ty: u32,
}

/// Opaque native graphics command surface.
///
/// Methods map one-to-one onto driver entry points and do not report errors
/// themselves; errors accumulate in the driver's queue and are collected with
/// [`get_error`].
///
/// The entry points that release or replace a buffer data store are `unsafe`:
/// they invalidate the client pointer [`map_buffer`] handed out for that
/// store, and memory behind a dangling mapping must never be touched.
///
/// [`get_error`]: #tymethod.get_error
/// [`map_buffer`]: #tymethod.map_buffer
pub trait Driver {
    // Error queue and state queries

    /// Corresponds to `glGetError`.
    fn get_error(&self) -> u32;

    /// Corresponds to `glGetIntegerv`, returning the first value.
    ///
    /// Implementations must accept keys with multi-valued answers.
    fn get_integer(&self, pname: u32) -> i32;

    // Buffer operations

    /// Corresponds to `glGenBuffers(1)`.
    fn gen_buffer(&self) -> Name;

    /// Corresponds to `glDeleteBuffers(1)`.
    ///
    /// # Safety
    ///
    /// No pointer returned by `map_buffer` for the buffer may be used
    /// afterwards.
    unsafe fn delete_buffer(&self, id: Name);

    /// Corresponds to `glBindBuffer`.
    fn bind_buffer(&self, target: u32, id: Name);

    /// Corresponds to `glBufferData`. `None` leaves the storage uninitialized.
    ///
    /// # Safety
    ///
    /// No pointer returned by `map_buffer` for the store previously bound to
    /// `target` may be used afterwards.
    unsafe fn buffer_data(&self, target: u32, size: usize, data: Option<&[u8]>, usage: u32);

    /// Corresponds to `glBufferSubData`.
    fn buffer_sub_data(&self, target: u32, offset: usize, data: &[u8]);

    /// Corresponds to `glGetBufferSubData`.
    fn get_buffer_sub_data(&self, target: u32, offset: usize, data: &mut [u8]);

    /// Corresponds to `glMapBuffer`. Returns null on failure.
    ///
    /// # Safety
    ///
    /// The returned pointer addresses `GL_BUFFER_SIZE` bytes only until the
    /// store is unmapped, respecified or deleted. The caller must also honour
    /// `access`: a read-only mapping is never written and the contents of a
    /// write-only mapping are never read.
    unsafe fn map_buffer(&self, target: u32, access: u32) -> *mut u8;

    /// Corresponds to `glUnmapBuffer`.
    ///
    /// # Safety
    ///
    /// No pointer returned by `map_buffer` for the store bound to `target`
    /// may be used afterwards.
    unsafe fn unmap_buffer(&self, target: u32) -> bool;

    /// Corresponds to `glGetBufferParameteri64v`.
    fn get_buffer_parameter(&self, target: u32, pname: u32) -> i64;

    // Vertex array operations

    /// Corresponds to `glGenVertexArrays(1)`.
    fn gen_vertex_array(&self) -> Name;

    /// Corresponds to `glDeleteVertexArrays(1)`.
    fn delete_vertex_array(&self, id: Name);

    /// Corresponds to `glBindVertexArray`.
    fn bind_vertex_array(&self, id: Name);

    /// Corresponds to `glEnableVertexAttribArray`.
    fn enable_vertex_attrib_array(&self, index: u32);

    /// Corresponds to `glDisableVertexAttribArray`.
    fn disable_vertex_attrib_array(&self, index: u32);

    /// Corresponds to `glVertexAttribPointer`.
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: usize,
    );

    /// Corresponds to `glGetVertexAttribiv` with a single result.
    fn get_vertex_attrib(&self, index: u32, pname: u32) -> i32;

    // Texture operations

    /// Corresponds to `glGenTextures(1)`.
    fn gen_texture(&self) -> Name;

    /// Corresponds to `glDeleteTextures(1)`.
    fn delete_texture(&self, id: Name);

    /// Corresponds to `glBindTexture`.
    fn bind_texture(&self, target: u32, id: Name);

    /// Corresponds to `glActiveTexture(GL_TEXTURE0 + unit)`.
    fn active_texture(&self, unit: u32);

    /// Corresponds to `glTexImage1D`.
    fn tex_image_1d(
        &self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    );

    /// Corresponds to `glTexImage2D`.
    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        height: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    );

    /// Corresponds to `glTexImage3D`.
    fn tex_image_3d(
        &self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        height: u32,
        depth: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    );

    /// Corresponds to `glTexParameteri`.
    fn tex_parameter_i(&self, target: u32, pname: u32, param: i32);

    /// Corresponds to `glTexParameterf`.
    fn tex_parameter_f(&self, target: u32, pname: u32, param: f32);

    /// Corresponds to `glTexParameteriv`.
    fn tex_parameter_iv(&self, target: u32, pname: u32, params: &[i32]);

    /// Corresponds to `glTexParameterfv`.
    fn tex_parameter_fv(&self, target: u32, pname: u32, params: &[f32]);

    /// Corresponds to `glGetTexParameteriv` with a single result.
    fn get_tex_parameter_i(&self, target: u32, pname: u32) -> i32;

    /// Corresponds to `glGenerateTextureMipmap`.
    fn generate_texture_mipmap(&self, id: Name);

    // Shader operations

    /// Corresponds to `glCreateShader`.
    fn create_shader(&self, ty: u32) -> Name;

    /// Corresponds to `glDeleteShader`.
    fn delete_shader(&self, id: Name);

    /// Corresponds to `glShaderSource` with a single NUL-terminated string.
    fn shader_source(&self, id: Name, source: &ffi::CStr);

    /// Corresponds to `glCompileShader`.
    fn compile_shader(&self, id: Name);

    /// Corresponds to `glGetShaderiv`.
    fn get_shader(&self, id: Name, pname: u32) -> i32;

    /// Corresponds to `glGetShaderInfoLog`.
    fn get_shader_info_log(&self, id: Name) -> String;

    // Program operations

    /// Corresponds to `glCreateProgram`.
    fn create_program(&self) -> Name;

    /// Corresponds to `glDeleteProgram`.
    fn delete_program(&self, id: Name);

    /// Corresponds to `glAttachShader`.
    fn attach_shader(&self, program: Name, shader: Name);

    /// Corresponds to `glDetachShader`.
    fn detach_shader(&self, program: Name, shader: Name);

    /// Corresponds to `glLinkProgram`.
    fn link_program(&self, id: Name);

    /// Corresponds to `glValidateProgram`.
    fn validate_program(&self, id: Name);

    /// Corresponds to `glGetProgramiv`.
    fn get_program(&self, id: Name, pname: u32) -> i32;

    /// Corresponds to `glGetProgramInfoLog`.
    fn get_program_info_log(&self, id: Name) -> String;

    /// Corresponds to `glGetActiveUniform`.
    fn get_active_uniform(&self, program: Name, index: u32) -> ActiveUniform;

    /// Corresponds to `glGetUniformLocation`.
    fn get_uniform_location(&self, program: Name, name: &ffi::CStr) -> i32;

    /// Corresponds to `glUseProgram`.
    fn use_program(&self, id: Name);
}
