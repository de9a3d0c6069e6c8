//! Native OpenGL bindings and the [`Backend`] driver.
//!
//! [`Backend`]: struct.Backend.html

#![allow(clippy::all, non_upper_case_globals, dead_code, unused_imports, missing_docs)]

use crate::driver::{ActiveUniform, Driver, Name};
use std::{ffi, os, ptr};

// Import OpenGL bindings.
include!(concat!(env!("OUT_DIR"), "/gl.rs"));

/// Forwards every driver call to function pointers of the current context.
pub struct Backend {
    gl: Gl,
}

impl Backend {
    /// Loads function pointers with the given symbol lookup function.
    ///
    /// # Safety
    ///
    /// A context must be current on this thread, and `func` must return its
    /// entry points. The returned backend shares the context with any other
    /// code using it, so that code must not unmap, respecify or delete a
    /// buffer while a [`Mapping`] of it is alive.
    ///
    /// [`Mapping`]: ../buffer/struct.Mapping.html
    pub unsafe fn load<F>(mut func: F) -> Self
        where F: FnMut(&str) -> *const os::raw::c_void
    {
        let gl = Gl::load_with(|sym| func(sym) as *const _);
        Backend { gl }
    }

    fn shader_log(&self, id: Name) -> String {
        let len = query(0, |value: *mut i32| unsafe { self.gl.GetShaderiv(id, INFO_LOG_LENGTH, value) });
        read_log(len, |capacity, written, buf| unsafe {
            self.gl.GetShaderInfoLog(id, capacity, written, buf)
        })
    }

    fn program_log(&self, id: Name) -> String {
        let len = query(0, |value: *mut i32| unsafe { self.gl.GetProgramiv(id, INFO_LOG_LENGTH, value) });
        read_log(len, |capacity, written, buf| unsafe {
            self.gl.GetProgramInfoLog(id, capacity, written, buf)
        })
    }
}

/// Reads a driver string of at most `len` bytes including the NUL terminator.
fn read_log<F>(len: i32, read: F) -> String
    where F: FnOnce(i32, *mut i32, *mut types::GLchar)
{
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    let mut written = 0;
    read(len, &mut written as *mut _, buf.as_mut_ptr() as *mut _);
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Room for the longest fixed-size answer of a `glGet*v` key.
const QUERY_CAPACITY: usize = 16;

/// Runs a `glGet*v` query into scratch space of at least `needed` values and
/// returns the first one.
fn query<T: Clone + Default>(needed: usize, read: impl FnOnce(*mut T)) -> T {
    let mut values = vec![T::default(); needed.max(QUERY_CAPACITY)];
    read(values.as_mut_ptr());
    values.swap_remove(0)
}

/// Copies a parameter vector into the four values `glTexParameter*v` may read.
fn padded<T: Copy + Default>(params: &[T]) -> [T; 4] {
    let mut values = [T::default(); 4];
    for (value, param) in values.iter_mut().zip(params) {
        *value = *param;
    }
    values
}

fn data_ptr(data: Option<&[u8]>) -> *const os::raw::c_void {
    data.map_or(ptr::null(), |bytes| bytes.as_ptr() as *const _)
}

impl Driver for Backend {
    // Error queue and state queries

    fn get_error(&self) -> u32 {
        unsafe { self.gl.GetError() }
    }

    fn get_integer(&self, pname: u32) -> i32 {
        // Format lists are as long as their companion count.
        let needed = match pname {
            COMPRESSED_TEXTURE_FORMATS => self.get_integer(NUM_COMPRESSED_TEXTURE_FORMATS),
            PROGRAM_BINARY_FORMATS => self.get_integer(NUM_PROGRAM_BINARY_FORMATS),
            SHADER_BINARY_FORMATS => self.get_integer(NUM_SHADER_BINARY_FORMATS),
            _ => 0,
        };
        trace!(target: "gl", "glGetIntegerv{:?} ", (pname,));
        let value = query(needed.max(0) as usize, |value: *mut i32| unsafe {
            self.gl.GetIntegerv(pname, value)
        });
        trace!(target: "gl", "=> {}", value);
        value
    }

    // Buffer operations

    fn gen_buffer(&self) -> Name {
        let mut id: u32 = 0;
        unsafe {
            trace!(target: "gl", "glGenBuffers(1) ");
            self.gl.GenBuffers(1, &mut id as *mut _);
        }
        trace!(target: "gl", "=> {}", id);
        id
    }

    unsafe fn delete_buffer(&self, id: Name) {
        trace!(target: "gl", "glDeleteBuffers{:?}", (1, id));
        self.gl.DeleteBuffers(1, &id as *const _);
    }

    fn bind_buffer(&self, target: u32, id: Name) {
        trace!(target: "gl", "glBindBuffer{:?}", (target, id));
        unsafe {
            self.gl.BindBuffer(target, id);
        }
    }

    unsafe fn buffer_data(&self, target: u32, size: usize, data: Option<&[u8]>, usage: u32) {
        let ptr = data_ptr(data);
        trace!(target: "gl", "glBufferData{:?}", (target, size, ptr, usage));
        self.gl.BufferData(target, size as _, ptr, usage);
    }

    fn buffer_sub_data(&self, target: u32, offset: usize, data: &[u8]) {
        trace!(target: "gl", "glBufferSubData{:?}", (target, offset, data.len(), data.as_ptr()));
        unsafe {
            self.gl.BufferSubData(target, offset as _, data.len() as _, data.as_ptr() as *const _);
        }
    }

    fn get_buffer_sub_data(&self, target: u32, offset: usize, data: &mut [u8]) {
        trace!(target: "gl", "glGetBufferSubData{:?}", (target, offset, data.len()));
        unsafe {
            self.gl.GetBufferSubData(
                target,
                offset as _,
                data.len() as _,
                data.as_mut_ptr() as *mut _,
            );
        }
    }

    unsafe fn map_buffer(&self, target: u32, access: u32) -> *mut u8 {
        trace!(target: "gl", "glMapBuffer{:?} ", (target, access));
        let ptr = self.gl.MapBuffer(target, access);
        trace!(target: "gl", "=> {:?}", ptr);
        ptr as *mut u8
    }

    unsafe fn unmap_buffer(&self, target: u32) -> bool {
        trace!(target: "gl", "glUnmapBuffer{:?} ", (target,));
        let intact = self.gl.UnmapBuffer(target);
        trace!(target: "gl", "=> {}", intact);
        intact == TRUE
    }

    fn get_buffer_parameter(&self, target: u32, pname: u32) -> i64 {
        trace!(target: "gl", "glGetBufferParameteri64v{:?} ", (target, pname));
        let value = query(0, |value: *mut i64| unsafe { self.gl.GetBufferParameteri64v(target, pname, value) });
        trace!(target: "gl", "=> {}", value);
        value
    }

    // Vertex array operations

    fn gen_vertex_array(&self) -> Name {
        let mut id: u32 = 0;
        unsafe {
            trace!(target: "gl", "glGenVertexArrays(1) ");
            self.gl.GenVertexArrays(1, &mut id as *mut _);
        }
        trace!(target: "gl", "=> {}", id);
        id
    }

    fn delete_vertex_array(&self, id: Name) {
        trace!(target: "gl", "glDeleteVertexArrays{:?}", (1, id));
        unsafe {
            self.gl.DeleteVertexArrays(1, &id as *const _);
        }
    }

    fn bind_vertex_array(&self, id: Name) {
        trace!(target: "gl", "glBindVertexArray{:?}", (id,));
        unsafe {
            self.gl.BindVertexArray(id);
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        trace!(target: "gl", "glEnableVertexAttribArray{:?}", (index,));
        unsafe {
            self.gl.EnableVertexAttribArray(index);
        }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        trace!(target: "gl", "glDisableVertexAttribArray{:?}", (index,));
        unsafe {
            self.gl.DisableVertexAttribArray(index);
        }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: usize,
    ) {
        trace!(
            target: "gl",
            "glVertexAttribPointer{:?}",
            (index, size, ty, normalized, stride, offset),
        );
        let normalized = if normalized { TRUE } else { FALSE };
        unsafe {
            self.gl.VertexAttribPointer(index, size, ty, normalized, stride, offset as *const _);
        }
    }

    fn get_vertex_attrib(&self, index: u32, pname: u32) -> i32 {
        trace!(target: "gl", "glGetVertexAttribiv{:?} ", (index, pname));
        let value = query(0, |value: *mut i32| unsafe { self.gl.GetVertexAttribiv(index, pname, value) });
        trace!(target: "gl", "=> {}", value);
        value
    }

    // Texture operations

    fn gen_texture(&self) -> Name {
        let mut id: u32 = 0;
        unsafe {
            trace!(target: "gl", "glGenTextures(1) ");
            self.gl.GenTextures(1, &mut id as *mut _);
        }
        trace!(target: "gl", "=> {}", id);
        id
    }

    fn delete_texture(&self, id: Name) {
        trace!(target: "gl", "glDeleteTextures{:?}", (1, id));
        unsafe {
            self.gl.DeleteTextures(1, &id as *const _);
        }
    }

    fn bind_texture(&self, target: u32, id: Name) {
        trace!(target: "gl", "glBindTexture{:?}", (target, id));
        unsafe {
            self.gl.BindTexture(target, id);
        }
    }

    fn active_texture(&self, unit: u32) {
        let texture = TEXTURE0.wrapping_add(unit);
        trace!(target: "gl", "glActiveTexture{:?}", (texture,));
        unsafe {
            self.gl.ActiveTexture(texture);
        }
    }

    fn tex_image_1d(
        &self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    ) {
        let ptr = data_ptr(data);
        trace!(
            target: "gl",
            "glTexImage1D{:?}",
            (target, level, internal_format, width, 0, format, ty, ptr),
        );
        unsafe {
            self.gl.TexImage1D(
                target,
                level,
                internal_format as _,
                width as _,
                0,
                format,
                ty,
                ptr,
            );
        }
    }

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
    ) {
        let ptr = data_ptr(data);
        trace!(
            target: "gl",
            "glTexImage2D{:?}",
            (target, level, internal_format, width, height, 0, format, ty, ptr),
        );
        unsafe {
            self.gl.TexImage2D(
                target,
                level,
                internal_format as _,
                width as _,
                height as _,
                0,
                format,
                ty,
                ptr,
            );
        }
    }

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
    ) {
        let ptr = data_ptr(data);
        trace!(
            target: "gl",
            "glTexImage3D{:?}",
            (target, level, internal_format, width, height, depth, 0, format, ty, ptr),
        );
        unsafe {
            self.gl.TexImage3D(
                target,
                level,
                internal_format as _,
                width as _,
                height as _,
                depth as _,
                0,
                format,
                ty,
                ptr,
            );
        }
    }

    fn tex_parameter_i(&self, target: u32, pname: u32, param: i32) {
        trace!(target: "gl", "glTexParameteri{:?}", (target, pname, param));
        unsafe {
            self.gl.TexParameteri(target, pname, param);
        }
    }

    fn tex_parameter_f(&self, target: u32, pname: u32, param: f32) {
        trace!(target: "gl", "glTexParameterf{:?}", (target, pname, param));
        unsafe {
            self.gl.TexParameterf(target, pname, param);
        }
    }

    fn tex_parameter_iv(&self, target: u32, pname: u32, params: &[i32]) {
        trace!(target: "gl", "glTexParameteriv{:?}", (target, pname, params));
        let params = padded(params);
        unsafe {
            self.gl.TexParameteriv(target, pname, params.as_ptr());
        }
    }

    fn tex_parameter_fv(&self, target: u32, pname: u32, params: &[f32]) {
        trace!(target: "gl", "glTexParameterfv{:?}", (target, pname, params));
        let params = padded(params);
        unsafe {
            self.gl.TexParameterfv(target, pname, params.as_ptr());
        }
    }

    fn get_tex_parameter_i(&self, target: u32, pname: u32) -> i32 {
        trace!(target: "gl", "glGetTexParameteriv{:?} ", (target, pname));
        let value = query(0, |value: *mut i32| unsafe { self.gl.GetTexParameteriv(target, pname, value) });
        trace!(target: "gl", "=> {}", value);
        value
    }

    fn generate_texture_mipmap(&self, id: Name) {
        trace!(target: "gl", "glGenerateTextureMipmap{:?}", (id,));
        unsafe {
            self.gl.GenerateTextureMipmap(id);
        }
    }

    // Shader operations

    fn create_shader(&self, ty: u32) -> Name {
        let id = unsafe {
            trace!(target: "gl", "glCreateShader{:?} ", (ty,));
            self.gl.CreateShader(ty)
        };
        trace!(target: "gl", "=> {}", id);
        id
    }

    fn delete_shader(&self, id: Name) {
        trace!(target: "gl", "glDeleteShader{:?}", (id,));
        unsafe {
            self.gl.DeleteShader(id);
        }
    }

    fn shader_source(&self, id: Name, source: &ffi::CStr) {
        trace!(target: "gl", "glShaderSource{:?}", (id, source));
        unsafe {
            let ptr = source.as_ptr() as *const types::GLchar;
            self.gl.ShaderSource(id, 1, &ptr as *const _, ptr::null());
        }
    }

    fn compile_shader(&self, id: Name) {
        trace!(target: "gl", "glCompileShader{:?}", (id,));
        unsafe {
            self.gl.CompileShader(id);
        }
    }

    fn get_shader(&self, id: Name, pname: u32) -> i32 {
        trace!(target: "gl", "glGetShaderiv{:?} ", (id, pname));
        let value = query(0, |value: *mut i32| unsafe { self.gl.GetShaderiv(id, pname, value) });
        trace!(target: "gl", "=> {}", value);
        value
    }

    fn get_shader_info_log(&self, id: Name) -> String {
        trace!(target: "gl", "glGetShaderInfoLog{:?}", (id,));
        self.shader_log(id)
    }

    // Program operations

    fn create_program(&self) -> Name {
        let id = unsafe {
            trace!(target: "gl", "glCreateProgram() ");
            self.gl.CreateProgram()
        };
        trace!(target: "gl", "=> {}", id);
        id
    }

    fn delete_program(&self, id: Name) {
        trace!(target: "gl", "glDeleteProgram{:?}", (id,));
        unsafe {
            self.gl.DeleteProgram(id);
        }
    }

    fn attach_shader(&self, program: Name, shader: Name) {
        trace!(target: "gl", "glAttachShader{:?}", (program, shader));
        unsafe {
            self.gl.AttachShader(program, shader);
        }
    }

    fn detach_shader(&self, program: Name, shader: Name) {
        trace!(target: "gl", "glDetachShader{:?}", (program, shader));
        unsafe {
            self.gl.DetachShader(program, shader);
        }
    }

    fn link_program(&self, id: Name) {
        trace!(target: "gl", "glLinkProgram{:?}", (id,));
        unsafe {
            self.gl.LinkProgram(id);
        }
    }

    fn validate_program(&self, id: Name) {
        trace!(target: "gl", "glValidateProgram{:?}", (id,));
        unsafe {
            self.gl.ValidateProgram(id);
        }
    }

    fn get_program(&self, id: Name, pname: u32) -> i32 {
        trace!(target: "gl", "glGetProgramiv{:?} ", (id, pname));
        let value = query(0, |value: *mut i32| unsafe { self.gl.GetProgramiv(id, pname, value) });
        trace!(target: "gl", "=> {}", value);
        value
    }

    fn get_program_info_log(&self, id: Name) -> String {
        trace!(target: "gl", "glGetProgramInfoLog{:?}", (id,));
        self.program_log(id)
    }

    fn get_active_uniform(&self, program: Name, index: u32) -> ActiveUniform {
        let capacity = self.get_program(program, ACTIVE_UNIFORM_MAX_LENGTH);
        let mut size = 0;
        let mut ty = 0;
        trace!(target: "gl", "glGetActiveUniform{:?} ", (program, index));
        let name = read_log(capacity, |capacity, written, buf| unsafe {
            self.gl.GetActiveUniform(
                program,
                index,
                capacity,
                written,
                &mut size as *mut _,
                &mut ty as *mut _,
                buf,
            )
        });
        trace!(target: "gl", "=> {:?}", (&name, size, ty));
        ActiveUniform { name, size, ty }
    }

    fn get_uniform_location(&self, program: Name, name: &ffi::CStr) -> i32 {
        let location = unsafe {
            trace!(target: "gl", "glGetUniformLocation{:?} ", (program, name));
            self.gl.GetUniformLocation(program, name.as_ptr() as *const _)
        };
        trace!(target: "gl", "=> {}", location);
        location
    }

    fn use_program(&self, id: Name) {
        trace!(target: "gl", "glUseProgram{:?}", (id,));
        unsafe {
            self.gl.UseProgram(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_have_room_for_multi_valued_keys() {
        let first = query(0, |values: *mut i32| unsafe {
            for i in 0..QUERY_CAPACITY {
                *values.add(i) = i as i32 + 7;
            }
        });
        assert_eq!(first, 7);

        let first = query(40, |values: *mut i32| unsafe {
            *values.add(39) = 1;
            *values = 3;
        });
        assert_eq!(first, 3);
    }

    #[test]
    fn short_parameter_vectors_are_padded() {
        assert_eq!(padded(&[1.0f32]), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(padded::<i32>(&[]), [0; 4]);
        assert_eq!(padded(&[1, 2, 3, 4, 5]), [1, 2, 3, 4]);
    }
}
