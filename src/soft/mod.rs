//! An in-memory driver for headless use.
//!
//! `SoftDriver` keeps every object the [`Driver`] surface can create in
//! process memory and validates arguments the way a core profile driver
//! does, recording errors in its queue instead of rendering anything. It also
//! counts calls by entry point, which makes redundant binds observable.
//!
//! ```
//! use glbind::buffer::{ArrayBuffer, Usage};
//! use glbind::soft::SoftDriver;
//! use glbind::{Bind, Config, Context};
//! use std::rc::Rc;
//!
//! let driver = Rc::new(SoftDriver::new());
//! let ctx = Context::new(driver.clone(), Config::default());
//! let mut vbo = ArrayBuffer::new(&ctx)?;
//! vbo.store(&[1, 2, 3, 4], Usage::StaticDraw)?;
//! vbo.bind_if_unbound()?;
//! assert_eq!(driver.calls("glBindBuffer"), 1);
//! # Ok::<(), glbind::Error>(())
//! ```
//!
//! [`Driver`]: ../driver/trait.Driver.html

mod glsl;

use crate::driver::{ActiveUniform, Driver, Name};
use crate::gl;
use arrayvec::ArrayVec;
use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ffi;
use vec_map::VecMap;

/// Number of vertex attribute slots per vertex array.
pub const MAX_VERTEX_ATTRIBS: usize = 16;

/// Number of texture units.
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Largest accepted texture dimension.
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// Buffer targets and their binding queries.
const BUFFER_TARGETS: [(u32, u32); 14] = [
    (gl::ARRAY_BUFFER, gl::ARRAY_BUFFER_BINDING),
    (gl::COPY_READ_BUFFER, gl::COPY_READ_BUFFER_BINDING),
    (gl::COPY_WRITE_BUFFER, gl::COPY_WRITE_BUFFER_BINDING),
    (gl::ELEMENT_ARRAY_BUFFER, gl::ELEMENT_ARRAY_BUFFER_BINDING),
    (gl::PIXEL_PACK_BUFFER, gl::PIXEL_PACK_BUFFER_BINDING),
    (gl::PIXEL_UNPACK_BUFFER, gl::PIXEL_UNPACK_BUFFER_BINDING),
    (gl::TRANSFORM_FEEDBACK_BUFFER, gl::TRANSFORM_FEEDBACK_BUFFER_BINDING),
    (gl::UNIFORM_BUFFER, gl::UNIFORM_BUFFER_BINDING),
    (gl::ATOMIC_COUNTER_BUFFER, gl::ATOMIC_COUNTER_BUFFER_BINDING),
    (gl::DISPATCH_INDIRECT_BUFFER, gl::DISPATCH_INDIRECT_BUFFER_BINDING),
    (gl::DRAW_INDIRECT_BUFFER, gl::DRAW_INDIRECT_BUFFER_BINDING),
    (gl::QUERY_BUFFER, gl::QUERY_BUFFER_BINDING),
    (gl::SHADER_STORAGE_BUFFER, gl::SHADER_STORAGE_BUFFER_BINDING),
    (gl::TEXTURE_BUFFER, gl::TEXTURE_BUFFER_BINDING),
];

/// Texture targets and their binding queries, indexed by unit slot.
const TEXTURE_TARGETS: [(u32, u32); 6] = [
    (gl::TEXTURE_1D, gl::TEXTURE_BINDING_1D),
    (gl::TEXTURE_2D, gl::TEXTURE_BINDING_2D),
    (gl::TEXTURE_3D, gl::TEXTURE_BINDING_3D),
    (gl::TEXTURE_1D_ARRAY, gl::TEXTURE_BINDING_1D_ARRAY),
    (gl::TEXTURE_2D_ARRAY, gl::TEXTURE_BINDING_2D_ARRAY),
    (gl::TEXTURE_CUBE_MAP, gl::TEXTURE_BINDING_CUBE_MAP),
];

const CUBE_FACES: [u32; 6] = [
    gl::TEXTURE_CUBE_MAP_POSITIVE_X,
    gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
    gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
    gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
    gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
    gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
];

const USAGES: [u32; 9] = [
    gl::STREAM_DRAW,
    gl::STREAM_READ,
    gl::STREAM_COPY,
    gl::STATIC_DRAW,
    gl::STATIC_READ,
    gl::STATIC_COPY,
    gl::DYNAMIC_DRAW,
    gl::DYNAMIC_READ,
    gl::DYNAMIC_COPY,
];

const ATTRIBUTE_TYPES: [u32; 10] = [
    gl::BYTE,
    gl::UNSIGNED_BYTE,
    gl::SHORT,
    gl::UNSIGNED_SHORT,
    gl::INT,
    gl::UNSIGNED_INT,
    gl::HALF_FLOAT,
    gl::FLOAT,
    gl::DOUBLE,
    gl::FIXED,
];

const PIXEL_FORMATS: [u32; 8] = [
    gl::RED,
    gl::RG,
    gl::RGB,
    gl::BGR,
    gl::RGBA,
    gl::BGRA,
    gl::DEPTH_COMPONENT,
    gl::DEPTH_STENCIL,
];

const PIXEL_TYPES: [u32; 8] = [
    gl::UNSIGNED_BYTE,
    gl::BYTE,
    gl::UNSIGNED_SHORT,
    gl::SHORT,
    gl::UNSIGNED_INT,
    gl::INT,
    gl::HALF_FLOAT,
    gl::FLOAT,
];

const COLOR_FORMATS: [u32; 17] = [
    gl::R8,
    gl::RG8,
    gl::RGB8,
    gl::RGBA8,
    gl::SRGB8,
    gl::SRGB8_ALPHA8,
    gl::R16F,
    gl::RG16F,
    gl::RGB16F,
    gl::RGBA16F,
    gl::R32F,
    gl::RG32F,
    gl::RGB32F,
    gl::RGBA32F,
    gl::R32UI,
    gl::R32I,
    gl::RGBA8UI,
];

const DEPTH_FORMATS: [u32; 5] = [
    gl::DEPTH_COMPONENT16,
    gl::DEPTH_COMPONENT24,
    gl::DEPTH_COMPONENT32F,
    gl::DEPTH24_STENCIL8,
    gl::DEPTH32F_STENCIL8,
];

const SHADER_TYPES: [u32; 6] = [
    gl::VERTEX_SHADER,
    gl::TESS_CONTROL_SHADER,
    gl::TESS_EVALUATION_SHADER,
    gl::GEOMETRY_SHADER,
    gl::FRAGMENT_SHADER,
    gl::COMPUTE_SHADER,
];

fn texture_slot(target: u32) -> Option<usize> {
    TEXTURE_TARGETS.iter().position(|&(t, _)| t == target)
}

fn bool_param(value: bool) -> i32 {
    if value {
        gl::TRUE as i32
    } else {
        gl::FALSE as i32
    }
}

fn log_length(log: &str) -> i32 {
    if log.is_empty() {
        0
    } else {
        log.len() as i32 + 1
    }
}

fn stage_label(ty: u32) -> &'static str {
    match ty {
        gl::VERTEX_SHADER => "vertex",
        gl::TESS_CONTROL_SHADER => "tessellation control",
        gl::TESS_EVALUATION_SHADER => "tessellation evaluation",
        gl::GEOMETRY_SHADER => "geometry",
        gl::FRAGMENT_SHADER => "fragment",
        _ => "compute",
    }
}

/// Texture parameters the driver accepts, with their initial values.
fn parameter_default(pname: u32) -> Option<&'static [f32]> {
    const NEAREST_MIPMAP_LINEAR: f32 = gl::NEAREST_MIPMAP_LINEAR as f32;
    const LINEAR: f32 = gl::LINEAR as f32;
    const REPEAT: f32 = gl::REPEAT as f32;
    const NONE: f32 = gl::NONE as f32;
    const LEQUAL: f32 = gl::LEQUAL as f32;
    const SWIZZLE: [f32; 4] = [gl::RED as f32, gl::GREEN as f32, gl::BLUE as f32, gl::ALPHA as f32];

    let value: &'static [f32] = match pname {
        gl::TEXTURE_MIN_FILTER => &[NEAREST_MIPMAP_LINEAR],
        gl::TEXTURE_MAG_FILTER => &[LINEAR],
        gl::TEXTURE_WRAP_S | gl::TEXTURE_WRAP_T | gl::TEXTURE_WRAP_R => &[REPEAT],
        gl::TEXTURE_BASE_LEVEL | gl::TEXTURE_LOD_BIAS => &[0.0],
        gl::TEXTURE_MAX_LEVEL => &[1000.0],
        gl::TEXTURE_MIN_LOD => &[-1000.0],
        gl::TEXTURE_MAX_LOD => &[1000.0],
        gl::TEXTURE_COMPARE_MODE => &[NONE],
        gl::TEXTURE_COMPARE_FUNC => &[LEQUAL],
        gl::TEXTURE_BORDER_COLOR => &[0.0; 4],
        gl::TEXTURE_SWIZZLE_RGBA => &SWIZZLE,
        _ => return None,
    };
    Some(value)
}

/// Returns the error a texture parameter assignment produces, if any.
fn parameter_error(pname: u32, values: &[f32], vector: bool) -> Option<u32> {
    let is = |allowed: &[u32]| allowed.iter().any(|&e| e as f32 == values[0]);
    let valid = match pname {
        gl::TEXTURE_BORDER_COLOR | gl::TEXTURE_SWIZZLE_RGBA if !vector => return Some(gl::INVALID_ENUM),
        gl::TEXTURE_BORDER_COLOR | gl::TEXTURE_SWIZZLE_RGBA if values.len() < 4 => {
            return Some(gl::INVALID_VALUE);
        }
        _ if values.is_empty() => return Some(gl::INVALID_VALUE),
        gl::TEXTURE_MIN_FILTER => is(&[
            gl::NEAREST,
            gl::LINEAR,
            gl::NEAREST_MIPMAP_NEAREST,
            gl::LINEAR_MIPMAP_NEAREST,
            gl::NEAREST_MIPMAP_LINEAR,
            gl::LINEAR_MIPMAP_LINEAR,
        ]),
        gl::TEXTURE_MAG_FILTER => is(&[gl::NEAREST, gl::LINEAR]),
        gl::TEXTURE_WRAP_S | gl::TEXTURE_WRAP_T | gl::TEXTURE_WRAP_R => is(&[
            gl::REPEAT,
            gl::MIRRORED_REPEAT,
            gl::CLAMP_TO_EDGE,
            gl::CLAMP_TO_BORDER,
            gl::MIRROR_CLAMP_TO_EDGE,
        ]),
        gl::TEXTURE_COMPARE_MODE => is(&[gl::NONE, gl::COMPARE_REF_TO_TEXTURE]),
        gl::TEXTURE_COMPARE_FUNC => is(&[
            gl::NEVER,
            gl::LESS,
            gl::EQUAL,
            gl::LEQUAL,
            gl::GREATER,
            gl::NOTEQUAL,
            gl::GEQUAL,
            gl::ALWAYS,
        ]),
        gl::TEXTURE_BASE_LEVEL | gl::TEXTURE_MAX_LEVEL => {
            if values[0] < 0.0 {
                return Some(gl::INVALID_VALUE);
            }
            true
        }
        gl::TEXTURE_SWIZZLE_RGBA => values[..4].iter().all(|&v| {
            [gl::RED, gl::GREEN, gl::BLUE, gl::ALPHA, gl::ZERO, gl::ONE]
                .iter()
                .any(|&e| e as f32 == v)
        }),
        _ => parameter_default(pname).is_some(),
    };
    if valid {
        None
    } else {
        Some(gl::INVALID_ENUM)
    }
}

struct BufferObject {
    data: Vec<u8>,
    usage: u32,
    mapped: Option<u32>,
}

impl Default for BufferObject {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            usage: gl::STATIC_DRAW,
            mapped: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Attribute {
    enabled: bool,
    buffer: Name,
    size: i32,
    ty: u32,
    normalized: bool,
    stride: i32,
    offset: usize,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer: 0,
            size: 4,
            ty: gl::FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

struct VertexArrayObject {
    element_buffer: Name,
    attributes: ArrayVec<Attribute, MAX_VERTEX_ATTRIBS>,
}

impl VertexArrayObject {
    fn new() -> Self {
        Self {
            element_buffer: 0,
            attributes: (0..MAX_VERTEX_ATTRIBS).map(|_| Attribute::default()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Level {
    width: u32,
    height: u32,
    depth: u32,
    internal_format: u32,
}

#[derive(Default)]
struct TextureObject {
    target: Option<u32>,

    /// Keyed by (image target, level); cube faces are stored separately.
    levels: BTreeMap<(u32, i32), Level>,

    params: HashMap<u32, Vec<f32>>,
}

#[derive(Clone, Copy, Default)]
struct Unit {
    bound: [Name; 6],
}

struct ShaderObject {
    ty: u32,
    source: String,
    compiled: bool,
    log: String,
    uniforms: Vec<glsl::Uniform>,
    flagged: bool,
}

#[derive(Clone, Debug)]
struct LinkedUniform {
    /// Reported name; arrays carry an `[0]` suffix.
    name: String,
    base: String,
    array: bool,
    size: i32,
    ty: u32,
    location: i32,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<Name>,
    linked: bool,
    validated: bool,
    log: String,
    uniforms: Vec<LinkedUniform>,
    flagged: bool,
}

/// Links compiled shader stages, returning the active uniforms.
fn link(shaders: &[(Name, &ShaderObject)]) -> Result<Vec<LinkedUniform>, String> {
    if shaders.is_empty() {
        return Err("error: no shaders attached".to_string());
    }
    if let Some(&(name, shader)) = shaders.iter().find(|(_, shader)| !shader.compiled) {
        return Err(format!(
            "error: {} shader {} is not compiled",
            stage_label(shader.ty),
            name,
        ));
    }
    let has = |ty: u32| shaders.iter().any(|(_, shader)| shader.ty == ty);
    if has(gl::COMPUTE_SHADER) {
        if shaders.iter().any(|(_, shader)| shader.ty != gl::COMPUTE_SHADER) {
            return Err("error: compute shaders cannot be linked with other stages".to_string());
        }
    } else if !has(gl::VERTEX_SHADER) {
        return Err("error: program lacks a vertex shader".to_string());
    } else if !has(gl::FRAGMENT_SHADER) {
        return Err("error: program lacks a fragment shader".to_string());
    }

    let mut ordered: Vec<&ShaderObject> = shaders.iter().map(|&(_, shader)| shader).collect();
    ordered.sort_by_key(|shader| SHADER_TYPES.iter().position(|&ty| ty == shader.ty));

    let mut merged: Vec<glsl::Uniform> = Vec::new();
    for uniform in ordered.iter().flat_map(|shader| shader.uniforms.iter()) {
        match merged.iter_mut().find(|u| u.name == uniform.name) {
            Some(existing) => {
                if existing.ty != uniform.ty || existing.size != uniform.size {
                    return Err(format!(
                        "error: uniform `{}` has conflicting declarations",
                        uniform.name,
                    ));
                }
                existing.active |= uniform.active;
            }
            None => merged.push(uniform.clone()),
        }
    }

    let mut location = 0;
    let mut uniforms = Vec::new();
    for uniform in merged.into_iter().filter(|u| u.active) {
        let name = if uniform.array {
            format!("{}[0]", uniform.name)
        } else {
            uniform.name.clone()
        };
        uniforms.push(LinkedUniform {
            name,
            base: uniform.name,
            array: uniform.array,
            size: uniform.size,
            ty: uniform.ty,
            location,
        });
        location += uniform.size;
    }
    Ok(uniforms)
}

struct State {
    errors: VecDeque<u32>,

    next_buffer: Name,
    next_vertex_array: Name,
    next_texture: Name,
    /// Shaders and programs share one namespace.
    next_object: Name,

    buffers: VecMap<BufferObject>,
    buffer_bindings: HashMap<u32, Name>,

    /// Entry 0 holds the state used while no vertex array is bound.
    vertex_arrays: VecMap<VertexArrayObject>,
    vertex_array: Name,

    textures: VecMap<TextureObject>,
    units: ArrayVec<Unit, MAX_TEXTURE_UNITS>,
    active_unit: usize,

    shaders: VecMap<ShaderObject>,
    programs: VecMap<ProgramObject>,
    program: Name,
}

impl State {
    fn new() -> Self {
        let mut vertex_arrays = VecMap::new();
        vertex_arrays.insert(0, VertexArrayObject::new());
        Self {
            errors: VecDeque::new(),
            next_buffer: 1,
            next_vertex_array: 1,
            next_texture: 1,
            next_object: 1,
            buffers: VecMap::new(),
            buffer_bindings: HashMap::new(),
            vertex_arrays,
            vertex_array: 0,
            textures: VecMap::new(),
            units: (0..MAX_TEXTURE_UNITS).map(|_| Unit::default()).collect(),
            active_unit: 0,
            shaders: VecMap::new(),
            programs: VecMap::new(),
            program: 0,
        }
    }

    /// Records an error flag and yields a placeholder result.
    fn fail<T: Default>(&mut self, code: u32) -> T {
        // Each flag is recorded once until it is polled.
        if !self.errors.contains(&code) {
            self.errors.push_back(code);
        }
        T::default()
    }

    fn current_vertex_array(&mut self) -> &mut VertexArrayObject {
        let name = self.vertex_array as usize;
        if !self.vertex_arrays.contains_key(name) {
            self.vertex_arrays.insert(name, VertexArrayObject::new());
        }
        &mut self.vertex_arrays[name]
    }

    fn buffer_binding(&mut self, target: u32) -> Option<Name> {
        if !BUFFER_TARGETS.iter().any(|&(t, _)| t == target) {
            None
        } else if target == gl::ELEMENT_ARRAY_BUFFER {
            Some(self.current_vertex_array().element_buffer)
        } else {
            Some(self.buffer_bindings.get(&target).cloned().unwrap_or(0))
        }
    }

    fn bound_buffer(&mut self, target: u32) -> Result<&mut BufferObject, u32> {
        match self.buffer_binding(target) {
            None => Err(gl::INVALID_ENUM),
            Some(0) => Err(gl::INVALID_OPERATION),
            Some(name) => self.buffers.get_mut(name as usize).ok_or(gl::INVALID_OPERATION),
        }
    }

    fn attribute_mut(&mut self, index: u32) -> Result<&mut Attribute, u32> {
        if index as usize >= MAX_VERTEX_ATTRIBS {
            Err(gl::INVALID_VALUE)
        } else if self.vertex_array == 0 {
            Err(gl::INVALID_OPERATION)
        } else {
            Ok(&mut self.current_vertex_array().attributes[index as usize])
        }
    }

    fn bound_texture(&mut self, target: u32) -> Result<&mut TextureObject, u32> {
        let slot = texture_slot(target).ok_or(gl::INVALID_ENUM)?;
        let name = self.units[self.active_unit].bound[slot];
        if name == 0 {
            return Err(gl::INVALID_OPERATION);
        }
        self.textures.get_mut(name as usize).ok_or(gl::INVALID_OPERATION)
    }

    fn shader_mut(&mut self, id: Name) -> Result<&mut ShaderObject, u32> {
        if self.programs.contains_key(id as usize) {
            return Err(gl::INVALID_OPERATION);
        }
        self.shaders.get_mut(id as usize).ok_or(gl::INVALID_VALUE)
    }

    fn program_mut(&mut self, id: Name) -> Result<&mut ProgramObject, u32> {
        if self.shaders.contains_key(id as usize) {
            return Err(gl::INVALID_OPERATION);
        }
        self.programs.get_mut(id as usize).ok_or(gl::INVALID_VALUE)
    }

    fn is_attached(&self, shader: Name) -> bool {
        self.programs.values().any(|program| program.attached.contains(&shader))
    }

    /// Deletes a shader flagged for deletion once nothing references it.
    fn release_shader(&mut self, shader: Name) {
        let flagged = self.shaders.get(shader as usize).map_or(false, |s| s.flagged);
        if flagged && !self.is_attached(shader) {
            self.shaders.remove(shader as usize);
        }
    }

    /// Deletes a program flagged for deletion once it is no longer current.
    fn release_program(&mut self, program: Name) {
        let flagged = self.programs.get(program as usize).map_or(false, |p| p.flagged);
        if flagged && self.program != program {
            if let Some(removed) = self.programs.remove(program as usize) {
                for shader in removed.attached {
                    self.release_shader(shader);
                }
            }
        }
    }

    fn image(
        &mut self,
        targets: &[u32],
        target: u32,
        level: i32,
        internal_format: u32,
        (width, height, depth): (u32, u32, u32),
        format: u32,
        ty: u32,
    ) {
        if !targets.contains(&target) {
            return self.fail(gl::INVALID_ENUM);
        }
        if !PIXEL_FORMATS.contains(&format) || !PIXEL_TYPES.contains(&ty) {
            return self.fail(gl::INVALID_ENUM);
        }
        let face = CUBE_FACES.contains(&target);
        if level < 0
            || width > MAX_TEXTURE_SIZE
            || height > MAX_TEXTURE_SIZE
            || depth > MAX_TEXTURE_SIZE
            || (face && width != height)
        {
            return self.fail(gl::INVALID_VALUE);
        }
        let depth_format = DEPTH_FORMATS.contains(&internal_format);
        if !depth_format && !COLOR_FORMATS.contains(&internal_format) {
            return self.fail(gl::INVALID_VALUE);
        }
        let depth_data = format == gl::DEPTH_COMPONENT || format == gl::DEPTH_STENCIL;
        if depth_format != depth_data {
            return self.fail(gl::INVALID_OPERATION);
        }
        let bind_target = if face { gl::TEXTURE_CUBE_MAP } else { target };
        let level_info = Level { width, height, depth, internal_format };
        match self.bound_texture(bind_target) {
            Ok(texture) => {
                texture.levels.insert((target, level), level_info);
            }
            Err(code) => self.fail(code),
        }
    }

    fn parameter(&mut self, target: u32, pname: u32, values: Vec<f32>, vector: bool) {
        if let Some(code) = parameter_error(pname, &values, vector) {
            return self.fail(code);
        }
        match self.bound_texture(target) {
            Ok(texture) => {
                texture.params.insert(pname, values);
            }
            Err(code) => self.fail(code),
        }
    }
}

/// An in-memory implementation of [`Driver`].
///
/// [`Driver`]: ../driver/trait.Driver.html
pub struct SoftDriver {
    state: RefCell<State>,
    calls: RefCell<HashMap<&'static str, usize>>,
    faults: RefCell<HashMap<&'static str, u32>>,
}

impl Default for SoftDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftDriver {
    /// Creates a driver with no objects and an empty error queue.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::new()),
            calls: RefCell::new(HashMap::new()),
            faults: RefCell::new(HashMap::new()),
        }
    }

    /// Makes the next call to the named entry point record `code`, in
    /// addition to whatever the call itself does.
    ///
    /// ```
    /// use glbind::buffer::ArrayBuffer;
    /// use glbind::soft::SoftDriver;
    /// use glbind::{gl, Config, Context, Error};
    /// use std::rc::Rc;
    ///
    /// let driver = Rc::new(SoftDriver::new());
    /// let ctx = Context::new(driver.clone(), Config::default());
    /// driver.fail_next("glGenBuffers", gl::OUT_OF_MEMORY);
    /// match ArrayBuffer::new(&ctx) {
    ///     Err(Error::Allocation { .. }) => {}
    ///     other => panic!("unexpected {:?}", other),
    /// }
    /// assert_eq!(driver.live_objects(), 0);
    /// ```
    pub fn fail_next(&self, call: &'static str, code: u32) {
        self.faults.borrow_mut().insert(call, code);
    }

    /// Returns how many times the named entry point was called, e.g.
    /// `calls("glBindBuffer")`.
    pub fn calls(&self, call: &str) -> usize {
        self.calls.borrow().get(call).cloned().unwrap_or(0)
    }

    /// Forgets all recorded calls.
    pub fn reset_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Returns the number of live objects of every family.
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.buffers.len()
            + (state.vertex_arrays.len() - 1)
            + state.textures.len()
            + state.shaders.len()
            + state.programs.len()
    }

    /// Returns the number of mipmap levels with an image in a texture.
    pub fn texture_level_count(&self, texture: Name) -> usize {
        let state = self.state.borrow();
        let mut levels: Vec<i32> = state
            .textures
            .get(texture as usize)
            .map(|texture| texture.levels.keys().map(|&(_, level)| level).collect())
            .unwrap_or_default();
        levels.sort_unstable();
        levels.dedup();
        levels.len()
    }

    fn record(&self, call: &'static str) -> RefMut<State> {
        trace!(target: "gl", "{} (soft)", call);
        *self.calls.borrow_mut().entry(call).or_insert(0) += 1;
        let mut state = self.state.borrow_mut();
        if let Some(code) = self.faults.borrow_mut().remove(call) {
            state.fail::<()>(code);
        }
        state
    }
}

impl Driver for SoftDriver {
    // Error queue and state queries

    fn get_error(&self) -> u32 {
        let mut state = self.record("glGetError");
        state.errors.pop_front().unwrap_or(gl::NO_ERROR)
    }

    fn get_integer(&self, pname: u32) -> i32 {
        let mut state = self.record("glGetIntegerv");
        if let Some(&(target, _)) = BUFFER_TARGETS.iter().find(|&&(_, binding)| binding == pname) {
            return state.buffer_binding(target).unwrap_or(0) as i32;
        }
        if let Some(slot) = TEXTURE_TARGETS.iter().position(|&(_, binding)| binding == pname) {
            return state.units[state.active_unit].bound[slot] as i32;
        }
        match pname {
            gl::VERTEX_ARRAY_BINDING => state.vertex_array as i32,
            gl::CURRENT_PROGRAM => state.program as i32,
            gl::ACTIVE_TEXTURE => (gl::TEXTURE0 + state.active_unit as u32) as i32,
            gl::MAX_VERTEX_ATTRIBS => MAX_VERTEX_ATTRIBS as i32,
            gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS => MAX_TEXTURE_UNITS as i32,
            gl::MAX_TEXTURE_SIZE => MAX_TEXTURE_SIZE as i32,
            gl::UNPACK_ALIGNMENT | gl::PACK_ALIGNMENT => 4,
            _ => state.fail(gl::INVALID_ENUM),
        }
    }

    // Buffer operations

    fn gen_buffer(&self) -> Name {
        let mut state = self.record("glGenBuffers");
        let name = state.next_buffer;
        state.next_buffer += 1;
        state.buffers.insert(name as usize, BufferObject::default());
        name
    }

    unsafe fn delete_buffer(&self, id: Name) {
        let mut state = self.record("glDeleteBuffers");
        if id == 0 || state.buffers.remove(id as usize).is_none() {
            return;
        }
        state.buffer_bindings.retain(|_, bound| *bound != id);
        let vertex_array = state.current_vertex_array();
        if vertex_array.element_buffer == id {
            vertex_array.element_buffer = 0;
        }
        for attribute in vertex_array.attributes.iter_mut().filter(|a| a.buffer == id) {
            attribute.buffer = 0;
        }
    }

    fn bind_buffer(&self, target: u32, id: Name) {
        let mut state = self.record("glBindBuffer");
        if state.buffer_binding(target).is_none() {
            return state.fail(gl::INVALID_ENUM);
        }
        if id != 0 && !state.buffers.contains_key(id as usize) {
            return state.fail(gl::INVALID_OPERATION);
        }
        if target == gl::ELEMENT_ARRAY_BUFFER {
            state.current_vertex_array().element_buffer = id;
        } else {
            state.buffer_bindings.insert(target, id);
        }
    }

    unsafe fn buffer_data(&self, target: u32, size: usize, data: Option<&[u8]>, usage: u32) {
        let mut state = self.record("glBufferData");
        if !USAGES.contains(&usage) {
            return state.fail(gl::INVALID_ENUM);
        }
        let buffer = match state.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(code) => return state.fail(code),
        };
        // Respecifying the store implicitly unmaps it.
        buffer.mapped = None;
        buffer.usage = usage;
        buffer.data = match data {
            Some(bytes) => {
                let mut store = bytes[..bytes.len().min(size)].to_vec();
                store.resize(size, 0);
                store
            }
            None => vec![0; size],
        };
    }

    fn buffer_sub_data(&self, target: u32, offset: usize, data: &[u8]) {
        let mut state = self.record("glBufferSubData");
        let buffer = match state.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(code) => return state.fail(code),
        };
        let end = match offset.checked_add(data.len()) {
            Some(end) if end <= buffer.data.len() => end,
            _ => return state.fail(gl::INVALID_VALUE),
        };
        if buffer.mapped.is_some() {
            return state.fail(gl::INVALID_OPERATION);
        }
        buffer.data[offset..end].copy_from_slice(data);
    }

    fn get_buffer_sub_data(&self, target: u32, offset: usize, data: &mut [u8]) {
        let mut state = self.record("glGetBufferSubData");
        let buffer = match state.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(code) => return state.fail(code),
        };
        let end = match offset.checked_add(data.len()) {
            Some(end) if end <= buffer.data.len() => end,
            _ => return state.fail(gl::INVALID_VALUE),
        };
        if buffer.mapped.is_some() {
            return state.fail(gl::INVALID_OPERATION);
        }
        data.copy_from_slice(&buffer.data[offset..end]);
    }

    unsafe fn map_buffer(&self, target: u32, access: u32) -> *mut u8 {
        let mut state = self.record("glMapBuffer");
        if ![gl::READ_ONLY, gl::WRITE_ONLY, gl::READ_WRITE].contains(&access) {
            state.fail::<()>(gl::INVALID_ENUM);
            return std::ptr::null_mut();
        }
        let buffer = match state.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(code) => {
                state.fail::<()>(code);
                return std::ptr::null_mut();
            }
        };
        if buffer.mapped.is_some() || buffer.data.is_empty() {
            state.fail::<()>(gl::INVALID_OPERATION);
            return std::ptr::null_mut();
        }
        buffer.mapped = Some(access);
        buffer.data.as_mut_ptr()
    }

    unsafe fn unmap_buffer(&self, target: u32) -> bool {
        let mut state = self.record("glUnmapBuffer");
        let buffer = match state.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(code) => return state.fail(code),
        };
        if buffer.mapped.take().is_none() {
            return state.fail(gl::INVALID_OPERATION);
        }
        true
    }

    fn get_buffer_parameter(&self, target: u32, pname: u32) -> i64 {
        let mut state = self.record("glGetBufferParameteri64v");
        let buffer = match state.bound_buffer(target) {
            Ok(buffer) => buffer,
            Err(code) => return state.fail(code),
        };
        match pname {
            gl::BUFFER_SIZE => buffer.data.len() as i64,
            gl::BUFFER_USAGE => buffer.usage as i64,
            gl::BUFFER_MAPPED => bool_param(buffer.mapped.is_some()) as i64,
            gl::BUFFER_ACCESS => buffer.mapped.unwrap_or(gl::READ_WRITE) as i64,
            _ => state.fail(gl::INVALID_ENUM),
        }
    }

    // Vertex array operations

    fn gen_vertex_array(&self) -> Name {
        let mut state = self.record("glGenVertexArrays");
        let name = state.next_vertex_array;
        state.next_vertex_array += 1;
        state.vertex_arrays.insert(name as usize, VertexArrayObject::new());
        name
    }

    fn delete_vertex_array(&self, id: Name) {
        let mut state = self.record("glDeleteVertexArrays");
        if id == 0 || state.vertex_arrays.remove(id as usize).is_none() {
            return;
        }
        if state.vertex_array == id {
            state.vertex_array = 0;
        }
    }

    fn bind_vertex_array(&self, id: Name) {
        let mut state = self.record("glBindVertexArray");
        if !state.vertex_arrays.contains_key(id as usize) {
            return state.fail(gl::INVALID_OPERATION);
        }
        state.vertex_array = id;
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.record("glEnableVertexAttribArray");
        match state.attribute_mut(index) {
            Ok(attribute) => attribute.enabled = true,
            Err(code) => state.fail(code),
        }
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.record("glDisableVertexAttribArray");
        match state.attribute_mut(index) {
            Ok(attribute) => attribute.enabled = false,
            Err(code) => state.fail(code),
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
        let mut state = self.record("glVertexAttribPointer");
        if index as usize >= MAX_VERTEX_ATTRIBS || !(1..=4).contains(&size) || stride < 0 {
            return state.fail(gl::INVALID_VALUE);
        }
        if !ATTRIBUTE_TYPES.contains(&ty) {
            return state.fail(gl::INVALID_ENUM);
        }
        let buffer = state.buffer_bindings.get(&gl::ARRAY_BUFFER).cloned().unwrap_or(0);
        if buffer == 0 && offset != 0 {
            return state.fail(gl::INVALID_OPERATION);
        }
        match state.attribute_mut(index) {
            Ok(attribute) => {
                let enabled = attribute.enabled;
                *attribute = Attribute { enabled, buffer, size, ty, normalized, stride, offset };
            }
            Err(code) => state.fail(code),
        }
    }

    fn get_vertex_attrib(&self, index: u32, pname: u32) -> i32 {
        let mut state = self.record("glGetVertexAttribiv");
        if index as usize >= MAX_VERTEX_ATTRIBS {
            return state.fail(gl::INVALID_VALUE);
        }
        let attribute = state.current_vertex_array().attributes[index as usize];
        match pname {
            gl::VERTEX_ATTRIB_ARRAY_ENABLED => bool_param(attribute.enabled),
            gl::VERTEX_ATTRIB_ARRAY_SIZE => attribute.size,
            gl::VERTEX_ATTRIB_ARRAY_STRIDE => attribute.stride,
            gl::VERTEX_ATTRIB_ARRAY_TYPE => attribute.ty as i32,
            gl::VERTEX_ATTRIB_ARRAY_NORMALIZED => bool_param(attribute.normalized),
            gl::VERTEX_ATTRIB_ARRAY_BUFFER_BINDING => attribute.buffer as i32,
            _ => state.fail(gl::INVALID_ENUM),
        }
    }

    // Texture operations

    fn gen_texture(&self) -> Name {
        let mut state = self.record("glGenTextures");
        let name = state.next_texture;
        state.next_texture += 1;
        state.textures.insert(name as usize, TextureObject::default());
        name
    }

    fn delete_texture(&self, id: Name) {
        let mut state = self.record("glDeleteTextures");
        if id == 0 || state.textures.remove(id as usize).is_none() {
            return;
        }
        for unit in state.units.iter_mut() {
            for bound in unit.bound.iter_mut().filter(|bound| **bound == id) {
                *bound = 0;
            }
        }
    }

    fn bind_texture(&self, target: u32, id: Name) {
        let mut state = self.record("glBindTexture");
        let slot = match texture_slot(target) {
            Some(slot) => slot,
            None => return state.fail(gl::INVALID_ENUM),
        };
        if id != 0 {
            let texture = match state.textures.get_mut(id as usize) {
                Some(texture) => texture,
                None => return state.fail(gl::INVALID_OPERATION),
            };
            match texture.target {
                Some(existing) if existing != target => return state.fail(gl::INVALID_OPERATION),
                _ => texture.target = Some(target),
            }
        }
        let unit = state.active_unit;
        state.units[unit].bound[slot] = id;
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.record("glActiveTexture");
        if unit as usize >= MAX_TEXTURE_UNITS {
            return state.fail(gl::INVALID_ENUM);
        }
        state.active_unit = unit as usize;
    }

    fn tex_image_1d(
        &self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        format: u32,
        ty: u32,
        _data: Option<&[u8]>,
    ) {
        let mut state = self.record("glTexImage1D");
        state.image(&[gl::TEXTURE_1D], target, level, internal_format, (width, 1, 1), format, ty);
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
        _data: Option<&[u8]>,
    ) {
        let mut state = self.record("glTexImage2D");
        let mut targets = vec![gl::TEXTURE_2D, gl::TEXTURE_1D_ARRAY];
        targets.extend_from_slice(&CUBE_FACES);
        state.image(&targets, target, level, internal_format, (width, height, 1), format, ty);
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
        _data: Option<&[u8]>,
    ) {
        let mut state = self.record("glTexImage3D");
        let targets = [gl::TEXTURE_3D, gl::TEXTURE_2D_ARRAY];
        state.image(&targets, target, level, internal_format, (width, height, depth), format, ty);
    }

    fn tex_parameter_i(&self, target: u32, pname: u32, param: i32) {
        let mut state = self.record("glTexParameteri");
        state.parameter(target, pname, vec![param as f32], false);
    }

    fn tex_parameter_f(&self, target: u32, pname: u32, param: f32) {
        let mut state = self.record("glTexParameterf");
        state.parameter(target, pname, vec![param], false);
    }

    fn tex_parameter_iv(&self, target: u32, pname: u32, params: &[i32]) {
        let mut state = self.record("glTexParameteriv");
        state.parameter(target, pname, params.iter().map(|&p| p as f32).collect(), true);
    }

    fn tex_parameter_fv(&self, target: u32, pname: u32, params: &[f32]) {
        let mut state = self.record("glTexParameterfv");
        state.parameter(target, pname, params.to_vec(), true);
    }

    fn get_tex_parameter_i(&self, target: u32, pname: u32) -> i32 {
        let mut state = self.record("glGetTexParameteriv");
        let default = match parameter_default(pname) {
            Some(default) => default,
            None => return state.fail(gl::INVALID_ENUM),
        };
        match state.bound_texture(target) {
            Ok(texture) => texture
                .params
                .get(&pname)
                .map_or(default[0], |values| values[0])
                .round() as i32,
            Err(code) => state.fail(code),
        }
    }

    fn generate_texture_mipmap(&self, id: Name) {
        let mut state = self.record("glGenerateTextureMipmap");
        let texture = match state.textures.get_mut(id as usize) {
            Some(texture) if texture.target.is_some() => texture,
            _ => return state.fail(gl::INVALID_OPERATION),
        };
        let layered_height = texture.target == Some(gl::TEXTURE_1D_ARRAY);
        let layered_depth = texture.target != Some(gl::TEXTURE_3D);
        let bases: Vec<(u32, Level)> = texture
            .levels
            .iter()
            .filter(|&(&(_, level), _)| level == 0)
            .map(|(&(target, _), &base)| (target, base))
            .collect();
        if bases.is_empty() {
            return state.fail(gl::INVALID_OPERATION);
        }
        for (target, base) in bases {
            let mut current = base;
            let mut level = 0;
            let shrink = |n: u32| (n / 2).max(1);
            while current.width > 1
                || (!layered_height && current.height > 1)
                || (!layered_depth && current.depth > 1)
            {
                level += 1;
                current = Level {
                    width: shrink(current.width),
                    height: if layered_height { current.height } else { shrink(current.height) },
                    depth: if layered_depth { current.depth } else { shrink(current.depth) },
                    internal_format: base.internal_format,
                };
                texture.levels.insert((target, level), current);
            }
        }
    }

    // Shader operations

    fn create_shader(&self, ty: u32) -> Name {
        let mut state = self.record("glCreateShader");
        if !SHADER_TYPES.contains(&ty) {
            return state.fail(gl::INVALID_ENUM);
        }
        let name = state.next_object;
        state.next_object += 1;
        state.shaders.insert(
            name as usize,
            ShaderObject {
                ty,
                source: String::new(),
                compiled: false,
                log: String::new(),
                uniforms: Vec::new(),
                flagged: false,
            },
        );
        name
    }

    fn delete_shader(&self, id: Name) {
        let mut state = self.record("glDeleteShader");
        if id == 0 {
            return;
        }
        match state.shader_mut(id) {
            Ok(shader) => shader.flagged = true,
            Err(code) => return state.fail(code),
        }
        state.release_shader(id);
    }

    fn shader_source(&self, id: Name, source: &ffi::CStr) {
        let mut state = self.record("glShaderSource");
        match state.shader_mut(id) {
            Ok(shader) => shader.source = source.to_string_lossy().into_owned(),
            Err(code) => state.fail(code),
        }
    }

    fn compile_shader(&self, id: Name) {
        let mut state = self.record("glCompileShader");
        let shader = match state.shader_mut(id) {
            Ok(shader) => shader,
            Err(code) => return state.fail(code),
        };
        match glsl::compile(&shader.source) {
            Ok(uniforms) => {
                shader.compiled = true;
                shader.log.clear();
                shader.uniforms = uniforms;
            }
            Err(diagnostic) => {
                shader.compiled = false;
                shader.log = format!("{}\n", diagnostic);
                shader.uniforms.clear();
            }
        }
    }

    fn get_shader(&self, id: Name, pname: u32) -> i32 {
        let mut state = self.record("glGetShaderiv");
        let shader = match state.shader_mut(id) {
            Ok(shader) => shader,
            Err(code) => return state.fail(code),
        };
        match pname {
            gl::SHADER_TYPE => shader.ty as i32,
            gl::DELETE_STATUS => bool_param(shader.flagged),
            gl::COMPILE_STATUS => bool_param(shader.compiled),
            gl::INFO_LOG_LENGTH => log_length(&shader.log),
            gl::SHADER_SOURCE_LENGTH => log_length(&shader.source),
            _ => state.fail(gl::INVALID_ENUM),
        }
    }

    fn get_shader_info_log(&self, id: Name) -> String {
        let mut state = self.record("glGetShaderInfoLog");
        match state.shader_mut(id) {
            Ok(shader) => shader.log.clone(),
            Err(code) => state.fail(code),
        }
    }

    // Program operations

    fn create_program(&self) -> Name {
        let mut state = self.record("glCreateProgram");
        let name = state.next_object;
        state.next_object += 1;
        state.programs.insert(name as usize, ProgramObject::default());
        name
    }

    fn delete_program(&self, id: Name) {
        let mut state = self.record("glDeleteProgram");
        if id == 0 {
            return;
        }
        match state.program_mut(id) {
            Ok(program) => program.flagged = true,
            Err(code) => return state.fail(code),
        }
        state.release_program(id);
    }

    fn attach_shader(&self, program: Name, shader: Name) {
        let mut state = self.record("glAttachShader");
        if let Err(code) = state.shader_mut(shader) {
            return state.fail(code);
        }
        let program = match state.program_mut(program) {
            Ok(program) => program,
            Err(code) => return state.fail(code),
        };
        if program.attached.contains(&shader) {
            return state.fail(gl::INVALID_OPERATION);
        }
        program.attached.push(shader);
    }

    fn detach_shader(&self, program: Name, shader: Name) {
        let mut state = self.record("glDetachShader");
        if let Err(code) = state.shader_mut(shader) {
            return state.fail(code);
        }
        let program = match state.program_mut(program) {
            Ok(program) => program,
            Err(code) => return state.fail(code),
        };
        match program.attached.iter().position(|&attached| attached == shader) {
            Some(position) => {
                program.attached.remove(position);
            }
            None => return state.fail(gl::INVALID_OPERATION),
        }
        state.release_shader(shader);
    }

    fn link_program(&self, id: Name) {
        let mut state = self.record("glLinkProgram");
        let attached = match state.program_mut(id) {
            Ok(program) => program.attached.clone(),
            Err(code) => return state.fail(code),
        };
        let result = {
            let shaders: Vec<(Name, &ShaderObject)> = attached
                .iter()
                .filter_map(|&name| state.shaders.get(name as usize).map(|shader| (name, shader)))
                .collect();
            link(&shaders)
        };
        if let Ok(program) = state.program_mut(id) {
            program.validated = false;
            match result {
                Ok(uniforms) => {
                    program.linked = true;
                    program.log.clear();
                    program.uniforms = uniforms;
                }
                Err(message) => {
                    program.linked = false;
                    program.log = format!("{}\n", message);
                    program.uniforms.clear();
                }
            }
        }
    }

    fn validate_program(&self, id: Name) {
        let mut state = self.record("glValidateProgram");
        match state.program_mut(id) {
            Ok(program) => {
                program.validated = program.linked;
                if !program.linked {
                    program.log.push_str("error: program is not successfully linked\n");
                }
            }
            Err(code) => state.fail(code),
        }
    }

    fn get_program(&self, id: Name, pname: u32) -> i32 {
        let mut state = self.record("glGetProgramiv");
        let program = match state.program_mut(id) {
            Ok(program) => program,
            Err(code) => return state.fail(code),
        };
        match pname {
            gl::LINK_STATUS => bool_param(program.linked),
            gl::VALIDATE_STATUS => bool_param(program.validated),
            gl::DELETE_STATUS => bool_param(program.flagged),
            gl::INFO_LOG_LENGTH => log_length(&program.log),
            gl::ATTACHED_SHADERS => program.attached.len() as i32,
            gl::ACTIVE_UNIFORMS => program.uniforms.len() as i32,
            gl::ACTIVE_UNIFORM_MAX_LENGTH => program
                .uniforms
                .iter()
                .map(|uniform| uniform.name.len() as i32 + 1)
                .max()
                .unwrap_or(0),
            _ => state.fail(gl::INVALID_ENUM),
        }
    }

    fn get_program_info_log(&self, id: Name) -> String {
        let mut state = self.record("glGetProgramInfoLog");
        match state.program_mut(id) {
            Ok(program) => program.log.clone(),
            Err(code) => state.fail(code),
        }
    }

    fn get_active_uniform(&self, program: Name, index: u32) -> ActiveUniform {
        let mut state = self.record("glGetActiveUniform");
        let program = match state.program_mut(program) {
            Ok(program) => program,
            Err(code) => return state.fail(code),
        };
        match program.uniforms.get(index as usize) {
            Some(uniform) => ActiveUniform {
                name: uniform.name.clone(),
                size: uniform.size,
                ty: uniform.ty,
            },
            None => state.fail(gl::INVALID_VALUE),
        }
    }

    fn get_uniform_location(&self, program: Name, name: &ffi::CStr) -> i32 {
        let mut state = self.record("glGetUniformLocation");
        let program = match state.program_mut(program) {
            Ok(program) if program.linked => program,
            Ok(_) => {
                state.fail::<()>(gl::INVALID_OPERATION);
                return -1;
            }
            Err(code) => {
                state.fail::<()>(code);
                return -1;
            }
        };
        let name = name.to_string_lossy();
        let (base, element) = match name.strip_suffix(']').and_then(|n| n.split_once('[')) {
            Some((base, index)) => match index.parse::<i32>() {
                Ok(index) => (base, Some(index)),
                Err(_) => return -1,
            },
            None => (&name[..], None),
        };
        let uniform = match program.uniforms.iter().find(|uniform| uniform.base == base) {
            Some(uniform) => uniform,
            None => return -1,
        };
        match element {
            None => uniform.location,
            Some(index) if uniform.array && index < uniform.size => uniform.location + index,
            Some(_) => -1,
        }
    }

    fn use_program(&self, id: Name) {
        let mut state = self.record("glUseProgram");
        if id != 0 {
            match state.program_mut(id) {
                Ok(program) if program.linked => {}
                Ok(_) => return state.fail(gl::INVALID_OPERATION),
                Err(code) => return state.fail(code),
            }
        }
        let previous = state.program;
        state.program = id;
        state.release_program(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = "#version 330\nuniform mat4 mvp;\nin vec3 p;\nvoid main() { gl_Position = mvp * vec4(p, 1.0); }\n";
    const FRAGMENT: &str = "#version 330\nuniform vec4 colors[3];\nout vec4 c;\nvoid main() { c = colors[2]; }\n";

    fn shader(driver: &SoftDriver, ty: u32, source: &str) -> Name {
        let name = driver.create_shader(ty);
        let source = ffi::CString::new(source).unwrap();
        driver.shader_source(name, &source);
        driver.compile_shader(name);
        name
    }

    fn program(driver: &SoftDriver) -> Name {
        let program = driver.create_program();
        let vs = shader(driver, gl::VERTEX_SHADER, VERTEX);
        let fs = shader(driver, gl::FRAGMENT_SHADER, FRAGMENT);
        driver.attach_shader(program, vs);
        driver.attach_shader(program, fs);
        driver.link_program(program);
        program
    }

    fn location(driver: &SoftDriver, program: Name, name: &str) -> i32 {
        driver.get_uniform_location(program, &ffi::CString::new(name).unwrap())
    }

    #[test]
    fn errors_are_recorded_once_until_polled() {
        let driver = SoftDriver::new();
        driver.bind_buffer(0xdead, 0);
        driver.bind_buffer(0xbeef, 0);
        driver.bind_buffer(gl::ARRAY_BUFFER, 42);
        assert_eq!(driver.get_error(), gl::INVALID_ENUM);
        assert_eq!(driver.get_error(), gl::INVALID_OPERATION);
        assert_eq!(driver.get_error(), gl::NO_ERROR);
        assert_eq!(driver.calls("glBindBuffer"), 3);
    }

    #[test]
    fn element_array_binding_belongs_to_the_vertex_array() {
        let driver = SoftDriver::new();
        let vao = driver.gen_vertex_array();
        let ibo = driver.gen_buffer();
        driver.bind_vertex_array(vao);
        driver.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, ibo);
        driver.bind_vertex_array(0);
        assert_eq!(driver.get_integer(gl::ELEMENT_ARRAY_BUFFER_BINDING), 0);
        driver.bind_vertex_array(vao);
        assert_eq!(driver.get_integer(gl::ELEMENT_ARRAY_BUFFER_BINDING), ibo as i32);
    }

    #[test]
    fn sub_data_out_of_range_is_invalid_value() {
        let driver = SoftDriver::new();
        let buffer = driver.gen_buffer();
        driver.bind_buffer(gl::ARRAY_BUFFER, buffer);
        unsafe { driver.buffer_data(gl::ARRAY_BUFFER, 4, None, gl::STATIC_DRAW) };
        driver.buffer_sub_data(gl::ARRAY_BUFFER, 2, &[0; 4]);
        assert_eq!(driver.get_error(), gl::INVALID_VALUE);
    }

    #[test]
    fn links_uniforms_with_sequential_locations() {
        let driver = SoftDriver::new();
        let program = program(&driver);
        assert_eq!(driver.get_program(program, gl::LINK_STATUS), gl::TRUE as i32);
        assert_eq!(driver.get_program(program, gl::ACTIVE_UNIFORMS), 2);
        let first = driver.get_active_uniform(program, 0);
        let second = driver.get_active_uniform(program, 1);
        assert_eq!((first.name.as_str(), first.size), ("mvp", 1));
        assert_eq!((second.name.as_str(), second.size), ("colors[0]", 3));
        assert_eq!(location(&driver, program, "mvp"), 0);
        assert_eq!(location(&driver, program, "colors"), 1);
        assert_eq!(location(&driver, program, "colors[2]"), 3);
        assert_eq!(location(&driver, program, "colors[3]"), -1);
        assert_eq!(location(&driver, program, "mvp[0]"), -1);
        assert_eq!(driver.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn link_requires_both_stages() {
        let driver = SoftDriver::new();
        let program = driver.create_program();
        let vs = shader(&driver, gl::VERTEX_SHADER, VERTEX);
        driver.attach_shader(program, vs);
        driver.link_program(program);
        assert_eq!(driver.get_program(program, gl::LINK_STATUS), gl::FALSE as i32);
        assert_eq!(driver.get_program_info_log(program), "error: program lacks a fragment shader\n");
    }

    #[test]
    fn attached_shaders_outlive_deletion() {
        let driver = SoftDriver::new();
        let program = program(&driver);
        let shaders = driver.state.borrow().programs[program as usize].attached.clone();
        for &shader in &shaders {
            driver.delete_shader(shader);
        }
        assert_eq!(driver.get_shader(shaders[0], gl::DELETE_STATUS), gl::TRUE as i32);
        driver.delete_program(program);
        assert_eq!(driver.live_objects(), 0);
        assert_eq!(driver.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn mipmaps_shrink_to_one_texel() {
        let driver = SoftDriver::new();
        let texture = driver.gen_texture();
        driver.bind_texture(gl::TEXTURE_2D, texture);
        driver.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA8, 8, 2, gl::RGBA, gl::UNSIGNED_BYTE, None);
        driver.generate_texture_mipmap(texture);
        assert_eq!(driver.texture_level_count(texture), 4);
        assert_eq!(driver.get_error(), gl::NO_ERROR);
    }

    #[test]
    fn textures_keep_their_first_target() {
        let driver = SoftDriver::new();
        let texture = driver.gen_texture();
        driver.bind_texture(gl::TEXTURE_2D, texture);
        driver.bind_texture(gl::TEXTURE_3D, texture);
        assert_eq!(driver.get_error(), gl::INVALID_OPERATION);
        driver.active_texture(3);
        assert_eq!(driver.get_integer(gl::TEXTURE_BINDING_2D), 0);
        assert_eq!(driver.get_integer(gl::ACTIVE_TEXTURE), (gl::TEXTURE0 + 3) as i32);
    }
}
