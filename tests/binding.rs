use glbind::buffer::{format::Component, ArrayBuffer, ElementArrayBuffer, Format, Usage};
use glbind::texture::{self, Texture2D, TextureCubeMap};
use glbind::vertex_array::Attribute;
use glbind::{gl, Bind, Config, Context, SoftDriver, VertexArray};
use std::rc::Rc;

fn context() -> (Rc<SoftDriver>, Context) {
    let _ = env_logger::try_init();
    let driver = Rc::new(SoftDriver::new());
    let ctx = Context::new(driver.clone(), Config::default());
    (driver, ctx)
}

#[test]
fn fresh_handles_are_unbound() {
    let (_driver, ctx) = context();
    let vbo = ArrayBuffer::new(&ctx).unwrap();
    let vao = VertexArray::new(&ctx).unwrap();
    let texture = Texture2D::new(&ctx).unwrap();
    assert_ne!(vbo.name(), 0);
    assert!(!vbo.is_bound().unwrap());
    assert!(!vao.is_bound().unwrap());
    assert!(!texture.is_bound().unwrap());
    assert_eq!(ArrayBuffer::bound(&ctx).unwrap(), 0);
}

#[test]
fn bind_and_unbind_set_the_slot() {
    let (_driver, ctx) = context();
    let vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.bind().unwrap();
    assert_eq!(ArrayBuffer::bound(&ctx).unwrap(), vbo.name());
    assert!(vbo.is_bound().unwrap());
    vbo.unbind().unwrap();
    assert_eq!(ArrayBuffer::bound(&ctx).unwrap(), 0);
}

#[test]
fn bind_if_unbound_elides_redundant_binds() {
    let (driver, ctx) = context();
    let vbo = ArrayBuffer::new(&ctx).unwrap();
    driver.reset_calls();
    vbo.bind_if_unbound().unwrap();
    vbo.bind_if_unbound().unwrap();
    assert_eq!(driver.calls("glBindBuffer"), 1);
    assert_eq!(driver.calls("glGetIntegerv"), 2);
    assert!(vbo.is_bound().unwrap());
}

#[test]
fn occupancy_is_queried_not_remembered() {
    let (driver, ctx) = context();
    let first = ArrayBuffer::new(&ctx).unwrap();
    let second = ArrayBuffer::new(&ctx).unwrap();
    first.bind().unwrap();
    second.bind().unwrap();
    driver.reset_calls();
    first.bind_if_unbound().unwrap();
    assert_eq!(driver.calls("glBindBuffer"), 1);
    assert!(first.is_bound().unwrap());
    assert!(!second.is_bound().unwrap());
}

#[test]
fn slots_are_per_target() {
    let (_driver, ctx) = context();
    let vao = VertexArray::new(&ctx).unwrap();
    vao.bind().unwrap();
    let vbo = ArrayBuffer::new(&ctx).unwrap();
    let ibo = ElementArrayBuffer::new(&ctx).unwrap();
    vbo.bind().unwrap();
    ibo.bind().unwrap();
    assert!(vbo.is_bound().unwrap());
    assert!(ibo.is_bound().unwrap());
}

#[test]
fn dropping_releases_the_name_once() {
    let (driver, ctx) = context();
    {
        let mut vbo = ArrayBuffer::new(&ctx).unwrap();
        vbo.store(&[0; 16], Usage::StaticDraw).unwrap();
        let _texture = Texture2D::new(&ctx).unwrap();
        assert_eq!(driver.live_objects(), 2);
    }
    assert_eq!(driver.calls("glDeleteBuffers"), 1);
    assert_eq!(driver.calls("glDeleteTextures"), 1);
    assert_eq!(driver.live_objects(), 0);
    assert_eq!(ArrayBuffer::bound(&ctx).unwrap(), 0);
}

#[test]
fn moved_handles_are_released_by_their_new_owner() {
    let (driver, ctx) = context();
    let buffers: Vec<ArrayBuffer> = (0..3).map(|_| ArrayBuffer::new(&ctx).unwrap()).collect();
    let kept = buffers.into_iter().last().unwrap();
    assert_eq!(driver.calls("glDeleteBuffers"), 2);
    drop(kept);
    assert_eq!(driver.calls("glDeleteBuffers"), 3);
}

#[test]
fn vertex_array_records_attributes_and_elements() {
    let (_driver, ctx) = context();
    let mut vao = VertexArray::new(&ctx).unwrap();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    let mut ibo = ElementArrayBuffer::new(&ctx).unwrap();
    vbo.store_slice(&[0.0f32; 12], Usage::StaticDraw).unwrap();
    ibo.store_slice(&[0u16, 1, 2], Usage::StaticDraw).unwrap();

    let attribute = Attribute {
        format: Format::norm(Component::U8, 4),
        offset: 12,
        stride: 16,
    };
    vao.set_attribute(0, &vbo, Attribute::packed(Format::f32(3))).unwrap();
    vao.set_attribute(1, &vbo, attribute).unwrap();
    vao.enable_attribute(0).unwrap();
    vao.set_element_buffer(&ibo).unwrap();

    assert!(vao.is_attribute_enabled(0).unwrap());
    assert!(!vao.is_attribute_enabled(1).unwrap());
    assert_eq!(vao.attribute_buffer(1).unwrap(), vbo.name());
    assert_eq!(vao.element_buffer().unwrap(), ibo.name());

    let other = VertexArray::new(&ctx).unwrap();
    other.bind().unwrap();
    assert_eq!(other.element_buffer().unwrap(), 0);
    assert_eq!(vao.element_buffer().unwrap(), ibo.name());

    vao.disable_attribute(0).unwrap();
    assert!(!vao.is_attribute_enabled(0).unwrap());
}

#[test]
fn texture_binds_are_unconditional() {
    let (driver, ctx) = context();
    let texture = Texture2D::new(&ctx).unwrap();
    driver.reset_calls();
    texture.bind().unwrap();
    texture.bind().unwrap();
    assert_eq!(driver.calls("glBindTexture"), 2);
    assert_eq!(driver.calls("glGetIntegerv"), 0);
}

#[test]
fn unit_qualified_bind_selects_the_unit() {
    let (_driver, ctx) = context();
    let albedo = Texture2D::new(&ctx).unwrap();
    let sky = TextureCubeMap::new(&ctx).unwrap();
    albedo.bind_unit(0).unwrap();
    sky.bind_unit(3).unwrap();
    assert_eq!(texture::active_unit(&ctx).unwrap(), 3);
    assert!(sky.is_bound().unwrap());
    assert_eq!(Texture2D::bound(&ctx).unwrap(), 0);

    texture::set_active_unit(&ctx, 0).unwrap();
    assert!(albedo.is_bound().unwrap());
    assert_eq!(TextureCubeMap::bound(&ctx).unwrap(), 0);
}

#[test]
fn current_program_is_a_slot_too() {
    let (_driver, ctx) = context();
    assert_eq!(ctx.bound(gl::CURRENT_PROGRAM).unwrap(), 0);
    assert_eq!(VertexArray::bound(&ctx).unwrap(), 0);
}
