use glbind::buffer::{Access, ArrayBuffer, UniformBuffer, Usage};
use glbind::{Config, Context, SoftDriver};
use std::rc::Rc;

fn context() -> (Rc<SoftDriver>, Context) {
    let _ = env_logger::try_init();
    let driver = Rc::new(SoftDriver::new());
    let ctx = Context::new(driver.clone(), Config::default());
    (driver, ctx)
}

#[test]
fn stored_data_reads_back() {
    let (_driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.store_slice(&[1.0f32, 2.0, 3.0, 4.0], Usage::StaticDraw).unwrap();
    assert_eq!(vbo.size().unwrap(), 16);
    assert_eq!(vbo.read_slice::<f32>(0, 4).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn partial_writes_leave_the_rest_intact() {
    let (_driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.store_slice(&[1.0f32, 2.0, 3.0, 4.0], Usage::DynamicDraw).unwrap();
    vbo.write_slice(4, &[5.0f32, 6.0]).unwrap();
    assert_eq!(vbo.read_slice::<f32>(4, 2).unwrap(), vec![5.0, 6.0]);
    assert_eq!(vbo.read_slice::<f32>(0, 1).unwrap(), vec![1.0]);
    assert_eq!(vbo.read(4, 8).unwrap(), bytemuck::cast_slice::<f32, u8>(&[5.0, 6.0]).to_vec());
    assert_eq!(vbo.read_slice::<f32>(12, 1).unwrap(), vec![4.0]);
}

#[test]
fn initialize_resizes_the_store() {
    let (_driver, ctx) = context();
    let mut ubo = UniformBuffer::new(&ctx).unwrap();
    ubo.initialize(1024, Usage::DynamicDraw).unwrap();
    assert_eq!(ubo.size().unwrap(), 1024);
    ubo.initialize(2048, Usage::StreamDraw).unwrap();
    assert_eq!(ubo.size().unwrap(), 2048);
    assert_eq!(ubo.usage().unwrap(), Some(Usage::StreamDraw));
}

#[test]
fn read_returns_an_owned_copy() {
    let (_driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.store(&[1, 2, 3, 4], Usage::StaticRead).unwrap();
    let before = vbo.read_all().unwrap();
    vbo.write(0, &[9]).unwrap();
    assert_eq!(before, vec![1, 2, 3, 4]);
    assert_eq!(vbo.read_all().unwrap(), vec![9, 2, 3, 4]);
}

#[test]
fn data_operations_bind_at_most_once() {
    let (driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.initialize(64, Usage::StaticDraw).unwrap();
    vbo.write(0, &[1; 8]).unwrap();
    vbo.read(0, 8).unwrap();
    vbo.size().unwrap();
    assert_eq!(driver.calls("glBindBuffer"), 1);
    assert_eq!(driver.calls("glBufferData"), 1);
    assert_eq!(driver.calls("glBufferSubData"), 1);
    assert_eq!(driver.calls("glGetBufferSubData"), 1);
}

#[test]
fn writes_through_a_mapping_are_visible() {
    let (_driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.initialize(4, Usage::DynamicDraw).unwrap();
    let mut mapping = vbo.map(Access::ReadWrite).unwrap();
    assert_eq!(mapping.access(), Access::ReadWrite);
    mapping.as_mut_slice().unwrap().copy_from_slice(&[4, 3, 2, 1]);
    assert_eq!(mapping.as_slice(), Some(&[4, 3, 2, 1][..]));
    assert!(mapping.unmap().unwrap());
    assert_eq!(vbo.read_all().unwrap(), vec![4, 3, 2, 1]);
}

#[test]
fn mapping_an_empty_store_fails() {
    let (_driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    assert!(vbo.map(Access::ReadOnly).is_err());
}

#[test]
fn write_only_mappings_only_hand_out_writable_bytes() {
    let (_driver, ctx) = context();
    let mut vbo = ArrayBuffer::new(&ctx).unwrap();
    vbo.store(&[1, 2, 3, 4], Usage::DynamicDraw).unwrap();
    let mut mapping = vbo.map(Access::WriteOnly).unwrap();
    assert!(mapping.as_slice().is_none());
    mapping.as_mut_slice().unwrap()[0] = 7;
    assert!(mapping.unmap().unwrap());
    assert_eq!(vbo.read_all().unwrap(), vec![7, 2, 3, 4]);
}
