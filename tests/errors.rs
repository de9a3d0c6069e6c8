use glbind::buffer::{ArrayBuffer, Usage};
use glbind::texture::Texture2D;
use glbind::{gl, Bind, Config, Context, Driver, Error, ErrorChecking, ErrorCode, Program, SoftDriver};
use std::rc::Rc;

fn context(error_checking: ErrorChecking) -> (Rc<SoftDriver>, Context) {
    let _ = env_logger::try_init();
    let driver = Rc::new(SoftDriver::new());
    let config = Config::default().error_checking(error_checking);
    let ctx = Context::new(driver.clone(), config);
    (driver, ctx)
}

/// Writes past the end of a four byte store.
fn overrun(ctx: &Context) -> glbind::Result<ArrayBuffer> {
    let mut vbo = ArrayBuffer::new(ctx)?;
    vbo.store(&[0; 4], Usage::StaticDraw)?;
    vbo.write(2, &[1, 2, 3, 4])?;
    Ok(vbo)
}

#[test]
fn strict_mode_names_the_failing_call() {
    let (_driver, ctx) = context(ErrorChecking::Strict);
    match overrun(&ctx) {
        Err(Error::Driver { call, code }) => {
            assert_eq!(call, "glBufferSubData");
            assert_eq!(code, ErrorCode::InvalidValue);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(ctx.poll_error(), None);
}

#[test]
fn strict_is_the_default() {
    assert_eq!(Config::default().error_checking, ErrorChecking::Strict);
    assert!(Config::default().cache_uniforms);
}

#[test]
fn deferred_mode_leaves_errors_queued() {
    let (_driver, ctx) = context(ErrorChecking::Deferred);
    let vbo = overrun(&ctx).unwrap();
    assert_eq!(ctx.poll_error(), Some(ErrorCode::InvalidValue));
    assert_eq!(ctx.poll_error(), None);
    assert_eq!(vbo.read_all().unwrap(), vec![0; 4]);
}

#[test]
fn log_mode_consumes_errors() {
    let (_driver, ctx) = context(ErrorChecking::Log);
    overrun(&ctx).unwrap();
    assert_eq!(ctx.poll_error(), None);
}

#[test]
fn drain_collects_every_pending_error() {
    let (_driver, ctx) = context(ErrorChecking::Deferred);
    let _vbo = overrun(&ctx).unwrap();
    let mut texture = Texture2D::new(&ctx).unwrap();
    texture.parameter(gl::TEXTURE_MAG_FILTER, gl::REPEAT as i32).unwrap();
    assert_eq!(
        ctx.drain_errors(),
        vec![ErrorCode::InvalidValue, ErrorCode::InvalidEnum],
    );
    assert!(ctx.drain_errors().is_empty());
}

#[test]
fn errors_display_the_call_and_code() {
    let (_driver, ctx) = context(ErrorChecking::Strict);
    let err = overrun(&ctx).unwrap_err();
    assert_eq!(err.to_string(), "glBufferSubData failed: GL_INVALID_VALUE");
}

#[test]
fn stale_errors_do_not_fail_creation() {
    let (driver, ctx) = context(ErrorChecking::Strict);
    driver.bind_buffer(0xdead, 0);
    let vbo = ArrayBuffer::new(&ctx).unwrap();
    assert_eq!(ctx.poll_error(), None);
    assert_eq!(driver.live_objects(), 1);

    driver.bind_buffer(gl::ARRAY_BUFFER, 0xdead);
    vbo.bind().unwrap();
    assert!(vbo.is_bound().unwrap());
}

#[test]
fn deferred_mode_keeps_stale_errors() {
    let (driver, ctx) = context(ErrorChecking::Deferred);
    driver.bind_buffer(0xdead, 0);
    let _vbo = ArrayBuffer::new(&ctx).unwrap();
    assert_eq!(ctx.drain_errors(), vec![ErrorCode::InvalidEnum]);
}

#[test]
fn failed_creation_releases_the_name() {
    let (driver, ctx) = context(ErrorChecking::Strict);
    driver.fail_next("glGenBuffers", gl::OUT_OF_MEMORY);
    match ArrayBuffer::new(&ctx) {
        Err(Error::Allocation { kind }) => assert_eq!(kind, "buffer"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(driver.calls("glDeleteBuffers"), 1);
    assert_eq!(driver.live_objects(), 0);

    driver.fail_next("glCreateProgram", gl::INVALID_OPERATION);
    match Program::new(&ctx) {
        Err(Error::Driver { call, code }) => {
            assert_eq!(call, "glCreateProgram");
            assert_eq!(code, ErrorCode::InvalidOperation);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(driver.calls("glDeleteProgram"), 1);
    assert_eq!(driver.live_objects(), 0);
    assert_eq!(ctx.poll_error(), None);
}
