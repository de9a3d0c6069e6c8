extern crate env_logger;
extern crate glbind;
extern crate glutin;
extern crate image;
#[macro_use] extern crate log;

use glbind::buffer::{ArrayBuffer, Format, Usage};
use glbind::shader::Kind;
use glbind::texture::{self, Filter, Texture2D, Wrap};
use glbind::vertex_array::Attribute;
use glbind::{Bind, Config, ErrorChecking, Program, Shader, VertexArray};
use std::error::Error;

use glutin::ElementState::Released;
use glutin::Event;
use glutin::GlContext;
use glutin::VirtualKeyCode as Key;
use glutin::WindowEvent;

const VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec3 a_Position;
out vec2 v_TexCoord;
uniform mat4 u_Transform;

void main() {
    v_TexCoord = a_Position.xy + 0.5;
    gl_Position = u_Transform * vec4(a_Position, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_TexCoord;
out vec4 o_Color;
uniform sampler2D u_Sampler;
uniform vec4 u_Tint[2];

void main() {
    o_Color = texture(u_Sampler, v_TexCoord) * u_Tint[0];
}
"#;

const TRIANGLE_DATA: &[[f32; 3]] = &[
    [-0.5, -0.5, 0.0],
    [0.5, -0.5, 0.0],
    [0.0, 0.5, 0.0],
];

/// 64x64 RGBA checkerboard with 8 pixel squares.
fn checkerboard() -> image::RgbaImage {
    image::RgbaImage::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            image::Rgba([0xff, 0xff, 0xff, 0xff])
        } else {
            image::Rgba([0x20, 0x80, 0x20, 0xff])
        }
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut event_loop = glutin::EventsLoop::new();
    let window_builder = glutin::WindowBuilder::new().with_title("glbind upload");
    let context_builder = glutin::ContextBuilder::new()
        .with_gl(glutin::GlRequest::Specific(glutin::Api::OpenGl, (4, 5)))
        .with_gl_profile(glutin::GlProfile::Core)
        .with_vsync(true);
    let window = glutin::GlWindow::new(window_builder, context_builder, &event_loop)?;
    unsafe { window.make_current()? }

    let config = Config::default().error_checking(ErrorChecking::Strict);
    let ctx = glbind::init_with(config, |sym| window.get_proc_address(sym) as *const _);

    let mut vertex_shader = Shader::from_source(&ctx, Kind::Vertex, VERTEX_SHADER)?;
    let mut fragment_shader = Shader::from_source(&ctx, Kind::Fragment, FRAGMENT_SHADER)?;
    for shader in &mut [&mut vertex_shader, &mut fragment_shader] {
        if !shader.compile()? {
            return Err(shader.info_log()?.into());
        }
    }

    let mut program = Program::new(&ctx)?;
    program.attach(&vertex_shader)?;
    program.attach(&fragment_shader)?;
    if !program.link()? {
        return Err(program.info_log()?.into());
    }
    for uniform in program.uniforms().unwrap_or(&[]) {
        info!("uniform {} (size {}) at {:?}", uniform.name, uniform.size, uniform.location);
    }
    info!("u_Tint[1] is at {:?}", program.uniform_location("u_Tint[1]")?);

    let mut vertex_buffer = ArrayBuffer::new(&ctx)?;
    vertex_buffer.store_slice(TRIANGLE_DATA, Usage::StaticDraw)?;
    let read_back = vertex_buffer.read_slice::<[f32; 3]>(0, TRIANGLE_DATA.len())?;
    assert_eq!(&read_back[..], TRIANGLE_DATA);

    let mut vertex_array = VertexArray::new(&ctx)?;
    vertex_array.set_attribute(0, &vertex_buffer, Attribute::packed(Format::f32(3)))?;
    vertex_array.enable_attribute(0)?;

    let pixels = checkerboard();
    let mut texture = Texture2D::new(&ctx)?;
    texture.image(
        0,
        texture::Format::U8(texture::format::U8::SrgbAlpha),
        pixels.width(),
        pixels.height(),
        glbind::image::Format::RGBA8,
        Some(pixels.as_raw().as_slice()),
    )?;
    texture.generate_mipmap()?;
    texture.set_filters(Filter::LinearMipmapLinear, Filter::Linear)?;
    texture.set_wrap(Wrap::Repeat)?;
    texture.bind_unit(0)?;

    program.use_program()?;
    info!(
        "program {} current, vertex array {}, texture unit {}",
        program.name(),
        VertexArray::bound(&ctx)?,
        texture::active_unit(&ctx)?,
    );

    let mut running = true;
    while running {
        window.swap_buffers()?;
        event_loop.poll_events(|event| {
            if let Event::WindowEvent { event, .. } = event {
                match event {
                    WindowEvent::Closed => running = false,
                    WindowEvent::KeyboardInput { input, .. } => {
                        if let (Some(Key::Escape), Released) = (input.virtual_keycode, input.state) {
                            running = false;
                        }
                    }
                    _ => {}
                }
            }
        });
    }

    program.unuse()?;
    Ok(())
}
