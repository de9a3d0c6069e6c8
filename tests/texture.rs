use glbind::image;
use glbind::texture::{self, format, Face, Filter, Format, Texture1D, Texture2D, Texture2DArray, Texture3D, TextureCubeMap, Wrap};
use glbind::{gl, Bind, Config, Context, Error, ErrorCode, SoftDriver};
use std::rc::Rc;

const RGBA8: Format = Format::U8(format::U8::Rgba);

fn context() -> (Rc<SoftDriver>, Context) {
    let _ = env_logger::try_init();
    let driver = Rc::new(SoftDriver::new());
    let ctx = Context::new(driver.clone(), Config::default());
    (driver, ctx)
}

#[test]
fn mipmap_generation_fills_the_chain() {
    let (driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    texture.image(0, RGBA8, 16, 4, image::Format::RGBA8, Some(&[0xff; 16 * 4 * 4])).unwrap();
    assert_eq!(driver.texture_level_count(texture.name()), 1);

    texture.unbind().unwrap();
    driver.reset_calls();
    texture.generate_mipmap().unwrap();
    assert_eq!(driver.calls("glBindTexture"), 0);
    assert_eq!(driver.texture_level_count(texture.name()), 5);
}

#[test]
fn mipmaps_need_a_base_level() {
    let (_driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    texture.bind().unwrap();
    assert!(texture.generate_mipmap().is_err());
}

#[test]
fn parameters_round_trip() {
    let (_driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    assert_eq!(texture.get_parameter(gl::TEXTURE_MAG_FILTER).unwrap(), gl::LINEAR as i32);
    texture.set_filters(Filter::LinearMipmapLinear, Filter::Nearest).unwrap();
    texture.set_wrap(Wrap::ClampToEdge).unwrap();
    texture.parameter(gl::TEXTURE_MAX_LEVEL, 4).unwrap();
    texture.parameter(gl::TEXTURE_MIN_LOD, 0.5f32).unwrap();
    texture.parameter(gl::TEXTURE_BORDER_COLOR, &[0.0f32, 0.0, 0.0, 1.0][..]).unwrap();

    let swizzle = [gl::RED as i32, gl::RED as i32, gl::RED as i32, gl::ONE as i32];
    texture.parameter(gl::TEXTURE_SWIZZLE_RGBA, &swizzle[..]).unwrap();

    assert_eq!(texture.get_parameter(gl::TEXTURE_MIN_FILTER).unwrap(), gl::LINEAR_MIPMAP_LINEAR as i32);
    assert_eq!(texture.get_parameter(gl::TEXTURE_MAG_FILTER).unwrap(), gl::NEAREST as i32);
    assert_eq!(texture.get_parameter(gl::TEXTURE_WRAP_R).unwrap(), gl::CLAMP_TO_EDGE as i32);
    assert_eq!(texture.get_parameter(gl::TEXTURE_MAX_LEVEL).unwrap(), 4);
    assert_eq!(texture.get_parameter(gl::TEXTURE_SWIZZLE_RGBA).unwrap(), gl::RED as i32);
}

#[test]
fn short_parameter_vectors_never_reach_the_driver() {
    let (driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    driver.reset_calls();
    match texture.parameter(gl::TEXTURE_BORDER_COLOR, &[1.0f32][..]) {
        Err(Error::ParameterLength { pname, expected, actual }) => {
            assert_eq!(pname, gl::TEXTURE_BORDER_COLOR);
            assert_eq!(expected, 4);
            assert_eq!(actual, 1);
        }
        other => panic!("unexpected {:?}", other),
    }
    let swizzle: [i32; 3] = [gl::RED as i32; 3];
    assert!(texture.parameter(gl::TEXTURE_SWIZZLE_RGBA, &swizzle[..]).is_err());
    let empty: [i32; 0] = [];
    assert!(texture.parameter(gl::TEXTURE_MAX_LEVEL, &empty[..]).is_err());
    assert_eq!(driver.calls("glTexParameterfv"), 0);
    assert_eq!(driver.calls("glTexParameteriv"), 0);
    assert_eq!(driver.calls("glBindTexture"), 0);

    texture.parameter(gl::TEXTURE_MAX_LEVEL, &[2i32][..]).unwrap();
    assert_eq!(texture.get_parameter(gl::TEXTURE_MAX_LEVEL).unwrap(), 2);
}

#[test]
fn out_of_range_units_are_driver_errors() {
    let (_driver, ctx) = context();
    for &unit in &[16, u32::MAX] {
        match texture::set_active_unit(&ctx, unit) {
            Err(Error::Driver { call, code }) => {
                assert_eq!(call, "glActiveTexture");
                assert_eq!(code, ErrorCode::InvalidEnum);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(texture::active_unit(&ctx).unwrap(), 0);
}

#[test]
fn invalid_parameters_are_driver_errors() {
    let (_driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    match texture.parameter(gl::TEXTURE_WRAP_S, gl::NEAREST as i32) {
        Err(Error::Driver { call, code }) => {
            assert_eq!(call, "glTexParameteri");
            assert_eq!(code, ErrorCode::InvalidEnum);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(texture.parameter(gl::TEXTURE_BORDER_COLOR, 1.0f32).is_err());
}

#[test]
fn uploads_for_every_dimension() {
    let (driver, ctx) = context();
    let mut line = Texture1D::new(&ctx).unwrap();
    line.image(0, RGBA8, 8, image::Format::RGBA8, None).unwrap();

    let mut volume = Texture3D::new(&ctx).unwrap();
    volume.image(0, Format::F32(format::F32::R), 4, 4, 4, image::Format::new(image::Channels::R, image::DataType::F32), None).unwrap();
    volume.generate_mipmap().unwrap();
    assert_eq!(driver.texture_level_count(volume.name()), 3);

    let mut layers = Texture2DArray::new(&ctx).unwrap();
    layers.image(0, RGBA8, 4, 4, 6, image::Format::RGBA8, None).unwrap();
    layers.generate_mipmap().unwrap();
    assert_eq!(driver.texture_level_count(layers.name()), 3);
}

#[test]
fn cube_faces_are_uploaded_individually() {
    let (driver, ctx) = context();
    let mut sky = TextureCubeMap::new(&ctx).unwrap();
    let faces = [
        Face::PositiveX,
        Face::NegativeX,
        Face::PositiveY,
        Face::NegativeY,
        Face::PositiveZ,
        Face::NegativeZ,
    ];
    for &face in &faces {
        sky.face_image(face, 0, RGBA8, 2, image::Format::RGBA8, None).unwrap();
    }
    assert_eq!(driver.calls("glTexImage2D"), 6);
    assert_eq!(driver.texture_level_count(sky.name()), 1);
}

#[test]
fn row_alignment_is_honoured() {
    let (_driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    let rgb = image::Format::new(image::Channels::Rgb, image::DataType::U8);
    // Two rows of 3 pixels: 9 bytes padded to 12, plus 9.
    assert_eq!(rgb.image_size(3, 2, 1), 21);
    texture.image(0, Format::U8(format::U8::Rgb), 3, 2, rgb, Some(&[0; 21])).unwrap();
    assert!(texture.image(0, Format::U8(format::U8::Rgb), 3, 2, rgb, Some(&[0; 18])).is_err());
}

#[test]
fn depth_formats_need_depth_data() {
    let (_driver, ctx) = context();
    let mut texture = Texture2D::new(&ctx).unwrap();
    let depth = image::Format::new(image::Channels::Depth, image::DataType::F32);
    texture.image(0, Format::F32(format::F32::Depth), 4, 4, depth, None).unwrap();
    assert!(texture.image(0, Format::F32(format::F32::Depth), 4, 4, image::Format::RGBA8, None).is_err());
}
