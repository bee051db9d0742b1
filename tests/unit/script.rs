use std::io::Cursor;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "inset_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn script(json: &str) -> DrawScript {
    DrawScript::from_json(json).unwrap()
}

#[test]
fn parses_tagged_commands() {
    let s = script(
        r#"{
            "canvas": {"width": 8, "height": 4},
            "settings": {"inset": true, "buffer": {"fixed": 2}},
            "ops": [
                {"op": "set_fill_style", "color": [255, 0, 0, 255]},
                {"op": "set_shadow", "blur": 3.0, "color": [0, 0, 0, 255]},
                {"op": "set_composite_op", "mode": "xor"},
                {"op": "rect", "x": 0, "y": 0, "width": 2, "height": 2},
                {"op": "fill"}
            ]
        }"#,
    );
    assert!(s.settings.inset);
    assert_eq!(s.settings.buffer, crate::BufferPolicy::Fixed(2));
    assert_eq!(s.background, None);
    assert_eq!(
        s.ops[1],
        DrawCmd::SetShadow(ShadowProps::blurred(3.0, Rgba8::BLACK))
    );
    assert_eq!(
        s.ops[2],
        DrawCmd::SetCompositeOp {
            mode: CompositeOp::Xor
        }
    );
    assert_eq!(s.ops[4], DrawCmd::Fill);
}

#[test]
fn unknown_op_is_a_script_error() {
    let err = DrawScript::from_json(
        r#"{"canvas": {"width": 1, "height": 1}, "ops": [{"op": "stroke"}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, InsetError::Script(_)), "{err}");
}

#[test]
fn validate_rejects_negative_blur() {
    let s = script(
        r#"{"canvas": {"width": 4, "height": 4},
            "ops": [{"op": "set_shadow", "blur": -1.0, "color": [0, 0, 0, 255]}]}"#,
    );
    let err = s.validate().unwrap_err();
    assert!(err.to_string().contains("op 0"), "{err}");
}

#[test]
fn validate_rejects_oversized_canvas() {
    let s = script(r#"{"canvas": {"width": 70000, "height": 4}, "ops": []}"#);
    assert!(matches!(s.validate(), Err(InsetError::Validation(_))));
}

#[test]
fn validate_accepts_large_canvas_with_auto_buffer() {
    let s = script(r#"{"canvas": {"width": 30000, "height": 1}, "ops": []}"#);
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_fixed_buffer_past_surface_limit() {
    let s = script(
        r#"{"canvas": {"width": 30000, "height": 1},
            "settings": {"buffer": {"fixed": 20000}}, "ops": []}"#,
    );
    let err = s.validate().unwrap_err();
    assert!(matches!(err, InsetError::Validation(_)), "{err}");
    assert!(err.to_string().contains("70000x40001"), "{err}");
}

#[test]
fn background_fills_whole_canvas() {
    let s = script(
        r#"{"canvas": {"width": 3, "height": 2}, "background": [0, 0, 255, 255], "ops": []}"#,
    );
    let img = s.render(Path::new(".")).unwrap();
    assert!(img.data.chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
}

#[test]
fn inset_fill_darkens_edges_only() {
    let s = script(
        r#"{"canvas": {"width": 60, "height": 40}, "ops": [
            {"op": "set_inset", "inset": true},
            {"op": "set_fill_style", "color": [255, 0, 0, 255]},
            {"op": "set_shadow", "blur": 4.0, "color": [0, 0, 0, 255]},
            {"op": "fill_rect", "x": 0, "y": 0, "width": 60, "height": 40}
        ]}"#,
    );
    let img = s.render(Path::new(".")).unwrap();
    assert_eq!(img.pixel(30, 20), [255, 0, 0, 255]);
    let corner = img.pixel(0, 0);
    assert!(corner[0] < 200, "{corner:?}");
    assert_eq!(corner[3], 255);
}

#[test]
fn render_plain_ignores_inset_commands() {
    let s = script(
        r#"{"canvas": {"width": 30, "height": 20}, "ops": [
            {"op": "set_inset", "inset": true},
            {"op": "set_shadow", "blur": 4.0, "color": [0, 0, 0, 255]},
            {"op": "fill_rect", "x": 8, "y": 5, "width": 14, "height": 10}
        ]}"#,
    );
    let plain = s.render_plain(Path::new(".")).unwrap();

    let mut reference = CpuCanvas::new(30, 20).unwrap();
    reference.set_shadow(ShadowProps::blurred(4.0, Rgba8::BLACK));
    reference.fill_rect(8.0, 5.0, 14.0, 10.0).unwrap();
    assert_eq!(plain.data, reference.pixels());

    let inset = s.render(Path::new(".")).unwrap();
    assert_ne!(inset.data, plain.data);
}

#[test]
fn missing_image_is_a_script_error() {
    let s = script(
        r#"{"canvas": {"width": 4, "height": 4}, "ops": [
            {"op": "begin_path"},
            {"op": "draw_image", "path": "missing.png", "dx": 0, "dy": 0}
        ]}"#,
    );
    let err = s.render(&temp_dir("script_missing")).unwrap_err();
    assert!(matches!(err, InsetError::Script(_)), "{err}");
}

#[test]
fn draw_image_loads_relative_to_base_dir() {
    let tmp = temp_dir("script_draw_image");
    std::fs::create_dir_all(&tmp).unwrap();
    let img = image::RgbaImage::from_raw(2, 1, vec![0, 255, 0, 255, 0, 0, 255, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(tmp.join("tile.png"), &buf).unwrap();

    let s = script(
        r#"{"canvas": {"width": 4, "height": 2}, "ops": [
            {"op": "draw_image", "path": "tile.png", "dx": 1, "dy": 1}
        ]}"#,
    );
    let out = s.render(&tmp).unwrap();
    assert_eq!(out.pixel(0, 1), [0, 0, 0, 0]);
    assert_eq!(out.pixel(1, 1), [0, 255, 0, 255]);
    assert_eq!(out.pixel(2, 1), [0, 0, 255, 255]);
    assert_eq!(out.pixel(1, 0), [0, 0, 0, 0]);

    std::fs::remove_dir_all(&tmp).ok();
}
