use super::*;

const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

fn px(c: &CpuCanvas, x: u32, y: u32) -> [u8; 4] {
    c.snapshot().unwrap().pixel(x, y)
}

fn max_diff(a: &[u8], b: &[u8]) -> u8 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| x.abs_diff(y))
        .max()
        .unwrap_or(0)
}

#[test]
fn new_canvas_is_transparent_with_defaults() {
    let c = CpuCanvas::new(4, 3).unwrap();
    assert_eq!(c.width(), 4);
    assert_eq!(c.height(), 3);
    assert!(c.pixels().iter().all(|&b| b == 0));
    assert_eq!(c.fill_style(), Rgba8::BLACK);
    assert_eq!(c.shadow(), ShadowProps::default());
    assert_eq!(c.composite_op(), CompositeOp::SourceOver);
    assert_eq!(c.transform(), Affine::IDENTITY);
}

#[test]
fn oversized_canvas_is_rejected() {
    assert!(CpuCanvas::new(70_000, 1).is_err());
    assert!(CpuCanvas::new(1, 70_000).is_err());
}

#[test]
fn zero_sized_canvas_accepts_draws() {
    let mut c = CpuCanvas::new(0, 0).unwrap();
    c.fill_rect(0.0, 0.0, 10.0, 10.0).unwrap();
    c.rect(0.0, 0.0, 5.0, 5.0);
    c.fill().unwrap();
    assert!(c.snapshot().unwrap().data.is_empty());
}

#[test]
fn fill_rect_paints_exact_interior() {
    let mut c = CpuCanvas::new(8, 8).unwrap();
    c.set_fill_style(RED);
    c.fill_rect(2.0, 2.0, 4.0, 4.0).unwrap();
    assert_eq!(px(&c, 3, 3), [255, 0, 0, 255]);
    assert_eq!(px(&c, 2, 5), [255, 0, 0, 255]);
    assert_eq!(px(&c, 1, 3), [0, 0, 0, 0]);
    assert_eq!(px(&c, 6, 6), [0, 0, 0, 0]);
}

#[test]
fn fill_rect_follows_transform() {
    let mut c = CpuCanvas::new(8, 8).unwrap();
    c.set_fill_style(RED);
    c.translate(4.0, 0.0);
    c.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    assert_eq!(px(&c, 4, 1), [255, 0, 0, 255]);
    assert_eq!(px(&c, 1, 1), [0, 0, 0, 0]);
}

#[test]
fn path_rect_fill_matches_fill_rect() {
    let mut a = CpuCanvas::new(16, 16).unwrap();
    a.set_fill_style(RED);
    a.begin_path();
    a.rect(3.0, 4.0, 8.0, 5.0);
    a.close_path();
    a.fill().unwrap();

    let mut b = CpuCanvas::new(16, 16).unwrap();
    b.set_fill_style(RED);
    b.fill_rect(3.0, 4.0, 8.0, 5.0).unwrap();

    assert!(max_diff(a.pixels(), b.pixels()) <= 1);
}

#[test]
fn fill_with_empty_path_is_noop() {
    let mut c = CpuCanvas::new(4, 4).unwrap();
    c.begin_path();
    c.fill().unwrap();
    assert!(c.pixels().iter().all(|&b| b == 0));
}

#[test]
fn xor_black_fill_inverts_coverage() {
    let mut c = CpuCanvas::new(8, 8).unwrap();
    c.fill_rect(2.0, 2.0, 4.0, 4.0).unwrap();
    c.set_composite_op(CompositeOp::Xor);
    c.set_fill_style(Rgba8::BLACK);
    c.fill_rect(0.0, 0.0, 8.0, 8.0).unwrap();
    assert_eq!(px(&c, 3, 3)[3], 0);
    assert_eq!(px(&c, 0, 0), [0, 0, 0, 255]);
    assert_eq!(px(&c, 7, 7), [0, 0, 0, 255]);
}

#[test]
fn blurred_shadow_spills_outside_shape() {
    let mut c = CpuCanvas::new(40, 40).unwrap();
    c.set_fill_style(RED);
    c.set_shadow(ShadowProps::blurred(6.0, Rgba8::BLACK));
    c.fill_rect(10.0, 10.0, 20.0, 20.0).unwrap();
    assert_eq!(px(&c, 20, 20), [255, 0, 0, 255]);
    let outside = px(&c, 8, 20);
    assert!(outside[3] > 0, "{outside:?}");
    assert_eq!(outside[0], 0);
}

#[test]
fn offset_shadow_without_blur_is_shifted_silhouette() {
    let mut c = CpuCanvas::new(40, 40).unwrap();
    c.set_fill_style(RED);
    c.set_shadow(ShadowProps {
        offset_x: 5.0,
        offset_y: 5.0,
        color: Rgba8::BLACK,
        ..ShadowProps::default()
    });
    c.fill_rect(10.0, 10.0, 20.0, 20.0).unwrap();
    assert_eq!(px(&c, 32, 32), [0, 0, 0, 255]);
    assert_eq!(px(&c, 12, 12), [255, 0, 0, 255]);
    assert_eq!(px(&c, 8, 8), [0, 0, 0, 0]);
}

#[test]
fn invalid_shadow_values_are_ignored() {
    let mut c = CpuCanvas::new(4, 4).unwrap();
    let good = ShadowProps::blurred(3.0, Rgba8::BLACK);
    c.set_shadow(good);
    c.set_shadow(ShadowProps::blurred(-1.0, Rgba8::BLACK));
    assert_eq!(c.shadow(), good);
}

#[test]
fn save_restore_round_trips_state() {
    let mut c = CpuCanvas::new(4, 4).unwrap();
    c.save();
    c.set_fill_style(RED);
    c.set_composite_op(CompositeOp::Xor);
    c.translate(1.0, 2.0);
    c.restore();
    assert_eq!(c.fill_style(), Rgba8::BLACK);
    assert_eq!(c.composite_op(), CompositeOp::SourceOver);
    assert_eq!(c.transform(), Affine::IDENTITY);
    c.restore();
}

#[test]
fn set_size_resets_pixels_and_state() {
    let mut c = CpuCanvas::new(4, 4).unwrap();
    c.set_fill_style(RED);
    c.translate(1.0, 1.0);
    c.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    c.set_size(6, 5).unwrap();
    assert_eq!((c.width(), c.height()), (6, 5));
    assert!(c.pixels().iter().all(|&b| b == 0));
    assert_eq!(c.fill_style(), Rgba8::BLACK);
    assert_eq!(c.transform(), Affine::IDENTITY);
}

#[test]
fn arc_rejects_negative_radius() {
    let mut c = CpuCanvas::new(4, 4).unwrap();
    assert!(c.arc(1.0, 1.0, -1.0, 0.0, 1.0, false).is_err());
    assert!(c.arc_to(1.0, 1.0, 2.0, 2.0, -1.0).is_err());
}

#[test]
fn full_arc_fills_a_disc() {
    let mut c = CpuCanvas::new(40, 40).unwrap();
    c.set_fill_style(RED);
    c.begin_path();
    c.arc(20.0, 20.0, 10.0, 0.0, TAU, false).unwrap();
    c.fill().unwrap();
    assert_eq!(px(&c, 20, 20), [255, 0, 0, 255]);
    assert_eq!(px(&c, 20, 35), [0, 0, 0, 0]);
    assert_eq!(px(&c, 2, 2), [0, 0, 0, 0]);
}

#[test]
fn arc_to_rounds_a_corner() {
    let mut c = CpuCanvas::new(40, 40).unwrap();
    c.set_fill_style(RED);
    c.begin_path();
    c.move_to(5.0, 5.0);
    c.arc_to(35.0, 5.0, 35.0, 35.0, 12.0).unwrap();
    c.line_to(35.0, 35.0);
    c.line_to(5.0, 35.0);
    c.close_path();
    c.fill().unwrap();
    assert_eq!(px(&c, 20, 20), [255, 0, 0, 255]);
    // The top-right corner is cut off by the arc.
    assert_eq!(px(&c, 34, 6)[3], 0);
}

#[test]
fn arc_sweep_matches_canvas_normalization() {
    assert!((arc_sweep(PI, 0.0, false) - PI).abs() < 1e-12);
    assert!((arc_sweep(0.0, PI, true) + PI).abs() < 1e-12);
    assert_eq!(arc_sweep(0.0, 3.0 * TAU, false), TAU);
    assert_eq!(arc_sweep(0.0, -3.0 * TAU, true), -TAU);
    assert!((arc_sweep(0.0, -PI / 2.0, false) - 1.5 * PI).abs() < 1e-12);
}

#[test]
fn draw_image_at_integer_offset_copies_pixels() {
    let mut src = CpuCanvas::new(4, 4).unwrap();
    src.set_fill_style(RED);
    src.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    let img = src.snapshot().unwrap();

    let mut dst = CpuCanvas::new(8, 8).unwrap();
    dst.draw_image(&img, 3.0, 3.0).unwrap();
    assert_eq!(px(&dst, 3, 3), [255, 0, 0, 255]);
    assert_eq!(px(&dst, 4, 4), [255, 0, 0, 255]);
    assert_eq!(px(&dst, 5, 5), [0, 0, 0, 0]);
    assert_eq!(px(&dst, 2, 2), [0, 0, 0, 0]);
}

#[test]
fn draw_image_rect_crops_source_region() {
    let mut src = CpuCanvas::new(6, 6).unwrap();
    src.set_fill_style(RED);
    src.fill_rect(2.0, 2.0, 2.0, 2.0).unwrap();
    let img = src.snapshot().unwrap();

    let mut dst = CpuCanvas::new(4, 4).unwrap();
    dst.draw_image_rect(
        &img,
        Rect::new(2.0, 2.0, 6.0, 6.0),
        Rect::new(0.0, 0.0, 4.0, 4.0),
    )
    .unwrap();
    assert_eq!(px(&dst, 0, 0), [255, 0, 0, 255]);
    assert_eq!(px(&dst, 1, 1), [255, 0, 0, 255]);
    assert_eq!(px(&dst, 2, 2), [0, 0, 0, 0]);
}

#[test]
fn scaled_draw_image_covers_destination() {
    let mut src = CpuCanvas::new(2, 2).unwrap();
    src.set_fill_style(RED);
    src.fill_rect(0.0, 0.0, 2.0, 2.0).unwrap();
    let img = src.snapshot().unwrap();

    let mut dst = CpuCanvas::new(16, 16).unwrap();
    dst.draw_image_rect(
        &img,
        Rect::new(0.0, 0.0, 2.0, 2.0),
        Rect::new(4.0, 4.0, 12.0, 12.0),
    )
    .unwrap();
    let center = px(&dst, 8, 8);
    assert!(center[0] > 200 && center[3] > 200, "{center:?}");
    assert_eq!(px(&dst, 1, 1), [0, 0, 0, 0]);
}

#[test]
fn clear_rect_erases_ignoring_shadow() {
    let mut c = CpuCanvas::new(8, 8).unwrap();
    c.set_fill_style(RED);
    c.fill_rect(0.0, 0.0, 8.0, 8.0).unwrap();
    c.set_shadow(ShadowProps::blurred(4.0, Rgba8::BLACK));
    c.clear_rect(2.0, 2.0, 4.0, 4.0).unwrap();
    assert_eq!(px(&c, 3, 3), [0, 0, 0, 0]);
    assert_eq!(px(&c, 0, 0), [255, 0, 0, 255]);
}

#[test]
fn integer_translation_detection() {
    let r = Rect::new(0.0, 0.0, 4.0, 4.0);
    assert_eq!(
        integer_translation(Affine::translate(Vec2::new(3.0, -2.0)), r),
        Some((3, -2))
    );
    assert_eq!(integer_translation(Affine::translate(Vec2::new(0.5, 0.0)), r), None);
    assert_eq!(integer_translation(Affine::scale(2.0), r), None);
}

#[test]
fn huge_shadow_offsets_move_the_shadow_off_surface() {
    for (ox, oy) in [(0.0, -1e19), (0.0, 1e19), (1e19, 0.0), (-1e19, 1e19)] {
        let mut c = CpuCanvas::new(10, 10).unwrap();
        c.set_fill_style(RED);
        c.set_shadow(ShadowProps {
            blur: 2.0,
            offset_x: ox,
            offset_y: oy,
            color: Rgba8::BLACK,
        });
        c.fill_rect(0.0, 0.0, 5.0, 5.0).unwrap();
        assert_eq!(px(&c, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px(&c, 8, 8), [0, 0, 0, 0], "offset ({ox}, {oy})");
    }
}

#[test]
fn malformed_image_is_rejected_not_blitted() {
    let img = ImageRGBA {
        width: 4,
        height: 4,
        data: vec![0; 8],
    };
    let mut c = CpuCanvas::new(8, 8).unwrap();
    assert!(matches!(c.draw_image(&img, 0.0, 0.0), Err(InsetError::Raster(_))));
    assert!(matches!(c.draw_image(&img, 0.5, 0.0), Err(InsetError::Raster(_))));
    assert!(c.pixels().iter().all(|&b| b == 0));
}
