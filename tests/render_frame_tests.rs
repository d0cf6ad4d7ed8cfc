use cartesian_chart::core::{Rect, Viewport};
use cartesian_chart::render::{
    Color, DrawingSurface, LinePrimitive, NullRenderer, PathPrimitive, RectPrimitive,
    RenderFrame, Renderer, TextHAlign, TextPrimitive,
};

fn black() -> Color {
    Color::rgb(0.0, 0.0, 0.0)
}

#[test]
fn null_renderer_counts_validated_primitives() {
    let mut frame = RenderFrame::new(Viewport::new(100, 50))
        .with_line(LinePrimitive::new(0.0, 0.0, 10.0, 10.0, 1.0, black()))
        .with_rect(RectPrimitive::new(1.0, 1.0, 5.0, 5.0, black()))
        .with_text(TextPrimitive::new("7", 3.0, 3.0, 11.0, black(), TextHAlign::Left));
    let mut path = PathPrimitive::new();
    path.move_to(0.0, 0.0).line_to(5.0, 5.0);
    frame.push_clip(Rect::new(0.0, 0.0, 50.0, 50.0));
    frame.draw_path(path.stroked(2.0, black()));
    frame.pop_clip();

    let mut renderer = NullRenderer::default();
    renderer.render(&frame).expect("render");
    assert_eq!(renderer.frames_rendered, 1);
    assert_eq!(renderer.last_command_count, 6);
    assert_eq!(
        (
            renderer.last_line_count,
            renderer.last_rect_count,
            renderer.last_text_count,
            renderer.last_path_count
        ),
        (1, 1, 1, 1)
    );
}

#[test]
fn unbalanced_clips_are_rejected() {
    let mut frame = RenderFrame::new(Viewport::new(100, 50));
    frame.push_clip(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert!(frame.validate().is_err());

    let mut frame = RenderFrame::new(Viewport::new(100, 50));
    frame.pop_clip();
    assert!(frame.validate().is_err());
}

#[test]
fn invalid_primitives_fail_validation() {
    let empty_text = RenderFrame::new(Viewport::new(10, 10)).with_text(TextPrimitive::new(
        "",
        0.0,
        0.0,
        10.0,
        black(),
        TextHAlign::Center,
    ));
    assert!(empty_text.validate().is_err());

    let bad_color = RenderFrame::new(Viewport::new(10, 10)).with_rect(RectPrimitive::new(
        0.0,
        0.0,
        1.0,
        1.0,
        Color::rgba(1.5, 0.0, 0.0, 1.0),
    ));
    assert!(bad_color.validate().is_err());

    let zero_width_line = RenderFrame::new(Viewport::new(10, 10))
        .with_line(LinePrimitive::new(0.0, 0.0, 1.0, 1.0, 0.0, black()));
    assert!(zero_width_line.validate().is_err());
}

#[test]
fn rects_from_edges_are_normalized() {
    let rect = RectPrimitive::from_edges(10.0, 80.0, 2.0, 20.0, black());
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (2.0, 20.0, 8.0, 60.0));
    assert_eq!((rect.right(), rect.bottom()), (10.0, 80.0));
}

#[test]
fn faded_colors_stay_in_range() {
    let color = Color::rgba(0.2, 0.3, 0.4, 0.8);
    assert_eq!(color.faded(0.5).alpha, 0.4);
    assert_eq!(color.faded(4.0).alpha, 1.0);
}
