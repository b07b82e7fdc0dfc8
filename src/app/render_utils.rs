use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};
use lineage_explorer::camera::Camera;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, camera: &Camera) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * camera.zoom().clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + camera.offset();
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn to_screen(rect: Rect, camera: &Camera, world: Pos2) -> Pos2 {
    camera.world_to_screen(world) + rect.min.to_vec2()
}

pub(super) fn to_local(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

pub(super) fn rect_visible(viewport: Rect, bounds: Rect) -> bool {
    viewport.intersects(bounds)
}

pub(super) fn trophic_color(level: f32) -> Color32 {
    const BANDS: [(f32, Color32); 4] = [
        (1.0, Color32::from_rgb(92, 176, 112)),
        (2.0, Color32::from_rgb(196, 178, 84)),
        (3.0, Color32::from_rgb(222, 128, 72)),
        (4.0, Color32::from_rgb(196, 72, 92)),
    ];

    if !level.is_finite() || level <= BANDS[0].0 {
        return BANDS[0].1;
    }
    for pair in BANDS.windows(2) {
        let (low, low_color) = pair[0];
        let (high, high_color) = pair[1];
        if level <= high {
            return blend_color(low_color, high_color, (level - low) / (high - low));
        }
    }
    BANDS[BANDS.len() - 1].1
}

pub(super) fn shadow_offset(zoom: f32) -> Vec2 {
    Vec2::new(0.0, 6.0 * zoom)
}
