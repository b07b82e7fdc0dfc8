use eframe::egui::{Pos2, Rect, Vec2, vec2};

use crate::config::CameraConfig;

/// Pan offset (screen position of the world origin) plus a uniform zoom.
///
/// Screen coordinates are local to the canvas: `(0, 0)` is its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    offset: Vec2,
    zoom: f32,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            config,
        };
        camera.reset();
        camera
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set(&mut self, offset: Vec2, zoom: f32) {
        self.offset = offset;
        self.zoom = self.clamp_zoom(zoom);
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        if zoom.is_finite() {
            zoom.clamp(self.config.min_zoom, self.config.max_zoom)
        } else {
            self.config.home_zoom
        }
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset) / self.zoom).to_pos2()
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.zoom + self.offset).to_pos2()
    }

    /// Multiplies the zoom by `factor`, keeping the world point under `anchor` in place.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let world_before = self.screen_to_world(anchor);
        self.zoom = self.clamp_zoom(self.zoom * factor);
        self.offset = anchor.to_vec2() - world_before.to_vec2() * self.zoom;
    }

    /// Screen-space pan; not scaled by zoom.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn reset(&mut self) {
        let [x, y] = self.config.home_offset;
        self.offset = vec2(x, y);
        self.zoom = self.clamp_zoom(self.config.home_zoom);
    }

    /// Frames every point in the viewport. Returns `false` (camera untouched) when there
    /// is nothing to frame or the viewport has no area.
    pub fn fit_to_content(
        &mut self,
        points: impl IntoIterator<Item = Pos2>,
        viewport: Vec2,
    ) -> bool {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return false;
        }

        let mut bounds = Rect::NOTHING;
        for point in points {
            bounds.extend_with(point);
        }
        if bounds.min.x > bounds.max.x {
            return false;
        }

        let bounds = bounds.expand(self.config.fit_margin);
        let width = bounds.width().max(self.config.min_fit_extent);
        let height = bounds.height().max(self.config.min_fit_extent);

        let zoom = (viewport.x / width)
            .min(viewport.y / height)
            .min(self.config.fit_zoom_cap)
            * self.config.fit_shrink;
        self.zoom = self.clamp_zoom(zoom);
        self.offset = viewport * 0.5 - bounds.center().to_vec2() * self.zoom;
        true
    }

    /// Moves `world` to the middle of the viewport without changing zoom.
    pub fn center_on(&mut self, world: Pos2, viewport: Vec2) {
        self.offset = viewport * 0.5 - world.to_vec2() * self.zoom;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
