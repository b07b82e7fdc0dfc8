use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Rect, Sense, Shape, Stroke, StrokeKind, Ui, vec2,
};
use lineage_explorer::scene::{Emphasis, LinkClass, LinkStyle, VisualLink, VisualNode};
use lineage_explorer::util::{format_count, format_lifespan, truncate_label};

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, dim_color, draw_background, rect_visible, shadow_offset, to_screen, trophic_color,
    with_alpha,
};

const LABEL_MIN_ZOOM: f32 = 0.35;
const DETAIL_MIN_ZOOM: f32 = 0.8;
const SELECTED_OUTLINE: Color32 = Color32::from_rgb(245, 206, 93);
const HOVERED_OUTLINE: Color32 = Color32::from_rgb(255, 164, 101);

fn link_color(link: &VisualLink) -> Color32 {
    let base = match link.class {
        LinkClass::Lineage => Color32::from_rgb(150, 170, 190),
        LinkClass::Subspecies => Color32::from_rgb(110, 196, 190),
        LinkClass::Hybrid => Color32::from_rgb(186, 140, 230),
    };
    let base = if link.highlighted {
        blend_color(base, Color32::WHITE, 0.35)
    } else {
        base
    };
    if link.extinct {
        dim_color(base, 0.6)
    } else {
        base
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.engine.set_viewport(rect.size());

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_graph_pointer(rect, &response);
        self.handle_graph_keys(ui);

        let dt = ui.input(|input| input.stable_dt) as f64;
        self.engine.tick(dt);

        if self.needs_initial_fit
            && !self.engine.is_rebuild_pending()
            && self.engine.fit_to_content()
        {
            self.needs_initial_fit = false;
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.engine.camera());

        if self.engine.scene().is_empty() && !self.engine.is_rebuild_pending() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No lineages to display",
                FontId::proportional(16.0),
                Color32::from_gray(180),
            );
        }

        self.draw_links(&painter, rect);
        self.draw_particles(&painter, rect);
        self.draw_nodes(&painter, rect);
        self.draw_hover_tooltip(response);

        // Particles and easing never come to rest.
        ui.ctx().request_repaint();
    }

    fn draw_links(&self, painter: &Painter, rect: Rect) {
        let camera = self.engine.camera();
        let zoom = camera.zoom();
        let links = self.engine.config().links;

        for link in self.engine.scene().links() {
            if !link.is_visible() {
                continue;
            }

            let bounds = link.path.bounds();
            let screen_bounds = Rect::from_two_pos(
                to_screen(rect, camera, bounds.min),
                to_screen(rect, camera, bounds.max),
            );
            if !rect_visible(rect, screen_bounds.expand(4.0)) {
                continue;
            }

            let stroke = Stroke::new(
                (link.width * zoom).max(0.6),
                with_alpha(link_color(link), link.alpha),
            );
            let to_screen_points = |points: &[egui::Pos2]| {
                points
                    .iter()
                    .map(|&point| to_screen(rect, camera, point))
                    .collect::<Vec<_>>()
            };

            match link.style {
                LinkStyle::Solid => {
                    painter.add(Shape::line(
                        to_screen_points(link.path.corners().as_slice()),
                        stroke,
                    ));
                }
                LinkStyle::Dashed => {
                    for dash in link.path.dashes(links.dash_length, links.gap_length) {
                        painter.add(Shape::line(to_screen_points(dash.as_slice()), stroke));
                    }
                }
            }
        }
    }

    fn draw_particles(&self, painter: &Painter, rect: Rect) {
        let camera = self.engine.camera();
        let radius = (2.6 * camera.zoom()).clamp(1.2, 5.0);
        for (point, alpha) in self.engine.scene().particle_points() {
            let position = to_screen(rect, camera, point);
            if !rect.contains(position) {
                continue;
            }
            painter.circle_filled(
                position,
                radius,
                with_alpha(Color32::from_rgb(236, 244, 255), alpha * 0.9),
            );
        }
    }

    fn draw_nodes(&self, painter: &Painter, rect: Rect) {
        let camera = self.engine.camera();
        let zoom = camera.zoom();
        let node_config = self.engine.config().node;

        for node in self.engine.draw_nodes() {
            if node.is_virtual() {
                let center = to_screen(rect, camera, node.center());
                painter.circle_stroke(
                    center,
                    (6.0 * zoom).max(2.0),
                    Stroke::new(1.0, Color32::from_gray(110)),
                );
                continue;
            }

            let bounds = node.bounds(&node_config);
            let screen = Rect::from_two_pos(
                to_screen(rect, camera, bounds.min),
                to_screen(rect, camera, bounds.max),
            );
            if !rect_visible(rect, screen.expand(12.0 * zoom)) {
                continue;
            }

            if node.look.shadow_alpha > 0.01 {
                let shadow = Rect::from_center_size(
                    screen.center() + shadow_offset(zoom),
                    screen.size() * node.look.shadow_scale,
                );
                painter.rect_filled(
                    shadow,
                    8.0 * zoom,
                    with_alpha(Color32::BLACK, node.look.shadow_alpha * 0.7),
                );
            }

            self.draw_card(painter, screen, node, zoom);
        }
    }

    fn draw_card(&self, painter: &Painter, screen: Rect, node: &VisualNode, zoom: f32) {
        let Some(record) = self.engine.record(node) else {
            return;
        };

        let mut fill = trophic_color(record.trophic_level);
        if record.is_extinct() {
            fill = dim_color(fill, 0.45);
        }
        let outline = match node.emphasis {
            Emphasis::Selected => Stroke::new(2.4, SELECTED_OUTLINE),
            Emphasis::Hovered => Stroke::new(1.8, HOVERED_OUTLINE),
            Emphasis::Idle => Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
        };
        let corner = 8.0 * zoom;
        painter.rect_filled(screen, corner, fill);
        painter.rect_stroke(screen, corner, outline, StrokeKind::Outside);

        if zoom >= LABEL_MIN_ZOOM {
            let text_color = if record.is_extinct() {
                Color32::from_gray(200)
            } else {
                Color32::from_gray(20)
            };
            let name_offset = if zoom >= DETAIL_MIN_ZOOM { -6.0 * zoom } else { 0.0 };
            painter.text(
                screen.center() + vec2(0.0, name_offset),
                Align2::CENTER_CENTER,
                truncate_label(record.display_name(), 18),
                FontId::proportional((12.0 * zoom).clamp(7.0, 20.0)),
                text_color,
            );
            if zoom >= DETAIL_MIN_ZOOM {
                painter.text(
                    screen.center() + vec2(0.0, 8.0 * zoom),
                    Align2::CENTER_CENTER,
                    format!("{} · {}", record.lineage_code, record.taxonomic_rank.label()),
                    FontId::monospace((9.0 * zoom).clamp(6.0, 14.0)),
                    text_color.gamma_multiply(0.8),
                );
            }
        }

        if node.collapsed && node.hidden_descendants > 0 {
            let badge = screen.right_bottom() + vec2(-2.0, -2.0) * zoom;
            painter.circle_filled(badge, (10.0 * zoom).max(4.0), Color32::from_rgb(40, 48, 60));
            painter.text(
                badge,
                Align2::CENTER_CENTER,
                format!("+{}", node.hidden_descendants),
                FontId::proportional((9.0 * zoom).clamp(6.0, 14.0)),
                Color32::from_gray(235),
            );
        }
    }

    fn draw_hover_tooltip(&self, response: egui::Response) {
        let Some(record) = self.engine.hovered().and_then(|id| self.engine.lookup(id)) else {
            return;
        };
        let collapsed = self.engine.is_collapsed(&record.lineage_code);

        response.on_hover_ui_at_pointer(|ui| {
            ui.strong(record.display_name());
            if !record.latin_name.is_empty() {
                ui.label(egui::RichText::new(&record.latin_name).italics());
            }
            ui.label(format!(
                "{} · {}",
                record.lineage_code,
                record.taxonomic_rank.label()
            ));
            ui.label(format_lifespan(record.birth_turn, record.extinction_turn));
            ui.label(format!("trophic level {:.2}", record.trophic_level));
            ui.label(format!(
                "{} descendants",
                format_count(record.descendant_count as usize)
            ));
            if collapsed {
                ui.label("collapsed");
            }
        });
    }
}
