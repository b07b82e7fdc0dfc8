use eframe::egui::{self, Align, Context, Layout, RichText};
use lineage_explorer::util::{format_count, format_lifespan};

use super::super::{DataSource, ViewModel};

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &DataSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Lineage Explorer");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload snapshot"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                    ui.separator();
                    self.draw_focus_breadcrumb(ui);
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                        ui.label(self.stats_text());
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::TopBottomPanel::bottom("selection")
            .resizable(false)
            .show(ctx, |ui| self.draw_selection_summary(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        self.apply_engine_events();
    }

    fn stats_text(&self) -> String {
        let stats = self.engine.stats();
        let mut text = format!(
            "{} / {} lineages | {} links | {} collapsed",
            format_count(stats.visible_nodes),
            format_count(stats.records),
            format_count(stats.edges),
            stats.collapsed,
        );
        if stats.reparented_orphans > 0 {
            text.push_str(&format!(" | {} orphans", stats.reparented_orphans));
        }
        if stats.unreachable > 0 {
            text.push_str(&format!(" | {} unreachable", stats.unreachable));
        }
        text
    }

    fn draw_focus_breadcrumb(&mut self, ui: &mut egui::Ui) {
        let Some(focus) = self.engine.focus().map(str::to_owned) else {
            ui.label(RichText::new("all lineages").weak());
            return;
        };

        if ui
            .link("all lineages")
            .on_hover_text("Leave the focused lineage (Esc).")
            .clicked()
        {
            self.engine.clear_focus();
            return;
        }

        let name = self
            .engine
            .lookup(&focus)
            .map(|node| node.display_name().to_owned())
            .unwrap_or_else(|| focus.clone());
        ui.label("›");
        ui.label(RichText::new(name).strong())
            .on_hover_text(format!("Focused lineage {focus}"));
    }

    fn draw_selection_summary(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let Some(node) = &self.selected_record else {
                ui.label(
                    RichText::new("Click a lineage to select it, double-click to focus it.").weak(),
                );
                return;
            };

            ui.label(RichText::new(node.display_name()).strong());
            if !node.latin_name.is_empty() && node.latin_name != node.display_name() {
                ui.label(RichText::new(&node.latin_name).italics());
            }
            ui.separator();
            ui.label(&node.lineage_code);
            ui.separator();
            ui.label(node.taxonomic_rank.label());
            ui.separator();
            ui.label(format_lifespan(node.birth_turn, node.extinction_turn));
            ui.separator();
            ui.label(format!("trophic {:.2}", node.trophic_level));
            ui.separator();
            ui.label(format!("{} descendants", format_count(node.descendant_count as usize)));
        });
    }
}
