use eframe::egui::{self, Key, Rect, Ui};
use lineage_explorer::EngineKey;

use super::super::ViewModel;
use super::super::render_utils::to_local;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.engine.zoom_at(to_local(rect, pointer), zoom_factor);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.engine.pan(response.drag_delta());
        }
    }

    pub(in crate::app) fn handle_graph_pointer(&mut self, rect: Rect, response: &egui::Response) {
        match response.hover_pos() {
            Some(pointer) => self.engine.pointer_moved(to_local(rect, pointer)),
            None => self.engine.pointer_left(),
        }

        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.engine.pointer_clicked(to_local(rect, pointer));
        }
    }

    pub(in crate::app) fn handle_graph_keys(&mut self, ui: &Ui) {
        if ui.ctx().wants_keyboard_input() {
            return;
        }

        let keys = ui.input(|input| {
            [
                (Key::Escape, EngineKey::Escape),
                (Key::Backspace, EngineKey::Backspace),
                (Key::Home, EngineKey::Home),
                (Key::F, EngineKey::Fit),
            ]
            .into_iter()
            .filter(|(key, _)| input.key_pressed(*key))
            .map(|(_, engine_key)| engine_key)
            .collect::<Vec<_>>()
        });
        for key in keys {
            self.engine.handle_key(key);
        }
    }
}
