use eframe::egui::{self, Key, Response, Ui};
use lineage_explorer::EngineKey;

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
    step: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    if increase_down {
        hold_state.positive_secs += delta_time;
    } else {
        hold_state.positive_secs = 0.0;
    }

    if decrease_down {
        hold_state.negative_secs += delta_time;
    } else {
        hold_state.negative_secs = 0.0;
    }

    let direction = (increase_down as i8) - (decrease_down as i8);
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let delta = direction as f32 * step * speed * delta_time;

    let old_value = *value;
    *value = (*value + delta).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn spacing_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    label: &str,
    hint: &str,
) -> bool {
    let (min, max) = (*range.start(), *range.end());
    let slider = ui
        .add(
            egui::Slider::new(value, range)
                .step_by(5.0)
                .text(label)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if slider.hovered() {
        slider.request_focus();
    }
    let mut changed = slider.changed();
    changed |= apply_slider_arrow_acceleration(ui, &slider, value, min, max, 5.0);
    changed
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Lineage Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();

        let mut spacing_changed = spacing_slider(
            ui,
            &mut self.spacing_x,
            60.0..=400.0,
            "Sibling spacing",
            "Horizontal distance between neighbouring lineages.",
        );
        spacing_changed |= spacing_slider(
            ui,
            &mut self.spacing_y,
            60.0..=300.0,
            "Generation spacing",
            "Vertical distance between generations.",
        );
        if spacing_changed {
            self.engine.set_spacing(self.spacing_x, self.spacing_y);
        }

        ui.separator();

        ui.horizontal_wrapped(|ui| {
            if ui
                .button("Collapse all")
                .on_hover_text("Hide the descendants of every lineage that has any.")
                .clicked()
            {
                self.engine.collapse_all();
            }
            if ui
                .button("Expand all")
                .on_hover_text("Show every descendant again.")
                .clicked()
            {
                self.engine.expand_all();
            }
        });

        let selected = self.engine.selected().map(str::to_owned);
        ui.add_enabled_ui(selected.is_some(), |ui| {
            ui.horizontal_wrapped(|ui| {
                let Some(id) = selected.as_deref() else {
                    ui.label("No lineage selected");
                    return;
                };
                let collapse_label = if self.engine.is_collapsed(id) {
                    "Expand selected"
                } else {
                    "Collapse selected"
                };
                if ui
                    .add_enabled(self.engine.has_children(id), egui::Button::new(collapse_label))
                    .clicked()
                {
                    self.engine.toggle_collapse(id);
                }
                if ui
                    .button("Focus selected")
                    .on_hover_text("Show only this lineage's ancestors and descendants.")
                    .clicked()
                {
                    self.engine.focus_lineage(id);
                }
            });
        });

        if ui
            .add_enabled(self.engine.focus().is_some(), egui::Button::new("Show all lineages"))
            .on_hover_text("Leave the focused lineage (Esc or Backspace).")
            .clicked()
        {
            self.engine.clear_focus();
        }

        if ui
            .checkbox(&mut self.show_all_hybrid_links, "Show all hybrid links")
            .on_hover_text(
                "Draw every secondary hybrid parent link, not only the hovered or selected ones.",
            )
            .changed()
        {
            self.engine
                .set_show_all_hybrid_links(self.show_all_hybrid_links);
        }

        ui.separator();

        ui.horizontal_wrapped(|ui| {
            if ui
                .button("Reset view")
                .on_hover_text("Return the camera to its home position (Home).")
                .clicked()
            {
                self.engine.handle_key(EngineKey::Home);
            }
            if ui
                .button("Fit to content")
                .on_hover_text("Frame every visible lineage (F).")
                .clicked()
            {
                self.engine.handle_key(EngineKey::Fit);
            }
        });
        ui.label(format!("zoom {:.2}×", self.engine.camera().zoom()));

        ui.separator();

        ui.checkbox(&mut self.show_fps_bar, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");
        ui.collapsing("FPS Display tuning", |ui| {
            ui.add_enabled_ui(self.show_fps_bar, |ui| {
                ui.checkbox(&mut self.fps_show_current, "Show current FPS")
                    .on_hover_text("Display the most recent frame rate sample.");
                ui.checkbox(&mut self.fps_show_average, "Show average FPS")
                    .on_hover_text("Display the running average FPS over recent samples.");
                ui.checkbox(&mut self.fps_show_frame_time, "Show frame time")
                    .on_hover_text("Display frame duration in milliseconds.");
            });
        });
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (name or lineage code)")
            .on_hover_text("Fuzzy-match the displayed lineages; Enter selects the best match.");
        let response = ui.text_edit_singleline(&mut self.search);
        if response.changed() {
            self.search_missed = false;
        }
        let submitted =
            response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

        ui.horizontal(|ui| {
            let find_clicked = ui.button("Find").clicked();
            if (submitted || find_clicked) && !self.search.trim().is_empty() {
                self.run_search();
            }
            if self.search_missed {
                ui.label(egui::RichText::new("no match").weak());
            }
        });
    }

    fn run_search(&mut self) {
        let found = self
            .engine
            .find_node(&self.search)
            .map(|node| node.lineage_code.clone());
        self.search_missed = found.is_none();
        if let Some(id) = found {
            self.engine.select(Some(&id));
            self.engine.center_on(&id);
        }
    }
}
