use eframe::egui;
use hmm_annotator::data::model::HmmState;
use hmm_annotator::data::Direction;

use crate::config::Settings;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AnnotatorApp {
    pub state: AppState,
}

impl AnnotatorApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        shortcuts(ctx, &mut self.state);

        // ---- Top panel: menu bar + counts ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: labeling / navigation controls ----
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            panels::controls(ui, &mut self.state);
        });

        // ---- Left side panel: recording info + pointing scope ----
        egui::SidePanel::left("info_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: series + annotation plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::plots(ui, &mut self.state);
        });
    }
}

/// Arrow keys navigate, 1-4 paint the selection, Escape clears it.
fn shortcuts(ctx: &egui::Context, state: &mut AppState) {
    if ctx.wants_keyboard_input() {
        return;
    }
    let (prev, next, escape, painted) = ctx.input(|i| {
        let painted = [
            (egui::Key::Num1, HmmState::Clean),
            (egui::Key::Num2, HmmState::RfiRising),
            (egui::Key::Num3, HmmState::RfiDecaying),
            (egui::Key::Num4, HmmState::Blip),
        ]
        .into_iter()
        .find(|(key, _)| i.key_pressed(*key))
        .map(|(_, s)| s);
        (
            i.key_pressed(egui::Key::ArrowLeft),
            i.key_pressed(egui::Key::ArrowRight),
            i.key_pressed(egui::Key::Escape),
            painted,
        )
    });

    if prev {
        state.navigate(Direction::Previous);
    }
    if next {
        state.navigate(Direction::Next);
    }
    if escape {
        state.clear_selection();
    }
    if let Some(s) = painted {
        state.set_state(s);
    }
}
