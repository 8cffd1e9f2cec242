use eframe::egui::{self, Color32, RichText, Ui};
use hmm_annotator::data::model::HmmState;
use hmm_annotator::data::Direction;

use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – current recording and pointing scope
// ---------------------------------------------------------------------------

pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Recording");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No storage root open.");
        return;
    };

    let Some(name) = session.current_name() else {
        ui.label("No recording selected.");
        return;
    };

    egui::Grid::new("recording_info").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("File");
        ui.label(name);
        ui.end_row();

        ui.label("Night");
        ui.label(session.night().unwrap_or("?"));
        ui.end_row();

        ui.label("Pointing");
        ui.label(session.pointing().map(String::from).unwrap_or_else(|| "?".into()));
        ui.end_row();

        ui.label("Quality");
        if session.is_bad() {
            ui.label(RichText::new("bad").color(Color32::RED).strong());
        } else {
            ui.label("good");
        }
        ui.end_row();

        ui.label("Unlabeled");
        ui.label(format!("{} / {}", session.missing(), session.series().len()));
        ui.end_row();

        ui.label("Selected");
        ui.label(state.selection.len().to_string());
        ui.end_row();
    });

    if session.is_modified() {
        ui.label(RichText::new("● unsaved changes").color(Color32::YELLOW));
    }

    ui.add_space(8.0);
    ui.strong("States");
    for (hmm_state, color) in state.palette.legend_entries() {
        ui.label(RichText::new(hmm_state.to_string()).color(color));
    }

    ui.add_space(8.0);
    ui.strong("Pointing");
    let scope = session.scope().to_string();
    let mut clicked = None;
    if ui.selectable_label(scope.is_empty(), "All pointings").clicked() {
        clicked = Some(None);
    }
    for p in 0..state.settings.pointings {
        let active = scope == AppState::scope_token(Some(p));
        if ui.selectable_label(active, format!("Pointing {p}")).clicked() {
            clicked = Some(Some(p));
        }
    }
    if let Some(pointing) = clicked {
        state.set_scope(pointing);
    }
}

// ---------------------------------------------------------------------------
// Bottom panel – label, navigation, quality and export buttons
// ---------------------------------------------------------------------------

pub fn controls(ui: &mut Ui, state: &mut AppState) {
    let has_file = state
        .session
        .as_ref()
        .is_some_and(|s| s.current_name().is_some());
    let has_selection = !state.selection.is_empty();

    ui.add_space(4.0);
    ui.horizontal(|ui: &mut Ui| {
        for hmm_state in HmmState::ALL {
            let color = state.palette.color_for(hmm_state.label());
            let button = egui::Button::new(
                RichText::new(format!("Set {hmm_state}")).color(Color32::WHITE),
            )
            .fill(color);
            if ui.add_enabled(has_file && has_selection, button).clicked() {
                state.set_state(hmm_state);
            }
        }
        ui.separator();
        if ui
            .add_enabled(has_file && has_selection, egui::Button::new("Clear selected"))
            .clicked()
        {
            state.clear_selected();
        }
        if ui
            .add_enabled(has_file, egui::Button::new("Set all clean"))
            .clicked()
        {
            state.set_all_clean();
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        let bounds = state.bounds;
        if ui
            .add_enabled(has_file && !bounds.at_first, egui::Button::new("< Previous Night"))
            .clicked()
        {
            state.navigate(Direction::Previous);
        }
        if ui
            .add_enabled(has_file && !bounds.at_last, egui::Button::new("Next Night >"))
            .clicked()
        {
            state.navigate(Direction::Next);
        }
        ui.separator();

        let is_bad = state.session.as_ref().is_some_and(|s| s.is_bad());
        let quality_label = if is_bad { "Mark good" } else { "Mark bad" };
        if ui
            .add_enabled(has_file, egui::Button::new(quality_label))
            .clicked()
        {
            state.toggle_quality();
        }
        ui.separator();

        if ui
            .add_enabled(has_file, egui::Button::new("Export Annotations"))
            .clicked()
        {
            state.export();
        }
    });
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open root…").clicked() {
                open_root_dialog(state);
                ui.close_menu();
            }
            let has_file = state.session.as_ref().is_some_and(|s| s.current_name().is_some());
            if ui.add_enabled(has_file, egui::Button::new("Save (incomplete)")).clicked() {
                state.save();
                ui.close_menu();
            }
            if ui.add_enabled(has_file, egui::Button::new("Revert unsaved changes")).clicked() {
                state.revert();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            ui.label(format!(
                "{} nights in scope, {} bad, {} labeled",
                state.counts.total, state.counts.bad, state.counts.labeled
            ));
            ui.label(RichText::new(session.root().display().to_string()).weak());
        }

        ui.separator();

        match &state.status_message {
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(Status::Info(msg)) => {
                ui.label(RichText::new(msg).color(Color32::LIGHT_GREEN));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_root_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open storage root (contains raw_data/)")
        .pick_folder();

    if let Some(path) = folder {
        log::info!("Opening storage root {}", path.display());
        state.open_root(&path);
    }
}
