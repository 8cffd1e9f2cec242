use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points, VLine};
use hmm_annotator::data::model::{HmmState, MAX_LABEL};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Series + annotation plots (central panel)
// ---------------------------------------------------------------------------

/// Samples as `[index, value]` plot points.
fn indexed(values: &[f64]) -> Vec<[f64; 2]> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| [i as f64, v])
        .collect()
}

/// Render the series plot (drag to select samples) above the annotation plot.
pub fn plots(ui: &mut Ui, state: &mut AppState) {
    let Some(session) = &state.session else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a storage root to start labeling  (File → Open root…)");
        });
        return;
    };
    if session.current_name().is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No recordings in the current pointing scope");
        });
        return;
    }

    let title = format!(
        "SSINS Background-Subtracted Time-Series (Night of {}, pointing {})",
        session.night().unwrap_or("?"),
        session.pointing().map(String::from).unwrap_or_else(|| "?".into()),
    );

    let series = session.series();
    let len = series.len() as f64;
    let series_points = indexed(series);
    let selected_points: Vec<[f64; 2]> = state
        .selection
        .iter()
        .filter_map(|&i| series.get(i).map(|&y| [i as f64, y]))
        .collect();

    // Annotation line as stored, plus one marker group per state.
    let labels = session.annotations();
    let annotation_line: Vec<[f64; 2]> = labels
        .iter()
        .enumerate()
        .map(|(i, &l)| [i as f64, l as f64])
        .collect();
    let state_markers: Vec<(HmmState, Color32, Vec<[f64; 2]>)> = state
        .palette
        .legend_entries()
        .into_iter()
        .map(|(hmm_state, color)| {
            let pts = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == hmm_state.label())
                .map(|(i, &l)| [i as f64, l as f64])
                .collect();
            (hmm_state, color, pts)
        })
        .collect();

    let drag_start = state.drag_start;
    let series_height = ui.available_height() * 0.55;

    ui.label(RichText::new(title).heading());

    // ---- Series plot ----
    let response = Plot::new("series_plot")
        .height(series_height)
        .legend(Legend::default())
        .x_axis_label("Frequency Step")
        .y_axis_label("Amplitude Across DTV-7")
        .include_x(-5.0)
        .include_x(len + 5.0)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(series_points))
                    .radius(3.0)
                    .color(Color32::LIGHT_BLUE)
                    .name("SSINS"),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(selected_points))
                    .radius(4.5)
                    .color(Color32::RED)
                    .name("Selected"),
            );

            let pointer_x = plot_ui.pointer_coordinate().map(|p| p.x);
            if let (Some(start), Some(x)) = (drag_start, pointer_x) {
                plot_ui.vline(VLine::new(start).color(Color32::RED));
                plot_ui.vline(VLine::new(x).color(Color32::RED));
            }
            pointer_x
        });

    let pointer_x = response.inner;
    if response.response.drag_started() {
        state.drag_start = pointer_x;
    }
    if response.response.drag_stopped() {
        if let (Some(start), Some(x)) = (state.drag_start, pointer_x) {
            state.select_range(start, x);
        }
        state.drag_start = None;
    } else if response.response.clicked() {
        // A click picks the nearest sample.
        if let Some(x) = pointer_x {
            let nearest = x.round();
            state.select_range(nearest, nearest);
        }
    }

    // ---- Annotation plot ----
    Plot::new("annotation_plot")
        .legend(Legend::default())
        .x_axis_label("Frequency Step")
        .y_axis_label("HMM State")
        .include_x(-5.0)
        .include_x(len + 5.0)
        .include_y(0.5)
        .include_y(MAX_LABEL as f64 + 0.5)
        .allow_drag(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(annotation_line))
                    .color(Color32::RED)
                    .width(2.0)
                    .name("Annotations"),
            );
            for (hmm_state, color, pts) in state_markers {
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .radius(3.0)
                        .color(color)
                        .name(hmm_state.name()),
                );
            }
        });
}
