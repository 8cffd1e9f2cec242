use eframe::egui::Color32;
use hmm_annotator::data::model::{HmmState, Label};
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.5);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// State colours: HMM label → Color32
// ---------------------------------------------------------------------------

/// One colour per HMM state; unlabeled samples are grey.
#[derive(Debug, Clone)]
pub struct StatePalette {
    colors: Vec<Color32>,
    unset: Color32,
}

impl Default for StatePalette {
    fn default() -> Self {
        Self {
            colors: generate_palette(HmmState::ALL.len()),
            unset: Color32::GRAY,
        }
    }
}

impl StatePalette {
    pub fn color_for(&self, label: Label) -> Color32 {
        HmmState::from_label(label)
            .and_then(|s| self.colors.get(s.label() as usize - 1))
            .copied()
            .unwrap_or(self.unset)
    }

    /// Legend entries (state name → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(HmmState, Color32)> {
        HmmState::ALL
            .into_iter()
            .map(|s| (s, self.color_for(s.label())))
            .collect()
    }
}
