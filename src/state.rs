use std::path::Path;

use hmm_annotator::data::labels::{self, Selection};
use hmm_annotator::data::model::{HmmState, Label, UNSET};
use hmm_annotator::data::{Bounds, Counts, DatasetSession, Direction, Error};

use crate::color::StatePalette;
use crate::config::Settings;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Open storage root (None until the user opens one).
    pub session: Option<DatasetSession>,

    pub settings: Settings,

    /// Sample positions picked on the series plot.
    pub selection: Vec<usize>,

    /// Plot x coordinate where the current selection drag began.
    pub drag_start: Option<f64>,

    /// Cached after every mutation; `count_labeled` reads every file.
    pub counts: Counts,
    pub bounds: Bounds,

    pub palette: StatePalette,

    /// Status / error message shown in the UI.
    pub status_message: Option<Status>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            session: None,
            settings,
            selection: Vec::new(),
            drag_start: None,
            counts: Counts::default(),
            bounds: Bounds {
                at_first: true,
                at_last: true,
            },
            palette: StatePalette::default(),
            status_message: None,
        }
    }

    pub fn open_root(&mut self, root: &Path) {
        match DatasetSession::open(root, self.settings.session) {
            Ok(session) => {
                if session.count_total() == 0 {
                    self.status_message = Some(Status::Info(format!(
                        "No recordings in {}",
                        root.display()
                    )));
                } else {
                    self.status_message = None;
                }
                self.session = Some(session);
                self.after_move();
            }
            Err(e) => self.report(e),
        }
    }

    /// Pointing filter token for a button: `None` is "all pointings".
    pub fn scope_token(pointing: Option<u8>) -> String {
        pointing.map(|p| format!("p{p}")).unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Mutators driven by the panels
    // -----------------------------------------------------------------------

    pub fn set_state(&mut self, state: HmmState) {
        let selection = Selection::Indices(self.selection.clone());
        self.apply(&selection, state.label());
    }

    pub fn set_all_clean(&mut self) {
        self.apply(&Selection::All, HmmState::Clean.label());
    }

    pub fn clear_selected(&mut self) {
        let selection = Selection::Indices(self.selection.clone());
        self.apply(&selection, UNSET);
    }

    fn apply(&mut self, selection: &Selection, label: Label) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.label(selection, label) {
            Ok(outcome) if outcome.skipped > 0 => {
                self.status_message = Some(Status::Info(format!(
                    "Ignored {} point(s) outside the series",
                    outcome.skipped
                )));
            }
            Ok(_) => {}
            Err(e) => self.report(e),
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.navigate(direction) {
            Ok(_) => self.after_move(),
            Err(e) => self.report(e),
        }
    }

    pub fn set_scope(&mut self, pointing: Option<u8>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.set_pointing_scope(&Self::scope_token(pointing)) {
            Ok(_) => self.after_move(),
            Err(e) => self.report(e),
        }
    }

    pub fn toggle_quality(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = session.toggle_quality();
        // A partial rename still moved the data file.
        self.after_move();
        if let Err(e) = result {
            self.report(e);
        }
    }

    pub fn save(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.save() {
            Ok(path) => {
                self.status_message = Some(Status::Info(format!(
                    "Annotations saved in {}",
                    path.display()
                )));
                self.refresh_counts();
            }
            Err(e) => self.report(e),
        }
    }

    /// Save only when every point is labeled.
    pub fn export(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.export() {
            Ok(path) => {
                self.status_message = Some(Status::Info(format!(
                    "Annotations successfully saved in {}",
                    path.display()
                )));
                self.refresh_counts();
            }
            Err(Error::Validation { missing }) => {
                self.status_message = Some(Status::Error(format!(
                    "Export blocked: {missing} unannotated point(s) remain. \
                     Label all points before exporting."
                )));
            }
            Err(e) => self.report(e),
        }
    }

    pub fn revert(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.revert() {
            self.report(e);
        }
    }

    // -----------------------------------------------------------------------
    // Selection on the series plot
    // -----------------------------------------------------------------------

    pub fn select_range(&mut self, lo: f64, hi: f64) {
        let len = self.session.as_ref().map_or(0, |s| s.series().len());
        self.selection = labels::indices_in_range(lo, hi, len);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.drag_start = None;
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    /// A different recording became current.
    fn after_move(&mut self) {
        self.clear_selection();
        if let Some(session) = &self.session {
            self.bounds = session.bounds();
        }
        self.refresh_counts();
    }

    fn refresh_counts(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        match session.counts() {
            Ok(counts) => self.counts = counts,
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, e: Error) {
        log::error!("{e}");
        self.status_message = Some(Status::Error(format!("Error: {e}")));
    }
}
