use std::fmt;

// ---------------------------------------------------------------------------
// Series / annotations
// ---------------------------------------------------------------------------

/// One HMM state code per sample. `0` means "not yet labeled".
pub type Label = i64;

/// The per-file raw numeric time series.
pub type Series = Vec<f64>;

/// Label vector aligned index-for-index with a [`Series`].
pub type Annotations = Vec<Label>;

/// Sentinel for positions nobody has labeled yet.
pub const UNSET: Label = 0;

/// Highest valid state code.
pub const MAX_LABEL: Label = 4;

// ---------------------------------------------------------------------------
// HmmState – the states the operator can paint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HmmState {
    Clean = 1,
    RfiRising = 2,
    RfiDecaying = 3,
    Blip = 4,
}

impl HmmState {
    pub const ALL: [HmmState; 4] = [
        HmmState::Clean,
        HmmState::RfiRising,
        HmmState::RfiDecaying,
        HmmState::Blip,
    ];

    pub fn label(self) -> Label {
        self as Label
    }

    pub fn from_label(label: Label) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn name(self) -> &'static str {
        match self {
            HmmState::Clean => "Clean",
            HmmState::RfiRising => "RFI-Rising",
            HmmState::RfiDecaying => "RFI-Decaying",
            HmmState::Blip => "Blip",
        }
    }
}

impl fmt::Display for HmmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State {} ({})", self.label(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_cover_one_through_max() {
        let codes: Vec<Label> = HmmState::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
        assert_eq!(HmmState::ALL.last().map(|s| s.label()), Some(MAX_LABEL));
        assert_eq!(HmmState::from_label(UNSET), None);
        assert_eq!(HmmState::from_label(3), Some(HmmState::RfiDecaying));
    }

    #[test]
    fn display_names_match_buttons() {
        assert_eq!(HmmState::Clean.to_string(), "State 1 (Clean)");
        assert_eq!(HmmState::Blip.to_string(), "State 4 (Blip)");
    }
}
