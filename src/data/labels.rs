use super::error::{Error, Result};
use super::model::{Label, MAX_LABEL, UNSET};

/// Which positions a label operation touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every position (bulk "set all clean").
    All,
    /// An explicit subset, typically from a plot selection.
    Indices(Vec<usize>),
}

/// What to do with selected positions past the end of the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Reject the whole operation, mutating nothing.
    Strict,
    /// Apply in-range positions; report the rest in [`LabelOutcome::skipped`].
    #[default]
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LabelOutcome {
    pub applied: usize,
    pub skipped: usize,
}

/// Set `vector[i] = label` for every selected position.
pub fn apply_label(
    vector: &mut [Label],
    selection: &Selection,
    label: Label,
    policy: IndexPolicy,
) -> Result<LabelOutcome> {
    if !(UNSET..=MAX_LABEL).contains(&label) {
        return Err(Error::InvalidLabel(label));
    }

    let indices = match selection {
        Selection::All => {
            vector.fill(label);
            return Ok(LabelOutcome {
                applied: vector.len(),
                skipped: 0,
            });
        }
        Selection::Indices(indices) => indices,
    };

    let len = vector.len();
    let out_of_range = indices.iter().filter(|&&i| i >= len).count();
    if out_of_range > 0 && policy == IndexPolicy::Strict {
        return Err(Error::IndexOutOfRange {
            count: out_of_range,
            len,
        });
    }

    for &i in indices.iter().filter(|&&i| i < len) {
        vector[i] = label;
    }

    Ok(LabelOutcome {
        applied: indices.len() - out_of_range,
        skipped: out_of_range,
    })
}

/// Number of positions still unlabeled.
pub fn validate_complete(vector: &[Label]) -> usize {
    vector.iter().filter(|&&v| v == UNSET).count()
}

pub fn ensure_complete(vector: &[Label]) -> Result<()> {
    match validate_complete(vector) {
        0 => Ok(()),
        missing => Err(Error::Validation { missing }),
    }
}

/// Sample positions whose x coordinate (the sample index) lies in `[lo, hi]`.
/// The bounds may arrive in either order and extend past the series.
pub fn indices_in_range(lo: f64, hi: f64, len: usize) -> Vec<usize> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if len == 0 || hi < 0.0 || !lo.is_finite() || !hi.is_finite() {
        return Vec::new();
    }
    let start = lo.max(0.0).ceil() as usize;
    let end = (hi.floor() as usize).min(len - 1);
    (start..=end).collect()
}
