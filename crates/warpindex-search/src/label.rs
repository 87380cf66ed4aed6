use std::fmt;

use serde::{Deserialize, Serialize};

use warpindex_dtw::TimeSeries;

/// Integer class label of a reference sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabel(i32);

impl ClassLabel {
    /// Wrap a raw class label.
    #[must_use]
    pub fn new(label: i32) -> Self {
        Self(label)
    }

    /// Return the raw class label.
    #[must_use]
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference sequence with its class label and global dataset index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSequence {
    /// The sequence itself.
    pub series: TimeSeries,
    /// Class of the sequence.
    pub label: ClassLabel,
    /// Position of the sequence in the caller's dataset.
    pub index: usize,
}

impl LabeledSequence {
    /// Bundle a sequence with its label and dataset index.
    #[must_use]
    pub fn new(series: TimeSeries, label: ClassLabel, index: usize) -> Self {
        Self {
            series,
            label,
            index,
        }
    }
}
