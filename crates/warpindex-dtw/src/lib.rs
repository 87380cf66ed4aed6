//! Banded DTW distance, LB_Keogh lower bounds and DBA centroid refinement.
//!
//! Pure math library, no I/O. Distances are accumulated squared costs inside a
//! Sakoe-Chiba band whose radius widens to the length difference of the two
//! sequences, so any pair of non-empty sequences has a finite alignment.

mod band;
mod dba;
mod distance;
mod dtw;
mod envelope;
mod error;
mod series;

pub use band::WarpingBand;
pub use dba::{DbaConfig, DbaResult};
pub use distance::{DtwCost, DtwDistance};
pub use dtw::{DEFAULT_CAPACITY, Dtw};
pub use envelope::Envelope;
pub use error::{DbaError, DtwError};
pub use series::{TimeSeries, TimeSeriesView};
