//! Projection-space data model: bins, slice indices, the geometry
//! descriptor, and the 2D/3D views of the projection data.

mod bin;
mod indices;
mod info;
mod viewgram;
mod sinogram;
mod segment;
mod proj_data;

pub use bin::{Bin, BinKey, REJECTED_BIN_VALUE};
pub use indices::{SegmentIndices, SinogramIndices, ViewgramIndices};
pub use info::{ProjDataInfo, Scanner};
pub use viewgram::Viewgram;
pub use sinogram::Sinogram;
pub use segment::{Segment, StorageOrder};
pub use proj_data::ProjData;

#[cfg(test)]
pub(crate) use info::test_util;

use std::sync::Arc;
use crate::error::{ProjError, Result};

/// Objects which may only be combined element-wise if they describe the same
/// part of the same projection data: same geometry descriptor and same fixed
/// indices. Data content does not take part in the comparison.
pub trait Characteristics {

    /// Explanation of why `self` and `other` do *not* have the same
    /// characteristics, or `None` if they do.
    fn characteristics_mismatch(&self, other: &Self) -> Option<String>;

    fn has_same_characteristics(&self, other: &Self) -> bool {
        self.characteristics_mismatch(other).is_none()
    }

    /// Fail with `CharacteristicsMismatch` carrying the explanation
    fn check_characteristics(&self, other: &Self) -> Result<()> {
        match self.characteristics_mismatch(other) {
            None      => Ok(()),
            Some(why) => Err(ProjError::CharacteristicsMismatch(why)),
        }
    }
}

/// Shared part of the characteristics check: the geometry descriptors
pub(crate) fn info_mismatch(a: &Arc<ProjDataInfo>, b: &Arc<ProjDataInfo>) -> Option<String> {
    if Arc::ptr_eq(a, b) { return None }
    a.mismatch(b).map(|why| format!("different projection data info ({why})"))
}

pub(crate) fn range_len(range: &std::ops::RangeInclusive<i32>) -> usize {
    (range.end() - range.start() + 1).max(0) as usize
}
