//! Lightweight tuples identifying 2D and 3D slices of the projection data.
//!
//! Equality is structural. They are embedded by value in `Viewgram`,
//! `Sinogram` and `Segment`.

/// Identifies a `Segment`: all bins sharing a ring difference and a timing
/// position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentIndices {
    pub segment_num: i32,
    pub timing_pos_num: i32,
}

/// Identifies a `Viewgram`: a segment restricted to one view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewgramIndices {
    pub segment_num: i32,
    pub view_num: i32,
    pub timing_pos_num: i32,
}

/// Identifies a `Sinogram`: a segment restricted to one axial position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinogramIndices {
    pub segment_num: i32,
    pub axial_pos_num: i32,
    pub timing_pos_num: i32,
}

impl SegmentIndices {
    pub fn new(segment_num: i32, timing_pos_num: i32) -> Self { Self { segment_num, timing_pos_num } }
}

impl ViewgramIndices {
    pub fn new(segment_num: i32, view_num: i32, timing_pos_num: i32) -> Self {
        Self { segment_num, view_num, timing_pos_num }
    }

    pub fn segment_indices(&self) -> SegmentIndices {
        SegmentIndices::new(self.segment_num, self.timing_pos_num)
    }
}

impl SinogramIndices {
    pub fn new(segment_num: i32, axial_pos_num: i32, timing_pos_num: i32) -> Self {
        Self { segment_num, axial_pos_num, timing_pos_num }
    }

    pub fn segment_indices(&self) -> SegmentIndices {
        SegmentIndices::new(self.segment_num, self.timing_pos_num)
    }
}

impl From<ViewgramIndices> for SegmentIndices {
    fn from(v: ViewgramIndices) -> Self { v.segment_indices() }
}

impl From<SinogramIndices> for SegmentIndices {
    fn from(s: SinogramIndices) -> Self { s.segment_indices() }
}
