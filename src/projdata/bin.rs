//! A single measured projection sample

use std::cmp::Ordering;
use std::ops::{AddAssign, DivAssign, MulAssign};

use crate::projdata::{SegmentIndices, SinogramIndices, ViewgramIndices};

/// Value stored in a `Bin` to flag it as rejected (e.g. by random rejection
/// of list-mode events). Producers upstream still emit this sentinel, so it
/// is preserved as the on-the-wire convention; consumers should use
/// [`Bin::sample`] rather than comparing against it.
pub const REJECTED_BIN_VALUE: f32 = -1.0;

/// One measured projection sample.
///
/// The index fields are fixed at construction; the value is a free-floating
/// accumulator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bin {
    segment_num: i32,
    view_num: i32,
    axial_pos_num: i32,
    tangential_pos_num: i32,
    timing_pos_num: i32,
    time_frame_num: i32,
    value: f32,
}

/// The index tuple of a `Bin`, without its value or time frame: the key under
/// which matrix rows are cached.
///
/// `BinKey`s are totally ordered by `(view, -segment, -timing, axial,
/// -tangential)`: the basic bin of a symmetry orbit is its smallest member
/// under this order. The viewgram components lead, so that the basic bin of
/// any bin lies in the basic viewgram of that bin's viewgram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BinKey {
    pub segment_num: i32,
    pub view_num: i32,
    pub axial_pos_num: i32,
    pub tangential_pos_num: i32,
    pub timing_pos_num: i32,
}

impl BinKey {
    fn order_tuple(&self) -> (i32, i32, i32, i32, i32) {
        (self.view_num, -self.segment_num, -self.timing_pos_num, self.axial_pos_num, -self.tangential_pos_num)
    }
}

impl Ord for BinKey {
    fn cmp(&self, other: &Self) -> Ordering { self.order_tuple().cmp(&other.order_tuple()) }
}

impl PartialOrd for BinKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Bin {

    pub fn new(segment_num: i32, view_num: i32, axial_pos_num: i32, tangential_pos_num: i32, value: f32) -> Self {
        Self::with_timing(segment_num, view_num, axial_pos_num, tangential_pos_num, 0, value)
    }

    pub fn with_timing(
        segment_num: i32,
        view_num: i32,
        axial_pos_num: i32,
        tangential_pos_num: i32,
        timing_pos_num: i32,
        value: f32,
    ) -> Self {
        Self { segment_num, view_num, axial_pos_num, tangential_pos_num, timing_pos_num, time_frame_num: 1, value }
    }

    pub fn from_key(key: BinKey, value: f32) -> Self {
        let BinKey { segment_num, view_num, axial_pos_num, tangential_pos_num, timing_pos_num } = key;
        Self::with_timing(segment_num, view_num, axial_pos_num, tangential_pos_num, timing_pos_num, value)
    }

    pub fn in_time_frame(mut self, time_frame_num: i32) -> Self {
        self.time_frame_num = time_frame_num;
        self
    }

    pub fn segment_num       (&self) -> i32 { self.segment_num }
    pub fn view_num          (&self) -> i32 { self.view_num }
    pub fn axial_pos_num     (&self) -> i32 { self.axial_pos_num }
    pub fn tangential_pos_num(&self) -> i32 { self.tangential_pos_num }
    pub fn timing_pos_num    (&self) -> i32 { self.timing_pos_num }
    pub fn time_frame_num    (&self) -> i32 { self.time_frame_num }

    pub fn value(&self) -> f32 { self.value }
    pub fn set_value(&mut self, value: f32) { self.value = value }

    /// The measured value, or `None` if the bin carries the rejection sentinel
    pub fn sample(&self) -> Option<f32> {
        if self.is_rejected() { None } else { Some(self.value) }
    }

    pub fn is_rejected(&self) -> bool { self.value == REJECTED_BIN_VALUE }

    pub fn reject(&mut self) { self.value = REJECTED_BIN_VALUE }

    pub fn key(&self) -> BinKey {
        BinKey {
            segment_num: self.segment_num,
            view_num: self.view_num,
            axial_pos_num: self.axial_pos_num,
            tangential_pos_num: self.tangential_pos_num,
            timing_pos_num: self.timing_pos_num,
        }
    }

    /// Same indices, zero value
    pub fn empty_copy(&self) -> Self { Self { value: 0.0, ..*self } }

    /// Same time frame and value, different indices
    pub(crate) fn with_key(&self, key: BinKey) -> Self {
        Self { time_frame_num: self.time_frame_num, ..Self::from_key(key, self.value) }
    }

    pub fn segment_indices(&self) -> SegmentIndices {
        SegmentIndices::new(self.segment_num, self.timing_pos_num)
    }

    pub fn viewgram_indices(&self) -> ViewgramIndices {
        ViewgramIndices::new(self.segment_num, self.view_num, self.timing_pos_num)
    }

    pub fn sinogram_indices(&self) -> SinogramIndices {
        SinogramIndices::new(self.segment_num, self.axial_pos_num, self.timing_pos_num)
    }
}

impl AddAssign<f32> for Bin {
    fn add_assign(&mut self, dx: f32) { self.value += dx }
}

impl MulAssign<f32> for Bin {
    fn mul_assign(&mut self, dx: f32) { self.value *= dx }
}

impl DivAssign<f32> for Bin {
    /// Division by zero yields zero
    fn div_assign(&mut self, dx: f32) {
        if dx == 0.0 { self.value = 0.0 }
        else         { self.value /= dx }
    }
}
