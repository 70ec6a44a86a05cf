use std::sync::Arc;

use ndarray::Array2;

use crate::error::{check_range, ProjError, Result};
use crate::projdata::{info_mismatch, range_len, Bin, Characteristics, ProjDataInfo, ViewgramIndices};

/// 2D projection data at fixed segment, view and timing position, indexed by
/// `(axial_pos_num, tangential_pos_num)`.
#[derive(Clone, Debug)]
pub struct Viewgram {
    data: Array2<f32>,
    indices: ViewgramIndices,
    info: Arc<ProjDataInfo>,
}

impl Viewgram {

    /// All values zero
    pub fn new(info: Arc<ProjDataInfo>, indices: ViewgramIndices) -> Result<Self> {
        info.check_viewgram_indices(indices)?;
        let shape = (range_len(&info.valid_axial_range(indices.segment_num)),
                     range_len(&info.valid_tangential_range()));
        Ok(Self { data: Array2::zeros(shape), indices, info })
    }

    pub fn from_array(data: Array2<f32>, info: Arc<ProjDataInfo>, indices: ViewgramIndices) -> Result<Self> {
        let mut viewgram = Self::new(info, indices)?;
        if data.dim() != viewgram.data.dim() {
            return Err(ProjError::GeometryMismatch(format!(
                "viewgram {indices:?} needs shape {:?}, got {:?}", viewgram.data.dim(), data.dim()
            )))
        }
        viewgram.data = data;
        Ok(viewgram)
    }

    pub fn indices(&self) -> ViewgramIndices { self.indices }
    pub fn segment_num(&self) -> i32 { self.indices.segment_num }
    pub fn view_num(&self) -> i32 { self.indices.view_num }
    pub fn timing_pos_num(&self) -> i32 { self.indices.timing_pos_num }
    pub fn proj_data_info(&self) -> &Arc<ProjDataInfo> { &self.info }

    pub fn axial_range     (&self) -> std::ops::RangeInclusive<i32> { self.info.valid_axial_range(self.segment_num()) }
    pub fn tangential_range(&self) -> std::ops::RangeInclusive<i32> { self.info.valid_tangential_range() }
    pub fn num_axial_poss     (&self) -> usize { self.data.nrows() }
    pub fn num_tangential_poss(&self) -> usize { self.data.ncols() }

    pub fn data(&self) -> &Array2<f32> { &self.data }
    pub fn data_mut(&mut self) -> &mut Array2<f32> { &mut self.data }

    fn position(&self, axial_pos_num: i32, tangential_pos_num: i32) -> Result<(usize, usize)> {
        let (a, t) = (self.axial_range(), self.tangential_range());
        check_range("axial position"     , axial_pos_num     , &a)?;
        check_range("tangential position", tangential_pos_num, &t)?;
        Ok(((axial_pos_num - a.start()) as usize, (tangential_pos_num - t.start()) as usize))
    }

    pub fn get(&self, axial_pos_num: i32, tangential_pos_num: i32) -> Result<f32> {
        Ok(self.data[self.position(axial_pos_num, tangential_pos_num)?])
    }

    pub fn get_mut(&mut self, axial_pos_num: i32, tangential_pos_num: i32) -> Result<&mut f32> {
        let p = self.position(axial_pos_num, tangential_pos_num)?;
        Ok(&mut self.data[p])
    }

    /// The bin at the given position, carrying the value stored here
    pub fn bin(&self, axial_pos_num: i32, tangential_pos_num: i32) -> Result<Bin> {
        let ViewgramIndices { segment_num, view_num, timing_pos_num } = self.indices;
        let value = self.get(axial_pos_num, tangential_pos_num)?;
        Ok(Bin::with_timing(segment_num, view_num, axial_pos_num, tangential_pos_num, timing_pos_num, value))
    }

    /// Same characteristics, all values zero
    pub fn empty_copy(&self) -> Self {
        Self { data: Array2::zeros(self.data.dim()), indices: self.indices, info: Arc::clone(&self.info) }
    }

    pub fn add_assign_checked(&mut self, other: &Self) -> Result<()> {
        self.check_characteristics(other)?;
        self.data += &other.data;
        Ok(())
    }
}

impl Characteristics for Viewgram {
    fn characteristics_mismatch(&self, other: &Self) -> Option<String> {
        info_mismatch(&self.info, &other.info).or_else(|| {
            (self.indices != other.indices)
                .then(|| format!("different viewgram indices: {:?} vs {:?}", self.indices, other.indices))
        })
    }
}

impl PartialEq for Viewgram {
    fn eq(&self, other: &Self) -> bool {
        self.has_same_characteristics(other) && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projdata::{test_util, Scanner};

    fn viewgram(info: ProjDataInfo, view: i32) -> Viewgram {
        Viewgram::new(Arc::new(info), ViewgramIndices::new(1, view, 0)).unwrap()
    }

    #[test]
    fn shape_follows_segment() {
        let v = viewgram(test_util::info(), 2);
        assert_eq!((v.num_axial_poss(), v.num_tangential_poss()), (3, 7));
    }

    #[test]
    fn signed_tangential_indexing() {
        let mut v = viewgram(test_util::info(), 2);
        *v.get_mut(2, -3).unwrap() = 7.0;
        assert_eq!(v.get(2, -3), Ok(7.0));
        assert_eq!(v.data()[(2, 0)], 7.0);
        assert_eq!(v.bin(2, -3).unwrap(), Bin::new(1, 2, 2, -3, 7.0));
        assert!(matches!(v.get(3, 0), Err(ProjError::OutOfRange { .. })));
    }

    #[test]
    fn different_view_range_is_a_characteristics_mismatch() {
        let a = viewgram(test_util::info(), 2);
        let b = viewgram(ProjDataInfo::new(Scanner { num_views: 4, ..test_util::scanner() }).unwrap(), 2);
        assert!(!a.has_same_characteristics(&b));
        let why = a.characteristics_mismatch(&b).unwrap();
        assert!(!why.is_empty());
        assert!(why.contains("view range"), "{why}");
    }

    #[test]
    fn data_does_not_affect_characteristics() {
        let info = Arc::new(test_util::info());
        let a = Viewgram::new(Arc::clone(&info), ViewgramIndices::new(0, 1, 0)).unwrap();
        let mut b = a.empty_copy();
        b.data_mut().fill(3.0);
        assert!(a.has_same_characteristics(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn checked_addition() {
        let info = Arc::new(test_util::info());
        let mut a = Viewgram::new(Arc::clone(&info), ViewgramIndices::new(0, 1, 0)).unwrap();
        let mut b = a.empty_copy();
        b.data_mut().fill(2.0);
        a.add_assign_checked(&b).unwrap();
        a.add_assign_checked(&b).unwrap();
        assert!(a.data().iter().all(|&x| x == 4.0));

        let c = Viewgram::new(info, ViewgramIndices::new(0, 2, 0)).unwrap();
        assert!(matches!(a.add_assign_checked(&c), Err(ProjError::CharacteristicsMismatch(_))));
        assert!(a.data().iter().all(|&x| x == 4.0));
    }
}
