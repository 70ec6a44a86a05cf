use std::sync::Arc;

use ndarray::Array2;

use crate::error::{check_range, ProjError, Result};
use crate::projdata::{info_mismatch, range_len, Characteristics, ProjDataInfo, SinogramIndices};

/// 2D projection data at fixed segment, axial position and timing position,
/// indexed by `(view_num, tangential_pos_num)`.
#[derive(Clone, Debug)]
pub struct Sinogram {
    data: Array2<f32>,
    indices: SinogramIndices,
    info: Arc<ProjDataInfo>,
}

impl Sinogram {

    pub fn new(info: Arc<ProjDataInfo>, indices: SinogramIndices) -> Result<Self> {
        info.check_segment_indices(indices.segment_indices())?;
        check_range("axial position", indices.axial_pos_num, &info.valid_axial_range(indices.segment_num))?;
        let shape = (range_len(&info.valid_view_range(indices.segment_num)),
                     range_len(&info.valid_tangential_range()));
        Ok(Self { data: Array2::zeros(shape), indices, info })
    }

    pub fn from_array(data: Array2<f32>, info: Arc<ProjDataInfo>, indices: SinogramIndices) -> Result<Self> {
        let mut sinogram = Self::new(info, indices)?;
        if data.dim() != sinogram.data.dim() {
            return Err(ProjError::GeometryMismatch(format!(
                "sinogram {indices:?} needs shape {:?}, got {:?}", sinogram.data.dim(), data.dim()
            )))
        }
        sinogram.data = data;
        Ok(sinogram)
    }

    pub fn indices(&self) -> SinogramIndices { self.indices }
    pub fn segment_num(&self) -> i32 { self.indices.segment_num }
    pub fn axial_pos_num(&self) -> i32 { self.indices.axial_pos_num }
    pub fn timing_pos_num(&self) -> i32 { self.indices.timing_pos_num }
    pub fn proj_data_info(&self) -> &Arc<ProjDataInfo> { &self.info }

    pub fn view_range      (&self) -> std::ops::RangeInclusive<i32> { self.info.valid_view_range(self.segment_num()) }
    pub fn tangential_range(&self) -> std::ops::RangeInclusive<i32> { self.info.valid_tangential_range() }
    pub fn num_views          (&self) -> usize { self.data.nrows() }
    pub fn num_tangential_poss(&self) -> usize { self.data.ncols() }

    pub fn data(&self) -> &Array2<f32> { &self.data }
    pub fn data_mut(&mut self) -> &mut Array2<f32> { &mut self.data }

    fn position(&self, view_num: i32, tangential_pos_num: i32) -> Result<(usize, usize)> {
        let (v, t) = (self.view_range(), self.tangential_range());
        check_range("view"               , view_num          , &v)?;
        check_range("tangential position", tangential_pos_num, &t)?;
        Ok(((view_num - v.start()) as usize, (tangential_pos_num - t.start()) as usize))
    }

    pub fn get(&self, view_num: i32, tangential_pos_num: i32) -> Result<f32> {
        Ok(self.data[self.position(view_num, tangential_pos_num)?])
    }

    pub fn get_mut(&mut self, view_num: i32, tangential_pos_num: i32) -> Result<&mut f32> {
        let p = self.position(view_num, tangential_pos_num)?;
        Ok(&mut self.data[p])
    }

    pub fn empty_copy(&self) -> Self {
        Self { data: Array2::zeros(self.data.dim()), indices: self.indices, info: Arc::clone(&self.info) }
    }

    pub fn add_assign_checked(&mut self, other: &Self) -> Result<()> {
        self.check_characteristics(other)?;
        self.data += &other.data;
        Ok(())
    }
}

impl Characteristics for Sinogram {
    fn characteristics_mismatch(&self, other: &Self) -> Option<String> {
        info_mismatch(&self.info, &other.info).or_else(|| {
            (self.indices != other.indices)
                .then(|| format!("different sinogram indices: {:?} vs {:?}", self.indices, other.indices))
        })
    }
}

impl PartialEq for Sinogram {
    fn eq(&self, other: &Self) -> bool {
        self.has_same_characteristics(other) && self.data == other.data
    }
}
