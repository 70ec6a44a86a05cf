use std::sync::Arc;

use ndarray::{s, Array3, ArrayView3, ArrayViewMut3};

use crate::error::{check_range, ProjError, Result};
use crate::projdata::{
    info_mismatch, range_len, Characteristics, ProjDataInfo,
    SegmentIndices, Sinogram, SinogramIndices, Viewgram, ViewgramIndices,
};

/// Memory layout of a `Segment`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageOrder {
    /// `[view][axial][tangential]`: viewgrams are contiguous
    ByView,
    /// `[axial][view][tangential]`: sinograms are contiguous
    BySinogram,
}

/// 3D projection data at fixed segment and timing position.
#[derive(Clone, Debug)]
pub struct Segment {
    data: Array3<f32>,
    order: StorageOrder,
    indices: SegmentIndices,
    info: Arc<ProjDataInfo>,
}

impl Segment {

    pub fn new(info: Arc<ProjDataInfo>, indices: SegmentIndices, order: StorageOrder) -> Result<Self> {
        info.check_segment_indices(indices)?;
        let s = indices.segment_num;
        let (na, nv, nt) = (range_len(&info.valid_axial_range(s)),
                            range_len(&info.valid_view_range(s)),
                            range_len(&info.valid_tangential_range()));
        let shape = match order {
            StorageOrder::ByView     => (nv, na, nt),
            StorageOrder::BySinogram => (na, nv, nt),
        };
        Ok(Self { data: Array3::zeros(shape), order, indices, info })
    }

    pub fn storage_order(&self) -> StorageOrder { self.order }
    pub fn indices(&self) -> SegmentIndices { self.indices }
    pub fn segment_num(&self) -> i32 { self.indices.segment_num }
    pub fn timing_pos_num(&self) -> i32 { self.indices.timing_pos_num }
    pub fn proj_data_info(&self) -> &Arc<ProjDataInfo> { &self.info }

    pub fn axial_range     (&self) -> std::ops::RangeInclusive<i32> { self.info.valid_axial_range(self.segment_num()) }
    pub fn view_range      (&self) -> std::ops::RangeInclusive<i32> { self.info.valid_view_range(self.segment_num()) }
    pub fn tangential_range(&self) -> std::ops::RangeInclusive<i32> { self.info.valid_tangential_range() }

    /// The data, whatever the storage order, as `[axial][view][tangential]`
    pub fn by_sinogram(&self) -> ArrayView3<'_, f32> {
        match self.order {
            StorageOrder::BySinogram => self.data.view(),
            StorageOrder::ByView     => self.data.view().permuted_axes([1, 0, 2]),
        }
    }

    fn by_sinogram_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        match self.order {
            StorageOrder::BySinogram => self.data.view_mut(),
            StorageOrder::ByView     => self.data.view_mut().permuted_axes([1, 0, 2]),
        }
    }

    fn view_offset(&self, view_num: i32) -> Result<usize> {
        let r = self.view_range();
        check_range("view", view_num, &r)?;
        Ok((view_num - r.start()) as usize)
    }

    fn axial_offset(&self, axial_pos_num: i32) -> Result<usize> {
        let r = self.axial_range();
        check_range("axial position", axial_pos_num, &r)?;
        Ok((axial_pos_num - r.start()) as usize)
    }

    pub fn viewgram_indices(&self, view_num: i32) -> ViewgramIndices {
        ViewgramIndices::new(self.segment_num(), view_num, self.timing_pos_num())
    }

    pub fn sinogram_indices(&self, axial_pos_num: i32) -> SinogramIndices {
        SinogramIndices::new(self.segment_num(), axial_pos_num, self.timing_pos_num())
    }

    fn position(&self, view_num: i32, axial_pos_num: i32, tangential_pos_num: i32) -> Result<[usize; 3]> {
        let (v, a) = (self.view_offset(view_num)?, self.axial_offset(axial_pos_num)?);
        let r = self.tangential_range();
        check_range("tangential position", tangential_pos_num, &r)?;
        let t = (tangential_pos_num - r.start()) as usize;
        Ok(match self.order {
            StorageOrder::ByView     => [v, a, t],
            StorageOrder::BySinogram => [a, v, t],
        })
    }

    pub fn get(&self, view_num: i32, axial_pos_num: i32, tangential_pos_num: i32) -> Result<f32> {
        Ok(self.data[self.position(view_num, axial_pos_num, tangential_pos_num)?])
    }

    pub fn get_mut(&mut self, view_num: i32, axial_pos_num: i32, tangential_pos_num: i32) -> Result<&mut f32> {
        let p = self.position(view_num, axial_pos_num, tangential_pos_num)?;
        Ok(&mut self.data[p])
    }

    /// A new viewgram, with data copied from the segment
    pub fn get_viewgram(&self, view_num: i32) -> Result<Viewgram> {
        let v = self.view_offset(view_num)?;
        let data = self.by_sinogram().slice(s![.., v, ..]).to_owned();
        Viewgram::from_array(data, Arc::clone(&self.info), self.viewgram_indices(view_num))
    }

    /// A new sinogram, with data copied from the segment
    pub fn get_sinogram(&self, axial_pos_num: i32) -> Result<Sinogram> {
        let a = self.axial_offset(axial_pos_num)?;
        let data = self.by_sinogram().slice(s![a, .., ..]).to_owned();
        Sinogram::from_array(data, Arc::clone(&self.info), self.sinogram_indices(axial_pos_num))
    }

    /// Overwrite the viewgram with the same indices as `viewgram`
    pub fn set_viewgram(&mut self, viewgram: &Viewgram) -> Result<()> {
        self.check_info(viewgram.proj_data_info())?;
        self.check_segment(viewgram.indices().segment_indices())?;
        let v = self.view_offset(viewgram.view_num())?;
        self.by_sinogram_mut().slice_mut(s![.., v, ..]).assign(viewgram.data());
        Ok(())
    }

    /// Overwrite the sinogram with the same indices as `sinogram`
    pub fn set_sinogram(&mut self, sinogram: &Sinogram) -> Result<()> {
        self.set_sinogram_at(sinogram, sinogram.axial_pos_num())
    }

    /// Overwrite the sinogram at `axial_pos_num` with the data in `sinogram`,
    /// whatever the latter's own axial position
    pub fn set_sinogram_at(&mut self, sinogram: &Sinogram, axial_pos_num: i32) -> Result<()> {
        self.check_info(sinogram.proj_data_info())?;
        self.check_segment(sinogram.indices().segment_indices())?;
        let a = self.axial_offset(axial_pos_num)?;
        self.by_sinogram_mut().slice_mut(s![a, .., ..]).assign(sinogram.data());
        Ok(())
    }

    fn check_info(&self, info: &Arc<ProjDataInfo>) -> Result<()> {
        match info_mismatch(&self.info, info) {
            None      => Ok(()),
            Some(why) => Err(ProjError::CharacteristicsMismatch(why)),
        }
    }

    fn check_segment(&self, indices: SegmentIndices) -> Result<()> {
        if indices == self.indices { Ok(()) }
        else {
            Err(ProjError::CharacteristicsMismatch(format!(
                "segment indices {indices:?} do not belong in segment {:?}", self.indices
            )))
        }
    }

    pub fn empty_copy(&self) -> Self {
        Self { data: Array3::zeros(self.data.dim()), order: self.order, indices: self.indices, info: Arc::clone(&self.info) }
    }

    pub fn add_assign_checked(&mut self, other: &Self) -> Result<()> {
        self.check_characteristics(other)?;
        let other = other.by_sinogram();
        let mut this = self.by_sinogram_mut();
        this += &other;
        Ok(())
    }
}

impl Characteristics for Segment {
    fn characteristics_mismatch(&self, other: &Self) -> Option<String> {
        info_mismatch(&self.info, &other.info).or_else(|| {
            (self.indices != other.indices)
                .then(|| format!("different segment indices: {:?} vs {:?}", self.indices, other.indices))
        })
    }
}

/// Storage order is an implementation detail: segments holding the same values
/// compare equal whatever their layout.
impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.has_same_characteristics(other) && self.by_sinogram() == other.by_sinogram()
    }
}
