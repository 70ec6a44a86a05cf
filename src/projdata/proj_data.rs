use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ProjError, Result};
use crate::projdata::{
    info_mismatch, Bin, ProjDataInfo, REJECTED_BIN_VALUE, Segment, SegmentIndices, StorageOrder, Viewgram, ViewgramIndices,
};
use crate::symmetries::{DataSymmetries, RelatedViewgrams};

/// The whole of the projection data, held in memory one `Segment` per
/// segment and timing position.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjData {
    info: Arc<ProjDataInfo>,
    segments: BTreeMap<SegmentIndices, Segment>,
}

impl ProjData {

    pub fn new_zeros(info: Arc<ProjDataInfo>, order: StorageOrder) -> Result<Self> {
        let segments = info.all_segment_indices()
            .map(|s| Ok((s, Segment::new(Arc::clone(&info), s, order)?)))
            .collect::<Result<_>>()?;
        Ok(Self { info, segments })
    }

    pub fn proj_data_info(&self) -> &Arc<ProjDataInfo> { &self.info }

    pub fn segment(&self, s: SegmentIndices) -> Result<&Segment> {
        self.info.check_segment_indices(s)?;
        self.segments.get(&s).ok_or(ProjError::out_of_range("segment", s.segment_num, &self.info.valid_segment_range()))
    }

    fn segment_mut(&mut self, s: SegmentIndices) -> Result<&mut Segment> {
        self.info.check_segment_indices(s)?;
        let range = self.info.valid_segment_range();
        self.segments.get_mut(&s).ok_or(ProjError::out_of_range("segment", s.segment_num, &range))
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> { self.segments.values() }

    pub fn viewgram(&self, v: ViewgramIndices) -> Result<Viewgram> {
        self.segment(v.segment_indices())?.get_viewgram(v.view_num)
    }

    pub fn set_viewgram(&mut self, viewgram: &Viewgram) -> Result<()> {
        self.segment_mut(viewgram.indices().segment_indices())?.set_viewgram(viewgram)
    }

    /// The viewgrams related to `v` under `symmetries`, with data copied from here
    pub fn related_viewgrams(&self, v: ViewgramIndices, symmetries: Arc<dyn DataSymmetries>) -> Result<RelatedViewgrams> {
        if let Some(why) = info_mismatch(&self.info, symmetries.proj_data_info()) {
            return Err(ProjError::GeometryMismatch(why))
        }
        let viewgrams = symmetries.related_viewgram_indices(v)?
            .into_iter()
            .map(|(indices, _)| self.viewgram(indices))
            .collect::<Result<Vec<_>>>()?;
        RelatedViewgrams::from_viewgrams(viewgrams, symmetries)
    }

    pub fn set_related_viewgrams(&mut self, related: &RelatedViewgrams) -> Result<()> {
        related.viewgrams().iter().try_for_each(|v| self.set_viewgram(v))
    }

    pub fn bin_value(&self, bin: &Bin) -> Result<f32> {
        self.info.check_bin(bin)?;
        self.segment(bin.segment_indices())?
            .get(bin.view_num(), bin.axial_pos_num(), bin.tangential_pos_num())
    }

    /// Store `bin`'s value (the rejection sentinel included) at its position
    pub fn set_bin_value(&mut self, bin: &Bin) -> Result<()> {
        *self.value_mut(bin)? = bin.value();
        Ok(())
    }

    /// Histogram `bin` into the data: add its value at its position. Rejected
    /// bins are skipped.
    pub fn add_bin(&mut self, bin: &Bin) -> Result<()> {
        let slot = self.value_mut(bin)?;
        if let Some(value) = bin.sample() { *slot += value }
        Ok(())
    }

    fn value_mut(&mut self, bin: &Bin) -> Result<&mut f32> {
        self.info.check_bin(bin)?;
        self.segment_mut(bin.segment_indices())?
            .get_mut(bin.view_num(), bin.axial_pos_num(), bin.tangential_pos_num())
    }

    /// Sum over all bins, rejected ones excluded
    pub fn sum(&self) -> f32 {
        self.segments.values()
            .map(|s| s.by_sinogram().iter().filter(|&&x| x != REJECTED_BIN_VALUE).sum::<f32>())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projdata::test_util;
    use crate::symmetries::test_util::cartesian;
    use rstest::rstest;

    fn zeros(order: StorageOrder) -> ProjData {
        ProjData::new_zeros(Arc::new(test_util::info()), order).unwrap()
    }

    #[rstest(order, case(StorageOrder::ByView), case(StorageOrder::BySinogram))]
    fn histogramming(order: StorageOrder) {
        let mut data = zeros(order);
        let bin = Bin::new(-1, 3, 2, 1, 1.5);
        data.add_bin(&bin).unwrap();
        data.add_bin(&bin).unwrap();
        let mut rejected = bin;
        rejected.reject();
        data.add_bin(&rejected).unwrap();
        assert_eq!(data.bin_value(&bin), Ok(3.0));
        assert_eq!(data.sum(), 3.0);
        assert!(data.add_bin(&Bin::new(-1, 3, 3, 1, 1.0)).is_err());
    }

    #[test]
    fn rejected_value_can_be_stored() {
        let mut data = zeros(StorageOrder::ByView);
        let mut bin = Bin::new(0, 0, 0, 0, 0.0);
        bin.reject();
        data.set_bin_value(&bin).unwrap();
        assert!(Bin::from_key(bin.key(), data.bin_value(&bin).unwrap()).is_rejected());
        assert_eq!(data.sum(), 0.0);
    }

    #[test]
    fn related_viewgrams_round_trip() {
        let sym = cartesian();
        let mut data = zeros(StorageOrder::BySinogram);
        data.set_bin_value(&Bin::new(1, 7, 0, 3, 2.0)).unwrap();
        let mut related = data.related_viewgrams(ViewgramIndices::new(1, 7, 0), Arc::clone(&sym)).unwrap();
        let key = Bin::new(1, 7, 0, 3, 0.0).key();
        assert_eq!(related.bin(key).map(|b| b.value()), Some(2.0));
        *related.value_mut(key).unwrap() = 5.0;
        data.set_related_viewgrams(&related).unwrap();
        assert_eq!(data.bin_value(&Bin::new(1, 7, 0, 3, 0.0)), Ok(5.0));
        assert_eq!(data.sum(), 5.0);
    }

    #[test]
    fn symmetries_of_other_geometry_are_rejected() {
        let info = ProjDataInfo::new(crate::projdata::Scanner { num_views: 4, ..test_util::scanner() }).unwrap();
        let data = ProjData::new_zeros(Arc::new(info), StorageOrder::ByView).unwrap();
        assert!(matches!(data.related_viewgrams(ViewgramIndices::new(0, 0, 0), cartesian()),
                         Err(ProjError::GeometryMismatch(_))));
    }
}
