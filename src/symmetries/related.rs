use std::sync::Arc;

use crate::error::{ProjError, Result};
use crate::index::Index3_u;
use crate::projdata::{info_mismatch, Bin, BinKey, Characteristics, ProjDataInfo, Viewgram, ViewgramIndices};
use crate::symmetries::{DataSymmetries, SymmetryOperation};

/// The viewgrams related by symmetry to one basic viewgram, each with an
/// operation which maps the basic viewgram onto it. Never empty: the basic
/// viewgram comes first, with the identity.
#[derive(Clone, Debug)]
pub struct RelatedViewgrams {
    viewgrams: Vec<Viewgram>,
    operations: Vec<SymmetryOperation>,
    symmetries: Arc<dyn DataSymmetries>,
}

impl RelatedViewgrams {

    /// Zero-valued viewgrams related to `v` (which need not be basic)
    pub fn zeros(v: ViewgramIndices, symmetries: Arc<dyn DataSymmetries>) -> Result<Self> {
        let info = symmetries.proj_data_info();
        let (viewgrams, operations) = symmetries.related_viewgram_indices(v)?
            .into_iter()
            .map(|(indices, g)| Ok((Viewgram::new(Arc::clone(info), indices)?, g)))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();
        Ok(Self { viewgrams, operations, symmetries })
    }

    /// Wrap existing viewgrams. They must be exactly the viewgrams related to
    /// the first of them, in the order in which `symmetries` lists them.
    pub fn from_viewgrams(viewgrams: Vec<Viewgram>, symmetries: Arc<dyn DataSymmetries>) -> Result<Self> {
        let first = viewgrams.first()
            .ok_or_else(|| ProjError::GeometryMismatch("no viewgrams in related viewgram set".into()))?
            .indices();
        let expected = symmetries.related_viewgram_indices(first)?;
        let got: Vec<ViewgramIndices> = viewgrams.iter().map(Viewgram::indices).collect();
        if expected.iter().map(|(v, _)| *v).ne(got.iter().copied()) {
            return Err(ProjError::GeometryMismatch(format!(
                "viewgrams {got:?} are not the related viewgrams {:?}", expected.iter().map(|(v, _)| v).collect::<Vec<_>>()
            )))
        }
        for viewgram in &viewgrams {
            if let Some(why) = info_mismatch(viewgram.proj_data_info(), symmetries.proj_data_info()) {
                return Err(ProjError::GeometryMismatch(why))
            }
        }
        let operations = expected.into_iter().map(|(_, g)| g).collect();
        Ok(Self { viewgrams, operations, symmetries })
    }

    pub fn basic_indices(&self) -> ViewgramIndices { self.viewgrams[0].indices() }
    pub fn symmetries(&self) -> &Arc<dyn DataSymmetries> { &self.symmetries }
    pub fn proj_data_info(&self) -> &Arc<ProjDataInfo> { self.symmetries.proj_data_info() }

    pub fn len(&self) -> usize { self.viewgrams.len() }
    pub fn is_empty(&self) -> bool { false }

    pub fn iter(&self) -> impl Iterator<Item = (&Viewgram, &SymmetryOperation)> {
        self.viewgrams.iter().zip(self.operations.iter())
    }

    pub fn viewgrams(&self) -> &[Viewgram] { &self.viewgrams }
    pub fn into_viewgrams(self) -> Vec<Viewgram> { self.viewgrams }

    pub fn viewgram(&self, v: ViewgramIndices) -> Option<&Viewgram> {
        self.viewgrams.iter().find(|x| x.indices() == v)
    }

    pub fn viewgram_mut(&mut self, v: ViewgramIndices) -> Option<&mut Viewgram> {
        self.viewgrams.iter_mut().find(|x| x.indices() == v)
    }

    /// The bin with the given indices and the value stored for it here, or
    /// `None` if it belongs in none of these viewgrams
    pub fn bin(&self, key: BinKey) -> Option<Bin> {
        let v = ViewgramIndices::new(key.segment_num, key.view_num, key.timing_pos_num);
        let value = self.viewgram(v)?.get(key.axial_pos_num, key.tangential_pos_num).ok()?;
        Some(Bin::from_key(key, value))
    }

    pub fn value_mut(&mut self, key: BinKey) -> Option<&mut f32> {
        let v = ViewgramIndices::new(key.segment_num, key.view_num, key.timing_pos_num);
        self.viewgram_mut(v)?.get_mut(key.axial_pos_num, key.tangential_pos_num).ok()
    }

    /// Same characteristics, all values zero
    pub fn empty_copy(&self) -> Self {
        Self {
            viewgrams: self.viewgrams.iter().map(Viewgram::empty_copy).collect(),
            operations: self.operations.clone(),
            symmetries: Arc::clone(&self.symmetries),
        }
    }

    pub fn add_assign_checked(&mut self, other: &Self) -> Result<()> {
        self.check_characteristics(other)?;
        for (this, that) in self.viewgrams.iter_mut().zip(&other.viewgrams) {
            this.add_assign_checked(that)?;
        }
        Ok(())
    }
}

impl Characteristics for RelatedViewgrams {
    fn characteristics_mismatch(&self, other: &Self) -> Option<String> {
        if self.viewgrams.len() != other.viewgrams.len() {
            return Some(format!("{} vs {} related viewgrams", self.viewgrams.len(), other.viewgrams.len()))
        }
        self.viewgrams.iter().zip(&other.viewgrams)
            .find_map(|(a, b)| a.characteristics_mismatch(b))
    }
}

/// The voxels related by symmetry to one basic voxel, basic voxel first
#[derive(Clone, Debug)]
pub struct RelatedDensels {
    densels: Vec<(Index3_u, SymmetryOperation)>,
    symmetries: Arc<dyn DataSymmetries>,
}

impl RelatedDensels {

    pub fn new(voxel: Index3_u, symmetries: Arc<dyn DataSymmetries>) -> Result<Self> {
        let densels = symmetries.related_densels(voxel)?;
        Ok(Self { densels, symmetries })
    }

    pub fn basic(&self) -> Index3_u { self.densels[0].0 }
    pub fn symmetries(&self) -> &Arc<dyn DataSymmetries> { &self.symmetries }
    pub fn len(&self) -> usize { self.densels.len() }
    pub fn is_empty(&self) -> bool { false }
    pub fn iter(&self) -> impl Iterator<Item = &(Index3_u, SymmetryOperation)> { self.densels.iter() }
}
