use std::collections::HashSet;

use crate::error::{ProjError, Result};
use crate::image::Image;
use crate::index::index3_to_1;
use crate::symmetries::SymmetryOperation;
use crate::types::{BoxDim_u, Index3_u, Intensityf32, Weightf32};

pub type SystemMatrixElement = (Index3_u, Weightf32);

/// The non-zero elements of one row of the projection matrix: the voxels
/// coupled to one bin, and the strength of each coupling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SystemMatrixRow(pub Vec<SystemMatrixElement>);

impl SystemMatrixRow {

    pub fn with_capacity(n: usize) -> Self { Self(Vec::with_capacity(n)) }

    pub fn iter(&self) -> std::slice::Iter<'_, SystemMatrixElement> { self.0.iter() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn push(&mut self, element: SystemMatrixElement) { self.0.push(element) }

    pub fn total_weight(&self) -> Weightf32 { self.0.iter().map(|(_, w)| w).sum() }

    /// Accumulation relies on each voxel appearing at most once
    pub fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.0.len());
        match self.0.iter().find(|(voxel, _)| !seen.insert(*voxel)) {
            None => Ok(()),
            Some((voxel, _)) => Err(ProjError::CacheInconsistency(format!("voxel {voxel:?} appears twice in row"))),
        }
    }

    /// The row of the bin onto which `g` maps this row's bin
    pub fn transformed(&self, g: &SymmetryOperation, n: BoxDim_u) -> Self { g.transform_row(self, n) }

    /// Projection of `image` into the bin related to this row's bin by `g`
    pub fn forward_project(&self, image: &Image, g: &SymmetryOperation) -> Intensityf32 {
        let n = image.fov.n;
        self.0.iter()
            .map(|&(voxel, weight)| weight * image.data[index3_to_1(g.transform_voxel(voxel, n), n)])
            .sum()
    }

    /// Accumulate `value` from the bin related to this row's bin by `g`, into
    /// the voxels of `buffer`
    pub fn back_project(&self, buffer: &mut [Intensityf32], n: BoxDim_u, g: &SymmetryOperation, value: Intensityf32) {
        for &(voxel, weight) in &self.0 {
            buffer[index3_to_1(g.transform_voxel(voxel, n), n)] += weight * value;
        }
    }
}

impl FromIterator<SystemMatrixElement> for SystemMatrixRow {
    fn from_iter<I: IntoIterator<Item = SystemMatrixElement>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

impl IntoIterator for SystemMatrixRow {
    type Item = SystemMatrixElement;
    type IntoIter = std::vec::IntoIter<Self::Item>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a SystemMatrixRow {
    type Item = &'a SystemMatrixElement;
    type IntoIter = std::slice::Iter<'a, SystemMatrixElement>;
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}
