//! Symmetry reduction of the projection matrix.
//!
//! A `DataSymmetries` engine knows the group of `SymmetryOperation`s under
//! which the projection matrix of a given scanner and image is invariant. It
//! partitions bins (and viewgrams, and voxels) into orbits, and picks one
//! *basic* representative per orbit: the smallest under the `BinKey` order.
//! Matrix rows are only ever computed for basic bins.

mod operation;
mod trivial;
mod cartesian;
mod related;

pub use operation::{admissible_subgroup, generate_group, SymmetryOperation};
pub use trivial::TrivialSymmetries;
pub use cartesian::{CartesianGridSymmetries, SymmetryConfig};
pub use related::{RelatedDensels, RelatedViewgrams};

use std::sync::Arc;

use crate::error::Result;
use crate::fov::FOV;
use crate::index::{index3_to_1, Index3_u};
use crate::projdata::{Bin, BinKey, ProjDataInfo, ViewgramIndices};

pub trait DataSymmetries: Send + Sync + std::fmt::Debug {

    fn name(&self) -> &'static str;

    /// The symmetry group, identity first. Every element is admissible for
    /// `proj_data_info()` and `fov()`.
    fn operations(&self) -> &[SymmetryOperation];

    fn proj_data_info(&self) -> &Arc<ProjDataInfo>;

    fn fov(&self) -> &FOV;

    /// The basic bin of `bin`'s orbit, and an operation which maps the basic
    /// bin onto `bin`. The basic bin carries `bin`'s value.
    fn find_basic_bin(&self, bin: &Bin) -> Result<(Bin, SymmetryOperation)> {
        let info = self.proj_data_info();
        info.check_bin(bin)?;
        Ok(self.operations().iter()
           .map(|g| (g.transform_bin(bin, info), g))
           .min_by_key(|(b, _)| b.key())
           .map(|(basic, g)| (basic, g.inverse()))
           .unwrap_or((*bin, SymmetryOperation::IDENTITY)))
    }

    fn is_basic(&self, bin: &Bin) -> Result<bool> {
        Ok(self.find_basic_bin(bin)?.0.key() == bin.key())
    }

    /// Every bin in `bin`'s orbit, each once, with the operation which maps
    /// the basic bin onto it. The basic bin comes first, with the identity.
    /// All related bins carry `bin`'s value.
    fn related_bins(&self, bin: &Bin) -> Result<Vec<(Bin, SymmetryOperation)>> {
        let (basic, _) = self.find_basic_bin(bin)?;
        Ok(self.orbit_of_basic_bin(&basic))
    }

    /// Orbit of a bin known to be valid and basic, in group order
    fn orbit_of_basic_bin(&self, basic: &Bin) -> Vec<(Bin, SymmetryOperation)> {
        let info = self.proj_data_info();
        let mut orbit: Vec<(Bin, SymmetryOperation)> = Vec::with_capacity(self.operations().len());
        for g in self.operations() {
            let related = g.transform_bin(basic, info);
            if !orbit.iter().any(|(b, _)| b.key() == related.key()) {
                orbit.push((related, *g));
            }
        }
        orbit
    }

    fn num_related_bins(&self, bin: &Bin) -> Result<usize> {
        Ok(self.related_bins(bin)?.len())
    }

    /// The basic viewgram of `v`'s orbit, and an operation mapping it onto `v`.
    /// The basic bin of any bin lies in the basic viewgram of its viewgram.
    fn basic_viewgram_indices(&self, v: ViewgramIndices) -> Result<(ViewgramIndices, SymmetryOperation)> {
        let info = self.proj_data_info();
        info.check_viewgram_indices(v)?;
        let key = |v: ViewgramIndices| (v.view_num, -v.segment_num, -v.timing_pos_num);
        Ok(self.operations().iter()
           .map(|g| (g.transform_viewgram_indices(v, info), g))
           .min_by_key(|(b, _)| key(*b))
           .map(|(basic, g)| (basic, g.inverse()))
           .unwrap_or((v, SymmetryOperation::IDENTITY)))
    }

    fn is_basic_viewgram(&self, v: ViewgramIndices) -> Result<bool> {
        Ok(self.basic_viewgram_indices(v)?.0 == v)
    }

    /// Every viewgram related to `v`, each once, with an operation mapping
    /// the basic viewgram onto it. The basic viewgram comes first.
    fn related_viewgram_indices(&self, v: ViewgramIndices) -> Result<Vec<(ViewgramIndices, SymmetryOperation)>> {
        let info = self.proj_data_info();
        let (basic, _) = self.basic_viewgram_indices(v)?;
        let mut related: Vec<(ViewgramIndices, SymmetryOperation)> = vec![];
        for g in self.operations() {
            let r = g.transform_viewgram_indices(basic, info);
            if !related.iter().any(|(x, _)| *x == r) { related.push((r, *g)) }
        }
        Ok(related)
    }

    /// Every basic viewgram of the projection data: between them, their
    /// related viewgrams cover every valid viewgram exactly once.
    fn all_basic_viewgram_indices(&self) -> Vec<ViewgramIndices> {
        self.proj_data_info()
            .all_viewgram_indices()
            .filter(|&v| matches!(self.is_basic_viewgram(v), Ok(true)))
            .collect()
    }

    /// The basic voxel of `voxel`'s orbit, and an operation mapping it onto
    /// `voxel`
    fn find_basic_densel(&self, voxel: Index3_u) -> Result<(Index3_u, SymmetryOperation)> {
        let fov = self.fov();
        fov.check_index(voxel)?;
        Ok(self.operations().iter()
           .map(|g| (g.transform_voxel(voxel, fov.n), g))
           .min_by_key(|(d, _)| index3_to_1(*d, fov.n))
           .map(|(basic, g)| (basic, g.inverse()))
           .unwrap_or((voxel, SymmetryOperation::IDENTITY)))
    }

    /// Every voxel related to `voxel`, each once, basic voxel first
    fn related_densels(&self, voxel: Index3_u) -> Result<Vec<(Index3_u, SymmetryOperation)>> {
        let n = self.fov().n;
        let (basic, _) = self.find_basic_densel(voxel)?;
        let mut related: Vec<(Index3_u, SymmetryOperation)> = vec![];
        for g in self.operations() {
            let d = g.transform_voxel(basic, n);
            if !related.iter().any(|(x, _)| *x == d) { related.push((d, *g)) }
        }
        Ok(related)
    }
}

/// Keys of the bins of `basic`'s orbit, as seen by the back projector
pub(crate) fn orbit_keys(symmetries: &dyn DataSymmetries, basic: &Bin) -> Vec<(BinKey, SymmetryOperation)> {
    symmetries.orbit_of_basic_bin(basic).into_iter().map(|(b, g)| (b.key(), g)).collect()
}
