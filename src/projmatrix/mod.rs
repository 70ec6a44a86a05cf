//! Projection matrices which compute rows for basic bins only, and serve the
//! rows of all other bins by moving the voxels of the basic row.

mod row;
mod cache;
mod ray_tracing;
mod tabulated;

pub use row::{SystemMatrixElement, SystemMatrixRow};
pub use cache::{CacheConfig, RowCache};
pub use ray_tracing::{siddon, RayTracingMatrix};
pub use tabulated::TabulatedMatrix;

use std::sync::Arc;

use crate::error::{ProjError, Result};
use crate::fov::FOV;
use crate::projdata::{Bin, ProjDataInfo};
use crate::registry;
use crate::symmetries::{DataSymmetries, SymmetryConfig};

pub trait ProjMatrixByBin: Send + Sync + std::fmt::Debug {

    fn name(&self) -> &'static str;

    /// Prepare for the given projection data and image geometries. Must
    /// succeed before any rows are requested. Forgets all cached rows.
    fn set_up(&mut self, info: Arc<ProjDataInfo>, fov: FOV) -> Result<()>;

    fn symmetries(&self) -> Result<&Arc<dyn DataSymmetries>>;

    /// Compute the row of a basic bin, bypassing the cache
    fn calculate_row(&self, basic: &Bin) -> Result<SystemMatrixRow>;

    fn cache(&self) -> &RowCache;

    /// The row of a basic bin. Asking for the row of any other bin is an
    /// error: use `row_for_bin` for those.
    fn get_row(&self, basic: &Bin) -> Result<Arc<SystemMatrixRow>> {
        if !self.symmetries()?.is_basic(basic)? { return Err(ProjError::NotBasic(basic.key())) }
        self.cache().get_or_compute(basic.key(), || {
            let row = self.calculate_row(basic)?;
            row.check_unique()?;
            Ok(row)
        })
    }

    /// The row of any bin, obtained by transforming the row of its basic bin
    fn row_for_bin(&self, bin: &Bin) -> Result<SystemMatrixRow> {
        let symmetries = self.symmetries()?;
        let (basic, g) = symmetries.find_basic_bin(bin)?;
        Ok(self.get_row(&basic)?.transformed(&g, symmetries.fov().n))
    }
}

/// What every matrix holds once it has been set up
#[derive(Debug, Clone)]
pub(crate) struct SetUp {
    pub info: Arc<ProjDataInfo>,
    pub fov: FOV,
    pub symmetries: Arc<dyn DataSymmetries>,
}

/// Which symmetries a matrix uses, by registered name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetryChoice {
    pub symmetries: String,
    pub generators: SymmetryConfig,
}

impl Default for SymmetryChoice {
    fn default() -> Self { Self { symmetries: "cartesian grid".into(), generators: SymmetryConfig::default() } }
}

impl SymmetryChoice {
    pub fn none() -> Self { Self { symmetries: "none".into(), ..Self::default() } }

    pub(crate) fn set_up(&self, info: Arc<ProjDataInfo>, fov: FOV) -> Result<SetUp> {
        let symmetries = registry::make_symmetries(&self.symmetries, Arc::clone(&info), fov, &self.generators)?;
        Ok(SetUp { info, fov, symmetries })
    }
}

pub(crate) fn not_set_up<'a, T>(state: &'a Option<T>, what: &'static str) -> Result<&'a T> {
    state.as_ref().ok_or(ProjError::NotSetUp(what))
}
