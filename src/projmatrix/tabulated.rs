use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ProjError, Result};
use crate::fov::FOV;
use crate::projdata::{Bin, BinKey, ProjDataInfo};
use crate::projmatrix::{not_set_up, CacheConfig, ProjMatrixByBin, RowCache, SetUp, SymmetryChoice, SystemMatrixRow};
use crate::symmetries::DataSymmetries;

/// A matrix whose rows are given explicitly, for basic bins only. Basic bins
/// without a row couple to no voxels.
#[derive(Debug)]
pub struct TabulatedMatrix {
    rows: HashMap<BinKey, SystemMatrixRow>,
    symmetries: SymmetryChoice,
    cache: RowCache,
    state: Option<SetUp>,
}

impl TabulatedMatrix {

    pub fn new(symmetries: SymmetryChoice) -> Self {
        // Rows are already held in memory
        Self { rows: HashMap::new(), symmetries, cache: RowCache::new(CacheConfig::disabled()), state: None }
    }

    /// Set the row of a basic bin. Must be called after `set_up`. Setting up
    /// again for a different geometry forgets all rows.
    pub fn insert_row(&mut self, basic: &Bin, row: SystemMatrixRow) -> Result<()> {
        let SetUp { fov, symmetries, .. } = not_set_up(&self.state, "tabulated matrix")?;
        if !symmetries.is_basic(basic)? { return Err(ProjError::NotBasic(basic.key())) }
        row.check_unique()?;
        for &(voxel, _) in row.iter() { fov.check_index(voxel)? }
        self.rows.insert(basic.key(), row);
        Ok(())
    }
}

impl ProjMatrixByBin for TabulatedMatrix {

    fn name(&self) -> &'static str { "tabulated" }

    fn set_up(&mut self, info: Arc<ProjDataInfo>, fov: FOV) -> Result<()> {
        fov.check_valid()?;
        let same_geometry = self.state.as_ref()
            .map_or(false, |old| *old.info == *info && old.fov == fov);
        self.state = Some(self.symmetries.set_up(info, fov)?);
        if !same_geometry { self.rows.clear() }
        Ok(())
    }

    fn symmetries(&self) -> Result<&Arc<dyn DataSymmetries>> {
        Ok(&not_set_up(&self.state, "tabulated matrix")?.symmetries)
    }

    fn calculate_row(&self, basic: &Bin) -> Result<SystemMatrixRow> {
        let SetUp { info, .. } = not_set_up(&self.state, "tabulated matrix")?;
        info.check_bin(basic)?;
        Ok(self.rows.get(&basic.key()).cloned().unwrap_or_default())
    }

    fn cache(&self) -> &RowCache { &self.cache }
}
