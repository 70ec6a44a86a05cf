//! Construction of projection matrices and symmetry engines by name, as they
//! appear in configuration files.

use std::sync::Arc;

use crate::error::{ProjError, Result};
use crate::fov::FOV;
use crate::projdata::ProjDataInfo;
use crate::projmatrix::{CacheConfig, ProjMatrixByBin, RayTracingMatrix, SymmetryChoice, TabulatedMatrix};
use crate::symmetries::{CartesianGridSymmetries, DataSymmetries, SymmetryConfig, TrivialSymmetries};

pub type MatrixFactory = fn(SymmetryChoice, CacheConfig) -> Box<dyn ProjMatrixByBin>;

pub type SymmetriesFactory = fn(Arc<ProjDataInfo>, FOV, &SymmetryConfig) -> Result<Arc<dyn DataSymmetries>>;

const MATRICES: &[(&str, MatrixFactory)] = &[
    ("ray tracing", |s, c| Box::new(RayTracingMatrix::new(s, c))),
    ("tabulated"  , |s, _| Box::new(TabulatedMatrix::new(s))),
];

const SYMMETRIES: &[(&str, SymmetriesFactory)] = &[
    ("none"          , |info, fov, _| Ok(Arc::new(TrivialSymmetries::new(info, fov)))),
    ("cartesian grid", |info, fov, config| Ok(Arc::new(CartesianGridSymmetries::new(info, fov, config)?))),
];

fn lookup<T: Copy>(table: &[(&str, T)], kind: &'static str, name: &str) -> Result<T> {
    table.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| ProjError::UnknownName { kind, name: name.into() })
}

pub fn matrix_names() -> impl Iterator<Item = &'static str> { MATRICES.iter().map(|(n, _)| *n) }
pub fn symmetries_names() -> impl Iterator<Item = &'static str> { SYMMETRIES.iter().map(|(n, _)| *n) }

/// A projection matrix which still has to be `set_up`
pub fn make_matrix(name: &str, symmetries: SymmetryChoice, cache: CacheConfig) -> Result<Box<dyn ProjMatrixByBin>> {
    // Fail now rather than at set_up
    lookup(SYMMETRIES, "symmetries", &symmetries.symmetries)?;
    Ok(lookup(MATRICES, "projection matrix", name)?(symmetries, cache))
}

pub fn make_symmetries(name: &str, info: Arc<ProjDataInfo>, fov: FOV, config: &SymmetryConfig) -> Result<Arc<dyn DataSymmetries>> {
    lookup(SYMMETRIES, "symmetries", name)?(info, fov, config)
}
