use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::fov::FOV;
use crate::projdata::ProjDataInfo;
use crate::symmetries::{admissible_subgroup, generate_group, DataSymmetries, SymmetryOperation};

/// Which generators of the symmetry group to use. All enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SymmetryConfig {
    /// Rotation by 90° about the scanner axis
    pub rotate_90: bool,
    /// Reflection `x -> -x`
    pub reflect_transaxial: bool,
    /// Reflection in the central transaxial plane
    pub reflect_axial: bool,
}

impl Default for SymmetryConfig {
    fn default() -> Self { Self { rotate_90: true, reflect_transaxial: true, reflect_axial: true } }
}

/// Symmetries of a cylindrical scanner imaging into a voxel grid centred on
/// its axis: the elements of the group generated by the enabled generators
/// which map valid bins to valid bins and voxels to voxels. With all
/// generators enabled, a square grid and a number of views divisible by 2,
/// that is 16 operations.
#[derive(Debug, Clone)]
pub struct CartesianGridSymmetries {
    info: Arc<ProjDataInfo>,
    fov: FOV,
    operations: Vec<SymmetryOperation>,
}

impl CartesianGridSymmetries {

    pub fn new(info: Arc<ProjDataInfo>, fov: FOV, config: &SymmetryConfig) -> Result<Self> {
        fov.check_valid()?;
        let SymmetryConfig { rotate_90, reflect_transaxial, reflect_axial } = *config;
        let generators: Vec<_> = [
            (rotate_90         , SymmetryOperation::rotate_90()),
            (reflect_transaxial, SymmetryOperation::reflect_x()),
            (reflect_axial     , SymmetryOperation::reflect_axial()),
        ].into_iter().filter_map(|(on, g)| on.then_some(g)).collect();
        let group = generate_group(&generators);
        let group_order = group.len();
        let operations = admissible_subgroup(group, &info, &fov);
        debug!(generated = group_order, admissible = operations.len(), "cartesian grid symmetries");
        Ok(Self { info, fov, operations })
    }
}

impl DataSymmetries for CartesianGridSymmetries {
    fn name(&self) -> &'static str { "cartesian grid" }
    fn operations(&self) -> &[SymmetryOperation] { &self.operations }
    fn proj_data_info(&self) -> &Arc<ProjDataInfo> { &self.info }
    fn fov(&self) -> &FOV { &self.fov }
}
