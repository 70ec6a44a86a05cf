use std::sync::Arc;

use crate::fov::FOV;
use crate::projdata::ProjDataInfo;
use crate::symmetries::{DataSymmetries, SymmetryOperation};

/// No symmetries at all: every bin is basic. Useful as a reference against
/// which symmetry-reduced projection is checked.
#[derive(Debug, Clone)]
pub struct TrivialSymmetries {
    info: Arc<ProjDataInfo>,
    fov: FOV,
}

const IDENTITY_ONLY: [SymmetryOperation; 1] = [SymmetryOperation::IDENTITY];

impl TrivialSymmetries {
    pub fn new(info: Arc<ProjDataInfo>, fov: FOV) -> Self { Self { info, fov } }
}

impl DataSymmetries for TrivialSymmetries {
    fn name(&self) -> &'static str { "none" }
    fn operations(&self) -> &[SymmetryOperation] { &IDENTITY_ONLY }
    fn proj_data_info(&self) -> &Arc<ProjDataInfo> { &self.info }
    fn fov(&self) -> &FOV { &self.fov }
}
