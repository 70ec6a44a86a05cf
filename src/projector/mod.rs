//! Back and forward projection through a `ProjMatrixByBin`.
//!
//! Work is organized by basic bin: the row of each basic bin is fetched
//! once, and applied, moved by each symmetry operation, to every related bin
//! which carries a usable value. Back projection accumulates into private
//! per-worker image buffers which are summed in a final reduction, so no
//! voxel update is lost to a race.

mod back;
mod forward;

pub use back::MatrixBackProjector;
pub use forward::MatrixForwardProjector;

use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::error::{ProjError, Result};
use crate::fov::FOV;
use crate::image::Image;
use crate::projdata::{Bin, BinKey, ProjDataInfo, ViewgramIndices};
use crate::projmatrix::ProjMatrixByBin;
use crate::symmetries::{orbit_keys, DataSymmetries, RelatedViewgrams, SymmetryOperation};

/// Optional restriction of the bins taking part in a projection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinRange {
    pub axial: Option<RangeInclusive<i32>>,
    pub tangential: Option<RangeInclusive<i32>>,
}

impl BinRange {

    pub fn all() -> Self { Self::default() }

    pub fn new(axial: RangeInclusive<i32>, tangential: RangeInclusive<i32>) -> Self {
        Self { axial: Some(axial), tangential: Some(tangential) }
    }

    pub fn contains(&self, key: &BinKey) -> bool {
        self.axial     .as_ref().map_or(true, |r| r.contains(&key.axial_pos_num)) &&
        self.tangential.as_ref().map_or(true, |r| r.contains(&key.tangential_pos_num))
    }
}

/// The geometry a projector has been set up for, and its matrix
#[derive(Debug)]
struct Projection {
    matrix: Box<dyn ProjMatrixByBin>,
    state: Option<(Arc<ProjDataInfo>, FOV)>,
}

impl Projection {

    fn set_up(&mut self, info: Arc<ProjDataInfo>, fov: &FOV) -> Result<()> {
        self.state = None;
        fov.check_valid()?;
        let radius = units::mm_(info.scanner().ring_radius);
        let [hx, hy, _] = fov.half_width.to_mm();
        if hx.hypot(hy) > radius {
            return Err(ProjError::GeometryMismatch(format!(
                "FOV of half-widths {hx} × {hy} mm does not fit inside ring of radius {radius} mm"
            )))
        }
        let [.., hz] = fov.half_width.to_mm();
        let scanner_half_length = units::mm_(info.scanner().ring_spacing) * info.num_rings() as f32 / 2.0;
        if hz > scanner_half_length {
            return Err(ProjError::GeometryMismatch(format!(
                "FOV half-length {hz} mm exceeds scanner half-length {scanner_half_length} mm"
            )))
        }
        self.matrix.set_up(Arc::clone(&info), *fov)?;
        self.state = Some((info, *fov));
        Ok(())
    }

    fn state(&self, what: &'static str) -> Result<(&Arc<ProjDataInfo>, &FOV)> {
        self.state.as_ref().map(|(i, f)| (i, f)).ok_or(ProjError::NotSetUp(what))
    }

    fn symmetries(&self) -> Result<&Arc<dyn DataSymmetries>> { self.matrix.symmetries() }

    /// Fail unless `image` and `related` match the geometry of the set-up.
    /// Returns the basic viewgram from which the work on `related` starts.
    fn check(&self, what: &'static str, image: &Image, related: &RelatedViewgrams) -> Result<ViewgramIndices> {
        let (info, fov) = self.state(what)?;
        if image.fov() != fov {
            return Err(ProjError::GeometryMismatch(format!("image FOV {:?} differs from set-up FOV {fov:?}", image.fov())))
        }
        if let Some(why) = crate::projdata::info_mismatch(info, related.proj_data_info()) {
            return Err(ProjError::GeometryMismatch(why))
        }
        let symmetries = self.symmetries()?;
        let (basic, _) = symmetries.basic_viewgram_indices(related.basic_indices())?;
        for viewgram in related.viewgrams() {
            if symmetries.basic_viewgram_indices(viewgram.indices())?.0 != basic {
                return Err(ProjError::GeometryMismatch(format!(
                    "viewgram {:?} is not related to {basic:?} under the projector's symmetries", viewgram.indices()
                )))
            }
        }
        Ok(basic)
    }

    /// The basic bins of the basic viewgram, and for each, those related bins
    /// found in `related`, within `range`, whose value is `usable`: only these
    /// basic bins need rows.
    fn work_in(
        &self,
        basic: ViewgramIndices,
        related: &RelatedViewgrams,
        range: &BinRange,
        usable: impl Fn(&Bin) -> bool,
    ) -> Result<Vec<(Bin, Vec<(BinKey, SymmetryOperation)>)>> {
        let symmetries = self.symmetries()?;
        let info = symmetries.proj_data_info();
        let mut work = vec![];
        for bin in info.bins_in_viewgram(basic) {
            if !symmetries.is_basic(&bin)? { continue }
            let targets: Vec<_> = orbit_keys(&**symmetries, &bin).into_iter()
                .filter(|(key, _)| range.contains(key))
                .filter(|(key, _)| related.bin(*key).map_or(false, |b| usable(&b)))
                .collect();
            if !targets.is_empty() { work.push((bin, targets)) }
        }
        Ok(work)
    }
}

/// Spread `n` items evenly over the available threads. Rayon is too eager in
/// spawning small jobs, each of which requires the construction and
/// subsequent combination of expensive accumulators (whole images).
fn job_size(n: usize) -> usize {
    (n / rayon::current_num_threads()).max(1)
}
