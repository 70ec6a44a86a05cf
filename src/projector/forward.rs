use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::error::{ProjError, Result};
use crate::image::Image;
use crate::projdata::{Bin, BinKey, ProjData, ProjDataInfo, StorageOrder};
use crate::projmatrix::ProjMatrixByBin;
use crate::symmetries::{DataSymmetries, RelatedViewgrams, SymmetryOperation};

use super::{job_size, BinRange, Projection};

const WHAT: &str = "forward projector";

/// Projects images into projection data: the transpose of
/// `MatrixBackProjector`, gathering where the latter scatters.
#[derive(Debug)]
pub struct MatrixForwardProjector {
    projection: Projection,
}

impl MatrixForwardProjector {

    pub fn new(matrix: Box<dyn ProjMatrixByBin>) -> Self {
        Self { projection: Projection { matrix, state: None } }
    }

    pub fn matrix(&self) -> &dyn ProjMatrixByBin { &*self.projection.matrix }

    pub fn set_up(&mut self, info: Arc<ProjDataInfo>, image: &Image) -> Result<()> {
        self.projection.set_up(info, image.fov())
    }

    pub fn symmetries(&self) -> Result<&Arc<dyn DataSymmetries>> {
        self.projection.state(WHAT)?;
        self.projection.symmetries()
    }

    pub fn forward_project(&self, related: &mut RelatedViewgrams, image: &Image) -> Result<()> {
        self.forward_project_range(related, image, &BinRange::all())
    }

    /// Overwrite the values of those bins of `related` which lie in `range`
    /// with the projection of `image`. Bins carrying the rejection sentinel
    /// keep it.
    pub fn forward_project_range(&self, related: &mut RelatedViewgrams, image: &Image, range: &BinRange) -> Result<()> {
        let basic = self.projection.check(WHAT, image, related)?;
        let work = self.projection.work_in(basic, related, range, |bin| !bin.is_rejected())?;
        let matrix = self.matrix();
        let job_size = job_size(work.len());
        let projected: Vec<Vec<(BinKey, f32)>> = work
            .par_iter()
            .with_min_len(job_size)
            .with_max_len(job_size)
            .map(|(bin, targets)| -> Result<Vec<(BinKey, f32)>> {
                let row = matrix.get_row(bin)?;
                Ok(targets.iter().map(|(key, g)| (*key, row.forward_project(image, g))).collect())
            })
            .collect::<Result<_>>()?;
        for (key, value) in projected.into_iter().flatten() {
            if let Some(slot) = related.value_mut(key) { *slot = value }
        }
        Ok(())
    }

    /// Set the value of a single bin, of any kind, to the projection of `image`
    pub fn forward_project_bin(&self, bin: &mut Bin, image: &Image) -> Result<()> {
        let (info, fov) = self.projection.state(WHAT)?;
        if image.fov() != fov {
            return Err(ProjError::GeometryMismatch(format!("image FOV {:?} differs from set-up FOV {fov:?}", image.fov())))
        }
        info.check_bin(bin)?;
        if bin.is_rejected() { return Ok(()) }
        let row = self.projection.matrix.row_for_bin(bin)?;
        bin.set_value(row.forward_project(image, &SymmetryOperation::IDENTITY));
        Ok(())
    }

    /// Projection of `image` into the whole of the projection data
    pub fn forward_project_all(&self, image: &Image) -> Result<ProjData> {
        let symmetries = Arc::clone(self.symmetries()?);
        let (info, _) = self.projection.state(WHAT)?;
        let basic_viewgrams = symmetries.all_basic_viewgram_indices();
        let job_size = job_size(basic_viewgrams.len());
        let related: Vec<RelatedViewgrams> = basic_viewgrams
            .par_iter()
            .with_min_len(job_size)
            .with_max_len(job_size)
            .map(|&v| -> Result<RelatedViewgrams> {
                let mut related = RelatedViewgrams::zeros(v, Arc::clone(&symmetries))?;
                self.forward_project(&mut related, image)?;
                Ok(related)
            })
            .collect::<Result<_>>()?;
        let mut data = ProjData::new_zeros(Arc::clone(info), StorageOrder::ByView)?;
        for r in &related { data.set_related_viewgrams(r)? }
        info!(basic_viewgrams = basic_viewgrams.len(), "forward projection complete");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projdata::{test_util, ViewgramIndices};
    use crate::projmatrix::{CacheConfig, RayTracingMatrix, SymmetryChoice};
    use crate::symmetries::test_util::fov;
    use float_eq::assert_float_eq;

    fn projector(symmetries: SymmetryChoice) -> MatrixForwardProjector {
        let mut p = MatrixForwardProjector::new(Box::new(RayTracingMatrix::new(symmetries, CacheConfig::default())));
        p.set_up(Arc::new(test_util::info()), &Image::zeros(fov())).unwrap();
        p
    }

    #[test]
    fn uniform_image_projects_to_intersection_length() {
        let p = projector(SymmetryChoice::default());
        let mut bin = Bin::new(0, 0, 2, 0, 0.0);
        p.forward_project_bin(&mut bin, &Image::ones(fov())).unwrap();
        assert_float_eq!(bin.value(), 40.0, abs <= 1e-3);
    }

    #[test]
    fn rejected_bins_keep_the_sentinel() {
        let p = projector(SymmetryChoice::default());
        let mut related = RelatedViewgrams::zeros(ViewgramIndices::new(0, 0, 0), Arc::clone(p.symmetries().unwrap())).unwrap();
        let key = Bin::new(0, 4, 1, 0, 0.0).key();
        *related.value_mut(key).unwrap() = crate::projdata::REJECTED_BIN_VALUE;
        p.forward_project(&mut related, &Image::ones(fov())).unwrap();
        assert!(related.bin(key).unwrap().is_rejected());
        assert_float_eq!(related.bin(Bin::new(0, 4, 2, 0, 0.0).key()).unwrap().value(), 40.0, abs <= 1e-3);
    }

    #[test]
    fn range_restricts_projected_bins() {
        let p = projector(SymmetryChoice::default());
        let mut related = RelatedViewgrams::zeros(ViewgramIndices::new(0, 0, 0), Arc::clone(p.symmetries().unwrap())).unwrap();
        p.forward_project_range(&mut related, &Image::ones(fov()), &BinRange::new(1..=1, 0..=0)).unwrap();
        for viewgram in related.viewgrams() {
            for a in viewgram.axial_range() {
                for t in viewgram.tangential_range() {
                    let value = viewgram.get(a, t).unwrap();
                    if (a, t) == (1, 0) { assert_float_eq!(value, 40.0, abs <= 1e-3) }
                    else                { assert_eq!(value, 0.0) }
                }
            }
        }
    }

    #[test]
    fn symmetry_reduced_equals_unreduced() {
        let mut image = Image::zeros(fov());
        for (i, x) in image.data.iter_mut().enumerate() { *x = (i % 7) as f32 }
        let reduced = projector(SymmetryChoice::default()).forward_project_all(&image).unwrap();
        let direct  = projector(SymmetryChoice::none()   ).forward_project_all(&image).unwrap();
        for (a, b) in reduced.segments().zip(direct.segments()) {
            for (x, y) in a.by_sinogram().iter().zip(b.by_sinogram().iter()) {
                assert_float_eq!(*x, *y, abs <= 1e-3);
            }
        }
    }
}
