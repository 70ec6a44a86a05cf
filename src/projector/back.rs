use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::error::{ProjError, Result};
use crate::image::{elementwise_add, Image, ImageData};
use crate::projdata::{Bin, BinKey, ProjData, ProjDataInfo};
use crate::projmatrix::ProjMatrixByBin;
use crate::symmetries::{DataSymmetries, RelatedViewgrams, SymmetryOperation};
use crate::types::BoxDim_u;

use super::{job_size, BinRange, Projection};

const WHAT: &str = "back projector";

/// Accumulates projection data into images, one row fetch per basic bin
#[derive(Debug)]
pub struct MatrixBackProjector {
    projection: Projection,
}

impl MatrixBackProjector {

    pub fn new(matrix: Box<dyn ProjMatrixByBin>) -> Self {
        Self { projection: Projection { matrix, state: None } }
    }

    pub fn matrix(&self) -> &dyn ProjMatrixByBin { &*self.projection.matrix }

    /// Check that `image` and the projection data described by `info` are
    /// consistent, and prepare the matrix for them. Nothing may be back
    /// projected until this has succeeded.
    pub fn set_up(&mut self, info: Arc<ProjDataInfo>, image: &Image) -> Result<()> {
        self.projection.set_up(info, image.fov())
    }

    pub fn symmetries(&self) -> Result<&Arc<dyn DataSymmetries>> {
        self.projection.state(WHAT)?;
        self.projection.symmetries()
    }

    pub fn back_project(&self, image: &mut Image, related: &RelatedViewgrams) -> Result<()> {
        self.back_project_range(image, related, &BinRange::all())
    }

    /// Back project those bins of `related` which lie in `range`. Bins
    /// carrying the rejection sentinel contribute nothing.
    pub fn back_project_range(&self, image: &mut Image, related: &RelatedViewgrams, range: &BinRange) -> Result<()> {
        let basic = self.projection.check(WHAT, image, related)?;
        let fov = image.fov;
        let work = self.projection.work_in(basic, related, range, contributes)?;
        let job_size = job_size(work.len());
        let buffer = work
            .par_iter()
            .with_min_len(job_size)
            .with_max_len(job_size)
            .try_fold(|| Image::zeros_buffer(fov), |mut buffer, (bin, targets)| -> Result<ImageData> {
                self.scatter(&mut buffer, fov.n, related, bin, targets)?;
                Ok(buffer)
            })
            .try_reduce(|| Image::zeros_buffer(fov), |a, b| Ok(elementwise_add(a, b)))?;
        image.add_buffer(&buffer)
    }

    /// Back project a single bin, of any kind, basic or not
    pub fn back_project_bin(&self, image: &mut Image, bin: &Bin) -> Result<()> {
        let (info, fov) = self.projection.state(WHAT)?;
        if image.fov() != fov {
            return Err(ProjError::GeometryMismatch(format!("image FOV {:?} differs from set-up FOV {fov:?}", image.fov())))
        }
        info.check_bin(bin)?;
        if !contributes(bin) { return Ok(()) }
        let row = self.projection.matrix.row_for_bin(bin)?;
        row.back_project(&mut image.data, fov.n, &SymmetryOperation::IDENTITY, bin.value());
        Ok(())
    }

    /// Back project the whole of `data`, one set of related viewgrams at a time
    pub fn back_project_all(&self, image: &mut Image, data: &ProjData) -> Result<()> {
        let symmetries = Arc::clone(self.symmetries()?);
        let fov = image.fov;
        let basic_viewgrams = symmetries.all_basic_viewgram_indices();
        let job_size = job_size(basic_viewgrams.len());
        let image_ref: &Image = image;
        let buffer = basic_viewgrams
            .par_iter()
            .with_min_len(job_size)
            .with_max_len(job_size)
            .try_fold(|| Image::zeros_buffer(fov), |mut buffer, &v| -> Result<ImageData> {
                let related = data.related_viewgrams(v, Arc::clone(&symmetries))?;
                let basic = self.projection.check(WHAT, image_ref, &related)?;
                for (bin, targets) in self.projection.work_in(basic, &related, &BinRange::all(), contributes)? {
                    self.scatter(&mut buffer, fov.n, &related, &bin, &targets)?;
                }
                Ok(buffer)
            })
            .try_reduce(|| Image::zeros_buffer(fov), |a, b| Ok(elementwise_add(a, b)))?;
        image.add_buffer(&buffer)?;
        info!(basic_viewgrams = basic_viewgrams.len(), rows_cached = self.matrix().cache().len(), "back projection complete");
        Ok(())
    }

    /// Apply the row of basic bin `bin` to each of its `targets`
    fn scatter(
        &self,
        buffer: &mut ImageData,
        n: BoxDim_u,
        related: &RelatedViewgrams,
        bin: &Bin,
        targets: &[(BinKey, SymmetryOperation)],
    ) -> Result<()> {
        let row = self.projection.matrix.get_row(bin)?;
        for (key, g) in targets {
            if let Some(value) = related.bin(*key).and_then(|b| b.sample()) {
                row.back_project(buffer, n, g, value);
            }
        }
        Ok(())
    }
}

/// Rejected and zero-valued bins add nothing, so their rows are not needed
fn contributes(bin: &Bin) -> bool {
    bin.sample().map_or(false, |value| value != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fov::FOV;
    use crate::projdata::{test_util, StorageOrder, ViewgramIndices};
    use crate::projmatrix::{CacheConfig, RayTracingMatrix, SymmetryChoice};
    use crate::symmetries::test_util::fov;
    use float_eq::assert_float_eq;
    use units::mm;

    fn projector(symmetries: SymmetryChoice) -> (MatrixBackProjector, Image) {
        let image = Image::zeros(fov());
        let mut p = MatrixBackProjector::new(Box::new(RayTracingMatrix::new(symmetries, CacheConfig::default())));
        p.set_up(Arc::new(test_util::info()), &image).unwrap();
        (p, image)
    }

    #[test]
    fn must_be_set_up() {
        let p = MatrixBackProjector::new(Box::new(RayTracingMatrix::new(SymmetryChoice::default(), CacheConfig::default())));
        let mut image = Image::zeros(fov());
        assert!(matches!(p.back_project_bin(&mut image, &Bin::new(0, 0, 0, 0, 1.0)), Err(ProjError::NotSetUp(_))));
    }

    #[test]
    fn geometry_mismatch_at_set_up() {
        let mut p = MatrixBackProjector::new(Box::new(RayTracingMatrix::new(SymmetryChoice::default(), CacheConfig::default())));
        let too_wide = Image::zeros(FOV::new((mm(200.0), mm(200.0), mm(16.0)), (5, 5, 4)));
        assert!(matches!(p.set_up(Arc::new(test_util::info()), &too_wide), Err(ProjError::GeometryMismatch(_))));
        let too_long = Image::zeros(FOV::new((mm(40.0), mm(40.0), mm(40.0)), (5, 5, 4)));
        assert!(matches!(p.set_up(Arc::new(test_util::info()), &too_long), Err(ProjError::GeometryMismatch(_))));
    }

    #[test]
    fn image_of_other_fov_is_rejected() {
        let (p, _) = projector(SymmetryChoice::default());
        let mut other = Image::zeros(FOV::new((mm(40.0), mm(40.0), mm(16.0)), (7, 7, 4)));
        let related = RelatedViewgrams::zeros(ViewgramIndices::new(0, 0, 0), Arc::clone(p.symmetries().unwrap())).unwrap();
        assert!(matches!(p.back_project(&mut other, &related), Err(ProjError::GeometryMismatch(_))));
        assert_eq!(other.sum(), 0.0);
    }

    #[test]
    fn related_set_of_different_symmetries_is_reduced_correctly() {
        // Values stored in viewgrams grouped by no symmetries at all
        let (p, mut image) = projector(SymmetryChoice::default());
        let (q, mut expected) = projector(SymmetryChoice::none());
        let related = {
            let mut r = RelatedViewgrams::zeros(ViewgramIndices::new(1, 3, 0), Arc::clone(q.symmetries().unwrap())).unwrap();
            *r.value_mut(Bin::new(1, 3, 1, -1, 0.0).key()).unwrap() = 2.0;
            r
        };
        // Not the whole of an orbit under p's symmetries: still fine
        p.back_project(&mut image, &related).unwrap();
        q.back_project(&mut expected, &related).unwrap();
        assert_float_eq!(image.data, expected.data, abs_all <= 1e-4);
        assert!(image.sum() > 0.0);
    }

    #[test]
    fn whole_data_equals_bin_by_bin() {
        let (p, mut image) = projector(SymmetryChoice::default());
        let info = Arc::new(test_util::info());
        let mut data = ProjData::new_zeros(Arc::clone(&info), StorageOrder::ByView).unwrap();
        let bins = [Bin::new(0, 0, 1, 0, 1.0), Bin::new(1, 6, 0, 2, 3.0), Bin::new(-1, 3, 2, -3, 0.5)];
        for bin in &bins { data.set_bin_value(bin).unwrap() }
        let mut rejected = Bin::new(0, 5, 3, 1, 0.0);
        rejected.reject();
        data.set_bin_value(&rejected).unwrap();

        p.back_project_all(&mut image, &data).unwrap();

        let mut expected = Image::zeros(fov());
        for bin in &bins { p.back_project_bin(&mut expected, bin).unwrap() }
        p.back_project_bin(&mut expected, &rejected).unwrap();
        assert_float_eq!(image.data, expected.data, abs_all <= 1e-4);
    }
}
