//! Rows of the projection matrix by ray tracing (Siddon): the weight of a
//! voxel is the length of the bin's LOR inside the voxel.
//!
//! The algorithm is centred around two key simplifications:
//!
//! 1. Express the voxel size in terms of the components of the LOR's direction
//!    vector. This allows trivial calculation of how far we must move along the
//!    LOR before reaching a voxel boundary, in any dimension.
//!
//! 2. Flip axes so that the direction of the LOR has non-negative components.
//!    The algorithm can then assume that all progress is in the positive
//!    direction. Any voxel indices found by the algorithm must be flipped back
//!    to the original coordinate system.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::fov::FOV;
use crate::projdata::{Bin, ProjDataInfo};
use crate::projmatrix::{not_set_up, CacheConfig, ProjMatrixByBin, RowCache, SetUp, SymmetryChoice, SystemMatrixRow};
use crate::symmetries::DataSymmetries;
use crate::types::{Lengthf32, Point};

#[derive(Debug)]
pub struct RayTracingMatrix {
    symmetries: SymmetryChoice,
    cache: RowCache,
    state: Option<SetUp>,
}

impl RayTracingMatrix {
    pub fn new(symmetries: SymmetryChoice, cache: CacheConfig) -> Self {
        Self { symmetries, cache: RowCache::new(cache), state: None }
    }
}

impl ProjMatrixByBin for RayTracingMatrix {

    fn name(&self) -> &'static str { "ray tracing" }

    fn set_up(&mut self, info: Arc<ProjDataInfo>, fov: FOV) -> Result<()> {
        fov.check_valid()?;
        let state = self.symmetries.set_up(info, fov)?;
        debug!(symmetries = state.symmetries.name(), order = state.symmetries.operations().len(),
               voxels = ?fov.n, "ray tracing matrix set up");
        self.state = Some(state);
        self.cache.clear();
        Ok(())
    }

    fn symmetries(&self) -> Result<&Arc<dyn DataSymmetries>> {
        Ok(&not_set_up(&self.state, "ray tracing matrix")?.symmetries)
    }

    fn calculate_row(&self, basic: &Bin) -> Result<SystemMatrixRow> {
        let SetUp { info, fov, .. } = not_set_up(&self.state, "ray tracing matrix")?;
        info.check_bin(basic)?;
        let (p1, p2) = info.lor_endpoints(basic);
        Ok(siddon(p1, p2, fov))
    }

    fn cache(&self) -> &RowCache { &self.cache }
}

const EPS: f32 = 1e-5;

/// Voxels crossed by the line from `p1` to `p2`, weighted by the length of
/// line inside each, in mm
pub fn siddon(p1: Point, p2: Point, fov: &FOV) -> SystemMatrixRow {
    let n = fov.n;
    let mut row = SystemMatrixRow::with_capacity(n[0] + n[1] + n[2]);
    let entry = match fov.entry(p1, p2) {
        Some(entry) => entry.to_mm(),
        // LOR missed FOV: nothing to be done
        None => return row,
    };
    let direction = (p2 - p1).direction();
    let extent = (p2 - p1).to_mm();
    let half_width = fov.half_width.to_mm();
    let voxel_size = fov.voxel_size.to_mm();

    // Dimensions in which the LOR moves by less than EPS voxels are treated
    // as exactly parallel: rounding noise in the direction must not decide
    // which voxels are hit.
    let parallel: [bool; 3] = std::array::from_fn(|d| (extent[d] / voxel_size[d]).abs() < EPS);

    let flipped: [bool; 3] = std::array::from_fn(|d| !parallel[d] && direction[d] < 0.0);
    let mut index = [0_usize; 3];
    let mut remaining = [0_usize; 3];
    let mut next_boundary = [0.0 as Lengthf32; 3];
    let mut voxel_size_along_lor = [0.0 as Lengthf32; 3];
    // Parallel dimensions in which the LOR runs along an internal voxel
    // boundary, and the index of the voxel above that boundary
    let mut ties = vec![];

    for d in 0..3 {
        let x = if flipped[d] { -entry[d] } else { entry[d] };
        // Entry point in voxel units, with one corner of the FOV at the origin.
        // Floating-point subtractions which should give zero usually miss
        // very slightly: if the error is negative, `floor` picks the wrong
        // voxel.
        let mut e = (x + half_width[d]) / voxel_size[d];
        if e.abs() < EPS { e = 0.0 }
        let i = (e.floor() as usize).min(n[d] - 1);
        index[d] = i;
        remaining[d] = n[d] - i;
        if parallel[d] {
            let k = e.round();
            if (e - k).abs() < EPS && k > 0.0 && (k as usize) < n[d] { ties.push((d, k as usize)) }
            voxel_size_along_lor[d] = Lengthf32::INFINITY;
            next_boundary[d] = Lengthf32::INFINITY;
        } else {
            // How far we must move along the LOR to cross one voxel in this
            // dimension
            let step = voxel_size[d] / direction[d].abs();
            voxel_size_along_lor[d] = step;
            next_boundary[d] = (1.0 - (e - i as f32)) * step;
        }
    }

    let unflip = |index: [usize; 3]| -> [usize; 3] {
        let mut i = index;
        for d in 0..3 { if flipped[d] { i[d] = n[d] - 1 - index[d] } }
        i
    };

    // How far we have moved since entering the FOV
    let mut here = 0.0;
    loop {
        // Which voxel boundary will be hit next, and its position
        let (dimension, boundary_position) = argmin(next_boundary);

        // The weight is the length of LOR in this voxel
        let weight = boundary_position - here;
        if weight > 0.0 { row.push((unflip(index), weight)) }

        // Move along LOR until it leaves this voxel
        here = boundary_position;
        next_boundary[dimension] += voxel_size_along_lor[dimension];
        index[dimension] += 1;
        remaining[dimension] -= 1;

        // If we have traversed the whole FOV, we're finished
        if remaining[dimension] == 0 { break }
    }
    split_ties(row, &ties)
}

/// A LOR running along a voxel boundary belongs equally to the voxels on
/// either side of it. Any other choice would break the mirror symmetry of
/// grids with an even number of voxels.
fn split_ties(row: SystemMatrixRow, ties: &[(usize, usize)]) -> SystemMatrixRow {
    ties.iter().fold(row, |row, &(d, above)| {
        row.into_iter()
            .flat_map(|(voxel, weight)| {
                let (mut below, mut upper) = (voxel, voxel);
                below[d] = above - 1;
                upper[d] = above;
                [(below, weight / 2.0), (upper, weight / 2.0)]
            })
            .collect()
    })
}

/// Earliest of equal minima
fn argmin(xs: [Lengthf32; 3]) -> (usize, Lengthf32) {
    let mut best = (0, xs[0]);
    for (d, &x) in xs.iter().enumerate().skip(1) {
        if x < best.1 { best = (d, x) }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjError;
    use crate::projdata::test_util;
    use crate::symmetries::test_util::fov;
    use float_eq::assert_float_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use units::mm;

    // --------------------------------------------------------------------------------
    // This set of hand-picked values should be easy to verify by humans. The
    // test performs two checks:
    //
    // 1. The sum of the LOR-lengths within individual voxels equals the
    //    expected total length of LOR in the whole FOV.
    //
    // 2. The indices of the voxels traversed by the LOR are as expected.
    #[rstest(/**/      p1       ,      p2      ,    size     ,  n   ,  length  , expected_voxels,
             // symmetric 3x3, diagonal LOR under all four axis flip combinations
             case((-30.0, -30.0), ( 30.0, 30.0), (10.0, 10.0), (3,3), 14.142135, vec![(0,0), (1,1), (2,2)]),
             case(( 30.0, -30.0), (-30.0, 30.0), (10.0, 10.0), (3,3), 14.142135, vec![(2,0), (1,1), (0,2)]),
             case((-30.0,  30.0), ( 30.0,-30.0), (10.0, 10.0), (3,3), 14.142135, vec![(0,2), (1,1), (2,0)]),
             case(( 30.0,  30.0), (-30.0,-30.0), (10.0, 10.0), (3,3), 14.142135, vec![(2,2), (1,1), (0,0)]),
             // like case 1, but with asymmetric voxels
             case((-30.0, -30.0), ( 30.0, 30.0), (10.0, 10.0), (3,2), 14.142135, vec![(0,0), (1,0), (1,1), (2,1)]),
             case((-30.0, -30.0), ( 30.0, 30.0), (10.0, 10.0), (2,3), 14.142135, vec![(0,0), (0,1), (1,1), (1,2)]),
             // vertical / horizontal off-centre LOR
             case((  5.4, -20.0), (  5.4, 10.0), (11.0,  9.0), (9,4),  9.0     , vec![(8,0), (8,1), (8,2), (8,3)]),
             case((-15.0,  -4.0), ( 15.0, -4.0), ( 8.0, 10.0), (4,3),  8.0     , vec![(0,0), (1,0), (2,0), (3,0)]),
    )]
    fn hand_picked(p1:   (Lengthf32, Lengthf32),
                   p2:   (Lengthf32, Lengthf32),
                   size: (Lengthf32, Lengthf32),
                   n: (usize, usize),
                   length: Lengthf32,
                   expected_voxels: Vec<(usize, usize)>) {
        let p1 = Point::from_mm(p1.0, p1.1, 0.0);
        let p2 = Point::from_mm(p2.0, p2.1, 0.0);
        let fov = FOV::new((mm(size.0), mm(size.1), mm(1.0)), (n.0, n.1, 1));
        let hits = siddon(p1, p2, &fov);

        assert_float_eq!(hits.total_weight(), length, abs <= 1e-4);

        let voxels: Vec<(usize, usize)> = hits.into_iter()
            .map(|(index, _weight)| (index[0], index[1]))
            .collect();
        assert_eq!(voxels, expected_voxels)
    }

    use proptest::prelude::*;
    // The total length of the LOR in the FOV equals the sum of its lengths in
    // the individual voxels.
    proptest! {
        #[test]
        fn sum_of_weights_equals_length_through_box(
            r        in  200.0..(300.0 as Lengthf32),
            p1_angle in 0.0..(1.0 as Lengthf32), // around the circle
            p2_delta in 0.1..(0.9 as Lengthf32), // relative to p1_angle
            p1_z     in -200.0..(200.0 as Lengthf32),
            p2_z     in -200.0..(200.0 as Lengthf32),
            dx in  100.0..(150.0 as Lengthf32),
            dy in  100.0..(150.0 as Lengthf32),
            dz in  100.0..(190.0 as Lengthf32),
            nx in  5..50_usize,
            ny in  5..50_usize,
            nz in  5..90_usize,
        ) {
            let two_pi = 2.0 * units::PI;
            let p1_theta = p1_angle * two_pi;
            let p2_theta = p1_theta + (p2_delta * two_pi);
            let p1 = Point::from_mm(r * p1_theta.cos(), r * p1_theta.sin(), p1_z);
            let p2 = Point::from_mm(r * p2_theta.cos(), r * p2_theta.sin(), p2_z);
            let fov = FOV::new((mm(dx), mm(dy), mm(dz)), (nx, ny, nz));

            let row = siddon(p1, p2, &fov);
            prop_assert!(row.check_unique().is_ok());

            let in_one_go = match (fov.entry(p1, p2), fov.entry(p2, p1)) {
                (Some(a), Some(b)) => units::mm_((a - b).magnitude()),
                _ => 0.0,
            };
            assert_float_eq!(row.total_weight(), in_one_go, rel <= 1e-3);
        }
    }

    fn matrix() -> RayTracingMatrix { matrix_for(fov()) }

    fn matrix_for(fov: FOV) -> RayTracingMatrix {
        let mut m = RayTracingMatrix::new(SymmetryChoice::default(), CacheConfig::default());
        m.set_up(Arc::new(test_util::info()), fov).unwrap();
        m
    }

    /// Even number of voxels in every dimension: central LORs run along
    /// voxel boundaries
    fn even_fov() -> FOV { FOV::new((mm(40.0), mm(40.0), mm(16.0)), (4, 4, 4)) }

    #[test]
    fn requires_set_up() {
        let m = RayTracingMatrix::new(SymmetryChoice::default(), CacheConfig::default());
        assert!(matches!(m.get_row(&Bin::new(0, 0, 0, 0, 0.0)), Err(ProjError::NotSetUp(_))));
    }

    #[test]
    fn rows_only_for_basic_bins() {
        let m = matrix();
        let bin = Bin::new(0, 6, 1, 2, 0.0);
        let (basic, _) = m.symmetries().unwrap().find_basic_bin(&bin).unwrap();
        assert_ne!(basic.key(), bin.key());
        assert!(matches!(m.get_row(&bin), Err(ProjError::NotBasic(_))));
        assert!(m.get_row(&basic).is_ok());
        assert_eq!(m.cache().len(), 1);
    }

    #[test]
    fn central_lor_crosses_whole_fov() {
        let m = matrix();
        // view 0: LOR along y through the centre of the middle column
        let row = m.get_row(&Bin::new(0, 0, 1, 0, 0.0)).unwrap();
        assert_float_eq!(row.total_weight(), 40.0, abs <= 1e-3);
        assert_eq!(row.len(), 5);
        assert!(row.iter().all(|(voxel, _)| voxel[0] == 2 && voxel[2] == 1));
    }

    #[test]
    fn lor_along_boundary_is_shared() {
        let m = matrix_for(even_fov());
        // view 0: LOR along y at x = 0, between columns 1 and 2
        let row = m.get_row(&Bin::new(0, 0, 1, 0, 0.0)).unwrap();
        assert_float_eq!(row.total_weight(), 40.0, abs <= 1e-3);
        assert_eq!(row.len(), 8);
        for column in [1, 2] {
            let weight: f32 = row.iter().filter(|(v, _)| v[0] == column).map(|(_, w)| w).sum();
            assert_float_eq!(weight, 20.0, abs <= 1e-3);
        }
        assert!(row.check_unique().is_ok());
    }

    #[test]
    fn lor_along_boundary_in_two_dimensions() {
        // Along z, at the corner shared by four voxels
        let fov = FOV::new((mm(20.0), mm(20.0), mm(30.0)), (2, 2, 3));
        let row = siddon(Point::from_mm(0.0, 0.0, -50.0), Point::from_mm(0.0, 0.0, 50.0), &fov);
        assert_eq!(row.len(), 12);
        assert!(row.iter().all(|(_, w)| (w - 2.5).abs() < 1e-4));
        assert!(row.check_unique().is_ok());
    }

    #[rstest(image_fov, case(fov()), case(even_fov()))]
    fn transformed_rows_match_direct_calculation(image_fov: FOV) {
        let m = matrix_for(image_fov);
        let info = Arc::clone(m.symmetries().unwrap().proj_data_info());
        for v in info.all_viewgram_indices() {
            for bin in info.bins_in_viewgram(v) {
                let direct = m.calculate_row(&bin).unwrap();
                let reused = m.row_for_bin(&bin).unwrap();
                let weight_of = |row: &SystemMatrixRow, voxel| {
                    row.iter().filter(|(x, _)| *x == voxel).map(|(_, w)| w).sum::<f32>()
                };
                for &(voxel, _) in direct.iter().chain(reused.iter()) {
                    assert_float_eq!(weight_of(&direct, voxel), weight_of(&reused, voxel), abs <= 1e-3);
                }
            }
        }
        // One row per orbit
        let basic_bins = info.all_viewgram_indices()
            .flat_map(|v| info.bins_in_viewgram(v))
            .filter(|b| m.symmetries().unwrap().is_basic(b).unwrap())
            .count();
        assert_eq!(m.cache().len(), basic_bins);
    }
}
