//! Geometric symmetries of a cylindrical scanner with a centred voxel grid.
//!
//! Every operation is an isometry of space which maps the set of LORs onto
//! itself and the voxel grid onto itself: a signed permutation of the
//! transaxial axes (the dihedral group of the square), optionally combined
//! with a reflection in the central transaxial plane. Weights of the
//! projection matrix are invariant under these isometries, so a matrix row
//! computed for one bin can be reused for every bin in its orbit by moving
//! the voxel indices.
//!
//! How an operation acts on bin indices follows from how it acts on the LOR.
//! The LOR of view `v` has normal `n(φ)` and direction `d(φ)` (see
//! `ProjDataInfo::lor_endpoints`). A transaxial isometry `M` sends `n(φ)` to
//! `n(ψ)`, with `ψ = φ + θ` for a rotation by `θ`, or `ψ = 2α - φ` for a
//! reflection across the line at angle `α`; `M d(φ)` is `+d(ψ)` for
//! rotations and `-d(ψ)` for reflections. If `ψ` falls outside `[0, π)` it is
//! brought back by `π`, which negates both `n` and `d`, and hence the
//! tangential position. Whenever `d` ends up negated, the two detectors trade
//! places, which negates the segment (ring difference) and timing position.

use crate::fov::FOV;
use crate::index::{BoxDim_u, Index3_u};
use crate::projdata::{Bin, BinKey, ProjDataInfo, ViewgramIndices};
use crate::projmatrix::SystemMatrixRow;

type Matrix = [[i8; 2]; 2];

const IDENTITY: Matrix = [[1, 0], [0, 1]];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymmetryOperation {
    /// Signed permutation acting on transaxial `(x, y)`
    transaxial: Matrix,
    /// Reflection `z -> -z`
    axial_flip: bool,
}

impl Default for SymmetryOperation {
    fn default() -> Self { Self::IDENTITY }
}

/// How an operation moves the view and detectors of a viewgram
struct ViewAction {
    view_num: i32,
    negate_tangential: bool,
    swap_detectors: bool,
}

impl SymmetryOperation {

    pub const IDENTITY: Self = Self { transaxial: IDENTITY, axial_flip: false };

    /// Rotation by +90° about the scanner axis
    pub fn rotate_90() -> Self { Self { transaxial: [[0, -1], [1, 0]], axial_flip: false } }

    /// Reflection `x -> -x`
    pub fn reflect_x() -> Self { Self { transaxial: [[-1, 0], [0, 1]], axial_flip: false } }

    /// Reflection `y -> -y`
    pub fn reflect_y() -> Self { Self { transaxial: [[1, 0], [0, -1]], axial_flip: false } }

    /// Reflection `z -> -z` in the central transaxial plane
    pub fn reflect_axial() -> Self { Self { transaxial: IDENTITY, axial_flip: true } }

    pub fn is_identity(&self) -> bool { *self == Self::IDENTITY }

    /// `self ∘ other`: apply `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        let (a, b) = (self.transaxial, other.transaxial);
        let mut m = [[0; 2]; 2];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, element) in row.iter_mut().enumerate() {
                *element = a[i][0] * b[0][j] + a[i][1] * b[1][j];
            }
        }
        Self { transaxial: m, axial_flip: self.axial_flip != other.axial_flip }
    }

    /// Signed permutation matrices are orthogonal: the inverse is the transpose
    pub fn inverse(&self) -> Self {
        let [[a, b], [c, d]] = self.transaxial;
        Self { transaxial: [[a, c], [b, d]], axial_flip: self.axial_flip }
    }

    fn is_reflection(&self) -> bool {
        let [[a, b], [c, d]] = self.transaxial;
        a * d - b * c < 0
    }

    pub fn swaps_transaxial_axes(&self) -> bool { self.transaxial[0][0] == 0 }

    /// Angle of the image of the x axis in quarter turns. This is `θ` for a
    /// rotation by `θ`, and `2α` for a reflection across the line at `α`.
    fn quarter_turns(&self) -> i32 {
        match (self.transaxial[0][0], self.transaxial[1][0]) {
            ( 1, _) => 0,
            ( _, 1) => 1,
            (-1, _) => 2,
            _       => 3,
        }
    }

    fn view_action(&self, view_num: i32, num_views: i32) -> ViewAction {
        let shift = self.quarter_turns() * num_views / 2;
        let psi = if self.is_reflection() { shift - view_num } else { view_num + shift };
        let psi = psi.rem_euclid(2 * num_views);
        let wrapped = psi >= num_views;
        ViewAction {
            view_num: if wrapped { psi - num_views } else { psi },
            negate_tangential: wrapped,
            swap_detectors: wrapped != self.is_reflection(),
        }
    }

    /// Whether this operation maps the valid bins of `info` onto valid bins,
    /// and the voxels of `fov` onto voxels. The transforms below are only
    /// meaningful for admissible operations.
    pub fn is_admissible(&self, info: &ProjDataInfo, fov: &FOV) -> bool {
        let integral_view_shift = (self.quarter_turns() * info.num_views()) % 2 == 0;
        let grid_ok = !self.swaps_transaxial_axes() || fov.is_square_transaxially();
        integral_view_shift && grid_ok &&
            info.all_viewgram_indices()
                .all(|v| info.check_viewgram_indices(self.transform_viewgram_indices(v, info)).is_ok())
    }

    pub fn transform_viewgram_indices(&self, v: ViewgramIndices, info: &ProjDataInfo) -> ViewgramIndices {
        let key = BinKey { segment_num: v.segment_num, view_num: v.view_num, timing_pos_num: v.timing_pos_num,
                           axial_pos_num: 0, tangential_pos_num: 0 };
        let k = self.transform_key(key, info);
        ViewgramIndices::new(k.segment_num, k.view_num, k.timing_pos_num)
    }

    pub fn transform_key(&self, key: BinKey, info: &ProjDataInfo) -> BinKey {
        let BinKey { mut segment_num, view_num, mut axial_pos_num, mut tangential_pos_num, mut timing_pos_num } = key;
        let action = self.view_action(view_num, info.num_views());
        if action.negate_tangential { tangential_pos_num = -tangential_pos_num }
        if action.swap_detectors {
            // The lower ring of the pair, `axial_pos_num`, is unchanged
            segment_num    = -segment_num;
            timing_pos_num = -timing_pos_num;
        }
        if self.axial_flip {
            axial_pos_num = info.num_rings() - 1 - axial_pos_num - segment_num.abs();
            segment_num = -segment_num;
        }
        BinKey { segment_num, view_num: action.view_num, axial_pos_num, tangential_pos_num, timing_pos_num }
    }

    /// The bin's indices are transformed, its value and time frame are kept
    pub fn transform_bin(&self, bin: &Bin, info: &ProjDataInfo) -> Bin {
        bin.with_key(self.transform_key(bin.key(), info))
    }

    pub fn transform_voxel(&self, [ix, iy, iz]: Index3_u, [nx, ny, nz]: BoxDim_u) -> Index3_u {
        // Coordinates relative to the grid centre, in half-voxels
        let u = [2 * ix as isize - (nx as isize - 1),
                 2 * iy as isize - (ny as isize - 1)];
        let m = self.transaxial;
        let u = [m[0][0] as isize * u[0] + m[0][1] as isize * u[1],
                 m[1][0] as isize * u[0] + m[1][1] as isize * u[1]];
        let ix = (u[0] + nx as isize - 1) / 2;
        let iy = (u[1] + ny as isize - 1) / 2;
        let iz = if self.axial_flip { nz - 1 - iz } else { iz };
        [ix as usize, iy as usize, iz]
    }

    /// The row of the bin related by this operation to the bin of `row`.
    /// Weights are unchanged, only voxel positions move.
    pub fn transform_row(&self, row: &SystemMatrixRow, n: BoxDim_u) -> SystemMatrixRow {
        if self.is_identity() { return row.clone() }
        row.iter()
            .map(|&(voxel, weight)| (self.transform_voxel(voxel, n), weight))
            .collect()
    }
}

/// Close `generators` under composition. The identity comes first.
pub fn generate_group(generators: &[SymmetryOperation]) -> Vec<SymmetryOperation> {
    let mut group = vec![SymmetryOperation::IDENTITY];
    let mut i = 0;
    while i < group.len() {
        for g in generators {
            let h = g.compose(&group[i]);
            if !group.contains(&h) { group.push(h) }
        }
        i += 1;
    }
    group
}

/// Keep only those operations which are admissible for the given geometry
pub fn admissible_subgroup(group: Vec<SymmetryOperation>, info: &ProjDataInfo, fov: &FOV) -> Vec<SymmetryOperation> {
    group.into_iter().filter(|g| g.is_admissible(info, fov)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use crate::projdata::test_util;
    use std::sync::Arc;
    use units::mm;

    type Op = SymmetryOperation;

    fn full_group() -> Vec<Op> {
        generate_group(&[Op::rotate_90(), Op::reflect_x(), Op::reflect_axial()])
    }

    #[test]
    fn group_orders() {
        assert_eq!(generate_group(&[]).len(), 1);
        assert_eq!(generate_group(&[Op::rotate_90()]).len(), 4);
        assert_eq!(generate_group(&[Op::rotate_90(), Op::reflect_x()]).len(), 8);
        assert_eq!(full_group().len(), 16);
        assert_eq!(full_group()[0], Op::IDENTITY);
    }

    #[test]
    fn inverses() {
        for g in full_group() {
            assert!(g.compose(&g.inverse()).is_identity(), "{g:?}");
            assert!(g.inverse().compose(&g).is_identity(), "{g:?}");
        }
    }

    #[test]
    fn composition_of_reflections_is_rotation() {
        let half_turn = Op::reflect_x().compose(&Op::reflect_y());
        assert_eq!(half_turn, Op::rotate_90().compose(&Op::rotate_90()));
    }

    //  s, v, a, t  with 8 views, 4 rings
    #[rstest(/**/ op,                  before        , after,
             // x -> -x: φ -> π - φ
             case(Op::reflect_x()    , ( 1, 2, 0,  3), (-1, 6, 0,  3)),
             case(Op::reflect_x()    , ( 1, 0, 0,  3), ( 1, 0, 0, -3)),
             // y -> -y: φ -> -φ
             case(Op::reflect_y()    , ( 1, 2, 0,  3), ( 1, 6, 0, -3)),
             case(Op::reflect_y()    , ( 1, 0, 0,  3), (-1, 0, 0,  3)),
             // +90°
             case(Op::rotate_90()    , ( 1, 2, 1,  3), ( 1, 6, 1,  3)),
             case(Op::rotate_90()    , ( 1, 5, 1,  3), (-1, 1, 1, -3)),
             // z -> -z: rings (a, a+s) -> (3-a, 3-a-s)
             case(Op::reflect_axial(), ( 1, 2, 0,  3), (-1, 2, 2,  3)),
             case(Op::reflect_axial(), ( 0, 2, 1, -2), ( 0, 2, 2, -2)),
    )]
    fn bin_actions(op: Op, before: (i32, i32, i32, i32), after: (i32, i32, i32, i32)) {
        let info = test_util::info();
        let (s, v, a, t) = before;
        let got = op.transform_bin(&Bin::new(s, v, a, t, 1.0), &info);
        let (s, v, a, t) = after;
        assert_eq!(got, Bin::new(s, v, a, t, 1.0));
    }

    #[test]
    fn swapping_detectors_negates_timing() {
        let info = ProjDataInfo::new(crate::projdata::Scanner { max_timing_pos_num: 2, ..test_util::scanner() }).unwrap();
        let bin = Bin::with_timing(1, 2, 0, 1, 2, 0.0);
        assert_eq!(Op::reflect_x().transform_bin(&bin, &info).timing_pos_num(), -2);
        assert_eq!(Op::reflect_axial().transform_bin(&bin, &info).timing_pos_num(), 2);
    }

    #[rstest(/**/ op,                  voxel    , expected,
             case(Op::reflect_x()    , [0, 1, 0], [4, 1, 0]),
             case(Op::reflect_y()    , [0, 1, 0], [0, 3, 0]),
             case(Op::rotate_90()    , [4, 2, 0], [2, 4, 0]),
             case(Op::rotate_90()    , [2, 2, 1], [2, 2, 1]),
             case(Op::reflect_axial(), [1, 2, 0], [1, 2, 2]),
    )]
    fn voxel_actions(op: Op, voxel: Index3_u, expected: Index3_u) {
        assert_eq!(op.transform_voxel(voxel, [5, 5, 3]), expected);
    }

    #[test]
    fn voxel_action_is_a_group_action() {
        let n = [4, 4, 3];
        for g in full_group() {
            for h in full_group() {
                let voxel = [1, 3, 2];
                assert_eq!(g.compose(&h).transform_voxel(voxel, n),
                           g.transform_voxel(h.transform_voxel(voxel, n), n));
            }
        }
    }

    #[test]
    fn bin_action_is_a_group_action() {
        let info = test_util::info();
        let bin = Bin::new(1, 3, 1, -2, 0.0);
        for g in full_group() {
            for h in full_group() {
                assert_eq!(g.compose(&h).transform_bin(&bin, &info),
                           g.transform_bin(&h.transform_bin(&bin, &info), &info));
            }
        }
    }

    #[test]
    fn admissibility() {
        let info = Arc::new(test_util::info());
        let square = FOV::new((mm(20.0), mm(20.0), mm(16.0)), (5, 5, 4));
        let oblong = FOV::new((mm(20.0), mm(24.0), mm(16.0)), (5, 6, 4));
        assert_eq!(admissible_subgroup(full_group(), &info, &square).len(), 16);
        // No axis swaps on a non-square grid
        assert_eq!(admissible_subgroup(full_group(), &info, &oblong).len(), 8);
        // Segments 0..=1 only: nothing which negates segments in some view
        let one_sided = ProjDataInfo::new(crate::projdata::Scanner { min_segment_num: Some(0), ..test_util::scanner() }).unwrap();
        let ops = admissible_subgroup(full_group(), &Arc::new(one_sided), &square);
        assert!(ops.len() < 16);
        assert!(ops.contains(&Op::IDENTITY));
        // Odd number of views: no quarter turns
        let odd = ProjDataInfo::new(crate::projdata::Scanner { num_views: 7, ..test_util::scanner() }).unwrap();
        assert!(!Op::rotate_90().is_admissible(&odd, &square));
        assert!(Op::reflect_x().is_admissible(&odd, &square));
    }
}
