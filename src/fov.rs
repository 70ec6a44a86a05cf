/// The size and granularity of the Field of View (FOV) in which images are
/// reconstructed. The FOV is centred on the scanner axis, which is what
/// makes the scanner's geometric symmetries map voxels onto voxels.

use units::{Length, mm_};
use crate::error::{ProjError, Result};
use crate::index::{BoxDim_u, Index3_u};
use crate::types::{Lengthf32, Point, Vector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FOV {
    pub half_width: Vector,
    pub n: BoxDim_u,
    pub voxel_size: Vector,
}

impl FOV {

    pub fn new(
        full_size: (Length, Length, Length),
        (nx, ny, nz): (usize, usize, usize)
    ) -> Self {
        let (dx, dy, dz) = full_size;
        let half_width = Vector::new(dx/2.0, dy/2.0, dz/2.0);
        let n = [nx, ny, nz];
        let voxel_size = Self::voxel_size(n, half_width);
        Self { half_width, n, voxel_size }
    }

    fn voxel_size(n: BoxDim_u, half_width: Vector) -> Vector {
        let full_width = half_width * 2.0;
        Vector::new(full_width[0] / n[0] as f32,
                    full_width[1] / n[1] as f32,
                    full_width[2] / n[2] as f32,
        )
    }

    pub fn num_voxels(&self) -> usize { self.n.iter().product() }

    /// Usable for reconstruction: at least one voxel, of finite, positive size
    pub fn check_valid(&self) -> Result<()> {
        let sizes = self.voxel_size.to_mm();
        if self.num_voxels() == 0 || sizes.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(ProjError::GeometryMismatch(format!(
                "degenerate FOV: {:?} voxels of size {sizes:?} mm", self.n
            )))
        }
        Ok(())
    }

    /// Same number and size of voxels along x and y: required by symmetries
    /// which swap the transaxial axes.
    pub fn is_square_transaxially(&self) -> bool {
        self.n[0] == self.n[1] && self.voxel_size.x == self.voxel_size.y
    }

    pub fn check_index(&self, i: Index3_u) -> Result<()> {
        for (dim, (&index, &n)) in i.iter().zip(self.n.iter()).enumerate() {
            if index >= n {
                const WHAT: [&str; 3] = ["voxel x index", "voxel y index", "voxel z index"];
                return Err(ProjError::OutOfRange { what: WHAT[dim], value: index as i32, min: 0, max: n as i32 - 1 })
            }
        }
        Ok(())
    }

    /// Find centre of voxel with given 3D index
    pub fn voxel_centre(&self, i: Index3_u) -> Point {
        let s = self.voxel_size.to_mm();
        let h = self.half_width.to_mm();
        Point::from_mm((i[0] as Lengthf32 + 0.5) * s[0] - h[0],
                       (i[1] as Lengthf32 + 0.5) * s[1] - h[1],
                       (i[2] as Lengthf32 + 0.5) * s[2] - h[2],)
    }

    /// Where the line segment from `p1` to `p2` enters the FOV, if it does
    pub fn entry(&self, p1: Point, p2: Point) -> Option<Point> {

        use ncollide3d::query::RayCast;
        use ncollide3d::shape::Cuboid;

        type Ray      = ncollide3d::query::Ray    <Lengthf32>;
        type Isometry = ncollide3d::math::Isometry<Lengthf32>;

        let lor_direction = (p2 - p1).direction();
        let lor_length    = mm_((p2 - p1).magnitude());
        let [dx, dy, dz]  = lor_direction;
        let lor: Ray = Ray::new(p1.into(), geometry::nc::Vector::new(dx, dy, dz));
        let iso: Isometry = Isometry::identity();
        Cuboid::new(self.half_width.into())
            .toi_with_ray(&iso, &lor, lor_length, true)
            .map(|toi| lor.origin + lor.dir * toi)
            .map(Into::into)
    }

}

#[cfg(test)]
mod test_voxel_box {
    use super::*;
    use rstest::rstest;
    use units::mm;
    use float_eq::assert_float_eq;

    #[rstest(/**/ index,   expected_position,
             case([0,0,0], [-1.0, -1.0, -1.0]),
             case([0,0,1], [-1.0, -1.0,  1.0]),
             case([0,1,0], [-1.0,  1.0, -1.0]),
             case([0,1,1], [-1.0,  1.0,  1.0]),
             case([1,0,0], [ 1.0, -1.0, -1.0]),
             case([1,0,1], [ 1.0, -1.0,  1.0]),
             case([1,1,0], [ 1.0,  1.0, -1.0]),
             case([1,1,1], [ 1.0,  1.0,  1.0]),
    )]
    fn test_voxel_centre(index: Index3_u, expected_position: [Lengthf32; 3]) {
        let fov = FOV::new((mm(4.0), mm(4.0), mm(4.0)), (2,2,2));
        let c = fov.voxel_centre(index).to_mm();
        assert_float_eq!(c, expected_position, ulps <= [1, 1, 1]);
    }

    #[test]
    fn entry_point() {
        let fov = FOV::new((mm(10.0), mm(10.0), mm(10.0)), (5,5,5));
        let p = fov.entry(Point::from_mm(-20.0, 1.0, 2.0), Point::from_mm(20.0, 1.0, 2.0)).unwrap();
        assert_float_eq!(p.to_mm(), [-5.0, 1.0, 2.0], abs <= [1e-5; 3]);
        assert_eq!(fov.entry(Point::from_mm(-20.0, 9.0, 0.0), Point::from_mm(20.0, 9.0, 0.0)), None);
    }

    #[test]
    fn index_checks() {
        let fov = FOV::new((mm(10.0), mm(10.0), mm(6.0)), (5,5,3));
        assert!(fov.check_index([4, 4, 2]).is_ok());
        assert!(matches!(fov.check_index([4, 5, 2]), Err(ProjError::OutOfRange { what: "voxel y index", .. })));
        assert!(fov.is_square_transaxially());
        assert!(!FOV::new((mm(10.0), mm(12.0), mm(6.0)), (5,5,3)).is_square_transaxially());
        assert!(FOV::new((mm(10.0), mm(12.0), mm(6.0)), (5,0,3)).check_valid().is_err());
    }
}
