//! Geometry descriptor of the projection data of a cylindrical scanner.
//!
//! Answers range queries about valid indices, and maps bin indices to the
//! physical line of response (LOR) they measure. Consumed read-only, through
//! shared `Arc<ProjDataInfo>` handles, by every view of the projection data.

use std::ops::RangeInclusive;

use serde::Deserialize;

use units::{Length, mm, mm_, PI};
use crate::config::deserialize_uom;
use crate::error::{check_range, ProjError, Result};
use crate::projdata::{Bin, SegmentIndices, ViewgramIndices};
use crate::types::Point;

/// Parameters of a cylindrical scanner and of its sampling of the LORs.
///
/// Segment number is the ring difference (span 1) of the LORs it contains.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scanner {
    pub num_rings: i32,
    pub num_views: i32,

    /// Tangential positions range over `-max..=max`
    pub max_tangential_pos_num: i32,

    /// Segments range over `-max..=max`, unless `min_segment_num` is given
    pub max_segment_num: i32,
    pub min_segment_num: Option<i32>,

    /// Timing (TOF) positions range over `-max..=max`
    #[serde(default)]
    pub max_timing_pos_num: i32,

    #[serde(deserialize_with = "deserialize_uom")]
    pub ring_radius: Length,

    #[serde(deserialize_with = "deserialize_uom")]
    pub ring_spacing: Length,

    #[serde(deserialize_with = "deserialize_uom")]
    pub tangential_bin_size: Length,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjDataInfo {
    scanner: Scanner,
    segments: RangeInclusive<i32>,
}

impl ProjDataInfo {

    pub fn new(scanner: Scanner) -> Result<Self> {
        let bad = |msg: String| Err(ProjError::Config(msg));
        let Scanner { num_rings, num_views, max_tangential_pos_num, max_segment_num, max_timing_pos_num, .. } = scanner;
        let min_segment_num = scanner.min_segment_num.unwrap_or(-max_segment_num);
        if num_rings < 1 { return bad(format!("need at least one ring, got {num_rings}")) }
        if num_views < 1 { return bad(format!("need at least one view, got {num_views}")) }
        if max_tangential_pos_num < 0 || max_timing_pos_num < 0 {
            return bad("maximum tangential and timing positions must be non-negative".into())
        }
        if min_segment_num > max_segment_num {
            return bad(format!("empty segment range {min_segment_num}..={max_segment_num}"))
        }
        let max_ring_difference = num_rings - 1;
        if min_segment_num < -max_ring_difference || max_segment_num > max_ring_difference {
            return bad(format!(
                "segments {min_segment_num}..={max_segment_num} exceed ring difference {max_ring_difference} of {num_rings} rings"
            ))
        }
        let outermost = mm_(scanner.tangential_bin_size) * max_tangential_pos_num as f32;
        if outermost >= mm_(scanner.ring_radius) {
            return bad(format!("outermost tangential position ({outermost} mm) lies outside the ring"))
        }
        let scanner = Scanner { min_segment_num: Some(min_segment_num), ..scanner };
        Ok(Self { scanner, segments: min_segment_num..=max_segment_num })
    }

    pub fn scanner(&self) -> &Scanner { &self.scanner }
    pub fn num_rings(&self) -> i32 { self.scanner.num_rings }
    pub fn num_views(&self) -> i32 { self.scanner.num_views }

    // ----- Range queries --------------------------------------------------------------

    pub fn valid_segment_range(&self) -> RangeInclusive<i32> { self.segments.clone() }

    /// The same for every segment of a cylindrical scanner
    pub fn valid_view_range(&self, _segment_num: i32) -> RangeInclusive<i32> { 0..=self.scanner.num_views - 1 }

    /// Ring pairs `(a, a+|s|)`: `a` is the lower ring of the pair
    pub fn valid_axial_range(&self, segment_num: i32) -> RangeInclusive<i32> {
        0..=self.scanner.num_rings - 1 - segment_num.abs()
    }

    pub fn valid_tangential_range(&self) -> RangeInclusive<i32> {
        let t = self.scanner.max_tangential_pos_num;
        -t..=t
    }

    pub fn valid_timing_range(&self) -> RangeInclusive<i32> {
        let k = self.scanner.max_timing_pos_num;
        -k..=k
    }

    // ----- Range checks ---------------------------------------------------------------

    pub fn check_segment_indices(&self, s: SegmentIndices) -> Result<()> {
        check_range("segment", s.segment_num, &self.valid_segment_range())?;
        check_range("timing position", s.timing_pos_num, &self.valid_timing_range())
    }

    pub fn check_viewgram_indices(&self, v: ViewgramIndices) -> Result<()> {
        self.check_segment_indices(v.segment_indices())?;
        check_range("view", v.view_num, &self.valid_view_range(v.segment_num))
    }

    pub fn check_bin(&self, bin: &Bin) -> Result<()> {
        self.check_viewgram_indices(bin.viewgram_indices())?;
        check_range("axial position", bin.axial_pos_num(), &self.valid_axial_range(bin.segment_num()))?;
        check_range("tangential position", bin.tangential_pos_num(), &self.valid_tangential_range())
    }

    /// Every valid `SegmentIndices`, segment-major
    pub fn all_segment_indices(&self) -> impl Iterator<Item = SegmentIndices> {
        itertools::iproduct!(self.valid_segment_range(), self.valid_timing_range())
            .map(|(s, k)| SegmentIndices::new(s, k))
    }

    /// Every valid `ViewgramIndices`
    pub fn all_viewgram_indices(&self) -> impl Iterator<Item = ViewgramIndices> + '_ {
        self.all_segment_indices().flat_map(move |seg| {
            self.valid_view_range(seg.segment_num)
                .map(move |v| ViewgramIndices::new(seg.segment_num, v, seg.timing_pos_num))
        })
    }

    /// Every valid bin in the given viewgram, with zero value
    pub fn bins_in_viewgram(&self, v: ViewgramIndices) -> impl Iterator<Item = Bin> {
        itertools::iproduct!(self.valid_axial_range(v.segment_num), self.valid_tangential_range())
            .map(move |(a, t)| Bin::with_timing(v.segment_num, v.view_num, a, t, v.timing_pos_num, 0.0))
    }

    // ----- Physical coordinates -------------------------------------------------------

    /// Azimuthal angle of the normal to the LORs in `view_num`, in `[0, π)`
    pub fn view_angle(&self, view_num: i32) -> f32 {
        view_num as f32 * PI / self.scanner.num_views as f32
    }

    /// Axial position of the centre of a ring, with the scanner centred on z = 0
    pub fn ring_z(&self, ring: i32) -> Length {
        let centre = (self.scanner.num_rings - 1) as f32 / 2.0;
        self.scanner.ring_spacing * (ring as f32 - centre)
    }

    /// The rings on which the first and second detectors of the bin lie
    pub fn rings(&self, bin: &Bin) -> (i32, i32) {
        let (a, s) = (bin.axial_pos_num(), bin.segment_num());
        if s >= 0 { (a, a + s) } else { (a - s, a) }
    }

    /// The two detector positions of the LOR measured by `bin`.
    ///
    /// The LOR lies at signed distance `t * tangential_bin_size` from the
    /// scanner axis, along its view's normal `n = (cos φ, sin φ)`. The first
    /// detector sits at `t n - L d`, the second at `t n + L d`, where
    /// `d = (-sin φ, cos φ)`.
    pub fn lor_endpoints(&self, bin: &Bin) -> (Point, Point) {
        let phi = self.view_angle(bin.view_num());
        let (sin, cos) = phi.sin_cos();
        let offset = mm_(self.scanner.tangential_bin_size) * bin.tangential_pos_num() as f32;
        let radius = mm_(self.scanner.ring_radius);
        let half_chord = (radius * radius - offset * offset).sqrt();
        let (cx, cy) = (offset * cos, offset * sin);
        let (dx, dy) = (-sin * half_chord, cos * half_chord);
        let (r1, r2) = self.rings(bin);
        let p1 = Point::new(mm(cx - dx), mm(cy - dy), self.ring_z(r1));
        let p2 = Point::new(mm(cx + dx), mm(cy + dy), self.ring_z(r2));
        (p1, p2)
    }

    /// Point of the bin's LOR closest to the scanner axis
    pub fn physical_coordinates(&self, bin: &Bin) -> Point {
        let (p1, p2) = self.lor_endpoints(bin);
        p1.midpoint(p2)
    }

    /// Why `self` and `other` describe different projection data, if they do
    pub fn mismatch(&self, other: &Self) -> Option<String> {
        if self == other { return None }
        let (a, b) = (&self.scanner, &other.scanner);
        let mut why = vec![];
        let mut check = |what: &str, l: String, r: String| if l != r { why.push(format!("{what}: {l} vs {r}")) };
        check("segment range"   , format!("{:?}", self.valid_segment_range())   , format!("{:?}", other.valid_segment_range()));
        check("view range"      , format!("{:?}", self.valid_view_range(0))      , format!("{:?}", other.valid_view_range(0)));
        check("tangential range", format!("{:?}", self.valid_tangential_range()), format!("{:?}", other.valid_tangential_range()));
        check("timing range"    , format!("{:?}", self.valid_timing_range())    , format!("{:?}", other.valid_timing_range()));
        check("number of rings" , a.num_rings.to_string(), b.num_rings.to_string());
        check("ring radius"     , format!("{:?}", a.ring_radius)        , format!("{:?}", b.ring_radius));
        check("ring spacing"    , format!("{:?}", a.ring_spacing)       , format!("{:?}", b.ring_spacing));
        check("tangential bin"  , format!("{:?}", a.tangential_bin_size), format!("{:?}", b.tangential_bin_size));
        if why.is_empty() { why.push("different projection data info".into()) }
        Some(why.join("; "))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_util::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;

    #[test]
    fn ranges() {
        let info = info();
        assert_eq!(info.valid_segment_range(), -1..=1);
        assert_eq!(info.valid_view_range(1), 0..=7);
        assert_eq!(info.valid_axial_range(0), 0..=3);
        assert_eq!(info.valid_axial_range(-1), 0..=2);
        assert_eq!(info.valid_tangential_range(), -3..=3);
        assert_eq!(info.valid_timing_range(), 0..=0);
        assert_eq!(info.all_viewgram_indices().count(), 3 * 8);
        assert_eq!(info.bins_in_viewgram(ViewgramIndices::new(1, 0, 0)).count(), 3 * 7);
    }

    #[rstest(/**/   s,  v,  a,  t, what,
             case(  2,  0,  0,  0, "segment"),
             case(  0,  8,  0,  0, "view"),
             case(  1,  0,  3,  0, "axial position"),
             case(  0,  0, -1,  0, "axial position"),
             case(  0,  0,  0,  4, "tangential position"),
    )]
    fn out_of_range(s: i32, v: i32, a: i32, t: i32, what: &str) {
        match info().check_bin(&Bin::new(s, v, a, t, 0.0)) {
            Err(ProjError::OutOfRange { what: w, .. }) => assert_eq!(w, what),
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn invalid_scanners_are_rejected() {
        let too_many_segments = Scanner { max_segment_num: 4, ..scanner() };
        assert!(ProjDataInfo::new(too_many_segments).is_err());
        let tangential_outside_ring = Scanner { tangential_bin_size: mm(30.0), ..scanner() };
        assert!(ProjDataInfo::new(tangential_outside_ring).is_err());
    }

    #[test]
    fn endpoints_lie_on_ring() {
        let info = info();
        for bin in info.bins_in_viewgram(ViewgramIndices::new(-1, 3, 0)) {
            let (p1, p2) = info.lor_endpoints(&bin);
            for p in [p1, p2] {
                let [x, y, _] = p.to_mm();
                assert_float_eq!((x*x + y*y).sqrt(), 60.0, rel <= 1e-5);
            }
            let (r1, r2) = info.rings(&bin);
            assert_eq!(r2 - r1, -1);
            assert_float_eq!(mm_(p2.z - p1.z), -4.0, abs <= 1e-5);
        }
    }

    #[test]
    fn physical_coordinates_at_tangential_offset() {
        let info = info();
        // view 0: normal along x
        let c = info.physical_coordinates(&Bin::new(0, 0, 0, 2, 0.0));
        assert_float_eq!(c.to_mm(), [6.6, 0.0, -6.0], abs <= [1e-5; 3]);
    }

    #[test]
    fn mismatch_explains_view_range() {
        let other = ProjDataInfo::new(Scanner { num_views: 4, ..scanner() }).unwrap();
        let why = info().mismatch(&other).unwrap();
        assert!(why.contains("view range"), "{why}");
        assert_eq!(info().mismatch(&info()), None);
    }
}
