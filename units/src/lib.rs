//! Physical quantities used throughout the workspace.
//!
//! Thin layer over `uom`'s `f32` SI quantities, providing pithily-named
//! constructors (`mm(1.0)`) and extractors (`mm_(length)`), because making
//! values from float literals is otherwise very long-winded.

pub mod todo;

pub use uom;

pub use uom::si::f32::{Angle, Length, Ratio};
use uom::si::{
    angle::radian as radian_unit,
    length::{centimeter, millimeter},
    ratio::ratio as ratio_unit,
};

pub fn cm    (x: f32) -> Length { Length::new::<centimeter>(x) }
pub fn mm    (x: f32) -> Length { Length::new::<millimeter>(x) }
pub fn ratio (x: f32) -> Ratio  {  Ratio::new::<ratio_unit>(x) }
pub fn radian(x: f32) -> Angle  {  Angle::new::<radian_unit>(x) }

pub fn cm_    (x: Length) -> f32 { x.get::<centimeter>() }
pub fn mm_    (x: Length) -> f32 { x.get::<millimeter>() }
pub fn ratio_ (x: Ratio ) -> f32 { x.get::<ratio_unit>() }
pub fn radian_(x: Angle ) -> f32 { x.get::<radian_unit>() }

/// The half-circle constant, used for view angles which cover `[0, π)`.
pub const PI: f32 = std::f32::consts::PI;

/// Compare two `uom` quantities in a given unit, using `float_eq`'s
/// algorithms and tolerances.
#[macro_export]
macro_rules! assert_uom_eq {
    ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
        float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uom::si::length::meter;

    #[rstest(/**/ value,
             case(0.0),
             case(1.5),
             case(-273.15),
             case(1e6),
    )]
    fn mm_roundtrip(value: f32) {
        // Stored in metres: not exact
        float_eq::assert_float_eq!(mm_(mm(value)), value, rmax <= 1e-6);
    }

    #[test]
    fn radian_roundtrip() {
        float_eq::assert_float_eq!(radian_(radian(PI / 4.0)), PI / 4.0, rmax <= 1e-6);
    }

    #[test]
    fn cm_is_ten_mm() {
        assert_uom_eq!(meter, cm(1.0), mm(10.0), ulps <= 1);
    }

    #[test]
    fn parse_length_from_config_style_string() {
        let l: Length = "20 mm".parse().unwrap();
        assert_uom_eq!(millimeter, l, mm(20.0), ulps <= 1);
    }
}
