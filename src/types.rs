pub use units::todo::{Intensityf32, Lengthf32, Ratiof32, Weightf32};

pub use geometry::{Point, Vector};
pub use units::{Length, Ratio};

pub use crate::index::{BoxDim_u, Index1_u, Index3_u};

pub type BoundPair<T> = (std::ops::Bound<T>, std::ops::Bound<T>);
