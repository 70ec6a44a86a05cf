mod point;
mod vector;

pub use point::Point;
pub use vector::Vector;

/// `ncollide3d` types, in millimetres, used at the boundary with ray-casting
/// code.
pub mod nc {
    pub type Point  = ncollide3d::math::Point <f32>;
    pub type Vector = ncollide3d::math::Vector<f32>;
}
