use std::ops::{Add, Index, Mul, Neg, Sub};
use units::{Length, mm, mm_};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vector {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

impl Vector {

    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    /// Construct from plain numbers interpreted as millimetres
    pub fn from_mm(x: f32, y: f32, z: f32) -> Self { Self::new(mm(x), mm(y), mm(z)) }

    pub fn magnitude(&self) -> Length {
        let &Self { x, y, z } = self;
        mm((mm_(x).powi(2) + mm_(y).powi(2) + mm_(z).powi(2)).sqrt())
    }

    /// Components in millimetres
    pub fn to_mm(self) -> [f32; 3] { [mm_(self.x), mm_(self.y), mm_(self.z)] }

    /// Dimensionless unit vector with the same direction. Zero vectors yield
    /// NaNs.
    pub fn direction(self) -> [f32; 3] {
        let m = mm_(self.magnitude());
        self.to_mm().map(|c| c / m)
    }

}

impl Add for Vector {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl Sub for Vector {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl Neg for Vector {
    type Output = Self;
    fn neg(self) -> Self::Output { Self { x: -self.x, y: -self.y, z: -self.z } }
}

impl Mul<f32> for Vector {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self::Output {
        Vector {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Index<usize> for Vector {
    type Output = Length;
    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("index {index} is out of bounds [0,2]")
        }
    }
}

impl From<Vector> for crate::nc::Vector {
    fn from(v: Vector) -> Self {
        let [x, y, z] = v.to_mm();
        Self::new(x, y, z)
    }
}
