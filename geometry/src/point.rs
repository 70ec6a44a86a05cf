use std::ops::{Add, Index, Sub};
use units::{Length, mm, mm_};
use crate::Vector;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: Length,
    pub y: Length,
    pub z: Length,
}

impl Point {
    pub fn new(x: Length, y: Length, z: Length) -> Self { Self { x, y, z } }

    /// Construct from plain numbers interpreted as millimetres
    pub fn from_mm(x: f32, y: f32, z: f32) -> Self { Self::new(mm(x), mm(y), mm(z)) }

    /// Coordinates in millimetres
    pub fn to_mm(self) -> [f32; 3] { [mm_(self.x), mm_(self.y), mm_(self.z)] }

    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, rhs: Self) -> Self::Output {
        Vector {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Add<Vector> for Point {
    type Output = Self;
    fn add(self, rhs: Vector) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Index<usize> for Point {
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

impl From<Point> for crate::nc::Point {
    fn from(p: Point) -> Self {
        let [x, y, z] = p.to_mm();
        Self::new(x, y, z)
    }
}

impl From<crate::nc::Point> for Point {
    fn from(p: crate::nc::Point) -> Self { Self::from_mm(p.x, p.y, p.z) }
}
