//! Symmetry-reduced projection and back-projection between tomographic
//! projection data and voxelized images.

mod types;
pub use types::*;

pub mod error;
pub mod index;
pub mod fov;
pub mod image;
pub mod projdata;
pub mod symmetries;
pub mod projmatrix;
pub mod projector;
pub mod registry;
pub mod rejection;
pub mod config;

pub use error::{ProjError, Result};
pub use fov::FOV;
pub use image::Image;
