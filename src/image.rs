use crate::error::{ProjError, Result};
use crate::fov::FOV;
use crate::index::index3_to_1;
use crate::types::{Intensityf32, Index1_u, Index3_u};

pub type ImageData = Vec<Intensityf32>;

/// A 3D voxel grid, addressable by 1D or 3D index.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub fov: FOV,
    pub data: ImageData,
}

impl Image {

    pub fn new(fov: FOV, data: ImageData) -> Result<Self> {
        if data.len() != fov.num_voxels() {
            return Err(ProjError::GeometryMismatch(format!(
                "image data of length {} does not match dimensions {:?}", data.len(), fov.n
            )))
        }
        Ok(Image { fov, data })
    }

    pub fn zeros(fov: FOV) -> Self { Self { data: Self::zeros_buffer(fov), fov } }

    pub fn ones(fov: FOV) -> Self { Self { data: vec![1.0; fov.num_voxels()], fov } }

    /// A new empty data store with matching size
    pub fn zeros_buffer(fov: FOV) -> ImageData { vec![0.0; fov.num_voxels()] }

    /// The geometry descriptor of the image, for consistency checks
    pub fn fov(&self) -> &FOV { &self.fov }

    /// Add `buffer` voxel by voxel. The buffer must come from an image with
    /// this image's FOV.
    pub fn add_buffer(&mut self, buffer: &[Intensityf32]) -> Result<()> {
        if buffer.len() != self.data.len() {
            return Err(ProjError::GeometryMismatch(format!(
                "cannot add buffer of length {} to image of {} voxels", buffer.len(), self.data.len()
            )))
        }
        for (v, b) in self.data.iter_mut().zip(buffer) { *v += b }
        Ok(())
    }

    pub fn add_image(&mut self, other: &Self) -> Result<()> {
        if self.fov != other.fov {
            return Err(ProjError::GeometryMismatch(format!("images have different FOVs: {:?} vs {:?}", self.fov, other.fov)))
        }
        self.add_buffer(&other.data)
    }

    pub fn sum(&self) -> Intensityf32 { self.data.iter().sum() }
}

pub fn elementwise_add(a: ImageData, b: ImageData) -> ImageData {
    a.iter().zip(b.iter()).map(|(l,r)| l+r).collect()
}

impl core::ops::IndexMut<Index1_u> for Image {
    #[inline]
    fn index_mut(&mut self, i: Index1_u) -> &mut Self::Output { &mut self.data[i] }
}

impl core::ops::Index<Index1_u> for Image {
    type Output = Intensityf32;
    #[inline]
    fn index(&self, i: Index1_u) -> &Self::Output { &self.data[i] }
}

impl core::ops::IndexMut<Index3_u> for Image {
    fn index_mut(&mut self, i3: Index3_u) -> &mut Self::Output {
        let i1 = index3_to_1(i3, self.fov.n);
        &mut self.data[i1]
    }
}

impl core::ops::Index<Index3_u> for Image {
    type Output = Intensityf32;
    fn index(&self, i3: Index3_u) -> &Self::Output {
        let i1 = index3_to_1(i3, self.fov.n);
        &self.data[i1]
    }
}
